//! Restin Routing
//!
//! Compiled routes and the URL matcher. The table is built once at startup
//! from validated configuration and is read-only while serving, so
//! concurrent lookups need no synchronization.
//!
//! Resolution order: exact-path map first, then the regex list in
//! configuration order; no match is an HTTP 404 at the gateway layer.

mod error;
mod route;
mod table;

pub use error::{Result, RoutingError};
pub use route::Route;
pub use table::{RouteTable, RouteTableBuilder};

#[cfg(test)]
#[path = "table_test.rs"]
mod table_test;
