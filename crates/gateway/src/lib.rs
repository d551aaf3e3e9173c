//! Restin Gateway
//!
//! The serving half of restin: terminates HTTP, resolves the URL against
//! the route table, leases a worker context, drives the per-request
//! dispatch state machine and writes the shaped reply.
//!
//! ```text
//! HTTP request ──▶ route table ──▶ worker pool ──▶ dispatch
//!                     │                               │
//!                     ▼                               ▼
//!               static files                codec / filters / backend
//!                                                     │
//! HTTP reply ◀── response shaper ◀────────────────────┘
//! ```
//!
//! The crate is a library plus the `restin` binary; integration tests and
//! embedding hosts build the axum router through [`server::app`].

mod dispatch;
mod error;
mod filter;
mod pool;
pub mod server;
mod shape;
mod upload;

pub use error::BootError;
pub use pool::{Lease, WorkerPool};

use std::sync::Arc;

use restin_config::Config;
use restin_protocol::{ContextFactory, ViewRegistry};
use restin_routing::RouteTable;

/// Everything the serving loop needs, built once at startup
pub struct Gateway {
    table: RouteTable,
    views: Arc<ViewRegistry>,
    pool: WorkerPool,
}

impl Gateway {
    /// Build the gateway: load views, compile the route table, fill the
    /// worker pool
    ///
    /// # Errors
    ///
    /// Any failure here (bad route, unreadable view file, a context that
    /// does not initialize) aborts startup.
    pub fn new(config: &Config, factory: &dyn ContextFactory) -> Result<Self, BootError> {
        let views = match &config.gateway.views {
            Some(path) => ViewRegistry::from_file(path)?,
            None => ViewRegistry::new(),
        };

        let table = RouteTable::from_config(config)?;
        tracing::info!(routes = table.len(), views = views.len(), "route table compiled");

        let pool = WorkerPool::new(config.gateway.workers, factory)?;

        Ok(Self {
            table,
            views: Arc::new(views),
            pool,
        })
    }

    /// The compiled route table
    #[inline]
    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// The worker pool
    #[inline]
    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// The view registry
    #[inline]
    pub fn views(&self) -> &Arc<ViewRegistry> {
        &self.views
    }

    /// Drain and terminate every worker context
    ///
    /// Each drain blocks until the slot's in-flight request completes, so
    /// no context is torn down while leased.
    pub async fn shutdown(&self) {
        self.pool.shutdown().await;
    }
}

#[cfg(test)]
#[path = "pool_test.rs"]
mod pool_test;
