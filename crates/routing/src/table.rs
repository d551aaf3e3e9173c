//! Route table and URL matcher
//!
//! The table is compiled once at startup. Exact routes live in a `HashMap`;
//! regex routes keep their configuration order and are scanned only when no
//! exact route matches.

use std::collections::HashMap;
use std::sync::Arc;

use regex::Regex;

use restin_config::{Config, UrlFormat};

use crate::error::{Result, RoutingError};
use crate::route::Route;

/// Read-only URL → route table
///
/// # Example
///
/// ```
/// use restin_config::RouteConfig;
/// use restin_routing::{Route, RouteTableBuilder};
///
/// let cfg = RouteConfig {
///     service: "ECHOSVC".into(),
///     ..Default::default()
/// };
///
/// let mut builder = RouteTableBuilder::new();
/// builder.add(Route::compile("/echo", &cfg).unwrap()).unwrap();
/// let table = builder.build();
///
/// assert!(table.resolve("/echo").is_some());
/// assert!(table.resolve("/other").is_none());
/// ```
#[derive(Debug, Default)]
pub struct RouteTable {
    /// Exact-path routes
    exact: HashMap<String, Arc<Route>>,
    /// Regex routes in configuration order
    patterns: Vec<(Regex, Arc<Route>)>,
}

impl RouteTable {
    /// Compile a full route table from validated configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut builder = RouteTableBuilder::new();
        for (url, cfg) in &config.routes {
            builder.add(Route::compile(url, cfg)?)?;
        }
        Ok(builder.build())
    }

    /// Resolve a request path to a route
    ///
    /// Exact match wins over every regex; regexes are tried in
    /// configuration order and the first match wins.
    pub fn resolve(&self, path: &str) -> Option<&Arc<Route>> {
        if let Some(route) = self.exact.get(path) {
            return Some(route);
        }
        self.patterns
            .iter()
            .find(|(pattern, _)| pattern.is_match(path))
            .map(|(_, route)| route)
    }

    /// Number of routes (exact plus regex)
    #[inline]
    pub fn len(&self) -> usize {
        self.exact.len() + self.patterns.len()
    }

    /// Check whether the table has no routes
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.exact.is_empty() && self.patterns.is_empty()
    }

    /// Iterate all routes (exact first, then regex in order)
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Route>> {
        self.exact
            .values()
            .chain(self.patterns.iter().map(|(_, route)| route))
    }
}

/// Builder collecting routes during startup
#[derive(Debug, Default)]
pub struct RouteTableBuilder {
    table: RouteTable,
}

impl RouteTableBuilder {
    /// Create an empty builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a compiled route
    ///
    /// Regex routes compile their pattern here, so a bad pattern aborts
    /// startup rather than silently never matching.
    pub fn add(&mut self, route: Route) -> Result<()> {
        tracing::info!(
            url = %route.url,
            service = %route.service,
            conv = %route.conv,
            errors = %route.errors,
            async_call = route.async_call,
            "registering route"
        );

        let route = Arc::new(route);
        match route.format {
            UrlFormat::Exact => {
                if self
                    .table
                    .exact
                    .insert(route.url.clone(), Arc::clone(&route))
                    .is_some()
                {
                    return Err(RoutingError::duplicate(&route.url));
                }
            }
            UrlFormat::Regex => {
                let pattern = Regex::new(&route.url)
                    .map_err(|e| RoutingError::bad_pattern(&route.url, e))?;
                self.table.patterns.push((pattern, route));
            }
        }
        Ok(())
    }

    /// Finish building
    #[must_use]
    pub fn build(self) -> RouteTable {
        self.table
    }
}
