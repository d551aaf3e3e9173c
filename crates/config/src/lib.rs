//! Restin Configuration
//!
//! The gateway is configured through one registry **section**: an ordered
//! list of `(key, value)` pairs. Scalar keys configure the process
//! (`ip`, `port`, `workers`, ...); the `defaults` key holds a JSON route
//! prototype; every key starting with `/` is a URL pattern whose JSON value
//! overlays the prototype.
//!
//! Keys are processed in two passes so `defaults` applies to every route
//! regardless of where it appears in the section.
//!
//! # Example section (JSON document form)
//!
//! ```json
//! {
//!     "ip": "0.0.0.0",
//!     "port": 8080,
//!     "defaults": {"conv": "json-record", "errors": "json"},
//!     "/echo": {"service": "ECHOSVC"},
//!     "/v1/users/[0-9]+": {"service": "USERSVC", "format": "regex"}
//! }
//! ```

mod error;
mod error_map;
mod gateway;
mod modes;
mod registry;
mod route;
mod section;
mod validation;

pub use error::{ConfigError, Result};
pub use error_map::ErrorMap;
pub use gateway::{GatewayConfig, TlsConfig, DEFAULT_WORKERS};
pub use modes::{ConvMode, ErrorsMode, UrlFormat};
pub use registry::{fetch_section, CONFIG_SECTION};
pub use route::RouteConfig;
pub use section::Section;

/// Parsed configuration: process settings, the route prototype, and the
/// per-URL route configs in section order.
#[derive(Debug, Clone)]
pub struct Config {
    /// Process-level settings
    pub gateway: GatewayConfig,
    /// Route prototype cloned for every URL key
    pub defaults: RouteConfig,
    /// `(url, config)` pairs in section order
    pub routes: Vec<(String, RouteConfig)>,
}

impl Config {
    /// Parse and validate a configuration section
    ///
    /// # Errors
    ///
    /// Returns an error for unknown mode strings, malformed JSON values,
    /// missing `ip`/`port`, or any cross-check failure; startup must abort.
    pub fn from_section(section: &Section) -> Result<Self> {
        let gateway = GatewayConfig::from_section(section)?;

        // First pass: the route prototype
        let mut defaults = RouteConfig::default();
        if let Some(json) = section.get("defaults") {
            defaults = defaults.overlay("defaults", json)?;
        }

        // Second pass: URL keys, each an overlay of the prototype
        let mut routes = Vec::new();
        for (key, value) in section.iter() {
            if key.starts_with('/') {
                let cfg = defaults.overlay(key, value)?;
                tracing::info!(url = %key, service = %cfg.service, "route configured");
                routes.push((key.to_string(), cfg));
            }
        }

        let config = Self {
            gateway,
            defaults,
            routes,
        };
        validation::validate_config(&config)?;
        Ok(config)
    }
}
