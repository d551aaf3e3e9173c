//! Process-level gateway settings

use std::path::PathBuf;

use crate::error::{ConfigError, Result};
use crate::section::Section;

/// Default worker-pool size
pub const DEFAULT_WORKERS: usize = 10;

/// TLS listener settings
#[derive(Debug, Clone)]
pub struct TlsConfig {
    /// PEM certificate chain
    pub cert_file: PathBuf,
    /// PEM private key
    pub key_file: PathBuf,
}

/// Process-level settings read from the section's scalar keys
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Bind address (required)
    pub ip: String,
    /// Bind port (required)
    pub port: u16,
    /// Worker-pool size
    pub workers: usize,
    /// Logger directive string applied process-wide once parsed
    pub debug: Option<String>,
    /// Restore the default SIGSEGV handler so crashes produce core dumps
    pub gencore: bool,
    /// TLS settings when `tls_enable` is set
    pub tls: Option<TlsConfig>,
    /// Path to the view definition file
    pub views: Option<PathBuf>,
}

impl GatewayConfig {
    /// Parse the scalar keys of a section
    pub fn from_section(section: &Section) -> Result<Self> {
        let ip = section
            .get("ip")
            .ok_or_else(|| ConfigError::missing_key("ip"))?
            .to_string();

        let port: u16 = section
            .get("port")
            .ok_or_else(|| ConfigError::missing_key("port"))?
            .parse()
            .map_err(|_| ConfigError::invalid_key("port", "not a port number"))?;

        let workers = match section.get("workers") {
            Some(raw) => raw
                .parse::<usize>()
                .ok()
                .filter(|w| *w > 0)
                .ok_or_else(|| ConfigError::invalid_key("workers", "must be a positive integer"))?,
            None => DEFAULT_WORKERS,
        };

        let tls = if parse_flag(section.get("tls_enable")) {
            let cert_file = section
                .get("tls_cert_file")
                .ok_or_else(|| ConfigError::missing_key("tls_cert_file"))?;
            let key_file = section
                .get("tls_key_file")
                .ok_or_else(|| ConfigError::missing_key("tls_key_file"))?;
            Some(TlsConfig {
                cert_file: PathBuf::from(cert_file),
                key_file: PathBuf::from(key_file),
            })
        } else {
            None
        };

        Ok(Self {
            ip,
            port,
            workers,
            debug: section.get("debug").map(str::to_string),
            gencore: parse_flag(section.get("gencore")),
            tls,
            views: section.get("views").map(PathBuf::from),
        })
    }

    /// `ip:port` string for the listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.ip, self.port)
    }
}

/// Registry flags arrive as "1"/"0" or "true"/"false"
fn parse_flag(value: Option<&str>) -> bool {
    matches!(value, Some("1") | Some("true"))
}
