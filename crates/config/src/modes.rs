//! Conversion and error-reporting modes
//!
//! A route's `conv` selects the payload codec; `errors` selects how backend
//! failures are reported to the HTTP client. The legacy spellings
//! (`json2record`-era `json2ubf` / `json2view`) are accepted so existing
//! registry sections keep working.

use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// Payload conversion mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvMode {
    /// JSON object ⇄ key-value record
    JsonRecord,
    /// Plain text ⇄ string buffer
    Text,
    /// JSON bytes passed through as a JSON buffer
    Json,
    /// Opaque bytes
    Raw,
    /// JSON object ⇄ named typed view
    JsonView,
    /// Static file serving (no backend call)
    Static,
    /// Opaque record for external filter pipelines
    Ext,
}

impl ConvMode {
    /// Canonical config string
    pub fn as_str(self) -> &'static str {
        match self {
            Self::JsonRecord => "json-record",
            Self::Text => "text",
            Self::Json => "json",
            Self::Raw => "raw",
            Self::JsonView => "json-view",
            Self::Static => "static",
            Self::Ext => "ext",
        }
    }
}

impl FromStr for ConvMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json-record" | "json2ubf" => Ok(Self::JsonRecord),
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "raw" => Ok(Self::Raw),
            "json-view" | "json2view" => Ok(Self::JsonView),
            "static" => Ok(Self::Static),
            "ext" => Ok(Self::Ext),
            other => Err(ConfigError::invalid_key(
                "conv",
                format!("unknown conversion mode '{other}'"),
            )),
        }
    }
}

impl fmt::Display for ConvMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error-reporting mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorsMode {
    /// Status code only
    Http,
    /// Formatted text body
    Text,
    /// Raw formatted body
    Raw,
    /// Error fields merged into the top-level JSON object
    Json,
    /// Error fields installed into the reply record
    JsonRecord,
    /// Error fields installed into the reply view
    JsonView,
    /// External mode: error chains produce the body verbatim
    Ext,
}

impl ErrorsMode {
    /// Canonical config string
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Text => "text",
            Self::Raw => "raw",
            Self::Json => "json",
            Self::JsonRecord => "json-record",
            Self::JsonView => "json-view",
            Self::Ext => "ext",
        }
    }

    /// Check this error mode against a conversion mode (the §4.7 matrix)
    ///
    /// `http`, `text` and `raw` report independently of the payload shape;
    /// the structured modes must match the reply buffer they annotate.
    pub fn compatible_with(self, conv: ConvMode) -> bool {
        match self {
            Self::Http | Self::Text | Self::Raw => true,
            Self::Json => matches!(
                conv,
                ConvMode::JsonRecord | ConvMode::Json | ConvMode::JsonView
            ),
            Self::JsonRecord => conv == ConvMode::JsonRecord,
            Self::JsonView => conv == ConvMode::JsonView,
            Self::Ext => conv == ConvMode::Ext,
        }
    }
}

impl FromStr for ErrorsMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "http" => Ok(Self::Http),
            "text" => Ok(Self::Text),
            "raw" => Ok(Self::Raw),
            "json" => Ok(Self::Json),
            "json-record" | "json2ubf" => Ok(Self::JsonRecord),
            "json-view" | "json2view" => Ok(Self::JsonView),
            "ext" => Ok(Self::Ext),
            other => Err(ConfigError::invalid_key(
                "errors",
                format!("unknown error mode '{other}'"),
            )),
        }
    }
}

impl fmt::Display for ErrorsMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a route's URL pattern is matched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UrlFormat {
    /// Exact path match
    #[default]
    Exact,
    /// Regular-expression match, checked after all exact routes
    Regex,
}

impl FromStr for UrlFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "exact" => Ok(Self::Exact),
            "r" | "regex" | "regexp" => Ok(Self::Regex),
            other => Err(ConfigError::invalid_key(
                "format",
                format!("unknown url format '{other}'"),
            )),
        }
    }
}
