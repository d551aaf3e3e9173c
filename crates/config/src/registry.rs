//! Configuration registry access
//!
//! In production the section comes from the middleware's configuration
//! service: a record with a `g`et command and the lookup section name is
//! sent to `@CCONF`, and the reply carries the section as repeated
//! key/value occurrence pairs.

use restin_protocol::{CallOptions, ClientContext, Record, TypedBuffer};

use crate::error::{ConfigError, Result};
use crate::section::Section;

/// Section name of this gateway in the configuration registry
pub const CONFIG_SECTION: &str = "@restin";

/// Fetch this gateway's section from the configuration registry
///
/// `cctag` scopes the lookup (`@restin/<cctag>`); an empty tag queries the
/// bare section.
pub async fn fetch_section(ctx: &mut dyn ClientContext, cctag: &str) -> Result<Section> {
    let lookup = if cctag.is_empty() {
        CONFIG_SECTION.to_string()
    } else {
        format!("{CONFIG_SECTION}/{cctag}")
    };

    let mut request = Record::new();
    request.set("EX_CC_CMD", "g");
    request.set("EX_CC_LOOKUPSECTION", lookup);

    let reply = ctx
        .call("@CCONF", TypedBuffer::Record(request), CallOptions::default())
        .await
        .map_err(|e| ConfigError::registry(e.to_string()))?;

    let record = reply
        .as_record()
        .ok_or_else(|| ConfigError::registry("@CCONF reply is not a record"))?;

    let keys = record.occurrences("EX_CC_KEY");
    let values = record.occurrences("EX_CC_VALUE");
    if keys.len() != values.len() {
        return Err(ConfigError::registry(format!(
            "@CCONF reply has {} keys but {} values",
            keys.len(),
            values.len()
        )));
    }

    let mut pairs = Vec::with_capacity(keys.len());
    for (key, value) in keys.iter().zip(values) {
        let (Some(key), Some(value)) = (key.as_str(), value.as_str()) else {
            return Err(ConfigError::registry("@CCONF reply fields are not strings"));
        };
        pairs.push((key.to_string(), value.to_string()));
    }

    tracing::debug!(pairs = pairs.len(), "configuration section fetched");
    Ok(Section::from_pairs(pairs))
}
