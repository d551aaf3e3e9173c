//! Configuration cross-checks
//!
//! Validates every route (and the `defaults` prototype) for internal
//! consistency before the gateway accepts the section. Any failure aborts
//! startup. Regex patterns are compiled - and therefore checked - when the
//! route table is built.

use std::str::FromStr;

use crate::error::{ConfigError, Result};
use crate::error_map::ErrorMap;
use crate::modes::{ConvMode, ErrorsMode, UrlFormat};
use crate::route::RouteConfig;
use crate::{Config, GatewayConfig};

/// Validate the parsed section
pub fn validate_config(config: &Config) -> Result<()> {
    validate_route("defaults", &config.defaults, &config.gateway)?;
    for (url, route) in &config.routes {
        validate_route(url, route, &config.gateway)?;
    }
    Ok(())
}

/// Validate one route definition
fn validate_route(url: &str, route: &RouteConfig, gateway: &GatewayConfig) -> Result<()> {
    let conv = ConvMode::from_str(&route.conv)
        .map_err(|_| ConfigError::route(url, format!("unknown conv '{}'", route.conv)))?;
    let errors = ErrorsMode::from_str(&route.errors)
        .map_err(|_| ConfigError::route(url, format!("unknown errors '{}'", route.errors)))?;
    UrlFormat::from_str(&route.format)
        .map_err(|_| ConfigError::route(url, format!("unknown format '{}'", route.format)))?;

    // conv and errors must agree on ext, and structured error modes must
    // match the payload they annotate
    if (conv == ConvMode::Ext) != (errors == ErrorsMode::Ext) {
        return Err(ConfigError::route(
            url,
            format!("conv '{}' requires matching errors mode, got '{}'", conv, errors),
        ));
    }
    if !errors.compatible_with(conv) {
        return Err(ConfigError::route(
            url,
            format!("errors '{}' is not usable with conv '{}'", errors, conv),
        ));
    }

    validate_filters(url, route, conv)?;
    validate_presentation(url, route, conv)?;
    validate_views(url, route, conv, errors, gateway)?;

    if !route.error_map.is_empty() {
        ErrorMap::parse(&route.error_map)
            .map_err(|e| ConfigError::route(url, format!("bad error_map: {e}")))?;
    }

    match conv {
        ConvMode::Static => {
            let dir = route.static_dir.as_str();
            if dir.is_empty() {
                return Err(ConfigError::route(url, "static route needs static_dir"));
            }
            let meta = std::fs::metadata(dir)
                .map_err(|_| ConfigError::route(url, format!("cannot stat '{dir}'")))?;
            if !meta.is_dir() {
                return Err(ConfigError::route(url, format!("'{dir}' is not a directory")));
            }
        }
        _ if url != "defaults" => {
            // Every dispatching route needs something to do
            let has_target = !route.service.is_empty()
                || route.echo
                || (conv == ConvMode::Ext && !RouteConfig::chain(&route.finman).is_empty());
            if !has_target {
                return Err(ConfigError::route(url, "route has no service, echo or filter chain"));
            }
        }
        _ => {}
    }

    Ok(())
}

/// Filter chains belong to the ext pipeline
fn validate_filters(url: &str, route: &RouteConfig, conv: ConvMode) -> Result<()> {
    if conv == ConvMode::Ext {
        return Ok(());
    }

    for (key, raw) in [
        ("finman", &route.finman),
        ("finopt", &route.finopt),
        ("finerr", &route.finerr),
        ("foutman", &route.foutman),
        ("foutopt", &route.foutopt),
        ("fouterr", &route.fouterr),
    ] {
        if !raw.trim().is_empty() {
            return Err(ConfigError::route(
                url,
                format!("'{key}' is only usable with conv 'ext' (got '{conv}')"),
            ));
        }
    }
    Ok(())
}

/// Header/cookie/form/upload flag rules
fn validate_presentation(url: &str, route: &RouteConfig, conv: ConvMode) -> Result<()> {
    if route.parse_cookies && !route.parse_headers {
        return Err(ConfigError::route(url, "parse_cookies requires parse_headers"));
    }
    if route.file_upload && route.parse_form {
        return Err(ConfigError::route(
            url,
            "file_upload and parse_form are mutually exclusive",
        ));
    }
    if conv != ConvMode::Ext {
        if route.file_upload {
            return Err(ConfigError::route(url, "file_upload is only usable with conv 'ext'"));
        }
        if route.parse_form {
            return Err(ConfigError::route(url, "parse_form is only usable with conv 'ext'"));
        }
    }
    Ok(())
}

/// View-mode requirements
fn validate_views(
    url: &str,
    route: &RouteConfig,
    conv: ConvMode,
    errors: ErrorsMode,
    gateway: &GatewayConfig,
) -> Result<()> {
    let uses_views = conv == ConvMode::JsonView || errors == ErrorsMode::JsonView;
    if uses_views && gateway.views.is_none() {
        return Err(ConfigError::route(
            url,
            "json-view routes need the 'views' definition file",
        ));
    }
    if route.errfmt_view_rsp_first && route.errfmt_view_rsp.is_empty() {
        return Err(ConfigError::route(
            url,
            "errfmt_view_rsp_first requires errfmt_view_rsp",
        ));
    }
    // An async submit failure has no parsed buffer to carry the error fields
    if errors == ErrorsMode::JsonView
        && route.async_call
        && !route.async_echo
        && route.errfmt_view_rsp.is_empty()
    {
        return Err(ConfigError::route(
            url,
            "async json-view routes without async_echo need errfmt_view_rsp",
        ));
    }
    Ok(())
}
