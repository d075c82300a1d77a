//! Cross-origin policy.
//!
//! Translates [`CorsConfig`] into a `tower-http` [`CorsLayer`]. A literal `*`
//! cannot be combined with credentials, so when credentials are allowed each
//! wildcard mirrors the corresponding request header instead.

use axum::http::{HeaderName, HeaderValue, Method};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer};

use crate::config::schema::{CorsConfig, WILDCARD};
use crate::config::ValidationError;

fn has_wildcard(values: &[String]) -> bool {
    values.iter().any(|v| v == WILDCARD)
}

/// Build the CORS layer for a policy.
pub fn cors_layer(config: &CorsConfig) -> Result<CorsLayer, ValidationError> {
    let credentials = config.allow_credentials;

    let origin = if has_wildcard(&config.allowed_origins) {
        if credentials {
            AllowOrigin::mirror_request()
        } else {
            AllowOrigin::from(Any)
        }
    } else {
        let origins = config
            .allowed_origins
            .iter()
            .map(|o| {
                HeaderValue::from_str(o).map_err(|_| ValidationError::InvalidOrigin(o.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        AllowOrigin::list(origins)
    };

    let methods = if has_wildcard(&config.allowed_methods) {
        if credentials {
            AllowMethods::mirror_request()
        } else {
            AllowMethods::from(Any)
        }
    } else {
        let methods = config
            .allowed_methods
            .iter()
            .map(|m| {
                Method::from_bytes(m.as_bytes()).map_err(|_| ValidationError::InvalidMethod(m.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        AllowMethods::list(methods)
    };

    let headers = if has_wildcard(&config.allowed_headers) {
        if credentials {
            AllowHeaders::mirror_request()
        } else {
            AllowHeaders::from(Any)
        }
    } else {
        let headers = config
            .allowed_headers
            .iter()
            .map(|h| {
                HeaderName::from_bytes(h.as_bytes())
                    .map_err(|_| ValidationError::InvalidHeader(h.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        AllowHeaders::list(headers)
    };

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(methods)
        .allow_headers(headers)
        .allow_credentials(credentials))
}
