//! CORS layer construction.
//!
//! The layer is built from [`CorsConfig`] rather than hard-coded origins so
//! deployments can point the API at whatever host serves the frontend. A
//! wildcard origin is only honoured for non-credentialed setups; combined
//! with credentials it would let any site ride the user's cookies, and
//! `tower_http` rejects the combination outright.

use crate::config::CorsConfig;
use crate::error::{AppError, AppResult};
use http::{HeaderName, HeaderValue, Method};
use std::time::Duration;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer};

/// How long browsers may cache preflight responses.
const PREFLIGHT_MAX_AGE: Duration = Duration::from_secs(600);

/// Build the CORS layer described by `config`.
pub fn cors_layer(config: &CorsConfig) -> AppResult<CorsLayer> {
    let mut layer = CorsLayer::new()
        .allow_credentials(config.allow_credentials)
        .max_age(PREFLIGHT_MAX_AGE);

    if has_wildcard(&config.allowed_origins) {
        if config.allow_credentials {
            return Err(AppError::Configuration(
                "ALLOWED_ORIGINS cannot be '*' when CORS_ALLOW_CREDENTIALS is enabled; \
                 list the origins explicitly"
                    .to_string(),
            ));
        }
        layer = layer.allow_origin(Any);
    } else {
        let origins = config
            .allowed_origins
            .iter()
            .map(|origin| {
                origin.parse::<HeaderValue>().map_err(|_| {
                    AppError::Configuration(format!(
                        "Invalid origin '{}' in ALLOWED_ORIGINS",
                        origin
                    ))
                })
            })
            .collect::<AppResult<Vec<_>>>()?;
        tracing::info!("CORS configured for {} allowed origin(s)", origins.len());
        layer = layer.allow_origin(AllowOrigin::list(origins));
    }

    if has_wildcard(&config.allowed_methods) {
        // With credentials the allow-methods header cannot be a literal '*',
        // so echo whatever method the preflight asks for instead.
        layer = if config.allow_credentials {
            layer.allow_methods(AllowMethods::mirror_request())
        } else {
            layer.allow_methods(Any)
        };
    } else {
        let methods = config
            .allowed_methods
            .iter()
            .map(|method| {
                Method::from_bytes(method.as_bytes()).map_err(|_| {
                    AppError::Configuration(format!(
                        "Invalid method '{}' in CORS_ALLOWED_METHODS",
                        method
                    ))
                })
            })
            .collect::<AppResult<Vec<_>>>()?;
        layer = layer.allow_methods(methods);
    }

    if has_wildcard(&config.allowed_headers) {
        layer = if config.allow_credentials {
            layer.allow_headers(AllowHeaders::mirror_request())
        } else {
            layer.allow_headers(Any)
        };
    } else {
        let headers = config
            .allowed_headers
            .iter()
            .map(|header| {
                HeaderName::from_bytes(header.as_bytes()).map_err(|_| {
                    AppError::Configuration(format!(
                        "Invalid header '{}' in CORS_ALLOWED_HEADERS",
                        header
                    ))
                })
            })
            .collect::<AppResult<Vec<_>>>()?;
        layer = layer.allow_headers(headers);
    }

    Ok(layer)
}

fn has_wildcard(values: &[String]) -> bool {
    values.iter().any(|v| v == "*")
}
