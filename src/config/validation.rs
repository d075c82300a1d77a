//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, context window > 0)
//! - Check that CORS entries are legal header values, methods and header names
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServeConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::{HeaderName, HeaderValue, Method};
use thiserror::Error;

use crate::config::schema::{ServeConfig, WILDCARD};

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address {value:?}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field}: must be greater than zero")]
    Zero { field: &'static str },

    #[error("{field}: must not be empty")]
    Empty { field: &'static str },

    #[error("cors.allowed_origins: {0:?} is not a valid origin")]
    InvalidOrigin(String),

    #[error("cors.allowed_methods: {0:?} is not a valid HTTP method")]
    InvalidMethod(String),

    #[error("cors.allowed_headers: {0:?} is not a valid header name")]
    InvalidHeader(String),

    #[error("observability.log_level: unknown level {0:?}")]
    InvalidLogLevel(String),
}

/// Check a parsed configuration, collecting every problem.
pub fn validate_config(config: &ServeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.listener.request_timeout_secs == 0 {
        errors.push(ValidationError::Zero { field: "listener.request_timeout_secs" });
    }

    let cors = &config.cors;
    if cors.allowed_origins.is_empty() {
        errors.push(ValidationError::Empty { field: "cors.allowed_origins" });
    }
    for origin in cors.allowed_origins.iter().filter(|o| *o != WILDCARD) {
        if HeaderValue::from_str(origin).is_err() || !origin.contains("://") {
            errors.push(ValidationError::InvalidOrigin(origin.clone()));
        }
    }
    for method in cors.allowed_methods.iter().filter(|m| *m != WILDCARD) {
        if Method::from_bytes(method.as_bytes()).is_err() {
            errors.push(ValidationError::InvalidMethod(method.clone()));
        }
    }
    for header in cors.allowed_headers.iter().filter(|h| *h != WILDCARD) {
        if HeaderName::from_bytes(header.as_bytes()).is_err() {
            errors.push(ValidationError::InvalidHeader(header.clone()));
        }
    }

    let observability = &config.observability;
    if !matches!(
        observability.log_level.to_ascii_lowercase().as_str(),
        "trace" | "debug" | "info" | "warn" | "error"
    ) {
        errors.push(ValidationError::InvalidLogLevel(observability.log_level.clone()));
    }
    if observability.metrics_enabled && observability.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: observability.metrics_address.clone(),
        });
    }

    if config.engine.model_id.trim().is_empty() {
        errors.push(ValidationError::Empty { field: "engine.model_id" });
    }
    if config.engine.max_context_length == 0 {
        errors.push(ValidationError::Zero { field: "engine.max_context_length" });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
