//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse, status codes)
//! - Check route names are unique and patterns are well formed
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RouterConfig → Result<(), Vec<ValidationError>>
//! - Tree conflicts are left to compilation, which reports the clashing route

use std::collections::HashSet;
use std::fmt;
use std::net::SocketAddr;

use axum::http::{Method, StatusCode};

use crate::config::schema::{EndpointConfig, RouterConfig};

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Catch-all suffix required by `files` routes.
pub const FILES_SUFFIX: &str = "/*filepath";

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub fn validate_config(config: &RouterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }
    if config.listener.request_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "listener.request_timeout_secs",
            "must be greater than zero",
        ));
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("unknown level '{}'", config.observability.log_level),
        ));
    }
    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!(
                "'{}' is not a socket address",
                config.observability.metrics_address
            ),
        ));
    }

    let mut names = HashSet::new();
    for (i, route) in config.routes.iter().enumerate() {
        let field = |name: &str| format!("routes[{i}].{name}");

        if route.name.trim().is_empty() {
            errors.push(ValidationError::new(field("name"), "must not be empty"));
        } else if !names.insert(route.name.as_str()) {
            errors.push(ValidationError::new(
                field("name"),
                format!("duplicate route name '{}'", route.name),
            ));
        }

        if Method::from_bytes(route.method.as_bytes()).is_err() {
            errors.push(ValidationError::new(
                field("method"),
                format!("'{}' is not an HTTP method", route.method),
            ));
        }

        if !route.pattern.starts_with('/') {
            errors.push(ValidationError::new(
                field("pattern"),
                format!("'{}' must begin with '/'", route.pattern),
            ));
        }

        match &route.endpoint {
            EndpointConfig::Echo => {}
            EndpointConfig::Text { status, .. } => {
                if StatusCode::from_u16(*status).is_err() {
                    errors.push(ValidationError::new(
                        field("endpoint.status"),
                        format!("{status} is not a valid status code"),
                    ));
                }
            }
            EndpointConfig::Files { .. } => {
                if !route.pattern.ends_with(FILES_SUFFIX) {
                    errors.push(ValidationError::new(
                        field("pattern"),
                        format!("files routes must end with '{FILES_SUFFIX}'"),
                    ));
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
