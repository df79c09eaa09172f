//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Detect conflicting single-file routes
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::AppConfig;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("path prefix {0:?} must start with '/'")]
    InvalidPrefix(String),

    #[error("file route {0:?} must start with '/'")]
    InvalidRoute(String),

    #[error("file route {0:?} uses capture or wildcard syntax; routes must be literal paths")]
    UnsupportedRouteSyntax(String),

    #[error("file route {0:?} is declared more than once")]
    DuplicateRoute(String),

    #[error("index_file {0:?} must be a bare file name")]
    InvalidIndexFile(String),

    #[error("{field} {value:?} is not a socket address")]
    InvalidAddress { field: &'static str, value: String },

    #[error("timeouts.request_secs must be greater than zero")]
    ZeroTimeout,
}

pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    for prefix in config.paths.keys() {
        if !prefix.starts_with('/') {
            errors.push(ValidationError::InvalidPrefix(prefix.clone()));
        }
    }

    let mut seen = HashSet::new();
    for file in &config.files {
        if !file.route.starts_with('/') {
            errors.push(ValidationError::InvalidRoute(file.route.clone()));
        } else if !is_literal_route(&file.route) {
            errors.push(ValidationError::UnsupportedRouteSyntax(file.route.clone()));
        }
        if !seen.insert(file.route.as_str()) {
            errors.push(ValidationError::DuplicateRoute(file.route.clone()));
        }
    }

    if let Some(index) = &config.static_files.index_file {
        if index.contains('/') {
            errors.push(ValidationError::InvalidIndexFile(index.clone()));
        }
    }

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// The router treats `{`, `}` and `*` as captures and rejects `:` segments.
fn is_literal_route(route: &str) -> bool {
    !route.contains(['{', '}', '*'])
        && !route.split('/').any(|segment| segment.starts_with(':'))
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}
