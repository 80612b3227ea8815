//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges and well-formedness (scope URL, bind address)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: TransportConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use url::Url;

use crate::config::schema::TransportConfig;

/// A single semantic validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    EmptyField(&'static str),
    InvalidScope(String),
    InvalidAddress(String),
    InvalidLogLevel(String),
    ZeroTimeout(&'static str),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::EmptyField(field) => write!(f, "{} must not be empty", field),
            ValidationError::InvalidScope(scope) => {
                write!(f, "scope {:?} is not an https URL", scope)
            }
            ValidationError::InvalidAddress(addr) => {
                write!(f, "{:?} is not a valid socket address", addr)
            }
            ValidationError::InvalidLogLevel(level) => {
                write!(f, "unknown log level {:?}", level)
            }
            ValidationError::ZeroTimeout(field) => write!(f, "{} must be greater than zero", field),
        }
    }
}

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a loaded configuration, collecting every error found.
pub fn validate_config(config: &TransportConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.gcs.scope.trim().is_empty() {
        errors.push(ValidationError::EmptyField("gcs.scope"));
    } else if !is_https_url(&config.gcs.scope) {
        errors.push(ValidationError::InvalidScope(config.gcs.scope.clone()));
    }

    if config.gcs.token_env.trim().is_empty() {
        errors.push(ValidationError::EmptyField("gcs.token_env"));
    }

    if config.gcs.connect_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("gcs.connect_timeout_secs"));
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::InvalidAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if !LOG_LEVELS.contains(&config.observability.log_level.as_str()) {
        errors.push(ValidationError::InvalidLogLevel(
            config.observability.log_level.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Cloud-storage OAuth scopes are https URLs by convention.
pub(crate) fn is_https_url(value: &str) -> bool {
    matches!(Url::parse(value), Ok(url) if url.scheme() == "https")
}
