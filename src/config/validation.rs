//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Backend URLs parse, use plain http, and are unique
//! - Timeouts and intervals are non-zero
//! - Bind addresses parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use url::Url;

use crate::config::schema::ProxyConfig;

/// Upper bound for every interval and timeout, in seconds (one day).
pub const MAX_DURATION_SECS: u64 = 86_400;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
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

pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    let mut seen = HashSet::new();
    for (i, backend) in config.backends.iter().enumerate() {
        let field = format!("backends[{}].url", i);
        match Url::parse(&backend.url) {
            Ok(url) => {
                if url.scheme() != "http" {
                    errors.push(ValidationError::new(
                        &field,
                        format!("unsupported scheme '{}', only http is proxied", url.scheme()),
                    ));
                }
                if url.host_str().is_none() {
                    errors.push(ValidationError::new(&field, "missing host"));
                }
                if !seen.insert(url.as_str().trim_end_matches('/').to_string()) {
                    errors.push(ValidationError::new(
                        &field,
                        format!("duplicate backend '{}'", backend.url),
                    ));
                }
            }
            Err(e) => {
                errors.push(ValidationError::new(&field, format!("invalid url '{}': {}", backend.url, e)));
            }
        }
    }

    check_duration(&mut errors, "health_check.interval_secs", config.health_check.interval_secs);
    check_duration(&mut errors, "health_check.timeout_secs", config.health_check.timeout_secs);
    if !config.health_check.path.starts_with('/') {
        errors.push(ValidationError::new("health_check.path", "must start with '/'"));
    }
    check_duration(&mut errors, "timeouts.request_secs", config.timeouts.request_secs);

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if config.admin.enabled {
        if config.admin.bind_address.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::new(
                "admin.bind_address",
                format!("'{}' is not a socket address", config.admin.bind_address),
            ));
        }
        if config.admin.api_key.is_empty() {
            errors.push(ValidationError::new("admin.api_key", "must not be empty"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_duration(errors: &mut Vec<ValidationError>, field: &str, secs: u64) {
    if secs == 0 {
        errors.push(ValidationError::new(field, "must be greater than 0"));
    } else if secs > MAX_DURATION_SECS {
        errors.push(ValidationError::new(
            field,
            format!("must be at most {} seconds", MAX_DURATION_SECS),
        ));
    }
}
