//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, ports valid)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;

use crate::config::schema::ServiceConfig;
use crate::observability::logging::parse_level;

/// A single semantic problem with a loaded configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.host must not be empty")]
    EmptyHost,

    #[error("listener.port must be a valid TCP port (1-65535), got {0}")]
    InvalidPort(u16),

    #[error("timeouts.{0} must be > 0")]
    ZeroTimeout(&'static str),

    #[error("logging.level {0:?} is not one of trace, debug, info, warn, error")]
    UnknownLogLevel(String),

    #[error("service.name must not be empty")]
    EmptyServiceName,
}

pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.host.trim().is_empty() {
        errors.push(ValidationError::EmptyHost);
    }
    if config.listener.port == 0 {
        errors.push(ValidationError::InvalidPort(config.listener.port));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("request_secs"));
    }
    if config.timeouts.shutdown_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("shutdown_secs"));
    }
    if parse_level(&config.logging.level).is_none() {
        errors.push(ValidationError::UnknownLogLevel(config.logging.level.clone()));
    }
    if config.service.name.trim().is_empty() {
        errors.push(ValidationError::EmptyServiceName);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
