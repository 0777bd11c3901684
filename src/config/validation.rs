//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (grace periods > 0, addresses parse)
//! - Detect listeners that would collide
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: HrappConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashMap;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::HrappConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &HrappConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.service.name.trim().is_empty() {
        errors.push(ValidationError::new("service.name", "must not be empty"));
    }

    let mut listeners = vec![
        ("admin.listen_address", config.admin.listen_address.as_str()),
        ("rpc.listen_address", config.rpc.listen_address.as_str()),
    ];
    if config.http.enabled {
        listeners.push(("http.listen_address", config.http.listen_address.as_str()));
    }

    let mut seen: HashMap<SocketAddr, &str> = HashMap::new();
    for (field, address) in listeners {
        match address.parse::<SocketAddr>() {
            Ok(addr) => {
                // port 0 asks the OS for a fresh port, so it never collides
                if addr.port() != 0 {
                    if let Some(other) = seen.insert(addr, field) {
                        errors.push(ValidationError::new(
                            field,
                            format!("{address} is already used by {other}"),
                        ));
                    }
                }
            }
            Err(e) => errors.push(ValidationError::new(
                field,
                format!("'{address}' is not a socket address: {e}"),
            )),
        }
    }

    if config.rpc.tls.enabled {
        for (field, path) in [
            ("rpc.tls.ca_path", &config.rpc.tls.ca_path),
            ("rpc.tls.cert_path", &config.rpc.tls.cert_path),
            ("rpc.tls.key_path", &config.rpc.tls.key_path),
        ] {
            if path.trim().is_empty() {
                errors.push(ValidationError::new(field, "required when TLS is enabled"));
            }
        }
    }

    if let Some(tls) = &config.http.tls {
        if tls.cert_path.trim().is_empty() {
            errors.push(ValidationError::new("http.tls.cert_path", "must not be empty"));
        }
        if tls.key_path.trim().is_empty() {
            errors.push(ValidationError::new("http.tls.key_path", "must not be empty"));
        }
    }

    for (field, secs) in [
        ("admin.shutdown_grace_secs", config.admin.shutdown_grace_secs),
        ("rpc.shutdown_grace_secs", config.rpc.shutdown_grace_secs),
        ("http.shutdown_grace_secs", config.http.shutdown_grace_secs),
        ("lifecycle.shutdown_grace_secs", config.lifecycle.shutdown_grace_secs),
        ("http.request_timeout_secs", config.http.request_timeout_secs),
    ] {
        if secs == 0 {
            errors.push(ValidationError::new(field, "must be greater than zero"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
