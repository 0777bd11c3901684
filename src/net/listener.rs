//! Listener binding.
//!
//! # Responsibilities
//! - Parse and bind configured listen addresses
//! - Hand out non-blocking std listeners so binding never needs a runtime
//! - Report bind failures with the offending address

use std::net::{SocketAddr, TcpListener};

use thiserror::Error;

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum BindError {
    /// The configured address is not a valid socket address.
    #[error("invalid listen address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    /// The OS refused the bind (address in use, permission denied, ...).
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

/// Parse a listen address such as `127.0.0.1:8080`.
pub fn parse_address(address: &str) -> Result<SocketAddr, BindError> {
    address.parse().map_err(|e: std::net::AddrParseError| BindError::InvalidAddress {
        address: address.to_string(),
        reason: e.to_string(),
    })
}

/// Bind a TCP listener on `address`.
///
/// The listener is switched to non-blocking mode so it can be handed to tokio later
/// (`TcpListener::from_std`) without accepting anything yet.
pub fn bind(address: &str) -> Result<TcpListener, BindError> {
    let addr = parse_address(address)?;

    let listener = TcpListener::bind(addr).map_err(|source| BindError::Bind {
        address: address.to_string(),
        source,
    })?;
    listener
        .set_nonblocking(true)
        .map_err(|source| BindError::Bind {
            address: address.to_string(),
            source,
        })?;

    let local_addr = listener.local_addr().map_err(|source| BindError::Bind {
        address: address.to_string(),
        source,
    })?;

    tracing::info!(address = %local_addr, "Listener bound");

    Ok(listener)
}
