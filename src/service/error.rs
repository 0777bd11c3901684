//! Errors raised by hosted services.

use std::time::Duration;

use thiserror::Error;

use crate::net::{BindError, CertificateError};

#[derive(Debug, Error)]
pub enum ServiceError {
    /// A required resource is unavailable at init. Fatal to the whole process.
    #[error("{service}: initialization failed: {reason}")]
    Initialization { service: String, reason: String },

    #[error(transparent)]
    Bind(#[from] BindError),

    #[error(transparent)]
    Certificate(#[from] CertificateError),

    /// The accept loop failed after the server had started.
    #[error("{service}: serve failed: {reason}")]
    Serve { service: String, reason: String },

    /// In-flight work did not drain within the grace period; connections were force-closed.
    #[error("{service}: did not stop within {grace:?}")]
    ShutdownTimeout { service: String, grace: Duration },

    /// `run` was called before a successful `init`, or twice.
    #[error("{service}: not initialized")]
    NotInitialized { service: String },
}

impl ServiceError {
    pub fn initialization(service: &str, reason: impl ToString) -> Self {
        Self::Initialization {
            service: service.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn serve(service: &str, reason: impl ToString) -> Self {
        Self::Serve {
            service: service.to_string(),
            reason: reason.to_string(),
        }
    }
}
