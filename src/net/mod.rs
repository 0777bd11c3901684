//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Server init
//!     → listener.rs (parse address, bind, non-blocking)
//!     → tls.rs (optional: load identity + trust root)
//!     → handed to the transport when the server runs
//! ```
//!
//! # Design Decisions
//! - Binding happens at init, accepting only at run
//! - TLS is a deployment-time switch, never negotiated at runtime

pub mod listener;
pub mod tls;

pub use listener::{bind, BindError};
pub use tls::CertificateError;
