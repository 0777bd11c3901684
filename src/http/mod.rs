//! HTTP adapter.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (axum-server, graceful stop via Handle)
//!     → timeout / trace / metrics layers
//!     → HttpHandler routes (e.g. employees::DirectoryRoutes)
//! ```

pub mod handler;
pub mod server;

pub use handler::HttpHandler;
pub use server::HttpServer;
