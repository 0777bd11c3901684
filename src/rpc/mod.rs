//! RPC adapter.
//!
//! # Data Flow
//! ```text
//! init():  bind → load mutual TLS (optional) → RpcHandler::init → register routes
//! run():   serve until SHUTDOWN, health service reports SERVING
//! SHUTDOWN: NOT_SERVING → RpcHandler::shutdown → stop accepting → drain (bounded)
//! ```
//!
//! With TLS enabled, clients must present a certificate issued by the configured
//! trust root. With TLS disabled the channel is plaintext and unauthenticated.

pub mod client;
pub mod handler;
pub mod proto;
pub mod server;

pub use client::{connect, fetch_hierarchy, ClientError, ClientTls};
pub use handler::{EmployeeHandler, RpcHandler};
pub use proto::hrapp_client::HrappClient;
pub use server::RpcServer;
