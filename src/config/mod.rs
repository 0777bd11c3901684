//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → command-line overrides (main.rs)
//!     → HrappConfig (fully resolved before any server init)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no hot reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    AdminConfig, HrappConfig, HttpConfig, LifecycleConfig, LogFormat, MutualTlsConfig,
    ObservabilityConfig, RpcConfig, ServiceConfig, StoreConfig, TlsConfig,
};
pub use validation::{validate_config, ValidationError};
