//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the hrapp server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct HrappConfig {
    /// Service identity used for logging and metric labels.
    pub service: ServiceConfig,

    /// Admin sidecar (health + metrics).
    pub admin: AdminConfig,

    /// RPC server.
    pub rpc: RpcConfig,

    /// HTTP server hosting the employee directory routes.
    pub http: HttpConfig,

    /// Orchestrator timing.
    pub lifecycle: LifecycleConfig,

    /// Employee store.
    pub store: StoreConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Service identity.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub name: String,
    pub version: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: std::env::var("SERVICE_NAME").unwrap_or_else(|_| "hrapp".to_string()),
            version: std::env::var("SERVICE_VERSION").unwrap_or_else(|_| "v1-0".to_string()),
        }
    }
}

/// Admin sidecar configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Bind address (e.g., "127.0.0.1:8080").
    pub listen_address: String,

    /// Bounded drain for in-flight probe/scrape requests on shutdown.
    pub shutdown_grace_secs: u64,
}

impl AdminConfig {
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            listen_address: "127.0.0.1:8080".to_string(),
            shutdown_grace_secs: 5,
        }
    }
}

/// RPC server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RpcConfig {
    /// Bind address (e.g., "127.0.0.1:8085").
    pub listen_address: String,

    /// Bounded drain before open connections are force-closed.
    pub shutdown_grace_secs: u64,

    /// Mutual TLS settings.
    pub tls: MutualTlsConfig,
}

impl RpcConfig {
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            listen_address: "127.0.0.1:8085".to_string(),
            shutdown_grace_secs: 10,
            tls: MutualTlsConfig::default(),
        }
    }
}

/// Mutual TLS for the RPC server. When enabled, clients must present a certificate
/// that chains to `ca_path`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MutualTlsConfig {
    pub enabled: bool,

    /// Trust root for client certificates (PEM).
    pub ca_path: String,

    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

impl Default for MutualTlsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            ca_path: "certs/root-ca.crt".to_string(),
            cert_path: "certs/server.crt".to_string(),
            key_path: "certs/server.key".to_string(),
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Host the HTTP server at all.
    pub enabled: bool,

    /// Bind address (e.g., "127.0.0.1:8086").
    pub listen_address: String,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Bounded drain before open connections are force-closed.
    pub shutdown_grace_secs: u64,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,
}

impl HttpConfig {
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            listen_address: "127.0.0.1:8086".to_string(),
            request_timeout_secs: 30,
            shutdown_grace_secs: 10,
            tls: None,
        }
    }
}

/// Server-side TLS for the HTTP listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Orchestrator timing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Delay between starting the servers and reporting healthy.
    pub warmup_ms: u64,

    /// How long shutdown waits for every hosted service to return.
    pub shutdown_grace_secs: u64,

    /// Install SIGHUP/SIGINT/SIGTERM handlers.
    pub trap_signals: bool,
}

impl LifecycleConfig {
    pub fn warmup(&self) -> Duration {
        Duration::from_millis(self.warmup_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            warmup_ms: 2000,
            shutdown_grace_secs: 15,
            trap_signals: true,
        }
    }
}

/// Employee store configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct StoreConfig {
    /// JSON file with the employee records to serve. Empty store when unset.
    pub seed_path: Option<String>,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}
