//! hrapp: employee directory service with a supervised server lifecycle.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌──────────────────────────────────────────────────────┐
//!                 │                    Orchestrator                      │
//!   SIGTERM ─────▶│  trigger queue ◀── service exit ◀── admin failure    │
//!   SIGINT        │        │                                             │
//!                 │        ▼                                             │
//!                 │  health gate ───────────▶ AdminServer /health        │
//!                 │                                       /metrics       │
//!                 │  SHUTDOWN ──┬──▶ RpcServer (hrapp.Hrapp, grpc.health)│
//!                 │             └──▶ HttpServer (/employees/{id})        │
//!                 │                        │                             │
//!                 │                        ▼                             │
//!                 │                  EmployeeStore                       │
//!                 └──────────────────────────────────────────────────────┘
//! ```

pub mod admin;
pub mod config;
pub mod employees;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod rpc;
pub mod service;

pub use config::HrappConfig;
pub use lifecycle::{LifecycleError, Orchestrator, OrchestratorHandle};
pub use service::{Command, HostedService, ServiceError};
