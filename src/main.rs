//! hrapp server entry point.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use hrapp::config::{self, HrappConfig};
use hrapp::employees::{DirectoryRoutes, EmployeeStore, MemoryStore};
use hrapp::http::HttpServer;
use hrapp::lifecycle::Orchestrator;
use hrapp::observability::{init_logging, metrics};
use hrapp::rpc::{EmployeeHandler, RpcServer};

#[derive(Parser, Debug)]
#[command(name = "hrapp", version, about = "Employee directory server")]
struct Args {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Admin sidecar listen address (health and metrics).
    #[arg(long)]
    admin_address: Option<String>,

    /// RPC listen address.
    #[arg(long)]
    svc_address: Option<String>,

    /// HTTP directory listen address.
    #[arg(long)]
    http_address: Option<String>,

    /// Require mutual TLS on the RPC listener.
    #[arg(long)]
    tls_enabled: Option<bool>,

    #[arg(long)]
    certpath: Option<String>,

    #[arg(long)]
    keypath: Option<String>,

    /// Trust root for client certificates.
    #[arg(long)]
    capath: Option<String>,

    /// JSON file with employee records.
    #[arg(long)]
    seed: Option<PathBuf>,
}

impl Args {
    fn apply(self, config: &mut HrappConfig) {
        if let Some(address) = self.admin_address {
            config.admin.listen_address = address;
        }
        if let Some(address) = self.svc_address {
            config.rpc.listen_address = address;
        }
        if let Some(address) = self.http_address {
            config.http.listen_address = address;
        }
        if let Some(enabled) = self.tls_enabled {
            config.rpc.tls.enabled = enabled;
        }
        if let Some(path) = self.certpath {
            config.rpc.tls.cert_path = path;
        }
        if let Some(path) = self.keypath {
            config.rpc.tls.key_path = path;
        }
        if let Some(path) = self.capath {
            config.rpc.tls.ca_path = path;
        }
        if let Some(path) = self.seed {
            config.store.seed_path = Some(path.display().to_string());
        }
    }
}

fn load(args: Args) -> Result<HrappConfig, config::ConfigError> {
    let mut config = match &args.config {
        Some(path) => config::load_config(path)?,
        None => HrappConfig::default(),
    };
    args.apply(&mut config);
    config::validate_config(&config).map_err(config::ConfigError::Validation)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = match load(Args::parse()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("hrapp: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging(&config.observability) {
        eprintln!("hrapp: {e}");
        return ExitCode::FAILURE;
    }

    tracing::info!(
        name = %config.service.name,
        version = %config.service.version,
        admin = %config.admin.listen_address,
        rpc = %config.rpc.listen_address,
        http = %config.http.listen_address,
        tls = config.rpc.tls.enabled,
        "hrapp starting"
    );

    let store: Arc<dyn EmployeeStore> = match &config.store.seed_path {
        Some(path) => match MemoryStore::load(Path::new(path)) {
            Ok(store) => Arc::new(store),
            Err(e) => {
                tracing::error!(error = %e, "Failed to load employee store");
                return ExitCode::FAILURE;
            }
        },
        None => Arc::new(MemoryStore::new()),
    };

    let mut builder = Orchestrator::builder(config.clone())
        .metrics(metrics::install_recorder(&config.service))
        .service(RpcServer::new(
            config.rpc.clone(),
            Box::new(EmployeeHandler::new(store.clone())),
        ));
    if config.http.enabled {
        builder = builder.service(HttpServer::new(
            config.http.clone(),
            Box::new(DirectoryRoutes::new(store)),
        ));
    }

    match builder.build().run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "hrapp exiting");
            ExitCode::from(e.exit_code())
        }
    }
}
