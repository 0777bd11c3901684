use std::path::PathBuf;

use clap::{Parser, Subcommand};

use hrapp::employees::EmployeeId;
use hrapp::rpc::{self, ClientTls};

#[derive(Parser)]
#[command(name = "hrapp-cli")]
#[command(about = "Management CLI for hrapp", long_about = None)]
struct Cli {
    /// Admin sidecar base URL.
    #[arg(short, long, default_value = "http://127.0.0.1:8080")]
    url: String,

    /// RPC server address (host:port).
    #[arg(long, default_value = "127.0.0.1:8085")]
    connect_addr: String,

    /// Client certificate for mutual TLS. Plaintext when omitted.
    #[arg(long, requires_all = ["keypath", "capath"])]
    certpath: Option<PathBuf>,

    #[arg(long)]
    keypath: Option<PathBuf>,

    #[arg(long)]
    capath: Option<PathBuf>,

    /// Server name to verify when using TLS.
    #[arg(long)]
    domain: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Probe /health
    Health,
    /// Dump /metrics
    Metrics,
    /// Fetch one employee over RPC
    Employee {
        id: i64,
        /// Resolve every report below the employee
        #[arg(long)]
        tree: bool,
        #[arg(long)]
        pretty: bool,
    },
}

impl Cli {
    fn tls(&self) -> Option<ClientTls> {
        match (&self.certpath, &self.keypath, &self.capath) {
            (Some(cert), Some(key), Some(ca)) => Some(ClientTls {
                ca_path: ca.clone(),
                cert_path: cert.clone(),
                key_path: key.clone(),
                domain: self.domain.clone(),
            }),
            _ => None,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Health => {
            let res = reqwest::get(format!("{}/health", cli.url)).await?;
            let status = res.status();
            println!("{}", status);
            if !status.is_success() {
                std::process::exit(1);
            }
        }
        Commands::Metrics => {
            let res = reqwest::get(format!("{}/metrics", cli.url)).await?;
            if !res.status().is_success() {
                eprintln!("Error: Admin API returned status {}", res.status());
                std::process::exit(1);
            }
            print!("{}", res.text().await?);
        }
        Commands::Employee { id, tree, pretty } => {
            let tls = cli.tls();
            let mut client = rpc::connect(&cli.connect_addr, tls.as_ref()).await?;

            let json = if *tree {
                let hierarchy = rpc::fetch_hierarchy(&client, *id).await?;
                to_json(&hierarchy, *pretty)?
            } else {
                let employee = client.get_employee(EmployeeId::new(*id)).await?.into_inner();
                to_json(&employee, *pretty)?
            };
            println!("{json}");
        }
    }

    Ok(())
}

fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> serde_json::Result<String> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
}
