//! Client helpers: connecting with optional mutual TLS, and resolving a reporting
//! hierarchy with one concurrent lookup per employee.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::task::JoinSet;
use tonic::transport::{Certificate, ClientTlsConfig, Endpoint, Identity};

use crate::employees::{Employee, EmployeeHierarchy, EmployeeId};
use crate::net::tls::{install_crypto_provider, load_certificates, load_private_key};
use crate::net::CertificateError;
use crate::rpc::proto::hrapp_client::HrappClient;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Certificate(#[from] CertificateError),

    #[error("transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    #[error("rpc failed: {0}")]
    Rpc(#[from] tonic::Status),

    #[error("lookup task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Client credentials for a server that requires mutual TLS.
#[derive(Debug, Clone)]
pub struct ClientTls {
    pub ca_path: PathBuf,
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
    /// Name expected in the server certificate. Defaults to the host of the address.
    pub domain: Option<String>,
}

/// Connect to an `hrapp.Hrapp` server at `address` (`host:port`).
pub async fn connect(address: &str, tls: Option<&ClientTls>) -> Result<HrappClient, ClientError> {
    let channel = match tls {
        None => Endpoint::from_shared(format!("http://{address}"))?.connect().await?,
        Some(tls) => {
            install_crypto_provider();
            let ca = load_certificates(Path::new(&tls.ca_path))?;
            let cert = load_certificates(Path::new(&tls.cert_path))?;
            let key = load_private_key(Path::new(&tls.key_path))?;

            let mut config = ClientTlsConfig::new()
                .ca_certificate(Certificate::from_pem(ca))
                .identity(Identity::from_pem(cert, key));
            if let Some(domain) = &tls.domain {
                config = config.domain_name(domain.clone());
            }

            Endpoint::from_shared(format!("https://{address}"))?
                .tls_config(config)?
                .connect()
                .await?
        }
    };
    Ok(HrappClient::new(channel))
}

/// Fetch `root` and everyone below it.
///
/// Every employee id is requested once. Any failed lookup fails the whole fetch
/// and cancels the lookups still in flight.
pub async fn fetch_hierarchy(
    client: &HrappClient,
    root: i64,
) -> Result<EmployeeHierarchy, ClientError> {
    let mut tasks = JoinSet::new();
    let mut requested = HashSet::from([root]);
    let mut fetched: HashMap<i64, Employee> = HashMap::new();

    spawn_lookup(&mut tasks, client, root);
    while let Some(joined) = tasks.join_next().await {
        let (id, employee) = joined??;
        for &report in &employee.reports {
            if requested.insert(report) {
                spawn_lookup(&mut tasks, client, report);
            }
        }
        fetched.insert(id, employee);
    }

    tracing::debug!(root, count = fetched.len(), "Fetched employee hierarchy");
    Ok(assemble(&fetched, root, &mut HashSet::new()))
}

fn spawn_lookup(
    tasks: &mut JoinSet<Result<(i64, Employee), ClientError>>,
    client: &HrappClient,
    id: i64,
) {
    let mut client = client.clone();
    tasks.spawn(async move {
        let response = client.get_employee(EmployeeId::new(id)).await?;
        Ok((id, response.into_inner()))
    });
}

fn assemble(
    fetched: &HashMap<i64, Employee>,
    id: i64,
    path: &mut HashSet<i64>,
) -> EmployeeHierarchy {
    let Some(employee) = fetched.get(&id) else {
        return EmployeeHierarchy {
            id,
            ..Default::default()
        };
    };

    // A report cycle ends at the repeated employee.
    let reports = if path.insert(id) {
        let reports = employee
            .reports
            .iter()
            .map(|&report| assemble(fetched, report, path))
            .collect();
        path.remove(&id);
        reports
    } else {
        Vec::new()
    };

    EmployeeHierarchy {
        id,
        name: employee.name.clone(),
        title: employee.title.clone(),
        reports,
    }
}
