//! TLS configuration and certificate loading.
//!
//! Certificates are read and parsed eagerly at init time so that a bad path or a
//! malformed PEM fails the owning server before it accepts any traffic.

use std::path::Path;
use std::sync::Once;

use axum_server::tls_rustls::RustlsConfig;
use thiserror::Error;
use tonic::transport::{Certificate, Identity, ServerTlsConfig};

use crate::config::{MutualTlsConfig, TlsConfig};

/// Error type for certificate loading.
#[derive(Debug, Error)]
pub enum CertificateError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {reason}")]
    Parse { path: String, reason: String },

    #[error("no PEM {kind} found in {path}")]
    Empty { path: String, kind: &'static str },
}

/// Install the process-wide rustls crypto provider (ring). Safe to call repeatedly.
pub fn install_crypto_provider() {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        if rustls::crypto::ring::default_provider()
            .install_default()
            .is_err()
        {
            tracing::debug!("rustls crypto provider already installed");
        }
    });
}

fn read_file(path: &Path) -> Result<Vec<u8>, CertificateError> {
    std::fs::read(path).map_err(|source| CertificateError::Read {
        path: path.display().to_string(),
        source,
    })
}

/// Read a PEM file holding one or more certificates, checking that it parses.
pub fn load_certificates(path: &Path) -> Result<Vec<u8>, CertificateError> {
    let pem = read_file(path)?;

    let mut count = 0;
    for cert in rustls_pemfile::certs(&mut pem.as_slice()) {
        cert.map_err(|e| CertificateError::Parse {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        count += 1;
    }
    if count == 0 {
        return Err(CertificateError::Empty {
            path: path.display().to_string(),
            kind: "certificate",
        });
    }

    Ok(pem)
}

/// Read a PEM private key (PKCS#1, PKCS#8 or SEC1), checking that it parses.
pub fn load_private_key(path: &Path) -> Result<Vec<u8>, CertificateError> {
    let pem = read_file(path)?;

    let key = rustls_pemfile::private_key(&mut pem.as_slice()).map_err(|e| {
        CertificateError::Parse {
            path: path.display().to_string(),
            reason: e.to_string(),
        }
    })?;
    if key.is_none() {
        return Err(CertificateError::Empty {
            path: path.display().to_string(),
            kind: "private key",
        });
    }

    Ok(pem)
}

/// Build the RPC server TLS settings: our identity plus the trust root that client
/// certificates must chain to. Client certificates are required.
pub fn load_mutual_tls(config: &MutualTlsConfig) -> Result<ServerTlsConfig, CertificateError> {
    install_crypto_provider();

    let cert = load_certificates(Path::new(&config.cert_path))?;
    let key = load_private_key(Path::new(&config.key_path))?;
    let ca = load_certificates(Path::new(&config.ca_path))?;

    Ok(ServerTlsConfig::new()
        .identity(Identity::from_pem(cert, key))
        .client_ca_root(Certificate::from_pem(ca)))
}

/// Load TLS configuration for the HTTP adapter from certificate and key files.
pub async fn load_tls_config(config: &TlsConfig) -> Result<RustlsConfig, CertificateError> {
    install_crypto_provider();

    let cert = load_certificates(Path::new(&config.cert_path))?;
    let key = load_private_key(Path::new(&config.key_path))?;

    RustlsConfig::from_pem(cert, key)
        .await
        .map_err(|e| CertificateError::Parse {
            path: config.cert_path.clone(),
            reason: e.to_string(),
        })
}
