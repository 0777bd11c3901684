//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::HrappConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<HrappConfig, ConfigError> {
    let config: HrappConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<HrappConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_uses_defaults() {
        let config = parse_config(
            r#"
            [admin]
            listen_address = "0.0.0.0:9000"

            [rpc.tls]
            enabled = true
            ca_path = "/etc/hrapp/ca.pem"

            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.admin.listen_address, "0.0.0.0:9000");
        assert_eq!(config.admin.shutdown_grace_secs, 5);
        assert!(config.rpc.tls.enabled);
        assert_eq!(config.rpc.tls.ca_path, "/etc/hrapp/ca.pem");
        assert_eq!(config.rpc.tls.cert_path, "certs/server.crt");
        assert_eq!(config.lifecycle.warmup_ms, 2000);
        assert_eq!(
            config.observability.log_format,
            crate::config::LogFormat::Json
        );
    }

    #[test]
    fn invalid_values_fail_validation() {
        let err = parse_config("[lifecycle]\nshutdown_grace_secs = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref errors) if errors.len() == 1));
        assert!(err.to_string().contains("lifecycle.shutdown_grace_secs"));
    }

    #[test]
    fn syntax_errors_are_parse_errors() {
        assert!(matches!(
            parse_config("[admin"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(
            load_config(Path::new("/nonexistent/hrapp.toml")),
            Err(ConfigError::Io(_))
        ));
    }
}
