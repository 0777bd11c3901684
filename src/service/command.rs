//! Out-of-band commands delivered to hosted services.

use std::collections::HashMap;
use std::fmt;

/// The only command every hosted service must honor: stop serving and let `run` return.
pub const SHUTDOWN: &str = "SHUTDOWN";

/// A command name plus an optional string payload.
///
/// The payload is unused by `SHUTDOWN`; it exists so future commands can carry
/// arguments without changing the contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub name: String,
    pub payload: Option<HashMap<String, String>>,
}

impl Command {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            payload: None,
        }
    }

    pub fn with_payload(mut self, payload: HashMap<String, String>) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn shutdown() -> Self {
        Self::new(SHUTDOWN)
    }

    pub fn is_shutdown(&self) -> bool {
        self.name == SHUTDOWN
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shutdown_is_recognized_by_name_only() {
        assert!(Command::shutdown().is_shutdown());
        assert!(Command::new("SHUTDOWN").is_shutdown());
        assert!(!Command::new("shutdown").is_shutdown());

        let with_payload = Command::shutdown()
            .with_payload(HashMap::from([("reason".to_string(), "deploy".to_string())]));
        assert!(with_payload.is_shutdown());
    }
}
