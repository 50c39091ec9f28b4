//! Runtime configuration.
//!
//! Resolution order, lowest to highest priority: built-in defaults, a `.env`
//! file in the working directory, process environment, command-line flags.

use serde::Serialize;
use std::path::PathBuf;

use crate::error::ConfigError;

/// Input file read when nothing else is configured.
pub const DEFAULT_INPUT: &str = "Transjakarta.csv";

/// Port the HTTP server listens on by default.
pub const DEFAULT_PORT: u16 = 3000;

pub const INPUT_ENV: &str = "TRANSITCLEAN_INPUT";
pub const PORT_ENV: &str = "TRANSITCLEAN_PORT";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    pub input_path: PathBuf,
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from(DEFAULT_INPUT),
            port: DEFAULT_PORT,
        }
    }
}

impl AppConfig {
    /// Load `.env` (if present) and read the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(input) = lookup(INPUT_ENV).filter(|v| !v.trim().is_empty()) {
            config.input_path = PathBuf::from(input);
        }

        if let Some(port) = lookup(PORT_ENV) {
            config.port = port.trim().parse().map_err(|_| ConfigError::InvalidPort {
                value: port.clone(),
                source_name: PORT_ENV.to_string(),
            })?;
        }

        Ok(config)
    }

    /// Apply command-line overrides.
    pub fn with_overrides(mut self, input: Option<PathBuf>, port: Option<u16>) -> Self {
        if let Some(input) = input {
            self.input_path = input;
        }
        if let Some(port) = port {
            self.port = port;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.input_path, PathBuf::from("Transjakarta.csv"));
        assert_eq!(config.port, 3000);
    }

    #[test]
    fn test_environment_overrides_defaults() {
        let config = AppConfig::from_lookup(lookup(&[
            (INPUT_ENV, "/data/tj-april.csv"),
            (PORT_ENV, " 8080 "),
        ]))
        .unwrap();
        assert_eq!(config.input_path, PathBuf::from("/data/tj-april.csv"));
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_invalid_port_rejected() {
        let err = AppConfig::from_lookup(lookup(&[(PORT_ENV, "eighty")])).unwrap_err();
        assert!(err.to_string().contains("eighty"));
    }

    #[test]
    fn test_cli_overrides_win() {
        let config = AppConfig::from_lookup(lookup(&[(PORT_ENV, "8080")]))
            .unwrap()
            .with_overrides(Some(PathBuf::from("upload.csv")), Some(9000));
        assert_eq!(config.input_path, PathBuf::from("upload.csv"));
        assert_eq!(config.port, 9000);
    }
}
