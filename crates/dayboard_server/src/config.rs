//! Environment-driven server configuration.
//!
//! # Responsibility
//! - Read `DAYBOARD_*` settings once at startup.
//! - Fail fast with a readable message when a required value is missing.

use dayboard_core::{default_log_level, parse_log_level};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "DAYBOARD_DB_PATH";
pub const ENV_BIND: &str = "DAYBOARD_BIND";
pub const ENV_ALLOWED_ORIGINS: &str = "DAYBOARD_ALLOWED_ORIGINS";
pub const ENV_LOG_LEVEL: &str = "DAYBOARD_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "DAYBOARD_LOG_DIR";

const DEFAULT_BIND: &str = "127.0.0.1:8787";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub db_path: PathBuf,
    pub bind: SocketAddr,
    /// Empty means every origin is reflected.
    pub allowed_origins: Vec<String>,
    pub log_level: String,
    pub log_dir: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    MissingDatabasePath,
    InvalidBind(String),
    InvalidLogLevel(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingDatabasePath => write!(f, "{ENV_DB_PATH} must be set"),
            Self::InvalidBind(value) => {
                write!(f, "{ENV_BIND} `{value}` is not a socket address")
            }
            Self::InvalidLogLevel(value) => write!(
                f,
                "{ENV_LOG_LEVEL} `{value}` is not one of trace|debug|info|warn|error"
            ),
        }
    }
}

impl Error for ConfigError {}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let db_path = read(ENV_DB_PATH)
            .map(PathBuf::from)
            .ok_or(ConfigError::MissingDatabasePath)?;

        let bind_text = read(ENV_BIND).unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind_text
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidBind(bind_text.clone()))?;

        let allowed_origins = read(ENV_ALLOWED_ORIGINS)
            .map(|raw| parse_origins(&raw))
            .unwrap_or_default();

        let log_level = match read(ENV_LOG_LEVEL) {
            Some(raw) => parse_log_level(&raw)
                .map(|level| level.to_string().to_ascii_lowercase())
                .map_err(|_| ConfigError::InvalidLogLevel(raw))?,
            None => default_log_level().to_string(),
        };

        Ok(Self {
            db_path,
            bind,
            allowed_origins,
            log_level,
            log_dir: read(ENV_LOG_DIR),
        })
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|origin| origin.trim().trim_end_matches('/'))
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, ServerConfig};
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn missing_db_path_is_fatal() {
        assert_eq!(config_from(&[]), Err(ConfigError::MissingDatabasePath));
        assert_eq!(
            config_from(&[("DAYBOARD_DB_PATH", "   ")]),
            Err(ConfigError::MissingDatabasePath)
        );
    }

    #[test]
    fn defaults_apply_when_optional_values_are_absent() {
        let config = config_from(&[("DAYBOARD_DB_PATH", "/tmp/dayboard.db")]).unwrap();
        assert_eq!(config.bind.to_string(), "127.0.0.1:8787");
        assert!(config.allowed_origins.is_empty());
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn origins_are_split_and_trimmed() {
        let config = config_from(&[
            ("DAYBOARD_DB_PATH", "/tmp/dayboard.db"),
            (
                "DAYBOARD_ALLOWED_ORIGINS",
                " https://app.example.com/ , ,http://localhost:5173",
            ),
        ])
        .unwrap();
        assert_eq!(
            config.allowed_origins,
            vec!["https://app.example.com", "http://localhost:5173"]
        );
    }

    #[test]
    fn invalid_bind_is_rejected() {
        let err = config_from(&[
            ("DAYBOARD_DB_PATH", "/tmp/dayboard.db"),
            ("DAYBOARD_BIND", "localhost"),
        ])
        .unwrap_err();
        assert_eq!(err, ConfigError::InvalidBind("localhost".to_string()));
    }

    #[test]
    fn log_level_is_validated_and_normalized() {
        let config = config_from(&[
            ("DAYBOARD_DB_PATH", "/tmp/dayboard.db"),
            ("DAYBOARD_LOG_LEVEL", " Warning "),
        ])
        .unwrap();
        assert_eq!(config.log_level, "warn");

        let err = config_from(&[
            ("DAYBOARD_DB_PATH", "/tmp/dayboard.db"),
            ("DAYBOARD_LOG_LEVEL", "chatty"),
        ])
        .unwrap_err();
        assert_eq!(err, ConfigError::InvalidLogLevel("chatty".to_string()));
    }
}
