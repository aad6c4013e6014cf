//! Configuration loading and management
//!
//! This module handles loading configuration from files and environment
//! variables.

use std::path::Path;

use tracing::{debug, info};

use super::types::Config;
use crate::error::ConfigError;

/// Load configuration from a JSON file
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read or parsed.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref();

    debug!("Loading configuration from {:?}", path);

    if !path.exists() {
        return Err(ConfigError::FileNotFound {
            path: path.display().to_string(),
        });
    }

    let contents = std::fs::read_to_string(path)?;

    let config: Config = serde_json::from_str(&contents)
        .map_err(|e| ConfigError::ParseError(format!("Failed to parse JSON: {e} at {path:?}")))?;

    config.validate()?;

    info!(
        "Configuration loaded: max {} sessions, {}s drain window",
        config.session.max_sessions, config.session.drain_window_secs
    );

    Ok(config)
}

/// Load configuration from a JSON string
///
/// # Errors
///
/// Returns `ConfigError` if parsing or validation fails.
pub fn load_config_str(json: &str) -> Result<Config, ConfigError> {
    let config: Config =
        serde_json::from_str(json).map_err(|e| ConfigError::ParseError(e.to_string()))?;

    config.validate()?;

    Ok(config)
}

/// Load configuration with environment variable overrides
///
/// Environment variables:
/// - `TUN_RELAY_LOG_LEVEL`: Override log level
/// - `TUN_RELAY_MAX_SESSIONS`: Override maximum concurrent sessions
///
/// # Errors
///
/// Returns `ConfigError` if loading or parsing fails.
pub fn load_config_with_env(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let mut config = load_config(path)?;

    if let Ok(level) = std::env::var("TUN_RELAY_LOG_LEVEL") {
        config.log.level = level;
        debug!("Log level overridden to {}", config.log.level);
    }

    if let Ok(max) = std::env::var("TUN_RELAY_MAX_SESSIONS") {
        config.session.max_sessions = max.parse().map_err(|_| ConfigError::EnvError {
            name: "TUN_RELAY_MAX_SESSIONS".into(),
            reason: format!("Invalid number: {max}"),
        })?;
        debug!(
            "Max sessions overridden to {}",
            config.session.max_sessions
        );
    }

    // Re-validate after overrides
    config.validate()?;

    Ok(config)
}

/// Write a default configuration file
///
/// # Errors
///
/// Returns `ConfigError` if serialization or writing fails.
pub fn create_default_config(path: impl AsRef<Path>) -> Result<(), ConfigError> {
    let config = Config::default();
    let json = serde_json::to_string_pretty(&config)
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;
    std::fs::write(path.as_ref(), json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_config_str() {
        let config = load_config_str(
            r#"{
                "session": {
                    "max_sessions": 64,
                    "drain_window_secs": 2
                },
                "log": { "level": "debug" }
            }"#,
        )
        .unwrap();

        assert_eq!(config.session.max_sessions, 64);
        assert_eq!(config.session.drain_window_secs, 2);
        // Omitted fields fall back to defaults
        assert_eq!(config.session.connect_timeout_secs, 10);
        assert_eq!(config.log.level, "debug");
    }

    #[test]
    fn test_load_config_str_empty_object() {
        let config = load_config_str("{}").unwrap();
        assert_eq!(config.session.max_sessions, 1024);
    }

    #[test]
    fn test_load_config_str_rejects_invalid() {
        assert!(load_config_str("not json").is_err());
        assert!(load_config_str(r#"{"session": {"drain_window_secs": 0}}"#).is_err());
        assert!(load_config_str(r#"{"log": {"level": "loud"}}"#).is_err());
    }

    #[test]
    fn test_load_config_missing_file() {
        let err = load_config("/nonexistent/tun-relay.json").unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
    }

    #[test]
    fn test_create_and_load_round_trip() {
        let dir = std::env::temp_dir().join("tun-relay-config-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json");

        create_default_config(&path).unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.session.max_sessions, 1024);

        std::fs::remove_file(&path).unwrap();
    }
}
