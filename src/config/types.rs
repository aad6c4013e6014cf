//! Configuration types for tun-relay
//!
//! This module defines all configuration structures used by the relay.
//! Configuration is loaded from JSON files and validated at startup.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::io::{DEFAULT_POOL_CAPACITY, RELAY_BUFFER_SIZE};

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Session limits and timing
    #[serde(default)]
    pub session: SessionConfig,

    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
}

impl Config {
    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.session.validate()?;
        self.log.validate()?;
        Ok(())
    }
}

/// Session limits and timing
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    /// Maximum concurrent sessions
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    /// Outbound connect timeout in seconds
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Half-close drain window in seconds
    #[serde(default = "default_drain_window_secs")]
    pub drain_window_secs: u64,

    /// How long shutdown waits for active sessions, in seconds
    #[serde(default = "default_drain_timeout_secs")]
    pub drain_timeout_secs: u64,

    /// Relay copy buffer size in bytes
    #[serde(default = "default_relay_buffer_size")]
    pub relay_buffer_size: usize,

    /// Buffer pool capacity (number of buffers)
    #[serde(default = "default_buffer_pool_capacity")]
    pub buffer_pool_capacity: usize,
}

impl SessionConfig {
    /// Get the connect timeout as a Duration
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Get the drain window as a Duration
    #[must_use]
    pub const fn drain_window(&self) -> Duration {
        Duration::from_secs(self.drain_window_secs)
    }

    /// Get the shutdown drain timeout as a Duration
    #[must_use]
    pub const fn drain_timeout(&self) -> Duration {
        Duration::from_secs(self.drain_timeout_secs)
    }

    /// Validate session configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.connect_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "connect_timeout_secs must be greater than zero".into(),
            ));
        }
        if self.drain_window_secs == 0 {
            return Err(ConfigError::ValidationError(
                "drain_window_secs must be greater than zero".into(),
            ));
        }
        if self.relay_buffer_size == 0 {
            return Err(ConfigError::ValidationError(
                "relay_buffer_size must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_sessions: default_max_sessions(),
            connect_timeout_secs: default_connect_timeout_secs(),
            drain_window_secs: default_drain_window_secs(),
            drain_timeout_secs: default_drain_timeout_secs(),
            relay_buffer_size: default_relay_buffer_size(),
            buffer_pool_capacity: default_buffer_pool_capacity(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl LogConfig {
    /// Validate logging configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
            other => Err(ConfigError::ValidationError(format!(
                "Invalid log level: {other}"
            ))),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_max_sessions() -> usize {
    1024
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_drain_window_secs() -> u64 {
    5
}

fn default_drain_timeout_secs() -> u64 {
    30
}

fn default_relay_buffer_size() -> usize {
    RELAY_BUFFER_SIZE
}

fn default_buffer_pool_capacity() -> usize {
    DEFAULT_POOL_CAPACITY
}

fn default_log_level() -> String {
    "info".into()
}
