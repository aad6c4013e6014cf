//! Error types for tun-relay
//!
//! This module defines the error hierarchy for the relay endpoint. Errors are
//! categorized by subsystem; the dial taxonomy carries the one distinction the
//! session orchestrator acts on: unreachable versus everything else.

use std::io;
use std::net::SocketAddr;

use thiserror::Error;

/// Top-level error type for tun-relay
#[derive(Debug, Error)]
pub enum TunRelayError {
    /// Configuration errors (file parsing, validation)
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Proxy dial errors
    #[error("Dial error: {0}")]
    Dial(#[from] DialError),

    /// I/O errors not covered by other categories
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File not found or inaccessible
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    /// JSON parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Validation error (invalid values, missing required fields)
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    /// Environment variable error
    #[error("Environment variable error: {name}: {reason}")]
    EnvError { name: String, reason: String },

    /// I/O error while reading config
    #[error("I/O error reading configuration: {0}")]
    IoError(#[from] io::Error),
}

/// Proxy dial failures.
///
/// `Unreachable` covers policy refusal and OS no-route conditions. The
/// orchestrator leaves the local handshake untouched for this kind so the
/// originator times out as if the SYN had been dropped; every other kind gets
/// an active reset.
#[derive(Debug, Error)]
pub enum DialError {
    /// No route to the destination, or the backend refused it by policy
    #[error("No route to {dst}: {reason}")]
    Unreachable { dst: SocketAddr, reason: String },

    /// Connection attempt timed out
    #[error("Connection to {dst} timed out after {timeout_secs}s")]
    Timeout { dst: SocketAddr, timeout_secs: u64 },

    /// Connection failed (refused, aborted, transport fault)
    #[error("Failed to connect to {dst}: {reason}")]
    ConnectionFailed { dst: SocketAddr, reason: String },

    /// I/O error during the dial
    #[error("Dial I/O error: {0}")]
    IoError(#[from] io::Error),
}

impl DialError {
    /// Check whether this is the unreachable kind.
    ///
    /// Governs reset behavior: unreachable dials must not reset the
    /// intercepted handshake.
    #[must_use]
    pub const fn is_unreachable(&self) -> bool {
        matches!(self, Self::Unreachable { .. })
    }

    /// Create an unreachable error
    pub fn unreachable(dst: SocketAddr, reason: impl Into<String>) -> Self {
        Self::Unreachable {
            dst,
            reason: reason.into(),
        }
    }

    /// Create a connection failed error
    pub fn connection_failed(dst: SocketAddr, reason: impl Into<String>) -> Self {
        Self::ConnectionFailed {
            dst,
            reason: reason.into(),
        }
    }
}

/// Type alias for Result with `TunRelayError`
pub type Result<T> = std::result::Result<T, TunRelayError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn addr() -> SocketAddr {
        "93.184.216.34:443".parse().unwrap()
    }

    #[test]
    fn test_unreachable_classification() {
        let err = DialError::unreachable(addr(), "no route");
        assert!(err.is_unreachable());

        let err = DialError::connection_failed(addr(), "connection refused");
        assert!(!err.is_unreachable());

        let err = DialError::Timeout {
            dst: addr(),
            timeout_secs: 10,
        };
        assert!(!err.is_unreachable());

        let io_err = io::Error::new(io::ErrorKind::ConnectionReset, "reset");
        let err = DialError::from(io_err);
        assert!(!err.is_unreachable());
    }

    #[test]
    fn test_error_display() {
        let err = DialError::unreachable(addr(), "no route to host");
        let msg = err.to_string();
        assert!(msg.contains("93.184.216.34:443"));
        assert!(msg.contains("no route to host"));

        let err = DialError::Timeout {
            dst: addr(),
            timeout_secs: 10,
        };
        assert!(err.to_string().contains("10s"));
    }

    #[test]
    fn test_error_conversion() {
        let config_err = ConfigError::ValidationError("invalid".into());
        let top: TunRelayError = config_err.into();
        assert!(matches!(top, TunRelayError::Config(_)));

        let dial_err = DialError::connection_failed(addr(), "refused");
        let top: TunRelayError = dial_err.into();
        assert!(matches!(top, TunRelayError::Dial(_)));
    }
}
