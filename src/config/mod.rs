//! Configuration module for tun-relay
//!
//! This module provides configuration types and loading utilities.
//!
//! # Example
//!
//! ```no_run
//! use tun_relay::config::load_config;
//!
//! let config = load_config("/etc/tun-relay/config.json").unwrap();
//! println!("Max sessions: {}", config.session.max_sessions);
//! ```

mod loader;
mod types;

pub use loader::{create_default_config, load_config, load_config_str, load_config_with_env};
pub use types::{Config, LogConfig, SessionConfig};
