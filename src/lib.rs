//! tun-relay: userspace TCP relay for intercepted virtual-interface flows
//!
//! This crate bridges TCP flows intercepted from a virtual network interface
//! to an outbound proxy backend, performing bidirectional transfer with
//! accounting and graceful teardown.
//!
//! # Architecture
//!
//! ```text
//! IP stack adapter → SYN handle → tun-relay → Dialer → Proxy backend
//!                                    ↓
//!                           dial / instrument
//!                                    ↓
//!                        handshake, then relay both
//!                        directions until drained
//! ```
//!
//! Each intercepted SYN becomes one session: the relay dials the backend,
//! answers the local handshake only once the dial succeeds, then moves bytes
//! in both directions until each side drains. An unreachable backend leaves
//! the handshake unanswered so the originator times out naturally; any other
//! dial failure resets it. When one relay direction finishes, the other gets
//! a bounded read deadline instead of hanging on a half-closed peer.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use tun_relay::io::BufferPool;
//! use tun_relay::outbound::DirectDialer;
//! use tun_relay::session::TcpSessionContext;
//! use tun_relay::stats::StatsRegistry;
//!
//! let ctx = TcpSessionContext::new(
//!     Arc::new(DirectDialer::default()),
//!     Arc::new(StatsRegistry::new()),
//!     Arc::new(BufferPool::with_defaults()),
//! );
//!
//! // For each SYN handle the adapter produces:
//! // tun_relay::session::spawn_tcp_session(syn, ctx.clone());
//! ```
//!
//! # Modules
//!
//! - [`adapter`]: SYN handle capability produced by the IP-stack adapter
//! - [`config`]: Configuration types and loading
//! - [`error`]: Error types
//! - [`io`]: Buffer pool and the bidirectional relay engine
//! - [`metadata`]: Flow addressing records
//! - [`outbound`]: Proxy dial gateways
//! - [`session`]: Session orchestration and management
//! - [`stats`]: Statistics registry and tracking decorator

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod adapter;
pub mod config;
pub mod error;
pub mod io;
pub mod metadata;
pub mod outbound;
pub mod session;
pub mod stats;

// Re-export commonly used types at the crate root
pub use adapter::{FlowId, TcpSyn};
pub use config::{load_config, Config, LogConfig, SessionConfig};
pub use error::{ConfigError, DialError, TunRelayError};
pub use io::{relay, BufferPool, DrainSignal, RelayResult};
pub use metadata::{Metadata, Network};
pub use outbound::{Dialer, DirectDialer, ProxyStream, RejectDialer};
pub use session::{handle_tcp_session, spawn_tcp_session, SessionManager, TcpSessionContext};
pub use stats::{StatsRegistry, TrackedStream};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
