//! Per-flow session orchestration and management
//!
//! This module runs intercepted flows to completion:
//! - one orchestrator invocation per flow, owning both connections;
//! - a manager layering admission control and graceful shutdown on top.

mod manager;
mod tcp;

pub use manager::{run_syn_loop, SessionManager};
pub use tcp::{handle_tcp_session, spawn_tcp_session, TcpSessionContext};
