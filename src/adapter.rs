//! Adapter-facing capability traits
//!
//! The virtual-interface/IP-stack adapter intercepts TCP connection attempts
//! and surfaces each one as a [`TcpSyn`] handle before the local three-way
//! handshake has been answered. The relay decides the flow's fate: answer the
//! handshake once the proxy backend is dialed, or abort it with a reset.

use std::io;
use std::net::SocketAddr;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};

/// Four-tuple identity of an intercepted flow, from the stack's perspective.
///
/// Note the perspective reversal: the stack's `remote` endpoint is the flow's
/// originator and its `local` endpoint is the flow's intended target. The
/// metadata builder undoes this when deriving source/destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FlowId {
    /// Endpoint the stack accepted the flow on (the flow's target)
    pub local: SocketAddr,
    /// Peer endpoint (the flow's originator)
    pub remote: SocketAddr,
}

impl FlowId {
    /// Create a flow identity from the stack's local/remote endpoints
    #[must_use]
    pub const fn new(local: SocketAddr, remote: SocketAddr) -> Self {
        Self { local, remote }
    }
}

impl std::fmt::Display for FlowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} <-> {}", self.remote, self.local)
    }
}

/// Capability handle for an intercepted, not-yet-established TCP connection.
///
/// The handle is exclusively owned until one of the consuming operations
/// irreversibly transitions it: [`complete_handshake`](Self::complete_handshake)
/// to "established" or [`reset`](Self::reset) to "aborted". Dropping an
/// un-consumed handle must do neither; the originator is left to time out on
/// its own, which is exactly the behavior wanted for unreachable targets.
#[async_trait]
pub trait TcpSyn: Send {
    /// Stream type produced once the local handshake completes
    type Stream: AsyncRead + AsyncWrite + Send + Unpin;

    /// Addressing tuple of the intercepted flow
    fn flow_id(&self) -> FlowId;

    /// Answer the local three-way handshake and return the live connection.
    ///
    /// # Errors
    ///
    /// Returns the transport error if the handshake cannot be completed
    /// (e.g. the originator already gave up).
    async fn complete_handshake(self) -> io::Result<Self::Stream>;

    /// Abort the attempt with a reset toward the originator
    async fn reset(self);
}
