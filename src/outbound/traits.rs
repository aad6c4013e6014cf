//! Dial gateway trait definitions
//!
//! This module defines the `Dialer` capability through which the session
//! orchestrator reaches the proxy backend, and the stream contract the
//! gateway hands back.

use std::io;
use std::net::SocketAddr;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

use crate::error::DialError;
use crate::metadata::Metadata;

/// An established outbound stream.
///
/// Besides the plain read/write contract, the gateway exposes the local
/// binding of the connection so the orchestrator can record the mid address.
pub trait ProxyStream: AsyncRead + AsyncWrite + Send + Unpin {
    /// Local address the outbound connection is bound to
    fn local_addr(&self) -> io::Result<SocketAddr>;
}

impl ProxyStream for TcpStream {
    fn local_addr(&self) -> io::Result<SocketAddr> {
        TcpStream::local_addr(self)
    }
}

/// Core trait for proxy dial gateways.
///
/// Implementations decide how the flow's destination is reached (directly,
/// through a chain, not at all); the orchestrator only consumes the resulting
/// stream and the error taxonomy.
#[async_trait]
pub trait Dialer: Send + Sync {
    /// Establish an outbound connection for the given flow metadata.
    ///
    /// # Errors
    ///
    /// Returns [`DialError::Unreachable`] when the target cannot be routed to
    /// or the backend refuses it by policy; any other variant for transport
    /// failures, refusals and timeouts. Callers decide reset behavior from
    /// this distinction.
    async fn dial(&self, metadata: &Metadata) -> Result<Box<dyn ProxyStream>, DialError>;
}
