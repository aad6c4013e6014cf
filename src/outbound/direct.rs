//! Direct dial gateway
//!
//! This module provides the `DirectDialer` type which connects straight to
//! the flow's destination. It is the default backend and the reference
//! implementation of the unreachable-classification contract.

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, warn};

use super::traits::{Dialer, ProxyStream};
use crate::error::DialError;
use crate::metadata::Metadata;

/// Default connect timeout for direct dials
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Gateway that dials the destination directly
#[derive(Debug, Clone)]
pub struct DirectDialer {
    /// Connection timeout
    connect_timeout: Duration,
}

impl DirectDialer {
    /// Create a direct dialer with the given connect timeout
    #[must_use]
    pub const fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }

    /// Map an OS connect error into the dial taxonomy.
    ///
    /// No-route conditions become `Unreachable`; everything else (refused,
    /// aborted, transport faults) is a plain connection failure.
    fn classify(dst: SocketAddr, err: &io::Error) -> DialError {
        match err.kind() {
            io::ErrorKind::HostUnreachable | io::ErrorKind::NetworkUnreachable => {
                DialError::unreachable(dst, err.to_string())
            }
            _ => DialError::connection_failed(dst, err.to_string()),
        }
    }
}

impl Default for DirectDialer {
    fn default() -> Self {
        Self::new(DEFAULT_CONNECT_TIMEOUT)
    }
}

#[async_trait]
impl Dialer for DirectDialer {
    async fn dial(&self, metadata: &Metadata) -> Result<Box<dyn ProxyStream>, DialError> {
        let dst = metadata.destination();

        let stream = match timeout(self.connect_timeout, TcpStream::connect(dst)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => return Err(Self::classify(dst, &e)),
            Err(_) => {
                return Err(DialError::Timeout {
                    dst,
                    timeout_secs: self.connect_timeout.as_secs(),
                })
            }
        };

        // Disable Nagle's algorithm for lower latency
        if let Err(e) = stream.set_nodelay(true) {
            warn!("Failed to set TCP_NODELAY: {}", e);
        }

        debug!("Direct connection to {} established", dst);
        Ok(Box::new(stream))
    }
}
