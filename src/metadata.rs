//! Connection metadata for relayed flows
//!
//! Every session carries a [`Metadata`] record holding the three addressing
//! views of a relayed flow: the originating endpoint (source), the intended
//! target (destination), and the local binding of the proxy-dialed outbound
//! connection (mid). Source and destination are fixed at interception time;
//! the mid address only exists once the dial succeeds.

use std::fmt;
use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

use crate::adapter::FlowId;

/// Transport kind of a relayed flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Stream flow
    Tcp,
    /// Datagram association
    Udp,
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp => write!(f, "tcp"),
            Self::Udp => write!(f, "udp"),
        }
    }
}

/// Addressing record for one relayed session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    network: Network,
    src: SocketAddr,
    dst: SocketAddr,
    mid: Option<SocketAddr>,
}

impl Metadata {
    /// Build TCP metadata from an intercepted SYN.
    ///
    /// Interception reverses the stack's perspective: the flow's originator
    /// is the stack's remote endpoint, the flow's target its local endpoint.
    #[must_use]
    pub const fn tcp(flow: &FlowId) -> Self {
        Self {
            network: Network::Tcp,
            src: flow.remote,
            dst: flow.local,
            mid: None,
        }
    }

    /// Transport kind of the flow
    #[must_use]
    pub const fn network(&self) -> Network {
        self.network
    }

    /// Originating endpoint of the intercepted flow
    #[must_use]
    pub const fn source(&self) -> SocketAddr {
        self.src
    }

    /// Target endpoint of the intercepted flow
    #[must_use]
    pub const fn destination(&self) -> SocketAddr {
        self.dst
    }

    /// Local binding of the outbound connection, once dialed
    #[must_use]
    pub const fn mid(&self) -> Option<SocketAddr> {
        self.mid
    }

    /// Record the outbound connection's local binding.
    ///
    /// Called exactly once, after a successful dial; the record is treated as
    /// immutable from then on.
    pub(crate) fn set_mid(&mut self, addr: SocketAddr) {
        self.mid = Some(addr);
    }
}

impl fmt::Display for Metadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} -> {}", self.network, self.src, self.dst)
    }
}
