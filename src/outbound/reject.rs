//! Reject dial gateway
//!
//! This module provides the `RejectDialer` type which refuses every dial
//! with the unreachable kind. Used for access control and for exercising the
//! no-reset teardown path: flows routed here silently time out on the
//! originator's side instead of being reset.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tracing::debug;

use super::traits::{Dialer, ProxyStream};
use crate::error::DialError;
use crate::metadata::Metadata;

/// Gateway that refuses all connections by policy
#[derive(Debug, Default)]
pub struct RejectDialer {
    /// Number of dials refused
    rejected: AtomicU64,
}

impl RejectDialer {
    /// Create a new reject dialer
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of dials refused so far
    #[must_use]
    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Dialer for RejectDialer {
    async fn dial(&self, metadata: &Metadata) -> Result<Box<dyn ProxyStream>, DialError> {
        self.rejected.fetch_add(1, Ordering::Relaxed);

        let dst = metadata.destination();
        debug!("Rejecting connection to {}", dst);

        Err(DialError::unreachable(dst, "rejected by policy"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::FlowId;

    #[tokio::test]
    async fn test_reject_is_unreachable() {
        let dialer = RejectDialer::new();
        let metadata = Metadata::tcp(&FlowId::new(
            "93.184.216.34:443".parse().unwrap(),
            "10.0.0.2:5000".parse().unwrap(),
        ));

        let err = dialer.dial(&metadata).await.err().unwrap();
        assert!(err.is_unreachable());
        assert_eq!(dialer.rejected(), 1);

        let _ = dialer.dial(&metadata).await;
        assert_eq!(dialer.rejected(), 2);
    }
}
