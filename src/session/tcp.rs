//! TCP session orchestration
//!
//! One intercepted SYN, one session: dial the proxy backend, answer the local
//! handshake, relay until both directions drain, release everything. Nothing
//! propagates out of a session; every failure path degrades to "log, release,
//! terminate".

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn, Instrument};

use crate::adapter::TcpSyn;
use crate::io::{relay, BufferPool, DEFAULT_DRAIN_WINDOW};
use crate::metadata::Metadata;
use crate::outbound::Dialer;
use crate::stats::{StatsRegistry, TrackedStream};

/// Shared dependencies for running TCP sessions
#[derive(Clone)]
pub struct TcpSessionContext {
    /// Proxy dial gateway
    pub dialer: Arc<dyn Dialer>,
    /// Shared statistics registry
    pub registry: Arc<StatsRegistry>,
    /// Relay buffer pool
    pub pool: Arc<BufferPool>,
    /// Half-close drain window
    pub drain_window: Duration,
}

impl TcpSessionContext {
    /// Create a context with the default drain window
    #[must_use]
    pub fn new(
        dialer: Arc<dyn Dialer>,
        registry: Arc<StatsRegistry>,
        pool: Arc<BufferPool>,
    ) -> Self {
        Self {
            dialer,
            registry,
            pool,
            drain_window: DEFAULT_DRAIN_WINDOW,
        }
    }
}

impl std::fmt::Debug for TcpSessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpSessionContext")
            .field("drain_window", &self.drain_window)
            .field("active_sessions", &self.registry.active_sessions())
            .finish_non_exhaustive()
    }
}

/// Run one intercepted TCP flow to completion.
///
/// The flow:
/// 1. Build metadata from the SYN identity.
/// 2. Dial the backend. An unreachable target sends no reset (the originator
///    is left to time out as if the SYN had been dropped); any other failure
///    resets the intercepted handshake. No relay is attempted either way.
/// 3. Record the outbound connection's local binding as the mid address and
///    wrap the connection with the statistics tracker.
/// 4. Answer the local handshake; on failure the outbound connection is
///    already owned here and closes on return.
/// 5. Relay until both directions drain.
///
/// Both connections are owned by this function and released by drop exactly
/// once on every exit path.
pub async fn handle_tcp_session<S: TcpSyn>(syn: S, ctx: &TcpSessionContext) {
    let mut metadata = Metadata::tcp(&syn.flow_id());

    let remote = match ctx.dialer.dial(&metadata).await {
        Ok(stream) => stream,
        Err(e) => {
            if !e.is_unreachable() {
                syn.reset().await;
            }
            warn!(dst = %metadata.destination(), "dial failed: {}", e);
            return;
        }
    };

    if let Ok(mid) = remote.local_addr() {
        metadata.set_mid(mid);
    }

    let mut remote = TrackedStream::new(remote, &metadata, Arc::clone(&ctx.registry));

    let mut local = match syn.complete_handshake().await {
        Ok(stream) => stream,
        Err(e) => {
            warn!(dst = %metadata.destination(), "handshake completion failed: {}", e);
            return;
        }
    };

    info!(src = %metadata.source(), dst = %metadata.destination(), "tcp session established");
    relay(&mut local, &mut remote, &ctx.pool, ctx.drain_window).await;
}

/// Spawn a session task under a span carrying the flow addressing
pub fn spawn_tcp_session<S>(syn: S, ctx: TcpSessionContext) -> tokio::task::JoinHandle<()>
where
    S: TcpSyn + 'static,
{
    let id = syn.flow_id();
    let span = tracing::info_span!("tcp_session", src = %id.remote, dst = %id.local);

    tokio::spawn(
        async move {
            handle_tcp_session(syn, &ctx).await;
        }
        .instrument(span),
    )
}
