//! Session manager
//!
//! Centralized handling of adapter SYN events: semaphore-based backpressure,
//! per-session task spawning, and graceful shutdown with draining. Sessions
//! themselves are never cancelled; shutdown only stops admitting new flows
//! and waits for the active ones to finish.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, info, warn, Instrument};

use super::tcp::{handle_tcp_session, TcpSessionContext};
use crate::adapter::TcpSyn;
use crate::config::SessionConfig;

/// Admission control and lifecycle tracking for relay sessions
pub struct SessionManager {
    /// Semaphore for session limiting
    semaphore: Arc<Semaphore>,
    /// Maximum concurrent sessions
    max_sessions: usize,
    /// Shared session dependencies
    ctx: TcpSessionContext,
    /// SYNs refused because the limit was reached
    rejected: AtomicU64,
    /// How long shutdown waits for active sessions
    drain_timeout: Duration,
    /// Whether shutdown has been initiated
    shutting_down: AtomicBool,
}

impl SessionManager {
    /// Create a new session manager
    #[must_use]
    pub fn new(config: &SessionConfig, ctx: TcpSessionContext) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(config.max_sessions)),
            max_sessions: config.max_sessions,
            ctx,
            rejected: AtomicU64::new(0),
            drain_timeout: config.drain_timeout(),
            shutting_down: AtomicBool::new(false),
        }
    }

    /// Admit one intercepted SYN.
    ///
    /// Over-limit and post-shutdown SYNs are reset immediately so the
    /// originator fails fast instead of hanging on a handshake nobody will
    /// answer. Admitted SYNs get their own task; the permit is held for the
    /// session's lifetime.
    pub async fn handle_syn<S>(&self, syn: S)
    where
        S: TcpSyn + 'static,
    {
        if self.is_shutting_down() {
            syn.reset().await;
            return;
        }

        let permit = match Arc::clone(&self.semaphore).try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                self.rejected.fetch_add(1, Ordering::Relaxed);
                let id = syn.flow_id();
                warn!(
                    src = %id.remote,
                    dst = %id.local,
                    "session limit reached ({}), resetting flow",
                    self.max_sessions
                );
                syn.reset().await;
                return;
            }
        };

        let id = syn.flow_id();
        debug!(
            src = %id.remote,
            dst = %id.local,
            "session admitted (active: {}/{})",
            self.active_sessions(),
            self.max_sessions
        );

        let ctx = self.ctx.clone();
        let span = tracing::info_span!("tcp_session", src = %id.remote, dst = %id.local);
        tokio::spawn(
            async move {
                // Hold the permit until the session is done
                let _permit = permit;
                handle_tcp_session(syn, &ctx).await;
            }
            .instrument(span),
        );
    }

    /// Number of currently active sessions
    #[must_use]
    pub fn active_sessions(&self) -> usize {
        self.max_sessions - self.semaphore.available_permits()
    }

    /// Number of SYNs refused because the limit was reached
    #[must_use]
    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    /// Check if shutting down
    #[must_use]
    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::Relaxed)
    }

    /// Initiate graceful shutdown.
    ///
    /// Stops admitting new sessions and waits for active ones to finish, up
    /// to the configured drain timeout. Active sessions are never cancelled.
    pub async fn shutdown(&self) {
        if self
            .shutting_down
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::Relaxed)
            .is_err()
        {
            // Already shutting down
            return;
        }

        info!("Initiating session manager shutdown");

        let drain_start = tokio::time::Instant::now();
        let check_interval = Duration::from_millis(100);

        while drain_start.elapsed() < self.drain_timeout {
            let active = self.active_sessions();
            if active == 0 {
                info!("All sessions drained");
                return;
            }

            debug!(
                "Waiting for {} sessions to drain ({:.1}s remaining)",
                active,
                (self.drain_timeout - drain_start.elapsed()).as_secs_f64()
            );

            tokio::time::sleep(check_interval).await;
        }

        let remaining = self.active_sessions();
        if remaining > 0 {
            warn!(
                "Drain timeout reached with {} sessions still active",
                remaining
            );
        }
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("max_sessions", &self.max_sessions)
            .field("active", &self.active_sessions())
            .field("rejected", &self.rejected())
            .field("shutting_down", &self.is_shutting_down())
            .finish_non_exhaustive()
    }
}

/// Consume SYN events from the adapter until the channel closes or shutdown
/// is initiated.
pub async fn run_syn_loop<S>(mut syns: mpsc::Receiver<S>, manager: Arc<SessionManager>)
where
    S: TcpSyn + 'static,
{
    info!(
        "Session loop started (max {} concurrent)",
        manager.max_sessions
    );

    while let Some(syn) = syns.recv().await {
        if manager.is_shutting_down() {
            syn.reset().await;
            break;
        }
        manager.handle_syn(syn).await;
    }

    info!("Session loop stopped");
}
