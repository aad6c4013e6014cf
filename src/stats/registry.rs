//! Session statistics registry
//!
//! A single registry instance is shared by every session of a relay. It holds
//! global transfer totals plus a live map of active sessions, and is safe for
//! concurrent updates from many instrumented connections. The registry is
//! always passed explicitly (`Arc<StatsRegistry>`), never ambient state, so
//! sessions stay independently testable.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::metadata::Metadata;

/// Byte counters for one live session
#[derive(Debug)]
pub struct SessionStats {
    /// Addressing of the tracked flow
    metadata: Metadata,
    /// Bytes written toward the proxy backend
    uploaded: AtomicU64,
    /// Bytes read back from the proxy backend
    downloaded: AtomicU64,
}

impl SessionStats {
    fn new(metadata: Metadata) -> Self {
        Self {
            metadata,
            uploaded: AtomicU64::new(0),
            downloaded: AtomicU64::new(0),
        }
    }

    /// Addressing of the tracked flow
    #[must_use]
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Bytes uploaded so far
    #[must_use]
    pub fn uploaded(&self) -> u64 {
        self.uploaded.load(Ordering::Relaxed)
    }

    /// Bytes downloaded so far
    #[must_use]
    pub fn downloaded(&self) -> u64 {
        self.downloaded.load(Ordering::Relaxed)
    }

    pub(crate) fn record_upload(&self, bytes: u64) {
        self.uploaded.fetch_add(bytes, Ordering::Relaxed);
    }

    pub(crate) fn record_download(&self, bytes: u64) {
        self.downloaded.fetch_add(bytes, Ordering::Relaxed);
    }

    fn snapshot(&self, id: u64) -> SessionSnapshot {
        SessionSnapshot {
            id,
            metadata: self.metadata.clone(),
            uploaded: self.uploaded(),
            downloaded: self.downloaded(),
        }
    }
}

/// Shared registry of live sessions and global transfer totals
#[derive(Debug, Default)]
pub struct StatsRegistry {
    /// Live sessions, keyed by registration id
    sessions: DashMap<u64, Arc<SessionStats>>,
    /// Monotonic id source
    next_id: AtomicU64,
    /// Total bytes uploaded across all sessions, past and present
    total_uploaded: AtomicU64,
    /// Total bytes downloaded across all sessions, past and present
    total_downloaded: AtomicU64,
}

impl StatsRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session and return its id with the live counters entry.
    ///
    /// Never fails; ids are unique for the registry's lifetime.
    pub fn register(&self, metadata: Metadata) -> (u64, Arc<SessionStats>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let stats = Arc::new(SessionStats::new(metadata));
        self.sessions.insert(id, Arc::clone(&stats));
        (id, stats)
    }

    /// Remove a session from the live map.
    ///
    /// Totals are unaffected; unregistering twice is a no-op.
    pub fn unregister(&self, id: u64) {
        self.sessions.remove(&id);
    }

    pub(crate) fn add_uploaded(&self, bytes: u64) {
        self.total_uploaded.fetch_add(bytes, Ordering::Relaxed);
    }

    pub(crate) fn add_downloaded(&self, bytes: u64) {
        self.total_downloaded.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Number of currently live sessions
    #[must_use]
    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }

    /// Total bytes uploaded across all sessions
    #[must_use]
    pub fn total_uploaded(&self) -> u64 {
        self.total_uploaded.load(Ordering::Relaxed)
    }

    /// Total bytes downloaded across all sessions
    #[must_use]
    pub fn total_downloaded(&self) -> u64 {
        self.total_downloaded.load(Ordering::Relaxed)
    }

    /// Snapshot of the totals and every live session
    #[must_use]
    pub fn snapshot(&self) -> RegistrySnapshot {
        let mut sessions: Vec<SessionSnapshot> = self
            .sessions
            .iter()
            .map(|entry| entry.value().snapshot(*entry.key()))
            .collect();
        sessions.sort_by_key(|s| s.id);

        RegistrySnapshot {
            active: sessions.len(),
            total_uploaded: self.total_uploaded(),
            total_downloaded: self.total_downloaded(),
            sessions,
        }
    }
}

/// Snapshot of one live session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Registration id
    pub id: u64,
    /// Addressing of the flow
    pub metadata: Metadata,
    /// Bytes uploaded
    pub uploaded: u64,
    /// Bytes downloaded
    pub downloaded: u64,
}

/// Snapshot of the registry at a point in time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    /// Number of live sessions
    pub active: usize,
    /// Total bytes uploaded
    pub total_uploaded: u64,
    /// Total bytes downloaded
    pub total_downloaded: u64,
    /// Per-session counters for live sessions
    pub sessions: Vec<SessionSnapshot>,
}
