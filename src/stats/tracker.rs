//! Statistics tracking stream decorator
//!
//! `TrackedStream` wraps the proxy-side connection of a session and observes
//! transfer volume transparently: writes toward the backend count as upload,
//! reads from it as download. Construction registers the session in the
//! shared registry and never fails; dropping the stream unregisters it.

use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

use super::registry::{SessionStats, StatsRegistry};
use crate::metadata::Metadata;
use crate::outbound::ProxyStream;

/// Byte-accounting decorator around an outbound connection
pub struct TrackedStream<S> {
    inner: S,
    session: Arc<SessionStats>,
    registry: Arc<StatsRegistry>,
    id: u64,
}

impl<S> TrackedStream<S> {
    /// Wrap a connection, registering the session under `metadata`.
    ///
    /// The wrapped connection keeps its read/write contract; only accounting
    /// is added.
    pub fn new(inner: S, metadata: &Metadata, registry: Arc<StatsRegistry>) -> Self {
        let (id, session) = registry.register(metadata.clone());
        Self {
            inner,
            session,
            registry,
            id,
        }
    }

    /// Live counters for this session
    #[must_use]
    pub fn session_stats(&self) -> &Arc<SessionStats> {
        &self.session
    }
}

impl<S: AsyncRead + Unpin> AsyncRead for TrackedStream<S> {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let before = buf.filled().len();
        let this = &mut *self;
        match Pin::new(&mut this.inner).poll_read(cx, buf) {
            Poll::Ready(Ok(())) => {
                let n = (buf.filled().len() - before) as u64;
                if n > 0 {
                    this.session.record_download(n);
                    this.registry.add_downloaded(n);
                }
                Poll::Ready(Ok(()))
            }
            other => other,
        }
    }
}

impl<S: AsyncWrite + Unpin> AsyncWrite for TrackedStream<S> {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = &mut *self;
        match Pin::new(&mut this.inner).poll_write(cx, buf) {
            Poll::Ready(Ok(n)) => {
                if n > 0 {
                    this.session.record_upload(n as u64);
                    this.registry.add_uploaded(n as u64);
                }
                Poll::Ready(Ok(n))
            }
            other => other,
        }
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_shutdown(cx)
    }
}

impl<S: ProxyStream> ProxyStream for TrackedStream<S> {
    fn local_addr(&self) -> io::Result<SocketAddr> {
        self.inner.local_addr()
    }
}

impl<S> Drop for TrackedStream<S> {
    fn drop(&mut self) {
        self.registry.unregister(self.id);
    }
}

impl<S> fmt::Debug for TrackedStream<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackedStream")
            .field("id", &self.id)
            .field("metadata", self.session.metadata())
            .field("uploaded", &self.session.uploaded())
            .field("downloaded", &self.session.downloaded())
            .finish_non_exhaustive()
    }
}
