//! Half-duplex copy and the bidirectional relay engine
//!
//! A relay runs two half-duplex copiers in parallel, one per direction.
//! Neither cancels the other: when one direction finishes, the engine arms a
//! bounded read deadline on the connection the sibling is reading from, so a
//! TCP half-close becomes a bounded drain instead of an indefinite hang while
//! trailing data can still flow within the window.
//!
//! TCP teardown surfaces many platform-specific signals that are semantically
//! just "flow ended"; the copier suppresses those and only genuinely
//! unexpected errors surface.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{split, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::Notify;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, warn};

use super::buffer_pool::BufferPool;

/// Bounded wait applied to a direction once its sibling finishes
pub const DEFAULT_DRAIN_WINDOW: Duration = Duration::from_secs(5);

/// One-shot drain trigger shared between the two relay directions.
///
/// Arming is sticky. The armed flag is set before the wakeup is stored, so a
/// waiter registering concurrently with `arm` can never miss it. At most one
/// task may wait on a signal: the sibling copier.
#[derive(Debug, Default)]
pub struct DrainSignal {
    armed: AtomicBool,
    notify: Notify,
}

impl DrainSignal {
    /// Create an un-armed signal
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the signal, waking the waiter if one is registered
    pub fn arm(&self) {
        if !self.armed.swap(true, Ordering::AcqRel) {
            self.notify.notify_one();
        }
    }

    /// Check whether the signal has been armed
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::Acquire)
    }

    /// Resolve once the signal is armed
    pub async fn wait_armed(&self) {
        if self.is_armed() {
            return;
        }
        self.notify.notified().await;
    }
}

/// Classify transport errors that are really just "flow ended".
///
/// Deadline expiry is the drain firing; broken pipe and reset-by-peer are the
/// peer tearing the flow down from its side.
fn is_expected_teardown(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::BrokenPipe | io::ErrorKind::ConnectionReset
    )
}

/// Copy bytes from `src` to `dst` until end-of-stream.
///
/// Borrows one pooled buffer, returned on every exit path. Once `drain` is
/// armed, all remaining reads share one absolute deadline `drain_window` from
/// the arming instant; expiry ends the loop without surfacing an error, as do
/// broken-pipe and reset-by-peer. Returns the byte count relayed before the
/// loop ended.
///
/// # Errors
///
/// Any transport error other than the expected teardown signals.
pub async fn copy_half<R, W>(
    src: &mut R,
    dst: &mut W,
    pool: &Arc<BufferPool>,
    drain: &DrainSignal,
    drain_window: Duration,
) -> io::Result<u64>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = pool.acquire();
    let mut copied = 0u64;

    match copy_loop(src, dst, &mut buf, &mut copied, drain, drain_window).await {
        Ok(()) => Ok(copied),
        Err(e) if is_expected_teardown(&e) => {
            debug!("flow ended after {} bytes: {}", copied, e);
            Ok(copied)
        }
        Err(e) => Err(e),
    }
}

async fn copy_loop<R, W>(
    src: &mut R,
    dst: &mut W,
    buf: &mut [u8],
    copied: &mut u64,
    drain: &DrainSignal,
    drain_window: Duration,
) -> io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut deadline: Option<Instant> = None;

    loop {
        let n = if let Some(deadline) = deadline {
            match timeout_at(deadline, src.read(buf)).await {
                Ok(res) => res?,
                Err(_) => return Err(io::ErrorKind::TimedOut.into()),
            }
        } else {
            tokio::select! {
                res = src.read(buf) => res?,
                () = drain.wait_armed() => {
                    deadline = Some(Instant::now() + drain_window);
                    continue;
                }
            }
        };

        if n == 0 {
            break;
        }
        dst.write_all(&buf[..n]).await?;
        *copied += n as u64;
    }

    dst.flush().await
}

/// Per-direction outcomes of a relay.
///
/// Both directions report independently; a failure on one never masks the
/// other.
#[derive(Debug)]
pub struct RelayResult {
    /// left → right outcome (bytes relayed, or the non-ignorable error)
    pub uplink: io::Result<u64>,
    /// right → left outcome
    pub downlink: io::Result<u64>,
}

/// Relay bytes bidirectionally between `left` and `right` until both
/// directions finish.
///
/// The two copiers are polled concurrently; a blocked read on one direction
/// never stalls the other, and neither direction is cancelled when its
/// sibling completes. Instead, completion of one direction arms a bounded
/// read deadline on the connection the other is reading from. Non-ignorable
/// copy errors are logged at warning level and reported in the result; they
/// never abort the sibling direction.
pub async fn relay<L, R>(
    left: &mut L,
    right: &mut R,
    pool: &Arc<BufferPool>,
    drain_window: Duration,
) -> RelayResult
where
    L: AsyncRead + AsyncWrite + Unpin,
    R: AsyncRead + AsyncWrite + Unpin,
{
    let (mut left_rd, mut left_wr) = split(&mut *left);
    let (mut right_rd, mut right_wr) = split(&mut *right);

    // Each signal bounds reads from the connection it is named after.
    let left_drain = DrainSignal::new();
    let right_drain = DrainSignal::new();

    let uplink = async {
        let res = copy_half(&mut left_rd, &mut right_wr, pool, &left_drain, drain_window).await;
        right_drain.arm();
        res
    };
    let downlink = async {
        let res = copy_half(&mut right_rd, &mut left_wr, pool, &right_drain, drain_window).await;
        left_drain.arm();
        res
    };

    let (uplink, downlink) = tokio::join!(uplink, downlink);

    if let Err(e) = &uplink {
        warn!("uplink relay error: {}", e);
    }
    if let Err(e) = &downlink {
        warn!("downlink relay error: {}", e);
    }

    RelayResult { uplink, downlink }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tokio::io::{duplex, AsyncWriteExt, ReadBuf};

    /// Test stream with scripted reads and an accumulating write side
    struct ScriptedStream {
        reads: VecDeque<io::Result<Vec<u8>>>,
        written: Vec<u8>,
    }

    impl ScriptedStream {
        fn new(reads: Vec<io::Result<Vec<u8>>>) -> Self {
            Self {
                reads: reads.into(),
                written: Vec::new(),
            }
        }
    }

    impl AsyncRead for ScriptedStream {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            match self.reads.pop_front() {
                Some(Ok(data)) => {
                    buf.put_slice(&data);
                    Poll::Ready(Ok(()))
                }
                Some(Err(e)) => Poll::Ready(Err(e)),
                // Script exhausted: end of stream
                None => Poll::Ready(Ok(())),
            }
        }
    }

    impl AsyncWrite for ScriptedStream {
        fn poll_write(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            self.written.extend_from_slice(buf);
            Poll::Ready(Ok(buf.len()))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    fn pool() -> Arc<BufferPool> {
        Arc::new(BufferPool::new(8, 4096))
    }

    #[test]
    fn test_teardown_classification() {
        for kind in [
            io::ErrorKind::TimedOut,
            io::ErrorKind::BrokenPipe,
            io::ErrorKind::ConnectionReset,
        ] {
            assert!(is_expected_teardown(&io::Error::from(kind)));
        }
        assert!(!is_expected_teardown(&io::Error::other("boom")));
        assert!(!is_expected_teardown(&io::Error::from(
            io::ErrorKind::UnexpectedEof
        )));
    }

    #[tokio::test]
    async fn test_drain_signal_arm_before_wait() {
        let signal = DrainSignal::new();
        signal.arm();
        assert!(signal.is_armed());
        // Completes immediately, no wakeup needed
        signal.wait_armed().await;
    }

    #[tokio::test]
    async fn test_drain_signal_wakes_waiter() {
        let signal = Arc::new(DrainSignal::new());

        let waiter = {
            let signal = Arc::clone(&signal);
            tokio::spawn(async move { signal.wait_armed().await })
        };

        tokio::task::yield_now().await;
        signal.arm();
        waiter.await.unwrap();
    }

    #[tokio::test]
    async fn test_copy_half_until_eof() {
        let pool = pool();
        let (mut near, mut far) = duplex(64);

        near.write_all(b"hello relay").await.unwrap();
        near.shutdown().await.unwrap();

        let mut sink = ScriptedStream::new(vec![]);
        let drain = DrainSignal::new();
        let copied = copy_half(&mut far, &mut sink, &pool, &drain, DEFAULT_DRAIN_WINDOW)
            .await
            .unwrap();

        assert_eq!(copied, 11);
        assert_eq!(sink.written, b"hello relay");
        // Buffer went back to the pool
        assert_eq!(pool.available(), 1);
    }

    #[tokio::test]
    async fn test_copy_half_suppresses_reset() {
        let pool = pool();
        let mut src = ScriptedStream::new(vec![
            Ok(b"partial".to_vec()),
            Err(io::Error::from(io::ErrorKind::ConnectionReset)),
        ]);
        let mut sink = ScriptedStream::new(vec![]);
        let drain = DrainSignal::new();

        let copied = copy_half(&mut src, &mut sink, &pool, &drain, DEFAULT_DRAIN_WINDOW)
            .await
            .unwrap();

        // The reset is swallowed; the bytes before it were relayed
        assert_eq!(copied, 7);
        assert_eq!(sink.written, b"partial");
        assert_eq!(pool.available(), 1);
    }

    #[tokio::test]
    async fn test_copy_half_propagates_other_errors() {
        let pool = pool();
        let mut src = ScriptedStream::new(vec![Err(io::Error::other("disk on fire"))]);
        let mut sink = ScriptedStream::new(vec![]);
        let drain = DrainSignal::new();

        let err = copy_half(&mut src, &mut sink, &pool, &drain, DEFAULT_DRAIN_WINDOW)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "disk on fire");
        // Buffer returned even on the error path
        assert_eq!(pool.available(), 1);
    }

    #[tokio::test]
    async fn test_relay_preserves_order() {
        let pool = pool();
        let (mut local, local_peer) = duplex(64);
        let (mut remote, remote_peer) = duplex(64);
        let (mut peer_rd, mut peer_wr) = tokio::io::split(local_peer);
        let (mut srv_rd, mut srv_wr) = tokio::io::split(remote_peer);

        let relay_task = tokio::spawn(async move {
            relay(&mut local, &mut remote, &pool, DEFAULT_DRAIN_WINDOW).await
        });

        // Uneven chunking on the way in must not reorder bytes on the way out
        for chunk in [&b"ab"[..], &b"cdefg"[..], &b"h"[..], &b"ijklmnop"[..]] {
            peer_wr.write_all(chunk).await.unwrap();
        }
        peer_wr.shutdown().await.unwrap();

        let mut forwarded = vec![0u8; 16];
        srv_rd.read_exact(&mut forwarded).await.unwrap();
        assert_eq!(&forwarded, b"abcdefghijklmnop");

        srv_wr.write_all(b"reply").await.unwrap();
        let mut reply = vec![0u8; 5];
        peer_rd.read_exact(&mut reply).await.unwrap();
        assert_eq!(&reply, b"reply");

        srv_wr.shutdown().await.unwrap();
        let result = relay_task.await.unwrap();
        assert_eq!(result.uplink.unwrap(), 16);
        assert_eq!(result.downlink.unwrap(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_relay_drain_is_bounded() {
        let pool = pool();
        let (mut local, local_peer) = duplex(64);
        let (mut remote, remote_peer) = duplex(64);

        let started = Instant::now();
        let relay_task = tokio::spawn(async move {
            relay(&mut local, &mut remote, &pool, DEFAULT_DRAIN_WINDOW).await
        });

        // Remote side closes without the local side ever finishing: the
        // engine arms the drain deadline on the local connection and the
        // surviving direction must terminate within the window, cleanly.
        drop(remote_peer);

        let result = relay_task.await.unwrap();
        assert!(started.elapsed() <= DEFAULT_DRAIN_WINDOW + Duration::from_millis(100));
        assert_eq!(result.uplink.unwrap(), 0);
        assert_eq!(result.downlink.unwrap(), 0);
        drop(local_peer);
    }

    #[tokio::test(start_paused = true)]
    async fn test_relay_ignorable_error_spares_sibling() {
        let pool = pool();
        // Local side dies with a reset right away; its write half still works
        let mut local = ScriptedStream::new(vec![Err(io::Error::from(
            io::ErrorKind::ConnectionReset,
        ))]);
        let (mut remote, remote_peer) = duplex(4096);
        let (_srv_rd, mut srv_wr) = tokio::io::split(remote_peer);

        let payload = vec![0xa5u8; 3000];
        srv_wr.write_all(&payload).await.unwrap();
        srv_wr.shutdown().await.unwrap();

        let result = relay(&mut local, &mut remote, &pool, DEFAULT_DRAIN_WINDOW).await;

        // The reset was suppressed and the sibling direction delivered
        // everything it had
        assert_eq!(result.uplink.unwrap(), 0);
        assert_eq!(result.downlink.unwrap(), 3000);
        assert_eq!(local.written, payload);
    }

    #[tokio::test]
    async fn test_relay_reports_both_errors() {
        let pool = pool();
        let mut left = ScriptedStream::new(vec![Err(io::Error::other("left boom"))]);
        let mut right = ScriptedStream::new(vec![Err(io::Error::other("right boom"))]);

        let result = relay(&mut left, &mut right, &pool, DEFAULT_DRAIN_WINDOW).await;

        // Neither failure masks the other
        assert_eq!(result.uplink.unwrap_err().to_string(), "left boom");
        assert_eq!(result.downlink.unwrap_err().to_string(), "right boom");
    }
}
