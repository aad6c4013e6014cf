//! Lock-free relay buffer pool
//!
//! Every half-duplex copier borrows exactly one buffer for the duration of
//! its loop. Using `crossbeam-queue::ArrayQueue` for lock-free buffer
//! management keeps contention low with many concurrent sessions.
//!
//! # Example
//!
//! ```
//! use tun_relay::io::BufferPool;
//! use std::sync::Arc;
//!
//! let pool = Arc::new(BufferPool::with_defaults());
//!
//! let buffer = pool.acquire();
//! assert_eq!(buffer.len(), pool.buffer_size());
//!
//! // Buffer is automatically returned to the pool when dropped
//! drop(buffer);
//! assert_eq!(pool.available(), 1);
//! ```

use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_queue::ArrayQueue;

/// Relay copy buffer size
pub const RELAY_BUFFER_SIZE: usize = 20 * 1024;

/// Default pool capacity (number of buffers)
pub const DEFAULT_POOL_CAPACITY: usize = 512;

/// Statistics for the buffer pool
#[derive(Debug, Default)]
pub struct BufferPoolStats {
    /// Number of new buffer allocations (pool was empty)
    allocations: AtomicU64,
    /// Number of buffer reuses from pool
    reuses: AtomicU64,
    /// Number of buffers returned to pool
    returns: AtomicU64,
    /// Number of buffers dropped (pool was full)
    drops: AtomicU64,
}

impl BufferPoolStats {
    /// Get the number of allocations
    #[must_use]
    pub fn allocations(&self) -> u64 {
        self.allocations.load(Ordering::Relaxed)
    }

    /// Get the number of reuses
    #[must_use]
    pub fn reuses(&self) -> u64 {
        self.reuses.load(Ordering::Relaxed)
    }

    /// Get the number of returns
    #[must_use]
    pub fn returns(&self) -> u64 {
        self.returns.load(Ordering::Relaxed)
    }

    /// Get the number of drops
    #[must_use]
    pub fn drops(&self) -> u64 {
        self.drops.load(Ordering::Relaxed)
    }
}

/// A lock-free pool of reusable relay buffers.
///
/// Buffers are automatically returned to the pool when dropped. Reused
/// buffers keep whatever bytes the previous copier left in them; consumers
/// must not assume any particular prior contents.
#[derive(Debug)]
pub struct BufferPool {
    /// Lock-free queue of available buffers
    buffers: ArrayQueue<Vec<u8>>,
    /// Size of each buffer
    buffer_size: usize,
    /// Pool statistics
    stats: BufferPoolStats,
}

impl BufferPool {
    /// Create a new buffer pool with the specified capacity and buffer size
    #[must_use]
    pub fn new(capacity: usize, buffer_size: usize) -> Self {
        Self {
            buffers: ArrayQueue::new(capacity),
            buffer_size,
            stats: BufferPoolStats::default(),
        }
    }

    /// Create a pool with default settings
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_POOL_CAPACITY, RELAY_BUFFER_SIZE)
    }

    /// Acquire a buffer from the pool, allocating if the pool is empty.
    ///
    /// Reused buffers are not zeroed; the copier overwrites them before any
    /// byte is read back out.
    #[must_use]
    pub fn acquire(self: &Arc<Self>) -> PooledBuffer {
        let buffer = if let Some(mut buf) = self.buffers.pop() {
            self.stats.reuses.fetch_add(1, Ordering::Relaxed);
            buf.clear();
            if buf.capacity() >= self.buffer_size {
                // Safety: capacity was allocated at buffer_size and the
                // contents are only ever read after a `read` fills them.
                unsafe { buf.set_len(self.buffer_size) };
            } else {
                buf.resize(self.buffer_size, 0);
            }
            buf
        } else {
            self.stats.allocations.fetch_add(1, Ordering::Relaxed);
            vec![0u8; self.buffer_size]
        };

        PooledBuffer {
            buffer: Some(buffer),
            pool: Arc::clone(self),
        }
    }

    /// Return a buffer to the pool, dropping it if the pool is full
    fn release(&self, mut buffer: Vec<u8>) {
        buffer.clear();

        match self.buffers.push(buffer) {
            Ok(()) => {
                self.stats.returns.fetch_add(1, Ordering::Relaxed);
            }
            Err(_buf) => {
                self.stats.drops.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Get the buffer size
    #[must_use]
    pub const fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Get the pool capacity
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buffers.capacity()
    }

    /// Get the current number of available buffers in the pool
    #[must_use]
    pub fn available(&self) -> usize {
        self.buffers.len()
    }

    /// Get pool statistics
    #[must_use]
    pub fn stats(&self) -> &BufferPoolStats {
        &self.stats
    }
}

/// A buffer borrowed from the pool.
///
/// Automatically returns to the pool when dropped, on every exit path.
#[derive(Debug)]
pub struct PooledBuffer {
    /// The underlying buffer (Option for taking on drop)
    buffer: Option<Vec<u8>>,
    /// Owning pool
    pool: Arc<BufferPool>,
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        if let Some(buf) = self.buffer.take() {
            self.pool.release(buf);
        }
    }
}

impl Deref for PooledBuffer {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.buffer.as_ref().map_or(&[], Vec::as_slice)
    }
}

impl DerefMut for PooledBuffer {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.buffer.as_mut().map_or(&mut [], Vec::as_mut_slice)
    }
}

impl AsRef<[u8]> for PooledBuffer {
    fn as_ref(&self) -> &[u8] {
        self
    }
}

impl AsMut<[u8]> for PooledBuffer {
    fn as_mut(&mut self) -> &mut [u8] {
        self
    }
}
