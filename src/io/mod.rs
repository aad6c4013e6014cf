//! I/O utilities for tun-relay
//!
//! This module provides the pooled buffers every copier borrows and the
//! bidirectional relay engine that moves session traffic.

mod buffer_pool;
mod copy;

pub use buffer_pool::{
    BufferPool, BufferPoolStats, PooledBuffer, DEFAULT_POOL_CAPACITY, RELAY_BUFFER_SIZE,
};
pub use copy::{copy_half, relay, DrainSignal, RelayResult, DEFAULT_DRAIN_WINDOW};
