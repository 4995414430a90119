//! Append-only byte buffer for response assembly.
//!
//! Response bodies are spliced together from files the pool engine writes,
//! so every append is checked against a hard size cap instead of growing
//! without bound.

use crate::error::StatsError;

/// Hard cap on the size of any assembled response body.
pub const MAX_RESPONSE_SIZE: usize = 10 * 1024 * 1024;

/// Initial capacity for pool snapshot responses.
pub const POOL_SNAPSHOT_CAPACITY: usize = 4 * 1024;

/// Initial capacity for all-users aggregate responses.
pub const USER_AGGREGATE_CAPACITY: usize = 128 * 1024;

/// Growable byte buffer with a hard size cap.
///
/// One byte past the written region is always kept zeroed, so the capacity
/// stays strictly greater than the body length. An append either copies
/// the whole slice or fails leaving the content untouched.
pub struct ResponseBuffer {
    buf: Vec<u8>,
    used: usize,
}

impl ResponseBuffer {
    /// Create a buffer with `initial` bytes of zeroed capacity, clamped to
    /// `1..=MAX_RESPONSE_SIZE`.
    pub fn with_capacity(initial: usize) -> Self {
        let capacity = initial.clamp(1, MAX_RESPONSE_SIZE);
        Self {
            buf: vec![0; capacity],
            used: 0,
        }
    }

    /// Append `bytes`, doubling the capacity as needed up to the cap.
    ///
    /// Fails with [`StatsError::ResponseTooLarge`] once the bytes plus the
    /// reserved trailing byte cannot fit; the content written so far is
    /// unchanged in that case.
    pub fn append(&mut self, bytes: &[u8]) -> Result<(), StatsError> {
        while self.used + bytes.len() + 1 > self.buf.len() {
            if self.buf.len() >= MAX_RESPONSE_SIZE {
                return Err(StatsError::ResponseTooLarge);
            }
            let doubled = (self.buf.len() * 2).min(MAX_RESPONSE_SIZE);
            self.buf.resize(doubled, 0);
        }
        self.buf[self.used..self.used + bytes.len()].copy_from_slice(bytes);
        self.used += bytes.len();
        self.buf[self.used] = 0;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.used
    }

    pub fn is_empty(&self) -> bool {
        self.used == 0
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// The body assembled so far; never includes the reserved byte.
    pub fn as_slice(&self) -> &[u8] {
        &self.buf[..self.used]
    }

    /// Consume the buffer, yielding the body bytes.
    pub fn into_bytes(mut self) -> Vec<u8> {
        self.buf.truncate(self.used);
        self.buf
    }
}
