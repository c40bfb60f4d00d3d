//! Shared write payload
//!
//! A single buffer of random bytes, filled once from the OS entropy source
//! before any worker starts. Every file written by every worker is a prefix
//! of this buffer. The buffer is immutable once built and cloning a
//! [`Payload`] only bumps a reference count.

use crate::error::PayloadError;
use std::io;
use std::sync::Arc;

/// Immutable random byte buffer shared by all workers
#[derive(Clone)]
pub struct Payload {
    bytes: Arc<[u8]>,
}

impl Payload {
    /// Fill a new `len`-byte buffer with cryptographically secure random bytes
    pub fn generate(len: usize) -> Result<Self, PayloadError> {
        if len == 0 {
            return Err(PayloadError::Empty);
        }

        let mut buf = vec![0u8; len];
        getrandom::getrandom(&mut buf).map_err(|e| PayloadError::Entropy {
            len,
            source: match e.raw_os_error() {
                Some(code) => io::Error::from_raw_os_error(code),
                None => io::Error::new(io::ErrorKind::Other, e.to_string()),
            },
        })?;

        Ok(Self { bytes: buf.into() })
    }

    /// Payload length in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The first `n` bytes, clamped to the payload length
    pub fn prefix(&self, n: usize) -> &[u8] {
        &self.bytes[..n.min(self.bytes.len())]
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl std::fmt::Debug for Payload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Payload").field("len", &self.len()).finish()
    }
}
