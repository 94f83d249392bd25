//! Append-only output buffer with a fixed growth discipline.

use std::fmt;
use std::io;

/// Byte buffer used by both encoders.
///
/// The buffer starts at the compiled program's predicted length. When an
/// append does not fit, capacity grows by `max(needed, capacity / 2 + needed)`
/// through [`Vec::reserve_exact`], so a single large value never triggers a
/// cascade of doublings. Content is never truncated.
#[derive(Debug, Default)]
pub(crate) struct RenderBuffer {
    bytes: Vec<u8>,
}

impl RenderBuffer {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.bytes.len()
    }

    #[cfg(test)]
    pub(crate) fn capacity(&self) -> usize {
        self.bytes.capacity()
    }

    pub(crate) fn push_str(&mut self, text: &str) {
        self.push_bytes(text.as_bytes());
    }

    pub(crate) fn push_bytes(&mut self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        self.reserve(bytes.len());
        self.bytes.extend_from_slice(bytes);
    }

    pub(crate) fn push_byte(&mut self, byte: u8) {
        self.reserve(1);
        self.bytes.push(byte);
    }

    /// Drops everything written after `len`. Used to discard a partially
    /// serialized fragment.
    pub(crate) fn rewind(&mut self, len: usize) {
        self.bytes.truncate(len);
    }

    pub(crate) fn into_vec(self) -> Vec<u8> {
        self.bytes
    }

    fn reserve(&mut self, needed: usize) {
        let capacity = self.bytes.capacity();
        let spare = capacity - self.bytes.len();
        if spare >= needed {
            return;
        }
        let growth = needed.max(capacity / 2 + needed);
        self.bytes.reserve_exact(spare + growth);
        debug_assert!(self.bytes.capacity() - self.bytes.len() >= needed);
    }
}

impl fmt::Write for RenderBuffer {
    fn write_str(&mut self, text: &str) -> fmt::Result {
        self.push_str(text);
        Ok(())
    }
}

impl io::Write for RenderBuffer {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.push_bytes(bytes);
        Ok(bytes.len())
    }

    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.push_bytes(bytes);
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
