//! In-memory sink used by tests and for capturing output.

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::Sink;

/// Collects every written event in a shared buffer.
///
/// # Examples
///
/// ```
/// use logging_sink::{MemorySink, Sink};
///
/// let sink = MemorySink::new();
/// sink.write(b"one\n").unwrap();
/// sink.write(b"two\n").unwrap();
///
/// assert_eq!(sink.lines(), ["one", "two"]);
/// assert_eq!(sink.take(), b"one\ntwo\n");
/// assert!(sink.contents().is_empty());
/// ```
#[derive(Debug, Default)]
pub struct MemorySink {
    buffer: Mutex<Vec<u8>>,
    writes: AtomicUsize,
}

impl MemorySink {
    /// Creates an empty sink.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buffer: Mutex::new(Vec::new()),
            writes: AtomicUsize::new(0),
        }
    }

    /// A copy of everything written so far.
    #[must_use]
    pub fn contents(&self) -> Vec<u8> {
        self.buffer().clone()
    }

    /// Contents decoded as UTF-8, replacing invalid sequences.
    #[must_use]
    pub fn contents_lossy(&self) -> String {
        String::from_utf8_lossy(&self.buffer()).into_owned()
    }

    /// Lines written so far, without terminators.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.contents_lossy().lines().map(str::to_owned).collect()
    }

    /// Number of `write` calls received.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::Acquire)
    }

    /// Returns and clears the buffered bytes.
    pub fn take(&self) -> Vec<u8> {
        std::mem::take(&mut *self.buffer())
    }

    fn buffer(&self) -> MutexGuard<'_, Vec<u8>> {
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Sink for MemorySink {
    fn write(&self, bytes: &[u8]) -> io::Result<()> {
        let mut buffer = self.buffer();
        buffer.extend_from_slice(bytes);
        self.writes.fetch_add(1, Ordering::Release);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_writes() {
        let sink = MemorySink::new();
        sink.write(b"a").unwrap();
        sink.write(b"").unwrap();
        assert_eq!(sink.write_count(), 2);
        assert_eq!(sink.contents(), b"a");
    }

    #[test]
    fn concurrent_writes_are_all_counted() {
        let sink = MemorySink::new();
        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..50 {
                        sink.write(b"x").unwrap();
                    }
                });
            }
        });
        assert_eq!(sink.write_count(), 200);
        assert_eq!(sink.contents().len(), 200);
    }

    #[test]
    fn flush_is_a_no_op() {
        let sink = MemorySink::new();
        sink.write(b"kept").unwrap();
        sink.flush().unwrap();
        assert_eq!(sink.contents(), b"kept");
    }

    #[test]
    fn lossy_contents_replace_invalid_utf8() {
        let sink = MemorySink::new();
        sink.write(&[b'o', b'k', 0xff]).unwrap();
        assert_eq!(sink.contents_lossy(), "ok\u{fffd}");
    }
}
