//! The sink capability and its implementations for standard destinations.

use std::fs::File;
use std::io::{self, Stderr, Stdout, Write};
use std::sync::Arc;

/// Destination for encoded log events.
///
/// Implementations must be shareable across threads; each `write` call
/// carries one complete event and must reach the destination without being
/// interleaved with concurrent calls.
pub trait Sink: Send + Sync {
    /// Writes one encoded event.
    fn write(&self, bytes: &[u8]) -> io::Result<()>;

    /// Flushes buffered output. Sinks without buffering keep the default.
    fn flush(&self) -> io::Result<()> {
        Ok(())
    }
}

impl Sink for Stdout {
    fn write(&self, bytes: &[u8]) -> io::Result<()> {
        Write::write_all(&mut self.lock(), bytes)
    }

    fn flush(&self) -> io::Result<()> {
        Write::flush(&mut self.lock())
    }
}

impl Sink for Stderr {
    fn write(&self, bytes: &[u8]) -> io::Result<()> {
        Write::write_all(&mut self.lock(), bytes)
    }

    fn flush(&self) -> io::Result<()> {
        Write::flush(&mut self.lock())
    }
}

/// Files are written through `&File`; a single `write_all` per event keeps
/// appends whole when the file was opened in append mode.
impl Sink for File {
    fn write(&self, bytes: &[u8]) -> io::Result<()> {
        let mut file = self;
        Write::write_all(&mut file, bytes)
    }

    fn flush(&self) -> io::Result<()> {
        let mut file = self;
        Write::flush(&mut file)
    }
}

impl<S: Sink + ?Sized> Sink for Arc<S> {
    fn write(&self, bytes: &[u8]) -> io::Result<()> {
        (**self).write(bytes)
    }

    fn flush(&self) -> io::Result<()> {
        (**self).flush()
    }
}

impl<S: Sink + ?Sized> Sink for Box<S> {
    fn write(&self, bytes: &[u8]) -> io::Result<()> {
        (**self).write(bytes)
    }

    fn flush(&self) -> io::Result<()> {
        (**self).flush()
    }
}

impl<S: Sink + ?Sized> Sink for &S {
    fn write(&self, bytes: &[u8]) -> io::Result<()> {
        (**self).write(bytes)
    }

    fn flush(&self) -> io::Result<()> {
        (**self).flush()
    }
}
