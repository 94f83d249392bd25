//! Line termination policy for sinks.

use std::io;

use crate::Sink;

/// Whether events are terminated with a newline before reaching the sink.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum LineMode {
    /// Append `\n` unless the event already ends with one.
    #[default]
    WithNewline,
    /// Forward events unchanged.
    WithoutNewline,
}

impl LineMode {
    /// Reports whether a newline is appended.
    #[must_use]
    pub const fn append_newline(self) -> bool {
        matches!(self, Self::WithNewline)
    }
}

/// Applies a [`LineMode`] to every event written to the inner sink.
///
/// The newline is appended to a copy of the event so the inner sink still
/// sees one `write` call per event.
#[derive(Debug)]
pub struct LineSink<S> {
    inner: S,
    line_mode: LineMode,
}

impl<S: Sink> LineSink<S> {
    /// Wraps `inner`.
    pub const fn new(inner: S, line_mode: LineMode) -> Self {
        Self { inner, line_mode }
    }

    /// The configured mode.
    #[must_use]
    pub const fn line_mode(&self) -> LineMode {
        self.line_mode
    }

    /// The wrapped sink.
    pub const fn get_ref(&self) -> &S {
        &self.inner
    }

    /// Unwraps the inner sink.
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: Sink> Sink for LineSink<S> {
    fn write(&self, bytes: &[u8]) -> io::Result<()> {
        if !self.line_mode.append_newline() || bytes.ends_with(b"\n") {
            return self.inner.write(bytes);
        }
        let mut line = Vec::with_capacity(bytes.len() + 1);
        line.extend_from_slice(bytes);
        line.push(b'\n');
        self.inner.write(&line)
    }

    fn flush(&self) -> io::Result<()> {
        self.inner.flush()
    }
}
