//! The finalized, read-only destination table.

use std::fmt;
use std::io;
use std::sync::{Mutex, PoisonError};

use encoding::Encoder;
use logging_sink::Sink;
use record::Level;

use crate::diagnostics::{trace_flush_failure, trace_write_failure};

/// A sink plus the first write failure it reported.
pub(super) struct SinkSlot {
    sink: Box<dyn Sink>,
    failure: Mutex<Option<io::Error>>,
}

impl SinkSlot {
    pub(super) fn new(sink: Box<dyn Sink>) -> Self {
        Self {
            sink,
            failure: Mutex::new(None),
        }
    }

    /// Writes one event, keeping the first failure until the next flush.
    fn write(&self, group: usize, index: usize, bytes: &[u8]) {
        let Err(error) = self.sink.write(bytes) else {
            return;
        };
        let mut failure = self.failure.lock().unwrap_or_else(PoisonError::into_inner);
        if failure.is_none() {
            trace_write_failure(group, index, &error);
            *failure = Some(error);
        }
    }

    fn take_failure(&self) -> Option<io::Error> {
        self.failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

/// One encoder with its thresholds and sinks.
pub struct Destination {
    encoder: Box<dyn Encoder>,
    min_level: Level,
    min_stacktrace_level: Option<Level>,
    sinks: Vec<SinkSlot>,
}

impl Destination {
    pub(super) fn new(
        encoder: Box<dyn Encoder>,
        min_level: Level,
        min_stacktrace_level: Option<Level>,
        sinks: Vec<SinkSlot>,
    ) -> Self {
        Self {
            encoder,
            min_level,
            min_stacktrace_level,
            sinks,
        }
    }

    /// The group's encoder.
    pub fn encoder(&self) -> &dyn Encoder {
        self.encoder.as_ref()
    }

    /// Least severe level this group accepts.
    #[must_use]
    pub const fn min_level(&self) -> Level {
        self.min_level
    }

    /// Least severe level for which a stack trace is captured, if any.
    #[must_use]
    pub const fn min_stacktrace_level(&self) -> Option<Level> {
        self.min_stacktrace_level
    }

    /// Number of sinks receiving this group's output.
    #[must_use]
    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    pub(super) fn accepts(&self, level: Level) -> bool {
        level.passes(self.min_level)
    }

    pub(super) fn wants_stack_trace(&self, level: Level) -> bool {
        self.min_stacktrace_level
            .is_some_and(|threshold| level.passes(threshold))
    }

    pub(super) fn write_all(&self, group: usize, bytes: &[u8]) {
        for (index, slot) in self.sinks.iter().enumerate() {
            slot.write(group, index, bytes);
        }
    }
}

impl fmt::Debug for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Destination")
            .field("min_level", &self.min_level)
            .field("min_stacktrace_level", &self.min_stacktrace_level)
            .field("sinks", &self.sinks.len())
            .finish_non_exhaustive()
    }
}

/// Destination groups in registration order plus the table-wide thresholds.
///
/// The table-wide thresholds are the loosest across all groups: the least
/// severe level that still reaches at least one destination.
#[derive(Debug)]
pub struct DestinationTable {
    groups: Vec<Destination>,
    min_level: Level,
    min_stacktrace_level: Option<Level>,
}

impl DestinationTable {
    pub(super) fn new(groups: Vec<Destination>) -> Self {
        let min_level = groups
            .iter()
            .map(Destination::min_level)
            .max()
            .unwrap_or(Level::Emergency);
        let min_stacktrace_level = groups
            .iter()
            .filter_map(Destination::min_stacktrace_level)
            .max();
        Self {
            groups,
            min_level,
            min_stacktrace_level,
        }
    }

    /// Groups in registration order.
    pub fn groups(&self) -> &[Destination] {
        &self.groups
    }

    /// Least severe level reaching any group.
    #[must_use]
    pub const fn min_level(&self) -> Level {
        self.min_level
    }

    /// Least severe level for which any group captures a stack trace.
    #[must_use]
    pub const fn min_stacktrace_level(&self) -> Option<Level> {
        self.min_stacktrace_level
    }

    /// Total number of sinks across groups.
    #[must_use]
    pub fn sink_count(&self) -> usize {
        self.groups.iter().map(Destination::sink_count).sum()
    }

    /// Surfaces recorded write failures and flushes every sink, in order,
    /// stopping at the first failure.
    pub(super) fn flush(&self) -> io::Result<()> {
        for (group_index, group) in self.groups.iter().enumerate() {
            for (sink_index, slot) in group.sinks.iter().enumerate() {
                if let Some(error) = slot.take_failure() {
                    return Err(error);
                }
                if let Err(error) = slot.sink.flush() {
                    trace_flush_failure(group_index, sink_index, &error);
                    return Err(error);
                }
            }
        }
        Ok(())
    }
}
