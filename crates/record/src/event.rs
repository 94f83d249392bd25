//! crates/record/src/event.rs
//! One log occurrence: level, timestamp, message record and linked error.

use std::borrow::Cow;

use time::OffsetDateTime;

use crate::error::ErrorUnwinder;
use crate::field::Field;
use crate::level::Level;
use crate::record::LogRecord;

/// A log event handed to exactly one encoder invocation per destination.
///
/// Events are normally pooled: the owning router hands out a guard that
/// clears the event and returns it to the pool once dispatched, so the
/// record allocations are reused across calls.
///
/// # Examples
///
/// ```
/// use record::{Field, Level, LogEvent};
///
/// let mut event = LogEvent::new(Level::Error);
/// event.set_message("disk full");
/// event.push_field(Field::str("mount", "/var"));
///
/// assert_eq!(event.message().body(), "disk full");
/// assert!(event.error().is_none());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct LogEvent {
    level: Level,
    timestamp: OffsetDateTime,
    message: LogRecord,
    error: Option<LogRecord>,
}

impl LogEvent {
    /// Creates an event stamped with the current UTC time.
    #[must_use]
    pub fn new(level: Level) -> Self {
        Self::at(level, OffsetDateTime::now_utc())
    }

    /// Creates an event with an explicit timestamp.
    #[must_use]
    pub const fn at(level: Level, timestamp: OffsetDateTime) -> Self {
        Self {
            level,
            timestamp,
            message: LogRecord::new(),
            error: None,
        }
    }

    /// Severity.
    #[must_use]
    pub const fn level(&self) -> Level {
        self.level
    }

    /// Sets the severity.
    pub fn set_level(&mut self, level: Level) {
        self.level = level;
    }

    /// Event time.
    #[must_use]
    pub const fn timestamp(&self) -> OffsetDateTime {
        self.timestamp
    }

    /// Sets the event time.
    pub fn set_timestamp(&mut self, timestamp: OffsetDateTime) {
        self.timestamp = timestamp;
    }

    /// The event's own record.
    #[must_use]
    pub const fn message(&self) -> &LogRecord {
        &self.message
    }

    /// Mutable access to the event's own record.
    pub fn message_mut(&mut self) -> &mut LogRecord {
        &mut self.message
    }

    /// Sets the top-level message body.
    pub fn set_message(&mut self, body: impl Into<Cow<'static, str>>) {
        self.message.set_body(body);
    }

    /// Appends a top-level field.
    pub fn push_field(&mut self, field: Field) {
        self.message.push_field(field);
    }

    /// The linked error record, if any.
    #[must_use]
    pub const fn error(&self) -> Option<&LogRecord> {
        self.error.as_ref()
    }

    /// Mutable access to the linked error slot.
    pub fn error_mut(&mut self) -> &mut Option<LogRecord> {
        &mut self.error
    }

    /// Attaches a linked error record.
    pub fn link_error(&mut self, record: LogRecord) {
        self.error = Some(record);
    }

    /// Unwinds `error` through `unwinder` into the linked error slot,
    /// reusing the slot's allocations when present.
    pub fn attach_error(
        &mut self,
        error: &(dyn std::error::Error + 'static),
        unwinder: &dyn ErrorUnwinder,
    ) {
        let record = self.error.get_or_insert_with(LogRecord::new);
        record.clear();
        unwinder.unwind(error, record);
    }

    /// Reports whether the event or its linked error carries a stack trace.
    #[must_use]
    pub fn has_stack_trace(&self) -> bool {
        self.message.has_stack_trace()
            || self.error.as_ref().is_some_and(LogRecord::has_stack_trace)
    }

    /// Clears all recorded data so the event can be reused.
    pub fn clear(&mut self) {
        self.message.clear();
        self.error = None;
    }
}
