//! Read-only views shared by the template and structured renderers.

use record::{Field, LogEvent, LogRecord, Message, StackFrame};

/// The linked error as seen by a renderer.
///
/// When the error's trailing message is empty the event's own body is shown
/// in its place. The substitution happens on read; the event is never
/// mutated.
#[derive(Clone, Copy)]
pub(crate) struct LinkedError<'a> {
    record: &'a LogRecord,
    outer_body: &'a str,
}

impl<'a> LinkedError<'a> {
    pub(crate) fn of(event: &'a LogEvent) -> Option<Self> {
        event.error().map(|record| Self {
            record,
            outer_body: event.message().body(),
        })
    }

    pub(crate) const fn record(self) -> &'a LogRecord {
        self.record
    }

    /// Message text with the trailing-message substitution applied.
    pub(crate) fn body_of(self, message: &'a Message) -> &'a str {
        let is_trailing = self
            .record
            .trailing_message()
            .is_some_and(|last| std::ptr::eq(last, message));
        if is_trailing && message.body().is_empty() {
            self.outer_body
        } else {
            message.body()
        }
    }

    pub(crate) fn messages_at(self, frame: usize) -> impl Iterator<Item = &'a str> {
        self.record
            .messages_at(frame)
            .map(move |message| self.body_of(message))
            .filter(|body| !body.is_empty())
    }

    /// Messages recorded at `frame` or later; used for entries that have no
    /// walked frame to sit under.
    pub(crate) fn messages_from(self, frame: usize) -> impl Iterator<Item = &'a str> {
        self.record
            .messages()
            .iter()
            .filter(move |message| message.frame() >= frame)
            .map(move |message| self.body_of(message))
            .filter(|body| !body.is_empty())
    }

    pub(crate) fn fields_from(self, frame: usize) -> impl Iterator<Item = &'a Field> {
        self.record
            .fields()
            .iter()
            .filter(move |field| field.frame() >= frame)
    }
}

/// Frames walked by stack-trace rendering: the event's own trace, else the
/// linked error's.
pub(crate) fn walked_frames(event: &LogEvent) -> &[StackFrame] {
    if event.message().has_stack_trace() {
        return event.message().stack_trace();
    }
    event.error().map_or(&[], LogRecord::stack_trace)
}

/// Every top-level field in render order: system fields, linked-error system
/// fields, then the event's own fields.
pub(crate) fn top_level_fields(event: &LogEvent) -> impl Iterator<Item = &Field> {
    let linked = event
        .error()
        .map(LogRecord::system_fields)
        .unwrap_or_default();
    event
        .message()
        .system_fields()
        .iter()
        .chain(linked)
        .chain(event.message().fields())
}
