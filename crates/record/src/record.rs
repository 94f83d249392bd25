//! crates/record/src/record.rs
//! Frame-indexed aggregate of a stack trace, messages and fields.

use std::borrow::Cow;

use crate::field::Field;
use crate::frame::{StackCapture, StackFrame};

/// Message text tagged with the captured frame it belongs to.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Message {
    body: Cow<'static, str>,
    frame: usize,
}

impl Message {
    /// Creates a message attached to `frame`.
    pub fn new(body: impl Into<Cow<'static, str>>, frame: usize) -> Self {
        Self {
            body: body.into(),
            frame,
        }
    }

    /// Message text.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Captured-frame index.
    #[must_use]
    pub const fn frame(&self) -> usize {
        self.frame
    }
}

/// Stack trace plus ordered messages and fields, each tagged with a frame index.
///
/// A record is used both for the log event itself and for a linked error.
/// Messages and fields are appended at the record's *cursor*: the frame the
/// next entry belongs to. The cursor only moves forward, so entries of one
/// frame always form a contiguous run and indices never decrease. Whenever a
/// trace is present every recorded index is clamped below its length.
///
/// # Examples
///
/// ```
/// use record::{Field, LogRecord, StackFrame};
///
/// let mut record = LogRecord::new();
/// record.set_stack_trace(vec![
///     StackFrame::new("app::read", "src/io.rs", 10),
///     StackFrame::new("app::load", "src/load.rs", 20),
/// ]);
/// record.push_message("short read");
/// record.push_field(Field::u64("offset", 512));
/// record.advance_frame();
/// record.push_message("loading config");
///
/// let frames: Vec<_> = record.messages().iter().map(|m| m.frame()).collect();
/// assert_eq!(frames, [0, 1]);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LogRecord {
    stack_trace: Vec<StackFrame>,
    messages: Vec<Message>,
    fields: Vec<Field>,
    system_fields: Vec<Field>,
    cursor: usize,
}

impl LogRecord {
    /// Creates an empty record.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            stack_trace: Vec::new(),
            messages: Vec::new(),
            fields: Vec::new(),
            system_fields: Vec::new(),
            cursor: 0,
        }
    }

    /// Captured frames, innermost first.
    #[must_use]
    pub fn stack_trace(&self) -> &[StackFrame] {
        &self.stack_trace
    }

    /// Reports whether a stack trace is attached.
    #[must_use]
    pub fn has_stack_trace(&self) -> bool {
        !self.stack_trace.is_empty()
    }

    /// Replaces the stack trace and re-clamps recorded frame indices.
    pub fn set_stack_trace(&mut self, frames: Vec<StackFrame>) {
        self.stack_trace = frames;
        self.clamp_indices();
    }

    /// Captures a stack trace through `capture` unless one is already attached.
    ///
    /// Returns `true` when frames were captured.
    pub fn capture_stack_trace(&mut self, capture: &dyn StackCapture) -> bool {
        if self.has_stack_trace() {
            return false;
        }
        capture.capture(&mut self.stack_trace);
        self.clamp_indices();
        self.has_stack_trace()
    }

    /// Messages in insertion order.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Fields in insertion order.
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Chain metadata fields.
    #[must_use]
    pub fn system_fields(&self) -> &[Field] {
        &self.system_fields
    }

    /// Frame the next message or field is attached to.
    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// Moves the cursor to the next frame.
    pub fn advance_frame(&mut self) {
        self.move_cursor(self.cursor + 1);
    }

    /// Moves the cursor to `frame`. Positions behind the cursor are ignored so
    /// indices stay non-decreasing.
    pub fn move_cursor(&mut self, frame: usize) {
        self.cursor = self.clamp(frame.max(self.cursor));
    }

    /// Appends a message at the cursor frame.
    pub fn push_message(&mut self, body: impl Into<Cow<'static, str>>) {
        self.messages.push(Message::new(body, self.cursor));
    }

    /// Appends a field at the cursor frame.
    pub fn push_field(&mut self, mut field: Field) {
        field.set_frame(self.cursor);
        self.fields.push(field);
    }

    /// Appends a system field. The field is flagged `system` regardless of how
    /// it was built.
    pub fn push_system_field(&mut self, mut field: Field) {
        field.mark_system();
        self.system_fields.push(field);
    }

    /// Sets the top-level message body, the first message at frame 0.
    pub fn set_body(&mut self, body: impl Into<Cow<'static, str>>) {
        match self.messages.first_mut() {
            Some(first) if first.frame == 0 => first.body = body.into(),
            _ => self.messages.insert(0, Message::new(body, 0)),
        }
    }

    /// Looks up a system field by key.
    #[must_use]
    pub fn system_field(&self, key: &str) -> Option<&Field> {
        self.system_fields.iter().find(|field| field.key() == key)
    }

    /// The top-level message body, empty when none was recorded.
    #[must_use]
    pub fn body(&self) -> &str {
        self.messages.first().map_or("", Message::body)
    }

    /// The message attached last, i.e. the outermost one of an unwound chain.
    #[must_use]
    pub fn trailing_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Messages attached to exactly `frame`.
    pub fn messages_at(&self, frame: usize) -> impl Iterator<Item = &Message> {
        run_at(&self.messages, frame, Message::frame)
    }

    /// Fields attached to exactly `frame`.
    pub fn fields_at(&self, frame: usize) -> impl Iterator<Item = &Field> {
        run_at(&self.fields, frame, Field::frame)
    }

    /// Reports whether no frames, messages or fields were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stack_trace.is_empty()
            && self.messages.is_empty()
            && self.fields.is_empty()
            && self.system_fields.is_empty()
    }

    /// Truncates every list and resets the cursor, keeping allocations.
    pub fn clear(&mut self) {
        self.stack_trace.clear();
        self.messages.clear();
        self.fields.clear();
        self.system_fields.clear();
        self.cursor = 0;
    }

    fn clamp(&self, frame: usize) -> usize {
        if self.stack_trace.is_empty() {
            frame
        } else {
            frame.min(self.stack_trace.len() - 1)
        }
    }

    fn clamp_indices(&mut self) {
        if self.stack_trace.is_empty() {
            return;
        }
        let last = self.stack_trace.len() - 1;
        for message in &mut self.messages {
            message.frame = message.frame.min(last);
        }
        for field in &mut self.fields {
            let frame = field.frame().min(last);
            field.set_frame(frame);
        }
        self.cursor = self.cursor.min(last);
    }
}

/// Entries are sorted by frame, so the run for `frame` is found by binary search.
fn run_at<T>(entries: &[T], frame: usize, key: fn(&T) -> usize) -> impl Iterator<Item = &T> {
    let start = entries.partition_point(|entry| key(entry) < frame);
    entries[start..]
        .iter()
        .take_while(move |entry| key(entry) == frame)
}
