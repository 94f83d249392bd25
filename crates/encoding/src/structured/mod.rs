//! Schema-fixed JSON encoder.
//!
//! Each event becomes one newline-terminated JSON object:
//!
//! ```text
//! {"level":"error","level_value":3,"time":"2024-03-05T07:08:09Z",
//!  "message":"disk full","error_id":7,"error":"write failed: disk full",
//!  "fields":[{"key":"mount","value":"/var"}],
//!  "stacktrace":[{"func":"app::flush","file":"src/io.rs:40","package":"app",
//!                 "message":"write failed","fields":[...]}]}
//! ```
//!
//! `fields` and `stacktrace` are omitted when empty. With
//! [`FieldLayout::Flattened`], `fields` is an object keyed `"<frame>.<key>"`.

use std::borrow::Cow;
use std::fmt;

use record::{
    ERROR_CLASS_ID_KEY, ERROR_CLASS_NAME_KEY, ERROR_ID_KEY, Field, FieldValue, LogEvent,
    StackFrame,
};
use serde::Serialize;
use serde::ser::{SerializeMap, SerializeSeq, Serializer};

use crate::Encoder;
use crate::buffer::RenderBuffer;
use crate::diagnostics::trace_structured_failure;
use crate::view::{LinkedError, top_level_fields, walked_frames};

const PROMOTED_KEYS: [&str; 3] = [ERROR_ID_KEY, ERROR_CLASS_ID_KEY, ERROR_CLASS_NAME_KEY];
const INITIAL_CAPACITY: usize = 512;

/// Shape of the `fields` member.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum FieldLayout {
    /// An array of `{"key": ..., "value": ...}` objects.
    #[default]
    List,
    /// One object keyed `"<frame>.<key>"`.
    Flattened,
}

/// Renders events as one JSON object per line.
///
/// # Examples
///
/// ```
/// use encoding::{Encoder, StructuredEncoder};
/// use record::{Field, Level, LogEvent};
///
/// let mut event = LogEvent::new(Level::Notice);
/// event.set_message("started");
/// event.push_field(Field::u16("port", 8080));
///
/// let bytes = StructuredEncoder::new().encode(&event);
/// let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
/// assert_eq!(value["level"], "notice");
/// assert_eq!(value["fields"][0]["value"], 8080);
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct StructuredEncoder {
    layout: FieldLayout,
    allow_empty: bool,
}

impl StructuredEncoder {
    /// Creates an encoder using [`FieldLayout::List`].
    #[must_use]
    pub const fn new() -> Self {
        Self {
            layout: FieldLayout::List,
            allow_empty: false,
        }
    }

    /// Selects the `fields` layout.
    #[must_use]
    pub const fn with_layout(mut self, layout: FieldLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Emits zero-valued vary fields instead of omitting them.
    #[must_use]
    pub const fn allow_empty(mut self, allow: bool) -> Self {
        self.allow_empty = allow;
        self
    }
}

impl Encoder for StructuredEncoder {
    fn encode(&self, event: &LogEvent) -> Vec<u8> {
        let mut out = RenderBuffer::with_capacity(INITIAL_CAPACITY);
        let document = Document {
            event,
            layout: self.layout,
            allow_empty: self.allow_empty,
        };
        if let Err(error) = serde_json::to_writer(&mut out, &document) {
            trace_structured_failure(&error);
            out.rewind(0);
            let minimal = Minimal { event };
            if serde_json::to_writer(&mut out, &minimal).is_err() {
                out.rewind(0);
            }
        }
        out.push_byte(b'\n');
        out.into_vec()
    }
}

/// Writes `value` as a JSON fragment, leaving `out` untouched on failure.
pub(crate) fn write_fragment(value: &FieldValue, out: &mut RenderBuffer) {
    let mark = out.len();
    if let Err(error) = serde_json::to_writer(&mut *out, value) {
        trace_structured_failure(&error);
        out.rewind(mark);
    }
}

struct Document<'a> {
    event: &'a LogEvent,
    layout: FieldLayout,
    allow_empty: bool,
}

impl Serialize for Document<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let event = self.event;
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("level", event.level().as_lower_str())?;
        map.serialize_entry("level_value", &event.level().value())?;
        map.serialize_entry("time", &FieldValue::Time(event.timestamp()))?;
        map.serialize_entry("message", event.message().body())?;

        for key in PROMOTED_KEYS {
            if let Some(field) = promoted(event, key) {
                map.serialize_entry(key, field.value())?;
            }
        }

        let linked = LinkedError::of(event);
        if let Some(linked) = linked {
            let chain = ChainText(linked);
            if chain.has_text() {
                map.serialize_entry("error", &chain)?;
            }
        }

        let fields: Vec<&Field> = top_level_fields(event)
            .filter(|field| field.is_rendered(self.allow_empty))
            .filter(|field| !(field.is_system() && PROMOTED_KEYS.contains(&field.key())))
            .collect();
        if !fields.is_empty() {
            match self.layout {
                FieldLayout::List => map.serialize_entry("fields", &FieldList(&fields))?,
                FieldLayout::Flattened => {
                    map.serialize_entry("fields", &FlattenedFields(&fields))?;
                }
            }
        }

        let frames = walked_frames(event);
        if !frames.is_empty() {
            let stack = StackTrace {
                frames,
                linked,
                allow_empty: self.allow_empty,
            };
            map.serialize_entry("stacktrace", &stack)?;
        }
        map.end()
    }
}

/// Fallback document used when the full one cannot be serialized.
struct Minimal<'a> {
    event: &'a LogEvent,
}

impl Serialize for Minimal<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("level", self.event.level().as_lower_str())?;
        map.serialize_entry("level_value", &self.event.level().value())?;
        map.serialize_entry("message", self.event.message().body())?;
        map.end()
    }
}

fn promoted<'a>(event: &'a LogEvent, key: &str) -> Option<&'a Field> {
    event
        .message()
        .system_field(key)
        .or_else(|| event.error().and_then(|error| error.system_field(key)))
}

#[derive(Serialize)]
struct FieldEntry<'a> {
    key: Cow<'a, str>,
    value: &'a FieldValue,
}

fn entries<'a>(fields: impl IntoIterator<Item = &'a Field>) -> Vec<FieldEntry<'a>> {
    fields
        .into_iter()
        .enumerate()
        .map(|(position, field)| FieldEntry {
            key: field_key(field, position),
            value: field.value(),
        })
        .collect()
}

fn field_key(field: &Field, position: usize) -> Cow<'_, str> {
    if field.is_unnamed() {
        Cow::Owned(format!("_{position}"))
    } else {
        Cow::Borrowed(field.key())
    }
}

struct FieldList<'a>(&'a [&'a Field]);

impl Serialize for FieldList<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
        for entry in entries(self.0.iter().copied()) {
            seq.serialize_element(&entry)?;
        }
        seq.end()
    }
}

struct FlattenedFields<'a>(&'a [&'a Field]);

impl Serialize for FlattenedFields<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (position, field) in self.0.iter().enumerate() {
            let key = format!("{}.{}", field.frame(), field_key(field, position));
            map.serialize_entry(&key, field.value())?;
        }
        map.end()
    }
}

/// The linked error's messages, outermost first, joined by `": "`.
#[derive(Clone, Copy)]
struct ChainText<'a>(LinkedError<'a>);

impl ChainText<'_> {
    fn has_text(self) -> bool {
        self.0.messages_from(0).next().is_some()
    }
}

impl fmt::Display for ChainText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.0.messages_from(0).collect();
        for (index, message) in messages.iter().rev().enumerate() {
            if index > 0 {
                f.write_str(": ")?;
            }
            f.write_str(message)?;
        }
        Ok(())
    }
}

impl Serialize for ChainText<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

struct StackTrace<'a> {
    frames: &'a [StackFrame],
    linked: Option<LinkedError<'a>>,
    allow_empty: bool,
}

#[derive(Serialize)]
struct FrameEntry<'a> {
    func: &'a str,
    file: String,
    package: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fields: Vec<FieldEntry<'a>>,
}

impl Serialize for StackTrace<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.frames.len()))?;
        let last = self.frames.len() - 1;
        for (index, frame) in self.frames.iter().enumerate() {
            let (message, fields) = match self.linked {
                // Untraced chains can carry indices past the walked frames;
                // they collect on the last frame.
                Some(linked) if index == last => (
                    join_messages(linked.messages_from(index)),
                    entries(
                        linked
                            .fields_from(index)
                            .filter(|field| field.is_rendered(self.allow_empty)),
                    ),
                ),
                Some(linked) => (
                    join_messages(linked.messages_at(index)),
                    entries(
                        linked
                            .record()
                            .fields_at(index)
                            .filter(|field| field.is_rendered(self.allow_empty)),
                    ),
                ),
                None => (None, Vec::new()),
            };
            seq.serialize_element(&FrameEntry {
                func: frame.function(),
                file: format!("{}:{}", frame.file(), frame.line()),
                package: frame.package(),
                message,
                fields,
            })?;
        }
        seq.end()
    }
}

fn join_messages<'a>(messages: impl Iterator<Item = &'a str>) -> Option<String> {
    let joined = messages.collect::<Vec<_>>().join("; ");
    (!joined.is_empty()).then_some(joined)
}

#[cfg(test)]
mod tests;
