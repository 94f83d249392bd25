//! Interpreter running a compiled [`Program`] against one event.

use std::fmt::Write as _;

use record::{Field, Level, LogEvent, StackFrame};

use super::color::LevelColors;
use super::tokens::{Decorations, FrameFormat, FramePart, LevelFormat, Opcode, Program};
use crate::buffer::RenderBuffer;
use crate::structured::write_fragment;
use crate::view::{LinkedError, top_level_fields, walked_frames};

/// Per-encoder settings consulted while rendering.
pub(super) struct RenderContext<'a> {
    pub(super) colors: &'a LevelColors,
    pub(super) allow_empty: bool,
}

impl Program {
    /// Renders `event`. Never fails; absent data renders as nothing.
    pub(super) fn render(&self, event: &LogEvent, context: &RenderContext<'_>) -> Vec<u8> {
        let mut out = RenderBuffer::with_capacity(self.predicted_len());
        for opcode in self.opcodes() {
            match opcode {
                Opcode::Literal(text) | Opcode::Color(text) => out.push_str(text),
                Opcode::LevelColor => {
                    if let Some(sequence) = context.colors.get(event.level()) {
                        out.push_str(sequence);
                    }
                }
                Opcode::Level(format) => render_level(event.level(), *format, &mut out),
                Opcode::Time(format) => format.render(event.timestamp(), &mut out),
                Opcode::Body(decorations) => render_body(decorations, event, &mut out),
                Opcode::Fields(decorations) => {
                    render_fields(decorations, event, context.allow_empty, &mut out);
                }
                Opcode::StackTrace(decorations) => render_stack_trace(
                    decorations,
                    self.frame_format(),
                    &ErrorFieldStyle::new(decorations, self.field_layout()),
                    event,
                    context.allow_empty,
                    &mut out,
                ),
                Opcode::Caller(decorations) => {
                    render_caller(decorations, self.frame_format(), event, &mut out);
                }
            }
        }
        out.into_vec()
    }
}

fn render_level(level: Level, format: LevelFormat, out: &mut RenderBuffer) {
    let text = match format {
        LevelFormat::Numeric => {
            let _ = write!(out, "{}", level.value());
            return;
        }
        LevelFormat::Short => level.as_short_str(),
        LevelFormat::ShortUpper => level.as_short_upper_str(),
        LevelFormat::Full => level.as_str(),
        LevelFormat::FullUpper => level.as_upper_str(),
    };
    out.push_str(text);
}

fn render_body(decorations: &Decorations, event: &LogEvent, out: &mut RenderBuffer) {
    let body = event.message().body();
    if body.is_empty() {
        return;
    }
    out.push_str(&decorations.before);
    out.push_str(body);
    out.push_str(&decorations.after);
}

fn render_fields(
    decorations: &Decorations,
    event: &LogEvent,
    allow_empty: bool,
    out: &mut RenderBuffer,
) {
    let mut rendered = 0;
    for field in top_level_fields(event).filter(|field| field.is_rendered(allow_empty)) {
        if rendered == 0 {
            out.push_str(&decorations.before);
        } else if decorations.per_line > 0 && rendered % decorations.per_line == 0 {
            out.push_str(decorations.after_value.trim_end());
            out.push_str(decorations.line_break());
        } else {
            out.push_str(&decorations.after_value);
        }
        out.push_str(&decorations.before_key);
        write_key(field, rendered, out);
        out.push_str(&decorations.after_key);
        write_value(field, out);
        rendered += 1;
    }
    if rendered > 0 {
        out.push_str(&decorations.after);
    }
}

/// Walks the captured frames, placing linked-error messages and fields
/// beneath the frame they were recorded at.
fn render_stack_trace(
    decorations: &Decorations,
    format: &FrameFormat,
    field_style: &ErrorFieldStyle<'_>,
    event: &LogEvent,
    allow_empty: bool,
    out: &mut RenderBuffer,
) {
    let frames = walked_frames(event);
    let linked = LinkedError::of(event);
    let has_orphans = linked.is_some_and(|linked| {
        linked.messages_from(frames.len()).next().is_some()
            || linked
                .fields_from(frames.len())
                .any(|field| field.is_rendered(allow_empty))
    });
    if frames.is_empty() && !has_orphans {
        return;
    }

    out.push_str(&decorations.before);
    let mut started = false;
    for (index, frame) in frames.iter().enumerate() {
        if started {
            out.push_str(&decorations.after_value);
            out.push_str(decorations.line_break());
        }
        write_frame(format, frame, out);
        started = true;
        if let Some(linked) = linked {
            for message in linked.messages_at(index) {
                out.push_str(decorations.error_line_break());
                out.push_str(message);
            }
            write_error_fields(
                field_style,
                linked.record().fields_at(index),
                allow_empty,
                started,
                out,
            );
        }
    }

    if let Some(linked) = linked.filter(|_| has_orphans) {
        for message in linked.messages_from(frames.len()) {
            if started {
                out.push_str(decorations.error_line_break());
            }
            out.push_str(message);
            started = true;
        }
        write_error_fields(
            field_style,
            linked.fields_from(frames.len()),
            allow_empty,
            started,
            out,
        );
    }
    out.push_str(&decorations.after);
}

/// Layout of linked-error fields beneath a frame.
///
/// The fields verb supplies it when the template has one; otherwise the
/// stack-trace verb's keys and error line break apply, with `=` between key
/// and value and a space between pairs.
struct ErrorFieldStyle<'a> {
    before_key: &'a str,
    after_key: &'a str,
    separator: &'a str,
    line_break: &'a str,
    per_line: usize,
}

impl<'a> ErrorFieldStyle<'a> {
    fn new(stack: &'a Decorations, fields: Option<&'a Decorations>) -> Self {
        match fields {
            Some(fields) => Self {
                before_key: &fields.before_key,
                after_key: &fields.after_key,
                separator: &fields.after_value,
                line_break: fields.error_line_break(),
                per_line: fields.per_line,
            },
            None => Self {
                before_key: &stack.before_key,
                after_key: if stack.after_key.is_empty() {
                    "="
                } else {
                    stack.after_key.as_str()
                },
                separator: " ",
                line_break: stack.error_line_break(),
                per_line: 0,
            },
        }
    }
}

/// Writes the fields of one frame on a shared error line, wrapping every
/// `per_line` pairs.
fn write_error_fields<'a>(
    style: &ErrorFieldStyle<'_>,
    fields: impl Iterator<Item = &'a Field>,
    allow_empty: bool,
    line_started: bool,
    out: &mut RenderBuffer,
) {
    for (position, field) in fields
        .filter(|field| field.is_rendered(allow_empty))
        .enumerate()
    {
        if position == 0 {
            if line_started {
                out.push_str(style.line_break);
            }
        } else if style.per_line > 0 && position % style.per_line == 0 {
            out.push_str(style.separator.trim_end());
            out.push_str(style.line_break);
        } else {
            out.push_str(style.separator);
        }
        out.push_str(style.before_key);
        write_key(field, position, out);
        out.push_str(style.after_key);
        write_value(field, out);
    }
}

fn render_caller(
    decorations: &Decorations,
    format: &FrameFormat,
    event: &LogEvent,
    out: &mut RenderBuffer,
) {
    if decorations.suppressed {
        return;
    }
    let Some(frame) = walked_frames(event).first() else {
        return;
    };
    out.push_str(&decorations.before);
    write_frame(format, frame, out);
    out.push_str(&decorations.after);
}

fn write_frame(format: &FrameFormat, frame: &StackFrame, out: &mut RenderBuffer) {
    for part in format.parts() {
        match part {
            FramePart::Literal(text) => out.push_str(text),
            FramePart::ShortFunction => out.push_str(frame.short_function()),
            FramePart::FullFunction => out.push_str(frame.function()),
            FramePart::ShortFile => out.push_str(frame.short_file()),
            FramePart::FullFile => out.push_str(frame.file()),
            FramePart::Package => out.push_str(frame.package()),
            FramePart::Line => {
                let _ = write!(out, "{}", frame.line());
            }
        }
    }
}

fn write_key(field: &Field, position: usize, out: &mut RenderBuffer) {
    if field.is_unnamed() {
        let _ = write!(out, "_{position}");
    } else {
        out.push_str(field.key());
    }
}

/// Scalars print as plain text; composite values embed as JSON.
fn write_value(field: &Field, out: &mut RenderBuffer) {
    if field.is_null() || field.kind().is_scalar() {
        let _ = write!(out, "{}", field.value());
    } else {
        write_fragment(field.value(), out);
    }
}
