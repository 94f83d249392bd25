//! Opcode definitions backing template compilation and rendering.

use super::timestamp::TimeFormat;

/// Estimated bytes for a rendered body.
pub(super) const BODY_ESTIMATE: usize = 256;
/// Estimated bytes for rendered fields.
pub(super) const FIELDS_ESTIMATE: usize = 512;
/// Estimated bytes for a rendered stack trace.
pub(super) const STACKTRACE_ESTIMATE: usize = 1024;
/// Estimated bytes for a rendered caller frame.
pub(super) const CALLER_ESTIMATE: usize = 128;
/// Longest level rendering (`Emergency`).
pub(super) const LEVEL_ESTIMATE: usize = 9;
/// Longest SGR sequence the default level colors produce.
pub(super) const LEVEL_COLOR_ESTIMATE: usize = 32;

/// Compiled representation of a template.
///
/// A program is immutable after compilation and shared by every render.
#[derive(Clone, Debug)]
pub struct Program {
    opcodes: Vec<Opcode>,
    predicted_len: usize,
    frame_format: FrameFormat,
    field_layout: Option<Decorations>,
}

impl Program {
    pub(super) fn new(opcodes: Vec<Opcode>, frame_format: FrameFormat) -> Self {
        let predicted_len = opcodes.iter().map(Opcode::estimate).sum();
        let field_layout = opcodes.iter().find_map(|opcode| match opcode {
            Opcode::Fields(decorations) => Some(decorations.clone()),
            _ => None,
        });
        Self {
            opcodes,
            predicted_len,
            frame_format,
            field_layout,
        }
    }

    pub(super) fn opcodes(&self) -> impl Iterator<Item = &Opcode> {
        self.opcodes.iter()
    }

    /// Initial buffer size for a render. A sizing hint only; output may be
    /// longer.
    #[must_use]
    pub const fn predicted_len(&self) -> usize {
        self.predicted_len
    }

    /// Number of compiled opcodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.opcodes.len()
    }

    /// Returns `true` when the template compiled to nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.opcodes.is_empty()
    }

    /// Frame layout shared by the caller and stack-trace verbs.
    pub(super) const fn frame_format(&self) -> &FrameFormat {
        &self.frame_format
    }

    /// Directives of the fields verb, reused for linked-error fields laid
    /// out beneath stack frames.
    pub(super) const fn field_layout(&self) -> Option<&Decorations> {
        self.field_layout.as_ref()
    }

    /// The literal text of a program made only of literals.
    #[cfg(test)]
    pub(super) fn literal_text(&self) -> Option<String> {
        self.opcodes
            .iter()
            .map(|opcode| match opcode {
                Opcode::Literal(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(super) enum Opcode {
    Literal(String),
    /// Precomputed SGR sequence.
    Color(String),
    LevelColor,
    Level(LevelFormat),
    Time(TimeFormat),
    Body(Decorations),
    Fields(Decorations),
    StackTrace(Decorations),
    Caller(Decorations),
}

impl Opcode {
    fn estimate(&self) -> usize {
        match self {
            Self::Literal(text) | Self::Color(text) => text.len(),
            Self::LevelColor => LEVEL_COLOR_ESTIMATE,
            Self::Level(_) => LEVEL_ESTIMATE,
            Self::Time(format) => format.estimate(),
            Self::Body(decorations) => decorations.estimate(BODY_ESTIMATE),
            Self::Fields(decorations) => decorations.estimate(FIELDS_ESTIMATE),
            Self::StackTrace(decorations) => decorations.estimate(STACKTRACE_ESTIMATE),
            Self::Caller(decorations) => decorations.estimate(CALLER_ESTIMATE),
        }
    }
}

/// Level rendering selected by the level verb's tag.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(super) enum LevelFormat {
    /// `d`
    Numeric,
    /// `s`
    Short,
    /// `S`
    ShortUpper,
    /// `ss`, the default
    Full,
    /// `SS`
    FullUpper,
}

impl LevelFormat {
    pub(super) fn from_tag(tag: &str) -> Option<Self> {
        Some(match tag {
            "d" => Self::Numeric,
            "s" => Self::Short,
            "S" => Self::ShortUpper,
            "ss" => Self::Full,
            "SS" => Self::FullUpper,
            _ => return None,
        })
    }
}

/// Directive values of a body, fields, stacktrace or caller verb.
#[derive(Clone, Debug, Default, PartialEq)]
pub(super) struct Decorations {
    pub(super) before: String,
    pub(super) after: String,
    pub(super) before_key: String,
    pub(super) after_key: String,
    pub(super) after_value: String,
    pub(super) line_break: Option<String>,
    pub(super) error_line_break: Option<String>,
    pub(super) per_line: usize,
    pub(super) suppressed: bool,
}

impl Decorations {
    fn estimate(&self, content: usize) -> usize {
        if self.suppressed {
            return 0;
        }
        self.before.len() + self.after.len() + content
    }

    pub(super) fn line_break(&self) -> &str {
        self.line_break.as_deref().unwrap_or("\n")
    }

    pub(super) fn error_line_break(&self) -> &str {
        self.error_line_break.as_deref().unwrap_or("\n\t")
    }
}

/// One element of a frame layout.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(super) enum FramePart {
    Literal(String),
    ShortFunction,
    FullFunction,
    ShortFile,
    FullFile,
    Line,
    Package,
}

impl FramePart {
    const fn letter(&self) -> Option<char> {
        match self {
            Self::Literal(_) => None,
            Self::ShortFunction => Some('f'),
            Self::FullFunction => Some('F'),
            Self::ShortFile => Some('n'),
            Self::FullFile => Some('N'),
            Self::Line => Some('l'),
            Self::Package => Some('p'),
        }
    }
}

/// How a single stack frame is laid out, e.g. `F (N:l)`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(super) struct FrameFormat {
    parts: Vec<FramePart>,
}

impl FrameFormat {
    /// Layout used when no caller verb supplies one.
    pub(super) const DEFAULT_SPEC: &'static str = "F (N:l)";

    /// Parses a layout. Letters `f F n N l p` select frame parts; a letter
    /// seen before is dropped; everything else is literal text.
    pub(super) fn parse(spec: &str) -> Self {
        let mut parts: Vec<FramePart> = Vec::new();
        let mut literal = String::new();
        for ch in spec.chars() {
            let part = match ch {
                'f' => FramePart::ShortFunction,
                'F' => FramePart::FullFunction,
                'n' => FramePart::ShortFile,
                'N' => FramePart::FullFile,
                'l' => FramePart::Line,
                'p' => FramePart::Package,
                other => {
                    literal.push(other);
                    continue;
                }
            };
            if parts.iter().any(|seen| seen.letter() == part.letter()) {
                continue;
            }
            if !literal.is_empty() {
                parts.push(FramePart::Literal(std::mem::take(&mut literal)));
            }
            parts.push(part);
        }
        if !literal.is_empty() {
            parts.push(FramePart::Literal(literal));
        }
        Self { parts }
    }

    pub(super) fn parts(&self) -> impl Iterator<Item = &FramePart> {
        self.parts.iter()
    }
}

impl Default for FrameFormat {
    fn default() -> Self {
        Self::parse(Self::DEFAULT_SPEC)
    }
}
