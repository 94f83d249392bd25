//! Template encoder: a `{{verb}}` mini-language compiled once and
//! interpreted per event.
//!
//! # Verbs
//!
//! | verb | aliases | arguments |
//! |------|---------|-----------|
//! | level | `level`, `lvl`, `l` | `d`, `s`, `S`, `ss` (default), `SS` |
//! | time | `time`, `t` | preset name or `time` format description |
//! | color | `color`, `c` | none for the level color, else modifiers |
//! | body | `message`, `body`, `m`, `b` | directives |
//! | fields | `fields`, `f` | directives |
//! | stack trace | `stacktrace`, `s` | directives |
//! | caller | `caller`, `who`, `w` | directives plus `x` and `fmt:` |
//!
//! Directives are `name:value` pairs: `b`/`a` wrap the output, `bk`/`ak`
//! wrap keys, `av` separates items, `nl` and `enl` are line-break texts and
//! `n` is the number of fields per line.

mod color;
mod parser;
mod render;
mod timestamp;
mod tokens;

#[cfg(test)]
mod tests;

pub use color::{ColorSpecError, LevelColors};
pub use tokens::Program;

use record::{Level, LogEvent};

use crate::Encoder;
use render::RenderContext;

/// Layout used for blank templates.
pub const DEFAULT_TEMPLATE: &str = r"{{c}}{{l/S}} {{t}}{{c/reset}} {{m/a:\n}}{{f/ak: = /av:, /nl:\n\t/enl:\n\t\t/a:\n}}{{s/av:,/a:\n}}{{w/x/fmt:F (N:l)}}";

/// Renders events through a compiled template.
///
/// # Examples
///
/// ```
/// use encoding::{Encoder, TemplateEncoder};
/// use record::{Field, Level, LogEvent};
///
/// let encoder = TemplateEncoder::new("[{{l/s}}] {{m}}{{f/b: (/bk:/ak:=/av:, /a:)}}");
/// let mut event = LogEvent::new(Level::Warning);
/// event.set_message("slow query");
/// event.push_field(Field::u64("ms", 1200));
///
/// assert_eq!(encoder.encode(&event), b"[Wrn] slow query (ms=1200)");
/// ```
#[derive(Clone, Debug)]
pub struct TemplateEncoder {
    program: Program,
    colors: LevelColors,
    allow_empty: bool,
}

impl TemplateEncoder {
    /// Compiles `template` with the default level colors.
    #[must_use]
    pub fn new(template: &str) -> Self {
        Self::builder(template).build()
    }

    /// Starts configuring an encoder for `template`.
    #[must_use]
    pub fn builder(template: &str) -> TemplateEncoderBuilder {
        TemplateEncoderBuilder {
            template: template.to_owned(),
            colors: LevelColors::default(),
            allow_empty: false,
        }
    }

    /// The compiled program.
    #[must_use]
    pub const fn program(&self) -> &Program {
        &self.program
    }

    /// The level color table.
    #[must_use]
    pub const fn level_colors(&self) -> &LevelColors {
        &self.colors
    }
}

impl Default for TemplateEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPLATE)
    }
}

impl Encoder for TemplateEncoder {
    fn encode(&self, event: &LogEvent) -> Vec<u8> {
        let context = RenderContext {
            colors: &self.colors,
            allow_empty: self.allow_empty,
        };
        self.program.render(event, &context)
    }
}

/// Builder for [`TemplateEncoder`].
#[derive(Clone, Debug)]
pub struct TemplateEncoderBuilder {
    template: String,
    colors: LevelColors,
    allow_empty: bool,
}

impl TemplateEncoderBuilder {
    /// Overrides the color for `level` with a spec such as `bold/fg:#ff8800`.
    pub fn level_color(mut self, level: Level, spec: &str) -> Result<Self, ColorSpecError> {
        self.colors.set(level, spec)?;
        Ok(self)
    }

    /// Removes the color for `level`.
    #[must_use]
    pub fn without_level_color(mut self, level: Level) -> Self {
        self.colors.clear(level);
        self
    }

    /// Replaces the whole level color table.
    #[must_use]
    pub fn level_colors(mut self, colors: LevelColors) -> Self {
        self.colors = colors;
        self
    }

    /// Emits zero-valued vary fields instead of omitting them.
    #[must_use]
    pub const fn allow_empty(mut self, allow: bool) -> Self {
        self.allow_empty = allow;
        self
    }

    /// Compiles the template.
    #[must_use]
    pub fn build(self) -> TemplateEncoder {
        TemplateEncoder {
            program: parser::compile(&self.template),
            colors: self.colors,
            allow_empty: self.allow_empty,
        }
    }
}
