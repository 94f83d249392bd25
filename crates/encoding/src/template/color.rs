//! ANSI color sub-language used by the color verb and level color table.
//!
//! A color specification is a `/`-separated list of modifiers compiled into
//! one SGR escape sequence:
//!
//! | modifier | SGR |
//! |----------|-----|
//! | `bold` / `nobold` | `1` / `22` |
//! | `italic` / `noitalic` | `3` / `23` |
//! | `underline` / `nounderline` | `4` / `24` |
//! | `reset` | `0` |
//! | `fg:<color>` | `38;5;N`, or `39` for `-1` |
//! | `bg:<color>` | `48;5;N`, or `49` for `-1` |
//!
//! Colors may be `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`, `rgb(r,g,b)`,
//! `rgba(r,g,b,a)`, `r,g,b`, a palette index `0..=255`, or one of the sixteen
//! terminal color names. Truecolor values map to the nearest entry of the
//! xterm 256-color cube or grayscale ramp. Parsing is all-or-nothing.

use record::Level;
use thiserror::Error;

/// A color specification that could not be parsed.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[error("invalid color token `{token}`")]
pub struct ColorSpecError {
    token: String,
}

impl ColorSpecError {
    fn new(token: &str) -> Self {
        Self {
            token: token.to_owned(),
        }
    }

    /// The offending token.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }
}

const NAMED: [(&str, u8); 16] = [
    ("black", 0),
    ("red", 1),
    ("green", 2),
    ("yellow", 3),
    ("blue", 4),
    ("magenta", 5),
    ("cyan", 6),
    ("white", 7),
    ("brightblack", 8),
    ("brightred", 9),
    ("brightgreen", 10),
    ("brightyellow", 11),
    ("brightblue", 12),
    ("brightmagenta", 13),
    ("brightcyan", 14),
    ("brightwhite", 15),
];

const CUBE_LEVELS: [u8; 6] = [0, 95, 135, 175, 215, 255];

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Color {
    TerminalDefault,
    Index(u8),
}

/// Compiles a modifier list into an SGR sequence such as `\x1b[1;38;5;196m`.
///
/// An empty list or any unrecognized token fails the whole specification.
pub(super) fn compile<'a>(
    modifiers: impl IntoIterator<Item = &'a str>,
) -> Result<String, ColorSpecError> {
    let mut codes: Vec<String> = Vec::new();
    for token in modifiers {
        codes.push(compile_modifier(token)?);
    }
    if codes.is_empty() {
        return Err(ColorSpecError::new(""));
    }
    Ok(format!("\x1b[{}m", codes.join(";")))
}

fn compile_modifier(token: &str) -> Result<String, ColorSpecError> {
    let lowered = token.trim().to_ascii_lowercase();
    let fixed = match lowered.as_str() {
        "bold" => Some("1"),
        "italic" => Some("3"),
        "underline" => Some("4"),
        "nobold" => Some("22"),
        "noitalic" => Some("23"),
        "nounderline" => Some("24"),
        "reset" => Some("0"),
        _ => None,
    };
    if let Some(code) = fixed {
        return Ok(code.to_owned());
    }

    let (base, default, spec) = if let Some(spec) = lowered.strip_prefix("fg:") {
        (38, 39, spec)
    } else if let Some(spec) = lowered.strip_prefix("bg:") {
        (48, 49, spec)
    } else {
        return Err(ColorSpecError::new(token));
    };

    match parse_color(spec.trim()).ok_or_else(|| ColorSpecError::new(token))? {
        Color::TerminalDefault => Ok(default.to_string()),
        Color::Index(index) => Ok(format!("{base};5;{index}")),
    }
}

fn parse_color(spec: &str) -> Option<Color> {
    if spec == "-1" {
        return Some(Color::TerminalDefault);
    }
    if let Some(hex) = spec.strip_prefix('#') {
        return parse_hex(hex).map(|(r, g, b)| Color::Index(nearest_index(r, g, b)));
    }
    if let Some(inner) = spec
        .strip_prefix("rgba(")
        .or_else(|| spec.strip_prefix("rgb("))
        .and_then(|rest| rest.strip_suffix(')'))
    {
        return parse_triplet(inner).map(|(r, g, b)| Color::Index(nearest_index(r, g, b)));
    }
    if spec.contains(',') {
        return parse_triplet(spec).map(|(r, g, b)| Color::Index(nearest_index(r, g, b)));
    }
    if !spec.is_empty() && spec.bytes().all(|byte| byte.is_ascii_digit()) {
        return spec.parse::<u8>().ok().map(Color::Index);
    }
    NAMED
        .iter()
        .find(|(name, _)| *name == spec)
        .map(|&(_, index)| Color::Index(index))
}

fn parse_hex(hex: &str) -> Option<(u8, u8, u8)> {
    if !hex.bytes().all(|byte| byte.is_ascii_hexdigit()) {
        return None;
    }
    let digit = |index: usize| u8::from_str_radix(&hex[index..=index], 16).ok();
    let pair = |index: usize| u8::from_str_radix(&hex[index..index + 2], 16).ok();
    match hex.len() {
        3 | 4 => Some((digit(0)? * 17, digit(1)? * 17, digit(2)? * 17)),
        6 | 8 => Some((pair(0)?, pair(2)?, pair(4)?)),
        _ => None,
    }
}

/// `r,g,b` or `r,g,b,a`; alpha is validated and ignored.
fn parse_triplet(text: &str) -> Option<(u8, u8, u8)> {
    let parts: Vec<u8> = text
        .split(',')
        .map(|part| part.trim().parse::<u8>().ok())
        .collect::<Option<_>>()?;
    match parts.as_slice() {
        [r, g, b] | [r, g, b, _] => Some((*r, *g, *b)),
        _ => None,
    }
}

/// Nearest xterm palette entry among the 6x6x6 cube (16..=231) and the
/// grayscale ramp (232..=255).
fn nearest_index(r: u8, g: u8, b: u8) -> u8 {
    let cube_step = |channel: u8| -> usize {
        CUBE_LEVELS
            .iter()
            .enumerate()
            .min_by_key(|&(_, level)| level.abs_diff(channel))
            .map_or(0, |(step, _)| step)
    };
    let (cr, cg, cb) = (cube_step(r), cube_step(g), cube_step(b));
    let cube_rgb = (CUBE_LEVELS[cr], CUBE_LEVELS[cg], CUBE_LEVELS[cb]);
    let cube_index = 16 + 36 * cr + 6 * cg + cb;

    let average = (u32::from(r) + u32::from(g) + u32::from(b)) / 3;
    let gray_step = (average.saturating_sub(3) / 10).min(23);
    let gray_level = u8::try_from(8 + gray_step * 10).unwrap_or(u8::MAX);
    let gray_index = 232 + gray_step as usize;

    let target = (r, g, b);
    let cube_distance = distance(target, cube_rgb);
    let gray_distance = distance(target, (gray_level, gray_level, gray_level));
    let index = if gray_distance < cube_distance {
        gray_index
    } else {
        cube_index
    };
    u8::try_from(index).unwrap_or(u8::MAX)
}

fn distance(a: (u8, u8, u8), b: (u8, u8, u8)) -> u32 {
    let channel = |x: u8, y: u8| u32::from(x.abs_diff(y)).pow(2);
    channel(a.0, b.0) + channel(a.1, b.1) + channel(a.2, b.2)
}

/// Per-level SGR sequences used by the color-by-level verb.
///
/// Levels without an entry render no color.
///
/// # Examples
///
/// ```
/// use encoding::LevelColors;
/// use record::Level;
///
/// let mut colors = LevelColors::default();
/// colors.set(Level::Info, "fg:green").unwrap();
/// assert_eq!(colors.get(Level::Info), Some("\x1b[38;5;2m"));
///
/// colors.clear(Level::Debug);
/// assert_eq!(colors.get(Level::Debug), None);
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LevelColors {
    sequences: [Option<String>; 8],
}

impl LevelColors {
    /// Default specifications, most severe first.
    pub const DEFAULT_SPECS: [(Level, &'static str); 8] = [
        (Level::Emergency, "bold/underline/fg:231/bg:196"),
        (Level::Alert, "bold/underline/fg:201"),
        (Level::Critical, "bold/underline/fg:196"),
        (Level::Error, "bold/fg:196"),
        (Level::Warning, "bold/fg:214"),
        (Level::Notice, "fg:37"),
        (Level::Info, "fg:39"),
        (Level::Debug, "fg:244"),
    ];

    /// A table with no colors at all.
    #[must_use]
    pub fn none() -> Self {
        Self {
            sequences: Default::default(),
        }
    }

    /// Sets the color for `level` from a `/`-separated specification such as
    /// `bold/fg:#ff8800`. On error the previous entry is kept.
    pub fn set(&mut self, level: Level, spec: &str) -> Result<(), ColorSpecError> {
        let sequence = compile(spec.split('/'))?;
        self.sequences[usize::from(level.value())] = Some(sequence);
        Ok(())
    }

    /// Removes the color for `level`.
    pub fn clear(&mut self, level: Level) {
        self.sequences[usize::from(level.value())] = None;
    }

    /// The SGR sequence for `level`, if any.
    #[must_use]
    pub fn get(&self, level: Level) -> Option<&str> {
        self.sequences[usize::from(level.value())].as_deref()
    }
}

impl Default for LevelColors {
    fn default() -> Self {
        let mut colors = Self::none();
        for (level, spec) in Self::DEFAULT_SPECS {
            if let Ok(sequence) = compile(spec.split('/')) {
                colors.sequences[usize::from(level.value())] = Some(sequence);
            }
        }
        colors
    }
}
