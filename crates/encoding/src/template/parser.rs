//! Compiler for `{{verb/arg/...}}` templates.
//!
//! Compilation never fails. Anything that does not form a valid verb is kept
//! as literal text, so a template with typos still renders the parts it got
//! right.

use super::DEFAULT_TEMPLATE;
use super::color;
use super::timestamp::TimeFormat;
use super::tokens::{Decorations, FrameFormat, LevelFormat, Opcode, Program};
use crate::diagnostics::{trace_compiled, trace_degraded_verb};

const OPEN: &str = "{{";
const CLOSE: &str = "}}";
const ESCAPED_OPEN: &str = "\\{{";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum VerbKind {
    Caller,
    Color,
    Level,
    Time,
    Body,
    Fields,
    StackTrace,
}

impl VerbKind {
    const fn single_use_slot(self) -> Option<usize> {
        match self {
            Self::Body => Some(0),
            Self::Fields => Some(1),
            Self::StackTrace => Some(2),
            Self::Caller => Some(3),
            Self::Color | Self::Level | Self::Time => None,
        }
    }
}

const ALIASES: [(&str, VerbKind); 18] = [
    ("caller", VerbKind::Caller),
    ("who", VerbKind::Caller),
    ("w", VerbKind::Caller),
    ("color", VerbKind::Color),
    ("c", VerbKind::Color),
    ("level", VerbKind::Level),
    ("lvl", VerbKind::Level),
    ("l", VerbKind::Level),
    ("time", VerbKind::Time),
    ("t", VerbKind::Time),
    ("message", VerbKind::Body),
    ("body", VerbKind::Body),
    ("m", VerbKind::Body),
    ("b", VerbKind::Body),
    ("fields", VerbKind::Fields),
    ("f", VerbKind::Fields),
    ("stacktrace", VerbKind::StackTrace),
    ("s", VerbKind::StackTrace),
];

/// Compiles `template` into a [`Program`]. Blank templates compile the
/// default layout.
pub(super) fn compile(template: &str) -> Program {
    let source = if template.trim().is_empty() {
        DEFAULT_TEMPLATE
    } else {
        template
    };

    let mut compiler = Compiler::default();
    let mut literal = String::new();
    let mut index = 0;

    while index < source.len() {
        let rest = &source[index..];
        if rest.starts_with(ESCAPED_OPEN) {
            literal.push_str(OPEN);
            index += ESCAPED_OPEN.len();
            continue;
        }
        if rest.starts_with(OPEN) {
            let body_start = index + OPEN.len();
            let close = source[body_start..]
                .find(CLOSE)
                .map(|offset| body_start + offset);
            let nested = find_unescaped_open(source, body_start);
            match close {
                Some(close) if nested.is_none_or(|open| close < open) => {
                    let raw = &source[index..close + CLOSE.len()];
                    let body = &source[body_start..close];
                    match compiler.verb(body, raw) {
                        Some(opcode) => {
                            flush_literal(&mut compiler.opcodes, &mut literal);
                            compiler.opcodes.push(opcode);
                        }
                        None => literal.push_str(raw),
                    }
                    index = close + CLOSE.len();
                }
                _ => {
                    trace_degraded_verb(OPEN, "unterminated");
                    literal.push_str(OPEN);
                    index = body_start;
                }
            }
            continue;
        }
        let Some(ch) = rest.chars().next() else {
            break;
        };
        literal.push(ch);
        index += ch.len_utf8();
    }
    flush_literal(&mut compiler.opcodes, &mut literal);

    let opcodes = merge_literals(compiler.opcodes);
    let program = Program::new(opcodes, compiler.frame_format.unwrap_or_default());
    trace_compiled(program.len(), program.predicted_len());
    program
}

#[derive(Default)]
struct Compiler {
    opcodes: Vec<Opcode>,
    seen: [bool; 4],
    frame_format: Option<FrameFormat>,
}

impl Compiler {
    /// Compiles one verb body. `None` means the verb degrades to `raw`.
    fn verb(&mut self, body: &str, raw: &str) -> Option<Opcode> {
        let Some((kind, alias)) = match_alias(body) else {
            trace_degraded_verb(raw, "unknown_alias");
            return None;
        };
        let arguments = body[alias.len()..].strip_prefix('/');

        if let Some(slot) = kind.single_use_slot() {
            if self.seen[slot] {
                trace_degraded_verb(raw, "repeated_verb");
                return None;
            }
        }

        let opcode = match kind {
            VerbKind::Level => level_opcode(arguments),
            VerbKind::Time => Some(Opcode::Time(TimeFormat::from_argument(
                arguments.map(unescape).as_deref(),
            ))),
            VerbKind::Color => color_opcode(arguments),
            VerbKind::Body => Some(Opcode::Body(parse_directives(arguments, kind).0)),
            VerbKind::Fields => Some(Opcode::Fields(parse_directives(arguments, kind).0)),
            VerbKind::StackTrace => {
                Some(Opcode::StackTrace(parse_directives(arguments, kind).0))
            }
            VerbKind::Caller => {
                let (decorations, format) = parse_directives(arguments, kind);
                self.frame_format = Some(format.unwrap_or_default());
                Some(Opcode::Caller(decorations))
            }
        };

        match (&opcode, kind.single_use_slot()) {
            (None, _) => trace_degraded_verb(raw, "bad_arguments"),
            (Some(_), Some(slot)) => self.seen[slot] = true,
            (Some(_), None) => {}
        }
        opcode
    }
}

/// Longest alias that prefixes `body` and is followed by `/` or the end.
fn match_alias(body: &str) -> Option<(VerbKind, &'static str)> {
    ALIASES
        .iter()
        .filter(|(alias, _)| {
            body.strip_prefix(alias)
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
        })
        .max_by_key(|(alias, _)| alias.len())
        .map(|&(alias, kind)| (kind, alias))
}

fn level_opcode(arguments: Option<&str>) -> Option<Opcode> {
    match arguments {
        None => Some(Opcode::Level(LevelFormat::Full)),
        Some(tag) => LevelFormat::from_tag(tag).map(Opcode::Level),
    }
}

fn color_opcode(arguments: Option<&str>) -> Option<Opcode> {
    let Some(arguments) = arguments else {
        return Some(Opcode::LevelColor);
    };
    let tokens = split_arguments(arguments);
    color::compile(tokens.iter().map(String::as_str))
        .ok()
        .map(Opcode::Color)
}

/// Parses `name:value` directives, stopping at the first one not recognized
/// for `kind`. Returns the caller frame layout when one was given.
fn parse_directives(
    arguments: Option<&str>,
    kind: VerbKind,
) -> (Decorations, Option<FrameFormat>) {
    let mut decorations = Decorations::default();
    let mut format = None;
    let Some(arguments) = arguments else {
        return (decorations, format);
    };

    for argument in split_arguments(arguments) {
        let (name, value) = match argument.split_once(':') {
            Some((name, value)) => (name, Some(value)),
            None => (argument.as_str(), None),
        };
        let applied = match (name, value) {
            ("b" | "before", Some(value)) => {
                decorations.before = value.to_owned();
                true
            }
            ("a" | "after", Some(value)) => {
                decorations.after = value.to_owned();
                true
            }
            ("bk" | "beforekey", Some(value)) => {
                decorations.before_key = value.to_owned();
                true
            }
            ("ak" | "afterkey", Some(value)) => {
                decorations.after_key = value.to_owned();
                true
            }
            ("av" | "aftervalue", Some(value)) => {
                decorations.after_value = value.to_owned();
                true
            }
            ("nl" | "newline", Some(value)) => {
                decorations.line_break = Some(value.to_owned());
                true
            }
            ("enl" | "errornewline", Some(value)) => {
                decorations.error_line_break = Some(value.to_owned());
                true
            }
            ("n" | "perline", Some(value)) => value
                .parse()
                .map(|count| decorations.per_line = count)
                .is_ok(),
            ("x" | "hide", None) if kind == VerbKind::Caller => {
                decorations.suppressed = true;
                true
            }
            ("fmt" | "format", Some(value)) if kind == VerbKind::Caller => {
                format = Some(FrameFormat::parse(value));
                true
            }
            _ => false,
        };
        if !applied {
            break;
        }
    }
    (decorations, format)
}

/// Splits on unescaped `/` and resolves `\/`, `\n`, `\t` and `\\`.
fn split_arguments(arguments: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut chars = arguments.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '/' => parts.push(std::mem::take(&mut current)),
            '\\' => match chars.next() {
                Some(next) => push_escape(&mut current, next),
                None => current.push('\\'),
            },
            other => current.push(other),
        }
    }
    parts.push(current);
    parts
}

/// Resolves escapes without splitting; used for time patterns, which may
/// contain `/`.
fn unescape(argument: &str) -> String {
    let mut out = String::with_capacity(argument.len());
    let mut chars = argument.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => match chars.next() {
                Some(next) => push_escape(&mut out, next),
                None => out.push('\\'),
            },
            other => out.push(other),
        }
    }
    out
}

fn push_escape(out: &mut String, escaped: char) {
    match escaped {
        'n' => out.push('\n'),
        't' => out.push('\t'),
        '/' => out.push('/'),
        '\\' => out.push('\\'),
        other => {
            out.push('\\');
            out.push(other);
        }
    }
}

fn find_unescaped_open(source: &str, from: usize) -> Option<usize> {
    let mut search = from;
    while let Some(offset) = source[search..].find(OPEN) {
        let position = search + offset;
        if position == 0 || source.as_bytes()[position - 1] != b'\\' {
            return Some(position);
        }
        search = position + 1;
    }
    None
}

fn flush_literal(opcodes: &mut Vec<Opcode>, literal: &mut String) {
    if !literal.is_empty() {
        opcodes.push(Opcode::Literal(std::mem::take(literal)));
    }
}

/// Folds runs of adjacent literals into one. Idempotent.
pub(super) fn merge_literals(opcodes: Vec<Opcode>) -> Vec<Opcode> {
    let mut merged: Vec<Opcode> = Vec::with_capacity(opcodes.len());
    for opcode in opcodes {
        match (merged.last_mut(), opcode) {
            (Some(Opcode::Literal(previous)), Opcode::Literal(text)) => previous.push_str(&text),
            (_, Opcode::Literal(text)) if text.is_empty() => {}
            (_, opcode) => merged.push(opcode),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opcodes(template: &str) -> Vec<Opcode> {
        compile(template).opcodes().cloned().collect()
    }

    fn literal(text: &str) -> Opcode {
        Opcode::Literal(text.to_owned())
    }

    #[test]
    fn plain_text_is_one_literal() {
        assert_eq!(opcodes("hello world"), [literal("hello world")]);
    }

    #[test]
    fn escaped_open_is_literal() {
        assert_eq!(opcodes("a \\{{m}} b"), [literal("a {{m}} b")]);
    }

    #[test]
    fn unknown_alias_degrades() {
        assert_eq!(opcodes("x {{nope}} y"), [literal("x {{nope}} y")]);
    }

    #[test]
    fn unterminated_verb_degrades() {
        assert_eq!(opcodes("a {{m"), [literal("a {{m")]);
    }

    #[test]
    fn nested_open_degrades_outer_only() {
        assert_eq!(
            opcodes("{{x {{l/d}}"),
            [literal("{{x "), Opcode::Level(LevelFormat::Numeric)]
        );
    }

    #[test]
    fn longest_alias_wins() {
        assert_eq!(opcodes("{{lvl}}"), [Opcode::Level(LevelFormat::Full)]);
        assert_eq!(opcodes("{{level/S}}"), [Opcode::Level(LevelFormat::ShortUpper)]);
        assert_eq!(opcodes("{{lv}}"), [literal("{{lv}}")]);
        assert_eq!(opcodes("{{ms}}"), [literal("{{ms}}")]);
    }

    #[test]
    fn unknown_level_tag_degrades() {
        assert_eq!(opcodes("{{l/q}}"), [literal("{{l/q}}")]);
    }

    #[test]
    fn single_use_verbs_repeat_as_literal() {
        assert_eq!(
            opcodes("{{m}}|{{m}}"),
            [Opcode::Body(Decorations::default()), literal("|{{m}}")]
        );
    }

    #[test]
    fn color_verb_is_all_or_nothing() {
        assert_eq!(
            opcodes("{{c/bold/fg:#ff0000}}"),
            [Opcode::Color("\x1b[1;38;5;196m".to_owned())]
        );
        assert_eq!(
            opcodes("{{c/Bold/fg:Nope}}"),
            [literal("{{c/Bold/fg:Nope}}")]
        );
        assert_eq!(opcodes("{{c}}"), [Opcode::LevelColor]);
    }

    #[test]
    fn directives_stop_at_first_unknown() {
        let compiled = opcodes("{{f/ak:=/zz:1/av:,}}");
        let [Opcode::Fields(decorations)] = compiled.as_slice() else {
            panic!("expected one fields opcode");
        };
        assert_eq!(decorations.after_key, "=");
        assert_eq!(decorations.after_value, "");
    }

    #[test]
    fn directive_escapes() {
        let compiled = opcodes("{{m/b:\\/\\//a:\\n}}");
        let [Opcode::Body(decorations)] = compiled.as_slice() else {
            panic!("expected one body opcode");
        };
        assert_eq!(decorations.before, "//");
        assert_eq!(decorations.after, "\n");
    }

    #[test]
    fn caller_flags_only_apply_to_caller() {
        let compiled = opcodes("{{w/x}}");
        let [Opcode::Caller(decorations)] = compiled.as_slice() else {
            panic!("expected one caller opcode");
        };
        assert!(decorations.suppressed);

        let compiled = opcodes("{{m/x/a:!}}");
        let [Opcode::Body(decorations)] = compiled.as_slice() else {
            panic!("expected one body opcode");
        };
        assert!(!decorations.suppressed);
        assert_eq!(decorations.after, "");
    }

    #[test]
    fn caller_format_is_shared() {
        let program = compile("{{s}}{{w/fmt:f@l}}");
        assert_eq!(*program.frame_format(), FrameFormat::parse("f@l"));
        let program = compile("{{s}}");
        assert_eq!(*program.frame_format(), FrameFormat::default());
    }

    #[test]
    fn fields_directives_are_kept_for_stack_traces() {
        let program = compile("{{s}}{{f/ak: = /enl:\\n\\t\\t}}");
        let layout = program.field_layout().unwrap();
        assert_eq!(layout.after_key, " = ");
        assert_eq!(layout.error_line_break(), "\n\t\t");
        assert!(compile("{{s}}").field_layout().is_none());
    }

    #[test]
    fn time_argument_keeps_slashes() {
        assert_eq!(
            opcodes("{{t/[day]/[month]}}"),
            [Opcode::Time(TimeFormat::from_argument(Some("[day]/[month]")))]
        );
    }

    #[test]
    fn blank_template_uses_default() {
        assert_eq!(opcodes("  "), opcodes(DEFAULT_TEMPLATE));
    }

    #[test]
    fn merge_is_idempotent() {
        let once = merge_literals(vec![literal("a"), literal(""), literal("b"), Opcode::LevelColor]);
        assert_eq!(once, [literal("ab"), Opcode::LevelColor]);
        assert_eq!(merge_literals(once.clone()), once);
    }

    #[test]
    fn predicted_length_covers_literals() {
        let program = compile("0123456789{{l}}");
        assert!(program.predicted_len() >= 10 + 9);
    }
}
