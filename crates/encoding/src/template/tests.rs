use super::parser::{compile, merge_literals};
use super::tokens::Opcode;
use super::*;
use proptest::prelude::*;
use record::{Field, LogRecord, NoCapture, StackFrame, TracedError};
use time::macros::datetime;

fn event(level: Level, message: &'static str) -> LogEvent {
    let mut event = LogEvent::at(level, datetime!(2024-03-05 07:08:09 UTC));
    event.set_message(message);
    event
}

fn render(template: &str, event: &LogEvent) -> String {
    String::from_utf8(TemplateEncoder::new(template).encode(event)).unwrap()
}

fn frames() -> Vec<StackFrame> {
    vec![
        StackFrame::new("app::io::write", "src/io.rs", 40),
        StackFrame::new("app::flush", "src/lib.rs", 12),
        StackFrame::new("app::main", "src/main.rs", 3),
    ]
}

#[test]
fn numeric_level_and_body() {
    assert_eq!(render("{{l/d}} {{m}}", &event(Level::Error, "disk full")), "3 disk full");
}

#[test]
fn level_forms() {
    let event = event(Level::Warning, "");
    assert_eq!(
        render("{{l}}|{{l/ss}}|{{l/SS}}|{{l/s}}|{{l/S}}", &event),
        "Warning|Warning|WARNING|Wrn|WRN"
    );
}

#[test]
fn custom_color_sequence() {
    assert_eq!(
        render("{{c/bold/fg:#ff0000}}", &event(Level::Info, "")),
        "\x1b[1;38;5;196m"
    );
}

#[test]
fn degraded_color_keeps_original_case() {
    assert_eq!(
        render("{{c/Bold/fg:Mauve}}x", &event(Level::Info, "")),
        "{{c/Bold/fg:Mauve}}x"
    );
}

#[test]
fn level_color_table() {
    let event = event(Level::Info, "");
    assert_eq!(
        render("{{c}}{{l}}{{c/reset}}", &event),
        "\x1b[38;5;39mInfo\x1b[0m"
    );

    let encoder = TemplateEncoder::builder("{{c}}{{l}}")
        .without_level_color(Level::Info)
        .build();
    assert_eq!(encoder.encode(&event), b"Info");

    let encoder = TemplateEncoder::builder("{{c}}{{l}}")
        .level_color(Level::Info, "underline")
        .unwrap()
        .build();
    assert_eq!(encoder.encode(&event), b"\x1b[4mInfo");
}

#[test]
fn level_color_rejects_bad_spec() {
    let error = TemplateEncoder::builder("{{c}}")
        .level_color(Level::Error, "fg:nope")
        .unwrap_err();
    assert_eq!(error.token(), "fg:nope");
}

#[test]
fn empty_body_renders_nothing() {
    assert_eq!(render("[{{m/b:</a:>}}]", &event(Level::Info, "")), "[]");
    assert_eq!(render("[{{m/b:</a:>}}]", &event(Level::Info, "hi")), "[<hi>]");
}

#[test]
fn time_presets() {
    let event = event(Level::Info, "");
    assert_eq!(render("{{t}}", &event), "2024-03-05 07:08:09.000");
    assert_eq!(render("{{t/rfc3339}}", &event), "2024-03-05T07:08:09Z");
}

#[test]
fn fields_with_separators_and_unnamed_labels() {
    let mut event = event(Level::Info, "");
    event.push_field(Field::i32("a", 1));
    event.push_field(Field::str("b", "x"));
    event.push_field(Field::u8("", 2));

    assert_eq!(render("{{f/ak:=/av:, }}", &event), "a=1, b=x, _2=2");
    assert_eq!(
        render("{{f/ak:=/av:, /n:2/nl:\\n  }}", &event),
        "a=1, b=x,\n  _2=2"
    );
    assert_eq!(
        render("{{f/b:{/bk:'/ak:':/av:;/a:}}}", &event),
        "{'a':1;'b':x;'_2':2}"
    );
}

#[test]
fn composite_field_values_embed_json() {
    let mut event = event(Level::Info, "");
    event.push_field(Field::any("tags", &["a", "b"]));
    assert_eq!(render("{{f/ak:=}}", &event), r#"tags=["a","b"]"#);
}

#[test]
fn vary_fields_respect_allow_empty() {
    let mut event = event(Level::Info, "");
    event.push_field(Field::u32("retries?", 0));
    assert_eq!(render("{{f/ak:=}}", &event), "");

    let encoder = TemplateEncoder::builder("{{f/ak:=}}")
        .allow_empty(true)
        .build();
    assert_eq!(encoder.encode(&event), b"retries=0");
}

#[test]
fn system_fields_render_before_own_fields() {
    let mut event = event(Level::Error, "");
    event.push_field(Field::str("op", "read"));
    let error = TracedError::with_capture("eof", &NoCapture);
    let id = error.id();
    event.link_error(error.into_record());

    assert_eq!(
        render("{{f/ak:=/av: }}", &event),
        format!("error_id={id} op=read")
    );
}

#[test]
fn stack_trace_aligns_error_messages_with_frames() {
    let mut error = LogRecord::new();
    error.set_stack_trace(frames());
    error.push_message("disk full");
    error.push_field(Field::str("path", "/var/db"));
    error.move_cursor(2);
    error.push_message("shutdown failed");

    let mut event = event(Level::Critical, "shutdown");
    event.link_error(error);

    assert_eq!(
        render("{{s}}", &event),
        "app::io::write (src/io.rs:40)\n\tdisk full\n\tpath=/var/db\n\
         app::flush (src/lib.rs:12)\n\
         app::main (src/main.rs:3)\n\tshutdown failed"
    );
}

fn event_with_frame_fields(message: &'static str) -> LogEvent {
    let mut error = LogRecord::new();
    error.set_stack_trace(frames());
    error.push_message("disk full");
    error.push_field(Field::str("path", "/var/db"));
    error.push_field(Field::u64("bytes", 512));

    let mut event = event(Level::Warning, message);
    event.link_error(error);
    event
}

#[test]
fn error_fields_follow_the_fields_verb_layout() {
    let event = event_with_frame_fields("");

    assert_eq!(
        render("{{s}}{{f/ak: = /av:, /enl:\\n\\t\\t}}", &event),
        "app::io::write (src/io.rs:40)\n\tdisk full\n\t\tpath = /var/db, bytes = 512\n\
         app::flush (src/lib.rs:12)\n\
         app::main (src/main.rs:3)"
    );
    assert_eq!(
        render("{{s}}{{f/bk:-/ak:=/av:, /n:1/enl:\\n\\t\\t}}", &event),
        "app::io::write (src/io.rs:40)\n\tdisk full\n\t\t-path=/var/db,\n\t\t-bytes=512\n\
         app::flush (src/lib.rs:12)\n\
         app::main (src/main.rs:3)"
    );
}

#[test]
fn default_template_indents_error_fields_beneath_frames() {
    let encoder = TemplateEncoder::builder("")
        .level_colors(LevelColors::none())
        .build();
    let event = event_with_frame_fields("write failed");

    assert_eq!(
        String::from_utf8(encoder.encode(&event)).unwrap(),
        "WRN 2024-03-05 07:08:09.000\x1b[0m write failed\n\
         app::io::write (src/io.rs:40)\n\
         \tdisk full\n\
         \t\tpath = /var/db, bytes = 512,\n\
         app::flush (src/lib.rs:12),\n\
         app::main (src/main.rs:3)\n"
    );
}

#[test]
fn stack_trace_decorations() {
    let mut event = event(Level::Error, "");
    event.message_mut().set_stack_trace(frames());
    assert_eq!(
        render("{{s/b:[/a:]/av:;/nl: }}{{w/x/fmt:f}}", &event),
        "[write; flush; main]"
    );
}

#[test]
fn untraced_error_borrows_outer_message() {
    let mut event = event(Level::Error, "request failed");
    let error = TracedError::with_capture("socket closed", &NoCapture).wrap("");
    event.link_error(error.into_record());

    assert_eq!(render("{{s}}", &event), "socket closed\n\trequest failed");
    assert_eq!(event.error().unwrap().messages()[1].body(), "");
}

#[test]
fn caller_verb() {
    let mut event = event(Level::Error, "");
    assert_eq!(render("<{{w}}>", &event), "<>");

    event.message_mut().set_stack_trace(frames());
    assert_eq!(render("{{w/fmt:f@n:l}}", &event), "write@io.rs:40");
    assert_eq!(
        render("{{who/b:(/a:)}}", &event),
        "(app::io::write (src/io.rs:40))"
    );
    assert_eq!(render("{{caller/x}}", &event), "");
    assert_eq!(render("{{w/fmt:p}}", &event), "app::io");
}

#[test]
fn default_template() {
    let mut event = event(Level::Warning, "disk low");
    event.push_field(Field::u64("free", 3));
    assert_eq!(
        String::from_utf8(TemplateEncoder::default().encode(&event)).unwrap(),
        "\x1b[1;38;5;214mWRN 2024-03-05 07:08:09.000\x1b[0m disk low\nfree = 3\n"
    );
}

#[test]
fn output_exceeding_prediction_is_not_truncated() {
    let long = "x".repeat(10_000);
    let mut event = LogEvent::at(Level::Info, datetime!(2024-03-05 07:08:09 UTC));
    event.set_message(long.clone());
    let encoder = TemplateEncoder::new("{{m}}");
    assert!(encoder.program().predicted_len() < long.len());
    assert_eq!(encoder.encode(&event), long.as_bytes());
}

fn verb_piece() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![
        "{{l}}",
        "{{l/d}}",
        "{{t}}",
        "{{t/unix}}",
        "{{c}}",
        "{{c/reset}}",
        "{{c/bold/fg:#00ff00}}",
        "{{m/a: }}",
        "{{f/ak:=/av:,}}",
        "{{s}}",
        "{{w}}",
        "{{nope}}",
        "{{l/q}}",
        "\\{{m}}",
        " -- ",
        "{{",
        "}}",
    ])
}

proptest! {
    #[test]
    fn templates_without_verbs_render_themselves(
        template in "[a-zA-Z0-9 ,.:;!?()<>=+*#@$%&|~'/}-]{1,64}"
    ) {
        prop_assume!(!template.trim().is_empty());
        prop_assert_eq!(render(&template, &event(Level::Info, "ignored")), template);
    }

    #[test]
    fn rendering_is_deterministic(pieces in prop::collection::vec(verb_piece(), 1..12)) {
        let template = pieces.concat();
        let mut event = event(Level::Notice, "hello");
        event.push_field(Field::str("k", "v"));
        event.message_mut().set_stack_trace(frames());

        let encoder = TemplateEncoder::new(&template);
        prop_assert_eq!(encoder.encode(&event), encoder.encode(&event));
        let recompiled: Vec<Opcode> = compile(&template).opcodes().cloned().collect();
        let original: Vec<Opcode> = encoder.program().opcodes().cloned().collect();
        prop_assert_eq!(recompiled, original);
    }

    #[test]
    fn literal_merge_is_idempotent(
        parts in prop::collection::vec(prop::option::of("[a-z]{0,3}"), 0..16)
    ) {
        let opcodes: Vec<Opcode> = parts
            .into_iter()
            .map(|part| part.map_or(Opcode::LevelColor, Opcode::Literal))
            .collect();
        let once = merge_literals(opcodes);
        let twice = merge_literals(once.clone());
        prop_assert_eq!(&once, &twice);
        for pair in once.windows(2) {
            let both_literal =
                matches!(pair, [Opcode::Literal(_), Opcode::Literal(_)]);
            prop_assert!(!both_literal);
        }
    }

    #[test]
    fn zero_vary_fields_never_render(key in "[a-z]{3,8}", value in 0u64..4) {
        let mut event = event(Level::Info, "");
        event.push_field(Field::u64(format!("{key}?"), value));
        let rendered = render("{{f/ak:=}}", &event);
        if value == 0 {
            prop_assert_eq!(rendered, "");
        } else {
            prop_assert_eq!(rendered, format!("{key}={value}"));
        }
    }

    #[test]
    fn literal_only_programs_keep_text(text in "[a-z ]{1,16}") {
        prop_assume!(!text.trim().is_empty());
        prop_assert_eq!(compile(&text).literal_text(), Some(text));
    }
}
