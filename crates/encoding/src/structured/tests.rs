use super::*;
use record::{Level, LogRecord, NoCapture, TracedError};
use serde_json::{Value, json};
use time::macros::datetime;

fn decode(bytes: &[u8]) -> Value {
    assert_eq!(bytes.last(), Some(&b'\n'));
    serde_json::from_slice(bytes).unwrap()
}

fn event(level: Level, message: &'static str) -> LogEvent {
    let mut event = LogEvent::at(level, datetime!(2024-03-05 07:08:09 UTC));
    event.set_message(message);
    event
}

fn traced_record() -> LogRecord {
    let mut record = LogRecord::new();
    record.set_stack_trace(vec![
        StackFrame::new("app::io::write", "src/io.rs", 40),
        StackFrame::new("app::flush", "src/lib.rs", 12),
        StackFrame::new("app::main", "src/main.rs", 3),
    ]);
    record.push_message("disk full");
    record.push_field(Field::str("path", "/var/db"));
    record.move_cursor(2);
    record.push_message("shutdown failed");
    record
}

#[test]
fn top_level_schema() {
    let mut event = event(Level::Error, "disk full");
    event.push_field(Field::str("mount", "/var"));
    event.push_field(Field::u64("free", 0));

    let value = decode(&StructuredEncoder::new().encode(&event));
    assert_eq!(
        value,
        json!({
            "level": "error",
            "level_value": 3,
            "time": "2024-03-05T07:08:09Z",
            "message": "disk full",
            "fields": [
                {"key": "mount", "value": "/var"},
                {"key": "free", "value": 0},
            ],
        })
    );
}

#[test]
fn empty_fields_and_stacktrace_are_omitted() {
    let value = decode(&StructuredEncoder::new().encode(&event(Level::Info, "idle")));
    assert!(value.get("fields").is_none());
    assert!(value.get("stacktrace").is_none());
    assert!(value.get("error").is_none());
}

#[test]
fn flattened_layout_prefixes_frame() {
    let mut event = event(Level::Info, "x");
    event.push_field(Field::bool("cached", true));
    event.push_field(Field::u8("", 7));

    let encoder = StructuredEncoder::new().with_layout(FieldLayout::Flattened);
    let value = decode(&encoder.encode(&event));
    assert_eq!(value["fields"], json!({"0.cached": true, "0._1": 7}));
}

#[test]
fn promoted_error_metadata() {
    let mut event = event(Level::Error, "query failed");
    let error = TracedError::with_capture("connection reset", &NoCapture).with_class(7, "db");
    let id = error.id();
    event.link_error(error.into_record());

    let value = decode(&StructuredEncoder::new().encode(&event));
    assert_eq!(value["error_id"], id);
    assert_eq!(value["error_class_id"], 7);
    assert_eq!(value["error_class_name"], "db");
    assert_eq!(value["error"], "connection reset");
    assert!(value.get("fields").is_none());
}

#[test]
fn stack_frames_carry_aligned_error_entries() {
    let mut event = event(Level::Critical, "shutdown");
    event.link_error(traced_record());

    let value = decode(&StructuredEncoder::new().encode(&event));
    assert_eq!(
        value["stacktrace"],
        json!([
            {
                "func": "app::io::write",
                "file": "src/io.rs:40",
                "package": "app::io",
                "message": "disk full",
                "fields": [{"key": "path", "value": "/var/db"}],
            },
            {"func": "app::flush", "file": "src/lib.rs:12", "package": "app"},
            {
                "func": "app::main",
                "file": "src/main.rs:3",
                "package": "app",
                "message": "shutdown failed",
            },
        ])
    );
    assert_eq!(value["error"], "shutdown failed: disk full");
}

#[test]
fn composite_values_are_embedded() {
    let mut event = event(Level::Debug, "payload");
    event.push_field(Field::any("tags", &["a", "b"]));
    event.push_field(Field::complex128("z", 1.0, -2.0));

    let value = decode(&StructuredEncoder::new().encode(&event));
    assert_eq!(value["fields"][0]["value"], json!(["a", "b"]));
    assert_eq!(value["fields"][1]["value"], "(1-2i)");
}

#[test]
fn vary_fields_follow_allow_empty() {
    let mut event = event(Level::Info, "x");
    event.push_field(Field::str("note?", ""));

    let value = decode(&StructuredEncoder::new().encode(&event));
    assert!(value.get("fields").is_none());

    let value = decode(&StructuredEncoder::new().allow_empty(true).encode(&event));
    assert_eq!(value["fields"], json!([{"key": "note", "value": ""}]));
}

#[test]
fn round_trip_preserves_level_and_message() {
    for level in Level::ALL {
        let value = decode(&StructuredEncoder::new().encode(&event(level, "hello \"quoted\"")));
        assert_eq!(value["level"].as_str().unwrap().parse::<Level>().unwrap(), level);
        assert_eq!(value["message"], "hello \"quoted\"");
    }
}
