//! Integration tests for destination routing.
//!
//! These tests drive the router the way an application does: register
//! groups, acquire pooled events, dispatch and flush.

use std::fs::{self, OpenOptions};
use std::sync::Arc;

use encoding::{FieldLayout, StructuredEncoder, TemplateEncoder};
use logging::Router;
use logging_sink::{LineMode, LineSink, MemorySink};
use record::{Field, Level, NoCapture, StackCapture, StackFrame, TracedError};

struct TwoFrames;

impl StackCapture for TwoFrames {
    fn capture(&self, frames: &mut Vec<StackFrame>) {
        frames.push(StackFrame::new("shop::checkout::pay", "src/checkout.rs", 88));
        frames.push(StackFrame::new("shop::main", "src/main.rs", 12));
    }
}

// ============================================================================
// Level Gating
// ============================================================================

/// Structured group at Debug, template group at Warning.
#[test]
fn groups_receive_events_by_their_own_threshold() {
    let a = Arc::new(MemorySink::new());
    let b = Arc::new(MemorySink::new());
    let router = Router::new();
    router
        .register()
        .with_encoder(StructuredEncoder::new())
        .with_min_level(Level::Debug)
        .write_to([Arc::clone(&a)])
        .with_encoder(TemplateEncoder::new("{{l/SS}}: {{m}}\n"))
        .with_min_level(Level::Warning)
        .write_to([Arc::clone(&b)])
        .build()
        .unwrap();

    let mut info = router.acquire(Level::Info);
    info.set_message("listening");
    info.dispatch();

    assert_eq!(a.lines().len(), 1);
    assert!(b.contents().is_empty());

    let mut error = router.acquire(Level::Error);
    error.set_message("connection reset");
    error.dispatch();

    assert_eq!(a.lines().len(), 2);
    assert_eq!(b.lines(), ["ERROR: connection reset"]);

    let last: serde_json::Value = serde_json::from_str(&a.lines()[1]).unwrap();
    assert_eq!(last["level"], "error");
    assert_eq!(last["level_value"], 3);
    assert_eq!(last["message"], "connection reset");
}

/// A sink shared by two groups receives each group's rendering in
/// registration order.
#[test]
fn shared_sink_sees_groups_in_order() {
    let sink = Arc::new(MemorySink::new());
    let router = Router::new();
    router
        .register()
        .with_encoder(TemplateEncoder::new("first {{m}}\n"))
        .write_to([Arc::clone(&sink)])
        .with_encoder(TemplateEncoder::new("second {{m}}\n"))
        .write_to([Arc::clone(&sink)])
        .build()
        .unwrap();

    let mut event = router.acquire(Level::Notice);
    event.set_message("x");
    event.dispatch();

    assert_eq!(sink.lines(), ["first x", "second x"]);
}

// ============================================================================
// Linked Errors and Stack Traces
// ============================================================================

/// A forced capture aligns linked-error messages beneath their frames.
#[test]
fn linked_error_renders_beneath_forced_trace() {
    let sink = Arc::new(MemorySink::new());
    let router = Router::new().with_capture(TwoFrames);
    router
        .register()
        .with_encoder(TemplateEncoder::new("{{m}}\n{{s}}"))
        .with_min_stacktrace_level(Level::Error)
        .write_to([Arc::clone(&sink)])
        .build()
        .unwrap();

    let error = TracedError::with_capture("card declined", &NoCapture)
        .with_field(Field::str("gateway", "acme"))
        .wrap("payment failed");

    let mut event = router.acquire(Level::Error);
    event.set_message("checkout aborted");
    event.attach_error(&error);
    event.dispatch();

    assert_eq!(
        sink.contents_lossy(),
        "checkout aborted\n\
         shop::checkout::pay (src/checkout.rs:88)\n\
         \tcard declined\n\
         \tgateway=acme\n\
         shop::main (src/main.rs:12)\n\
         \tpayment failed"
    );
}

/// Structured output promotes the traced error's identifiers.
#[test]
fn structured_output_carries_error_metadata() {
    let sink = Arc::new(MemorySink::new());
    let router = Router::new();
    router
        .register()
        .with_encoder(StructuredEncoder::new().with_layout(FieldLayout::Flattened))
        .write_to([Arc::clone(&sink)])
        .build()
        .unwrap();

    let error = TracedError::with_capture("quota exceeded", &NoCapture).with_class(42, "Quota");
    let id = error.id();

    let mut event = router.acquire(Level::Critical);
    event.set_message("upload rejected");
    event.push_field(Field::u64("bytes", 1 << 20));
    event.attach_error(&error);
    event.dispatch();

    let document: serde_json::Value = serde_json::from_slice(&sink.contents()).unwrap();
    assert_eq!(document["error_id"], id);
    assert_eq!(document["error_class_id"], 42);
    assert_eq!(document["error_class_name"], "Quota");
    assert_eq!(document["fields"]["0.bytes"], 1 << 20);
}

// ============================================================================
// File Destinations
// ============================================================================

/// Events written through a line sink land whole in an append-mode file.
#[test]
fn file_destination_receives_whole_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("service.log");
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .unwrap();

    let router = Arc::new(Router::new());
    router
        .register()
        .with_encoder(TemplateEncoder::new("{{l/s}} {{m}}"))
        .write_to([LineSink::new(file, LineMode::WithNewline)])
        .build()
        .unwrap();

    let handles: Vec<_> = (0..3)
        .map(|worker| {
            let router = Arc::clone(&router);
            std::thread::spawn(move || {
                for step in 0..20 {
                    let mut event = router.acquire(Level::Info);
                    event.set_message(format!("worker {worker} step {step}"));
                    event.dispatch();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    router.flush().unwrap();

    let contents = fs::read_to_string(&path).unwrap();
    let lines: Vec<_> = contents.lines().collect();
    assert_eq!(lines.len(), 60);
    assert!(lines.iter().all(|line| line.starts_with("Inf worker ")));
}
