#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `weft` turns in-memory log events into bytes for their destinations. An
//! event carries a level, a timestamp, a message record and optionally a
//! linked error chain with its own stack trace, per-frame messages and
//! per-frame fields. Two encoders consume it:
//!
//! - [`TemplateEncoder`]: a `{{verb/arg}}` template compiled once, with
//!   ANSI colors chosen per level or spelled out inline.
//! - [`StructuredEncoder`]: one JSON document per event.
//!
//! A [`Router`] fans events out to destination groups gated by level, and
//! recycles events through a pool.
//!
//! # Crates
//!
//! | module | crate |
//! |--------|-------|
//! | [`record`] | events, records, fields, stack frames, traced errors |
//! | [`encoding`] | the encoders |
//! | [`sink`] | destinations |
//! | [`logging`] | router, pool and configuration |
//!
//! The most used items are re-exported at the root.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//!
//! use weft::{Field, Level, MemorySink, Router, TemplateEncoder};
//!
//! let sink = Arc::new(MemorySink::new());
//! let router = Router::new();
//! router
//!     .register()
//!     .with_encoder(TemplateEncoder::new("[{{l/S}}] {{m}}{{f/b: /ak:=/av: }}\n"))
//!     .write_to([Arc::clone(&sink)])
//!     .build()
//!     .unwrap();
//!
//! let mut event = router.acquire(Level::Notice);
//! event.set_message("config reloaded");
//! event.push_field(Field::u32("rules", 14));
//! event.push_field(Field::str("source", "/etc/app.toml"));
//! event.dispatch();
//!
//! assert_eq!(sink.lines(), ["[NTC] config reloaded rules=14 source=/etc/app.toml"]);
//! ```

pub use encoding;
pub use logging;
pub use logging_sink as sink;
pub use record;

pub use encoding::{
    ColorSpecError, DEFAULT_TEMPLATE, Encoder, FieldLayout, LevelColors, StructuredEncoder,
    TemplateEncoder, TemplateEncoderBuilder,
};
#[cfg(feature = "serde")]
pub use logging::{ConfigError, RouterConfig};
pub use logging::{EventPool, PooledEvent, Registration, Router, RouterError};
#[cfg(feature = "tracing")]
pub use logging::{WeftLayer, init_tracing};
pub use logging_sink::{LineMode, LineSink, MemorySink, Sink};
pub use record::{
    ErrorUnwinder, Field, FieldValue, Level, LogEvent, LogRecord, NoCapture, StackCapture,
    StackFrame, TracedError,
};
