#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! crates/encoding/src/lib.rs
//!
//! # Overview
//!
//! `encoding` turns a [`record::LogEvent`] into the bytes written to a
//! destination. Two encoders are provided:
//!
//! - [`TemplateEncoder`] compiles a `{{verb/arg/...}}` template once into an
//!   immutable [`Program`] and interprets it per event, including ANSI colors
//!   selected by level or spelled out in the template.
//! - [`StructuredEncoder`] writes a fixed JSON document per event.
//!
//! # Design
//!
//! Both encoders implement [`Encoder`], the only seam the router depends on.
//! Rendering never fails: malformed template verbs degrade to literal text at
//! compile time and values that cannot be serialized are dropped.
//!
//! # Examples
//!
//! ```
//! use encoding::{Encoder, TemplateEncoder};
//! use record::{Level, LogEvent};
//!
//! let encoder = TemplateEncoder::new("{{l/d}} {{m}}");
//! let mut event = LogEvent::new(Level::Error);
//! event.set_message("disk full");
//!
//! assert_eq!(encoder.encode(&event), b"3 disk full");
//! ```

mod buffer;
mod diagnostics;
mod structured;
mod template;
mod view;

pub use structured::{FieldLayout, StructuredEncoder};
pub use template::{
    ColorSpecError, DEFAULT_TEMPLATE, LevelColors, Program, TemplateEncoder,
    TemplateEncoderBuilder,
};

use record::LogEvent;

/// Converts a log event into bytes for one destination group.
///
/// Implementations are shared across threads by the router and must not keep
/// per-call state.
pub trait Encoder: Send + Sync {
    /// Renders `event` into a freshly allocated buffer.
    fn encode(&self, event: &LogEvent) -> Vec<u8>;
}

impl<E: Encoder + ?Sized> Encoder for Box<E> {
    fn encode(&self, event: &LogEvent) -> Vec<u8> {
        (**self).encode(event)
    }
}

impl<E: Encoder + ?Sized> Encoder for std::sync::Arc<E> {
    fn encode(&self, event: &LogEvent) -> Vec<u8> {
        (**self).encode(event)
    }
}
