#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! crates/record/src/lib.rs
//!
//! # Overview
//!
//! `record` defines the in-memory shape of a log occurrence shared by every
//! weft encoder: the [`LogEvent`] with its [`Level`] and timestamp, the
//! frame-indexed [`LogRecord`] used for both the event and a linked error
//! chain, and the tagged [`Field`] values carried by those records.
//!
//! # Design
//!
//! - [`FieldValue`] is a closed sum type: one variant per [`Kind`], each
//!   carrying only its payload.
//! - [`LogRecord`] keeps messages and fields sorted by captured-frame index so
//!   encoders can align them with the stack trace in a single pass.
//! - Stack capture and error unwinding are traits ([`StackCapture`],
//!   [`ErrorUnwinder`]) injected by the router rather than global hooks.
//!
//! # Invariants
//!
//! - Frame indices of messages and fields never decrease in iteration order.
//! - When a stack trace is attached every index is below its length.
//! - System fields are always flagged as such.
//!
//! # Examples
//!
//! ```
//! use record::{Field, Level, LogEvent, NoCapture, TracedError};
//!
//! let mut event = LogEvent::new(Level::Warning);
//! event.set_message("retrying upload");
//! event.push_field(Field::u32("attempt", 2));
//!
//! let error = TracedError::with_capture("timed out", &NoCapture).wrap("upload failed");
//! event.link_error(error.into_record());
//!
//! assert_eq!(event.error().map(|e| e.messages().len()), Some(2));
//! ```

mod error;
mod event;
mod field;
mod frame;
mod level;
mod record;

pub use error::{
    ERROR_CLASS_ID_KEY, ERROR_CLASS_NAME_KEY, ERROR_ID_KEY, ErrorUnwinder, SourceChainUnwinder,
    TracedError,
};
pub use event::LogEvent;
pub use field::{Field, FieldValue, Kind, RESERVED_PREFIX, Scalar, VARY_SUFFIX};
#[cfg(feature = "backtrace")]
pub use frame::BacktraceCapture;
pub use frame::{NoCapture, StackCapture, StackFrame};
pub use level::{Level, ParseLevelError};
pub use record::{LogRecord, Message};

/// Default stack capture for the enabled feature set.
#[cfg(feature = "backtrace")]
pub type DefaultCapture = BacktraceCapture;

/// Default stack capture for the enabled feature set.
#[cfg(not(feature = "backtrace"))]
pub type DefaultCapture = NoCapture;
