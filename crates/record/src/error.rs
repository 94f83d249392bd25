//! crates/record/src/error.rs
//! Linked error chains: errors that carry their own captured record.
//!
//! A [`TracedError`] owns a [`LogRecord`] holding the stack captured when the
//! error was created together with the messages and fields added while it
//! travelled outwards. Arbitrary [`std::error::Error`] values are turned into
//! linked records through an [`ErrorUnwinder`] that the router receives at
//! construction time.

use std::borrow::Cow;
use std::error::Error;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::field::Field;
use crate::frame::StackCapture;
use crate::record::LogRecord;

/// System field carrying the process-unique error identifier.
pub const ERROR_ID_KEY: &str = "error_id";
/// System field carrying the numeric error class.
pub const ERROR_CLASS_ID_KEY: &str = "error_class_id";
/// System field carrying the error class name.
pub const ERROR_CLASS_NAME_KEY: &str = "error_class_name";

static NEXT_ERROR_ID: AtomicU64 = AtomicU64::new(1);

/// An error value carrying its own captured stack, per-frame messages and fields.
///
/// The innermost message is recorded at frame 0; every [`wrap`](Self::wrap)
/// advances one frame so outer context lines up with the caller frames of
/// the captured trace.
///
/// # Examples
///
/// ```
/// use record::{Field, NoCapture, TracedError};
///
/// let error = TracedError::with_capture("connection reset", &NoCapture)
///     .with_field(Field::u16("port", 5432))
///     .wrap("query failed")
///     .with_class(7, "db");
///
/// assert_eq!(error.to_string(), "query failed: connection reset");
/// assert_eq!(error.record().messages().len(), 2);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct TracedError {
    id: u64,
    record: LogRecord,
}

impl TracedError {
    /// Creates an error and captures the current stack with the default capture.
    #[cfg(feature = "backtrace")]
    pub fn new(message: impl Into<Cow<'static, str>>) -> Self {
        Self::with_capture(message, &crate::frame::BacktraceCapture)
    }

    /// Creates an error without a stack trace.
    #[cfg(not(feature = "backtrace"))]
    pub fn new(message: impl Into<Cow<'static, str>>) -> Self {
        Self::with_capture(message, &crate::frame::NoCapture)
    }

    /// Creates an error, capturing the stack through `capture`.
    pub fn with_capture(message: impl Into<Cow<'static, str>>, capture: &dyn StackCapture) -> Self {
        let id = NEXT_ERROR_ID.fetch_add(1, Ordering::Relaxed);
        let mut record = LogRecord::new();
        record.capture_stack_trace(capture);
        record.push_message(message);
        record.push_system_field(Field::u64(ERROR_ID_KEY, id));
        Self { id, record }
    }

    /// Adds outer context one frame further out.
    pub fn wrap(mut self, message: impl Into<Cow<'static, str>>) -> Self {
        self.record.advance_frame();
        self.record.push_message(message);
        self
    }

    /// Attaches a field to the current frame.
    pub fn with_field(mut self, field: Field) -> Self {
        self.record.push_field(field);
        self
    }

    /// Records the error class.
    pub fn with_class(mut self, class_id: u32, class_name: impl Into<Cow<'static, str>>) -> Self {
        self.record
            .push_system_field(Field::u32(ERROR_CLASS_ID_KEY, class_id));
        self.record
            .push_system_field(Field::str(ERROR_CLASS_NAME_KEY, class_name));
        self
    }

    /// Process-unique identifier.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// The captured record.
    #[must_use]
    pub const fn record(&self) -> &LogRecord {
        &self.record
    }

    /// Consumes the error, returning its record.
    #[must_use]
    pub fn into_record(self) -> LogRecord {
        self.record
    }
}

impl fmt::Display for TracedError {
    /// Messages from outermost to innermost, separated by `": "`. Empty
    /// messages are skipped.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for message in self.record.messages().iter().rev() {
            if message.body().is_empty() {
                continue;
            }
            if !first {
                f.write_str(": ")?;
            }
            f.write_str(message.body())?;
            first = false;
        }
        Ok(())
    }
}

impl Error for TracedError {}

/// Converts an error value into a linked [`LogRecord`].
pub trait ErrorUnwinder: Send + Sync {
    /// Records `error` into `into`, which the caller has cleared.
    fn unwind(&self, error: &(dyn Error + 'static), into: &mut LogRecord);
}

/// Default unwinder walking [`Error::source`] links.
///
/// The innermost [`TracedError`] in the chain contributes its whole record;
/// every link outside it adds one message one frame further out. Chains
/// without a traced error produce one message per link, innermost at frame 0.
#[derive(Clone, Copy, Debug, Default)]
pub struct SourceChainUnwinder;

impl ErrorUnwinder for SourceChainUnwinder {
    fn unwind(&self, error: &(dyn Error + 'static), into: &mut LogRecord) {
        let mut outer: Vec<String> = Vec::new();
        let mut traced: Option<&TracedError> = None;
        let mut link = Some(error);

        while let Some(current) = link {
            if let Some(found) = current.downcast_ref::<TracedError>() {
                traced = Some(found);
                break;
            }
            outer.push(current.to_string());
            link = current.source();
        }

        match traced {
            Some(found) => {
                into.clone_from(found.record());
                for message in outer.into_iter().rev() {
                    into.advance_frame();
                    into.push_message(message);
                }
            }
            None => {
                for (index, message) in outer.into_iter().rev().enumerate() {
                    if index > 0 {
                        into.advance_frame();
                    }
                    into.push_message(message);
                }
            }
        }
    }
}
