//! crates/record/src/frame.rs
//! Captured call-stack frames and the capture seam used to obtain them.

use std::borrow::Cow;
use std::fmt;

/// One captured call-stack frame.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct StackFrame {
    function: Cow<'static, str>,
    file: Cow<'static, str>,
    line: u32,
}

impl StackFrame {
    /// Creates a frame from a fully qualified function path, a source path and a line.
    pub fn new(
        function: impl Into<Cow<'static, str>>,
        file: impl Into<Cow<'static, str>>,
        line: u32,
    ) -> Self {
        Self {
            function: function.into(),
            file: file.into(),
            line,
        }
    }

    /// Fully qualified function path, e.g. `weft::router::dispatch`.
    #[must_use]
    pub fn function(&self) -> &str {
        &self.function
    }

    /// Last path segment of the function.
    ///
    /// # Examples
    ///
    /// ```
    /// use record::StackFrame;
    ///
    /// let frame = StackFrame::new("app::net::connect", "/src/app/net.rs", 42);
    /// assert_eq!(frame.short_function(), "connect");
    /// assert_eq!(frame.package(), "app::net");
    /// assert_eq!(frame.short_file(), "net.rs");
    /// ```
    #[must_use]
    pub fn short_function(&self) -> &str {
        self.function
            .rsplit_once("::")
            .map_or(&*self.function, |(_, name)| name)
    }

    /// Module path enclosing the function; empty for free-standing names.
    #[must_use]
    pub fn package(&self) -> &str {
        self.function
            .rsplit_once("::")
            .map_or("", |(package, _)| package)
    }

    /// Full source path.
    #[must_use]
    pub fn file(&self) -> &str {
        &self.file
    }

    /// Base name of the source path.
    #[must_use]
    pub fn short_file(&self) -> &str {
        self.file
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(&self.file)
    }

    /// Source line.
    #[must_use]
    pub const fn line(&self) -> u32 {
        self.line
    }
}

impl fmt::Display for StackFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}:{})", self.function, self.file, self.line)
    }
}

/// Source of call stacks for records that request one.
///
/// Implementations append frames, innermost first, to `frames`.
pub trait StackCapture: Send + Sync {
    /// Appends the current call stack to `frames`.
    fn capture(&self, frames: &mut Vec<StackFrame>);
}

/// Capture implementation that never records any frame.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoCapture;

impl StackCapture for NoCapture {
    fn capture(&self, _frames: &mut Vec<StackFrame>) {}
}

/// Captures stacks through [`std::backtrace::Backtrace`].
///
/// Frames belonging to the standard library, the runtime and this crate are
/// skipped so the first recorded frame is the caller's. Symbols without a
/// source location are dropped.
#[cfg(feature = "backtrace")]
#[derive(Clone, Copy, Debug, Default)]
pub struct BacktraceCapture;

#[cfg(feature = "backtrace")]
impl StackCapture for BacktraceCapture {
    fn capture(&self, frames: &mut Vec<StackFrame>) {
        let rendered = std::backtrace::Backtrace::force_capture().to_string();
        parse_backtrace(&rendered, frames);
    }
}

#[cfg_attr(not(feature = "backtrace"), allow(dead_code))]
const SKIPPED_PREFIXES: &[&str] = &[
    "std::",
    "core::",
    "alloc::",
    "__rust",
    "rust_begin_unwind",
    "record::frame::",
    "<record::frame::",
    "logging::router::",
    "logging::pool::",
    "<logging::pool::",
    "logging::tracing_bridge::",
    "<logging::tracing_bridge::",
    "tracing::",
    "tracing_core::",
    "tracing_subscriber::",
    "<tracing_subscriber::",
];

/// Parses the `Display` form of a std backtrace.
///
/// Each frame looks like `N: path::to::function::h0123…` optionally followed
/// by an `at file:line:column` line.
#[cfg_attr(not(feature = "backtrace"), allow(dead_code))]
pub(crate) fn parse_backtrace(rendered: &str, frames: &mut Vec<StackFrame>) {
    let mut pending: Option<String> = None;

    for line in rendered.lines() {
        let trimmed = line.trim();
        if let Some(location) = trimmed.strip_prefix("at ") {
            let Some(function) = pending.take() else {
                continue;
            };
            if let Some((file, line)) = split_location(location) {
                frames.push(StackFrame::new(function, file.to_owned(), line));
            }
            continue;
        }

        if let Some((index, symbol)) = trimmed.split_once(": ")
            && !index.is_empty()
            && index.bytes().all(|byte| byte.is_ascii_digit())
        {
            let symbol = strip_symbol_hash(symbol);
            pending = (!SKIPPED_PREFIXES
                .iter()
                .any(|prefix| symbol.starts_with(prefix)))
            .then(|| symbol.to_owned());
        }
    }
}

#[cfg_attr(not(feature = "backtrace"), allow(dead_code))]
fn strip_symbol_hash(symbol: &str) -> &str {
    match symbol.rsplit_once("::h") {
        Some((path, hash))
            if hash.len() == 16 && hash.bytes().all(|byte| byte.is_ascii_hexdigit()) =>
        {
            path
        }
        _ => symbol,
    }
}

#[cfg_attr(not(feature = "backtrace"), allow(dead_code))]
fn split_location(location: &str) -> Option<(&str, u32)> {
    let (rest, last) = location.rsplit_once(':')?;
    let last: u32 = last.parse().ok()?;
    // `file:line:column` is the usual shape; fall back to `file:line`.
    match rest.rsplit_once(':') {
        Some((file, line)) => line.parse().ok().map_or(Some((rest, last)), |line| Some((file, line))),
        None => Some((rest, last)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "   0: std::backtrace_rs::backtrace::libunwind::trace
             at /rustc/abc/library/std/src/../../backtrace/src/backtrace/libunwind.rs:116:5
   1: std::backtrace::Backtrace::create
             at /rustc/abc/library/std/src/backtrace.rs:331:13
   2: app::db::query::h0123456789abcdef
             at ./src/db.rs:17:9
   3: app::main
             at ./src/main.rs:4:5
   4: core::ops::function::FnOnce::call_once
             at /rustc/abc/library/core/src/ops/function.rs:250:5
   5: __libc_start_main
   6: _start";

    #[test]
    fn parses_user_frames_and_skips_runtime() {
        let mut frames = Vec::new();
        parse_backtrace(SAMPLE, &mut frames);
        assert_eq!(
            frames,
            vec![
                StackFrame::new("app::db::query", "./src/db.rs", 17),
                StackFrame::new("app::main", "./src/main.rs", 4),
            ]
        );
    }

    #[test]
    fn location_without_column_is_accepted() {
        assert_eq!(split_location("src/lib.rs:12"), Some(("src/lib.rs", 12)));
        assert_eq!(split_location("src/lib.rs:12:3"), Some(("src/lib.rs", 12)));
        assert_eq!(split_location("nowhere"), None);
    }

    #[test]
    fn frame_accessors_split_paths() {
        let frame = StackFrame::new("main", "C:\\work\\main.rs", 3);
        assert_eq!(frame.short_function(), "main");
        assert_eq!(frame.package(), "");
        assert_eq!(frame.short_file(), "main.rs");
        assert_eq!(frame.to_string(), "main (C:\\work\\main.rs:3)");
    }

    #[test]
    fn no_capture_leaves_frames_empty() {
        let mut frames = Vec::new();
        NoCapture.capture(&mut frames);
        assert!(frames.is_empty());
    }

    #[cfg(feature = "backtrace")]
    #[test]
    fn backtrace_capture_skips_its_own_frames() {
        let mut frames = Vec::new();
        BacktraceCapture.capture(&mut frames);
        assert!(
            frames
                .iter()
                .all(|frame| !frame.function().starts_with("std::"))
        );
    }
}
