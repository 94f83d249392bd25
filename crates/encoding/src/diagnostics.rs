//! Tracing hooks for template compilation and encoder failures.
//!
//! Everything here compiles to inline no-ops unless the `tracing` feature is
//! enabled, so the hot rendering path carries no cost by default.

#[cfg(feature = "tracing")]
const TEMPLATE_TARGET: &str = "weft::template";

/// Traces a verb that degraded to literal text.
///
/// * `verb` - The verb source including its delimiters
/// * `reason` - Short machine-friendly cause, e.g. `"unknown_alias"`
#[cfg(feature = "tracing")]
#[inline]
pub(crate) fn trace_degraded_verb(verb: &str, reason: &'static str) {
    tracing::debug!(
        target: TEMPLATE_TARGET,
        verb = %verb,
        reason = reason,
        "template_verb_degraded"
    );
}

/// No-op when tracing is disabled.
#[cfg(not(feature = "tracing"))]
#[inline]
pub(crate) fn trace_degraded_verb(_verb: &str, _reason: &'static str) {}

/// Traces a compiled template.
#[cfg(feature = "tracing")]
#[inline]
pub(crate) fn trace_compiled(opcodes: usize, predicted_len: usize) {
    tracing::trace!(
        target: TEMPLATE_TARGET,
        opcodes = opcodes,
        predicted_len = predicted_len,
        "template_compiled"
    );
}

/// No-op when tracing is disabled.
#[cfg(not(feature = "tracing"))]
#[inline]
pub(crate) fn trace_compiled(_opcodes: usize, _predicted_len: usize) {}

/// Traces a structured document that could not be serialized.
#[cfg(feature = "tracing")]
#[inline]
pub(crate) fn trace_structured_failure(error: &serde_json::Error) {
    tracing::warn!(
        target: TEMPLATE_TARGET,
        error = %error,
        "structured_encode_failed"
    );
}

/// No-op when tracing is disabled.
#[cfg(not(feature = "tracing"))]
#[inline]
pub(crate) fn trace_structured_failure(_error: &serde_json::Error) {}
