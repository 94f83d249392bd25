//! Tracing hooks for router finalization and sink failures.
//!
//! Without the `tracing` feature every hook is an inline no-op.

use std::io;

use record::Level;

#[cfg(feature = "tracing")]
const ROUTER_TARGET: &str = "weft::router";
#[cfg(feature = "tracing")]
const SINK_TARGET: &str = "weft::sink";

/// Traces a finalized destination table.
#[cfg(feature = "tracing")]
#[inline]
pub(crate) fn trace_table_built(groups: usize, sinks: usize, min_level: Level) {
    tracing::debug!(
        target: ROUTER_TARGET,
        groups = groups,
        sinks = sinks,
        min_level = %min_level,
        "router_built"
    );
}

/// No-op when tracing is disabled.
#[cfg(not(feature = "tracing"))]
#[inline]
pub(crate) fn trace_table_built(_groups: usize, _sinks: usize, _min_level: Level) {}

/// Traces an event dispatched before the router was built.
#[cfg(feature = "tracing")]
#[inline]
pub(crate) fn trace_unbuilt_dispatch(level: Level) {
    tracing::trace!(target: ROUTER_TARGET, level = %level, "router_not_built");
}

/// No-op when tracing is disabled.
#[cfg(not(feature = "tracing"))]
#[inline]
pub(crate) fn trace_unbuilt_dispatch(_level: Level) {}

/// Traces the first write failure recorded for a sink.
///
/// * `group` - Index of the destination group
/// * `sink` - Index of the sink within its group
#[cfg(feature = "tracing")]
#[inline]
pub(crate) fn trace_write_failure(group: usize, sink: usize, error: &io::Error) {
    tracing::warn!(
        target: SINK_TARGET,
        group = group,
        sink = sink,
        error = %error,
        "sink_write_failed"
    );
}

/// No-op when tracing is disabled.
#[cfg(not(feature = "tracing"))]
#[inline]
pub(crate) fn trace_write_failure(_group: usize, _sink: usize, _error: &io::Error) {}

/// Traces a failed flush.
#[cfg(feature = "tracing")]
#[inline]
pub(crate) fn trace_flush_failure(group: usize, sink: usize, error: &io::Error) {
    tracing::warn!(
        target: SINK_TARGET,
        group = group,
        sink = sink,
        error = %error,
        "sink_flush_failed"
    );
}

/// No-op when tracing is disabled.
#[cfg(not(feature = "tracing"))]
#[inline]
pub(crate) fn trace_flush_failure(_group: usize, _sink: usize, _error: &io::Error) {}
