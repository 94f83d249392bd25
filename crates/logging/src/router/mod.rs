//! Level-gated fan-out of log events to destination groups.

mod registration;
mod table;


pub use registration::Registration;
pub use table::{Destination, DestinationTable};

use std::error::Error;
use std::fmt;
use std::io;
use std::sync::OnceLock;

use record::{ErrorUnwinder, Level, LogEvent, SourceChainUnwinder, StackCapture};
use thiserror::Error;

use crate::diagnostics::{trace_table_built, trace_unbuilt_dispatch};
use crate::pool::{DEFAULT_POOL_CAPACITY, EventPool, PooledEvent};

/// Misuse of the registration surface.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
pub enum RouterError {
    /// The destination table was finalized before.
    #[error("router destinations were already built")]
    AlreadyBuilt,
    /// Finalizing would leave the router without a single sink.
    #[error("router has no destinations")]
    NoDestinations,
}

/// Dispatches events to every destination group whose threshold they pass.
///
/// The destination table is installed once through [`Router::register`] and
/// read without locking afterwards, so a router is normally shared behind an
/// `Arc` or a `static`.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use encoding::TemplateEncoder;
/// use logging::Router;
/// use logging_sink::MemorySink;
/// use record::Level;
///
/// let sink = Arc::new(MemorySink::new());
/// let router = Router::new();
/// router
///     .register()
///     .with_encoder(TemplateEncoder::new("{{l/s}}: {{m}}\n"))
///     .with_min_level(Level::Notice)
///     .write_to([Arc::clone(&sink)])
///     .build()
///     .unwrap();
///
/// let mut event = router.acquire(Level::Error);
/// event.set_message("disk full");
/// event.dispatch();
///
/// router.acquire(Level::Debug).dispatch();
///
/// assert_eq!(sink.lines(), ["Err: disk full"]);
/// ```
pub struct Router {
    table: OnceLock<DestinationTable>,
    capture: Box<dyn StackCapture>,
    unwinder: Box<dyn ErrorUnwinder>,
    pool: EventPool,
}

impl Router {
    /// Creates a router using the default stack capture and
    /// [`SourceChainUnwinder`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            table: OnceLock::new(),
            capture: Box::new(record::DefaultCapture::default()),
            unwinder: Box::new(SourceChainUnwinder),
            pool: EventPool::new(DEFAULT_POOL_CAPACITY),
        }
    }

    /// Replaces the stack capture used when a group forces a trace.
    #[must_use]
    pub fn with_capture(mut self, capture: impl StackCapture + 'static) -> Self {
        self.capture = Box::new(capture);
        self
    }

    /// Replaces the unwinder used by [`Router::attach_error`].
    #[must_use]
    pub fn with_unwinder(mut self, unwinder: impl ErrorUnwinder + 'static) -> Self {
        self.unwinder = Box::new(unwinder);
        self
    }

    /// Replaces the event pool with one holding up to `capacity` idle events.
    #[must_use]
    pub fn with_pool_capacity(mut self, capacity: usize) -> Self {
        self.pool = EventPool::new(capacity);
        self
    }

    /// Starts registering destination groups.
    pub const fn register(&self) -> Registration<'_> {
        Registration::new(self)
    }

    pub(crate) fn install(&self, groups: Vec<Destination>) -> Result<(), RouterError> {
        if self.table.get().is_some() {
            return Err(RouterError::AlreadyBuilt);
        }
        if groups.iter().all(|group| group.sink_count() == 0) {
            return Err(RouterError::NoDestinations);
        }
        let table = DestinationTable::new(groups);
        let (group_count, sink_count, min_level) =
            (table.groups().len(), table.sink_count(), table.min_level());
        self.table
            .set(table)
            .map_err(|_| RouterError::AlreadyBuilt)?;
        trace_table_built(group_count, sink_count, min_level);
        Ok(())
    }

    /// The finalized table, once built.
    pub fn table(&self) -> Option<&DestinationTable> {
        self.table.get()
    }

    /// Reports whether destinations were installed.
    #[must_use]
    pub fn is_built(&self) -> bool {
        self.table.get().is_some()
    }

    /// Reports whether an event at `level` would reach any destination.
    #[must_use]
    pub fn enabled(&self, level: Level) -> bool {
        self.table
            .get()
            .is_some_and(|table| level.passes(table.min_level()))
    }

    /// The unwinder injected at construction.
    pub fn unwinder(&self) -> &dyn ErrorUnwinder {
        self.unwinder.as_ref()
    }

    /// The router's event pool.
    pub const fn pool(&self) -> &EventPool {
        &self.pool
    }

    /// Takes an event from the pool, stamped with `level` and the current
    /// time. Dropping the guard returns the event without dispatching it.
    pub fn acquire(&self, level: Level) -> PooledEvent<'_> {
        PooledEvent::new(self, self.pool.acquire(level))
    }

    /// Unwinds `error` into the event's linked error slot.
    pub fn attach_error(&self, event: &mut LogEvent, error: &(dyn Error + 'static)) {
        event.attach_error(error, self.unwinder.as_ref());
    }

    /// Encodes `event` for every group it passes and writes the bytes to the
    /// group's sinks in registration order.
    ///
    /// Nothing happens before the table is built or when the level fails the
    /// table-wide threshold. A stack trace is captured at most once, by the
    /// first group whose stack-trace threshold the level clears, and only
    /// when the event does not carry one already.
    pub fn dispatch(&self, event: &mut LogEvent) {
        let level = event.level();
        let Some(table) = self.table.get() else {
            trace_unbuilt_dispatch(level);
            return;
        };
        if !level.passes(table.min_level()) {
            return;
        }
        for (index, group) in table.groups().iter().enumerate() {
            if !group.accepts(level) || group.sink_count() == 0 {
                continue;
            }
            if group.wants_stack_trace(level) && !event.has_stack_trace() {
                event
                    .message_mut()
                    .capture_stack_trace(self.capture.as_ref());
            }
            let bytes = group.encoder().encode(event);
            group.write_all(index, &bytes);
        }
    }

    /// Reports the first recorded write failure, else flushes every sink in
    /// registration order, stopping at the first failure.
    ///
    /// A reported write failure is cleared; the next flush continues with
    /// the remaining sinks.
    pub fn flush(&self) -> io::Result<()> {
        match self.table.get() {
            Some(table) => table.flush(),
            None => Ok(()),
        }
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("table", &self.table.get())
            .field("pool", &self.pool)
            .finish_non_exhaustive()
    }
}
