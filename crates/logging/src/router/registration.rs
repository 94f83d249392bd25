//! Builder chain producing the destination table.

use std::fmt;

use encoding::{Encoder, TemplateEncoder};
use logging_sink::Sink;
use record::Level;

use super::table::{Destination, SinkSlot};
use super::{Router, RouterError};

/// Group under construction.
struct PendingGroup {
    encoder: Option<Box<dyn Encoder>>,
    min_level: Level,
    min_stacktrace_level: Option<Level>,
    sinks: Vec<SinkSlot>,
}

impl PendingGroup {
    const fn new() -> Self {
        Self {
            encoder: None,
            min_level: Level::Debug,
            min_stacktrace_level: None,
            sinks: Vec::new(),
        }
    }

    fn is_started(&self) -> bool {
        self.encoder.is_some() || !self.sinks.is_empty()
    }

    fn finish(self) -> Destination {
        let encoder: Box<dyn Encoder> = match self.encoder {
            Some(encoder) => encoder,
            None => Box::new(TemplateEncoder::default()),
        };
        Destination::new(
            encoder,
            self.min_level,
            self.min_stacktrace_level,
            self.sinks,
        )
    }
}

/// Registration chain returned by [`Router::register`].
///
/// Each [`with_encoder`](Self::with_encoder) call after the first starts a
/// new destination group; thresholds and sinks apply to the current group.
/// A group registered without an encoder renders the default template.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use encoding::{StructuredEncoder, TemplateEncoder};
/// use logging::Router;
/// use logging_sink::MemorySink;
/// use record::Level;
///
/// let everything = Arc::new(MemorySink::new());
/// let problems = Arc::new(MemorySink::new());
///
/// let router = Router::new();
/// router
///     .register()
///     .with_encoder(StructuredEncoder::new())
///     .write_to([Arc::clone(&everything)])
///     .with_encoder(TemplateEncoder::new("{{l/S}} {{m}}\n"))
///     .with_min_level(Level::Warning)
///     .write_to([Arc::clone(&problems)])
///     .build()
///     .unwrap();
///
/// assert_eq!(router.table().map(|table| table.groups().len()), Some(2));
/// ```
#[must_use = "destinations are only installed by `build`"]
pub struct Registration<'r> {
    router: &'r Router,
    groups: Vec<Destination>,
    current: PendingGroup,
}

impl<'r> Registration<'r> {
    pub(super) const fn new(router: &'r Router) -> Self {
        Self {
            router,
            groups: Vec::new(),
            current: PendingGroup::new(),
        }
    }

    /// Sets the encoder of a new group.
    pub fn with_encoder(mut self, encoder: impl Encoder + 'static) -> Self {
        if self.current.is_started() {
            let finished = std::mem::replace(&mut self.current, PendingGroup::new());
            self.groups.push(finished.finish());
        }
        self.current.encoder = Some(Box::new(encoder));
        self
    }

    /// Least severe level the current group accepts. Defaults to
    /// [`Level::Debug`].
    pub fn with_min_level(mut self, level: Level) -> Self {
        self.current.min_level = level;
        self
    }

    /// Least severe level for which the current group forces stack capture.
    /// Groups never capture unless this is set.
    pub fn with_min_stacktrace_level(mut self, level: Level) -> Self {
        self.current.min_stacktrace_level = Some(level);
        self
    }

    /// Appends sinks to the current group. May be called repeatedly; write
    /// order follows call order.
    pub fn write_to<I, S>(mut self, sinks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Sink + 'static,
    {
        self.current.sinks.extend(
            sinks
                .into_iter()
                .map(|sink| SinkSlot::new(Box::new(sink))),
        );
        self
    }

    /// Finalizes the router's destination table.
    ///
    /// A trailing group that received no sinks is dropped.
    ///
    /// # Errors
    ///
    /// [`RouterError::AlreadyBuilt`] when the router was finalized before,
    /// [`RouterError::NoDestinations`] when no group has a sink.
    pub fn build(mut self) -> Result<(), RouterError> {
        if !self.current.sinks.is_empty() {
            self.groups.push(self.current.finish());
        }
        self.router.install(self.groups)
    }
}

impl fmt::Debug for Registration<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("groups", &self.groups)
            .field("current_sinks", &self.current.sinks.len())
            .finish_non_exhaustive()
    }
}
