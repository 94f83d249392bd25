//! crates/logging/src/tracing_bridge.rs
//! Bridge from the tracing crate into a weft [`Router`].
//!
//! [`WeftLayer`] turns every tracing event into a pooled [`record::LogEvent`]
//! and dispatches it, so libraries instrumented with `tracing` macros reach
//! the same destinations as direct router calls.
//!
//! # Mapping
//!
//! - `ERROR` → [`Level::Error`], `WARN` → [`Level::Warning`], `INFO` →
//!   [`Level::Info`], `DEBUG` and `TRACE` → [`Level::Debug`].
//! - The `message` field becomes the body; every other field becomes a
//!   typed [`Field`] in recording order.
//! - Events targeting `weft::*` are the router's own diagnostics and are
//!   never forwarded.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! let router = Arc::new(config.build()?);
//! logging::init_tracing(Arc::clone(&router))?;
//!
//! tracing::warn!(attempt = 3, "retrying upload");
//! ```

use std::fmt;
use std::sync::Arc;

use record::{Field, Level, LogEvent};
use tracing::Subscriber;
use tracing::field::Visit;
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::TryInitError;

use crate::Router;

const INTERNAL_TARGET_PREFIX: &str = "weft::";

/// A tracing layer dispatching events through a [`Router`].
#[derive(Clone, Debug)]
pub struct WeftLayer {
    router: Arc<Router>,
}

impl WeftLayer {
    /// Creates a layer forwarding to `router`.
    #[must_use]
    pub const fn new(router: Arc<Router>) -> Self {
        Self { router }
    }

    /// The router events are forwarded to.
    pub fn router(&self) -> &Router {
        &self.router
    }

    const fn level_of(level: &tracing::Level) -> Level {
        match *level {
            tracing::Level::ERROR => Level::Error,
            tracing::Level::WARN => Level::Warning,
            tracing::Level::INFO => Level::Info,
            tracing::Level::DEBUG | tracing::Level::TRACE => Level::Debug,
        }
    }

    fn is_internal(target: &str) -> bool {
        target.starts_with(INTERNAL_TARGET_PREFIX)
    }
}

impl<S> Layer<S> for WeftLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if Self::is_internal(metadata.target()) {
            return;
        }
        let level = Self::level_of(metadata.level());
        if !self.router.enabled(level) {
            return;
        }

        let mut pooled = self.router.acquire(level);
        event.record(&mut EventVisitor { event: &mut *pooled });
        pooled.dispatch();
    }
}

/// Copies tracing fields into a log event.
struct EventVisitor<'e> {
    event: &'e mut LogEvent,
}

impl Visit for EventVisitor<'_> {
    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.event.push_field(Field::i64(field.name(), value));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.event.push_field(Field::u64(field.name(), value));
    }

    fn record_f64(&mut self, field: &tracing::field::Field, value: f64) {
        self.event.push_field(Field::f64(field.name(), value));
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.event.push_field(Field::bool(field.name(), value));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.event.set_message(value.to_owned());
        } else {
            self.event.push_field(Field::str(field.name(), value.to_owned()));
        }
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn fmt::Debug) {
        let rendered = format!("{value:?}");
        if field.name() == "message" {
            self.event.set_message(rendered);
        } else {
            self.event.push_field(Field::str(field.name(), rendered));
        }
    }
}

/// Installs a global subscriber forwarding tracing events to `router`.
///
/// # Errors
///
/// Fails when a global subscriber is already set.
pub fn init_tracing(router: Arc<Router>) -> Result<(), TryInitError> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    tracing_subscriber::registry()
        .with(WeftLayer::new(router))
        .try_init()
}

/// Like [`init_tracing`], with an additional filter layer such as
/// `tracing_subscriber::EnvFilter`.
///
/// # Errors
///
/// Fails when a global subscriber is already set.
pub fn init_tracing_with_filter<F>(router: Arc<Router>, filter: F) -> Result<(), TryInitError>
where
    F: Layer<tracing_subscriber::Registry> + Send + Sync + 'static,
{
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    tracing_subscriber::registry()
        .with(filter)
        .with(WeftLayer::new(router))
        .try_init()
}

#[cfg(test)]
mod tests {
    use encoding::TemplateEncoder;
    use logging_sink::MemorySink;
    use tracing_subscriber::layer::SubscriberExt;

    use super::*;

    fn router_into(sink: &Arc<MemorySink>, min_level: Level) -> Arc<Router> {
        let router = Arc::new(Router::new());
        router
            .register()
            .with_encoder(TemplateEncoder::new(
                "{{l/s}} {{m}}{{f/b: [/ak:=/av:, /a:]}}\n",
            ))
            .with_min_level(min_level)
            .write_to([Arc::clone(sink)])
            .build()
            .unwrap();
        router
    }

    #[test]
    fn level_mapping() {
        assert_eq!(WeftLayer::level_of(&tracing::Level::ERROR), Level::Error);
        assert_eq!(WeftLayer::level_of(&tracing::Level::WARN), Level::Warning);
        assert_eq!(WeftLayer::level_of(&tracing::Level::INFO), Level::Info);
        assert_eq!(WeftLayer::level_of(&tracing::Level::DEBUG), Level::Debug);
        assert_eq!(WeftLayer::level_of(&tracing::Level::TRACE), Level::Debug);
    }

    #[test]
    fn events_are_forwarded_with_typed_fields() {
        let sink = Arc::new(MemorySink::new());
        let router = router_into(&sink, Level::Debug);
        let subscriber = tracing_subscriber::registry().with(WeftLayer::new(router));

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(attempt = 3_u64, fatal = false, host = "db1", "retrying upload");
        });

        assert_eq!(
            sink.lines(),
            ["Wrn retrying upload [attempt=3, fatal=false, host=db1]"]
        );
    }

    #[test]
    fn levels_below_the_router_threshold_are_skipped() {
        let sink = Arc::new(MemorySink::new());
        let router = router_into(&sink, Level::Warning);
        let subscriber = tracing_subscriber::registry().with(WeftLayer::new(Arc::clone(&router)));

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("routine");
            tracing::error!("broken");
        });

        assert_eq!(sink.lines(), ["Err broken"]);
        assert_eq!(router.pool().len(), 1);
    }

    #[test]
    fn internal_diagnostics_are_not_forwarded() {
        let sink = Arc::new(MemorySink::new());
        let router = router_into(&sink, Level::Debug);
        let subscriber = tracing_subscriber::registry().with(WeftLayer::new(router));

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(target: "weft::sink", "sink_write_failed");
            tracing::warn!(target: "app::net", "timeout");
        });

        assert_eq!(sink.lines(), ["Wrn timeout"]);
    }
}
