#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! crates/logging/src/lib.rs
//!
//! # Overview
//!
//! `logging` connects weft encoders to their destinations. A [`Router`]
//! holds destination groups, each pairing one [`encoding::Encoder`] with a
//! minimum level, an optional stack-trace level and an ordered list of
//! [`logging_sink::Sink`]s. Events are taken from the router's
//! [`EventPool`] as [`PooledEvent`] guards, populated by the caller and
//! dispatched.
//!
//! # Design
//!
//! - Registration is a builder chain ([`Registration`]) finalized exactly
//!   once into a [`DestinationTable`] stored in a `OnceLock`; dispatch reads
//!   it without locking.
//! - Rendering and writing happen on the calling thread. Sink failures are
//!   recorded per sink and reported by [`Router::flush`], never retried.
//! - Stack capture and error unwinding are injected at construction
//!   ([`Router::with_capture`], [`Router::with_unwinder`]).
//! - With the `serde` feature, [`RouterConfig`] builds a router from JSON.
//! - With the `tracing` feature, the router reports its own diagnostics
//!   under the `weft::router` and `weft::sink` targets and [`WeftLayer`]
//!   forwards tracing events into a router.
//!
//! # Invariants
//!
//! - An event failing the table-wide threshold costs no encoding work.
//! - A stack trace is captured at most once per dispatch.
//! - A pooled event is cleared before it is reused.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//!
//! use encoding::{StructuredEncoder, TemplateEncoder};
//! use logging::Router;
//! use logging_sink::MemorySink;
//! use record::{Field, Level};
//!
//! let json = Arc::new(MemorySink::new());
//! let console = Arc::new(MemorySink::new());
//!
//! let router = Router::new();
//! router
//!     .register()
//!     .with_encoder(StructuredEncoder::new())
//!     .write_to([Arc::clone(&json)])
//!     .with_encoder(TemplateEncoder::new("{{l/S}} {{m}}{{f/b: (/ak:=/a:)}}\n"))
//!     .with_min_level(Level::Warning)
//!     .write_to([Arc::clone(&console)])
//!     .build()
//!     .unwrap();
//!
//! let mut event = router.acquire(Level::Warning);
//! event.set_message("queue backlog");
//! event.push_field(Field::u32("depth", 512));
//! event.dispatch();
//!
//! assert_eq!(console.lines(), ["WRN queue backlog (depth=512)"]);
//! assert_eq!(json.write_count(), 1);
//! router.flush().unwrap();
//! ```

#[cfg(feature = "serde")]
mod config;
mod diagnostics;
mod pool;
mod router;
#[cfg(feature = "tracing")]
mod tracing_bridge;

#[cfg(feature = "serde")]
pub use config::{ConfigError, DestinationConfig, EncoderConfig, RouterConfig, SinkConfig};
pub use pool::{DEFAULT_POOL_CAPACITY, EventPool, PooledEvent};
pub use router::{Destination, DestinationTable, Registration, Router, RouterError};
#[cfg(feature = "tracing")]
pub use tracing_bridge::{WeftLayer, init_tracing, init_tracing_with_filter};
