#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! crates/logging-sink/src/lib.rs
//!
//! # Overview
//!
//! `logging-sink` defines the destination side of weft: the [`Sink`]
//! capability that receives the bytes produced by an encoder, together with
//! implementations for the process streams, files and an in-memory buffer.
//!
//! # Design
//!
//! A sink takes `&self` so the router can share one instance between
//! destination groups and threads. Each call receives one complete encoded
//! event; implementations must not interleave the bytes of concurrent calls.
//! [`LineSink`] adapts any sink to a [`LineMode`], guaranteeing that every
//! event ends on its own line.
//!
//! # Invariants
//!
//! - `write` is called with exactly one encoded event.
//! - `flush` defaults to a no-op for sinks without buffering.
//!
//! # Errors
//!
//! Every operation surfaces the [`std::io::Error`] raised by the underlying
//! stream. Sinks never retry.
//!
//! # Examples
//!
//! ```
//! use logging_sink::{LineMode, LineSink, MemorySink, Sink};
//!
//! let sink = LineSink::new(MemorySink::new(), LineMode::WithNewline);
//! sink.write(b"first").unwrap();
//! sink.write(b"second\n").unwrap();
//!
//! assert_eq!(sink.get_ref().contents(), b"first\nsecond\n");
//! ```

mod line_mode;
mod memory;
mod sink;

pub use line_mode::{LineMode, LineSink};
pub use memory::MemorySink;
pub use sink::Sink;
