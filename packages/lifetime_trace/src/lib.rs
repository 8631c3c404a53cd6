#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Line-oriented tracing of object lifetimes.
//!
//! Every constructor, destructor, raw allocation and deletion strategy in the lifetime demos
//! reports itself through a [`Trace`]. A trace forwards [`TraceRecord`]s to a [`TraceSink`],
//! which decides what to do with them:
//!
//! - [`ConsoleSink`] prints one line per record to stdout.
//! - [`TracingSink`] turns each record into a structured `tracing` event.
//! - [`RecordingSink`] keeps the records in memory so they can be inspected afterwards.
//!
//! # Example
//!
//! ```rust
//! use lifetime_trace::{RecordingSink, Trace};
//!
//! let recording = RecordingSink::new();
//! let trace = Trace::builder()
//!     .sink(recording.clone())
//!     .addresses(false)
//!     .build();
//!
//! trace.constructed("Widget");
//! trace.destructed("Widget");
//!
//! assert_eq!(recording.lines(), ["Widget()", "~Widget()"]);
//! ```

mod args;
mod builder;
mod record;
mod sink;
mod trace;
mod type_name;

pub use args::*;
pub use builder::*;
pub use record::*;
pub use sink::*;
pub use trace::*;
pub use type_name::*;
