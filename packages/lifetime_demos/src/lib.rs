#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Scripted scenarios that print the order in which objects are constructed and destroyed.
//!
//! The first group of scenarios deletes objects of the [`drop_dispatch`] hierarchy through
//! pointers of various static types, with and without virtual destructors. The second group
//! manages [`TestObjectEx`] instances through [`deleter_handle::Handle`], showing that the
//! deletion strategy bound at creation time destroys the concrete type even after an upcast.
//!
//! # Example
//!
//! ```rust
//! use lifetime_demos::Scenario;
//! use lifetime_trace::{RecordingSink, Trace};
//!
//! let recording = RecordingSink::new();
//! let trace = Trace::builder()
//!     .sink(recording.clone())
//!     .addresses(false)
//!     .build();
//!
//! Scenario::StackMid.run(&trace).unwrap();
//!
//! assert_eq!(
//!     recording.lines(),
//!     ["A()", "Base()", "B()", "Mid()", "~Mid()", "~B()", "~Base()", "~A()"]
//! );
//! ```

mod error;
mod objects;
mod scenario;

pub use error::*;
pub use objects::*;
pub use scenario::*;
