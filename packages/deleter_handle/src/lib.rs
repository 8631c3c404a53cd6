#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! A reference-counted [`Handle`] whose deletion strategy is bound when the managed object is
//! allocated.
//!
//! The deletion strategy is a closure over the concrete type of the managed object. Because
//! it is captured at the allocation site, the complete object is destroyed when the last
//! handle goes away, even if that handle only exposes a base-like view of it after an
//! [upcast](Handle::upcast). Correct destruction never depends on how the object is viewed.
//!
//! # Creating handles
//!
//! - [`make_handle()`] allocates raw storage, constructs the object in it and binds a deletion
//!   strategy that reports to a [`Trace`][lifetime_trace::Trace] and then destroys and
//!   deallocates the object as its concrete type.
//! - [`try_make_handle()`] does the same with a fallible constructor, releasing the storage if
//!   construction fails.
//! - [`make_handle_in_place()`] and [`try_make_handle_in_place()`] hand the uninitialized
//!   storage to an initializer, so the object is constructed where it will live.
//! - [`make_handle_with_deleter()`] (in place) and [`Handle::from_box_with_deleter()`] bind a
//!   caller-supplied deletion strategy.
//!
//! Every `make_*` function first reports that it was entered, naming the type it makes.
//!
//! # Example
//!
//! ```rust
//! use deleter_handle::{Handle, make_handle};
//! use lifetime_trace::{RecordingSink, Trace};
//!
//! struct Base {
//!     id: u32,
//! }
//!
//! struct Derived {
//!     base: Base,
//!     trace: Trace,
//! }
//!
//! impl Drop for Derived {
//!     fn drop(&mut self) {
//!         self.trace.destructed("Derived");
//!     }
//! }
//!
//! let recording = RecordingSink::new();
//! let trace = Trace::builder()
//!     .sink(recording.clone())
//!     .addresses(false)
//!     .build();
//!
//! let derived = make_handle(&trace, || Derived {
//!     base: Base { id: 7 },
//!     trace: trace.clone(),
//! })
//! .unwrap();
//!
//! // View only the base part from now on.
//! let base: Handle<Base> = derived.upcast(|derived| &derived.base);
//! assert_eq!(base.id, 7);
//!
//! // The deletion strategy still destroys a `Derived`.
//! drop(base);
//! assert_eq!(
//!     recording.lines(),
//!     [
//!         "enter make_handle<Derived>",
//!         "allocate Derived",
//!         "delete Derived",
//!         "~Derived()"
//!     ]
//! );
//! ```

mod control_block;
mod error;
mod handle;
mod make;

pub use error::*;
pub use handle::*;
pub use make::*;
