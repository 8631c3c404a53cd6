#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Destructor dispatch across a single-inheritance chain, virtual and non-virtual.
//!
//! Rust values always drop completely. This package models the object layout of a language
//! with class inheritance instead, to show what goes wrong when an object is deleted through a
//! pointer to one of its ancestors:
//!
//! - Every [`Class`] is `#[repr(C)]` and starts with its parent, so the root's
//!   [`ObjectHeader`] sits at offset zero of every object.
//! - The header holds a destructor slot. Constructors of classes that declare a virtual
//!   destructor, or that derive from one, install their own complete destructor in it.
//! - [`OwningPtr<P>`] deletes through the slot when it is set ([`Dispatch::Dynamic`]).
//!   Otherwise it runs only `P`'s destructor ([`Dispatch::Static`]), leaking whatever the
//!   object has beyond `P`.
//!
//! The provided hierarchy is `Base → Mid → Leaf`, where `Mid` introduces a virtual
//! destructor, and `Base → OtherLeaf`, where nothing is virtual.
//!
//! # Example
//!
//! ```rust
//! use drop_dispatch::{Base, OtherLeaf, OwningPtr};
//! use lifetime_trace::{RecordingSink, Trace};
//!
//! let recording = RecordingSink::new();
//! let trace = Trace::builder().sink(recording.clone()).build();
//!
//! let base: OwningPtr<Base> = OwningPtr::<OtherLeaf>::construct(&trace).upcast();
//! recording.clear();
//!
//! base.delete();
//!
//! // Only the static type is destroyed. The `OtherLeaf` part is never torn down.
//! assert_eq!(recording.lines(), ["~Base()", "~A()"]);
//! ```

mod class;
mod hierarchy;
mod member;
mod owning_ptr;

pub use class::*;
pub use hierarchy::*;
pub use member::*;
pub use owning_ptr::*;
