use std::ptr::NonNull;

use lifetime_trace::Trace;

/// Deletes a complete object given a pointer to its header.
type VirtualDestructor = unsafe fn(NonNull<ObjectHeader>);

/// How deleting an object through an [`OwningPtr`][crate::OwningPtr] will proceed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum Dispatch {
    /// The destructor of the most-derived type runs, followed by every base destructor.
    Dynamic,

    /// Only the destructor of the pointer's static type runs, followed by its bases.
    Static,
}

/// The first field of every object in a class hierarchy.
///
/// Holds the destructor slot. The slot stays empty for as long as no class in the object's
/// lineage declares a virtual destructor. Once one does, each constructor from that class
/// downward overwrites the slot with its own destructor, so after construction the slot always
/// refers to the most-derived type.
#[derive(Debug, Default)]
#[repr(C)]
pub struct ObjectHeader {
    destructor: Option<VirtualDestructor>,
}

impl ObjectHeader {
    /// Creates a header with an empty destructor slot.
    #[must_use]
    pub const fn new() -> Self {
        Self { destructor: None }
    }

    /// Called by the constructor of `C` after the object is otherwise complete.
    ///
    /// Installs `C`'s destructor if `C` declares a virtual destructor or if an ancestor
    /// already installed one.
    ///
    /// # Safety
    ///
    /// The caller must ensure that:
    ///
    /// 1. This header is the header of the `C` being constructed, located at offset zero.
    /// 2. `C` is the most-derived type constructed so far for this object.
    pub unsafe fn bind<C: Class>(&mut self) {
        if C::DECLARES_VIRTUAL_DESTRUCTOR || self.destructor.is_some() {
            self.destructor = Some(destroy_as::<C>);
        }
    }

    /// Reports whether deleting the object will dispatch dynamically.
    #[must_use]
    pub fn dispatch(&self) -> Dispatch {
        if self.destructor.is_some() {
            Dispatch::Dynamic
        } else {
            Dispatch::Static
        }
    }

    pub(crate) fn destructor(&self) -> Option<VirtualDestructor> {
        self.destructor
    }
}

/// # Safety
///
/// `header` must be the header of a live `C` that was allocated as a `Box<C>` and is not
/// used again after this call.
unsafe fn destroy_as<C: Class>(header: NonNull<ObjectHeader>) {
    // SAFETY: Forwarding safety requirements to the caller. The header is at offset zero.
    drop(unsafe { Box::from_raw(header.cast::<C>().as_ptr()) });
}

/// A type in a single-inheritance hierarchy.
///
/// # Safety
///
/// Implementors must be `#[repr(C)]` and either start with an [`ObjectHeader`] (roots) or with
/// their parent class (derived classes), so that the header lives at offset zero. The
/// constructor must call [`ObjectHeader::bind::<Self>()`][ObjectHeader::bind] as its last step.
pub unsafe trait Class: Sized + 'static {
    /// The name the class traces under.
    const NAME: &'static str;

    /// Whether this class itself declares its destructor virtual.
    const DECLARES_VIRTUAL_DESTRUCTOR: bool;

    /// Constructs the object, bases first, each class's members before its own body.
    fn construct(trace: &Trace) -> Self;

    /// The header of the object.
    fn header(&self) -> &ObjectHeader;
}

/// Marks `Self` as `B` or a descendant of `B`.
///
/// # Safety
///
/// A pointer to `Self` must also be a valid pointer to `B`. With `#[repr(C)]` classes this holds
/// when `B` is reached by following the first field of `Self` zero or more times.
pub unsafe trait DerivesFrom<B: Class>: Class {}

// SAFETY: Every class trivially starts with itself.
unsafe impl<C: Class> DerivesFrom<C> for C {}

/// Constructs a `D` on the stack.
///
/// Dropping the result tears it down completely in reverse construction order, regardless of
/// virtual destructors, because the static type is the most-derived type.
#[must_use]
pub fn construct<D: Class>(trace: &Trace) -> D {
    D::construct(trace)
}
