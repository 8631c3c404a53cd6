use std::alloc::{Layout, dealloc};
use std::fmt;
use std::mem::ManuallyDrop;
use std::ops::Deref;
use std::ptr::{self, NonNull};

use lifetime_trace::Trace;

use crate::{Class, DerivesFrom, Dispatch, ObjectHeader};

/// Exclusive owner of a heap-allocated object, seen through the static type `P`.
///
/// The object may be of any type derived from `P`. Deleting the pointer (explicitly via
/// [`delete()`](Self::delete) or by dropping it) destroys the object the way deleting a base
/// pointer does in a language with class inheritance:
///
/// - If the object's lineage declares a virtual destructor, the complete object is destroyed.
/// - Otherwise only `P` is destroyed. Anything the object has beyond `P` is never torn down.
///   The allocation itself is always released with its real layout.
///
/// # Example
///
/// ```rust
/// use drop_dispatch::{Base, Dispatch, Leaf, OwningPtr};
/// use lifetime_trace::{RecordingSink, Trace};
///
/// let recording = RecordingSink::new();
/// let trace = Trace::builder().sink(recording.clone()).build();
///
/// // `Mid` declares a virtual destructor, so deleting through `Base` reaches `Leaf`.
/// let base: OwningPtr<Base> = OwningPtr::<Leaf>::construct(&trace).upcast();
/// assert_eq!(base.dispatch(), Dispatch::Dynamic);
///
/// recording.clear();
/// base.delete();
///
/// assert_eq!(
///     recording.lines(),
///     ["~Leaf()", "~C()", "~Mid()", "~B()", "~Base()", "~A()"]
/// );
/// ```
pub struct OwningPtr<P: Class> {
    ptr: NonNull<P>,

    /// Layout of the most-derived object, which is what was actually allocated.
    layout: Layout,
}

impl<P: Class> OwningPtr<P> {
    /// Moves a constructed object to the heap.
    #[must_use]
    pub fn new(value: P) -> Self {
        Self {
            ptr: NonNull::from(Box::leak(Box::new(value))),
            layout: Layout::new::<P>(),
        }
    }

    /// Constructs a `P` and moves it to the heap.
    #[must_use]
    pub fn construct(trace: &Trace) -> Self {
        Self::new(P::construct(trace))
    }

    /// Converts the pointer into a pointer to an ancestor of `P`.
    ///
    /// This is a static cast. The object itself is unchanged.
    #[must_use]
    pub fn upcast<B: Class>(self) -> OwningPtr<B>
    where
        P: DerivesFrom<B>,
    {
        let this = ManuallyDrop::new(self);

        OwningPtr {
            ptr: this.ptr.cast(),
            layout: this.layout,
        }
    }

    /// Reports whether deleting the object will dispatch dynamically.
    #[must_use]
    pub fn dispatch(&self) -> Dispatch {
        self.header().dispatch()
    }

    /// Deletes the object through this pointer.
    ///
    /// Equivalent to dropping the pointer.
    pub fn delete(self) {
        drop(self);
    }

    fn header(&self) -> &ObjectHeader {
        // SAFETY: The object is alive for as long as this pointer exists.
        unsafe { self.ptr.as_ref() }.header()
    }
}

impl<P: Class> Deref for OwningPtr<P> {
    type Target = P;

    fn deref(&self) -> &Self::Target {
        // SAFETY: The object is alive for as long as this pointer exists.
        unsafe { self.ptr.as_ref() }
    }
}

impl<P: Class> Drop for OwningPtr<P> {
    fn drop(&mut self) {
        if let Some(destructor) = self.header().destructor() {
            // SAFETY: The slot was bound by the constructor of the most-derived type, which is
            // the type that was boxed by `new()`. We never touch the object again.
            unsafe {
                destructor(self.ptr.cast());
            }

            return;
        }

        // Static dispatch: destroy only the part of the object that `P` describes.
        // SAFETY: A pointer to the object is a valid pointer to `P` per `DerivesFrom`.
        unsafe {
            ptr::drop_in_place(self.ptr.as_ptr());
        }

        // SAFETY: The memory was allocated by `Box` with the global allocator and this layout.
        unsafe {
            dealloc(self.ptr.as_ptr().cast(), self.layout);
        }
    }
}

impl<P: Class + fmt::Debug> fmt::Debug for OwningPtr<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwningPtr")
            .field("value", &**self)
            .field("layout", &self.layout)
            .finish()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use lifetime_trace::RecordingSink;
    use static_assertions::assert_not_impl_any;

    use super::*;
    use crate::{Base, Leaf, Mid, OtherLeaf};

    assert_not_impl_any!(OwningPtr<Base>: Send, Sync, Clone);

    fn recording_trace() -> (Trace, RecordingSink) {
        let recording = RecordingSink::new();
        let trace = Trace::builder().sink(recording.clone()).build();
        (trace, recording)
    }

    #[test]
    fn delete_through_own_type_is_complete() {
        let (trace, recording) = recording_trace();

        let other = OwningPtr::<OtherLeaf>::construct(&trace);
        assert_eq!(other.dispatch(), Dispatch::Static);
        recording.clear();

        other.delete();

        assert_eq!(
            recording.lines(),
            ["~OtherLeaf()", "~AEx()", "~Base()", "~A()"]
        );
    }

    #[test]
    fn drop_deletes_like_delete() {
        let (trace, recording) = recording_trace();

        {
            let _mid = OwningPtr::<Mid>::construct(&trace);
            recording.clear();
        }

        assert_eq!(recording.lines(), ["~Mid()", "~B()", "~Base()", "~A()"]);
    }

    #[test]
    fn upcast_keeps_the_object_and_layout() {
        let (trace, _recording) = recording_trace();

        let leaf = OwningPtr::<Leaf>::construct(&trace);
        let address = ptr::from_ref::<Leaf>(&leaf).addr();

        let base: OwningPtr<Base> = leaf.upcast();

        assert_eq!(ptr::from_ref::<Base>(&base).addr(), address);
        assert_eq!(base.layout, Layout::new::<Leaf>());
        assert_eq!(base.member().value(), 100);
    }

    #[test]
    fn non_virtual_upcast_deletes_partially() {
        let (trace, recording) = recording_trace();

        let base: OwningPtr<Base> = OwningPtr::<OtherLeaf>::construct(&trace).upcast();
        assert_eq!(base.dispatch(), Dispatch::Static);
        recording.clear();

        base.delete();

        assert_eq!(recording.lines(), ["~Base()", "~A()"]);
    }

    #[test]
    fn virtual_upcast_deletes_completely() {
        let (trace, recording) = recording_trace();

        let mid: OwningPtr<Mid> = OwningPtr::<Leaf>::construct(&trace).upcast();
        assert_eq!(mid.dispatch(), Dispatch::Dynamic);
        recording.clear();

        mid.delete();

        assert_eq!(
            recording.lines(),
            ["~Leaf()", "~C()", "~Mid()", "~B()", "~Base()", "~A()"]
        );
    }
}
