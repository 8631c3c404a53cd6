use std::cell::Cell;
use std::ptr::NonNull;

/// Shared bookkeeping for one managed object, with its concrete type erased.
///
/// Every [`Handle`][crate::Handle] copy referring to the same managed object refers to the
/// same control block. The block is freed right after its deletion strategy has run.
pub(crate) trait ControlBlock {
    /// The number of handles that currently own the managed object.
    fn strong(&self) -> &Cell<usize>;

    /// Runs the deletion strategy on the managed object.
    ///
    /// Called once, when the strong count drops to zero. Later calls do nothing.
    fn delete_managed(&mut self);
}

/// A control block that remembers the concrete type `T` of the managed object.
///
/// The deletion strategy receives the object as `Box<T>`, no matter which view the last
/// handle exposed, so it always destroys the complete object.
pub(crate) struct BoundControlBlock<T, D>
where
    D: FnOnce(Box<T>),
{
    strong: Cell<usize>,

    /// Originally came from a `Box<T>`.
    managed: NonNull<T>,

    deleter: Option<D>,
}

impl<T, D> BoundControlBlock<T, D>
where
    D: FnOnce(Box<T>),
{
    /// Creates a control block with a strong count of one.
    pub(crate) fn new(managed: Box<T>, deleter: D) -> Self {
        Self {
            strong: Cell::new(1),
            managed: NonNull::from(Box::leak(managed)),
            deleter: Some(deleter),
        }
    }

    /// The managed object, as originally allocated.
    pub(crate) fn managed(&self) -> NonNull<T> {
        self.managed
    }
}

impl<T, D> ControlBlock for BoundControlBlock<T, D>
where
    D: FnOnce(Box<T>),
{
    fn strong(&self) -> &Cell<usize> {
        &self.strong
    }

    fn delete_managed(&mut self) {
        let Some(deleter) = self.deleter.take() else {
            return;
        };

        // SAFETY: The pointer came from `Box::leak()` in `new()` and, with the deleter taken,
        // this is the only place that ever turns it back into a box.
        let managed = unsafe { Box::from_raw(self.managed.as_ptr()) };

        deleter(managed);
    }
}
