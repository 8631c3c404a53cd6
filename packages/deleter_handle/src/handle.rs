use std::fmt;
use std::ops::Deref;
use std::ptr::{self, NonNull};

use crate::control_block::{BoundControlBlock, ControlBlock};

/// A reference-counted handle to a managed object, with a deletion strategy bound when the
/// object was allocated.
///
/// Cloning a handle shares the managed object and increments the shared count. Dropping or
/// [resetting](Self::reset) a handle decrements it. When the count reaches zero the deletion
/// strategy runs, receiving the object as the concrete type it was allocated as, and then the
/// control block itself is freed.
///
/// A handle may also be empty, referring to nothing. Releasing an empty handle does nothing.
///
/// # Upcasting
///
/// [`upcast()`](Self::upcast) turns a `Handle<T>` into a `Handle<U>` that exposes a different
/// view of the same object: a field that plays the role of a base class, or a trait object.
/// The deletion strategy is unaffected, so the complete `T` is still destroyed when the last
/// handle goes away, whatever view that handle exposes.
///
/// # Single-threaded Design
///
/// The shared count is a plain counter. This type is neither [`Send`] nor [`Sync`].
///
/// # Example
///
/// ```rust
/// use deleter_handle::make_handle;
/// use lifetime_trace::Trace;
///
/// let trace = Trace::new();
/// let first = make_handle(&trace, || 42_u64).unwrap();
///
/// let second = first.clone();
/// assert_eq!(first.use_count(), 2);
///
/// drop(first);
/// assert_eq!(*second, 42);
/// assert_eq!(second.use_count(), 1);
/// ```
pub struct Handle<T: ?Sized> {
    shared: Option<Shared<T>>,
}

/// The parts of a non-empty handle.
struct Shared<T: ?Sized> {
    /// The view this handle exposes. Points into the managed object.
    ptr: NonNull<T>,

    block: NonNull<dyn ControlBlock>,
}

impl<T: ?Sized> Clone for Shared<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized> Copy for Shared<T> {}

impl<T: ?Sized> Shared<T> {
    fn block(&self) -> &dyn ControlBlock {
        // SAFETY: The block is alive while its strong count is non-zero, which it is for as
        // long as any handle holds this `Shared`.
        unsafe { self.block.as_ref() }
    }

    /// Registers one more owner.
    fn acquire(self) {
        let strong = self.block().strong();

        strong.set(
            strong
                .get()
                .checked_add(1)
                .expect("reference count overflow is not a realistic possibility"),
        );
    }

    /// Gives up one owner's reference, deleting the managed object if it was the last one.
    fn release(self) {
        let strong = self.block().strong();

        let remaining = strong
            .get()
            .checked_sub(1)
            .expect("a live handle always contributes to the strong count");

        strong.set(remaining);

        if remaining != 0 {
            return;
        }

        // SAFETY: The block was created by `Box::leak()` and we were the last owner, so
        // nothing else can reach it any more.
        let mut block = unsafe { Box::from_raw(self.block.as_ptr()) };

        block.delete_managed();

        // The control block is freed here, right after the deletion strategy has run.
    }
}

impl<T: ?Sized> Handle<T> {
    /// Creates a handle that refers to nothing.
    #[must_use]
    pub const fn empty() -> Self {
        Self { shared: None }
    }

    /// Returns a reference to the managed object, or `None` if the handle is empty.
    #[must_use]
    pub fn get(&self) -> Option<&T> {
        self.shared.as_ref().map(|shared| {
            // SAFETY: The managed object is alive while we hold a reference to it.
            unsafe { shared.ptr.as_ref() }
        })
    }

    /// Returns a pointer to the exposed view of the managed object, or `None` if empty.
    #[must_use]
    pub fn as_ptr(&self) -> Option<NonNull<T>> {
        self.shared.as_ref().map(|shared| shared.ptr)
    }

    /// Returns whether the handle refers to nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shared.is_none()
    }

    /// Returns the number of handles sharing the managed object, or zero if empty.
    #[must_use]
    pub fn use_count(&self) -> usize {
        self.shared
            .as_ref()
            .map_or(0, |shared| shared.block().strong().get())
    }

    /// Returns whether both handles share the same managed object.
    ///
    /// Two empty handles are never considered to share anything.
    #[must_use]
    pub fn ptr_eq<U: ?Sized>(&self, other: &Handle<U>) -> bool {
        match (&self.shared, &other.shared) {
            (Some(ours), Some(theirs)) => ptr::addr_eq(ours.block.as_ptr(), theirs.block.as_ptr()),
            _ => false,
        }
    }

    /// Releases this handle's reference and leaves the handle empty.
    ///
    /// If this was the last handle, the deletion strategy runs before `reset()` returns. On an
    /// empty handle this does nothing.
    pub fn reset(&mut self) {
        if let Some(shared) = self.shared.take() {
            shared.release();
        }
    }

    /// Makes this handle share the managed object of `other`.
    ///
    /// The previous reference is released as with [`reset()`](Self::reset), after the new one
    /// is acquired. Assigning a handle that already shares the same object changes nothing.
    pub fn assign(&mut self, other: &Self) {
        // Acquire before releasing: `other` may share the object `self` is about to release.
        if let Some(shared) = other.shared {
            shared.acquire();
        }

        if let Some(previous) = self.shared.take() {
            previous.release();
        }

        self.shared = other.shared;
    }

    /// Converts the handle into one that exposes a different view of the same object.
    ///
    /// The view is obtained by `cast`, typically projecting to a field that plays the role of a
    /// base class or coercing to a trait object. The shared count and the deletion strategy are
    /// unchanged. An empty handle stays empty.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::fmt::Display;
    ///
    /// use deleter_handle::{Handle, make_handle};
    /// use lifetime_trace::Trace;
    ///
    /// let trace = Trace::new();
    /// let number = make_handle(&trace, || 42_u64).unwrap();
    ///
    /// let display: Handle<dyn Display> = number.upcast(|n| n as &dyn Display);
    /// assert_eq!(display.to_string(), "42");
    /// ```
    #[must_use]
    pub fn upcast<U: ?Sized, F>(mut self, cast: F) -> Handle<U>
    where
        F: FnOnce(&T) -> &U,
    {
        let Some(shared) = self.shared.take() else {
            return Handle::empty();
        };

        // SAFETY: The managed object is alive while we hold a reference to it.
        let view = cast(unsafe { shared.ptr.as_ref() });

        Handle {
            shared: Some(Shared {
                ptr: NonNull::from(view),
                block: shared.block,
            }),
        }
    }
}

impl<T: 'static> Handle<T> {
    /// Adopts a boxed value, binding `deleter` as its deletion strategy.
    ///
    /// The deleter receives the value as `Box<T>` when the last handle is released and is
    /// responsible for disposing of it. Letting the box drop destroys and deallocates it.
    ///
    /// # Example
    ///
    /// ```rust
    /// use deleter_handle::Handle;
    ///
    /// let handle = Handle::from_box_with_deleter(Box::new(7_i32), |value| {
    ///     assert_eq!(*value, 7);
    /// });
    ///
    /// drop(handle);
    /// ```
    #[must_use]
    pub fn from_box_with_deleter<D>(value: Box<T>, deleter: D) -> Self
    where
        D: FnOnce(Box<T>) + 'static,
    {
        let block = BoundControlBlock::new(value, deleter);
        let ptr = block.managed();

        let block: Box<dyn ControlBlock> = Box::new(block);

        Self {
            shared: Some(Shared {
                ptr,
                block: NonNull::from(Box::leak(block)),
            }),
        }
    }
}

impl<T: ?Sized> Clone for Handle<T> {
    /// Creates another handle to the same managed object, incrementing the shared count.
    fn clone(&self) -> Self {
        if let Some(shared) = self.shared {
            shared.acquire();
        }

        Self {
            shared: self.shared,
        }
    }
}

impl<T: ?Sized> Deref for Handle<T> {
    type Target = T;

    /// Provides direct access to the managed object.
    ///
    /// # Panics
    ///
    /// Panics if the handle is empty.
    fn deref(&self) -> &Self::Target {
        self.get().expect("dereferenced an empty Handle")
    }
}

impl<T: ?Sized> Default for Handle<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: ?Sized> Drop for Handle<T> {
    fn drop(&mut self) {
        self.reset();
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("value", &self.get())
            .field("use_count", &self.use_count())
            .finish()
    }
}
