use std::alloc::{self, Layout};
use std::borrow::Cow;
use std::convert::Infallible;
use std::mem::MaybeUninit;
use std::ptr::{self, NonNull};

use lifetime_trace::{Trace, short_type_name};

use crate::{Error, Handle, Result};

/// Allocates storage for a `T`, moves the value returned by `ctor` into it and returns a handle
/// whose deletion strategy destroys and deallocates it as a `T`.
///
/// Entering the function, the allocation and later the deletion are reported to `trace`,
/// the latter two together with the address.
///
/// `ctor` builds the value before it is moved into the storage. Use
/// [`make_handle_in_place()`] for values that must be constructed directly in the storage.
///
/// # Errors
///
/// Returns [`Error::OutOfMemory`] if the storage cannot be allocated. `ctor` is not called in
/// that case.
///
/// # Panics
///
/// If `ctor` panics, the storage is released and the panic continues.
///
/// # Example
///
/// ```rust
/// use deleter_handle::make_handle;
/// use lifetime_trace::{RecordingSink, Trace};
///
/// let recording = RecordingSink::new();
/// let trace = Trace::builder()
///     .sink(recording.clone())
///     .addresses(false)
///     .build();
///
/// let handle = make_handle(&trace, || String::from("hello")).unwrap();
/// assert_eq!(*handle, "hello");
///
/// drop(handle);
/// assert_eq!(
///     recording.lines(),
///     ["enter make_handle<String>", "allocate String", "delete String"]
/// );
/// ```
pub fn make_handle<T, F>(trace: &Trace, ctor: F) -> Result<Handle<T>>
where
    T: 'static,
    F: FnOnce() -> T,
{
    enter::<T>(trace, "make_handle", "");

    let value = emplace(trace, |slot| Ok::<_, Infallible>(slot.write(ctor())))?;

    Ok(Handle::from_box_with_deleter(value, tracing_deleter(trace)))
}

/// Like [`make_handle()`] but with a constructor that can fail.
///
/// # Errors
///
/// Returns [`Error::OutOfMemory`] if the storage cannot be allocated and
/// [`Error::Construction`] if `ctor` fails. In the latter case the storage has already been
/// released when the error is returned.
///
/// # Example
///
/// ```rust
/// use deleter_handle::{Error, try_make_handle};
/// use lifetime_trace::Trace;
///
/// let trace = Trace::new();
///
/// let result = try_make_handle(&trace, || "not a number".parse::<u32>());
/// assert!(matches!(result, Err(Error::Construction { .. })));
/// ```
pub fn try_make_handle<T, E, F>(trace: &Trace, ctor: F) -> Result<Handle<T>>
where
    T: 'static,
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
    F: FnOnce() -> std::result::Result<T, E>,
{
    enter::<T>(trace, "try_make_handle", "");

    let value = emplace::<T, E, _>(trace, |slot| {
        let value = ctor()?;
        Ok(slot.write(value))
    })?;

    Ok(Handle::from_box_with_deleter(value, tracing_deleter(trace)))
}

/// Allocates storage for a `T` and lets `init` construct the value directly in it.
///
/// `init` receives the uninitialized storage and must return it initialized, typically via
/// [`MaybeUninit::write()`] or by writing each field through raw pointers. The value never
/// exists outside the storage, so large values do not pass through the stack.
///
/// `args` describes the constructor arguments for the entry record (see
/// [`describe_args!`][lifetime_trace::describe_args]); an empty description is left out.
///
/// # Errors
///
/// Returns [`Error::OutOfMemory`] if the storage cannot be allocated. `init` is not called in
/// that case and no allocation is reported.
///
/// # Panics
///
/// Panics if `init` returns a reference to anything other than the storage it was given. If
/// `init` panics, or returns the wrong reference, the storage is released and the panic
/// continues. A value left behind in the storage is leaked.
///
/// # Example
///
/// ```rust
/// use deleter_handle::make_handle_in_place;
/// use lifetime_trace::{RecordingSink, Trace, describe_args};
///
/// let recording = RecordingSink::new();
/// let trace = Trace::builder()
///     .sink(recording.clone())
///     .addresses(false)
///     .build();
///
/// let length = 3_usize;
/// let handle = make_handle_in_place(&trace, describe_args!(length), |slot| {
///     slot.write(vec![0_u8; length])
/// })
/// .unwrap();
///
/// assert_eq!(handle.len(), 3);
/// assert_eq!(
///     recording.lines(),
///     ["enter make_handle_in_place<Vec<u8>> [usize: 3]", "allocate Vec<u8>"]
/// );
/// ```
pub fn make_handle_in_place<T, F>(
    trace: &Trace,
    args: impl Into<Cow<'static, str>>,
    init: F,
) -> Result<Handle<T>>
where
    T: 'static,
    F: FnOnce(&mut MaybeUninit<T>) -> &mut T,
{
    enter::<T>(trace, "make_handle_in_place", args);

    let value = emplace(trace, |slot| Ok::<_, Infallible>(init(slot)))?;

    Ok(Handle::from_box_with_deleter(value, tracing_deleter(trace)))
}

/// Like [`make_handle_in_place()`] but with an initializer that can fail.
///
/// # Errors
///
/// Returns [`Error::OutOfMemory`] if the storage cannot be allocated and
/// [`Error::Construction`] if `init` fails. In the latter case the storage has already been
/// released when the error is returned. Whatever `init` wrote before failing is leaked.
///
/// # Panics
///
/// Panics if `init` returns a reference to anything other than the storage it was given.
pub fn try_make_handle_in_place<T, E, F>(
    trace: &Trace,
    args: impl Into<Cow<'static, str>>,
    init: F,
) -> Result<Handle<T>>
where
    T: 'static,
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
    F: FnOnce(&mut MaybeUninit<T>) -> std::result::Result<&mut T, E>,
{
    enter::<T>(trace, "try_make_handle_in_place", args);

    let value = emplace(trace, init)?;

    Ok(Handle::from_box_with_deleter(value, tracing_deleter(trace)))
}

/// Like [`make_handle_in_place()`] but with a caller-supplied deletion strategy.
///
/// The deleter receives the object as `Box<T>` once the last handle is released. Dropping the
/// box destroys the object and releases its storage.
///
/// # Errors
///
/// Returns [`Error::OutOfMemory`] if the storage cannot be allocated.
///
/// # Panics
///
/// Panics if `init` returns a reference to anything other than the storage it was given.
///
/// # Example
///
/// ```rust
/// use deleter_handle::make_handle_with_deleter;
/// use lifetime_trace::{RecordingSink, Trace};
///
/// let recording = RecordingSink::new();
/// let trace = Trace::builder()
///     .sink(recording.clone())
///     .addresses(false)
///     .build();
///
/// let deleter_trace = trace.clone();
/// let handle = make_handle_with_deleter(
///     &trace,
///     "",
///     |slot| slot.write(5_u8),
///     move |value| {
///         deleter_trace.note("begin");
///         drop(value);
///         deleter_trace.note("end");
///     },
/// )
/// .unwrap();
///
/// drop(handle);
/// assert_eq!(
///     recording.lines(),
///     ["enter make_handle_with_deleter<u8>", "allocate u8", "begin", "end"]
/// );
/// ```
pub fn make_handle_with_deleter<T, F, D>(
    trace: &Trace,
    args: impl Into<Cow<'static, str>>,
    init: F,
    deleter: D,
) -> Result<Handle<T>>
where
    T: 'static,
    F: FnOnce(&mut MaybeUninit<T>) -> &mut T,
    D: FnOnce(Box<T>) + 'static,
{
    enter::<T>(trace, "make_handle_with_deleter", args);

    let value = emplace(trace, |slot| Ok::<_, Infallible>(init(slot)))?;

    Ok(Handle::from_box_with_deleter(value, deleter))
}

fn enter<T>(trace: &Trace, function: &str, args: impl Into<Cow<'static, str>>) {
    trace.entered(format!("{function}<{}>", short_type_name::<T>()), args);
}

/// The default deletion strategy: report, then destroy and deallocate as the concrete `T`.
fn tracing_deleter<T: 'static>(trace: &Trace) -> impl FnOnce(Box<T>) + 'static {
    let trace = trace.clone();

    move |managed: Box<T>| {
        trace.deleted(short_type_name::<T>(), &raw const *managed);
        drop(managed);
    }
}

/// Allocates raw storage for a `T` and has `init` construct the value in it.
///
/// Allocation happens before `init` runs. If `init` fails or panics, the storage is released
/// before the failure propagates.
fn emplace<T, E, F>(trace: &Trace, init: F) -> Result<Box<T>>
where
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
    F: FnOnce(&mut MaybeUninit<T>) -> std::result::Result<&mut T, E>,
{
    let layout = Layout::new::<T>();
    let storage = allocate::<T>(layout)?;
    let address = storage.as_ptr();

    trace.allocated(short_type_name::<T>(), address);

    let guard = scopeguard::guard(storage, |storage| {
        trace.deallocated(short_type_name::<T>(), storage.as_ptr());

        // SAFETY: The storage came from `allocate()` with this layout and holds no value that
        // anyone will drop.
        unsafe {
            deallocate(storage, layout);
        }
    });

    // SAFETY: The storage is valid for reads and writes of a `T`, nothing else refers to it
    // and `MaybeUninit<T>` has the same layout as `T`.
    let slot = unsafe { guard.cast::<MaybeUninit<T>>().as_mut() };

    let initialized = init(slot).map_err(|source| Error::Construction {
        type_name: short_type_name::<T>(),
        source: source.into(),
    })?;

    assert!(
        ptr::eq(initialized, address),
        "in-place initializer must return the storage it was given"
    );

    let storage = scopeguard::ScopeGuard::into_inner(guard);

    // SAFETY: The storage was allocated by the global allocator with `Layout::new::<T>()` (or is
    // dangling for a zero-sized `T`) and `init` has initialized it, as the returned reference
    // proves. That is what `Box` requires.
    Ok(unsafe { Box::from_raw(storage.as_ptr()) })
}

fn allocate<T>(layout: Layout) -> Result<NonNull<T>> {
    if layout.size() == 0 {
        return Ok(NonNull::dangling());
    }

    // SAFETY: The layout has a non-zero size.
    let raw = unsafe { alloc::alloc(layout) };

    NonNull::new(raw.cast::<T>()).ok_or_else(|| Error::OutOfMemory {
        type_name: short_type_name::<T>(),
        layout,
    })
}

/// # Safety
///
/// `storage` must have been returned by `allocate()` with the same `layout` and must not hold
/// a live value.
unsafe fn deallocate<T>(storage: NonNull<T>, layout: Layout) {
    if layout.size() == 0 {
        return;
    }

    // SAFETY: Forwarding safety requirements to the caller.
    unsafe {
        alloc::dealloc(storage.as_ptr().cast(), layout);
    }
}
