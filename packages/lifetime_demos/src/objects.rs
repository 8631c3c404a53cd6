use std::mem::MaybeUninit;
use std::ptr;

use lifetime_trace::Trace;

/// The managed object of the handle scenarios. Plays the role of a base class whose
/// destructor is not virtual.
///
/// Objects are constructed in place, so that the constructor can report the address the object
/// keeps for its whole life.
#[derive(Debug)]
pub struct TestObject {
    value_a: i32,
    trace: Trace,
}

impl TestObject {
    /// Constructs the object in `slot`, emitting `TestObject()` with the object's address.
    pub fn init<'a>(slot: &'a mut MaybeUninit<Self>, value_a: i32, trace: &Trace) -> &'a mut Self {
        let this = slot.write(Self {
            value_a,
            trace: trace.clone(),
        });

        trace.constructed_at("TestObject", ptr::from_ref(this));
        this
    }

    /// The value the object was constructed with.
    #[must_use]
    pub fn value_a(&self) -> i32 {
        self.value_a
    }
}

impl Drop for TestObject {
    fn drop(&mut self) {
        self.trace.destructed_at("TestObject", ptr::from_ref(self));
    }
}

/// Extends [`TestObject`] with one more value.
#[derive(Debug)]
pub struct TestObjectEx {
    base: TestObject,
    value_b: f64,
}

impl TestObjectEx {
    /// Constructs the base part in place, then the object itself, emitting `TestObject()` and
    /// `TestObjectEx()` with their addresses.
    pub fn init<'a>(
        slot: &'a mut MaybeUninit<Self>,
        value_a: i32,
        value_b: f64,
        trace: &Trace,
    ) -> &'a mut Self {
        let this = slot.as_mut_ptr();

        // SAFETY: `base` is a field of the storage behind `slot`, which we have exclusive access
        // to. `MaybeUninit<TestObject>` has the same layout as `TestObject`.
        let base = unsafe { &mut *(&raw mut (*this).base).cast::<MaybeUninit<TestObject>>() };
        TestObject::init(base, value_a, trace);

        // SAFETY: `value_b` is a field of the storage behind `slot`.
        unsafe {
            (&raw mut (*this).value_b).write(value_b);
        }

        trace.constructed_at("TestObjectEx", this.cast_const());

        // SAFETY: Both fields were initialized above.
        unsafe { slot.assume_init_mut() }
    }

    /// The [`TestObject`] part of the object.
    #[must_use]
    pub fn base(&self) -> &TestObject {
        &self.base
    }

    /// The extra value held by the extension.
    #[must_use]
    pub fn value_b(&self) -> f64 {
        self.value_b
    }
}

impl Drop for TestObjectEx {
    fn drop(&mut self) {
        self.base
            .trace
            .destructed_at("TestObjectEx", ptr::from_ref(self));
    }
}
