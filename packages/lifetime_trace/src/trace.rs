use std::borrow::Cow;
use std::fmt;
use std::rc::Rc;

use crate::{TraceBuilder, TraceEvent, TraceRecord, TraceSink};

/// A cheaply cloneable handle to a [`TraceSink`].
///
/// Traced objects keep a clone of the trace they were constructed with, so that their
/// destructors can report to the same sink later.
///
/// # Single-threaded Design
///
/// This type is designed for single-threaded use and is neither [`Send`] nor [`Sync`].
#[derive(Clone)]
pub struct Trace {
    sink: Rc<dyn TraceSink>,
    addresses: bool,
}

impl Trace {
    /// Creates a trace that prints to the console, including addresses.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Returns a builder for creating a [`Trace`] with custom configuration.
    pub fn builder() -> TraceBuilder {
        TraceBuilder::new()
    }

    pub(crate) fn new_inner(sink: Rc<dyn TraceSink>, addresses: bool) -> Self {
        Self { sink, addresses }
    }

    /// Whether addresses are included in the emitted records.
    #[must_use]
    pub fn addresses(&self) -> bool {
        self.addresses
    }

    /// Emits a record as-is, apart from removing the address if addresses are disabled.
    pub fn emit(&self, record: TraceRecord) {
        let record = if self.addresses {
            record
        } else {
            record.without_address()
        };

        self.sink.record(&record);
    }

    /// Reports that the constructor of `subject` has run.
    pub fn constructed(&self, subject: impl Into<Cow<'static, str>>) {
        self.emit(TraceRecord::new(TraceEvent::Construct, subject));
    }

    /// Reports that the constructor of `subject` has run for the object at `target`.
    pub fn constructed_at<T: ?Sized>(&self, subject: impl Into<Cow<'static, str>>, target: *const T) {
        self.emit(TraceRecord::new(TraceEvent::Construct, subject).with_address(target.addr()));
    }

    /// Reports that the destructor of `subject` is running.
    pub fn destructed(&self, subject: impl Into<Cow<'static, str>>) {
        self.emit(TraceRecord::new(TraceEvent::Destruct, subject));
    }

    /// Reports that the destructor of `subject`, located at `target`, is running.
    pub fn destructed_at<T: ?Sized>(&self, subject: impl Into<Cow<'static, str>>, target: *const T) {
        self.emit(TraceRecord::new(TraceEvent::Destruct, subject).with_address(target.addr()));
    }

    /// Reports that raw storage for a `subject` was allocated at `storage`.
    pub fn allocated<T: ?Sized>(&self, subject: impl Into<Cow<'static, str>>, storage: *const T) {
        self.emit(TraceRecord::new(TraceEvent::Allocate, subject).with_address(storage.addr()));
    }

    /// Reports that raw storage for a `subject` at `storage` was released unused.
    pub fn deallocated<T: ?Sized>(&self, subject: impl Into<Cow<'static, str>>, storage: *const T) {
        self.emit(TraceRecord::new(TraceEvent::Deallocate, subject).with_address(storage.addr()));
    }

    /// Reports that a deletion strategy was invoked for the `subject` at `target`.
    pub fn deleted<T: ?Sized>(&self, subject: impl Into<Cow<'static, str>>, target: *const T) {
        self.emit(TraceRecord::new(TraceEvent::Delete, subject).with_address(target.addr()));
    }

    /// Reports that the function `subject` was entered, with `detail` describing its
    /// arguments. An empty `detail` is left out.
    pub fn entered(
        &self,
        subject: impl Into<Cow<'static, str>>,
        detail: impl Into<Cow<'static, str>>,
    ) {
        self.emit(TraceRecord::new(TraceEvent::Enter, subject).with_detail(detail));
    }

    /// Emits free-form narration.
    pub fn note(&self, text: impl Into<Cow<'static, str>>) {
        self.emit(TraceRecord::new(TraceEvent::Note, text));
    }
}

impl Default for Trace {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trace")
            .field("addresses", &self.addresses)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use static_assertions::assert_not_impl_any;

    use super::*;
    use crate::RecordingSink;

    assert_not_impl_any!(Trace: Send, Sync);

    #[test]
    fn addresses_are_recorded_by_default() {
        let recording = RecordingSink::new();
        let trace = Trace::builder().sink(recording.clone()).build();
        let value = 42_u64;

        trace.deleted("u64", &raw const value);

        let records = recording.records();
        let record = records.first().unwrap();
        assert_eq!(record.event(), TraceEvent::Delete);
        assert_eq!(record.address(), Some((&raw const value).addr()));
    }

    #[test]
    fn addresses_can_be_disabled() {
        let recording = RecordingSink::new();
        let trace = Trace::builder()
            .sink(recording.clone())
            .addresses(false)
            .build();
        let value = 42_u64;

        trace.allocated("u64", &raw const value);
        trace.deallocated("u64", &raw const value);
        trace.destructed_at("u64", &raw const value);

        assert!(!trace.addresses());
        assert_eq!(
            recording.lines(),
            ["allocate u64", "deallocate u64", "~u64()"]
        );
    }

    #[test]
    fn constructor_address_follows_the_address_setting() {
        let value = 42_u64;

        let recording = RecordingSink::new();
        let trace = Trace::builder().sink(recording.clone()).build();
        trace.constructed_at("u64", &raw const value);

        let records = recording.records();
        assert_eq!(records[0].event(), TraceEvent::Construct);
        assert_eq!(records[0].address(), Some((&raw const value).addr()));

        let recording = RecordingSink::new();
        let trace = Trace::builder()
            .sink(recording.clone())
            .addresses(false)
            .build();
        trace.constructed_at("u64", &raw const value);

        assert_eq!(recording.lines(), ["u64()"]);
    }

    #[test]
    fn entered_carries_detail() {
        let recording = RecordingSink::new();
        let trace = Trace::builder().sink(recording.clone()).build();

        trace.entered("make<u64>", "u64: 1");
        trace.entered("make<u64>", "");

        assert_eq!(
            recording.lines(),
            ["enter make<u64> [u64: 1]", "enter make<u64>"]
        );
    }

    #[test]
    fn clones_share_the_sink() {
        let recording = RecordingSink::new();
        let trace = Trace::builder()
            .sink(recording.clone())
            .addresses(false)
            .build();
        let clone = trace.clone();

        trace.constructed("Leaf");
        clone.note("between");
        clone.destructed("Leaf");

        assert_eq!(recording.lines(), ["Leaf()", "between", "~Leaf()"]);
    }
}
