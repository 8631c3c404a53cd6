//! Integration tests for handle ownership, release and upcasting.

use std::fmt::Display;

use deleter_handle::{Handle, make_handle, make_handle_with_deleter};
use lifetime_trace::{RecordingSink, Trace, TraceEvent};

/// Plays the role of a base class. Its destructor knows nothing about `Derived`.
struct Base {
    value: i32,
    trace: Trace,
}

impl Base {
    fn new(value: i32, trace: &Trace) -> Self {
        trace.constructed("Base");
        Self {
            value,
            trace: trace.clone(),
        }
    }
}

impl Drop for Base {
    fn drop(&mut self) {
        self.trace.destructed("Base");
    }
}

struct Derived {
    base: Base,
    extra: f64,
}

impl Derived {
    fn new(value: i32, extra: f64, trace: &Trace) -> Self {
        let base = Base::new(value, trace);
        trace.constructed("Derived");
        Self { base, extra }
    }
}

impl Drop for Derived {
    fn drop(&mut self) {
        self.base.trace.destructed("Derived");
    }
}

impl Display for Derived {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.base.value, self.extra)
    }
}

fn recording_trace() -> (Trace, RecordingSink) {
    let recording = RecordingSink::new();
    let trace = Trace::builder()
        .sink(recording.clone())
        .addresses(false)
        .build();
    (trace, recording)
}

#[test]
fn handle_scope() {
    let (trace, recording) = recording_trace();

    {
        let _derived = make_handle(&trace, || Derived::new(100, 3.5, &trace)).unwrap();
        trace.note("end of block");
    }

    assert_eq!(
        recording.lines(),
        [
            "enter make_handle<Derived>",
            "allocate Derived",
            "Base()",
            "Derived()",
            "end of block",
            "delete Derived",
            "~Derived()",
            "~Base()",
        ]
    );
}

#[test]
fn releasing_a_copy_keeps_the_object() {
    let (trace, recording) = recording_trace();

    let original = make_handle(&trace, || Derived::new(1, 0.5, &trace)).unwrap();

    {
        let copy = original.clone();
        assert_eq!(original.use_count(), 2);
        drop(copy);
    }

    assert_eq!(original.use_count(), 1);
    assert_eq!(original.base.value, 1);
    assert_eq!(recording.count(TraceEvent::Delete, "Derived"), 0);

    drop(original);
    assert_eq!(recording.count(TraceEvent::Delete, "Derived"), 1);
}

#[test]
fn resetting_original_defers_deletion_to_copy() {
    let (trace, recording) = recording_trace();

    let mut original = make_handle(&trace, || Derived::new(1, 0.5, &trace)).unwrap();

    {
        let copy = original.clone();
        original = Handle::empty();
        trace.note("assigned empty");

        assert!(original.is_empty());
        assert_eq!(copy.use_count(), 1);
    }

    trace.note("end of block");
    drop(original);

    assert_eq!(
        recording.lines(),
        [
            "enter make_handle<Derived>",
            "allocate Derived",
            "Base()",
            "Derived()",
            "assigned empty",
            "delete Derived",
            "~Derived()",
            "~Base()",
            "end of block",
        ]
    );
}

#[test]
fn reset_of_sole_owner_deletes_before_returning() {
    let (trace, recording) = recording_trace();

    let mut handle = make_handle(&trace, || Derived::new(1, 0.5, &trace)).unwrap();
    handle.reset();

    assert_eq!(recording.count(TraceEvent::Delete, "Derived"), 1);

    handle.reset();
    assert_eq!(recording.count(TraceEvent::Delete, "Derived"), 1);
}

#[test]
fn upcast_to_base_field_still_destroys_derived() {
    let (trace, recording) = recording_trace();

    let base: Handle<Base>;

    {
        let derived = make_handle(&trace, || Derived::new(300, 2.5, &trace)).unwrap();
        base = derived.clone().upcast(|derived| &derived.base);
        assert_eq!(derived.use_count(), 2);
    }

    assert_eq!(base.use_count(), 1);
    assert_eq!(base.value, 300);
    recording.clear();

    drop(base);

    assert_eq!(recording.lines(), ["delete Derived", "~Derived()", "~Base()"]);
}

#[test]
fn upcast_to_trait_object_still_destroys_derived() {
    let (trace, recording) = recording_trace();

    let display: Handle<dyn Display> = make_handle(&trace, || Derived::new(4, 0.25, &trace))
        .unwrap()
        .upcast(|derived| derived as &dyn Display);

    assert_eq!(display.to_string(), "4 0.25");
    recording.clear();

    drop(display);

    assert_eq!(recording.lines(), ["delete Derived", "~Derived()", "~Base()"]);
}

#[test]
fn lambda_deleter_brackets_destruction() {
    let (trace, recording) = recording_trace();
    let deleter_trace = trace.clone();

    let handle = make_handle_with_deleter(
        &trace,
        "",
        |slot| slot.write(Derived::new(1, 1.0, &trace)),
        move |derived| {
            deleter_trace.note("begin deleter");
            drop(derived);
            deleter_trace.note("end deleter");
        },
    )
    .unwrap();

    let base: Handle<Base> = handle.upcast(|derived| &derived.base);
    recording.clear();

    drop(base);

    assert_eq!(
        recording.lines(),
        ["begin deleter", "~Derived()", "~Base()", "end deleter"]
    );
}

#[test]
fn addresses_identify_the_allocation() {
    let recording = RecordingSink::new();
    let trace = Trace::builder().sink(recording.clone()).build();

    let handle = make_handle(&trace, || 9_u64).unwrap();
    let address = handle.as_ptr().unwrap().as_ptr().addr();
    drop(handle);

    let records = recording.records();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].event(), TraceEvent::Enter);
    assert_eq!(records[0].address(), None);
    assert!(
        records[1..]
            .iter()
            .all(|record| record.address() == Some(address))
    );
}
