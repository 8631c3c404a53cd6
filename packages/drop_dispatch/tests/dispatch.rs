//! Integration tests for destructor dispatch through ancestor pointers.

use drop_dispatch::{Base, Dispatch, Leaf, Mid, OtherLeaf, OwningPtr, construct};
use lifetime_trace::{RecordingSink, Trace, TraceEvent};

fn recording_trace() -> (Trace, RecordingSink) {
    let recording = RecordingSink::new();
    let trace = Trace::builder()
        .sink(recording.clone())
        .addresses(false)
        .build();
    (trace, recording)
}

const FULL_LEAF_TEARDOWN: [&str; 6] = ["~Leaf()", "~C()", "~Mid()", "~B()", "~Base()", "~A()"];

#[test]
fn stack_mid_and_leaf() {
    let (trace, recording) = recording_trace();

    {
        let _mid = construct::<Mid>(&trace);
    }

    assert_eq!(
        recording.lines(),
        [
            "A()", "Base()", "B()", "Mid()", "~Mid()", "~B()", "~Base()", "~A()"
        ]
    );

    recording.clear();

    {
        let _leaf = construct::<Leaf>(&trace);
    }

    assert_eq!(
        recording.lines(),
        [
            "A()", "Base()", "B()", "Mid()", "C()", "Leaf()", "~Leaf()", "~C()", "~Mid()",
            "~B()", "~Base()", "~A()"
        ]
    );
}

#[test]
fn leaf_via_mid_pointer_is_complete() {
    let (trace, recording) = recording_trace();

    let mid: OwningPtr<Mid> = OwningPtr::<Leaf>::construct(&trace).upcast();
    recording.clear();
    mid.delete();

    assert_eq!(recording.lines(), FULL_LEAF_TEARDOWN);
}

#[test]
fn leaf_via_base_pointer_reaches_leaf() {
    // The virtual destructor is introduced below the pointer's static type.
    let (trace, recording) = recording_trace();

    let base: OwningPtr<Base> = OwningPtr::<Leaf>::construct(&trace).upcast();
    assert_eq!(base.dispatch(), Dispatch::Dynamic);
    recording.clear();
    base.delete();

    assert_eq!(recording.lines(), FULL_LEAF_TEARDOWN);
}

#[test]
fn upcast_in_steps_matches_direct_upcast() {
    let (trace, recording) = recording_trace();

    let mid: OwningPtr<Mid> = OwningPtr::<Leaf>::construct(&trace).upcast();
    let base: OwningPtr<Base> = mid.upcast();
    recording.clear();
    drop(base);

    assert_eq!(recording.lines(), FULL_LEAF_TEARDOWN);
}

#[test]
fn other_leaf_via_base_pointer_is_partial() {
    let (trace, recording) = recording_trace();

    let base: OwningPtr<Base> = OwningPtr::<OtherLeaf>::construct(&trace).upcast();
    recording.clear();
    base.delete();

    // Exactly the base and its member. The derived destructor and member never run.
    assert_eq!(recording.lines(), ["~Base()", "~A()"]);
    assert_eq!(recording.count(TraceEvent::Destruct, "OtherLeaf"), 0);
    assert_eq!(recording.count(TraceEvent::Destruct, "AEx"), 0);
}

#[test]
fn every_ancestor_pointer_of_a_virtual_chain_destroys_everything() {
    let (trace, recording) = recording_trace();

    let pointers: [OwningPtr<Base>; 3] = [
        OwningPtr::<Mid>::construct(&trace).upcast(),
        OwningPtr::<Leaf>::construct(&trace).upcast(),
        OwningPtr::<Leaf>::construct(&trace).upcast::<Mid>().upcast(),
    ];
    recording.clear();

    for pointer in pointers {
        pointer.delete();
    }

    assert_eq!(recording.count(TraceEvent::Destruct, "Mid"), 3);
    assert_eq!(recording.count(TraceEvent::Destruct, "Leaf"), 2);
    assert_eq!(recording.count(TraceEvent::Destruct, "C"), 2);
    assert_eq!(recording.count(TraceEvent::Destruct, "Base"), 3);
    assert_eq!(recording.count(TraceEvent::Destruct, "A"), 3);
}

#[test]
fn base_on_its_own_is_static_and_complete() {
    let (trace, recording) = recording_trace();

    let base = OwningPtr::<Base>::construct(&trace);
    assert_eq!(base.dispatch(), Dispatch::Static);
    recording.clear();
    base.delete();

    assert_eq!(recording.lines(), ["~Base()", "~A()"]);
}
