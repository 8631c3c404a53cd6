use std::mem::ManuallyDrop;

use lifetime_trace::Trace;

use crate::{Class, DerivesFrom, Member, ObjectHeader};

// Members are `ManuallyDrop` so that each destructor can tear down its own members before the
// parent, which Rust's field drop order would otherwise run first.

/// Root of the hierarchy. Does not declare a virtual destructor.
#[derive(Debug)]
#[repr(C)]
pub struct Base {
    header: ObjectHeader,
    member: ManuallyDrop<Member>,
    trace: Trace,
}

impl Base {
    /// The `A` member.
    #[must_use]
    pub fn member(&self) -> &Member {
        &self.member
    }
}

// SAFETY: `#[repr(C)]` with the header as the first field; `construct()` binds last.
unsafe impl Class for Base {
    const NAME: &'static str = "Base";
    const DECLARES_VIRTUAL_DESTRUCTOR: bool = false;

    fn construct(trace: &Trace) -> Self {
        let member = Member::new("A", 100, trace);
        trace.constructed(Self::NAME);

        let mut this = Self {
            header: ObjectHeader::new(),
            member: ManuallyDrop::new(member),
            trace: trace.clone(),
        };

        // SAFETY: This is the header of the `Base` being constructed.
        unsafe {
            this.header.bind::<Self>();
        }

        this
    }

    fn header(&self) -> &ObjectHeader {
        &self.header
    }
}

impl Drop for Base {
    fn drop(&mut self) {
        self.trace.destructed(Self::NAME);

        // SAFETY: Dropped exactly once, here.
        unsafe {
            ManuallyDrop::drop(&mut self.member);
        }
    }
}

/// Derives from [`Base`] and introduces a virtual destructor.
#[derive(Debug)]
#[repr(C)]
pub struct Mid {
    base: Base,
    member: ManuallyDrop<Member>,
}

impl Mid {
    /// The [`Base`] part of the object.
    #[must_use]
    pub fn base(&self) -> &Base {
        &self.base
    }

    /// The `B` member.
    #[must_use]
    pub fn member(&self) -> &Member {
        &self.member
    }
}

// SAFETY: `#[repr(C)]` starting with the parent; `construct()` binds last.
unsafe impl Class for Mid {
    const NAME: &'static str = "Mid";
    const DECLARES_VIRTUAL_DESTRUCTOR: bool = true;

    fn construct(trace: &Trace) -> Self {
        let base = Base::construct(trace);
        let member = Member::new("B", 200, trace);
        trace.constructed(Self::NAME);

        let mut this = Self {
            base,
            member: ManuallyDrop::new(member),
        };

        // SAFETY: The header is at offset zero of the `Mid` being constructed.
        unsafe {
            this.base.header.bind::<Self>();
        }

        this
    }

    fn header(&self) -> &ObjectHeader {
        self.base.header()
    }
}

// SAFETY: `Base` is the first field of the `#[repr(C)]` struct.
unsafe impl DerivesFrom<Base> for Mid {}

impl Drop for Mid {
    fn drop(&mut self) {
        self.base.trace.destructed(Self::NAME);

        // SAFETY: Dropped exactly once, here.
        unsafe {
            ManuallyDrop::drop(&mut self.member);
        }
    }
}

/// Derives from [`Mid`]. Re-declares the destructor virtual, which changes nothing.
#[derive(Debug)]
#[repr(C)]
pub struct Leaf {
    base: Mid,
    member: ManuallyDrop<Member>,
}

impl Leaf {
    /// The [`Mid`] part of the object.
    #[must_use]
    pub fn base(&self) -> &Mid {
        &self.base
    }

    /// The `C` member.
    #[must_use]
    pub fn member(&self) -> &Member {
        &self.member
    }
}

// SAFETY: `#[repr(C)]` starting with the parent; `construct()` binds last.
unsafe impl Class for Leaf {
    const NAME: &'static str = "Leaf";
    const DECLARES_VIRTUAL_DESTRUCTOR: bool = true;

    fn construct(trace: &Trace) -> Self {
        let base = Mid::construct(trace);
        let member = Member::new("C", 300, trace);
        trace.constructed(Self::NAME);

        let mut this = Self {
            base,
            member: ManuallyDrop::new(member),
        };

        // SAFETY: The header is at offset zero of the `Leaf` being constructed.
        unsafe {
            this.base.base.header.bind::<Self>();
        }

        this
    }

    fn header(&self) -> &ObjectHeader {
        self.base.header()
    }
}

// SAFETY: `Mid` is the first field of the `#[repr(C)]` struct.
unsafe impl DerivesFrom<Mid> for Leaf {}

// SAFETY: `Mid` is the first field of the struct and `Base` is the first field of `Mid`.
unsafe impl DerivesFrom<Base> for Leaf {}

impl Drop for Leaf {
    fn drop(&mut self) {
        self.base.base.trace.destructed(Self::NAME);

        // SAFETY: Dropped exactly once, here.
        unsafe {
            ManuallyDrop::drop(&mut self.member);
        }
    }
}

/// Derives from [`Base`] without any virtual destructor in its lineage.
#[derive(Debug)]
#[repr(C)]
pub struct OtherLeaf {
    base: Base,
    member: ManuallyDrop<Member>,
}

impl OtherLeaf {
    /// The [`Base`] part of the object.
    #[must_use]
    pub fn base(&self) -> &Base {
        &self.base
    }

    /// The `AEx` member.
    #[must_use]
    pub fn member(&self) -> &Member {
        &self.member
    }
}

// SAFETY: `#[repr(C)]` starting with the parent; `construct()` binds last.
unsafe impl Class for OtherLeaf {
    const NAME: &'static str = "OtherLeaf";
    const DECLARES_VIRTUAL_DESTRUCTOR: bool = false;

    fn construct(trace: &Trace) -> Self {
        let base = Base::construct(trace);
        let member = Member::new("AEx", 400, trace);
        trace.constructed(Self::NAME);

        let mut this = Self {
            base,
            member: ManuallyDrop::new(member),
        };

        // SAFETY: The header is at offset zero of the `OtherLeaf` being constructed.
        unsafe {
            this.base.header.bind::<Self>();
        }

        this
    }

    fn header(&self) -> &ObjectHeader {
        self.base.header()
    }
}

// SAFETY: `Base` is the first field of the `#[repr(C)]` struct.
unsafe impl DerivesFrom<Base> for OtherLeaf {}

impl Drop for OtherLeaf {
    fn drop(&mut self) {
        self.base.trace.destructed(Self::NAME);

        // SAFETY: Dropped exactly once, here.
        unsafe {
            ManuallyDrop::drop(&mut self.member);
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use lifetime_trace::RecordingSink;

    use super::*;
    use crate::{Dispatch, construct};

    fn recording_trace() -> (Trace, RecordingSink) {
        let recording = RecordingSink::new();
        let trace = Trace::builder().sink(recording.clone()).build();
        (trace, recording)
    }

    #[test]
    fn construction_runs_bases_and_members_first() {
        let (trace, recording) = recording_trace();

        let leaf = construct::<Leaf>(&trace);

        assert_eq!(
            recording.lines(),
            ["A()", "Base()", "B()", "Mid()", "C()", "Leaf()"]
        );

        drop(leaf);
    }

    #[test]
    fn stack_objects_tear_down_in_reverse() {
        let (trace, recording) = recording_trace();

        {
            let _leaf = construct::<Leaf>(&trace);
            recording.clear();
        }

        assert_eq!(
            recording.lines(),
            ["~Leaf()", "~C()", "~Mid()", "~B()", "~Base()", "~A()"]
        );
    }

    #[test]
    fn stack_objects_without_virtual_destructor_tear_down_completely() {
        let (trace, recording) = recording_trace();

        {
            let _other = construct::<OtherLeaf>(&trace);
            recording.clear();
        }

        assert_eq!(
            recording.lines(),
            ["~OtherLeaf()", "~AEx()", "~Base()", "~A()"]
        );
    }

    #[test]
    fn virtual_destructor_is_bound_from_declaring_class_down() {
        let (trace, _recording) = recording_trace();

        assert_eq!(construct::<Base>(&trace).header().dispatch(), Dispatch::Static);
        assert_eq!(construct::<Mid>(&trace).header().dispatch(), Dispatch::Dynamic);
        assert_eq!(construct::<Leaf>(&trace).header().dispatch(), Dispatch::Dynamic);
        assert_eq!(
            construct::<OtherLeaf>(&trace).header().dispatch(),
            Dispatch::Static
        );
    }

    #[test]
    fn members_hold_their_values() {
        let (trace, _recording) = recording_trace();

        let leaf = construct::<Leaf>(&trace);
        assert_eq!(leaf.member().value(), 300);
        assert_eq!(leaf.base().member().value(), 200);
        assert_eq!(leaf.base().base().member().value(), 100);

        let other = construct::<OtherLeaf>(&trace);
        assert_eq!(other.member().value(), 400);
        assert_eq!(other.base().member().value(), 100);
    }
}
