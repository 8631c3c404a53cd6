use lifetime_trace::Trace;

/// A value member of a class, tracing its own construction and destruction.
#[derive(Debug)]
pub struct Member {
    name: &'static str,
    value: i32,
    trace: Trace,
}

impl Member {
    /// Constructs the member, emitting `name()`.
    #[must_use]
    pub fn new(name: &'static str, value: i32, trace: &Trace) -> Self {
        trace.constructed(name);

        Self {
            name,
            value,
            trace: trace.clone(),
        }
    }

    /// The name the member traces under.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The value held by the member.
    #[must_use]
    pub fn value(&self) -> i32 {
        self.value
    }
}

impl Drop for Member {
    fn drop(&mut self) {
        self.trace.destructed(self.name);
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use lifetime_trace::RecordingSink;

    use super::*;

    #[test]
    fn traces_lifetime() {
        let recording = RecordingSink::new();
        let trace = Trace::builder().sink(recording.clone()).build();

        let member = Member::new("A", 100, &trace);
        assert_eq!(member.name(), "A");
        assert_eq!(member.value(), 100);
        drop(member);

        assert_eq!(recording.lines(), ["A()", "~A()"]);
    }
}
