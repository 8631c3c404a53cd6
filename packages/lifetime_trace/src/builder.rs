use std::fmt;
use std::rc::Rc;

use crate::{ConsoleSink, Trace, TraceSink};

/// Builder for creating an instance of [`Trace`].
///
/// # Examples
///
/// ```
/// use lifetime_trace::{RecordingSink, Trace};
///
/// // Default trace: console output with addresses.
/// let trace = Trace::builder().build();
///
/// // Deterministic output into memory.
/// let trace = Trace::builder()
///     .sink(RecordingSink::new())
///     .addresses(false)
///     .build();
/// ```
#[must_use]
pub struct TraceBuilder {
    sink: Rc<dyn TraceSink>,
    addresses: bool,
}

impl TraceBuilder {
    pub(crate) fn new() -> Self {
        Self {
            sink: Rc::new(ConsoleSink::new()),
            addresses: true,
        }
    }

    /// Sets the sink that receives the records. Defaults to [`ConsoleSink`].
    pub fn sink(mut self, sink: impl TraceSink + 'static) -> Self {
        self.sink = Rc::new(sink);
        self
    }

    /// Sets whether memory addresses are included in the records. Defaults to `true`.
    ///
    /// Addresses differ from run to run, so turning them off makes the output deterministic.
    pub fn addresses(mut self, enabled: bool) -> Self {
        self.addresses = enabled;
        self
    }

    /// Builds the trace with the specified configuration.
    #[must_use]
    pub fn build(self) -> Trace {
        Trace::new_inner(self.sink, self.addresses)
    }
}

impl fmt::Debug for TraceBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TraceBuilder")
            .field("addresses", &self.addresses)
            .finish_non_exhaustive()
    }
}
