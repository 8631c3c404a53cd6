use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::{TraceEvent, TraceRecord};

/// Receives trace records, one at a time, in the order they were emitted.
///
/// Any line-oriented output satisfies the contract. Sinks are used from a single thread and
/// receive records synchronously, so a sink observes the exact construction and destruction
/// order of the traced objects.
pub trait TraceSink {
    /// Accepts one record.
    fn record(&self, record: &TraceRecord);
}

/// Writes each record to stdout as one line.
#[derive(Clone, Copy, Debug, Default)]
#[non_exhaustive]
pub struct ConsoleSink;

impl ConsoleSink {
    /// Creates a new console sink.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl TraceSink for ConsoleSink {
    fn record(&self, record: &TraceRecord) {
        println!("{record}");
    }
}

/// Forwards each record as a structured `tracing` event at the `info` level.
///
/// The event carries `event` and `subject` fields, `address` (hex) and `detail` fields when the
/// record has them, and the rendered line as the message. Installing a subscriber is up to the
/// caller.
#[derive(Clone, Copy, Debug, Default)]
#[non_exhaustive]
pub struct TracingSink;

impl TracingSink {
    /// Creates a new sink that forwards to the current `tracing` subscriber.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl TraceSink for TracingSink {
    fn record(&self, record: &TraceRecord) {
        let address = record
            .address()
            .map(|address| tracing::field::display(format!("{address:#x}")));

        tracing::info!(
            event = record.event().name(),
            subject = record.subject(),
            address,
            detail = record.detail(),
            "{record}"
        );
    }
}

/// Keeps every record in memory.
///
/// Clones share the same storage, so one clone can be handed to a [`Trace`][crate::Trace]
/// while another is kept for inspection.
///
/// # Example
///
/// ```rust
/// use lifetime_trace::{RecordingSink, Trace, TraceEvent};
///
/// let recording = RecordingSink::new();
/// let trace = Trace::builder().sink(recording.clone()).build();
///
/// trace.constructed("Widget");
///
/// assert_eq!(recording.len(), 1);
/// assert_eq!(recording.count(TraceEvent::Construct, "Widget"), 1);
/// ```
#[derive(Clone, Default)]
pub struct RecordingSink {
    records: Rc<RefCell<Vec<TraceRecord>>>,
}

impl RecordingSink {
    /// Creates an empty recording.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every record received so far.
    #[must_use]
    pub fn records(&self) -> Vec<TraceRecord> {
        self.records.borrow().clone()
    }

    /// Returns every record received so far, rendered as lines.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.records
            .borrow()
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    /// Returns the rendered lines of all records except notes.
    #[must_use]
    pub fn lifecycle_lines(&self) -> Vec<String> {
        self.records
            .borrow()
            .iter()
            .filter(|record| record.event() != TraceEvent::Note)
            .map(ToString::to_string)
            .collect()
    }

    /// Counts the records with the given event and subject.
    #[must_use]
    pub fn count(&self, event: TraceEvent, subject: &str) -> usize {
        self.records
            .borrow()
            .iter()
            .filter(|record| record.event() == event && record.subject() == subject)
            .count()
    }

    /// Returns the number of records received so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    /// Returns whether no records have been received.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.borrow().is_empty()
    }

    /// Discards all records received so far.
    pub fn clear(&self) {
        self.records.borrow_mut().clear();
    }
}

impl TraceSink for RecordingSink {
    fn record(&self, record: &TraceRecord) {
        self.records.borrow_mut().push(record.clone());
    }
}

impl fmt::Debug for RecordingSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordingSink")
            .field("len", &self.len())
            .finish()
    }
}
