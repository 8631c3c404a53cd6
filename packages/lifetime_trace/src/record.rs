use std::borrow::Cow;
use std::fmt;

/// What happened to the subject of a [`TraceRecord`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum TraceEvent {
    /// A constructor body finished running.
    Construct,

    /// A destructor body started running.
    Destruct,

    /// Raw storage for an object was allocated, before the object was constructed in it.
    Allocate,

    /// Raw storage was released without the object in it ever being deleted.
    ///
    /// This only happens when construction fails after allocation.
    Deallocate,

    /// A deletion strategy was invoked for a managed object.
    Delete,

    /// Free-form narration, such as a scenario heading.
    Note,

    /// A function that creates managed objects was entered.
    Enter,
}

impl TraceEvent {
    /// A short lowercase name for the event, used as a structured field value.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Construct => "construct",
            Self::Destruct => "destruct",
            Self::Allocate => "allocate",
            Self::Deallocate => "deallocate",
            Self::Delete => "delete",
            Self::Note => "note",
            Self::Enter => "enter",
        }
    }
}

impl fmt::Display for TraceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One line of trace output.
///
/// A record renders to a single line via [`fmt::Display`]:
///
/// | Event        | Rendering              |
/// |--------------|------------------------|
/// | `Construct`  | `Name()`               |
/// | `Destruct`   | `~Name()`              |
/// | `Allocate`   | `allocate Name`        |
/// | `Deallocate` | `deallocate Name`      |
/// | `Delete`     | `delete Name`          |
/// | `Note`       | the note text verbatim |
/// | `Enter`      | `enter Name`           |
///
/// A detail, if any, is appended as ` [detail]`, followed by ` @ 0x...` if the record carries
/// an address.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TraceRecord {
    event: TraceEvent,
    subject: Cow<'static, str>,
    detail: Option<Cow<'static, str>>,
    address: Option<usize>,
}

impl TraceRecord {
    /// Creates a record without an address or detail.
    #[must_use]
    pub fn new(event: TraceEvent, subject: impl Into<Cow<'static, str>>) -> Self {
        Self {
            event,
            subject: subject.into(),
            detail: None,
            address: None,
        }
    }

    /// Attaches extra information, such as the arguments a function was called with.
    ///
    /// An empty detail is the same as none.
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<Cow<'static, str>>) -> Self {
        let detail = detail.into();
        self.detail = (!detail.is_empty()).then_some(detail);
        self
    }

    /// Attaches the memory address the record is about.
    #[must_use]
    pub fn with_address(mut self, address: usize) -> Self {
        self.address = Some(address);
        self
    }

    /// Drops the address from the record, if any.
    #[must_use]
    pub fn without_address(mut self) -> Self {
        self.address = None;
        self
    }

    /// What happened.
    #[must_use]
    pub fn event(&self) -> TraceEvent {
        self.event
    }

    /// The type (or note text) the record is about.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// The extra information attached to the record, if any.
    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    /// The memory address involved, if one was recorded.
    #[must_use]
    pub fn address(&self) -> Option<usize> {
        self.address
    }
}

impl fmt::Display for TraceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.event {
            TraceEvent::Construct => write!(f, "{}()", self.subject)?,
            TraceEvent::Destruct => write!(f, "~{}()", self.subject)?,
            TraceEvent::Note => f.write_str(&self.subject)?,
            TraceEvent::Allocate
            | TraceEvent::Deallocate
            | TraceEvent::Delete
            | TraceEvent::Enter => {
                write!(f, "{} {}", self.event, self.subject)?;
            }
        }

        if let Some(detail) = &self.detail {
            write!(f, " [{detail}]")?;
        }

        if let Some(address) = self.address {
            write!(f, " @ {address:#x}")?;
        }

        Ok(())
    }
}
