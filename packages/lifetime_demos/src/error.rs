use thiserror::Error;

/// Errors that can occur when selecting or running scenarios.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The caller named a scenario that does not exist.
    #[error("unknown scenario '{name}' (use --list to see the available ones)")]
    UnknownScenario {
        /// The name that did not match any scenario.
        name: String,
    },

    /// A scenario could not create one of its handles.
    #[error("scenario '{scenario}' failed")]
    Handle {
        /// The name of the scenario that failed.
        scenario: &'static str,

        /// Why the handle could not be created.
        #[source]
        source: deleter_handle::Error,
    },
}

/// A specialized `Result` type for scenario operations, returning the crate's
/// [`Error`] type as the error value.
pub(crate) type Result<T> = std::result::Result<T, Error>;
