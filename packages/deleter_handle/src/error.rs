use std::alloc::Layout;

use thiserror::Error;

/// Errors that can occur when creating a [`Handle`][crate::Handle].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Raw storage for the managed object could not be allocated.
    #[error("out of memory allocating {type_name} ({} bytes)", .layout.size())]
    OutOfMemory {
        /// The type that storage was requested for.
        type_name: String,

        /// The layout that could not be allocated.
        layout: Layout,
    },

    /// The constructor of the managed object failed. The raw storage has already been released.
    #[error("failed to construct {type_name}")]
    Construction {
        /// The type whose construction failed.
        type_name: String,

        /// What the constructor reported.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// A specialized `Result` type for handle operations, returning the crate's
/// [`Error`] type as the error value.
pub(crate) type Result<T> = std::result::Result<T, Error>;
