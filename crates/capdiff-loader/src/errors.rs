//! Error handling for capdiff-loader.

use capdiff_model::wire::WireError;
use thiserror::Error;

/// Result type alias using LoadError
pub type Result<T> = std::result::Result<T, LoadError>;

/// Errors raised while loading a schema or resolving source locations.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The external binary could not be started at all.
    #[error("failed to invoke '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The schema compiler ran and rejected the input.
    #[error("schema compiler exited with status {status}:\n{stderr}")]
    Compiler { status: i32, stderr: String },

    /// A git invocation failed.
    #[error("git exited with status {status}:\n{stderr}")]
    Git { status: i32, stderr: String },

    /// Filesystem access failed; `context` names the operation.
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// The compiler's output stream could not be decoded.
    #[error("malformed compiler output: {0}")]
    Decode(#[from] capnp::Error),

    /// The compiler's output used an ordinal this build does not know.
    #[error("unknown ordinal in compiler output: {0}")]
    NotInSchema(#[from] capnp::NotInSchema),

    /// A name in the compiler's output was not valid UTF-8.
    #[error("non-UTF-8 text in compiler output: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// The word-level reader rejected the message.
    #[error(transparent)]
    Wire(#[from] WireError),
}

impl LoadError {
    /// Helper for wrapping filesystem errors with their operation.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> LoadError {
        LoadError::Io {
            context: context.into(),
            source,
        }
    }
}
