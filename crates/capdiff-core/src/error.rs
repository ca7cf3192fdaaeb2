use capdiff_model::wire::WireError;
use capdiff_model::NodeId;
use thiserror::Error;

/// Result type alias using DiffError
pub type Result<T> = std::result::Result<T, DiffError>;

/// Errors raised while diffing two schemas.
///
/// Two populations share this enum. `UnsupportedGenerics` and
/// `UnsupportedValueEquality` describe inputs the differ recognizes but
/// cannot analyze; the differ catches them at the emission site and turns
/// them into `unsupported` change records. Everything else is an
/// implementation error (a malformed input or a bug) and aborts the diff.
#[derive(Debug, Error)]
pub enum DiffError {
    /// A node id was looked up that neither schema defines.
    #[error("schema node {id} is not present in the node index")]
    MissingNode { id: NodeId },

    /// A struct or interface reference carries brand scopes.
    #[error("cannot compare generic {kind} {id}: brand scopes are not supported")]
    UnsupportedGenerics { kind: &'static str, id: NodeId },

    /// Two values whose encodings cannot be meaningfully compared.
    #[error("cannot compare values: {reason}")]
    UnsupportedValueEquality { reason: String },

    /// A method declares its own generic parameters.
    #[error("method '{name}' of {interface} is generic; generic methods are not supported")]
    GenericMethod { interface: NodeId, name: String },

    /// A method declares implicit parameters.
    #[error(
        "method '{name}' of {interface} has implicit parameters, which are not supported"
    )]
    ImplicitMethodParameters { interface: NodeId, name: String },

    /// An interface pointer inside a default value was not null.
    #[error("interface pointer inside a value is not null")]
    NonNullInterfacePointer,

    /// The encoded bytes of a value could not be read.
    #[error("value message error: {0}")]
    Wire(#[from] WireError),
}

impl DiffError {
    /// Whether the differ may recover by emitting an `unsupported` change
    /// record instead of aborting.
    pub fn is_unsupported(&self) -> bool {
        matches!(
            self,
            DiffError::UnsupportedGenerics { .. } | DiffError::UnsupportedValueEquality { .. }
        )
    }
}
