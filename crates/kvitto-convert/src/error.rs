use kvitto_document::DocumentError;
use thiserror::Error;

/// A conversion failure carrying full structural context: the offending
/// attribute key, the path from the root, and the source document identity.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind}: \"{key}\" at path {path} in {document}")]
pub struct ConvertError {
    pub kind: ConvertErrorKind,
    /// The attribute key being processed when the failure occurred.
    pub key: String,
    /// Backslash-joined path from the root to the enclosing node.
    pub path: String,
    /// Identity of the source document, diagnostics only.
    pub document: String,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConvertErrorKind {
    /// Scalar text did not convert to the declared type.
    #[error("cannot convert value ({0})")]
    Convert(String),
    /// A scalar write was attempted on a composite value.
    #[error("value is not a scalar")]
    ExpectedScalar,
    /// A composite key was attached to a scalar value.
    #[error("value is not an object or array")]
    ExpectedComposite,
    /// An unrecognized attribute under the deny policy.
    #[error("unknown attribute")]
    UnknownAttribute,
    /// A tree operation was rejected by the document arena.
    #[error("invalid structure ({0})")]
    Structure(DocumentError),
}
