//! Marshalling engine error types.

/// Errors that can occur while ingesting declarations or resolving policies.
#[derive(Debug, thiserror::Error)]
pub enum FfiError {
    /// The declaration tree could not be decoded.
    #[error("invalid declaration tree: {0}")]
    Tree(#[from] serde_json::Error),

    /// Two branches of the classification claim the same parameter, or the
    /// parameter shape has no defined marshalling. Always fatal.
    #[error("ambiguous classification for parameter '{parameter}': {detail}")]
    ClassificationAmbiguity { parameter: String, detail: String },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for marshalling operations.
pub type Result<T> = std::result::Result<T, FfiError>;
