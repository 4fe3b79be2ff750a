//! Rule store error types.

use std::path::PathBuf;

/// Errors that can occur while loading or compiling override rules.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    /// A selector could not be compiled.
    #[error("invalid selector '{selector}': {detail}")]
    InvalidSelector {
        /// The selector text as written in the rule file.
        selector: String,
        /// Why it was rejected.
        detail: String,
    },

    /// A rule entry is structurally invalid (e.g. both `name` and `name-tmp`).
    #[error("invalid rule for '{selector}': {detail}")]
    InvalidRule { selector: String, detail: String },

    /// Generator settings are out of range.
    #[error("invalid generator configuration: {detail}")]
    InvalidConfig { detail: String },

    /// Rule file not found.
    #[error("rule file not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for rule operations.
pub type Result<T> = std::result::Result<T, RuleError>;
