//! Recoverable build diagnostics.
//!
//! Configuration problems never abort a run: the offending override is
//! dropped, the element is built from defaults, and a diagnostic is
//! recorded here.

use std::fmt;

use serde::Serialize;

use crate::tree::SourceLocation;

/// What went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticKind {
    /// An override field does not apply to the element it targets.
    ConfigurationError,
    /// A rule selector matched nothing in the tree.
    SelectorMiss,
    /// A type name could not be resolved.
    UnresolvedType,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigurationError => write!(f, "configuration error"),
            Self::SelectorMiss => write!(f, "selector miss"),
            Self::UnresolvedType => write!(f, "unresolved type"),
        }
    }
}

/// A warning raised while building the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// Path of the element (or selector text for selector misses).
    pub path: String,
    pub message: String,
    pub location: Option<SourceLocation>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
            message: message.into(),
            location: None,
        }
    }

    pub fn at(mut self, location: Option<&SourceLocation>) -> Self {
        self.location = location.cloned();
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(location) = &self.location {
            write!(f, "{location}: ")?;
        }
        write!(f, "warning: {} [{}]: {}", self.kind, self.path, self.message)
    }
}
