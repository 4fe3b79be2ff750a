//! Parameter directions.

use serde::{Deserialize, Serialize};

use bindmap_rules::ParamAttribute;

/// How a parameter's value flows across the native call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    /// Passed by value into the callee.
    In,
    /// Written by the callee through a pointer.
    Out,
    /// Read and written by the callee through a pointer.
    Ref,
    /// Read-only by the callee, but passed through a pointer.
    RefIn,
}

impl Direction {
    /// Parse a direction from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "in" => Some(Self::In),
            "out" => Some(Self::Out),
            "ref" | "inout" => Some(Self::Ref),
            "ref-in" | "refin" => Some(Self::RefIn),
            _ => None,
        }
    }

    /// Infer the direction from native annotations.
    ///
    /// `ref_depth` is the number of pointer levels left after the type's own
    /// representation consumed what it needs (an interface already is a
    /// pointer, a string already is a `char*`). With no level left the value
    /// is passed directly.
    pub fn infer(attribute: ParamAttribute, ref_depth: u8, is_const: bool) -> Self {
        if ref_depth == 0 {
            Self::In
        } else if attribute.contains(ParamAttribute::OUT) {
            Self::Out
        } else if attribute.contains(ParamAttribute::INOUT) {
            Self::Ref
        } else if attribute.contains(ParamAttribute::IN) || is_const {
            Self::RefIn
        } else {
            Self::Ref
        }
    }

    /// Whether the callee receives an address rather than a value.
    pub fn is_by_reference(&self) -> bool {
        matches!(self, Self::Ref | Self::RefIn)
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::In => write!(f, "in"),
            Self::Out => write!(f, "out"),
            Self::Ref => write!(f, "ref"),
            Self::RefIn => write!(f, "ref-in"),
        }
    }
}
