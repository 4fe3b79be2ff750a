//! Qualified-name selectors.
//!
//! A selector picks the declarations a rule applies to. Three forms are
//! accepted:
//!
//! - `re:<pattern>`: a regular expression matched against the whole path
//! - `<prefix>*`: every path starting with `<prefix>` (`ID3D11Device::*`)
//! - anything else: exact path equality

use std::fmt;

use regex::Regex;

use crate::error::{Result, RuleError};

/// Separator between the segments of a qualified path.
pub const PATH_SEPARATOR: &str = "::";

const REGEX_PREFIX: &str = "re:";

/// A compiled selector.
#[derive(Debug, Clone)]
pub enum Selector {
    /// Matches one path exactly.
    Exact(String),
    /// Matches every path that starts with the stored prefix.
    Prefix(String),
    /// Matches every path accepted by the anchored regex.
    Pattern { source: String, regex: Regex },
}

/// How specific a selector is. Larger values win when rules are folded.
///
/// Compared by selector class first, then by prefix length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Specificity {
    class: u8,
    length: usize,
}

impl Selector {
    /// Compile a selector from its textual form.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(RuleError::InvalidSelector {
                selector: input.to_string(),
                detail: "empty selector".to_string(),
            });
        }

        if let Some(source) = input.strip_prefix(REGEX_PREFIX) {
            let regex = Regex::new(&format!("^(?:{source})$")).map_err(|e| {
                RuleError::InvalidSelector {
                    selector: input.to_string(),
                    detail: e.to_string(),
                }
            })?;
            return Ok(Selector::Pattern {
                source: source.to_string(),
                regex,
            });
        }

        if let Some(prefix) = input.strip_suffix('*') {
            if prefix.contains('*') {
                return Err(RuleError::InvalidSelector {
                    selector: input.to_string(),
                    detail: "only a single trailing '*' is supported (use re: for patterns)"
                        .to_string(),
                });
            }
            return Ok(Selector::Prefix(prefix.to_string()));
        }

        if input.contains('*') {
            return Err(RuleError::InvalidSelector {
                selector: input.to_string(),
                detail: "'*' is only allowed at the end of a selector".to_string(),
            });
        }

        Ok(Selector::Exact(input.to_string()))
    }

    /// Whether the selector accepts the given qualified path.
    pub fn matches(&self, path: &str) -> bool {
        match self {
            Selector::Exact(exact) => exact == path,
            Selector::Prefix(prefix) => path.starts_with(prefix.as_str()),
            Selector::Pattern { regex, .. } => regex.is_match(path),
        }
    }

    /// Ordering key used when several rules match the same path.
    ///
    /// Prefix selectors are the least specific (longer prefixes beat shorter
    /// ones), regex selectors come next, exact selectors win.
    pub fn specificity(&self) -> Specificity {
        match self {
            Selector::Prefix(prefix) => Specificity {
                class: 0,
                length: prefix.len(),
            },
            Selector::Pattern { .. } => Specificity {
                class: 1,
                length: 0,
            },
            Selector::Exact(_) => Specificity {
                class: 2,
                length: 0,
            },
        }
    }
}

impl PartialEq for Selector {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}

impl Eq for Selector {}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Exact(exact) => write!(f, "{exact}"),
            Selector::Prefix(prefix) => write!(f, "{prefix}*"),
            Selector::Pattern { source, .. } => write!(f, "{REGEX_PREFIX}{source}"),
        }
    }
}
