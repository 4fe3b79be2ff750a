//! The rule store and overlay resolution.
//!
//! Rules are registered once, then the store is only read. Resolving a path
//! folds every matching rule into a single [`Overlay`], least specific first,
//! so more specific rules win per field. Among rules of equal specificity the
//! one registered last wins.

use std::collections::HashSet;
use std::fmt;

use tracing::debug;

use crate::overlay::Overlay;
use crate::selector::Selector;

/// Registration index of a rule inside a [`RuleStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleId(pub usize);

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rule#{}", self.0)
    }
}

/// A selector paired with the overrides it applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideRule {
    pub selector: Selector,
    pub overlay: Overlay,
}

impl OverrideRule {
    pub fn new(selector: Selector, overlay: Overlay) -> Self {
        Self { selector, overlay }
    }
}

/// The merged result of every rule matching one path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub overlay: Overlay,
    /// Matched rules, in the order they were folded.
    pub matched: Vec<RuleId>,
}

/// Ordered, read-only collection of override rules.
#[derive(Debug, Clone, Default)]
pub struct RuleStore {
    rules: Vec<OverrideRule>,
}

impl RuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rule. Later registrations win over earlier ones of equal
    /// specificity.
    pub fn push(&mut self, rule: OverrideRule) -> RuleId {
        self.rules.push(rule);
        RuleId(self.rules.len() - 1)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn get(&self, id: RuleId) -> Option<&OverrideRule> {
        self.rules.get(id.0)
    }

    /// Iterate rules in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (RuleId, &OverrideRule)> {
        self.rules.iter().enumerate().map(|(i, r)| (RuleId(i), r))
    }

    /// Fold every rule matching `path` into one overlay.
    pub fn resolve(&self, path: &str) -> Resolution {
        let mut matched: Vec<(RuleId, &OverrideRule)> = self
            .iter()
            .filter(|(_, rule)| rule.selector.matches(path))
            .collect();

        // Stable sort keeps registration order within one specificity.
        matched.sort_by_key(|(_, rule)| rule.selector.specificity());

        let mut resolution = Resolution::default();
        for (id, rule) in matched {
            debug!(%path, rule = %id, selector = %rule.selector, "applying override rule");
            resolution.overlay.merge(&rule.overlay);
            resolution.matched.push(id);
        }
        resolution
    }

    /// Rules whose id does not appear in `hits`.
    pub fn unused<'a>(&'a self, hits: &HashSet<RuleId>) -> Vec<(RuleId, &'a OverrideRule)> {
        self.iter().filter(|(id, _)| !hits.contains(id)).collect()
    }
}

impl FromIterator<OverrideRule> for RuleStore {
    fn from_iter<I: IntoIterator<Item = OverrideRule>>(iter: I) -> Self {
        Self {
            rules: iter.into_iter().collect(),
        }
    }
}
