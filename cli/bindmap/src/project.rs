//! Locating and loading the rule file and declaration tree.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bindmap_ffi::{BuildOptions, DeclTree};
use bindmap_rules::{RuleFile, RuleStore};

/// Rule file name searched for when `--rules` is not given.
pub const RULES_FILE: &str = "bindmap.toml";

/// Everything one generation run reads from disk.
#[derive(Debug)]
pub struct Inputs {
    pub tree: DeclTree,
    pub rules: RuleFile,
    pub store: RuleStore,
}

impl Inputs {
    /// Load the declaration tree and the rule file.
    ///
    /// Without an explicit rule path, `bindmap.toml` is searched from
    /// `start_dir` upward; a project without one runs with no rules.
    pub fn load(start_dir: &Path, tree_path: &Path, rules_path: Option<&Path>) -> Result<Self> {
        let tree = DeclTree::load(tree_path)
            .with_context(|| format!("loading declaration tree {}", tree_path.display()))?;

        let rules_path = match rules_path {
            Some(path) => Some(path.to_path_buf()),
            None => find_rules(start_dir),
        };
        let rules = match &rules_path {
            Some(path) => RuleFile::load(path)
                .with_context(|| format!("loading rules {}", path.display()))?,
            None => RuleFile::default(),
        };
        let store = rules
            .to_store()
            .with_context(|| "compiling override rules")?;

        tracing::debug!(
            rules = store.len(),
            nodes = tree.nodes.len(),
            "loaded inputs"
        );
        Ok(Self { tree, rules, store })
    }

    /// Build options from the rule file's `[generator]` table.
    pub fn options(&self) -> BuildOptions {
        BuildOptions::from(&self.rules.generator)
    }
}

/// Search upward from `start_dir` for a `bindmap.toml`.
pub fn find_rules(start_dir: &Path) -> Option<PathBuf> {
    let mut dir = start_dir.to_path_buf();
    loop {
        let candidate = dir.join(RULES_FILE);
        if candidate.is_file() {
            return Some(candidate);
        }
        if !dir.pop() {
            return None;
        }
    }
}

/// Starter rule file written by `bindmap init`.
pub fn template(namespace: &str) -> String {
    format!(
        r#"[generator]
namespace = "{namespace}"
word-bits = 64
warn-unused-rules = true

# Rules are applied least specific first: prefix selectors, then re:
# patterns, then exact paths. Later rules win among equals.
#
# [[rule]]
# match = "{namespace}::SOME_STRUCT"
# name = "SomeStruct"
# native = true
"#
    )
}
