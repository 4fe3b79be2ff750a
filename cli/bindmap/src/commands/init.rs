//! `bindmap init` — write a starter rule file.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::project::{template, RULES_FILE};

/// Create `bindmap.toml` in `dir`.
pub fn run(dir: &Path, namespace: &str) -> Result<()> {
    let path = dir.join(RULES_FILE);
    if path.exists() {
        bail!("'{}' already exists", path.display());
    }
    fs::write(&path, template(namespace)).with_context(|| format!("writing {}", path.display()))?;
    println!("Created {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_writes_rule_file() {
        let dir = tempfile::tempdir().unwrap();
        run(dir.path(), "dxgi").unwrap();
        let content = fs::read_to_string(dir.path().join(RULES_FILE)).unwrap();
        assert!(content.contains("namespace = \"dxgi\""));
    }

    #[test]
    fn init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(RULES_FILE), "").unwrap();
        assert!(run(dir.path(), "dxgi").is_err());
    }
}
