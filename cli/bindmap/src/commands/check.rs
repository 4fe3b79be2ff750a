//! `bindmap check` — validate rules against a declaration tree.

use anyhow::{bail, Context, Result};
use bindmap_ffi::{build, resolve_model};

use crate::commands::report_diagnostics;
use crate::project::Inputs;

/// Build and resolve without writing anything.
///
/// Fails on classification ambiguities, and on any warning when
/// `deny_warnings` is set.
pub fn run(inputs: &Inputs, deny_warnings: bool) -> Result<()> {
    let out = build(&inputs.tree, &inputs.store, &inputs.options());
    report_diagnostics(&out.diagnostics);

    let policies = resolve_model(&out.model).context("resolving marshalling policies")?;
    let parameters: usize = policies.iter().map(|f| f.parameters.len()).sum();

    println!(
        "{} declarations, {} functions, {} parameters, {} warnings",
        out.model.declarations.len(),
        policies.len(),
        parameters,
        out.diagnostics.len()
    );

    if deny_warnings && !out.diagnostics.is_empty() {
        bail!("{} warnings (denied)", out.diagnostics.len());
    }
    Ok(())
}
