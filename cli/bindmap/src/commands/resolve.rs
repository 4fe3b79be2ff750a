//! `bindmap resolve` — print the marshalling policy of every parameter.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use bindmap_ffi::{build, resolve_model, FunctionPolicy};

use crate::commands::report_diagnostics;
use crate::project::Inputs;

/// Output format of `bindmap resolve`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Text,
    Json,
}

impl Format {
    pub fn parse(s: Option<&str>) -> Result<Self> {
        match s {
            None | Some("text") => Ok(Format::Text),
            Some("json") => Ok(Format::Json),
            Some(other) => bail!("unknown format '{other}' (expected text or json)"),
        }
    }
}

/// Build the model, resolve every parameter and write the policies to
/// `output` (stdout when `None`).
pub fn run(inputs: &Inputs, format: Format, output: Option<&Path>) -> Result<()> {
    let out = build(&inputs.tree, &inputs.store, &inputs.options());
    report_diagnostics(&out.diagnostics);

    let policies = resolve_model(&out.model).context("resolving marshalling policies")?;
    let rendered = match format {
        Format::Text => render_text(&policies),
        Format::Json => {
            let mut json = serde_json::to_string_pretty(&policies)?;
            json.push('\n');
            json
        }
    };

    match output {
        Some(path) => {
            fs::write(path, &rendered).with_context(|| format!("writing {}", path.display()))?;
            println!(
                "Resolved {} functions → {}",
                policies.len(),
                path.display()
            );
        }
        None => print!("{rendered}"),
    }
    Ok(())
}

/// Human-readable listing, one block per function.
pub fn render_text(policies: &[FunctionPolicy]) -> String {
    let mut out = String::new();
    for function in policies {
        let _ = writeln!(out, "{} ({})", function.path, function.visibility);
        if function.parameters.is_empty() {
            let _ = writeln!(out, "  (no parameters)");
        }
        for param in &function.parameters {
            let pinned = if param.is_fixed { " fixed" } else { "" };
            let _ = writeln!(
                out,
                "  {:<32} {:<48} [{}{}]",
                param.declaration_text, param.call_expression, param.rule, pinned
            );
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use bindmap_ffi::{resolve_parameter, Direction, Parameter, TypeRef};
    use bindmap_rules::Visibility;

    #[test]
    fn parse_formats() {
        assert_eq!(Format::parse(None).unwrap(), Format::Text);
        assert_eq!(Format::parse(Some("json")).unwrap(), Format::Json);
        assert!(Format::parse(Some("yaml")).is_err());
    }

    #[test]
    fn text_lists_parameters() {
        let param = Parameter::new("pBox", Direction::RefIn, TypeRef::structure("Box", 8));
        let policies = vec![FunctionPolicy {
            path: "ns::Draw".into(),
            name: "Draw".into(),
            native_name: "Draw".into(),
            visibility: Visibility::Internal,
            check_return: true,
            parameters: vec![resolve_parameter(&param).unwrap()],
        }];
        let text = render_text(&policies);
        assert!(text.starts_with("ns::Draw (internal)\n"));
        assert!(text.contains("Box pBox"));
        assert!(text.contains("&pBox"));
        assert!(text.contains("[rule 7]"));
    }
}
