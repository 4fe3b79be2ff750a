//! bindmap CLI — marshalling policies for native binding generation.

mod commands;
mod project;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use commands::resolve::Format;
use project::Inputs;

#[derive(Parser)]
#[command(name = "bindmap", version, about = "Native parameter marshalling policies")]
struct Cli {
    /// Log resolution steps (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the marshalling policy of every parameter
    Resolve {
        /// Declaration tree (JSON) produced by the header front end
        #[arg(long)]
        tree: PathBuf,
        /// Rule file (default: nearest bindmap.toml)
        #[arg(long)]
        rules: Option<PathBuf>,
        /// Output format (text, json)
        #[arg(long)]
        format: Option<String>,
        /// Write to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Validate rules against a declaration tree
    Check {
        /// Declaration tree (JSON) produced by the header front end
        #[arg(long)]
        tree: PathBuf,
        /// Rule file (default: nearest bindmap.toml)
        #[arg(long)]
        rules: Option<PathBuf>,
        /// Fail when any warning is reported
        #[arg(long)]
        deny_warnings: bool,
    },
    /// Write a starter bindmap.toml in the current directory
    Init {
        /// Namespace the rules apply to
        namespace: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "error" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = run(cli);
    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;

    match cli.command {
        Commands::Resolve {
            tree,
            rules,
            format,
            output,
        } => {
            let format = Format::parse(format.as_deref())?;
            let inputs = Inputs::load(&cwd, &tree, rules.as_deref())?;
            commands::resolve::run(&inputs, format, output.as_deref())
        }

        Commands::Check {
            tree,
            rules,
            deny_warnings,
        } => {
            let inputs = Inputs::load(&cwd, &tree, rules.as_deref())?;
            commands::check::run(&inputs, deny_warnings)
        }

        Commands::Init { namespace } => commands::init::run(&cwd, &namespace),
    }
}

#[cfg(test)]
mod integration_tests {
    use super::*;

    const TREE: &str = r#"{
  "namespace": "dxgi",
  "nodes": [
    { "kind": "struct", "name": "DXGI_RATIONAL", "size": 8 },
    { "kind": "interface", "name": "IDXGIOutput",
      "children": [
        { "kind": "function", "name": "FindClosestMatchingMode", "type": "HRESULT",
          "children": [
            { "kind": "parameter", "name": "pRate", "type": "DXGI_RATIONAL", "pointer": "*", "const": true, "attribute": "IN" },
            { "kind": "parameter", "name": "pCount", "type": "UINT", "pointer": "*", "attribute": "OUT" },
            { "kind": "parameter", "name": "hWnd", "type": "HWND" }
          ] }
      ] }
  ]
}"#;

    const RULES: &str = r#"
[generator]
namespace = "dxgi"

[[rule]]
match = "dxgi::DXGI_RATIONAL"
name = "Rational"
"#;

    fn write_inputs(dir: &std::path::Path, rules: &str) -> PathBuf {
        let tree = dir.join("dxgi.json");
        std::fs::write(&tree, TREE).unwrap();
        std::fs::write(dir.join(project::RULES_FILE), rules).unwrap();
        tree
    }

    /// resolve → JSON file with one policy per parameter.
    #[test]
    fn resolve_writes_json() {
        let dir = tempfile::tempdir().unwrap();
        let tree = write_inputs(dir.path(), RULES);
        let output = dir.path().join("policies.json");

        let inputs = Inputs::load(dir.path(), &tree, None).unwrap();
        commands::resolve::run(&inputs, Format::Json, Some(&output)).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        let params = json[0]["parameters"].as_array().unwrap();
        assert_eq!(params.len(), 3);
        assert_eq!(params[0]["declaration_text"], "Rational pRate");
        assert_eq!(params[0]["call_expression"], "&pRate");
        assert_eq!(params[1]["call_expression"], "pCount_");
        assert_eq!(params[2]["call_expression"], "(void*)hWnd");
    }

    /// resolve → text on stdout.
    #[test]
    fn resolve_text_to_stdout() {
        let dir = tempfile::tempdir().unwrap();
        let tree = write_inputs(dir.path(), RULES);
        let inputs = Inputs::load(dir.path(), &tree, None).unwrap();
        commands::resolve::run(&inputs, Format::Text, None).unwrap();
    }

    /// check passes on a clean rule set and fails with --deny-warnings on a
    /// rule that matches nothing.
    #[test]
    fn check_reports_unused_rules() {
        let dir = tempfile::tempdir().unwrap();
        let tree = write_inputs(dir.path(), RULES);
        let inputs = Inputs::load(dir.path(), &tree, None).unwrap();
        commands::check::run(&inputs, true).unwrap();

        let stale =
            format!("{RULES}\n[[rule]]\nmatch = \"dxgi::IDXGIOutput::Gone\"\ncheck = false\n");
        let tree = write_inputs(dir.path(), &stale);
        let inputs = Inputs::load(dir.path(), &tree, None).unwrap();
        commands::check::run(&inputs, false).unwrap();
        let err = commands::check::run(&inputs, true).unwrap_err();
        assert!(err.to_string().contains("1 warnings"));
    }

    /// A method-wide prefix rule also covers parameters without tripping
    /// --deny-warnings.
    #[test]
    fn check_accepts_method_wide_prefix_rule() {
        let dir = tempfile::tempdir().unwrap();
        let rules = format!("{RULES}\n[[rule]]\nmatch = \"dxgi::IDXGIOutput::*\"\ncheck = false\n");
        let tree = write_inputs(dir.path(), &rules);
        let inputs = Inputs::load(dir.path(), &tree, None).unwrap();
        commands::check::run(&inputs, true).unwrap();
    }

    /// Explicit --rules path wins over the discovered file.
    #[test]
    fn explicit_rules_path() {
        let dir = tempfile::tempdir().unwrap();
        let tree = write_inputs(dir.path(), RULES);
        let other = dir.path().join("other.toml");
        std::fs::write(&other, "[generator]\nword-bits = 16\n").unwrap();

        let err = Inputs::load(dir.path(), &tree, Some(&other)).unwrap_err();
        assert!(format!("{err:#}").contains("word-bits"));
    }

    /// Invalid regex selectors are reported at load time.
    #[test]
    fn invalid_selector_fails_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let tree = write_inputs(
            dir.path(),
            "[[rule]]\nmatch = \"re:(\"\nvisibility = \"private\"\n",
        );
        assert!(Inputs::load(dir.path(), &tree, None).is_err());
    }

    #[test]
    fn cli_parses_resolve() {
        let cli = Cli::try_parse_from([
            "bindmap", "-v", "resolve", "--tree", "t.json", "--format", "json",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Resolve { tree, format, rules, .. } => {
                assert_eq!(tree, PathBuf::from("t.json"));
                assert_eq!(format.as_deref(), Some("json"));
                assert!(rules.is_none());
            }
            _ => panic!("expected resolve"),
        }
    }
}
