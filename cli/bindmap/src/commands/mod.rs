//! CLI command implementations.

pub mod check;
pub mod init;
pub mod resolve;

use bindmap_ffi::Diagnostic;

/// Print build diagnostics to stderr.
pub(crate) fn report_diagnostics(diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        eprintln!("{diagnostic}");
    }
}
