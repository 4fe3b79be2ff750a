//! Native parameter marshalling policy engine for the bindmap binding
//! generator.
//!
//! Builds a declaration model from the header front end's declaration tree
//! and the user's override rules, then decides for every function parameter
//! how its value crosses the native call boundary.
//!
//! ## Modules
//!
//! - [`tree`] — Declaration tree (JSON) ingestion
//! - [`ctype`] — Native primitive type names
//! - [`marshal`] — Primitive to public type mapping
//! - [`direction`] — Parameter directions and their inference
//! - [`naming`] — Managed naming convention
//! - [`model`] — The declaration model
//! - [`builder`] — Two-pass model builder applying override rules
//! - [`diagnostics`] — Recoverable build warnings
//! - [`classify`] — Parameter classification flags
//! - [`policy`] — Declaration fragments and first-match call-site table

pub mod builder;
pub mod classify;
pub mod ctype;
pub mod diagnostics;
pub mod direction;
pub mod error;
pub mod marshal;
pub mod model;
pub mod naming;
pub mod policy;
pub mod tree;

// Re-export key types for convenience
pub use builder::{build, BuildOptions, BuildOutput};
pub use classify::{classify, Classification};
pub use diagnostics::{Diagnostic, DiagnosticKind};
pub use direction::Direction;
pub use error::FfiError;
pub use model::{Declaration, DeclarationModel, Parameter, TypeCategory, TypeRef};
pub use policy::{
    resolve_call_site, resolve_declaration, resolve_model, resolve_parameter, CallSite,
    CallSiteRule, FunctionPolicy, MarshallingPolicy, ParamDecl,
};
pub use tree::DeclTree;
