//! Override rules for the bindmap binding generator.
//!
//! Users attach sparse override rules to native declarations by qualified
//! name. The store folds every rule matching a declaration into a single
//! overlay that the model builder applies on top of inferred defaults.
//!
//! ## Modules
//!
//! - [`selector`] — Exact, prefix and regex path selectors
//! - [`overlay`] — Sparse `Option` field records and their merge
//! - [`store`] — Ordered rule store and per-path resolution
//! - [`config`] — `bindmap.toml` rule file parsing

pub mod config;
pub mod error;
pub mod overlay;
pub mod selector;
pub mod store;

// Re-export key types for convenience
pub use config::{GeneratorConfig, RuleFile};
pub use error::RuleError;
pub use overlay::{MappingName, Overlay, ParamAttribute, Visibility};
pub use selector::{Selector, PATH_SEPARATOR};
pub use store::{OverrideRule, Resolution, RuleId, RuleStore};
