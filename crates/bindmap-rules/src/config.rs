//! Rule file (`bindmap.toml`) parsing.
//!
//! A rule file carries generator settings and an ordered list of
//! `[[rule]]` tables. Each rule has a `match` selector plus any subset of
//! the overlay keys; keys that are absent stay unset.
//!
//! ```toml
//! [generator]
//! word-bits = 64
//!
//! [[rule]]
//! match = "d3d11::D3D11_BLEND_DESC"
//! name = "BlendDescription"
//! native = true
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::error::{Result, RuleError};
use crate::overlay::{MappingName, Overlay};
use crate::selector::Selector;
use crate::store::{OverrideRule, RuleStore};

/// A complete rule file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuleFile {
    /// Generator-wide settings.
    #[serde(default)]
    pub generator: GeneratorConfig,
    /// Override rules, in registration order.
    #[serde(default, rename = "rule")]
    pub rules: Vec<RuleEntry>,
}

/// Generator-wide settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GeneratorConfig {
    /// Native pointer width in bits (32 or 64).
    #[serde(default = "default_word_bits")]
    pub word_bits: u8,
    /// Namespace prepended to paths when the tree does not carry one.
    #[serde(default)]
    pub namespace: Option<String>,
    /// Report rules that match nothing.
    #[serde(default = "default_true")]
    pub warn_unused_rules: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            word_bits: default_word_bits(),
            namespace: None,
            warn_unused_rules: true,
        }
    }
}

fn default_word_bits() -> u8 {
    64
}

fn default_true() -> bool {
    true
}

/// One `[[rule]]` table as written in the file.
#[derive(Debug, Clone, Deserialize)]
pub struct RuleEntry {
    #[serde(rename = "match")]
    pub selector: String,
    /// Final managed name.
    #[serde(default)]
    pub name: Option<String>,
    /// Provisional managed name, still subject to renaming.
    #[serde(default, rename = "name-tmp")]
    pub name_tmp: Option<String>,
    #[serde(flatten)]
    pub overlay: Overlay,
}

impl RuleEntry {
    /// Compile the entry into a rule.
    pub fn compile(&self) -> Result<OverrideRule> {
        let selector = Selector::parse(&self.selector)?;
        let mut overlay = self.overlay.clone();
        overlay.name = match (&self.name, &self.name_tmp) {
            (Some(_), Some(_)) => {
                return Err(RuleError::InvalidRule {
                    selector: self.selector.clone(),
                    detail: "'name' and 'name-tmp' are mutually exclusive".to_string(),
                })
            }
            (Some(name), None) => Some(MappingName::final_name(name.as_str())),
            (None, Some(name)) => Some(MappingName::provisional(name.as_str())),
            (None, None) => None,
        };
        if overlay.array == Some(0) {
            return Err(RuleError::InvalidRule {
                selector: self.selector.clone(),
                detail: "'array' dimension must be at least 1".to_string(),
            });
        }
        Ok(OverrideRule::new(selector, overlay))
    }
}

impl RuleFile {
    /// Parse a rule file from a TOML string.
    pub fn parse(input: &str) -> Result<Self> {
        let file: RuleFile = toml::from_str(input)?;

        if !matches!(file.generator.word_bits, 32 | 64) {
            return Err(RuleError::InvalidConfig {
                detail: format!(
                    "generator.word-bits must be 32 or 64, got {}",
                    file.generator.word_bits
                ),
            });
        }

        Ok(file)
    }

    /// Parse a rule file from a path.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(RuleError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Compile every entry, in file order, into a store.
    pub fn to_store(&self) -> Result<RuleStore> {
        let mut store = RuleStore::new();
        for entry in &self.rules {
            store.push(entry.compile()?);
        }
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::{ParamAttribute, Visibility};

    #[test]
    fn parse_full_rule_file() {
        let toml = r#"
[generator]
word-bits = 32
namespace = "d3d11"

[[rule]]
match = "d3d11::D3D11_BLEND_DESC"
name = "BlendDescription"
native = true
visibility = "internal"

[[rule]]
match = "d3d11::ID3D11DeviceContext::*"
check = false

[[rule]]
match = "d3d11::ID3D11Device::GetDesc::pDesc"
attribute = "OUT"
return = true

[[rule]]
match = "re:d3d11::.*::ppClassInstances"
attribute = "IN | BUFFER | OPTIONAL"
type = "ClassInstance"
array = 2
"#;
        let file = RuleFile::parse(toml).unwrap();
        assert_eq!(file.generator.word_bits, 32);
        assert_eq!(file.generator.namespace.as_deref(), Some("d3d11"));
        assert_eq!(file.rules.len(), 4);

        let store = file.to_store().unwrap();
        assert_eq!(store.len(), 4);

        let blend = store.resolve("d3d11::D3D11_BLEND_DESC").overlay;
        assert_eq!(blend.name, Some(MappingName::final_name("BlendDescription")));
        assert_eq!(blend.native, Some(true));
        assert_eq!(blend.visibility, Some(Visibility::Internal));

        let out = store.resolve("d3d11::ID3D11Device::GetDesc::pDesc").overlay;
        assert_eq!(out.attribute, Some(ParamAttribute::OUT));
        assert_eq!(out.used_as_return, Some(true));

        let arr = store
            .resolve("d3d11::ID3D11DeviceContext::VSSetShader::ppClassInstances")
            .overlay;
        assert_eq!(
            arr.attribute,
            Some(ParamAttribute::IN | ParamAttribute::BUFFER | ParamAttribute::OPTIONAL)
        );
        assert_eq!(arr.mapping_type.as_deref(), Some("ClassInstance"));
        assert_eq!(arr.array, Some(2));
        assert_eq!(arr.check, Some(false));
    }

    #[test]
    fn absent_keys_stay_unset() {
        let toml = r#"
[[rule]]
match = "ns::Foo"
flags = false
"#;
        let store = RuleFile::parse(toml).unwrap().to_store().unwrap();
        let overlay = store.resolve("ns::Foo").overlay;
        assert_eq!(overlay.flags, Some(false));
        assert_eq!(overlay.none, None);
        assert_eq!(overlay.visibility, None);
        assert_eq!(overlay.name, None);
    }

    #[test]
    fn provisional_name() {
        let toml = r#"
[[rule]]
match = "ns::D3D11_MAP"
name-tmp = "MAP_MODE"
"#;
        let store = RuleFile::parse(toml).unwrap().to_store().unwrap();
        assert_eq!(
            store.resolve("ns::D3D11_MAP").overlay.name,
            Some(MappingName::provisional("MAP_MODE"))
        );
    }

    #[test]
    fn defaults_without_generator_section() {
        let file = RuleFile::parse("").unwrap();
        assert_eq!(file.generator.word_bits, 64);
        assert!(file.generator.warn_unused_rules);
        assert!(file.rules.is_empty());
    }

    #[test]
    fn reject_conflicting_names() {
        let toml = r#"
[[rule]]
match = "ns::Foo"
name = "Foo"
name-tmp = "FOO"
"#;
        let err = RuleFile::parse(toml).unwrap().to_store().unwrap_err();
        assert!(err.to_string().contains("mutually exclusive"));
    }

    #[test]
    fn reject_invalid_selector() {
        let toml = r#"
[[rule]]
match = "re:[unclosed"
"#;
        assert!(matches!(
            RuleFile::parse(toml).unwrap().to_store(),
            Err(RuleError::InvalidSelector { .. })
        ));
    }

    #[test]
    fn reject_bad_word_bits() {
        let toml = r#"
[generator]
word-bits = 16
"#;
        assert!(matches!(
            RuleFile::parse(toml),
            Err(RuleError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn reject_zero_array() {
        let toml = r#"
[[rule]]
match = "ns::f::p"
array = 0
"#;
        assert!(RuleFile::parse(toml).unwrap().to_store().is_err());
    }

    #[test]
    fn missing_file() {
        let err = RuleFile::load(Path::new("/nonexistent/bindmap.toml")).unwrap_err();
        assert!(matches!(err, RuleError::NotFound { .. }));
    }
}
