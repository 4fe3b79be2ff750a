//! Managed naming convention.
//!
//! Native `UPPER_SNAKE` names become `PascalCase`; mixed-case names only get
//! their first letter raised. Final names from rules bypass this entirely.

use bindmap_rules::MappingName;

/// Convert a native name to its managed form.
pub fn managed_name(native: &str, keep_underscore: bool) -> String {
    let is_snake = native.contains('_') || native.chars().all(|c| !c.is_lowercase());
    if !is_snake {
        return capitalize(native);
    }

    let parts = native
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        });

    let separator = if keep_underscore { "_" } else { "" };
    parts.collect::<Vec<_>>().join(separator)
}

/// Resolve the managed name of a type-level declaration.
pub fn resolve_name(native: &str, rule: Option<&MappingName>, keep_underscore: bool) -> String {
    match rule {
        Some(name) if name.is_final => name.value.clone(),
        Some(name) => managed_name(&name.value, keep_underscore),
        None => managed_name(native, keep_underscore),
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snake_to_pascal() {
        assert_eq!(managed_name("D3D11_BLEND_DESC", false), "D3d11BlendDesc");
        assert_eq!(managed_name("MAP_MODE", false), "MapMode");
        assert_eq!(managed_name("MAP_MODE", true), "Map_Mode");
        assert_eq!(managed_name("_LEADING__DOUBLE_", false), "LeadingDouble");
    }

    #[test]
    fn mixed_case_kept() {
        assert_eq!(managed_name("ID3D11Device", false), "ID3D11Device");
        assert_eq!(managed_name("left", false), "Left");
        assert_eq!(managed_name("AlphaToCoverageEnable", false), "AlphaToCoverageEnable");
    }

    #[test]
    fn all_caps_without_underscore() {
        assert_eq!(managed_name("RECT", false), "Rect");
    }

    #[test]
    fn rule_names() {
        let fin = MappingName::final_name("BLEND_Desc");
        let tmp = MappingName::provisional("BLEND_DESCRIPTION");
        assert_eq!(resolve_name("X", Some(&fin), false), "BLEND_Desc");
        assert_eq!(resolve_name("X", Some(&tmp), false), "BlendDescription");
        assert_eq!(resolve_name("D3D11_BOX", None, false), "D3d11Box");
    }
}
