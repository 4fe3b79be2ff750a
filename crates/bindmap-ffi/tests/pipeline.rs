//! Declaration tree plus rule file, all the way to call-site policies.

use bindmap_ffi::{
    build, resolve_model, BuildOptions, CallSiteRule, DeclTree, DiagnosticKind, FunctionPolicy,
    MarshallingPolicy,
};
use bindmap_rules::RuleFile;

const TREE: &str = r#"{
  "namespace": "d3d11",
  "nodes": [
    { "kind": "struct", "name": "D3D11_BOX", "size": 8,
      "children": [
        { "kind": "field", "name": "left", "type": "UINT" },
        { "kind": "field", "name": "right", "type": "UINT" }
      ] },
    { "kind": "struct", "name": "D3D11_BLEND_DESC", "size": 8,
      "children": [ { "kind": "field", "name": "AlphaToCoverageEnable", "type": "BOOL" } ] },
    { "kind": "struct", "name": "D3D11_VIEWPORT", "size": 24 },
    { "kind": "enum", "name": "D3D11_MAP", "size": 4,
      "children": [ { "kind": "item", "name": "D3D11_MAP_READ", "value": "1" } ] },
    { "kind": "typedef", "name": "D3D11_RECT", "type": "RECT" },
    { "kind": "interface", "name": "ID3D11DeviceContext",
      "location": { "file": "d3d11.h", "line": 4120, "column": 1 },
      "children": [
        { "kind": "function", "name": "UpdateSubresource", "type": "void",
          "children": [
            { "kind": "parameter", "name": "pDstBox", "type": "D3D11_BOX", "pointer": "*", "const": true, "attribute": "IN" },
            { "kind": "parameter", "name": "pSrcData", "type": "void", "pointer": "*", "const": true, "attribute": "IN" }
          ] },
        { "kind": "function", "name": "GetBlendStates", "type": "void",
          "children": [
            { "kind": "parameter", "name": "NumStates", "type": "UINT" },
            { "kind": "parameter", "name": "pDescs", "type": "D3D11_BLEND_DESC", "pointer": "*", "attribute": "OUT | BUFFER" }
          ] },
        { "kind": "function", "name": "Map", "type": "HRESULT",
          "children": [
            { "kind": "parameter", "name": "pMapType", "type": "D3D11_MAP", "pointer": "*", "const": true, "attribute": "IN | OPTIONAL" },
            { "kind": "parameter", "name": "Enable", "type": "BOOL" },
            { "kind": "parameter", "name": "pViewport", "type": "D3D11_VIEWPORT", "pointer": "*", "attribute": "IN" },
            { "kind": "parameter", "name": "pCount", "type": "UINT", "pointer": "*", "attribute": "OUT" }
          ] }
      ] }
  ]
}"#;

const RULES: &str = r#"
[generator]
word-bits = 64

[[rule]]
match = "d3d11::D3D11_BLEND_DESC"
name = "BlendDescription"
native = true

[[rule]]
match = "d3d11::ID3D11DeviceContext::Map::Enable"
type = "bool"

[[rule]]
match = "d3d11::ID3D11DeviceContext::Map::pCount"
return = true

[[rule]]
match = "d3d11::ID3D11DeviceContext::*"
visibility = "internal"

[[rule]]
match = "d3d11::D3D11_MAP"
callback = true

[[rule]]
match = "d3d11::ID3D11DeviceContext::Unmap"
check = false
"#;

fn run() -> (Vec<FunctionPolicy>, bindmap_ffi::BuildOutput) {
    let tree = DeclTree::parse(TREE).unwrap();
    let rules = RuleFile::parse(RULES).unwrap();
    let store = rules.to_store().unwrap();
    let out = build(&tree, &store, &BuildOptions::from(&rules.generator));
    let policies = resolve_model(&out.model).unwrap();
    (policies, out)
}

fn policy<'a>(policies: &'a [FunctionPolicy], param: &str) -> &'a MarshallingPolicy {
    policies
        .iter()
        .flat_map(|f| f.parameters.iter())
        .find(|p| p.parameter == param)
        .unwrap_or_else(|| panic!("no policy for {param}"))
}

#[test]
fn resolves_every_method() {
    let (policies, _) = run();
    let paths: Vec<_> = policies.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(
        paths,
        vec![
            "d3d11::ID3D11DeviceContext::UpdateSubresource",
            "d3d11::ID3D11DeviceContext::GetBlendStates",
            "d3d11::ID3D11DeviceContext::Map",
        ]
    );
    assert!(policies
        .iter()
        .all(|f| f.visibility == bindmap_rules::Visibility::Internal));
}

#[test]
fn small_ref_in_struct_passes_address_of_parameter() {
    let (policies, _) = run();
    let p = policy(&policies, "d3d11::ID3D11DeviceContext::UpdateSubresource::pDstBox");
    assert_eq!(p.rule, CallSiteRule::SmallRefIn);
    assert_eq!(p.call_expression, "&pDstBox");
    assert_eq!(p.declaration_text, "D3d11Box pDstBox");
    assert!(!p.is_fixed);

    let data = policy(&policies, "d3d11::ID3D11DeviceContext::UpdateSubresource::pSrcData");
    assert_eq!(data.rule, CallSiteRule::Handle);
    assert_eq!(data.call_expression, "(void*)pSrcData");
}

#[test]
fn out_array_of_native_struct_uses_temp_buffer() {
    let (policies, _) = run();
    let p = policy(&policies, "d3d11::ID3D11DeviceContext::GetBlendStates::pDescs");
    assert_eq!(p.rule_number, 2);
    assert_eq!(p.call_expression, "pDescs_");
    assert_eq!(p.declaration_text, "BlendDescription[] pDescs");
    assert!(p.is_fixed);
}

#[test]
fn optional_enum_and_bool_coercion() {
    let (policies, _) = run();
    let mode = policy(&policies, "d3d11::ID3D11DeviceContext::Map::pMapType");
    assert_eq!(mode.rule_number, 6);
    assert_eq!(
        mode.call_expression,
        "(pMapType.HasValue)?&pMapType_:(void*)IntPtr.Zero"
    );
    assert_eq!(mode.declaration_text, "D3d11Map? pMapType");

    let enable = policy(&policies, "d3d11::ID3D11DeviceContext::Map::Enable");
    assert_eq!(enable.rule, CallSiteRule::BoolToInt);
    assert_eq!(enable.call_expression, "(Enable?1:0)");
    assert_eq!(enable.declaration_text, "bool Enable");
    assert!(!enable.is_fixed);
}

#[test]
fn large_struct_and_return_slot_are_pinned() {
    let (policies, _) = run();
    let vp = policy(&policies, "d3d11::ID3D11DeviceContext::Map::pViewport");
    assert_eq!(vp.rule, CallSiteRule::Fixed);
    assert_eq!(vp.declaration_text, "ref D3d11Viewport pViewport");

    let count = policy(&policies, "d3d11::ID3D11DeviceContext::Map::pCount");
    assert_eq!(count.rule, CallSiteRule::OutFixed);
    assert_eq!(count.call_expression, "&pCount");
    assert_eq!(count.declaration_text, "out uint pCount");
}

#[test]
fn configuration_problems_are_warnings() {
    let (_, out) = run();

    let errors: Vec<_> = out
        .diagnostics_of(DiagnosticKind::ConfigurationError)
        .collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].path, "d3d11::D3D11_MAP");

    let misses: Vec<_> = out.diagnostics_of(DiagnosticKind::SelectorMiss).collect();
    assert_eq!(misses.len(), 1);
    assert_eq!(misses[0].path, "d3d11::ID3D11DeviceContext::Unmap");

    // The enum is still built from defaults.
    let map = out.model.get("d3d11::D3D11_MAP").unwrap();
    assert_eq!(map.as_enum().unwrap().items[0].name, "Read");
}

#[test]
fn policies_serialize_to_json() {
    let (policies, _) = run();
    let json = serde_json::to_string(&policies).unwrap();
    assert!(json.contains("\"call_expression\":\"&pDstBox\""));
    assert!(json.contains("\"rule\":\"small-ref-in\""));
}
