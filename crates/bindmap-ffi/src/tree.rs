//! Declaration tree ingestion.
//!
//! The header front end hands over a JSON tree of native declarations. Type
//! references are plain names resolved later by the model builder. Node
//! kinds this crate does not know (`typedef`, `variable`, `namespace`...)
//! decode as [`NodeKind::Unknown`] and are skipped.

use std::fmt;

use serde::{Deserialize, Serialize};

use bindmap_rules::ParamAttribute;

use crate::error::Result;

/// A complete declaration tree for one generation run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeclTree {
    /// Namespace every top-level path is rooted in.
    #[serde(default)]
    pub namespace: Option<String>,
    /// Top-level declarations.
    #[serde(default)]
    pub nodes: Vec<TreeNode>,
}

/// Kind tag of a tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Enum,
    /// An enumerator inside an enum.
    Item,
    Struct,
    Field,
    Interface,
    /// A free function, or a method when nested in an interface.
    Function,
    Parameter,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NodeKind::Enum => "enum",
            NodeKind::Item => "item",
            NodeKind::Struct => "struct",
            NodeKind::Field => "field",
            NodeKind::Interface => "interface",
            NodeKind::Function => "function",
            NodeKind::Parameter => "parameter",
            NodeKind::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

/// Where a declaration was found in the native headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: String,
    pub line: u32,
    #[serde(default)]
    pub column: u32,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// One node of the declaration tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeNode {
    pub kind: NodeKind,
    /// Native (unqualified) name. Parameters may be unnamed.
    #[serde(default)]
    pub name: String,
    /// Referenced type: field/parameter type, function return type.
    #[serde(default, rename = "type")]
    pub type_name: Option<String>,
    /// Pointer annotation (`*`, `**`, `&`).
    #[serde(default)]
    pub pointer: Option<String>,
    #[serde(default, rename = "const")]
    pub is_const: bool,
    /// Fixed array dimension.
    #[serde(default)]
    pub array: Option<u32>,
    /// Size in bytes of structs and enums.
    #[serde(default)]
    pub size: Option<u32>,
    /// Parameter annotations.
    #[serde(default)]
    pub attribute: Option<ParamAttribute>,
    /// Enumerator value, as written in the header.
    #[serde(default)]
    pub value: Option<String>,
    /// Base interface name.
    #[serde(default)]
    pub base: Option<String>,
    #[serde(default)]
    pub location: Option<SourceLocation>,
    #[serde(default)]
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    /// Create an empty node of the given kind.
    pub fn new(kind: NodeKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            type_name: None,
            pointer: None,
            is_const: false,
            array: None,
            size: None,
            attribute: None,
            value: None,
            base: None,
            location: None,
            children: Vec::new(),
        }
    }

    /// Number of pointer levels in the node's pointer annotation.
    pub fn pointer_depth(&self) -> u8 {
        pointer_depth(self.pointer.as_deref())
    }

    /// Children of the given kind.
    pub fn children_of(&self, kind: NodeKind) -> impl Iterator<Item = &TreeNode> {
        self.children.iter().filter(move |c| c.kind == kind)
    }
}

/// Count the `*` and `&` levels of a pointer annotation.
pub fn pointer_depth(pointer: Option<&str>) -> u8 {
    pointer
        .map(|p| p.chars().filter(|c| matches!(c, '*' | '&')).count())
        .unwrap_or(0)
        .min(u8::MAX as usize) as u8
}

impl DeclTree {
    /// Parse a declaration tree from a JSON string.
    pub fn parse(input: &str) -> Result<Self> {
        let tree: DeclTree = serde_json::from_str(input)?;
        Ok(tree)
    }

    /// Parse a declaration tree from a file path.
    pub fn load(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Top-level nodes of the given kind.
    pub fn nodes_of(&self, kind: NodeKind) -> impl Iterator<Item = &TreeNode> {
        self.nodes.iter().filter(move |n| n.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_interface_tree() {
        let json = r#"{
  "namespace": "d3d11",
  "nodes": [
    {
      "kind": "interface",
      "name": "ID3D11DeviceContext",
      "base": "ID3D11DeviceChild",
      "location": { "file": "d3d11.h", "line": 120, "column": 5 },
      "children": [
        {
          "kind": "function",
          "name": "Map",
          "type": "HRESULT",
          "children": [
            { "kind": "parameter", "name": "pResource", "type": "ID3D11Resource", "pointer": "*", "attribute": "IN" },
            { "kind": "parameter", "name": "pMapped", "type": "D3D11_MAPPED_SUBRESOURCE", "pointer": "*", "attribute": "OUT | OPTIONAL" }
          ]
        }
      ]
    }
  ]
}"#;
        let tree = DeclTree::parse(json).unwrap();
        assert_eq!(tree.namespace.as_deref(), Some("d3d11"));
        let iface = &tree.nodes[0];
        assert_eq!(iface.kind, NodeKind::Interface);
        assert_eq!(iface.base.as_deref(), Some("ID3D11DeviceChild"));
        assert_eq!(iface.location.as_ref().unwrap().to_string(), "d3d11.h:120:5");

        let map = &iface.children[0];
        assert_eq!(map.type_name.as_deref(), Some("HRESULT"));
        let params: Vec<_> = map.children_of(NodeKind::Parameter).collect();
        assert_eq!(params.len(), 2);
        assert_eq!(params[0].attribute, Some(ParamAttribute::IN));
        assert_eq!(
            params[1].attribute,
            Some(ParamAttribute::OUT | ParamAttribute::OPTIONAL)
        );
        assert_eq!(params[1].pointer_depth(), 1);
    }

    #[test]
    fn unknown_kinds_are_tolerated() {
        let json = r#"{ "nodes": [
            { "kind": "typedef", "name": "UINT", "type": "unsigned int" },
            { "kind": "struct", "name": "D3D11_BOX", "size": 24 }
        ] }"#;
        let tree = DeclTree::parse(json).unwrap();
        assert_eq!(tree.nodes[0].kind, NodeKind::Unknown);
        assert_eq!(tree.nodes_of(NodeKind::Struct).count(), 1);
        assert!(tree.namespace.is_none());
    }

    #[test]
    fn pointer_depth_counts_levels() {
        assert_eq!(pointer_depth(None), 0);
        assert_eq!(pointer_depth(Some("")), 0);
        assert_eq!(pointer_depth(Some("*")), 1);
        assert_eq!(pointer_depth(Some("**")), 2);
        assert_eq!(pointer_depth(Some("*&")), 2);
    }

    #[test]
    fn reject_malformed_json() {
        assert!(DeclTree::parse("{ \"nodes\": [ { \"name\": 1 } ] }").is_err());
        assert!(DeclTree::parse("not json").is_err());
    }
}
