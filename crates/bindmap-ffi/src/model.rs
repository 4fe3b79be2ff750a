//! The declaration model.
//!
//! Built once per generation run by [`crate::builder`], then read-only. Every
//! node carries its qualified path (segments joined by `::`) so diagnostics
//! and policies can point back at the native declaration.

use serde::Serialize;

use bindmap_rules::Visibility;

use crate::direction::Direction;
use crate::tree::SourceLocation;

/// Broad category of a parameter or field type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeCategory {
    /// Integer, floating point or boolean scalar.
    Primitive,
    Enum,
    Struct,
    /// COM-style interface, always handled through its native pointer.
    Interface,
    /// `char*` / `wchar_t*` text.
    String,
    /// Opaque pointer-typed alias (`void*`, `HANDLE`).
    Handle,
}

impl TypeCategory {
    /// Whether values of this category are copied rather than referenced.
    pub fn is_value_type(&self) -> bool {
        matches!(
            self,
            TypeCategory::Primitive
                | TypeCategory::Enum
                | TypeCategory::Struct
                | TypeCategory::Handle
        )
    }
}

/// A resolved type reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeRef {
    /// Public (managed) type name.
    pub name: String,
    /// Native type name as written in the header.
    pub native_name: String,
    pub category: TypeCategory,
    /// Size in bytes of the value form, when known.
    pub size: Option<u32>,
    /// The struct needs explicit conversion between its public and native
    /// layouts.
    pub has_native_value_type: bool,
}

impl TypeRef {
    pub fn new(name: impl Into<String>, category: TypeCategory, size: Option<u32>) -> Self {
        let name = name.into();
        Self {
            native_name: name.clone(),
            name,
            category,
            size,
            has_native_value_type: false,
        }
    }

    pub fn primitive(name: impl Into<String>, size: u32) -> Self {
        Self::new(name, TypeCategory::Primitive, Some(size))
    }

    pub fn enumeration(name: impl Into<String>, size: u32) -> Self {
        Self::new(name, TypeCategory::Enum, Some(size))
    }

    pub fn structure(name: impl Into<String>, size: u32) -> Self {
        Self::new(name, TypeCategory::Struct, Some(size))
    }

    pub fn interface(name: impl Into<String>) -> Self {
        Self::new(name, TypeCategory::Interface, None)
    }

    pub fn string() -> Self {
        Self::new("string", TypeCategory::String, None)
    }

    pub fn handle(word_bits: u8) -> Self {
        Self::new("IntPtr", TypeCategory::Handle, Some(u32::from(word_bits / 8)))
    }

    /// Mark a struct as carrying a distinct native layout.
    pub fn with_native_layout(mut self) -> Self {
        self.has_native_value_type = true;
        self
    }

    pub fn with_native_name(mut self, native: impl Into<String>) -> Self {
        self.native_name = native.into();
        self
    }

    /// Whether this is the public `bool` type.
    pub fn is_bool(&self) -> bool {
        self.category == TypeCategory::Primitive && self.name == "bool"
    }
}

/// A function or method parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Parameter {
    pub path: String,
    pub native_name: String,
    /// Public parameter name.
    pub name: String,
    pub direction: Direction,
    pub type_ref: TypeRef,
    pub is_array: bool,
    pub array_dimension: Option<u32>,
    pub is_optional: bool,
    /// Public `bool` carried natively as a 32-bit integer.
    pub is_bool_to_int: bool,
    /// The parameter carries the method's return value.
    pub used_as_return: bool,
    /// Pointer levels beyond what the type category itself implies.
    pub pointer_depth: u8,
    pub is_const: bool,
}

impl Parameter {
    pub fn new(name: impl Into<String>, direction: Direction, type_ref: TypeRef) -> Self {
        let name = name.into();
        let pointer_depth = if direction == Direction::In { 0 } else { 1 };
        Self {
            path: name.clone(),
            native_name: name.clone(),
            name,
            direction,
            type_ref,
            is_array: false,
            array_dimension: None,
            is_optional: false,
            is_bool_to_int: false,
            used_as_return: false,
            pointer_depth,
            is_const: false,
        }
    }

    pub fn array(mut self) -> Self {
        self.is_array = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.is_optional = true;
        self
    }

    pub fn bool_to_int(mut self) -> Self {
        self.is_bool_to_int = true;
        self
    }

    pub fn used_as_return(mut self) -> Self {
        self.used_as_return = true;
        self
    }

    pub fn with_pointer_depth(mut self, depth: u8) -> Self {
        self.pointer_depth = depth;
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Identifier of the temporary holding the converted or pinned value.
    pub fn temp_name(&self) -> String {
        format!("{}_", self.name)
    }
}

/// A struct field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    pub path: String,
    pub native_name: String,
    pub name: String,
    pub visibility: Visibility,
    pub type_ref: TypeRef,
    pub pointer_depth: u8,
    pub array_dimension: Option<u32>,
    /// Public `bool` stored as a 32-bit native integer.
    pub is_bool_to_int: bool,
}

/// An enumerator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumItem {
    pub native_name: String,
    pub name: String,
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumDecl {
    pub items: Vec<EnumItem>,
    pub size: u32,
    pub is_flags: bool,
    /// A zero-valued `None` item is present (declared or synthesized).
    pub has_none: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StructDecl {
    pub fields: Vec<Field>,
    pub size: Option<u32>,
    pub has_native_value_type: bool,
    /// Generated as a reference type.
    pub is_class: bool,
    pub has_custom_marshal: bool,
    pub has_custom_new: bool,
    pub force_marshal_to: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterfaceDecl {
    pub base: Option<String>,
    pub methods: Vec<Declaration>,
    pub is_callback: bool,
    pub is_dual_callback: bool,
    pub callback_name: Option<String>,
    pub callback_visibility: Option<Visibility>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionDecl {
    /// `None` for `void`.
    pub return_type: Option<TypeRef>,
    pub parameters: Vec<Parameter>,
    /// Check the native return code and raise on failure.
    pub check_return: bool,
    pub allow_property: bool,
    pub dll: Option<String>,
    /// Macro naming the native library, used instead of `dll` when set.
    pub macro_dll: Option<String>,
    pub group: Option<String>,
}

/// Kind-specific payload of a declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DeclKind {
    Enum(EnumDecl),
    Struct(StructDecl),
    Interface(InterfaceDecl),
    Function(FunctionDecl),
}

/// A modeled native API element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Declaration {
    pub path: String,
    pub native_name: String,
    pub name: String,
    pub visibility: Visibility,
    pub location: Option<SourceLocation>,
    #[serde(flatten)]
    pub kind: DeclKind,
}

impl Declaration {
    pub fn as_function(&self) -> Option<&FunctionDecl> {
        match &self.kind {
            DeclKind::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&StructDecl> {
        match &self.kind {
            DeclKind::Struct(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&EnumDecl> {
        match &self.kind {
            DeclKind::Enum(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_interface(&self) -> Option<&InterfaceDecl> {
        match &self.kind {
            DeclKind::Interface(i) => Some(i),
            _ => None,
        }
    }
}

/// Every declaration of one generation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeclarationModel {
    pub namespace: Option<String>,
    pub declarations: Vec<Declaration>,
}

impl DeclarationModel {
    /// Look up a top-level declaration by path.
    pub fn get(&self, path: &str) -> Option<&Declaration> {
        self.declarations.iter().find(|d| d.path == path)
    }

    /// Every free function and interface method, in tree order.
    pub fn functions(&self) -> impl Iterator<Item = (&Declaration, &FunctionDecl)> {
        self.declarations
            .iter()
            .flat_map(|decl| match &decl.kind {
                DeclKind::Interface(iface) => iface.methods.iter().collect::<Vec<_>>(),
                _ => vec![decl],
            })
            .filter_map(|d| d.as_function().map(|f| (d, f)))
    }

    /// Find a parameter anywhere in the model by its path.
    pub fn parameter(&self, path: &str) -> Option<&Parameter> {
        self.functions()
            .flat_map(|(_, f)| f.parameters.iter())
            .find(|p| p.path == path)
    }
}
