//! Sparse field overlays.
//!
//! Every overlay field is an `Option`: `None` inherits whatever was resolved
//! before, `Some` replaces it. Fields are atomic, so a merge never combines
//! the contents of two values.

use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Visibility of a generated declaration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Internal,
    Protected,
    Private,
}

impl Visibility {
    /// Parse a visibility keyword.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "public" => Some(Self::Public),
            "internal" => Some(Self::Internal),
            "protected" => Some(Self::Protected),
            "private" => Some(Self::Private),
            _ => None,
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Public => write!(f, "public"),
            Self::Internal => write!(f, "internal"),
            Self::Protected => write!(f, "protected"),
            Self::Private => write!(f, "private"),
        }
    }
}

bitflags! {
    /// Native parameter annotations (`__in`, `__out_opt`, `__inout_ecount`...).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct ParamAttribute: u8 {
        const IN = 1 << 0;
        const OUT = 1 << 1;
        const INOUT = 1 << 2;
        const BUFFER = 1 << 3;
        const OPTIONAL = 1 << 4;
        const FAST = 1 << 5;
    }
}

impl Default for ParamAttribute {
    fn default() -> Self {
        Self::empty()
    }
}

/// A managed name assigned by a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingName {
    pub value: String,
    /// Final names are used verbatim; provisional names still go through
    /// the naming convention.
    pub is_final: bool,
}

impl MappingName {
    pub fn final_name(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            is_final: true,
        }
    }

    pub fn provisional(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            is_final: false,
        }
    }
}

/// The sparse set of overrides carried by a rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Overlay {
    /// Managed name. Read from `name` / `name-tmp` by the rule file loader.
    #[serde(skip)]
    pub name: Option<MappingName>,
    #[serde(default)]
    pub visibility: Option<Visibility>,
    #[serde(default)]
    pub keep_underscore: Option<bool>,

    // Structs
    #[serde(default)]
    pub native: Option<bool>,
    #[serde(default)]
    pub struct_to_class: Option<bool>,
    #[serde(default, rename = "marshal")]
    pub custom_marshal: Option<bool>,
    #[serde(default, rename = "new")]
    pub custom_new: Option<bool>,
    #[serde(default, rename = "marshalto")]
    pub force_marshal_to: Option<bool>,

    // Parameters and fields
    #[serde(default, rename = "type")]
    pub mapping_type: Option<String>,
    #[serde(default)]
    pub pointer: Option<String>,
    #[serde(default)]
    pub array: Option<u32>,
    #[serde(default)]
    pub attribute: Option<ParamAttribute>,
    #[serde(default, rename = "return")]
    pub used_as_return: Option<bool>,

    // Enums
    #[serde(default)]
    pub flags: Option<bool>,
    #[serde(default)]
    pub none: Option<bool>,

    // Interfaces
    #[serde(default)]
    pub callback: Option<bool>,
    #[serde(default)]
    pub callback_dual: Option<bool>,
    #[serde(default)]
    pub callback_name: Option<String>,
    #[serde(default)]
    pub callback_visibility: Option<Visibility>,

    // Functions and methods
    #[serde(default)]
    pub property: Option<bool>,
    #[serde(default)]
    pub check: Option<bool>,
    #[serde(default)]
    pub dll: Option<String>,
    #[serde(default)]
    pub macro_dll: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
}

fn take<T: Clone>(dst: &mut Option<T>, src: &Option<T>) {
    if src.is_some() {
        dst.clone_from(src);
    }
}

impl Overlay {
    /// Fold `other` on top of `self`. Only fields set in `other` change.
    pub fn merge(&mut self, other: &Overlay) {
        take(&mut self.name, &other.name);
        take(&mut self.visibility, &other.visibility);
        take(&mut self.keep_underscore, &other.keep_underscore);
        take(&mut self.native, &other.native);
        take(&mut self.struct_to_class, &other.struct_to_class);
        take(&mut self.custom_marshal, &other.custom_marshal);
        take(&mut self.custom_new, &other.custom_new);
        take(&mut self.force_marshal_to, &other.force_marshal_to);
        take(&mut self.mapping_type, &other.mapping_type);
        take(&mut self.pointer, &other.pointer);
        take(&mut self.array, &other.array);
        take(&mut self.attribute, &other.attribute);
        take(&mut self.used_as_return, &other.used_as_return);
        take(&mut self.flags, &other.flags);
        take(&mut self.none, &other.none);
        take(&mut self.callback, &other.callback);
        take(&mut self.callback_dual, &other.callback_dual);
        take(&mut self.callback_name, &other.callback_name);
        take(&mut self.callback_visibility, &other.callback_visibility);
        take(&mut self.property, &other.property);
        take(&mut self.check, &other.check);
        take(&mut self.dll, &other.dll);
        take(&mut self.macro_dll, &other.macro_dll);
        take(&mut self.group, &other.group);
    }

    /// Whether no field is set.
    pub fn is_empty(&self) -> bool {
        *self == Overlay::default()
    }

    /// Whether the struct tags request a distinct native layout, either
    /// directly or through `struct-to-class`, `marshal` or `new`.
    pub fn requests_native_layout(&self) -> bool {
        [
            self.native,
            self.struct_to_class,
            self.custom_marshal,
            self.custom_new,
        ]
        .iter()
        .any(|tag| *tag == Some(true))
    }

    /// Whether any struct-only tag is set.
    pub fn has_struct_tags(&self) -> bool {
        self.native.is_some()
            || self.struct_to_class.is_some()
            || self.custom_marshal.is_some()
            || self.custom_new.is_some()
            || self.force_marshal_to.is_some()
    }

    /// Whether any enum-only tag is set.
    pub fn has_enum_tags(&self) -> bool {
        self.flags.is_some() || self.none.is_some()
    }

    /// Whether any interface-only tag is set.
    pub fn has_callback_tags(&self) -> bool {
        self.callback.is_some()
            || self.callback_dual.is_some()
            || self.callback_name.is_some()
            || self.callback_visibility.is_some()
    }

    /// Whether any function-only tag is set.
    pub fn has_function_tags(&self) -> bool {
        self.property.is_some()
            || self.check.is_some()
            || self.dll.is_some()
            || self.macro_dll.is_some()
            || self.group.is_some()
    }

    /// Whether any parameter/field tag is set.
    pub fn has_member_tags(&self) -> bool {
        self.mapping_type.is_some() || self.pointer.is_some() || self.array.is_some()
    }

    /// Whether any parameter-only tag is set.
    pub fn has_parameter_tags(&self) -> bool {
        self.attribute.is_some() || self.used_as_return.is_some()
    }
}
