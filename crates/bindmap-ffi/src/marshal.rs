//! Native primitive to public type mapping.
//!
//! Decides the public name, category and size of primitive type references,
//! and how many pointer levels the category itself absorbs.

use crate::ctype::CType;
use crate::model::{TypeCategory, TypeRef};

/// A type reference together with the pointer levels left over for the
/// parameter's direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedType {
    pub type_ref: TypeRef,
    /// Pointer levels not absorbed by the type's own representation.
    pub ref_depth: u8,
}

/// Public name of a primitive.
pub fn public_name(ct: &CType) -> &'static str {
    match ct.strip_const() {
        CType::Void => "void",
        CType::Char | CType::SignedChar | CType::Int8 => "sbyte",
        CType::UnsignedChar | CType::UInt8 => "byte",
        CType::WChar => "char",
        CType::Short | CType::Int16 => "short",
        CType::UnsignedShort | CType::UInt16 => "ushort",
        CType::Int | CType::Long | CType::Int32 => "int",
        CType::UnsignedInt | CType::UnsignedLong | CType::UInt32 => "uint",
        CType::LongLong | CType::Int64 => "long",
        CType::UnsignedLongLong | CType::UInt64 => "ulong",
        CType::Float => "float",
        CType::Double | CType::LongDouble => "double",
        CType::Bool => "bool",
        CType::SizeT => "nuint",
        CType::Pointer(_) => "IntPtr",
        CType::Const(inner) => public_name(inner),
    }
}

/// Map a primitive reached through `pointer_depth` declared pointer levels.
///
/// Pointers that are part of the type name itself (`HANDLE`, `LPCSTR`) count
/// as well. A `char`/`wchar_t` behind a pointer becomes a string and `void`
/// behind a pointer becomes an opaque handle; each absorbs one level.
pub fn map_primitive(ct: &CType, pointer_depth: u8, word_bits: u8) -> MappedType {
    let mut depth = pointer_depth;
    let mut base = ct.strip_const();
    while let CType::Pointer(inner) = base {
        depth = depth.saturating_add(1);
        base = inner.strip_const();
    }

    if depth > 0 && base.is_char() {
        return MappedType {
            type_ref: TypeRef::string().with_native_name(ct.to_string()),
            ref_depth: depth - 1,
        };
    }
    if depth > 0 && base.is_void() {
        return MappedType {
            type_ref: TypeRef::handle(word_bits).with_native_name(ct.to_string()),
            ref_depth: depth - 1,
        };
    }

    MappedType {
        type_ref: TypeRef {
            name: public_name(base).to_string(),
            native_name: ct.to_string(),
            category: TypeCategory::Primitive,
            size: Some(base.size(word_bits)),
            has_native_value_type: false,
        },
        ref_depth: depth,
    }
}
