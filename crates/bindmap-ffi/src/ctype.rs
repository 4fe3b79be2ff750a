//! Native primitive type names.
//!
//! Type references in the declaration tree are plain strings. Names that are
//! not declared in the tree itself are looked up here: C keywords
//! (`unsigned long long`, `const char`), stdint names, and the common
//! Windows SDK aliases (`UINT`, `BOOL`, `HANDLE`...).

use std::fmt;

/// A native primitive type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CType {
    Void,
    Char,
    SignedChar,
    UnsignedChar,
    WChar,
    Short,
    UnsignedShort,
    Int,
    UnsignedInt,
    Long,
    UnsignedLong,
    LongLong,
    UnsignedLongLong,
    Float,
    Double,
    LongDouble,
    // stdint types
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    SizeT,
    Bool,
    /// Pointer to another type.
    Pointer(Box<CType>),
    /// Const-qualified type.
    Const(Box<CType>),
}

impl CType {
    /// Parse a type name. Returns `None` for names that are not primitives
    /// (they may still be declared types).
    ///
    /// Trailing `*` tokens are accepted (`void*`, `const char *`).
    pub fn parse(input: &str) -> Option<Self> {
        let tokens = tokenize(input);
        if tokens.is_empty() {
            return None;
        }
        let (base, pos) = parse_base_type(&tokens)?;
        let mut ct = base;
        for token in &tokens[pos..] {
            match *token {
                "*" => ct = CType::Pointer(Box::new(ct)),
                "const" => ct = CType::Const(Box::new(ct)),
                _ => return None,
            }
        }
        Some(ct)
    }

    /// Whether this type is void.
    pub fn is_void(&self) -> bool {
        matches!(self.strip_const(), CType::Void)
    }

    /// Whether this is a character type that forms a string behind a pointer.
    pub fn is_char(&self) -> bool {
        matches!(
            self.strip_const(),
            CType::Char | CType::SignedChar | CType::WChar
        )
    }

    /// Whether this is an integer type of exactly four bytes.
    pub fn is_int32(&self) -> bool {
        matches!(
            self.strip_const(),
            CType::Int
                | CType::UnsignedInt
                | CType::Long
                | CType::UnsignedLong
                | CType::Int32
                | CType::UInt32
        )
    }

    /// Strip const qualifiers from outer level.
    pub fn strip_const(&self) -> &CType {
        match self {
            CType::Const(inner) => inner.strip_const(),
            other => other,
        }
    }

    /// Size in bytes for a target with `word_bits`-bit pointers.
    pub fn size(&self, word_bits: u8) -> u32 {
        let word = u32::from(word_bits / 8);
        match self {
            CType::Void => 0,
            CType::Char
            | CType::SignedChar
            | CType::UnsignedChar
            | CType::Int8
            | CType::UInt8
            | CType::Bool => 1,
            CType::WChar | CType::Short | CType::UnsignedShort | CType::Int16 | CType::UInt16 => 2,
            CType::Int
            | CType::UnsignedInt
            | CType::Long
            | CType::UnsignedLong
            | CType::Int32
            | CType::UInt32
            | CType::Float => 4,
            CType::LongLong
            | CType::UnsignedLongLong
            | CType::Int64
            | CType::UInt64
            | CType::Double
            | CType::LongDouble => 8,
            CType::SizeT | CType::Pointer(_) => word,
            CType::Const(inner) => inner.size(word_bits),
        }
    }
}

impl fmt::Display for CType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CType::Void => write!(f, "void"),
            CType::Char => write!(f, "char"),
            CType::SignedChar => write!(f, "signed char"),
            CType::UnsignedChar => write!(f, "unsigned char"),
            CType::WChar => write!(f, "wchar_t"),
            CType::Short => write!(f, "short"),
            CType::UnsignedShort => write!(f, "unsigned short"),
            CType::Int => write!(f, "int"),
            CType::UnsignedInt => write!(f, "unsigned int"),
            CType::Long => write!(f, "long"),
            CType::UnsignedLong => write!(f, "unsigned long"),
            CType::LongLong => write!(f, "long long"),
            CType::UnsignedLongLong => write!(f, "unsigned long long"),
            CType::Float => write!(f, "float"),
            CType::Double => write!(f, "double"),
            CType::LongDouble => write!(f, "long double"),
            CType::Int8 => write!(f, "int8_t"),
            CType::Int16 => write!(f, "int16_t"),
            CType::Int32 => write!(f, "int32_t"),
            CType::Int64 => write!(f, "int64_t"),
            CType::UInt8 => write!(f, "uint8_t"),
            CType::UInt16 => write!(f, "uint16_t"),
            CType::UInt32 => write!(f, "uint32_t"),
            CType::UInt64 => write!(f, "uint64_t"),
            CType::SizeT => write!(f, "size_t"),
            CType::Bool => write!(f, "bool"),
            CType::Pointer(inner) => write!(f, "{inner}*"),
            CType::Const(inner) => write!(f, "const {inner}"),
        }
    }
}

/// Parse the base type at the start of `tokens`, returning it and the
/// number of tokens consumed.
fn parse_base_type(tokens: &[&str]) -> Option<(CType, usize)> {
    let mut pos = 0;
    let is_const = tokens[pos] == "const";
    if is_const {
        pos += 1;
    }
    let first = *tokens.get(pos)?;

    let wrap = |ct: CType| {
        if is_const {
            CType::Const(Box::new(ct))
        } else {
            ct
        }
    };

    if first == "unsigned" || first == "signed" {
        let is_unsigned = first == "unsigned";
        pos += 1;
        let ct = match tokens.get(pos).copied() {
            Some("char") => {
                pos += 1;
                if is_unsigned { CType::UnsignedChar } else { CType::SignedChar }
            }
            Some("short") => {
                pos += 1;
                if is_unsigned { CType::UnsignedShort } else { CType::Short }
            }
            Some("int") => {
                pos += 1;
                if is_unsigned { CType::UnsignedInt } else { CType::Int }
            }
            Some("long") => {
                pos += 1;
                if tokens.get(pos) == Some(&"long") {
                    pos += 1;
                    if is_unsigned { CType::UnsignedLongLong } else { CType::LongLong }
                } else if is_unsigned {
                    CType::UnsignedLong
                } else {
                    CType::Long
                }
            }
            // bare `unsigned` / `signed`
            _ => {
                if is_unsigned { CType::UnsignedInt } else { CType::Int }
            }
        };
        return Some((wrap(ct), pos));
    }

    pos += 1;
    let ct = match first {
        "void" | "VOID" => CType::Void,
        "char" | "CHAR" => CType::Char,
        "wchar_t" | "WCHAR" => CType::WChar,
        "short" | "SHORT" => CType::Short,
        "int" | "INT" => CType::Int,
        "long" | "LONG" => {
            if tokens.get(pos) == Some(&"long") {
                pos += 1;
                CType::LongLong
            } else if tokens.get(pos) == Some(&"double") {
                pos += 1;
                CType::LongDouble
            } else {
                CType::Long
            }
        }
        "float" | "FLOAT" => CType::Float,
        "double" => CType::Double,
        "_Bool" | "bool" => CType::Bool,
        "size_t" | "SIZE_T" => CType::SizeT,
        "int8_t" => CType::Int8,
        "int16_t" => CType::Int16,
        "int32_t" | "INT32" | "HRESULT" => CType::Int32,
        "int64_t" | "INT64" | "LONGLONG" => CType::Int64,
        "uint8_t" | "BYTE" | "UINT8" => CType::UInt8,
        "uint16_t" | "WORD" | "USHORT" | "UINT16" => CType::UInt16,
        "uint32_t" | "UINT" | "UINT32" | "DWORD" | "ULONG" => CType::UInt32,
        "uint64_t" | "UINT64" | "ULONGLONG" => CType::UInt64,
        // Windows BOOL is a 32-bit int, not a C bool.
        "BOOL" => CType::Int32,
        "HANDLE" | "HWND" | "HMODULE" | "LPVOID" => CType::Pointer(Box::new(CType::Void)),
        "LPCSTR" | "LPSTR" => CType::Pointer(Box::new(CType::Char)),
        "LPCWSTR" | "LPWSTR" => CType::Pointer(Box::new(CType::WChar)),
        _ => return None,
    };
    Some((wrap(ct), pos))
}

/// Tokenize a type name, splitting on whitespace but keeping `*` as separate tokens.
fn tokenize(s: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    for part in s.split_whitespace() {
        let mut remaining = part;
        while !remaining.is_empty() {
            if let Some(star_pos) = remaining.find('*') {
                if star_pos > 0 {
                    tokens.push(&remaining[..star_pos]);
                }
                tokens.push("*");
                remaining = &remaining[star_pos + 1..];
            } else {
                tokens.push(remaining);
                break;
            }
        }
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_keywords() {
        assert_eq!(CType::parse("int"), Some(CType::Int));
        assert_eq!(CType::parse("unsigned"), Some(CType::UnsignedInt));
        assert_eq!(CType::parse("unsigned long long"), Some(CType::UnsignedLongLong));
        assert_eq!(CType::parse("long double"), Some(CType::LongDouble));
        assert_eq!(CType::parse("signed char"), Some(CType::SignedChar));
    }

    #[test]
    fn parse_windows_aliases() {
        assert_eq!(CType::parse("UINT"), Some(CType::UInt32));
        assert_eq!(CType::parse("BOOL"), Some(CType::Int32));
        assert_eq!(
            CType::parse("HANDLE"),
            Some(CType::Pointer(Box::new(CType::Void)))
        );
        assert_eq!(
            CType::parse("LPCWSTR"),
            Some(CType::Pointer(Box::new(CType::WChar)))
        );
    }

    #[test]
    fn parse_const_and_pointers() {
        assert_eq!(
            CType::parse("const char*"),
            Some(CType::Pointer(Box::new(CType::Const(Box::new(CType::Char)))))
        );
        assert_eq!(
            CType::parse("void **"),
            Some(CType::Pointer(Box::new(CType::Pointer(Box::new(CType::Void)))))
        );
    }

    #[test]
    fn unknown_names_are_not_primitives() {
        assert_eq!(CType::parse("D3D11_BOX"), None);
        assert_eq!(CType::parse("ID3D11Device"), None);
        assert_eq!(CType::parse(""), None);
        assert_eq!(CType::parse("int garbage"), None);
    }

    #[test]
    fn sizes_follow_word_bits() {
        assert_eq!(CType::Int.size(64), 4);
        assert_eq!(CType::Double.size(32), 8);
        assert_eq!(CType::SizeT.size(64), 8);
        assert_eq!(CType::SizeT.size(32), 4);
        assert_eq!(CType::parse("HANDLE").unwrap().size(32), 4);
        assert_eq!(CType::Const(Box::new(CType::Short)).size(64), 2);
    }

    #[test]
    fn classification_helpers() {
        assert!(CType::Const(Box::new(CType::WChar)).is_char());
        assert!(CType::parse("BOOL").unwrap().is_int32());
        assert!(!CType::Bool.is_int32());
        assert!(CType::Const(Box::new(CType::Void)).is_void());
    }

    #[test]
    fn display_names() {
        assert_eq!(CType::parse("const char*").unwrap().to_string(), "const char*");
        assert_eq!(CType::UInt32.to_string(), "uint32_t");
    }
}
