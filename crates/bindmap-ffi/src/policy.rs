//! Marshalling policy resolution.
//!
//! Turns a classified parameter into the public declaration fragment and
//! the argument expression used at the native call. The call-site table is
//! evaluated top to bottom and the first matching rule wins; its order is
//! part of the contract.

use std::fmt;

use serde::Serialize;
use tracing::debug;

use bindmap_rules::Visibility;

use crate::classify::{classify, Classification};
use crate::error::Result;
use crate::model::{DeclarationModel, Parameter, TypeCategory};

/// Passing modifier in front of a public parameter declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamModifier {
    Out,
    Ref,
}

/// Public parameter declaration, e.g. `ref Viewport pViewport`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParamDecl {
    pub modifier: Option<ParamModifier>,
    pub type_name: String,
    /// Rendered as a nullable value (`T?`).
    pub nullable: bool,
    /// Rendered as a sequence (`T[]`).
    pub sequence: bool,
    pub name: String,
}

impl fmt::Display for ParamDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.modifier {
            Some(ParamModifier::Out) => write!(f, "out ")?,
            Some(ParamModifier::Ref) => write!(f, "ref ")?,
            None => {}
        }
        write!(f, "{}", self.type_name)?;
        if self.nullable {
            write!(f, "?")?;
        }
        if self.sequence {
            write!(f, "[]")?;
        }
        write!(f, " {}", self.name)
    }
}

/// Argument expression passed to the native function.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "form", content = "operand", rename_all = "kebab-case")]
pub enum CallSite {
    /// `&x`
    AddressOf(String),
    /// `x` where `x` is the temporary.
    Temp(String),
    /// `name==null?(void*)0:tmp`
    NullOrTemp { name: String, temp: String },
    /// `(name.HasValue)?&tmp:(void*)IntPtr.Zero`
    OptionalAddress { name: String, temp: String },
    /// `unchecked((int)name)`
    EnumCast(String),
    /// `(void*)x`
    PointerCast(String),
    /// `(void*)((name == null)?IntPtr.Zero:name.NativePointer)`
    InterfacePointer(String),
    /// `(name?1:0)`
    BoolToInt(String),
    /// `name`
    Identity(String),
}

impl fmt::Display for CallSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AddressOf(x) => write!(f, "&{x}"),
            Self::Temp(temp) => write!(f, "{temp}"),
            Self::NullOrTemp { name, temp } => write!(f, "{name}==null?(void*)0:{temp}"),
            Self::OptionalAddress { name, temp } => {
                write!(f, "({name}.HasValue)?&{temp}:(void*)IntPtr.Zero")
            }
            Self::EnumCast(name) => write!(f, "unchecked((int){name})"),
            Self::PointerCast(x) => write!(f, "(void*){x}"),
            Self::InterfacePointer(name) => {
                write!(f, "(void*)(({name} == null)?IntPtr.Zero:{name}.NativePointer)")
            }
            Self::BoolToInt(name) => write!(f, "({name}?1:0)"),
            Self::Identity(name) => write!(f, "{name}"),
        }
    }
}

/// The call-site rule that produced an expression, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CallSiteRule {
    OutInterface,
    OutArray,
    OutFixed,
    OutConverted,
    OutValue,
    OptionalSmallRefIn,
    SmallRefIn,
    Enum,
    String,
    InterfaceIn,
    ConvertedArray,
    BoolToInt,
    Fixed,
    Handle,
    NativeScalar,
    Default,
}

impl CallSiteRule {
    pub const ALL: [CallSiteRule; 16] = [
        Self::OutInterface,
        Self::OutArray,
        Self::OutFixed,
        Self::OutConverted,
        Self::OutValue,
        Self::OptionalSmallRefIn,
        Self::SmallRefIn,
        Self::Enum,
        Self::String,
        Self::InterfaceIn,
        Self::ConvertedArray,
        Self::BoolToInt,
        Self::Fixed,
        Self::Handle,
        Self::NativeScalar,
        Self::Default,
    ];

    /// 1-based position in the first-match table.
    pub fn number(&self) -> u8 {
        *self as u8 + 1
    }
}

impl fmt::Display for CallSiteRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rule {}", self.number())
    }
}

/// Resolved marshalling for one parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarshallingPolicy {
    pub parameter: String,
    pub declaration: ParamDecl,
    pub declaration_text: String,
    pub call_site: CallSite,
    pub call_expression: String,
    pub rule: CallSiteRule,
    pub rule_number: u8,
    pub is_fixed: bool,
}

/// Policies of every parameter of one function or method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionPolicy {
    pub path: String,
    pub name: String,
    pub native_name: String,
    pub visibility: Visibility,
    pub check_return: bool,
    pub parameters: Vec<MarshallingPolicy>,
}

/// Public declaration fragment for a parameter.
pub fn resolve_declaration(param: &Parameter, class: &Classification) -> ParamDecl {
    let is_string = class.category == TypeCategory::String;
    let modifier = if class.is_out && (!class.is_array || is_string) {
        Some(ParamModifier::Out)
    } else if (class.is_ref || class.is_ref_in)
        && !class.is_array
        && !(class.is_ref_in_value_type_optional || class.is_ref_in_value_type_by_value)
    {
        Some(ParamModifier::Ref)
    } else {
        None
    };

    ParamDecl {
        modifier,
        type_name: param.type_ref.name.clone(),
        nullable: class.is_ref_in_value_type_optional,
        sequence: class.is_array && !is_string,
        name: param.name.clone(),
    }
}

/// Call-site expression for a parameter, with the rule that produced it.
pub fn resolve_call_site(param: &Parameter, class: &Classification) -> (CallSiteRule, CallSite) {
    let name = param.name.clone();
    let temp = param.temp_name();
    let native = class.has_native_value_type;

    if class.is_out {
        if class.category == TypeCategory::Interface {
            let site = if class.is_array && class.is_optional {
                CallSite::NullOrTemp { name, temp }
            } else {
                CallSite::AddressOf(temp)
            };
            return (CallSiteRule::OutInterface, site);
        }
        if class.is_array {
            return (CallSiteRule::OutArray, CallSite::Temp(temp));
        }
        if class.is_fixed && !native {
            let site = if class.used_as_return {
                CallSite::AddressOf(name)
            } else {
                CallSite::Temp(temp)
            };
            return (CallSiteRule::OutFixed, site);
        }
        if native || class.is_bool_to_int {
            return (CallSiteRule::OutConverted, CallSite::AddressOf(temp));
        }
        let site = if class.is_value_type {
            CallSite::AddressOf(name)
        } else {
            CallSite::Temp(temp)
        };
        return (CallSiteRule::OutValue, site);
    }

    if class.is_ref_in_value_type_optional {
        return (
            CallSiteRule::OptionalSmallRefIn,
            CallSite::OptionalAddress { name, temp },
        );
    }
    if class.is_ref_in_value_type_small {
        return (CallSiteRule::SmallRefIn, CallSite::AddressOf(name));
    }
    if class.category == TypeCategory::Enum && !class.is_array {
        return (CallSiteRule::Enum, CallSite::EnumCast(name));
    }
    if class.category == TypeCategory::String {
        return (CallSiteRule::String, CallSite::PointerCast(temp));
    }
    if class.category == TypeCategory::Interface && class.is_in && !class.is_array {
        return (CallSiteRule::InterfaceIn, CallSite::InterfacePointer(name));
    }
    if class.is_array
        && (native || class.is_bool_to_int || (class.is_value_type && class.is_optional))
    {
        return (CallSiteRule::ConvertedArray, CallSite::Temp(temp));
    }
    if class.is_bool_to_int {
        return (CallSiteRule::BoolToInt, CallSite::BoolToInt(name));
    }
    if class.is_fixed && !native {
        return (CallSiteRule::Fixed, CallSite::Temp(temp));
    }
    if class.category == TypeCategory::Handle && !class.is_array {
        return (CallSiteRule::Handle, CallSite::PointerCast(name));
    }
    if native {
        return (CallSiteRule::NativeScalar, CallSite::AddressOf(temp));
    }
    (CallSiteRule::Default, CallSite::Identity(name))
}

/// Classify, verify and resolve one parameter.
pub fn resolve_parameter(param: &Parameter) -> Result<MarshallingPolicy> {
    let class = classify(param);
    class.check(param)?;

    let declaration = resolve_declaration(param, &class);
    let (rule, call_site) = resolve_call_site(param, &class);
    debug!(parameter = %param.path, %rule, call = %call_site, "resolved call site");

    Ok(MarshallingPolicy {
        parameter: param.path.clone(),
        declaration_text: declaration.to_string(),
        declaration,
        call_expression: call_site.to_string(),
        call_site,
        rule,
        rule_number: rule.number(),
        is_fixed: class.is_fixed,
    })
}

/// Resolve every parameter of every function and interface method.
///
/// Stops at the first classification ambiguity: code emitted for the rest
/// of the model would share the same broken contract.
pub fn resolve_model(model: &DeclarationModel) -> Result<Vec<FunctionPolicy>> {
    model
        .functions()
        .map(|(decl, func)| {
            let parameters = func
                .parameters
                .iter()
                .map(resolve_parameter)
                .collect::<Result<Vec<_>>>()?;
            Ok(FunctionPolicy {
                path: decl.path.clone(),
                name: decl.name.clone(),
                native_name: decl.native_name.clone(),
                visibility: decl.visibility,
                check_return: func.check_return,
                parameters,
            })
        })
        .collect()
}
