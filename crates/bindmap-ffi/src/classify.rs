//! Parameter classification.
//!
//! [`classify`] derives the fixed set of flags the policy resolver works
//! from. Each flag is an independent predicate over the parameter's static
//! attributes; nothing here looks at other parameters or at the rules.

use serde::Serialize;

use crate::direction::Direction;
use crate::error::{FfiError, Result};
use crate::model::{Parameter, TypeCategory};

/// Largest value type, in bytes, passed by value instead of by reference.
pub const SMALL_VALUE_LIMIT: u32 = 16;

/// Derived attributes of one parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Classification {
    pub direction: Direction,
    pub category: TypeCategory,
    pub is_in: bool,
    pub is_out: bool,
    pub is_ref: bool,
    pub is_ref_in: bool,
    pub is_array: bool,
    pub is_optional: bool,
    pub is_bool_to_int: bool,
    pub used_as_return: bool,
    pub is_value_type: bool,
    pub has_native_value_type: bool,
    /// Nullable value passed by address.
    pub is_ref_in_value_type_optional: bool,
    /// Small read-only value passed by address.
    pub is_ref_in_value_type_small: bool,
    /// Small case whose type is itself pointer-represented.
    pub is_ref_in_value_type_by_pointer: bool,
    /// Small case passed by value on the public side.
    pub is_ref_in_value_type_by_value: bool,
    /// The argument's storage must stay address-stable for the whole call.
    pub is_fixed: bool,
}

/// Classify a parameter. Pure and deterministic.
pub fn classify(param: &Parameter) -> Classification {
    let direction = param.direction;
    let category = param.type_ref.category;
    let is_ref_in = direction == Direction::RefIn;
    let is_array = param.is_array;

    let is_value_type = category.is_value_type();
    let has_native_value_type =
        category == TypeCategory::Struct && param.type_ref.has_native_value_type;

    let ref_in_value = is_ref_in && is_value_type && !is_array;
    let is_ref_in_value_type_optional = ref_in_value && param.is_optional;
    let is_small = param
        .type_ref
        .size
        .is_some_and(|size| size <= SMALL_VALUE_LIMIT);
    let is_ref_in_value_type_small = ref_in_value && is_small && !has_native_value_type;
    let is_pointer_represented = category == TypeCategory::Handle || param.pointer_depth > 1;
    let is_ref_in_value_type_by_pointer = is_ref_in_value_type_small && is_pointer_represented;
    let is_ref_in_value_type_by_value = is_ref_in_value_type_small;

    let is_fixed = if direction.is_by_reference() {
        !(is_ref_in_value_type_optional || is_ref_in_value_type_by_value)
    } else if direction == Direction::Out && !param.is_bool_to_int {
        true
    } else {
        is_array
    };

    Classification {
        direction,
        category,
        is_in: direction == Direction::In,
        is_out: direction == Direction::Out,
        is_ref: direction == Direction::Ref,
        is_ref_in,
        is_array,
        is_optional: param.is_optional,
        is_bool_to_int: param.is_bool_to_int,
        used_as_return: param.used_as_return,
        is_value_type,
        has_native_value_type,
        is_ref_in_value_type_optional,
        is_ref_in_value_type_small,
        is_ref_in_value_type_by_pointer,
        is_ref_in_value_type_by_value,
        is_fixed,
    }
}

impl Classification {
    /// Verify that the flags describe exactly one marshalling shape.
    ///
    /// A failure means the generator itself produced an inconsistent
    /// parameter; emitting code for it would be unsafe, so the error is
    /// fatal for the run.
    pub fn check(&self, param: &Parameter) -> Result<()> {
        let ambiguous = |detail: &str| {
            Err(FfiError::ClassificationAmbiguity {
                parameter: param.path.clone(),
                detail: detail.to_string(),
            })
        };

        let directions = [self.is_in, self.is_out, self.is_ref, self.is_ref_in]
            .iter()
            .filter(|flag| **flag)
            .count();
        if directions != 1 {
            return ambiguous("parameter must have exactly one direction");
        }
        if param.type_ref.has_native_value_type && param.type_ref.category != TypeCategory::Struct {
            return ambiguous("only structs can carry a distinct native layout");
        }
        if self.is_bool_to_int && self.category != TypeCategory::Primitive {
            return ambiguous("bool-to-int coercion on a non-primitive type");
        }
        if self.used_as_return && !self.is_out {
            return ambiguous("return-carrying parameter is not an output");
        }
        if (self.is_ref_in_value_type_by_pointer || self.is_ref_in_value_type_by_value)
            && !self.is_ref_in_value_type_small
        {
            return ambiguous("by-pointer/by-value refinement without the small-value case");
        }
        if (self.is_ref_in_value_type_optional || self.is_ref_in_value_type_small)
            && !(self.is_ref_in && self.is_value_type && !self.is_array)
        {
            return ambiguous("small/optional value case outside a scalar ref-in value type");
        }
        if self.is_array && !self.is_fixed {
            return ambiguous("array argument is not pinned");
        }
        Ok(())
    }
}
