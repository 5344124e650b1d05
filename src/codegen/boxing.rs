//! BOXING — wrap/unwrap concrete values as `Any` (tagged).
//!
//! Grounded verbatim on
//! `original_source/src/code_gen/util/code_gen_util_boxing.c`.

use crate::types::Type;

/// The runtime function that boxes a concrete `Type` into an `RtAny`.
/// `Any` itself needs no boxing function — it is already boxed.
pub fn boxing_function(ty: &Type) -> Option<&'static str> {
    Some(match ty {
        Type::Int => "rt_box_int",
        Type::Long => "rt_box_long",
        Type::Int32 => "rt_box_int32",
        Type::UInt => "rt_box_uint",
        Type::UInt32 => "rt_box_uint32",
        Type::Double => "rt_box_double",
        Type::Float => "rt_box_float",
        Type::String => "rt_box_string",
        Type::Char => "rt_box_char",
        Type::Bool => "rt_box_bool",
        Type::Byte => "rt_box_byte",
        Type::Array(_) => "rt_box_array",
        Type::Function { .. } => "rt_box_function",
        Type::Struct { .. } => "rt_box_struct",
        Type::Nil | Type::Void => "rt_box_nil",
        Type::Any => return None,
        _ => "rt_box_nil",
    })
}

/// The runtime function that unboxes an `RtAny` back into a concrete
/// `Type`. Returns `None` for types the bridge has no unboxing entry for.
pub fn unboxing_function(ty: &Type) -> Option<&'static str> {
    Some(match ty {
        Type::Int => "rt_unbox_int",
        Type::Long => "rt_unbox_long",
        Type::Int32 => "rt_unbox_int32",
        Type::UInt => "rt_unbox_uint",
        Type::UInt32 => "rt_unbox_uint32",
        Type::Double => "rt_unbox_double",
        Type::Float => "rt_unbox_float",
        Type::String => "rt_unbox_string",
        Type::Char => "rt_unbox_char",
        Type::Bool => "rt_unbox_bool",
        Type::Byte => "rt_unbox_byte",
        Type::Array(_) => "rt_unbox_array",
        Type::Function { .. } => "rt_unbox_function",
        Type::Struct { .. } => "rt_unbox_struct",
        _ => return None,
    })
}

/// The `RT_ANY_*` tag constant for a (possibly element) type, used when
/// boxing arrays element-by-element and by `e is T`/`typeof`.
pub fn element_type_tag(ty: &Type) -> &'static str {
    match ty {
        Type::Int => "RT_ANY_INT",
        Type::Long => "RT_ANY_LONG",
        Type::Int32 => "RT_ANY_INT32",
        Type::UInt => "RT_ANY_UINT",
        Type::UInt32 => "RT_ANY_UINT32",
        Type::Double => "RT_ANY_DOUBLE",
        Type::Float => "RT_ANY_FLOAT",
        Type::String => "RT_ANY_STRING",
        Type::Char => "RT_ANY_CHAR",
        Type::Bool => "RT_ANY_BOOL",
        Type::Byte => "RT_ANY_BYTE",
        Type::Array(_) => "RT_ANY_ARRAY",
        Type::Function { .. } => "RT_ANY_FUNCTION",
        Type::Struct { .. } => "RT_ANY_STRUCT",
        Type::Void => "RT_ANY_NIL",
        _ => "RT_ANY_NIL",
    }
}

/// Emit a boxing call `rt_box_T(expr)` for a concrete value, or leave an
/// already-`Any` expression untouched. `arena` is the in-scope C arena
/// variable (e.g. `__arena__`); only `rt_box_struct` needs it.
pub fn box_expr(ty: &Type, expr: &str, arena: &str) -> String {
    match boxing_function(ty) {
        Some(f) if matches!(ty, Type::Struct { .. }) => {
            format!(
                "{}({}, &({}), sizeof({}), {})",
                f,
                arena,
                expr,
                crate::codegen::type_map::c_type(ty),
                crate::codegen::type_map::struct_type_id(ty.struct_name().unwrap_or(""))
            )
        }
        Some(f) => format!("{}({})", f, expr),
        None => expr.to_string(),
    }
}

/// Emit an unboxing call `rt_unbox_T(expr)`.
pub fn unbox_expr(ty: &Type, expr: &str) -> String {
    match unboxing_function(ty) {
        Some(f) => format!("{}({})", f, expr),
        None => expr.to_string(),
    }
}
