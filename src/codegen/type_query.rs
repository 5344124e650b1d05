//! SIZEOF / TYPEOF / IS / AS lowering.
//!
//! Grounded on
//! `original_source/src/code_gen/expr/code_gen_expr_type.c` for the
//! tag/cast conventions; tag constants come from `codegen::boxing`.

use crate::ast::{Expr, TypeQueryKind};
use crate::codegen::boxing::element_type_tag;
use crate::codegen::type_map::{c_type, struct_type_id, type_suffix};
use crate::error::Result;
use crate::types::Type;

/// `sizeof(T)` / `sizeof(expr)` -> `(long long)sizeof(c_type(T))`.
pub fn gen_sizeof(ty: &Type) -> String {
    format!("((long long)sizeof({}))", c_type(ty))
}

/// `typeof(T)` compile-time constant, or `typeof(e)` — dynamic for `Any`
/// operands, constant otherwise.
pub fn gen_typeof(
    operand_ty: Option<&Type>,
    operand_expr: Option<&str>,
) -> String {
    match (operand_ty, operand_expr) {
        (Some(Type::Any), Some(e)) => format!("rt_any_get_tag({})", e),
        (Some(ty), _) => element_type_tag(ty).to_string(),
        (None, _) => "RT_ANY_NIL".to_string(),
    }
}

/// `e is T`.
pub fn gen_is(e: &str, target: &Type) -> String {
    match target {
        Type::Array(elem) => format!(
            "(rt_any_get_tag({}) == RT_ANY_ARRAY && rt_any_array_elem_tag({}) == {})",
            e,
            e,
            element_type_tag(elem)
        ),
        Type::Struct { name, .. } => format!(
            "rt_any_is_struct_type({}, {})",
            e,
            struct_type_id(name)
        ),
        other => format!("(rt_any_get_tag({}) == {})", e, element_type_tag(other)),
    }
}

/// `e as T`.
pub fn gen_as(e: &str, source_ty: &Type, target: &Type) -> Result<String> {
    if let (Type::Array(src_elem), Type::Array(dst_elem)) = (source_ty, target) {
        if matches!(src_elem.as_ref(), Type::Any) {
            let suffix = type_suffix(dst_elem);
            return Ok(format!("rt_array_from_any_{}({})", suffix, e));
        }
    }
    if is_numeric_cast_target(source_ty) && is_numeric_cast_target(target) {
        return Ok(format!("(({})({}))", c_type(target), e));
    }
    Ok(crate::codegen::boxing::unbox_expr(target, e))
}

fn is_numeric_cast_target(ty: &Type) -> bool {
    matches!(
        ty,
        Type::Int
            | Type::Long
            | Type::Int32
            | Type::UInt
            | Type::UInt32
            | Type::Float
            | Type::Double
            | Type::Char
            | Type::Byte
    )
}

/// Dispatch entry used by `codegen::expr::mod`'s `Expr::TypeQuery` arm.
/// `operand_ty`/`operand_str` are `None` for the `sizeof(T)`/`typeof(T)`
/// type-literal forms, which carry no runtime operand.
pub fn gen_type_query(
    kind: &TypeQueryKind,
    query_ty: &Type,
    operand: Option<&Expr>,
    operand_str: Option<&str>,
) -> Result<String> {
    match kind {
        TypeQueryKind::SizeOf => Ok(gen_sizeof(query_ty)),
        TypeQueryKind::TypeOf => Ok(gen_typeof(operand.map(|e| e.ty()), operand_str)),
        TypeQueryKind::Is(target) => {
            let e = operand_str.ok_or_else(|| {
                crate::error::CodeGenError::InternalAssertion("`is` requires an operand".into())
            })?;
            Ok(gen_is(e, target))
        }
        TypeQueryKind::As(target) => {
            let operand = operand.ok_or_else(|| {
                crate::error::CodeGenError::InternalAssertion("`as` requires an operand".into())
            })?;
            let e = operand_str.ok_or_else(|| {
                crate::error::CodeGenError::InternalAssertion("`as` requires an operand".into())
            })?;
            gen_as(e, operand.ty(), target)
        }
    }
}
