//! Struct literal lowering: `Point { x: 1.0 }` ->
//! `(Point){ .__sn__x = 1.0, .__sn__y = 0 }`.
//!
//! Grounded on
//! `original_source/src/code_gen/expr/code_gen_expr_struct.c::code_gen_struct_literal_expression`.

use crate::ast::{Expr, FieldInit};
use crate::codegen::state::{Mode, G};
use crate::codegen::util::mangle;
use crate::error::Result;
use crate::types::{Field, Type};

/// Lower a struct literal. Fields absent from `inits` fall back to the
/// field's declared default expression, or its zero value when the field has none.
pub fn gen_struct_literal(
    g: &mut G,
    struct_name: &str,
    inits: &[FieldInit],
    ty: &Type,
    lower_expr: impl Fn(&mut G, &Expr) -> Result<String> + Copy,
) -> Result<String> {
    let Type::Struct {
        c_alias, fields, ..
    } = ty
    else {
        return Err(crate::error::CodeGenError::InternalAssertion(format!(
            "struct literal `{}` resolved to non-struct type {:?}",
            struct_name, ty
        )));
    };

    let c_type_name = c_alias.clone().unwrap_or_else(|| mangle(struct_name));

    // Nested inside an array compound literal, TCC (and some strict C
    // compilers) reject a nested `(Type){...}` cast: the array's own element
    // type already establishes it, so only the braces are emitted.
    let prefix = if g.in_array_compound_literal {
        "{ ".to_string()
    } else {
        format!("({}){{ ", c_type_name)
    };

    let mut parts = Vec::with_capacity(fields.len());
    for field in fields {
        let init = inits.iter().find(|fi| fi.name == field.name);
        let c_field = field
            .c_alias
            .clone()
            .unwrap_or_else(|| mangle(&field.name));

        let value = match (init, &field.default) {
            (Some(fi), _) => Some(lower_field_value(g, field, &fi.value, lower_expr)?),
            (None, Some(default_expr)) => {
                Some(lower_field_value(g, field, default_expr, lower_expr)?)
            }
            (None, None) => None,
        };

        if let Some(value) = value {
            parts.push(format!(".{} = {}", c_field, value));
        }
        // Fields with neither an explicit initializer nor a default are left
        // out of the initializer list; C zero-initializes the rest.
    }

    Ok(format!("{}{} }}", prefix, parts.join(", ")))
}

fn lower_field_value(
    g: &mut G,
    field: &Field,
    value: &Expr,
    lower_expr: impl Fn(&mut G, &Expr) -> Result<String>,
) -> Result<String> {
    // At file scope, string/array fields can't call runtime helpers inside a
    // global initializer, so they're always null handles.
    if g.current_arena_var.is_none() && matches!(field.ty, Type::String | Type::Array(_)) {
        return Ok("RT_HANDLE_NULL".to_string());
    }
    // Handle-typed fields want a real handle value; everything else lowers
    // in raw mode.
    let mode = if field.ty.is_handle() {
        Mode::Handle
    } else {
        Mode::Raw
    };
    g.with_mode(mode, |g| lower_expr(g, value))
}
