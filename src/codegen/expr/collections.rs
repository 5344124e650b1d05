//! Array literal, range, slice, and spread lowering.
//!
//! Range is grounded on
//! `original_source/src/code_gen/expr/code_gen_expr_misc.c::code_gen_range_expression`;
//! array literal and slice follow the same handle/raw and arena-suffix
//! discipline every other EXPR rule in that file uses.

use crate::ast::{Expr, SliceBounds};
use crate::codegen::state::{Mode, G};
use crate::codegen::type_map::c_array_elem_type;
use crate::error::Result;
use crate::types::Type;

/// `a..b` -> `rt_array_range[_v2](arena, a, b)`.
pub fn gen_range(
    g: &mut G,
    start: &Expr,
    end: &Expr,
    lower_expr: impl Fn(&mut G, &Expr) -> Result<String>,
) -> Result<String> {
    let start_str = lower_expr(g, start)?;
    let end_str = lower_expr(g, end)?;
    let arena = g.current_arena_var.clone().unwrap_or_else(|| "NULL".into());
    let f = if g.mode() == Mode::Handle && g.current_arena_var.is_some() {
        "rt_array_range_v2"
    } else {
        "rt_array_range"
    };
    Ok(format!("{}({}, {}, {})", f, arena, start_str, end_str))
}

/// Spread simply forwards the inner array — it only has lowering weight
/// inside an enclosing array literal, which flattens it there instead.
pub fn gen_spread(
    g: &mut G,
    inner: &Expr,
    lower_expr: impl Fn(&mut G, &Expr) -> Result<String>,
) -> Result<String> {
    lower_expr(g, inner)
}

/// `arr[s..e:step]`: each side is either the lowered bound expression or the
/// runtime's null sentinel when omitted.
pub fn gen_slice(
    g: &mut G,
    object: &Expr,
    bounds: &SliceBounds,
    lower_expr: impl Fn(&mut G, &Expr) -> Result<String> + Copy,
) -> Result<String> {
    let elem = match object.ty() {
        Type::Array(e) => e.as_ref().clone(),
        other => {
            return Err(crate::error::CodeGenError::UnsupportedConstruct(format!(
                "slice on non-array type {:?}",
                other
            )));
        }
    };
    let object_str = g.with_mode(Mode::Handle, |g| lower_expr(g, object))?;
    let side = |g: &mut G, side: &Option<Box<Expr>>| -> Result<String> {
        match side {
            Some(e) => lower_expr(g, e),
            None => Ok("RT_SLICE_NONE".to_string()),
        }
    };
    let start = side(g, &bounds.start)?;
    let end = side(g, &bounds.end)?;
    let step = side(g, &bounds.step)?;
    let arena = g.current_arena_var.clone().unwrap_or_else(|| "NULL".into());
    let suffix = crate::codegen::type_map::type_suffix(&elem);
    Ok(format!(
        "rt_array_slice_{}({}, {}, {}, {}, {})",
        suffix, arena, object_str, start, end, step
    ))
}

/// Array literal -> `rt_array_create_<suffix>[_v2](arena, n, (T[]){e0, e1, ...})`.
/// An empty literal with a known element type from context produces a
/// zero-length array of that type rather than an empty C array (which is
/// invalid).
pub fn gen_array_literal(
    g: &mut G,
    elements: &[Expr],
    element_ty: &Type,
    lower_expr: impl Fn(&mut G, &Expr) -> Result<String> + Copy,
) -> Result<String> {
    let suffix = crate::codegen::type_map::type_suffix(element_ty);
    let arena = g.current_arena_var.clone().unwrap_or_else(|| "NULL".into());
    let use_handle = g.mode() == Mode::Handle && g.current_arena_var.is_some();
    let alloc_fn = format!(
        "rt_array_create_{}{}",
        suffix,
        if use_handle { "_v2" } else { "" }
    );

    if elements.is_empty() {
        return Ok(format!("{}({}, 0, NULL)", alloc_fn, arena));
    }

    let saved = g.in_array_compound_literal;
    g.in_array_compound_literal = true;
    let elem_c = c_array_elem_type(element_ty);
    let mode = if element_ty.is_handle() {
        Mode::Handle
    } else {
        Mode::Raw
    };
    let rendered: Result<Vec<String>> = g.with_mode(mode, |g| {
        elements.iter().map(|e| lower_expr(g, e)).collect()
    });
    g.in_array_compound_literal = saved;
    let rendered = rendered?;

    Ok(format!(
        "{}({}, {}, ({}[]){{{}}})",
        alloc_fn,
        arena,
        elements.len(),
        elem_c,
        rendered.join(", ")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Literal;
    use crate::config::CodegenConfig;
    use crate::symbols::SymbolTable;

    fn fresh_g(table: &SymbolTable) -> G {
        let mut g = G::new(table, CodegenConfig::new());
        g.current_arena_var = Some("__arena__".into());
        g
    }

    fn lit(v: i64) -> Expr {
        Expr::Literal {
            value: Literal::Int(v),
            ty: Type::Int,
        }
    }

    fn lower(_g: &mut G, e: &Expr) -> Result<String> {
        match e {
            Expr::Literal {
                value: Literal::Int(v),
                ..
            } => Ok(crate::codegen::util::format_int_literal(*v)),
            _ => unreachable!(),
        }
    }

    #[test]
    fn range_handle_mode_uses_v2() {
        let table = SymbolTable::new();
        let mut g = fresh_g(&table);
        let out = gen_range(&mut g, &lit(0), &lit(5), lower).unwrap();
        assert_eq!(out, "rt_array_range_v2(__arena__, 0LL, 5LL)");
    }

    #[test]
    fn range_raw_mode_drops_v2() {
        let table = SymbolTable::new();
        let mut g = fresh_g(&table);
        g.expr_as_handle = false;
        let out = gen_range(&mut g, &lit(0), &lit(5), lower).unwrap();
        assert_eq!(out, "rt_array_range(__arena__, 0LL, 5LL)");
    }

    #[test]
    fn empty_array_literal_has_zero_length() {
        let table = SymbolTable::new();
        let mut g = fresh_g(&table);
        let out = gen_array_literal(&mut g, &[], &Type::Int, lower).unwrap();
        assert_eq!(out, "rt_array_create_long_v2(__arena__, 0, NULL)");
    }

    #[test]
    fn nonempty_array_literal_builds_compound_literal() {
        let table = SymbolTable::new();
        let mut g = fresh_g(&table);
        let out = gen_array_literal(&mut g, &[lit(1), lit(2)], &Type::Int, lower).unwrap();
        assert_eq!(
            out,
            "rt_array_create_long_v2(__arena__, 2, (long long[]){1LL, 2LL})"
        );
    }

    #[test]
    fn slice_missing_sides_use_null_sentinel() {
        let table = SymbolTable::new();
        let mut g = fresh_g(&table);
        let object = Expr::Variable {
            name: "xs".into(),
            ty: Type::Array(Box::new(Type::Int)),
        };
        let bounds = SliceBounds {
            start: Some(Box::new(lit(1))),
            end: None,
            step: None,
        };
        let out = gen_slice(&mut g, &object, &bounds, |g, e| match e {
            Expr::Variable { name, .. } => Ok(crate::codegen::util::mangle(name)),
            _ => lower(g, e),
        })
        .unwrap();
        assert_eq!(
            out,
            "rt_array_slice_long(__arena__, __sn__xs, 1LL, RT_SLICE_NONE, RT_SLICE_NONE)"
        );
    }
}
