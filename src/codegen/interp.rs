//! INTERP — string interpolation lowering.
//!
//! Grounded on
//! `original_source/src/code_gen/expr/code_gen_expr_string.c`: fast paths
//! for 0/1/2-part interpolations that need no runtime concatenation chain,
//! falling back to a `rt_str_concat` chain with `rt_format_*` for
//! format-specified parts and struct auto-`toString` for bare struct parts.

use crate::ast::{Expr, FormatSpec};
use crate::codegen::state::{Mode, G};
use crate::codegen::util::escape_string_literal;
use crate::error::Result;
use crate::types::Type;

fn format_fn(spec: &FormatSpec) -> &'static str {
    match spec {
        FormatSpec::Long => "rt_format_long",
        FormatSpec::Double { .. } => "rt_format_double",
        FormatSpec::Str => "rt_format_string",
    }
}

fn is_string_ish(e: &Expr) -> bool {
    matches!(e.ty(), Type::String)
}

fn wrap_handle(g: &G, raw: String) -> String {
    if g.mode() == Mode::Handle && g.current_arena_var.is_some() {
        let arena = g.current_arena_var.clone().unwrap();
        format!("rt_arena_v2_strdup({}, {})", arena, raw)
    } else {
        raw
    }
}

/// Lower one interpolation part to a raw `char *` expression: formatted via
/// `rt_format_<kind>` when a spec is present, auto-serialized when it's a
/// struct with no explicit format, or lowered directly (and pinned) when
/// already string-typed.
fn lower_part(
    g: &mut G,
    part: &Expr,
    spec: &Option<FormatSpec>,
    lower_expr: impl Fn(&mut G, &Expr) -> Result<String> + Copy,
) -> Result<String> {
    if let Some(spec) = spec {
        let precision_arg = match spec {
            FormatSpec::Double { precision: Some(p) } => format!(", {}", p),
            FormatSpec::Double { precision: None } => ", -1".to_string(),
            _ => String::new(),
        };
        let value = g.with_mode(Mode::Raw, |g| lower_expr(g, part))?;
        return Ok(format!("{}({}{})", format_fn(spec), value, precision_arg));
    }

    if let Type::Struct { name, methods, .. } = part.ty() {
        let value = g.with_mode(Mode::Raw, |g| lower_expr(g, part))?;
        if methods.iter().any(|m| m.name == "toString") {
            let mangled = crate::codegen::util::mangle(name);
            return Ok(format!(
                "(char *)rt_managed_pin({}, {}_toString({}, &({})))",
                g.current_arena_var.clone().unwrap_or_else(|| "NULL".into()),
                mangled,
                g.current_arena_var.clone().unwrap_or_else(|| "NULL".into()),
                value
            ));
        }
        return Ok(format!("rt_auto_to_string(&({}), {})", value, crate::codegen::type_map::struct_type_id(name)));
    }

    g.with_mode(Mode::Raw, |g| lower_expr(g, part))
}

/// Full interpolation lowering dispatch.
pub fn gen_interpolation(
    g: &mut G,
    parts: &[Expr],
    format_specs: &[Option<FormatSpec>],
    lower_expr: impl Fn(&mut G, &Expr) -> Result<String> + Copy,
) -> Result<String> {
    if parts.is_empty() {
        return Ok(wrap_handle(g, escape_string_literal("")));
    }

    if parts.len() == 1 && format_specs[0].is_none() && is_string_ish(&parts[0]) {
        let value = g.with_mode(Mode::Raw, |g| lower_expr(g, &parts[0]))?;
        return Ok(wrap_handle(g, value));
    }

    if parts.len() == 2
        && format_specs.iter().all(Option::is_none)
        && parts.iter().all(is_string_ish)
    {
        let a = g.with_mode(Mode::Raw, |g| lower_expr(g, &parts[0]))?;
        let b = g.with_mode(Mode::Raw, |g| lower_expr(g, &parts[1]))?;
        let arena = g.current_arena_var.clone();
        return Ok(match (g.mode(), arena) {
            (Mode::Handle, Some(arena)) => {
                format!("rt_str_concat_h({}, RT_HANDLE_NULL, {}, {})", arena, a, b)
            }
            _ => format!("rt_str_concat(NULL, {}, {})", a, b),
        });
    }

    let mut chain: Option<String> = None;
    for (part, spec) in parts.iter().zip(format_specs.iter()) {
        let rendered = lower_part(g, part, spec, lower_expr)?;
        chain = Some(match chain {
            None => rendered,
            Some(acc) => format!("rt_str_concat(NULL, {}, {})", acc, rendered),
        });
    }
    let joined = chain.unwrap();
    Ok(wrap_handle(g, joined))
}
