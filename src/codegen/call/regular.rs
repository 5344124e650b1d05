//! Regular (free-function) call lowering.
//!
//! Grounded on
//! `original_source/src/code_gen/code_gen_expr_call.c`: builtins are tried
//! first, then the argument list is built per parameter (arena prepended
//! for callees with a body or a native arena parameter, `Any`-typed
//! parameters receive a boxed argument, `AsRef` parameters pass an
//! address), and eligible calls route through INTERCEPT instead of calling
//! the mangled name directly.

use crate::ast::Expr;
use crate::codegen::boxing::box_expr;
use crate::codegen::call::builtin::gen_builtin_call;
use crate::codegen::intercept::{emit_call_site, emit_thunk, is_interceptable, InterceptArg};
use crate::codegen::state::{Mode, G};
use crate::error::Result;
use crate::types::{FuncMod, MemQual, Type};

/// Everything about a free-function callee that regular-call lowering
/// needs, mirroring `ast::Callee::Function`'s fields.
pub struct FunctionCallee<'a> {
    pub name: &'a str,
    pub is_native: bool,
    pub has_body: bool,
    pub has_arena_param: bool,
    pub return_ty: &'a Type,
    pub param_types: &'a [Type],
    pub param_mem_quals: &'a [MemQual],
    pub func_mod: FuncMod,
    pub c_alias: Option<&'a str>,
}

fn arg_mode(param_ty: &Type, is_native: bool) -> Mode {
    if is_native {
        Mode::Raw
    } else if param_ty.is_handle() {
        Mode::Handle
    } else {
        Mode::Raw
    }
}

/// Lower each argument expression in the mode its declared parameter type
/// and the callee's native-ness require.
fn lower_args(
    g: &mut G,
    args: &[Expr],
    param_types: &[Type],
    is_native: bool,
    lower_expr: impl Fn(&mut G, &Expr) -> Result<String> + Copy,
) -> Result<Vec<String>> {
    args.iter()
        .enumerate()
        .map(|(i, a)| {
            let param_ty = param_types.get(i).unwrap_or(a.ty());
            let mode = arg_mode(param_ty, is_native);
            g.with_mode(mode, |g| lower_expr(g, a))
        })
        .collect()
}

/// Build the final C argument list for a direct call: arena first (when
/// the callee needs one), then each argument boxed/addressed/forwarded per
/// its declared parameter type.
fn build_call_args(
    g: &G,
    raw_args: &[String],
    raw_arg_types: &[Type],
    param_types: &[Type],
    param_mem_quals: &[MemQual],
    needs_arena: bool,
) -> Vec<String> {
    let mut out = Vec::new();
    if needs_arena {
        out.push(g.current_arena_var.clone().unwrap_or_else(|| "NULL".into()));
    }
    for (i, raw) in raw_args.iter().enumerate() {
        let param_ty = param_types.get(i);
        let mem_qual = param_mem_quals.get(i).copied().unwrap_or(MemQual::Default);
        let text = match param_ty {
            Some(Type::Any) if raw_arg_types.get(i).map_or(true, |t| !matches!(t, Type::Any)) => {
                let arena = g.current_arena_var.as_deref().unwrap_or("NULL");
                box_expr(&raw_arg_types[i], raw, arena)
            }
            _ => raw.clone(),
        };
        let text = if mem_qual == MemQual::AsRef {
            format!("&{}", text)
        } else {
            text
        };
        out.push(text);
    }
    out
}

fn is_named_function_literal(e: &Expr) -> Option<&str> {
    match e {
        Expr::Variable { name, ty } if matches!(ty, Type::Function { .. }) => Some(name.as_str()),
        _ => None,
    }
}

/// Lower a regular function call. `name_for_intercept` is the
/// source-language name used in the interceptor registry lookup.
pub fn gen_regular_call(
    g: &mut G,
    callee: &FunctionCallee,
    args: &[Expr],
    lower_expr: impl Fn(&mut G, &Expr) -> Result<String> + Copy,
) -> Result<String> {
    let raw_arg_types: Vec<Type> = args.iter().map(|a| a.ty().clone()).collect();
    let mut lowered = lower_args(g, args, callee.param_types, callee.is_native, lower_expr)?;

    if callee.is_native && !callee.has_arena_param {
        if let Some(out) = gen_builtin_call(
            callee.name,
            &g.current_arena_var.clone().unwrap_or_else(|| "NULL".into()),
            &raw_arg_types,
            &lowered,
        )? {
            return Ok(out);
        }
    }

    for (i, a) in args.iter().enumerate() {
        if let Some(Type::Function { has_body, .. }) = callee.param_types.get(i) {
            if let Some(fn_name) = is_named_function_literal(a) {
                let param_ty = &callee.param_types[i];
                if let Type::Function { return_ty, params, .. } = param_ty {
                    lowered[i] = crate::codegen::expr::lambda::wrap_named_function_as_closure(
                        g, fn_name, return_ty, params, *has_body,
                    );
                }
            }
        }
    }

    let needs_arena = callee.has_body || (callee.is_native && callee.has_arena_param);
    let call_args = build_call_args(
        g,
        &lowered,
        &raw_arg_types,
        callee.param_types,
        callee.param_mem_quals,
        needs_arena,
    );

    let c_name = callee
        .c_alias
        .map(|s| s.to_string())
        .unwrap_or_else(|| crate::codegen::util::mangle(callee.name));
    let direct_call = format!("{}({})", c_name, call_args.join(", "));

    if !callee.is_native
        && is_interceptable(
            callee.is_native,
            false,
            callee.param_types,
            callee.return_ty,
        )
    {
        let intercept_args: Vec<InterceptArg> = lowered
            .iter()
            .zip(callee.param_types.iter())
            .zip(callee.param_mem_quals.iter())
            .map(|((expr, ty), mq)| InterceptArg {
                expr: expr.clone(),
                ty: ty.clone(),
                mem_qual: *mq,
            })
            .collect();
        let thunk_name = emit_thunk(g, &c_name, &intercept_args, callee.return_ty, callee.has_body);
        let call_site = emit_call_site(
            g,
            callee.name,
            &thunk_name,
            &intercept_args,
            &direct_call,
            callee.return_ty,
        );
        return Ok(crate::codegen::expr::access::pin_if_needed(g, callee.return_ty, call_site));
    }

    // A Sindarin-bodied callee returns a handle; pin it to a raw pointer
    // when the caller wants one. Native callees that already return a raw
    // pointer need no such conversion here.
    if callee.has_body {
        return Ok(crate::codegen::expr::access::pin_if_needed(g, callee.return_ty, direct_call));
    }
    Ok(direct_call)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Literal;
    use crate::config::CodegenConfig;
    use crate::symbols::SymbolTable;

    fn lower(g: &mut G, e: &Expr) -> Result<String> {
        match e {
            Expr::Variable { name, ty } => Ok(crate::codegen::expr::access::gen_variable(g, name, ty)),
            Expr::Literal { value: Literal::Int(v), .. } => Ok(crate::codegen::util::format_int_literal(*v)),
            _ => unreachable!(),
        }
    }

    #[test]
    fn builtin_print_shortcircuits_before_mangled_call() {
        let table = SymbolTable::new();
        let mut g = G::new(&table, CodegenConfig::new());
        g.current_arena_var = Some("__arena__".into());
        let callee = FunctionCallee {
            name: "print",
            is_native: true,
            has_body: false,
            has_arena_param: false,
            return_ty: &Type::Void,
            param_types: &[Type::Long],
            param_mem_quals: &[MemQual::Default],
            func_mod: FuncMod::Default,
            c_alias: None,
        };
        let args = vec![Expr::Literal { value: Literal::Int(5), ty: Type::Long }];
        let out = gen_regular_call(&mut g, &callee, &args, lower).unwrap();
        assert_eq!(out, "rt_print_long(5LL)");
    }

    #[test]
    fn non_native_call_with_body_prepends_arena() {
        let table = SymbolTable::new();
        let mut g = G::new(&table, CodegenConfig::new());
        g.current_arena_var = Some("__arena__".into());
        let callee = FunctionCallee {
            name: "add",
            is_native: false,
            has_body: true,
            has_arena_param: false,
            return_ty: &Type::Long,
            param_types: &[Type::Long],
            param_mem_quals: &[MemQual::Default],
            func_mod: FuncMod::Default,
            c_alias: None,
        };
        let args = vec![Expr::Literal { value: Literal::Int(1), ty: Type::Long }];
        let out = gen_regular_call(&mut g, &callee, &args, lower).unwrap();
        assert!(out.contains("__sn__add(__arena__"));
    }

    #[test]
    fn as_ref_primitive_param_passes_address() {
        let table = SymbolTable::new();
        let mut g = G::new(&table, CodegenConfig::new());
        let callee = FunctionCallee {
            name: "bump",
            is_native: false,
            has_body: false,
            has_arena_param: false,
            return_ty: &Type::Void,
            param_types: &[Type::Long],
            param_mem_quals: &[MemQual::AsRef],
            func_mod: FuncMod::Default,
            c_alias: None,
        };
        let args = vec![Expr::Variable { name: "x".into(), ty: Type::Long }];
        let out = gen_regular_call(&mut g, &callee, &args, lower).unwrap();
        assert!(out.contains("&__sn__x"));
    }

    #[test]
    fn string_returning_call_is_pinned_in_raw_mode() {
        let table = SymbolTable::new();
        let mut g = G::new(&table, CodegenConfig::new());
        g.current_arena_var = Some("__arena__".into());
        g.expr_as_handle = false;
        let callee = FunctionCallee {
            name: "greet",
            is_native: false,
            has_body: true,
            has_arena_param: false,
            return_ty: &Type::String,
            param_types: &[],
            param_mem_quals: &[],
            func_mod: FuncMod::Default,
            c_alias: None,
        };
        let out = gen_regular_call(&mut g, &callee, &[], lower).unwrap();
        assert!(out.starts_with("((char *)rt_managed_pin(__arena__,"));
    }
}
