//! CALL — top-level call dispatch.
//!
//! Routes each `Callee` shape the resolver hands down to the lowering that
//! knows it: builtins first (so `print`/`len`/... never pay mangled-name
//! overhead), then regular/method/namespace/static/closure calls.

pub mod builtin;
pub mod closure;
pub mod method;
pub mod namespace;
pub mod regular;

use crate::ast::{Callee, Expr};
use crate::codegen::state::G;
use crate::error::Result;
use crate::types::Type;

/// Lower an `Expr::Call`. `lower_expr` is the EXPR dispatch entry point,
/// threaded through so argument/object sub-expressions recurse back into
/// the full expression lowering rather than this module special-casing
/// every possible operand shape.
pub fn gen_call(
    g: &mut G,
    callee: &Callee,
    args: &[Expr],
    lower_expr: impl Fn(&mut G, &Expr) -> Result<String> + Copy,
) -> Result<String> {
    match callee {
        Callee::Builtin { name } => {
            let arg_types: Vec<Type> = args.iter().map(|a| a.ty().clone()).collect();
            let arena = g.current_arena_var.clone().unwrap_or_else(|| "NULL".into());
            let mut lowered = Vec::with_capacity(args.len());
            for a in args {
                lowered.push(g.with_mode(crate::codegen::state::Mode::Raw, |g| lower_expr(g, a))?);
            }
            match builtin::gen_builtin_call(name, &arena, &arg_types, &lowered)? {
                Some(out) => Ok(out),
                None => Err(crate::error::CodeGenError::UnsupportedConstruct(format!(
                    "unrecognized builtin call: {}",
                    name
                ))),
            }
        }
        Callee::Function {
            name,
            is_native,
            has_body,
            has_arena_param,
            return_ty,
            param_types,
            param_mem_quals,
            func_mod,
            c_alias,
        } => {
            let fc = regular::FunctionCallee {
                name,
                is_native: *is_native,
                has_body: *has_body,
                has_arena_param: *has_arena_param,
                return_ty,
                param_types,
                param_mem_quals,
                func_mod: *func_mod,
                c_alias: c_alias.as_deref(),
            };
            regular::gen_regular_call(g, &fc, args, lower_expr)
        }
        Callee::Method { object, resolved } => {
            method::gen_method_call(g, object, resolved, args, lower_expr)
        }
        Callee::Namespace { resolved, namespace } => {
            namespace::gen_namespace_call(g, namespace, resolved, args, lower_expr)
        }
        Callee::Static { resolved } => {
            let mut lowered = Vec::with_capacity(args.len());
            for (i, a) in args.iter().enumerate() {
                let mode = match resolved.param_types.get(i) {
                    Some(t) if t.is_handle() => crate::codegen::state::Mode::Handle,
                    _ => crate::codegen::state::Mode::Raw,
                };
                lowered.push(g.with_mode(mode, |g| lower_expr(g, a))?);
            }
            let arena = g.current_arena_var.clone();
            crate::codegen::static_call::gen_static_call(
                &resolved.struct_name,
                resolved,
                &lowered,
                arena.as_deref(),
            )
        }
        Callee::Closure { closure } => {
            let (param_types, return_ty) = match closure.ty() {
                Type::Function { params, return_ty, .. } => (params.clone(), (**return_ty).clone()),
                other => {
                    return Err(crate::error::CodeGenError::UnsupportedConstruct(format!(
                        "call target is not a function type: {:?}",
                        other
                    )))
                }
            };
            closure::gen_closure_call(g, closure, &param_types, &return_ty, args, lower_expr)
        }
    }
}
