//! EXPR — top-level expression lowering dispatch.
//!
//! Every other lowering module (`binary`, `access`, `collections`,
//! `struct_lit`, `lambda`, and the sibling `call`/`intercept`/`thread`/
//! `interp`/`static_call`/`type_query` modules) takes its recursive
//! sub-expression lowering as a `lower_expr` callback rather than calling
//! back into this module directly, so none of them depend on this file;
//! `gen_expression` is simply where all those callbacks are finally tied
//! together into one recursive function.

pub mod access;
pub mod binary;
pub mod collections;
pub mod lambda;
pub mod struct_lit;

use crate::ast::{Expr, Literal};
use crate::codegen::state::G;
use crate::error::Result;
use crate::types::{MemQual, SyncMod, Type};

fn lower_literal(g: &G, value: &Literal, ty: &Type) -> String {
    match value {
        Literal::Int(v) => crate::codegen::util::format_int_literal(*v),
        Literal::Double(v) => crate::codegen::util::format_double_literal(*v),
        Literal::Bool(b) => if *b { "1".to_string() } else { "0".to_string() },
        Literal::Char(c) => crate::codegen::util::escape_char_literal(*c),
        Literal::Byte(b) => format!("((unsigned char){})", b),
        Literal::Str(s) => {
            let lit = crate::codegen::util::escape_string_literal(s);
            if g.mode().is_handle() && g.current_arena_var.is_some() {
                format!(
                    "rt_arena_v2_strdup({}, {})",
                    g.current_arena_var.clone().unwrap(),
                    lit
                )
            } else {
                lit
            }
        }
        Literal::Nil => match ty {
            Type::Array(_) | Type::String => "RT_HANDLE_NULL".to_string(),
            _ => "NULL".to_string(),
        },
    }
}

/// Recursively lower one expression to its C text. This is the
/// `lower_expr` callback every leaf module above expects.
pub fn gen_expression(g: &mut G, e: &Expr) -> Result<String> {
    match e {
        Expr::Literal { value, ty } => Ok(lower_literal(g, value, ty)),

        Expr::Variable { name, ty } => Ok(access::gen_variable(g, name, ty)),

        Expr::Binary { op, lhs, rhs, ty } => {
            binary::gen_binary(g, *op, lhs, rhs, ty, gen_expression)
        }

        Expr::Unary { op, operand, ty } => {
            binary::gen_unary(g, *op, operand, ty, gen_expression)
        }

        Expr::IncDec { op, operand, .. } => {
            let Expr::Variable { name, ty } = operand.as_ref() else {
                return Err(crate::error::CodeGenError::InternalAssertion(
                    "increment/decrement operand is not a variable".to_string(),
                ));
            };
            let symbol = g.symbol_table.lookup(name);
            let sync_mod = symbol.map(|s| s.sync_mod).unwrap_or(SyncMod::None);
            let mem_qual = symbol.map(|s| s.mem_qual).unwrap_or(MemQual::Default);
            Ok(binary::gen_inc_dec(g, *op, name, ty, sync_mod, mem_qual))
        }

        Expr::Member { object, field, namespace, ty } => {
            access::gen_member(g, object, field, namespace, ty, gen_expression)
        }

        Expr::Index { object, index, .. } => access::gen_index(g, object, index, gen_expression),

        Expr::Call { callee, args, .. } => {
            crate::codegen::call::gen_call(g, callee, args, gen_expression)
        }

        Expr::Interpolation { parts, format_specs, .. } => {
            crate::codegen::interp::gen_interpolation(g, parts, format_specs, gen_expression)
        }

        Expr::Range { start, end, .. } => collections::gen_range(g, start, end, gen_expression),

        Expr::Slice { object, bounds, .. } => {
            collections::gen_slice(g, object, bounds, gen_expression)
        }

        Expr::Spread { inner, .. } => collections::gen_spread(g, inner, gen_expression),

        Expr::ArrayLiteral { elements, element_ty, .. } => {
            collections::gen_array_literal(g, elements, element_ty, gen_expression)
        }

        Expr::StructLiteral { struct_name, fields, ty } => {
            struct_lit::gen_struct_literal(g, struct_name, fields, ty, gen_expression)
        }

        Expr::Lambda { params, body, return_ty, captures, .. } => lambda::gen_lambda(
            g,
            params,
            body,
            return_ty,
            captures,
            |g, stmts| crate::codegen::stmt::gen_block(g, stmts),
        ),

        Expr::ThreadSpawn { spawn, .. } => gen_thread_spawn(g, spawn),

        Expr::ThreadSync { target, result_ty, .. } => gen_thread_sync(g, target, result_ty),

        Expr::TypeQuery { kind, operand, ty } => {
            let operand_str = match operand {
                Some(o) => Some(g.with_mode(crate::codegen::state::Mode::Raw, |g| gen_expression(g, o))?),
                None => None,
            };
            crate::codegen::type_query::gen_type_query(
                kind,
                ty,
                operand.as_deref(),
                operand_str.as_deref(),
            )
        }
    }
}

fn gen_thread_spawn(g: &mut G, spawn: &crate::ast::ThreadSpawnExpr) -> Result<String> {
    let Expr::Call { callee, args, ty } = spawn.call.as_ref() else {
        return Err(crate::error::CodeGenError::UnsupportedConstruct(
            "thread spawn target is not a call expression".to_string(),
        ));
    };
    let (target_name, self_expr, param_types, param_mem_quals, has_body) = match callee {
        crate::ast::Callee::Function { name, has_body, param_types, param_mem_quals, .. } => {
            (name.clone(), None, param_types.clone(), param_mem_quals.clone(), *has_body)
        }
        crate::ast::Callee::Method { object, resolved } => {
            let self_str = g.with_mode(crate::codegen::state::Mode::Raw, |g| gen_expression(g, object))?;
            (
                format!("{}_{}", resolved.struct_name, resolved.method_name),
                Some(self_str),
                resolved.param_types.clone(),
                resolved.param_mem_quals.clone(),
                true,
            )
        }
        _ => {
            return Err(crate::error::CodeGenError::UnsupportedConstruct(
                "unsupported thread spawn callee shape".to_string(),
            ))
        }
    };

    let mut thread_args = Vec::with_capacity(args.len());
    let mut arg_exprs = Vec::with_capacity(args.len());
    for (i, a) in args.iter().enumerate() {
        let param_ty = param_types.get(i).unwrap_or(a.ty()).clone();
        let mq = param_mem_quals.get(i).copied().unwrap_or(MemQual::Default);
        let mode = if param_ty.is_handle() {
            crate::codegen::state::Mode::Handle
        } else {
            crate::codegen::state::Mode::Raw
        };
        let lowered = g.with_mode(mode, |g| gen_expression(g, a))?;
        arg_exprs.push(if mq == MemQual::AsRef {
            format!("&({})", lowered)
        } else {
            lowered
        });
        thread_args.push(crate::codegen::thread::ThreadArg {
            ty: param_ty,
            mem_qual: mq,
        });
    }

    let (struct_decl, wrapper_fn, call_site) = crate::codegen::thread::gen_spawn(
        g,
        spawn.modifier,
        &target_name,
        self_expr.as_deref(),
        &thread_args,
        &arg_exprs,
        ty,
        has_body,
    );
    g.lambda_forward_decls.push_str(&struct_decl);
    g.lambda_definitions.push_str(&wrapper_fn);
    Ok(call_site)
}

fn gen_thread_sync(g: &mut G, target: &crate::ast::SyncTarget, result_ty: &Type) -> Result<String> {
    match target {
        crate::ast::SyncTarget::List(handles) => {
            let mut lowered = Vec::with_capacity(handles.len());
            for h in handles {
                lowered.push(g.with_mode(crate::codegen::state::Mode::Raw, |g| gen_expression(g, h))?);
            }
            Ok(crate::codegen::thread::gen_sync_list(&lowered))
        }
        crate::ast::SyncTarget::Single(handle) => {
            let handle_str = g.with_mode(crate::codegen::state::Mode::Raw, |g| gen_expression(g, handle))?;
            let var_name = match handle.as_ref() {
                Expr::Variable { name, .. } => Some(name.as_str()),
                _ => None,
            };
            let caller_arena = g.current_arena_var.clone().unwrap_or_else(|| "NULL".into());
            Ok(crate::codegen::thread::gen_sync_single(
                &handle_str,
                result_ty,
                var_name,
                &caller_arena,
            ))
        }
    }
}
