//! Struct method call lowering.
//!
//! Grounded on
//! `original_source/src/code_gen/code_gen_expr_call.c`'s struct-method
//! branch: native methods call either their `c_alias` or the
//! `rt_<lower(struct)>_<method>` convention name, passing `self` by
//! pointer when the struct is opaque or marked `pass_self_by_ref`;
//! source-language methods call the mangled `<Struct>_<method>` name and
//! remain eligible for interception like any other non-native call.

use crate::ast::{Expr, ResolvedMethod};
use crate::codegen::intercept::{emit_call_site, emit_thunk, is_interceptable, InterceptArg};
use crate::codegen::state::{Mode, G};
use crate::codegen::util::{mangle, mangle_method};
use crate::error::Result;
use crate::types::{MemQual, Type};

fn native_callee_name(resolved: &ResolvedMethod) -> String {
    resolved
        .c_alias
        .clone()
        .unwrap_or_else(|| format!("rt_{}_{}", resolved.struct_name.to_lowercase(), resolved.method_name))
}

/// Lower `object.method(args)`. `self_is_rvalue` indicates the object
/// expression isn't an addressable lvalue (e.g. the result of another
/// call), requiring it to be spilled into a named temporary before its
/// address can be taken.
pub fn gen_method_call(
    g: &mut G,
    object: &Expr,
    resolved: &ResolvedMethod,
    args: &[Expr],
    lower_expr: impl Fn(&mut G, &Expr) -> Result<String> + Copy,
) -> Result<String> {
    let needs_self_ptr = resolved.pass_self_by_ref;
    let self_raw = g.with_mode(Mode::Raw, |g| lower_expr(g, object))?;
    let self_expr = if needs_self_ptr && object.is_call() {
        // The call result is an rvalue; spill it to a named temporary
        // before taking its address (struct-returning calls aren't
        // addressable directly in C).
        let tmp = g.next_temp();
        format!(
            "({{ {} {} = {}; &{}; }})",
            crate::codegen::type_map::c_type(object.ty()),
            tmp,
            self_raw,
            tmp
        )
    } else if needs_self_ptr {
        format!("&({})", self_raw)
    } else {
        self_raw
    };

    let mut lowered_args = Vec::with_capacity(args.len());
    for (i, a) in args.iter().enumerate() {
        let param_ty = resolved.param_types.get(i);
        let mode = match param_ty {
            Some(t) if t.is_handle() && !resolved.is_native => Mode::Handle,
            _ => Mode::Raw,
        };
        lowered_args.push(g.with_mode(mode, |g| lower_expr(g, a))?);
    }
    for (i, a) in lowered_args.iter_mut().enumerate() {
        if resolved.param_mem_quals.get(i) == Some(&MemQual::AsRef) {
            *a = format!("&{}", a);
        }
    }

    if resolved.is_native {
        let mut call_args = Vec::new();
        if resolved.has_arena_param {
            call_args.push(g.current_arena_var.clone().unwrap_or_else(|| "NULL".into()));
        }
        call_args.push(self_expr);
        call_args.extend(lowered_args);
        let call = format!("{}({})", native_callee_name(resolved), call_args.join(", "));
        return Ok(crate::codegen::expr::access::pin_if_needed(g, &resolved.return_ty, call));
    }

    let mangled_struct = mangle(&resolved.struct_name);
    let c_name = mangle_method(&mangled_struct, &resolved.method_name);
    let mut call_args = vec![g.current_arena_var.clone().unwrap_or_else(|| "NULL".into())];
    call_args.push(self_expr);
    call_args.extend(lowered_args.clone());
    let direct_call = format!("{}({})", c_name, call_args.join(", "));

    if is_interceptable(false, false, &resolved.param_types, &resolved.return_ty) {
        let intercept_args: Vec<InterceptArg> = lowered_args
            .iter()
            .zip(resolved.param_types.iter())
            .zip(resolved.param_mem_quals.iter())
            .map(|((expr, ty), mq)| InterceptArg {
                expr: expr.clone(),
                ty: ty.clone(),
                mem_qual: *mq,
            })
            .collect();
        let thunk_name = emit_thunk(g, &c_name, &intercept_args, &resolved.return_ty, true);
        let call_site = emit_call_site(
            g,
            &format!("{}.{}", resolved.struct_name, resolved.method_name),
            &thunk_name,
            &intercept_args,
            &direct_call,
            &resolved.return_ty,
        );
        return Ok(crate::codegen::expr::access::pin_if_needed(g, &resolved.return_ty, call_site));
    }

    Ok(crate::codegen::expr::access::pin_if_needed(g, &resolved.return_ty, direct_call))
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

    fn resolved_native(struct_name: &str, method: &str, by_ref: bool) -> ResolvedMethod {
        ResolvedMethod {
            struct_name: struct_name.into(),
            method_name: method.into(),
            c_alias: None,
            is_native: true,
            is_static: false,
            has_arena_param: false,
            has_body: false,
            return_ty: Type::Void,
            param_types: vec![],
            param_mem_quals: vec![],
            pass_self_by_ref: by_ref,
        }
    }

    #[test]
    fn native_method_uses_convention_name() {
        let table = SymbolTable::new();
        let mut g = G::new(&table, CodegenConfig::new());
        let resolved = resolved_native("Point", "reset", false);
        let object = Expr::Variable { name: "p".into(), ty: Type::Int };
        let out = gen_method_call(&mut g, &object, &resolved, &[], lower).unwrap();
        assert_eq!(out, "rt_point_reset(__sn__p)");
    }

    #[test]
    fn native_method_with_c_alias_uses_alias() {
        let table = SymbolTable::new();
        let mut g = G::new(&table, CodegenConfig::new());
        let mut resolved = resolved_native("Point", "reset", false);
        resolved.c_alias = Some("point_reset_impl".into());
        let object = Expr::Variable { name: "p".into(), ty: Type::Int };
        let out = gen_method_call(&mut g, &object, &resolved, &[], lower).unwrap();
        assert!(out.starts_with("point_reset_impl("));
    }

    #[test]
    fn source_method_is_mangled_and_takes_arena() {
        let table = SymbolTable::new();
        let mut g = G::new(&table, CodegenConfig::new());
        g.current_arena_var = Some("__arena__".into());
        let mut resolved = resolved_native("Point", "move", false);
        resolved.is_native = false;
        resolved.return_ty = Type::Void;
        let object = Expr::Variable { name: "p".into(), ty: Type::Int };
        let out = gen_method_call(&mut g, &object, &resolved, &[], lower).unwrap();
        assert!(out.contains("__sn__Point_move(__arena__"));
    }
}
