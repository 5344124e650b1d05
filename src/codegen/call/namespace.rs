//! Namespace call lowering: `ns.f(...)` / `ns1.ns2.f(...)`.
//!
//! Grounded on `original_source/src/code_gen/code_gen_expr_call.c`'s
//! namespace-call branch and `codegen::expr::access::gen_namespace_member`'s
//! name-resolution rules: a native symbol calls its `c_alias` directly,
//! everything else is identical to a regular call except the mangled name
//! carries the namespace prefix (`__sn__<prefix>__<f>`).

use crate::ast::{Expr, NamespaceRef, ResolvedMethod};
use crate::codegen::call::regular::{gen_regular_call, FunctionCallee};
use crate::codegen::util::mangle_namespaced;
use crate::error::Result;
use crate::types::{FuncMod, Type};

fn namespace_prefix(ns: &NamespaceRef) -> String {
    match &ns.nested {
        Some(inner) => format!("{}__{}", ns.prefix, namespace_prefix(inner)),
        None => ns.prefix.clone(),
    }
}

/// Lower `ns.f(args)` (possibly nested).
pub fn gen_namespace_call(
    g: &mut crate::codegen::state::G,
    namespace: &NamespaceRef,
    resolved: &ResolvedMethod,
    args: &[Expr],
    lower_expr: impl Fn(&mut crate::codegen::state::G, &Expr) -> Result<String> + Copy,
) -> Result<String> {
    if resolved.is_native {
        if let Some(alias) = &resolved.c_alias {
            let mut lowered = Vec::with_capacity(args.len());
            for a in args {
                lowered.push(g.with_mode(crate::codegen::state::Mode::Raw, |g| lower_expr(g, a))?);
            }
            let mut call_args = Vec::new();
            if resolved.has_arena_param {
                call_args.push(g.current_arena_var.clone().unwrap_or_else(|| "NULL".into()));
            }
            call_args.extend(lowered);
            return Ok(format!("{}({})", alias, call_args.join(", ")));
        }
    }

    let prefix = namespace_prefix(namespace);
    let mangled_name = mangle_namespaced(&prefix, &resolved.method_name);
    let callee = FunctionCallee {
        name: &mangled_name["__sn__".len()..],
        is_native: resolved.is_native,
        has_body: resolved.has_body,
        has_arena_param: resolved.has_arena_param,
        return_ty: &resolved.return_ty,
        param_types: &resolved.param_types,
        param_mem_quals: &resolved.param_mem_quals,
        func_mod: FuncMod::Default,
        c_alias: if resolved.is_native { resolved.c_alias.as_deref() } else { Some(mangled_name.as_str()) },
    };
    gen_regular_call(g, &callee, args, lower_expr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Literal;
    use crate::config::CodegenConfig;
    use crate::symbols::SymbolTable;
    use crate::types::MemQual;

    fn lower(g: &mut crate::codegen::state::G, e: &Expr) -> Result<String> {
        match e {
            Expr::Literal { value: Literal::Int(v), .. } => Ok(crate::codegen::util::format_int_literal(*v)),
            _ => unreachable!(),
        }
    }

    #[test]
    fn native_namespace_call_uses_c_alias() {
        let table = SymbolTable::new();
        let mut g = crate::codegen::state::G::new(&table, CodegenConfig::new());
        let ns = NamespaceRef { prefix: "Math".into(), nested: None, is_static_variable: false };
        let resolved = ResolvedMethod {
            struct_name: String::new(),
            method_name: "sqrt".into(),
            c_alias: Some("sqrt".into()),
            is_native: true,
            is_static: true,
            has_arena_param: false,
            has_body: false,
            return_ty: Type::Double,
            param_types: vec![Type::Double],
            param_mem_quals: vec![MemQual::Default],
            pass_self_by_ref: false,
        };
        let args = vec![Expr::Literal { value: Literal::Int(4), ty: Type::Double }];
        let out = gen_namespace_call(&mut g, &ns, &resolved, &args, lower).unwrap();
        assert_eq!(out, "sqrt(4LL)");
    }

    #[test]
    fn source_namespace_function_uses_mangled_prefix() {
        let table = SymbolTable::new();
        let mut g = crate::codegen::state::G::new(&table, CodegenConfig::new());
        g.current_arena_var = Some("__arena__".into());
        let ns = NamespaceRef { prefix: "Util".into(), nested: None, is_static_variable: false };
        let resolved = ResolvedMethod {
            struct_name: String::new(),
            method_name: "helper".into(),
            c_alias: None,
            is_native: false,
            is_static: true,
            has_arena_param: false,
            has_body: true,
            return_ty: Type::Void,
            param_types: vec![],
            param_mem_quals: vec![],
            pass_self_by_ref: false,
        };
        let out = gen_namespace_call(&mut g, &ns, &resolved, &[], lower).unwrap();
        assert!(out.contains("__sn__Util__helper(__arena__)"));
    }
}
