//! Variable lookup and member access ("Variables", "Member
//! access (`a.f`)").
//!
//! Grounded on
//! `original_source/src/code_gen/expr/code_gen_expr_member.c::code_gen_member_expression`
//! and `code_gen_expr_access.c::code_gen_member_access_expression`.

use crate::ast::{Expr, NamespaceRef};
use crate::codegen::state::{Mode, G};
use crate::codegen::util::mangle;
use crate::error::Result;
use crate::types::Type;

/// Lower a bare variable reference. Handle-typed variables are pinned when
/// the ambient mode wants a raw pointer.
pub fn gen_variable(g: &mut G, name: &str, ty: &Type) -> String {
    let mangled = mangle(name);
    if g.mode() == Mode::Handle || g.current_arena_var.is_none() {
        return mangled;
    }
    match ty {
        Type::String => {
            let arena = g.current_arena_var.clone().unwrap();
            format!("((char *)rt_managed_pin({}, {}))", arena, mangled)
        }
        Type::Array(elem) => {
            let arena = g.current_arena_var.clone().unwrap();
            let elem_c = crate::codegen::type_map::c_array_elem_type(elem);
            format!(
                "((({}) *)rt_managed_pin_array({}, {}))",
                elem_c, arena, mangled
            )
        }
        _ => mangled,
    }
}

/// Pin a handle-typed field/namespace-variable access result when the
/// caller wants a raw pointer, walking the parent arena chain via
/// `rt_managed_pin[_array]` the way every access site in
/// `code_gen_expr_member.c` does.
pub(crate) fn pin_if_needed(g: &G, field_ty: &Type, accessor: String) -> String {
    if g.mode() == Mode::Handle {
        return accessor;
    }
    let Some(arena) = g.current_arena_var.clone() else {
        return accessor;
    };
    match field_ty {
        Type::String => format!("((char *)rt_managed_pin({}, {}))", arena, accessor),
        Type::Array(elem) => {
            let elem_c = crate::codegen::type_map::c_array_elem_type(elem);
            format!(
                "(({} *)rt_managed_pin_array({}, {}))",
                elem_c, arena, accessor
            )
        }
        _ => accessor,
    }
}

/// Resolve a single struct's field by source name to its emitted C name and
/// declared type, honoring `c_alias` the way the original does.
fn resolve_field<'a>(struct_ty: &'a Type, field_name: &str) -> Option<(&'a crate::types::Field, String)> {
    let Type::Struct { fields, .. } = struct_ty else {
        return None;
    };
    let field = fields.iter().find(|f| f.name == field_name)?;
    let c_name = field
        .c_alias
        .clone()
        .unwrap_or_else(|| mangle(&field.name));
    Some((field, c_name))
}

/// Namespace member access (`ns.f`, `ns1.ns2.f`, static namespace
/// variables). `object_ty` is `None` when the object itself has no static
/// type — the resolver's signal that this is a namespace, not
/// a value.
pub fn gen_namespace_member(
    g: &mut G,
    ns: &NamespaceRef,
    member: &str,
    member_ty: &Type,
) -> Result<String> {
    if let Some(inner) = &ns.nested {
        // ns1.ns2.f: resolve through the nested namespace by its own prefix.
        let prefix = &inner.prefix;
        if let Some(sym) = g.symbol_table.lookup_in_namespace(prefix, member) {
            if sym.is_native {
                return Ok(sym.c_alias.clone().unwrap_or_else(|| mangle(member)));
            }
        }
        return Ok(mangle(member));
    }

    let Some(sym) = g.symbol_table.lookup_in_namespace(&ns.prefix, member) else {
        // Unresolved — the checker should have caught this; emit the
        // defensive marker rather than silently miscompiling.
        return Ok(mangle(member));
    };

    if sym.is_native {
        return Ok(sym.c_alias.clone().unwrap_or_else(|| mangle(member)));
    }

    if sym.is_function {
        return Ok(mangle(member));
    }

    // Static namespace variables share storage under the namespace's
    // canonical module name; non-static ones are prefixed by the raw
    // namespace identifier instead.
    let prefix_to_use = if ns.is_static_variable {
        g.symbol_table
            .lookup_namespace(&ns.prefix)
            .map(|n| n.canonical_module_name.clone())
            .unwrap_or_else(|| ns.prefix.clone())
    } else {
        ns.prefix.clone()
    };

    let mangled = crate::codegen::util::mangle_namespaced(&prefix_to_use, member);
    Ok(pin_if_needed(g, member_ty, mangled))
}

/// Member access dispatch: `Array.length`, `String.length`, struct field
/// (value or pointer receiver). `object` is the already-typed receiver
/// expression; `lower_expr` is the caller's EXPR entry point.
pub fn gen_member(
    g: &mut G,
    object: &Expr,
    field: &str,
    namespace: &Option<NamespaceRef>,
    member_ty: &Type,
    lower_expr: impl Fn(&mut G, &Expr) -> Result<String>,
) -> Result<String> {
    if let Some(ns) = namespace {
        return gen_namespace_member(g, ns, field, member_ty);
    }

    let object_ty = object.ty().clone();

    // Array/string member access must evaluate the receiver in raw mode so
    // handle variables get pinned before `.length` is taken.
    let needs_raw = matches!(object_ty, Type::Array(_) | Type::String);
    let object_str = if needs_raw {
        g.with_mode(Mode::Raw, |g| lower_expr(g, object))?
    } else {
        lower_expr(g, object)?
    };

    match &object_ty {
        Type::Array(_) if field == "length" => {
            return Ok(format!("rt_array_length({})", object_str));
        }
        Type::String if field == "length" => {
            return Ok(format!("rt_str_length({})", object_str));
        }
        _ => {}
    }

    if let Type::Struct { .. } = &object_ty {
        let (field_ty, c_field) = match resolve_field(&object_ty, field) {
            Some((f, c)) => (f.ty.clone(), c),
            None => (Type::Any, mangle(field)),
        };
        let accessor = format!("{}.{}", object_str, c_field);
        return Ok(pin_if_needed(g, &field_ty, accessor));
    }

    if let Type::Pointer(base) = &object_ty {
        if let Type::Struct { .. } = base.as_ref() {
            let (field_ty, c_field) = match resolve_field(base, field) {
                Some((f, c)) => (f.ty.clone(), c),
                None => (Type::Any, mangle(field)),
            };
            let accessor = format!("{}->{}", object_str, c_field);
            return Ok(pin_if_needed(g, &field_ty, accessor));
        }
    }

    Err(crate::error::CodeGenError::UnsupportedConstruct(format!(
        "member access `.{}` on unsupported type {:?}",
        field, object_ty
    )))
}

/// Array element indexing: pins the receiver to a raw element pointer (the
/// same pin every other raw-mode array access uses) and subscripts it.
pub fn gen_index(
    g: &mut G,
    object: &Expr,
    index: &Expr,
    lower_expr: impl Fn(&mut G, &Expr) -> Result<String> + Copy,
) -> Result<String> {
    if !matches!(object.ty(), Type::Array(_)) {
        return Err(crate::error::CodeGenError::UnsupportedConstruct(format!(
            "index access on non-array type {:?}",
            object.ty()
        )));
    }
    let object_str = g.with_mode(Mode::Raw, |g| lower_expr(g, object))?;
    let index_str = lower_expr(g, index)?;
    Ok(format!("({})[{}]", object_str, index_str))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CodegenConfig;
    use crate::symbols::{Namespace, Symbol, SymbolKind, SymbolTable};
    use crate::types::{FuncMod, MemQual, SyncMod};

    fn fresh_g(table: &SymbolTable) -> G {
        let mut g = G::new(table, CodegenConfig::new());
        g.current_arena_var = Some("__arena__".to_string());
        g
    }

    fn sym(name: &str, ty: Type, is_function: bool) -> Symbol {
        Symbol {
            name: name.to_string(),
            kind: SymbolKind::Global,
            ty,
            is_native: false,
            c_alias: None,
            is_function,
            sync_mod: SyncMod::None,
            mem_qual: MemQual::Default,
            func_mod: FuncMod::Default,
            declaration_scope_depth: 0,
        }
    }

    #[test]
    fn variable_in_handle_mode_is_bare_mangled_name() {
        let table = SymbolTable::new();
        let mut g = fresh_g(&table);
        assert_eq!(gen_variable(&mut g, "x", &Type::String), "__sn__x");
    }

    #[test]
    fn raw_mode_pins_handle_typed_variable() {
        let table = SymbolTable::new();
        let mut g = fresh_g(&table);
        g.expr_as_handle = false;
        assert_eq!(
            gen_variable(&mut g, "s", &Type::String),
            "((char *)rt_managed_pin(__arena__, __sn__s))"
        );
    }

    #[test]
    fn array_length_pins_before_calling_rt_array_length() {
        let table = SymbolTable::new();
        let mut g = fresh_g(&table);
        let object = Expr::Variable {
            name: "xs".into(),
            ty: Type::Array(Box::new(Type::Int)),
        };
        let out = gen_member(
            &mut g,
            &object,
            "length",
            &None,
            &Type::Int,
            |g, e| match e {
                Expr::Variable { name, ty } => Ok(gen_variable(g, name, ty)),
                _ => unreachable!(),
            },
        )
        .unwrap();
        assert!(out.starts_with("rt_array_length("));
        assert!(out.contains("rt_managed_pin_array"));
    }

    #[test]
    fn struct_field_access_mangles_field_name() {
        let table = SymbolTable::new();
        let mut g = fresh_g(&table);
        let sty = Type::Struct {
            name: "Point".into(),
            c_alias: None,
            is_native: false,
            pass_self_by_ref: false,
            fields: vec![crate::types::Field {
                name: "x".into(),
                c_alias: None,
                ty: Type::Int,
                default: None,
            }],
            methods: vec![],
        };
        let object = Expr::Variable {
            name: "p".into(),
            ty: sty,
        };
        let out = gen_member(&mut g, &object, "x", &None, &Type::Int, |g, e| match e {
            Expr::Variable { name, ty } => Ok(gen_variable(g, name, ty)),
            _ => unreachable!(),
        })
        .unwrap();
        assert_eq!(out, "__sn__p.__sn__x");
    }

    #[test]
    fn pointer_struct_field_uses_arrow() {
        let table = SymbolTable::new();
        let mut g = fresh_g(&table);
        let sty = Type::Struct {
            name: "Point".into(),
            c_alias: None,
            is_native: false,
            pass_self_by_ref: false,
            fields: vec![crate::types::Field {
                name: "x".into(),
                c_alias: Some("x_".into()),
                ty: Type::Int,
                default: None,
            }],
            methods: vec![],
        };
        let object = Expr::Variable {
            name: "p".into(),
            ty: Type::Pointer(Box::new(sty)),
        };
        let out = gen_member(&mut g, &object, "x", &None, &Type::Int, |g, e| match e {
            Expr::Variable { name, ty } => Ok(gen_variable(g, name, ty)),
            _ => unreachable!(),
        })
        .unwrap();
        assert_eq!(out, "__sn__p->x_");
    }

    #[test]
    fn namespace_static_variable_uses_canonical_module_name() {
        let mut table = SymbolTable::new();
        let mut ns = Namespace::new("__sn__Math");
        ns.insert(sym("pi", Type::Double, false));
        table.add_namespace("Math", ns);
        table.insert(sym("Math", Type::Any, false));
        let mut g = fresh_g(&table);
        let nsref = NamespaceRef {
            prefix: "Math".into(),
            nested: None,
            is_static_variable: true,
        };
        let out = gen_namespace_member(&mut g, &nsref, "pi", &Type::Double).unwrap();
        assert_eq!(out, "__sn____sn__Math__pi");
    }

    #[test]
    fn namespace_function_access_is_bare_mangled_name() {
        let mut table = SymbolTable::new();
        let mut ns = Namespace::new("__sn__Utils");
        ns.insert(sym("helper", Type::Void, true));
        table.add_namespace("Utils", ns);
        let mut g = fresh_g(&table);
        let nsref = NamespaceRef {
            prefix: "Utils".into(),
            nested: None,
            is_static_variable: false,
        };
        let out = gen_namespace_member(&mut g, &nsref, "helper", &Type::Void).unwrap();
        assert_eq!(out, "__sn__helper");
    }

    #[test]
    fn index_pins_array_then_subscripts() {
        let table = SymbolTable::new();
        let mut g = fresh_g(&table);
        let object = Expr::Variable {
            name: "xs".into(),
            ty: Type::Array(Box::new(Type::Int)),
        };
        let index = Expr::Literal {
            value: crate::ast::Literal::Int(0),
            ty: Type::Int,
        };
        let out = gen_index(&mut g, &object, &index, |g, e| match e {
            Expr::Variable { name, ty } => Ok(gen_variable(g, name, ty)),
            Expr::Literal {
                value: crate::ast::Literal::Int(v),
                ..
            } => Ok(crate::codegen::util::format_int_literal(*v)),
            _ => unreachable!(),
        })
        .unwrap();
        assert!(out.contains("rt_managed_pin_array"));
        assert!(out.ends_with(")[0LL]"));
    }
}
