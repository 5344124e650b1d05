//! STATIC calls — `Type.method(...)`.
//!
//! Grounded on
//! `original_source/src/code_gen/expr/code_gen_expr_static.c`: the
//! `Interceptor.*` built-in table maps 1:1 onto `rt_interceptor_*`; any
//! other static target is a user-defined static method dispatched by its
//! resolved mangled name.

use crate::ast::ResolvedMethod;
use crate::error::Result;

/// `Interceptor.register/registerWhere/clearAll/isActive/count` -> the
/// matching `rt_interceptor_*` runtime entry point, or `None` if `method`
/// isn't one of the five recognized names.
pub fn interceptor_builtin(method: &str) -> Option<&'static str> {
    Some(match method {
        "register" => "rt_interceptor_register",
        "registerWhere" => "rt_interceptor_register_where",
        "clearAll" => "rt_interceptor_clear_all",
        "isActive" => "rt_interceptor_is_active",
        "count" => "rt_interceptor_count",
        _ => return None,
    })
}

/// Lower `Type.method(args)`. `type_name` is the static receiver's source
/// name; `Interceptor` is special-cased to the builtin table, everything
/// else goes through the resolved user-defined static method.
pub fn gen_static_call(
    type_name: &str,
    method: &ResolvedMethod,
    args: &[String],
    current_arena_var: Option<&str>,
) -> Result<String> {
    if type_name == "Interceptor" {
        let Some(rt_fn) = interceptor_builtin(&method.method_name) else {
            return Err(crate::error::CodeGenError::UnsupportedConstruct(format!(
                "unknown Interceptor static method `{}`",
                method.method_name
            )));
        };
        return Ok(format!("{}({})", rt_fn, args.join(", ")));
    }

    let mangled_struct = crate::codegen::util::mangle(&method.struct_name);
    let target = crate::codegen::util::mangle_method(&mangled_struct, &method.method_name);

    let mut full_args = Vec::new();
    if method.has_arena_param {
        full_args.push(current_arena_var.unwrap_or("NULL").to_string());
    }
    full_args.extend(args.iter().cloned());
    Ok(format!("{}({})", target, full_args.join(", ")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Type;

    fn method(name: &str, has_arena: bool) -> ResolvedMethod {
        ResolvedMethod {
            struct_name: "Counter".into(),
            method_name: name.into(),
            c_alias: None,
            is_native: false,
            is_static: true,
            has_arena_param: has_arena,
            has_body: true,
            return_ty: Type::Void,
            param_types: vec![],
            param_mem_quals: vec![],
            pass_self_by_ref: false,
        }
    }

    #[test]
    fn interceptor_register_maps_to_runtime_fn() {
        let out = gen_static_call(
            "Interceptor",
            &method("register", false),
            &["\"foo\"".into()],
            None,
        )
        .unwrap();
        assert_eq!(out, "rt_interceptor_register(\"foo\")");
    }

    #[test]
    fn unknown_interceptor_method_errors() {
        assert!(gen_static_call("Interceptor", &method("bogus", false), &[], None).is_err());
    }

    #[test]
    fn user_static_method_prepends_arena_when_required() {
        let out = gen_static_call(
            "Counter",
            &method("reset", true),
            &["1LL".into()],
            Some("__arena__"),
        )
        .unwrap();
        assert_eq!(out, "__sn__Counter_reset(__arena__, 1LL)");
    }
}
