//! Lambda/closure lowering.
//!
//! A closure value is `__Closure__ * { fn: void *, arena: RtArenaV2 * }`.
//! Literal lambdas synthesize a top-level static function (captures passed
//! through the closure's `arena`-adjacent environment) the same way the
//! named-function-adapter thunks in
//! `original_source/src/code_gen/expr/code_gen_expr_access.c` synthesize a
//! wrapper: a forward decl in `lambda_forward_decls`, a definition in
//! `lambda_definitions`, and a statement-expression at the call site that
//! builds the `__Closure__` value.

use crate::ast::Stmt;
use crate::codegen::state::G;
use crate::codegen::type_map::c_type;
use crate::codegen::util::mangle;
use crate::error::Result;
use crate::types::{MemQual, Type};

/// Lower a lambda literal to a closure-construction statement expression.
/// `lower_body` renders the lambda's statement list as C statement text
/// (the statement-level driver's job; passed in as a callback to avoid a
/// dependency cycle with that driver).
pub fn gen_lambda(
    g: &mut G,
    params: &[(String, Type, MemQual)],
    body: &[Stmt],
    return_ty: &Type,
    captures: &[String],
    lower_body: impl FnOnce(&mut G, &[Stmt]) -> Result<String>,
) -> Result<String> {
    let wrapper_id = g.next_wrapper_id();
    let fn_name = format!("__lambda_{}__", wrapper_id);

    let mut params_decl = "void *__closure__".to_string();
    for (name, ty, _) in params {
        params_decl.push_str(&format!(", {} {}", c_type(ty), mangle(name)));
    }

    // Captures are read back out of the closure's environment pointer
    // (stored alongside `fn`/`arena` by convention: the environment is the
    // `arena` slot reinterpreted as a struct pointer when captures are
    // non-empty, matching the "arena slot doubles as env" convention the
    // thunk synthesis elsewhere in this crate follows for closures).
    let mut capture_prelude = String::new();
    if !captures.is_empty() {
        let env_name = format!("__env_{}__", wrapper_id);
        capture_prelude.push_str(&format!(
            "struct {} *{} = (struct {} *)((__Closure__ *)__closure__)->arena;\n",
            env_struct_name(&fn_name),
            env_name,
            env_struct_name(&fn_name)
        ));
        for cap in captures {
            capture_prelude.push_str(&format!(
                "    {} {} = {}->{};\n",
                "__auto_type",
                mangle(cap),
                env_name,
                mangle(cap)
            ));
        }
    }

    let body_code = lower_body(g, body)?;
    let ret_c = c_type(return_ty);
    let is_void = matches!(return_ty, Type::Void);

    let definition = if is_void {
        format!(
            "static void {}({}) {{\n{}    {}\n}}\n\n",
            fn_name, params_decl, capture_prelude, body_code
        )
    } else {
        format!(
            "static {} {}({}) {{\n{}    {}\n}}\n\n",
            ret_c, fn_name, params_decl, capture_prelude, body_code
        )
    };

    g.lambda_forward_decls
        .push_str(&format!("static {} {}({});\n", ret_c, fn_name, params_decl));
    g.lambda_definitions.push_str(&definition);

    let arena_expr = g.current_arena_var.clone();
    Ok(match arena_expr {
        Some(arena) => format!(
            "({{ __Closure__ *__cl__ = rt_arena_alloc({}, sizeof(__Closure__)); __cl__->fn = (void *)&{}; __cl__->arena = {}; __cl__; }})",
            arena, fn_name, arena
        ),
        None => format!(
            "({{ __Closure__ *__cl__ = malloc(sizeof(__Closure__)); __cl__->fn = (void *)&{}; __cl__->arena = NULL; __cl__; }})",
            fn_name
        ),
    })
}

fn env_struct_name(fn_name: &str) -> String {
    format!("__env_struct_{}", fn_name.trim_matches('_'))
}

/// Wrap a bare reference to a named function in an adapter thunk so it can
/// be stored/passed as a `__Closure__ *`. Grounded verbatim on the
/// struct-field/assignment wrapper synthesis in `code_gen_expr_access.c`
/// (same wrapper shape, independent of which call site triggers it).
pub fn wrap_named_function_as_closure(
    g: &mut G,
    func_name: &str,
    return_ty: &Type,
    param_types: &[Type],
    func_has_body: bool,
) -> String {
    let wrapper_id = g.next_wrapper_id();
    let wrapper_name = format!("__wrap_{}__", wrapper_id);
    let ret_c = c_type(return_ty);
    let mangled_fn = mangle(func_name);

    let mut params_decl = "void *__closure__".to_string();
    let mut args_forward = if func_has_body {
        "(RtManagedArena *)rt_get_thread_arena_or(((__Closure__ *)__closure__)->arena)".to_string()
    } else {
        String::new()
    };
    for (p, ty) in param_types.iter().enumerate() {
        params_decl.push_str(&format!(", {} __p{}__", c_type(ty), p));
        if p > 0 || func_has_body {
            args_forward.push_str(", ");
        }
        args_forward.push_str(&format!("__p{}__", p));
    }

    let is_void = matches!(return_ty, Type::Void);
    let definition = if is_void {
        format!(
            "static void {}({}) {{\n    (void)__closure__;\n    {}({});\n}}\n\n",
            wrapper_name, params_decl, mangled_fn, args_forward
        )
    } else {
        format!(
            "static {} {}({}) {{\n    (void)__closure__;\n    return {}({});\n}}\n\n",
            ret_c, wrapper_name, params_decl, mangled_fn, args_forward
        )
    };

    g.lambda_forward_decls
        .push_str(&format!("static {} {}({});\n", ret_c, wrapper_name, params_decl));
    g.lambda_definitions.push_str(&definition);

    match g.current_arena_var.clone() {
        Some(arena) => format!(
            "({{ __Closure__ *__cl__ = rt_arena_alloc({}, sizeof(__Closure__)); __cl__->fn = (void *)&{}; __cl__->arena = {}; __cl__; }})",
            arena, wrapper_name, arena
        ),
        None => format!(
            "({{ __Closure__ *__cl__ = malloc(sizeof(__Closure__)); __cl__->fn = (void *)&{}; __cl__->arena = NULL; __cl__; }})",
            wrapper_name
        ),
    }
}
