//! INTERCEPT — thunk synthesis and call-site emission.
//!
//! Grounded on
//! `original_source/src/code_gen/code_gen_expr_call_intercept.c::code_gen_intercepted_call`:
//! a thunk that reads its arguments out of the thread-local
//! `__rt_thunk_args`/`__rt_thunk_arena` slots, unboxes per declared
//! parameter type (or declares a local + writes back for `AsRef`
//! parameters), calls the real function, and boxes the result; the call
//! site branches on `rt_interceptor_count() > 0` so the fast path pays no
//! boxing cost.

use crate::codegen::boxing::{box_expr, boxing_function, element_type_tag, unboxing_function};
use crate::codegen::state::G;
use crate::codegen::type_map::c_type;
use crate::types::{MemQual, Type};

/// One call argument as INTERCEPT needs to see it: its already-lowered C
/// text (handle-mode representation) plus its declared parameter type and
/// memory qualifier.
pub struct InterceptArg {
    pub expr: String,
    pub ty: Type,
    pub mem_qual: MemQual,
}

/// Whether a call is eligible for the interceptor path at all.
pub fn is_interceptable(
    callee_is_native: bool,
    struct_is_native: bool,
    param_types: &[Type],
    return_ty: &Type,
) -> bool {
    if callee_is_native || struct_is_native {
        return false;
    }
    if matches!(return_ty, Type::Pointer(_) | Type::Struct { .. }) {
        return false;
    }
    !param_types
        .iter()
        .any(|t| matches!(t, Type::Pointer(_) | Type::Struct { .. }))
}

/// Emit the thunk forward declaration and definition for one interceptable
/// call, appending them to `g.thunk_forward_decls`/`g.thunk_definitions`,
/// and return the thunk's name for use at the call site.
pub fn emit_thunk(
    g: &mut G,
    callee_str: &str,
    args: &[InterceptArg],
    return_ty: &Type,
    callee_has_body: bool,
) -> String {
    let thunk_id = g.next_thunk_id();
    let thunk_name = format!("__thunk_{}", thunk_id);

    g.thunk_forward_decls
        .push_str(&format!("static RtAny {}(void);\n", thunk_name));

    let mut body = format!("static RtAny {}(void) {{\n", thunk_name);

    for (i, arg) in args.iter().enumerate() {
        if arg.mem_qual == MemQual::AsRef {
            if let Some(unbox) = unboxing_function(&arg.ty) {
                body.push_str(&format!(
                    "    {} __ref_{} = {}(__rt_thunk_args[{}]);\n",
                    c_type(&arg.ty),
                    i,
                    unbox,
                    i
                ));
            }
        }
    }

    let mut call_args: Vec<String> = Vec::new();
    if callee_has_body {
        call_args.push("(RtArenaV2 *)__rt_thunk_arena".to_string());
    }
    for (i, arg) in args.iter().enumerate() {
        if arg.mem_qual == MemQual::AsRef {
            call_args.push(format!("&__ref_{}", i));
            continue;
        }
        match unboxing_function(&arg.ty) {
            None => call_args.push(format!("__rt_thunk_args[{}]", i)),
            Some(unbox) if matches!(arg.ty, Type::String) => call_args.push(format!(
                "rt_managed_strdup((RtArenaV2 *)__rt_thunk_arena, RT_HANDLE_NULL, {}(__rt_thunk_args[{}]))",
                unbox, i
            )),
            Some(unbox) if matches!(arg.ty, Type::Array(_)) => {
                call_args.push(format!("(RtHandleV2 *)(uintptr_t){}(__rt_thunk_args[{}])", unbox, i))
            }
            Some(unbox) => call_args.push(format!("{}(__rt_thunk_args[{}])", unbox, i)),
        }
    }

    let returns_void = matches!(return_ty, Type::Void);
    if returns_void {
        body.push_str(&format!("    {}({});\n", callee_str, call_args.join(", ")));
        body.push_str("    return rt_box_nil();\n");
    } else {
        match boxing_function(return_ty) {
            None => body.push_str(&format!(
                "    RtAny __result = {}({});\n",
                callee_str,
                call_args.join(", ")
            )),
            Some(_) => body.push_str(&format!(
                "    RtAny __result = {};\n",
                box_expr(
                    return_ty,
                    &format!("{}({})", callee_str, call_args.join(", ")),
                    "(RtArenaV2 *)__rt_thunk_arena"
                )
            )),
        }
        if boxing_function(return_ty).is_some() {
            body.push_str("    return __result;\n");
        } else {
            body.push_str("    return __result;\n");
        }
    }

    for (i, arg) in args.iter().enumerate() {
        if arg.mem_qual == MemQual::AsRef {
            body.push_str(&format!(
                "    __rt_thunk_args[{}] = {};\n",
                i,
                box_expr(&arg.ty, &format!("__ref_{}", i), "(RtArenaV2 *)__rt_thunk_arena")
            ));
        }
    }

    body.push_str("}\n\n");
    g.thunk_definitions.push_str(&body);
    thunk_name
}

/// Emit the call-site statement-expression: fast path when no interceptors
/// are registered, boxed/intercepted/unboxed slow path otherwise.
pub fn emit_call_site(
    g: &mut G,
    name_literal: &str,
    thunk_name: &str,
    args: &[InterceptArg],
    direct_call: &str,
    return_ty: &Type,
) -> String {
    let ret_c = c_type(return_ty);
    let returns_void = matches!(return_ty, Type::Void);
    let arena = g.current_arena_var.clone().unwrap_or_else(|| "NULL".into());

    let mut boxed_args = String::from("__intercept_args__");
    let have_arena = arena != "NULL";
    let decl_args: Vec<String> = args
        .iter()
        .map(|a| match &a.ty {
            Type::Array(elem) if have_arena => format!(
                "rt_box_array((void *)(uintptr_t){}, {})",
                a.expr,
                element_type_tag(elem)
            ),
            Type::Array(elem) => format!("rt_box_array({}, {})", a.expr, element_type_tag(elem)),
            Type::String if have_arena => {
                format!("rt_box_string((char *)rt_managed_pin({}, {}))", arena, a.expr)
            }
            _ => box_expr(&a.ty, &a.expr, &arena),
        })
        .collect();

    let mut stmt = String::from("({\n");
    if !returns_void {
        stmt.push_str(&format!("    {} __result__;\n", ret_c));
    }
    stmt.push_str("    if (rt_interceptor_count() > 0) {\n");
    stmt.push_str(&format!(
        "        RtAny {}[] = {{ {} }};\n",
        boxed_args,
        decl_args.join(", ")
    ));
    stmt.push_str(&format!(
        "        __rt_thunk_args = {}; __rt_thunk_arena = {};\n",
        boxed_args, arena
    ));
    stmt.push_str(&format!(
        "        RtAny __boxed_result__ = rt_call_intercepted(\"{}\", {}, {}, {});\n",
        name_literal,
        boxed_args,
        args.len(),
        thunk_name
    ));
    if !returns_void {
        let unboxed = match return_ty {
            Type::String if have_arena => format!(
                "rt_managed_strdup({}, RT_HANDLE_NULL, {}(__boxed_result__))",
                arena,
                unboxing_function(return_ty).unwrap_or("rt_unbox_string")
            ),
            Type::Array(_) if have_arena => format!(
                "(RtHandleV2 *)(uintptr_t){}(__boxed_result__)",
                unboxing_function(return_ty).unwrap_or("rt_unbox_array")
            ),
            _ => crate::codegen::boxing::unbox_expr(return_ty, "__boxed_result__"),
        };
        stmt.push_str(&format!("        __result__ = {};\n", unboxed));
    }
    for (i, arg) in args.iter().enumerate() {
        if arg.mem_qual == MemQual::AsRef {
            if let Some(unbox) = unboxing_function(&arg.ty) {
                stmt.push_str(&format!(
                    "        {} = {}({}[{}]);\n",
                    arg.expr, unbox, boxed_args, i
                ));
            }
        }
    }
    stmt.push_str("    } else {\n");
    if returns_void {
        stmt.push_str(&format!("        {};\n", direct_call));
    } else {
        stmt.push_str(&format!("        __result__ = {};\n", direct_call));
    }
    stmt.push_str("    }\n");
    if returns_void {
        stmt.push_str("    (void)0;\n");
    } else {
        stmt.push_str("    __result__;\n");
    }
    stmt.push_str("})");
    stmt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CodegenConfig;
    use crate::symbols::SymbolTable;

    #[test]
    fn eligibility_rejects_native_callee() {
        assert!(!is_interceptable(true, false, &[], &Type::Int));
    }

    #[test]
    fn eligibility_rejects_struct_param() {
        let sty = Type::Struct {
            name: "S".into(),
            c_alias: None,
            is_native: false,
            pass_self_by_ref: false,
            fields: vec![],
            methods: vec![],
        };
        assert!(!is_interceptable(false, false, &[sty], &Type::Int));
    }

    #[test]
    fn eligibility_accepts_plain_function() {
        assert!(is_interceptable(false, false, &[Type::Int], &Type::Long));
    }

    #[test]
    fn thunk_emits_forward_decl_and_definition() {
        let table = SymbolTable::new();
        let mut g = G::new(&table, CodegenConfig::new());
        g.current_arena_var = Some("__arena__".into());
        let args = vec![InterceptArg {
            expr: "__sn__x".into(),
            ty: Type::Int,
            mem_qual: MemQual::Default,
        }];
        let name = emit_thunk(&mut g, "__sn__doIt", &args, &Type::Int, true);
        assert_eq!(name, "__thunk_0");
        assert!(g.thunk_forward_decls.contains("static RtAny __thunk_0(void);"));
        assert!(g.thunk_definitions.contains("__rt_thunk_arena"));
        assert!(g.thunk_definitions.contains("rt_unbox_int"));
    }

    #[test]
    fn call_site_branches_on_interceptor_count() {
        let table = SymbolTable::new();
        let mut g = G::new(&table, CodegenConfig::new());
        g.current_arena_var = Some("__arena__".into());
        let args = vec![InterceptArg {
            expr: "__sn__x".into(),
            ty: Type::Int,
            mem_qual: MemQual::Default,
        }];
        let out = emit_call_site(
            &mut g,
            "doIt",
            "__thunk_0",
            &args,
            "__sn__doIt(__arena__, __sn__x)",
            &Type::Int,
        );
        assert!(out.contains("rt_interceptor_count() > 0"));
        assert!(out.contains("rt_call_intercepted(\"doIt\""));
        assert!(out.contains("__sn__doIt(__arena__, __sn__x)"));
    }

    #[test]
    fn call_site_writes_back_as_ref_argument() {
        let table = SymbolTable::new();
        let mut g = G::new(&table, CodegenConfig::new());
        g.current_arena_var = Some("__arena__".into());
        let args = vec![InterceptArg {
            expr: "__sn__x".into(),
            ty: Type::Long,
            mem_qual: MemQual::AsRef,
        }];
        let out = emit_call_site(
            &mut g,
            "bump",
            "__thunk_0",
            &args,
            "__sn__bump(&__sn__x)",
            &Type::Void,
        );
        assert!(out.contains("__sn__x = rt_unbox_long(__intercept_args__[0]);"));
    }

    #[test]
    fn call_site_boxes_handle_mode_string_and_array_args() {
        let table = SymbolTable::new();
        let mut g = G::new(&table, CodegenConfig::new());
        g.current_arena_var = Some("__arena__".into());
        let args = vec![
            InterceptArg {
                expr: "__sn__s".into(),
                ty: Type::String,
                mem_qual: MemQual::Default,
            },
            InterceptArg {
                expr: "__sn__a".into(),
                ty: Type::Array(Box::new(Type::Int)),
                mem_qual: MemQual::Default,
            },
        ];
        let out = emit_call_site(
            &mut g,
            "take",
            "__thunk_0",
            &args,
            "__sn__take(__arena__, __sn__s, __sn__a)",
            &Type::Void,
        );
        assert!(out.contains("rt_box_string((char *)rt_managed_pin(__arena__, __sn__s))"));
        assert!(out.contains("rt_box_array((void *)(uintptr_t)__sn__a, RT_ANY_INT)"));
    }
}
