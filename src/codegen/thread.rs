//! THREAD — spawn and sync lowering.
//!
//! Grounded on
//! `original_source/src/code_gen/expr/thread/` (wrapper/args-struct
//! synthesis) and `original_source/src/code_gen/code_gen_expr_thread.c`
//! (sync variants). The args-struct mirrors `RtThreadArgs`'s first eight
//! fields exactly, so the runtime's generic `rt_thread_spawn` can read them
//! regardless of the source-language signature appended after.

use crate::codegen::state::G;
use crate::codegen::type_map::c_type;
use crate::types::{FuncMod, MemQual, Type};

/// One spawned call's argument, as THREAD needs it for the args-struct and
/// wrapper unpacking.
pub struct ThreadArg {
    pub ty: Type,
    pub mem_qual: MemQual,
}

/// The mandatory `RtThreadArgs`-mirroring prefix.
const ARGS_STRUCT_PREFIX: &[&str] = &[
    "void *func_ptr",
    "void *args_data",
    "size_t args_size",
    "RtThreadResult *result",
    "RtArenaV2 *caller_arena",
    "RtArenaV2 *thread_arena",
    "int is_shared",
    "int is_private",
];

/// Synthesize `__ThreadArgs_N__`, the wrapper function, and the call-site
/// spawn statement-expression for `&fn(args)`. `self_expr` is `Some` for a
/// method-call spawn target. Returns `(args_struct_decl, wrapper_fn,
/// call_site_expr)`; callers append the first two to top-level output and
/// emit the third at the expression's position.
pub fn gen_spawn(
    g: &mut G,
    modifier: FuncMod,
    target_name: &str,
    self_expr: Option<&str>,
    args: &[ThreadArg],
    arg_exprs: &[String],
    return_ty: &Type,
    has_body: bool,
) -> (String, String, String) {
    let wrapper_id = g.next_thread_wrapper_id();
    let struct_name = format!("__ThreadArgs_{}__", wrapper_id);
    let wrapper_name = format!("__thread_wrapper_{}__", wrapper_id);

    let mut fields: Vec<String> = ARGS_STRUCT_PREFIX.iter().map(|s| s.to_string()).collect();
    if let Some(_) = self_expr {
        fields.push("void *self".to_string());
    }
    for (i, a) in args.iter().enumerate() {
        let slot_ty = if a.mem_qual == MemQual::AsRef {
            format!("{} *", c_type(&a.ty))
        } else {
            c_type(&a.ty)
        };
        fields.push(format!("{} __arg_{}__", slot_ty, i));
    }
    let struct_decl = format!(
        "typedef struct {{\n{}\n}} {};\n\n",
        fields
            .iter()
            .map(|f| format!("    {};", f))
            .collect::<Vec<_>>()
            .join("\n"),
        struct_name
    );

    let mut unpack = String::new();
    unpack.push_str(&format!(
        "    {} *__targs__ = ({} *)raw;\n",
        struct_name, struct_name
    ));
    unpack.push_str("    rt_set_thread_arena(__targs__->thread_arena);\n");
    unpack.push_str("    RtThreadPanicContext __panic_ctx__;\n");
    unpack.push_str("    rt_thread_panic_context_init(&__panic_ctx__);\n");
    unpack.push_str("    if (setjmp(__panic_ctx__.jump_target) == 0) {\n");

    let mut call_args = Vec::new();
    if has_body {
        call_args.push("__targs__->thread_arena".to_string());
    }
    if self_expr.is_some() {
        call_args.push("__targs__->self".to_string());
    }
    for (i, a) in args.iter().enumerate() {
        // `AsRef` slots are already declared pointer-typed above, so the
        // field itself (not its address) is what the callee expects.
        let is_handle_arg = matches!(a.ty, Type::String | Type::Array(_));
        if is_handle_arg && a.mem_qual != MemQual::AsRef && modifier != FuncMod::Shared {
            // Handles are per-arena; a non-shared spawn must clone the
            // caller's handle into the thread's own arena before the
            // callee can touch it.
            call_args.push(format!(
                "rt_managed_clone(__targs__->thread_arena, __targs__->caller_arena, __targs__->__arg_{}__)",
                i
            ));
        } else {
            call_args.push(format!("__targs__->__arg_{}__", i));
        }
    }

    let call_expr = format!("{}({})", crate::codegen::util::mangle(target_name), call_args.join(", "));
    if matches!(return_ty, Type::Void) {
        unpack.push_str(&format!("        {};\n", call_expr));
    } else {
        unpack.push_str(&format!(
            "        rt_thread_result_set_value(__targs__->result, __targs__->thread_arena, {});\n",
            call_expr
        ));
    }
    unpack.push_str("    }\n");
    unpack.push_str("    rt_thread_panic_context_clear(&__panic_ctx__);\n");
    unpack.push_str("    return NULL;\n");

    let wrapper_fn = format!(
        "static void *{}(void *raw) {{\n{}}}\n\n",
        wrapper_name, unpack
    );

    let arena_expr = g
        .current_arena_var
        .clone()
        .unwrap_or_else(|| "NULL".into());
    let is_shared = if modifier == FuncMod::Shared { 1 } else { 0 };

    let mut call_site = String::from("({\n");
    call_site.push_str(&format!(
        "    {} *__targs__ = rt_arena_v2_alloc({}, sizeof({}));\n",
        struct_name, arena_expr, struct_name
    ));
    call_site.push_str(&format!("    __targs__->caller_arena = {};\n", arena_expr));
    call_site.push_str("    __targs__->thread_arena = NULL;\n");
    call_site.push_str(&format!(
        "    __targs__->result = rt_thread_result_create({});\n",
        arena_expr
    ));
    call_site.push_str(&format!("    __targs__->is_shared = {};\n", is_shared));
    call_site.push_str(&format!(
        "    __targs__->is_private = {};\n",
        if modifier == FuncMod::Private { 1 } else { 0 }
    ));
    if let Some(self_e) = self_expr {
        call_site.push_str(&format!("    __targs__->self = (void *){};\n", self_e));
    }
    for (i, expr) in arg_exprs.iter().enumerate() {
        call_site.push_str(&format!("    __targs__->__arg_{}__ = {};\n", i, expr));
    }
    call_site.push_str(&format!(
        "    RtThread *__handle__ = rt_thread_spawn({}, {}, __targs__);\n",
        arena_expr, wrapper_name
    ));
    call_site.push_str("    __handle__;\n");
    call_site.push_str("})");

    (struct_decl, wrapper_fn, call_site)
}

/// List sync (`[r1, r2]!`): `rt_thread_v2_sync_all`.
pub fn gen_sync_list(handles: &[String]) -> String {
    format!(
        "({{ RtThread *__sync_handles__[] = {{ {} }}; rt_thread_v2_sync_all(__sync_handles__, {}); }})",
        handles.join(", "),
        handles.len()
    )
}

/// What shape the synced result takes, driving which `rt_thread_v2_sync*`
/// variant and promotion path single-handle sync uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncResultShape {
    Void,
    Primitive,
    SimpleHandle,
    DeepArray,
    StructWithHandles,
}

/// Array-of-handles results need an extra promotion pass after sync
/// because each element handle still lives in the thread's own arena;
/// plain arrays of primitives (and bare strings) come back as a single
/// handle the caller's arena can adopt directly.
fn array_needs_deep_promotion(elem: &Type) -> bool {
    matches!(elem, Type::String | Type::Array(_))
}

pub fn sync_result_shape(ty: &Type) -> SyncResultShape {
    match ty {
        Type::Void => SyncResultShape::Void,
        Type::Array(elem) if array_needs_deep_promotion(elem) => SyncResultShape::DeepArray,
        Type::String | Type::Array(_) => SyncResultShape::SimpleHandle,
        Type::Struct { fields, .. } if fields.iter().any(|f| f.ty.is_handle()) => {
            SyncResultShape::StructWithHandles
        }
        _ => SyncResultShape::Primitive,
    }
}

/// Which `rt_promote_array_*_v2` entry point matches a deep-array element
/// shape: a flat array of strings promotes element-by-element, a 2-D array
/// of primitives promotes row-by-row, anything nested deeper than that
/// falls back to the 3-D promoter.
fn promote_array_fn(elem: &Type) -> &'static str {
    match elem {
        Type::String => "rt_promote_array_string_v2",
        Type::Array(inner) if !array_needs_deep_promotion(inner) => "rt_promote_array_2d_v2",
        Type::Array(_) => "rt_promote_array_3d_v2",
        _ => "rt_promote_array_v2",
    }
}

/// Emit `var.field = ...` promotion statements for every handle-typed field
/// of a struct result, copying each field out of the (about-to-be-destroyed)
/// thread arena into the caller's. Grounded on
/// `code_gen_expr_thread_sync.c`'s `gen_struct_field_promotion`: strings
/// promote via `rt_arena_v2_strdup` over a raw pin, arrays via whichever
/// `rt_promote_array_*_v2` entry point their element shape calls for.
fn promote_struct_fields(fields: &[crate::types::Field], var: &str, caller_arena: &str) -> String {
    let mut out = String::new();
    for f in fields {
        if !f.ty.is_handle() {
            continue;
        }
        let field_c = f
            .c_alias
            .clone()
            .unwrap_or_else(|| crate::codegen::util::mangle(&f.name));
        match &f.ty {
            Type::String => out.push_str(&format!(
                "        {var}.{field} = rt_arena_v2_strdup({caller}, (char *)rt_managed_pin({caller}, {var}.{field}));\n",
                var = var, field = field_c, caller = caller_arena
            )),
            Type::Array(elem) => out.push_str(&format!(
                "        {var}.{field} = {promo}({caller}, {var}.{field});\n",
                var = var, field = field_c, promo = promote_array_fn(elem), caller = caller_arena
            )),
            _ => {}
        }
    }
    out
}

/// Single-handle sync (`r!`). `var_name` is `Some` when the synced
/// expression is a bare variable, threading the `__<var>_pending__` guard
/// slot that lets a variable be synced more than once without blocking.
/// `caller_arena` is the in-scope arena the synced value gets promoted into.
pub fn gen_sync_single(handle_expr: &str, ty: &Type, var_name: Option<&str>, caller_arena: &str) -> String {
    let guard = var_name.map(|v| format!("__{}_pending__", v));
    let sync_call = |f: &str| {
        if let Some(g) = &guard {
            format!("({} != NULL ? ({}({}), {} = NULL) : (void)0)", g, f, handle_expr, g)
        } else {
            format!("{}({})", f, handle_expr)
        }
    };

    match sync_result_shape(ty) {
        SyncResultShape::Void => sync_call("rt_thread_v2_sync"),
        SyncResultShape::Primitive => format!(
            "(*(({} *)rt_handle_v2_pin(rt_thread_v2_sync({}))))",
            c_type(ty), handle_expr
        ),
        SyncResultShape::SimpleHandle => format!("rt_thread_v2_sync({})", handle_expr),
        SyncResultShape::DeepArray => {
            let promote_fn = match ty {
                Type::Array(elem) => promote_array_fn(elem),
                _ => "rt_promote_array_v2",
            };
            format!(
                "({{ RtArenaV2 *__ta__ = rt_thread_v2_sync_keep_arena({}); void *__r__ = {}({}, rt_thread_v2_sync({})); rt_arena_v2_destroy(__ta__); __r__; }})",
                handle_expr, promote_fn, caller_arena, handle_expr
            )
        }
        SyncResultShape::StructWithHandles => {
            let fields = match ty {
                Type::Struct { fields, .. } => fields.as_slice(),
                _ => &[],
            };
            let promo = promote_struct_fields(fields, "__result__", caller_arena);
            format!(
                "({{ RtArenaV2 *__ta__ = rt_thread_v2_sync_keep_arena({}); {} __result__ = *(({} *)rt_handle_v2_pin(rt_thread_v2_sync({}))); \n{}        rt_arena_v2_destroy(__ta__); __result__; }})",
                handle_expr, c_type(ty), c_type(ty), handle_expr, promo
            )
        }
    }
}
