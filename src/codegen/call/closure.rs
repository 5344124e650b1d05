//! Calling through a closure value.
//!
//! Grounded on the `__Closure__ { fn, arena }` shape established in
//! `codegen::expr::lambda`: the stored function pointer is cast to the
//! call's concrete signature and the closure itself is passed as the
//! first argument, mirroring how `wrap_named_function_as_closure`'s
//! adapter reads `__closure__` back out.

use crate::ast::Expr;
use crate::codegen::state::{Mode, G};
use crate::codegen::type_map::c_type;
use crate::error::Result;
use crate::types::Type;

/// Lower `closure_expr(args)` where `closure_expr: Type::Function`.
pub fn gen_closure_call(
    g: &mut G,
    closure: &Expr,
    param_types: &[Type],
    return_ty: &Type,
    args: &[Expr],
    lower_expr: impl Fn(&mut G, &Expr) -> Result<String> + Copy,
) -> Result<String> {
    let closure_expr = g.with_mode(Mode::Raw, |g| lower_expr(g, closure))?;

    let mut lowered_args = Vec::with_capacity(args.len());
    for (i, a) in args.iter().enumerate() {
        let mode = match param_types.get(i) {
            Some(t) if t.is_handle() => Mode::Handle,
            _ => Mode::Raw,
        };
        lowered_args.push(g.with_mode(mode, |g| lower_expr(g, a))?);
    }

    let mut fn_ptr_params = vec!["void *".to_string()];
    fn_ptr_params.extend(param_types.iter().map(c_type));
    let fn_ptr_ty = format!(
        "{} (*)({})",
        c_type(return_ty),
        fn_ptr_params.join(", ")
    );

    let mut call_args = vec![format!("((__Closure__ *){})", closure_expr)];
    call_args.extend(lowered_args);

    let call_expr = format!(
        "(({0})((__Closure__ *){1})->fn)({2})",
        fn_ptr_ty,
        closure_expr,
        call_args.join(", ")
    );

    // Closure args are always lowered in handle mode; pin the result back to
    // a raw pointer when the caller wants one, same as any other
    // handle-producing call.
    Ok(crate::codegen::expr::access::pin_if_needed(g, return_ty, call_expr))
}
