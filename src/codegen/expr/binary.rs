//! Binary/unary operator lowering.
//!
//! Grounded on
//! `original_source/src/code_gen/expr/code_gen_expr_binary.c`
//! (`code_gen_binary_expression`, `code_gen_unary_expression`).

use crate::ast::{BinOp, Expr, UnOp};
use crate::codegen::fold::{fold, render};
use crate::codegen::state::{Mode, G};
use crate::error::Result;
use crate::types::{ArithmeticMode, SyncMod, Type};

fn is_numeric(ty: &Type) -> bool {
    matches!(ty, Type::Int | Type::Long | Type::Double)
}

/// Promote the wider of two numeric operand types (double > long > int);
/// non-numeric pairs fall back to the left operand's type.
fn promoted_type<'a>(left: &'a Type, right: &'a Type) -> &'a Type {
    if is_numeric(left) && is_numeric(right) {
        if matches!(left, Type::Double) {
            return left;
        }
        if matches!(right, Type::Double) {
            return right;
        }
        if matches!(left, Type::Long) {
            return left;
        }
        if matches!(right, Type::Long) {
            return right;
        }
    }
    left
}

fn bin_op_str(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "add",
        BinOp::Sub => "sub",
        BinOp::Mul => "mul",
        BinOp::Div => "div",
        BinOp::Mod => "mod",
        BinOp::Eq => "eq",
        BinOp::Ne => "ne",
        BinOp::Lt => "lt",
        BinOp::Le => "le",
        BinOp::Gt => "gt",
        BinOp::Ge => "ge",
        _ => "op",
    }
}

fn array_suffix(elem: &Type) -> Result<&'static str> {
    Ok(match elem {
        Type::Int | Type::Long => "long",
        Type::Int32 => "int32",
        Type::UInt => "uint",
        Type::UInt32 => "uint32",
        Type::Float => "float",
        Type::Double => "double",
        Type::Char => "char",
        Type::Bool => "bool",
        Type::Byte => "byte",
        Type::String => "string",
        other => {
            return Err(crate::error::CodeGenError::UnsupportedConstruct(format!(
                "unsupported array element type for comparison: {:?}",
                other
            )));
        }
    })
}

/// Lower a binary expression. `lower_expr` is the caller's EXPR entry point
/// (kept as a callback to avoid a dependency cycle between `expr::binary`
/// and `expr::mod`).
pub fn gen_binary(
    g: &mut G,
    op: BinOp,
    lhs: &Expr,
    rhs: &Expr,
    ty: &Type,
    lower_expr: impl Fn(&mut G, &Expr) -> Result<String> + Copy,
) -> Result<String> {
    let whole = Expr::Binary {
        op,
        lhs: Box::new(lhs.clone()),
        rhs: Box::new(rhs.clone()),
        ty: ty.clone(),
    };
    if let Some(folded) = fold(&whole) {
        return Ok(render(folded));
    }

    let left_ty = lhs.ty();
    let right_ty = rhs.ty();
    let needs_raw = left_ty.is_handle() || right_ty.is_handle();

    let (left_str, right_str) = if needs_raw {
        g.with_mode(Mode::Raw, |g| -> Result<(String, String)> {
            Ok((lower_expr(g, lhs)?, lower_expr(g, rhs)?))
        })?
    } else {
        (lower_expr(g, lhs)?, lower_expr(g, rhs)?)
    };

    let promoted = promoted_type(left_ty, right_ty).clone();

    if op == BinOp::And {
        return Ok(format!(
            "(({} != 0 && {} != 0) ? 1L : 0L)",
            left_str, right_str
        ));
    }
    if op == BinOp::Or {
        return Ok(format!(
            "(({} != 0 || {} != 0) ? 1L : 0L)",
            left_str, right_str
        ));
    }

    if let Type::Array(elem) = &promoted {
        if matches!(op, BinOp::Eq | BinOp::Ne) {
            if matches!(elem.as_ref(), Type::String) && g.current_arena_var.is_some() {
                let (lh, rh) = g.with_mode(Mode::Handle, |g| -> Result<(String, String)> {
                    Ok((lower_expr(g, lhs)?, lower_expr(g, rhs)?))
                })?;
                let arena = g.current_arena_var.clone().unwrap_or_else(|| "NULL".into());
                let call = format!("rt_array_eq_string_h({}, {}, {})", arena, lh, rh);
                return Ok(if op == BinOp::Eq {
                    call
                } else {
                    format!("(!{})", call)
                });
            }
            let suffix = array_suffix(elem)?;
            let call = format!("rt_array_eq_{}({}, {})", suffix, left_str, right_str);
            return Ok(if op == BinOp::Eq {
                call
            } else {
                format!("(!{})", call)
            });
        }
    }

    let is_pointer_like = matches!(promoted, Type::Pointer(_) | Type::Nil)
        || matches!(left_ty, Type::Pointer(_) | Type::Nil)
        || matches!(right_ty, Type::Pointer(_) | Type::Nil);
    if is_pointer_like && matches!(op, BinOp::Eq | BinOp::Ne) {
        let c_op = if op == BinOp::Eq { "==" } else { "!=" };
        return Ok(format!("(({}) {} ({}))", left_str, c_op, right_str));
    }

    if let Type::Struct { name, .. } = &promoted {
        if matches!(op, BinOp::Eq | BinOp::Ne) {
            let mangled = crate::codegen::util::mangle(name);
            let c_op = if op == BinOp::Eq { "==" } else { "!=" };
            return Ok(format!(
                "(memcmp(&({}), &({}), sizeof({})) {} 0)",
                left_str, right_str, mangled, c_op
            ));
        }
    }

    if matches!(
        op,
        BinOp::BitAnd | BinOp::BitOr | BinOp::BitXor | BinOp::Shl | BinOp::Shr
    ) {
        let c_op = match op {
            BinOp::BitAnd => "&",
            BinOp::BitOr => "|",
            BinOp::BitXor => "^",
            BinOp::Shl => "<<",
            BinOp::Shr => ">>",
            _ => unreachable!(),
        };
        return Ok(format!(
            "((long long)(({}) {} ({})))",
            left_str, c_op, right_str
        ));
    }

    let suffix = match promoted {
        Type::Double | Type::Float => "double",
        Type::String => "string",
        Type::Bool => "bool",
        _ => "long",
    };

    if op == BinOp::Add && matches!(promoted, Type::String) {
        if let Some(arena) = g.current_arena_var.clone() {
            return Ok(if g.mode() == Mode::Handle {
                format!(
                    "rt_str_concat_h({}, RT_HANDLE_NULL, {}, {})",
                    arena, left_str, right_str
                )
            } else {
                format!(
                    "(char *)rt_managed_pin({}, rt_str_concat_h({}, RT_HANDLE_NULL, {}, {}))",
                    arena, arena, left_str, right_str
                )
            });
        }
        return Ok(format!("rt_str_concat(NULL, {}, {})", left_str, right_str));
    }

    // Native C operators in unchecked mode for non-div/mod arithmetic and
    // comparisons; division/modulo always go through the runtime so
    // DivByZero is surfaced.
    if g.arithmetic_mode == ArithmeticMode::Unchecked
        && !matches!(op, BinOp::Div | BinOp::Mod)
        && matches!(promoted, Type::Int | Type::Long | Type::Double | Type::Float)
    {
        if let Some(c_op) = native_c_op(op) {
            if matches!(promoted, Type::Double | Type::Float) {
                return Ok(format!("(({}) {} ({}))", left_str, c_op, right_str));
            }
            return Ok(format!(
                "((long long)(({}) {} ({})))",
                left_str, c_op, right_str
            ));
        }
    }

    Ok(format!(
        "rt_{}_{}({}, {})",
        bin_op_str(op),
        suffix,
        left_str,
        right_str
    ))
}

fn native_c_op(op: BinOp) -> Option<&'static str> {
    Some(match op {
        BinOp::Add => "+",
        BinOp::Sub => "-",
        BinOp::Mul => "*",
        BinOp::Eq => "==",
        BinOp::Ne => "!=",
        BinOp::Lt => "<",
        BinOp::Le => "<=",
        BinOp::Gt => ">",
        BinOp::Ge => ">=",
        _ => return None,
    })
}

/// Lower a unary expression.
pub fn gen_unary(
    g: &mut G,
    op: UnOp,
    operand: &Expr,
    ty: &Type,
    lower_expr: impl Fn(&mut G, &Expr) -> Result<String>,
) -> Result<String> {
    let whole = Expr::Unary {
        op,
        operand: Box::new(operand.clone()),
        ty: ty.clone(),
    };
    if let Some(folded) = fold(&whole) {
        return Ok(render(folded));
    }
    let operand_str = lower_expr(g, operand)?;
    let operand_ty = operand.ty();
    Ok(match op {
        UnOp::Neg => {
            if g.arithmetic_mode == ArithmeticMode::Unchecked {
                if matches!(operand_ty, Type::Double | Type::Float) {
                    format!("(-({}))", operand_str)
                } else {
                    format!("((long long)(-({})))", operand_str)
                }
            } else if matches!(operand_ty, Type::Double | Type::Float) {
                format!("rt_neg_double({})", operand_str)
            } else {
                format!("rt_neg_long({})", operand_str)
            }
        }
        UnOp::Not => format!("rt_not_bool({})", operand_str),
        UnOp::BitNot => format!("((long long)(~({})))", operand_str),
    })
}

/// Lower `++`/`--`. `operand` must be
/// a variable; callers should have already validated this during type
/// checking (external).
pub fn gen_inc_dec(
    g: &mut G,
    op: crate::ast::IncDecOp,
    var_name: &str,
    var_ty: &Type,
    sync_mod: SyncMod,
    mem_qual: crate::types::MemQual,
) -> String {
    let mangled = crate::codegen::util::mangle(var_name);
    let addr = if mem_qual == crate::types::MemQual::AsRef {
        mangled.clone()
    } else {
        format!("&{}", mangled)
    };

    if sync_mod == SyncMod::SyncAtomic {
        let builtin = if op == crate::ast::IncDecOp::Inc {
            "__atomic_fetch_add"
        } else {
            "__atomic_fetch_sub"
        };
        return format!("{}({}, 1, __ATOMIC_SEQ_CST)", builtin, addr);
    }

    if matches!(var_ty, Type::Char | Type::Byte) {
        // Avoid an 8-byte read on a 1-byte slot.
        return if op == crate::ast::IncDecOp::Inc {
            format!("{}++", mangled)
        } else {
            format!("{}--", mangled)
        };
    }

    let f = if op == crate::ast::IncDecOp::Inc {
        "rt_post_inc_long"
    } else {
        "rt_post_dec_long"
    };
    format!("{}({})", f, addr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Literal;

    fn lit_int(v: i64) -> Expr {
        Expr::Literal {
            value: Literal::Int(v),
            ty: Type::Int,
        }
    }

    fn var(name: &str, ty: Type) -> Expr {
        Expr::Variable {
            name: name.to_string(),
            ty,
        }
    }

    fn dummy_lower(_g: &mut G, e: &Expr) -> Result<String> {
        match e {
            Expr::Variable { name, .. } => Ok(crate::codegen::util::mangle(name)),
            Expr::Literal {
                value: Literal::Int(v),
                ..
            } => Ok(crate::codegen::util::format_int_literal(*v)),
            _ => unreachable!(),
        }
    }

    fn fresh_g(table: &crate::symbols::SymbolTable) -> G {
        G::new(table, crate::config::CodegenConfig::new())
    }

    #[test]
    fn constant_fold_emits_literal() {
        let table = crate::symbols::SymbolTable::new();
        let mut g = fresh_g(&table);
        let out = gen_binary(
            &mut g,
            BinOp::Add,
            &lit_int(1),
            &lit_int(2),
            &Type::Int,
            dummy_lower,
        )
        .unwrap();
        assert_eq!(out, "3LL");
    }

    #[test]
    fn unchecked_native_arithmetic() {
        let table = crate::symbols::SymbolTable::new();
        let mut g = fresh_g(&table);
        g.arithmetic_mode = ArithmeticMode::Unchecked;
        let out = gen_binary(
            &mut g,
            BinOp::Add,
            &var("x", Type::Int),
            &lit_int(3),
            &Type::Int,
            dummy_lower,
        )
        .unwrap();
        assert_eq!(out, "((long long)((__sn__x) + (3LL)))");
    }

    #[test]
    fn checked_mode_routes_through_runtime() {
        let table = crate::symbols::SymbolTable::new();
        let mut g = fresh_g(&table);
        let out = gen_binary(
            &mut g,
            BinOp::Add,
            &var("x", Type::Int),
            &lit_int(3),
            &Type::Int,
            dummy_lower,
        )
        .unwrap();
        assert_eq!(out, "rt_add_long(__sn__x, 3LL)");
    }

    #[test]
    fn struct_equality_uses_memcmp() {
        let table = crate::symbols::SymbolTable::new();
        let mut g = fresh_g(&table);
        let sty = Type::Struct {
            name: "Point".into(),
            c_alias: None,
            is_native: false,
            pass_self_by_ref: false,
            fields: vec![],
            methods: vec![],
        };
        let out = gen_binary(
            &mut g,
            BinOp::Eq,
            &var("a", sty.clone()),
            &var("b", sty.clone()),
            &sty,
            dummy_lower,
        )
        .unwrap();
        assert!(out.starts_with("(memcmp(&(__sn__a), &(__sn__b), sizeof(__sn__Point)) == 0)"));
    }

    #[test]
    fn bitwise_ops_native_cast_long_long() {
        let table = crate::symbols::SymbolTable::new();
        let mut g = fresh_g(&table);
        let out = gen_binary(
            &mut g,
            BinOp::BitAnd,
            &var("a", Type::Int),
            &var("b", Type::Int),
            &Type::Int,
            dummy_lower,
        )
        .unwrap();
        assert_eq!(out, "((long long)((__sn__a) & (__sn__b)))");
    }

    #[test]
    fn short_circuit_and_is_ternary() {
        let table = crate::symbols::SymbolTable::new();
        let mut g = fresh_g(&table);
        let out = gen_binary(
            &mut g,
            BinOp::And,
            &var("a", Type::Bool),
            &var("b", Type::Bool),
            &Type::Bool,
            dummy_lower,
        )
        .unwrap();
        assert_eq!(out, "((__sn__a != 0 && __sn__b != 0) ? 1L : 0L)");
    }

    #[test]
    fn inc_dec_atomic_uses_builtin() {
        let out = gen_inc_dec(
            &mut fresh_g(&crate::symbols::SymbolTable::new()),
            crate::ast::IncDecOp::Inc,
            "counter",
            &Type::Long,
            SyncMod::SyncAtomic,
            crate::types::MemQual::Default,
        );
        assert_eq!(
            out,
            "__atomic_fetch_add(&__sn__counter, 1, __ATOMIC_SEQ_CST)"
        );
    }

    #[test]
    fn inc_dec_char_is_inline() {
        let out = gen_inc_dec(
            &mut fresh_g(&crate::symbols::SymbolTable::new()),
            crate::ast::IncDecOp::Dec,
            "c",
            &Type::Char,
            SyncMod::None,
            crate::types::MemQual::Default,
        );
        assert_eq!(out, "__sn__c--");
    }

    #[test]
    fn inc_dec_default_uses_runtime_helper() {
        let out = gen_inc_dec(
            &mut fresh_g(&crate::symbols::SymbolTable::new()),
            crate::ast::IncDecOp::Inc,
            "x",
            &Type::Long,
            SyncMod::None,
            crate::types::MemQual::Default,
        );
        assert_eq!(out, "rt_post_inc_long(&__sn__x)");
    }
}
