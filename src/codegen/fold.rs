//! FOLD — compile-time evaluator for constant sub-expressions.
//!
//! A total function over the literal/unary/binary sub-language, returning
//! `None` for anything not foldable, including division/modulo by zero.

use crate::ast::{BinOp, Expr, Literal, UnOp};

/// A folded constant: either side of the promotion rule ("any double
/// operand promotes both to double").
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Folded {
    Int(i64),
    Double(f64),
    Bool(bool),
}

impl Folded {
    fn as_f64(self) -> f64 {
        match self {
            Folded::Int(i) => i as f64,
            Folded::Double(d) => d,
            Folded::Bool(b) => b as i64 as f64,
        }
    }

    fn as_i64(self) -> i64 {
        match self {
            Folded::Int(i) => i,
            Folded::Double(d) => d as i64,
            Folded::Bool(b) => b as i64,
        }
    }

    fn as_bool(self) -> bool {
        match self {
            Folded::Bool(b) => b,
            Folded::Int(i) => i != 0,
            Folded::Double(d) => d != 0.0,
        }
    }

    fn is_double(self) -> bool {
        matches!(self, Folded::Double(_))
    }
}

/// Attempt to fold `expr` to a constant. Total over literals and the
/// arithmetic/logical/comparison operators; everything else (variables,
/// calls, ...) returns `None`.
pub fn fold(expr: &Expr) -> Option<Folded> {
    match expr {
        Expr::Literal { value, .. } => fold_literal(value),
        Expr::Unary { op, operand, .. } => fold_unary(*op, fold(operand)?),
        Expr::Binary { op, lhs, rhs, .. } => fold_binary(*op, fold(lhs)?, fold(rhs)?),
        _ => None,
    }
}

fn fold_literal(lit: &Literal) -> Option<Folded> {
    match lit {
        Literal::Int(i) => Some(Folded::Int(*i)),
        Literal::Double(d) => Some(Folded::Double(*d)),
        Literal::Bool(b) => Some(Folded::Bool(*b)),
        _ => None,
    }
}

fn fold_unary(op: UnOp, v: Folded) -> Option<Folded> {
    match op {
        UnOp::Neg => {
            if v.is_double() {
                Some(Folded::Double(-v.as_f64()))
            } else {
                Some(Folded::Int(-v.as_i64()))
            }
        }
        UnOp::Not => Some(Folded::Bool(!v.as_bool())),
        // Bitwise not on a constant is left to native lowering (emits
        // `~(x)` directly); folding does not special-case it.
        UnOp::BitNot => None,
    }
}

fn fold_binary(op: BinOp, l: Folded, r: Folded) -> Option<Folded> {
    let promote_double = l.is_double() || r.is_double();
    match op {
        BinOp::Add | BinOp::Sub | BinOp::Mul => {
            if promote_double {
                let (a, b) = (l.as_f64(), r.as_f64());
                Some(Folded::Double(match op {
                    BinOp::Add => a + b,
                    BinOp::Sub => a - b,
                    BinOp::Mul => a * b,
                    _ => unreachable!(),
                }))
            } else {
                let (a, b) = (l.as_i64(), r.as_i64());
                Some(Folded::Int(match op {
                    BinOp::Add => a.wrapping_add(b),
                    BinOp::Sub => a.wrapping_sub(b),
                    BinOp::Mul => a.wrapping_mul(b),
                    _ => unreachable!(),
                }))
            }
        }
        BinOp::Div | BinOp::Mod => {
            // Division/modulo by zero is never folded — let the runtime raise DivByZero.
            if promote_double {
                if r.as_f64() == 0.0 {
                    return None;
                }
                Some(Folded::Double(if op == BinOp::Div {
                    l.as_f64() / r.as_f64()
                } else {
                    l.as_f64() % r.as_f64()
                }))
            } else {
                if r.as_i64() == 0 {
                    return None;
                }
                Some(Folded::Int(if op == BinOp::Div {
                    l.as_i64() / r.as_i64()
                } else {
                    l.as_i64() % r.as_i64()
                }))
            }
        }
        BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
            let ord = if promote_double {
                l.as_f64().partial_cmp(&r.as_f64())
            } else {
                l.as_i64().partial_cmp(&r.as_i64())
            }?;
            use std::cmp::Ordering::*;
            Some(Folded::Bool(match op {
                BinOp::Eq => ord == Equal,
                BinOp::Ne => ord != Equal,
                BinOp::Lt => ord == Less,
                BinOp::Le => ord != Greater,
                BinOp::Gt => ord == Greater,
                BinOp::Ge => ord != Less,
                _ => unreachable!(),
            }))
        }
        BinOp::And => Some(Folded::Bool(l.as_bool() && r.as_bool())),
        BinOp::Or => Some(Folded::Bool(l.as_bool() || r.as_bool())),
        // Bitwise ops are left to native lowering, same rationale as BitNot.
        BinOp::BitAnd | BinOp::BitOr | BinOp::BitXor | BinOp::Shl | BinOp::Shr => None,
    }
}

/// Render a folded constant the way every integer/double literal is
/// rendered: integers as `NNNLL`, doubles with a `.`/`e`.
pub fn render(folded: Folded) -> String {
    match folded {
        Folded::Int(i) => crate::codegen::util::format_int_literal(i),
        Folded::Double(d) => crate::codegen::util::format_double_literal(d),
        Folded::Bool(b) => {
            crate::codegen::util::format_int_literal(if b { 1 } else { 0 })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Type;

    fn int_lit(v: i64) -> Expr {
        Expr::Literal {
            value: Literal::Int(v),
            ty: Type::Int,
        }
    }

    fn double_lit(v: f64) -> Expr {
        Expr::Literal {
            value: Literal::Double(v),
            ty: Type::Double,
        }
    }

    fn bin(op: BinOp, l: Expr, r: Expr) -> Expr {
        Expr::Binary {
            op,
            lhs: Box::new(l),
            rhs: Box::new(r),
            ty: Type::Int,
        }
    }

    #[test]
    fn one_plus_two_folds_to_three() {
        let e = bin(BinOp::Add, int_lit(1), int_lit(2));
        assert_eq!(fold(&e), Some(Folded::Int(3)));
        assert_eq!(render(fold(&e).unwrap()), "3LL");
    }

    #[test]
    fn division_by_zero_never_folds() {
        let e = bin(BinOp::Div, int_lit(4), int_lit(0));
        assert_eq!(fold(&e), None);
        let e2 = bin(BinOp::Mod, int_lit(4), int_lit(0));
        assert_eq!(fold(&e2), None);
    }

    #[test]
    fn double_operand_promotes_both() {
        let e = bin(BinOp::Add, int_lit(1), double_lit(2.5));
        assert_eq!(fold(&e), Some(Folded::Double(3.5)));
    }

    #[test]
    fn nested_fold() {
        let e = bin(
            BinOp::Mul,
            bin(BinOp::Add, int_lit(1), int_lit(2)),
            int_lit(4),
        );
        assert_eq!(fold(&e), Some(Folded::Int(12)));
    }

    #[test]
    fn comparison_folds_to_bool() {
        let e = bin(BinOp::Lt, int_lit(1), int_lit(2));
        assert_eq!(fold(&e), Some(Folded::Bool(true)));
    }

    #[test]
    fn variable_never_folds() {
        let v = Expr::Variable {
            name: "x".into(),
            ty: Type::Int,
        };
        assert_eq!(fold(&v), None);
        let e = bin(BinOp::Add, v, int_lit(1));
        assert_eq!(fold(&e), None);
    }
}
