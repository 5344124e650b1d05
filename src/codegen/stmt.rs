//! Minimal statement-sequence lowering for lambda/thread bodies.
//!
//! The full statement-level driver (control flow, loops, match) is an
//! external collaborator — this module only lowers the
//! narrow `Stmt` sum `ast.rs` models (expression-statements, `let`,
//! `return`, assignment), since those are the only statement shapes that
//! nest inside the closure/thread-wrapper bodies this crate itself
//! synthesizes.

use crate::ast::{Expr, Stmt};
use crate::codegen::expr::gen_expression;
use crate::codegen::state::{Mode, G};
use crate::codegen::type_map::c_type;
use crate::codegen::util::mangle;
use crate::error::Result;
use crate::types::MemQual;

fn gen_stmt(g: &mut G, s: &Stmt) -> Result<String> {
    Ok(match s {
        Stmt::Expr(e) => format!("{};", gen_expression(g, e)?),
        Stmt::Let { name, ty, mem_qual, value } => {
            let mode = if ty.is_handle() { Mode::Handle } else { Mode::Raw };
            let rhs = match value {
                Some(v) => g.with_mode(mode, |g| gen_expression(g, v))?,
                None => crate::codegen::type_map::default_value(ty),
            };
            let decl_ty = if *mem_qual == MemQual::AsRef {
                format!("{} *", c_type(ty))
            } else {
                c_type(ty)
            };
            let rhs = if *mem_qual == MemQual::AsRef {
                format!("&{}", rhs)
            } else {
                rhs
            };
            format!("{} {} = {};", decl_ty, mangle(name), rhs)
        }
        Stmt::Return(None) => "return;".to_string(),
        Stmt::Return(Some(e)) => {
            let mode = if e.ty().is_handle() { Mode::Handle } else { Mode::Raw };
            let v = g.with_mode(mode, |g| gen_expression(g, e))?;
            format!("return {};", v)
        }
        Stmt::Assign { target, value } => {
            let mode = if target.ty().is_handle() { Mode::Handle } else { Mode::Raw };
            let lhs = g.with_mode(Mode::Raw, |g| gen_expression(g, target))?;
            let rhs = g.with_mode(mode, |g| gen_expression(g, value))?;
            format!("{} = {};", lhs, rhs)
        }
    })
}

/// Lower a statement list to a newline-joined block body (no surrounding
/// braces — callers already own those).
pub fn gen_block(g: &mut G, stmts: &[Stmt]) -> Result<String> {
    let mut out = Vec::with_capacity(stmts.len());
    for s in stmts {
        out.push(gen_stmt(g, s)?);
    }
    Ok(out.join("\n    "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Literal;
    use crate::config::CodegenConfig;
    use crate::symbols::SymbolTable;
    use crate::types::Type;

    #[test]
    fn let_binds_handle_typed_value() {
        let table = SymbolTable::new();
        let mut g = G::new(&table, CodegenConfig::new());
        g.current_arena_var = Some("__arena__".into());
        let stmt = Stmt::Let {
            name: "s".into(),
            ty: Type::String,
            mem_qual: MemQual::Default,
            value: Some(Expr::Literal { value: Literal::Str("hi".into()), ty: Type::String }),
        };
        let out = gen_block(&mut g, &[stmt]).unwrap();
        assert!(out.contains("RtHandleV2"));
    }

    #[test]
    fn return_void_has_no_expression() {
        let table = SymbolTable::new();
        let mut g = G::new(&table, CodegenConfig::new());
        let out = gen_block(&mut g, &[Stmt::Return(None)]).unwrap();
        assert_eq!(out, "return;");
    }

    #[test]
    fn return_value_lowers_expression() {
        let table = SymbolTable::new();
        let mut g = G::new(&table, CodegenConfig::new());
        let out = gen_block(
            &mut g,
            &[Stmt::Return(Some(Expr::Literal { value: Literal::Int(1), ty: Type::Long }))],
        )
        .unwrap();
        assert_eq!(out, "return 1LL;");
    }
}
