//! Builtin call dispatch: `print`, `println`, `printErr`, `printErrLn`,
//! `len`, `readLine`, `exit`, `assert`.
//!
//! Grounded on
//! `original_source/src/code_gen/code_gen_expr_call.c`'s builtin-name
//! switch, lines ~1407–1548.

use crate::error::Result;
use crate::types::Type;

fn print_func(ty: &Type) -> Result<&'static str> {
    Ok(match ty {
        Type::Int | Type::Long => "rt_print_long",
        Type::Double | Type::Float => "rt_print_double",
        Type::Char => "rt_print_char",
        Type::Bool => "rt_print_bool",
        Type::Byte => "rt_print_byte",
        Type::String => "rt_print_string",
        Type::Array(elem) => match elem.as_ref() {
            Type::Int | Type::Long => "rt_print_array_long",
            Type::Double | Type::Float => "rt_print_array_double",
            Type::Char => "rt_print_array_char",
            Type::Bool => "rt_print_array_bool",
            Type::Byte => "rt_print_array_byte",
            Type::String => "rt_print_array_string",
            other => {
                return Err(crate::error::CodeGenError::UnsupportedConstruct(format!(
                    "unsupported array element type for print: {:?}",
                    other
                )));
            }
        },
        other => {
            return Err(crate::error::CodeGenError::UnsupportedConstruct(format!(
                "unsupported type for print: {:?}",
                other
            )));
        }
    })
}

fn to_string_func(ty: &Type) -> &'static str {
    match ty {
        Type::Int | Type::Long => "rt_to_string_long",
        Type::Double | Type::Float => "rt_to_string_double_v2",
        _ => "rt_to_string_long",
    }
}

/// Recognize and lower one of the fixed builtins. `arena` is the C arena
/// expression in scope (or `"NULL"`); `arg_types`/`arg_strs` are the
/// already-lowered call arguments. Returns `None` if `name` isn't a
/// recognized builtin, so the caller can fall through to regular call
/// lowering.
pub fn gen_builtin_call(
    name: &str,
    arena: &str,
    arg_types: &[Type],
    arg_strs: &[String],
) -> Result<Option<String>> {
    Ok(Some(match (name, arg_strs.len()) {
        ("print", 1) => format!("{}({})", print_func(&arg_types[0])?, arg_strs[0]),
        ("len", 1) => {
            if matches!(arg_types[0], Type::String) {
                format!("(long long)strlen({})", arg_strs[0])
            } else {
                format!("rt_array_length({})", arg_strs[0])
            }
        }
        ("readLine", 0) => format!("rt_read_line({})", arena),
        ("println", 1) => {
            if matches!(arg_types[0], Type::String) {
                format!("rt_println({})", arg_strs[0])
            } else {
                format!(
                    "rt_println({}({}, {}))",
                    to_string_func(&arg_types[0]),
                    arena,
                    arg_strs[0]
                )
            }
        }
        ("printErr", 1) => {
            if matches!(arg_types[0], Type::String) {
                format!("rt_print_err({})", arg_strs[0])
            } else {
                format!(
                    "rt_print_err({}({}, {}))",
                    to_string_func(&arg_types[0]),
                    arena,
                    arg_strs[0]
                )
            }
        }
        ("printErrLn", 1) => {
            if matches!(arg_types[0], Type::String) {
                format!("rt_print_err_ln({})", arg_strs[0])
            } else {
                format!(
                    "rt_print_err_ln({}({}, {}))",
                    to_string_func(&arg_types[0]),
                    arena,
                    arg_strs[0]
                )
            }
        }
        ("exit", 1) => format!("rt_exit({})", arg_strs[0]),
        ("assert", 2) => format!("rt_assert({}, {})", arg_strs[0], arg_strs[1]),
        _ => return Ok(None),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn print_dispatches_on_argument_type() {
        let out = gen_builtin_call("print", "__arena__", &[Type::Long], &["x".into()])
            .unwrap()
            .unwrap();
        assert_eq!(out, "rt_print_long(x)");
    }

    #[test]
    fn len_on_string_uses_strlen() {
        let out = gen_builtin_call("len", "__arena__", &[Type::String], &["s".into()])
            .unwrap()
            .unwrap();
        assert_eq!(out, "(long long)strlen(s)");
    }

    #[test]
    fn len_on_array_uses_rt_array_length() {
        let ty = Type::Array(Box::new(Type::Int));
        let out = gen_builtin_call("len", "__arena__", &[ty], &["xs".into()])
            .unwrap()
            .unwrap();
        assert_eq!(out, "rt_array_length(xs)");
    }

    #[test]
    fn println_on_non_string_converts_first() {
        let out = gen_builtin_call("println", "__arena__", &[Type::Long], &["x".into()])
            .unwrap()
            .unwrap();
        assert_eq!(out, "rt_println(rt_to_string_long(__arena__, x))");
    }

    #[test]
    fn unknown_name_returns_none() {
        assert!(gen_builtin_call("notABuiltin", "__arena__", &[], &[])
            .unwrap()
            .is_none());
    }

    #[test]
    fn assert_takes_two_args() {
        let out = gen_builtin_call(
            "assert",
            "__arena__",
            &[Type::Bool, Type::String],
            &["cond".into(), "\"msg\"".into()],
        )
        .unwrap()
        .unwrap();
        assert_eq!(out, "rt_assert(cond, \"msg\")");
    }
}
