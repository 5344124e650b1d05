//! UTIL — formatted string building, identifier mangling, literal escaping.
//!
//! Grounded on `original_source/src/code_gen/code_gen_util.c`
//! (`escape_char_literal`, `escape_c_string`) and a match-based
//! per-character escaping style for name mangling.

use std::fmt::Write as _;

/// C89/C11 reserved words the mangler must never produce unprefixed.
pub const RESERVED_C_KEYWORDS: &[&str] = &[
    "auto", "break", "case", "char", "const", "continue", "default", "do", "double", "else",
    "enum", "extern", "float", "for", "goto", "if", "int", "long", "register", "return", "short",
    "signed", "sizeof", "static", "struct", "switch", "typedef", "union", "unsigned", "void",
    "volatile", "while", "restrict", "inline", "_Bool", "_Complex", "_Imaginary", "_Atomic",
    "_Thread_local", "_Noreturn", "_Alignas", "_Alignof", "_Generic", "_Static_assert",
];

pub fn is_reserved_c_keyword(name: &str, extra: &[String]) -> bool {
    RESERVED_C_KEYWORDS.contains(&name) || extra.iter().any(|k| k == name)
}

/// Mangle a source-language identifier into a C identifier: `x` ->
/// `__sn__x`.
///
/// Idempotent under the stated convention: applying `mangle` to an
/// already-mangled name re-prefixes it (`__sn____sn__x`) but the generator
/// never does that — each AST identifier is mangled exactly once, at the
/// point it is emitted.
pub fn mangle(name: &str) -> String {
    format!("__sn__{}", name)
}

/// Mangle a namespaced identifier: `ns.f` -> `__sn__ns__f`. Static namespace
/// variables use the namespace's canonical module name as `prefix` instead
/// of the raw namespace identifier.
pub fn mangle_namespaced(prefix: &str, name: &str) -> String {
    format!("__sn__{}__{}", prefix, name)
}

/// Mangle a struct method: `S.m` -> `<mangled_S>_m`.
pub fn mangle_method(struct_mangled: &str, method: &str) -> String {
    format!("{}_{}", struct_mangled, method)
}

/// Resolve an identifier through the C-keyword guard, suffixing with `_`
/// when it collides (applied to raw C-level names synthesized by the
/// generator itself — temporaries, wrapper functions — not to mangled
/// source identifiers, which the `__sn__` prefix already protects).
pub fn guard_keyword(name: &str, extra: &[String]) -> String {
    if is_reserved_c_keyword(name, extra) {
        format!("{}_", name)
    } else {
        name.to_string()
    }
}

/// Escape a single character as a C char literal, e.g. `'\n'`, `'\x1b'`.
/// Grounded on `escape_char_literal` in `code_gen_util.c`.
pub fn escape_char_literal(ch: char) -> String {
    match ch {
        '\'' => "'\\''".to_string(),
        '\\' => "'\\\\'".to_string(),
        '\n' => "'\\n'".to_string(),
        '\t' => "'\\t'".to_string(),
        '\r' => "'\\r'".to_string(),
        '\0' => "'\\0'".to_string(),
        c if (c as u32) < 0x20 || (c as u32) > 0x7e => {
            format!("'\\x{:02x}'", c as u32)
        }
        c => format!("'{}'", c),
    }
}

/// Escape a Rust string as a double-quoted C string literal. Grounded on
/// `escape_c_string` in `code_gen_util.c`; extended to escape non-printable
/// bytes as `\xHH` rather than passing them through raw, since
/// interpolation parts and string literals alike may carry arbitrary bytes
/// decoded from source.
pub fn escape_string_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\x{:02x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Format an integer literal the way constant folding renders it:
/// `NNNLL`, including for negative values.
pub fn format_int_literal(v: i64) -> String {
    format!("{}LL", v)
}

/// Format a double literal with at least one `.` or `e` so the C compiler
/// never mistakes it for an integer.
pub fn format_double_literal(v: f64) -> String {
    if v.is_infinite() {
        return if v > 0.0 {
            "__builtin_inf()".to_string()
        } else {
            "-__builtin_inf()".to_string()
        };
    }
    if v.is_nan() {
        return "__builtin_nan(\"\")".to_string();
    }
    let s = format!("{}", v);
    if s.contains('.') || s.contains('e') || s.contains('E') {
        s
    } else {
        format!("{}.0", s)
    }
}

/// Emit a visible, never-silent marker for a defensive
/// unresolved-type/unresolved-method condition: the generator
/// must not silently miscompile, so it writes a marker comment and a
/// best-effort placeholder expression instead of aborting.
pub fn unresolved_marker(what: &str) -> String {
    format!("/* ERROR: unresolved {} */ ((void)0)", what)
}
