//! TYPE-MAP — `Type` → C text, type tags, struct IDs, default values.
//!
//! The mapping table follows `original_source/src/code_gen/util/
//! code_gen_util_type.c` verbatim; `struct_type_id`'s djb2 hash is grounded
//! on `code_gen_util_type.c::get_struct_type_id`, which this crate's
//! algorithm must match bit-for-bit since the runtime computes the same
//! hash independently.

use crate::symbols::SymbolTable;
use crate::types::Type;

/// `c_type(T)` — exact mapping from source type to C type.
pub fn c_type(ty: &Type) -> String {
    match ty {
        Type::Int | Type::Long => "long long".to_string(),
        Type::Int32 => "int32_t".to_string(),
        Type::UInt => "uint64_t".to_string(),
        Type::UInt32 => "uint32_t".to_string(),
        Type::Float => "float".to_string(),
        Type::Double => "double".to_string(),
        Type::Char => "char".to_string(),
        Type::Byte => "unsigned char".to_string(),
        Type::Bool => "bool".to_string(),
        Type::Void => "void".to_string(),
        Type::Nil => "void *".to_string(),
        Type::Any => "RtAny".to_string(),
        Type::String | Type::Array(_) => "RtHandleV2 *".to_string(),
        Type::Pointer(base) => format!("{}*", c_type(base)),
        Type::Function {
            is_native,
            typedef_name: Some(name),
            ..
        } if *is_native => name.clone(),
        Type::Function { .. } => "__Closure__ *".to_string(),
        Type::Opaque { name } => name.clone(),
        Type::Struct {
            c_alias: Some(alias),
            is_native,
            ..
        } => {
            if *is_native {
                format!("{} *", alias)
            } else {
                alias.clone()
            }
        }
        Type::Struct { name, .. } => crate::codegen::util::mangle(name),
    }
}

/// `c_native_param_type(T)` — like `c_type` except strings/arrays decay to
/// raw C types appropriate for a native parameter list.
pub fn c_native_param_type(ty: &Type) -> String {
    match ty {
        Type::String => "const char *".to_string(),
        Type::Array(elem) => format!("{} *", c_array_elem_type(elem)),
        other => c_type(other),
    }
}

/// `c_array_elem_type(E)` — storage-in-array C type. `Bool` widens to
/// `int` for alignment.
pub fn c_array_elem_type(elem: &Type) -> String {
    match elem {
        Type::Bool => "int".to_string(),
        Type::String | Type::Array(_) => "RtHandleV2 *".to_string(),
        other => c_type(other),
    }
}

/// `type_suffix(T)` — short tag used in runtime function names.
pub fn type_suffix(ty: &Type) -> &'static str {
    match ty {
        Type::Long => "long",
        Type::Int => "long",
        Type::Int32 => "int32",
        Type::UInt => "uint",
        Type::UInt32 => "uint32",
        Type::Char => "char",
        Type::Byte => "byte",
        Type::Double => "double",
        Type::Float => "float",
        Type::String => "string",
        Type::Bool => "bool",
        Type::Void => "void",
        _ => "generic",
    }
}

/// `struct_type_id(S)` — djb2 hash of the struct name, 31-bit positive.
/// Must be a pure function of `S.name` only.
pub fn struct_type_id(name: &str) -> u32 {
    let mut hash: u64 = 5381;
    for b in name.bytes() {
        hash = hash.wrapping_shl(5).wrapping_add(hash).wrapping_add(b as u64);
    }
    (hash & 0x7FFF_FFFF) as u32
}

/// `default_value(T)` — the C initializer.
pub fn default_value(ty: &Type) -> String {
    match ty {
        Type::Any => "rt_box_nil()".to_string(),
        Type::String | Type::Array(_) => "NULL".to_string(),
        Type::Struct {
            c_alias: Some(_),
            is_native: true,
            ..
        } => "NULL".to_string(),
        Type::Struct { .. } => "{0}".to_string(),
        Type::Nil => "NULL".to_string(),
        _ => "0".to_string(),
    }
}

/// Re-resolve a struct type that reached codegen as a forward reference
/// (missing `c_alias`) through the symbol table by name, grounded on
/// `original_source/.../code_gen_util_type.c::resolve_struct_type`.
pub fn resolve_struct_type<'a>(table: &'a SymbolTable, ty: &'a Type) -> &'a Type {
    match ty {
        Type::Struct {
            c_alias: None,
            name,
            ..
        } => match table.lookup_type(name) {
            Some(resolved @ Type::Struct { .. }) => resolved,
            _ => ty,
        },
        _ => ty,
    }
}
