//! Type system for the Sindarin source language
//!
//! The code generator never infers or checks types — it consumes the closed
//! `Type` sum already assigned by the (external) type checker and maps each
//! variant onto a C representation. See `codegen::type_map`.

/// A named struct field.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub c_alias: Option<String>,
    pub ty: Type,
    pub default: Option<Box<crate::ast::Expr>>,
}

/// A struct method signature (native or source-language).
#[derive(Debug, Clone, PartialEq)]
pub struct Method {
    pub name: String,
    pub c_alias: Option<String>,
    pub is_native: bool,
    pub is_static: bool,
    pub return_ty: Type,
    pub params: Vec<Type>,
    pub has_arena_param: bool,
    pub has_body: bool,
}

/// Memory qualifier controlling pass/store-by-reference vs by-value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemQual {
    /// Pick the language default for the type.
    Default,
    /// Pass/store by reference (address of the caller's slot).
    AsRef,
    /// Pass/store by value (copy).
    AsVal,
}

/// Function modifier affecting thread-arena choice on spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FuncMod {
    Default,
    Shared,
    Private,
}

/// Synchronization modifier on a variable symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMod {
    SyncAtomic,
    None,
}

/// Checked vs. unchecked arithmetic lowering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticMode {
    Checked,
    Unchecked,
}

/// The closed type sum the generator lowers.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Int,
    Long,
    Int32,
    UInt,
    UInt32,
    Float,
    Double,
    Char,
    Byte,
    Bool,
    String,
    Void,
    Nil,
    Any,
    Array(Box<Type>),
    Pointer(Box<Type>),
    Function {
        return_ty: Box<Type>,
        params: Vec<Type>,
        param_mem_quals: Vec<MemQual>,
        is_native: bool,
        has_body: bool,
        has_arena_param: bool,
        typedef_name: Option<String>,
    },
    Opaque {
        name: String,
    },
    Struct {
        name: String,
        c_alias: Option<String>,
        is_native: bool,
        pass_self_by_ref: bool,
        fields: Vec<Field>,
        methods: Vec<Method>,
    },
}

impl Type {
    /// A type is a "handle type" iff it is `Array` or `String` — handles get
    /// a distinct C representation whenever arena mode is active.
    pub fn is_handle(&self) -> bool {
        matches!(self, Type::Array(_) | Type::String)
    }

    pub fn is_struct(&self) -> bool {
        matches!(self, Type::Struct { .. })
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, Type::Pointer(_))
    }

    /// `struct_type_id` is only meaningful for `Struct`; callers elsewhere
    /// go through `codegen::type_map::struct_type_id` instead of poking at
    /// `name` directly.
    pub fn struct_name(&self) -> Option<&str> {
        match self {
            Type::Struct { name, .. } => Some(name.as_str()),
            _ => None,
        }
    }

    pub fn array_element(&self) -> Option<&Type> {
        match self {
            Type::Array(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}
