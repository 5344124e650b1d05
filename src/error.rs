//! Code generation error types.
//!
//! `UnsupportedConstruct` and `InternalAssertion` abort generation via
//! `Err`; `UnresolvedType`/`UnresolvedMethod` are deliberately *not*
//! represented here — they must emit a visible marker into the output and
//! continue, which the generator does directly (see
//! `codegen::util::emit_unresolved_marker`) rather than by raising and
//! catching an error.

#[derive(Debug)]
pub enum CodeGenError {
    /// A construct the generator has no lowering rule for.
    UnsupportedConstruct(String),
    /// A defensive check that should be unreachable if the type checker did
    /// its job (e.g. a null object in a method call).
    InternalAssertion(String),
    /// A formatting error surfaced while writing to an output sink.
    Format(std::fmt::Error),
}

impl std::fmt::Display for CodeGenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CodeGenError::UnsupportedConstruct(s) => write!(f, "Error: {}", s),
            CodeGenError::InternalAssertion(s) => write!(f, "Error: internal assertion: {}", s),
            CodeGenError::Format(e) => write!(f, "Error: code generation write error: {}", e),
        }
    }
}

impl std::error::Error for CodeGenError {}

impl From<std::fmt::Error> for CodeGenError {
    fn from(e: std::fmt::Error) -> Self {
        CodeGenError::Format(e)
    }
}

impl From<String> for CodeGenError {
    fn from(s: String) -> Self {
        CodeGenError::UnsupportedConstruct(s)
    }
}

pub type Result<T> = std::result::Result<T, CodeGenError>;
