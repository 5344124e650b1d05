//! Generator configuration for extensibility.
//!
//! A small builder struct, `CompilerConfig`/`ExternalBuiltin`-shaped,
//! that external callers use to tune generation without modifying this
//! crate.

use serde::{Deserialize, Serialize};

use crate::types::ArithmeticMode;

/// A runtime-contract function the host compiler wants callable with a
/// name other than the one the data-driven table in
/// `codegen::runtime` would otherwise pick (e.g. a runtime fork that
/// renamed `rt_print_string`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeOverride {
    /// The canonical name used internally (e.g. "rt_print_string").
    pub canonical_name: String,
    /// The symbol to emit instead.
    pub symbol: String,
}

impl RuntimeOverride {
    /// Symbols are emitted verbatim into C source; reject anything that
    /// isn't a valid C identifier to avoid injecting arbitrary text.
    fn validate_symbol(symbol: &str) -> Result<(), String> {
        if symbol.is_empty() {
            return Err("runtime override symbol cannot be empty".to_string());
        }
        let mut chars = symbol.chars();
        let first = chars.next().unwrap();
        if !(first.is_ascii_alphabetic() || first == '_') {
            return Err(format!(
                "invalid leading character '{}' in runtime override symbol '{}'",
                first, symbol
            ));
        }
        for c in chars {
            if !(c.is_ascii_alphanumeric() || c == '_') {
                return Err(format!(
                    "invalid character '{}' in runtime override symbol '{}'",
                    c, symbol
                ));
            }
        }
        Ok(())
    }

    pub fn new(canonical_name: impl Into<String>, symbol: impl Into<String>) -> Result<Self, String> {
        let symbol = symbol.into();
        Self::validate_symbol(&symbol)?;
        Ok(RuntimeOverride {
            canonical_name: canonical_name.into(),
            symbol,
        })
    }
}

/// Generator-wide configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodegenConfig {
    pub arithmetic_mode: ArithmeticMode,
    /// Preserve the legacy non-handle (raw-pointer-only) lowering mode.
    pub emit_handle_mode: bool,
    /// Extra reserved words beyond the builtin C keyword guard list.
    pub extra_c_keywords: Vec<String>,
    pub runtime_overrides: Vec<RuntimeOverride>,
}

impl Default for CodegenConfig {
    fn default() -> Self {
        CodegenConfig {
            arithmetic_mode: ArithmeticMode::Checked,
            emit_handle_mode: true,
            extra_c_keywords: Vec::new(),
            runtime_overrides: Vec::new(),
        }
    }
}

impl CodegenConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_arithmetic_mode(mut self, mode: ArithmeticMode) -> Self {
        self.arithmetic_mode = mode;
        self
    }

    pub fn with_handle_mode(mut self, enabled: bool) -> Self {
        self.emit_handle_mode = enabled;
        self
    }

    pub fn with_runtime_override(mut self, o: RuntimeOverride) -> Self {
        self.runtime_overrides.push(o);
        self
    }

    pub fn resolve_runtime_name<'a>(&'a self, canonical: &'a str) -> &'a str {
        self.runtime_overrides
            .iter()
            .find(|o| o.canonical_name == canonical)
            .map(|o| o.symbol.as_str())
            .unwrap_or(canonical)
    }
}

// serde needs these manual impls since ArithmeticMode lives in types.rs
// without deriving Serialize/Deserialize (kept free of serde to stay a
// plain closed enum used pervasively outside any (de)serialization path).
impl Serialize for ArithmeticMode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let s = match self {
            ArithmeticMode::Checked => "checked",
            ArithmeticMode::Unchecked => "unchecked",
        };
        serializer.serialize_str(s)
    }
}

impl<'de> Deserialize<'de> for ArithmeticMode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        match s.as_str() {
            "checked" => Ok(ArithmeticMode::Checked),
            "unchecked" => Ok(ArithmeticMode::Unchecked),
            other => Err(serde::de::Error::custom(format!(
                "unknown arithmetic mode '{}'",
                other
            ))),
        }
    }
}
