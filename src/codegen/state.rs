//! `G` generator context.
//!
//! A single mutable state object threaded through every lowering call,
//! carrying output buffers, counters and the handful of mode bits that
//! change how a sub-expression lowers.

use crate::config::CodegenConfig;
use crate::symbols::SymbolTable;
use crate::types::ArithmeticMode;

/// Evaluation mode for handle-typed expressions. Modeled as an explicit
/// argument everywhere lowering dispatches (`gen_expression(g, e, mode)`)
/// rather than only as a mutable field, so the discipline is
/// type-enforced; `G::expr_as_handle` still exists as the ambient default
/// callers push/pop around sub-evaluations that must force a particular
/// mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Produce a `RtHandleV2 *` value.
    Handle,
    /// Produce a raw pointer (pin strings/arrays first).
    Raw,
}

impl Mode {
    pub fn is_handle(self) -> bool {
        matches!(self, Mode::Handle)
    }
}

/// The generator context. One instance per compilation unit.
pub struct G<'a> {
    /// Completed top-level C definitions (functions, structs).
    pub output: String,
    pub symbol_table: &'a SymbolTable,
    pub config: CodegenConfig,

    /// C-level arena variable in scope, or `None` at file scope.
    pub current_arena_var: Option<String>,
    /// Nested private-block arena variable names, innermost last.
    pub arena_stack: Vec<String>,

    /// The ambient mode: whether handle-typed expressions default to
    /// producing handles (`true`) or raw pointers (`false`).
    pub expr_as_handle: bool,

    pub thunk_count: u64,
    pub wrapper_count: u64,
    pub thread_wrapper_count: u64,
    pub temp_count: u64,

    pub thunk_forward_decls: String,
    pub thunk_definitions: String,
    pub lambda_forward_decls: String,
    pub lambda_definitions: String,

    pub arithmetic_mode: ArithmeticMode,
    pub in_array_compound_literal: bool,
    pub current_namespace_prefix: Option<String>,
    pub current_indent: usize,
}

impl<'a> G<'a> {
    pub fn new(symbol_table: &'a SymbolTable, config: CodegenConfig) -> Self {
        let arithmetic_mode = config.arithmetic_mode;
        let emit_handle_mode = config.emit_handle_mode;
        G {
            output: String::new(),
            symbol_table,
            config,
            current_arena_var: None,
            arena_stack: Vec::new(),
            expr_as_handle: emit_handle_mode,
            thunk_count: 0,
            wrapper_count: 0,
            thread_wrapper_count: 0,
            temp_count: 0,
            thunk_forward_decls: String::new(),
            thunk_definitions: String::new(),
            lambda_forward_decls: String::new(),
            lambda_definitions: String::new(),
            arithmetic_mode,
            in_array_compound_literal: false,
            current_namespace_prefix: None,
            current_indent: 0,
        }
    }

    /// Arena depth: 0 = file scope, 1 = function-base arena, >=2 = nested
    /// private blocks pushed on `arena_stack`.
    pub fn arena_depth(&self) -> usize {
        if self.current_arena_var.is_none() {
            0
        } else {
            1 + self.arena_stack.len()
        }
    }

    /// Push a private-block arena, entering a deeper scope.
    pub fn push_arena(&mut self, name: impl Into<String>) {
        self.arena_stack.push(name.into());
    }

    pub fn pop_arena(&mut self) {
        self.arena_stack.pop();
    }

    pub fn next_temp(&mut self) -> String {
        let n = self.temp_count;
        self.temp_count += 1;
        format!("__t{}__", n)
    }

    pub fn next_thunk_id(&mut self) -> u64 {
        let n = self.thunk_count;
        self.thunk_count += 1;
        n
    }

    pub fn next_wrapper_id(&mut self) -> u64 {
        let n = self.wrapper_count;
        self.wrapper_count += 1;
        n
    }

    pub fn next_thread_wrapper_id(&mut self) -> u64 {
        let n = self.thread_wrapper_count;
        self.thread_wrapper_count += 1;
        n
    }

    /// Run `f` with `expr_as_handle` forced to `raw`/`handle`, then restore
    /// the prior value, for sub-expressions that must evaluate in a fixed
    /// mode (e.g. operands of `rt_str_concat`, which always need raw
    /// pointers).
    pub fn with_mode<T>(&mut self, mode: Mode, f: impl FnOnce(&mut Self) -> T) -> T {
        let saved = self.expr_as_handle;
        self.expr_as_handle = mode.is_handle() && self.config.emit_handle_mode;
        let result = f(self);
        self.expr_as_handle = saved;
        result
    }

    pub fn mode(&self) -> Mode {
        if self.expr_as_handle && self.config.emit_handle_mode {
            Mode::Handle
        } else {
            Mode::Raw
        }
    }

    /// Finalize: forward-decls, then lambda/thunk definitions, then the
    /// main output.
    pub fn flush(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.thunk_forward_decls);
        out.push_str(&self.lambda_forward_decls);
        out.push_str(&self.lambda_definitions);
        out.push_str(&self.thunk_definitions);
        out.push_str(&self.output);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arena_depth_tracks_stack() {
        let table = SymbolTable::new();
        let mut g = G::new(&table, CodegenConfig::new());
        assert_eq!(g.arena_depth(), 0);
        g.current_arena_var = Some("__arena__".to_string());
        assert_eq!(g.arena_depth(), 1);
        g.push_arena("__local_arena__");
        assert_eq!(g.arena_depth(), 2);
        g.pop_arena();
        assert_eq!(g.arena_depth(), 1);
    }

    #[test]
    fn with_mode_saves_and_restores() {
        let table = SymbolTable::new();
        let mut g = G::new(&table, CodegenConfig::new());
        assert!(g.expr_as_handle);
        g.with_mode(Mode::Raw, |g| {
            assert!(!g.expr_as_handle);
        });
        assert!(g.expr_as_handle);
    }

    #[test]
    fn handle_mode_disabled_by_config_pins_raw() {
        let table = SymbolTable::new();
        let cfg = CodegenConfig::new().with_handle_mode(false);
        let mut g = G::new(&table, cfg);
        assert_eq!(g.mode(), Mode::Raw);
        g.with_mode(Mode::Handle, |g| {
            assert_eq!(g.mode(), Mode::Raw);
        });
    }
}
