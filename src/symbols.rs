//! Symbol table — external collaborator interface.
//!
//! Construction (populating this table from parsed source) lives elsewhere;
//! this module exists so the generator and its tests have a concrete,
//! narrow thing to query: lookup by name, lookup inside a namespace,
//! lookup a type by name.
//!
//! Scopes resolve innermost-first, mirroring
//! `original_source/src/symbol_table.c`'s scope-chain walk.

use std::collections::HashMap;

use crate::types::{FuncMod, MemQual, SyncMod, Type};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Global,
    Local,
    Parameter,
    Function,
    Type,
    Namespace,
}

/// A single declared name.
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub ty: Type,
    pub is_native: bool,
    pub c_alias: Option<String>,
    pub is_function: bool,
    pub sync_mod: SyncMod,
    pub mem_qual: MemQual,
    pub func_mod: FuncMod,
    pub declaration_scope_depth: usize,
}

impl Symbol {
    /// A symbol is global when it's explicitly declared at file scope or
    /// its declaration scope is the function's own outermost block
    /// (`kind == Global || declaration_scope_depth <= 1`).
    pub fn is_global(&self) -> bool {
        self.kind == SymbolKind::Global || self.declaration_scope_depth <= 1
    }
}

/// One lexical scope: a flat map of name -> symbol.
#[derive(Debug, Default)]
struct Scope {
    symbols: HashMap<String, Symbol>,
}

/// A namespace's member table, looked up by its canonical module name.
#[derive(Debug, Default)]
pub struct Namespace {
    pub canonical_module_name: String,
    members: HashMap<String, Symbol>,
}

impl Namespace {
    pub fn new(canonical_module_name: impl Into<String>) -> Self {
        Namespace {
            canonical_module_name: canonical_module_name.into(),
            members: HashMap::new(),
        }
    }

    pub fn insert(&mut self, symbol: Symbol) {
        self.members.insert(symbol.name.clone(), symbol);
    }

    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.members.get(name)
    }
}

/// The symbol table: a stack of lexical scopes plus a flat namespace and
/// type-alias registry (both of which live at global scope, same as the
/// original's `global_scope`).
#[derive(Debug, Default)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
    types: HashMap<String, Type>,
    namespaces: HashMap<String, Namespace>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable {
            scopes: vec![Scope::default()],
            types: HashMap::new(),
            namespaces: HashMap::new(),
        }
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(Scope::default());
    }

    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    pub fn depth(&self) -> usize {
        self.scopes.len() - 1
    }

    pub fn insert(&mut self, symbol: Symbol) {
        self.scopes
            .last_mut()
            .expect("symbol table always has a scope")
            .symbols
            .insert(symbol.name.clone(), symbol);
    }

    /// Lookup by name, walking scopes innermost-first.
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.symbols.get(name))
    }

    pub fn add_namespace(&mut self, name: impl Into<String>, ns: Namespace) {
        self.namespaces.insert(name.into(), ns);
    }

    pub fn lookup_namespace(&self, name: &str) -> Option<&Namespace> {
        self.namespaces.get(name)
    }

    /// Lookup a member inside a namespace by prefix and member name.
    pub fn lookup_in_namespace(&self, prefix: &str, member: &str) -> Option<&Symbol> {
        self.namespaces.get(prefix).and_then(|ns| ns.lookup(member))
    }

    pub fn add_type(&mut self, name: impl Into<String>, ty: Type) {
        self.types.insert(name.into(), ty);
    }

    pub fn lookup_type(&self, name: &str) -> Option<&Type> {
        self.types.get(name)
    }
}
