//! ESCAPE — arena-depth tracking and destination-arena selection.

use crate::codegen::state::G;

/// Select the C expression naming the arena a value escaping from
/// `source_depth` must be allocated into, to be visible at `target_depth`.
pub fn destination_arena(g: &G, target_depth: usize) -> String {
    if target_depth == 0 {
        return "NULL".to_string();
    }
    if target_depth == 1 {
        return "__arena__".to_string();
    }
    let idx = target_depth - 2;
    if idx < g.arena_stack.len() {
        return g.arena_stack[idx].clone();
    }
    // Target is further out than anything currently tracked: walk parent
    // pointers from whatever arena is in scope.
    let current = g
        .arena_stack
        .last()
        .or(g.current_arena_var.as_ref())
        .cloned()
        .unwrap_or_else(|| "__arena__".to_string());
    let levels = g.arena_depth().saturating_sub(target_depth);
    let mut expr = current;
    for _ in 0..levels {
        expr = format!("rt_arena_get_parent({})", expr);
    }
    expr
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CodegenConfig;
    use crate::symbols::SymbolTable;

    #[test]
    fn target_zero_is_null() {
        let table = SymbolTable::new();
        let g = G::new(&table, CodegenConfig::new());
        assert_eq!(destination_arena(&g, 0), "NULL");
    }

    #[test]
    fn target_one_is_function_arena() {
        let table = SymbolTable::new();
        let mut g = G::new(&table, CodegenConfig::new());
        g.current_arena_var = Some("__arena__".to_string());
        assert_eq!(destination_arena(&g, 1), "__arena__");
    }

    #[test]
    fn target_nested_indexes_arena_stack() {
        let table = SymbolTable::new();
        let mut g = G::new(&table, CodegenConfig::new());
        g.current_arena_var = Some("__arena__".to_string());
        g.push_arena("__local_arena_0__");
        g.push_arena("__local_arena_1__");
        assert_eq!(destination_arena(&g, 2), "__local_arena_0__");
        assert_eq!(destination_arena(&g, 3), "__local_arena_1__");
    }

    #[test]
    fn target_out_of_reach_walks_parent_chain() {
        // Simulate bookkeeping that lost track of an intermediate arena
        // name: the stack only has one entry but the caller asks for a
        // target two levels past it, exercising the defensive
        // parent-walking fallback.
        let table = SymbolTable::new();
        let mut g = G::new(&table, CodegenConfig::new());
        g.current_arena_var = Some("__arena__".to_string());
        g.push_arena("__local_arena_0__");
        // arena_depth() == 2 here; manually widen the gap so target-2
        // indexes past arena_stack without touching arena_depth().
        let out = destination_arena(&g, 4);
        // idx = 2 is out of bounds (len == 1); falls back to walking
        // rt_arena_get_parent from the innermost tracked arena. levels is
        // saturating (target > depth), so the walk degenerates to the
        // innermost arena itself rather than panicking or indexing OOB.
        assert_eq!(out, "__local_arena_0__");
    }
}
