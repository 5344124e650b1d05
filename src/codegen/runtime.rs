//! Runtime-contract symbol table.
//!
//! A single data-driven table instead of scattered string literals, so the
//! full ABI surface is declared once. This table doesn't *emit* C
//! declarations (the runtime library ships its own header, treated as an
//! external collaborator) but is used to look up canonical names, catch
//! typos, and (in tests) assert completeness against the category list
//! below.

use std::collections::HashMap;
use std::sync::LazyLock;

/// One runtime-contract entry: category plus the canonical C symbol name.
pub struct RuntimeSymbol {
    pub category: &'static str,
    pub name: &'static str,
}

/// The full external ABI surface the generator relies on, as a flat list.
pub static RUNTIME_SYMBOLS: LazyLock<Vec<RuntimeSymbol>> = LazyLock::new(|| {
    vec![
        // Arena lifecycle
        rs("arena", "rt_arena_v2_alloc"),
        rs("arena", "rt_arena_v2_strdup"),
        rs("arena", "rt_arena_v2_destroy"),
        rs("arena", "rt_arena_v2_promote"),
        rs("arena", "rt_arena_get_parent"),
        // Array handles
        rs("array", "rt_handle_v2_pin"),
        rs("array", "rt_array_data_v2"),
        rs("array", "rt_v2_data_array_length"),
        rs("array", "rt_array_create_generic_v2"),
        rs("array", "rt_array_clone_generic_v2"),
        rs("array", "rt_pin_string_array_v2"),
        rs("array", "rt_array_from_legacy_string_v2"),
        rs("array", "rt_array_from_raw_strings_v2"),
        // Managed (handle) bridge helpers
        rs("managed", "rt_managed_pin"),
        rs("managed", "rt_managed_strdup"),
        rs("managed", "rt_managed_clone"),
        rs("managed", "rt_managed_pin_array"),
        rs("managed", "rt_managed_pin_string_array"),
        rs("managed", "rt_managed_promote"),
        rs("managed", "rt_managed_pin_array_any"),
        // Any bridge
        rs("any", "rt_box_nil"),
        rs("any", "rt_box_int"),
        rs("any", "rt_box_long"),
        rs("any", "rt_box_int32"),
        rs("any", "rt_box_uint"),
        rs("any", "rt_box_uint32"),
        rs("any", "rt_box_float"),
        rs("any", "rt_box_double"),
        rs("any", "rt_box_char"),
        rs("any", "rt_box_byte"),
        rs("any", "rt_box_bool"),
        rs("any", "rt_box_string"),
        rs("any", "rt_box_array"),
        rs("any", "rt_box_struct"),
        rs("any", "rt_unbox_int"),
        rs("any", "rt_unbox_long"),
        rs("any", "rt_unbox_int32"),
        rs("any", "rt_unbox_uint"),
        rs("any", "rt_unbox_uint32"),
        rs("any", "rt_unbox_float"),
        rs("any", "rt_unbox_double"),
        rs("any", "rt_unbox_char"),
        rs("any", "rt_unbox_byte"),
        rs("any", "rt_unbox_bool"),
        rs("any", "rt_unbox_string"),
        rs("any", "rt_unbox_array"),
        rs("any", "rt_unbox_struct"),
        rs("any", "rt_any_get_tag"),
        rs("any", "rt_any_is_struct_type"),
        rs("any", "rt_any_array_elem_tag"),
        // String ops
        rs("string", "rt_str_concat"),
        rs("string", "rt_str_concat_h"),
        rs("string", "rt_str_length"),
        rs("string", "rt_str_substring"),
        rs("string", "rt_str_substring_v2"),
        rs("string", "rt_str_trim"),
        rs("string", "rt_str_trim_v2"),
        rs("string", "rt_str_toUpper"),
        rs("string", "rt_str_toUpper_v2"),
        rs("string", "rt_str_toLower"),
        rs("string", "rt_str_toLower_v2"),
        rs("string", "rt_str_replace"),
        rs("string", "rt_str_replace_v2"),
        rs("string", "rt_str_split"),
        rs("string", "rt_str_split_v2"),
        rs("string", "rt_str_split_n"),
        rs("string", "rt_str_split_whitespace"),
        rs("string", "rt_str_split_lines"),
        rs("string", "rt_str_indexOf"),
        rs("string", "rt_str_startsWith"),
        rs("string", "rt_str_endsWith"),
        rs("string", "rt_str_contains"),
        rs("string", "rt_str_charAt"),
        rs("string", "rt_str_region_equals"),
        rs("string", "rt_str_is_blank"),
        rs("string", "rt_str_to_int"),
        rs("string", "rt_str_to_long"),
        rs("string", "rt_str_to_double"),
        rs("string", "rt_str_append_v2"),
        rs("string", "rt_string_to_bytes"),
        rs("string", "rt_byte_array_to_string"),
        rs("string", "rt_byte_array_to_string_latin1"),
        rs("string", "rt_byte_array_to_hex"),
        rs("string", "rt_byte_array_to_base64"),
        // Array ops
        rs("arrayop", "rt_array_length"),
        rs("arrayop", "rt_array_push"),
        rs("arrayop", "rt_array_pop"),
        rs("arrayop", "rt_array_rev"),
        rs("arrayop", "rt_array_ins"),
        rs("arrayop", "rt_array_rem"),
        rs("arrayop", "rt_array_indexOf"),
        rs("arrayop", "rt_array_contains"),
        rs("arrayop", "rt_array_clone"),
        rs("arrayop", "rt_array_join"),
        rs("arrayop", "rt_array_concat"),
        rs("arrayop", "rt_array_eq"),
        rs("arrayop", "rt_array_range"),
        rs("arrayop", "rt_array_range_v2"),
        rs("arrayop", "rt_array_alloc"),
        rs("arrayop", "rt_array_alloc_v2"),
        rs("arrayop", "rt_array_from_any"),
        rs("arrayop", "rt_promote_array_v2"),
        rs("arrayop", "rt_promote_array_string_v2"),
        rs("arrayop", "rt_promote_array_2d_v2"),
        rs("arrayop", "rt_promote_array_3d_v2"),
        // Checked arithmetic
        rs("arith", "rt_add_long"),
        rs("arith", "rt_sub_long"),
        rs("arith", "rt_mul_long"),
        rs("arith", "rt_div_long"),
        rs("arith", "rt_mod_long"),
        rs("arith", "rt_add_double"),
        rs("arith", "rt_sub_double"),
        rs("arith", "rt_mul_double"),
        rs("arith", "rt_div_double"),
        rs("arith", "rt_mod_double"),
        rs("arith", "rt_add_string"),
        rs("arith", "rt_neg_long"),
        rs("arith", "rt_neg_double"),
        rs("arith", "rt_not_bool"),
        rs("arith", "rt_post_inc_long"),
        rs("arith", "rt_post_dec_long"),
        // I/O
        rs("io", "rt_print_long"),
        rs("io", "rt_print_double"),
        rs("io", "rt_print_string"),
        rs("io", "rt_print_bool"),
        rs("io", "rt_println"),
        rs("io", "rt_print_err"),
        rs("io", "rt_print_err_ln"),
        rs("io", "rt_format_long"),
        rs("io", "rt_format_double"),
        rs("io", "rt_format_string"),
        rs("io", "rt_to_string_long"),
        rs("io", "rt_to_string_double_v2"),
        rs("io", "rt_read_line"),
        rs("io", "rt_exit"),
        rs("io", "rt_assert"),
        rs("io", "rt_auto_to_string"),
        // Threading
        rs("thread", "rt_thread_spawn"),
        rs("thread", "rt_thread_v2_sync"),
        rs("thread", "rt_thread_v2_sync_all"),
        rs("thread", "rt_thread_v2_sync_keep_arena"),
        rs("thread", "rt_thread_result_create"),
        rs("thread", "rt_thread_result_set_value"),
        rs("thread", "rt_set_thread_arena"),
        rs("thread", "rt_get_thread_arena_or"),
        rs("thread", "rt_thread_panic_context_init"),
        rs("thread", "rt_thread_panic_context_clear"),
        // Interception
        rs("intercept", "rt_interceptor_register"),
        rs("intercept", "rt_interceptor_register_where"),
        rs("intercept", "rt_interceptor_clear_all"),
        rs("intercept", "rt_interceptor_is_active"),
        rs("intercept", "rt_interceptor_count"),
        rs("intercept", "rt_call_intercepted"),
    ]
});

fn rs(category: &'static str, name: &'static str) -> RuntimeSymbol {
    RuntimeSymbol { category, name }
}

static BY_NAME: LazyLock<HashMap<&'static str, &'static RuntimeSymbol>> = LazyLock::new(|| {
    RUNTIME_SYMBOLS
        .iter()
        .map(|s| (s.name, s))
        .collect()
});

/// Whether `name` is a known runtime-contract symbol.
pub fn is_known_symbol(name: &str) -> bool {
    BY_NAME.contains_key(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_nonempty_and_has_no_duplicate_names() {
        let mut seen = std::collections::HashSet::new();
        for s in RUNTIME_SYMBOLS.iter() {
            assert!(seen.insert(s.name), "duplicate runtime symbol: {}", s.name);
        }
        assert!(RUNTIME_SYMBOLS.len() > 50);
    }

    #[test]
    fn known_symbols_lookup() {
        assert!(is_known_symbol("rt_print_string"));
        assert!(is_known_symbol("rt_call_intercepted"));
        assert!(!is_known_symbol("not_a_real_symbol"));
    }
}
