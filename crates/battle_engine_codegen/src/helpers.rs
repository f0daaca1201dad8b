//! Helper functions for code generation.

use heck::ToPascalCase;

/// Convert a key to a valid Rust identifier in PascalCase.
/// Handles keys starting with digits by prefixing with underscore.
pub fn to_valid_ident(key: &str) -> String {
    let pascal = key.to_pascal_case();
    if pascal.chars().next().map(|c| c.is_ascii_digit()).unwrap_or(false) {
        format!("_{}", pascal)
    } else {
        pascal
    }
}
