// tighten-artifacts/src/sanitize.rs
// ============================================================================
// Module: Output-path sanitization (spec.md §4.10)
// ============================================================================

//! ## Overview
//! "`Modules/<sanitized-module>/<schema>.<table>.sql`… sanitization replaces
//! non-identifier characters with `_`; collisions fail" (`spec.md` §4.10).
//! Sanitization is applied independently to each path segment so a module
//! name and a table name never bleed into each other's escaping.

/// Replaces every character that is not `[A-Za-z0-9_]` with `_`. An empty
/// result (e.g. a name that is entirely punctuation) falls back to `_`.
#[must_use]
pub fn sanitize_segment(segment: &str) -> String {
    let sanitized: String =
        segment.chars().map(|ch| if ch.is_ascii_alphanumeric() || ch == '_' { ch } else { '_' }).collect();
    if sanitized.is_empty() { "_".to_string() } else { sanitized }
}

/// Builds the relative path for one table's SQL file:
/// `Modules/<sanitized-module>/<schema>.<table>.sql`.
#[must_use]
pub fn table_relative_path(module: &str, schema: &str, table: &str) -> String {
    format!("Modules/{}/{}.{}.sql", sanitize_segment(module), sanitize_segment(schema), sanitize_segment(table))
}

/// Builds the relative path for one static entity's seed SQL file:
/// `Seeds/<sanitized-module>/<schema>.<table>.sql`.
#[must_use]
pub fn seed_relative_path(module: &str, schema: &str, table: &str) -> String {
    format!("Seeds/{}/{}.{}.sql", sanitize_segment(module), sanitize_segment(schema), sanitize_segment(table))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_replaces_non_identifier_characters() {
        assert_eq!(sanitize_segment("Ext-Billing!"), "Ext_Billing_");
    }

    #[test]
    fn sanitize_falls_back_to_underscore_on_empty_input() {
        assert_eq!(sanitize_segment(""), "_");
    }

    #[test]
    fn table_relative_path_joins_sanitized_segments() {
        assert_eq!(table_relative_path("ExtBilling", "billing", "Account"), "Modules/ExtBilling/billing.Account.sql");
    }
}
