// tighten-relational/src/naming.rs
// ============================================================================
// Module: Naming overrides (spec.md §4.9)
// ============================================================================

//! ## Overview
//! "Apply naming overrides (per-module or per-entity table renames;
//! case-sensitive collision check)" (`spec.md` §4.9). Per-entity overrides
//! take precedence over per-module prefixes; neither ever touches schema
//! names, only the physical table name.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

/// Per-module or per-entity table rename overrides applied while projecting
/// the relational model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct NamingOverrides {
    /// A literal physical-table-name replacement, keyed by `module.entity`
    /// logical name.
    #[serde(default)]
    pub entity_renames: BTreeMap<String, String>,
    /// A prefix prepended to every physical table name in a module.
    #[serde(default)]
    pub module_prefixes: BTreeMap<String, String>,
}

impl NamingOverrides {
    /// Resolves the physical table name for an entity, applying any
    /// registered override. Falls back to `declared_physical_name`
    /// unchanged when no override applies.
    #[must_use]
    pub fn resolve_table_name(&self, module: &str, entity: &str, declared_physical_name: &str) -> String {
        let key = format!("{module}.{entity}");
        if let Some(renamed) = self.entity_renames.get(&key) {
            return renamed.clone();
        }
        match self.module_prefixes.get(module) {
            Some(prefix) => format!("{prefix}{declared_physical_name}"),
            None => declared_physical_name.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_override_keeps_declared_name() {
        let overrides = NamingOverrides::default();
        assert_eq!(overrides.resolve_table_name("AppCore", "Customer", "Customer"), "Customer");
    }

    #[test]
    fn module_prefix_is_prepended() {
        let mut overrides = NamingOverrides::default();
        overrides.module_prefixes.insert("ExtBilling".to_string(), "bil_".to_string());
        assert_eq!(overrides.resolve_table_name("ExtBilling", "Account", "Account"), "bil_Account");
    }

    #[test]
    fn entity_rename_takes_precedence_over_module_prefix() {
        let mut overrides = NamingOverrides::default();
        overrides.module_prefixes.insert("ExtBilling".to_string(), "bil_".to_string());
        overrides.entity_renames.insert("ExtBilling.Account".to_string(), "BillingAccount".to_string());
        assert_eq!(overrides.resolve_table_name("ExtBilling", "Account", "Account"), "BillingAccount");
    }
}
