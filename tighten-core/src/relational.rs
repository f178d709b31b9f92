// tighten-core/src/relational.rs
// ============================================================================
// Module: Relational model (derived data, spec.md §3, §4.9)
// ============================================================================

//! ## Overview
//! The relational model factory (`spec.md` §4.9) folds a logical [`Model`],
//! a [`crate::profile::ProfileSnapshot`], and a [`crate::decisions::PolicyDecisionSet`]
//! into the physical shape emitted as SQL: per-table columns with resolved
//! nullability, resolved indexes, resolved foreign keys, and triggers carried
//! through opaque. This module only holds the derived value types; the fold
//! itself lives in `tighten-relational`.
//!
//! [`Model`]: crate::model::Model

use serde::Deserialize;
use serde::Serialize;

/// A resolved physical column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Physical column name.
    pub physical_name: String,
    /// SQL type, mapped from the logical data type by the type-mapping
    /// policy (`spec.md` §4.9).
    pub sql_type: String,
    /// Resolved nullability, after policy decisions are applied.
    pub nullable: bool,
    /// Whether the column is an identity column.
    pub identity: bool,
    /// Declared default expression, if any.
    pub default_expression: Option<String>,
    /// Check-constraint expressions attached to this column.
    pub check_constraints: Vec<String>,
    /// Explicit collation override, if any.
    pub collation: Option<String>,
    /// Optional human-readable description carried through for emission.
    pub description: Option<String>,
}

/// A resolved physical index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    /// Index name.
    pub name: String,
    /// Whether the index is enforced unique, after policy decisions.
    pub unique: bool,
    /// Columns making up the index, in order.
    pub columns: Vec<String>,
}

/// A resolved physical foreign key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    /// Constraint name, synthesized deterministically from the coordinate.
    pub name: String,
    /// Referencing columns.
    pub from_columns: Vec<String>,
    /// Referenced table.
    pub to_table: String,
    /// Referenced columns.
    pub to_columns: Vec<String>,
    /// Whether the constraint is created `WITH NOCHECK`.
    pub is_no_check: bool,
    /// Declared delete action, carried through from the logical model.
    pub delete_action: crate::model::DeleteAction,
}

/// A trigger, carried through emission without interpretation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trigger {
    /// Trigger name.
    pub name: String,
    /// Trigger body, opaque.
    pub definition: String,
}

/// A resolved physical table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// Owning module name, carried through for reporting and for the
    /// configurable per-module emission parallelism (`spec.md` §5).
    pub module: String,
    /// Database schema.
    pub schema: String,
    /// Physical table name.
    pub physical_name: String,
    /// Logical (entity) name, carried through for diagnostics.
    pub logical_name: String,
    /// Optional human-readable description.
    pub description: Option<String>,
    /// Resolved columns, in declared order.
    pub columns: Vec<Column>,
    /// Resolved indexes, in declared order.
    pub indexes: Vec<Index>,
    /// Resolved foreign keys, in declared order.
    pub foreign_keys: Vec<ForeignKey>,
    /// Triggers, carried through opaque.
    pub triggers: Vec<Trigger>,
    /// Whether this table is a static (seed-data) entity (`spec.md` §4.10
    /// "static-entity seed scripts").
    pub is_static: bool,
}

/// The derived relational model for one run: every table the emitter will
/// render, in deterministic (schema, physical_name) order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RelationalModel {
    /// Resolved tables.
    pub tables: Vec<Table>,
}

/// Coverage summary of which declared entities made it into the relational
/// model, and which were dropped and why (`spec.md` §4.5 ingestor filter,
/// §4.9 relational model factory).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct EmissionCoverage {
    /// Count of entities included in the relational model.
    pub included_entity_count: u64,
    /// Entities skipped, with a short reason each (e.g. `"inactive"`,
    /// `"external"`).
    pub skipped_entities: Vec<(String, String)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relational_model_default_is_empty() {
        let model = RelationalModel::default();
        assert!(model.tables.is_empty());
    }

    #[test]
    fn emission_coverage_tracks_skip_reasons() {
        let mut coverage = EmissionCoverage::default();
        coverage.skipped_entities.push(("Legacy".to_string(), "inactive".to_string()));
        assert_eq!(coverage.skipped_entities.len(), 1);
    }
}
