// tighten-core/src/model.rs
// ============================================================================
// Module: Logical model (input data, spec.md §3)
// ============================================================================

//! ## Overview
//! The logical model is authoritative input exported from a low-code
//! platform: an ordered sequence of modules, each an ordered sequence of
//! entities, each carrying attributes, indexes, relationships, and triggers.
//! No heuristic discovery is performed — the model is trusted as given
//! (`spec.md` §1 "Non-goals").

use serde::Deserialize;
use serde::Serialize;
use smallvec::SmallVec;

/// The full exported logical model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    /// Export timestamp, UTC, as provided by the source platform.
    #[serde(rename = "exportedAtUtc")]
    pub exported_at_utc: String,
    /// Modules in declared (input) order.
    pub modules: Vec<Module>,
}

/// A grouping of entities exported together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    /// Module name.
    pub name: String,
    /// Whether this is a platform system module.
    #[serde(rename = "isSystem", default)]
    pub is_system: bool,
    /// Whether the module is active.
    #[serde(rename = "isActive", default = "default_true")]
    pub is_active: bool,
    /// Entities in declared order.
    pub entities: Vec<Entity>,
}

/// A logical table within a module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Module-qualified logical name.
    pub name: String,
    /// Physical table name.
    #[serde(rename = "physicalName")]
    pub physical_name: String,
    /// Database schema.
    #[serde(rename = "db_schema")]
    pub schema: String,
    /// Database catalog, when the source distinguishes one.
    #[serde(default)]
    pub catalog: Option<String>,
    /// Whether the entity is active.
    #[serde(rename = "isActive", default = "default_true")]
    pub is_active: bool,
    /// Whether the entity is a static (seed-data) entity.
    #[serde(rename = "isStatic", default)]
    pub is_static: bool,
    /// Whether the entity is external (not owned by this export).
    #[serde(rename = "isExternal", default)]
    pub is_external: bool,
    /// Attributes in declared order.
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    /// Indexes in declared order.
    #[serde(default)]
    pub indexes: Vec<Index>,
    /// Relationships (foreign keys) in declared order.
    #[serde(default)]
    pub relationships: Vec<Relationship>,
    /// Triggers in declared order.
    #[serde(default)]
    pub triggers: Vec<Trigger>,
}

/// An observed reality about a column, distinct from its declared intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeReality {
    /// Whether the profile's nullability probe succeeded and found zero
    /// nulls, as reported separately in the profile snapshot; this flag
    /// only records whether the platform marked the column nullable at all.
    #[serde(rename = "isNullablePhysically", default)]
    pub is_nullable_physically: bool,
    /// Declared default expression, if any.
    #[serde(default)]
    pub default_expression: Option<String>,
    /// Whether the column is computed.
    #[serde(rename = "isComputed", default)]
    pub is_computed: bool,
    /// Present in the physical schema but deactivated in the logical model.
    #[serde(rename = "isPresentButInactive", default)]
    pub is_present_but_inactive: bool,
}

/// A logical column belonging to an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    /// Logical name.
    pub name: String,
    /// Physical column name.
    #[serde(rename = "physicalName")]
    pub physical_name: String,
    /// Declared data type (platform-specific token, mapped later by the
    /// relational model factory's type-mapping policy).
    #[serde(rename = "dataType")]
    pub data_type: String,
    /// Whether the platform declares this attribute mandatory.
    #[serde(rename = "isMandatory", default)]
    pub is_mandatory: bool,
    /// Whether this attribute is (part of) the identifier.
    #[serde(rename = "isIdentifier", default)]
    pub is_identifier: bool,
    /// Whether this attribute auto-numbers.
    #[serde(rename = "isAutoNumber", default)]
    pub is_autonumber: bool,
    /// Whether the attribute is active.
    #[serde(rename = "isActive", default = "default_true")]
    pub is_active: bool,
    /// Optional observed reality for this column.
    #[serde(default)]
    pub reality: Option<AttributeReality>,
}

/// A declared index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    /// Index name.
    pub name: String,
    /// Whether the index is declared unique.
    #[serde(rename = "isUnique", default)]
    pub is_unique: bool,
    /// Whether the index was auto-generated by the platform rather than
    /// explicitly declared.
    #[serde(rename = "isPlatformAuto", default)]
    pub is_platform_auto: bool,
    /// Physical column names, in declared order.
    pub columns: Vec<String>,
}

/// The action taken on delete of the referenced row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteAction {
    /// No action (the default, most restrictive).
    NoAction,
    /// Cascade the delete.
    Cascade,
    /// Set the referencing column(s) to NULL.
    SetNull,
    /// Set the referencing column(s) to their default.
    SetDefault,
}

/// One column-pair of a (possibly composite) foreign key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnPair {
    /// Physical column name on the referencing (from) side.
    pub from_column: String,
    /// Physical column name on the referenced (to) side.
    pub to_column: String,
}

/// A declared foreign key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    /// Physical table name on the referencing side.
    pub from_table: String,
    /// Physical table name on the referenced side.
    pub to_table: String,
    /// Column pairs, in declared order. Composite keys rarely exceed a
    /// couple of columns, so this stays inline the way `ret-logic` inlines
    /// its own low-cardinality requirement lists.
    pub columns: SmallVec<[ColumnPair; 2]>,
    /// Declared delete action.
    #[serde(rename = "deleteAction", default = "default_delete_action")]
    pub delete_action: DeleteAction,
    /// Whether the database already enforces this constraint physically.
    #[serde(rename = "hasDatabaseConstraint", default)]
    pub has_database_constraint: bool,
}

/// A declared trigger. The pipeline carries triggers through to emission
/// without interpreting their body (`spec.md` places trigger text synthesis
/// out of scope for tightening analysis).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trigger {
    /// Trigger name.
    pub name: String,
    /// Trigger body, opaque to this pipeline.
    pub definition: String,
}

const fn default_true() -> bool {
    true
}

const fn default_delete_action() -> DeleteAction {
    DeleteAction::NoAction
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_defaults_active_true_when_absent() {
        let json = r#"{"name":"AppCore","entities":[]}"#;
        let module: Module = serde_json::from_str(json).unwrap();
        assert!(module.is_active);
        assert!(!module.is_system);
    }

    #[test]
    fn entity_round_trips_through_json() {
        let entity = Entity {
            name: "Customer".to_string(),
            physical_name: "Customer".to_string(),
            schema: "dbo".to_string(),
            catalog: None,
            is_active: true,
            is_static: false,
            is_external: false,
            attributes: vec![],
            indexes: vec![],
            relationships: vec![],
            triggers: vec![],
        };
        let json = serde_json::to_string(&entity).unwrap();
        let parsed: Entity = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, entity);
    }
}
