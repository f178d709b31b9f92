// tighten-core/src/identifiers.rs
// ============================================================================
// Module: Identifiers
// Description: Arena indices for the model graph and coordinate keys used
// throughout the profile and decision data.
// ============================================================================

//! ## Overview
//! `spec.md` §9 ("Cyclic references in the model graph") requires entities
//! to reference modules and each other via index-into-arena identifiers
//! rather than pointers, resolved at emission by lookup. [`ModuleId`] and
//! [`EntityId`] are those indices; [`Coordinate`] is the `(schema, table[,
//! column|index])` triple used to key profile and decision data (`spec.md`
//! §3, §4.4).

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

/// An index into a [`crate::model::Model`]'s module list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ModuleId(pub usize);

/// An index into a module's entity list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub usize);

/// A fully-qualified reference to an entity, resolved at emission by
/// looking up `(module, entity)` in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    /// Owning module.
    pub module: ModuleId,
    /// Entity within the module.
    pub entity: EntityId,
}

/// A `(schema, table[, column|index])` coordinate, the key used to join
/// profile evidence and tightening decisions to model coordinates
/// (`spec.md` §3: "Coordinates use `(schema, table[, column|index])`
/// triples").
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Coordinate {
    /// Database schema name.
    pub schema: String,
    /// Physical table name.
    pub table: String,
    /// Optional column or index name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member: Option<String>,
}

impl Coordinate {
    /// Builds a table-level coordinate (no column or index).
    #[must_use]
    pub fn table(schema: impl Into<String>, table: impl Into<String>) -> Self {
        Self { schema: schema.into(), table: table.into(), member: None }
    }

    /// Builds a column- or index-level coordinate.
    #[must_use]
    pub fn member(schema: impl Into<String>, table: impl Into<String>, member: impl Into<String>) -> Self {
        Self { schema: schema.into(), table: table.into(), member: Some(member.into()) }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.member {
            Some(member) => write!(f, "{}.{}.{}", self.schema, self.table, member),
            None => write!(f, "{}.{}", self.schema, self.table),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinate_display_includes_member_when_present() {
        let coordinate = Coordinate::member("dbo", "Customer", "Name");
        assert_eq!(coordinate.to_string(), "dbo.Customer.Name");
    }

    #[test]
    fn coordinate_display_omits_member_when_absent() {
        let coordinate = Coordinate::table("dbo", "Customer");
        assert_eq!(coordinate.to_string(), "dbo.Customer");
    }

    #[test]
    fn coordinates_sort_lexicographically() {
        let mut coordinates =
            vec![Coordinate::table("dbo", "Z"), Coordinate::table("dbo", "A"), Coordinate::table("billing", "B")];
        coordinates.sort();
        assert_eq!(coordinates[0].schema, "billing");
    }
}
