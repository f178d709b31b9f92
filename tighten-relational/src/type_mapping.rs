// tighten-relational/src/type_mapping.rs
// ============================================================================
// Module: Type-mapping policy (spec.md §4.9)
// ============================================================================

//! ## Overview
//! "Map declared types through the type-mapping policy (a configurable
//! mapping `declaredType → (sqlType, length, precision, scale, collation)`;
//! missing mappings fail with `typeMapping.missing`)" (`spec.md` §4.9). The
//! mapping is keyed by the platform's declared type token, case-sensitively
//! — two distinct platform tokens are never silently folded together.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

/// The resolved SQL shape a declared logical type maps to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlTypeMapping {
    /// Base SQL type keyword (e.g. `NVARCHAR`, `DECIMAL`, `BIGINT`).
    pub sql_type: String,
    /// Declared length, for variable-length types.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,
    /// Declared precision, for numeric types.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u32>,
    /// Declared scale, for numeric types.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<u32>,
    /// Explicit collation override, for character types.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collation: Option<String>,
}

impl SqlTypeMapping {
    /// Renders the mapping as a SQL type literal, e.g. `NVARCHAR(50)` or
    /// `DECIMAL(18, 2)`.
    #[must_use]
    pub fn render(&self) -> String {
        if let (Some(precision), Some(scale)) = (self.precision, self.scale) {
            return format!("{}({precision}, {scale})", self.sql_type);
        }
        match self.length {
            Some(length) => format!("{}({length})", self.sql_type),
            None => self.sql_type.clone(),
        }
    }
}

/// A configurable mapping from declared (platform) type tokens to SQL
/// shapes. Lookups are exact-match against `declared_type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TypeMappingPolicy {
    entries: BTreeMap<String, SqlTypeMapping>,
}

impl TypeMappingPolicy {
    /// Builds an empty policy with no mappings.
    #[must_use]
    pub fn new() -> Self {
        Self { entries: BTreeMap::new() }
    }

    /// Registers (or overwrites) the mapping for a declared type token.
    #[must_use]
    pub fn with_mapping(mut self, declared_type: impl Into<String>, mapping: SqlTypeMapping) -> Self {
        self.entries.insert(declared_type.into(), mapping);
        self
    }

    /// Looks up the mapping for a declared type, if registered.
    #[must_use]
    pub fn resolve(&self, declared_type: &str) -> Option<&SqlTypeMapping> {
        self.entries.get(declared_type)
    }

    /// The platform-default mapping set covering the common low-code data
    /// types this pipeline encounters in practice.
    #[must_use]
    pub fn platform_default() -> Self {
        Self::new()
            .with_mapping(
                "Text",
                SqlTypeMapping { sql_type: "NVARCHAR".to_string(), length: Some(255), precision: None, scale: None, collation: None },
            )
            .with_mapping(
                "LongText",
                SqlTypeMapping { sql_type: "NVARCHAR".to_string(), length: None, precision: None, scale: None, collation: None },
            )
            .with_mapping(
                "Integer",
                SqlTypeMapping { sql_type: "INT".to_string(), length: None, precision: None, scale: None, collation: None },
            )
            .with_mapping(
                "Long",
                SqlTypeMapping { sql_type: "BIGINT".to_string(), length: None, precision: None, scale: None, collation: None },
            )
            .with_mapping(
                "Decimal",
                SqlTypeMapping {
                    sql_type: "DECIMAL".to_string(),
                    length: None,
                    precision: Some(18),
                    scale: Some(2),
                    collation: None,
                },
            )
            .with_mapping(
                "Boolean",
                SqlTypeMapping { sql_type: "BIT".to_string(), length: None, precision: None, scale: None, collation: None },
            )
            .with_mapping(
                "DateTime",
                SqlTypeMapping { sql_type: "DATETIME2".to_string(), length: None, precision: None, scale: None, collation: None },
            )
            .with_mapping(
                "Guid",
                SqlTypeMapping { sql_type: "UNIQUEIDENTIFIER".to_string(), length: None, precision: None, scale: None, collation: None },
            )
            .with_mapping(
                "Binary",
                SqlTypeMapping { sql_type: "VARBINARY".to_string(), length: Some(u32::MAX), precision: None, scale: None, collation: None },
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_includes_length_when_present() {
        let mapping = SqlTypeMapping { sql_type: "NVARCHAR".to_string(), length: Some(50), precision: None, scale: None, collation: None };
        assert_eq!(mapping.render(), "NVARCHAR(50)");
    }

    #[test]
    fn render_includes_precision_and_scale() {
        let mapping = SqlTypeMapping { sql_type: "DECIMAL".to_string(), length: None, precision: Some(18), scale: Some(2), collation: None };
        assert_eq!(mapping.render(), "DECIMAL(18, 2)");
    }

    #[test]
    fn render_is_bare_keyword_without_shape() {
        let mapping = SqlTypeMapping { sql_type: "BIT".to_string(), length: None, precision: None, scale: None, collation: None };
        assert_eq!(mapping.render(), "BIT");
    }

    #[test]
    fn unregistered_type_resolves_to_none() {
        let policy = TypeMappingPolicy::platform_default();
        assert!(policy.resolve("SomeUnmappedCustomType").is_none());
    }

    #[test]
    fn platform_default_covers_text() {
        let policy = TypeMappingPolicy::platform_default();
        assert_eq!(policy.resolve("Text").map(SqlTypeMapping::render), Some("NVARCHAR(255)".to_string()));
    }
}
