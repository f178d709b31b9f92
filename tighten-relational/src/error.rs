// tighten-relational/src/error.rs
// ============================================================================
// Module: Relational model factory errors
// ============================================================================

//! ## Overview
//! Policy-layer errors for the relational model factory (`spec.md` §7
//! "Policy errors: contradictory toggles; type-mapping gap"; §4.9 "missing
//! mappings fail with `typeMapping.missing`").

use thiserror::Error;

use tighten_core::identifiers::Coordinate;

/// Errors raised while projecting the logical model into a relational one.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RelationalError {
    /// No entry in the type-mapping policy covers a declared data type.
    #[error("no type mapping for declared type {declared_type:?} at {coordinate}")]
    TypeMappingMissing {
        /// The declared (platform) type token that has no mapping.
        declared_type: String,
        /// Coordinate of the column with the unmapped type.
        coordinate: Coordinate,
    },
    /// Two entities resolved to the same physical `(schema, table)` name
    /// after naming overrides were applied.
    #[error("naming collision: {first} and {second} both resolve to {schema}.{table}")]
    NamingCollision {
        /// Schema the collision occurred in.
        schema: String,
        /// Physical table name both entities resolved to.
        table: String,
        /// Logical name of the first entity encountered.
        first: String,
        /// Logical name of the second entity encountered.
        second: String,
    },
}

impl RelationalError {
    /// The dotted error code for this variant.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::TypeMappingMissing { .. } => "typeMapping.missing",
            Self::NamingCollision { .. } => "relational.naming.collision",
        }
    }
}
