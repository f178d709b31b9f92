// tighten-relational/src/factory.rs
// ============================================================================
// Module: Relational model factory (C9)
// ============================================================================

//! ## Overview
//! [`build`] folds a filtered logical [`Model`] and the [`PolicyDecisionSet`]
//! produced for it into a [`RelationalModel`]: one [`RelationalTable`] per
//! active, non-external entity, with nullability/uniqueness/foreign-key
//! shape resolved from the decision set rather than the bare declaration
//! (`spec.md` §4.9). Declared types are resolved through a
//! [`TypeMappingPolicy`]; table names through [`NamingOverrides`]. A profile
//! snapshot is not threaded through this stage — every decision it could
//! influence was already resolved by the tightening policy (`tighten-policy`)
//! before the factory runs.

use std::collections::BTreeMap;

use tighten_core::decisions::ForeignKeyDecision;
use tighten_core::decisions::NullabilityDecision;
use tighten_core::decisions::PolicyDecisionSet;
use tighten_core::decisions::UniqueIndexDecision;
use tighten_core::identifiers::Coordinate;
use tighten_core::model::Entity;
use tighten_core::model::Model;
use tighten_core::relational::Column as RelationalColumn;
use tighten_core::relational::EmissionCoverage;
use tighten_core::relational::ForeignKey as RelationalForeignKey;
use tighten_core::relational::Index as RelationalIndex;
use tighten_core::relational::RelationalModel;
use tighten_core::relational::Table as RelationalTable;
use tighten_core::relational::Trigger as RelationalTrigger;

use crate::error::RelationalError;
use crate::naming::NamingOverrides;
use crate::type_mapping::TypeMappingPolicy;

/// Build-time options for the relational model factory (`spec.md` §4.9
/// "Filter platform-auto indexes by build option").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RelationalBuildOptions {
    /// Whether platform-auto-generated indexes are carried into the
    /// relational model. Declaration order is preserved either way.
    pub include_platform_auto_indexes: bool,
}

/// Projects a filtered logical model and its tightening decisions into a
/// relational model, plus an [`EmissionCoverage`] summary of what was
/// included and what was skipped.
///
/// # Errors
///
/// Returns [`RelationalError::TypeMappingMissing`] when a declared attribute
/// type has no entry in `type_mapping`, and
/// [`RelationalError::NamingCollision`] when two entities resolve to the
/// same `(schema, physical_name)` after naming overrides are applied.
pub fn build(
    model: &Model,
    decisions: &PolicyDecisionSet,
    type_mapping: &TypeMappingPolicy,
    naming: &NamingOverrides,
    options: RelationalBuildOptions,
) -> Result<(RelationalModel, EmissionCoverage), RelationalError> {
    let mut tables = Vec::new();
    let mut coverage = EmissionCoverage::default();
    let mut seen_logical: BTreeMap<(String, String), String> = BTreeMap::new();

    for module in &model.modules {
        if !module.is_active {
            for entity in &module.entities {
                coverage.skipped_entities.push((entity.name.clone(), "moduleInactive".to_string()));
            }
            continue;
        }
        for entity in &module.entities {
            if !entity.is_active {
                coverage.skipped_entities.push((entity.name.clone(), "inactive".to_string()));
                continue;
            }
            if entity.is_external {
                coverage.skipped_entities.push((entity.name.clone(), "external".to_string()));
                continue;
            }

            let physical_name = naming.resolve_table_name(&module.name, &entity.name, &entity.physical_name);
            let key = (entity.schema.clone(), physical_name.clone());
            if let Some(first) = seen_logical.get(&key) {
                return Err(RelationalError::NamingCollision {
                    schema: entity.schema.clone(),
                    table: physical_name,
                    first: first.clone(),
                    second: entity.name.clone(),
                });
            }
            seen_logical.insert(key, entity.name.clone());

            let columns = build_columns(entity, decisions, type_mapping)?;
            let indexes = build_indexes(entity, decisions, options);
            let foreign_keys = build_foreign_keys(entity, decisions);
            let triggers = entity
                .triggers
                .iter()
                .map(|trigger| RelationalTrigger { name: trigger.name.clone(), definition: trigger.definition.clone() })
                .collect();

            tables.push(RelationalTable {
                module: module.name.clone(),
                schema: entity.schema.clone(),
                physical_name,
                logical_name: entity.name.clone(),
                description: None,
                columns,
                indexes,
                foreign_keys,
                triggers,
                is_static: entity.is_static,
            });
            coverage.included_entity_count += 1;
        }
    }

    tables.sort_by(|a, b| (a.schema.as_str(), a.physical_name.as_str()).cmp(&(b.schema.as_str(), b.physical_name.as_str())));

    Ok((RelationalModel { tables }, coverage))
}

fn build_columns(
    entity: &Entity,
    decisions: &PolicyDecisionSet,
    type_mapping: &TypeMappingPolicy,
) -> Result<Vec<RelationalColumn>, RelationalError> {
    let mut columns = Vec::with_capacity(entity.attributes.len());
    for attribute in &entity.attributes {
        if !attribute.is_active {
            continue;
        }
        let mapping = type_mapping.resolve(&attribute.data_type).ok_or_else(|| RelationalError::TypeMappingMissing {
            declared_type: attribute.data_type.clone(),
            coordinate: Coordinate::member(entity.schema.as_str(), entity.physical_name.as_str(), attribute.physical_name.as_str()),
        })?;

        let nullable = if attribute.is_identifier || attribute.is_autonumber {
            false
        } else {
            let coordinate =
                Coordinate::member(entity.schema.as_str(), entity.physical_name.as_str(), attribute.physical_name.as_str());
            !matches!(decisions.nullability.get(&coordinate), Some(NullabilityDecision::MakeNotNull { .. }))
        };

        columns.push(RelationalColumn {
            physical_name: attribute.physical_name.clone(),
            sql_type: mapping.render(),
            nullable,
            identity: attribute.is_autonumber,
            default_expression: attribute.reality.as_ref().and_then(|reality| reality.default_expression.clone()),
            check_constraints: Vec::new(),
            collation: mapping.collation.clone(),
            description: None,
        });
    }
    Ok(columns)
}

fn build_indexes(entity: &Entity, decisions: &PolicyDecisionSet, options: RelationalBuildOptions) -> Vec<RelationalIndex> {
    let mut indexes = Vec::new();
    for index in &entity.indexes {
        if index.is_platform_auto && !options.include_platform_auto_indexes {
            continue;
        }
        let unique = if index.is_unique {
            let coordinate = Coordinate::member(entity.schema.as_str(), entity.physical_name.as_str(), index.name.as_str());
            matches!(decisions.unique_index.get(&coordinate), Some(UniqueIndexDecision::Enforce { .. }))
        } else {
            false
        };
        indexes.push(RelationalIndex { name: index.name.clone(), unique, columns: index.columns.clone() });
    }
    indexes
}

fn build_foreign_keys(entity: &Entity, decisions: &PolicyDecisionSet) -> Vec<RelationalForeignKey> {
    let mut foreign_keys = Vec::new();
    for relationship in &entity.relationships {
        let coordinate = Coordinate::table(entity.schema.as_str(), relationship.from_table.as_str());
        let Some(ForeignKeyDecision::Create { is_no_check, .. }) = decisions.foreign_key.get(&coordinate) else {
            continue;
        };
        foreign_keys.push(RelationalForeignKey {
            name: format!("FK_{}_{}", relationship.from_table, relationship.to_table),
            from_columns: relationship.columns.iter().map(|pair| pair.from_column.clone()).collect(),
            to_table: relationship.to_table.clone(),
            to_columns: relationship.columns.iter().map(|pair| pair.to_column.clone()).collect(),
            is_no_check: *is_no_check,
            delete_action: relationship.delete_action,
        });
    }
    foreign_keys
}
