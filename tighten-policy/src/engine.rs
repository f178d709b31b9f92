// tighten-policy/src/engine.rs
// ============================================================================
// Module: Tightening Policy Engine (C8)
// Description: Folds a logical model and a profile snapshot into a
// PolicyDecisionSet, applying the fixed rationale tie-break order and the
// configured policy toggles.
// ============================================================================

//! ## Overview
//! One decision per coordinate, made exactly once (`spec.md` §4.8 "State
//! machine per column"): [`evaluate`] walks every active attribute,
//! relationship, and declared-unique index in the model, looks up its
//! evidence in the profile, and resolves a decision using [`crate::tristate`]
//! semantics so missing evidence never silently resolves to a tightened
//! result. [`opportunities`] and [`report`] derive the two audit artifacts
//! from the resulting set.

use tighten_core::decisions::Diagnostic;
use tighten_core::decisions::DiagnosticSeverity;
use tighten_core::decisions::Disposition;
use tighten_core::decisions::ForeignKeyDecision;
use tighten_core::decisions::NullabilityDecision;
use tighten_core::decisions::Opportunity;
use tighten_core::decisions::OpportunitiesReport;
use tighten_core::decisions::OpportunityCategory;
use tighten_core::decisions::PolicyDecisionReport;
use tighten_core::decisions::PolicyDecisionSet;
use tighten_core::decisions::Rationale;
use tighten_core::decisions::RiskLevel;
use tighten_core::decisions::UniqueIndexDecision;
use tighten_core::identifiers::Coordinate;
use tighten_core::model::Model;
use tighten_core::profile::ProbeStatus;
use tighten_core::profile::ProfileSnapshot;

use crate::toggles::OnMissingEvidence;
use crate::toggles::PolicyToggles;
use crate::toggles::RemediationMode;

/// Evaluates the full tightening policy for one run.
#[must_use]
pub fn evaluate(model: &Model, profile: &ProfileSnapshot, toggles: PolicyToggles) -> PolicyDecisionSet {
    let mut decisions = PolicyDecisionSet {
        nullability: std::collections::BTreeMap::new(),
        foreign_key: std::collections::BTreeMap::new(),
        unique_index: std::collections::BTreeMap::new(),
        diagnostics: Vec::new(),
        present_but_inactive: Vec::new(),
        toggle_snapshot: toggles.snapshot(),
    };

    for module in &model.modules {
        if !module.is_active {
            continue;
        }
        for entity in &module.entities {
            if !entity.is_active || entity.is_external {
                continue;
            }
            evaluate_nullability(entity, profile, toggles, &mut decisions);
            evaluate_foreign_keys(entity, profile, toggles, &mut decisions);
            evaluate_unique_indexes(entity, profile, toggles, &mut decisions);
        }
    }

    decisions
}

fn evaluate_nullability(
    entity: &tighten_core::model::Entity,
    profile: &ProfileSnapshot,
    toggles: PolicyToggles,
    decisions: &mut PolicyDecisionSet,
) {
    for attribute in &entity.attributes {
        if !attribute.is_active || attribute.is_identifier || attribute.is_autonumber {
            continue;
        }
        let coordinate =
            Coordinate::member(entity.schema.as_str(), entity.physical_name.as_str(), attribute.physical_name.as_str());
        let column_profile = profile.column(&coordinate);

        let decision = match column_profile.map(|cp| (cp.probe.status, cp.null_count)) {
            Some((ProbeStatus::Succeeded, 0)) if attribute.is_mandatory => {
                NullabilityDecision::MakeNotNull { rationale: Rationale::EvidenceConfirmed }
            }
            Some((ProbeStatus::Succeeded, 0)) => {
                NullabilityDecision::KeepNullable { rationale: Rationale::EvidenceConfirmed }
            }
            Some((ProbeStatus::Succeeded, _)) if attribute.is_mandatory => {
                match toggles.remediation_mode {
                    RemediationMode::Tolerate => {
                        NullabilityDecision::MakeNotNull { rationale: Rationale::RemediationTolerate }
                    }
                    RemediationMode::Strict => {
                        decisions.diagnostics.push(Diagnostic {
                            severity: DiagnosticSeverity::Warning,
                            code: "policy.nullability.contradiction".to_string(),
                            message: format!(
                                "{coordinate} is declared mandatory but the profile observed null values"
                            ),
                            coordinate: coordinate.clone(),
                        });
                        NullabilityDecision::KeepNullable { rationale: Rationale::EvidenceConfirmed }
                    }
                }
            }
            Some((ProbeStatus::Succeeded, _)) => {
                NullabilityDecision::KeepNullable { rationale: Rationale::EvidenceConfirmed }
            }
            _ if attribute.is_mandatory => match toggles.on_missing_evidence {
                OnMissingEvidence::Conservative => {
                    NullabilityDecision::KeepNullable { rationale: Rationale::EvidenceMissing }
                }
                OnMissingEvidence::EvidenceGated => {
                    decisions.diagnostics.push(Diagnostic {
                        severity: DiagnosticSeverity::Info,
                        code: "policy.nullability.missingEvidence".to_string(),
                        message: format!("{coordinate} has no profile evidence for its nullability probe"),
                        coordinate: coordinate.clone(),
                    });
                    NullabilityDecision::KeepNullable { rationale: Rationale::EvidenceMissing }
                }
                OnMissingEvidence::Aggressive => {
                    decisions.diagnostics.push(Diagnostic {
                        severity: DiagnosticSeverity::Warning,
                        code: "policy.nullability.missingEvidence".to_string(),
                        message: format!(
                            "{coordinate} has no profile evidence for its nullability probe; tightened anyway under the aggressive policy"
                        ),
                        coordinate: coordinate.clone(),
                    });
                    NullabilityDecision::MakeNotNull { rationale: Rationale::DeclaredMandatory }
                }
            },
            _ => NullabilityDecision::KeepNullable { rationale: Rationale::EvidenceMissing },
        };

        if attribute.reality.as_ref().is_some_and(|reality| reality.is_present_but_inactive) {
            decisions.present_but_inactive.push(coordinate.clone());
        }

        decisions.nullability.insert(coordinate, decision);
    }
}

fn evaluate_foreign_keys(
    entity: &tighten_core::model::Entity,
    profile: &ProfileSnapshot,
    toggles: PolicyToggles,
    decisions: &mut PolicyDecisionSet,
) {
    for relationship in &entity.relationships {
        let from = Coordinate::table(entity.schema.as_str(), relationship.from_table.as_str());
        let to = Coordinate::table(entity.schema.as_str(), relationship.to_table.as_str());
        let reality =
            profile.foreign_keys.iter().find(|reality| reality.from == from && reality.to == to);

        let decision = match reality {
            Some(reality) if !reality.has_orphan && !(reality.has_database_constraint && reality.is_no_check) => {
                ForeignKeyDecision::Create { rationale: Rationale::EvidenceConfirmed, is_no_check: false }
            }
            Some(_reality) => match toggles.remediation_mode {
                RemediationMode::Tolerate => {
                    ForeignKeyDecision::Create { rationale: Rationale::RemediationTolerate, is_no_check: true }
                }
                RemediationMode::Strict => {
                    decisions.diagnostics.push(Diagnostic {
                        severity: DiagnosticSeverity::Warning,
                        code: "policy.foreignKey.orphanedRows".to_string(),
                        message: format!("{from} -> {to} has orphaned rows or an untrusted NOCHECK constraint; constraint withheld"),
                        coordinate: from.clone(),
                    });
                    ForeignKeyDecision::KeepMissing { rationale: Rationale::EvidenceConfirmed }
                }
            },
            None => {
                decisions.diagnostics.push(Diagnostic {
                    severity: DiagnosticSeverity::Info,
                    code: "policy.foreignKey.missingEvidence".to_string(),
                    message: format!("{from} -> {to} has no orphan-check evidence"),
                    coordinate: from.clone(),
                });
                ForeignKeyDecision::KeepMissing { rationale: Rationale::EvidenceMissing }
            }
        };

        decisions.foreign_key.insert(from, decision);
    }
}

fn evaluate_unique_indexes(
    entity: &tighten_core::model::Entity,
    profile: &ProfileSnapshot,
    toggles: PolicyToggles,
    decisions: &mut PolicyDecisionSet,
) {
    let table = Coordinate::table(entity.schema.as_str(), entity.physical_name.as_str());
    for index in &entity.indexes {
        if index.is_platform_auto || !index.is_unique {
            continue;
        }
        let coordinate =
            Coordinate::member(entity.schema.as_str(), entity.physical_name.as_str(), index.name.as_str());

        let has_duplicate = if index.columns.len() > 1 {
            composite_unique_evidence(&table, &index.columns, profile)
        } else {
            profile
                .unique_candidate(&coordinate)
                .filter(|candidate| candidate.probe.status == ProbeStatus::Succeeded)
                .map(|candidate| candidate.has_duplicate)
        };

        let decision = match has_duplicate {
            Some(false) => UniqueIndexDecision::Enforce { rationale: Rationale::EvidenceConfirmed },
            Some(true) => match toggles.remediation_mode {
                RemediationMode::Tolerate => {
                    UniqueIndexDecision::Enforce { rationale: Rationale::RemediationTolerate }
                }
                RemediationMode::Strict => {
                    decisions.diagnostics.push(Diagnostic {
                        severity: DiagnosticSeverity::Warning,
                        code: "policy.uniqueIndex.duplicateValues".to_string(),
                        message: format!("{coordinate} is declared unique but duplicate values were observed"),
                        coordinate: coordinate.clone(),
                    });
                    UniqueIndexDecision::KeepNonUnique { rationale: Rationale::EvidenceConfirmed }
                }
            },
            None => {
                decisions.diagnostics.push(Diagnostic {
                    severity: DiagnosticSeverity::Info,
                    code: "policy.uniqueIndex.missingEvidence".to_string(),
                    message: format!("{coordinate} has no duplicate-check evidence covering every column prefix"),
                    coordinate: coordinate.clone(),
                });
                UniqueIndexDecision::KeepNonUnique { rationale: Rationale::EvidenceMissing }
            }
        };

        decisions.unique_index.insert(coordinate, decision);
    }
}

/// Resolves duplicate evidence for a composite unique-index candidate: every
/// column-prefix must be covered by a profile before the full composite's
/// `hasDuplicate` is trusted (`spec.md` §4.8). Returns `None` when any prefix
/// lacks coverage.
fn composite_unique_evidence(table: &Coordinate, columns: &[String], profile: &ProfileSnapshot) -> Option<bool> {
    for prefix_len in 1..=columns.len() {
        let prefix = &columns[..prefix_len];
        let covered = if prefix_len == 1 {
            let member_coordinate = Coordinate::member(table.schema.as_str(), table.table.as_str(), prefix[0].as_str());
            profile.unique_candidate(&member_coordinate).is_some()
        } else {
            profile.composite_unique_candidate(table, prefix).is_some()
        };
        if !covered {
            return None;
        }
    }
    profile.composite_unique_candidate(table, columns).map(|candidate| candidate.has_duplicate)
}

/// Derives the opportunities report from a decision set: every decision
/// whose rationale is not `evidence.confirmed` from a clean probe becomes a
/// finding, partitioned by disposition (`spec.md` §4.10).
#[must_use]
pub fn opportunities(decisions: &PolicyDecisionSet) -> OpportunitiesReport {
    let mut report = OpportunitiesReport::default();

    for (coordinate, decision) in &decisions.nullability {
        if let NullabilityDecision::MakeNotNull { rationale } = decision {
            let opportunity = Opportunity {
                coordinate: coordinate.clone(),
                disposition: disposition_for(*rationale),
                category: category_for(*rationale),
                kind: "nullability".to_string(),
                risk: risk_for(*rationale),
                message: format!("Tighten {coordinate} to NOT NULL ({})", rationale.code()),
                sql: format!(
                    "ALTER TABLE [{}].[{}] ALTER COLUMN [{}] /* existing type */ NOT NULL;",
                    coordinate.schema,
                    coordinate.table,
                    coordinate.member.as_deref().unwrap_or_default()
                ),
                evidence: vec![format!("rationale={}", rationale.code())],
            };
            push_opportunity(&mut report, opportunity);
        }
    }

    for (coordinate, decision) in &decisions.foreign_key {
        if let ForeignKeyDecision::Create { rationale, is_no_check } = decision {
            let opportunity = Opportunity {
                coordinate: coordinate.clone(),
                disposition: disposition_for(*rationale),
                category: category_for(*rationale),
                kind: "foreignKey".to_string(),
                risk: risk_for(*rationale),
                message: format!("Create foreign key constraint for {coordinate} ({})", rationale.code()),
                sql: format!(
                    "ALTER TABLE [{}].[{}] WITH {} ADD CONSTRAINT /* name */ FOREIGN KEY (/* columns */) REFERENCES /* target */;",
                    coordinate.schema,
                    coordinate.table,
                    if *is_no_check { "NOCHECK" } else { "CHECK" }
                ),
                evidence: vec![format!("rationale={}", rationale.code())],
            };
            push_opportunity(&mut report, opportunity);
        }
    }

    for (coordinate, decision) in &decisions.unique_index {
        if let UniqueIndexDecision::Enforce { rationale } = decision {
            let opportunity = Opportunity {
                coordinate: coordinate.clone(),
                disposition: disposition_for(*rationale),
                category: category_for(*rationale),
                kind: "uniqueIndex".to_string(),
                risk: risk_for(*rationale),
                message: format!("Enforce unique index for {coordinate} ({})", rationale.code()),
                sql: format!(
                    "CREATE UNIQUE INDEX [{}] ON [{}].[{}] (/* columns */);",
                    coordinate.member.as_deref().unwrap_or_default(),
                    coordinate.schema,
                    coordinate.table
                ),
                evidence: vec![format!("rationale={}", rationale.code())],
            };
            push_opportunity(&mut report, opportunity);
        }
    }

    for coordinate in &decisions.present_but_inactive {
        let opportunity = Opportunity {
            coordinate: coordinate.clone(),
            disposition: Disposition::NeedsRemediation,
            category: OpportunityCategory::Informational,
            kind: "presentButInactive".to_string(),
            risk: RiskLevel::Medium,
            message: format!("{coordinate} is present in the profiled database but inactive in the logical model"),
            sql: String::new(),
            evidence: vec!["rationale=evidence.confirmed".to_string()],
        };
        push_opportunity(&mut report, opportunity);
    }

    report.safe_to_apply.sort_by(|a, b| a.coordinate.cmp(&b.coordinate));
    report.needs_remediation.sort_by(|a, b| a.coordinate.cmp(&b.coordinate));
    report
}

fn push_opportunity(report: &mut OpportunitiesReport, opportunity: Opportunity) {
    match opportunity.disposition {
        Disposition::SafeToApply => report.safe_to_apply.push(opportunity),
        Disposition::NeedsRemediation => report.needs_remediation.push(opportunity),
    }
}

const fn disposition_for(rationale: Rationale) -> Disposition {
    match rationale {
        Rationale::RemediationTolerate => Disposition::NeedsRemediation,
        _ => Disposition::SafeToApply,
    }
}

const fn category_for(rationale: Rationale) -> OpportunityCategory {
    match rationale {
        Rationale::RemediationTolerate => OpportunityCategory::Contradiction,
        Rationale::DeclaredMandatory | Rationale::PolicyOverride => OpportunityCategory::Informational,
        Rationale::EvidenceConfirmed | Rationale::EvidenceMissing => OpportunityCategory::Improvement,
    }
}

const fn risk_for(rationale: Rationale) -> RiskLevel {
    match rationale {
        Rationale::EvidenceConfirmed => RiskLevel::Low,
        Rationale::DeclaredMandatory | Rationale::PolicyOverride => RiskLevel::Medium,
        Rationale::EvidenceMissing | Rationale::RemediationTolerate => RiskLevel::High,
    }
}

/// Rolls up tightened/created/enforced counts per module (`spec.md` §4.8).
#[must_use]
pub fn report(model: &Model, decisions: &PolicyDecisionSet) -> PolicyDecisionReport {
    let mut report = PolicyDecisionReport::default();

    for module in &model.modules {
        for entity in &module.entities {
            let tightened = entity
                .attributes
                .iter()
                .filter(|attribute| {
                    let coordinate = Coordinate::member(
                        entity.schema.as_str(),
                        entity.physical_name.as_str(),
                        attribute.physical_name.as_str(),
                    );
                    matches!(
                        decisions.nullability.get(&coordinate),
                        Some(NullabilityDecision::MakeNotNull { .. })
                    )
                })
                .count();
            if tightened > 0 {
                *report.tightened_columns_by_module.entry(module.name.clone()).or_insert(0) +=
                    tightened as u64;
            }

            let created = entity
                .relationships
                .iter()
                .filter(|relationship| {
                    let coordinate =
                        Coordinate::table(entity.schema.as_str(), relationship.from_table.as_str());
                    matches!(decisions.foreign_key.get(&coordinate), Some(ForeignKeyDecision::Create { .. }))
                })
                .count();
            if created > 0 {
                *report.created_foreign_keys_by_module.entry(module.name.clone()).or_insert(0) += created as u64;
            }

            let enforced = entity
                .indexes
                .iter()
                .filter(|index| {
                    let coordinate = Coordinate::member(
                        entity.schema.as_str(),
                        entity.physical_name.as_str(),
                        index.name.as_str(),
                    );
                    matches!(decisions.unique_index.get(&coordinate), Some(UniqueIndexDecision::Enforce { .. }))
                })
                .count();
            if enforced > 0 {
                *report.enforced_indexes_by_module.entry(module.name.clone()).or_insert(0) += enforced as u64;
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use tighten_core::model::Attribute;
    use tighten_core::model::Entity;
    use tighten_core::model::Module;
    use tighten_core::profile::ColumnProfile;
    use tighten_core::profile::Probe;

    use super::*;

    fn sample_model() -> Model {
        Model {
            exported_at_utc: "2026-01-01T00:00:00Z".to_string(),
            modules: vec![Module {
                name: "AppCore".to_string(),
                is_system: false,
                is_active: true,
                entities: vec![Entity {
                    name: "Customer".to_string(),
                    physical_name: "Customer".to_string(),
                    schema: "dbo".to_string(),
                    catalog: None,
                    is_active: true,
                    is_static: false,
                    is_external: false,
                    attributes: vec![Attribute {
                        name: "Name".to_string(),
                        physical_name: "Name".to_string(),
                        data_type: "Text".to_string(),
                        is_mandatory: true,
                        is_identifier: false,
                        is_autonumber: false,
                        is_active: true,
                        reality: None,
                    }],
                    indexes: vec![],
                    relationships: vec![],
                    triggers: vec![],
                }],
            }],
        }
    }

    #[test]
    fn confirmed_clean_evidence_tightens_regardless_of_toggles() {
        let model = sample_model();
        let profile = ProfileSnapshot {
            columns: vec![ColumnProfile {
                coordinate: Coordinate::member("dbo", "Customer", "Name"),
                row_count: 100,
                null_count: 0,
                probe: Probe { status: ProbeStatus::Succeeded, sampling_size: None, captured_at: "2026-01-01T00:00:00Z".to_string() },
            }],
            ..ProfileSnapshot::default()
        };
        let decisions = evaluate(&model, &profile, PolicyToggles::default());
        let decision = decisions.nullability.get(&Coordinate::member("dbo", "Customer", "Name")).unwrap();
        assert!(matches!(decision, NullabilityDecision::MakeNotNull { rationale: Rationale::EvidenceConfirmed }));
    }

    #[test]
    fn missing_evidence_keeps_nullable_silently_under_conservative() {
        let model = sample_model();
        let profile = ProfileSnapshot::default();
        let decisions = evaluate(&model, &profile, PolicyToggles::default());
        let decision = decisions.nullability.get(&Coordinate::member("dbo", "Customer", "Name")).unwrap();
        assert!(matches!(decision, NullabilityDecision::KeepNullable { rationale: Rationale::EvidenceMissing }));
        assert!(decisions.diagnostics.is_empty());
    }

    #[test]
    fn missing_evidence_keeps_nullable_with_diagnostic_under_evidence_gated() {
        let model = sample_model();
        let profile = ProfileSnapshot::default();
        let toggles = PolicyToggles {
            on_missing_evidence: OnMissingEvidence::EvidenceGated,
            remediation_mode: RemediationMode::Strict,
        };
        let decisions = evaluate(&model, &profile, toggles);
        let decision = decisions.nullability.get(&Coordinate::member("dbo", "Customer", "Name")).unwrap();
        assert!(matches!(decision, NullabilityDecision::KeepNullable { rationale: Rationale::EvidenceMissing }));
        assert_eq!(decisions.diagnostics.len(), 1);
    }

    #[test]
    fn missing_evidence_trusts_declared_intent_under_aggressive() {
        let model = sample_model();
        let profile = ProfileSnapshot::default();
        let toggles = PolicyToggles { on_missing_evidence: OnMissingEvidence::Aggressive, remediation_mode: RemediationMode::Strict };
        let decisions = evaluate(&model, &profile, toggles);
        let decision = decisions.nullability.get(&Coordinate::member("dbo", "Customer", "Name")).unwrap();
        assert!(matches!(decision, NullabilityDecision::MakeNotNull { rationale: Rationale::DeclaredMandatory }));
    }

    #[test]
    fn contradictory_evidence_blocks_tightening_under_strict_remediation() {
        let model = sample_model();
        let profile = ProfileSnapshot {
            columns: vec![ColumnProfile {
                coordinate: Coordinate::member("dbo", "Customer", "Name"),
                row_count: 100,
                null_count: 3,
                probe: Probe { status: ProbeStatus::Succeeded, sampling_size: None, captured_at: "2026-01-01T00:00:00Z".to_string() },
            }],
            ..ProfileSnapshot::default()
        };
        let decisions = evaluate(&model, &profile, PolicyToggles::default());
        let decision = decisions.nullability.get(&Coordinate::member("dbo", "Customer", "Name")).unwrap();
        assert!(matches!(decision, NullabilityDecision::KeepNullable { .. }));
        assert_eq!(decisions.diagnostics.len(), 1);
    }

    #[test]
    fn opportunities_partition_by_disposition() {
        let model = sample_model();
        let profile = ProfileSnapshot {
            columns: vec![ColumnProfile {
                coordinate: Coordinate::member("dbo", "Customer", "Name"),
                row_count: 100,
                null_count: 0,
                probe: Probe { status: ProbeStatus::Succeeded, sampling_size: None, captured_at: "2026-01-01T00:00:00Z".to_string() },
            }],
            ..ProfileSnapshot::default()
        };
        let decisions = evaluate(&model, &profile, PolicyToggles::default());
        let report = opportunities(&decisions);
        assert_eq!(report.safe_to_apply.len(), 1);
        assert!(report.needs_remediation.is_empty());
    }

    #[test]
    fn optional_attribute_with_clean_evidence_keeps_nullable() {
        let mut model = sample_model();
        model.modules[0].entities[0].attributes[0].is_mandatory = false;
        let profile = ProfileSnapshot {
            columns: vec![ColumnProfile {
                coordinate: Coordinate::member("dbo", "Customer", "Name"),
                row_count: 100,
                null_count: 0,
                probe: Probe { status: ProbeStatus::Succeeded, sampling_size: None, captured_at: "2026-01-01T00:00:00Z".to_string() },
            }],
            ..ProfileSnapshot::default()
        };
        let decisions = evaluate(&model, &profile, PolicyToggles::default());
        let decision = decisions.nullability.get(&Coordinate::member("dbo", "Customer", "Name")).unwrap();
        assert!(matches!(decision, NullabilityDecision::KeepNullable { rationale: Rationale::EvidenceConfirmed }));
    }

    #[test]
    fn present_but_inactive_column_emits_opportunity_without_changing_decision() {
        let mut model = sample_model();
        model.modules[0].entities[0].attributes[0].reality = Some(tighten_core::model::AttributeReality {
            is_nullable_physically: true,
            default_expression: None,
            is_computed: false,
            is_present_but_inactive: true,
        });
        let profile = ProfileSnapshot::default();
        let decisions = evaluate(&model, &profile, PolicyToggles::default());
        let decision = decisions.nullability.get(&Coordinate::member("dbo", "Customer", "Name")).unwrap();
        assert!(matches!(decision, NullabilityDecision::KeepNullable { rationale: Rationale::EvidenceMissing }));
        assert_eq!(decisions.present_but_inactive, vec![Coordinate::member("dbo", "Customer", "Name")]);

        let report = opportunities(&decisions);
        assert_eq!(report.needs_remediation.len(), 1);
        assert_eq!(report.needs_remediation[0].kind, "presentButInactive");
    }

    fn sample_relationship_model() -> Model {
        Model {
            exported_at_utc: "2026-01-01T00:00:00Z".to_string(),
            modules: vec![Module {
                name: "AppCore".to_string(),
                is_system: false,
                is_active: true,
                entities: vec![Entity {
                    name: "Order".to_string(),
                    physical_name: "Order".to_string(),
                    schema: "dbo".to_string(),
                    catalog: None,
                    is_active: true,
                    is_static: false,
                    is_external: false,
                    attributes: vec![],
                    indexes: vec![],
                    relationships: vec![tighten_core::model::Relationship {
                        from_table: "Order".to_string(),
                        to_table: "Customer".to_string(),
                        columns: std::iter::once(tighten_core::model::ColumnPair {
                            from_column: "CustomerId".to_string(),
                            to_column: "Id".to_string(),
                        })
                        .collect(),
                        delete_action: tighten_core::model::DeleteAction::NoAction,
                        has_database_constraint: false,
                    }],
                    triggers: vec![],
                }],
            }],
        }
    }

    #[test]
    fn existing_constraint_with_nocheck_and_no_orphans_still_withholds_under_strict() {
        let model = sample_relationship_model();
        let profile = ProfileSnapshot {
            foreign_keys: vec![tighten_core::profile::ForeignKeyReality {
                from: Coordinate::table("dbo", "Order"),
                to: Coordinate::table("dbo", "Customer"),
                has_orphan: false,
                is_no_check: true,
                has_database_constraint: true,
            }],
            ..ProfileSnapshot::default()
        };
        let decisions = evaluate(&model, &profile, PolicyToggles::default());
        let decision = decisions.foreign_key.get(&Coordinate::table("dbo", "Order")).unwrap();
        assert!(matches!(decision, ForeignKeyDecision::KeepMissing { .. }));
    }

    #[test]
    fn database_constraint_with_orphans_is_withheld_not_created() {
        let model = sample_relationship_model();
        let profile = ProfileSnapshot {
            foreign_keys: vec![tighten_core::profile::ForeignKeyReality {
                from: Coordinate::table("dbo", "Order"),
                to: Coordinate::table("dbo", "Customer"),
                has_orphan: true,
                is_no_check: false,
                has_database_constraint: true,
            }],
            ..ProfileSnapshot::default()
        };
        let decisions = evaluate(&model, &profile, PolicyToggles::default());
        let decision = decisions.foreign_key.get(&Coordinate::table("dbo", "Order")).unwrap();
        assert!(matches!(decision, ForeignKeyDecision::KeepMissing { .. }));

        let toggles = PolicyToggles { on_missing_evidence: OnMissingEvidence::Conservative, remediation_mode: RemediationMode::Tolerate };
        let tolerated = evaluate(&model, &profile, toggles);
        let decision = tolerated.foreign_key.get(&Coordinate::table("dbo", "Order")).unwrap();
        assert!(matches!(
            decision,
            ForeignKeyDecision::Create { rationale: Rationale::RemediationTolerate, is_no_check: true }
        ));
    }
}
