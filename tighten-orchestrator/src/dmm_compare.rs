// tighten-orchestrator/src/dmm_compare.rs
// ============================================================================
// Module: DmmCompare pipeline (C11)
// ============================================================================

//! ## Overview
//! The `DmmCompare` named pipeline (`spec.md` §6
//! "DmmComparePipelineRequest"). The SQL-text comparison itself is an
//! external collaborator (`spec.md` §1: "the SQL-text comparison step
//! against an external reference script... diff is a leaf consumer") — this
//! pipeline runs the shared bootstrapper and relational-model build exactly
//! as `BuildSsdt` does, then hands the resolved model and a reference
//! script off to an injected [`ReferenceScriptComparator`], packaging its
//! verdict as a `DmmCompareResult` (`spec.md` §8 scenario S6).

use tighten_config::TighteningOptions;
use tighten_core::decisions::PolicyDecisionSet;
use tighten_core::log::ExecutionLog;
use tighten_core::log::MetadataBuilder;
use tighten_core::outcome::ErrorRecord;
use tighten_core::outcome::Outcome;
use tighten_core::relational::EmissionCoverage;
use tighten_core::relational::RelationalModel;
use tighten_policy::evaluate;
use tighten_relational::build as build_relational;

use crate::bootstrap::BootstrapContext;
use crate::bootstrap::BootstrapRequest;
use crate::bootstrap::bootstrap;

/// One difference a reference-script comparison found. `kind` is a
/// dotted taxonomy tag (e.g. `FilePresence`, `ColumnType`, `Nullability`)
/// mirroring the `modelDifferences`/`ssdtDifferences` partition `spec.md`
/// §8 scenario S6 names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptDifference {
    /// Difference taxonomy tag, e.g. `FilePresence`.
    pub kind: String,
    /// Table the difference was found on, `schema.table`.
    pub table: String,
    /// Human-readable description of the mismatch.
    pub message: String,
}

/// The full diff produced by a `DmmCompare` run, partitioned the way
/// `spec.md` §8 scenario S6 describes: model-side differences (the
/// resolved relational model disagrees with the reference script's
/// declared shape) versus SSDT-side differences (the emitted SQL text
/// itself would differ, e.g. a missing table file).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DmmCompareResult {
    /// `true` iff both difference lists are empty.
    pub is_match: bool,
    /// Differences against the logical/relational model.
    pub model_differences: Vec<ScriptDifference>,
    /// Differences against the emitted SSDT script text.
    pub ssdt_differences: Vec<ScriptDifference>,
}

impl DmmCompareResult {
    fn from_differences(model_differences: Vec<ScriptDifference>, ssdt_differences: Vec<ScriptDifference>) -> Self {
        Self { is_match: model_differences.is_empty() && ssdt_differences.is_empty(), model_differences, ssdt_differences }
    }
}

/// The external collaborator that performs the actual SQL-text comparison
/// against a reference script (`spec.md` §1: out of scope for this core,
/// which only defines the contract it consumes).
pub trait ReferenceScriptComparator {
    /// Compares the resolved relational model (and whatever emitted SQL
    /// text the caller has already written) against `reference_script`.
    ///
    /// # Errors
    ///
    /// Returns a human-readable error message when the reference script
    /// cannot be parsed or compared.
    fn compare(&self, relational: &RelationalModel, reference_script: &str) -> Result<DmmCompareResult, String>;
}

/// Everything a `DmmCompare` run needs beyond the shared bootstrap request.
pub struct DmmCompareRequest<'a> {
    /// The shared bootstrap request.
    pub bootstrap: BootstrapRequest<'a>,
    /// Resolved tightening options for this run.
    pub options: &'a TighteningOptions,
    /// Reference SQL script text to compare the resolved model against.
    pub reference_script: &'a str,
    /// The collaborator performing the actual comparison.
    pub comparator: &'a dyn ReferenceScriptComparator,
}

/// The full result of a `DmmCompare` run.
pub struct DmmCompareResponse {
    /// The bootstrapped, filtered model and its profile snapshot.
    pub context: BootstrapContext,
    /// Every per-coordinate tightening decision reached.
    pub decisions: PolicyDecisionSet,
    /// The resolved relational model, compared against the reference.
    pub relational: RelationalModel,
    /// Entity inclusion/exclusion coverage.
    pub coverage: EmissionCoverage,
    /// The comparator's verdict.
    pub diff: DmmCompareResult,
}

/// Runs the `DmmCompare` pipeline: bootstrap, policy, relational build,
/// then hand off to the injected comparator.
pub fn dmm_compare(request: DmmCompareRequest<'_>, log: &mut ExecutionLog<'_>) -> Outcome<DmmCompareResponse> {
    let context = match bootstrap(request.bootstrap, log) {
        Outcome::Ok(context) => context,
        Outcome::Err(errors) => {
            log.record("pipeline.failed", "DmmCompare pipeline failed during bootstrap.");
            return Outcome::fail_many(errors);
        }
    };

    let decisions = evaluate(&context.model, &context.profile, request.options.policy);
    log.record_with_metadata(
        "policy.decisions.synthesized",
        "Tightening decisions synthesized.",
        MetadataBuilder::new().count("nullability", decisions.nullability.len() as i64).build(),
    );

    let (relational, coverage) = match build_relational(
        &context.model,
        &decisions,
        &request.options.type_mapping,
        &request.options.naming,
        request.options.relational_build,
    ) {
        Ok(built) => built,
        Err(error) => {
            log.record("pipeline.failed", "DmmCompare pipeline failed during relational model build.");
            return Outcome::fail(ErrorRecord::new(error.code(), error.to_string()));
        }
    };
    log.record_with_metadata(
        "smo.model.created",
        "Relational model resolved.",
        MetadataBuilder::new().count("tables", relational.tables.len() as i64).build(),
    );

    let diff = match request.comparator.compare(&relational, request.reference_script) {
        Ok(diff) => diff,
        Err(message) => {
            log.record("pipeline.failed", "DmmCompare pipeline failed during reference-script comparison.");
            return Outcome::fail(ErrorRecord::new("dmmCompare.comparison.failed", message));
        }
    };
    log.record_with_metadata(
        "dmmCompare.completed",
        "Reference-script comparison completed.",
        MetadataBuilder::new()
            .flag("flags.isMatch", diff.is_match)
            .count("modelDifferences", diff.model_differences.len() as i64)
            .count("ssdtDifferences", diff.ssdt_differences.len() as i64)
            .build(),
    );
    log.record("pipeline.completed", "DmmCompare pipeline completed.");

    Outcome::ok(DmmCompareResponse { context, decisions, relational, coverage, diff })
}

/// A [`ReferenceScriptComparator`] that always reports a clean match,
/// useful for callers (and tests) wiring the pipeline without a real
/// comparator available.
pub struct AlwaysMatchComparator;

impl ReferenceScriptComparator for AlwaysMatchComparator {
    fn compare(&self, _relational: &RelationalModel, _reference_script: &str) -> Result<DmmCompareResult, String> {
        Ok(DmmCompareResult::from_differences(Vec::new(), Vec::new()))
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use tighten_config::TighteningOptionsBuilder;
    use tighten_core::clock::FixedClock;
    use tighten_core::filesystem::InMemoryFileSystem;
    use tighten_ingest::ModuleFilterOptions;
    use tighten_ingest::SupplementalOptions;

    use crate::bootstrap::ProfilerSelection;

    use super::*;

    const MODEL_JSON: &str = r#"{
        "exportedAtUtc": "2026-01-01T00:00:00Z",
        "modules": [
            {
                "name": "AppCore",
                "entities": [
                    {
                        "name": "Customer",
                        "physicalName": "Customer",
                        "db_schema": "dbo",
                        "attributes": [
                            {"name": "Id", "physicalName": "Id", "dataType": "Integer", "isMandatory": true, "isIdentifier": true, "isAutoNumber": true}
                        ]
                    }
                ]
            }
        ]
    }"#;

    const PROFILE_JSON: &str =
        r#"{"columns":[],"uniqueCandidates":[],"compositeUniqueCandidates":[],"foreignKeys":[],"coverageAnomalies":[]}"#;

    struct MissingFileComparator;

    impl ReferenceScriptComparator for MissingFileComparator {
        fn compare(&self, _relational: &RelationalModel, _reference_script: &str) -> Result<DmmCompareResult, String> {
            Ok(DmmCompareResult::from_differences(
                Vec::new(),
                vec![ScriptDifference {
                    kind: "FilePresence".to_string(),
                    table: "dbo.Customer".to_string(),
                    message: "table file missing from reference output".to_string(),
                }],
            ))
        }
    }

    fn options() -> tighten_config::TighteningOptions {
        TighteningOptionsBuilder::new().build().unwrap_or_else(|_| panic!("should build"))
    }

    #[test]
    fn matching_reference_script_yields_no_differences() {
        let filesystem = InMemoryFileSystem::new();
        filesystem.write_atomic(&PathBuf::from("/profile.json"), PROFILE_JSON.as_bytes()).unwrap_or_default();
        let clock = FixedClock::new("2026-01-01T00:00:00Z");
        let mut log = ExecutionLog::new(&clock);
        let opts = options();

        let request = DmmCompareRequest {
            bootstrap: BootstrapRequest {
                model_bytes: MODEL_JSON.as_bytes(),
                module_filter: &ModuleFilterOptions::default(),
                supplemental: SupplementalOptions::default(),
                profiler: ProfilerSelection::Fixture { filesystem: &filesystem, path: PathBuf::from("/profile.json") },
            },
            options: &opts,
            reference_script: "CREATE TABLE [dbo].[Customer] ([Id] INT NOT NULL);",
            comparator: &AlwaysMatchComparator,
        };

        let Outcome::Ok(response) = dmm_compare(request, &mut log) else {
            panic!("expected dmm_compare to succeed");
        };
        assert!(response.diff.is_match);
        assert_eq!(log.build().steps().last(), Some(&"pipeline.completed".to_string()));
    }

    #[test]
    fn missing_table_file_surfaces_as_ssdt_difference() {
        let filesystem = InMemoryFileSystem::new();
        filesystem.write_atomic(&PathBuf::from("/profile.json"), PROFILE_JSON.as_bytes()).unwrap_or_default();
        let clock = FixedClock::new("2026-01-01T00:00:00Z");
        let mut log = ExecutionLog::new(&clock);
        let opts = options();

        let request = DmmCompareRequest {
            bootstrap: BootstrapRequest {
                model_bytes: MODEL_JSON.as_bytes(),
                module_filter: &ModuleFilterOptions::default(),
                supplemental: SupplementalOptions::default(),
                profiler: ProfilerSelection::Fixture { filesystem: &filesystem, path: PathBuf::from("/profile.json") },
            },
            options: &opts,
            reference_script: "",
            comparator: &MissingFileComparator,
        };

        let Outcome::Ok(response) = dmm_compare(request, &mut log) else {
            panic!("expected dmm_compare to succeed");
        };
        assert!(!response.diff.is_match);
        assert_eq!(response.diff.ssdt_differences[0].kind, "FilePresence");
    }
}
