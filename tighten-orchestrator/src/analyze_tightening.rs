// tighten-orchestrator/src/analyze_tightening.rs
// ============================================================================
// Module: TighteningAnalysis pipeline (C11)
// ============================================================================

//! ## Overview
//! The lighter-weight named pipeline (`spec.md` §6
//! "TighteningAnalysisPipeline"): runs the shared bootstrapper and policy
//! evaluation only, stopping short of the relational model build and
//! artifact emission `BuildSsdt` performs. Used to preview what a run would
//! decide without writing anything to disk.

use tighten_config::TighteningOptions;
use tighten_core::decisions::OpportunitiesReport;
use tighten_core::decisions::PolicyDecisionReport;
use tighten_core::decisions::PolicyDecisionSet;
use tighten_core::log::ExecutionLog;
use tighten_core::log::MetadataBuilder;
use tighten_core::outcome::Outcome;
use tighten_policy::evaluate;
use tighten_policy::opportunities;
use tighten_policy::report;

use crate::bootstrap::BootstrapContext;
use crate::bootstrap::BootstrapRequest;
use crate::bootstrap::bootstrap;

/// Everything an `AnalyzeTightening` run needs beyond the shared bootstrap
/// request.
pub struct AnalyzeTighteningRequest<'a> {
    /// The shared bootstrap request.
    pub bootstrap: BootstrapRequest<'a>,
    /// Resolved tightening options for this run.
    pub options: &'a TighteningOptions,
}

/// The full result of an `AnalyzeTightening` run.
pub struct AnalyzeTighteningResponse {
    /// The bootstrapped, filtered model and its profile snapshot.
    pub context: BootstrapContext,
    /// Every per-coordinate tightening decision reached.
    pub decisions: PolicyDecisionSet,
    /// Per-entity tightened/untightened rollup.
    pub decision_report: PolicyDecisionReport,
    /// Opportunities a subsequent `BuildSsdt` run would emit.
    pub opportunities_report: OpportunitiesReport,
}

/// Runs the `AnalyzeTightening` pipeline: bootstrap, then policy evaluation
/// only.
pub fn analyze_tightening(
    request: AnalyzeTighteningRequest<'_>,
    log: &mut ExecutionLog<'_>,
) -> Outcome<AnalyzeTighteningResponse> {
    let context = match bootstrap(request.bootstrap, log) {
        Outcome::Ok(context) => context,
        Outcome::Err(errors) => {
            log.record("pipeline.failed", "TighteningAnalysis pipeline failed during bootstrap.");
            return Outcome::fail_many(errors);
        }
    };

    let decisions = evaluate(&context.model, &context.profile, request.options.policy);
    log.record_with_metadata(
        "policy.decisions.synthesized",
        "Tightening decisions synthesized.",
        MetadataBuilder::new()
            .count("nullability", decisions.nullability.len() as i64)
            .count("diagnostics", decisions.diagnostics.len() as i64)
            .build(),
    );

    let decision_report = report(&context.model, &decisions);
    let opportunities_report = opportunities(&decisions);

    log.record("pipeline.completed", "TighteningAnalysis pipeline completed.");

    Outcome::ok(AnalyzeTighteningResponse { context, decisions, decision_report, opportunities_report })
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

    #[test]
    fn analyze_tightening_stops_before_emission() {
        let filesystem = InMemoryFileSystem::new();
        filesystem.write_atomic(&PathBuf::from("/profile.json"), PROFILE_JSON.as_bytes()).unwrap_or_default();
        let clock = FixedClock::new("2026-01-01T00:00:00Z");
        let mut log = ExecutionLog::new(&clock);
        let options = TighteningOptionsBuilder::new().build().unwrap_or_else(|_| panic!("options should build"));

        let request = AnalyzeTighteningRequest {
            bootstrap: BootstrapRequest {
                model_bytes: MODEL_JSON.as_bytes(),
                module_filter: &ModuleFilterOptions::default(),
                supplemental: SupplementalOptions::default(),
                profiler: ProfilerSelection::Fixture { filesystem: &filesystem, path: PathBuf::from("/profile.json") },
            },
            options: &options,
        };

        let Outcome::Ok(response) = analyze_tightening(request, &mut log) else {
            panic!("expected analyze_tightening to succeed");
        };
        assert_eq!(response.context.model.modules.len(), 1);

        let steps = log.build().steps();
        assert_eq!(
            steps,
            vec![
                "request.received",
                "model.ingested",
                "model.filtered",
                "supplemental.loaded",
                "profiling.capture.start",
                "profiling.capture.completed",
                "policy.decisions.synthesized",
                "pipeline.completed",
            ]
        );
    }
}
