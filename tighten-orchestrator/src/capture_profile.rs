// tighten-orchestrator/src/capture_profile.rs
// ============================================================================
// Module: CaptureProfile pipeline (C11)
// ============================================================================

//! ## Overview
//! The narrowest named pipeline (`spec.md` §6
//! "CaptureProfilePipelineRequest"): parses and filters the model, then
//! captures a profile snapshot, stopping before any tightening decision is
//! made. Used to refresh evidence independently of a tightening run.

use tighten_core::log::ExecutionLog;
use tighten_core::log::MetadataBuilder;
use tighten_core::model::Model;
use tighten_core::outcome::ErrorRecord;
use tighten_core::outcome::Outcome;
use tighten_core::profile::ProfileSnapshot;
use tighten_ingest::FixtureProfileProvider;
use tighten_ingest::LiveProfileProvider;
use tighten_ingest::ModuleFilterOptions;
use tighten_ingest::ProfileProvider;
use tighten_ingest::filter_model;
use tighten_ingest::parse_model;

use crate::bootstrap::ProfilerSelection;
use crate::bootstrap::profile_targets;

/// Everything a `CaptureProfile` run needs.
pub struct CaptureProfileRequest<'a> {
    /// Raw model export bytes, used only to scope the profile capture.
    pub model_bytes: &'a [u8],
    /// Module/entity filter narrowing the scan scope.
    pub module_filter: &'a ModuleFilterOptions,
    /// Profile-capture provider selection.
    pub profiler: ProfilerSelection<'a>,
}

/// The full result of a `CaptureProfile` run.
pub struct CaptureProfileResponse {
    /// The filtered model the profile was scoped to.
    pub model: Model,
    /// The captured profile snapshot.
    pub profile: ProfileSnapshot,
    /// Non-fatal warnings accumulated while capturing.
    pub warnings: Vec<String>,
}

/// Runs the `CaptureProfile` pipeline: parse, filter, profile — no
/// supplemental merge and no policy evaluation.
pub fn capture_profile(request: CaptureProfileRequest<'_>, log: &mut ExecutionLog<'_>) -> Outcome<CaptureProfileResponse> {
    log.record("request.received", "Pipeline request accepted.");

    let (model, parse_warnings) = match parse_model(request.model_bytes) {
        Ok(parsed) => parsed,
        Err(error) => return Outcome::fail(ErrorRecord::new(error.code(), error.to_string())),
    };
    log.record_with_metadata(
        "model.ingested",
        "Model export parsed.",
        MetadataBuilder::new().count("modules", model.modules.len() as i64).build(),
    );

    let filtered = match filter_model(model, request.module_filter) {
        Outcome::Ok(filtered) => filtered,
        Outcome::Err(errors) => {
            log.record("pipeline.failed", "CaptureProfile pipeline failed during model filtering.");
            return Outcome::fail_many(errors);
        }
    };
    log.record_with_metadata(
        "model.filtered",
        "Module/entity filter applied.",
        MetadataBuilder::new().count("modules", filtered.modules.len() as i64).build(),
    );

    log.record("profiling.capture.start", "Profile capture started.");
    let provider: Box<dyn ProfileProvider> = match request.profiler {
        ProfilerSelection::Fixture { filesystem, path } => Box::new(FixtureProfileProvider::new(filesystem, path)),
        ProfilerSelection::Live { factory, options } => {
            let targets = profile_targets(&filtered);
            Box::new(LiveProfileProvider::new(factory, targets, options))
        }
    };
    let (profile, warnings) = match provider.capture() {
        Ok(captured) => captured,
        Err(error) => {
            log.record("pipeline.failed", "CaptureProfile pipeline failed during profile capture.");
            return Outcome::fail(ErrorRecord::new(error.code(), error.to_string()));
        }
    };
    log.record_with_metadata(
        "profiling.capture.completed",
        "Profile capture completed.",
        MetadataBuilder::new()
            .count("columns", profile.columns.len() as i64)
            .count("coverageAnomalies", profile.coverage_anomalies.len() as i64)
            .build(),
    );

    log.record("pipeline.completed", "CaptureProfile pipeline completed.");

    let mut combined_warnings = parse_warnings;
    combined_warnings.extend(warnings);

    Outcome::ok(CaptureProfileResponse { model: filtered, profile, warnings: combined_warnings })
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use tighten_core::clock::FixedClock;
    use tighten_core::filesystem::InMemoryFileSystem;

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
    fn capture_profile_stops_before_policy_evaluation() {
        let filesystem = InMemoryFileSystem::new();
        filesystem.write_atomic(&PathBuf::from("/profile.json"), PROFILE_JSON.as_bytes()).unwrap_or_default();
        let clock = FixedClock::new("2026-01-01T00:00:00Z");
        let mut log = ExecutionLog::new(&clock);

        let request = CaptureProfileRequest {
            model_bytes: MODEL_JSON.as_bytes(),
            module_filter: &ModuleFilterOptions::default(),
            profiler: ProfilerSelection::Fixture { filesystem: &filesystem, path: PathBuf::from("/profile.json") },
        };

        let Outcome::Ok(response) = capture_profile(request, &mut log) else {
            panic!("expected capture_profile to succeed");
        };
        assert_eq!(response.model.modules.len(), 1);

        let steps = log.build().steps();
        assert_eq!(
            steps,
            vec![
                "request.received",
                "model.ingested",
                "model.filtered",
                "profiling.capture.start",
                "profiling.capture.completed",
                "pipeline.completed",
            ]
        );
    }
}
