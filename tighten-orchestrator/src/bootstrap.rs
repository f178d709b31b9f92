// tighten-orchestrator/src/bootstrap.rs
// ============================================================================
// Module: Bootstrapper (C7)
// ============================================================================

//! ## Overview
//! [`bootstrap`] composes the ingest-side components into the one
//! preparation stage every named pipeline shares (`spec.md` §4.7): parse
//! the model export, filter it to the requested module selection, merge
//! supplemental entities, then capture a profile snapshot scoped to the
//! resulting model. Every step records its own canonical execution-log
//! entry, in the fixed order `spec.md` §8 law 5 requires.

use std::path::PathBuf;
use std::sync::Arc;

use tighten_core::filesystem::FileSystem;
use tighten_core::identifiers::Coordinate;
use tighten_core::log::ExecutionLog;
use tighten_core::log::MetadataBuilder;
use tighten_core::model::Model;
use tighten_core::outcome::ErrorRecord;
use tighten_core::outcome::Outcome;
use tighten_core::profile::ProfileSnapshot;
use tighten_ingest::ConnectionFactory;
use tighten_ingest::FixtureProfileProvider;
use tighten_ingest::LiveProfileOptions;
use tighten_ingest::LiveProfileProvider;
use tighten_ingest::ModuleFilterOptions;
use tighten_ingest::ProfileProvider;
use tighten_ingest::SupplementalOptions;
use tighten_ingest::filter_model;
use tighten_ingest::merge_supplemental;
use tighten_ingest::parse_model;

/// Which profile-capture capability a bootstrap run resolves to, built from
/// [`tighten_config::ProfilerProviderOptions`] by the caller (`spec.md`
/// §4.6). Carried as a selection rather than a pre-built
/// [`ProfileProvider`] because the live variant's scan targets are derived
/// from the model only after filtering and supplemental merge complete.
pub enum ProfilerSelection<'a> {
    /// Read a JSON snapshot fixture from disk through the file-system
    /// facade.
    Fixture {
        /// File-system facade to read the fixture through.
        filesystem: &'a dyn FileSystem,
        /// Path to the fixture file.
        path: PathBuf,
    },
    /// Run live scan queries through an injected connection factory.
    Live {
        /// Opens one connection per worker.
        factory: Arc<dyn ConnectionFactory>,
        /// Worker-pool tuning.
        options: LiveProfileOptions,
    },
}

/// Everything [`bootstrap`] needs to produce a [`BootstrapContext`].
pub struct BootstrapRequest<'a> {
    /// Raw model export bytes.
    pub model_bytes: &'a [u8],
    /// Module/entity filter.
    pub module_filter: &'a ModuleFilterOptions,
    /// Supplemental-entity loading options.
    pub supplemental: SupplementalOptions,
    /// Profile-capture provider selection.
    pub profiler: ProfilerSelection<'a>,
}

/// The filtered, supplemented model plus its captured profile snapshot —
/// everything downstream pipeline stages need (`spec.md` §4.7).
pub struct BootstrapContext {
    /// The filtered logical model, with supplemental entities merged in.
    pub model: Model,
    /// Physical names of supplemental entities that were merged in rather
    /// than matched against an existing entity.
    pub supplemental_entity_names: Vec<String>,
    /// The captured profile snapshot, scoped to `model`.
    pub profile: ProfileSnapshot,
    /// Free-form human-readable run insights (module/entity counts, the
    /// resolved profiler kind), surfaced for diagnostics, not parsed by
    /// any downstream stage.
    pub insights: Vec<String>,
    /// Non-fatal warnings accumulated across ingestion and profiling.
    pub warnings: Vec<String>,
}

/// Runs the bootstrapper: parse, filter, merge, profile — recording
/// `request.received`, `model.ingested`, `model.filtered`,
/// `supplemental.loaded`, `profiling.capture.start`, and
/// `profiling.capture.completed` on `log` in that order.
///
/// Aggregates every module-filter error rather than stopping at the first
/// (`spec.md` §8 law 4); a model-parse or profile-capture failure is a
/// single fatal error since neither can usefully continue past it.
pub fn bootstrap(request: BootstrapRequest<'_>, log: &mut ExecutionLog<'_>) -> Outcome<BootstrapContext> {
    log.record("request.received", "Pipeline request accepted.");

    let (mut model, parse_warnings) = match parse_model(request.model_bytes) {
        Ok(parsed) => parsed,
        Err(error) => return Outcome::fail(ErrorRecord::new(error.code(), error.to_string())),
    };
    log.record_with_metadata(
        "model.ingested",
        "Model export parsed.",
        MetadataBuilder::new().count("modules", model.modules.len() as i64).build(),
    );

    let filtered = filter_model(std::mem::replace(&mut model, empty_model()), request.module_filter);
    let mut filtered = match filtered {
        Outcome::Ok(filtered) => filtered,
        Outcome::Err(errors) => return Outcome::fail_many(errors),
    };
    log.record_with_metadata(
        "model.filtered",
        "Module/entity filter applied.",
        MetadataBuilder::new().count("modules", filtered.modules.len() as i64).build(),
    );

    let supplemental_entity_names: Vec<String> =
        request.supplemental.extra_entities.iter().map(|entity| entity.physical_name.clone()).collect();
    let supplemental_count = supplemental_entity_names.len();
    merge_supplemental(&mut filtered, request.supplemental);
    log.record_with_metadata(
        "supplemental.loaded",
        "Supplemental entities merged.",
        MetadataBuilder::new().count("entities", supplemental_count as i64).build(),
    );

    log.record("profiling.capture.start", "Profile capture started.");
    let provider: Box<dyn ProfileProvider> = match request.profiler {
        ProfilerSelection::Fixture { filesystem, path } => Box::new(FixtureProfileProvider::new(filesystem, path)),
        ProfilerSelection::Live { factory, options } => {
            let targets = profile_targets(&filtered);
            Box::new(LiveProfileProvider::new(factory, targets, options))
        }
    };
    let (profile, profile_warnings) = match provider.capture() {
        Ok(captured) => captured,
        Err(error) => return Outcome::fail(ErrorRecord::new(error.code(), error.to_string())),
    };
    log.record_with_metadata(
        "profiling.capture.completed",
        "Profile capture completed.",
        MetadataBuilder::new()
            .count("columns", profile.columns.len() as i64)
            .count("coverageAnomalies", profile.coverage_anomalies.len() as i64)
            .build(),
    );

    let mut warnings = parse_warnings;
    warnings.extend(profile_warnings);

    let insights = vec![
        format!("{} module(s) retained after filtering", filtered.modules.len()),
        format!("{supplemental_count} supplemental entity(ies) merged"),
    ];

    Outcome::ok(BootstrapContext { model: filtered, supplemental_entity_names, profile, insights, warnings })
}

/// Every scannable column coordinate in an active, non-external entity —
/// the live profiler's default scan scope when the caller does not narrow
/// it further.
pub(crate) fn profile_targets(model: &Model) -> Vec<Coordinate> {
    let mut targets = Vec::new();
    for module in &model.modules {
        if !module.is_active {
            continue;
        }
        for entity in &module.entities {
            if !entity.is_active || entity.is_external {
                continue;
            }
            for attribute in &entity.attributes {
                if !attribute.is_active {
                    continue;
                }
                targets.push(Coordinate::member(&entity.schema, &entity.physical_name, &attribute.physical_name));
            }
        }
    }
    targets
}

fn empty_model() -> Model {
    Model { exported_at_utc: String::new(), modules: Vec::new() }
}

#[cfg(test)]
mod tests {
    use tighten_core::clock::FixedClock;
    use tighten_core::filesystem::InMemoryFileSystem;
    use tighten_core::log::ExecutionLog;

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
                            {"name": "Id", "physicalName": "Id", "dataType": "Integer", "isMandatory": true, "isIdentifier": true, "isAutoNumber": true},
                            {"name": "Name", "physicalName": "Name", "dataType": "Text", "isMandatory": true, "isIdentifier": false, "isAutoNumber": false}
                        ]
                    }
                ]
            }
        ]
    }"#;

    const PROFILE_JSON: &str =
        r#"{"columns":[],"uniqueCandidates":[],"compositeUniqueCandidates":[],"foreignKeys":[],"coverageAnomalies":[]}"#;

    #[test]
    fn bootstrap_records_canonical_steps_in_order() {
        let filesystem = InMemoryFileSystem::new();
        filesystem.write_atomic(&PathBuf::from("/profile.json"), PROFILE_JSON.as_bytes()).unwrap_or_default();
        let clock = FixedClock::new("2026-01-01T00:00:00Z");
        let mut log = ExecutionLog::new(&clock);

        let request = BootstrapRequest {
            model_bytes: MODEL_JSON.as_bytes(),
            module_filter: &ModuleFilterOptions::default(),
            supplemental: SupplementalOptions::default(),
            profiler: ProfilerSelection::Fixture { filesystem: &filesystem, path: PathBuf::from("/profile.json") },
        };
        let Outcome::Ok(context) = bootstrap(request, &mut log) else {
            panic!("expected bootstrap to succeed");
        };
        assert_eq!(context.model.modules.len(), 1);

        let snapshot = log.build();
        assert_eq!(
            snapshot.steps(),
            vec![
                "request.received",
                "model.ingested",
                "model.filtered",
                "supplemental.loaded",
                "profiling.capture.start",
                "profiling.capture.completed",
            ]
        );
    }

    #[test]
    fn unknown_requested_module_fails_bootstrap() {
        let filesystem = InMemoryFileSystem::new();
        filesystem.write_atomic(&PathBuf::from("/profile.json"), PROFILE_JSON.as_bytes()).unwrap_or_default();
        let clock = FixedClock::new("2026-01-01T00:00:00Z");
        let mut log = ExecutionLog::new(&clock);
        let filter = ModuleFilterOptions { modules: Some(vec!["Missing".to_string()]), ..ModuleFilterOptions::default() };

        let request = BootstrapRequest {
            model_bytes: MODEL_JSON.as_bytes(),
            module_filter: &filter,
            supplemental: SupplementalOptions::default(),
            profiler: ProfilerSelection::Fixture { filesystem: &filesystem, path: PathBuf::from("/profile.json") },
        };
        let Outcome::Err(errors) = bootstrap(request, &mut log) else {
            panic!("expected bootstrap to fail");
        };
        assert_eq!(errors[0].code, "modelFilter.modules.missing");
    }
}
