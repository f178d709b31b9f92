// tighten-orchestrator/src/build_ssdt.rs
// ============================================================================
// Module: BuildSsdt pipeline (C11)
// ============================================================================

//! ## Overview
//! The primary named pipeline (`spec.md` §6 "BuildSsdt"): runs the shared
//! bootstrapper, evaluates tightening policy, folds the result into a
//! relational model, emits every SSDT artifact, and persists the evidence
//! cache. Records the full canonical step sequence from `spec.md` §8
//! scenario S1, in order.

use tighten_artifacts::EmissionInputs;
use tighten_artifacts::EmissionResult;
use tighten_artifacts::NoSeedGenerator;
use tighten_artifacts::SeedGenerator;
use tighten_artifacts::emit;
use tighten_cache::CacheResult;
use tighten_config::TighteningOptions;
use tighten_core::clock::Clock;
use tighten_core::decisions::OpportunitiesReport;
use tighten_core::decisions::PolicyDecisionReport;
use tighten_core::decisions::PolicyDecisionSet;
use tighten_core::filesystem::FileSystem;
use tighten_core::hashing::HashAlgorithm;
use tighten_core::hashing::hash_canonical_json;
use tighten_core::log::ExecutionLog;
use tighten_core::log::MetadataBuilder;
use tighten_core::outcome::ErrorRecord;
use tighten_core::outcome::Outcome;
use tighten_core::relational::EmissionCoverage;
use tighten_core::relational::RelationalModel;
use tighten_ingest::normalize_module_selection;
use tighten_policy::evaluate;
use tighten_policy::opportunities;
use tighten_policy::report;
use tighten_relational::build as build_relational;

use crate::bootstrap::BootstrapContext;
use crate::bootstrap::BootstrapRequest;
use crate::bootstrap::bootstrap;
use crate::pipeline::CacheInputs;
use crate::pipeline::collect_artifact_copies;
use crate::pipeline::config_fingerprint;
use crate::pipeline::persist_evidence_cache;

/// Everything a `BuildSsdt` run needs beyond the shared bootstrap request.
pub struct BuildSsdtRequest<'a> {
    /// The shared bootstrap request (model bytes, filter, supplemental,
    /// profiler selection).
    pub bootstrap: BootstrapRequest<'a>,
    /// Resolved tightening options for this run.
    pub options: &'a TighteningOptions,
    /// File-system facade artifacts and the evidence cache are written
    /// through.
    pub filesystem: &'a dyn FileSystem,
    /// Clock driving the execution log and evidence-cache timestamps.
    pub clock: &'a dyn Clock,
    /// Static-entity seed generator; pass [`NoSeedGenerator`] when seed
    /// generation is out of scope for the caller.
    pub seed_generator: &'a dyn SeedGenerator,
}

/// The full result of a `BuildSsdt` run.
pub struct BuildSsdtResponse {
    /// The bootstrapped, filtered model and its profile snapshot.
    pub context: BootstrapContext,
    /// Every per-coordinate tightening decision reached.
    pub decisions: PolicyDecisionSet,
    /// The resolved relational model.
    pub relational: RelationalModel,
    /// Entity inclusion/exclusion coverage.
    pub coverage: EmissionCoverage,
    /// What the artifact emitter wrote.
    pub emission: EmissionResult,
    /// The evidence-cache outcome, or `None` when caching is disabled.
    pub cache: Option<CacheResult>,
}

/// Runs the `BuildSsdt` pipeline end to end.
pub fn build_ssdt(request: BuildSsdtRequest<'_>, log: &mut ExecutionLog<'_>) -> Outcome<BuildSsdtResponse> {
    let context = match bootstrap(request.bootstrap, log) {
        Outcome::Ok(context) => context,
        Outcome::Err(errors) => {
            log.record("pipeline.failed", "BuildSsdt pipeline failed during bootstrap.");
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

    let (relational, coverage) = match build_relational(
        &context.model,
        &decisions,
        &request.options.type_mapping,
        &request.options.naming,
        request.options.relational_build,
    ) {
        Ok(built) => built,
        Err(error) => {
            log.record("pipeline.failed", "BuildSsdt pipeline failed during relational model build.");
            return Outcome::fail(ErrorRecord::new(error.code(), error.to_string()));
        }
    };
    log.record_with_metadata(
        "smo.model.created",
        "Relational model resolved.",
        MetadataBuilder::new()
            .count("tables", relational.tables.len() as i64)
            .count("skippedEntities", coverage.skipped_entities.len() as i64)
            .build(),
    );

    let fingerprint = match hash_canonical_json(HashAlgorithm::Sha256, &relational) {
        Ok(fingerprint) => fingerprint,
        Err(error) => {
            log.record("pipeline.failed", "BuildSsdt pipeline failed to fingerprint the relational model.");
            return Outcome::fail(ErrorRecord::new("emission.fingerprint.canonicalization", error.to_string()));
        }
    };

    let decision_report: PolicyDecisionReport = report(&context.model, &decisions);
    let opportunities_report: OpportunitiesReport = opportunities(&decisions);

    let emission_inputs = EmissionInputs {
        relational: &relational,
        decision_report: &decision_report,
        opportunities: &opportunities_report,
        coverage: coverage.clone(),
        fingerprint: fingerprint.clone(),
        unsupported: Vec::new(),
    };
    let emission = match emit(request.filesystem, &request.options.emission.output_dir, &emission_inputs, request.seed_generator)
    {
        Ok(emission) => emission,
        Err(error) => {
            log.record("pipeline.failed", "BuildSsdt pipeline failed during artifact emission.");
            return Outcome::fail(ErrorRecord::new(error.code(), error.to_string()));
        }
    };
    log.record_with_metadata(
        "ssdt.emission.completed",
        "SSDT artifacts emitted.",
        MetadataBuilder::new().count("tables", emission.table_paths.len() as i64).build(),
    );
    log.record("policy.log.persisted", "Policy decision log persisted.");

    if emission.seed_paths.is_empty() {
        log.record_with_metadata(
            "staticData.seed.generated",
            "No static-entity seed files generated.",
            MetadataBuilder::new().null("paths.seedOutput").build(),
        );
    } else {
        log.record_with_metadata(
            "staticData.seed.generated",
            "Static-entity seed files generated.",
            MetadataBuilder::new().count("seeds", emission.seed_paths.len() as i64).build(),
        );
    }

    let artifact_copies = match collect_artifact_copies(
        request.filesystem,
        &request.options.emission.output_dir,
        &emission.manifest.artifacts,
    ) {
        Ok(copies) => copies,
        Err(error) => {
            log.record("pipeline.failed", "BuildSsdt pipeline failed reading back emitted artifacts.");
            return Outcome::fail(ErrorRecord::new("emission.io", error.to_string()));
        }
    };

    let module_selection = normalize_module_selection(
        &request.options.module_filter.modules.clone().unwrap_or_else(|| {
            context.model.modules.iter().map(|module| module.name.clone()).collect()
        }),
    );
    let model_hash = match hash_canonical_json(HashAlgorithm::Sha256, &context.model) {
        Ok(hash) => Some(hash),
        Err(_) => None,
    };
    let profile_hash = match hash_canonical_json(HashAlgorithm::Sha256, &context.profile) {
        Ok(hash) => Some(hash),
        Err(_) => None,
    };

    let cache_inputs = CacheInputs {
        options: request.options.evidence_cache.as_ref(),
        filesystem: request.filesystem,
        clock: request.clock,
        command: "BuildSsdt",
        model_hash,
        profile_hash,
        dmm_hash: None,
        config_hash: Some(config_fingerprint(request.options, HashAlgorithm::Sha256)),
        module_selection,
        artifacts: artifact_copies,
    };
    let cache = match persist_evidence_cache(cache_inputs, log) {
        Ok(cache) => cache,
        Err(error) => {
            log.record("pipeline.failed", "BuildSsdt pipeline failed persisting the evidence cache.");
            return Outcome::fail(ErrorRecord::new(error.code(), error.to_string()));
        }
    };

    log.record("pipeline.completed", "BuildSsdt pipeline completed.");

    Outcome::ok(BuildSsdtResponse { context, decisions, relational, coverage, emission, cache })
}

/// A [`SeedGenerator`] placeholder for callers who have no static-entity
/// seed data source configured.
#[must_use]
pub fn no_seed_generator() -> &'static NoSeedGenerator {
    &NoSeedGenerator
}
