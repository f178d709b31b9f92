// tighten-orchestrator/src/pipeline.rs
// ============================================================================
// Module: Pipeline support (C11)
// ============================================================================

//! ## Overview
//! Helpers every named pipeline in this crate shares: deriving the
//! config-content fingerprint that feeds the evidence-cache key
//! (`spec.md` §4.4), and evaluating the evidence cache itself while
//! recording the `evidence.cache.persisted` step — emitted even when
//! caching is disabled for the run, so the canonical step sequence
//! (`spec.md` §8 scenario S1) never depends on whether a cache directory
//! was configured.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;
use tighten_cache::ArtifactCopy;
use tighten_cache::CacheDecision;
use tighten_cache::CacheError;
use tighten_cache::CacheKeyInputs;
use tighten_cache::CacheRequest;
use tighten_cache::CacheResult;
use tighten_cache::EvidenceCache;
use tighten_cache::RefreshReason;
use tighten_config::EvidenceCacheOptions;
use tighten_config::ProfilerProviderOptions;
use tighten_config::TighteningOptions;
use tighten_core::clock::Clock;
use tighten_core::filesystem::FileSystem;
use tighten_core::filesystem::FileSystemError;
use tighten_core::hashing::Fingerprint;
use tighten_core::hashing::HashAlgorithm;
use tighten_core::hashing::hash_canonical_json;
use tighten_core::log::ExecutionLog;
use tighten_core::log::MetadataBuilder;
use tighten_policy::PolicyToggles;

/// A minimal, fully serializable projection of [`TighteningOptions`] used
/// only to derive its content fingerprint (`spec.md` §4.4 "content hash of
/// config inputs"). [`TighteningOptions`] itself is not `Serialize` — it
/// carries a `std::time::Duration`, which is not.
#[derive(Serialize)]
struct ConfigFingerprintView {
    policy: PolicyToggles,
    modules: Option<Vec<String>>,
    include_system: bool,
    include_inactive: bool,
    entity_allowlist: BTreeMap<String, Vec<String>>,
    include_platform_auto_indexes: bool,
    entity_renames: BTreeMap<String, String>,
    module_prefixes: BTreeMap<String, String>,
    output_dir: String,
    module_parallelism: usize,
    profiler: String,
}

/// Derives the content fingerprint of the resolved options record that
/// participates in a run's evidence-cache key.
#[must_use]
pub fn config_fingerprint(options: &TighteningOptions, algorithm: HashAlgorithm) -> Fingerprint {
    let profiler = match &options.profiler {
        ProfilerProviderOptions::Fixture { path } => format!("fixture:{}", path.display()),
        ProfilerProviderOptions::Live { parallelism, row_cap, per_table_timeout, connection_string } => {
            format!("live:{parallelism}:{row_cap}:{}:{connection_string}", per_table_timeout.as_secs())
        }
    };
    let view = ConfigFingerprintView {
        policy: options.policy,
        modules: options.module_filter.modules.clone(),
        include_system: options.module_filter.include_system,
        include_inactive: options.module_filter.include_inactive,
        entity_allowlist: options.module_filter.entity_allowlist.clone(),
        include_platform_auto_indexes: options.relational_build.include_platform_auto_indexes,
        entity_renames: options.naming.entity_renames.clone(),
        module_prefixes: options.naming.module_prefixes.clone(),
        output_dir: options.emission.output_dir.display().to_string(),
        module_parallelism: options.emission.module_parallelism,
        profiler,
    };
    hash_canonical_json(algorithm, &view).unwrap_or_else(|_| Fingerprint::absent_sentinel(algorithm))
}

/// Everything needed to evaluate the evidence cache for one pipeline run.
pub struct CacheInputs<'a> {
    /// Evidence-cache options; `None` disables caching for this run.
    pub options: Option<&'a EvidenceCacheOptions>,
    /// File-system facade the cache writes through.
    pub filesystem: &'a dyn FileSystem,
    /// Clock driving `createdAtUtc`/`lastValidatedAtUtc`.
    pub clock: &'a dyn Clock,
    /// Pipeline command name (`BuildSsdt`, `DmmCompare`, …).
    pub command: &'static str,
    /// Content hash of the filtered model.
    pub model_hash: Option<Fingerprint>,
    /// Content hash of the profile snapshot.
    pub profile_hash: Option<Fingerprint>,
    /// Content hash of a DMM-compare reference script, when applicable.
    pub dmm_hash: Option<Fingerprint>,
    /// Content hash of the resolved options record.
    pub config_hash: Option<Fingerprint>,
    /// Normalized module selection.
    pub module_selection: Vec<String>,
    /// Artifacts to persist on Create/Refresh.
    pub artifacts: Vec<ArtifactCopy>,
}

/// Evaluates the evidence cache (or records that it is disabled) and
/// records the `evidence.cache.persisted` step.
///
/// # Errors
///
/// Returns [`CacheError`] when a cache directory operation fails.
pub fn persist_evidence_cache(
    inputs: CacheInputs<'_>,
    log: &mut ExecutionLog<'_>,
) -> Result<Option<CacheResult>, CacheError> {
    let Some(options) = inputs.options else {
        log.record_with_metadata(
            "evidence.cache.persisted",
            "Evidence cache disabled for this run.",
            MetadataBuilder::new().flag("flags.enabled", false).build(),
        );
        return Ok(None);
    };

    let key_inputs = CacheKeyInputs {
        command: inputs.command.to_string(),
        model_hash: inputs.model_hash,
        profile_hash: inputs.profile_hash,
        dmm_hash: inputs.dmm_hash,
        config_hash: inputs.config_hash,
        module_selection: inputs.module_selection,
        metadata: options.metadata.clone(),
    };
    let request = CacheRequest {
        key_inputs,
        refresh: options.refresh,
        ttl_seconds: options.ttl_seconds,
        artifacts: inputs.artifacts,
    };
    let cache = EvidenceCache::new(inputs.filesystem, inputs.clock, options.root.clone());
    let result = cache.cache(&request)?;

    let mut metadata = MetadataBuilder::new().flag("flags.enabled", true).text("decision", decision_label(&result.decision));
    if let CacheDecision::Refreshed(reason) = &result.decision {
        metadata = metadata.text("reason", refresh_reason_label(*reason));
    }
    log.record_with_metadata("evidence.cache.persisted", "Evidence cache evaluated.", metadata.build());

    Ok(Some(result))
}

fn decision_label(decision: &CacheDecision) -> &'static str {
    match decision {
        CacheDecision::Created => "created",
        CacheDecision::Reused => "reused",
        CacheDecision::Refreshed(_) => "refreshed",
    }
}

fn refresh_reason_label(reason: RefreshReason) -> &'static str {
    match reason {
        RefreshReason::RefreshRequested => "refreshRequested",
        RefreshReason::TtlExpired => "ttlExpired",
        RefreshReason::ModuleSelectionChanged => "moduleSelectionChanged",
        RefreshReason::MetadataMismatch => "metadataMismatch",
    }
}

/// Reads every artifact a prior [`tighten_artifacts::emit`] call wrote back
/// off the file-system facade, for handoff into [`CacheInputs::artifacts`].
///
/// # Errors
///
/// Returns [`FileSystemError`] if an artifact cannot be read back.
pub fn collect_artifact_copies(
    filesystem: &dyn FileSystem,
    output_dir: &Path,
    artifacts: &[tighten_artifacts::EmittedArtifact],
) -> Result<Vec<ArtifactCopy>, FileSystemError> {
    let mut copies = Vec::with_capacity(artifacts.len());
    for artifact in artifacts {
        let bytes = filesystem.read(&output_dir.join(&artifact.relative_path))?;
        copies.push(ArtifactCopy { relative_path: artifact.relative_path.clone(), kind: artifact.kind.clone(), bytes });
    }
    Ok(copies)
}
