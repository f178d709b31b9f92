// tighten-cache/src/store.rs
// ============================================================================
// Module: Evidence cache store (C4)
// ============================================================================

//! ## Overview
//! Realizes the Created/Reused/Refreshed evaluation protocol from `spec.md`
//! §4.4 against a directory tree behind [`FileSystem`]: a persisted
//! manifest carries a version tag and a content key, and every mutation is
//! write-then-rename.

use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use tighten_core::clock::Clock;
use tighten_core::filesystem::FileSystem;
use tighten_core::hashing::Fingerprint;
use tighten_core::hashing::HashAlgorithm;

use crate::error::CacheError;
use crate::key::CacheKeyInputs;
use crate::key::derive_cache_key;
use crate::key::module_selection_hash;

/// Schema version for the persisted manifest.
pub const MANIFEST_VERSION: u32 = 1;

/// One artifact copied into a cache directory alongside the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactCopy {
    /// Path relative to the cache directory.
    pub relative_path: String,
    /// Artifact kind, e.g. `"table"`, `"manifest"`, `"opportunities"`.
    pub kind: String,
    /// Raw contents to persist.
    pub bytes: Vec<u8>,
}

/// A request to evaluate against the cache.
#[derive(Debug, Clone)]
pub struct CacheRequest {
    /// Key-derivation inputs (`spec.md` §4.4).
    pub key_inputs: CacheKeyInputs,
    /// Forces a rebuild regardless of persisted state.
    pub refresh: bool,
    /// Time-to-live in seconds from `createdAtUtc`, if any.
    pub ttl_seconds: Option<i64>,
    /// Artifacts to persist on Create/Refresh.
    pub artifacts: Vec<ArtifactCopy>,
}

/// The persisted module-selection descriptor (`spec.md` §6).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleSelectionDescriptor {
    /// Normalized module names.
    pub modules: Vec<String>,
    /// `modules.len()`, persisted redundantly per the wire schema.
    pub count: usize,
    /// Hash of the normalized module list.
    pub hash: String,
}

/// One entry in a manifest's artifact list (`spec.md` §6).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestArtifact {
    /// Path relative to the cache directory.
    #[serde(rename = "relativePath")]
    pub relative_path: String,
    /// Artifact kind.
    #[serde(rename = "type")]
    pub kind: String,
    /// Hex-encoded SHA-256 of the artifact's bytes.
    pub sha256: String,
    /// Size in bytes.
    #[serde(rename = "sizeBytes")]
    pub size_bytes: u64,
}

/// The persisted evidence-cache manifest (`spec.md` §4.4, §6).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunManifest {
    /// Schema version tag.
    pub version: u32,
    /// Hex-encoded content key (the cache directory name).
    pub key: String,
    /// Pipeline command name.
    pub command: String,
    /// Creation timestamp, preserved across `Reused`, reset on `Refreshed`.
    #[serde(rename = "createdAtUtc")]
    pub created_at_utc: String,
    /// Last time this entry was validated by a request.
    #[serde(rename = "lastValidatedAtUtc")]
    pub last_validated_at_utc: String,
    /// Optional expiry instant.
    #[serde(rename = "expiresAtUtc", skip_serializing_if = "Option::is_none")]
    pub expires_at_utc: Option<String>,
    /// Normalized module selection.
    #[serde(rename = "moduleSelection")]
    pub module_selection: ModuleSelectionDescriptor,
    /// Arbitrary sorted metadata that participated in the key.
    pub metadata: BTreeMap<String, String>,
    /// Artifacts copied into the cache directory.
    pub artifacts: Vec<ManifestArtifact>,
}

/// Why a `Refreshed` decision was made (`spec.md` §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RefreshReason {
    /// The caller explicitly requested a refresh.
    RefreshRequested,
    /// The persisted entry's `expiresAtUtc` has passed.
    TtlExpired,
    /// The normalized module-selection hash changed.
    ModuleSelectionChanged,
    /// A persisted metadata value differs from the request.
    MetadataMismatch,
}

impl RefreshReason {
    /// The `reason.*` metadata key this variant sets to `true`.
    #[must_use]
    pub const fn metadata_key(self) -> &'static str {
        match self {
            Self::RefreshRequested => "reason.refreshRequested",
            Self::TtlExpired => "reason.ttlExpired",
            Self::ModuleSelectionChanged => "reason.moduleSelectionChanged",
            Self::MetadataMismatch => "reason.metadataMismatch",
        }
    }
}

/// The outcome of evaluating a request against the cache (`spec.md` §4.4).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheDecision {
    /// No prior entry existed; one was built.
    Created,
    /// A valid prior entry was found and its validation timestamp bumped.
    Reused,
    /// A prior entry existed but was stale or explicitly invalidated.
    Refreshed(RefreshReason),
}

impl CacheDecision {
    /// Renders the structured `reason.*` metadata entry for this decision,
    /// empty for `Created`/`Reused`.
    #[must_use]
    pub fn reason_metadata(&self) -> BTreeMap<String, String> {
        let mut metadata = BTreeMap::new();
        if let Self::Refreshed(reason) = self {
            metadata.insert(reason.metadata_key().to_string(), "true".to_string());
        }
        metadata
    }
}

/// The result of a cache evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheResult {
    /// The directory the entry lives under.
    pub cache_directory: PathBuf,
    /// The persisted (possibly freshly written) manifest.
    pub manifest: RunManifest,
    /// What happened.
    pub decision: CacheDecision,
}

/// Content-addressed evidence cache (`spec.md` §4.4).
pub struct EvidenceCache<'a> {
    filesystem: &'a dyn FileSystem,
    clock: &'a dyn Clock,
    root: PathBuf,
}

impl<'a> EvidenceCache<'a> {
    /// Builds a cache rooted at `root`.
    #[must_use]
    pub fn new(filesystem: &'a dyn FileSystem, clock: &'a dyn Clock, root: impl Into<PathBuf>) -> Self {
        Self { filesystem, clock, root: root.into() }
    }

    /// Evaluates `request` against the persisted cache state, following the
    /// six-step protocol in `spec.md` §4.4.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the cache directory cannot be read or
    /// written.
    pub fn cache(&self, request: &CacheRequest) -> Result<CacheResult, CacheError> {
        let algorithm = HashAlgorithm::Sha256;
        let key = derive_cache_key(&request.key_inputs, algorithm);
        let directory = self.root.join(&key.value);
        let manifest_path = directory.join("manifest.json");

        let persisted = self.read_manifest(&manifest_path);

        let Some(mut persisted) = persisted else {
            let manifest = self.build_manifest(&key, request);
            self.write_entry(&directory, &manifest, request)?;
            return Ok(CacheResult { cache_directory: directory, manifest, decision: CacheDecision::Created });
        };

        if request.refresh {
            self.filesystem
                .remove_dir_all(&directory)
                .map_err(|err| CacheError::DirectoryOperationFailed(err.to_string()))?;
            let manifest = self.build_manifest(&key, request);
            self.write_entry(&directory, &manifest, request)?;
            return Ok(CacheResult {
                cache_directory: directory,
                manifest,
                decision: CacheDecision::Refreshed(RefreshReason::RefreshRequested),
            });
        }

        if let Some(expires_at) = &persisted.expires_at_utc {
            if expiry_has_passed(expires_at, self.clock) {
                self.filesystem
                    .remove_dir_all(&directory)
                    .map_err(|err| CacheError::DirectoryOperationFailed(err.to_string()))?;
                let manifest = self.build_manifest(&key, request);
                self.write_entry(&directory, &manifest, request)?;
                return Ok(CacheResult {
                    cache_directory: directory,
                    manifest,
                    decision: CacheDecision::Refreshed(RefreshReason::TtlExpired),
                });
            }
        }

        let requested_module_hash = module_selection_hash(&request.key_inputs.module_selection, algorithm).value;
        if persisted.module_selection.hash != requested_module_hash {
            let manifest = self.build_manifest(&key, request);
            self.write_entry(&directory, &manifest, request)?;
            return Ok(CacheResult {
                cache_directory: directory,
                manifest,
                decision: CacheDecision::Refreshed(RefreshReason::ModuleSelectionChanged),
            });
        }

        if persisted.metadata != request.key_inputs.metadata {
            let manifest = self.build_manifest(&key, request);
            self.write_entry(&directory, &manifest, request)?;
            return Ok(CacheResult {
                cache_directory: directory,
                manifest,
                decision: CacheDecision::Refreshed(RefreshReason::MetadataMismatch),
            });
        }

        persisted.last_validated_at_utc = self.clock.now_utc_rfc3339();
        self.write_manifest(&manifest_path, &persisted)?;
        Ok(CacheResult { cache_directory: directory, manifest: persisted, decision: CacheDecision::Reused })
    }

    fn build_manifest(&self, key: &Fingerprint, request: &CacheRequest) -> RunManifest {
        let algorithm = HashAlgorithm::Sha256;
        let now = self.clock.now_utc_rfc3339();
        let modules = request.key_inputs.module_selection.clone();
        let module_hash = module_selection_hash(&modules, algorithm).value;
        let expires_at_utc = self.expiry_timestamp(request.ttl_seconds);
        let artifacts = request
            .artifacts
            .iter()
            .map(|artifact| ManifestArtifact {
                relative_path: artifact.relative_path.clone(),
                kind: artifact.kind.clone(),
                sha256: Fingerprint::new(algorithm, &artifact.bytes).value,
                size_bytes: artifact.bytes.len() as u64,
            })
            .collect();
        RunManifest {
            version: MANIFEST_VERSION,
            key: key.value.clone(),
            command: request.key_inputs.command.clone(),
            created_at_utc: now.clone(),
            last_validated_at_utc: now,
            expires_at_utc,
            module_selection: ModuleSelectionDescriptor { count: modules.len(), modules, hash: module_hash },
            metadata: request.key_inputs.metadata.clone(),
            artifacts,
        }
    }

    fn expiry_timestamp(&self, ttl_seconds: Option<i64>) -> Option<String> {
        let ttl_seconds = ttl_seconds?;
        let expiry_unix = self.clock.now_unix_seconds() + ttl_seconds;
        time::OffsetDateTime::from_unix_timestamp(expiry_unix)
            .ok()
            .and_then(|instant| instant.format(&time::format_description::well_known::Rfc3339).ok())
    }

    fn write_entry(
        &self,
        directory: &Path,
        manifest: &RunManifest,
        request: &CacheRequest,
    ) -> Result<(), CacheError> {
        for artifact in &request.artifacts {
            let path = directory.join(&artifact.relative_path);
            self.filesystem
                .write_atomic(&path, &artifact.bytes)
                .map_err(|err| CacheError::DirectoryOperationFailed(err.to_string()))?;
        }
        self.write_manifest(&directory.join("manifest.json"), manifest)
    }

    fn write_manifest(&self, path: &Path, manifest: &RunManifest) -> Result<(), CacheError> {
        let bytes = serde_json::to_vec_pretty(manifest)
            .map_err(|err| CacheError::DirectoryOperationFailed(err.to_string()))?;
        self.filesystem.write_atomic(path, &bytes).map_err(|err| CacheError::DirectoryOperationFailed(err.to_string()))
    }

    fn read_manifest(&self, path: &Path) -> Option<RunManifest> {
        let bytes = self.filesystem.read(path).ok()?;
        serde_json::from_slice(&bytes).ok()
    }
}

fn expiry_has_passed(expires_at_utc: &str, clock: &dyn Clock) -> bool {
    time::OffsetDateTime::parse(expires_at_utc, &time::format_description::well_known::Rfc3339)
        .map(|expiry| expiry.unix_timestamp() < clock.now_unix_seconds())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use tighten_core::clock::FixedClock;
    use tighten_core::clock::SteppedClock;
    use tighten_core::filesystem::InMemoryFileSystem;

    use super::*;

    fn inputs(command: &str, metadata: BTreeMap<String, String>) -> CacheKeyInputs {
        CacheKeyInputs {
            command: command.to_string(),
            model_hash: Some(Fingerprint::new(HashAlgorithm::Sha256, b"model")),
            profile_hash: Some(Fingerprint::new(HashAlgorithm::Sha256, b"profile")),
            dmm_hash: None,
            config_hash: Some(Fingerprint::new(HashAlgorithm::Sha256, b"config")),
            module_selection: vec!["AppCore".to_string(), "Ops".to_string()],
            metadata,
        }
    }

    #[test]
    fn first_call_creates_entry() {
        let fs = InMemoryFileSystem::new();
        let clock = FixedClock::new("2026-01-01T00:00:00Z");
        let cache = EvidenceCache::new(&fs, &clock, "/cache");
        let request =
            CacheRequest { key_inputs: inputs("BuildSsdt", BTreeMap::new()), refresh: false, ttl_seconds: None, artifacts: vec![] };
        let result = cache.cache(&request).unwrap();
        assert_eq!(result.decision, CacheDecision::Created);
        assert_eq!(result.manifest.created_at_utc, "2026-01-01T00:00:00Z");
    }

    #[test]
    fn identical_second_call_reuses_and_bumps_validated_timestamp() {
        let fs = InMemoryFileSystem::new();
        let clock = SteppedClock::new("2026-01-01T00:00:00Z");
        let cache = EvidenceCache::new(&fs, &clock, "/cache");
        let request =
            CacheRequest { key_inputs: inputs("BuildSsdt", BTreeMap::new()), refresh: false, ttl_seconds: None, artifacts: vec![] };
        let first = cache.cache(&request).unwrap();
        clock.advance_seconds(60);
        let second = cache.cache(&request).unwrap();
        assert_eq!(second.decision, CacheDecision::Reused);
        assert_eq!(second.manifest.created_at_utc, first.manifest.created_at_utc);
        assert_ne!(second.manifest.last_validated_at_utc, first.manifest.last_validated_at_utc);
    }

    #[test]
    fn explicit_refresh_flag_rebuilds_with_reason() {
        let fs = InMemoryFileSystem::new();
        let clock = FixedClock::new("2026-01-01T00:00:00Z");
        let cache = EvidenceCache::new(&fs, &clock, "/cache");
        let request =
            CacheRequest { key_inputs: inputs("BuildSsdt", BTreeMap::new()), refresh: false, ttl_seconds: None, artifacts: vec![] };
        cache.cache(&request).unwrap();
        let refreshed = CacheRequest { refresh: true, ..request };
        let result = cache.cache(&refreshed).unwrap();
        assert_eq!(result.decision, CacheDecision::Refreshed(RefreshReason::RefreshRequested));
    }

    #[test]
    fn ttl_expiry_triggers_refresh() {
        let fs = InMemoryFileSystem::new();
        let clock = SteppedClock::new("2026-01-01T00:00:00Z");
        let cache = EvidenceCache::new(&fs, &clock, "/cache");
        let request = CacheRequest {
            key_inputs: inputs("BuildSsdt", BTreeMap::new()),
            refresh: false,
            ttl_seconds: Some(1800),
            artifacts: vec![],
        };
        cache.cache(&request).unwrap();
        clock.advance_seconds(600);
        let reused = cache.cache(&request).unwrap();
        assert_eq!(reused.decision, CacheDecision::Reused);
        clock.advance_seconds(1500);
        let refreshed = cache.cache(&request).unwrap();
        assert_eq!(refreshed.decision, CacheDecision::Refreshed(RefreshReason::TtlExpired));
    }

    #[test]
    fn changing_metadata_triggers_refresh_with_mismatch_reason() {
        let fs = InMemoryFileSystem::new();
        let clock = FixedClock::new("2026-01-01T00:00:00Z");
        let cache = EvidenceCache::new(&fs, &clock, "/cache");
        let request =
            CacheRequest { key_inputs: inputs("BuildSsdt", BTreeMap::new()), refresh: false, ttl_seconds: None, artifacts: vec![] };
        cache.cache(&request).unwrap();

        let mut metadata = BTreeMap::new();
        metadata.insert("policy.mode".to_string(), "aggressive".to_string());
        let mutated = CacheRequest { key_inputs: inputs("BuildSsdt", metadata), refresh: false, ttl_seconds: None, artifacts: vec![] };
        let result = cache.cache(&mutated).unwrap();
        assert_eq!(result.decision, CacheDecision::Refreshed(RefreshReason::MetadataMismatch));
    }

    #[test]
    fn changing_module_selection_triggers_refresh_with_changed_reason() {
        let fs = InMemoryFileSystem::new();
        let clock = FixedClock::new("2026-01-01T00:00:00Z");
        let cache = EvidenceCache::new(&fs, &clock, "/cache");
        let request =
            CacheRequest { key_inputs: inputs("BuildSsdt", BTreeMap::new()), refresh: false, ttl_seconds: None, artifacts: vec![] };
        cache.cache(&request).unwrap();

        let mut mutated_inputs = inputs("BuildSsdt", BTreeMap::new());
        mutated_inputs.module_selection = vec!["AppCore".to_string()];
        let mutated = CacheRequest { key_inputs: mutated_inputs, refresh: false, ttl_seconds: None, artifacts: vec![] };
        let result = cache.cache(&mutated).unwrap();
        assert_eq!(result.decision, CacheDecision::Refreshed(RefreshReason::ModuleSelectionChanged));
    }

    #[test]
    fn artifacts_are_persisted_and_hashed_in_manifest() {
        let fs = InMemoryFileSystem::new();
        let clock = FixedClock::new("2026-01-01T00:00:00Z");
        let cache = EvidenceCache::new(&fs, &clock, "/cache");
        let request = CacheRequest {
            key_inputs: inputs("BuildSsdt", BTreeMap::new()),
            refresh: false,
            ttl_seconds: None,
            artifacts: vec![ArtifactCopy {
                relative_path: "Modules/AppCore/dbo.Customer.sql".to_string(),
                kind: "table".to_string(),
                bytes: b"CREATE TABLE [dbo].[Customer] ();".to_vec(),
            }],
        };
        let result = cache.cache(&request).unwrap();
        assert_eq!(result.manifest.artifacts.len(), 1);
        assert!(fs.exists(&result.cache_directory.join("Modules/AppCore/dbo.Customer.sql")));
    }
}
