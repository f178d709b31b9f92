// tighten-config/src/file.rs
// ============================================================================
// Module: TOML Configuration Loading
// ============================================================================

//! ## Overview
//! Loads a [`TighteningOptionsBuilder`] from a TOML document (`spec.md` §6
//! "Config JSON (flat map of options)" — this pipeline persists the same
//! options as TOML rather than JSON). Parsing is strict and fail-closed: an
//! oversized file, invalid UTF-8, or malformed TOML all fail with
//! [`ConfigError::Malformed`] rather than falling back to defaults.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use serde::Serialize;
use tighten_core::filesystem::FileSystem;
use tighten_ingest::EntityValidationOverride;
use tighten_ingest::ModuleFilterOptions;
use tighten_policy::PolicyToggles;
use tighten_relational::NamingOverrides;
use tighten_relational::RelationalBuildOptions;

use crate::builder::TighteningOptionsBuilder;
use crate::error::ConfigError;

/// Maximum configuration file size in bytes.
const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;

/// TOML shape of [`EntityValidationOverride`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawEntityValidationOverride {
    /// Tolerate an entity declaring no identifier attribute.
    #[serde(default)]
    allow_missing_primary_key: bool,
    /// Tolerate an entity with an empty schema name.
    #[serde(default)]
    allow_missing_schema: bool,
}

/// TOML shape of the `[module_filter]` table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawModuleFilter {
    /// Explicit module allowlist.
    #[serde(default)]
    modules: Option<Vec<String>>,
    /// Include modules flagged as platform system modules.
    #[serde(default)]
    include_system: bool,
    /// Include modules and entities flagged inactive.
    #[serde(default)]
    include_inactive: bool,
    /// Per-module entity allowlists.
    #[serde(default)]
    entity_allowlist: BTreeMap<String, Vec<String>>,
    /// Per-module validation overrides.
    #[serde(default)]
    validation_overrides: BTreeMap<String, RawEntityValidationOverride>,
}

/// TOML shape of the `[relational_build]` table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawRelationalBuild {
    /// Whether platform-auto-generated indexes are carried into the
    /// relational model.
    #[serde(default)]
    include_platform_auto_indexes: bool,
}

/// Which profile-capture provider the `[profiling]` table selects.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum RawProvider {
    /// Read a JSON snapshot fixture from disk.
    #[default]
    Fixture,
    /// Run live scan queries against a connection factory.
    Live,
}

/// TOML shape of the `[profiling]` table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawProfiling {
    /// Which provider variant this run uses.
    #[serde(default)]
    provider: RawProvider,
    /// Fixture-provider snapshot path.
    #[serde(default)]
    fixture_path: Option<String>,
    /// Live-provider worker-pool degree of parallelism.
    #[serde(default)]
    parallelism: Option<usize>,
    /// Live-provider maximum rows sampled per table.
    #[serde(default)]
    row_cap: Option<u64>,
    /// Live-provider per-table probe timeout, in seconds.
    #[serde(default)]
    timeout_seconds: Option<u64>,
    /// Live-provider connection string.
    #[serde(default)]
    connection_string: Option<String>,
}

/// TOML shape of the `[emission]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawEmission {
    /// Directory artifacts are written to.
    #[serde(default = "default_output_dir")]
    output_dir: String,
    /// Per-table SQL write parallelism.
    #[serde(default)]
    module_parallelism: Option<usize>,
}

impl Default for RawEmission {
    fn default() -> Self {
        Self { output_dir: default_output_dir(), module_parallelism: None }
    }
}

/// The default artifact output directory when `[emission]` is absent.
fn default_output_dir() -> String {
    ".".to_string()
}

/// TOML shape of the `[evidence_cache]` table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawEvidenceCache {
    /// Root directory the cache lives under.
    root: String,
    /// Time-to-live in seconds from `createdAtUtc`.
    #[serde(default)]
    ttl_seconds: Option<i64>,
    /// Forces a rebuild regardless of persisted state.
    #[serde(default)]
    refresh: bool,
    /// Arbitrary metadata contributing to the cache key.
    #[serde(default)]
    metadata: BTreeMap<String, String>,
}

/// The full TOML document shape (`spec.md` §6, §9 "Configuration").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawConfig {
    /// Tightening policy toggles, deserialized directly into the domain type.
    #[serde(default)]
    policy: PolicyToggles,
    /// Module/entity filter table.
    #[serde(default)]
    module_filter: RawModuleFilter,
    /// Relational model factory build options table.
    #[serde(default)]
    relational_build: RawRelationalBuild,
    /// Table naming overrides, deserialized directly into the domain type.
    #[serde(default)]
    naming: NamingOverrides,
    /// Profile-capture provider table.
    #[serde(default)]
    profiling: RawProfiling,
    /// Artifact-emission table.
    #[serde(default)]
    emission: RawEmission,
    /// Evidence-cache table, absent disables caching.
    #[serde(default)]
    evidence_cache: Option<RawEvidenceCache>,
}

/// Parses a TOML document into a builder, ready for further `with_*` calls
/// (e.g. CLI flag overrides) before [`TighteningOptionsBuilder::build`].
///
/// # Errors
///
/// Returns [`ConfigError::Malformed`] when `bytes` is not valid UTF-8 TOML
/// shaped like the expected document.
pub fn parse_toml(bytes: &[u8]) -> Result<TighteningOptionsBuilder, ConfigError> {
    let text = std::str::from_utf8(bytes).map_err(|err| ConfigError::Malformed(err.to_string()))?;
    let raw: RawConfig = toml::from_str(text).map_err(|err| ConfigError::Malformed(err.to_string()))?;

    let module_filter = ModuleFilterOptions {
        modules: raw.module_filter.modules,
        include_system: raw.module_filter.include_system,
        include_inactive: raw.module_filter.include_inactive,
        entity_allowlist: raw.module_filter.entity_allowlist,
        validation_overrides: raw
            .module_filter
            .validation_overrides
            .into_iter()
            .map(|(name, raw_override)| {
                (
                    name,
                    EntityValidationOverride {
                        allow_missing_primary_key: raw_override.allow_missing_primary_key,
                        allow_missing_schema: raw_override.allow_missing_schema,
                    },
                )
            })
            .collect(),
    };

    let relational_build =
        RelationalBuildOptions { include_platform_auto_indexes: raw.relational_build.include_platform_auto_indexes };

    let mut builder = TighteningOptionsBuilder::new()
        .with_policy(raw.policy)
        .with_module_filter(module_filter)
        .with_relational_build(relational_build)
        .with_naming_overrides(raw.naming)
        .with_output_dir(raw.emission.output_dir);

    if let Some(module_parallelism) = raw.emission.module_parallelism {
        builder = builder.with_emission_parallelism(module_parallelism);
    }

    builder = match raw.profiling.provider {
        RawProvider::Fixture => {
            builder.with_fixture_profiler(raw.profiling.fixture_path.unwrap_or_else(|| "profile.json".to_string()))
        }
        RawProvider::Live => builder.with_live_profiler(
            raw.profiling.parallelism.unwrap_or(4),
            raw.profiling.row_cap.unwrap_or(0),
            raw.profiling.timeout_seconds.unwrap_or(30),
            raw.profiling.connection_string.unwrap_or_default(),
        ),
    };

    if let Some(cache) = raw.evidence_cache {
        builder = builder.with_evidence_cache(cache.root, cache.ttl_seconds, cache.refresh);
        for (key, value) in cache.metadata {
            builder = builder.with_cache_metadata(key, value);
        }
    }

    Ok(builder)
}

/// Loads and parses the TOML configuration at `path` through the
/// file-system facade, enforcing the size cap before parsing.
///
/// # Errors
///
/// Returns [`ConfigError::Malformed`] when the file is missing, oversized,
/// or fails to parse.
pub fn load(filesystem: &dyn FileSystem, path: &Path) -> Result<TighteningOptionsBuilder, ConfigError> {
    let bytes = filesystem.read(path).map_err(|err| ConfigError::Malformed(err.to_string()))?;
    if bytes.len() > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::Malformed(format!(
            "configuration file at {} exceeds the {MAX_CONFIG_FILE_SIZE}-byte limit",
            path.display()
        )));
    }
    parse_toml(&bytes)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use tighten_core::filesystem::InMemoryFileSystem;
    use tighten_policy::OnMissingEvidence;

    use super::*;

    #[test]
    fn empty_document_parses_to_defaults() {
        let builder = parse_toml(b"").unwrap_or_else(|_| panic!("empty document should parse"));
        let options = builder.build().unwrap_or_else(|_| panic!("defaults should build"));
        assert_eq!(options.policy.on_missing_evidence, OnMissingEvidence::Conservative);
    }

    #[test]
    fn policy_table_overrides_defaults() {
        let document = b"[policy]\non_missing_evidence = \"aggressive\"\nremediation_mode = \"tolerate\"\n";
        let builder = parse_toml(document).unwrap_or_else(|_| panic!("should parse"));
        let options = builder.build().unwrap_or_else(|_| panic!("should build"));
        assert_eq!(options.policy.on_missing_evidence, OnMissingEvidence::Aggressive);
    }

    #[test]
    fn live_profiler_table_is_honored() {
        let document = b"[profiling]\nprovider = \"live\"\nparallelism = 8\nconnection_string = \"Server=db\"\n";
        let builder = parse_toml(document).unwrap_or_else(|_| panic!("should parse"));
        builder.build().unwrap_or_else(|_| panic!("should build"));
    }

    #[test]
    fn malformed_toml_fails() {
        let result = parse_toml(b"not = [valid");
        let Err(error) = result else { panic!("expected a malformed-document error") };
        assert_eq!(error.code(), "config.document.malformed");
    }

    #[test]
    fn load_enforces_size_cap() {
        let filesystem = InMemoryFileSystem::new();
        let path = PathBuf::from("/tighten.toml");
        let oversized = vec![b' '; MAX_CONFIG_FILE_SIZE + 1];
        filesystem.write_atomic(&path, &oversized).unwrap_or_else(|_| panic!("write should succeed"));
        let result = load(&filesystem, &path);
        let Err(error) = result else { panic!("expected a malformed-document error") };
        assert_eq!(error.code(), "config.document.malformed");
    }

    #[test]
    fn load_reads_through_filesystem_facade() {
        let filesystem = InMemoryFileSystem::new();
        let path = PathBuf::from("/tighten.toml");
        filesystem
            .write_atomic(&path, b"[emission]\noutput_dir = \"/out\"\n")
            .unwrap_or_else(|_| panic!("write should succeed"));
        let builder = load(&filesystem, &path).unwrap_or_else(|_| panic!("should load"));
        let options = builder.build().unwrap_or_else(|_| panic!("should build"));
        assert_eq!(options.emission.output_dir, PathBuf::from("/out"));
    }
}
