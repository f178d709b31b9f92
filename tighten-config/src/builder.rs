// tighten-config/src/builder.rs
// ============================================================================
// Module: Tightening Options Builder
// ============================================================================

//! ## Overview
//! A non-mutating builder over [`TighteningOptions`] (`spec.md` §9
//! "Builders construct new records; no mutation after construction"). Every
//! `with_*` method consumes `self` and returns a new `Self`; validation
//! (naming-rename syntax, parallelism, connection strings, profiler
//! provider name) is deferred to [`TighteningOptionsBuilder::build`] so a
//! single call surfaces every configuration error at once.

use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use tighten_ingest::ModuleFilterOptions;
use tighten_ingest::SupplementalOptions;
use tighten_policy::PolicyToggles;
use tighten_relational::NamingOverrides;
use tighten_relational::RelationalBuildOptions;
use tighten_relational::TypeMappingPolicy;

use crate::error::ConfigError;
use crate::options::EmissionOptions;
use crate::options::EvidenceCacheOptions;
use crate::options::ProfilerProviderOptions;
use crate::options::TighteningOptions;

/// Which profiler provider a run resolves to, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
enum RawProfilerSelection {
    /// Read a JSON snapshot fixture from disk.
    Fixture {
        /// Path to the fixture file.
        path: PathBuf,
    },
    /// Run live scan queries through an injected connection factory.
    Live {
        /// Worker-pool degree of parallelism.
        parallelism: usize,
        /// Maximum rows sampled per table.
        row_cap: u64,
        /// Per-table probe timeout, in seconds.
        timeout_seconds: u64,
        /// Connection string, validated non-empty at build time.
        connection_string: Option<String>,
    },
}

/// Non-mutating builder for [`TighteningOptions`].
#[derive(Debug, Clone)]
pub struct TighteningOptionsBuilder {
    /// Tightening policy toggles.
    policy: PolicyToggles,
    /// Module/entity filter.
    module_filter: ModuleFilterOptions,
    /// Supplemental-entity loading options.
    supplemental: SupplementalOptions,
    /// Relational model factory build options.
    relational_build: RelationalBuildOptions,
    /// Declared-type to SQL-shape mapping.
    type_mapping: TypeMappingPolicy,
    /// Table naming overrides set wholesale via [`Self::with_naming_overrides`].
    naming: NamingOverrides,
    /// Queued `Module.Entity=NewName` rename entries, validated at build time.
    naming_renames: Vec<String>,
    /// Selected profile-capture provider, before validation.
    profiler: RawProfilerSelection,
    /// Artifact output directory.
    output_dir: PathBuf,
    /// Per-table SQL write parallelism.
    emission_parallelism: usize,
    /// Evidence-cache root directory, `None` disables caching.
    evidence_cache_root: Option<PathBuf>,
    /// Evidence-cache time-to-live in seconds.
    evidence_cache_ttl_seconds: Option<i64>,
    /// Forces an evidence-cache rebuild regardless of persisted state.
    evidence_cache_refresh: bool,
    /// Extra metadata contributing to the evidence-cache key.
    evidence_cache_metadata: BTreeMap<String, String>,
}

impl Default for TighteningOptionsBuilder {
    fn default() -> Self {
        Self {
            policy: PolicyToggles::default(),
            module_filter: ModuleFilterOptions::default(),
            supplemental: SupplementalOptions::default(),
            relational_build: RelationalBuildOptions::default(),
            type_mapping: TypeMappingPolicy::platform_default(),
            naming: NamingOverrides::default(),
            naming_renames: Vec::new(),
            profiler: RawProfilerSelection::Fixture { path: PathBuf::from("profile.json") },
            output_dir: PathBuf::from("."),
            emission_parallelism: 1,
            evidence_cache_root: None,
            evidence_cache_ttl_seconds: None,
            evidence_cache_refresh: false,
            evidence_cache_metadata: BTreeMap::new(),
        }
    }
}

impl TighteningOptionsBuilder {
    /// Starts a builder with every default (`Conservative`/`Strict`
    /// policy, fixture profiler at `profile.json`, no cache).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the tightening policy toggles.
    #[must_use]
    pub fn with_policy(mut self, policy: PolicyToggles) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the module/entity filter.
    #[must_use]
    pub fn with_module_filter(mut self, module_filter: ModuleFilterOptions) -> Self {
        self.module_filter = module_filter;
        self
    }

    /// Sets the supplemental-entity loading options.
    #[must_use]
    pub fn with_supplemental(mut self, supplemental: SupplementalOptions) -> Self {
        self.supplemental = supplemental;
        self
    }

    /// Sets the relational model factory build options.
    #[must_use]
    pub fn with_relational_build(mut self, options: RelationalBuildOptions) -> Self {
        self.relational_build = options;
        self
    }

    /// Sets the declared-type to SQL-shape mapping.
    #[must_use]
    pub fn with_type_mapping(mut self, type_mapping: TypeMappingPolicy) -> Self {
        self.type_mapping = type_mapping;
        self
    }

    /// Sets the table naming overrides wholesale, replacing any prefix or
    /// rename entries set so far (but not renames queued via
    /// [`Self::with_naming_rename`], which are applied on top at build
    /// time).
    #[must_use]
    pub fn with_naming_overrides(mut self, naming: NamingOverrides) -> Self {
        self.naming = naming;
        self
    }

    /// Queues a `Module.Entity=NewName` rename entry, validated at
    /// [`Self::build`] time (`spec.md` §7 "invalid rename syntax").
    #[must_use]
    pub fn with_naming_rename(mut self, entry: impl Into<String>) -> Self {
        self.naming_renames.push(entry.into());
        self
    }

    /// Selects the fixture profile provider.
    #[must_use]
    pub fn with_fixture_profiler(mut self, path: impl Into<PathBuf>) -> Self {
        self.profiler = RawProfilerSelection::Fixture { path: path.into() };
        self
    }

    /// Selects the live profile provider.
    #[must_use]
    pub fn with_live_profiler(
        mut self,
        parallelism: usize,
        row_cap: u64,
        timeout_seconds: u64,
        connection_string: impl Into<String>,
    ) -> Self {
        self.profiler = RawProfilerSelection::Live {
            parallelism,
            row_cap,
            timeout_seconds,
            connection_string: Some(connection_string.into()),
        };
        self
    }

    /// Sets the artifact output directory.
    #[must_use]
    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    /// Sets the per-table SQL write parallelism (`spec.md` §5).
    #[must_use]
    pub fn with_emission_parallelism(mut self, parallelism: usize) -> Self {
        self.emission_parallelism = parallelism;
        self
    }

    /// Enables the evidence cache rooted at `root`.
    #[must_use]
    pub fn with_evidence_cache(mut self, root: impl Into<PathBuf>, ttl_seconds: Option<i64>, refresh: bool) -> Self {
        self.evidence_cache_root = Some(root.into());
        self.evidence_cache_ttl_seconds = ttl_seconds;
        self.evidence_cache_refresh = refresh;
        self
    }

    /// Adds one metadata entry contributing to the evidence-cache key.
    #[must_use]
    pub fn with_cache_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.evidence_cache_metadata.insert(key.into(), value.into());
        self
    }

    /// Validates and finalizes the builder into a [`TighteningOptions`]
    /// record.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidRenameSyntax`] for a malformed
    /// `Module.Entity=NewName` entry, [`ConfigError::NonPositiveParallelism`]
    /// for a zero parallelism field, and
    /// [`ConfigError::ConnectionStringMissing`] when the live profiler has
    /// no connection string resolved.
    pub fn build(self) -> Result<TighteningOptions, ConfigError> {
        let mut naming = self.naming;
        for entry in &self.naming_renames {
            let (key, new_name) = parse_rename_entry(entry)?;
            naming.entity_renames.insert(key, new_name);
        }

        if self.emission_parallelism == 0 {
            return Err(ConfigError::NonPositiveParallelism { field: "emission.moduleParallelism".to_string() });
        }

        let profiler = match self.profiler {
            RawProfilerSelection::Fixture { path } => ProfilerProviderOptions::Fixture { path },
            RawProfilerSelection::Live { parallelism, row_cap, timeout_seconds, connection_string } => {
                if parallelism == 0 {
                    return Err(ConfigError::NonPositiveParallelism { field: "profiling.parallelism".to_string() });
                }
                let connection_string = connection_string
                    .filter(|value| !value.is_empty())
                    .ok_or_else(|| ConfigError::ConnectionStringMissing { usage: "profiling".to_string() })?;
                ProfilerProviderOptions::Live {
                    parallelism,
                    row_cap,
                    per_table_timeout: Duration::from_secs(timeout_seconds),
                    connection_string,
                }
            }
        };

        let evidence_cache = self.evidence_cache_root.map(|root| EvidenceCacheOptions {
            root,
            ttl_seconds: self.evidence_cache_ttl_seconds,
            refresh: self.evidence_cache_refresh,
            metadata: self.evidence_cache_metadata,
        });

        Ok(TighteningOptions {
            policy: self.policy,
            module_filter: self.module_filter,
            supplemental: self.supplemental,
            relational_build: self.relational_build,
            type_mapping: self.type_mapping,
            naming,
            profiler,
            emission: EmissionOptions { output_dir: self.output_dir, module_parallelism: self.emission_parallelism },
            evidence_cache,
        })
    }
}

/// Parses a `Module.Entity=NewName` naming-rename entry into the
/// `(module.entity, new_name)` pair [`NamingOverrides::entity_renames`]
/// expects.
fn parse_rename_entry(entry: &str) -> Result<(String, String), ConfigError> {
    let (target, new_name) =
        entry.split_once('=').ok_or_else(|| ConfigError::InvalidRenameSyntax(entry.to_string()))?;
    let (module, entity) =
        target.split_once('.').ok_or_else(|| ConfigError::InvalidRenameSyntax(entry.to_string()))?;
    if module.is_empty() || entity.is_empty() || new_name.is_empty() {
        return Err(ConfigError::InvalidRenameSyntax(entry.to_string()));
    }
    Ok((format!("{module}.{entity}"), new_name.to_string()))
}

/// Resolves a fixture-relative path against a base directory, used by
/// callers that store fixture paths relative to a config file's location.
#[must_use]
pub fn resolve_relative(base_dir: &Path, relative: &str) -> PathBuf {
    base_dir.join(relative)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_build_successfully() {
        let options = TighteningOptionsBuilder::new().build().unwrap_or_else(|_| panic!("defaults should build"));
        assert_eq!(options.emission.module_parallelism, 1);
    }

    #[test]
    fn naming_rename_is_applied() {
        let options = TighteningOptionsBuilder::new()
            .with_naming_rename("ExtBilling.Account=BillingAccount")
            .build()
            .unwrap_or_else(|_| panic!("should build"));
        assert_eq!(options.naming.entity_renames.get("ExtBilling.Account"), Some(&"BillingAccount".to_string()));
    }

    #[test]
    fn malformed_rename_entry_fails() {
        let result = TighteningOptionsBuilder::new().with_naming_rename("NoSeparator").build();
        let Err(error) = result else { panic!("expected an invalid-rename-syntax error") };
        assert_eq!(error.code(), "config.naming.invalidRenameSyntax");
    }

    #[test]
    fn zero_emission_parallelism_fails() {
        let result = TighteningOptionsBuilder::new().with_emission_parallelism(0).build();
        let Err(error) = result else { panic!("expected a non-positive-parallelism error") };
        assert_eq!(error.code(), "config.parallelism.nonPositive");
    }

    #[test]
    fn live_profiler_without_connection_string_fails() {
        let result = TighteningOptionsBuilder::new().with_live_profiler(4, 0, 30, "").build();
        let Err(error) = result else { panic!("expected a connection-string-missing error") };
        assert_eq!(error.code(), "config.profiling.connectionStringMissing");
    }

    #[test]
    fn live_profiler_with_connection_string_succeeds() {
        let options = TighteningOptionsBuilder::new()
            .with_live_profiler(8, 10_000, 45, "Server=localhost;Database=app")
            .build()
            .unwrap_or_else(|_| panic!("should build"));
        let ProfilerProviderOptions::Live { parallelism, .. } = options.profiler else {
            panic!("expected the live provider");
        };
        assert_eq!(parallelism, 8);
    }

    #[test]
    fn zero_live_parallelism_fails() {
        let result = TighteningOptionsBuilder::new().with_live_profiler(0, 0, 30, "Server=localhost").build();
        let Err(error) = result else { panic!("expected a non-positive-parallelism error") };
        assert_eq!(error.code(), "config.parallelism.nonPositive");
    }
}
