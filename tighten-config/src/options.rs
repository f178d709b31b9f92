// tighten-config/src/options.rs
// ============================================================================
// Module: Tightening Options
// ============================================================================

//! ## Overview
//! The single options record carrying every toggle a pipeline run needs
//! (`spec.md` §9 "Configuration": "A single options record carries all
//! toggles ... Builders construct new records; no mutation after
//! construction"). Constructed only through
//! [`crate::builder::TighteningOptionsBuilder`].

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use tighten_ingest::ModuleFilterOptions;
use tighten_ingest::SupplementalOptions;
use tighten_policy::PolicyToggles;
use tighten_relational::NamingOverrides;
use tighten_relational::RelationalBuildOptions;
use tighten_relational::TypeMappingPolicy;

/// Which profile-capture capability a run uses (`spec.md` §4.6).
#[derive(Debug, Clone, PartialEq)]
pub enum ProfilerProviderOptions {
    /// Read a JSON snapshot fixture from disk.
    Fixture {
        /// Path to the fixture file, resolved through the file-system
        /// facade.
        path: PathBuf,
    },
    /// Run live scan queries through an injected connection factory.
    Live {
        /// Worker-pool degree of parallelism (`spec.md` §5 default: 4).
        parallelism: usize,
        /// Maximum rows sampled per table; `0` means uncapped.
        row_cap: u64,
        /// Per-table probe timeout.
        per_table_timeout: Duration,
        /// Connection string resolved for the live connection factory.
        connection_string: String,
    },
}

impl Default for ProfilerProviderOptions {
    fn default() -> Self {
        Self::Fixture { path: PathBuf::from("profile.json") }
    }
}

/// Artifact-emission options (`spec.md` §4.10, §5).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmissionOptions {
    /// Directory artifacts are written to.
    pub output_dir: PathBuf,
    /// Per-table SQL write parallelism (`spec.md` §5: "configurable module
    /// parallelism (default 1; property-tested up to 8)"). This pipeline
    /// fixes the default at 1 rather than the profiler's 4, resolving
    /// `spec.md` §9 open question (b).
    pub module_parallelism: usize,
}

impl Default for EmissionOptions {
    fn default() -> Self {
        Self { output_dir: PathBuf::from("."), module_parallelism: 1 }
    }
}

/// Evidence-cache options (`spec.md` §4.4). `None` at the
/// [`TighteningOptions`] level disables caching entirely.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EvidenceCacheOptions {
    /// Root directory the cache lives under.
    pub root: PathBuf,
    /// Time-to-live in seconds from `createdAtUtc`; `None` never expires.
    pub ttl_seconds: Option<i64>,
    /// Forces a rebuild regardless of persisted state.
    pub refresh: bool,
    /// Arbitrary metadata contributing to the cache key, e.g.
    /// `policy.mode`.
    pub metadata: BTreeMap<String, String>,
}

/// The single options record carrying every toggle a pipeline run needs.
/// Only ever produced by [`crate::builder::TighteningOptionsBuilder::build`];
/// no field is mutated once a value exists.
#[derive(Debug, Clone, PartialEq)]
pub struct TighteningOptions {
    /// Tightening policy toggles (`spec.md` §4.8).
    pub policy: PolicyToggles,
    /// Module/entity filter (`spec.md` §4.5).
    pub module_filter: ModuleFilterOptions,
    /// Supplemental-entity loading options (`spec.md` §4.5).
    pub supplemental: SupplementalOptions,
    /// Relational model factory build options (`spec.md` §4.9).
    pub relational_build: RelationalBuildOptions,
    /// Declared-type to SQL-shape mapping (`spec.md` §4.9).
    pub type_mapping: TypeMappingPolicy,
    /// Table naming overrides (`spec.md` §4.9).
    pub naming: NamingOverrides,
    /// Profile-capture provider selection (`spec.md` §4.6).
    pub profiler: ProfilerProviderOptions,
    /// Artifact-emission options (`spec.md` §4.10).
    pub emission: EmissionOptions,
    /// Evidence-cache options; `None` disables caching (`spec.md` §4.4).
    pub evidence_cache: Option<EvidenceCacheOptions>,
}
