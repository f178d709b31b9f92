// tighten-config/src/lib.rs
// ============================================================================
// Module: Tighten Config
// Description: The single options record, its non-mutating builder, and
// TOML (de)serialization (spec.md §9 "Configuration").
// Purpose: Single source of truth for tighten.toml semantics.
// Dependencies: tighten-core, tighten-ingest, tighten-policy,
// tighten-relational, serde, toml, thiserror
// ============================================================================

//! ## Overview
//! `tighten-config` defines [`TighteningOptions`], the single record every
//! pipeline toggle lives on (`spec.md` §9): [`builder`] is the non-mutating
//! builder that assembles and validates one, [`file`] loads it from a TOML
//! document through the file-system facade, and [`error`] carries the
//! configuration-error taxonomy (`spec.md` §7).

pub mod builder;
pub mod error;
pub mod file;
pub mod options;

pub use builder::TighteningOptionsBuilder;
pub use error::ConfigError;
pub use file::load;
pub use file::parse_toml;
pub use options::EmissionOptions;
pub use options::EvidenceCacheOptions;
pub use options::ProfilerProviderOptions;
pub use options::TighteningOptions;
