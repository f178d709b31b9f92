// tighten-artifacts/src/lib.rs
// ============================================================================
// Module: Tighten Artifacts Library
// Description: Artifact emitter (C10): writes per-table SQL, the emission
// manifest, the policy decision log, and the opportunities reports.
// Dependencies: tighten-core, tighten-relational, serde, serde_json,
// thiserror
// ============================================================================

//! ## Overview
//! `tighten-artifacts` is the last stage before persistence: given a
//! resolved [`tighten_core::relational::RelationalModel`] and the policy
//! artifacts produced for it, it writes every file `spec.md` §4.10 names,
//! atomically, and reports back what it wrote so the orchestrator can
//! package the execution log and persist the evidence cache.

pub mod emitter;
pub mod error;
pub mod manifest;
pub mod opportunities;
pub mod sanitize;
pub mod seeds;
pub mod sql;

pub use emitter::EmissionInputs;
pub use emitter::EmissionResult;
pub use emitter::emit;
pub use error::EmitError;
pub use manifest::EmissionManifest;
pub use manifest::EmittedArtifact;
pub use manifest::PredicateCoverage;
pub use manifest::TableCoverageEntry;
pub use seeds::NoSeedGenerator;
pub use seeds::SeedGenerator;
