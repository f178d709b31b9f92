// tighten-orchestrator/src/lib.rs
// ============================================================================
// Module: Tighten Orchestrator Library
// Description: Bootstrapper (C7), the five named pipelines (C11), and the
// command dispatcher (C12).
// Purpose: Wire every other crate's component into one of the named
// pipelines `spec.md` §6 defines, enforcing the fixed step ordering and
// forwarding failures verbatim.
// Dependencies: tighten-core, tighten-ingest, tighten-policy,
// tighten-relational, tighten-artifacts, tighten-cache, tighten-config
// ============================================================================

//! ## Overview
//! `tighten-orchestrator` is where every other crate's component becomes a
//! runnable pipeline (`spec.md` §4.11, §4.12): [`bootstrap`] composes model
//! ingestion and profile capture into the shared preparation stage every
//! pipeline starts from; [`build_ssdt`], [`dmm_compare`],
//! [`extract_model`], [`capture_profile`], and [`analyze_tightening`] are
//! the five named pipelines `spec.md` §6 lists; [`pipeline`] holds the
//! cross-pipeline evidence-cache and config-fingerprint helpers they share;
//! [`dispatcher`] is the command dispatcher (C12) that resolves a request
//! to its handler.

pub mod analyze_tightening;
pub mod bootstrap;
pub mod build_ssdt;
pub mod capture_profile;
pub mod dispatcher;
pub mod dmm_compare;
pub mod extract_model;
pub mod pipeline;

pub use analyze_tightening::AnalyzeTighteningRequest;
pub use analyze_tightening::AnalyzeTighteningResponse;
pub use analyze_tightening::analyze_tightening;

pub use bootstrap::BootstrapContext;
pub use bootstrap::BootstrapRequest;
pub use bootstrap::ProfilerSelection;
pub use bootstrap::bootstrap;

pub use build_ssdt::BuildSsdtRequest;
pub use build_ssdt::BuildSsdtResponse;
pub use build_ssdt::build_ssdt;
pub use build_ssdt::no_seed_generator;

pub use capture_profile::CaptureProfileRequest;
pub use capture_profile::CaptureProfileResponse;
pub use capture_profile::capture_profile;

pub use dispatcher::PipelineName;
pub use dispatcher::PipelineRequest;
pub use dispatcher::PipelineResponse;
pub use dispatcher::dispatch;

pub use dmm_compare::AlwaysMatchComparator;
pub use dmm_compare::DmmCompareRequest;
pub use dmm_compare::DmmCompareResponse;
pub use dmm_compare::DmmCompareResult;
pub use dmm_compare::ReferenceScriptComparator;
pub use dmm_compare::ScriptDifference;
pub use dmm_compare::dmm_compare;

pub use extract_model::ExtractModelRequest;
pub use extract_model::ExtractModelResponse;
pub use extract_model::ModelExtractor;
pub use extract_model::extract_model;

pub use pipeline::CacheInputs;
pub use pipeline::collect_artifact_copies;
pub use pipeline::config_fingerprint;
pub use pipeline::persist_evidence_cache;
