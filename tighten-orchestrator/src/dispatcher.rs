// tighten-orchestrator/src/dispatcher.rs
// ============================================================================
// Module: Command dispatcher (C12)
// ============================================================================

//! ## Overview
//! `spec.md` §4.12 models the dispatcher as "a process-scoped registry
//! mapping a `Request` type and its declared `Response` type to a handler
//! capability", and §9 design notes say to "implement as tagged variants
//! plus a registry, not as open inheritance". In Rust the idiomatic shape
//! for a closed, compile-time-known set of request kinds *is* a tagged
//! union: [`PipelineRequest`]/[`PipelineResponse`] enumerate every handler
//! this core registers, and [`dispatch`] is the exhaustive match that plays
//! the registry's role — the compiler itself refuses to compile a request
//! variant with no matching handler.
//!
//! The one place a request kind is *not* known at compile time is the CLI
//! shell, which receives a command name as a string. [`PipelineName`]
//! closes that gap: [`PipelineName::parse`] is the runtime registry lookup
//! `spec.md` §4.12 describes, and an unrecognized name fails with the
//! structured `dispatcher.command.unregistered` error rather than a panic.

use tighten_core::outcome::ErrorRecord;
use tighten_core::outcome::Outcome;

use crate::analyze_tightening::AnalyzeTighteningRequest;
use crate::analyze_tightening::AnalyzeTighteningResponse;
use crate::analyze_tightening::analyze_tightening;
use crate::build_ssdt::BuildSsdtRequest;
use crate::build_ssdt::BuildSsdtResponse;
use crate::build_ssdt::build_ssdt;
use crate::capture_profile::CaptureProfileRequest;
use crate::capture_profile::CaptureProfileResponse;
use crate::capture_profile::capture_profile;
use crate::dmm_compare::DmmCompareRequest;
use crate::dmm_compare::DmmCompareResponse;
use crate::dmm_compare::dmm_compare;
use crate::extract_model::ExtractModelRequest;
use crate::extract_model::ExtractModelResponse;
use crate::extract_model::extract_model;
use tighten_core::log::ExecutionLog;

/// The five named pipelines `spec.md` §6 registers as handlers
/// (`BuildSsdtRequest`, `DmmComparePipelineRequest`,
/// `ExtractModelPipelineRequest`, `CaptureProfilePipelineRequest`,
/// `TighteningAnalysisPipelineRequest`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PipelineName {
    /// Tightens, projects, and emits every SSDT artifact.
    BuildSsdt,
    /// Compares the resolved model against a reference SQL script.
    DmmCompare,
    /// Extracts a logical model from an external catalog reader.
    ExtractModel,
    /// Captures a profile snapshot only.
    CaptureProfile,
    /// Runs bootstrap and policy evaluation only, without emission.
    TighteningAnalysis,
}

impl PipelineName {
    /// The canonical command name used as the cache key's `command` field
    /// and as the dispatcher registry key (`spec.md` §4.4, §4.12).
    #[must_use]
    pub const fn command_name(self) -> &'static str {
        match self {
            Self::BuildSsdt => "BuildSsdt",
            Self::DmmCompare => "DmmCompare",
            Self::ExtractModel => "ExtractModel",
            Self::CaptureProfile => "CaptureProfile",
            Self::TighteningAnalysis => "TighteningAnalysis",
        }
    }

    /// Resolves a command name to its registered pipeline, the runtime
    /// registry lookup `spec.md` §4.12 describes.
    ///
    /// # Errors
    ///
    /// Returns a `dispatcher.command.unregistered` [`ErrorRecord`] for any
    /// name not in the fixed set above.
    pub fn parse(name: &str) -> Result<Self, ErrorRecord> {
        match name {
            "BuildSsdt" => Ok(Self::BuildSsdt),
            "DmmCompare" => Ok(Self::DmmCompare),
            "ExtractModel" => Ok(Self::ExtractModel),
            "CaptureProfile" => Ok(Self::CaptureProfile),
            "TighteningAnalysis" => Ok(Self::TighteningAnalysis),
            other => Err(ErrorRecord::new(
                "dispatcher.command.unregistered",
                format!("no pipeline is registered for command '{other}'"),
            )),
        }
    }
}

/// A request for one of the five registered pipelines, carrying its own
/// handler-specific payload.
pub enum PipelineRequest<'a> {
    /// See [`crate::build_ssdt::build_ssdt`].
    BuildSsdt(BuildSsdtRequest<'a>),
    /// See [`crate::dmm_compare::dmm_compare`].
    DmmCompare(DmmCompareRequest<'a>),
    /// See [`crate::extract_model::extract_model`].
    ExtractModel(ExtractModelRequest<'a>),
    /// See [`crate::capture_profile::capture_profile`].
    CaptureProfile(CaptureProfileRequest<'a>),
    /// See [`crate::analyze_tightening::analyze_tightening`].
    TighteningAnalysis(AnalyzeTighteningRequest<'a>),
}

impl PipelineRequest<'_> {
    /// The pipeline this request targets.
    #[must_use]
    pub const fn pipeline(&self) -> PipelineName {
        match self {
            Self::BuildSsdt(_) => PipelineName::BuildSsdt,
            Self::DmmCompare(_) => PipelineName::DmmCompare,
            Self::ExtractModel(_) => PipelineName::ExtractModel,
            Self::CaptureProfile(_) => PipelineName::CaptureProfile,
            Self::TighteningAnalysis(_) => PipelineName::TighteningAnalysis,
        }
    }
}

/// The response payload a dispatched [`PipelineRequest`] resolves to.
pub enum PipelineResponse {
    /// See [`BuildSsdtResponse`].
    BuildSsdt(BuildSsdtResponse),
    /// See [`DmmCompareResponse`].
    DmmCompare(DmmCompareResponse),
    /// See [`ExtractModelResponse`].
    ExtractModel(ExtractModelResponse),
    /// See [`CaptureProfileResponse`].
    CaptureProfile(CaptureProfileResponse),
    /// See [`AnalyzeTighteningResponse`].
    TighteningAnalysis(AnalyzeTighteningResponse),
}

/// Dispatches a request to its registered pipeline handler, recording the
/// handler's own canonical execution-log steps on `log`.
///
/// # Errors
///
/// Returns every [`ErrorRecord`] the dispatched handler accumulated
/// (`spec.md` §7: "the dispatcher returns the full ordered error list").
pub fn dispatch(request: PipelineRequest<'_>, log: &mut ExecutionLog<'_>) -> Outcome<PipelineResponse> {
    match request {
        PipelineRequest::BuildSsdt(request) => build_ssdt(request, log).map(PipelineResponse::BuildSsdt),
        PipelineRequest::DmmCompare(request) => dmm_compare(request, log).map(PipelineResponse::DmmCompare),
        PipelineRequest::ExtractModel(request) => extract_model(request, log).map(PipelineResponse::ExtractModel),
        PipelineRequest::CaptureProfile(request) => capture_profile(request, log).map(PipelineResponse::CaptureProfile),
        PipelineRequest::TighteningAnalysis(request) => {
            analyze_tightening(request, log).map(PipelineResponse::TighteningAnalysis)
        }
    }
}
