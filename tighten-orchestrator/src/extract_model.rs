// tighten-orchestrator/src/extract_model.rs
// ============================================================================
// Module: ExtractModel pipeline (C11)
// ============================================================================

//! ## Overview
//! The `ExtractModel` named pipeline (`spec.md` §6
//! "ExtractModelPipelineRequest"). Producing a [`Model`] from a live
//! database catalog is explicitly out of scope here (`spec.md` §1: "the
//! database metadata extractor that produces the input model from a live
//! catalog" is an external collaborator, not redesigned in this core) — this
//! pipeline defines the contract it consumes ([`ModelExtractor`]), invokes
//! it, and persists the result as `model.json` under the output directory.

use std::path::Path;

use tighten_core::filesystem::FileSystem;
use tighten_core::log::ExecutionLog;
use tighten_core::log::MetadataBuilder;
use tighten_core::model::Model;
use tighten_core::outcome::ErrorRecord;
use tighten_core::outcome::Outcome;

/// Produces a logical [`Model`] from whatever external source the caller
/// wires in (a live catalog reader, a snapshot replay, a test fixture).
/// This core has no opinion on how extraction happens; it only consumes
/// the result.
pub trait ModelExtractor {
    /// Extracts the current logical model.
    ///
    /// # Errors
    ///
    /// Returns a human-readable error message on extraction failure.
    fn extract(&self) -> Result<Model, String>;
}

/// Everything an `ExtractModel` run needs.
pub struct ExtractModelRequest<'a> {
    /// The collaborator that performs the actual extraction.
    pub extractor: &'a dyn ModelExtractor,
    /// File-system facade the extracted model is written through.
    pub filesystem: &'a dyn FileSystem,
    /// Directory the extracted model is written to, as `model.json`.
    pub output_dir: &'a Path,
}

/// The full result of an `ExtractModel` run.
pub struct ExtractModelResponse {
    /// The extracted logical model.
    pub model: Model,
    /// Relative path of the written model file.
    pub model_path: String,
}

/// Runs the `ExtractModel` pipeline: extract, persist, log.
pub fn extract_model(request: ExtractModelRequest<'_>, log: &mut ExecutionLog<'_>) -> Outcome<ExtractModelResponse> {
    log.record("request.received", "Pipeline request accepted.");

    let model = match request.extractor.extract() {
        Ok(model) => model,
        Err(message) => return Outcome::fail(ErrorRecord::new("modelExtraction.failed", message)),
    };
    log.record_with_metadata(
        "model.extracted",
        "Logical model extracted from the external catalog.",
        MetadataBuilder::new().count("modules", model.modules.len() as i64).build(),
    );

    let model_path = "model.json".to_string();
    let bytes = match serde_json::to_vec_pretty(&model) {
        Ok(bytes) => bytes,
        Err(error) => return Outcome::fail(ErrorRecord::new("modelExtraction.serialization", error.to_string())),
    };
    if let Err(error) = request.filesystem.write_atomic(&request.output_dir.join(&model_path), &bytes) {
        log.record("pipeline.failed", "ExtractModel pipeline failed writing the extracted model.");
        return Outcome::fail(ErrorRecord::new("modelExtraction.io", error.to_string()));
    }

    log.record("pipeline.completed", "ExtractModel pipeline completed.");

    Outcome::ok(ExtractModelResponse { model, model_path })
}
