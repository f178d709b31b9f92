// tighten-ingest/src/error.rs
// ============================================================================
// Module: Ingest Errors
// Description: Structured errors for model parsing, filtering, and profile
// capture.
// ============================================================================

//! ## Overview
//! Ingest errors are wrapped into [`tighten_core::outcome::ErrorRecord`] at
//! the stage boundary; the codes here match `spec.md` §7's taxonomy
//! verbatim (`modelFilter.modules.missing`, `modelFilter.entities.missing`).

use thiserror::Error;

/// Errors raised while ingesting a model or capturing a profile.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IngestError {
    /// The model file could not be read.
    #[error("failed to read model file at {path}: {message}")]
    ModelUnreadable {
        /// Path that was read.
        path: String,
        /// Underlying failure description.
        message: String,
    },
    /// The model file was not valid JSON.
    #[error("model file at {path} is not valid JSON: {message}")]
    ModelMalformed {
        /// Path that was read.
        path: String,
        /// Parse failure description.
        message: String,
    },
    /// One or more requested modules are absent from the model
    /// (`modelFilter.modules.missing`).
    #[error("requested module(s) not found: {0}")]
    ModulesMissing(String),
    /// One or more requested entities are absent from their module
    /// (`modelFilter.entities.missing`).
    #[error("requested entity '{entity}' not found in module '{module}'")]
    EntityMissing {
        /// Owning module name.
        module: String,
        /// Requested entity name.
        entity: String,
    },
    /// The profile fixture file could not be read or parsed.
    #[error("failed to read profile fixture at {path}: {message}")]
    ProfileFixtureUnreadable {
        /// Path that was read.
        path: String,
        /// Underlying failure description.
        message: String,
    },
    /// A live connection could not be opened.
    #[error("failed to open database connection: {0}")]
    ConnectionFailed(String),
}

impl IngestError {
    /// The dotted error code this variant reports, matching `spec.md` §7.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::ModelUnreadable { .. } => "ingest.model.unreadable",
            Self::ModelMalformed { .. } => "ingest.model.malformed",
            Self::ModulesMissing(_) => "modelFilter.modules.missing",
            Self::EntityMissing { .. } => "modelFilter.entities.missing",
            Self::ProfileFixtureUnreadable { .. } => "ingest.profile.fixtureUnreadable",
            Self::ConnectionFailed(_) => "ingest.profile.connectionFailed",
        }
    }
}
