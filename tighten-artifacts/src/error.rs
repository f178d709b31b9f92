// tighten-artifacts/src/error.rs
// ============================================================================
// Module: Artifact emitter errors
// ============================================================================

//! ## Overview
//! "Emission errors: output-path collision after sanitization; I/O failure
//! (surfaced verbatim)" (`spec.md` §7).

use thiserror::Error;

use tighten_core::filesystem::FileSystemError;

/// Errors raised while emitting artifacts.
#[derive(Debug, Error)]
pub enum EmitError {
    /// Two tables sanitized to the same output path.
    #[error("output path collision after sanitization: {0}")]
    PathCollision(String),
    /// A file-system write failed, surfaced verbatim from the facade.
    #[error(transparent)]
    FileSystem(#[from] FileSystemError),
    /// A value could not be serialized to JSON.
    #[error("failed to serialize artifact: {0}")]
    Serialization(String),
}

impl EmitError {
    /// The dotted error code for this variant.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::PathCollision(_) => "emission.pathCollision",
            Self::FileSystem(_) => "emission.io",
            Self::Serialization(_) => "emission.serialization",
        }
    }
}
