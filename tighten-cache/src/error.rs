// tighten-cache/src/error.rs
// ============================================================================
// Module: Cache Errors
// ============================================================================

//! ## Overview
//! Missing required input files fail with codes like `cache.model.notFound`
//! (`spec.md` §4.4); manifest corruption is never one of these — a
//! corrupt or unparsable manifest is treated as absent and overwritten
//! (`spec.md` §7: "manifest corruption (treated as 'absent, regenerate')").

use thiserror::Error;

/// Errors raised by the evidence cache.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// A required input referenced by the cache request was not found.
    #[error("required cache input not found: {0}")]
    InputNotFound(String),
    /// The cache root directory could not be read or written.
    #[error("cache directory operation failed: {0}")]
    DirectoryOperationFailed(String),
}

impl CacheError {
    /// The dotted error code for this variant.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InputNotFound(_) => "cache.model.notFound",
            Self::DirectoryOperationFailed(_) => "cache.directory.operationFailed",
        }
    }
}
