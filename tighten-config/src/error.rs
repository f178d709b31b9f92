// tighten-config/src/error.rs
// ============================================================================
// Module: Configuration Errors
// ============================================================================

//! ## Overview
//! Configuration errors (`spec.md` §7): "invalid rename syntax, non-positive
//! parallelism, missing connection string when live extraction or profiling
//! is required, unrecognized profiler provider". Raised by [`crate::builder`]
//! during [`crate::builder::TighteningOptionsBuilder::build`] and by
//! [`crate::file::parse_toml`] while decoding a persisted options file.

use thiserror::Error;

/// Errors raised while building or loading a [`crate::options::TighteningOptions`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A `module.entity=newName` rename entry was missing its separator or
    /// either side was empty.
    #[error("invalid naming override syntax: '{0}' (expected 'Module.Entity=NewName')")]
    InvalidRenameSyntax(String),
    /// A parallelism-style option was zero.
    #[error("{field} must be positive, got 0")]
    NonPositiveParallelism {
        /// Dotted path of the offending field, e.g. `profiling.degreeOfParallelism`.
        field: String,
    },
    /// Live extraction or live profiling was selected with no connection
    /// string resolved.
    #[error("a connection string is required when {usage} uses the live provider")]
    ConnectionStringMissing {
        /// What needed the connection (`profiling` or `extraction`).
        usage: String,
    },
    /// The configured profiler provider name matched neither `fixture` nor
    /// `live`.
    #[error("unrecognized profiler provider '{0}' (expected 'fixture' or 'live')")]
    UnrecognizedProfilerProvider(String),
    /// The TOML document could not be parsed.
    #[error("failed to parse configuration TOML: {0}")]
    Malformed(String),
}

impl ConfigError {
    /// The dotted error code this variant reports, matching `spec.md` §7.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidRenameSyntax(_) => "config.naming.invalidRenameSyntax",
            Self::NonPositiveParallelism { .. } => "config.parallelism.nonPositive",
            Self::ConnectionStringMissing { .. } => "config.profiling.connectionStringMissing",
            Self::UnrecognizedProfilerProvider(_) => "config.profiling.unrecognizedProvider",
            Self::Malformed(_) => "config.document.malformed",
        }
    }
}
