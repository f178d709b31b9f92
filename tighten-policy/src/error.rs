// tighten-policy/src/error.rs
// ============================================================================
// Module: Policy Errors
// Description: Structured diagnostics for tightening-policy evaluation.
// ============================================================================

//! ## Overview
//! Policy evaluation never raises for missing evidence (that resolves to
//! `Unknown` and a diagnostic, per `spec.md` §4.8) — [`PolicyError`] is
//! reserved for configuration-level problems: an unrecognized toggle value,
//! or a coordinate referenced in the profile that the model does not
//! declare.

use thiserror::Error;

/// Errors raised while evaluating the tightening policy.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PolicyError {
    /// A profile entry referenced a coordinate absent from the logical
    /// model.
    #[error("profile references unknown coordinate: {0}")]
    UnknownCoordinate(String),
    /// An unrecognized policy toggle value.
    #[error("invalid policy toggle '{toggle}': {value}")]
    InvalidToggle {
        /// Toggle name.
        toggle: String,
        /// The rejected value.
        value: String,
    },
}

/// Convenient result alias for policy operations.
pub type PolicyResult<T> = Result<T, PolicyError>;
