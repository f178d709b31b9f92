// tighten-policy/src/toggles.rs
// ============================================================================
// Module: Policy Toggles
// Description: The configuration surface that shifts tightening policy
// outcomes without changing the evidence itself (glossary: "Policy toggle").
// ============================================================================

//! ## Overview
//! Two toggles change how a decision resolves when evidence is incomplete or
//! contradictory (`spec.md` §4.8): [`OnMissingEvidence`] governs what happens
//! when a probe never ran (a three-way toggle: `Conservative` keeps the
//! column untouched silently, `EvidenceGated` keeps it untouched but raises a
//! diagnostic, `Aggressive` trusts the declared intent and raises a
//! diagnostic), and [`RemediationMode`] governs what happens when evidence
//! confirms a problem (an orphaned row, a duplicate value) that would
//! otherwise block tightening.

use serde::Deserialize;
use serde::Serialize;

/// What a decision does when the needed evidence was never captured
/// (`spec.md` §4.8). Upgrading `Conservative` -> `EvidenceGated` ->
/// `Aggressive` only ever turns `KeepNullable` into `MakeNotNull`, never the
/// reverse (`spec.md` §8, law 7 "Policy monotonicity").
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnMissingEvidence {
    /// Leave the column/constraint/index untouched, no diagnostic.
    Conservative,
    /// Leave the column/constraint/index untouched, but raise a diagnostic.
    EvidenceGated,
    /// Trust the declared intent from the logical model even without
    /// confirming evidence, and raise a diagnostic.
    Aggressive,
}

impl Default for OnMissingEvidence {
    fn default() -> Self {
        Self::Conservative
    }
}

/// What a decision does when evidence confirms a problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemediationMode {
    /// Refuse to tighten past a confirmed problem.
    Strict,
    /// Tighten anyway, routing the SQL to the needs-remediation opportunity
    /// bucket rather than applying it directly.
    Tolerate,
}

impl Default for RemediationMode {
    fn default() -> Self {
        Self::Strict
    }
}

/// The full toggle configuration for one policy run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PolicyToggles {
    /// Behavior when a probe never ran.
    #[serde(default)]
    pub on_missing_evidence: OnMissingEvidence,
    /// Behavior when evidence confirms a problem.
    #[serde(default)]
    pub remediation_mode: RemediationMode,
}

impl PolicyToggles {
    /// Renders this configuration as the snapshot embedded in a
    /// [`tighten_core::decisions::PolicyDecisionSet`] for auditability.
    #[must_use]
    pub fn snapshot(self) -> tighten_core::decisions::ToggleSnapshot {
        let on_missing_evidence = match self.on_missing_evidence {
            OnMissingEvidence::Conservative => "conservative",
            OnMissingEvidence::EvidenceGated => "evidence_gated",
            OnMissingEvidence::Aggressive => "aggressive",
        };
        let remediation_mode = match self.remediation_mode {
            RemediationMode::Strict => "strict",
            RemediationMode::Tolerate => "tolerate",
        };
        tighten_core::decisions::ToggleSnapshot {
            on_missing_evidence: on_missing_evidence.to_string(),
            remediation_mode: remediation_mode.to_string(),
        }
    }
}
