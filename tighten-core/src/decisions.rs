// tighten-core/src/decisions.rs
// ============================================================================
// Module: Tightening decisions (derived data, spec.md §3, §4.8)
// ============================================================================

//! ## Overview
//! Per-coordinate decisions are immutable once produced: a column moves
//! `Undecided -> Decided(..)` exactly once and never back (`spec.md` §4.8
//! "State machine per column"). This module holds the decision value types;
//! `tighten-policy` holds the state machine that produces them.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::identifiers::Coordinate;

/// Deterministic rationale codes, in the fixed tie-break precedence order
/// from `spec.md` §4.8: "when multiple rationales apply, emit the first in
/// a fixed list".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rationale {
    /// `evidence.confirmed` — the profile confirms the declared intent.
    EvidenceConfirmed,
    /// `evidence.missing` — no trustworthy evidence was available.
    EvidenceMissing,
    /// `declared.mandatory` — the model declares the attribute mandatory.
    DeclaredMandatory,
    /// `policy.override` — an explicit policy toggle overrode the default.
    PolicyOverride,
    /// `remediation.tolerate` — remediation mode tolerated known orphans.
    RemediationTolerate,
}

impl Rationale {
    /// The fixed precedence order used to break ties between rationales
    /// that could both apply to the same coordinate.
    pub const PRECEDENCE: [Self; 5] = [
        Self::EvidenceConfirmed,
        Self::EvidenceMissing,
        Self::DeclaredMandatory,
        Self::PolicyOverride,
        Self::RemediationTolerate,
    ];

    /// Returns the dotted code string for this rationale.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::EvidenceConfirmed => "evidence.confirmed",
            Self::EvidenceMissing => "evidence.missing",
            Self::DeclaredMandatory => "declared.mandatory",
            Self::PolicyOverride => "policy.override",
            Self::RemediationTolerate => "remediation.tolerate",
        }
    }

    /// Picks the highest-precedence rationale among a set of candidates
    /// that apply simultaneously.
    #[must_use]
    pub fn pick_first(candidates: &[Self]) -> Option<Self> {
        Self::PRECEDENCE.into_iter().find(|rationale| candidates.contains(rationale))
    }
}

/// A per-column nullability decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NullabilityDecision {
    /// Tighten the column to `NOT NULL`.
    MakeNotNull {
        /// Why this decision was reached.
        rationale: Rationale,
    },
    /// Leave the column nullable.
    KeepNullable {
        /// Why this decision was reached.
        rationale: Rationale,
    },
}

impl NullabilityDecision {
    /// Returns the rationale attached to this decision.
    #[must_use]
    pub const fn rationale(self) -> Rationale {
        match self {
            Self::MakeNotNull { rationale } | Self::KeepNullable { rationale } => rationale,
        }
    }

    /// Returns true if this decision tightens the column.
    #[must_use]
    pub const fn tightens(self) -> bool {
        matches!(self, Self::MakeNotNull { .. })
    }
}

/// A per-foreign-key decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ForeignKeyDecision {
    /// Create (or keep) the physical constraint.
    Create {
        /// Why this decision was reached.
        rationale: Rationale,
        /// Preserve a `NOCHECK` flag from the source constraint.
        #[serde(rename = "isNoCheck")]
        is_no_check: bool,
    },
    /// Leave the constraint absent.
    KeepMissing {
        /// Why this decision was reached.
        rationale: Rationale,
    },
}

/// A per-index uniqueness decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UniqueIndexDecision {
    /// Enforce the unique constraint physically.
    Enforce {
        /// Why this decision was reached.
        rationale: Rationale,
    },
    /// Leave the index non-unique.
    KeepNonUnique {
        /// Why this decision was reached.
        rationale: Rationale,
    },
}

/// Severity of a diagnostic raised alongside a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticSeverity {
    /// Informational only.
    Info,
    /// Worth reviewing.
    Warning,
}

/// A per-entity diagnostic raised by the policy (`spec.md` §3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity of this diagnostic.
    pub severity: DiagnosticSeverity,
    /// Dotted diagnostic code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Coordinate the diagnostic applies to.
    pub coordinate: Coordinate,
}

/// A snapshot of the toggle configuration a decision set was produced
/// under, embedded for auditability (`spec.md` §4.8 `toggleSnapshot`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleSnapshot {
    /// `OnMissingEvidence` mode at decision time.
    pub on_missing_evidence: String,
    /// `RemediationMode` at decision time.
    pub remediation_mode: String,
}

/// The full set of decisions produced by one policy run (`spec.md` §4.8).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDecisionSet {
    /// Nullability decisions, keyed by coordinate.
    pub nullability: BTreeMap<Coordinate, NullabilityDecision>,
    /// Foreign-key decisions, keyed by coordinate.
    pub foreign_key: BTreeMap<Coordinate, ForeignKeyDecision>,
    /// Unique-index decisions, keyed by coordinate.
    pub unique_index: BTreeMap<Coordinate, UniqueIndexDecision>,
    /// Diagnostics raised while deciding.
    pub diagnostics: Vec<Diagnostic>,
    /// Columns observed present-but-inactive (`spec.md` §4.8): physically
    /// present in the profiled database but deactivated in the logical
    /// model. These never change a nullability decision; they surface only
    /// as an [`Opportunity`] in [`OpportunitiesReport`].
    pub present_but_inactive: Vec<Coordinate>,
    /// The toggle configuration in force for this run.
    pub toggle_snapshot: ToggleSnapshot,
}

/// Disposition of a finding that was not realized as a tightening decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    /// Can be applied without risk of breaking existing data.
    SafeToApply,
    /// Requires data remediation before it can be applied.
    NeedsRemediation,
}

/// Category of an opportunity finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpportunityCategory {
    /// The model and the observed data contradict each other.
    Contradiction,
    /// A strictly beneficial improvement with no observed risk.
    Improvement,
    /// Worth recording but not actionable on its own.
    Informational,
}

/// Relative risk of applying an opportunity's SQL unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    /// Negligible risk.
    Low,
    /// Some risk; review recommended.
    Medium,
    /// Meaningful risk; remediation strongly recommended first.
    High,
}

/// A single opportunity finding, with the SQL batch that would realize it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Opportunity {
    /// Coordinate this opportunity applies to.
    pub coordinate: Coordinate,
    /// Disposition: safe to apply as-is, or needs remediation first.
    pub disposition: Disposition,
    /// Category of this finding.
    pub category: OpportunityCategory,
    /// Short type tag (e.g. `nullability`, `foreignKey`, `uniqueIndex`).
    #[serde(rename = "type")]
    pub kind: String,
    /// Relative risk of applying the associated SQL unchanged.
    pub risk: RiskLevel,
    /// Human-readable explanation.
    pub message: String,
    /// The SQL statement that would realize this opportunity.
    pub sql: String,
    /// Sorted evidence lines, rendered as `-- Evidence: …` comments ahead
    /// of `sql` in the emitted batch (`spec.md` §4.10).
    pub evidence: Vec<String>,
}

/// Partitions opportunity findings by disposition (`spec.md` §4.8).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct OpportunitiesReport {
    /// Findings that can be applied unchanged.
    pub safe_to_apply: Vec<Opportunity>,
    /// Findings that need data remediation first.
    pub needs_remediation: Vec<Opportunity>,
}

/// Rolls up decision counts by module and kind (`spec.md` §4.8).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PolicyDecisionReport {
    /// Count of `MakeNotNull` decisions, by module name.
    pub tightened_columns_by_module: BTreeMap<String, u64>,
    /// Count of `Create` foreign-key decisions, by module name.
    pub created_foreign_keys_by_module: BTreeMap<String, u64>,
    /// Count of `Enforce` unique-index decisions, by module name.
    pub enforced_indexes_by_module: BTreeMap<String, u64>,
}
