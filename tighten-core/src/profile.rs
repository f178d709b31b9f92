// tighten-core/src/profile.rs
// ============================================================================
// Module: Profile snapshot (input data, spec.md §3)
// ============================================================================

//! ## Overview
//! The profile snapshot is observed database fact captured separately from
//! the logical model (`spec.md` §3, §6). Every probe carries an explicit
//! [`ProbeStatus`] because a probe can fail or time out without that being
//! fatal to the run (`spec.md` §4.6, §4.8) — tightening decisions downgrade
//! gracefully rather than assume success.

use serde::Deserialize;
use serde::Serialize;

use crate::identifiers::Coordinate;

/// The outcome of a profiling probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeStatus {
    /// The probe ran to completion and its result is trustworthy.
    Succeeded,
    /// The probe did not run, or ran but produced no usable result.
    Unknown,
    /// The probe ran and failed (e.g. timed out, errored).
    Failed,
}

/// Probe metadata shared across probe kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Probe {
    /// Outcome of the probe.
    pub status: ProbeStatus,
    /// Number of rows sampled, when sampling was used.
    #[serde(rename = "samplingSize", default)]
    pub sampling_size: Option<u64>,
    /// UTC timestamp the probe was captured at.
    #[serde(rename = "capturedAt")]
    pub captured_at: String,
}

/// Row-count and null-count evidence for a single column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnProfile {
    /// Column coordinate.
    pub coordinate: Coordinate,
    /// Total observed row count for the owning table.
    #[serde(rename = "rowCount")]
    pub row_count: u64,
    /// Observed null count for the column.
    #[serde(rename = "nullCount")]
    pub null_count: u64,
    /// The probe that produced `null_count`.
    pub probe: Probe,
}

/// Duplicate-value evidence for a single-column unique-index candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniqueCandidateProfile {
    /// Index coordinate.
    pub coordinate: Coordinate,
    /// Whether a duplicate value was observed.
    #[serde(rename = "hasDuplicate")]
    pub has_duplicate: bool,
    /// The probe that produced `has_duplicate`.
    pub probe: Probe,
}

/// Duplicate-value evidence for a composite unique-index candidate. Every
/// column-prefix of the composite must itself be covered by evidence before
/// the policy may enforce it (`spec.md` §4.8).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositeUniqueCandidateProfile {
    /// Owning table coordinate (no member).
    pub table: Coordinate,
    /// Ordered columns making up the composite candidate.
    pub columns: Vec<String>,
    /// Whether a duplicate combination was observed.
    #[serde(rename = "hasDuplicate")]
    pub has_duplicate: bool,
}

/// Orphan-row and constraint-presence evidence for a declared foreign key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyReality {
    /// The table coordinate the foreign key originates from.
    pub from: Coordinate,
    /// The table coordinate the foreign key references.
    pub to: Coordinate,
    /// Whether an orphaned (unmatched) row was observed.
    #[serde(rename = "hasOrphan")]
    pub has_orphan: bool,
    /// Whether the existing database constraint, if any, is marked
    /// `NOCHECK`.
    #[serde(rename = "isNoCheck", default)]
    pub is_no_check: bool,
    /// Whether the database already enforces this constraint physically.
    #[serde(rename = "hasDatabaseConstraint", default)]
    pub has_database_constraint: bool,
}

/// Severity of a coverage anomaly or policy diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Informational only.
    Info,
    /// Worth reviewing but not blocking.
    Warning,
    /// Indicates a likely problem.
    Error,
}

/// A profile probe whose outcome is not `Succeeded`; downgrades related
/// tightening decisions (glossary: "Coverage anomaly").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageAnomaly {
    /// Coordinate the anomaly applies to.
    pub coordinate: Coordinate,
    /// Severity of the anomaly.
    pub severity: Severity,
    /// Human-readable explanation.
    pub message: String,
}

/// The full profile snapshot for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProfileSnapshot {
    /// Per-column profiles.
    #[serde(default)]
    pub columns: Vec<ColumnProfile>,
    /// Single-column unique-index candidate profiles.
    #[serde(rename = "uniqueCandidates", default)]
    pub unique_candidates: Vec<UniqueCandidateProfile>,
    /// Composite unique-index candidate profiles.
    #[serde(rename = "compositeUniqueCandidates", default)]
    pub composite_unique_candidates: Vec<CompositeUniqueCandidateProfile>,
    /// Foreign-key reality profiles.
    #[serde(rename = "foreignKeys", default)]
    pub foreign_keys: Vec<ForeignKeyReality>,
    /// Anomalies explaining probe failures.
    #[serde(rename = "coverageAnomalies", default)]
    pub coverage_anomalies: Vec<CoverageAnomaly>,
}

impl ProfileSnapshot {
    /// Looks up the column profile for a coordinate, if present.
    #[must_use]
    pub fn column(&self, coordinate: &Coordinate) -> Option<&ColumnProfile> {
        self.columns.iter().find(|profile| &profile.coordinate == coordinate)
    }

    /// Looks up the single-column unique-candidate profile for a
    /// coordinate, if present.
    #[must_use]
    pub fn unique_candidate(&self, coordinate: &Coordinate) -> Option<&UniqueCandidateProfile> {
        self.unique_candidates.iter().find(|profile| &profile.coordinate == coordinate)
    }

    /// Looks up the composite unique-candidate profile whose columns exactly
    /// match `columns` (in order) on `table`, if present. Used to confirm
    /// every prefix of a composite index is covered by evidence (`spec.md`
    /// §4.8: "A composite candidate index is only enforced if every prefix
    /// is covered by evidence").
    #[must_use]
    pub fn composite_unique_candidate(
        &self,
        table: &Coordinate,
        columns: &[String],
    ) -> Option<&CompositeUniqueCandidateProfile> {
        self.composite_unique_candidates
            .iter()
            .find(|profile| &profile.table == table && profile.columns == columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probe(status: ProbeStatus) -> Probe {
        Probe { status, sampling_size: None, captured_at: "2026-01-01T00:00:00Z".to_string() }
    }

    #[test]
    fn column_lookup_finds_matching_coordinate() {
        let snapshot = ProfileSnapshot {
            columns: vec![ColumnProfile {
                coordinate: Coordinate::member("dbo", "Customer", "Name"),
                row_count: 10,
                null_count: 0,
                probe: probe(ProbeStatus::Succeeded),
            }],
            ..ProfileSnapshot::default()
        };
        let found = snapshot.column(&Coordinate::member("dbo", "Customer", "Name"));
        assert!(found.is_some());
    }

    #[test]
    fn column_lookup_misses_unknown_coordinate() {
        let snapshot = ProfileSnapshot::default();
        assert!(snapshot.column(&Coordinate::member("dbo", "Customer", "Name")).is_none());
    }
}
