// tighten-artifacts/src/manifest.rs
// ============================================================================
// Module: Emission manifest (spec.md §4.10)
// ============================================================================

//! ## Overview
//! "`manifest.json` listing every table file, index file, and per-table
//! predicate-coverage indicator; includes coverage summary,
//! `emission.fingerprint`, unsupported-list, pre-remediation entries"
//! (`spec.md` §4.10).

use serde::Deserialize;
use serde::Serialize;

use tighten_core::decisions::OpportunitiesReport;
use tighten_core::hashing::Fingerprint;
use tighten_core::relational::EmissionCoverage;
use tighten_core::relational::RelationalModel;

/// One artifact file the emitter wrote, recorded in the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmittedArtifact {
    /// Path relative to the output directory.
    #[serde(rename = "relativePath")]
    pub relative_path: String,
    /// Short kind tag (`table`, `seed`, `report`).
    #[serde(rename = "type")]
    pub kind: String,
    /// Lowercase hex SHA-256 of the file contents.
    pub sha256: String,
    /// File size in bytes.
    #[serde(rename = "sizeBytes")]
    pub size_bytes: u64,
}

/// Whether a table's tightening decisions were backed by evidence covering
/// every predicate the policy considered for it (`spec.md` §4.10 "per-table
/// predicate-coverage indicator").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredicateCoverage {
    /// Every nullability/unique-index/foreign-key predicate for this table
    /// was decided from `evidence.confirmed` rationale.
    Full,
    /// At least one predicate was decided under missing or tolerated
    /// evidence.
    Partial,
    /// No predicate for this table carried confirmed evidence.
    None,
}

/// Per-table predicate-coverage entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableCoverageEntry {
    /// Table schema.
    pub schema: String,
    /// Table physical name.
    pub table: String,
    /// Coverage indicator for this table.
    pub coverage: PredicateCoverage,
}

/// The manifest written alongside every emitted artifact set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmissionManifest {
    /// Canonical fingerprint over the relational model that produced this
    /// emission (`spec.md` §4.3 "emission fingerprint embedded in the
    /// manifest").
    #[serde(rename = "emission.fingerprint")]
    pub fingerprint: Fingerprint,
    /// Every artifact file written, in emission order.
    pub artifacts: Vec<EmittedArtifact>,
    /// Per-table predicate-coverage indicators.
    #[serde(rename = "tableCoverage")]
    pub table_coverage: Vec<TableCoverageEntry>,
    /// Entity inclusion/exclusion summary from the relational model factory.
    pub coverage: EmissionCoverage,
    /// Unsupported constructs encountered while projecting the relational
    /// model (e.g. indexes with computed fill factors).
    pub unsupported: Vec<String>,
    /// Count of opportunities that still need data remediation before they
    /// can be applied.
    #[serde(rename = "preRemediationCount")]
    pub pre_remediation_count: usize,
}

/// Derives per-table predicate-coverage indicators from the relational model
/// and the opportunities report: a table with no safe-to-apply or
/// needs-remediation findings at all reports `Full`; a table with only
/// needs-remediation findings reports `None`; anything mixed reports
/// `Partial`.
#[must_use]
pub fn table_coverage(relational: &RelationalModel, opportunities: &OpportunitiesReport) -> Vec<TableCoverageEntry> {
    relational
        .tables
        .iter()
        .map(|table| {
            let has_safe = opportunities.safe_to_apply.iter().any(|finding| finding.coordinate.table == table.physical_name);
            let has_remediation =
                opportunities.needs_remediation.iter().any(|finding| finding.coordinate.table == table.physical_name);
            let coverage = match (has_safe, has_remediation) {
                (false, false) => PredicateCoverage::Full,
                (true, false) => PredicateCoverage::Full,
                (false, true) => PredicateCoverage::None,
                (true, true) => PredicateCoverage::Partial,
            };
            TableCoverageEntry { schema: table.schema.clone(), table: table.physical_name.clone(), coverage }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use tighten_core::decisions::Disposition;
    use tighten_core::decisions::Opportunity;
    use tighten_core::decisions::OpportunityCategory;
    use tighten_core::decisions::RiskLevel;
    use tighten_core::identifiers::Coordinate;
    use tighten_core::relational::Table;

    use super::*;

    fn table(name: &str) -> Table {
        Table {
            module: "AppCore".to_string(),
            schema: "dbo".to_string(),
            physical_name: name.to_string(),
            logical_name: name.to_string(),
            description: None,
            columns: vec![],
            indexes: vec![],
            foreign_keys: vec![],
            triggers: vec![],
            is_static: false,
        }
    }

    fn opportunity(table: &str, disposition: Disposition) -> Opportunity {
        Opportunity {
            coordinate: Coordinate::member("dbo", table, "Name"),
            disposition,
            category: OpportunityCategory::Improvement,
            kind: "nullability".to_string(),
            risk: RiskLevel::Low,
            message: "test".to_string(),
            sql: String::new(),
            evidence: vec![],
        }
    }

    #[test]
    fn table_with_no_findings_is_fully_covered() {
        let relational = RelationalModel { tables: vec![table("Customer")] };
        let opportunities = OpportunitiesReport::default();
        let coverage = table_coverage(&relational, &opportunities);
        assert_eq!(coverage[0].coverage, PredicateCoverage::Full);
    }

    #[test]
    fn table_with_only_remediation_findings_is_uncovered() {
        let relational = RelationalModel { tables: vec![table("Customer")] };
        let opportunities = OpportunitiesReport {
            safe_to_apply: vec![],
            needs_remediation: vec![opportunity("Customer", Disposition::NeedsRemediation)],
        };
        let coverage = table_coverage(&relational, &opportunities);
        assert_eq!(coverage[0].coverage, PredicateCoverage::None);
    }

    #[test]
    fn table_with_mixed_findings_is_partial() {
        let relational = RelationalModel { tables: vec![table("Customer")] };
        let opportunities = OpportunitiesReport {
            safe_to_apply: vec![opportunity("Customer", Disposition::SafeToApply)],
            needs_remediation: vec![opportunity("Customer", Disposition::NeedsRemediation)],
        };
        let coverage = table_coverage(&relational, &opportunities);
        assert_eq!(coverage[0].coverage, PredicateCoverage::Partial);
    }
}
