// tighten-artifacts/src/opportunities.rs
// ============================================================================
// Module: Opportunities report rendering (spec.md §4.10, §8 law 6)
// ============================================================================

//! ## Overview
//! Renders `safe-to-apply.sql` and `needs-remediation.sql`: each opportunity
//! becomes one batch preceded by its `-- Evidence: …` comment lines, sorted
//! lexicographically so "sorting the evidence lines within each batch yields
//! an equivalent script under the emitter's own normalization" (`spec.md`
//! §8, law 6) — the lines are already in normalized order the first time
//! they're written.

use tighten_core::decisions::Opportunity;
use tighten_core::decisions::OpportunitiesReport;

/// Renders one SQL batch file from a list of opportunities, in the order
/// given (callers pass an already coordinate-sorted list).
#[must_use]
pub fn render_batch(findings: &[Opportunity]) -> String {
    let mut sql = String::new();
    for finding in findings {
        let mut evidence = finding.evidence.clone();
        evidence.sort();
        for line in &evidence {
            sql.push_str("-- Evidence: ");
            sql.push_str(line);
            sql.push('\n');
        }
        sql.push_str(&finding.sql);
        sql.push('\n');
    }
    sql
}

/// Renders the `safe-to-apply.sql` batch.
#[must_use]
pub fn render_safe_to_apply(report: &OpportunitiesReport) -> String {
    render_batch(&report.safe_to_apply)
}

/// Renders the `needs-remediation.sql` batch.
#[must_use]
pub fn render_needs_remediation(report: &OpportunitiesReport) -> String {
    render_batch(&report.needs_remediation)
}

#[cfg(test)]
mod tests {
    use tighten_core::decisions::Disposition;
    use tighten_core::decisions::OpportunityCategory;
    use tighten_core::decisions::RiskLevel;
    use tighten_core::identifiers::Coordinate;

    use super::*;

    fn finding(evidence: Vec<&str>) -> Opportunity {
        Opportunity {
            coordinate: Coordinate::member("dbo", "Customer", "Name"),
            disposition: Disposition::SafeToApply,
            category: OpportunityCategory::Improvement,
            kind: "nullability".to_string(),
            risk: RiskLevel::Low,
            message: "test".to_string(),
            sql: "ALTER TABLE [dbo].[Customer] ALTER COLUMN [Name] NOT NULL;".to_string(),
            evidence: evidence.into_iter().map(str::to_string).collect(),
        }
    }

    #[test]
    fn evidence_lines_are_sorted_before_rendering() {
        let batch = render_batch(&[finding(vec!["z.line", "a.line"])]);
        let a_index = batch.find("a.line").unwrap();
        let z_index = batch.find("z.line").unwrap();
        assert!(a_index < z_index);
    }

    #[test]
    fn sql_follows_its_evidence_comments() {
        let batch = render_batch(&[finding(vec!["rationale=evidence.confirmed"])]);
        assert_eq!(
            batch,
            "-- Evidence: rationale=evidence.confirmed\nALTER TABLE [dbo].[Customer] ALTER COLUMN [Name] NOT NULL;\n"
        );
    }

    #[test]
    fn rendering_is_idempotent_under_its_own_normalization() {
        let findings = vec![finding(vec!["b", "a"])];
        let once = render_batch(&findings);
        let resorted: Vec<Opportunity> = findings
            .into_iter()
            .map(|mut finding| {
                finding.evidence.sort();
                finding
            })
            .collect();
        let twice = render_batch(&resorted);
        assert_eq!(once, twice);
    }
}
