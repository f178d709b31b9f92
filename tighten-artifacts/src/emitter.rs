// tighten-artifacts/src/emitter.rs
// ============================================================================
// Module: Artifact emitter (C10)
// ============================================================================

//! ## Overview
//! [`emit`] writes every artifact `spec.md` §4.10 names: one SQL file per
//! table, `manifest.json`, `policy-decisions.json`, `opportunities.json`,
//! `safe-to-apply.sql`, `needs-remediation.sql`, and optional static-entity
//! seed files. Every write goes through
//! [`tighten_core::filesystem::FileSystem::write_atomic`]; given identical
//! inputs the emitter produces byte-identical outputs (`spec.md` §4.10,
//! §8 law 1).

use std::collections::BTreeSet;
use std::path::Path;

use tighten_core::decisions::OpportunitiesReport;
use tighten_core::decisions::PolicyDecisionReport;
use tighten_core::filesystem::FileSystem;
use tighten_core::hashing::Fingerprint;
use tighten_core::hashing::HashAlgorithm;
use tighten_core::hashing::hash_bytes;
use tighten_core::relational::EmissionCoverage;
use tighten_core::relational::RelationalModel;

use crate::error::EmitError;
use crate::manifest::EmissionManifest;
use crate::manifest::EmittedArtifact;
use crate::manifest::table_coverage;
use crate::opportunities::render_needs_remediation;
use crate::opportunities::render_safe_to_apply;
use crate::sanitize::seed_relative_path;
use crate::sanitize::table_relative_path;
use crate::seeds::SeedGenerator;
use crate::sql::render_table;

/// Everything the emitter needs beyond the relational model itself.
pub struct EmissionInputs<'a> {
    /// The resolved relational model to render.
    pub relational: &'a RelationalModel,
    /// The policy decision rollup (`policy-decisions.json`).
    pub decision_report: &'a PolicyDecisionReport,
    /// The opportunities report (`opportunities.json` and the two SQL
    /// batches).
    pub opportunities: &'a OpportunitiesReport,
    /// Entity inclusion/exclusion coverage from the relational model
    /// factory.
    pub coverage: EmissionCoverage,
    /// Canonical fingerprint over the relational model, embedded in the
    /// manifest.
    pub fingerprint: Fingerprint,
    /// Unsupported constructs encountered upstream (e.g. indexes with
    /// computed fill factors), carried through verbatim.
    pub unsupported: Vec<String>,
}

/// What the emitter wrote, for the orchestrator to return verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmissionResult {
    /// The manifest describing every artifact written.
    pub manifest: EmissionManifest,
    /// Relative paths of per-table SQL files, in emission order.
    pub table_paths: Vec<String>,
    /// Relative paths of static-entity seed SQL files, in emission order.
    pub seed_paths: Vec<String>,
}

/// Writes every artifact for one run to `output_dir`.
///
/// # Errors
///
/// Returns [`EmitError::PathCollision`] when two outputs sanitize to the
/// same relative path, and [`EmitError::FileSystem`] when a write fails.
pub fn emit(
    filesystem: &dyn FileSystem,
    output_dir: &Path,
    inputs: &EmissionInputs<'_>,
    seed_generator: &dyn SeedGenerator,
) -> Result<EmissionResult, EmitError> {
    let mut seen_paths: BTreeSet<String> = BTreeSet::new();
    let mut artifacts = Vec::new();
    let mut table_paths = Vec::new();
    let mut seed_paths = Vec::new();

    for table in &inputs.relational.tables {
        let relative_path = table_relative_path(&table.module, &table.schema, &table.physical_name);
        claim_path(&mut seen_paths, &relative_path)?;
        let sql = render_table(table);
        write_tracked(filesystem, output_dir, &relative_path, sql.as_bytes(), "table", &mut artifacts)?;
        table_paths.push(relative_path);

        if table.is_static {
            if let Some(seed_sql) = seed_generator.generate(table) {
                let seed_path = seed_relative_path(&table.module, &table.schema, &table.physical_name);
                claim_path(&mut seen_paths, &seed_path)?;
                write_tracked(filesystem, output_dir, &seed_path, seed_sql.as_bytes(), "seed", &mut artifacts)?;
                seed_paths.push(seed_path);
            }
        }
    }

    let policy_decisions_json = serde_json::to_vec_pretty(inputs.decision_report)
        .map_err(|err| EmitError::Serialization(err.to_string()))?;
    write_tracked(filesystem, output_dir, "policy-decisions.json", &policy_decisions_json, "report", &mut artifacts)?;

    let opportunities_json = serde_json::to_vec_pretty(inputs.opportunities)
        .map_err(|err| EmitError::Serialization(err.to_string()))?;
    write_tracked(filesystem, output_dir, "opportunities.json", &opportunities_json, "report", &mut artifacts)?;

    let safe_to_apply = render_safe_to_apply(inputs.opportunities);
    write_tracked(filesystem, output_dir, "safe-to-apply.sql", safe_to_apply.as_bytes(), "report", &mut artifacts)?;

    let needs_remediation = render_needs_remediation(inputs.opportunities);
    write_tracked(filesystem, output_dir, "needs-remediation.sql", needs_remediation.as_bytes(), "report", &mut artifacts)?;

    let manifest = EmissionManifest {
        fingerprint: inputs.fingerprint.clone(),
        artifacts,
        table_coverage: table_coverage(inputs.relational, inputs.opportunities),
        coverage: inputs.coverage.clone(),
        unsupported: inputs.unsupported.clone(),
        pre_remediation_count: inputs.opportunities.needs_remediation.len(),
    };
    let manifest_json = serde_json::to_vec_pretty(&manifest).map_err(|err| EmitError::Serialization(err.to_string()))?;
    filesystem.write_atomic(&output_dir.join("manifest.json"), &manifest_json)?;

    Ok(EmissionResult { manifest, table_paths, seed_paths })
}

fn claim_path(seen: &mut BTreeSet<String>, relative_path: &str) -> Result<(), EmitError> {
    if !seen.insert(relative_path.to_string()) {
        return Err(EmitError::PathCollision(relative_path.to_string()));
    }
    Ok(())
}

fn write_tracked(
    filesystem: &dyn FileSystem,
    output_dir: &Path,
    relative_path: &str,
    bytes: &[u8],
    kind: &str,
    artifacts: &mut Vec<EmittedArtifact>,
) -> Result<(), EmitError> {
    filesystem.write_atomic(&output_dir.join(relative_path), bytes)?;
    artifacts.push(EmittedArtifact {
        relative_path: relative_path.to_string(),
        kind: kind.to_string(),
        sha256: hash_bytes(HashAlgorithm::Sha256, bytes).value,
        size_bytes: u64::try_from(bytes.len()).unwrap_or(u64::MAX),
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use tighten_core::filesystem::InMemoryFileSystem;

    use crate::seeds::NoSeedGenerator;

    use super::*;

    fn sample_relational() -> RelationalModel {
        RelationalModel {
            tables: vec![tighten_core::relational::Table {
                module: "AppCore".to_string(),
                schema: "dbo".to_string(),
                physical_name: "Customer".to_string(),
                logical_name: "Customer".to_string(),
                description: None,
                columns: vec![],
                indexes: vec![],
                foreign_keys: vec![],
                triggers: vec![],
                is_static: false,
            }],
        }
    }

    #[test]
    fn emits_one_sql_file_per_table_plus_reports() {
        let filesystem = InMemoryFileSystem::new();
        let relational = sample_relational();
        let inputs = EmissionInputs {
            relational: &relational,
            decision_report: &PolicyDecisionReport::default(),
            opportunities: &OpportunitiesReport::default(),
            coverage: EmissionCoverage::default(),
            fingerprint: Fingerprint::new(HashAlgorithm::Sha256, b"test"),
            unsupported: vec![],
        };
        let result = emit(&filesystem, &PathBuf::from("/out"), &inputs, &NoSeedGenerator)
            .unwrap_or_else(|_| panic!("emit should succeed"));
        assert_eq!(result.table_paths, vec!["Modules/AppCore/dbo.Customer.sql".to_string()]);
        assert!(filesystem.exists(&PathBuf::from("/out/manifest.json")));
        assert!(filesystem.exists(&PathBuf::from("/out/policy-decisions.json")));
        assert!(filesystem.exists(&PathBuf::from("/out/opportunities.json")));
        assert!(filesystem.exists(&PathBuf::from("/out/safe-to-apply.sql")));
        assert!(filesystem.exists(&PathBuf::from("/out/needs-remediation.sql")));
    }

    #[test]
    fn colliding_sanitized_paths_fail() {
        let filesystem = InMemoryFileSystem::new();
        let mut relational = sample_relational();
        let duplicate = relational.tables[0].clone();
        relational.tables.push(duplicate);
        let inputs = EmissionInputs {
            relational: &relational,
            decision_report: &PolicyDecisionReport::default(),
            opportunities: &OpportunitiesReport::default(),
            coverage: EmissionCoverage::default(),
            fingerprint: Fingerprint::new(HashAlgorithm::Sha256, b"test"),
            unsupported: vec![],
        };
        let result = emit(&filesystem, &PathBuf::from("/out"), &inputs, &NoSeedGenerator);
        let Err(error) = result else { panic!("expected a path collision error") };
        assert_eq!(error.code(), "emission.pathCollision");
    }

    #[test]
    fn static_table_with_seed_generator_writes_seed_file() {
        struct AlwaysSeed;
        impl SeedGenerator for AlwaysSeed {
            fn generate(&self, _table: &tighten_core::relational::Table) -> Option<String> {
                Some("INSERT INTO [dbo].[Customer] DEFAULT VALUES;".to_string())
            }
        }

        let filesystem = InMemoryFileSystem::new();
        let mut relational = sample_relational();
        relational.tables[0].is_static = true;
        let inputs = EmissionInputs {
            relational: &relational,
            decision_report: &PolicyDecisionReport::default(),
            opportunities: &OpportunitiesReport::default(),
            coverage: EmissionCoverage::default(),
            fingerprint: Fingerprint::new(HashAlgorithm::Sha256, b"test"),
            unsupported: vec![],
        };
        let result = emit(&filesystem, &PathBuf::from("/out"), &inputs, &AlwaysSeed)
            .unwrap_or_else(|_| panic!("emit should succeed"));
        assert_eq!(result.seed_paths, vec!["Seeds/AppCore/dbo.Customer.sql".to_string()]);
    }
}
