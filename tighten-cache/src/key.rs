// tighten-cache/src/key.rs
// ============================================================================
// Module: Cache key derivation (C4)
// ============================================================================

//! ## Overview
//! `spec.md` §4.4: "SHA-256 of the canonical concatenation of command name,
//! content hashes of model/profile/DMM/config inputs (absent inputs
//! contribute a stable sentinel), and the sorted metadata map (including
//! normalized module selection)". [`BTreeMap`] keeps the metadata map sorted
//! by construction; [`derive_cache_key`] folds the content-bearing parts
//! through [`tighten_core::hashing::hash_concat`] in a fixed order so the
//! same inputs always produce the same key.
//!
//! Module selection and metadata are deliberately **excluded** from the key
//! itself: the key names the directory a manifest is read from, and step 5
//! of the evaluation protocol (`spec.md` §4.4) needs to compare a *persisted*
//! module-selection hash and metadata map against the *requested* ones at
//! that same directory. Folding them into the key would route any change in
//! either straight to a brand-new, nonexistent directory — a `Created`
//! result — and the comparison in [`crate::store`] would never run. Both
//! still travel on [`CacheKeyInputs`] for that comparison and for the
//! persisted manifest's `moduleSelection`/`metadata` fields.

use std::collections::BTreeMap;

use tighten_core::hashing::Fingerprint;
use tighten_core::hashing::HashAlgorithm;
use tighten_core::hashing::hash_bytes;
use tighten_core::hashing::hash_canonical_json;
use tighten_core::hashing::hash_concat;

/// The full set of inputs that participate in a cache key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKeyInputs {
    /// The pipeline command name (`BuildSsdt`, `DmmCompare`, …).
    pub command: String,
    /// Content hash of the filtered model, if derived yet.
    pub model_hash: Option<Fingerprint>,
    /// Content hash of the profile snapshot.
    pub profile_hash: Option<Fingerprint>,
    /// Content hash of a DMM-compare reference script, when present.
    pub dmm_hash: Option<Fingerprint>,
    /// Content hash of the resolved options record.
    pub config_hash: Option<Fingerprint>,
    /// Normalized (sorted, deduped) module selection names. Compared
    /// against the persisted manifest at step 5, not part of the key.
    pub module_selection: Vec<String>,
    /// Arbitrary sorted metadata. Compared against the persisted manifest
    /// at step 5, not part of the key.
    pub metadata: BTreeMap<String, String>,
}

/// Derives the content-addressed cache key for a request.
#[must_use]
pub fn derive_cache_key(inputs: &CacheKeyInputs, algorithm: HashAlgorithm) -> Fingerprint {
    let command_hash = hash_bytes(algorithm, inputs.command.as_bytes());
    let model_hash = inputs.model_hash.clone().unwrap_or_else(|| Fingerprint::absent_sentinel(algorithm));
    let profile_hash = inputs.profile_hash.clone().unwrap_or_else(|| Fingerprint::absent_sentinel(algorithm));
    let dmm_hash = inputs.dmm_hash.clone().unwrap_or_else(|| Fingerprint::absent_sentinel(algorithm));
    let config_hash = inputs.config_hash.clone().unwrap_or_else(|| Fingerprint::absent_sentinel(algorithm));

    hash_concat(algorithm, &[&command_hash, &model_hash, &profile_hash, &dmm_hash, &config_hash])
}

/// Derives the normalized module-selection hash alone, embedded in the
/// persisted manifest's `moduleSelection.hash` field (`spec.md` §6).
#[must_use]
pub fn module_selection_hash(modules: &[String], algorithm: HashAlgorithm) -> Fingerprint {
    hash_canonical_json(algorithm, modules).unwrap_or_else(|_| Fingerprint::absent_sentinel(algorithm))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_inputs() -> CacheKeyInputs {
        CacheKeyInputs {
            command: "BuildSsdt".to_string(),
            model_hash: Some(Fingerprint::new(HashAlgorithm::Sha256, b"model")),
            profile_hash: Some(Fingerprint::new(HashAlgorithm::Sha256, b"profile")),
            dmm_hash: None,
            config_hash: Some(Fingerprint::new(HashAlgorithm::Sha256, b"config")),
            module_selection: vec!["AppCore".to_string()],
            metadata: BTreeMap::new(),
        }
    }

    #[test]
    fn identical_inputs_produce_identical_keys() {
        let key_a = derive_cache_key(&base_inputs(), HashAlgorithm::Sha256);
        let key_b = derive_cache_key(&base_inputs(), HashAlgorithm::Sha256);
        assert_eq!(key_a, key_b);
    }

    #[test]
    fn changing_command_name_changes_key() {
        let mut other = base_inputs();
        other.command = "DmmCompare".to_string();
        assert_ne!(derive_cache_key(&base_inputs(), HashAlgorithm::Sha256), derive_cache_key(&other, HashAlgorithm::Sha256));
    }

    #[test]
    fn changing_metadata_does_not_change_key() {
        let mut other = base_inputs();
        other.metadata.insert("policy.mode".to_string(), "aggressive".to_string());
        assert_eq!(derive_cache_key(&base_inputs(), HashAlgorithm::Sha256), derive_cache_key(&other, HashAlgorithm::Sha256));
    }

    #[test]
    fn changing_module_selection_does_not_change_key() {
        let mut other = base_inputs();
        other.module_selection = vec!["AppCore".to_string(), "Ops".to_string()];
        assert_eq!(derive_cache_key(&base_inputs(), HashAlgorithm::Sha256), derive_cache_key(&other, HashAlgorithm::Sha256));
    }

    #[test]
    fn absent_input_uses_stable_sentinel_not_changing_between_runs() {
        let mut a = base_inputs();
        a.dmm_hash = None;
        let mut b = base_inputs();
        b.dmm_hash = None;
        assert_eq!(derive_cache_key(&a, HashAlgorithm::Sha256), derive_cache_key(&b, HashAlgorithm::Sha256));
    }
}
