// tighten-cache/src/lib.rs
// ============================================================================
// Module: Tighten Cache
// Description: Content-addressed evidence cache with create/reuse/refresh
// decisions (C4).
// Purpose: Memoize a run's artifacts and manifest, keyed by the full set of
// inputs, so identical requests skip re-emission.
// Dependencies: tighten-core, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! `tighten-cache` persists a run's manifest and artifact copies under
//! `<root>/<key>/` (`spec.md` §4.4, §6), versioned by a content-derived
//! `key` rather than a `SQLite` row id — the same versioned/hash-verify
//! idiom a `SQLite`-backed store would use, adapted to a directory tree
//! behind [`tighten_core::filesystem::FileSystem`].

pub mod error;
pub mod key;
pub mod store;

pub use error::CacheError;
pub use key::CacheKeyInputs;
pub use key::derive_cache_key;
pub use store::ArtifactCopy;
pub use store::CacheDecision;
pub use store::CacheRequest;
pub use store::CacheResult;
pub use store::EvidenceCache;
pub use store::ManifestArtifact;
pub use store::RefreshReason;
pub use store::RunManifest;
