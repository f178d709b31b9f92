// tighten-core/src/hashing.rs
// ============================================================================
// Module: Fingerprinter (C3)
// Description: Stable canonical hashing for cache keys and emission fingerprints.
// Dependencies: serde, serde_jcs, sha2
// ============================================================================

//! ## Overview
//! Canonicalization follows RFC 8785 (JSON Canonicalization Scheme): object
//! keys are sorted lexicographically, `null` is rendered explicitly, and the
//! output is UTF-8 with LF line endings. A SHA-256 digest of the canonical
//! bytes is the fingerprint used for cache keys, manifest fingerprints, and
//! module-selection normalization hashes (`spec.md` §4.3).

use serde::Deserialize;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;
use thiserror::Error;

/// Supported fingerprint algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashAlgorithm {
    /// SHA-256.
    Sha256,
}

/// The algorithm used unless a caller overrides it.
pub const DEFAULT_HASH_ALGORITHM: HashAlgorithm = HashAlgorithm::Sha256;

/// A hex-encoded content digest, tagged with its algorithm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fingerprint {
    /// Algorithm used to produce `value`.
    pub algorithm: HashAlgorithm,
    /// Lowercase hex-encoded digest.
    pub value: String,
}

impl Fingerprint {
    /// Builds a fingerprint from raw bytes.
    #[must_use]
    pub fn new(algorithm: HashAlgorithm, bytes: &[u8]) -> Self {
        let value = match algorithm {
            HashAlgorithm::Sha256 => hex_encode(Sha256::digest(bytes).as_slice()),
        };
        Self { algorithm, value }
    }

    /// A stable sentinel fingerprint used when an optional input is absent
    /// (`spec.md` §4.4: "absent inputs contribute a stable sentinel").
    #[must_use]
    pub fn absent_sentinel(algorithm: HashAlgorithm) -> Self {
        Self::new(algorithm, b"tighten.absent-input.v1")
    }
}

/// Errors raised while canonicalizing or hashing a value.
#[derive(Debug, Error)]
pub enum HashError {
    /// JSON canonicalization failed.
    #[error("failed to canonicalize json: {0}")]
    Canonicalization(String),
}

/// Renders a serializable value as RFC 8785 canonical JSON bytes.
///
/// # Errors
///
/// Returns [`HashError`] when the value cannot be canonicalized.
pub fn canonical_json_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, HashError> {
    serde_jcs::to_vec(value).map_err(|err| HashError::Canonicalization(err.to_string()))
}

/// Hashes a serializable value via its canonical JSON representation.
///
/// # Errors
///
/// Returns [`HashError`] when the value cannot be canonicalized.
pub fn hash_canonical_json<T: Serialize + ?Sized>(
    algorithm: HashAlgorithm,
    value: &T,
) -> Result<Fingerprint, HashError> {
    let bytes = canonical_json_bytes(value)?;
    Ok(Fingerprint::new(algorithm, &bytes))
}

/// Hashes raw bytes directly (no canonicalization).
#[must_use]
pub fn hash_bytes(algorithm: HashAlgorithm, bytes: &[u8]) -> Fingerprint {
    Fingerprint::new(algorithm, bytes)
}

/// Hashes the ordered concatenation of a sequence of fingerprints, used to
/// derive a single key from several independent content hashes (`spec.md`
/// §4.4: "SHA-256 of the canonical concatenation of… content hashes").
#[must_use]
pub fn hash_concat(algorithm: HashAlgorithm, parts: &[&Fingerprint]) -> Fingerprint {
    let mut buf = Vec::new();
    for part in parts {
        buf.extend_from_slice(part.value.as_bytes());
        buf.push(b'\n');
    }
    Fingerprint::new(algorithm, &buf)
}

/// Normalizes line endings to LF before canonicalization, matching the
/// "normalize line endings to LF" rule from `spec.md` §4.3. Callers hashing
/// raw text (rather than structured JSON) should pass text through this
/// first.
#[must_use]
pub fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

fn hex_encode(bytes: &[u8]) -> String {
    const LUT: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(LUT[(byte >> 4) as usize] as char);
        out.push(LUT[(byte & 0x0f) as usize] as char);
    }
    out
}
