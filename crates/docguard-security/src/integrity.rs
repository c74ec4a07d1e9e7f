// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document integrity — canonical JSON (RFC 8785) and SHA-256 hashing.
//
// The document hash is the integrity anchor of a verification record, so it
// is always taken over the canonical form: object keys sorted, no
// insignificant whitespace, one number spelling.

use docguard_core::error::{DocguardError, Result};
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Length of the hash prefix embedded in QR payloads.
pub const QR_HASH_PREFIX_LEN: usize = 16;

/// Compute the SHA-256 hash of `data` and return it as a lowercase hex string.
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Canonical byte encoding of any serialisable value.
///
/// Identical logical content yields identical bytes regardless of the order
/// in which object fields were inserted.
pub fn canonical_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_jcs::to_vec(value).map_err(DocguardError::Serialization)
}

/// SHA-256 over the canonical encoding of `data`.
pub fn document_hash<T: Serialize>(data: &T) -> Result<String> {
    Ok(hash_bytes(&canonical_bytes(data)?))
}

/// First [`QR_HASH_PREFIX_LEN`] hex characters of a document hash.
pub fn hash_prefix(hash: &str) -> &str {
    hash.get(..QR_HASH_PREFIX_LEN).unwrap_or(hash)
}

/// Verify that `data` still hashes to `expected_hex`.
///
/// Returns `Err(DocguardError::IntegrityMismatch)` with both values when it
/// does not.
pub fn verify_document_hash<T: Serialize>(data: &T, expected_hex: &str) -> Result<()> {
    let actual = document_hash(data)?;
    if actual.eq_ignore_ascii_case(expected_hex) {
        Ok(())
    } else {
        Err(DocguardError::IntegrityMismatch {
            expected: expected_hex.to_owned(),
            actual,
        })
    }
}
