//! Hashing utilities for ProofMeet
//!
//! Ledger blocks and Court Cards are both hashes over *canonical
//! projections*: a serialized struct whose field order is fixed by its Rust
//! definition. Hashing the serialized form keeps the projection stable as
//! long as the projection type itself does not change.

use crate::{CryptoError, CryptoResult};
use sha2::{Digest, Sha256};

/// Compute SHA-256 hash of data
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Compute SHA-256 hash and return as hex string
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}

/// Hash a canonical projection.
///
/// The value is serialized with `serde_json`, which preserves struct field
/// declaration order. Callers must only pass dedicated projection structs,
/// never maps, so the byte stream is deterministic.
pub fn hash_canonical<T: serde::Serialize>(value: &T) -> CryptoResult<String> {
    let bytes = serde_json::to_vec(value)
        .map_err(|e| CryptoError::CanonicalizationFailed(e.to_string()))?;
    Ok(sha256_hex(&bytes))
}
