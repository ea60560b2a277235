//! Key management for ProofMeet
//!
//! One `SigningKeypair` is loaded at process startup and shared (immutably)
//! by every finalization; it signs ledger block hashes. Ephemeral keypairs
//! for card signatures are minted through the same type and dropped after
//! one use.

use crate::{CryptoError, CryptoResult};
use ed25519_dalek::{SigningKey, VerifyingKey};
use rand::rngs::OsRng;

/// An Ed25519 key pair for signing operations
#[derive(Clone)]
pub struct SigningKeypair {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
}

impl SigningKeypair {
    /// Generate a new random key pair
    pub fn generate() -> Self {
        let mut csprng = OsRng;
        let signing_key = SigningKey::generate(&mut csprng);
        let verifying_key = signing_key.verifying_key();
        Self {
            signing_key,
            verifying_key,
        }
    }

    /// Create from a 32-byte seed (the persisted process key)
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(seed);
        let verifying_key = signing_key.verifying_key();
        Self {
            signing_key,
            verifying_key,
        }
    }

    /// Create from a hex-encoded 32-byte seed
    pub fn from_seed_hex(seed_hex: &str) -> CryptoResult<Self> {
        let bytes = hex::decode(seed_hex.trim())
            .map_err(|e| CryptoError::InvalidKeyFormat(e.to_string()))?;
        let seed: [u8; 32] = bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidKeyFormat("seed must be 32 bytes".to_string()))?;
        Ok(Self::from_seed(&seed))
    }

    /// Get the signing key (private - never expose!)
    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }

    /// Get the verifying key (public)
    pub fn verifying_key(&self) -> &VerifyingKey {
        &self.verifying_key
    }

    /// Get the public key as hex string
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.verifying_key.as_bytes())
    }

    /// Get the seed bytes (for secure storage only!)
    pub fn seed_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }
}

/// Parse a hex-encoded Ed25519 public key
pub fn verifying_key_from_hex(key_hex: &str) -> CryptoResult<VerifyingKey> {
    let bytes = hex::decode(key_hex).map_err(|e| CryptoError::InvalidKeyFormat(e.to_string()))?;
    let key_bytes: [u8; 32] = bytes
        .try_into()
        .map_err(|_| CryptoError::InvalidKeyFormat("public key must be 32 bytes".to_string()))?;
    VerifyingKey::from_bytes(&key_bytes).map_err(|e| CryptoError::InvalidKeyFormat(e.to_string()))
}
