//! ProofMeet Crypto - Cryptographic primitives for sealed attendance records
//!
//! This crate provides:
//! - SHA-256 hashing of canonical projections
//! - The process-wide Ed25519 signing key (ledger blocks)
//! - Ephemeral per-act keypairs (card signatures)
//!
//! # Security Invariant
//!
//! **The process signing key is loaded once at startup and never leaves the
//! process.** Card-signature keypairs are generated per signing act and
//! discarded; only their public keys are persisted.

pub mod hash;
pub mod keys;
pub mod signature;

pub use hash::*;
pub use keys::*;
pub use signature::*;

use thiserror::Error;

/// Cryptographic errors
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Signing failed: {0}")]
    SigningFailed(String),

    #[error("Verification failed: {0}")]
    VerificationFailed(String),

    #[error("Invalid key format: {0}")]
    InvalidKeyFormat(String),

    #[error("Canonicalization failed: {0}")]
    CanonicalizationFailed(String),
}

pub type CryptoResult<T> = Result<T, CryptoError>;
