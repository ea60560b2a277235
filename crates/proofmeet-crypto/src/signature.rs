//! Digital signatures for ProofMeet

use crate::{keys::verifying_key_from_hex, CryptoError, CryptoResult, SigningKeypair};
use ed25519_dalek::{Signature as Ed25519Signature, Signer, Verifier};
use serde::{Deserialize, Serialize};

/// A detached signature over a block hash or card hash
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetachedSignature {
    /// Hex-encoded signature bytes
    pub signature: String,
    /// Hex-encoded public key of the signer
    pub public_key: String,
    /// Timestamp of signing (unix millis)
    pub signed_at: i64,
}

impl DetachedSignature {
    /// Sign a message with the given keypair
    pub fn sign(keypair: &SigningKeypair, message: &[u8]) -> CryptoResult<Self> {
        let signature = keypair
            .signing_key()
            .try_sign(message)
            .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;

        Ok(Self {
            signature: hex::encode(signature.to_bytes()),
            public_key: keypair.public_key_hex(),
            signed_at: chrono::Utc::now().timestamp_millis(),
        })
    }

    /// Verify the signature against a message
    pub fn verify(&self, message: &[u8]) -> CryptoResult<bool> {
        verify_hex_signature(&self.signature, &self.public_key, message)
    }
}

/// Verify a hex-encoded signature and public key against a message.
///
/// Returns `Ok(false)` for a well-formed signature that does not match;
/// errors only on malformed inputs.
pub fn verify_hex_signature(
    signature_hex: &str,
    public_key_hex: &str,
    message: &[u8],
) -> CryptoResult<bool> {
    let signature_bytes =
        hex::decode(signature_hex).map_err(|e| CryptoError::VerificationFailed(e.to_string()))?;

    let sig_array: [u8; 64] = signature_bytes
        .try_into()
        .map_err(|_| CryptoError::VerificationFailed("signature must be 64 bytes".to_string()))?;

    let signature = Ed25519Signature::from_bytes(&sig_array);
    let verifying_key = verifying_key_from_hex(public_key_hex)?;

    match verifying_key.verify(message, &signature) {
        Ok(()) => Ok(true),
        Err(_) => Ok(false),
    }
}

/// Sign a message with a single-use keypair.
///
/// Returns the hex signature and the hex public key; the private half is
/// dropped on return. This is the source-preserving behavior for
/// participant and host card signatures.
pub fn ephemeral_sign(message: &[u8]) -> CryptoResult<(String, String)> {
    let keypair = SigningKeypair::generate();
    let sig = DetachedSignature::sign(&keypair, message)?;
    Ok((sig.signature, sig.public_key))
}
