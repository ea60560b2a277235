//! Session tokens
//!
//! Opaque URL-safe tokens minted for participants. Only the SHA-256 hash
//! of a token is stored; presenting the raw token authenticates the
//! participant until expiry.

use std::collections::HashMap;
use std::sync::Arc;

use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;

use proofmeet_types::ParticipantId;

use crate::{AuthError, AuthResult};

const TOKEN_BYTES: usize = 32;

/// A live session
#[derive(Debug, Clone)]
pub struct Session {
    pub participant_id: ParticipantId,
    pub token_hash: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Issues and validates opaque bearer tokens
#[derive(Clone)]
pub struct SessionService {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    lifetime: Duration,
}

impl SessionService {
    pub fn new(lifetime: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            lifetime,
        }
    }

    /// Mint a session for a participant; returns the raw token exactly once
    pub async fn issue(&self, participant_id: ParticipantId) -> String {
        let token = generate_token();
        let now = Utc::now();
        let session = Session {
            participant_id,
            token_hash: hash_token(&token),
            created_at: now,
            expires_at: now + self.lifetime,
        };
        self.sessions
            .write()
            .await
            .insert(session.token_hash.clone(), session);
        token
    }

    /// Resolve a raw token to the participant it authenticates
    pub async fn authenticate(&self, token: &str) -> AuthResult<ParticipantId> {
        let hash = hash_token(token);
        let sessions = self.sessions.read().await;
        match sessions.get(&hash) {
            Some(session) if session.expires_at > Utc::now() => {
                Ok(session.participant_id.clone())
            }
            _ => Err(AuthError::InvalidSession),
        }
    }

    /// Drop a session (logout)
    pub async fn revoke(&self, token: &str) {
        self.sessions.write().await.remove(&hash_token(token));
    }

    /// Remove expired sessions; returns how many were dropped
    pub async fn cleanup_expired(&self) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.expires_at > now);
        before - sessions.len()
    }
}

impl Default for SessionService {
    fn default() -> Self {
        Self::new(Duration::hours(12))
    }
}

/// Generate a cryptographically secure session token
fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Hash a token for storage (never store plain tokens)
fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
