//! ProofMeet Auth - authentication plumbing for the attendance service
//!
//! Three concerns live here:
//! - Argon2id password verification (participant self-sign re-checks)
//! - Opaque session tokens, SHA-256-hashed at rest
//! - Webhook HMAC-SHA256 verification with constant-time comparison
//!
//! Registration and login UIs are external; this crate only verifies what
//! they stored.

pub mod password;
pub mod session;
pub mod webhook;

pub use password::PasswordService;
pub use session::{Session, SessionService};
pub use webhook::WebhookVerifier;

use thiserror::Error;

/// Authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Password hashing failed")]
    PasswordHashingFailed,

    #[error("Password verification failed")]
    PasswordVerificationFailed,

    #[error("Password too weak: {0}")]
    WeakPassword(String),

    #[error("Session token invalid or expired")]
    InvalidSession,

    #[error("Webhook signature mismatch")]
    SignatureMismatch,

    #[error("Internal auth error: {0}")]
    Internal(String),
}

pub type AuthResult<T> = Result<T, AuthError>;
