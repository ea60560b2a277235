//! Application state shared across handlers

use proofmeet_auth::{PasswordService, SessionService, WebhookVerifier};
use proofmeet_engine::AttendanceEngine;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// The attendance lifecycle engine
    pub engine: AttendanceEngine,
    /// Participant session tokens
    pub sessions: SessionService,
    /// Password re-verification for card self-sign
    pub passwords: PasswordService,
    /// Webhook shared-secret verification
    pub webhook: WebhookVerifier,
}

impl AppState {
    pub fn new(
        engine: AttendanceEngine,
        sessions: SessionService,
        passwords: PasswordService,
        webhook: WebhookVerifier,
    ) -> Self {
        Self {
            engine,
            sessions,
            passwords,
            webhook,
        }
    }
}
