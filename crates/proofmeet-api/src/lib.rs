//! ProofMeet API - REST surface for the attendance lifecycle engine
//!
//! Three families of route:
//! - Participant API (bearer-token authenticated): join, leave,
//!   heartbeats, card self-sign
//! - Webhook intake (HMAC shared secret)
//! - Public verification and host attestation (no authentication)

pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;

/// Router-level configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub enable_cors: bool,
    pub enable_trace: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enable_cors: true,
            enable_trace: true,
        }
    }
}
