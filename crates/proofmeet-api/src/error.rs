//! API error handling
//!
//! Every caller-recoverable failure surfaces a stable error code; internal
//! failures surface a generic message and nothing else.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use proofmeet_types::ProofMeetError;

pub type ApiResult<T> = Result<T, ApiError>;

/// API-level error
#[derive(Debug)]
pub enum ApiError {
    /// Domain error with a stable code
    Domain(ProofMeetError),
    /// Missing or invalid credentials
    Unauthorized,
    /// Authenticated but not allowed
    Forbidden,
    /// Malformed request
    BadRequest(String),
    /// Anything else
    Internal,
}

/// Wire shape of an error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Domain(err) => match err {
                ProofMeetError::MeetingNotFound { .. }
                | ProofMeetError::ParticipantNotFound { .. }
                | ProofMeetError::RecordNotFound { .. }
                | ProofMeetError::CardNotFound { .. } => StatusCode::NOT_FOUND,
                ProofMeetError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
                ProofMeetError::NotOwner => StatusCode::FORBIDDEN,
                ProofMeetError::Crypto { .. } | ProofMeetError::Internal { .. } => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
                _ => StatusCode::BAD_REQUEST,
            },
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn response_body(&self) -> ErrorResponse {
        match self {
            Self::Domain(err) => {
                // Internal details never leave the process
                if self.status_code() == StatusCode::INTERNAL_SERVER_ERROR {
                    ErrorResponse {
                        code: "INTERNAL_ERROR".to_string(),
                        message: "internal error".to_string(),
                    }
                } else {
                    ErrorResponse {
                        code: err.error_code().to_string(),
                        message: err.to_string(),
                    }
                }
            }
            Self::Unauthorized => ErrorResponse {
                code: "UNAUTHORIZED".to_string(),
                message: "missing or invalid credentials".to_string(),
            },
            Self::Forbidden => ErrorResponse {
                code: "FORBIDDEN".to_string(),
                message: "not allowed".to_string(),
            },
            Self::BadRequest(message) => ErrorResponse {
                code: "INVALID_INPUT".to_string(),
                message: message.clone(),
            },
            Self::Internal => ErrorResponse {
                code: "INTERNAL_ERROR".to_string(),
                message: "internal error".to_string(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = ?self, "request failed");
        }
        (status, Json(self.response_body())).into_response()
    }
}

impl From<ProofMeetError> for ApiError {
    fn from(err: ProofMeetError) -> Self {
        Self::Domain(err)
    }
}

impl From<proofmeet_auth::AuthError> for ApiError {
    fn from(err: proofmeet_auth::AuthError) -> Self {
        use proofmeet_auth::AuthError;
        match err {
            AuthError::InvalidSession => Self::Unauthorized,
            AuthError::SignatureMismatch => Self::Unauthorized,
            AuthError::WeakPassword(message) => Self::BadRequest(message),
            AuthError::PasswordVerificationFailed | AuthError::PasswordHashingFailed => {
                Self::Internal
            }
            AuthError::Internal(_) => Self::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let err = ApiError::from(ProofMeetError::MeetingNotFound {
            meeting_id: "mtg_x".to_string(),
        });
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        let err = ApiError::from(ProofMeetError::AlreadyAttending {
            attendance_id: "att_x".to_string(),
        });
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err = ApiError::from(ProofMeetError::NotOwner);
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err = ApiError::from(ProofMeetError::internal("database table fell over"));
        let body = err.response_body();
        assert_eq!(body.code, "INTERNAL_ERROR");
        assert!(!body.message.contains("table"));
    }
}
