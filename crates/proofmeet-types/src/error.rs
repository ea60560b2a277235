//! Error types for ProofMeet
//!
//! Every caller-recoverable failure carries a stable error code that the
//! API layer surfaces verbatim.

use thiserror::Error;

/// Result type for ProofMeet operations
pub type Result<T> = std::result::Result<T, ProofMeetError>;

/// ProofMeet error types
#[derive(Debug, Clone, Error)]
pub enum ProofMeetError {
    // ========================================================================
    // Resource state
    // ========================================================================

    /// Meeting not found
    #[error("Meeting {meeting_id} not found")]
    MeetingNotFound { meeting_id: String },

    /// Participant not found
    #[error("Participant {participant_id} not found")]
    ParticipantNotFound { participant_id: String },

    /// Participant has no assigned court representative
    #[error("Participant {participant_id} has no assigned court representative")]
    NoCourtRep { participant_id: String },

    /// Attendance record not found
    #[error("Attendance record {attendance_id} not found")]
    RecordNotFound { attendance_id: String },

    /// Already attending with recent activity
    #[error("Already attending meeting with active session {attendance_id}")]
    AlreadyAttending { attendance_id: String },

    /// The scheduled meeting window has closed
    #[error("Meeting ended {minutes_since_close} minutes ago; attendance is closed")]
    MeetingEnded { minutes_since_close: i64 },

    /// Record is not in progress
    #[error("Attendance record {attendance_id} is not in progress")]
    NotInProgress { attendance_id: String },

    /// Record already finalized or rejected; sealed fields are immutable
    #[error("Attendance record {attendance_id} is sealed and cannot be modified")]
    RecordSealed { attendance_id: String },

    /// Court card not found
    #[error("Court card {card_id} not found")]
    CardNotFound { card_id: String },

    /// No court card exists for the record
    #[error("No court card exists for attendance record {attendance_id}")]
    CardNotMinted { attendance_id: String },

    /// Caller does not own the resource
    #[error("Record does not belong to the requesting participant")]
    NotOwner,

    /// A signature with this role already exists on the card
    #[error("Card already carries a {role} signature")]
    AlreadySigned { role: String },

    /// Host verification code invalid or already consumed
    #[error("Verification code is invalid or has already been used")]
    CodeInvalidOrUsed,

    // ========================================================================
    // Validation & auth
    // ========================================================================

    /// Invalid input
    #[error("Invalid input: {field} - {reason}")]
    InvalidInput { field: String, reason: String },

    /// Unauthorized
    #[error("Unauthorized: {reason}")]
    Unauthorized { reason: String },

    /// Wrong password on self-sign
    #[error("Password verification failed")]
    PasswordMismatch,

    /// Webhook signature did not verify against the shared secret
    #[error("Webhook signature mismatch")]
    WebhookSignatureMismatch,

    // ========================================================================
    // Internal
    // ========================================================================

    /// Cryptographic failure
    #[error("Crypto error: {message}")]
    Crypto { message: String },

    /// Internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl ProofMeetError {
    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Create an invalid input error
    pub fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create an unauthorized error
    pub fn unauthorized(reason: impl Into<String>) -> Self {
        Self::Unauthorized {
            reason: reason.into(),
        }
    }

    /// Whether a retry on the next sweeper pass may succeed
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::Internal { .. } | Self::Crypto { .. })
    }

    /// Get a stable error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MeetingNotFound { .. } => "MEETING_NOT_FOUND",
            Self::ParticipantNotFound { .. } => "PARTICIPANT_NOT_FOUND",
            Self::NoCourtRep { .. } => "NO_COURT_REP",
            Self::RecordNotFound { .. } => "RECORD_NOT_FOUND",
            Self::AlreadyAttending { .. } => "ALREADY_ATTENDING",
            Self::MeetingEnded { .. } => "MEETING_ENDED",
            Self::NotInProgress { .. } => "NOT_IN_PROGRESS",
            Self::RecordSealed { .. } => "RECORD_SEALED",
            Self::CardNotFound { .. } => "CARD_NOT_FOUND",
            Self::CardNotMinted { .. } => "CARD_NOT_MINTED",
            Self::NotOwner => "NOT_OWNER",
            Self::AlreadySigned { .. } => "ALREADY_SIGNED",
            Self::CodeInvalidOrUsed => "CODE_INVALID_OR_USED",
            Self::InvalidInput { .. } => "INVALID_INPUT",
            Self::Unauthorized { .. } => "UNAUTHORIZED",
            Self::PasswordMismatch => "PASSWORD_MISMATCH",
            Self::WebhookSignatureMismatch => "WEBHOOK_SIGNATURE_MISMATCH",
            Self::Crypto { .. } => "CRYPTO_ERROR",
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}
