//! Engagement and fraud analysis outputs
//!
//! These are the derived quality and integrity signals written into record
//! metadata at finalization. The scoring and rule logic live in the
//! `proofmeet-engagement` and `proofmeet-fraud` crates; only the shapes are
//! defined here so every layer can persist and read them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Engagement
// ============================================================================

/// Engagement quality band derived from the weighted score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EngagementLevel {
    High,
    Medium,
    Low,
    Suspicious,
}

/// Textual quality flags raised by the scorer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EngagementFlag {
    NoVideo,
    ZeroActivity,
    SuspiciouslyHighActivity,
    LikelyAutomated,
    ZeroScheduledDuration,
}

/// What the scorer recommends finalization do with the record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EngagementRecommendation {
    Approve,
    FlagForReview,
    Reject,
}

/// Raw activity metrics extracted from a record's timeline
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngagementMetrics {
    pub active_events: u32,
    pub idle_events: u32,
    pub audio_active: bool,
    pub video_active: bool,
    pub mouse_events: u32,
    pub keyboard_events: u32,
    pub reaction_count: u32,
    /// Approximated tab-focus time: focused heartbeats x 30 s
    pub focused_seconds: i64,
    /// ACTIVE events per scheduled minute
    pub activity_rate: f64,
}

/// Complete engagement analysis persisted into record metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngagementAnalysis {
    /// Weighted 0-100 score
    pub score: u32,
    pub level: EngagementLevel,
    pub recommendation: EngagementRecommendation,
    pub flags: Vec<EngagementFlag>,
    pub metrics: EngagementMetrics,
}

impl EngagementAnalysis {
    /// Whether a given flag was raised
    pub fn has_flag(&self, flag: EngagementFlag) -> bool {
        self.flags.contains(&flag)
    }
}

// ============================================================================
// Violations
// ============================================================================

/// Severity of a fraud or threshold violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ViolationSeverity {
    /// Risk-score contribution of one violation at this severity
    pub fn risk_weight(&self) -> u32 {
        match self {
            Self::Critical => 40,
            Self::High => 25,
            Self::Medium => 15,
            Self::Low => 5,
        }
    }
}

/// Stable violation codes surfaced on records and Court Cards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationCode {
    // Fraud rules
    ImpossibleDuration,
    ZeroDuration,
    NegativeDuration,
    NoEngagementSignals,
    InsufficientDuration,
    LowEngagementScore,
    SuspiciousActivityPattern,
    DurationDataMismatch,
    AttendanceBelowThreshold,
    RapidJoinLeaveCycles,
    MissingVerificationData,
    ExtremelyHighIdleTime,
    // Threshold rules (PASS/FAIL gate on approved cards)
    InsufficientActiveTime,
    ExcessiveIdleTime,
    InsufficientAttendance,
    // Division guard
    ZeroScheduledDuration,
}

/// A single triggered violation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    #[serde(rename = "type")]
    pub code: ViolationCode,
    pub severity: ViolationSeverity,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl Violation {
    pub fn new(code: ViolationCode, severity: ViolationSeverity, message: impl Into<String>) -> Self {
        Self {
            code,
            severity,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

// ============================================================================
// Fraud
// ============================================================================

/// What the fraud evaluator recommends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FraudRecommendation {
    Approve,
    FlagForReview,
    Reject,
}

/// Complete fraud analysis persisted into record metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FraudAnalysis {
    /// Severity-weighted risk score, clamped to 100
    pub risk_score: u32,
    pub recommendation: FraudRecommendation,
    pub violations: Vec<Violation>,
}

impl FraudAnalysis {
    /// Whether any triggered violation is CRITICAL
    pub fn has_critical(&self) -> bool {
        self.violations
            .iter()
            .any(|v| v.severity == ViolationSeverity::Critical)
    }
}
