//! ProofMeet Fraud - integrity rules over finalizing records
//!
//! The evaluator runs an ordered rule set; each triggered rule contributes
//! its severity weight to a risk score clamped to 100. A separate set of
//! three threshold rules decides PASS/FAIL for cards that survive fraud
//! gating.
//!
//! Severity contributions: CRITICAL +40, HIGH +25, MEDIUM +15, LOW +5.
//! Recommendation: REJECT on any CRITICAL or risk >= 80, FLAG_FOR_REVIEW at
//! risk >= 40, APPROVE otherwise.

use proofmeet_types::{
    AttendanceRecord, EngagementAnalysis, EngagementFlag, EventSource, EventType, FraudAnalysis,
    FraudRecommendation, Meeting, Violation, ViolationCode, ViolationSeverity,
};

/// Longest plausible overshoot of the scheduled window, in minutes
const MAX_OVERSHOOT_MIN: i64 = 15;

/// Shortest attendance considered substantive, in minutes
const MIN_DURATION_MIN: i64 = 5;

/// Largest tolerated gap between webhook and tracked durations, in minutes
const DURATION_MISMATCH_MIN: i64 = 10;

/// Run the ordered fraud rule set
pub fn evaluate(
    record: &AttendanceRecord,
    meeting: &Meeting,
    engagement: &EngagementAnalysis,
) -> FraudAnalysis {
    let mut violations = Vec::new();

    let raw = record.raw_duration_minutes();
    let absence = record.metadata.absence_minutes_total();
    // Signed net: the stored total is clamped, the guard rule is not
    let net = raw - absence;

    // 1. Longer than the meeting could possibly run
    if raw > meeting.duration_minutes + MAX_OVERSHOOT_MIN {
        violations.push(Violation::new(
            ViolationCode::ImpossibleDuration,
            ViolationSeverity::Critical,
            format!(
                "raw duration {raw} min exceeds scheduled {} min by more than {MAX_OVERSHOOT_MIN} min",
                meeting.duration_minutes
            ),
        ));
    }

    // 2./3. Degenerate net duration
    if net == 0 {
        violations.push(Violation::new(
            ViolationCode::ZeroDuration,
            ViolationSeverity::Critical,
            "net attendance duration is zero",
        ));
    } else if net < 0 {
        violations.push(Violation::new(
            ViolationCode::NegativeDuration,
            ViolationSeverity::Critical,
            format!("net attendance duration is negative ({net} min)"),
        ));
    }

    // 4. No activity signals at all on a non-trivial meeting
    let active_count = record.count_events(EventType::Active, EventSource::FrontendMonitor);
    if active_count == 0 && meeting.duration_minutes > 10 {
        violations.push(Violation::new(
            ViolationCode::NoEngagementSignals,
            ViolationSeverity::Critical,
            "no activity heartbeats were received for the whole meeting",
        ));
    }

    // 5. Token attendance
    if net > 0 && net < MIN_DURATION_MIN {
        violations.push(Violation::new(
            ViolationCode::InsufficientDuration,
            ViolationSeverity::High,
            format!("net duration {net} min is below the {MIN_DURATION_MIN} min minimum"),
        ));
    }

    // 6. Engagement scored the session as hollow
    if engagement.score < 30 {
        violations.push(Violation::new(
            ViolationCode::LowEngagementScore,
            ViolationSeverity::High,
            format!("engagement score {} is below 30", engagement.score),
        ));
    }

    // 7. Scorer concluded the activity stream is machine-generated
    if engagement.has_flag(EngagementFlag::LikelyAutomated) {
        violations.push(Violation::new(
            ViolationCode::SuspiciousActivityPattern,
            ViolationSeverity::High,
            "activity rate indicates automated heartbeats",
        ));
    }

    // 8. Webhook and monitor disagree on how long the participant stayed
    if let Some(webhook_span) = record.webhook_span_minutes() {
        if (webhook_span - record.total_duration_min).abs() > DURATION_MISMATCH_MIN {
            violations.push(Violation::new(
                ViolationCode::DurationDataMismatch,
                ViolationSeverity::High,
                format!(
                    "webhook span {webhook_span} min vs tracked {} min",
                    record.total_duration_min
                ),
            ));
        }
    }

    // 9. Attendance below the court threshold
    if record.attendance_percent < 80.0 {
        violations.push(Violation::new(
            ViolationCode::AttendanceBelowThreshold,
            ViolationSeverity::High,
            format!(
                "attendance {:.1}% is below the 80% threshold",
                record.attendance_percent
            ),
        ));
    }

    // 10. Churning in and out of the meeting
    if record.metadata.rejoin_count > 5 {
        violations.push(Violation::new(
            ViolationCode::RapidJoinLeaveCycles,
            ViolationSeverity::Medium,
            format!("{} rejoin cycles recorded", record.metadata.rejoin_count),
        ));
    }

    // 11. Nothing from the provider corroborates the session
    if !record.has_webhook_events() {
        violations.push(Violation::new(
            ViolationCode::MissingVerificationData,
            ViolationSeverity::Medium,
            "no webhook events corroborate this attendance",
        ));
    }

    // 12. Mostly idle
    if record.total_duration_min > 0 {
        let idle_ratio = record.idle_duration_min as f64 / record.total_duration_min as f64;
        if idle_ratio > 0.5 {
            violations.push(Violation::new(
                ViolationCode::ExtremelyHighIdleTime,
                ViolationSeverity::Medium,
                format!("idle time is {:.0}% of tracked duration", idle_ratio * 100.0),
            ));
        }
    }

    let risk_score: u32 = violations
        .iter()
        .map(|v| v.severity.risk_weight())
        .sum::<u32>()
        .min(100);

    let has_critical = violations
        .iter()
        .any(|v| v.severity == ViolationSeverity::Critical);

    let recommendation = if has_critical || risk_score >= 80 {
        FraudRecommendation::Reject
    } else if risk_score >= 40 {
        FraudRecommendation::FlagForReview
    } else {
        FraudRecommendation::Approve
    };

    FraudAnalysis {
        risk_score,
        recommendation,
        violations,
    }
}

/// The three PASS/FAIL threshold rules for cards that survive fraud gating.
///
/// Independent of the risk score: an approved record still FAILs its card
/// when active minutes fall under 80% of net, idle minutes exceed 20% of
/// net, or net duration falls under 80% of scheduled.
pub fn threshold_check(record: &AttendanceRecord, meeting: &Meeting) -> Vec<Violation> {
    let mut violations = Vec::new();
    let net = record.total_duration_min;

    if net > 0 {
        let active_floor = net as f64 * 0.8;
        if (record.active_duration_min as f64) < active_floor {
            violations.push(Violation::new(
                ViolationCode::InsufficientActiveTime,
                ViolationSeverity::Critical,
                format!(
                    "active minutes {} are below 80% of net duration {net}",
                    record.active_duration_min
                ),
            ));
        }

        let idle_ceiling = net as f64 * 0.2;
        if record.idle_duration_min as f64 > idle_ceiling {
            violations.push(Violation::new(
                ViolationCode::ExcessiveIdleTime,
                ViolationSeverity::Critical,
                format!(
                    "idle minutes {} exceed 20% of net duration {net}",
                    record.idle_duration_min
                ),
            ));
        }
    }

    if meeting.duration_minutes > 0 {
        let net_floor = meeting.duration_minutes as f64 * 0.8;
        if (net as f64) < net_floor {
            violations.push(Violation::new(
                ViolationCode::InsufficientAttendance,
                ViolationSeverity::Critical,
                format!(
                    "net duration {net} min is below 80% of the scheduled {} min",
                    meeting.duration_minutes
                ),
            ));
        }
    } else {
        violations.push(Violation::new(
            ViolationCode::ZeroScheduledDuration,
            ViolationSeverity::Critical,
            "meeting has no scheduled duration",
        ));
    }

    violations
}
