//! ProofMeet Engagement - engagement scoring over attendance timelines
//!
//! The scorer is a pure function of (timeline, scheduled duration). It
//! extracts activity metrics, combines them into a weighted 0-100 score,
//! and maps the score plus raised flags to a level and a recommendation.
//!
//! Weighting: audio/video 50% (video contributes 70 of that sub-score,
//! audio 30), any-activity presence 30%, consistency 20%.

use proofmeet_types::{
    EngagementAnalysis, EngagementFlag, EngagementLevel, EngagementMetrics,
    EngagementRecommendation, EventSource, EventType, TimelineEvent, HEARTBEAT_INTERVAL_SECS,
};

/// Extract raw activity metrics from a timeline.
///
/// Only monitor-sourced ACTIVE/IDLE events count toward heartbeat totals;
/// webhook and system events corroborate presence but carry no activity
/// signals.
pub fn extract_metrics(timeline: &[TimelineEvent], scheduled_minutes: i64) -> EngagementMetrics {
    let mut metrics = EngagementMetrics::default();

    for event in timeline {
        if event.source == EventSource::FrontendMonitor {
            match event.event_type {
                EventType::Active => metrics.active_events += 1,
                EventType::Idle => metrics.idle_events += 1,
                EventType::Reaction => metrics.reaction_count += 1,
                _ => {}
            }
            if event.data_flag("audioActive") {
                metrics.audio_active = true;
            }
            if event.data_flag("videoActive") {
                metrics.video_active = true;
            }
            if event.data_flag("mouseMovement") {
                metrics.mouse_events += 1;
            }
            if event.data_flag("keyboardActivity") {
                metrics.keyboard_events += 1;
            }
            if event.data_flag("tabFocused") {
                metrics.focused_seconds += HEARTBEAT_INTERVAL_SECS;
            }
        } else if event.event_type == EventType::Reaction {
            metrics.reaction_count += 1;
        }
    }

    metrics.activity_rate = if scheduled_minutes > 0 {
        f64::from(metrics.active_events) / scheduled_minutes as f64
    } else {
        0.0
    };

    metrics
}

/// Score extracted metrics into the persisted engagement analysis
pub fn score(metrics: EngagementMetrics, scheduled_minutes: i64) -> EngagementAnalysis {
    let mut flags = Vec::new();

    // Audio/video sub-score: video 70, audio 30, capped at 100
    let mut av_score: u32 = 0;
    if metrics.video_active {
        av_score += 70;
    } else {
        flags.push(EngagementFlag::NoVideo);
    }
    if metrics.audio_active {
        av_score += 30;
    }
    let av_score = av_score.min(100);

    // Activity presence sub-score: all-or-nothing
    let any_activity =
        metrics.active_events > 0 || metrics.mouse_events > 0 || metrics.keyboard_events > 0;
    let activity_score: u32 = if any_activity { 100 } else { 0 };
    if !any_activity && scheduled_minutes > 10 {
        flags.push(EngagementFlag::ZeroActivity);
    }

    // Consistency sub-score: penalize implausible event rates
    let mut consistency_score: u32 = 100;
    if metrics.activity_rate > 30.0 {
        consistency_score = consistency_score.saturating_sub(50);
        flags.push(EngagementFlag::SuspiciouslyHighActivity);
    }
    if metrics.activity_rate > 50.0 {
        consistency_score = 0;
        flags.push(EngagementFlag::LikelyAutomated);
    }

    if scheduled_minutes <= 0 {
        flags.push(EngagementFlag::ZeroScheduledDuration);
    }

    let weighted = f64::from(av_score) * 0.5
        + f64::from(activity_score) * 0.3
        + f64::from(consistency_score) * 0.2;
    let score = weighted.round() as u32;

    let (level, recommendation) = classify(score, &flags);

    EngagementAnalysis {
        score,
        level,
        recommendation,
        flags,
        metrics,
    }
}

/// Convenience wrapper: extract and score in one call
pub fn analyze(timeline: &[TimelineEvent], scheduled_minutes: i64) -> EngagementAnalysis {
    score(extract_metrics(timeline, scheduled_minutes), scheduled_minutes)
}

fn classify(
    score: u32,
    flags: &[EngagementFlag],
) -> (EngagementLevel, EngagementRecommendation) {
    if flags.contains(&EngagementFlag::LikelyAutomated)
        || flags.contains(&EngagementFlag::ZeroActivity)
    {
        return (EngagementLevel::Suspicious, EngagementRecommendation::Reject);
    }
    if score >= 80 {
        (EngagementLevel::High, EngagementRecommendation::Approve)
    } else if score >= 50 {
        let recommendation = if flags.contains(&EngagementFlag::NoVideo) {
            EngagementRecommendation::FlagForReview
        } else {
            EngagementRecommendation::Approve
        };
        (EngagementLevel::Medium, recommendation)
    } else if score >= 30 {
        (EngagementLevel::Low, EngagementRecommendation::FlagForReview)
    } else {
        (EngagementLevel::Suspicious, EngagementRecommendation::Reject)
    }
}
