//! API integration tests
//!
//! Drives the full router with in-process services: session-token auth,
//! webhook signature checks, and the public verification surface.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;

use proofmeet_api::{create_router, ApiConfig, AppState};
use proofmeet_auth::{PasswordService, SessionService, WebhookVerifier};
use proofmeet_crypto::SigningKeypair;
use proofmeet_engine::{AttendanceEngine, EngineConfig, LogSink};
use proofmeet_store::{
    AttendanceStore, HostCodeStore, MeetingDirectory, MemoryStore, ParticipantDirectory,
};
use proofmeet_types::{
    AttendanceId, CourtCard, CourtRepId, EventType, HeartbeatSignals, Meeting, MeetingId,
    Participant, ParticipantId,
};

const WEBHOOK_SECRET: &str = "test-webhook-secret";
const PASSWORD: &str = "Correct horse 1!";

struct TestApp {
    router: Router,
    state: Arc<AppState>,
    participant: Participant,
    token: String,
    live_meeting: Meeting,
    past_meeting: Meeting,
}

async fn test_app() -> TestApp {
    let passwords = PasswordService::default();
    let password_hash = passwords.hash_password(PASSWORD).unwrap();

    let participant = Participant {
        id: ParticipantId::from_string("part_api"),
        email: "api@example.com".to_string(),
        display_name: "Avery Poe".to_string(),
        court_rep_id: Some(CourtRepId::from_string("rep_api")),
        password_hash,
    };

    let live_meeting = Meeting {
        id: MeetingId::from_string("mtg_live"),
        name: "Here and Now".to_string(),
        program: "AA".to_string(),
        scheduled_start: Utc::now(),
        duration_minutes: 60,
        expected_join_email: Some(participant.email.clone()),
        meeting_url: Some("https://zoom.example/j/live".to_string()),
    };
    let past_meeting = Meeting {
        id: MeetingId::from_string("mtg_past"),
        name: "Yesterday Group".to_string(),
        program: "NA".to_string(),
        scheduled_start: Utc::now() - Duration::hours(2),
        duration_minutes: 60,
        expected_join_email: Some(participant.email.clone()),
        meeting_url: None,
    };

    let meetings = MeetingDirectory::new();
    meetings.upsert(live_meeting.clone()).await;
    meetings.upsert(past_meeting.clone()).await;
    let participants = ParticipantDirectory::new();
    participants.upsert(participant.clone()).await;

    let engine = AttendanceEngine::new(
        Arc::new(MemoryStore::new()),
        meetings,
        participants,
        HostCodeStore::new(),
        Arc::new(SigningKeypair::generate()),
        Arc::new(LogSink),
        EngineConfig {
            frontend_base: "https://proofmeet.example".to_string(),
            ..EngineConfig::default()
        },
    );

    let sessions = SessionService::default();
    let token = sessions.issue(participant.id.clone()).await;

    let state = Arc::new(AppState::new(
        engine,
        sessions,
        passwords,
        WebhookVerifier::new(WEBHOOK_SECRET),
    ));
    let router = create_router(state.clone(), ApiConfig::default());

    TestApp {
        router,
        state,
        participant,
        token,
        live_meeting,
        past_meeting,
    }
}

async fn request(
    router: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let body = match body {
        Some(value) => Body::from(serde_json::to_vec(&value).unwrap()),
        None => Body::empty(),
    };
    let response = router.clone().oneshot(builder.body(body).unwrap()).await.unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

/// Drive a finalized PASSED card through the engine with explicit clocks
async fn finalized_card(app: &TestApp) -> (AttendanceId, CourtCard) {
    let start = app.past_meeting.scheduled_start;
    let join = app
        .state
        .engine
        .join_meeting_at(&app.participant.id, &app.past_meeting.id, start)
        .await
        .unwrap();

    let signals = HeartbeatSignals {
        tab_focused: true,
        mouse_movement: true,
        audio_active: true,
        video_active: true,
        ..Default::default()
    };
    let data = serde_json::to_value(&signals).unwrap();
    for i in 0..120i64 {
        app.state
            .engine
            .record_heartbeat_at(
                &join.attendance_id,
                &app.participant.id,
                EventType::Active,
                data.clone(),
                start + Duration::seconds(i * 30),
            )
            .await
            .unwrap();
    }
    app.state
        .engine
        .leave_meeting_at(
            &join.attendance_id,
            &app.participant.id,
            start + Duration::minutes(60) + Duration::seconds(30),
        )
        .await
        .unwrap();

    let card = app
        .state
        .engine
        .store()
        .find_card_by_attendance(&join.attendance_id)
        .await
        .unwrap()
        .unwrap();
    (join.attendance_id, card)
}

// ============================================================================
// Health & auth
// ============================================================================

#[tokio::test]
async fn health_is_public() {
    let app = test_app().await;
    let (status, json) = request(&app.router, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["meetings"], 2);
}

#[tokio::test]
async fn participant_routes_require_token() {
    let app = test_app().await;
    let body = json!({"meetingId": app.live_meeting.id.to_string()});

    let (status, json) =
        request(&app.router, "POST", "/api/join-meeting", None, Some(body.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "UNAUTHORIZED");

    let (status, _) = request(
        &app.router,
        "POST",
        "/api/join-meeting",
        Some("bogus-token"),
        Some(body),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Attendance flow over HTTP
// ============================================================================

#[tokio::test]
async fn join_heartbeat_leave_flow() {
    let app = test_app().await;

    let (status, join) = request(
        &app.router,
        "POST",
        "/api/join-meeting",
        Some(&app.token),
        Some(json!({"meetingId": app.live_meeting.id.to_string(), "joinMethod": "ONLINE"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(join["trackingActive"], true);
    assert_eq!(join["meetingUrl"], "https://zoom.example/j/live");
    let attendance_id = join["attendanceId"].as_str().unwrap().to_string();

    let (status, heartbeat) = request(
        &app.router,
        "POST",
        "/api/activity-heartbeat",
        Some(&app.token),
        Some(json!({
            "attendanceId": attendance_id,
            "activityType": "ACTIVE",
            "metadata": {"tabFocused": true, "videoActive": true}
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(heartbeat["timelineEvents"], 2);

    let (status, heartbeat) = request(
        &app.router,
        "POST",
        "/api/activity-heartbeat",
        Some(&app.token),
        Some(json!({
            "attendanceId": attendance_id,
            "activityType": "NAPPING",
            "metadata": {}
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(heartbeat["code"], "INVALID_INPUT");

    // The live meeting window is open: leave is provisional
    let (status, leave) = request(
        &app.router,
        "POST",
        "/api/leave-meeting",
        Some(&app.token),
        Some(json!({"attendanceId": attendance_id})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(leave["canRejoin"], true);
    assert_eq!(leave["courtCardGenerated"], false);
    assert_eq!(leave["status"], "COMPLETED");
    assert!(leave["message"].as_str().unwrap().contains("rejoin"));
}

#[tokio::test]
async fn unknown_meeting_is_404_with_stable_code() {
    let app = test_app().await;
    let (status, json) = request(
        &app.router,
        "POST",
        "/api/join-meeting",
        Some(&app.token),
        Some(json!({"meetingId": "mtg_missing"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "MEETING_NOT_FOUND");
}

// ============================================================================
// Webhooks
// ============================================================================

#[tokio::test]
async fn webhook_challenge_echoes_token() {
    let app = test_app().await;
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/webhooks/video?token=challenge-me")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"challenge-me");
}

#[tokio::test]
async fn signed_webhook_annotates_record() {
    let app = test_app().await;

    // Participant opens a record first - webhooks never create one
    let (_, join) = request(
        &app.router,
        "POST",
        "/api/join-meeting",
        Some(&app.token),
        Some(json!({"meetingId": app.live_meeting.id.to_string()})),
    )
    .await;
    let attendance_id = join["attendanceId"].as_str().unwrap().to_string();

    let payload = json!({
        "event": "meeting.participant_joined",
        "meetingId": app.live_meeting.id.to_string(),
        "email": app.participant.email,
        "timestamp": app.live_meeting.scheduled_start,
    });
    let body_bytes = serde_json::to_vec(&payload).unwrap();
    let signature = app.state.webhook.sign(&body_bytes).unwrap();

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/webhooks/video")
                .header("content-type", "application/json")
                .header("x-webhook-signature", signature)
                .body(Body::from(body_bytes.clone()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let record = app
        .state
        .engine
        .store()
        .get_record(&AttendanceId::from_string(&attendance_id))
        .await
        .unwrap()
        .unwrap();
    assert!(record.has_webhook_events());

    // A bad signature is acknowledged but has no effect
    let events_before = record.timeline.len();
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/webhooks/video")
                .header("content-type", "application/json")
                .header("x-webhook-signature", "deadbeef")
                .body(Body::from(body_bytes))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let record = app
        .state
        .engine
        .store()
        .get_record(&AttendanceId::from_string(&attendance_id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.timeline.len(), events_before);
}

// ============================================================================
// Public verification & signatures
// ============================================================================

#[tokio::test]
async fn public_verification_round_trip() {
    let app = test_app().await;
    let (_, card) = finalized_card(&app).await;

    let (status, json) = request(
        &app.router,
        "GET",
        &format!("/verify/{}", card.id),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["hashMatches"], true);
    assert_eq!(json["isTampered"], false);
    assert_eq!(json["validationStatus"], "PASSED");
    assert!(json.get("suppliedHashMatches").is_none());

    let (status, json) = request(
        &app.router,
        "GET",
        &format!("/verify/{}?hash={}", card.id, card.card_hash),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["suppliedHashMatches"], true);

    let (status, json) = request(
        &app.router,
        "GET",
        &format!("/verify/{}/chain-of-trust", card.id),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["isValid"], true);
    assert_eq!(json["totalBlocks"], 1);

    let (status, json) = request(&app.router, "GET", "/verify/card_missing", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "CARD_NOT_FOUND");
}

#[tokio::test]
async fn self_sign_requires_correct_password() {
    let app = test_app().await;
    let (_, card) = finalized_card(&app).await;

    let (status, json) = request(
        &app.router,
        "POST",
        &format!("/api/sign-court-card/{}", card.id),
        Some(&app.token),
        Some(json!({"password": "not the password"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "PASSWORD_MISMATCH");

    let (status, json) = request(
        &app.router,
        "POST",
        &format!("/api/sign-court-card/{}", card.id),
        Some(&app.token),
        Some(json!({"password": PASSWORD})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["signatureCount"], 1);

    // Second self-sign is rejected
    let (status, json) = request(
        &app.router,
        "POST",
        &format!("/api/sign-court-card/{}", card.id),
        Some(&app.token),
        Some(json!({"password": PASSWORD})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "ALREADY_SIGNED");
}

#[tokio::test]
async fn host_attestation_over_http() {
    let app = test_app().await;
    let (attendance_id, _) = finalized_card(&app).await;

    let (status, link) = request(
        &app.router,
        "POST",
        "/api/host-signature-link",
        Some(&app.token),
        Some(json!({"attendanceId": attendance_id.to_string(), "hostEmail": "host@example.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let code = link["verificationCode"].as_str().unwrap().to_string();

    let (status, summary) = request(
        &app.router,
        "GET",
        &format!("/verification/host-signature/{attendance_id}?code={code}"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["participantName"], "Avery Poe");

    let submission = json!({
        "attendanceRecordId": attendance_id.to_string(),
        "hostName": "Meeting Host",
        "hostEmail": "host@example.com",
        "signatureData": "typed: Meeting Host",
        "verificationCode": code,
    });
    let (status, signed) = request(
        &app.router,
        "POST",
        "/verification/host-signature",
        None,
        Some(submission.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(signed["signatureCount"], 1);

    // The code is single-use
    let (status, json) = request(
        &app.router,
        "POST",
        "/verification/host-signature",
        None,
        Some(submission),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "CODE_INVALID_OR_USED");
}
