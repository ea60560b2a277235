//! Verification and signature-intake tests
//!
//! Covers the QR-to-verify round trip, chain-of-trust over multiple
//! finalized records, tamper detection, and both signature channels.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};

use proofmeet_crypto::SigningKeypair;
use proofmeet_engine::{AttendanceEngine, EngineConfig, HostSignatureSubmission, LogSink};
use proofmeet_store::{
    AttendanceStore, HostCodeStore, MeetingDirectory, MemoryStore, ParticipantDirectory,
};
use proofmeet_types::{
    AttendanceId, CourtCard, CourtRepId, EventType, HeartbeatSignals, Meeting, MeetingId,
    Participant, ParticipantId, QrPayload, SignerRole, GENESIS_HASH,
};

struct Harness {
    engine: AttendanceEngine,
    store: Arc<MemoryStore>,
    participant: Participant,
}

fn day_at(day: u32, hour: u32, minute: u32, second: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, day, hour, minute, second).unwrap()
}

fn meeting_on(day: u32) -> Meeting {
    Meeting {
        id: MeetingId::from_string(format!("mtg_day_{day}")),
        name: "Daily Reprieve".to_string(),
        program: "NA".to_string(),
        scheduled_start: day_at(day, 10, 0, 0),
        duration_minutes: 60,
        expected_join_email: None,
        meeting_url: None,
    }
}

async fn harness() -> Harness {
    let participant = Participant {
        id: ParticipantId::from_string("part_casey"),
        email: "casey@example.com".to_string(),
        display_name: "Casey Roe".to_string(),
        court_rep_id: Some(CourtRepId::from_string("rep_jones")),
        password_hash: String::new(),
    };

    let store = Arc::new(MemoryStore::new());
    let meetings = MeetingDirectory::new();
    for day in 1..=3 {
        meetings.upsert(meeting_on(day)).await;
    }
    let participants = ParticipantDirectory::new();
    participants.upsert(participant.clone()).await;

    let engine = AttendanceEngine::new(
        store.clone(),
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

    Harness {
        engine,
        store,
        participant,
    }
}

/// Attend a full meeting on `day` and drive it to a finalized PASSED card
async fn attend_full_meeting(h: &Harness, day: u32) -> (AttendanceId, CourtCard) {
    let meeting = meeting_on(day);
    let join = h
        .engine
        .join_meeting_at(&h.participant.id, &meeting.id, day_at(day, 10, 0, 0))
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
        h.engine
            .record_heartbeat_at(
                &join.attendance_id,
                &h.participant.id,
                EventType::Active,
                data.clone(),
                day_at(day, 10, 0, 0) + Duration::seconds(i * 30),
            )
            .await
            .unwrap();
    }

    let leave = h
        .engine
        .leave_meeting_at(
            &join.attendance_id,
            &h.participant.id,
            day_at(day, 11, 0, 30),
        )
        .await
        .unwrap();
    assert!(leave.court_card_generated);

    let card = h
        .store
        .find_card_by_attendance(&join.attendance_id)
        .await
        .unwrap()
        .unwrap();
    (join.attendance_id, card)
}

// ============================================================================
// QR round trip and hash matching
// ============================================================================

#[tokio::test]
async fn qr_payload_round_trips_through_verification() {
    let h = harness().await;
    let (_, card) = attend_full_meeting(&h, 1).await;

    let payload: QrPayload = serde_json::from_str(&card.qr_code_data).unwrap();
    assert_eq!(payload.hash, card.card_hash);
    assert_eq!(payload.system, "ProofMeet");

    // Feeding the QR hash back as ?hash= yields a positive match
    let verification = h
        .engine
        .verify_card_public(&card.id, Some(&payload.hash), None, None)
        .await
        .unwrap();
    assert!(verification.hash_matches);
    assert_eq!(verification.supplied_hash_matches, Some(true));
    assert!(!verification.is_tampered);
    assert!(verification.chain_of_trust.is_valid);
}

#[tokio::test]
async fn wrong_supplied_hash_is_reported() {
    let h = harness().await;
    let (_, card) = attend_full_meeting(&h, 1).await;

    let verification = h
        .engine
        .verify_card_public(&card.id, Some("0000"), None, None)
        .await
        .unwrap();
    assert!(verification.hash_matches);
    assert_eq!(verification.supplied_hash_matches, Some(false));
}

#[tokio::test]
async fn verification_records_access_audit() {
    let h = harness().await;
    let (_, card) = attend_full_meeting(&h, 1).await;

    h.engine
        .verify_card_public(&card.id, None, Some("203.0.113.9".to_string()), None)
        .await
        .unwrap();
    h.engine
        .verify_card_public(&card.id, Some(&card.card_hash), None, None)
        .await
        .unwrap();

    let accesses = h.store.list_access(&card.id).await.unwrap();
    assert_eq!(accesses.len(), 2);
    assert!(!accesses[0].hash_supplied);
    assert_eq!(accesses[0].client_ip.as_deref(), Some("203.0.113.9"));
    assert!(accesses[1].hash_supplied);
}

// ============================================================================
// Chain of trust
// ============================================================================

#[tokio::test]
async fn chain_links_across_meetings() {
    let h = harness().await;
    let (first_id, first_card) = attend_full_meeting(&h, 1).await;
    let (second_id, _) = attend_full_meeting(&h, 2).await;
    let (_, third_card) = attend_full_meeting(&h, 3).await;

    let first = h.store.get_record(&first_id).await.unwrap().unwrap();
    let second = h.store.get_record(&second_id).await.unwrap().unwrap();

    let first_block = first.metadata.block.as_ref().unwrap();
    let second_block = second.metadata.block.as_ref().unwrap();
    assert_eq!(first_block.previous_hash, GENESIS_HASH);
    assert_eq!(second_block.previous_hash, first_block.block_hash);

    let chain = h.engine.chain_of_trust(&third_card.id).await.unwrap();
    assert!(chain.is_valid);
    assert_eq!(chain.total_blocks, 3);
    assert_eq!(chain.invalid_blocks, 0);

    // Cumulative hours accumulate across the chain
    assert!((first_card.cumulative_hours - 1.0).abs() < f64::EPSILON);
    assert!((third_card.cumulative_hours - 3.0).abs() < f64::EPSILON);
}

// ============================================================================
// Signature intake
// ============================================================================

#[tokio::test]
async fn participant_self_sign_appends_once() {
    let h = harness().await;
    let (_, card) = attend_full_meeting(&h, 1).await;

    let signed = h
        .engine
        .sign_card_as_participant(
            &card.id,
            &h.participant,
            Some("198.51.100.4".to_string()),
            Some("test-agent".to_string()),
        )
        .await
        .unwrap();
    assert_eq!(signed.signatures.len(), 1);
    let signature = &signed.signatures[0];
    assert_eq!(signature.signer_role, SignerRole::Participant);
    assert!(signature.is_well_formed());

    // A second participant signature is rejected
    let err = h
        .engine
        .sign_card_as_participant(&card.id, &h.participant, None, None)
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "ALREADY_SIGNED");
}

#[tokio::test]
async fn self_sign_rejects_foreign_card() {
    let h = harness().await;
    let (_, card) = attend_full_meeting(&h, 1).await;

    let intruder = Participant {
        id: ParticipantId::from_string("part_other"),
        email: "other@example.com".to_string(),
        display_name: "Other".to_string(),
        court_rep_id: Some(CourtRepId::from_string("rep_x")),
        password_hash: String::new(),
    };
    let err = h
        .engine
        .sign_card_as_participant(&card.id, &intruder, None, None)
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "NOT_OWNER");
}

#[tokio::test]
async fn host_attestation_consumes_code_once() {
    let h = harness().await;
    let (attendance_id, card) = attend_full_meeting(&h, 1).await;

    let request = h
        .engine
        .request_host_signature(
            &attendance_id,
            &h.participant.id,
            Some("host@example.com".to_string()),
        )
        .await
        .unwrap();

    // Landing page summary works without consuming the code
    let summary = h
        .engine
        .host_signature_summary(&attendance_id, &request.verification_code)
        .await
        .unwrap();
    assert_eq!(summary.participant_name, "Casey Roe");
    assert_eq!(summary.total_duration_min, 60);

    let submission = HostSignatureSubmission {
        attendance_record_id: attendance_id.clone(),
        host_name: "Meeting Host".to_string(),
        host_email: "host@example.com".to_string(),
        signature_data: "data:image/png;base64,AAAA".to_string(),
        verification_code: request.verification_code.clone(),
        ip_address: None,
        user_agent: None,
    };
    let signed = h
        .engine
        .submit_host_signature(submission.clone())
        .await
        .unwrap();
    assert_eq!(signed.signatures.len(), 1);
    assert_eq!(signed.signatures[0].signer_role, SignerRole::MeetingHost);

    // The code is gone
    let err = h.engine.submit_host_signature(submission).await.unwrap_err();
    assert_eq!(err.error_code(), "CODE_INVALID_OR_USED");

    // And the card itself never changed
    let reread = h.store.get_card(&card.id).await.unwrap().unwrap();
    assert_eq!(reread.card_hash, card.card_hash);
    assert_eq!(reread.validation_status, card.validation_status);
}

#[tokio::test]
async fn host_code_bound_to_wrong_record_fails() {
    let h = harness().await;
    let (first_id, _) = attend_full_meeting(&h, 1).await;
    let (second_id, _) = attend_full_meeting(&h, 2).await;

    let request = h
        .engine
        .request_host_signature(&first_id, &h.participant.id, None)
        .await
        .unwrap();

    let err = h
        .engine
        .submit_host_signature(HostSignatureSubmission {
            attendance_record_id: second_id,
            host_name: "Meeting Host".to_string(),
            host_email: "host@example.com".to_string(),
            signature_data: "typed: Meeting Host".to_string(),
            verification_code: request.verification_code.clone(),
            ip_address: None,
            user_agent: None,
        })
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "CODE_INVALID_OR_USED");

    // The mismatch did not burn the code for its real record
    assert!(h
        .engine
        .host_signature_summary(&first_id, &request.verification_code)
        .await
        .is_ok());
}

#[tokio::test]
async fn sealed_record_rejects_further_mutation() {
    let h = harness().await;
    let (attendance_id, _) = attend_full_meeting(&h, 1).await;

    let err = h
        .engine
        .record_heartbeat_at(
            &attendance_id,
            &h.participant.id,
            EventType::Active,
            serde_json::Value::Null,
            day_at(1, 11, 10, 0),
        )
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "NOT_IN_PROGRESS");

    let err = h
        .engine
        .leave_meeting_at(&attendance_id, &h.participant.id, day_at(1, 11, 10, 0))
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "NOT_IN_PROGRESS");
}
