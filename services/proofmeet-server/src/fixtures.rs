//! Demo fixture seeding
//!
//! Loads meetings and participant accounts from a JSON file so the server
//! is drivable end-to-end without the surrounding registration and
//! meeting-sync systems.

use serde::Deserialize;

use proofmeet_auth::PasswordService;
use proofmeet_store::{MeetingDirectory, ParticipantDirectory};
use proofmeet_types::{CourtRepId, Meeting, Participant, ParticipantId};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FixtureFile {
    #[serde(default)]
    meetings: Vec<Meeting>,
    #[serde(default)]
    participants: Vec<FixtureParticipant>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FixtureParticipant {
    id: String,
    email: String,
    display_name: String,
    court_rep_id: Option<String>,
    /// Plaintext in fixtures only; hashed at load
    password: String,
}

/// Seed directories from a fixtures file
pub async fn seed(
    path: &str,
    meetings: &MeetingDirectory,
    participants: &ParticipantDirectory,
    passwords: &PasswordService,
) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("cannot read fixtures file {path}: {e}"))?;
    let fixture: FixtureFile = serde_json::from_str(&raw)
        .map_err(|e| anyhow::anyhow!("invalid fixtures file {path}: {e}"))?;

    let meeting_count = fixture.meetings.len();
    for meeting in fixture.meetings {
        meetings.upsert(meeting).await;
    }

    let participant_count = fixture.participants.len();
    for entry in fixture.participants {
        let password_hash = passwords
            .hash_password(&entry.password)
            .map_err(|e| anyhow::anyhow!("fixture participant {}: {e}", entry.id))?;
        participants
            .upsert(Participant {
                id: ParticipantId::from_string(entry.id),
                email: entry.email,
                display_name: entry.display_name,
                court_rep_id: entry.court_rep_id.map(CourtRepId::from_string),
                password_hash,
            })
            .await;
    }

    tracing::info!(
        meetings = meeting_count,
        participants = participant_count,
        path,
        "fixtures seeded"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_seed_from_json() {
        let json = r#"{
            "meetings": [{
                "id": "mtg_fixture",
                "name": "Fixture Group",
                "program": "AA",
                "scheduledStart": "2025-06-02T10:00:00Z",
                "durationMinutes": 60
            }],
            "participants": [{
                "id": "part_fixture",
                "email": "fixture@example.com",
                "displayName": "Fixture Person",
                "courtRepId": "rep_fixture",
                "password": "Fixture pass 1"
            }]
        }"#;

        let dir = std::env::temp_dir().join("proofmeet_fixture_test.json");
        std::fs::write(&dir, json).unwrap();

        let meetings = MeetingDirectory::new();
        let participants = ParticipantDirectory::new();
        let passwords = PasswordService::default();

        seed(dir.to_str().unwrap(), &meetings, &participants, &passwords)
            .await
            .unwrap();

        assert_eq!(meetings.len().await, 1);
        let participant = participants
            .find_by_email("fixture@example.com")
            .await
            .unwrap();
        assert!(passwords
            .verify_password("Fixture pass 1", &participant.password_hash)
            .unwrap());
    }
}
