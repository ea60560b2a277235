//! Identity types for ProofMeet
//!
//! All identifiers are opaque strings. The `new()` constructors mint
//! UUID-backed ids with a short prefix so log lines stay readable.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! string_id {
    ($name:ident, $prefix:expr, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            /// Generate a new random id
            pub fn new() -> Self {
                Self(format!("{}_{}", $prefix, Uuid::new_v4()))
            }

            /// Create from an existing string
            pub fn from_string(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            /// The raw id string
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

string_id!(ParticipantId, "part", "A monitored participant");
string_id!(CourtRepId, "rep", "A court representative monitoring compliance");
string_id!(MeetingId, "mtg", "A scheduled recovery meeting");
string_id!(AttendanceId, "att", "One attendance record (join-episode bundle)");
string_id!(CardId, "card", "A minted Court Card");

/// A participant account as the engine sees it.
///
/// Registration and profile management live outside the core; the engine
/// only needs the court-rep linkage, the join email used for webhook
/// matching, and the stored password hash for self-signing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: ParticipantId,
    pub email: String,
    pub display_name: String,
    /// Court representative this participant reports to, if assigned
    pub court_rep_id: Option<CourtRepId>,
    /// Argon2id password hash, verified on court-card self-sign
    pub password_hash: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_prefixes() {
        assert!(ParticipantId::new().as_str().starts_with("part_"));
        assert!(AttendanceId::new().as_str().starts_with("att_"));
        assert!(CardId::new().as_str().starts_with("card_"));
    }

    #[test]
    fn test_id_roundtrip() {
        let id = MeetingId::from_string("mtg_fixed");
        let json = serde_json::to_string(&id).unwrap();
        let back: MeetingId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
