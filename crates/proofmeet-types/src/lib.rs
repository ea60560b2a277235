//! ProofMeet Types - Canonical domain types for attendance verification
//!
//! This crate contains all foundational types for ProofMeet with zero
//! dependencies on other proofmeet crates. It defines the complete type
//! system for:
//!
//! - Identity types (ParticipantId, MeetingId, AttendanceId, etc.)
//! - Attendance records, timelines, and absence periods
//! - Meetings and the scheduled finalization window
//! - Engagement and fraud analysis outputs
//! - Court Cards, signatures, and violations
//!
//! # Architectural Invariants
//!
//! These types support the core ProofMeet integrity invariants:
//!
//! 1. Timelines are append-only — events are never edited after append
//! 2. A FINALIZED or REJECTED record never changes its sealed fields
//! 3. Net duration = raw duration minus absence, clamped to zero
//! 4. Every finalized record links to its predecessor by block hash

pub mod analysis;
pub mod card;
pub mod error;
pub mod event;
pub mod identity;
pub mod meeting;
pub mod record;

pub use analysis::*;
pub use card::*;
pub use error::*;
pub use event::*;
pub use identity::*;
pub use meeting::*;
pub use record::*;

/// Version of the ProofMeet types schema
pub const TYPES_VERSION: &str = "0.1.0";

/// System tag embedded in QR payloads and verification responses
pub const SYSTEM_TAG: &str = "ProofMeet";

/// Heartbeat cadence of the participant-side monitor, in seconds.
///
/// One accepted heartbeat attributes this many seconds of activity, and a
/// dropped session's absence is considered to start one interval after the
/// last observed monitor event.
pub const HEARTBEAT_INTERVAL_SECS: i64 = 30;

/// Sentinel previous-hash for the first block in a participant's chain
pub const GENESIS_HASH: &str = "0";
