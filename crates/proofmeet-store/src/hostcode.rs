//! Single-use host-signature verification codes
//!
//! A participant requests a host-attestation link; the store mints a code
//! bound to one attendance record. Submitting the host form consumes the
//! code — a second submission with the same code fails.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use proofmeet_types::AttendanceId;

/// A pending host-signature request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostSignatureRequest {
    pub attendance_record_id: AttendanceId,
    pub verification_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_email: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Store of outstanding one-use codes
#[derive(Clone, Default)]
pub struct HostCodeStore {
    codes: Arc<RwLock<HashMap<String, HostSignatureRequest>>>,
}

impl HostCodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a code bound to one attendance record
    pub async fn create(
        &self,
        attendance_record_id: AttendanceId,
        host_email: Option<String>,
    ) -> HostSignatureRequest {
        let mut bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut bytes);
        let request = HostSignatureRequest {
            attendance_record_id,
            verification_code: hex::encode(bytes),
            host_email,
            created_at: Utc::now(),
        };
        self.codes
            .write()
            .await
            .insert(request.verification_code.clone(), request.clone());
        request
    }

    /// Inspect a code without consuming it (host landing page)
    pub async fn peek(&self, code: &str) -> Option<HostSignatureRequest> {
        self.codes.read().await.get(code).cloned()
    }

    /// Consume a code. Returns the bound request exactly once; any later
    /// call with the same code gets `None`.
    pub async fn consume(&self, code: &str) -> Option<HostSignatureRequest> {
        self.codes.write().await.remove(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_code_is_single_use() {
        let store = HostCodeStore::new();
        let request = store.create(AttendanceId::new(), None).await;

        assert!(store.peek(&request.verification_code).await.is_some());
        let consumed = store.consume(&request.verification_code).await.unwrap();
        assert_eq!(consumed.attendance_record_id, request.attendance_record_id);

        // Second use fails
        assert!(store.consume(&request.verification_code).await.is_none());
        assert!(store.peek(&request.verification_code).await.is_none());
    }

    #[tokio::test]
    async fn test_codes_are_distinct() {
        let store = HostCodeStore::new();
        let a = store.create(AttendanceId::new(), None).await;
        let b = store.create(AttendanceId::new(), None).await;
        assert_ne!(a.verification_code, b.verification_code);
    }
}
