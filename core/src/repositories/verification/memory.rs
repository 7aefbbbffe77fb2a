//! In-memory implementation of the verification repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::verification_request::{Purpose, VerificationRequest};
use crate::errors::DomainError;

use super::r#trait::VerificationRepository;

/// In-memory verification repository for tests and embedded hosts.
///
/// Mirrors the guarantees a SQL table with a version column and a
/// partial unique index on active rows would give: `update` swaps only
/// on a version match and `insert` rejects a second active row per
/// `(subject, purpose)`. All checks run under one write lock, so they
/// are atomic per call.
pub struct MemoryVerificationRepository {
    requests: Arc<RwLock<HashMap<Uuid, VerificationRequest>>>,
}

impl MemoryVerificationRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self {
            requests: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for MemoryVerificationRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VerificationRepository for MemoryVerificationRepository {
    async fn insert(&self, request: VerificationRequest) -> Result<(), DomainError> {
        let mut requests = self.requests.write().await;
        let now = Utc::now();

        let active_exists = requests.values().any(|r| {
            r.subject_id == request.subject_id
                && r.purpose == request.purpose
                && r.is_active(now)
        });
        if active_exists {
            return Err(DomainError::Conflict {
                message: format!(
                    "active verification already exists for subject {} ({})",
                    request.subject_id,
                    request.purpose.as_str()
                ),
            });
        }

        requests.insert(request.id, request);
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<VerificationRequest>, DomainError> {
        let requests = self.requests.read().await;
        Ok(requests.get(&id).cloned())
    }

    async fn find_active(
        &self,
        subject_id: Uuid,
        purpose: Purpose,
        now: DateTime<Utc>,
    ) -> Result<Option<VerificationRequest>, DomainError> {
        let requests = self.requests.read().await;
        Ok(requests
            .values()
            .find(|r| r.subject_id == subject_id && r.purpose == purpose && r.is_active(now))
            .cloned())
    }

    async fn find_latest(
        &self,
        subject_id: Uuid,
        purpose: Purpose,
    ) -> Result<Option<VerificationRequest>, DomainError> {
        let requests = self.requests.read().await;
        Ok(requests
            .values()
            .filter(|r| r.subject_id == subject_id && r.purpose == purpose)
            .max_by_key(|r| r.issued_at)
            .cloned())
    }

    async fn list_pending(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<VerificationRequest>, DomainError> {
        let requests = self.requests.read().await;
        let mut pending: Vec<VerificationRequest> = requests
            .values()
            .filter(|r| r.status_at(now) == crate::domain::entities::RequestStatus::Pending)
            .cloned()
            .collect();
        pending.sort_by_key(|r| r.created_at);
        Ok(pending)
    }

    async fn update(
        &self,
        request: &VerificationRequest,
        expected_version: u64,
    ) -> Result<bool, DomainError> {
        let mut requests = self.requests.write().await;
        match requests.get(&request.id) {
            Some(stored) if stored.version == expected_version => {
                requests.insert(request.id, request.clone());
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(DomainError::NotFound {
                resource: format!("verification_request {}", request.id),
            }),
        }
    }
}
