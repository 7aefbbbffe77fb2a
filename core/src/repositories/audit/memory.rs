//! In-memory implementation of the audit repository.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::audit::AuditEvent;
use crate::errors::DomainError;

use super::r#trait::AuditRepository;

/// In-memory append log for tests and embedded hosts.
pub struct MemoryAuditRepository {
    events: Arc<RwLock<Vec<AuditEvent>>>,
}

impl MemoryAuditRepository {
    /// Create an empty log.
    pub fn new() -> Self {
        Self {
            events: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

impl Default for MemoryAuditRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuditRepository for MemoryAuditRepository {
    async fn append(&self, event: AuditEvent) -> Result<(), DomainError> {
        self.events.write().await.push(event);
        Ok(())
    }

    async fn list_for_request(&self, request_id: Uuid) -> Result<Vec<AuditEvent>, DomainError> {
        let events = self.events.read().await;
        Ok(events
            .iter()
            .filter(|e| e.request_id == Some(request_id))
            .cloned()
            .collect())
    }

    async fn list_all(&self) -> Result<Vec<AuditEvent>, DomainError> {
        Ok(self.events.read().await.clone())
    }
}
