//! Audit repository trait defining the interface for the append log.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::audit::AuditEvent;
use crate::errors::DomainError;

/// Repository contract for the append-only audit log.
///
/// The engine only appends; queries exist for analytics consumers and
/// tests. Implementations must never mutate or delete stored events.
#[async_trait]
pub trait AuditRepository: Send + Sync {
    /// Append one event to the log.
    async fn append(&self, event: AuditEvent) -> Result<(), DomainError>;

    /// Events recorded for one request, in append order.
    async fn list_for_request(&self, request_id: Uuid) -> Result<Vec<AuditEvent>, DomainError>;

    /// The whole log in append order.
    async fn list_all(&self) -> Result<Vec<AuditEvent>, DomainError>;
}
