//! Audit service appending structured events for every transition.

use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::audit::AuditEvent;
use crate::errors::DomainResult;
use crate::repositories::AuditRepository;

/// Thin recording facade over the audit log.
///
/// `record` never fails on business conditions; the only error it can
/// surface is a storage failure, which callers propagate as an
/// infrastructure error rather than a verification outcome.
pub struct AuditService<R>
where
    R: AuditRepository,
{
    repository: Arc<R>,
}

impl<R> AuditService<R>
where
    R: AuditRepository,
{
    /// Create a new audit service.
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Append one event.
    pub async fn record(&self, event: AuditEvent) -> DomainResult<()> {
        tracing::debug!(
            event_type = event.event_type.as_str(),
            request_id = ?event.request_id,
            "Audit event recorded"
        );
        self.repository.append(event).await
    }

    /// Events recorded for one request, in append order.
    pub async fn events_for_request(&self, request_id: Uuid) -> DomainResult<Vec<AuditEvent>> {
        self.repository.list_for_request(request_id).await
    }
}
