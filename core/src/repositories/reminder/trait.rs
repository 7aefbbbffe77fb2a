//! Reminder repository trait defining the interface for reminder state.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::reminder::ReminderState;
use crate::errors::DomainError;

/// Repository contract for [`ReminderState`] rows, keyed by request id.
#[async_trait]
pub trait ReminderRepository: Send + Sync {
    /// Fetch the state for a request, if any reminders were sent yet.
    async fn get(&self, request_id: Uuid) -> Result<Option<ReminderState>, DomainError>;

    /// Insert or replace the state for a request.
    async fn upsert(&self, state: ReminderState) -> Result<(), DomainError>;
}
