//! In-memory implementation of the reminder repository.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::reminder::ReminderState;
use crate::errors::DomainError;

use super::r#trait::ReminderRepository;

/// In-memory reminder state store for tests and embedded hosts.
pub struct MemoryReminderRepository {
    states: Arc<RwLock<HashMap<Uuid, ReminderState>>>,
}

impl MemoryReminderRepository {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            states: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for MemoryReminderRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReminderRepository for MemoryReminderRepository {
    async fn get(&self, request_id: Uuid) -> Result<Option<ReminderState>, DomainError> {
        Ok(self.states.read().await.get(&request_id).cloned())
    }

    async fn upsert(&self, state: ReminderState) -> Result<(), DomainError> {
        self.states.write().await.insert(state.request_id, state);
        Ok(())
    }
}
