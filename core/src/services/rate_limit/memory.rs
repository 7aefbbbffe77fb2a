//! In-memory implementation of the rate limit store.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::errors::DomainError;

use super::store::RateLimitStore;

// Expired entries are swept once the map grows past this.
const SWEEP_THRESHOLD: usize = 1024;

/// In-memory counter store for tests and single-process hosts.
///
/// All operations run under one async mutex, which makes the
/// increment-and-read atomic per call.
pub struct MemoryRateLimitStore {
    entries: Mutex<HashMap<String, CounterEntry>>,
}

struct CounterEntry {
    count: u64,
    expires_at: DateTime<Utc>,
}

impl MemoryRateLimitStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for MemoryRateLimitStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RateLimitStore for MemoryRateLimitStore {
    async fn incr(&self, key: &str, ttl_seconds: u64) -> Result<u64, DomainError> {
        let mut entries = self.entries.lock().await;
        let now = Utc::now();

        if entries.len() > SWEEP_THRESHOLD {
            entries.retain(|_, entry| entry.expires_at > now);
        }

        let entry = entries.entry(key.to_string()).or_insert(CounterEntry {
            count: 0,
            expires_at: now + Duration::seconds(ttl_seconds as i64),
        });
        if entry.expires_at <= now {
            entry.count = 0;
            entry.expires_at = now + Duration::seconds(ttl_seconds as i64);
        }
        entry.count += 1;
        Ok(entry.count)
    }
}
