//! Per-request reminder bookkeeping.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which day-offsets have already produced a reminder for a request.
///
/// Mutated only by the scheduler after the external dispatcher confirms
/// delivery; `due_reminders` itself never writes, which keeps the query
/// idempotent for at-least-once task runners.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderState {
    /// Request this state belongs to
    pub request_id: Uuid,

    /// Day offsets already reminded, in dispatch order
    pub sent_offsets: Vec<u32>,
}

impl ReminderState {
    /// Fresh state with no reminders sent.
    pub fn new(request_id: Uuid) -> Self {
        Self {
            request_id,
            sent_offsets: Vec::new(),
        }
    }

    /// Whether the given offset was already dispatched.
    pub fn has_sent(&self, offset_days: u32) -> bool {
        self.sent_offsets.contains(&offset_days)
    }

    /// Record a dispatched offset. Returns `false` when the offset was
    /// already recorded (duplicate delivery confirmation).
    pub fn record(&mut self, offset_days: u32) -> bool {
        if self.has_sent(offset_days) {
            return false;
        }
        self.sent_offsets.push(offset_days);
        true
    }

    /// Number of reminders dispatched so far.
    pub fn sent_count(&self) -> usize {
        self.sent_offsets.len()
    }
}
