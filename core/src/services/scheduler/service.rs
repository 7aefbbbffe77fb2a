//! Reminder scheduler over the pending-request set.

use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use vg_shared::config::VerificationPolicy;

use crate::domain::entities::audit::{AuditEvent, AuditEventType};
use crate::domain::entities::reminder::ReminderState;
use crate::errors::DomainResult;
use crate::repositories::{AuditRepository, ReminderRepository, VerificationRepository};
use crate::services::audit::AuditService;

/// One reminder ready for dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderDue {
    /// The pending request to nudge
    pub request_id: Uuid,
    /// Which configured offset this reminder corresponds to
    pub offset_days: u32,
}

/// Computes which pending requests are due a reminder nudge.
///
/// The scheduler is split into a pure query (`due_reminders`) and a
/// confirmation write (`mark_reminded`) so an external task runner can
/// drive it at-least-once: re-running the query after a crash yields
/// the same reminders until each dispatch is confirmed, and confirming
/// twice is a no-op.
pub struct ReminderScheduler<V, R, A>
where
    V: VerificationRepository,
    R: ReminderRepository,
    A: AuditRepository,
{
    requests: Arc<V>,
    reminders: Arc<R>,
    audit: AuditService<A>,
    policy: VerificationPolicy,
}

impl<V, R, A> ReminderScheduler<V, R, A>
where
    V: VerificationRepository,
    R: ReminderRepository,
    A: AuditRepository,
{
    /// Create a scheduler over the given stores.
    pub fn new(
        requests: Arc<V>,
        reminders: Arc<R>,
        audit_repository: Arc<A>,
        policy: VerificationPolicy,
    ) -> Self {
        let mut policy = policy;
        policy.reminder_offsets_days.sort_unstable();
        Self {
            requests,
            reminders,
            audit: AuditService::new(audit_repository),
            policy,
        }
    }

    /// Reminders due at `now`, oldest request first.
    ///
    /// A request contributes at most `max_reminders` reminders over its
    /// lifetime; offsets already confirmed via [`Self::mark_reminded`]
    /// are skipped. Requests that verified, expired or were superseded
    /// since their state was written contribute nothing - `list_pending`
    /// filters on the derived status.
    pub async fn due_reminders(&self, now: DateTime<Utc>) -> DomainResult<Vec<ReminderDue>> {
        let pending = self.requests.list_pending(now).await?;
        let mut due = Vec::new();

        for request in pending {
            let state = self
                .reminders
                .get(request.id)
                .await?
                .unwrap_or_else(|| ReminderState::new(request.id));
            let mut budget = self.policy.max_reminders.saturating_sub(state.sent_count());

            for &offset in &self.policy.reminder_offsets_days {
                if budget == 0 {
                    break;
                }
                if state.has_sent(offset) {
                    continue;
                }
                if now < request.created_at + Duration::days(i64::from(offset)) {
                    // Offsets are sorted; later ones are further out.
                    break;
                }
                due.push(ReminderDue {
                    request_id: request.id,
                    offset_days: offset,
                });
                budget -= 1;
            }
        }

        Ok(due)
    }

    /// Confirm that the reminder for `(request_id, offset_days)` was
    /// dispatched. Returns `false` when the offset was already
    /// confirmed, in which case nothing is written.
    pub async fn mark_reminded(&self, request_id: Uuid, offset_days: u32) -> DomainResult<bool> {
        let mut state = self
            .reminders
            .get(request_id)
            .await?
            .unwrap_or_else(|| ReminderState::new(request_id));

        if !state.record(offset_days) {
            return Ok(false);
        }
        self.reminders.upsert(state).await?;

        tracing::info!(
            request_id = %request_id,
            offset_days,
            event = "reminder_sent",
            "Reminder dispatch confirmed"
        );
        self.audit
            .record(
                AuditEvent::internal(AuditEventType::ReminderSent)
                    .with_request(request_id)
                    .with_metadata(json!({ "offset_days": offset_days })),
            )
            .await?;

        Ok(true)
    }
}
