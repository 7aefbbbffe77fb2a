//! Rate limit decisions over IP and subject dimensions.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

use vg_shared::config::{ActionLimit, RateLimitPolicy};

use crate::errors::DomainResult;

use super::store::RateLimitStore;

/// Actions subject to rate limiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitAction {
    /// Issuing a new verification
    Send,
    /// Re-issuing a token for an existing verification
    Resend,
    /// Attempting to verify a token
    VerifyAttempt,
}

impl LimitAction {
    /// Key fragment and audit metadata value
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Send => "send",
            Self::Resend => "resend",
            Self::VerifyAttempt => "verify_attempt",
        }
    }
}

/// Outcome of a rate limit check.
///
/// A `Limited` decision never says which dimension tripped; the retry
/// hint is the longest remaining window among the tripped dimensions,
/// so rejection patterns cannot be used to probe for valid subjects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed,
    Limited { retry_after: Duration },
}

/// Fixed-window rate limiter over a shared counter store.
///
/// Windows are aligned to wall-clock boundaries (`timestamp / window`),
/// which keeps memory bounded to one counter per identifier per window
/// and tolerates clock drift up to one window length. Counters are
/// incremented before the threshold comparison, so two concurrent calls
/// racing for the last slot cannot both be admitted.
pub struct RateLimitService<S: RateLimitStore> {
    store: Arc<S>,
    policy: RateLimitPolicy,
}

impl<S: RateLimitStore> RateLimitService<S> {
    /// Create a limiter over the given store and policy.
    pub fn new(store: Arc<S>, policy: RateLimitPolicy) -> Self {
        Self { store, policy }
    }

    /// Check both dimensions for one call. Each check consumes a slot
    /// in its window whether or not the call is ultimately admitted.
    pub async fn check(
        &self,
        action: LimitAction,
        ip: &str,
        subject_id: Uuid,
    ) -> DomainResult<RateLimitDecision> {
        let limit = self.limit_for(action);
        let now = Utc::now();

        let ip_window = Window::at(now, limit.ip_window_seconds);
        let ip_key = format!(
            "rate_limit:{}:ip:{}:{}",
            action.as_str(),
            ip,
            ip_window.id
        );
        let ip_count = self.store.incr(&ip_key, ip_window.remaining_seconds).await?;

        let subject_window = Window::at(now, limit.subject_window_seconds);
        let subject_key = format!(
            "rate_limit:{}:subject:{}:{}",
            action.as_str(),
            subject_id,
            subject_window.id
        );
        let subject_count = self
            .store
            .incr(&subject_key, subject_window.remaining_seconds)
            .await?;

        let mut retry_after: Option<Duration> = None;
        if ip_count > u64::from(limit.ip_limit) {
            retry_after = Some(ip_window.remaining());
        }
        if subject_count > u64::from(limit.subject_limit) {
            let subject_remaining = subject_window.remaining();
            retry_after = Some(match retry_after {
                Some(current) if current > subject_remaining => current,
                _ => subject_remaining,
            });
        }

        match retry_after {
            Some(retry_after) => {
                tracing::warn!(
                    action = action.as_str(),
                    subject_id = %subject_id,
                    retry_after_seconds = retry_after.num_seconds(),
                    event = "rate_limit_exceeded",
                    "Rate limit exceeded"
                );
                Ok(RateLimitDecision::Limited { retry_after })
            }
            None => Ok(RateLimitDecision::Allowed),
        }
    }

    fn limit_for(&self, action: LimitAction) -> &ActionLimit {
        match action {
            LimitAction::Send => &self.policy.send,
            LimitAction::Resend => &self.policy.resend,
            LimitAction::VerifyAttempt => &self.policy.verify_attempt,
        }
    }
}

/// One wall-clock-aligned fixed window.
struct Window {
    id: i64,
    remaining_seconds: u64,
}

impl Window {
    fn at(now: DateTime<Utc>, window_seconds: u64) -> Self {
        let secs = window_seconds as i64;
        let id = now.timestamp().div_euclid(secs);
        let end = (id + 1) * secs;
        Self {
            id,
            remaining_seconds: (end - now.timestamp()).max(1) as u64,
        }
    }

    fn remaining(&self) -> Duration {
        Duration::seconds(self.remaining_seconds as i64)
    }
}
