//! Main verification service implementation.

use chrono::{Duration, Utc};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use vg_shared::config::{RateLimitPolicy, VerificationPolicy};

use crate::domain::address;
use crate::domain::entities::audit::{AuditEvent, AuditEventType};
use crate::domain::entities::verification_request::{Purpose, RequestStatus, VerificationRequest};
use crate::errors::{DomainError, DomainResult};
use crate::repositories::{AuditRepository, VerificationRepository};
use crate::services::audit::AuditService;
use crate::services::rate_limit::{
    LimitAction, RateLimitDecision, RateLimitService, RateLimitStore,
};
use crate::services::token::TokenCodec;

use super::types::{CreateOutcome, IssuedVerification, ResendOutcome, VerifyOutcome};

// Upper bound on conditional-update retries before giving up. Each
// retry re-reads the row, so contention resolves within a few laps.
const MAX_UPDATE_RETRIES: usize = 8;

/// Verification service owning the request state machine.
///
/// Generic over the storage seams so hosts can back it with their own
/// repositories; the in-memory implementations in
/// [`crate::repositories`] satisfy the bounds for tests and embedded
/// use. All transitions are read-compute-swap against the repository's
/// versioned update, which keeps them linearizable across service
/// instances.
pub struct VerificationService<V, A, S>
where
    V: VerificationRepository,
    A: AuditRepository,
    S: RateLimitStore,
{
    requests: Arc<V>,
    audit: AuditService<A>,
    limiter: RateLimitService<S>,
    codec: TokenCodec,
    policy: VerificationPolicy,
    limits: RateLimitPolicy,
}

impl<V, A, S> VerificationService<V, A, S>
where
    V: VerificationRepository,
    A: AuditRepository,
    S: RateLimitStore,
{
    /// Create a new verification service.
    pub fn new(
        requests: Arc<V>,
        audit_repository: Arc<A>,
        limit_store: Arc<S>,
        codec: TokenCodec,
        policy: VerificationPolicy,
        limits: RateLimitPolicy,
    ) -> Self {
        Self {
            requests,
            audit: AuditService::new(audit_repository),
            limiter: RateLimitService::new(limit_store, limits.clone()),
            codec,
            policy,
            limits,
        }
    }

    /// Issue a new verification for `(subject_id, purpose)`.
    ///
    /// Supersedes any active request for the pair, stores a pending
    /// request and returns the raw token for email dispatch. The raw
    /// token is not retained anywhere else.
    pub async fn create_verification(
        &self,
        subject_id: Uuid,
        target_address: &str,
        purpose: Purpose,
        ip: &str,
        agent: Option<&str>,
    ) -> DomainResult<CreateOutcome> {
        if !address::is_valid_email(target_address) {
            return Err(DomainError::Validation {
                message: format!(
                    "invalid target address: {}",
                    address::mask_email(target_address)
                ),
            });
        }

        if let RateLimitDecision::Limited { retry_after } = self
            .limiter
            .check(LimitAction::Send, ip, subject_id)
            .await?
        {
            self.audit
                .record(
                    AuditEvent::new(AuditEventType::RateLimited, ip)
                        .with_agent(agent)
                        .with_metadata(json!({ "action": LimitAction::Send.as_str() })),
                )
                .await?;
            return Ok(CreateOutcome::RateLimited { retry_after });
        }

        self.supersede_active(subject_id, purpose).await?;
        let issued = self
            .insert_pending(subject_id, target_address, purpose, ip, agent)
            .await?;

        tracing::info!(
            subject_id = %subject_id,
            purpose = purpose.as_str(),
            request_id = %issued.request_id,
            event = "verification_created",
            "Issued new verification request"
        );
        self.audit
            .record(
                AuditEvent::new(AuditEventType::Created, ip)
                    .with_request(issued.request_id)
                    .with_agent(agent)
                    .with_metadata(json!({
                        "purpose": purpose.as_str(),
                        "target": address::mask_email(target_address),
                    })),
            )
            .await?;

        Ok(CreateOutcome::Created(issued))
    }

    /// Verify a raw token against the newest request for the pair.
    ///
    /// The failed-attempt increment and the lockout check are applied
    /// as one conditional update, so concurrent failures cannot slip
    /// past the threshold and concurrent successes collapse to a single
    /// `Success` with the rest observing `AlreadyVerified`.
    pub async fn verify_token(
        &self,
        subject_id: Uuid,
        purpose: Purpose,
        raw_token: &str,
        ip: &str,
        agent: Option<&str>,
    ) -> DomainResult<VerifyOutcome> {
        if let RateLimitDecision::Limited { retry_after } = self
            .limiter
            .check(LimitAction::VerifyAttempt, ip, subject_id)
            .await?
        {
            self.audit
                .record(
                    AuditEvent::new(AuditEventType::RateLimited, ip)
                        .with_agent(agent)
                        .with_metadata(json!({ "action": LimitAction::VerifyAttempt.as_str() })),
                )
                .await?;
            return Ok(VerifyOutcome::RateLimited { retry_after });
        }

        for _ in 0..MAX_UPDATE_RETRIES {
            let request = self
                .requests
                .find_latest(subject_id, purpose)
                .await?
                .ok_or_else(|| DomainError::NotFound {
                    resource: "verification_request".to_string(),
                })?;
            let now = Utc::now();

            match request.status_at(now) {
                RequestStatus::Verified => return Ok(VerifyOutcome::AlreadyVerified),
                RequestStatus::Expired => {
                    // Expiry never consumes a failed attempt.
                    self.audit
                        .record(
                            AuditEvent::new(AuditEventType::Expired, ip)
                                .with_request(request.id)
                                .with_agent(agent),
                        )
                        .await?;
                    return Ok(VerifyOutcome::Expired);
                }
                RequestStatus::Locked => {
                    let retry_after = request.lock_remaining(now).unwrap_or_else(Duration::zero);
                    return Ok(VerifyOutcome::Locked { retry_after });
                }
                RequestStatus::Superseded => {
                    // The digest of a superseded request is invalid by
                    // definition; nothing to mutate.
                    self.audit
                        .record(
                            AuditEvent::new(AuditEventType::FailedAttempt, ip)
                                .with_request(request.id)
                                .with_agent(agent)
                                .with_metadata(json!({ "reason": "superseded" })),
                        )
                        .await?;
                    return Ok(VerifyOutcome::InvalidToken {
                        attempts_remaining: 0,
                    });
                }
                RequestStatus::Pending => {}
            }

            if self.codec.verify(raw_token, &request.token_digest)? {
                let mut updated = request.clone();
                updated.refresh_lock(now);
                updated.mark_verified(now);
                if self.requests.update(&updated, request.version).await? {
                    tracing::info!(
                        request_id = %request.id,
                        event = "verification_succeeded",
                        "Token verified"
                    );
                    self.audit
                        .record(
                            AuditEvent::new(AuditEventType::Verified, ip)
                                .with_request(request.id)
                                .with_agent(agent),
                        )
                        .await?;
                    return Ok(VerifyOutcome::Success);
                }
            } else {
                let mut updated = request.clone();
                let locked = updated.register_failure(
                    now,
                    self.limits.max_failed_attempts,
                    self.lockout_duration(),
                );
                if self.requests.update(&updated, request.version).await? {
                    if locked {
                        tracing::warn!(
                            request_id = %request.id,
                            failed_attempts = updated.failed_attempts,
                            event = "verification_locked",
                            "Request locked after repeated failures"
                        );
                        self.audit
                            .record(
                                AuditEvent::new(AuditEventType::Locked, ip)
                                    .with_request(request.id)
                                    .with_agent(agent)
                                    .with_metadata(json!({
                                        "locked_until": updated.locked_until,
                                    })),
                            )
                            .await?;
                        return Ok(VerifyOutcome::Locked {
                            retry_after: self.lockout_duration(),
                        });
                    }
                    let attempts_remaining =
                        updated.remaining_attempts(self.limits.max_failed_attempts);
                    self.audit
                        .record(
                            AuditEvent::new(AuditEventType::FailedAttempt, ip)
                                .with_request(request.id)
                                .with_agent(agent)
                                .with_metadata(json!({
                                    "attempts_remaining": attempts_remaining,
                                })),
                        )
                        .await?;
                    return Ok(VerifyOutcome::InvalidToken { attempts_remaining });
                }
            }
            // Version conflict: another worker won the swap. Reload and
            // re-evaluate - a concurrent success turns into
            // AlreadyVerified on the next lap.
        }

        Err(DomainError::Conflict {
            message: "verification update contention not resolved".to_string(),
        })
    }

    /// Re-issue a token for the active `(subject_id, purpose)` request.
    ///
    /// The prior request is superseded and its digest invalidated; the
    /// replacement starts with a clean attempt counter.
    pub async fn resend_verification(
        &self,
        subject_id: Uuid,
        purpose: Purpose,
        ip: &str,
        agent: Option<&str>,
    ) -> DomainResult<ResendOutcome> {
        if let RateLimitDecision::Limited { retry_after } = self
            .limiter
            .check(LimitAction::Resend, ip, subject_id)
            .await?
        {
            self.audit
                .record(
                    AuditEvent::new(AuditEventType::RateLimited, ip)
                        .with_agent(agent)
                        .with_metadata(json!({ "action": LimitAction::Resend.as_str() })),
                )
                .await?;
            return Ok(ResendOutcome::RateLimited { retry_after });
        }

        let now = Utc::now();
        let active = self
            .requests
            .find_active(subject_id, purpose, now)
            .await?
            .ok_or_else(|| DomainError::NotFound {
                resource: "active verification_request".to_string(),
            })?;

        let cooldown = Duration::seconds(self.limits.resend_cooldown_seconds as i64);
        let since_last_send = now - active.issued_at;
        if since_last_send < cooldown {
            let retry_after = cooldown - since_last_send;
            self.audit
                .record(
                    AuditEvent::new(AuditEventType::RateLimited, ip)
                        .with_request(active.id)
                        .with_agent(agent)
                        .with_metadata(json!({
                            "action": LimitAction::Resend.as_str(),
                            "reason": "cooldown",
                        })),
                )
                .await?;
            return Ok(ResendOutcome::CooldownActive { retry_after });
        }

        let superseded_id = self.supersede_active(subject_id, purpose).await?;
        let issued = self
            .insert_pending(subject_id, &active.target_address, purpose, ip, agent)
            .await?;

        tracing::info!(
            subject_id = %subject_id,
            purpose = purpose.as_str(),
            request_id = %issued.request_id,
            event = "verification_resent",
            "Issued replacement verification request"
        );
        self.audit
            .record(
                AuditEvent::new(AuditEventType::Resent, ip)
                    .with_request(issued.request_id)
                    .with_agent(agent)
                    .with_metadata(json!({ "superseded_request": superseded_id })),
            )
            .await?;

        Ok(ResendOutcome::Resent(issued))
    }

    /// Supersede the active request for a pair, if one exists.
    /// Returns the id of the superseded request.
    async fn supersede_active(
        &self,
        subject_id: Uuid,
        purpose: Purpose,
    ) -> DomainResult<Option<Uuid>> {
        for _ in 0..MAX_UPDATE_RETRIES {
            let now = Utc::now();
            let Some(active) = self.requests.find_active(subject_id, purpose, now).await? else {
                return Ok(None);
            };
            let mut updated = active.clone();
            updated.supersede();
            if self.requests.update(&updated, active.version).await? {
                return Ok(Some(active.id));
            }
        }
        Err(DomainError::Conflict {
            message: "could not supersede active verification".to_string(),
        })
    }

    async fn insert_pending(
        &self,
        subject_id: Uuid,
        target_address: &str,
        purpose: Purpose,
        ip: &str,
        agent: Option<&str>,
    ) -> DomainResult<IssuedVerification> {
        let issued_token = self.codec.issue()?;
        let request = VerificationRequest::new(
            subject_id,
            target_address,
            purpose,
            issued_token.digest,
            self.token_lifetime(),
            ip,
            agent.map(str::to_string),
        );
        let issued = IssuedVerification {
            request_id: request.id,
            raw_token: issued_token.raw,
            expires_at: request.expires_at,
        };
        self.requests.insert(request).await?;
        Ok(issued)
    }

    fn token_lifetime(&self) -> Duration {
        Duration::hours(self.policy.token_lifetime_hours)
    }

    fn lockout_duration(&self) -> Duration {
        Duration::seconds(self.limits.lockout_duration_seconds as i64)
    }
}
