//! Structured outcomes returned to the API layer.
//!
//! Policy rejections carry a `retry_after` hint but never internal
//! counter values; `Expired` is distinct from `InvalidToken` so the
//! client can offer a resend affordance.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

/// A freshly issued verification, returned to the caller for dispatch.
///
/// `raw_token` exists only in this value - it is never stored and must
/// be handed to the email collaborator exactly once.
#[derive(Debug, Clone)]
pub struct IssuedVerification {
    /// The request the token belongs to
    pub request_id: Uuid,
    /// The raw token for email dispatch
    pub raw_token: String,
    /// When the token stops being accepted
    pub expires_at: DateTime<Utc>,
}

/// Outcome of `create_verification`.
#[derive(Debug, Clone)]
pub enum CreateOutcome {
    /// A new pending request was issued
    Created(IssuedVerification),
    /// Rejected by the rate limiter
    RateLimited { retry_after: Duration },
}

/// Outcome of `verify_token`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// The token matched; the request is now verified
    Success,
    /// The request was already verified - idempotent, no side effect
    AlreadyVerified,
    /// The token lifetime ran out before verification
    Expired,
    /// Attempts are refused until the lock elapses
    Locked { retry_after: Duration },
    /// The token did not match
    InvalidToken { attempts_remaining: u32 },
    /// Rejected by the verify-attempt rate limiter
    RateLimited { retry_after: Duration },
}

/// Outcome of `resend_verification`.
#[derive(Debug, Clone)]
pub enum ResendOutcome {
    /// A replacement token was issued; the prior request is superseded
    Resent(IssuedVerification),
    /// Rejected by the resend rate limiter
    RateLimited { retry_after: Duration },
    /// The cooldown since the previous send has not elapsed
    CooldownActive { retry_after: Duration },
}
