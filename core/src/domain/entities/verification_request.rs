//! Verification request entity and its state machine.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default raw token length in bytes
pub const DEFAULT_TOKEN_LENGTH: usize = 32;

/// Default failed attempts before a request locks
pub const DEFAULT_MAX_FAILED_ATTEMPTS: u32 = 5;

/// What a verification credential proves receipt of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Purpose {
    Signup,
    EmailChange,
    PasswordReset,
}

impl Purpose {
    /// String representation for storage and audit metadata
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Signup => "SIGNUP",
            Self::EmailChange => "EMAIL_CHANGE",
            Self::PasswordReset => "PASSWORD_RESET",
        }
    }
}

/// Lifecycle state of a verification request.
///
/// `Expired` is never stored: it is derived from `expires_at` at read
/// time. A stored `Locked` likewise reverts to `Pending` once the lock
/// elapses; see [`VerificationRequest::status_at`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    Pending,
    Verified,
    Expired,
    Locked,
    Superseded,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Verified => "VERIFIED",
            Self::Expired => "EXPIRED",
            Self::Locked => "LOCKED",
            Self::Superseded => "SUPERSEDED",
        }
    }

    /// Terminal states accept no further mutation
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Verified | Self::Expired | Self::Superseded)
    }
}

/// One outstanding or resolved verification attempt.
///
/// At most one active (pending, unexpired) request exists per
/// `(subject_id, purpose)` pair; issuing a replacement supersedes the
/// prior request and invalidates its digest. Rows are never deleted by
/// the engine - resolved requests stay behind for audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationRequest {
    /// Unique identifier for the request
    pub id: Uuid,

    /// Account the verification belongs to
    pub subject_id: Uuid,

    /// Address being verified
    pub target_address: String,

    /// What this verification proves
    pub purpose: Purpose,

    /// Keyed digest of the issued token; the raw token is never stored
    pub token_digest: String,

    /// When the request row was created
    pub created_at: DateTime<Utc>,

    /// When the current token was issued
    pub issued_at: DateTime<Utc>,

    /// When the token stops being accepted
    pub expires_at: DateTime<Utc>,

    /// Set exactly once, on successful verification
    pub verified_at: Option<DateTime<Utc>>,

    /// Stored lifecycle state; see `status_at` for the derived view
    pub status: RequestStatus,

    /// Failed verification attempts against the current token
    pub failed_attempts: u32,

    /// Until when attempts are refused, when locked
    pub locked_until: Option<DateTime<Utc>>,

    /// IP the creating call came from
    pub created_from_ip: String,

    /// User agent of the creating call
    pub created_from_agent: Option<String>,

    /// Optimistic concurrency counter; bumped by every mutation
    pub version: u64,
}

impl VerificationRequest {
    /// Create a new pending request.
    pub fn new(
        subject_id: Uuid,
        target_address: impl Into<String>,
        purpose: Purpose,
        token_digest: impl Into<String>,
        lifetime: Duration,
        ip: impl Into<String>,
        agent: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            subject_id,
            target_address: target_address.into(),
            purpose,
            token_digest: token_digest.into(),
            created_at: now,
            issued_at: now,
            expires_at: now + lifetime,
            verified_at: None,
            status: RequestStatus::Pending,
            failed_attempts: 0,
            locked_until: None,
            created_from_ip: ip.into(),
            created_from_agent: agent,
            version: 0,
        }
    }

    /// Derive the effective status at `now`.
    ///
    /// Pure function of the stored timestamps - no background job flips
    /// rows to `Expired` or back from `Locked`.
    pub fn status_at(&self, now: DateTime<Utc>) -> RequestStatus {
        match self.status {
            RequestStatus::Locked => {
                match self.locked_until {
                    Some(until) if now <= until => RequestStatus::Locked,
                    // Lock elapsed; the request behaves as pending again
                    // (or expired, if the token ran out meanwhile).
                    _ if now > self.expires_at => RequestStatus::Expired,
                    _ => RequestStatus::Pending,
                }
            }
            RequestStatus::Pending if now > self.expires_at => RequestStatus::Expired,
            status => status,
        }
    }

    /// Whether the request is active: accepting verification attempts
    /// and blocking new inserts for the same `(subject, purpose)`.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        matches!(
            self.status_at(now),
            RequestStatus::Pending | RequestStatus::Locked
        )
    }

    /// Time left on the lock, if any.
    pub fn lock_remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        match self.locked_until {
            Some(until) if until > now => Some(until - now),
            _ => None,
        }
    }

    /// Attempts left before the request locks.
    pub fn remaining_attempts(&self, max_failed_attempts: u32) -> u32 {
        max_failed_attempts.saturating_sub(self.failed_attempts)
    }

    /// Fold an elapsed lock back into `Pending` with a clean counter.
    ///
    /// Called at the start of any mutation so the reset happens as part
    /// of the same atomic update that observes it.
    pub fn refresh_lock(&mut self, now: DateTime<Utc>) {
        if self.status == RequestStatus::Locked {
            if let Some(until) = self.locked_until {
                if now > until {
                    self.status = RequestStatus::Pending;
                    self.failed_attempts = 0;
                    self.locked_until = None;
                }
            }
        }
    }

    /// Record a failed attempt; locks the request when the counter
    /// reaches `max_failed_attempts`. Returns `true` if this call
    /// transitioned the request to `Locked`.
    pub fn register_failure(
        &mut self,
        now: DateTime<Utc>,
        max_failed_attempts: u32,
        lockout: Duration,
    ) -> bool {
        self.refresh_lock(now);
        self.failed_attempts += 1;
        self.version += 1;
        if self.failed_attempts >= max_failed_attempts {
            self.status = RequestStatus::Locked;
            self.locked_until = Some(now + lockout);
            true
        } else {
            false
        }
    }

    /// Transition to `Verified`.
    pub fn mark_verified(&mut self, now: DateTime<Utc>) {
        self.status = RequestStatus::Verified;
        self.verified_at = Some(now);
        self.version += 1;
    }

    /// Terminal transition applied to the old request when a
    /// replacement token is issued.
    pub fn supersede(&mut self) {
        self.status = RequestStatus::Superseded;
        self.version += 1;
    }
}
