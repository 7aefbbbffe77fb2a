//! Verification repository trait defining the interface for request persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::entities::verification_request::{Purpose, VerificationRequest};
use crate::errors::DomainError;

/// Repository contract for [`VerificationRequest`] rows.
///
/// Implementations must be durable and strongly consistent for
/// single-row transitions: `update` is a compare-and-swap on the row
/// version, and `insert` must enforce at most one active row per
/// `(subject_id, purpose)` (a partial unique index in SQL terms).
/// Multiple service instances may call concurrently; in-process locking
/// alone is not sufficient.
#[async_trait]
pub trait VerificationRepository: Send + Sync {
    /// Persist a new request.
    ///
    /// # Returns
    /// * `Ok(())` on success
    /// * `Err(DomainError::Conflict)` if an active row already exists
    ///   for the same `(subject_id, purpose)`
    async fn insert(&self, request: VerificationRequest) -> Result<(), DomainError>;

    /// Find a request by id.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<VerificationRequest>, DomainError>;

    /// Find the active (pending or locked, unexpired) request for a
    /// `(subject, purpose)` pair, if any.
    async fn find_active(
        &self,
        subject_id: Uuid,
        purpose: Purpose,
        now: DateTime<Utc>,
    ) -> Result<Option<VerificationRequest>, DomainError>;

    /// Find the most recently issued request for a pair regardless of
    /// status. Used to distinguish expired/verified lookups from
    /// unknown ones.
    async fn find_latest(
        &self,
        subject_id: Uuid,
        purpose: Purpose,
    ) -> Result<Option<VerificationRequest>, DomainError>;

    /// All requests whose derived status at `now` is still pending,
    /// ordered by creation time. Consumed by the reminder scheduler.
    async fn list_pending(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<VerificationRequest>, DomainError>;

    /// Conditionally replace a row.
    ///
    /// The stored row is replaced with `request` only when its current
    /// version equals `expected_version` (the version the caller read
    /// before mutating).
    ///
    /// # Returns
    /// * `Ok(true)` - the swap was applied
    /// * `Ok(false)` - another writer got there first; reload and retry
    /// * `Err(DomainError)` - storage failure or unknown row
    async fn update(
        &self,
        request: &VerificationRequest,
        expected_version: u64,
    ) -> Result<bool, DomainError>;
}
