//! Repository traits and in-memory implementations.
//!
//! The traits are the storage seam of the engine: production hosts back
//! them with a durable store that provides the conditional-update
//! semantics the traits require. The `Memory*` implementations ship for
//! tests and embedded single-process use.

pub mod audit;
pub mod reminder;
pub mod verification;

pub use audit::{AuditRepository, MemoryAuditRepository};
pub use reminder::{MemoryReminderRepository, ReminderRepository};
pub use verification::{MemoryVerificationRepository, VerificationRepository};
