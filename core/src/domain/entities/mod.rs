//! Domain entities owned by the verification engine.

pub mod audit;
pub mod reminder;
pub mod verification_request;

pub use audit::{AuditEvent, AuditEventType};
pub use reminder::ReminderState;
pub use verification_request::{Purpose, RequestStatus, VerificationRequest};

#[cfg(test)]
mod tests;
