//! Audit recording.

mod service;

pub use service::AuditService;
