//! Audit event persistence.

pub mod r#trait {
    pub use super::trait_::*;
}
#[path = "trait.rs"]
mod trait_;
pub mod memory;

pub use memory::MemoryAuditRepository;
pub use r#trait::AuditRepository;
