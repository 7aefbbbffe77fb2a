//! # Verigate Core
//!
//! Core engine for address verification and abuse prevention: opaque
//! token issuance and checking, the verification request state machine,
//! two-dimensional rate limiting, lockout handling, reminder scheduling
//! and audit recording. Hosts embed this crate and provide durable
//! implementations of the repository traits.

pub mod domain;
pub mod errors;
pub mod repositories;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::*;
pub use errors::*;
pub use repositories::*;
pub use services::*;
