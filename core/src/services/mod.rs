//! Business services containing the verification engine's use cases.

pub mod audit;
pub mod rate_limit;
pub mod scheduler;
pub mod token;
pub mod verification;

// Re-export commonly used types
pub use audit::AuditService;
pub use rate_limit::{
    LimitAction, MemoryRateLimitStore, RateLimitDecision, RateLimitService, RateLimitStore,
};
pub use scheduler::{ReminderDue, ReminderScheduler};
pub use token::{IssuedToken, TokenCodec};
pub use verification::{
    CreateOutcome, IssuedVerification, ResendOutcome, VerificationService, VerifyOutcome,
};
