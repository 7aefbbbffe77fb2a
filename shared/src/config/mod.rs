//! Configuration modules for the verification engine.

mod rate_limit;
mod verification;

pub use rate_limit::{ActionLimit, RateLimitPolicy};
pub use verification::VerificationPolicy;

use thiserror::Error;

/// Raised when a policy fails startup validation.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}
