//! Domain-specific error types and error handling.
//!
//! Policy rejections (rate limits, cooldowns, lockouts) are *not* errors:
//! they are outcome variants on the operation results. The variants here
//! cover bad input, missing records and infrastructure failures only, so
//! a storage outage can never be mistaken for a failed verification.

use thiserror::Error;

/// Core domain errors
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    #[error("Concurrent update conflict: {message}")]
    Conflict { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

pub type DomainResult<T> = Result<T, DomainError>;
