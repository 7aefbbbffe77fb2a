//! Verification ledger: token issuance, verification and resend.
//!
//! This module owns the `VerificationRequest` state machine. Every
//! mutating operation passes through the rate limiter first, applies
//! its transition as a conditional update, and leaves exactly one audit
//! event behind.

mod service;
mod types;

#[cfg(test)]
mod tests;

pub use service::VerificationService;
pub use types::{CreateOutcome, IssuedVerification, ResendOutcome, VerifyOutcome};
