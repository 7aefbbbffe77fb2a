//! # Verigate Shared
//!
//! Configuration types shared across the Verigate backend crates.
//! The verification engine consumes these; the host application is
//! expected to deserialize them from its own configuration source.

pub mod config;

pub use config::{ActionLimit, ConfigError, RateLimitPolicy, VerificationPolicy};
