//! Counter store trait for the rate limiter.

use async_trait::async_trait;

use crate::errors::DomainError;

/// Expiring counter keyspace with atomic increment-and-read.
///
/// Implementations must make `incr` atomic per key: two concurrent
/// calls may never observe the same count. A Redis `INCR` + `EXPIRE`
/// satisfies the contract. Losing a counter under memory pressure is
/// acceptable - it biases toward admitting a call, never rejecting one.
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Increment `key` and return the post-increment count. The key
    /// expires `ttl_seconds` after its first increment.
    async fn incr(&self, key: &str, ttl_seconds: u64) -> Result<u64, DomainError>;
}
