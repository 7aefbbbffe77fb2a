//! Multi-dimensional fixed-window rate limiting.
//!
//! Every mutating operation is gated on two dimensions at once: the
//! source IP and the target subject. The counters live behind
//! [`RateLimitStore`], an expiring keyspace with an atomic increment,
//! so the limiting decision is shared across service instances.

mod memory;
mod service;
mod store;


pub use memory::MemoryRateLimitStore;
pub use service::{LimitAction, RateLimitDecision, RateLimitService};
pub use store::RateLimitStore;
