//! Core components of the lastmile service
//!
//! This module contains the two building blocks everything else wires up:
//! - [`bucket`]: token-bucket rate limiting for per-operation admission
//! - [`completion`]: the idempotent bulk order-completion guard

pub mod bucket;
pub mod completion;

#[cfg(test)]
mod tests;

pub use bucket::{DEFAULT_CAPACITY, DEFAULT_REFILL_RATE, RateLimiter, TokenBucket};
pub use completion::{
    CompleteError, Completion, CompletionGuard, CompletionRequest, CompletionStore,
};
