//! # lastmile
//!
//! The admission-control and write-consistency core of the lastmile delivery
//! service.
//!
//! ## Overview
//!
//! This crate contains the two pieces of the service that are genuinely
//! stateful and order-sensitive, kept free of HTTP and SQL so they can be
//! tested in isolation:
//!
//! - [`RateLimiter`]: a token-bucket admission gate. One instance guards one
//!   operation; the bucket refills continuously at a fixed rate and admits a
//!   request only when a whole token is available. The check never blocks and
//!   never errors, it just answers yes or no.
//! - [`CompletionGuard`]: the idempotent bulk order-completion algorithm. It
//!   validates a batch against an existence gate (all ids must exist or
//!   nothing is written), then completes each order at most once; an order
//!   completed earlier keeps its original courier and timestamp.
//!
//! ## Quick start
//!
//! ```
//! use lastmile::RateLimiter;
//!
//! // 10-token burst, refilled at 10 tokens per second
//! let limiter = RateLimiter::new(10, 10);
//!
//! if limiter.try_admit() {
//!     // proceed with the guarded operation
//! } else {
//!     // reject immediately, no retry
//! }
//! ```
//!
//! The completion guard is generic over a [`CompletionStore`], the narrow
//! contract the persistence layer has to satisfy: an existence count, a
//! per-order completion read, and a conditional completion write. The server
//! crate implements it over PostgreSQL; tests implement it over a hash map.
//!
//! ## Thread safety
//!
//! [`RateLimiter`] is internally synchronized and can be shared behind an
//! `Arc`; the refill-and-deduct step is atomic with respect to concurrent
//! callers. [`CompletionGuard`] holds no lock of its own across store calls;
//! concurrent batches touching the same order are serialized by the store's
//! conditional write, not in process.

pub mod core;

pub use crate::core::{
    CompleteError, Completion, CompletionGuard, CompletionRequest, CompletionStore,
    DEFAULT_CAPACITY, DEFAULT_REFILL_RATE, RateLimiter, TokenBucket,
};
