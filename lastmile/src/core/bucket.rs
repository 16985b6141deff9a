//! Token-bucket admission control
//!
//! A bucket holds up to `capacity` tokens and refills continuously at
//! `refill_rate` tokens per second of elapsed wall time. Each admitted call
//! consumes one token; a call that finds less than a whole token is denied
//! immediately. Over any window of length `Δ` the number of admissions is
//! bounded by `capacity + refill_rate · Δ`.
//!
//! [`TokenBucket`] is the bare state machine driven by an explicit clock, so
//! tests can replay any timing they want. [`RateLimiter`] wraps it in a mutex
//! and reads the clock itself; that is the type the service shares across
//! request handlers.

use std::sync::Mutex;
use std::time::Instant;

/// Default burst capacity for a guarded operation.
pub const DEFAULT_CAPACITY: u32 = 10;

/// Default refill rate in tokens per second.
pub const DEFAULT_REFILL_RATE: u32 = 10;

/// Token-bucket state machine.
///
/// Not synchronized; callers that share a bucket across threads want
/// [`RateLimiter`] instead. The bucket starts full, so a fresh instance
/// admits a burst of `capacity` calls before the refill rate takes over.
#[derive(Debug)]
pub struct TokenBucket {
    capacity: f64,
    refill_rate: f64,
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    /// Create a full bucket with the given capacity and refill rate
    /// (tokens per second).
    pub fn new(capacity: u32, refill_rate: u32) -> Self {
        TokenBucket {
            capacity: f64::from(capacity),
            refill_rate: f64::from(refill_rate),
            tokens: f64::from(capacity),
            last_refill: Instant::now(),
        }
    }

    /// Grant tokens for the time elapsed since the last refill, capped at
    /// capacity. `tokens` stays fractional so sub-second gaps still count.
    fn refill(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill);
        self.tokens = (self.tokens + elapsed.as_secs_f64() * self.refill_rate).min(self.capacity);
        self.last_refill = now;
    }

    /// Refill for the elapsed time, then admit the call if a whole token is
    /// available. Refill and deduct happen as one step against the same
    /// `now`, so the bucket invariants hold between any two calls.
    pub fn try_admit_at(&mut self, now: Instant) -> bool {
        self.refill(now);
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Thread-safe token-bucket rate limiter.
///
/// One instance guards one operation for the lifetime of the process;
/// instances are fully independent. The check-and-deduct sequence runs under
/// a single mutex, which is held for arithmetic only.
///
/// # Example
///
/// ```
/// use lastmile::RateLimiter;
///
/// let limiter = RateLimiter::new(10, 10);
/// assert!(limiter.try_admit());
/// ```
#[derive(Debug)]
pub struct RateLimiter {
    bucket: Mutex<TokenBucket>,
}

impl RateLimiter {
    /// Create a limiter with the given burst capacity and refill rate
    /// (tokens per second). The bucket starts full.
    pub fn new(capacity: u32, refill_rate: u32) -> Self {
        RateLimiter {
            bucket: Mutex::new(TokenBucket::new(capacity, refill_rate)),
        }
    }

    /// Check whether a call is admitted right now.
    ///
    /// Never blocks on anything but the brief internal lock and never
    /// errors; a denied caller must reject the request without side effects
    /// rather than retry here.
    pub fn try_admit(&self) -> bool {
        self.try_admit_at(Instant::now())
    }

    /// [`try_admit`](Self::try_admit) against an explicit clock reading.
    pub fn try_admit_at(&self, now: Instant) -> bool {
        // A poisoned mutex only means another caller panicked mid-update;
        // the numeric state is still consistent, so keep serving.
        let mut bucket = match self.bucket.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        bucket.try_admit_at(now)
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        RateLimiter::new(DEFAULT_CAPACITY, DEFAULT_REFILL_RATE)
    }
}
