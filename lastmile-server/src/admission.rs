//! Per-operation admission control
//!
//! Every API operation is guarded by its own token bucket; the buckets are
//! created once at startup and live for the process lifetime. Operations are
//! identified by an enumerated tag rather than a string key, so there is no
//! per-request lookup cost and no way to misspell a handler name at a call
//! site.

use lastmile::RateLimiter;

/// One tag per guarded operation.
///
/// The discriminant doubles as the index into the limiter array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Ping,
    ListCouriers,
    GetCourier,
    CourierMeta,
    CreateCouriers,
    ListOrders,
    GetOrder,
    CreateOrders,
    CompleteOrders,
}

impl Operation {
    pub const ALL: [Operation; 9] = [
        Operation::Ping,
        Operation::ListCouriers,
        Operation::GetCourier,
        Operation::CourierMeta,
        Operation::CreateCouriers,
        Operation::ListOrders,
        Operation::GetOrder,
        Operation::CreateOrders,
        Operation::CompleteOrders,
    ];
}

/// The per-operation limiter registry.
///
/// Limiters are fully independent: exhausting one operation's budget never
/// starves another. All buckets share the same capacity and refill rate,
/// taken from [`LimiterConfig`](crate::config::LimiterConfig) at startup.
#[derive(Debug)]
pub struct AdmissionControl {
    limiters: [RateLimiter; Operation::ALL.len()],
}

impl AdmissionControl {
    /// Build one full bucket per operation.
    pub fn new(capacity: u32, refill_rate: u32) -> Self {
        AdmissionControl {
            limiters: std::array::from_fn(|_| RateLimiter::new(capacity, refill_rate)),
        }
    }

    /// Admit or deny a call to the given operation. Never blocks.
    pub fn admit(&self, operation: Operation) -> bool {
        self.limiters[operation as usize].try_admit()
    }
}

impl Default for AdmissionControl {
    fn default() -> Self {
        AdmissionControl::new(lastmile::DEFAULT_CAPACITY, lastmile::DEFAULT_REFILL_RATE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admits_burst_then_denies() {
        let admission = AdmissionControl::new(10, 10);

        for i in 0..10 {
            assert!(
                admission.admit(Operation::ListOrders),
                "request {} should be admitted",
                i + 1
            );
        }
        assert!(!admission.admit(Operation::ListOrders));
    }

    #[test]
    fn test_operations_have_independent_budgets() {
        let admission = AdmissionControl::new(10, 10);

        while admission.admit(Operation::CreateOrders) {}

        // Exhausting one operation leaves every other untouched.
        for operation in Operation::ALL {
            if operation != Operation::CreateOrders {
                assert!(
                    admission.admit(operation),
                    "{operation:?} should not share a bucket with CreateOrders"
                );
            }
        }
    }

    #[test]
    fn test_every_operation_is_guarded() {
        let admission = AdmissionControl::new(1, 1);

        for operation in Operation::ALL {
            assert!(admission.admit(operation));
            assert!(
                !admission.admit(operation),
                "{operation:?} should be denied once its single token is spent"
            );
        }
    }
}
