//! Idempotent bulk order completion
//!
//! A completion batch marks a set of orders as delivered by a courier at a
//! given time. The guard enforces two rules the surrounding CRUD plumbing
//! must be able to rely on:
//!
//! 1. **All-or-nothing existence gate**: if any referenced order does not
//!    exist, the whole batch fails validation and nothing is written.
//! 2. **First writer wins**: an order that already carries a completion keeps
//!    it. Re-completing is a successful no-op, not an error, so callers can
//!    retry a batch after a timeout without corrupting earlier results.
//!
//! The guard holds no lock across store calls. Two concurrent batches that
//! race on the same order may both observe it as incomplete; the store's
//! conditional write ([`CompletionStore::set_completion`]) resolves that race
//! so the stored record is attributable to exactly one writer.

use std::collections::HashSet;
use std::error::Error;
use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// A recorded completion: which courier delivered the order, and when.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    pub courier_id: i64,
    pub completed_at: DateTime<Utc>,
}

/// One entry of a completion batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionRequest {
    pub order_id: i64,
    pub courier_id: i64,
    pub completed_at: DateTime<Utc>,
}

/// The store contract the completion guard runs against.
///
/// This is the entire surface the guard needs from the persistence layer.
/// Calls are synchronous I/O from the guard's point of view and may block;
/// errors are propagated to the caller of
/// [`complete_batch`](CompletionGuard::complete_batch) unchanged.
#[async_trait]
pub trait CompletionStore {
    type Error;

    /// How many of the given order ids exist.
    async fn count_existing(&self, order_ids: &[i64]) -> Result<u64, Self::Error>;

    /// The order's current completion, if it has one. Asking about an order
    /// is not a write; the guard only calls this for ids that passed the
    /// existence gate.
    async fn completion_state(&self, order_id: i64) -> Result<Option<Completion>, Self::Error>;

    /// Record a completion for the order.
    ///
    /// Must be conditional on the order still being incomplete, so that a
    /// racing writer's second attempt becomes a no-op rather than an
    /// overwrite. The guard only calls this after locally observing an unset
    /// state.
    async fn set_completion(
        &self,
        order_id: i64,
        courier_id: i64,
        completed_at: DateTime<Utc>,
    ) -> Result<(), Self::Error>;
}

/// Why a completion batch was rejected.
#[derive(Debug)]
pub enum CompleteError<E> {
    /// The same order id appears more than once in the batch. Rejected
    /// whole, before any store access.
    DuplicateOrders(Vec<i64>),
    /// At least one referenced order does not exist. Rejected whole, nothing
    /// was written.
    UnknownOrders { requested: usize, existing: u64 },
    /// A store call failed; the underlying error is passed through.
    Store(E),
}

impl<E: fmt::Display> fmt::Display for CompleteError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompleteError::DuplicateOrders(ids) => {
                write!(f, "duplicate order ids in batch: {ids:?}")
            }
            CompleteError::UnknownOrders {
                requested,
                existing,
            } => write!(
                f,
                "batch references unknown orders: {existing} of {requested} ids exist"
            ),
            CompleteError::Store(err) => write!(f, "store error: {err}"),
        }
    }
}

impl<E: Error + 'static> Error for CompleteError<E> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            CompleteError::Store(err) => Some(err),
            _ => None,
        }
    }
}

/// Executes completion batches against a [`CompletionStore`].
///
/// The guard is stateless; it borrows the store and can be constructed per
/// call. All batch semantics live here so every store implementation gets
/// the same behavior.
pub struct CompletionGuard<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S> CompletionGuard<'a, S>
where
    S: CompletionStore + Sync + ?Sized,
{
    pub fn new(store: &'a S) -> Self {
        CompletionGuard { store }
    }

    /// Process a completion batch.
    ///
    /// On success returns the ids of all processed orders, including those
    /// that were already complete and were left untouched. The existence
    /// gate runs to completion before the first write; after it passes, each
    /// entry is an independent read-then-conditional-write, in batch order.
    pub async fn complete_batch(
        &self,
        requests: &[CompletionRequest],
    ) -> Result<Vec<i64>, CompleteError<S::Error>> {
        if requests.is_empty() {
            return Ok(Vec::new());
        }

        let mut ids = Vec::with_capacity(requests.len());
        let mut seen = HashSet::with_capacity(requests.len());
        let mut duplicates = Vec::new();
        for request in requests {
            if seen.insert(request.order_id) {
                ids.push(request.order_id);
            } else {
                duplicates.push(request.order_id);
            }
        }
        if !duplicates.is_empty() {
            duplicates.sort_unstable();
            duplicates.dedup();
            return Err(CompleteError::DuplicateOrders(duplicates));
        }

        let existing = self
            .store
            .count_existing(&ids)
            .await
            .map_err(CompleteError::Store)?;
        if existing < ids.len() as u64 {
            return Err(CompleteError::UnknownOrders {
                requested: ids.len(),
                existing,
            });
        }

        for request in requests {
            let state = self
                .store
                .completion_state(request.order_id)
                .await
                .map_err(CompleteError::Store)?;
            // Already completed: keep the original record and report success.
            if state.is_none() {
                self.store
                    .set_completion(request.order_id, request.courier_id, request.completed_at)
                    .await
                    .map_err(CompleteError::Store)?;
            }
        }

        Ok(ids)
    }
}
