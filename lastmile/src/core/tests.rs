use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use super::bucket::{RateLimiter, TokenBucket};
use super::completion::{
    CompleteError, Completion, CompletionGuard, CompletionRequest, CompletionStore,
};

#[test]
fn bucket_admits_full_burst_then_denies() {
    let limiter = RateLimiter::new(10, 10);
    let now = Instant::now();

    for i in 0..10 {
        assert!(
            limiter.try_admit_at(now),
            "request {} should be admitted from a full bucket",
            i + 1
        );
    }
    assert!(!limiter.try_admit_at(now), "request 11 should be denied");
}

#[test]
fn bucket_recovers_after_refill_interval() {
    let limiter = RateLimiter::new(10, 10);
    let now = Instant::now();

    for _ in 0..10 {
        assert!(limiter.try_admit_at(now));
    }
    assert!(!limiter.try_admit_at(now));

    // One second at 10 tokens/s restores the full burst.
    let later = now + Duration::from_secs(1);
    for i in 0..10 {
        assert!(
            limiter.try_admit_at(later),
            "request {} should be admitted after refill",
            i + 1
        );
    }
    assert!(!limiter.try_admit_at(later));
}

#[test]
fn bucket_never_refills_past_capacity() {
    let limiter = RateLimiter::new(10, 10);
    let now = Instant::now();
    assert!(limiter.try_admit_at(now));

    // A long idle gap must not grant more than capacity.
    let later = now + Duration::from_secs(3600);
    let mut admitted = 0;
    while limiter.try_admit_at(later) {
        admitted += 1;
    }
    assert_eq!(admitted, 10);
}

#[test]
fn bucket_refills_fractionally() {
    let mut bucket = TokenBucket::new(10, 10);
    let now = Instant::now();

    for _ in 0..10 {
        assert!(bucket.try_admit_at(now));
    }

    // Half a second grants five whole tokens back.
    let later = now + Duration::from_millis(500);
    for i in 0..5 {
        assert!(bucket.try_admit_at(later), "request {} after 500ms", i + 1);
    }
    assert!(!bucket.try_admit_at(later));
}

#[test]
fn limiters_are_independent() {
    let a = RateLimiter::new(10, 10);
    let b = RateLimiter::new(10, 10);
    let now = Instant::now();

    while a.try_admit_at(now) {}
    assert!(b.try_admit_at(now), "exhausting one limiter must not starve another");
}

#[test]
fn concurrent_callers_admit_exactly_capacity() {
    let limiter = Arc::new(RateLimiter::new(10, 10));
    let threads = 50;
    let barrier = Arc::new(Barrier::new(threads));
    let admitted = Arc::new(AtomicUsize::new(0));
    // Fixed clock reading: no refill can happen during the race.
    let now = Instant::now();

    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let limiter = Arc::clone(&limiter);
            let barrier = Arc::clone(&barrier);
            let admitted = Arc::clone(&admitted);
            thread::spawn(move || {
                barrier.wait();
                if limiter.try_admit_at(now) {
                    admitted.fetch_add(1, Ordering::SeqCst);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(admitted.load(Ordering::SeqCst), 10);
}

// --- completion guard ---

/// In-memory completion store that counts every call, so tests can assert
/// a rejected batch produced no store traffic at all.
#[derive(Default)]
struct MemStore {
    orders: Mutex<HashMap<i64, Option<Completion>>>,
    calls: AtomicUsize,
}

impl MemStore {
    fn with_orders(ids: &[i64]) -> Self {
        let store = MemStore::default();
        {
            let mut orders = store.orders.lock().unwrap();
            for &id in ids {
                orders.insert(id, None);
            }
        }
        store
    }

    fn completed(&self, order_id: i64) -> Option<Completion> {
        self.orders.lock().unwrap().get(&order_id).copied().flatten()
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionStore for MemStore {
    type Error = String;

    async fn count_existing(&self, order_ids: &[i64]) -> Result<u64, String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let orders = self.orders.lock().unwrap();
        Ok(order_ids.iter().filter(|id| orders.contains_key(id)).count() as u64)
    }

    async fn completion_state(&self, order_id: i64) -> Result<Option<Completion>, String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.orders.lock().unwrap().get(&order_id).copied().flatten())
    }

    async fn set_completion(
        &self,
        order_id: i64,
        courier_id: i64,
        completed_at: DateTime<Utc>,
    ) -> Result<(), String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut orders = self.orders.lock().unwrap();
        let slot = orders
            .get_mut(&order_id)
            .ok_or_else(|| format!("order {order_id} does not exist"))?;
        if slot.is_none() {
            *slot = Some(Completion {
                courier_id,
                completed_at,
            });
        }
        Ok(())
    }
}

/// Store whose every call fails, for error propagation tests.
struct BrokenStore;

#[async_trait]
impl CompletionStore for BrokenStore {
    type Error = String;

    async fn count_existing(&self, _order_ids: &[i64]) -> Result<u64, String> {
        Err("connection reset".to_string())
    }

    async fn completion_state(&self, _order_id: i64) -> Result<Option<Completion>, String> {
        Err("connection reset".to_string())
    }

    async fn set_completion(
        &self,
        _order_id: i64,
        _courier_id: i64,
        _completed_at: DateTime<Utc>,
    ) -> Result<(), String> {
        Err("connection reset".to_string())
    }
}

fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2023, 5, 1, hour, 0, 0).unwrap()
}

fn request(order_id: i64, courier_id: i64, hour: u32) -> CompletionRequest {
    CompletionRequest {
        order_id,
        courier_id,
        completed_at: at(hour),
    }
}

#[tokio::test]
async fn completes_a_fresh_batch() {
    let store = MemStore::with_orders(&[1, 2]);
    let guard = CompletionGuard::new(&store);

    let done = guard
        .complete_batch(&[request(1, 10, 9), request(2, 11, 10)])
        .await
        .unwrap();

    assert_eq!(done, vec![1, 2]);
    assert_eq!(store.completed(1).unwrap().courier_id, 10);
    assert_eq!(store.completed(2).unwrap().courier_id, 11);
}

#[tokio::test]
async fn unknown_id_rejects_whole_batch() {
    let store = MemStore::with_orders(&[1]);
    let guard = CompletionGuard::new(&store);

    let err = guard
        .complete_batch(&[request(1, 10, 9), request(999, 10, 9)])
        .await
        .unwrap_err();

    match err {
        CompleteError::UnknownOrders {
            requested,
            existing,
        } => {
            assert_eq!(requested, 2);
            assert_eq!(existing, 1);
        }
        other => panic!("expected UnknownOrders, got {other:?}"),
    }
    // The valid order was not touched.
    assert!(store.completed(1).is_none());
}

#[tokio::test]
async fn recompletion_keeps_first_record() {
    let store = MemStore::with_orders(&[7]);
    let guard = CompletionGuard::new(&store);

    let first = guard.complete_batch(&[request(7, 1, 9)]).await.unwrap();
    let second = guard.complete_batch(&[request(7, 2, 15)]).await.unwrap();

    // Both batches succeed and report the order.
    assert_eq!(first, vec![7]);
    assert_eq!(second, vec![7]);

    // The first writer's record survives the second batch.
    let completion = store.completed(7).unwrap();
    assert_eq!(completion.courier_id, 1);
    assert_eq!(completion.completed_at, at(9));
}

#[tokio::test]
async fn mixed_batch_skips_already_completed() {
    let store = MemStore::with_orders(&[1, 2]);
    let guard = CompletionGuard::new(&store);

    guard.complete_batch(&[request(1, 5, 9)]).await.unwrap();
    let done = guard
        .complete_batch(&[request(1, 6, 12), request(2, 6, 12)])
        .await
        .unwrap();

    assert_eq!(done, vec![1, 2]);
    assert_eq!(store.completed(1).unwrap().courier_id, 5);
    assert_eq!(store.completed(2).unwrap().courier_id, 6);
}

#[tokio::test]
async fn empty_batch_touches_nothing() {
    let store = MemStore::with_orders(&[1]);
    let guard = CompletionGuard::new(&store);

    let done = guard.complete_batch(&[]).await.unwrap();

    assert!(done.is_empty());
    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn duplicate_ids_reject_whole_batch() {
    let store = MemStore::with_orders(&[5]);
    let guard = CompletionGuard::new(&store);

    let err = guard
        .complete_batch(&[request(5, 1, 9), request(5, 2, 10)])
        .await
        .unwrap_err();

    match err {
        CompleteError::DuplicateOrders(ids) => assert_eq!(ids, vec![5]),
        other => panic!("expected DuplicateOrders, got {other:?}"),
    }
    assert!(store.completed(5).is_none());
    // Duplicates are caught before the store is consulted.
    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn store_errors_propagate_unchanged() {
    let guard = CompletionGuard::new(&BrokenStore);

    let err = guard.complete_batch(&[request(1, 1, 9)]).await.unwrap_err();

    match err {
        CompleteError::Store(msg) => assert_eq!(msg, "connection reset"),
        other => panic!("expected Store, got {other:?}"),
    }
}
