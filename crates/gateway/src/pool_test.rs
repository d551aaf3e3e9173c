//! Tests for the worker-context pool

use std::time::Duration;

use restin_protocol::loopback::LoopbackRuntime;

use crate::pool::WorkerPool;

fn pool(size: usize) -> WorkerPool {
    WorkerPool::new(size, &LoopbackRuntime::empty()).unwrap()
}

#[tokio::test]
async fn test_pool_fills_all_slots() {
    let pool = pool(3);
    assert_eq!(pool.size(), 3);

    let a = pool.acquire().await.unwrap();
    let b = pool.acquire().await.unwrap();
    let c = pool.acquire().await.unwrap();

    // All three slots are distinct
    let mut numbers = vec![a.nr(), b.nr(), c.nr()];
    numbers.sort_unstable();
    assert_eq!(numbers, vec![0, 1, 2]);
}

#[tokio::test]
async fn test_acquire_blocks_when_exhausted() {
    let pool = pool(1);
    let held = pool.acquire().await.unwrap();

    // Second acquire must wait for the lease to drop
    let waited = tokio::time::timeout(Duration::from_millis(50), pool.acquire()).await;
    assert!(waited.is_err(), "acquire should block while the slot is held");

    drop(held);
    let lease = tokio::time::timeout(Duration::from_millis(200), pool.acquire())
        .await
        .expect("slot is free again")
        .unwrap();
    assert_eq!(lease.nr(), 0);
}

#[tokio::test]
async fn test_drop_returns_slot_exactly_once() {
    let pool = pool(2);

    // Many lease/release cycles never leak a slot
    for _ in 0..50 {
        let a = pool.acquire().await.unwrap();
        let b = pool.acquire().await.unwrap();
        drop(a);
        drop(b);
    }

    let a = pool.acquire().await.unwrap();
    let b = pool.acquire().await.unwrap();
    assert_ne!(a.nr(), b.nr());
}

#[tokio::test]
async fn test_shutdown_waits_for_leases() {
    let pool = std::sync::Arc::new(pool(2));
    let lease = pool.acquire().await.unwrap();

    let drainer = {
        let pool = std::sync::Arc::clone(&pool);
        tokio::spawn(async move { pool.shutdown().await })
    };

    // Shutdown cannot finish while one slot is leased
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!drainer.is_finished());

    drop(lease);
    tokio::time::timeout(Duration::from_secs(1), drainer)
        .await
        .expect("shutdown completes once all slots are free")
        .unwrap();
}
