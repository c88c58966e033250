/*!
 * Async Wait Tests
 *
 * wait_for_value_async bridges the blocking protocol onto tokio's blocking pool
 */

#![cfg(feature = "tokio")]

use shm_sync::{HeapRegion, SyncWord};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_async_wait_released_by_store() {
    let word = SyncWord::bind(Arc::new(HeapRegion::with_words(1))).unwrap();
    let waker = word.clone();

    let waiter = tokio::spawn(async move {
        word.wait_for_value_async(6, Some(Duration::from_secs(5))).await
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    waker.store(6);
    waker.wake(1).unwrap();

    assert!(waiter.await.unwrap().unwrap());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_async_wait_times_out() {
    let word = SyncWord::bind(Arc::new(HeapRegion::with_words(1))).unwrap();

    let start = Instant::now();
    let reached = word
        .wait_for_value_async(1, Some(Duration::from_millis(20)))
        .await
        .unwrap();

    assert!(!reached);
    assert!(start.elapsed() >= Duration::from_millis(20));
}
