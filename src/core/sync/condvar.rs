/*!
 * Condvar-Based Wait Strategy
 *
 * Portable emulation of a wait-queue-on-address using parking_lot's Mutex and
 * Condvar. One bucket per waited-on address lives in a process-wide sharded
 * map, created on first wait and removed when its last waiter leaves.
 *
 * # Lost wakeups
 *
 * Waiters compare the word under the bucket mutex and release it atomically
 * when they sleep; wakers take the same mutex after their store. A waker
 * therefore either finds the waiter asleep, or the waiter finds the new value.
 */

use super::traits::{WaitOutcome, WaitStrategy, WakeResult};
use crate::core::errors::SyncResult;
use ahash::RandomState;
use dashmap::DashMap;
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

/// Waiter state for a single address
struct Bucket {
    lock: Mutex<()>,
    condvar: Condvar,
    waiters: AtomicUsize,
}

impl Bucket {
    fn new() -> Self {
        Self {
            lock: Mutex::new(()),
            condvar: Condvar::new(),
            waiters: AtomicUsize::new(0),
        }
    }
}

type BucketTable = DashMap<usize, Arc<Bucket>, RandomState>;

fn table() -> &'static BucketTable {
    static TABLE: OnceLock<BucketTable> = OnceLock::new();
    TABLE.get_or_init(|| DashMap::with_hasher(RandomState::new()))
}

#[inline]
fn key_of(word: &AtomicU32) -> usize {
    word as *const AtomicU32 as usize
}

/// Condvar-based wait strategy
///
/// # Performance
///
/// - One map lookup plus a mutex round-trip per wait and per wake
/// - Works on every platform
/// - Waiters are only visible within the current process
#[derive(Debug, Default, Clone, Copy)]
pub struct CondvarWait;

impl CondvarWait {
    pub const fn new() -> Self {
        Self
    }

    /// Get or create the bucket for `key`, registering one waiter
    ///
    /// Registration happens under the map shard lock so it cannot interleave
    /// with the removal of an idle bucket.
    fn register(key: usize) -> Arc<Bucket> {
        let entry = table().entry(key).or_insert_with(|| Arc::new(Bucket::new()));
        entry.waiters.fetch_add(1, Ordering::AcqRel);
        Arc::clone(entry.value())
    }

    fn unregister(key: usize, bucket: &Bucket) {
        if bucket.waiters.fetch_sub(1, Ordering::AcqRel) == 1 {
            table().remove_if(&key, |_, b| b.waiters.load(Ordering::Acquire) == 0);
        }
    }
}

impl WaitStrategy for CondvarWait {
    fn wait(
        &self,
        word: &AtomicU32,
        expected: u32,
        timeout: Option<Duration>,
    ) -> SyncResult<WaitOutcome> {
        let key = key_of(word);
        let bucket = Self::register(key);

        let outcome = {
            let mut guard = bucket.lock.lock();
            if word.load(Ordering::Acquire) != expected {
                WaitOutcome::ValueMismatch
            } else if let Some(timeout) = timeout {
                if bucket.condvar.wait_for(&mut guard, timeout).timed_out() {
                    WaitOutcome::TimedOut
                } else {
                    WaitOutcome::Woken
                }
            } else {
                bucket.condvar.wait(&mut guard);
                WaitOutcome::Woken
            }
        };

        Self::unregister(key, &bucket);
        Ok(outcome)
    }

    fn wake(&self, word: &AtomicU32, max_count: u32) -> SyncResult<WakeResult> {
        let Some(bucket) = table()
            .get(&key_of(word))
            .map(|entry| Arc::clone(entry.value()))
        else {
            return Ok(WakeResult::NoWaiters);
        };

        let _guard = bucket.lock.lock();
        let mut woken = 0usize;
        while woken < max_count as usize && bucket.condvar.notify_one() {
            woken += 1;
        }
        Ok(WakeResult::from_count(woken))
    }

    fn name(&self) -> &'static str {
        "condvar"
    }
}
