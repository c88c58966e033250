/*!
 * Parking-Lot Wait Strategy
 *
 * Uses parking_lot_core's global parking lot keyed by the word's address.
 * The validate callback re-reads the word while the parking lot's bucket
 * lock is held, which gives the same check-then-sleep atomicity as a futex.
 *
 * # Design
 *
 * - Zero allocations after the parking lot's hash table has grown
 * - Stateless: waiters live in parking_lot_core's process-wide table
 * - Process-local only
 */

use super::traits::{WaitOutcome, WaitStrategy, WakeResult};
use crate::core::errors::SyncResult;
use parking_lot_core::{
    park, unpark_filter, FilterOp, ParkResult, DEFAULT_PARK_TOKEN, DEFAULT_UNPARK_TOKEN,
};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

/// Parking-lot wait strategy
#[derive(Debug, Default, Clone, Copy)]
pub struct ParkingWait;

impl ParkingWait {
    pub const fn new() -> Self {
        Self
    }
}

#[inline]
fn key_of(word: &AtomicU32) -> usize {
    word as *const AtomicU32 as usize
}

impl WaitStrategy for ParkingWait {
    fn wait(
        &self,
        word: &AtomicU32,
        expected: u32,
        timeout: Option<Duration>,
    ) -> SyncResult<WaitOutcome> {
        // An unrepresentable deadline waits forever
        let deadline = timeout.and_then(|t| Instant::now().checked_add(t));

        // SAFETY: the key is the address of a live word; no parking_lot lock
        // lives at that address, and the callbacks do not panic or park.
        let result = unsafe {
            park(
                key_of(word),
                || word.load(Ordering::Acquire) == expected,
                || {},
                |_, _| {},
                DEFAULT_PARK_TOKEN,
                deadline,
            )
        };

        Ok(match result {
            ParkResult::Unparked(_) => WaitOutcome::Woken,
            ParkResult::Invalid => WaitOutcome::ValueMismatch,
            ParkResult::TimedOut => WaitOutcome::TimedOut,
        })
    }

    fn wake(&self, word: &AtomicU32, max_count: u32) -> SyncResult<WakeResult> {
        let mut remaining = max_count;

        // SAFETY: same key as `wait`; the callbacks do not panic or park.
        let result = unsafe {
            unpark_filter(
                key_of(word),
                |_| {
                    if remaining == 0 {
                        return FilterOp::Stop;
                    }
                    remaining -= 1;
                    FilterOp::Unpark
                },
                |_| DEFAULT_UNPARK_TOKEN,
            )
        };

        Ok(WakeResult::from_count(result.unparked_threads))
    }

    fn name(&self) -> &'static str {
        "parking"
    }
}
