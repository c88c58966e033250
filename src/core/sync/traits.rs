/*!
 * Synchronization Traits
 *
 * The narrow platform interface every blocking backend implements: wait on
 * an address while it still holds an expected value, and wake sleepers on an
 * address.
 *
 * # Design
 *
 * The wait-for-value protocol in `word.rs` only talks to this trait, so a
 * backend can be swapped (kernel futex, condvar emulation, parking lot)
 * without touching the protocol.
 */

use crate::core::errors::SyncResult;
use std::sync::atomic::AtomicU32;
use std::time::Duration;

/// Outcome of a single blocking wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// Woken by a wake call, or spuriously
    Woken,
    /// The word no longer held the expected value when the backend checked it
    ValueMismatch,
    /// The timeout elapsed
    TimedOut,
}

/// Result of a wake operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeResult {
    /// Successfully woke N waiters (N >= 1)
    Woken(usize),
    /// No waiters were waiting
    NoWaiters,
}

impl WakeResult {
    pub(crate) fn from_count(count: usize) -> Self {
        if count == 0 {
            WakeResult::NoWaiters
        } else {
            WakeResult::Woken(count)
        }
    }

    /// Check if any waiters were woken
    #[inline(always)]
    pub fn is_woken(&self) -> bool {
        matches!(self, WakeResult::Woken(_))
    }

    /// Get number of woken waiters (0 if none)
    #[inline(always)]
    pub fn count(&self) -> usize {
        match self {
            WakeResult::Woken(n) => *n,
            WakeResult::NoWaiters => 0,
        }
    }
}

/// Blocking wait queue keyed by the address of a 32-bit word
///
/// Implementations must be:
/// - **Thread-safe**: callable from many threads at once
/// - **Atomic between check and sleep**: a wake issued after the word stops
///   holding `expected` must never be lost by a waiter that checked it
///
/// Waiter state must be shared by every instance of the same backend in the
/// process, so two handles created independently still see each other's
/// waiters.
pub trait WaitStrategy: Send + Sync {
    /// Sleep while `word` holds `expected`, for at most `timeout`
    ///
    /// Returns `ValueMismatch` without sleeping when the value already
    /// differs. `None` waits indefinitely.
    fn wait(
        &self,
        word: &AtomicU32,
        expected: u32,
        timeout: Option<Duration>,
    ) -> SyncResult<WaitOutcome>;

    /// Wake up to `max_count` waiters blocked on `word`
    fn wake(&self, word: &AtomicU32, max_count: u32) -> SyncResult<WakeResult>;

    /// True if waiters in other processes sharing the mapping are reachable
    fn is_cross_process(&self) -> bool {
        false
    }

    /// Get strategy name for debugging
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wake_result_count() {
        assert_eq!(WakeResult::from_count(0), WakeResult::NoWaiters);
        assert_eq!(WakeResult::from_count(3), WakeResult::Woken(3));
        assert_eq!(WakeResult::NoWaiters.count(), 0);
        assert!(WakeResult::Woken(1).is_woken());
        assert!(!WakeResult::NoWaiters.is_woken());
    }
}
