/*!
 * Wait Queue
 *
 * Cloneable handle over the configured wait strategy. Selected once from a
 * [`SyncConfig`]; every handle for the same strategy shares the same
 * process-wide (or kernel-wide) waiter state.
 */

use super::condvar::CondvarWait;
use super::config::{StrategyType, SyncConfig};
#[cfg(target_os = "linux")]
use super::futex::FutexWait;
use super::parking::ParkingWait;
use super::traits::{WaitOutcome, WaitStrategy, WakeResult};
use crate::core::errors::SyncResult;
use std::fmt;
use std::sync::atomic::AtomicU32;
use std::sync::Arc;
use std::time::Duration;

/// Address-keyed wait queue
///
/// # Examples
///
/// ```
/// use shm_sync::core::sync::{SyncConfig, WaitOutcome, WaitQueue};
/// use std::sync::atomic::AtomicU32;
/// use std::time::Duration;
///
/// let queue = WaitQueue::new(&SyncConfig::default());
/// let word = AtomicU32::new(1);
///
/// // The word does not hold 0, so this returns without sleeping
/// let outcome = queue.wait(&word, 0, Some(Duration::from_secs(1))).unwrap();
/// assert_eq!(outcome, WaitOutcome::ValueMismatch);
/// ```
#[derive(Clone)]
pub struct WaitQueue {
    strategy: Arc<dyn WaitStrategy>,
}

impl WaitQueue {
    /// Create a wait queue for the configured strategy
    pub fn new(config: &SyncConfig) -> Self {
        let strategy: Arc<dyn WaitStrategy> = match config.select_strategy() {
            #[cfg(target_os = "linux")]
            StrategyType::Futex => Arc::new(FutexWait::new()),
            StrategyType::Parking => Arc::new(ParkingWait::new()),
            // select_strategy never returns Auto, and only returns Futex on Linux
            _ => Arc::new(CondvarWait::new()),
        };

        Self { strategy }
    }

    /// Create with default configuration (auto-selects best strategy)
    pub fn with_defaults() -> Self {
        Self::new(&SyncConfig::default())
    }

    /// Wrap a custom strategy
    pub fn from_strategy(strategy: Arc<dyn WaitStrategy>) -> Self {
        Self { strategy }
    }

    /// Sleep while `word` holds `expected`, for at most `timeout`
    #[inline]
    pub fn wait(
        &self,
        word: &AtomicU32,
        expected: u32,
        timeout: Option<Duration>,
    ) -> SyncResult<WaitOutcome> {
        self.strategy.wait(word, expected, timeout)
    }

    /// Wake up to `max_count` waiters on `word`
    #[inline]
    pub fn wake(&self, word: &AtomicU32, max_count: u32) -> SyncResult<WakeResult> {
        self.strategy.wake(word, max_count)
    }

    /// True if the strategy reaches waiters in other processes
    pub fn is_cross_process(&self) -> bool {
        self.strategy.is_cross_process()
    }

    /// Get the name of the active strategy
    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }
}

impl Default for WaitQueue {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl fmt::Debug for WaitQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaitQueue")
            .field("strategy", &self.strategy_name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;
    use std::thread;

    fn queue_for(strategy: StrategyType) -> WaitQueue {
        WaitQueue::new(&SyncConfig {
            strategy,
            ..Default::default()
        })
    }

    #[test]
    fn test_strategy_selection() {
        assert_eq!(queue_for(StrategyType::Condvar).strategy_name(), "condvar");
        assert_eq!(queue_for(StrategyType::Parking).strategy_name(), "parking");
        assert!(!queue_for(StrategyType::Parking).is_cross_process());

        #[cfg(target_os = "linux")]
        {
            let queue = queue_for(StrategyType::Futex);
            assert_eq!(queue.strategy_name(), "futex");
            assert!(queue.is_cross_process());
        }
    }

    #[test]
    fn test_independent_handles_share_waiters() {
        for strategy in [StrategyType::Auto, StrategyType::Condvar, StrategyType::Parking] {
            let word = Arc::new(AtomicU32::new(0));
            let waiter_queue = queue_for(strategy);
            let waker_queue = queue_for(strategy);

            let word_clone = word.clone();
            let handle = thread::spawn(move || {
                waiter_queue.wait(&word_clone, 0, Some(Duration::from_secs(5)))
            });

            thread::sleep(Duration::from_millis(50));
            word.store(1, Ordering::Release);
            waker_queue.wake(&word, 1).unwrap();

            let outcome = handle.join().unwrap().unwrap();
            assert_ne!(outcome, WaitOutcome::TimedOut, "strategy {:?}", strategy);
        }
    }
}
