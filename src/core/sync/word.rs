/*!
 * Synchronized Word
 *
 * A 32-bit word inside a caller-owned region with acquire/release accessors
 * and a wait-for-value protocol layered on a [`WaitQueue`].
 *
 * # Protocol
 *
 * `wait_for_value` tries, in order:
 * 1. A single acquire load (no syscall regardless of timeout)
 * 2. A bounded spin of relaxed loads with a CPU spin hint
 * 3. A blocking loop: load, then sleep while the word still holds what was
 *    loaded. Wakes and value-mismatch races only trigger a re-check.
 *
 * Only the kernel wait in step 3 blocks. Termination relies on the timeout or
 * on some other context storing the desired value and waking.
 */

use super::config::{InterruptPolicy, SyncConfig};
use super::traits::WaitOutcome;
use super::wait::WaitQueue;
use crate::core::errors::SyncResult;
use crate::core::hints::{likely, unlikely};
use crate::memory::region::SharedRegion;
use std::fmt;
use std::hint;
use std::ptr::NonNull;
use std::sync::atomic::{fence, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

/// Futex-style word bound to a shared region
///
/// Cloning is cheap and yields another handle to the same word; every handle
/// keeps the region alive.
///
/// # Examples
///
/// ```
/// use shm_sync::{HeapRegion, SyncWord};
/// use std::sync::Arc;
/// use std::thread;
/// use std::time::Duration;
///
/// let word = SyncWord::bind(Arc::new(HeapRegion::with_words(1))).unwrap();
/// let peer = word.clone();
///
/// let handle = thread::spawn(move || peer.wait_for_value(9, Some(Duration::from_secs(5))));
///
/// word.store(9);
/// word.wake(1).unwrap();
/// assert!(handle.join().unwrap().unwrap());
/// ```
#[derive(Clone)]
pub struct SyncWord {
    word: NonNull<AtomicU32>,
    offset: usize,
    region: Arc<dyn SharedRegion>,
    queue: WaitQueue,
    spin_limit: u32,
    interrupts: InterruptPolicy,
}

// SAFETY: the word is only accessed atomically and the region it points into
// is retained by `region`, which is itself Send + Sync.
unsafe impl Send for SyncWord {}
unsafe impl Sync for SyncWord {}

impl SyncWord {
    /// Bind to the word at the start of `region`
    ///
    /// Fails with `InvalidArgument` if the region is shorter than 4 bytes or
    /// its start is not 4-byte aligned.
    pub fn bind(region: Arc<dyn SharedRegion>) -> SyncResult<Self> {
        Self::bind_at(region, 0)
    }

    /// Bind to the word at byte `offset` inside `region`
    pub fn bind_at(region: Arc<dyn SharedRegion>, offset: usize) -> SyncResult<Self> {
        Self::bind_with(region, offset, SyncConfig::default())
    }

    /// Bind with an explicit configuration
    pub fn bind_with(
        region: Arc<dyn SharedRegion>,
        offset: usize,
        config: SyncConfig,
    ) -> SyncResult<Self> {
        // The view borrows `region` only for this statement
        let word = region.view().word_at(offset)?;
        let queue = WaitQueue::new(&config);

        debug!(
            address = ?word,
            offset,
            region_len = region.len(),
            strategy = queue.strategy_name(),
            spin_limit = config.spin_limit,
            "Bound synchronized word"
        );

        Ok(Self {
            word,
            offset,
            region,
            queue,
            spin_limit: config.spin_limit,
            interrupts: config.interrupts,
        })
    }

    /// Replace the wait queue (custom strategies, testing)
    ///
    /// All handles that wait and wake on the same word must use queues of the
    /// same strategy.
    pub fn with_queue(mut self, queue: WaitQueue) -> Self {
        self.queue = queue;
        self
    }

    #[inline(always)]
    fn atomic(&self) -> &AtomicU32 {
        // SAFETY: validated non-null, aligned and in bounds at bind time, and
        // the region is retained for as long as `self` exists.
        unsafe { self.word.as_ref() }
    }

    /// Current value (acquire)
    #[inline]
    pub fn load(&self) -> u32 {
        self.atomic().load(Ordering::Acquire)
    }

    /// Publish a value (release)
    ///
    /// Writes made before the store are visible to any context that observes
    /// `value` through `load` or `wait_for_value`. Call `wake` afterwards to
    /// rouse sleepers.
    #[inline]
    pub fn store(&self, value: u32) {
        self.atomic().store(value, Ordering::Release);
    }

    /// Wake up to `max_count` waiters; values `<= 0` are treated as 1
    ///
    /// Returns how many were woken, which may be 0.
    pub fn wake(&self, max_count: i32) -> SyncResult<u32> {
        let count = if max_count <= 0 { 1 } else { max_count as u32 };

        match self.queue.wake(self.atomic(), count) {
            Ok(result) => Ok(u32::try_from(result.count()).unwrap_or(u32::MAX)),
            Err(e) => {
                warn!(error = %e, offset = self.offset, "Wake failed");
                Err(e)
            }
        }
    }

    /// Wake every waiter
    pub fn wake_all(&self) -> SyncResult<u32> {
        self.wake(i32::MAX)
    }

    /// Block until the word holds `desired`
    ///
    /// Returns `Ok(true)` once `desired` is observed (with acquire ordering),
    /// `Ok(false)` when `timeout` elapses first. `None` waits indefinitely.
    /// Platform failures surface as `SyncError::Os`; an interrupted wait does
    /// too unless the word was configured with `InterruptPolicy::Retry`.
    pub fn wait_for_value(&self, desired: u32, timeout: Option<Duration>) -> SyncResult<bool> {
        let word = self.atomic();

        // Fast path
        if likely(word.load(Ordering::Acquire) == desired) {
            return Ok(true);
        }

        // Bounded spin
        for _ in 0..self.spin_limit {
            hint::spin_loop();
            if word.load(Ordering::Relaxed) == desired {
                // Pairs with the release store that published `desired`
                fence(Ordering::Acquire);
                return Ok(true);
            }
        }

        self.block_until(desired, timeout)
    }

    fn block_until(&self, desired: u32, timeout: Option<Duration>) -> SyncResult<bool> {
        let word = self.atomic();
        // An unrepresentable deadline is treated as no deadline
        let deadline = timeout.and_then(|t| Instant::now().checked_add(t));

        loop {
            let current = word.load(Ordering::Acquire);
            if current == desired {
                return Ok(true);
            }

            let remaining = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if unlikely(now >= deadline) {
                        trace!(desired, current, "Wait deadline passed");
                        return Ok(false);
                    }
                    Some(deadline - now)
                }
                None => None,
            };

            match self.queue.wait(word, current, remaining) {
                Ok(WaitOutcome::Woken) | Ok(WaitOutcome::ValueMismatch) => continue,
                Ok(WaitOutcome::TimedOut) => {
                    trace!(desired, current, "Wait timed out");
                    return Ok(false);
                }
                Err(e) if e.is_interrupted() && self.interrupts == InterruptPolicy::Retry => {
                    trace!("Wait interrupted, retrying");
                    continue;
                }
                Err(e) => {
                    warn!(error = %e, desired, offset = self.offset, "Wait failed");
                    return Err(e);
                }
            }
        }
    }

    /// Async-compatible wait using tokio::spawn_blocking
    ///
    /// The protocol runs unchanged on the blocking pool, so the runtime's
    /// worker threads never sleep in the kernel.
    #[cfg(feature = "tokio")]
    pub async fn wait_for_value_async(
        &self,
        desired: u32,
        timeout: Option<Duration>,
    ) -> SyncResult<bool> {
        let word = self.clone();
        tokio::task::spawn_blocking(move || word.wait_for_value(desired, timeout))
            .await
            .map_err(|_| crate::core::errors::SyncError::Cancelled)?
    }

    /// The retained region
    pub fn region(&self) -> &Arc<dyn SharedRegion> {
        &self.region
    }

    /// Byte offset of the word inside its region
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Address of the word
    pub fn as_ptr(&self) -> *const AtomicU32 {
        self.word.as_ptr()
    }

    pub fn spin_limit(&self) -> u32 {
        self.spin_limit
    }

    pub fn interrupt_policy(&self) -> InterruptPolicy {
        self.interrupts
    }

    pub fn queue(&self) -> &WaitQueue {
        &self.queue
    }

    /// Get the name of the active strategy
    pub fn strategy_name(&self) -> &'static str {
        self.queue.strategy_name()
    }
}

impl fmt::Debug for SyncWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncWord")
            .field("address", &self.word)
            .field("offset", &self.offset)
            .field("value", &self.load())
            .field("strategy", &self.strategy_name())
            .finish()
    }
}
