/*!
 * Futex-Based Wait Strategy
 *
 * Direct `SYS_futex` calls on the word's address. The kernel keys its wait
 * queues by the physical page behind the address, so waiters in any process
 * that maps the same shared memory are reachable.
 *
 * # Design
 *
 * - `FUTEX_WAIT` compares `*addr == expected` and enqueues the caller
 *   atomically, which is what rules out lost wakeups
 * - The non-private ops are used on purpose: `FUTEX_PRIVATE_FLAG` would limit
 *   the queue to the current address space
 * - Stateless: all waiter bookkeeping lives in the kernel
 */

use super::traits::{WaitOutcome, WaitStrategy, WakeResult};
use crate::core::errors::{SyncError, SyncResult};
use std::io;
use std::mem;
use std::ptr;
use std::sync::atomic::AtomicU32;
use std::time::Duration;

/// Kernel futex wait strategy
#[derive(Debug, Default, Clone, Copy)]
pub struct FutexWait;

impl FutexWait {
    pub const fn new() -> Self {
        Self
    }
}

#[inline]
fn futex(
    word: &AtomicU32,
    op: libc::c_int,
    val: u32,
    timeout: *const libc::timespec,
) -> libc::c_long {
    // SAFETY: `word` is a live reference for the duration of the call; the
    // kernel only reads the timespec and never writes through the address
    // for WAIT/WAKE.
    unsafe {
        libc::syscall(
            libc::SYS_futex,
            word as *const AtomicU32,
            op,
            val,
            timeout,
            ptr::null::<u32>(),
            0u32,
        )
    }
}

/// Relative timeout for FUTEX_WAIT, saturating at the largest representable value
fn to_timespec(timeout: Duration) -> libc::timespec {
    let secs = timeout.as_secs().min(libc::time_t::MAX as u64);
    // SAFETY: timespec is plain data; zeroing covers padding fields some targets carry
    let mut ts: libc::timespec = unsafe { mem::zeroed() };
    ts.tv_sec = secs as libc::time_t;
    ts.tv_nsec = timeout.subsec_nanos() as _;
    ts
}

impl WaitStrategy for FutexWait {
    fn wait(
        &self,
        word: &AtomicU32,
        expected: u32,
        timeout: Option<Duration>,
    ) -> SyncResult<WaitOutcome> {
        let ts = timeout.map(to_timespec);
        let ts_ptr = ts
            .as_ref()
            .map_or(ptr::null(), |ts| ts as *const libc::timespec);

        if futex(word, libc::FUTEX_WAIT, expected, ts_ptr) == 0 {
            return Ok(WaitOutcome::Woken);
        }

        let err = io::Error::last_os_error();
        match err.raw_os_error() {
            Some(libc::ETIMEDOUT) => Ok(WaitOutcome::TimedOut),
            Some(libc::EAGAIN) => Ok(WaitOutcome::ValueMismatch),
            _ => Err(SyncError::from_io(&err)),
        }
    }

    fn wake(&self, word: &AtomicU32, max_count: u32) -> SyncResult<WakeResult> {
        let count = max_count.min(i32::MAX as u32);
        let woken = futex(word, libc::FUTEX_WAKE, count, ptr::null());
        if woken < 0 {
            return Err(SyncError::last_os_error());
        }
        Ok(WakeResult::from_count(woken as usize))
    }

    fn is_cross_process(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "futex"
    }
}
