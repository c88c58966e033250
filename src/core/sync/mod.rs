/*!
 * Synchronization Primitives
 *
 * A futex-style 32-bit word living in caller-provided (possibly shared)
 * memory, plus the wait queues it blocks on:
 * - Futex-based (Linux) for cross-process waits with minimal overhead
 * - Condvar-based (cross-platform) emulation
 * - Parking-lot-based emulation
 *
 * # Architecture
 *
 * `SyncWord` implements load/store/wake/wait_for_value and only talks to a
 * `WaitQueue`, which wraps whichever `WaitStrategy` the `SyncConfig` selects.
 *
 * # Use Cases
 *
 * - **Request/response handoff**: one side stores a state and wakes, the
 *   other waits for that state
 * - **IPC synchronization**: coordinate processes through a shared mapping
 */

mod condvar;
mod config;
#[cfg(target_os = "linux")]
mod futex;
mod parking;
mod traits;
mod wait;
mod word;

pub use config::{
    InterruptPolicy, StrategyType, SyncConfig, DEFAULT_SPIN_LIMIT, ENV_RETRY_EINTR,
    ENV_SPIN_LIMIT, ENV_STRATEGY,
};
pub use traits::{WaitOutcome, WaitStrategy, WakeResult};
pub use wait::WaitQueue;
pub use word::SyncWord;

// Re-export specific strategies for advanced users
pub use condvar::CondvarWait;
#[cfg(target_os = "linux")]
pub use futex::FutexWait;
pub use parking::ParkingWait;
