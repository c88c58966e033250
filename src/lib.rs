/*!
 * shm-sync
 *
 * Futex-backed synchronized words for coordinating threads and processes
 * through shared memory.
 */

#![cfg_attr(feature = "nightly", feature(core_intrinsics))]
#![cfg_attr(feature = "nightly", allow(internal_features))]

pub mod core;
pub mod memory;
pub mod monitoring;

// Re-exports
pub use crate::core::errors::{BindError, SyncError, SyncResult};
pub use crate::core::sync::{InterruptPolicy, StrategyType, SyncConfig, SyncWord, WaitQueue};
pub use memory::{HeapRegion, RawRegion, SharedRegion, SubRegion};
pub use monitoring::init_tracing;
