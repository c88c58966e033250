/*!
 * Synchronization Configuration
 *
 * Runtime configuration for strategy selection and the wait-for-value
 * protocol's tunables
 */

use serde::{Deserialize, Serialize};
use std::env;
use tracing::warn;

/// Spin iterations before a waiter blocks in the kernel
pub const DEFAULT_SPIN_LIMIT: u32 = 200;

pub const ENV_STRATEGY: &str = "SHM_SYNC_STRATEGY";
pub const ENV_SPIN_LIMIT: &str = "SHM_SYNC_SPIN_LIMIT";
pub const ENV_RETRY_EINTR: &str = "SHM_SYNC_RETRY_EINTR";

/// Strategy type selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyType {
    /// Kernel futex (Linux only, works across processes)
    Futex,
    /// Mutex + condvar buckets keyed by address (portable, in-process)
    Condvar,
    /// parking_lot_core's global parking lot keyed by address (in-process)
    Parking,
    /// Auto-select based on platform
    Auto,
}

impl StrategyType {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "futex" => Some(Self::Futex),
            "condvar" => Some(Self::Condvar),
            "parking" => Some(Self::Parking),
            "auto" => Some(Self::Auto),
            _ => None,
        }
    }
}

/// What a blocked waiter does when a signal interrupts the kernel wait
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterruptPolicy {
    /// Surface the interruption as an OS error (EINTR)
    #[default]
    Propagate,
    /// Re-check the word and keep waiting with the remaining timeout
    Retry,
}

/// Synchronization configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct SyncConfig {
    /// Preferred strategy
    pub strategy: StrategyType,
    /// Spin iterations between the fast path and the blocking loop
    pub spin_limit: u32,
    /// Handling of interrupted waits
    pub interrupts: InterruptPolicy,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyType::Auto,
            spin_limit: DEFAULT_SPIN_LIMIT,
            interrupts: InterruptPolicy::Propagate,
        }
    }
}

impl SyncConfig {
    /// Configuration optimized for low-latency handoffs (peer usually answers within microseconds)
    pub const fn low_latency() -> Self {
        Self {
            strategy: StrategyType::Auto,
            spin_limit: 2_000,
            interrupts: InterruptPolicy::Propagate,
        }
    }

    /// Configuration optimized for long waits (> 1ms expected)
    pub const fn long_wait() -> Self {
        Self {
            strategy: StrategyType::Auto,
            spin_limit: 16,
            interrupts: InterruptPolicy::Propagate,
        }
    }

    /// Default configuration with environment overrides applied
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply `SHM_SYNC_*` overrides; unparsable values are logged and ignored
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(value) = env::var(ENV_STRATEGY) {
            match StrategyType::parse(&value) {
                Some(strategy) => self.strategy = strategy,
                None => warn!(var = ENV_STRATEGY, value = %value, "Unknown strategy, ignoring"),
            }
        }

        if let Ok(value) = env::var(ENV_SPIN_LIMIT) {
            match value.trim().parse() {
                Ok(limit) => self.spin_limit = limit,
                Err(e) => warn!(
                    var = ENV_SPIN_LIMIT,
                    value = %value,
                    error = %e,
                    "Invalid spin limit, ignoring"
                ),
            }
        }

        if let Ok(value) = env::var(ENV_RETRY_EINTR) {
            self.interrupts = match value.trim() {
                "1" | "true" => InterruptPolicy::Retry,
                _ => InterruptPolicy::Propagate,
            };
        }

        self
    }

    /// Select the concrete strategy for the current platform
    pub fn select_strategy(&self) -> StrategyType {
        match self.strategy {
            StrategyType::Auto => {
                // Prefer futex on Linux, condvar elsewhere
                #[cfg(target_os = "linux")]
                {
                    StrategyType::Futex
                }
                #[cfg(not(target_os = "linux"))]
                {
                    StrategyType::Condvar
                }
            }
            #[cfg(not(target_os = "linux"))]
            StrategyType::Futex => {
                warn!("Futex strategy unavailable on this platform, using condvar");
                StrategyType::Condvar
            }
            other => other,
        }
    }
}
