/*!
 * Configuration Tests
 *
 * Environment overrides and strategy selection as seen by bound words
 */

use pretty_assertions::assert_eq;
use serial_test::serial;
use shm_sync::core::sync::{
    InterruptPolicy, StrategyType, SyncConfig, ENV_RETRY_EINTR, ENV_SPIN_LIMIT, ENV_STRATEGY,
};
use shm_sync::{HeapRegion, SyncWord};
use std::env;
use std::sync::Arc;

fn clear_env() {
    for var in [ENV_STRATEGY, ENV_SPIN_LIMIT, ENV_RETRY_EINTR] {
        env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_from_env_without_overrides() {
    clear_env();
    assert_eq!(SyncConfig::from_env(), SyncConfig::default());
}

#[test]
#[serial]
fn test_from_env_applies_overrides() {
    clear_env();
    env::set_var(ENV_STRATEGY, "parking");
    env::set_var(ENV_SPIN_LIMIT, "32");
    env::set_var(ENV_RETRY_EINTR, "true");

    let config = SyncConfig::from_env();
    clear_env();

    assert_eq!(
        config,
        SyncConfig {
            strategy: StrategyType::Parking,
            spin_limit: 32,
            interrupts: InterruptPolicy::Retry,
        }
    );
}

#[test]
#[serial]
fn test_from_env_ignores_garbage() {
    clear_env();
    env::set_var(ENV_STRATEGY, "semaphore");
    env::set_var(ENV_SPIN_LIMIT, "-4");

    let config = SyncConfig::from_env();
    clear_env();

    assert_eq!(config, SyncConfig::default());
}

#[test]
fn test_word_reports_configuration() {
    let config = SyncConfig {
        strategy: StrategyType::Condvar,
        spin_limit: 7,
        interrupts: InterruptPolicy::Retry,
    };
    let word = SyncWord::bind_with(Arc::new(HeapRegion::with_words(1)), 0, config).unwrap();

    assert_eq!(word.strategy_name(), "condvar");
    assert_eq!(word.spin_limit(), 7);
    assert_eq!(word.interrupt_policy(), InterruptPolicy::Retry);
    assert!(!word.queue().is_cross_process());
}

#[test]
fn test_presets_bind() {
    for config in [SyncConfig::low_latency(), SyncConfig::long_wait()] {
        let word = SyncWord::bind_with(Arc::new(HeapRegion::with_words(1)), 0, config).unwrap();
        word.store(1);
        assert!(word.wait_for_value(1, None).unwrap());
    }
}
