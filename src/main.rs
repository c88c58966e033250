/*!
 * Ping-Pong Latency Probe
 *
 * Two threads hand a counter back and forth through a single synchronized
 * word and report the mean round-trip time for the configured strategy.
 *
 * Environment variables:
 * - PINGPONG_ROUNDS: number of round trips (default: 100000)
 * - SHM_SYNC_STRATEGY / SHM_SYNC_SPIN_LIMIT / SHM_SYNC_RETRY_EINTR: see `SyncConfig::from_env`
 */

use miette::{miette, IntoDiagnostic, Result};
use shm_sync::{init_tracing, HeapRegion, SyncConfig, SyncWord};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::info;

const DEFAULT_ROUNDS: u32 = 100_000;
const PEER_TIMEOUT: Duration = Duration::from_secs(5);

fn ping_value(round: u32) -> u32 {
    round.wrapping_mul(2).wrapping_add(1)
}

fn pong_value(round: u32) -> u32 {
    round.wrapping_mul(2).wrapping_add(2)
}

fn main() -> Result<()> {
    init_tracing();

    let rounds = std::env::var("PINGPONG_ROUNDS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_ROUNDS);
    let config = SyncConfig::from_env();

    let word = SyncWord::bind_with(Arc::new(HeapRegion::with_words(1)), 0, config)?;
    info!(
        rounds,
        strategy = word.strategy_name(),
        spin_limit = word.spin_limit(),
        "Starting ping-pong"
    );

    let peer = word.clone();
    let ponger = thread::Builder::new()
        .name("pong".into())
        .spawn(move || -> Result<()> {
            for round in 0..rounds {
                if !peer.wait_for_value(ping_value(round), Some(PEER_TIMEOUT))? {
                    return Err(miette!("ping never arrived in round {round}"));
                }
                peer.store(pong_value(round));
                peer.wake(1)?;
            }
            Ok(())
        })
        .into_diagnostic()?;

    let start = Instant::now();
    for round in 0..rounds {
        word.store(ping_value(round));
        word.wake(1)?;
        if !word.wait_for_value(pong_value(round), Some(PEER_TIMEOUT))? {
            return Err(miette!("pong never arrived in round {round}"));
        }
    }
    let elapsed = start.elapsed();

    ponger
        .join()
        .map_err(|_| miette!("pong thread panicked"))??;

    let mean_ns = elapsed.as_nanos() / u128::from(rounds.max(1));
    info!(
        rounds,
        elapsed_ms = elapsed.as_millis() as u64,
        mean_round_trip_ns = mean_ns as u64,
        "Ping-pong finished"
    );

    Ok(())
}
