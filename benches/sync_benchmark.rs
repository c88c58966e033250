/*!
 * Synchronization Primitives Benchmarks
 *
 * Compare futex, condvar, and parking strategies on the synchronized word
 */

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use shm_sync::{HeapRegion, StrategyType, SyncConfig, SyncWord};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn strategies() -> Vec<StrategyType> {
    let mut all = vec![StrategyType::Condvar, StrategyType::Parking];
    if cfg!(target_os = "linux") {
        all.push(StrategyType::Futex);
    }
    all
}

fn bind(strategy: StrategyType) -> SyncWord {
    let config = SyncConfig {
        strategy,
        ..Default::default()
    };
    SyncWord::bind_with(Arc::new(HeapRegion::with_words(1)), 0, config).unwrap()
}

fn bench_fast_path(c: &mut Criterion) {
    let word = bind(StrategyType::Auto);
    word.store(1);

    c.bench_function("wait_for_value_fast_path", |b| {
        b.iter(|| word.wait_for_value(black_box(1), None).unwrap())
    });
}

fn bench_store_wake_uncontended(c: &mut Criterion) {
    let mut group = c.benchmark_group("store_wake_uncontended");

    for strategy in strategies() {
        let word = bind(strategy);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{:?}", strategy)),
            &word,
            |b, word| {
                let mut value = 0u32;
                b.iter(|| {
                    value = value.wrapping_add(1);
                    word.store(value);
                    black_box(word.wake(1).unwrap());
                });
            },
        );
    }

    group.finish();
}

fn bench_ping_pong(c: &mut Criterion) {
    let mut group = c.benchmark_group("ping_pong_100");

    for strategy in strategies() {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{:?}", strategy)),
            &strategy,
            |b, &strategy| {
                b.iter(|| {
                    let word = bind(strategy);
                    let peer = word.clone();

                    let handle = thread::spawn(move || {
                        for round in 0..100u32 {
                            peer.wait_for_value(2 * round + 1, Some(Duration::from_secs(1)))
                                .unwrap();
                            peer.store(2 * round + 2);
                            peer.wake(1).unwrap();
                        }
                    });

                    for round in 0..100u32 {
                        word.store(2 * round + 1);
                        word.wake(1).unwrap();
                        word.wait_for_value(2 * round + 2, Some(Duration::from_secs(1)))
                            .unwrap();
                    }

                    handle.join().unwrap();
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_fast_path,
    bench_store_wake_uncontended,
    bench_ping_pong
);
criterion_main!(benches);
