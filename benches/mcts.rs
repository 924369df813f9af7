//! MCTS benchmarks for performance profiling.
//!
//! Run with: `cargo bench`
//!
//! These benchmarks measure:
//! - Search throughput on one shared tree for a growing number of workers
//! - Rollout cost on boards of different sizes
//! - Tree reuse after a decision

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use lockfree_mcts::{rollout, Mcts, MctsConfig, State, TicTacToe, UniformRollout};
use rand::{rngs::StdRng, SeedableRng};

const ITERATIONS: u64 = 2_000;

fn bench_think_threads(c: &mut Criterion) {
    let mut group = c.benchmark_group("think_threads");
    group.sample_size(20);

    for threads in [1usize, 2, 4, 8] {
        group.throughput(Throughput::Elements(ITERATIONS * threads as u64));
        group.bench_with_input(BenchmarkId::new("tictactoe_5x5_4", threads), &threads, |b, &threads| {
            let config = MctsConfig::fixed_iterations(ITERATIONS).with_threads(threads);

            b.iter(|| {
                let mut mcts = Mcts::new(config.clone()).unwrap();
                mcts.set_root(None, TicTacToe::start_with(5, 4));
                black_box(mcts.think().unwrap())
            });
        });
    }

    group.finish();
}

fn bench_rollout(c: &mut Criterion) {
    let mut group = c.benchmark_group("rollout");

    for (dim, needed) in [(3u8, 3u8), (6, 3), (9, 5)] {
        let id = BenchmarkId::new("tictactoe", format!("{dim}x{dim}_{needed}"));
        group.bench_with_input(id, &(dim, needed), |b, &(dim, needed)| {
            let start = TicTacToe::start_with(dim, needed);
            let mut rng = StdRng::seed_from_u64(42);

            b.iter(|| black_box(rollout(&start, &UniformRollout, &mut rng).unwrap()));
        });
    }

    group.finish();
}

fn bench_take_action_and_reuse(c: &mut Criterion) {
    c.bench_function("take_action_reuse_3x3", |b| {
        b.iter(|| {
            let mut mcts = Mcts::new(MctsConfig::fixed_iterations(500)).unwrap();
            let mut state = TicTacToe::start(3);
            mcts.set_root(None, state.copy());

            while !state.is_terminal() {
                mcts.think().unwrap();
                state = mcts.take_action().unwrap();
            }
            black_box(state)
        });
    });
}

criterion_group!(benches, bench_think_threads, bench_rollout, bench_take_action_and_reuse);
criterion_main!(benches);
