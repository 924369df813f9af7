//! mcts-bench - Measures how search budget and worker count translate into
//! playing strength.
//!
//! Every row plays `--games` tic-tac-toe games between a challenger and a
//! single-threaded baseline searching `--iterations` iterations per move, and
//! prints the challenger's win rate with the `[draws, challenger, baseline]`
//! score. For each worker count `t` (1, 2, 4, ... up to `--max-threads`) two
//! challengers are measured: one worker with `t` times the baseline budget,
//! and `t` workers with the baseline budget each.

use std::thread;
use std::time::Duration;

use clap::Parser;
use lockfree_mcts::{GameOutcome, MctsConfig, MctsError, SelfPlay, TicTacToe};
use tracing::{debug, info};

#[derive(Parser, Debug, Clone)]
#[command(name = "mcts-bench")]
#[command(about = "Self-play strength benchmark of the parallel MCTS engine")]
struct Args {
    /// Side length of the board
    #[arg(long, default_value_t = 5)]
    dim: u8,

    /// Marks in a row needed to win
    #[arg(long, default_value_t = 4)]
    needed: u8,

    /// Games played per row of the table
    #[arg(long, default_value_t = 200)]
    games: u32,

    /// Iterations per move and per worker of the baseline engine
    #[arg(long, default_value_t = 500)]
    iterations: u64,

    /// Largest worker count measured (defaults to the available parallelism)
    #[arg(long)]
    max_threads: Option<usize>,

    /// Time budget per move in seconds, for both engines
    #[arg(long, default_value_t = 999)]
    time_per_action: u64,

    /// Seed of the engines' random generators (random if not set)
    #[arg(long)]
    seed: Option<u64>,

    /// Log level used when RUST_LOG is not set (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn init_tracing(level: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();
}

impl Args {
    fn config(&self, threads: usize, iterations: u64, game: u32, side: u64) -> MctsConfig {
        let config = MctsConfig::default()
            .with_threads(threads)
            .with_max_iterations(iterations)
            .with_time_per_action(Duration::from_secs(self.time_per_action));

        match self.seed {
            Some(seed) => config.with_seed(seed.wrapping_add(u64::from(game) * 1024 + side * 512)),
            None => config,
        }
    }

    /// Plays every game of one row and returns `[draws, challenger wins, baseline wins]`.
    fn scores(&self, threads: usize, iterations: u64) -> Result<[u32; 3], MctsError> {
        let mut scores = [0; 3];

        for game in 0..self.games {
            let challenger = self.config(threads, iterations, game, 0);
            let baseline = self.config(1, self.iterations, game, 1);

            let record = SelfPlay::new(TicTacToe::start_with(self.dim, self.needed), challenger, baseline)?.play()?;
            debug!(game, outcome = ?record.outcome, moves = record.moves.len(), "game finished");

            scores[record.outcome.index()] += 1;
        }

        Ok(scores)
    }

    fn print_row(&self, label: String, scores: [u32; 3]) {
        let win_percent = 100 * scores[GameOutcome::Won(1).index()] / self.games.max(1);
        println!("{label}: {win_percent}% {scores:?}");
    }
}

fn main() -> Result<(), MctsError> {
    let args = Args::parse();
    init_tracing(&args.log_level);

    if args.dim == 0 || args.needed == 0 || args.needed > args.dim {
        return Err(MctsError::InvalidConfig(format!(
            "cannot play {} in a row on a {}x{} board",
            args.needed, args.dim, args.dim
        )));
    }

    let max_threads =
        args.max_threads.unwrap_or_else(|| thread::available_parallelism().map_or(1, |threads| threads.get()));
    info!(dim = args.dim, needed = args.needed, games = args.games, max_threads, "starting benchmark");

    let base = args.iterations;
    let mut threads = 1;
    while threads <= max_threads {
        let budget = threads as u64 * base;
        let scores = args.scores(1, budget)?;
        args.print_row(format!("1x{budget} vs 1x{base}"), scores);

        if threads > 1 {
            let scores = args.scores(threads, base)?;
            args.print_row(format!("{threads}x{base} vs 1x{base}"), scores);
        }

        threads *= 2;
    }

    Ok(())
}
