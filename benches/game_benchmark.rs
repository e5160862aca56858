//! Performance benchmarks for full games
//!
//! Plays seeded games between the sample decks with RandomController on
//! both sides. A warmup game prints per-game metrics, including the bytes
//! allocated, before Criterion takes over.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use mtg_rules_rs::{
    decks::{sample_decks, DeckList},
    game::{GameConfig, GameLoop, GameState, RandomController, VerbosityLevel},
    Result,
};
use stats_alloc::{Region, StatsAlloc, INSTRUMENTED_SYSTEM};
use std::alloc::System;
use std::time::{Duration, Instant};

#[global_allocator]
static GLOBAL: &StatsAlloc<System> = &INSTRUMENTED_SYSTEM;

/// Metrics collected during game execution
#[derive(Debug, Clone)]
struct GameMetrics {
    turns: u32,
    duration: Duration,
    bytes_allocated: usize,
    bytes_deallocated: usize,
}

impl GameMetrics {
    fn games_per_sec(&self) -> f64 {
        1.0 / self.duration.as_secs_f64()
    }

    fn turns_per_sec(&self) -> f64 {
        self.turns as f64 / self.duration.as_secs_f64()
    }

    fn bytes_per_turn(&self) -> f64 {
        if self.turns == 0 {
            0.0
        } else {
            self.bytes_allocated as f64 / self.turns as f64
        }
    }
}

fn new_game(deck1: &DeckList, deck2: &DeckList, seed: u64) -> Result<GameState> {
    let config = GameConfig::default()
        .with_seed(seed)
        .with_verbosity(VerbosityLevel::Silent);
    let mut game = GameState::new_two_player("Player 1", "Player 2", config);
    let (p1, p2) = (game.players[0].id, game.players[1].id);
    deck1.load_into(&mut game, p1)?;
    deck2.load_into(&mut game, p2)?;
    Ok(game)
}

/// Run a single game and collect metrics
fn run_game_with_metrics(deck1: &DeckList, deck2: &DeckList, seed: u64) -> Result<GameMetrics> {
    let reg = Region::new(GLOBAL);
    let start = Instant::now();

    let mut game = new_game(deck1, deck2, seed)?;
    let (p1, p2) = (game.players[0].id, game.players[1].id);
    let mut controller1 = RandomController::with_seed(p1, seed);
    let mut controller2 = RandomController::with_seed(p2, seed + 1);
    let result = GameLoop::new(&mut game)
        .with_max_turns(100)
        .run_game(&mut controller1, &mut controller2)?;

    let duration = start.elapsed();
    let stats = reg.change();
    Ok(GameMetrics {
        turns: result.turns_played,
        duration,
        bytes_allocated: stats.bytes_allocated,
        bytes_deallocated: stats.bytes_deallocated,
    })
}

/// Benchmark: allocate a new game for each iteration
fn bench_game_fresh(c: &mut Criterion) {
    let decks = match sample_decks() {
        Ok(decks) => decks,
        Err(e) => {
            eprintln!("Skipping benchmark - failed to load decks: {e}");
            return;
        }
    };

    let mut group = c.benchmark_group("game_execution");
    group.sample_size(20);
    group.measurement_time(Duration::from_secs(10));

    for (i, j) in [(0, 1), (1, 2), (0, 0)] {
        let (deck1, deck2) = (&decks[i], &decks[j]);
        let label = format!("{} vs {}", deck1.name, deck2.name);
        let seed = 42u64;

        println!("\nWarmup game, {label} (seed {seed}):");
        if let Ok(metrics) = run_game_with_metrics(deck1, deck2, seed) {
            println!("  Turns: {}", metrics.turns);
            println!("  Duration: {:?}", metrics.duration);
            println!("  Games/sec: {:.2}", metrics.games_per_sec());
            println!("  Turns/sec: {:.2}", metrics.turns_per_sec());
            println!("  Bytes allocated: {}", metrics.bytes_allocated);
            println!("  Bytes deallocated: {}", metrics.bytes_deallocated);
            println!("  Bytes/turn: {:.2}", metrics.bytes_per_turn());
        }

        group.bench_with_input(BenchmarkId::new("fresh", &label), &seed, |b, &seed| {
            b.iter(|| {
                run_game_with_metrics(deck1, deck2, black_box(seed))
                    .expect("Game should complete successfully")
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_game_fresh);
criterion_main!(benches);
