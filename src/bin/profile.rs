//! Profiling binary for game execution
//!
//! Runs seeded games between the sample decks in a tight loop, for use with
//! cargo-flamegraph. Unlike the Criterion benchmarks there is no harness
//! overhead in the profile.
//!
//! Usage:
//!   cargo flamegraph --bin profile
//!   PROFILE_ITERATIONS=200 cargo flamegraph --bin profile

use anyhow::Context;
use mtg_rules_rs::{
    decks::sample_decks,
    game::{GameConfig, GameLoop, GameState, RandomController, VerbosityLevel},
};

fn main() -> anyhow::Result<()> {
    let decks = sample_decks().context("sample decks should load")?;

    let iterations: u64 = std::env::var("PROFILE_ITERATIONS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(1000);

    println!("Profiling game execution...");
    println!("Running {iterations} games from seed 42");
    println!();

    let mut total_turns = 0u64;
    for i in 0..iterations {
        let seed = 42 + i;
        let deck1 = &decks[i as usize % decks.len()];
        let deck2 = &decks[(i as usize + 1) % decks.len()];

        let config = GameConfig::default()
            .with_seed(seed)
            .with_verbosity(VerbosityLevel::Silent);
        let mut game = GameState::new_two_player("Player 1", "Player 2", config);
        let (p1, p2) = (game.players[0].id, game.players[1].id);
        deck1.load_into(&mut game, p1)?;
        deck2.load_into(&mut game, p2)?;

        let mut controller1 = RandomController::with_seed(p1, seed);
        let mut controller2 = RandomController::with_seed(p2, seed + 1);
        let result = GameLoop::new(&mut game)
            .with_max_turns(200)
            .run_game(&mut controller1, &mut controller2)
            .with_context(|| format!("game {i} (seed {seed}) failed"))?;
        total_turns += u64::from(result.turns_played);

        if (i + 1) % 100 == 0 {
            println!("Completed {} games", i + 1);
        }
    }

    println!();
    println!(
        "Profiling complete! {iterations} games, {total_turns} turns ({:.1} per game)",
        total_turns as f64 / iterations.max(1) as f64
    );
    Ok(())
}
