//! Tournament mode for running multiple games in parallel and collecting statistics
//!
//! Games are independent sessions, so they run concurrently using rayon.
//! Every game's seed and deck pairing is drawn up front from one seeded
//! generator: the same tournament seed gives the same results regardless of
//! thread count.

use crate::core::PlayerId;
use crate::decks::DeckList;
use crate::game::controller::PlayerController;
use crate::game::{
    GameConfig, GameLoop, GameResult, GameState, RandomController, VerbosityLevel, ZeroController,
};
use crate::{MtgError, Result};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Controller type for tournament games
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerType {
    Zero,
    Random,
}

/// One game's setup, fixed before any game runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameSeed {
    pub index: usize,
    pub seed: u64,
    pub deck1: usize,
    pub deck2: usize,
}

/// Tournament parameters
#[derive(Debug, Clone)]
pub struct TournamentConfig {
    pub decks: Vec<DeckList>,
    pub games: usize,
    pub seed: u64,
    pub p1: ControllerType,
    pub p2: ControllerType,
    pub max_turns: u32,
}

/// Statistics collected during tournament
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TournamentStats {
    pub p1_wins: usize,
    pub p2_wins: usize,
    pub draws: usize,
    /// Games that returned an engine error
    pub failures: usize,
    pub total_turns: u64,
    pub deck_wins: BTreeMap<String, usize>,
    pub deck_games: BTreeMap<String, usize>,
    /// (first deck wins, second deck wins, draws), keyed by sorted deck names
    pub matchup_results: BTreeMap<(String, String), (usize, usize, usize)>,
}

impl TournamentStats {
    pub fn games_played(&self) -> usize {
        self.p1_wins + self.p2_wins + self.draws
    }

    fn record(&mut self, deck1: &str, deck2: &str, winner_seat: Option<usize>, turns: u32) {
        self.total_turns += u64::from(turns);
        *self.deck_games.entry(deck1.to_string()).or_insert(0) += 1;
        *self.deck_games.entry(deck2.to_string()).or_insert(0) += 1;

        let (key, swapped) = if deck1 <= deck2 {
            ((deck1.to_string(), deck2.to_string()), false)
        } else {
            ((deck2.to_string(), deck1.to_string()), true)
        };
        let matchup = self.matchup_results.entry(key).or_insert((0, 0, 0));
        match winner_seat {
            Some(seat) => {
                let (winner_deck, first_listed) = if seat == 0 {
                    self.p1_wins += 1;
                    (deck1, !swapped)
                } else {
                    self.p2_wins += 1;
                    (deck2, swapped)
                };
                if first_listed {
                    matchup.0 += 1;
                } else {
                    matchup.1 += 1;
                }
                *self.deck_wins.entry(winner_deck.to_string()).or_insert(0) += 1;
            }
            None => {
                self.draws += 1;
                matchup.2 += 1;
            }
        }
    }

    /// Human-readable summary
    pub fn report(&self) -> String {
        let mut out = String::new();
        let total = self.games_played();
        let pct = |n: usize, of: usize| 100.0 * n as f64 / of.max(1) as f64;

        let _ = writeln!(out, "=== Player Position Statistics ===");
        let _ = writeln!(out, "P1 wins: {} ({:.1}%)", self.p1_wins, pct(self.p1_wins, total));
        let _ = writeln!(out, "P2 wins: {} ({:.1}%)", self.p2_wins, pct(self.p2_wins, total));
        let _ = writeln!(out, "Draws: {} ({:.1}%)", self.draws, pct(self.draws, total));
        if self.failures > 0 {
            let _ = writeln!(out, "Failed games: {}", self.failures);
        }
        if total > 0 {
            let _ = writeln!(
                out,
                "Average length: {:.1} turns",
                self.total_turns as f64 / total as f64
            );
        }

        let _ = writeln!(out, "\n=== Deck Win Rates ===");
        for (deck, games) in &self.deck_games {
            let wins = self.deck_wins.get(deck).copied().unwrap_or(0);
            let _ = writeln!(out, "  {deck}: {wins}/{games} ({:.1}%)", pct(wins, *games));
        }

        let _ = writeln!(out, "\n=== Matchup Results ===");
        for ((deck1, deck2), (first, second, draws)) in &self.matchup_results {
            let games = first + second + draws;
            if deck1 == deck2 {
                let _ = writeln!(out, "  {deck1} (mirror): {games} games, {draws} draws");
            } else {
                let _ = writeln!(
                    out,
                    "  {deck1} vs {deck2}: {first}-{second}-{draws} over {games} games"
                );
            }
        }
        out
    }
}

/// Draw every game's seed and deck pairing from the tournament seed
pub fn game_seeds(seed: u64, games: usize, deck_count: usize) -> Vec<GameSeed> {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    (0..games)
        .map(|index| GameSeed {
            index,
            seed: rng.gen(),
            deck1: rng.gen_range(0..deck_count),
            deck2: rng.gen_range(0..deck_count),
        })
        .collect()
}

fn make_controller(kind: ControllerType, player: PlayerId, seed: u64) -> Box<dyn PlayerController> {
    match kind {
        ControllerType::Zero => Box::new(ZeroController::new(player)),
        ControllerType::Random => Box::new(RandomController::with_seed(player, seed)),
    }
}

/// Play one silent game between two decks
///
/// Returns the result and the winner's seat (0 for `deck1`'s player).
pub fn play_seeded_game(
    deck1: &DeckList,
    deck2: &DeckList,
    p1: ControllerType,
    p2: ControllerType,
    seed: u64,
    max_turns: u32,
) -> Result<(GameResult, Option<usize>)> {
    let config = GameConfig::default()
        .with_seed(seed)
        .with_verbosity(VerbosityLevel::Silent);
    let mut game = GameState::new_two_player("Player 1", "Player 2", config);
    let p1_id = game.players[0].id;
    let p2_id = game.players[1].id;
    deck1.load_into(&mut game, p1_id)?;
    deck2.load_into(&mut game, p2_id)?;

    let mut controller1 = make_controller(p1, p1_id, seed.wrapping_add(0x1234_5678_9ABC_DEF0));
    let mut controller2 = make_controller(p2, p2_id, seed.wrapping_add(0xFEDC_BA98_7654_3210));
    let result = GameLoop::new(&mut game)
        .with_max_turns(max_turns)
        .run_game(&mut *controller1, &mut *controller2)?;
    let winner_seat = result
        .winner
        .map(|w| if w == p1_id { 0 } else { 1 });
    Ok((result, winner_seat))
}

/// Run tournament mode - play many games in parallel and collect statistics
pub fn run_tourney(config: &TournamentConfig) -> Result<TournamentStats> {
    if config.decks.is_empty() {
        return Err(MtgError::InvalidAction(
            "Tournament requires at least one deck".to_string(),
        ));
    }

    let outcomes: Vec<(GameSeed, Result<(GameResult, Option<usize>)>)> =
        game_seeds(config.seed, config.games, config.decks.len())
            .into_par_iter()
            .map(|game| {
                let result = play_seeded_game(
                    &config.decks[game.deck1],
                    &config.decks[game.deck2],
                    config.p1,
                    config.p2,
                    game.seed,
                    config.max_turns,
                );
                (game, result)
            })
            .collect();

    let mut stats = TournamentStats::default();
    for (game, outcome) in outcomes {
        match outcome {
            Ok((result, winner_seat)) => {
                stats.record(
                    &config.decks[game.deck1].name,
                    &config.decks[game.deck2].name,
                    winner_seat,
                    result.turns_played,
                );
            }
            Err(e) => {
                eprintln!("Warning: Game {} failed: {}", game.index, e);
                stats.failures += 1;
            }
        }
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decks::sample_decks;

    #[test]
    fn test_game_seeds_are_deterministic() {
        let first = game_seeds(99, 16, 3);
        let second = game_seeds(99, 16, 3);
        assert_eq!(first, second);
        assert!(first.iter().all(|g| g.deck1 < 3 && g.deck2 < 3));
        assert_ne!(first, game_seeds(100, 16, 3));
    }

    #[test]
    fn test_record_mirror_and_matchups() {
        let mut stats = TournamentStats::default();
        stats.record("Red", "Green", Some(0), 8);
        stats.record("Green", "Red", Some(0), 10);
        stats.record("Red", "Red", None, 20);

        assert_eq!(stats.p1_wins, 2);
        assert_eq!(stats.draws, 1);
        assert_eq!(stats.games_played(), 3);
        assert_eq!(stats.total_turns, 38);
        assert_eq!(stats.deck_wins["Red"], 1);
        assert_eq!(stats.deck_wins["Green"], 1);
        assert_eq!(stats.deck_games["Red"], 4);
        assert_eq!(
            stats.matchup_results[&("Green".to_string(), "Red".to_string())],
            (1, 1, 0)
        );
        assert_eq!(
            stats.matchup_results[&("Red".to_string(), "Red".to_string())],
            (0, 0, 1)
        );
        assert!(stats.report().contains("Red (mirror): 1 games"));
    }

    #[test]
    fn test_small_tourney_is_reproducible() {
        let config = TournamentConfig {
            decks: sample_decks().unwrap(),
            games: 4,
            seed: 7,
            p1: ControllerType::Random,
            p2: ControllerType::Zero,
            max_turns: 30,
        };
        let first = run_tourney(&config).unwrap();
        let second = run_tourney(&config).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.games_played() + first.failures, 4);
    }
}
