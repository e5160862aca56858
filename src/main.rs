//! MTG rules engine - command line driver
//!
//! `mtg demo` plays one game between two sample decks, `mtg tourney` plays
//! many seeded games in parallel, `mtg cost` inspects a mana cost and
//! optionally tries to pay it from a pool.

use anyhow::{bail, ensure, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use mtg_rules_rs::{
    core::{Mana, ManaCost, ManaPool},
    decks::{sample_decks, DeckList},
    game::{
        mana_payment::PaymentOutcome, GameConfig, GameLoop, GameState, OutputFormat,
        PlayerController, RandomController, VerbosityLevel, ZeroController,
    },
    tournament::{self, TournamentConfig},
};
use std::time::Instant;

/// Controller type for AI agents
#[derive(Debug, Clone, Copy, ValueEnum)]
enum ControllerType {
    /// Always chooses first meaningful action (for testing)
    Zero,
    /// Makes random choices
    Random,
}

impl From<ControllerType> for tournament::ControllerType {
    fn from(kind: ControllerType) -> Self {
        match kind {
            ControllerType::Zero => tournament::ControllerType::Zero,
            ControllerType::Random => tournament::ControllerType::Random,
        }
    }
}

#[derive(Parser)]
#[command(name = "mtg")]
#[command(about = "MTG rules engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play one game between two sample decks
    Demo {
        /// Deck for player 1 (see `mtg decks`)
        #[arg(long, default_value = "Red Aggro")]
        deck1: String,

        /// Deck for player 2
        #[arg(long, default_value = "Green White")]
        deck2: String,

        /// Player 1 controller type
        #[arg(long, value_enum, default_value = "random")]
        p1: ControllerType,

        /// Player 2 controller type
        #[arg(long, value_enum, default_value = "random")]
        p2: ControllerType,

        /// Set random seed for deterministic games
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Stop after this many turns
        #[arg(long, default_value_t = 50)]
        max_turns: u32,

        /// Verbosity level for game output (0=silent, 1=minimal, 2=normal, 3=verbose)
        #[arg(long, short = 'v', default_value = "normal")]
        verbosity: VerbosityLevel,

        /// Print log lines as JSON objects
        #[arg(long)]
        json: bool,
    },

    /// Play many seeded games in parallel and report statistics
    Tourney {
        /// Number of games to play
        #[arg(long, default_value_t = 100)]
        games: usize,

        /// Tournament seed; every game's seed derives from it
        #[arg(long, default_value_t = 0)]
        seed: u64,

        /// Player 1 controller type
        #[arg(long, value_enum, default_value = "random")]
        p1: ControllerType,

        /// Player 2 controller type
        #[arg(long, value_enum, default_value = "random")]
        p2: ControllerType,

        /// Turn limit per game
        #[arg(long, default_value_t = 50)]
        max_turns: u32,
    },

    /// Parse a mana cost, and optionally check it against a pool
    Cost {
        /// Cost in brace notation, e.g. "{2}{R/W}{G}"
        cost: String,

        /// Pool contents as colored symbols, e.g. "{R}{W}{C}{C}"
        #[arg(long)]
        pool: Option<String>,
    },

    /// List the built-in decks
    Decks,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Demo {
            deck1,
            deck2,
            p1,
            p2,
            seed,
            max_turns,
            verbosity,
            json,
        } => run_demo(&deck1, &deck2, p1, p2, seed, max_turns, verbosity, json),
        Commands::Tourney {
            games,
            seed,
            p1,
            p2,
            max_turns,
        } => run_tourney(games, seed, p1, p2, max_turns),
        Commands::Cost { cost, pool } => run_cost(&cost, pool.as_deref()),
        Commands::Decks => {
            for deck in sample_decks()? {
                println!("{} ({} cards)", deck.name, deck.total_cards());
                for entry in &deck.main_deck {
                    println!("  {} {}", entry.count, entry.card_name);
                }
            }
            Ok(())
        }
    }
}

fn find_deck(name: &str) -> Result<DeckList> {
    let decks = sample_decks()?;
    let known: Vec<String> = decks.iter().map(|d| d.name.clone()).collect();
    decks
        .into_iter()
        .find(|d| d.name.eq_ignore_ascii_case(name))
        .with_context(|| format!("unknown deck '{name}' (known: {})", known.join(", ")))
}

fn controller(kind: ControllerType, game: &GameState, seat: usize, seed: u64) -> Box<dyn PlayerController> {
    let player = game.players[seat].id;
    match kind {
        ControllerType::Zero => Box::new(ZeroController::new(player)),
        ControllerType::Random => Box::new(RandomController::with_seed(player, seed)),
    }
}

#[allow(clippy::too_many_arguments)]
fn run_demo(
    deck1: &str,
    deck2: &str,
    p1: ControllerType,
    p2: ControllerType,
    seed: u64,
    max_turns: u32,
    verbosity: VerbosityLevel,
    json: bool,
) -> Result<()> {
    let deck1 = find_deck(deck1)?;
    let deck2 = find_deck(deck2)?;

    let config = GameConfig::default().with_seed(seed).with_verbosity(verbosity);
    let mut game = GameState::new_two_player("Player 1", "Player 2", config);
    if json {
        game.logger.set_output_format(OutputFormat::Json);
    }
    let (p1_id, p2_id) = (game.players[0].id, game.players[1].id);
    deck1.load_into(&mut game, p1_id)?;
    deck2.load_into(&mut game, p2_id)?;

    let mut controller1 = controller(p1, &game, 0, seed.wrapping_add(1));
    let mut controller2 = controller(p2, &game, 1, seed.wrapping_add(2));

    let start = Instant::now();
    let result = GameLoop::new(&mut game)
        .with_max_turns(max_turns)
        .run_game(&mut *controller1, &mut *controller2)
        .context("game aborted")?;
    game.logger.flush_buffer();

    if !json {
        println!("\n=== Game Over ===");
        match result.winner {
            Some(winner) => println!("Winner: {}", game.player_name(winner)),
            None => println!("No winner"),
        }
        println!("Reason: {:?}", result.end_reason);
        println!("Turns: {}", result.turns_played);
        for player in &game.players {
            println!("  {}: {} life", player.name, player.life);
        }
        println!("Elapsed: {:.2}ms", start.elapsed().as_secs_f64() * 1000.0);
    }
    Ok(())
}

fn run_tourney(
    games: usize,
    seed: u64,
    p1: ControllerType,
    p2: ControllerType,
    max_turns: u32,
) -> Result<()> {
    println!("=== Tournament Mode ===\n");
    let config = TournamentConfig {
        decks: sample_decks()?,
        games,
        seed,
        p1: p1.into(),
        p2: p2.into(),
        max_turns,
    };
    println!(
        "Running {games} games with {} decks, seed {seed}, P1={p1:?}, P2={p2:?}\n",
        config.decks.len()
    );

    let start = Instant::now();
    let stats = tournament::run_tourney(&config)?;
    let elapsed = start.elapsed();

    println!("=== Tournament Complete ===");
    println!("Total games played: {}", stats.games_played());
    println!("Elapsed time: {:.2}s", elapsed.as_secs_f64());
    println!(
        "Games per second: {:.2}\n",
        stats.games_played() as f64 / elapsed.as_secs_f64().max(f64::EPSILON)
    );
    print!("{}", stats.report());
    Ok(())
}

fn parse_pool(pool: &str) -> Result<Mana> {
    let parsed = ManaCost::parse(pool).with_context(|| format!("bad pool '{pool}'"))?;
    ensure!(
        parsed.choices.is_empty() && parsed.fixed.generic == 0,
        "a pool holds only colored or colorless symbols, got '{pool}'"
    );
    Ok(parsed.fixed.specific())
}

fn run_cost(cost: &str, pool: Option<&str>) -> Result<()> {
    let cost = ManaCost::parse(cost).with_context(|| format!("bad cost '{cost}'"))?;
    println!("Cost: {cost}");
    println!("Mana value: {}", cost.value());
    println!("Fixed part: {}", cost.fixed);
    for (i, group) in cost.choices.iter().enumerate() {
        println!("Choice group {i}: {group}");
    }

    let Some(pool) = pool else {
        return Ok(());
    };
    let mana = parse_pool(pool)?;
    let mut pool = ManaPool::new();
    pool.add(mana);
    println!("Pool: {mana}");
    match pool.pay(&cost, None, false) {
        PaymentOutcome::Paid => println!("Payable without any choice"),
        PaymentOutcome::NeedsChoice(pending) => {
            println!(
                "Payable; {} valid paths, the payer must choose:",
                pending.valid_paths.len()
            );
            for group in &pending.ambiguous {
                let options: Vec<String> = group
                    .options
                    .iter()
                    .map(|&alt| cost.choices[group.group].alternatives[alt].to_string())
                    .collect();
                println!("  group {}: {}", group.group, options.join(" or "));
            }
        }
        PaymentOutcome::Failed => bail!("pool {mana} cannot pay {cost}"),
    }
    Ok(())
}
