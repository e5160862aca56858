//! Core game state and turn structure

pub mod actions;
pub mod combat;
pub mod config;
pub mod controller;
pub mod dispatch;
pub mod game_loop;
pub mod logger;
pub mod mana_payment;
pub mod permanent;
pub mod phase;
pub mod random_controller;
mod resolution;
pub mod selection;
pub mod stack;
mod state_based;
pub mod state;
mod turn;
pub mod zero_controller;

pub use actions::PlayerAction;
pub use combat::{Blockers, CombatState};
pub use config::GameConfig;
pub use controller::{GameStateView, PlayerController};
pub use dispatch::{DamageEvent, Interceptor, Operation};
pub use game_loop::{GameEndReason, GameLoop, GameResult};
pub use logger::{GameLogger, LogEntry, OutputFormat, OutputMode, VerbosityLevel};
pub use mana_payment::{ManaAnswer, PaymentOutcome, PendingManaChoice};
pub use permanent::Permanent;
pub use phase::{DelayedTrigger, Phase, PlayerFlags, Step, TurnState};
pub use random_controller::RandomController;
pub use selection::{PendingSelection, SelectionAnswer, SelectionKind, TargetRequest};
pub use stack::{PendingCast, PendingEffect, Stack, StackEntry};
pub use state::GameState;
pub use zero_controller::ZeroController;
