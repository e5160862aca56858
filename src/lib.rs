//! MTG rules engine
//!
//! A rules engine for Magic-style card games: permanents whose abilities
//! rewrite game operations through interceptor dispatch, a resolution stack,
//! the turn and combat state machine, and a mana payment solver for hybrid
//! costs. Player decisions go through an explicit request/answer protocol,
//! so the engine never blocks on input.

pub mod core;
pub mod decks;
pub mod error;
pub mod game;
pub mod tournament;
pub mod zones;

pub use error::{MtgError, Result};
