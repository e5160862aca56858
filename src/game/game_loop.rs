//! Game loop implementation
//!
//! Drives a [`GameState`] with one [`PlayerController`] per player. Each
//! iteration does the first thing that applies:
//!
//! 1. end the game (a winner, everyone lost, or the turn limit)
//! 2. collect answers for outstanding selections
//! 3. resolve the stack while every player has passed
//! 4. advance steps that need no input
//! 5. give priority to the first player, in turn order, who has not passed

use crate::core::PlayerId;
use crate::game::controller::{GameStateView, PlayerController};
use crate::game::{GameState, PlayerAction, Step, VerbosityLevel};
use crate::{MtgError, Result};
use serde::{Deserialize, Serialize};

/// Cards drawn by each player before the first turn
pub const OPENING_HAND_SIZE: usize = 7;

/// Result of running a game to completion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameResult {
    /// Winner of the game (None if draw or game didn't complete)
    pub winner: Option<PlayerId>,
    /// Total number of turns played
    pub turns_played: u32,
    /// Reason the game ended
    pub end_reason: GameEndReason,
}

/// Reason the game ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEndReason {
    /// The named player lost by running out of life
    PlayerDeath(PlayerId),
    /// The named player lost by drawing from an empty library
    Decking(PlayerId),
    /// Game reached maximum turn limit
    TurnLimit,
    /// Every remaining player lost at the same time
    Draw,
}

/// Game loop manager
///
/// Handles turn progression, priority, and win condition checking
pub struct GameLoop<'a> {
    /// The game state
    pub game: &'a mut GameState,
    /// Maximum turns before the game is called
    max_turns: u32,
    opening_hand_size: usize,
    /// Actions a player may take in one step before being made to pass
    max_actions_per_step: usize,
    actions_this_step: usize,
    current_step: (u32, Step),
}

impl<'a> GameLoop<'a> {
    /// Create a new game loop for the given game state
    pub fn new(game: &'a mut GameState) -> Self {
        let current_step = (game.turn.turn_number, game.turn.step);
        GameLoop {
            game,
            max_turns: 1000,
            opening_hand_size: OPENING_HAND_SIZE,
            max_actions_per_step: 200,
            actions_this_step: 0,
            current_step,
        }
    }

    /// Set maximum turns before forcing a draw
    pub fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = max_turns;
        self
    }

    /// Cards drawn before the first turn; zero keeps hands as they are
    pub fn with_opening_hand_size(mut self, size: usize) -> Self {
        self.opening_hand_size = size;
        self
    }

    pub fn with_max_actions_per_step(mut self, max: usize) -> Self {
        self.max_actions_per_step = max.max(1);
        self
    }

    /// Set verbosity level for the game's logger
    pub fn with_verbosity(self, verbosity: VerbosityLevel) -> Self {
        self.game.logger.set_verbosity(verbosity);
        self
    }

    /// Run a two-player game to completion
    pub fn run_game(
        &mut self,
        controller1: &mut dyn PlayerController,
        controller2: &mut dyn PlayerController,
    ) -> Result<GameResult> {
        self.run_with(&mut [controller1, controller2])
    }

    /// Run a game with one controller per player, in any order
    ///
    /// Libraries are shuffled and opening hands drawn before turn 1.
    pub fn run_with(
        &mut self,
        controllers: &mut [&mut dyn PlayerController],
    ) -> Result<GameResult> {
        for player in &self.game.players {
            seat_of(controllers, player.id)?;
        }
        self.setup_game()?;

        let result = loop {
            if let Some(result) = self.check_game_end() {
                break result;
            }
            if self.answer_selections(controllers)? {
                continue;
            }
            if self.game.resolve_if_ready()? > 0 {
                continue;
            }
            if self.game.advance_if_ready()? > 0 {
                continue;
            }
            self.priority_round(controllers)?;
        };

        self.game.logger.minimal(&match result.winner {
            Some(winner) => format!(
                "{} wins after {} turns ({:?})",
                self.game.player_name(winner),
                result.turns_played,
                result.end_reason
            ),
            None => format!("No winner after {} turns ({:?})", result.turns_played, result.end_reason),
        });
        for controller in controllers.iter_mut() {
            let id = controller.player_id();
            let view = GameStateView::new(self.game, id);
            controller.on_game_end(&view, result.winner == Some(id));
        }
        Ok(result)
    }

    fn setup_game(&mut self) -> Result<()> {
        let players: Vec<PlayerId> = self.game.players.iter().map(|p| p.id).collect();
        if self.opening_hand_size > 0 {
            for &player in &players {
                self.game.shuffle_library(player);
                for _ in 0..self.opening_hand_size {
                    self.game.draw_card(player)?;
                }
            }
        }
        self.game.start_game()
    }

    /// Check if the game has reached an end condition
    fn check_game_end(&self) -> Option<GameResult> {
        let turns_played = self.game.turn.turn_number;
        if self.game.is_game_over() {
            let winner = self.game.get_winner();
            let end_reason = match self.game.players.iter().find(|p| p.has_lost) {
                _ if winner.is_none() => GameEndReason::Draw,
                Some(loser) if loser.drew_from_empty_library => GameEndReason::Decking(loser.id),
                Some(loser) => GameEndReason::PlayerDeath(loser.id),
                None => GameEndReason::Draw,
            };
            return Some(GameResult {
                winner,
                turns_played,
                end_reason,
            });
        }
        if turns_played > self.max_turns {
            return Some(GameResult {
                winner: None,
                turns_played: self.max_turns,
                end_reason: GameEndReason::TurnLimit,
            });
        }
        None
    }

    /// Ask controllers to answer outstanding selections
    ///
    /// An answer the engine refuses is replaced by the default answer.
    fn answer_selections(&mut self, controllers: &mut [&mut dyn PlayerController]) -> Result<bool> {
        let waiting = self.game.players_with_selection();
        for &player in &waiting {
            let seat = seat_of(controllers, player)?;
            let Some(selection) = self.game.pending_selection(player) else {
                continue;
            };
            let fallback = selection.default_answer();
            let answer = {
                let view = GameStateView::new(self.game, player);
                controllers[seat].answer(&view, selection)
            };
            if self.game.answer_selection(player, answer)? {
                continue;
            }
            self.game.logger.normal(&format!(
                "{}: answer refused, using the default",
                self.game.player_name(player)
            ));
            if !self.game.answer_selection(player, fallback)? {
                return Err(MtgError::InvalidAction(format!(
                    "no acceptable answer for {}'s selection",
                    self.game.player_name(player)
                )));
            }
        }
        Ok(!waiting.is_empty())
    }

    /// Players in turn order, starting with the active player
    fn turn_order(&self) -> Vec<PlayerId> {
        let seats: Vec<PlayerId> = self.game.players.iter().map(|p| p.id).collect();
        let start = seats
            .iter()
            .position(|&p| p == self.game.turn.active_player)
            .unwrap_or(0);
        seats[start..].iter().chain(&seats[..start]).copied().collect()
    }

    /// Let the next player who has not passed take one action
    fn priority_round(&mut self, controllers: &mut [&mut dyn PlayerController]) -> Result<()> {
        if self.game.check_state_based_actions()? {
            return Ok(());
        }

        let step = (self.game.turn.turn_number, self.game.turn.step);
        if step != self.current_step {
            self.current_step = step;
            self.actions_this_step = 0;
        }

        let Some(player) = self.turn_order().into_iter().find(|&p| {
            self.game.get_player(p).is_ok_and(|p| p.is_alive())
                && !self.game.turn.flags(p).is_done()
        }) else {
            return Err(MtgError::InvalidAction(format!(
                "game stalled in {:?} with nobody to act",
                self.game.turn.step
            )));
        };
        let seat = seat_of(controllers, player)?;

        let choice = if self.actions_this_step >= self.max_actions_per_step {
            None
        } else {
            let actions = self.game.legal_actions(player);
            let view = GameStateView::new(self.game, player);
            controllers[seat].choose_action(&view, &actions)
        };

        if let Some(action) = choice.filter(|a| *a != PlayerAction::PassPriority) {
            self.actions_this_step += 1;
            if self.game.perform(player, action)? {
                return Ok(());
            }
            self.game.logger.verbose(&format!(
                "{} tried an illegal action: {action:?}",
                self.game.player_name(player)
            ));
        }

        if !self.game.pass_priority(player)? {
            return Err(MtgError::InvalidAction(format!(
                "{} cannot pass priority",
                self.game.player_name(player)
            )));
        }
        let view = GameStateView::new(self.game, player);
        controllers[seat].on_priority_passed(&view);
        Ok(())
    }
}

fn seat_of(controllers: &[&mut dyn PlayerController], player: PlayerId) -> Result<usize> {
    controllers
        .iter()
        .position(|c| c.player_id() == player)
        .ok_or_else(|| {
            MtgError::InvalidConstruction(format!("no controller for player {player}"))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CardBuilder, CardType};
    use crate::game::{GameConfig, ZeroController};
    use crate::zones::Zone;

    fn game_with_libraries(cards: usize) -> GameState {
        let mut game = GameState::new_two_player("Alice", "Bob", GameConfig::default());
        let players: Vec<PlayerId> = game.players.iter().map(|p| p.id).collect();
        for player in players {
            for _ in 0..cards {
                game.create_card(
                    CardBuilder::new("Grizzly Bears")
                        .owner(player)
                        .cost("{1}{G}")
                        .types([CardType::Creature])
                        .power_toughness(2, 2),
                    Zone::Library,
                )
                .unwrap();
            }
        }
        game
    }

    #[test]
    fn test_with_verbosity_sets_game_logger() {
        let mut game = game_with_libraries(1);
        let game_loop = GameLoop::new(&mut game).with_verbosity(VerbosityLevel::Verbose);
        assert_eq!(game_loop.game.logger.verbosity(), VerbosityLevel::Verbose);
    }

    #[test]
    fn test_missing_controller_is_rejected() {
        let mut game = game_with_libraries(10);
        let alice = game.players[0].id;
        let mut c1 = ZeroController::new(alice);
        let mut c2 = ZeroController::new(alice);
        let mut game_loop = GameLoop::new(&mut game);
        assert!(game_loop.run_game(&mut c1, &mut c2).is_err());
    }

    #[test]
    fn test_turn_limit_ends_game() {
        let mut game = game_with_libraries(40);
        let alice = game.players[0].id;
        let bob = game.players[1].id;
        let mut c1 = ZeroController::new(alice);
        let mut c2 = ZeroController::new(bob);

        let result = GameLoop::new(&mut game)
            .with_max_turns(4)
            .run_game(&mut c1, &mut c2)
            .unwrap();
        assert_eq!(result.end_reason, GameEndReason::TurnLimit);
        assert_eq!(result.winner, None);
        assert_eq!(result.turns_played, 4);
        assert_eq!(game.turn.turn_number, 5);
    }

    #[test]
    fn test_decking_ends_game() {
        // Seven cards each: the opening hand empties the library
        let mut game = game_with_libraries(7);
        let alice = game.players[0].id;
        let bob = game.players[1].id;
        let mut c1 = ZeroController::new(alice);
        let mut c2 = ZeroController::new(bob);

        let result = GameLoop::new(&mut game).run_game(&mut c1, &mut c2).unwrap();
        assert_eq!(result.end_reason, GameEndReason::Decking(alice));
        assert_eq!(result.winner, Some(bob));
        assert_eq!(result.turns_played, 1);
    }

    #[test]
    fn test_life_loss_ends_game() {
        let mut game = game_with_libraries(20);
        let alice = game.players[0].id;
        let bob = game.players[1].id;
        game.get_player_mut(bob).unwrap().life = 0;
        let mut c1 = ZeroController::new(alice);
        let mut c2 = ZeroController::new(bob);

        let result = GameLoop::new(&mut game).run_game(&mut c1, &mut c2).unwrap();
        assert_eq!(result.end_reason, GameEndReason::PlayerDeath(bob));
        assert_eq!(result.winner, Some(alice));
    }

    #[test]
    fn test_turn_order_starts_with_active_player() {
        let mut game = GameState::new(["A", "B", "C"], GameConfig::default()).unwrap();
        let ids: Vec<PlayerId> = game.players.iter().map(|p| p.id).collect();
        game.turn.active_player = ids[1];
        let game_loop = GameLoop::new(&mut game);
        assert_eq!(game_loop.turn_order(), vec![ids[1], ids[2], ids[0]]);
    }
}
