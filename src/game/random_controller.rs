//! Random AI controller for testing and baseline gameplay
//!
//! Makes random choices from available actions. Serves as a baseline for
//! more sophisticated AI, and as a fuzzer for the engine: every answer it
//! gives is legal, so any error it provokes is an engine bug.

use crate::core::{PlayerId, Targets};
use crate::game::controller::{GameStateView, PlayerController};
use crate::game::mana_payment::{ManaAnswer, PendingManaChoice};
use crate::game::selection::TargetRequest;
use crate::game::PlayerAction;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// A controller that makes random choices
pub struct RandomController {
    player_id: PlayerId,
    rng: StdRng,
    /// Chance of passing when something else is possible
    pass_weight: f64,
}

impl RandomController {
    /// Create a new random controller seeded from the OS
    pub fn new(player_id: PlayerId) -> Self {
        RandomController {
            player_id,
            rng: StdRng::from_entropy(),
            pass_weight: 0.25,
        }
    }

    /// Create a random controller with a seeded RNG (for deterministic testing)
    pub fn with_seed(player_id: PlayerId, seed: u64) -> Self {
        RandomController {
            player_id,
            rng: StdRng::seed_from_u64(seed),
            pass_weight: 0.25,
        }
    }

    /// Set the chance of passing priority instead of acting
    pub fn with_pass_weight(mut self, weight: f64) -> Self {
        self.pass_weight = weight.clamp(0.0, 1.0);
        self
    }
}

impl PlayerController for RandomController {
    fn player_id(&self) -> PlayerId {
        self.player_id
    }

    fn name(&self) -> &str {
        "random"
    }

    fn choose_action(
        &mut self,
        view: &GameStateView,
        actions: &[PlayerAction],
    ) -> Option<PlayerAction> {
        let candidates: Vec<PlayerAction> = actions
            .iter()
            .filter(|a| !matches!(a, PlayerAction::PassPriority))
            .copied()
            .collect();
        if candidates.is_empty() || self.rng.gen_bool(self.pass_weight) {
            return None;
        }
        let choice = candidates.choose(&mut self.rng).copied();
        if let Some(action) = &choice {
            view.logger()
                .controller_choice(self.name(), &format!("{action:?}"));
        }
        choice
    }

    fn choose_targets(&mut self, _view: &GameStateView, request: &TargetRequest) -> Targets {
        request
            .candidates
            .choose_multiple(&mut self.rng, request.count)
            .copied()
            .collect()
    }

    fn choose_options(
        &mut self,
        _view: &GameStateView,
        _prompt: &str,
        descriptions: &[String],
        how_many: usize,
    ) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..descriptions.len()).collect();
        indices.shuffle(&mut self.rng);
        indices.truncate(how_many);
        indices
    }

    fn choose_mana_payment(
        &mut self,
        _view: &GameStateView,
        pending: &PendingManaChoice,
    ) -> ManaAnswer {
        let mut answer = ManaAnswer::default();
        for group in &pending.ambiguous {
            answer
                .alternatives
                .push(group.options.choose(&mut self.rng).copied().unwrap_or(0));
        }
        answer
    }

    fn on_game_end(&mut self, view: &GameStateView, won: bool) {
        let outcome = if won { "wins" } else { "loses" };
        view.logger().normal(&format!(
            "Random AI {outcome} with {} life",
            view.life()
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::TargetRef;
    use crate::game::{GameConfig, GameState};

    #[test]
    fn test_random_controller_seeded_is_repeatable() {
        let game = GameState::new_two_player("Alice", "Bob", GameConfig::default());
        let alice = game.players[0].id;
        let view = GameStateView::new(&game, alice);
        let descriptions: Vec<String> = (0..6).map(|i| format!("option {i}")).collect();

        let mut first = RandomController::with_seed(alice, 42);
        let mut second = RandomController::with_seed(alice, 42);
        for _ in 0..10 {
            assert_eq!(
                first.choose_options(&view, "pick", &descriptions, 3),
                second.choose_options(&view, "pick", &descriptions, 3)
            );
        }
    }

    #[test]
    fn test_random_options_are_distinct_and_in_range() {
        let game = GameState::new_two_player("Alice", "Bob", GameConfig::default());
        let alice = game.players[0].id;
        let view = GameStateView::new(&game, alice);
        let descriptions: Vec<String> = (0..4).map(|i| format!("option {i}")).collect();
        let mut controller = RandomController::with_seed(alice, 7);

        for _ in 0..20 {
            let mut picked = controller.choose_options(&view, "pick", &descriptions, 4);
            picked.sort_unstable();
            assert_eq!(picked, vec![0, 1, 2, 3]);
        }
    }

    #[test]
    fn test_random_targets_come_from_candidates() {
        let game = GameState::new_two_player("Alice", "Bob", GameConfig::default());
        let alice = game.players[0].id;
        let bob = game.players[1].id;
        let view = GameStateView::new(&game, alice);
        let request = TargetRequest::new(&game, "any player", None, 1, false, |_, t| {
            matches!(t, TargetRef::Player(_))
        });
        assert_eq!(
            request.candidates,
            vec![TargetRef::Player(alice), TargetRef::Player(bob)]
        );
        let mut controller = RandomController::with_seed(alice, 3);
        for _ in 0..10 {
            let targets = controller.choose_targets(&view, &request);
            assert_eq!(targets.len(), 1);
            assert!(request.candidates.contains(&targets[0]));
        }
    }

    #[test]
    fn test_random_only_passes_when_forced() {
        let game = GameState::new_two_player("Alice", "Bob", GameConfig::default());
        let alice = game.players[0].id;
        let view = GameStateView::new(&game, alice);
        let mut controller = RandomController::with_seed(alice, 1).with_pass_weight(0.0);
        assert_eq!(controller.choose_action(&view, &[PlayerAction::PassPriority]), None);
    }
}
