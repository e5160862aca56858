//! Zero controller for testing and automation
//!
//! This controller always chooses the first available action (or passes if
//! no actions). It's useful for automated testing and ensuring games can
//! complete without user input.

use crate::core::{PlayerId, Targets};
use crate::game::controller::{GameStateView, PlayerController};
use crate::game::mana_payment::{ManaAnswer, PendingManaChoice};
use crate::game::selection::TargetRequest;
use crate::game::PlayerAction;

/// A controller that always chooses the first available option
///
/// This is useful for:
/// - Automated testing
/// - Running games without interaction
/// - Benchmarking the game engine
///
/// Mana abilities are only used during its own main phases, so lands are
/// not tapped into a pool that empties before anything can be cast.
pub struct ZeroController {
    player_id: PlayerId,
}

impl ZeroController {
    /// Create a new zero controller
    pub fn new(player_id: PlayerId) -> Self {
        ZeroController { player_id }
    }
}

impl PlayerController for ZeroController {
    fn player_id(&self) -> PlayerId {
        self.player_id
    }

    fn name(&self) -> &str {
        "zero"
    }

    fn choose_action(
        &mut self,
        view: &GameStateView,
        actions: &[PlayerAction],
    ) -> Option<PlayerAction> {
        let may_tap =
            view.is_active_player() && view.step().is_sorcery_speed() && view.stack_size() == 0;
        actions
            .iter()
            .find(|a| {
                !matches!(a, PlayerAction::PassPriority)
                    && (may_tap || !view.is_mana_ability(a))
            })
            .copied()
    }

    fn choose_targets(&mut self, _view: &GameStateView, request: &TargetRequest) -> Targets {
        request.candidates.iter().take(request.count).copied().collect()
    }

    fn choose_options(
        &mut self,
        _view: &GameStateView,
        _prompt: &str,
        _descriptions: &[String],
        how_many: usize,
    ) -> Vec<usize> {
        (0..how_many).collect()
    }

    fn choose_mana_payment(
        &mut self,
        _view: &GameStateView,
        pending: &PendingManaChoice,
    ) -> ManaAnswer {
        ManaAnswer::auto(
            pending
                .ambiguous
                .iter()
                .map(|g| g.options.first().copied().unwrap_or(0)),
        )
    }
}
