//! Player controller trait and game state view
//!
//! This module defines the interface between the game engine and player
//! controllers (AI or human). The game loop calls the controller when a
//! player has priority or owes an answer to a selection, and the controller
//! inspects a read-only view of the game state to make its choice.

use crate::core::{CardId, Mana, PlayerId, TargetRef, Targets};
use crate::game::mana_payment::{ManaAnswer, PendingManaChoice};
use crate::game::selection::{PendingSelection, SelectionAnswer, SelectionKind, TargetRequest};
use crate::game::{GameLogger, GameState, PlayerAction, Step};
use crate::zones::Zone;

/// Read-only view of game state for controllers
///
/// This provides access to game information without allowing mutation.
/// Controllers should only inspect this view to make decisions.
pub struct GameStateView<'a> {
    game: &'a GameState,
    player_id: PlayerId,
}

impl<'a> GameStateView<'a> {
    /// Create a new view of the game state from a player's perspective
    pub fn new(game: &'a GameState, player_id: PlayerId) -> Self {
        GameStateView { game, player_id }
    }

    /// Get the player ID this view is for
    pub fn player_id(&self) -> PlayerId {
        self.player_id
    }

    /// The whole game, for controllers that search ahead
    pub fn game(&self) -> &'a GameState {
        self.game
    }

    pub fn logger(&self) -> &'a GameLogger {
        &self.game.logger
    }

    /// Get cards in this player's hand
    pub fn hand(&self) -> &'a [CardId] {
        self.game.hand(self.player_id)
    }

    /// Permanents this player controls
    pub fn battlefield(&self) -> &'a [CardId] {
        self.game.battlefield(self.player_id)
    }

    /// Permanents another player controls
    pub fn battlefield_of(&self, player: PlayerId) -> &'a [CardId] {
        self.game.battlefield(player)
    }

    pub fn is_card_in_zone(&self, card_id: CardId, zone: Zone) -> bool {
        self.game.zone_of(card_id) == Some(zone)
    }

    pub fn card_name(&self, card_id: CardId) -> String {
        self.game.card_name(card_id)
    }

    pub fn is_land(&self, card_id: CardId) -> bool {
        self.game.cards.get(card_id).is_ok_and(|c| c.is_land())
    }

    pub fn is_creature(&self, card_id: CardId) -> bool {
        self.game.is_creature(card_id)
    }

    pub fn is_tapped(&self, card_id: CardId) -> bool {
        self.game.permanent(card_id).is_some_and(|p| p.tapped)
    }

    pub fn power(&self, card_id: CardId) -> i32 {
        self.game.power(card_id)
    }

    pub fn toughness(&self, card_id: CardId) -> i32 {
        self.game.toughness(card_id)
    }

    /// Life total of this player
    pub fn life(&self) -> i32 {
        self.life_of(self.player_id)
    }

    pub fn life_of(&self, player: PlayerId) -> i32 {
        self.game.get_player(player).map_or(0, |p| p.life)
    }

    /// Living opponents in seat order
    pub fn opponents(&self) -> Vec<PlayerId> {
        self.game.opponents_of(self.player_id)
    }

    /// Everything in this player's mana pool, restricted mana included
    pub fn mana_pool(&self) -> Mana {
        self.game
            .get_player(self.player_id)
            .map_or_else(|_| Mana::new(), |p| p.mana_pool.contents())
    }

    pub fn step(&self) -> Step {
        self.game.turn.step
    }

    pub fn turn_number(&self) -> u32 {
        self.game.turn.turn_number
    }

    pub fn is_active_player(&self) -> bool {
        self.game.turn.active_player == self.player_id
    }

    pub fn stack_size(&self) -> usize {
        self.game.stack.len()
    }

    /// The action activates a mana ability
    pub fn is_mana_ability(&self, action: &PlayerAction) -> bool {
        match *action {
            PlayerAction::ActivateAbility { source, index } => self
                .game
                .activated_abilities(source)
                .get(index)
                .is_some_and(|a| a.mana_ability),
            _ => false,
        }
    }

    /// Whether a target is one of this player's own things
    pub fn is_own(&self, target: TargetRef) -> bool {
        match target {
            TargetRef::Player(p) => p == self.player_id,
            TargetRef::Permanent(id) => self.game.controller_of(id) == Some(self.player_id),
        }
    }
}

/// Interface for player decision-making
///
/// Implementations decide what to do when they hold priority and how to
/// answer the engine's questions. Selections route through
/// [`PlayerController::answer`], which dispatches on the kind of question.
pub trait PlayerController {
    /// Get the player ID this controller is responsible for
    fn player_id(&self) -> PlayerId;

    /// Label used when logging this controller's choices
    fn name(&self) -> &str {
        "controller"
    }

    /// Choose an action while holding priority
    ///
    /// `actions` always ends with [`PlayerAction::PassPriority`]. Returning
    /// `None` passes as well.
    fn choose_action(
        &mut self,
        view: &GameStateView,
        actions: &[PlayerAction],
    ) -> Option<PlayerAction>;

    /// Pick `request.count` distinct targets from the candidates
    fn choose_targets(&mut self, view: &GameStateView, request: &TargetRequest) -> Targets;

    /// Pick `how_many` distinct option indices; order matters
    fn choose_options(
        &mut self,
        view: &GameStateView,
        prompt: &str,
        descriptions: &[String],
        how_many: usize,
    ) -> Vec<usize>;

    /// Settle an ambiguous mana payment
    fn choose_mana_payment(
        &mut self,
        view: &GameStateView,
        pending: &PendingManaChoice,
    ) -> ManaAnswer;

    /// Answer an outstanding selection
    fn answer(&mut self, view: &GameStateView, selection: &PendingSelection) -> SelectionAnswer {
        match &selection.kind {
            SelectionKind::Targets(request) => {
                SelectionAnswer::Targets(self.choose_targets(view, request))
            }
            SelectionKind::Options {
                descriptions,
                how_many,
            } => SelectionAnswer::Options(self.choose_options(
                view,
                &selection.prompt,
                descriptions,
                *how_many,
            )),
            SelectionKind::GenericMana { pending, .. } => {
                SelectionAnswer::Mana(self.choose_mana_payment(view, pending))
            }
        }
    }

    /// Notification that this player passed priority
    fn on_priority_passed(&mut self, _view: &GameStateView) {}

    /// Notification that the game ended
    fn on_game_end(&mut self, _view: &GameStateView, _won: bool) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CardBuilder, CardType};
    use crate::game::GameConfig;

    #[test]
    fn test_view_reads_player_state() {
        let mut game = GameState::new_two_player("Alice", "Bob", GameConfig::default());
        let alice = game.players[0].id;
        let bob = game.players[1].id;
        let bear = game
            .create_card(
                CardBuilder::new("Grizzly Bears")
                    .owner(alice)
                    .cost("{1}{G}")
                    .types([CardType::Creature])
                    .power_toughness(2, 2),
                Zone::Battlefield,
            )
            .unwrap();
        let forest = game
            .create_card(
                CardBuilder::new("Forest").owner(alice).types([CardType::Land]),
                Zone::Hand,
            )
            .unwrap();

        let view = GameStateView::new(&game, alice);
        assert_eq!(view.player_id(), alice);
        assert_eq!(view.life(), 20);
        assert_eq!(view.battlefield(), &[bear]);
        assert_eq!(view.hand(), &[forest]);
        assert!(view.is_land(forest));
        assert!(view.is_creature(bear));
        assert_eq!(view.power(bear), 2);
        assert_eq!(view.opponents(), vec![bob]);
        assert!(view.is_own(TargetRef::Permanent(bear)));
        assert!(!view.is_own(TargetRef::Player(bob)));
        assert!(view.is_active_player());
        assert_eq!(view.card_name(bear), "Grizzly Bears");
    }
}
