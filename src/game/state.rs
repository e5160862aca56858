//! Main game state structure

use crate::core::{
    Ability, Card, CardBuilder, CardId, EntityId, EntityStore, Player, PlayerId, PlayerName,
};
use crate::game::selection::PendingSelection;
use crate::game::{CombatState, GameConfig, GameLogger, Permanent, Stack, TurnState};
use crate::zones::{PlayerZones, Zone};
use crate::{MtgError, Result};
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use rustc_hash::FxHashMap;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

/// Complete game state for one session
///
/// Everything the engine knows lives here: there is no global state, and
/// independent sessions can run side by side on different threads.
pub struct GameState {
    pub config: GameConfig,

    /// Every card in the game, whatever zone it is in
    pub cards: EntityStore<Card>,

    /// Players in seat order
    pub players: Vec<Player>,

    /// Zones for each player, in seat order
    pub player_zones: Vec<(PlayerId, PlayerZones)>,

    /// Live state of cards on the battlefield
    pub permanents: FxHashMap<CardId, Permanent>,

    pub stack: Stack,

    pub turn: TurnState,

    pub combat: CombatState,

    /// Outstanding selections, at most one per player
    pub(crate) selections: BTreeMap<PlayerId, PendingSelection>,

    /// Used for library shuffles
    ///
    /// Wrapped in RefCell so shuffles can happen behind a shared borrow.
    pub rng: RefCell<ChaCha12Rng>,

    /// Unified entity ID generator (shared across all entity types)
    next_entity_id: u32,

    /// Current nesting of computed ability expansion
    pub(crate) expansion_depth: Cell<usize>,

    /// Computed abilities seen during the current expansion, keyed by
    /// permanent and closure; `None` while still being expanded
    pub(crate) expansions: RefCell<FxHashMap<(CardId, usize), Option<Vec<Ability>>>>,

    pub logger: GameLogger,
}

impl GameState {
    /// Create a game for the named players, seated in the given order
    ///
    /// The first player starts. Fewer than two players is an
    /// `InvalidConstruction` error.
    pub fn new<N: Into<PlayerName>>(
        names: impl IntoIterator<Item = N>,
        config: GameConfig,
    ) -> Result<Self> {
        let names: Vec<PlayerName> = names.into_iter().map(Into::into).collect();
        if names.len() < 2 {
            return Err(MtgError::InvalidConstruction(format!(
                "a game needs at least two players, got {}",
                names.len()
            )));
        }
        Ok(Self::seat(names, config))
    }

    /// Create a game with two players
    pub fn new_two_player(
        player1_name: impl Into<PlayerName>,
        player2_name: impl Into<PlayerName>,
        config: GameConfig,
    ) -> Self {
        Self::seat(vec![player1_name.into(), player2_name.into()], config)
    }

    fn seat(names: Vec<PlayerName>, config: GameConfig) -> Self {
        let mut next_id = 0;
        let mut players = Vec::with_capacity(names.len());
        let mut player_zones = Vec::with_capacity(names.len());
        for name in names {
            let id = PlayerId::new(next_id);
            next_id += 1;
            players.push(Player::new(id, name, config.starting_life));
            player_zones.push((id, PlayerZones::new(id)));
        }

        let first = players[0].id;
        let turn = TurnState::new(first, players.iter().map(|p| p.id));
        let logger = GameLogger::with_verbosity(config.verbosity);
        let rng = ChaCha12Rng::seed_from_u64(config.seed);

        GameState {
            config,
            cards: EntityStore::new(),
            players,
            player_zones,
            permanents: FxHashMap::default(),
            stack: Stack::new(),
            turn,
            combat: CombatState::new(),
            selections: BTreeMap::new(),
            rng: RefCell::new(rng),
            next_entity_id: next_id,
            expansion_depth: Cell::new(0),
            expansions: RefCell::new(FxHashMap::default()),
            logger,
        }
    }

    /// Reseed the shuffle RNG
    pub fn seed_rng(&mut self, seed: u64) {
        *self.rng.borrow_mut() = ChaCha12Rng::seed_from_u64(seed);
    }

    /// Shuffle a player's library using the game's RNG
    pub fn shuffle_library(&mut self, player_id: PlayerId) {
        if let Some(zones) = self
            .player_zones
            .iter_mut()
            .find(|(id, _)| *id == player_id)
            .map(|(_, z)| z)
        {
            zones.library.shuffle(&mut *self.rng.borrow_mut());
        }
    }

    /// Get next entity ID (unified across all entity types)
    pub fn next_id<T>(&mut self) -> EntityId<T> {
        let id = EntityId::new(self.next_entity_id);
        self.next_entity_id += 1;
        id
    }

    pub fn get_player_zones(&self, player_id: PlayerId) -> Option<&PlayerZones> {
        self.player_zones
            .iter()
            .find(|(id, _)| *id == player_id)
            .map(|(_, zones)| zones)
    }

    pub fn get_player_zones_mut(&mut self, player_id: PlayerId) -> Option<&mut PlayerZones> {
        self.player_zones
            .iter_mut()
            .find(|(id, _)| *id == player_id)
            .map(|(_, zones)| zones)
    }

    fn zones_mut(&mut self, player_id: PlayerId) -> Result<&mut PlayerZones> {
        self.get_player_zones_mut(player_id)
            .ok_or(MtgError::EntityNotFound(player_id.as_u32()))
    }

    pub fn get_player(&self, id: PlayerId) -> Result<&Player> {
        self.players
            .iter()
            .find(|p| p.id == id)
            .ok_or(MtgError::EntityNotFound(id.as_u32()))
    }

    pub fn get_player_mut(&mut self, id: PlayerId) -> Result<&mut Player> {
        self.players
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(MtgError::EntityNotFound(id.as_u32()))
    }

    pub fn get_player_idx(&self, id: PlayerId) -> Option<usize> {
        self.players.iter().position(|p| p.id == id)
    }

    /// Players still in the game, in seat order
    pub fn alive_players(&self) -> Vec<PlayerId> {
        self.players
            .iter()
            .filter(|p| p.is_alive())
            .map(|p| p.id)
            .collect()
    }

    /// Everyone still in the game except `player`
    pub fn opponents_of(&self, player: PlayerId) -> Vec<PlayerId> {
        self.alive_players()
            .into_iter()
            .filter(|&p| p != player)
            .collect()
    }

    /// Next player in seat order after `current` who has not lost
    pub fn next_player_after(&self, current: PlayerId) -> PlayerId {
        let Some(start) = self.get_player_idx(current) else {
            return current;
        };
        let n = self.players.len();
        (1..=n)
            .map(|offset| &self.players[(start + offset) % n])
            .find(|p| p.is_alive())
            .map_or(current, |p| p.id)
    }

    /// Permanents `player` controls, in arrival order
    pub fn battlefield(&self, player: PlayerId) -> &[CardId] {
        self.get_player_zones(player)
            .map(|zones| zones.battlefield.cards.as_slice())
            .unwrap_or(&[])
    }

    pub fn hand(&self, player: PlayerId) -> &[CardId] {
        self.get_player_zones(player)
            .map(|zones| zones.hand.cards.as_slice())
            .unwrap_or(&[])
    }

    pub fn card_name(&self, id: CardId) -> String {
        self.cards
            .get(id)
            .map_or_else(|_| format!("card {id}"), |c| c.name.to_string())
    }

    /// Which zone a card is currently in
    pub fn zone_of(&self, card: CardId) -> Option<Zone> {
        if self.stack.contains_card(card) {
            return Some(Zone::Stack);
        }
        self.player_zones.iter().find_map(|(_, zones)| zones.find(card))
    }

    /// Take a card out of whatever zone holds it
    ///
    /// A card leaving the battlefield loses its permanent state and any
    /// combat role.
    pub(crate) fn detach_card(&mut self, card: CardId) {
        if self.permanents.remove(&card).is_some() {
            self.combat.remove(card);
        }
        for (_, zones) in &mut self.player_zones {
            for zone in [
                Zone::Battlefield,
                Zone::Hand,
                Zone::Library,
                Zone::Graveyard,
                Zone::Exile,
            ] {
                if let Some(z) = zones.get_zone_mut(zone) {
                    z.remove(card);
                }
            }
        }
    }

    /// Move a card to one of its owner's zones
    ///
    /// Moving to the battlefield puts it under its owner's control. The
    /// stack is entered only by casting.
    pub fn move_card(&mut self, card: CardId, to: Zone) -> Result<()> {
        match to {
            Zone::Battlefield => {
                let owner = self.cards.get(card)?.owner;
                self.put_onto_battlefield(card, owner)
            }
            Zone::Stack => Err(MtgError::InvalidAction(
                "cards enter the stack only by being cast".to_string(),
            )),
            _ => {
                let owner = self.cards.get(card)?.owner;
                self.detach_card(card);
                if let Some(zone) = self.zones_mut(owner)?.get_zone_mut(to) {
                    zone.add(card);
                }
                self.logger.verbose(&format!("{} -> {to:?}", self.card_name(card)));
                Ok(())
            }
        }
    }

    /// Put a card onto the battlefield under `controller`'s control
    pub fn put_onto_battlefield(&mut self, card: CardId, controller: PlayerId) -> Result<()> {
        let permanent = Permanent::from_card(self.cards.get(card)?, controller);
        self.detach_card(card);
        self.zones_mut(controller)?.battlefield.add(card);
        self.permanents.insert(card, permanent);
        self.logger.normal(&format!(
            "{} enters the battlefield under {}",
            self.card_name(card),
            controller
        ));
        Ok(())
    }

    /// Build a card, register it and place it in `zone`
    ///
    /// The card's owner must be set on the builder.
    pub fn create_card(&mut self, builder: CardBuilder, zone: Zone) -> Result<CardId> {
        let id = self.next_id();
        let card = builder.build(id)?;
        let owner = card.owner;
        self.get_player(owner)?;
        self.cards.insert(id, card);
        match zone {
            Zone::Battlefield => self.put_onto_battlefield(id, owner)?,
            Zone::Stack => {
                return Err(MtgError::InvalidAction(
                    "cards cannot be created on the stack".to_string(),
                ))
            }
            other => {
                if let Some(z) = self.zones_mut(owner)?.get_zone_mut(other) {
                    z.add(id);
                }
            }
        }
        Ok(id)
    }

    /// Draw a card for a player
    ///
    /// Drawing from an empty library flags the player; the next state-based
    /// check makes them lose.
    pub fn draw_card(&mut self, player_id: PlayerId) -> Result<Option<CardId>> {
        let drawn = {
            let zones = self.zones_mut(player_id)?;
            let drawn = zones.library.draw_top();
            if let Some(card) = drawn {
                zones.hand.add(card);
            }
            drawn
        };
        match drawn {
            Some(card) => self
                .logger
                .verbose(&format!("{player_id} draws {}", self.card_name(card))),
            None => {
                self.get_player_mut(player_id)?.drew_from_empty_library = true;
                self.logger
                    .normal(&format!("{player_id} tries to draw from an empty library"));
            }
        }
        Ok(drawn)
    }

    /// Check if the game is over
    pub fn is_game_over(&self) -> bool {
        self.players.iter().filter(|p| !p.has_lost).count() <= 1
    }

    /// Get the winner (if game is over)
    pub fn get_winner(&self) -> Option<PlayerId> {
        if !self.is_game_over() {
            return None;
        }
        self.players.iter().find(|p| !p.has_lost).map(|p| p.id)
    }
}

impl std::fmt::Debug for GameState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameState")
            .field("turn", &self.turn.turn_number)
            .field("step", &self.turn.step)
            .field("players", &self.players)
            .field("permanents", &self.permanents.len())
            .field("stack", &self.stack.len())
            .finish()
    }
}
