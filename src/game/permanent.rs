//! Permanents: cards on the battlefield
//!
//! The struct holds only stored, base values. Power, toughness, types and
//! abilities are always read through the query methods on [`GameState`],
//! which run the corresponding dispatch over these base values.

use crate::core::{
    Ability, Card, CardId, CardType, CounterType, Keyword, PlayerId, Stat, TypeList,
};
use crate::game::dispatch::{AbilitiesQuery, PowerQuery, ToughnessQuery, TypesQuery};
use crate::game::GameState;
use smallvec::SmallVec;

/// Live state of a card on the battlefield
#[derive(Debug, Clone)]
pub struct Permanent {
    /// Same id as the card
    pub id: CardId,
    pub owner: PlayerId,
    pub controller: PlayerId,
    pub types: TypeList,
    pub base_power: Option<Stat>,
    pub base_toughness: Option<Stat>,
    /// Printed abilities
    pub base_abilities: Vec<Ability>,
    /// Granted abilities that survive turn changes
    pub eternal_abilities: Vec<Ability>,
    /// Granted abilities cleared at end of turn
    pub temporary_abilities: Vec<Ability>,
    pub tapped: bool,
    pub counters: SmallVec<[(CounterType, u32); 2]>,
    /// Permanent this aura is attached to
    pub attached_to: Option<CardId>,
    pub damage: i32,
    pub deathtouch_damage: bool,
    pub summoning_sick: bool,
}

impl Permanent {
    pub fn from_card(card: &Card, controller: PlayerId) -> Self {
        let mut counters = SmallVec::new();
        if let Some(loyalty) = card.loyalty {
            counters.push((CounterType::loyalty(), loyalty));
        }
        Permanent {
            id: card.id,
            owner: card.owner,
            controller,
            types: card.types.clone(),
            base_power: card.power.clone(),
            base_toughness: card.toughness.clone(),
            base_abilities: card.abilities.clone(),
            eternal_abilities: Vec::new(),
            temporary_abilities: Vec::new(),
            tapped: false,
            counters,
            attached_to: None,
            damage: 0,
            deathtouch_damage: false,
            summoning_sick: true,
        }
    }

    pub fn counter(&self, kind: &CounterType) -> u32 {
        self.counters
            .iter()
            .find(|(k, _)| k == kind)
            .map_or(0, |(_, n)| *n)
    }

    pub fn add_counters(&mut self, kind: CounterType, amount: u32) {
        if amount == 0 {
            return;
        }
        match self.counters.iter_mut().find(|(k, _)| *k == kind) {
            Some((_, n)) => *n += amount,
            None => self.counters.push((kind, amount)),
        }
    }

    /// Remove up to `amount`; counts never go below zero
    pub fn remove_counters(&mut self, kind: &CounterType, amount: u32) -> u32 {
        let mut removed = 0;
        if let Some((_, n)) = self.counters.iter_mut().find(|(k, _)| k == kind) {
            removed = amount.min(*n);
            *n -= removed;
        }
        self.counters.retain(|(_, n)| *n > 0);
        removed
    }

    /// Net +1/+1 minus -1/-1 counters
    fn counter_bonus(&self) -> i32 {
        self.counter(&CounterType::plus_one_plus_one()) as i32
            - self.counter(&CounterType::minus_one_minus_one()) as i32
    }

    pub fn clear_damage(&mut self) {
        self.damage = 0;
        self.deathtouch_damage = false;
    }
}

impl GameState {
    pub fn permanent(&self, id: CardId) -> Option<&Permanent> {
        self.permanents.get(&id)
    }

    pub fn permanent_mut(&mut self, id: CardId) -> Option<&mut Permanent> {
        self.permanents.get_mut(&id)
    }

    pub fn is_on_battlefield(&self, id: CardId) -> bool {
        self.permanents.contains_key(&id)
    }

    pub fn controller_of(&self, id: CardId) -> Option<PlayerId> {
        self.permanents.get(&id).map(|p| p.controller)
    }

    /// Current power, after interceptors
    pub fn power(&self, id: CardId) -> i32 {
        self.dispatch_query::<PowerQuery>(&id, |game, &id| {
            game.permanents.get(&id).map_or(0, |p| {
                p.base_power.as_ref().map_or(0, |s| s.evaluate(game, id)) + p.counter_bonus()
            })
        })
    }

    /// Current toughness, after interceptors
    pub fn toughness(&self, id: CardId) -> i32 {
        self.dispatch_query::<ToughnessQuery>(&id, |game, &id| {
            game.permanents.get(&id).map_or(0, |p| {
                p.base_toughness.as_ref().map_or(0, |s| s.evaluate(game, id)) + p.counter_bonus()
            })
        })
    }

    /// Current card types, after interceptors
    pub fn types(&self, id: CardId) -> TypeList {
        self.dispatch_query::<TypesQuery>(&id, |game, id| {
            game.permanents
                .get(id)
                .map(|p| p.types.clone())
                .unwrap_or_default()
        })
    }

    /// Current abilities, after interceptors
    pub fn abilities(&self, id: CardId) -> Vec<Ability> {
        self.dispatch_query::<AbilitiesQuery>(&id, |game, &id| game.raw_abilities(id))
    }

    pub fn has_keyword(&self, id: CardId, keyword: &Keyword) -> bool {
        self.abilities(id).iter().any(|a| a.is_keyword(keyword))
    }

    pub fn is_type(&self, id: CardId, card_type: CardType) -> bool {
        self.is_on_battlefield(id) && self.types(id).contains(&card_type)
    }

    pub fn is_creature(&self, id: CardId) -> bool {
        self.is_type(id, CardType::Creature)
    }

    pub fn is_planeswalker(&self, id: CardId) -> bool {
        self.is_type(id, CardType::Planeswalker)
    }

    /// Creatures `player` controls, in battlefield order
    pub fn creatures_of(&self, player: PlayerId) -> Vec<CardId> {
        self.battlefield(player)
            .iter()
            .copied()
            .filter(|&id| self.is_creature(id))
            .collect()
    }

    /// Damage still needed to destroy this creature
    pub fn lethal_damage(&self, id: CardId) -> i32 {
        match self.permanents.get(&id) {
            Some(p) => (self.toughness(id) - p.damage).max(0),
            None => 0,
        }
    }

    /// Give `ability` to a permanent until end of turn
    pub fn grant_temporary(&mut self, id: CardId, ability: Ability) {
        if let Some(p) = self.permanents.get_mut(&id) {
            p.temporary_abilities.push(ability);
        }
    }

    /// Give `ability` to a permanent for as long as it stays in play
    pub fn grant_eternal(&mut self, id: CardId, ability: Ability) {
        if let Some(p) = self.permanents.get_mut(&id) {
            p.eternal_abilities.push(ability);
        }
    }
}
