//! Game actions and mechanics
//!
//! Everything a player can do. An action that is not legal right now
//! returns `Ok(false)` and changes nothing; `Err` is reserved for broken
//! game data. Casting and activating may stop at a selection (targets, then
//! an ambiguous mana payment); the action counts as started and completes
//! when the selection is answered.

use crate::core::{
    ActivatedAbility, CardId, Cost, CounterType, EffectContext, Keyword, PlayerId, Targets,
};
use crate::game::dispatch::{BlockCheck, CanAttackQuery, CanBlockQuery};
use crate::game::selection::TargetRequest;
use crate::game::{GameState, PendingCast, PendingEffect, StackEntry, Step};
use crate::zones::Zone;
use crate::Result;
use serde::{Deserialize, Serialize};

/// A single action a player may take
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerAction {
    PlayLand(CardId),
    CastSpell(CardId),
    /// `index` counts activated abilities of `source` in ability order
    ActivateAbility { source: CardId, index: usize },
    DeclareAttacker(CardId),
    DeclareBlocker { blocker: CardId, attacker: CardId },
    PassPriority,
    EndPhase,
    EndTurn,
}

impl GameState {
    /// The player may act at all: in the game, not waiting on a selection
    fn can_act(&self, player: PlayerId) -> bool {
        !self.is_game_over()
            && self.get_player(player).is_ok_and(|p| p.is_alive())
            && self.pending_selection(player).is_none()
    }

    /// Main phase of `player`'s own turn with an empty stack
    pub fn has_sorcery_timing(&self, player: PlayerId) -> bool {
        self.turn.active_player == player
            && self.turn.step.is_sorcery_speed()
            && self.stack.is_empty()
    }

    fn in_zone(&self, player: PlayerId, card: CardId, zone: Zone) -> bool {
        self.get_player_zones(player)
            .and_then(|z| z.get_zone(zone))
            .is_some_and(|z| z.contains(card))
    }

    pub fn can_play_land(&self, player: PlayerId, card: CardId) -> bool {
        self.can_act(player)
            && self.has_sorcery_timing(player)
            && self.in_zone(player, card, Zone::Hand)
            && self.cards.get(card).is_ok_and(|c| c.is_land())
            && self.get_player(player).is_ok_and(|p| p.can_play_land())
    }

    /// Play a land from hand to battlefield
    pub fn play_land(&mut self, player: PlayerId, card: CardId) -> Result<bool> {
        if !self.can_play_land(player, card) {
            return Ok(false);
        }
        self.put_onto_battlefield(card, player)?;
        self.get_player_mut(player)?.play_land();
        Ok(true)
    }

    /// Timing, zone and affordability; targets are checked for feasibility
    pub fn can_cast(&self, player: PlayerId, card_id: CardId) -> bool {
        if !self.can_act(player) || !self.in_zone(player, card_id, Zone::Hand) {
            return false;
        }
        let Ok(card) = self.cards.get(card_id) else {
            return false;
        };
        if card.is_land() {
            return false;
        }
        if !card.has_instant_timing() && !self.has_sorcery_timing(player) {
            return false;
        }
        if let Some(spec) = card.cast_targets() {
            if self.legal_targets(spec, player, Some(card_id)).len() < spec.count {
                return false;
            }
        }
        self.get_player(player)
            .is_ok_and(|p| p.mana_pool.can_pay(&card.mana_cost, Some(card)))
    }

    /// Cast a spell: choose targets, pay, then put it on the stack
    pub fn cast_spell(&mut self, player: PlayerId, card_id: CardId) -> Result<bool> {
        if !self.can_cast(player, card_id) {
            return Ok(false);
        }
        let card = self.cards.get(card_id)?.clone();
        self.logger.normal(&format!(
            "{} casts {}",
            self.player_name(player),
            card.name
        ));

        match card.cast_targets() {
            Some(spec) => {
                let request = TargetRequest::for_spec(self, spec, player, Some(card_id));
                self.request_targets(player, request, move |game, targets| {
                    game.pay_for_cast(player, card_id, targets)
                })
            }
            None => {
                self.pay_for_cast(player, card_id, Targets::new())?;
                Ok(true)
            }
        }
    }

    fn pay_for_cast(&mut self, player: PlayerId, card: CardId, targets: Targets) -> Result<()> {
        let cost = self.cards.get(card)?.mana_cost.clone();
        let started = self.pay_mana(player, &cost, Some(card), move |game| {
            game.commit_cast(PendingCast {
                card,
                controller: player,
                targets,
            })
        })?;
        if !started {
            self.logger
                .normal(&format!("{} can no longer pay for {}", player, self.card_name(card)));
        }
        Ok(())
    }

    fn commit_cast(&mut self, cast: PendingCast) -> Result<()> {
        self.detach_card(cast.card);
        self.push_stack(StackEntry::Cast(cast));
        self.turn.clear_passed_priority();
        Ok(())
    }

    /// Activated abilities of a permanent, in ability order
    pub fn activated_abilities(&self, source: CardId) -> Vec<ActivatedAbility> {
        self.abilities(source)
            .iter()
            .filter_map(|a| a.as_activated().cloned())
            .collect()
    }

    pub fn can_activate(&self, player: PlayerId, source: CardId, index: usize) -> bool {
        if !self.can_act(player) || self.controller_of(source) != Some(player) {
            return false;
        }
        let Some(ability) = self.activated_abilities(source).into_iter().nth(index) else {
            return false;
        };
        self.can_pay_cost(player, source, &ability)
            && ability.target.as_ref().map_or(true, |spec| {
                self.legal_targets(spec, player, Some(source)).len() >= spec.count
            })
    }

    fn can_pay_cost(&self, player: PlayerId, source: CardId, ability: &ActivatedAbility) -> bool {
        let Some(permanent) = self.permanent(source) else {
            return false;
        };
        let cost = &ability.cost;
        if cost.includes_tap() {
            let sick = permanent.summoning_sick
                && self.is_creature(source)
                && !self.has_keyword(source, &Keyword::Haste);
            if permanent.tapped || sick {
                return false;
            }
        }
        if let Some(change) = cost.loyalty_change() {
            let loyalty = permanent.counter(&CounterType::loyalty()) as i32;
            if !self.has_sorcery_timing(player) || loyalty + change < 0 {
                return false;
            }
        }
        let Ok(p) = self.get_player(player) else {
            return false;
        };
        if cost.life() > p.life {
            return false;
        }
        cost.mana_cost()
            .map_or(true, |m| p.mana_pool.can_pay(m, None))
    }

    /// Activate the `index`-th activated ability of `source`
    ///
    /// Mana abilities resolve on the spot; everything else goes on the stack.
    pub fn activate_ability(&mut self, player: PlayerId, source: CardId, index: usize) -> Result<bool> {
        if !self.can_activate(player, source, index) {
            return Ok(false);
        }
        let Some(ability) = self.activated_abilities(source).into_iter().nth(index) else {
            return Ok(false);
        };
        self.logger.normal(&format!(
            "{} activates {}: {}",
            self.player_name(player),
            self.card_name(source),
            ability.description
        ));

        match ability.target.clone() {
            Some(spec) => {
                let request = TargetRequest::for_spec(self, &spec, player, Some(source));
                self.request_targets(player, request, move |game, targets| {
                    game.pay_for_activation(player, source, ability, targets)
                })
            }
            None => {
                self.pay_for_activation(player, source, ability, Targets::new())?;
                Ok(true)
            }
        }
    }

    fn pay_for_activation(
        &mut self,
        player: PlayerId,
        source: CardId,
        ability: ActivatedAbility,
        targets: Targets,
    ) -> Result<()> {
        let mana = ability.cost.mana_cost().cloned().unwrap_or_default();
        self.pay_mana(player, &mana, None, move |game| {
            game.pay_other_costs(player, source, &ability.cost)?;
            if ability.mana_ability {
                let ctx = EffectContext::new(source, player).with_targets(targets);
                return game.execute_effect(&ability.effect, &ctx);
            }
            game.push_stack(StackEntry::Effect(PendingEffect {
                effect: ability.effect,
                source,
                controller: player,
                targets,
                description: ability.description,
            }));
            game.turn.clear_passed_priority();
            Ok(())
        })?;
        Ok(())
    }

    fn pay_other_costs(&mut self, player: PlayerId, source: CardId, cost: &Cost) -> Result<()> {
        if let Some(permanent) = self.permanent_mut(source) {
            if cost.includes_tap() {
                permanent.tapped = true;
            }
            match cost.loyalty_change() {
                Some(change) if change > 0 => {
                    permanent.add_counters(CounterType::loyalty(), change as u32)
                }
                Some(change) => {
                    permanent.remove_counters(&CounterType::loyalty(), change.unsigned_abs());
                }
                None => {}
            }
        }
        let life = cost.life();
        if life > 0 {
            self.get_player_mut(player)?.lose_life(life);
        }
        if cost.includes_sacrifice() {
            self.move_card(source, Zone::Graveyard)?;
        }
        Ok(())
    }

    /// Whether `attacker` could be declared as an attacker right now
    pub fn can_declare_attacker(&self, player: PlayerId, attacker: CardId) -> bool {
        let Some(p) = self.permanent(attacker) else {
            return false;
        };
        self.can_act(player)
            && self.turn.step == Step::DeclareAttackers
            && self.turn.active_player == player
            && self.stack.is_empty()
            && p.controller == player
            && self.is_creature(attacker)
            && !p.tapped
            && (!p.summoning_sick || self.has_keyword(attacker, &Keyword::Haste))
            && !self.has_keyword(attacker, &Keyword::Defender)
            && !self.combat.is_attacking(attacker)
            && self.dispatch_query::<CanAttackQuery>(&attacker, |_, _| true)
    }

    pub fn declare_attacker(&mut self, player: PlayerId, attacker: CardId) -> Result<bool> {
        if !self.can_declare_attacker(player, attacker) {
            return Ok(false);
        }
        let Some(defender) = self
            .turn
            .defending_player
            .or_else(|| self.opponents_of(player).first().copied())
        else {
            return Ok(false);
        };
        self.combat.declare_attacker(attacker, defender);
        self.logger.normal(&format!(
            "{} attacks {}",
            self.card_name(attacker),
            self.player_name(defender)
        ));
        Ok(true)
    }

    /// Whether `blocker` could block `attacker` right now
    pub fn can_declare_blocker(&self, player: PlayerId, blocker: CardId, attacker: CardId) -> bool {
        let Some(p) = self.permanent(blocker) else {
            return false;
        };
        self.can_act(player)
            && !self.has_pending_selection()
            && self.turn.step == Step::DeclareBlockers
            && self.stack.is_empty()
            && self.combat.defending_player_of(attacker) == Some(player)
            && p.controller == player
            && self.is_creature(blocker)
            && !p.tapped
            && !self.combat.is_blocking(blocker)
            && self.dispatch_query::<CanBlockQuery>(&BlockCheck { blocker, attacker }, |game, check| {
                !game.has_keyword(check.attacker, &Keyword::Flying)
                    || game.has_keyword(check.blocker, &Keyword::Flying)
                    || game.has_keyword(check.blocker, &Keyword::Reach)
            })
    }

    pub fn declare_blocker(&mut self, player: PlayerId, blocker: CardId, attacker: CardId) -> Result<bool> {
        if !self.can_declare_blocker(player, blocker, attacker) {
            return Ok(false);
        }
        self.combat.declare_blocker(blocker, attacker);
        self.logger.normal(&format!(
            "{} blocks {}",
            self.card_name(blocker),
            self.card_name(attacker)
        ));
        Ok(true)
    }

    /// Pass priority for the rest of this step
    pub fn pass_priority(&mut self, player: PlayerId) -> Result<bool> {
        if !self.can_act(player) {
            return Ok(false);
        }
        self.turn.flags_mut(player).passed_priority = true;
        self.logger.verbose(&format!("{} passes", self.player_name(player)));
        Ok(true)
    }

    /// Pass for the rest of this phase
    pub fn end_phase(&mut self, player: PlayerId) -> Result<bool> {
        if !self.can_act(player) {
            return Ok(false);
        }
        self.turn.flags_mut(player).ended_phase = true;
        Ok(true)
    }

    /// Pass for the rest of this turn
    pub fn end_turn(&mut self, player: PlayerId) -> Result<bool> {
        if !self.can_act(player) {
            return Ok(false);
        }
        self.turn.flags_mut(player).ended_turn = true;
        Ok(true)
    }

    /// `player` takes control of a permanent
    ///
    /// The permanent moves to the end of its new controller's battlefield,
    /// leaves combat and is summoning sick again.
    pub fn gain_control(&mut self, player: PlayerId, id: CardId) -> Result<bool> {
        let Some(old) = self.controller_of(id) else {
            return Ok(false);
        };
        self.get_player(player)?;
        if old == player {
            return Ok(false);
        }
        if let Some(zones) = self.get_player_zones_mut(old) {
            zones.battlefield.remove(id);
        }
        if let Some(zones) = self.get_player_zones_mut(player) {
            zones.battlefield.add(id);
        }
        self.combat.remove(id);
        if let Some(p) = self.permanent_mut(id) {
            p.controller = player;
            p.summoning_sick = true;
        }
        self.logger.normal(&format!(
            "{} gains control of {}",
            self.player_name(player),
            self.card_name(id)
        ));
        Ok(true)
    }

    /// Every action `player` could start right now
    ///
    /// Passing is always included while the player can act.
    pub fn legal_actions(&self, player: PlayerId) -> Vec<PlayerAction> {
        let mut actions = Vec::new();
        if !self.can_act(player) {
            return actions;
        }
        for &card in self.hand(player) {
            if self.can_play_land(player, card) {
                actions.push(PlayerAction::PlayLand(card));
            } else if self.can_cast(player, card) {
                actions.push(PlayerAction::CastSpell(card));
            }
        }
        for &source in self.battlefield(player) {
            for index in 0..self.activated_abilities(source).len() {
                if self.can_activate(player, source, index) {
                    actions.push(PlayerAction::ActivateAbility { source, index });
                }
            }
        }
        for &creature in self.battlefield(player) {
            if self.can_declare_attacker(player, creature) {
                actions.push(PlayerAction::DeclareAttacker(creature));
            }
        }
        for attacker in self.combat.attackers() {
            for &creature in self.battlefield(player) {
                if self.can_declare_blocker(player, creature, attacker) {
                    actions.push(PlayerAction::DeclareBlocker {
                        blocker: creature,
                        attacker,
                    });
                }
            }
        }
        actions.push(PlayerAction::PassPriority);
        actions
    }

    /// Carry out an action
    pub fn perform(&mut self, player: PlayerId, action: PlayerAction) -> Result<bool> {
        match action {
            PlayerAction::PlayLand(card) => self.play_land(player, card),
            PlayerAction::CastSpell(card) => self.cast_spell(player, card),
            PlayerAction::ActivateAbility { source, index } => {
                self.activate_ability(player, source, index)
            }
            PlayerAction::DeclareAttacker(card) => self.declare_attacker(player, card),
            PlayerAction::DeclareBlocker { blocker, attacker } => {
                self.declare_blocker(player, blocker, attacker)
            }
            PlayerAction::PassPriority => self.pass_priority(player),
            PlayerAction::EndPhase => self.end_phase(player),
            PlayerAction::EndTurn => self.end_turn(player),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CardBuilder, CardType, Color, Effect, Mana, Subject, TargetRef, TargetSpec};
    use crate::game::mana_payment::ManaAnswer;
    use crate::game::{GameConfig, SelectionAnswer};

    fn setup() -> (GameState, PlayerId, PlayerId) {
        let game = GameState::new_two_player("Alice", "Bob", GameConfig::default());
        let (a, b) = (game.players[0].id, game.players[1].id);
        (game, a, b)
    }

    fn creature(game: &mut GameState, owner: PlayerId, p: i32, t: i32, keywords: &[Keyword]) -> CardId {
        let mut builder = CardBuilder::new("Creature")
            .owner(owner)
            .types([CardType::Creature])
            .power_toughness(p, t);
        for k in keywords {
            builder = builder.ability(k.clone());
        }
        game.create_card(builder, Zone::Battlefield).unwrap()
    }

    fn add_mana(game: &mut GameState, player: PlayerId, mana: Mana) {
        game.get_player_mut(player).unwrap().mana_pool.add(mana);
    }

    #[test]
    fn test_play_land_once_per_turn() {
        let (mut game, alice, _) = setup();
        game.turn.enter_step(Step::Main1);
        let lands: Vec<CardId> = ["Mountain", "Forest"]
            .into_iter()
            .map(|name| {
                game.create_card(
                    CardBuilder::new(name).owner(alice).types([CardType::Land]),
                    Zone::Hand,
                )
                .unwrap()
            })
            .collect();

        assert!(game.play_land(alice, lands[0]).unwrap());
        assert!(game.is_on_battlefield(lands[0]));
        assert!(!game.play_land(alice, lands[1]).unwrap());
        assert_eq!(game.zone_of(lands[1]), Some(Zone::Hand));
    }

    #[test]
    fn test_land_outside_main_phase_is_refused() {
        let (mut game, alice, _) = setup();
        let land = game
            .create_card(
                CardBuilder::new("Mountain").owner(alice).types([CardType::Land]),
                Zone::Hand,
            )
            .unwrap();
        assert_eq!(game.turn.step, Step::Untap);
        assert!(!game.play_land(alice, land).unwrap());
    }

    #[test]
    fn test_cast_targeted_spell_end_to_end() {
        let (mut game, alice, bob) = setup();
        game.turn.enter_step(Step::Main1);
        let bolt = game
            .create_card(
                CardBuilder::new("Lightning Bolt")
                    .owner(alice)
                    .cost("{R}")
                    .types([CardType::Instant])
                    .target(TargetSpec::any_target())
                    .spell(Effect::DealDamage {
                        to: Subject::Target(0),
                        amount: 3,
                    }),
                Zone::Hand,
            )
            .unwrap();

        assert!(!game.cast_spell(alice, bolt).unwrap());
        add_mana(&mut game, alice, Mana::of(Color::Red, 1));
        assert!(game.cast_spell(alice, bolt).unwrap());
        assert!(game.pending_selection(alice).is_some());

        let targets = [TargetRef::Player(bob)].into_iter().collect();
        assert!(game.answer_selection(alice, SelectionAnswer::Targets(targets)).unwrap());
        assert_eq!(game.stack.len(), 1);
        assert_eq!(game.zone_of(bolt), Some(Zone::Stack));
        assert!(game.get_player(alice).unwrap().mana_pool.is_empty());

        game.resolve_next().unwrap();
        assert_eq!(game.get_player(bob).unwrap().life, 17);
        assert_eq!(game.zone_of(bolt), Some(Zone::Graveyard));
    }

    #[test]
    fn test_hybrid_cost_asks_how_to_pay() {
        let (mut game, alice, _) = setup();
        game.turn.enter_step(Step::Main1);
        let recruit = game
            .create_card(
                CardBuilder::new("Boros Recruit")
                    .owner(alice)
                    .cost("{R/W}")
                    .types([CardType::Creature])
                    .power_toughness(1, 1),
                Zone::Hand,
            )
            .unwrap();
        add_mana(&mut game, alice, Mana::of(Color::Red, 1) + Mana::of(Color::White, 1));

        assert!(game.cast_spell(alice, recruit).unwrap());
        assert!(game.stack.is_empty());
        assert_eq!(game.get_player(alice).unwrap().mana_pool.total(), 2);

        let answer = SelectionAnswer::Mana(ManaAnswer::auto([1]));
        assert!(game.answer_selection(alice, answer).unwrap());
        assert_eq!(game.stack.len(), 1);
        assert_eq!(
            game.get_player(alice).unwrap().mana_pool.contents(),
            Mana::of(Color::Red, 1)
        );
    }

    #[test]
    fn test_sorcery_needs_empty_stack() {
        let (mut game, alice, _) = setup();
        game.turn.enter_step(Step::Main1);
        let sorcery = game
            .create_card(
                CardBuilder::new("Divination")
                    .owner(alice)
                    .types([CardType::Sorcery])
                    .spell(Effect::DrawCards {
                        player: Subject::Controller,
                        count: 2,
                    }),
                Zone::Hand,
            )
            .unwrap();
        let instant = game
            .create_card(
                CardBuilder::new("Opt")
                    .owner(alice)
                    .types([CardType::Instant])
                    .spell(Effect::DrawCards {
                        player: Subject::Controller,
                        count: 1,
                    }),
                Zone::Hand,
            )
            .unwrap();

        assert!(game.cast_spell(alice, instant).unwrap());
        assert!(!game.can_cast(alice, sorcery));
    }

    #[test]
    fn test_mana_ability_resolves_immediately() {
        let (mut game, alice, _) = setup();
        let land = game
            .create_card(
                CardBuilder::new("Mountain")
                    .owner(alice)
                    .types([CardType::Land])
                    .ability(
                        ActivatedAbility::new(
                            "Add {R}",
                            Cost::Tap,
                            Effect::AddMana {
                                mana: Mana::of(Color::Red, 1),
                                persistent: false,
                                restriction: None,
                            },
                        )
                        .mana(),
                    ),
                Zone::Battlefield,
            )
            .unwrap();

        assert!(game.activate_ability(alice, land, 0).unwrap());
        assert!(game.stack.is_empty());
        assert!(game.permanent(land).unwrap().tapped);
        assert_eq!(game.get_player(alice).unwrap().mana_pool.contents().red, 1);
        assert!(!game.activate_ability(alice, land, 0).unwrap());
    }

    #[test]
    fn test_summoning_sickness_and_haste() {
        let (mut game, alice, _) = setup();
        let bear = creature(&mut game, alice, 2, 2, &[]);
        let raider = creature(&mut game, alice, 2, 1, &[Keyword::Haste]);
        game.turn.enter_step(Step::DeclareAttackers);

        assert!(!game.declare_attacker(alice, bear).unwrap());
        assert!(game.declare_attacker(alice, raider).unwrap());
        assert!(game.combat.is_attacking(raider));
    }

    #[test]
    fn test_defender_cannot_attack() {
        let (mut game, alice, _) = setup();
        let wall = creature(&mut game, alice, 0, 4, &[Keyword::Defender]);
        game.permanent_mut(wall).unwrap().summoning_sick = false;
        game.turn.enter_step(Step::DeclareAttackers);
        assert!(!game.declare_attacker(alice, wall).unwrap());
    }

    #[test]
    fn test_vigilance_stays_untapped() {
        let (mut game, alice, _) = setup();
        let angel = creature(&mut game, alice, 4, 4, &[Keyword::Vigilance]);
        let bear = creature(&mut game, alice, 2, 2, &[]);
        for id in [angel, bear] {
            game.permanent_mut(id).unwrap().summoning_sick = false;
        }
        game.advance_to(Step::DeclareAttackers).unwrap();
        assert!(game.declare_attacker(alice, angel).unwrap());
        assert!(game.declare_attacker(alice, bear).unwrap());

        game.advance().unwrap();
        assert_eq!(game.turn.step, Step::DeclareBlockers);
        assert!(!game.permanent(angel).unwrap().tapped);
        assert!(game.permanent(bear).unwrap().tapped);
    }

    #[test]
    fn test_flying_needs_flying_or_reach() {
        let (mut game, alice, bob) = setup();
        let bird = creature(&mut game, alice, 1, 1, &[Keyword::Flying]);
        let bear = creature(&mut game, bob, 2, 2, &[]);
        let spider = creature(&mut game, bob, 1, 3, &[Keyword::Reach]);
        game.combat.declare_attacker(bird, bob);
        game.turn.enter_step(Step::DeclareBlockers);

        assert!(!game.declare_blocker(bob, bear, bird).unwrap());
        assert!(game.declare_blocker(bob, spider, bird).unwrap());
        assert!(!game.declare_blocker(bob, spider, bird).unwrap());
    }

    #[test]
    fn test_hexproof_leaves_no_targets_for_opponent() {
        let (mut game, alice, bob) = setup();
        game.turn.enter_step(Step::Main1);
        creature(&mut game, bob, 2, 2, &[Keyword::Hexproof]);
        let doom = game
            .create_card(
                CardBuilder::new("Murder")
                    .owner(alice)
                    .types([CardType::Instant])
                    .target(TargetSpec::creature())
                    .spell(Effect::Destroy {
                        target: Subject::Target(0),
                    }),
                Zone::Hand,
            )
            .unwrap();
        assert!(!game.cast_spell(alice, doom).unwrap());
    }

    #[test]
    fn test_spell_countered_when_target_leaves() {
        let (mut game, alice, bob) = setup();
        game.turn.enter_step(Step::Main1);
        let bear = creature(&mut game, bob, 2, 2, &[]);
        let pump = game
            .create_card(
                CardBuilder::new("Giant Growth")
                    .owner(alice)
                    .types([CardType::Instant])
                    .target(TargetSpec::creature())
                    .spell(Effect::Pump {
                        target: Subject::Target(0),
                        power: 3,
                        toughness: 3,
                    }),
                Zone::Hand,
            )
            .unwrap();
        game.cast_spell(alice, pump).unwrap();
        let targets = [TargetRef::Permanent(bear)].into_iter().collect();
        game.answer_selection(alice, SelectionAnswer::Targets(targets)).unwrap();

        game.move_card(bear, Zone::Graveyard).unwrap();
        game.resolve_next().unwrap();
        assert_eq!(game.zone_of(pump), Some(Zone::Graveyard));
    }

    #[test]
    fn test_gain_control_moves_permanent() {
        let (mut game, alice, bob) = setup();
        let bear = creature(&mut game, bob, 2, 2, &[]);
        game.permanent_mut(bear).unwrap().summoning_sick = false;

        assert!(game.gain_control(alice, bear).unwrap());
        assert_eq!(game.controller_of(bear), Some(alice));
        assert_eq!(game.battlefield(alice), &[bear]);
        assert!(game.battlefield(bob).is_empty());
        assert!(game.permanent(bear).unwrap().summoning_sick);
        assert!(!game.gain_control(alice, bear).unwrap());
    }

    #[test]
    fn test_cast_clears_passed_flags() {
        let (mut game, alice, bob) = setup();
        game.turn.enter_step(Step::Main1);
        let opt = game
            .create_card(
                CardBuilder::new("Opt")
                    .owner(alice)
                    .types([CardType::Instant])
                    .spell(Effect::GainLife {
                        player: Subject::Controller,
                        amount: 1,
                    }),
                Zone::Hand,
            )
            .unwrap();
        game.pass_priority(bob).unwrap();
        assert!(game.turn.flags(bob).passed_priority);

        game.cast_spell(alice, opt).unwrap();
        assert!(!game.turn.flags(bob).passed_priority);
        assert!(!game.stack_ready());

        game.pass_priority(alice).unwrap();
        game.pass_priority(bob).unwrap();
        assert_eq!(game.resolve_if_ready().unwrap(), 1);
        assert_eq!(game.get_player(alice).unwrap().life, 21);
    }

    #[test]
    fn test_legal_actions_in_main_phase() {
        let (mut game, alice, _) = setup();
        game.turn.enter_step(Step::Main1);
        let land = game
            .create_card(
                CardBuilder::new("Forest").owner(alice).types([CardType::Land]),
                Zone::Hand,
            )
            .unwrap();
        let expensive = game
            .create_card(
                CardBuilder::new("Dragon")
                    .owner(alice)
                    .cost("{5}{R}{R}")
                    .types([CardType::Creature])
                    .power_toughness(5, 5),
                Zone::Hand,
            )
            .unwrap();

        let actions = game.legal_actions(alice);
        assert!(actions.contains(&PlayerAction::PlayLand(land)));
        assert!(!actions.contains(&PlayerAction::CastSpell(expensive)));
        assert_eq!(actions.last(), Some(&PlayerAction::PassPriority));
    }
}
