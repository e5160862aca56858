//! Turn and step progression
//!
//! The turn walks a fixed sequence of steps. Entering a step runs the
//! `StepEntry` operation (so abilities can add to or replace what a step
//! does) and then puts any delayed triggers waiting for that step on the
//! stack. Past cleanup the turn ends and the next living player starts at
//! untap.

use crate::core::{CardId, Keyword, PlayerId};
use crate::game::dispatch::StepEntryAction;
use crate::game::{GameState, PendingEffect, StackEntry, Step, VerbosityLevel};
use crate::zones::Zone;
use crate::Result;

impl GameState {
    pub fn current_step(&self) -> Step {
        self.turn.step
    }

    /// Run the entry of the very first step
    ///
    /// A new game sits at turn 1 untap without having entered it.
    pub fn start_game(&mut self) -> Result<()> {
        self.logger.set_turn(self.turn.turn_number);
        self.logger.minimal(&format!(
            "Turn 1: {} goes first",
            self.player_name(self.turn.active_player)
        ));
        self.begin_step(self.turn.step)
    }

    /// Move to the next step
    ///
    /// Refused (`Ok(false)`) while a selection is outstanding or once the
    /// game is over.
    pub fn advance(&mut self) -> Result<bool> {
        if self.has_pending_selection() || self.is_game_over() {
            return Ok(false);
        }
        match self.turn.step.next() {
            Some(next) => {
                if next.phase() != self.turn.step.phase() {
                    self.drain_mana_pools();
                }
                self.turn.enter_step(next);
                self.begin_step(next)?;
            }
            None => {
                self.finish_turn();
                self.begin_step(Step::Untap)?;
            }
        }
        Ok(true)
    }

    /// Advance until `step` is reached
    ///
    /// Stops early (returning `Ok(false)`) if an advance is refused. Asking
    /// for the current step advances a whole turn.
    pub fn advance_to(&mut self, step: Step) -> Result<bool> {
        loop {
            if !self.advance()? {
                return Ok(false);
            }
            if self.turn.step == step {
                return Ok(true);
            }
        }
    }

    /// Nothing stands in the way of moving on
    pub fn ready_to_advance(&self) -> bool {
        !self.is_game_over()
            && self.stack.is_empty()
            && !self.has_pending_selection()
            && (self.turn.step.advances_automatically() || self.all_players_done())
    }

    /// Advance while the current step needs no input
    ///
    /// Returns how many steps were taken.
    pub fn advance_if_ready(&mut self) -> Result<usize> {
        let mut steps = 0;
        while self.ready_to_advance() {
            if !self.advance()? {
                break;
            }
            steps += 1;
        }
        Ok(steps)
    }

    fn begin_step(&mut self, step: Step) -> Result<()> {
        self.logger.event(
            VerbosityLevel::Verbose,
            "step",
            &format!("{step:?} ({})", self.player_name(self.turn.active_player)),
        );
        self.dispatch_action::<StepEntryAction>(&step, |game, &step| game.step_entry_base(step))?;

        for trigger in self.turn.take_delayed(step) {
            let description = trigger.effect.describe();
            self.push_stack(StackEntry::Effect(PendingEffect {
                effect: trigger.effect,
                source: trigger.source,
                controller: trigger.controller,
                targets: Default::default(),
                description,
            }));
        }
        Ok(())
    }

    /// What entering a step does when no ability intervenes
    pub fn step_entry_base(&mut self, step: Step) -> Result<()> {
        let active = self.turn.active_player;
        match step {
            Step::Untap => {
                let ids: Vec<CardId> = self.battlefield(active).to_vec();
                for id in ids {
                    if let Some(p) = self.permanent_mut(id) {
                        p.tapped = false;
                        p.summoning_sick = false;
                    }
                }
                self.get_player_mut(active)?.reset_lands_played();
            }
            Step::Draw => {
                if self.config.skip_first_draw && self.turn.turn_number == 1 {
                    self.logger.normal("(First turn - no draw)");
                } else {
                    self.draw_card(active)?;
                }
            }
            Step::DeclareAttackers => {
                let opponents = self.opponents_of(active);
                if let [only] = opponents.as_slice() {
                    self.turn.defending_player = Some(*only);
                }
            }
            Step::DeclareBlockers => self.enter_declare_blockers()?,
            Step::CombatDamage => self.enter_combat_damage()?,
            Step::Cleanup => self.enter_cleanup()?,
            Step::Upkeep | Step::Main1 | Step::Main2 | Step::End => {}
        }
        Ok(())
    }

    fn enter_declare_blockers(&mut self) -> Result<()> {
        if self.combat.attackers().is_empty() {
            return Ok(());
        }
        let opponents = self.opponents_of(self.turn.active_player);
        if opponents.len() < 2 {
            self.turn.defending_player = opponents.first().copied();
            self.tap_attackers();
            return Ok(());
        }

        let descriptions = opponents.iter().map(|&p| self.player_name(p)).collect();
        self.request_options(
            self.turn.active_player,
            "Choose the defending player",
            descriptions,
            1,
            move |game, chosen| {
                let defender = opponents[chosen[0]];
                game.turn.defending_player = Some(defender);
                game.combat.redirect_attacks(defender);
                game.tap_attackers();
                Ok(())
            },
        )?;
        Ok(())
    }

    fn tap_attackers(&mut self) {
        for attacker in self.combat.attackers() {
            if !self.has_keyword(attacker, &Keyword::Vigilance) {
                if let Some(p) = self.permanent_mut(attacker) {
                    p.tapped = true;
                }
            }
        }
    }

    fn enter_combat_damage(&mut self) -> Result<()> {
        if self.combat.attackers().is_empty() {
            return Ok(());
        }
        let multi_blocked: Vec<CardId> = self
            .combat
            .attackers()
            .into_iter()
            .filter(|&a| self.combat.blockers_of(a).len() > 1)
            .collect();
        self.order_blockers(multi_blocked)
    }

    /// Ask the defending player to order each multi-blocked attacker's
    /// blockers, one attacker at a time, then deal damage
    fn order_blockers(&mut self, mut remaining: Vec<CardId>) -> Result<()> {
        if remaining.is_empty() {
            return self.resolve_combat_damage();
        }
        let attacker = remaining.remove(0);
        let blockers = self.combat.blockers_of(attacker);
        let defender = self
            .combat
            .defending_player_of(attacker)
            .or(self.turn.defending_player)
            .unwrap_or(self.turn.active_player);

        let descriptions = blockers.iter().map(|&b| self.card_name(b)).collect();
        let prompt = format!(
            "Order blockers for damage from {}",
            self.card_name(attacker)
        );
        self.request_options(
            defender,
            prompt,
            descriptions,
            blockers.len(),
            move |game, chosen| {
                let order = chosen.iter().map(|&i| blockers[i]).collect();
                game.combat.set_blocker_order(attacker, order);
                game.order_blockers(remaining)
            },
        )?;
        Ok(())
    }

    fn enter_cleanup(&mut self) -> Result<()> {
        let active = self.turn.active_player;
        let hand: Vec<CardId> = self.hand(active).to_vec();
        let max = self.config.max_hand_size;
        if hand.len() <= max {
            return Ok(());
        }
        let excess = hand.len() - max;
        let descriptions = hand.iter().map(|&c| self.card_name(c)).collect();
        self.request_options(
            active,
            format!("Discard {excess} card(s)"),
            descriptions,
            excess,
            move |game, chosen| {
                for i in chosen {
                    let card = hand[i];
                    game.logger.normal(&format!(
                        "{} discards {}",
                        game.player_name(active),
                        game.card_name(card)
                    ));
                    game.move_card(card, Zone::Graveyard)?;
                }
                Ok(())
            },
        )?;
        Ok(())
    }

    fn drain_mana_pools(&mut self) {
        for player in &mut self.players {
            player.mana_pool.drain();
        }
    }

    /// Turn-end bookkeeping, then hand the turn to the next player
    fn finish_turn(&mut self) {
        self.drain_mana_pools();
        for permanent in self.permanents.values_mut() {
            permanent.temporary_abilities.clear();
            permanent.clear_damage();
        }
        self.combat.clear();

        let next = self.next_player_after(self.turn.active_player);
        self.turn.next_turn(next);
        self.logger.set_turn(self.turn.turn_number);
        self.logger.minimal(&format!(
            "Turn {}: {}",
            self.turn.turn_number,
            self.player_name(next)
        ));
    }

    pub fn player_name(&self, id: PlayerId) -> String {
        self.get_player(id)
            .map_or_else(|_| id.to_string(), |p| p.name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use crate::core::{Ability, CardBuilder, CardType, Effect, Subject};
    use crate::game::{DelayedTrigger, GameConfig, GameState, Step};
    use crate::zones::Zone;

    fn setup() -> GameState {
        GameState::new_two_player("Alice", "Bob", GameConfig::default())
    }

    #[test]
    fn test_full_turn_cycle() {
        let mut game = setup();
        let (alice, bob) = (game.players[0].id, game.players[1].id);
        let bear = game
            .create_card(
                CardBuilder::new("Bear")
                    .owner(alice)
                    .types([CardType::Creature])
                    .power_toughness(2, 2),
                Zone::Battlefield,
            )
            .unwrap();
        game.grant_temporary(bear, Ability::stat_bonus(crate::core::Scope::Own, 1, 1).remove(0));
        game.permanent_mut(bear).unwrap().damage = 1;

        assert!(game.advance_to(Step::Cleanup).unwrap());
        assert_eq!(game.power(bear), 3);

        assert!(game.advance().unwrap());
        assert_eq!(game.turn.step, Step::Untap);
        assert_eq!(game.turn.turn_number, 2);
        assert_eq!(game.turn.active_player, bob);
        assert_eq!(game.power(bear), 2);
        assert_eq!(game.permanent(bear).unwrap().damage, 0);
    }

    #[test]
    fn test_advance_if_ready_stops_at_upkeep() {
        let mut game = setup();
        game.start_game().unwrap();
        assert_eq!(game.advance_if_ready().unwrap(), 1);
        assert_eq!(game.turn.step, Step::Upkeep);

        // Everyone passes: through draw (automatic) into the first main
        for p in game.alive_players() {
            game.turn.flags_mut(p).passed_priority = true;
        }
        assert_eq!(game.advance_if_ready().unwrap(), 2);
        assert_eq!(game.turn.step, Step::Main1);
    }

    #[test]
    fn test_untap_resets_sickness_and_lands() {
        let mut game = setup();
        let alice = game.players[0].id;
        let bear = game
            .create_card(
                CardBuilder::new("Bear")
                    .owner(alice)
                    .types([CardType::Creature])
                    .power_toughness(2, 2),
                Zone::Battlefield,
            )
            .unwrap();
        game.permanent_mut(bear).unwrap().tapped = true;
        game.get_player_mut(alice).unwrap().play_land();

        game.start_game().unwrap();
        let p = game.permanent(bear).unwrap();
        assert!(!p.tapped);
        assert!(!p.summoning_sick);
        assert!(game.get_player(alice).unwrap().can_play_land());
    }

    #[test]
    fn test_draw_step_draws() {
        let mut game = setup();
        let alice = game.players[0].id;
        for name in ["Forest", "Island"] {
            game.create_card(
                CardBuilder::new(name).owner(alice).types([CardType::Land]),
                Zone::Library,
            )
            .unwrap();
        }
        assert!(game.advance_to(Step::Draw).unwrap());
        assert_eq!(game.hand(alice).len(), 1);
    }

    #[test]
    fn test_skip_first_draw() {
        let mut game = GameState::new_two_player(
            "Alice",
            "Bob",
            GameConfig::default().with_skip_first_draw(true),
        );
        let alice = game.players[0].id;
        game.create_card(
            CardBuilder::new("Forest").owner(alice).types([CardType::Land]),
            Zone::Library,
        )
        .unwrap();
        game.advance_to(Step::Main1).unwrap();
        assert!(game.hand(alice).is_empty());
    }

    #[test]
    fn test_delayed_trigger_goes_on_stack() {
        let mut game = setup();
        let alice = game.players[0].id;
        let source = game
            .create_card(
                CardBuilder::new("Clock").owner(alice).types([CardType::Artifact]),
                Zone::Battlefield,
            )
            .unwrap();
        game.turn.delayed_triggers.push(DelayedTrigger {
            step: Step::End,
            effect: Effect::GainLife {
                player: Subject::Controller,
                amount: 3,
            },
            source,
            controller: alice,
        });

        game.advance_to(Step::End).unwrap();
        assert_eq!(game.stack.len(), 1);
        assert!(game.turn.delayed_triggers.is_empty());

        game.resolve_next().unwrap();
        assert_eq!(game.get_player(alice).unwrap().life, 23);
    }

    #[test]
    fn test_cleanup_discard_prompt_blocks_advance() {
        let mut game = setup();
        let alice = game.players[0].id;
        for i in 0..9 {
            game.create_card(
                CardBuilder::new(format!("Card {i}").as_str())
                    .owner(alice)
                    .types([CardType::Sorcery]),
                Zone::Hand,
            )
            .unwrap();
        }
        game.advance_to(Step::Cleanup).unwrap();
        assert!(game.pending_selection(alice).is_some());
        assert!(!game.advance().unwrap());

        game.answer_selection(alice, crate::game::SelectionAnswer::Options(vec![0, 1]))
            .unwrap();
        assert_eq!(game.hand(alice).len(), 7);
        assert!(game.advance().unwrap());
    }
}
