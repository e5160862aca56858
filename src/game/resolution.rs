//! Resolving stack entries and executing effects

use crate::core::{
    Ability, CardId, CounterType, Duration, Effect, EffectContext, Keyword, ManaBatch, PlayerId,
    Scope, Subject, TargetRef, TargetSpec,
};
use crate::game::dispatch::{CanBeTargetedQuery, DestroyAction, ResolveCardAction, TargetCheck};
use crate::game::{DelayedTrigger, GameState, PendingCast, PendingEffect, StackEntry};
use crate::zones::Zone;
use crate::Result;

impl GameState {
    pub(crate) fn resolve_entry(&mut self, entry: StackEntry) -> Result<()> {
        match entry {
            StackEntry::Cast(cast) => self.dispatch_action::<ResolveCardAction>(&cast, |game, cast| {
                game.resolve_card_base(cast)
            }),
            StackEntry::Effect(pending) => self.resolve_effect(pending),
        }
    }

    /// Default resolution of a spell
    ///
    /// A targeted spell whose targets are all illegal is countered. Permanent
    /// spells enter the battlefield (auras attached to their target); other
    /// spells run their effect and go to their post-resolution zone.
    pub fn resolve_card_base(&mut self, cast: &PendingCast) -> Result<()> {
        let card = self.cards.get(cast.card)?.clone();

        if let Some(spec) = card.cast_targets() {
            let any_legal = cast
                .targets
                .iter()
                .any(|&t| self.is_legal_target(spec, cast.controller, Some(cast.card), t));
            if !cast.targets.is_empty() && !any_legal {
                self.logger.normal(&format!(
                    "{} is countered: no legal targets",
                    card.name
                ));
                return self.move_card(cast.card, Zone::Graveyard);
            }
        }

        if card.is_permanent_card() {
            self.put_onto_battlefield(cast.card, cast.controller)?;
            if card.is_aura() {
                let host = cast.targets.iter().find_map(|t| match t {
                    TargetRef::Permanent(id) => Some(*id),
                    TargetRef::Player(_) => None,
                });
                if let Some(permanent) = self.permanent_mut(cast.card) {
                    permanent.attached_to = host;
                }
            }
            return Ok(());
        }

        if let Some(effect) = &card.spell_effect {
            let spec = card.cast_targets();
            let ctx = EffectContext::new(cast.card, cast.controller)
                .with_targets(cast.targets.iter().copied())
                .with_legality(|t| {
                    spec.map_or(true, |spec| {
                        self.is_legal_target(spec, cast.controller, Some(cast.card), t)
                    })
                });
            self.execute_effect(effect, &ctx)?;
        }
        self.move_card(cast.card, card.resolves_to)
    }

    fn resolve_effect(&mut self, pending: PendingEffect) -> Result<()> {
        if !pending.targets.is_empty() && !pending.targets.iter().any(|&t| self.target_exists(t)) {
            self.logger.normal(&format!(
                "{} fizzles: its targets are gone",
                pending.description
            ));
            return Ok(());
        }
        let ctx = EffectContext::new(pending.source, pending.controller)
            .with_targets(pending.targets.iter().copied())
            .with_legality(|t| self.target_exists(t));
        self.execute_effect(&pending.effect, &ctx)
    }

    fn target_exists(&self, target: TargetRef) -> bool {
        match target {
            TargetRef::Player(p) => self.get_player(p).is_ok_and(|p| p.is_alive()),
            TargetRef::Permanent(id) => self.is_on_battlefield(id),
        }
    }

    /// Can `target` be targeted by a spell or ability `controller` controls?
    pub fn can_be_targeted(&self, target: CardId, source: Option<CardId>, controller: PlayerId) -> bool {
        let check = TargetCheck {
            target,
            source,
            controller,
        };
        self.dispatch_query::<CanBeTargetedQuery>(&check, |game, check| {
            if !game.is_on_battlefield(check.target) || game.has_keyword(check.target, &Keyword::Shroud) {
                return false;
            }
            !game.has_keyword(check.target, &Keyword::Hexproof)
                || game.controller_of(check.target) == Some(check.controller)
        })
    }

    /// Full legality of one candidate for a target requirement
    pub fn is_legal_target(
        &self,
        spec: &TargetSpec,
        controller: PlayerId,
        source: Option<CardId>,
        candidate: TargetRef,
    ) -> bool {
        match candidate {
            TargetRef::Player(p) => {
                self.get_player(p).is_ok_and(|p| p.is_alive()) && spec.matches(self, controller, candidate)
            }
            TargetRef::Permanent(id) => {
                self.is_on_battlefield(id)
                    && spec.matches(self, controller, candidate)
                    && self.can_be_targeted(id, source, controller)
            }
        }
    }

    /// Legal candidates for `spec`, players first
    pub fn legal_targets(
        &self,
        spec: &TargetSpec,
        controller: PlayerId,
        source: Option<CardId>,
    ) -> Vec<TargetRef> {
        self.all_target_refs()
            .into_iter()
            .filter(|&t| self.is_legal_target(spec, controller, source, t))
            .collect()
    }

    /// Destroy a permanent through the `Destroy` operation
    ///
    /// Returns whether it actually left the battlefield.
    pub fn destroy(&mut self, id: CardId) -> Result<bool> {
        self.dispatch_action::<DestroyAction>(&id, |game, &id| game.destroy_base(id))
    }

    fn destroy_base(&mut self, id: CardId) -> Result<bool> {
        if !self.is_on_battlefield(id) || self.has_keyword(id, &Keyword::Indestructible) {
            return Ok(false);
        }
        self.logger.event(
            crate::game::VerbosityLevel::Normal,
            "destroy",
            &format!("{} is destroyed", self.card_name(id)),
        );
        self.move_card(id, Zone::Graveyard)?;
        Ok(true)
    }

    /// Deal damage from `source` to a player or permanent
    ///
    /// Damage to a planeswalker removes loyalty; damage to a creature is
    /// marked on it. Lifelink and deathtouch are read from `source` if it is
    /// on the battlefield.
    pub fn deal_damage(&mut self, source: CardId, target: TargetRef, amount: i32) -> Result<()> {
        if amount <= 0 {
            return Ok(());
        }
        let source_in_play = self.is_on_battlefield(source);
        let deathtouch = source_in_play && self.has_keyword(source, &Keyword::Deathtouch);
        let lifelink = source_in_play && self.has_keyword(source, &Keyword::Lifelink);

        match target {
            TargetRef::Player(p) => self.get_player_mut(p)?.lose_life(amount),
            TargetRef::Permanent(id) => {
                let planeswalker = self.is_planeswalker(id);
                let creature = self.is_creature(id);
                if let Some(permanent) = self.permanents.get_mut(&id) {
                    if planeswalker {
                        permanent.remove_counters(&CounterType::loyalty(), amount as u32);
                    }
                    if creature {
                        permanent.damage += amount;
                        permanent.deathtouch_damage |= deathtouch;
                    }
                }
            }
        }
        self.logger.event(
            crate::game::VerbosityLevel::Normal,
            "damage",
            &format!("{} deals {amount} damage to {target}", self.card_name(source)),
        );

        if lifelink {
            if let Some(controller) = self.controller_of(source) {
                self.get_player_mut(controller)?.gain_life(amount);
            }
        }
        Ok(())
    }

    /// What a subject refers to in this context
    pub fn resolve_subject(&self, subject: Subject, ctx: &EffectContext) -> Vec<TargetRef> {
        match subject {
            Subject::This => vec![TargetRef::Permanent(ctx.source)],
            Subject::Target(i) => ctx.target(i).into_iter().collect(),
            Subject::AllTargets => ctx.legal_targets().collect(),
            Subject::Controller => vec![TargetRef::Player(ctx.controller)],
            Subject::Opponents => self
                .opponents_of(ctx.controller)
                .into_iter()
                .map(TargetRef::Player)
                .collect(),
            Subject::Attached => self
                .permanent(ctx.source)
                .and_then(|p| p.attached_to)
                .map(TargetRef::Permanent)
                .into_iter()
                .collect(),
            Subject::AllCreatures => self
                .battlefield_order()
                .into_iter()
                .filter(|&id| self.is_creature(id))
                .map(TargetRef::Permanent)
                .collect(),
        }
    }

    fn subject_permanents(&self, subject: Subject, ctx: &EffectContext) -> Vec<CardId> {
        self.resolve_subject(subject, ctx)
            .into_iter()
            .filter_map(|t| match t {
                TargetRef::Permanent(id) if self.is_on_battlefield(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    fn subject_players(&self, subject: Subject, ctx: &EffectContext) -> Vec<PlayerId> {
        self.resolve_subject(subject, ctx)
            .into_iter()
            .filter_map(|t| match t {
                TargetRef::Player(p) => Some(p),
                TargetRef::Permanent(_) => None,
            })
            .collect()
    }

    /// Carry out an effect
    pub fn execute_effect(&mut self, effect: &Effect, ctx: &EffectContext) -> Result<()> {
        match effect {
            Effect::DealDamage { to, amount } => {
                for target in self.resolve_subject(*to, ctx) {
                    self.deal_damage(ctx.source, target, *amount)?;
                }
            }
            Effect::DrawCards { player, count } => {
                for p in self.subject_players(*player, ctx) {
                    for _ in 0..*count {
                        self.draw_card(p)?;
                    }
                }
            }
            Effect::GainLife { player, amount } => {
                for p in self.subject_players(*player, ctx) {
                    self.get_player_mut(p)?.gain_life(*amount);
                }
            }
            Effect::LoseLife { player, amount } => {
                for p in self.subject_players(*player, ctx) {
                    self.get_player_mut(p)?.lose_life(*amount);
                }
            }
            Effect::Destroy { target } => {
                for id in self.subject_permanents(*target, ctx) {
                    self.destroy(id)?;
                }
            }
            Effect::Tap { target } | Effect::Untap { target } => {
                let tapped = matches!(effect, Effect::Tap { .. });
                for id in self.subject_permanents(*target, ctx) {
                    if let Some(p) = self.permanent_mut(id) {
                        p.tapped = tapped;
                    }
                }
            }
            Effect::Pump {
                target,
                power,
                toughness,
            } => {
                for id in self.subject_permanents(*target, ctx) {
                    for ability in Ability::stat_bonus(Scope::Own, *power, *toughness) {
                        self.grant_temporary(id, ability);
                    }
                }
            }
            Effect::GrantAbility {
                target,
                ability,
                duration,
            } => {
                for id in self.subject_permanents(*target, ctx) {
                    match duration {
                        Duration::EndOfTurn => self.grant_temporary(id, (**ability).clone()),
                        Duration::Permanent => self.grant_eternal(id, (**ability).clone()),
                    }
                }
            }
            Effect::PutCounters {
                target,
                counter,
                amount,
            } => {
                for id in self.subject_permanents(*target, ctx) {
                    if let Some(p) = self.permanent_mut(id) {
                        p.add_counters(counter.clone(), *amount);
                    }
                }
            }
            Effect::RemoveCounters {
                target,
                counter,
                amount,
            } => {
                for id in self.subject_permanents(*target, ctx) {
                    if let Some(p) = self.permanent_mut(id) {
                        p.remove_counters(counter, *amount);
                    }
                }
            }
            Effect::GainControl { target } => {
                for id in self.subject_permanents(*target, ctx) {
                    self.gain_control(ctx.controller, id)?;
                }
            }
            Effect::AddMana {
                mana,
                persistent,
                restriction,
            } => {
                let mut batch = match restriction {
                    Some(r) => ManaBatch::restricted(*mana, r.clone()),
                    None => ManaBatch::new(*mana),
                };
                batch.persistent = *persistent;
                let pool = &mut self.get_player_mut(ctx.controller)?.mana_pool;
                if batch.restriction.is_none() && !batch.persistent {
                    pool.add(batch.mana);
                } else {
                    pool.add_batch(batch);
                }
                self.logger.verbose(&format!("{} adds {mana}", ctx.controller));
            }
            Effect::Delayed { step, effect } => {
                self.turn.delayed_triggers.push(DelayedTrigger {
                    step: *step,
                    effect: (**effect).clone(),
                    source: ctx.source,
                    controller: ctx.controller,
                });
            }
            Effect::Sequence(effects) => {
                for e in effects {
                    self.execute_effect(e, ctx)?;
                }
            }
            Effect::Custom(f) => f(self, ctx)?,
        }
        Ok(())
    }
}
