//! Combat state: who attacks, who blocks, and in what damage order
//!
//! Attackers are kept in declaration order, which is also the order combat
//! damage is assigned in.

use crate::core::{CardId, Keyword, PlayerId, TargetRef};
use crate::game::dispatch::{CombatDamageAction, DamageEvent};
use crate::game::GameState;
use crate::Result;
use smallvec::SmallVec;
use std::collections::{BTreeMap, BTreeSet};

pub type Blockers = SmallVec<[CardId; 4]>;

/// Combat state for the current combat phase
#[derive(Debug, Clone, Default)]
pub struct CombatState {
    /// Attacker and the player it attacks, in declaration order
    attackers: Vec<(CardId, PlayerId)>,

    /// Blocker -> the attacker it blocks
    blockers: BTreeMap<CardId, CardId>,

    /// Attacker -> its blockers, in damage assignment order
    attacker_blockers: BTreeMap<CardId, Blockers>,

    /// Attackers that were blocked; they stay blocked if their blockers leave
    blocked: BTreeSet<CardId>,
}

impl CombatState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare_attacker(&mut self, attacker: CardId, defending_player: PlayerId) {
        if !self.is_attacking(attacker) {
            self.attackers.push((attacker, defending_player));
        }
    }

    pub fn declare_blocker(&mut self, blocker: CardId, attacker: CardId) {
        self.blockers.insert(blocker, attacker);
        self.attacker_blockers.entry(attacker).or_default().push(blocker);
        self.blocked.insert(attacker);
    }

    pub fn is_attacking(&self, card_id: CardId) -> bool {
        self.attackers.iter().any(|(a, _)| *a == card_id)
    }

    pub fn is_blocking(&self, card_id: CardId) -> bool {
        self.blockers.contains_key(&card_id)
    }

    pub fn is_blocked(&self, attacker: CardId) -> bool {
        self.blocked.contains(&attacker)
    }

    pub fn blockers_of(&self, attacker: CardId) -> Blockers {
        self.attacker_blockers
            .get(&attacker)
            .cloned()
            .unwrap_or_default()
    }

    /// Replace the damage assignment order of `attacker`'s blockers
    ///
    /// `order` must be a permutation of the current blockers.
    pub fn set_blocker_order(&mut self, attacker: CardId, order: Blockers) -> bool {
        let current = self.blockers_of(attacker);
        let same_set = order.len() == current.len() && order.iter().all(|b| current.contains(b));
        if same_set {
            self.attacker_blockers.insert(attacker, order);
        }
        same_set
    }

    pub fn blocked_attacker(&self, blocker: CardId) -> Option<CardId> {
        self.blockers.get(&blocker).copied()
    }

    pub fn defending_player_of(&self, attacker: CardId) -> Option<PlayerId> {
        self.attackers
            .iter()
            .find(|(a, _)| *a == attacker)
            .map(|(_, p)| *p)
    }

    /// Attacking creatures in declaration order
    pub fn attackers(&self) -> Vec<CardId> {
        self.attackers.iter().map(|(a, _)| *a).collect()
    }

    pub fn blockers(&self) -> Vec<CardId> {
        self.blockers.keys().copied().collect()
    }

    /// Point every attacker at `player` (the defending player was chosen)
    pub fn redirect_attacks(&mut self, player: PlayerId) {
        for (_, defender) in &mut self.attackers {
            *defender = player;
        }
    }

    /// Forget a creature that left the battlefield
    pub fn remove(&mut self, card_id: CardId) {
        self.attackers.retain(|(a, _)| *a != card_id);
        self.attacker_blockers.remove(&card_id);
        self.blocked.remove(&card_id);
        if let Some(attacker) = self.blockers.remove(&card_id) {
            if let Some(list) = self.attacker_blockers.get_mut(&attacker) {
                list.retain(|b| *b != card_id);
            }
        }
        self.blockers.retain(|_, attacker| *attacker != card_id);
    }

    pub fn is_empty(&self) -> bool {
        self.attackers.is_empty() && self.blockers.is_empty()
    }

    /// Clear all combat state (end of combat damage, end of turn)
    pub fn clear(&mut self) {
        self.attackers.clear();
        self.blockers.clear();
        self.attacker_blockers.clear();
        self.blocked.clear();
    }
}

/// Which creatures deal damage in a damage pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DamagePass {
    /// No first strikers in this combat: everyone at once
    Single,
    FirstStrike,
    Regular,
}

impl GameState {
    fn strikes_in(&self, creature: CardId, pass: DamagePass) -> bool {
        let first = self.has_keyword(creature, &Keyword::FirstStrike);
        let double = self.has_keyword(creature, &Keyword::DoubleStrike);
        match pass {
            DamagePass::Single => true,
            DamagePass::FirstStrike => first || double,
            DamagePass::Regular => !first || double,
        }
    }

    /// Deal combat damage, then end combat
    ///
    /// With a first or double striker among the combatants damage is dealt
    /// in two passes with a state-based check in between.
    pub(crate) fn resolve_combat_damage(&mut self) -> Result<()> {
        let combatants: Vec<CardId> = self
            .combat
            .attackers()
            .into_iter()
            .chain(self.combat.blockers())
            .collect();
        let split = combatants.iter().any(|&c| {
            self.has_keyword(c, &Keyword::FirstStrike) || self.has_keyword(c, &Keyword::DoubleStrike)
        });

        if split {
            self.deal_damage_pass(DamagePass::FirstStrike)?;
            self.check_state_based_actions()?;
            self.deal_damage_pass(DamagePass::Regular)?;
        } else {
            self.deal_damage_pass(DamagePass::Single)?;
        }

        self.combat.clear();
        self.check_state_based_actions()?;
        Ok(())
    }

    /// Work out every assignment for one pass before any is dealt, so that
    /// damage within a pass is simultaneous
    fn plan_damage(&self, pass: DamagePass) -> Vec<DamageEvent> {
        let mut events = Vec::new();
        for attacker in self.combat.attackers() {
            if !self.is_on_battlefield(attacker) {
                continue;
            }
            let defender = self
                .combat
                .defending_player_of(attacker)
                .map(TargetRef::Player);
            let blockers: Blockers = self
                .combat
                .blockers_of(attacker)
                .into_iter()
                .filter(|&b| self.is_on_battlefield(b))
                .collect();

            if self.strikes_in(attacker, pass) {
                let power = self.power(attacker);
                if power > 0 {
                    self.assign_attacker_damage(attacker, power, &blockers, defender, &mut events);
                }
            }

            for &blocker in &blockers {
                if self.strikes_in(blocker, pass) {
                    events.push(DamageEvent {
                        source: blocker,
                        target: TargetRef::Permanent(attacker),
                        amount: self.power(blocker),
                    });
                }
            }
        }
        events.retain(|e| e.amount > 0);
        events
    }

    /// Split an attacker's damage over its blockers in their order
    ///
    /// Every blocker but the last takes lethal damage (1 from a deathtouch
    /// source). The last takes the rest, unless the attacker tramples, in
    /// which case it takes lethal and the excess goes to the defender.
    fn assign_attacker_damage(
        &self,
        attacker: CardId,
        power: i32,
        blockers: &[CardId],
        defender: Option<TargetRef>,
        events: &mut Vec<DamageEvent>,
    ) {
        let trample = self.has_keyword(attacker, &Keyword::Trample);
        let deathtouch = self.has_keyword(attacker, &Keyword::Deathtouch);
        let mut push = |target: TargetRef, amount: i32| {
            events.push(DamageEvent {
                source: attacker,
                target,
                amount,
            })
        };

        if !self.combat.is_blocked(attacker) {
            if let Some(defender) = defender {
                push(defender, power);
            }
            return;
        }

        let mut remaining = power;
        for (i, &blocker) in blockers.iter().enumerate() {
            let lethal = if deathtouch {
                self.lethal_damage(blocker).min(1)
            } else {
                self.lethal_damage(blocker)
            };
            let is_last = i + 1 == blockers.len();
            let amount = if is_last && !trample {
                remaining
            } else {
                remaining.min(lethal)
            };
            push(TargetRef::Permanent(blocker), amount);
            remaining -= amount;
        }

        // Blocked with no blockers left: only trample gets through
        if trample && remaining > 0 {
            if let Some(defender) = defender {
                push(defender, remaining);
            }
        }
    }

    fn deal_damage_pass(&mut self, pass: DamagePass) -> Result<()> {
        for event in self.plan_damage(pass) {
            self.logger.event(
                crate::game::VerbosityLevel::Verbose,
                "combat",
                &format!(
                    "{} assigns {} to {}",
                    self.card_name(event.source),
                    event.amount,
                    event.target
                ),
            );
            self.dispatch_action::<CombatDamageAction>(&event, |game, e| {
                game.deal_damage(e.source, e.target, e.amount)
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Ability, CardBuilder, CardType, Keyword};
    use crate::game::GameConfig;
    use crate::zones::Zone;

    fn fighter(game: &mut GameState, owner: PlayerId, p: i32, t: i32, keywords: &[Keyword]) -> CardId {
        let mut builder = CardBuilder::new("Fighter")
            .owner(owner)
            .types([CardType::Creature])
            .power_toughness(p, t);
        for k in keywords {
            builder = builder.ability(Ability::Keyword(k.clone()));
        }
        game.create_card(builder, Zone::Battlefield).unwrap()
    }

    fn setup() -> (GameState, PlayerId, PlayerId) {
        let game = GameState::new_two_player("Alice", "Bob", GameConfig::default());
        let (a, b) = (game.players[0].id, game.players[1].id);
        (game, a, b)
    }

    #[test]
    fn test_unblocked_attacker_hits_player() {
        let (mut game, alice, bob) = setup();
        let giant = fighter(&mut game, alice, 3, 3, &[]);
        game.combat.declare_attacker(giant, bob);
        game.resolve_combat_damage().unwrap();
        assert_eq!(game.get_player(bob).unwrap().life, 17);
        assert!(game.combat.is_empty());
    }

    #[test]
    fn test_first_strike_kills_before_damage_back() {
        let (mut game, alice, bob) = setup();
        let knight = fighter(&mut game, alice, 2, 2, &[Keyword::FirstStrike]);
        let bear = fighter(&mut game, bob, 2, 2, &[]);
        game.combat.declare_attacker(knight, bob);
        game.combat.declare_blocker(bear, knight);

        game.resolve_combat_damage().unwrap();
        assert!(game.is_on_battlefield(knight));
        assert_eq!(game.permanent(knight).unwrap().damage, 0);
        assert!(!game.is_on_battlefield(bear));
    }

    #[test]
    fn test_double_strike_hits_twice() {
        let (mut game, alice, bob) = setup();
        let duelist = fighter(&mut game, alice, 2, 2, &[Keyword::DoubleStrike]);
        game.combat.declare_attacker(duelist, bob);
        game.resolve_combat_damage().unwrap();
        assert_eq!(game.get_player(bob).unwrap().life, 16);
    }

    #[test]
    fn test_trample_over_two_blockers() {
        let (mut game, alice, bob) = setup();
        let beast = fighter(&mut game, alice, 6, 6, &[Keyword::Trample]);
        let b1 = fighter(&mut game, bob, 1, 2, &[]);
        let b2 = fighter(&mut game, bob, 1, 1, &[]);
        game.combat.declare_attacker(beast, bob);
        game.combat.declare_blocker(b1, beast);
        game.combat.declare_blocker(b2, beast);

        game.resolve_combat_damage().unwrap();
        assert_eq!(game.get_player(bob).unwrap().life, 17);
        assert!(!game.is_on_battlefield(b1));
        assert!(!game.is_on_battlefield(b2));
        assert_eq!(game.permanent(beast).unwrap().damage, 2);
    }

    #[test]
    fn test_last_blocker_absorbs_without_trample() {
        let (mut game, alice, bob) = setup();
        let ogre = fighter(&mut game, alice, 5, 5, &[]);
        let wall = fighter(&mut game, bob, 0, 2, &[]);
        game.combat.declare_attacker(ogre, bob);
        game.combat.declare_blocker(wall, ogre);

        game.resolve_combat_damage().unwrap();
        assert_eq!(game.get_player(bob).unwrap().life, 20);
        assert!(!game.is_on_battlefield(wall));
    }

    #[test]
    fn test_deathtouch_trample_assigns_one() {
        let (mut game, alice, bob) = setup();
        let wurm = fighter(&mut game, alice, 5, 5, &[Keyword::Trample, Keyword::Deathtouch]);
        let giant = fighter(&mut game, bob, 1, 8, &[]);
        game.combat.declare_attacker(wurm, bob);
        game.combat.declare_blocker(giant, wurm);

        game.resolve_combat_damage().unwrap();
        assert_eq!(game.get_player(bob).unwrap().life, 16);
        assert!(!game.is_on_battlefield(giant));
    }

    #[test]
    fn test_lifelink_blocker() {
        let (mut game, alice, bob) = setup();
        let bear = fighter(&mut game, alice, 2, 2, &[]);
        let cleric = fighter(&mut game, bob, 1, 3, &[Keyword::Lifelink]);
        game.combat.declare_attacker(bear, bob);
        game.combat.declare_blocker(cleric, bear);

        game.resolve_combat_damage().unwrap();
        assert_eq!(game.get_player(bob).unwrap().life, 21);
        assert_eq!(game.permanent(cleric).unwrap().damage, 2);
    }


    #[test]
    fn test_declare_attacker() {
        let mut combat = CombatState::new();
        let attacker = CardId::new(1);
        let defender = PlayerId::new(2);

        combat.declare_attacker(attacker, defender);
        combat.declare_attacker(attacker, defender);

        assert!(combat.is_attacking(attacker));
        assert_eq!(combat.attackers(), vec![attacker]);
        assert_eq!(combat.defending_player_of(attacker), Some(defender));
    }

    #[test]
    fn test_blocking_and_order() {
        let mut combat = CombatState::new();
        let attacker = CardId::new(1);
        let (b1, b2) = (CardId::new(2), CardId::new(3));

        combat.declare_attacker(attacker, PlayerId::new(9));
        combat.declare_blocker(b1, attacker);
        combat.declare_blocker(b2, attacker);

        assert!(combat.is_blocked(attacker));
        assert_eq!(combat.blockers_of(attacker).as_slice(), &[b1, b2]);
        assert_eq!(combat.blocked_attacker(b2), Some(attacker));

        assert!(!combat.set_blocker_order(attacker, SmallVec::from_slice(&[b2])));
        assert!(combat.set_blocker_order(attacker, SmallVec::from_slice(&[b2, b1])));
        assert_eq!(combat.blockers_of(attacker).as_slice(), &[b2, b1]);
    }

    #[test]
    fn test_remove_and_clear() {
        let mut combat = CombatState::new();
        let attacker = CardId::new(1);
        let blocker = CardId::new(2);
        combat.declare_attacker(attacker, PlayerId::new(9));
        combat.declare_blocker(blocker, attacker);

        combat.remove(blocker);
        assert!(combat.blockers_of(attacker).is_empty());
        assert!(combat.is_blocked(attacker));
        assert!(combat.is_attacking(attacker));

        combat.clear();
        assert!(combat.is_empty());
    }
}
