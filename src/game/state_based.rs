//! State-based checks
//!
//! Run after every stack resolution and after each combat damage pass. The
//! check loops until nothing more qualifies, since one destruction can make
//! another permanent (an aura, say) illegal.

use crate::core::{CardId, CounterType, PlayerId};
use crate::game::GameState;
use crate::zones::Zone;
use crate::Result;

impl GameState {
    /// Apply state-based actions until the game is stable
    ///
    /// Returns whether anything happened.
    pub fn check_state_based_actions(&mut self) -> Result<bool> {
        let mut changed = false;
        loop {
            let mut acted = self.check_players()?;

            for id in self.doomed_permanents() {
                acted |= self.destroy(id)?;
            }

            for aura in self.orphaned_auras() {
                self.logger.normal(&format!(
                    "{} is put into the graveyard: not attached",
                    self.card_name(aura)
                ));
                self.move_card(aura, Zone::Graveyard)?;
                acted = true;
            }

            if !acted {
                return Ok(changed);
            }
            changed = true;
        }
    }

    fn check_players(&mut self) -> Result<bool> {
        let losers: Vec<PlayerId> = self
            .players
            .iter()
            .filter(|p| !p.has_lost && (p.life <= 0 || p.drew_from_empty_library))
            .map(|p| p.id)
            .collect();
        for &id in &losers {
            let player = self.get_player_mut(id)?;
            player.has_lost = true;
            let name = player.name.to_string();
            self.logger.minimal(&format!("{name} loses the game"));
        }
        Ok(!losers.is_empty())
    }

    /// Creatures with lethal damage and planeswalkers out of loyalty
    fn doomed_permanents(&self) -> Vec<CardId> {
        self.battlefield_order()
            .into_iter()
            .filter(|&id| {
                let Some(p) = self.permanent(id) else {
                    return false;
                };
                let dead_creature = self.is_creature(id)
                    && ((p.damage > 0 && p.deathtouch_damage) || p.damage >= self.toughness(id));
                let dead_walker =
                    self.is_planeswalker(id) && p.counter(&CounterType::loyalty()) == 0;
                dead_creature || dead_walker
            })
            .filter(|&id| !self.has_keyword(id, &crate::core::Keyword::Indestructible))
            .collect()
    }

    /// Auras whose host is gone or no longer a legal enchant target
    fn orphaned_auras(&self) -> Vec<CardId> {
        self.battlefield_order()
            .into_iter()
            .filter(|&id| {
                let Ok(card) = self.cards.get(id) else {
                    return false;
                };
                let Some(spec) = &card.enchant else {
                    return false;
                };
                let controller = self.controller_of(id).unwrap_or(card.owner);
                match self.permanent(id).and_then(|p| p.attached_to) {
                    None => true,
                    Some(host) => {
                        !self.is_on_battlefield(host)
                            || !spec.matches(self, controller, crate::core::TargetRef::Permanent(host))
                    }
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::core::{Ability, CardBuilder, CardType, Keyword, TargetSpec};
    use crate::game::{GameConfig, GameState};
    use crate::zones::Zone;

    fn setup() -> GameState {
        GameState::new_two_player("Alice", "Bob", GameConfig::default())
    }

    #[test]
    fn test_damaged_creature_dies() {
        let mut game = setup();
        let alice = game.players[0].id;
        let token = game
            .create_card(
                CardBuilder::new("Soldier")
                    .owner(alice)
                    .types([CardType::Creature])
                    .power_toughness(1, 1),
                Zone::Battlefield,
            )
            .unwrap();

        assert!(!game.check_state_based_actions().unwrap());

        game.permanent_mut(token).unwrap().damage = 1;
        assert!(game.check_state_based_actions().unwrap());
        assert!(!game.is_on_battlefield(token));
        assert_eq!(game.zone_of(token), Some(Zone::Graveyard));

        // Idempotent once stable
        assert!(!game.check_state_based_actions().unwrap());
    }

    #[test]
    fn test_indestructible_keeps_damage() {
        let mut game = setup();
        let alice = game.players[0].id;
        let golem = game
            .create_card(
                CardBuilder::new("Golem")
                    .owner(alice)
                    .types([CardType::Creature])
                    .ability(Keyword::Indestructible)
                    .power_toughness(3, 3),
                Zone::Battlefield,
            )
            .unwrap();
        game.permanent_mut(golem).unwrap().damage = 5;

        assert!(!game.check_state_based_actions().unwrap());
        assert!(game.is_on_battlefield(golem));
    }

    #[test]
    fn test_aura_falls_off_when_host_dies() {
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
        let aura = game
            .create_card(
                CardBuilder::new("Giant Strength")
                    .owner(alice)
                    .types([CardType::Enchantment])
                    .enchant(TargetSpec::creature())
                    .abilities(Ability::stat_bonus(crate::core::Scope::Attached, 2, 2)),
                Zone::Battlefield,
            )
            .unwrap();
        game.permanent_mut(aura).unwrap().attached_to = Some(bear);
        assert_eq!(game.power(bear), 4);

        game.permanent_mut(bear).unwrap().damage = 4;
        assert!(game.check_state_based_actions().unwrap());
        assert_eq!(game.zone_of(bear), Some(Zone::Graveyard));
        assert_eq!(game.zone_of(aura), Some(Zone::Graveyard));
    }

    #[test]
    fn test_zero_life_loses() {
        let mut game = setup();
        let bob = game.players[1].id;
        game.get_player_mut(bob).unwrap().life = 0;
        assert!(game.check_state_based_actions().unwrap());
        assert!(game.get_player(bob).unwrap().has_lost);
        assert!(game.is_game_over());
        assert_eq!(game.get_winner(), Some(game.players[0].id));
    }
}
