//! Interceptor dispatch seen from outside the engine
//!
//! Order is seat order, then battlefield arrival order; a later interceptor
//! wraps the earlier ones and so gets the last word.

use mtg_rules_rs::core::{Ability, CardBuilder, CardId, CardType, PlayerId};
use mtg_rules_rs::decks::card_builder;
use mtg_rules_rs::game::{GameConfig, GameState, Interceptor, Step, VerbosityLevel};
use mtg_rules_rs::zones::Zone;

fn setup() -> (GameState, PlayerId, PlayerId) {
    let config = GameConfig::default().with_verbosity(VerbosityLevel::Silent);
    let game = GameState::new_two_player("Alice", "Bob", config);
    let (alice, bob) = (game.players[0].id, game.players[1].id);
    (game, alice, bob)
}

fn enchantment(game: &mut GameState, owner: PlayerId, ability: Interceptor) -> CardId {
    game.create_card(
        CardBuilder::new("Test Enchantment")
            .owner(owner)
            .types([CardType::Enchantment])
            .ability(ability),
        Zone::Battlefield,
    )
    .unwrap()
}

/// Every creature has power 1, whatever came before
fn set_power_to_one() -> Interceptor {
    Interceptor::power(|_game, _source, _target, _next| 1)
}

fn plus_one_power() -> Interceptor {
    Interceptor::power(|game, _source, &target, next| next(game, &target) + 1)
}

fn bears(game: &mut GameState, owner: PlayerId) -> CardId {
    let builder = card_builder("Grizzly Bears").unwrap().owner(owner);
    game.create_card(builder, Zone::Battlefield).unwrap()
}

#[test]
fn test_no_interceptors_runs_base() {
    let (mut game, alice, _) = setup();
    let bear = bears(&mut game, alice);
    assert_eq!(game.power(bear), 2);
    assert_eq!(game.toughness(bear), 2);
}

#[test]
fn test_later_seat_wraps_earlier_seat() {
    let (mut game, alice, bob) = setup();
    let bear = bears(&mut game, alice);
    enchantment(&mut game, bob, plus_one_power());
    enchantment(&mut game, alice, set_power_to_one());
    assert_eq!(game.power(bear), 2);

    let (mut game, alice, bob) = setup();
    let bear = bears(&mut game, alice);
    enchantment(&mut game, bob, set_power_to_one());
    enchantment(&mut game, alice, plus_one_power());
    assert_eq!(game.power(bear), 1);
}

#[test]
fn test_arrival_order_within_a_seat() {
    let (mut game, alice, _) = setup();
    let bear = bears(&mut game, alice);
    enchantment(&mut game, alice, set_power_to_one());
    let adder = enchantment(&mut game, alice, plus_one_power());
    assert_eq!(game.power(bear), 2);

    // Leaving the battlefield removes the interceptor
    game.move_card(adder, Zone::Graveyard).unwrap();
    assert_eq!(game.power(bear), 1);
}

#[test]
fn test_abilities_interceptor_cannot_add_interceptors() {
    let (mut game, alice, _) = setup();
    let bear = bears(&mut game, alice);
    enchantment(
        &mut game,
        alice,
        Interceptor::abilities(|game, _source, &target, next| {
            let mut abilities = next(game, &target);
            abilities.push(Ability::Interceptor(plus_one_power()));
            abilities
        }),
    );
    assert_eq!(game.power(bear), 2);
    assert_eq!(game.abilities(bear).len(), 1);
}

#[test]
fn test_destroy_interceptor_protects_its_source() {
    let (mut game, alice, _) = setup();
    let guarded = game
        .create_card(
            CardBuilder::new("Guarded Statue")
                .owner(alice)
                .types([CardType::Artifact])
                .ability(Interceptor::destroy(|game, source, &target, next| {
                    if target == source {
                        Ok(false)
                    } else {
                        next(game, &target)
                    }
                })),
            Zone::Battlefield,
        )
        .unwrap();
    let bear = bears(&mut game, alice);

    assert!(!game.destroy(guarded).unwrap());
    assert!(game.is_on_battlefield(guarded));
    assert!(game.destroy(bear).unwrap());
    assert_eq!(game.zone_of(bear), Some(Zone::Graveyard));
}

#[test]
fn test_step_entry_interceptor_replaces_draw() {
    let (mut game, alice, _) = setup();
    for _ in 0..3 {
        let builder = card_builder("Forest").unwrap().owner(alice);
        game.create_card(builder, Zone::Library).unwrap();
    }
    enchantment(
        &mut game,
        alice,
        Interceptor::step_entry(|game, _source, &step, next| {
            if step == Step::Draw {
                return Ok(());
            }
            next(game, &step)
        }),
    );

    game.start_game().unwrap();
    game.advance_to(Step::Main1).unwrap();
    assert!(game.hand(alice).is_empty());
    assert_eq!(
        game.get_player_zones(alice).unwrap().library.len(),
        3
    );
}
