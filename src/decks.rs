//! Sample card set and deck lists
//!
//! A small, fixed catalog used by the demo binary, the benches and the
//! end-to-end tests. Deck lists use the `.dck` text layout:
//!
//! ```text
//! [Main]
//! 16 Mountain
//! 4 Lightning Bolt
//! ```

use crate::core::{
    Ability, ActivatedAbility, CardBuilder, CardType, Color, Cost, Effect, Keyword, Mana,
    ManaCost, PlayerId, Scope, SpendRestriction, Subject, TargetSpec,
};
use crate::game::dispatch::Interceptor;
use crate::game::GameState;
use crate::zones::Zone;
use crate::{MtgError, Result};

/// Every card name [`card_builder`] knows, in catalog order
pub const CARD_NAMES: &[&str] = &[
    "Plains",
    "Island",
    "Swamp",
    "Mountain",
    "Forest",
    "Cavern Shrine",
    "Grizzly Bears",
    "Goblin Piker",
    "White Knight",
    "Serra Angel",
    "Giant Spider",
    "Typhoid Rats",
    "Vampire Nighthawk",
    "Colossal Dreadmaw",
    "Boros Recruit",
    "Kitchen Finks",
    "Prodigal Sorcerer",
    "Lightning Bolt",
    "Giant Growth",
    "Divination",
    "Giant Strength",
    "Glorious Anthem",
    "Furnace of Rath",
    "Chandra Nalaar",
];

fn basic_land(name: &str, subtype: &str, color: Color) -> CardBuilder {
    CardBuilder::new(name)
        .types([CardType::Land])
        .subtypes([subtype])
        .ability(tap_for(Mana::of(color, 1), None))
}

fn tap_for(mana: Mana, restriction: Option<SpendRestriction>) -> ActivatedAbility {
    ActivatedAbility::new(
        format!("Add {mana}"),
        Cost::Tap,
        Effect::AddMana {
            mana,
            persistent: false,
            restriction,
        },
    )
    .mana()
}

fn creature(name: &str, cost: &str, subtype: &str, power: i32, toughness: i32) -> CardBuilder {
    CardBuilder::new(name)
        .cost(cost)
        .types([CardType::Creature])
        .subtypes([subtype])
        .power_toughness(power, toughness)
}

/// A fresh builder for a catalog card, without an owner
pub fn card_builder(name: &str) -> Option<CardBuilder> {
    let builder = match name {
        "Plains" => basic_land(name, "Plains", Color::White),
        "Island" => basic_land(name, "Island", Color::Blue),
        "Swamp" => basic_land(name, "Swamp", Color::Black),
        "Mountain" => basic_land(name, "Mountain", Color::Red),
        "Forest" => basic_land(name, "Forest", Color::Green),
        "Cavern Shrine" => CardBuilder::new(name)
            .types([CardType::Land])
            .ability(tap_for(
                Mana::of(Color::Colorless, 2),
                Some(SpendRestriction::new("creature spells only", |card| {
                    card.is_creature()
                })),
            ))
            .text("{T}: Add {C}{C}. Spend this mana only to cast creature spells."),

        "Grizzly Bears" => creature(name, "{1}{G}", "Bear", 2, 2),
        "Goblin Piker" => creature(name, "{1}{R}", "Goblin", 2, 1),
        "White Knight" => {
            creature(name, "{W}{W}", "Knight", 2, 2).ability(Keyword::FirstStrike)
        }
        "Serra Angel" => creature(name, "{3}{W}{W}", "Angel", 4, 4)
            .ability(Keyword::Flying)
            .ability(Keyword::Vigilance),
        "Giant Spider" => creature(name, "{3}{G}", "Spider", 2, 4).ability(Keyword::Reach),
        "Typhoid Rats" => creature(name, "{B}", "Rat", 1, 1).ability(Keyword::Deathtouch),
        "Vampire Nighthawk" => creature(name, "{1}{B}{B}", "Vampire", 2, 3)
            .ability(Keyword::Flying)
            .ability(Keyword::Deathtouch)
            .ability(Keyword::Lifelink),
        "Colossal Dreadmaw" => {
            creature(name, "{4}{G}{G}", "Dinosaur", 6, 6).ability(Keyword::Trample)
        }
        "Boros Recruit" => {
            creature(name, "{R/W}", "Soldier", 1, 1).ability(Keyword::FirstStrike)
        }
        "Kitchen Finks" => creature(name, "{1}{G/W}{G/W}", "Ouphe", 3, 2),
        "Prodigal Sorcerer" => creature(name, "{2}{U}", "Wizard", 1, 1).ability(
            ActivatedAbility::new(
                "deal 1 damage to any target",
                Cost::Tap,
                Effect::DealDamage {
                    to: Subject::Target(0),
                    amount: 1,
                },
            )
            .with_target(TargetSpec::any_target()),
        ),

        "Lightning Bolt" => CardBuilder::new(name)
            .cost("{R}")
            .types([CardType::Instant])
            .target(TargetSpec::any_target())
            .spell(Effect::DealDamage {
                to: Subject::Target(0),
                amount: 3,
            }),
        "Giant Growth" => CardBuilder::new(name)
            .cost("{G}")
            .types([CardType::Instant])
            .target(TargetSpec::creature())
            .spell(Effect::Pump {
                target: Subject::Target(0),
                power: 3,
                toughness: 3,
            }),
        "Divination" => CardBuilder::new(name)
            .cost("{2}{U}")
            .types([CardType::Sorcery])
            .spell(Effect::DrawCards {
                player: Subject::Controller,
                count: 2,
            }),

        "Giant Strength" => CardBuilder::new(name)
            .cost("{R}{R}")
            .types([CardType::Enchantment])
            .subtypes(["Aura"])
            .enchant(TargetSpec::creature().with_prompt("Enchant creature"))
            .abilities(Ability::stat_bonus(Scope::Attached, 2, 2)),
        "Glorious Anthem" => CardBuilder::new(name)
            .cost("{1}{W}{W}")
            .types([CardType::Enchantment])
            .abilities(Ability::stat_bonus(Scope::CreaturesYouControl, 1, 1)),
        "Furnace of Rath" => CardBuilder::new(name)
            .cost("{1}{R}{R}{R}")
            .types([CardType::Enchantment])
            .ability(doubled_combat_damage())
            .text("Combat damage is doubled."),

        "Chandra Nalaar" => CardBuilder::new(name)
            .cost("{3}{R}{R}")
            .types([CardType::Planeswalker])
            .subtypes(["Chandra"])
            .loyalty(6)
            .ability(
                ActivatedAbility::new(
                    "deal 1 damage to target player",
                    Cost::Loyalty(1),
                    Effect::DealDamage {
                        to: Subject::Target(0),
                        amount: 1,
                    },
                )
                .with_target(TargetSpec::player()),
            )
            .ability(
                ActivatedAbility::new(
                    "deal 4 damage to target creature",
                    Cost::Loyalty(-4),
                    Effect::DealDamage {
                        to: Subject::Target(0),
                        amount: 4,
                    },
                )
                .with_target(TargetSpec::creature()),
            ),

        _ => return None,
    };
    Some(builder)
}

/// Every combat damage event deals twice its amount
fn doubled_combat_damage() -> Interceptor {
    Interceptor::combat_damage(|game, _source, event, next| {
        let mut doubled = *event;
        doubled.amount = event.amount.saturating_mul(2);
        next(game, &doubled)
    })
}

/// Parsed mana cost of a catalog card
pub fn catalog_cost(name: &str) -> Option<ManaCost> {
    let builder = card_builder(name)?;
    let card = builder.owner(PlayerId::new(0)).build(crate::core::CardId::new(0)).ok()?;
    Some(card.mana_cost)
}

/// Represents a deck entry (card name and count)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckEntry {
    pub card_name: String,
    pub count: u8,
}

/// Represents a complete deck list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckList {
    pub name: String,
    pub main_deck: Vec<DeckEntry>,
}

impl DeckList {
    /// Parse a deck from its `.dck` text content
    ///
    /// Section headers and `#` comments are skipped; `Name=` inside
    /// `[metadata]` names the deck. Every card must be in the catalog.
    pub fn parse(content: &str) -> Result<DeckList> {
        let mut name = String::from("Unnamed");
        let mut main_deck = Vec::new();

        for (line_no, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('[') {
                continue;
            }
            if let Some(value) = line.strip_prefix("Name=") {
                name = value.trim().to_string();
                continue;
            }

            // Format: "4 Card Name" or "4 Card Name|SET"
            let parsed = line.split_once(' ').and_then(|(count, rest)| {
                let count = count.parse::<u8>().ok()?;
                let card_name = rest.split_once('|').map_or(rest, |(n, _set)| n).trim();
                Some((count, card_name))
            });
            let Some((count, card_name)) = parsed else {
                return Err(MtgError::ParseError(format!(
                    "line {}: expected '<count> <card name>', got '{line}'",
                    line_no + 1
                )));
            };
            if card_builder(card_name).is_none() {
                return Err(MtgError::ParseError(format!(
                    "line {}: unknown card '{card_name}'",
                    line_no + 1
                )));
            }
            main_deck.push(DeckEntry {
                card_name: card_name.to_string(),
                count,
            });
        }

        if main_deck.is_empty() {
            return Err(MtgError::ParseError("Empty deck".to_string()));
        }
        Ok(DeckList { name, main_deck })
    }

    /// Total cards in main deck
    pub fn total_cards(&self) -> usize {
        self.main_deck.iter().map(|e| e.count as usize).sum()
    }

    /// Put one copy of every card into `player`'s library, in list order
    pub fn load_into(&self, game: &mut GameState, player: PlayerId) -> Result<()> {
        for entry in &self.main_deck {
            for _ in 0..entry.count {
                let builder = card_builder(&entry.card_name).ok_or_else(|| {
                    MtgError::InvalidConstruction(format!("unknown card '{}'", entry.card_name))
                })?;
                game.create_card(builder.owner(player), Zone::Library)?;
            }
        }
        Ok(())
    }
}

const RED_AGGRO: &str = "\
[metadata]
Name=Red Aggro
[Main]
17 Mountain
6 Goblin Piker
6 Boros Recruit
6 Lightning Bolt
2 Giant Strength
1 Furnace of Rath
2 Chandra Nalaar
";

const GREEN_WHITE: &str = "\
[metadata]
Name=Green White
[Main]
8 Forest
7 Plains
2 Cavern Shrine
6 Grizzly Bears
4 White Knight
3 Kitchen Finks
2 Serra Angel
2 Colossal Dreadmaw
4 Giant Growth
2 Glorious Anthem
";

const BLACK_BLUE: &str = "\
[metadata]
Name=Black Blue
[Main]
9 Swamp
8 Island
8 Typhoid Rats
6 Vampire Nighthawk
5 Prodigal Sorcerer
4 Divination
";

/// The built-in deck lists
pub fn sample_decks() -> Result<Vec<DeckList>> {
    [RED_AGGRO, GREEN_WHITE, BLACK_BLUE]
        .into_iter()
        .map(DeckList::parse)
        .collect()
}
