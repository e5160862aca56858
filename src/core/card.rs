//! Card definitions and the card builder

use crate::core::{
    Ability, CardId, CardName, CardType, Color, Effect, GameEntity, Keyword, ManaCost, PlayerId,
    Subtype, TargetSpec,
};
use crate::game::GameState;
use crate::zones::Zone;
use crate::{MtgError, Result};
use smallvec::SmallVec;
use std::fmt;
use std::rc::Rc;

pub type TypeList = SmallVec<[CardType; 2]>;

/// Printed power or toughness: a number, or a function of the permanent
#[derive(Clone)]
pub enum Stat {
    Fixed(i32),
    Derived(Rc<dyn Fn(&GameState, CardId) -> i32>),
}

impl Stat {
    pub fn derived(f: impl Fn(&GameState, CardId) -> i32 + 'static) -> Self {
        Stat::Derived(Rc::new(f))
    }

    pub fn evaluate(&self, game: &GameState, id: CardId) -> i32 {
        match self {
            Stat::Fixed(n) => *n,
            Stat::Derived(f) => f(game, id),
        }
    }
}

impl From<i32> for Stat {
    fn from(n: i32) -> Self {
        Stat::Fixed(n)
    }
}

impl fmt::Debug for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stat::Fixed(n) => write!(f, "{n}"),
            Stat::Derived(_) => write!(f, "*"),
        }
    }
}

/// A card instance, as it exists outside the battlefield
///
/// The live state of a card in play lives in `game::Permanent`; this struct
/// is the printed side and does not change during a game.
#[derive(Clone)]
pub struct Card {
    pub id: CardId,
    pub name: CardName,
    pub owner: PlayerId,
    pub mana_cost: ManaCost,
    pub types: TypeList,
    pub subtypes: SmallVec<[Subtype; 2]>,
    pub colors: SmallVec<[Color; 2]>,
    pub power: Option<Stat>,
    pub toughness: Option<Stat>,
    pub loyalty: Option<u32>,
    /// Printed abilities; these become the permanent's base abilities
    pub abilities: Vec<Ability>,
    /// What an instant or sorcery does on resolution
    pub spell_effect: Option<Effect>,
    /// Targets chosen on cast
    pub target: Option<TargetSpec>,
    /// For auras: what it may be attached to
    pub enchant: Option<TargetSpec>,
    /// Where a non-permanent spell goes after resolving
    pub resolves_to: Zone,
    pub text: String,
}

impl Card {
    pub fn is_type(&self, card_type: CardType) -> bool {
        self.types.contains(&card_type)
    }

    pub fn is_creature(&self) -> bool {
        self.is_type(CardType::Creature)
    }

    pub fn is_land(&self) -> bool {
        self.is_type(CardType::Land)
    }

    /// Enters the battlefield on resolution
    pub fn is_permanent_card(&self) -> bool {
        self.types.iter().any(|t| t.is_permanent_type())
    }

    pub fn is_aura(&self) -> bool {
        self.enchant.is_some()
    }

    pub fn has_printed_keyword(&self, keyword: &Keyword) -> bool {
        self.abilities.iter().any(|a| a.is_keyword(keyword))
    }

    /// May be cast any time its controller could pass priority
    pub fn has_instant_timing(&self) -> bool {
        self.is_type(CardType::Instant) || self.has_printed_keyword(&Keyword::Flash)
    }

    /// Target requirement used when casting (auras use their enchant spec)
    pub fn cast_targets(&self) -> Option<&TargetSpec> {
        self.target.as_ref().or(self.enchant.as_ref())
    }
}

impl GameEntity<Card> for Card {
    fn id(&self) -> CardId {
        self.id
    }

    fn name(&self) -> &str {
        self.name.as_str()
    }
}

impl fmt::Debug for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Card")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("owner", &self.owner)
            .field("mana_cost", &self.mana_cost.to_string())
            .field("types", &self.types)
            .field("power", &self.power)
            .field("toughness", &self.toughness)
            .finish()
    }
}

/// Builder for [`Card`]
///
/// ```ignore
/// let bears = CardBuilder::new("Grizzly Bears")
///     .owner(alice)
///     .cost("{1}{G}")
///     .types([CardType::Creature])
///     .power_toughness(2, 2);
/// let id = game.create_card(bears, Zone::Hand)?;
/// ```
#[derive(Clone)]
pub struct CardBuilder {
    name: CardName,
    owner: Option<PlayerId>,
    cost: String,
    types: TypeList,
    subtypes: SmallVec<[Subtype; 2]>,
    colors: Option<SmallVec<[Color; 2]>>,
    power: Option<Stat>,
    toughness: Option<Stat>,
    loyalty: Option<u32>,
    abilities: Vec<Ability>,
    spell_effect: Option<Effect>,
    target: Option<TargetSpec>,
    enchant: Option<TargetSpec>,
    resolves_to: Zone,
    text: String,
}

impl CardBuilder {
    pub fn new(name: impl Into<CardName>) -> Self {
        CardBuilder {
            name: name.into(),
            owner: None,
            cost: String::new(),
            types: SmallVec::new(),
            subtypes: SmallVec::new(),
            colors: None,
            power: None,
            toughness: None,
            loyalty: None,
            abilities: Vec::new(),
            spell_effect: None,
            target: None,
            enchant: None,
            resolves_to: Zone::Graveyard,
            text: String::new(),
        }
    }

    pub fn owner(mut self, owner: PlayerId) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Mana cost in brace or bare notation; parsed by `build`
    pub fn cost(mut self, cost: &str) -> Self {
        self.cost = cost.to_string();
        self
    }

    pub fn types(mut self, types: impl IntoIterator<Item = CardType>) -> Self {
        self.types.extend(types);
        self
    }

    pub fn subtypes<S: Into<Subtype>>(mut self, subtypes: impl IntoIterator<Item = S>) -> Self {
        self.subtypes.extend(subtypes.into_iter().map(Into::into));
        self
    }

    /// Override the colors derived from the mana cost
    pub fn colors(mut self, colors: impl IntoIterator<Item = Color>) -> Self {
        self.colors = Some(colors.into_iter().collect());
        self
    }

    pub fn power_toughness(self, power: i32, toughness: i32) -> Self {
        self.stats(Stat::Fixed(power), Stat::Fixed(toughness))
    }

    pub fn stats(mut self, power: Stat, toughness: Stat) -> Self {
        self.power = Some(power);
        self.toughness = Some(toughness);
        self
    }

    pub fn loyalty(mut self, loyalty: u32) -> Self {
        self.loyalty = Some(loyalty);
        self
    }

    pub fn ability(mut self, ability: impl Into<Ability>) -> Self {
        self.abilities.push(ability.into());
        self
    }

    pub fn abilities(mut self, abilities: impl IntoIterator<Item = Ability>) -> Self {
        self.abilities.extend(abilities);
        self
    }

    pub fn spell(mut self, effect: Effect) -> Self {
        self.spell_effect = Some(effect);
        self
    }

    pub fn target(mut self, target: TargetSpec) -> Self {
        self.target = Some(target);
        self
    }

    /// Makes this card an aura that attaches to a permanent matching `spec`
    pub fn enchant(mut self, spec: TargetSpec) -> Self {
        self.enchant = Some(spec);
        self
    }

    pub fn resolves_to(mut self, zone: Zone) -> Self {
        self.resolves_to = zone;
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn name(&self) -> &CardName {
        &self.name
    }

    /// Finish the card
    ///
    /// Fails with `InvalidConstruction` when the card has no major type or no
    /// owner, and with `ParseError` on a malformed cost.
    pub fn build(self, id: CardId) -> Result<Card> {
        if self.types.is_empty() {
            return Err(MtgError::InvalidConstruction(format!(
                "card '{}' has no card type",
                self.name
            )));
        }
        let owner = self.owner.ok_or_else(|| {
            MtgError::InvalidConstruction(format!("card '{}' has no owner", self.name))
        })?;
        let mana_cost = ManaCost::parse(&self.cost)?;
        let colors = self.colors.unwrap_or_else(|| colors_of(&mana_cost));

        Ok(Card {
            id,
            name: self.name,
            owner,
            mana_cost,
            types: self.types,
            subtypes: self.subtypes,
            colors,
            power: self.power,
            toughness: self.toughness,
            loyalty: self.loyalty,
            abilities: self.abilities,
            spell_effect: self.spell_effect,
            target: self.target,
            enchant: self.enchant,
            resolves_to: self.resolves_to,
            text: self.text,
        })
    }
}

/// Colors appearing anywhere in a cost (colorless is not a color)
fn colors_of(cost: &ManaCost) -> SmallVec<[Color; 2]> {
    let mut colors: SmallVec<[Color; 2]> = SmallVec::new();
    let symbols = std::iter::once(cost.fixed)
        .chain(cost.choices.iter().flat_map(|g| g.alternatives.iter().copied()));
    for sym in symbols {
        for color in sym.specific().kinds() {
            if color != Color::Colorless && !colors.contains(&color) {
                colors.push(color);
            }
        }
    }
    colors.sort();
    colors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::EntityId;

    #[test]
    fn test_build_creature() {
        let owner = PlayerId::new(0);
        let card = CardBuilder::new("Grizzly Bears")
            .owner(owner)
            .cost("{1}{G}")
            .types([CardType::Creature])
            .subtypes(["Bear"])
            .power_toughness(2, 2)
            .build(EntityId::new(10))
            .unwrap();

        assert_eq!(card.name(), "Grizzly Bears");
        assert_eq!(card.owner, owner);
        assert!(card.is_creature());
        assert!(card.is_permanent_card());
        assert_eq!(card.mana_cost.value(), 2);
        assert_eq!(card.colors.as_slice(), &[Color::Green]);
        assert_eq!(card.resolves_to, Zone::Graveyard);
    }

    #[test]
    fn test_hybrid_card_has_both_colors() {
        let card = CardBuilder::new("Boros Recruit")
            .owner(PlayerId::new(0))
            .cost("{R/W}")
            .types([CardType::Creature])
            .power_toughness(1, 1)
            .build(EntityId::new(1))
            .unwrap();
        assert_eq!(card.colors.as_slice(), &[Color::White, Color::Red]);
    }

    #[test]
    fn test_missing_type_is_invalid() {
        let result = CardBuilder::new("Nothing")
            .owner(PlayerId::new(0))
            .build(EntityId::new(1));
        assert!(matches!(result, Err(MtgError::InvalidConstruction(_))));
    }

    #[test]
    fn test_missing_owner_is_invalid() {
        let result = CardBuilder::new("Ownerless")
            .types([CardType::Instant])
            .build(EntityId::new(1));
        assert!(matches!(result, Err(MtgError::InvalidConstruction(_))));
    }

    #[test]
    fn test_bad_cost_is_parse_error() {
        let result = CardBuilder::new("Typo")
            .owner(PlayerId::new(0))
            .types([CardType::Sorcery])
            .cost("{Q}")
            .build(EntityId::new(1));
        assert!(matches!(result, Err(MtgError::ParseError(_))));
    }

    #[test]
    fn test_flash_gives_instant_timing() {
        let card = CardBuilder::new("Ambusher")
            .owner(PlayerId::new(0))
            .types([CardType::Creature])
            .ability(Keyword::Flash)
            .power_toughness(1, 1)
            .build(EntityId::new(1))
            .unwrap();
        assert!(card.has_instant_timing());
    }
}
