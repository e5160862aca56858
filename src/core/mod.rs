//! Core game types and entities

pub mod ability;
pub mod card;
pub mod cost_parser;
pub mod costs;
pub mod effects;
pub mod entity;
pub mod mana;
pub mod player;
pub mod types;

pub use ability::{Ability, ActivatedAbility, ComputedAbility, Keyword, Scope};
pub use card::{Card, CardBuilder, Stat, TypeList};
pub use costs::Cost;
pub use effects::{
    Duration, Effect, EffectContext, Subject, TargetFilter, TargetRef, TargetSpec, Targets,
};
pub use entity::{EntityId, EntityStore, GameEntity};
pub use mana::{ChoiceGroup, Color, Mana, ManaBatch, ManaCost, ManaPool, ManaSymbols, SpendRestriction};
pub use player::Player;
pub use types::{CardName, CardType, CounterType, PlayerName, Subtype};

pub type CardId = EntityId<Card>;
pub type PlayerId = EntityId<Player>;
