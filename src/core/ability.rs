//! Abilities a permanent can have
//!
//! An ability is one of four things:
//! - a keyword marker with no behaviour of its own ("has flying")
//! - a computed ability, re-evaluated on every query into a list of abilities
//! - an activated ability (cost plus effect)
//! - an interceptor that wraps one game operation (see `game::dispatch`)

use crate::core::{CardId, Cost, Effect, TargetSpec};
use crate::game::dispatch::Interceptor;
use crate::game::GameState;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

/// Keyword abilities the engine's base rules understand
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Keyword {
    Flying,
    Reach,
    FirstStrike,
    DoubleStrike,
    Trample,
    Vigilance,
    Haste,
    Lifelink,
    Deathtouch,
    Indestructible,
    Hexproof,
    Shroud,
    Defender,
    Flash,
    /// Opaque marker; only meaningful to interceptors that look for it
    Named(String),
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Keyword::Named(name) => write!(f, "{name}"),
            other => write!(f, "{other:?}"),
        }
    }
}

pub type ComputedAbility = Rc<dyn Fn(&GameState, CardId) -> Vec<Ability>>;

/// Cost plus effect, activated by the permanent's controller
#[derive(Clone)]
pub struct ActivatedAbility {
    pub description: String,
    pub cost: Cost,
    pub effect: Effect,
    pub target: Option<TargetSpec>,
    /// Mana abilities resolve immediately instead of using the stack
    pub mana_ability: bool,
}

impl ActivatedAbility {
    pub fn new(description: impl Into<String>, cost: Cost, effect: Effect) -> Self {
        ActivatedAbility {
            description: description.into(),
            cost,
            effect,
            target: None,
            mana_ability: false,
        }
    }

    pub fn with_target(mut self, target: TargetSpec) -> Self {
        self.target = Some(target);
        self
    }

    pub fn mana(mut self) -> Self {
        self.mana_ability = true;
        self
    }
}

#[derive(Clone)]
pub enum Ability {
    Keyword(Keyword),
    Computed(ComputedAbility),
    Activated(ActivatedAbility),
    Interceptor(Interceptor),
}

impl Ability {
    pub fn computed(f: impl Fn(&GameState, CardId) -> Vec<Ability> + 'static) -> Self {
        Ability::Computed(Rc::new(f))
    }

    pub fn is_keyword(&self, keyword: &Keyword) -> bool {
        matches!(self, Ability::Keyword(k) if k == keyword)
    }

    pub fn as_activated(&self) -> Option<&ActivatedAbility> {
        match self {
            Ability::Activated(a) => Some(a),
            _ => None,
        }
    }
}

impl From<Keyword> for Ability {
    fn from(keyword: Keyword) -> Self {
        Ability::Keyword(keyword)
    }
}

impl From<ActivatedAbility> for Ability {
    fn from(ability: ActivatedAbility) -> Self {
        Ability::Activated(ability)
    }
}

impl From<Interceptor> for Ability {
    fn from(interceptor: Interceptor) -> Self {
        Ability::Interceptor(interceptor)
    }
}

impl fmt::Debug for Ability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ability::Keyword(k) => write!(f, "{k}"),
            Ability::Computed(_) => write!(f, "Computed"),
            Ability::Activated(a) => write!(f, "{}: {}", a.cost, a.description),
            Ability::Interceptor(i) => write!(f, "Interceptor({:?})", i.operation()),
        }
    }
}

/// Which permanents a static bonus applies to, seen from its source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scope {
    /// The source itself
    Own,
    /// The permanent the source (an aura) is attached to
    Attached,
    /// Every creature the source's controller controls
    CreaturesYouControl,
    /// As above, excluding the source
    OtherCreaturesYouControl,
}

impl Scope {
    pub fn applies(self, game: &GameState, source: CardId, target: CardId) -> bool {
        match self {
            Scope::Own => source == target,
            Scope::Attached => game.permanent(source).and_then(|p| p.attached_to) == Some(target),
            Scope::CreaturesYouControl => {
                game.controller_of(target) == game.controller_of(source) && game.is_creature(target)
            }
            Scope::OtherCreaturesYouControl => {
                source != target
                    && game.controller_of(target) == game.controller_of(source)
                    && game.is_creature(target)
            }
        }
    }
}

impl Ability {
    /// +power/+toughness for everything in `scope`
    pub fn stat_bonus(scope: Scope, power: i32, toughness: i32) -> Vec<Ability> {
        let mut abilities = Vec::new();
        if power != 0 {
            abilities.push(Ability::Interceptor(Interceptor::power(
                move |game, source, &target, next| {
                    let base = next(game, &target);
                    if scope.applies(game, source, target) {
                        base + power
                    } else {
                        base
                    }
                },
            )));
        }
        if toughness != 0 {
            abilities.push(Ability::Interceptor(Interceptor::toughness(
                move |game, source, &target, next| {
                    let base = next(game, &target);
                    if scope.applies(game, source, target) {
                        base + toughness
                    } else {
                        base
                    }
                },
            )));
        }
        abilities
    }

    /// Grant `keyword` to everything in `scope`
    pub fn grant_keyword(scope: Scope, keyword: Keyword) -> Ability {
        Ability::Interceptor(Interceptor::abilities(move |game, source, &target, next| {
            let mut abilities = next(game, &target);
            if scope.applies(game, source, target) && !abilities.iter().any(|a| a.is_keyword(&keyword))
            {
                abilities.push(Ability::Keyword(keyword.clone()));
            }
            abilities
        }))
    }
}
