//! Card effects, targets and effect context

use crate::core::{Ability, CardId, CounterType, Mana, PlayerId, SpendRestriction};
use crate::game::{GameState, Step};
use crate::Result;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::rc::Rc;

/// Something an effect or a selection can point at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TargetRef {
    Player(PlayerId),
    Permanent(CardId),
}

impl fmt::Display for TargetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetRef::Player(id) => write!(f, "player {id}"),
            TargetRef::Permanent(id) => write!(f, "permanent {id}"),
        }
    }
}

pub type Targets = SmallVec<[TargetRef; 2]>;

/// Who or what an effect applies to, resolved against an [`EffectContext`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subject {
    /// The source permanent or spell
    This,
    /// The n-th chosen target
    Target(usize),
    /// Every chosen target
    AllTargets,
    /// The controller of the source
    Controller,
    /// Every other player still in the game
    Opponents,
    /// The permanent the source is attached to
    Attached,
    /// Every creature on the battlefield
    AllCreatures,
}

/// How long a granted ability lasts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Duration {
    /// Cleared at end of turn
    EndOfTurn,
    /// Stays until the permanent leaves the battlefield
    Permanent,
}

pub type CustomEffect = Rc<dyn Fn(&mut GameState, &EffectContext) -> Result<()>>;

/// Effects produced by spells and abilities
#[derive(Clone)]
pub enum Effect {
    DealDamage { to: Subject, amount: i32 },
    DrawCards { player: Subject, count: u32 },
    GainLife { player: Subject, amount: i32 },
    LoseLife { player: Subject, amount: i32 },
    Destroy { target: Subject },
    Tap { target: Subject },
    Untap { target: Subject },
    /// +N/+N until end of turn
    Pump { target: Subject, power: i32, toughness: i32 },
    GrantAbility { target: Subject, ability: Box<Ability>, duration: Duration },
    PutCounters { target: Subject, counter: CounterType, amount: u32 },
    RemoveCounters { target: Subject, counter: CounterType, amount: u32 },
    /// The source's controller gains control of the target
    GainControl { target: Subject },
    AddMana {
        mana: Mana,
        persistent: bool,
        restriction: Option<SpendRestriction>,
    },
    /// Put `effect` on the stack when `step` next begins
    Delayed { step: Step, effect: Box<Effect> },
    Sequence(Vec<Effect>),
    Custom(CustomEffect),
}

impl Effect {
    pub fn custom(f: impl Fn(&mut GameState, &EffectContext) -> Result<()> + 'static) -> Self {
        Effect::Custom(Rc::new(f))
    }

    /// Short description for logs
    pub fn describe(&self) -> String {
        match self {
            Effect::DealDamage { amount, .. } => format!("deal {amount} damage"),
            Effect::DrawCards { count, .. } => format!("draw {count}"),
            Effect::GainLife { amount, .. } => format!("gain {amount} life"),
            Effect::LoseLife { amount, .. } => format!("lose {amount} life"),
            Effect::Destroy { .. } => "destroy".to_string(),
            Effect::Tap { .. } => "tap".to_string(),
            Effect::Untap { .. } => "untap".to_string(),
            Effect::Pump {
                power, toughness, ..
            } => format!("{power:+}/{toughness:+}"),
            Effect::GrantAbility { ability, .. } => format!("gain {ability:?}"),
            Effect::PutCounters { counter, amount, .. } => format!("put {amount} {counter} counter(s)"),
            Effect::RemoveCounters { counter, amount, .. } => {
                format!("remove {amount} {counter} counter(s)")
            }
            Effect::GainControl { .. } => "gain control".to_string(),
            Effect::AddMana { mana, .. } => format!("add {mana}"),
            Effect::Delayed { step, effect } => format!("at {step:?}: {}", effect.describe()),
            Effect::Sequence(effects) => effects
                .iter()
                .map(|e| e.describe())
                .collect::<Vec<_>>()
                .join(", then "),
            Effect::Custom(_) => "custom effect".to_string(),
        }
    }
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Effect({})", self.describe())
    }
}

/// Everything an effect needs to know about where it came from
#[derive(Debug, Clone)]
pub struct EffectContext {
    pub source: CardId,
    pub controller: PlayerId,
    pub targets: Targets,
    /// Indices into `targets` that were illegal on resolution
    pub illegal: SmallVec<[usize; 2]>,
}

impl EffectContext {
    pub fn new(source: CardId, controller: PlayerId) -> Self {
        EffectContext {
            source,
            controller,
            targets: SmallVec::new(),
            illegal: SmallVec::new(),
        }
    }

    pub fn with_targets(mut self, targets: impl IntoIterator<Item = TargetRef>) -> Self {
        self.targets = targets.into_iter().collect();
        self
    }

    /// Keep target positions but skip the ones `is_legal` rejects
    pub fn with_legality(mut self, mut is_legal: impl FnMut(TargetRef) -> bool) -> Self {
        self.illegal = self
            .targets
            .iter()
            .enumerate()
            .filter(|(_, &t)| !is_legal(t))
            .map(|(i, _)| i)
            .collect();
        self
    }

    /// The n-th chosen target, if it is still legal
    pub fn target(&self, index: usize) -> Option<TargetRef> {
        if self.illegal.contains(&index) {
            return None;
        }
        self.targets.get(index).copied()
    }

    /// Chosen targets that are still legal, in order
    pub fn legal_targets(&self) -> impl Iterator<Item = TargetRef> + '_ {
        (0..self.targets.len()).filter_map(|i| self.target(i))
    }
}

pub type TargetFilter = Rc<dyn Fn(&GameState, PlayerId, TargetRef) -> bool>;

/// What a spell or ability may target
///
/// The filter sees the game, the controller of the spell and the candidate.
/// Permanent candidates are additionally checked against the
/// `CanBeTargeted` dispatch by the engine.
#[derive(Clone)]
pub struct TargetSpec {
    pub count: usize,
    pub prompt: String,
    filter: TargetFilter,
}

impl TargetSpec {
    pub fn new(
        count: usize,
        prompt: impl Into<String>,
        filter: impl Fn(&GameState, PlayerId, TargetRef) -> bool + 'static,
    ) -> Self {
        TargetSpec {
            count,
            prompt: prompt.into(),
            filter: Rc::new(filter),
        }
    }

    /// Any player, creature or planeswalker
    pub fn any_target() -> Self {
        TargetSpec::new(1, "Choose any target", |game, _, candidate| match candidate {
            TargetRef::Player(_) => true,
            TargetRef::Permanent(id) => game.is_creature(id) || game.is_planeswalker(id),
        })
    }

    pub fn creature() -> Self {
        TargetSpec::new(1, "Choose target creature", |game, _, candidate| {
            matches!(candidate, TargetRef::Permanent(id) if game.is_creature(id))
        })
    }

    pub fn creature_you_control() -> Self {
        TargetSpec::new(1, "Choose target creature you control", |game, you, candidate| {
            matches!(candidate, TargetRef::Permanent(id)
                if game.is_creature(id) && game.controller_of(id) == Some(you))
        })
    }

    pub fn player() -> Self {
        TargetSpec::new(1, "Choose target player", |_, _, candidate| {
            matches!(candidate, TargetRef::Player(_))
        })
    }

    pub fn opponent() -> Self {
        TargetSpec::new(1, "Choose target opponent", |_, you, candidate| {
            matches!(candidate, TargetRef::Player(p) if p != you)
        })
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// Evaluate only the filter (no zone or targetability checks)
    pub fn matches(&self, game: &GameState, controller: PlayerId, candidate: TargetRef) -> bool {
        (self.filter)(game, controller, candidate)
    }
}

impl fmt::Debug for TargetSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetSpec")
            .field("count", &self.count)
            .field("prompt", &self.prompt)
            .finish()
    }
}
