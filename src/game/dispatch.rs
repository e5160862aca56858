//! Interceptor dispatch
//!
//! Every rules query or action that abilities may rewrite goes through
//! [`GameState::dispatch_query`] or [`GameState::dispatch_action`]. Dispatch
//! starts from a base implementation and wraps it once for every matching
//! interceptor found on the battlefield:
//!
//! - permanents are visited player by player in seat order, each player's
//!   battlefield in arrival order;
//! - each permanent's abilities are visited temporary, then eternal, then
//!   base, with computed abilities expanded in place;
//! - a later-visited interceptor wraps the earlier composition, so it runs
//!   outermost.
//!
//! A wrapper receives the permanent that contributed it, the dispatch
//! arguments and the implementation it wraps. It may call through and adjust
//! the result, or answer on its own. With no matching interceptors the base
//! implementation runs unchanged.
//!
//! Hook discovery reads abilities *before* the `Abilities` operation is
//! applied, so an interceptor can never add or hide other interceptors.

use crate::core::{Ability, CardId, PlayerId, TargetRef, TypeList};
use crate::game::{GameState, PendingCast, Step};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

/// Operations that interceptors can wrap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    Power,
    Toughness,
    Types,
    Abilities,
    CanBeTargeted,
    CanAttack,
    CanBlock,
    Destroy,
    CombatDamage,
    ResolveCard,
    StepEntry,
}

/// Wrapper over a read-only query
pub type QueryHook<A, R> = Rc<dyn Fn(&GameState, CardId, &A, &dyn Fn(&GameState, &A) -> R) -> R>;

/// Wrapper over a game-mutating action
pub type ActionHook<A, R> =
    Rc<dyn Fn(&mut GameState, CardId, &A, &dyn Fn(&mut GameState, &A) -> R) -> R>;

/// Arguments of a `CanBeTargeted` check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetCheck {
    pub target: CardId,
    /// Spell or ability source doing the targeting
    pub source: Option<CardId>,
    /// Player controlling the targeting spell or ability
    pub controller: PlayerId,
}

/// Arguments of a `CanBlock` check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockCheck {
    pub blocker: CardId,
    pub attacker: CardId,
}

/// One assignment of combat damage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageEvent {
    pub source: CardId,
    pub target: TargetRef,
    pub amount: i32,
}

/// A tagged wrapping function contributed by an ability
#[derive(Clone)]
pub enum Interceptor {
    Power(QueryHook<CardId, i32>),
    Toughness(QueryHook<CardId, i32>),
    Types(QueryHook<CardId, TypeList>),
    Abilities(QueryHook<CardId, Vec<Ability>>),
    CanBeTargeted(QueryHook<TargetCheck, bool>),
    CanAttack(QueryHook<CardId, bool>),
    CanBlock(QueryHook<BlockCheck, bool>),
    Destroy(ActionHook<CardId, Result<bool>>),
    CombatDamage(ActionHook<DamageEvent, Result<()>>),
    ResolveCard(ActionHook<PendingCast, Result<()>>),
    StepEntry(ActionHook<Step, Result<()>>),
}

impl Interceptor {
    pub fn operation(&self) -> Operation {
        match self {
            Interceptor::Power(_) => Operation::Power,
            Interceptor::Toughness(_) => Operation::Toughness,
            Interceptor::Types(_) => Operation::Types,
            Interceptor::Abilities(_) => Operation::Abilities,
            Interceptor::CanBeTargeted(_) => Operation::CanBeTargeted,
            Interceptor::CanAttack(_) => Operation::CanAttack,
            Interceptor::CanBlock(_) => Operation::CanBlock,
            Interceptor::Destroy(_) => Operation::Destroy,
            Interceptor::CombatDamage(_) => Operation::CombatDamage,
            Interceptor::ResolveCard(_) => Operation::ResolveCard,
            Interceptor::StepEntry(_) => Operation::StepEntry,
        }
    }
}

impl fmt::Debug for Interceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Interceptor({:?})", self.operation())
    }
}

/// A dispatchable read-only operation
pub trait QueryPoint {
    type Args;
    type Output;
    const OPERATION: Operation;

    fn hook(interceptor: &Interceptor) -> Option<&QueryHook<Self::Args, Self::Output>>;
}

/// A dispatchable game-mutating operation
pub trait ActionPoint {
    type Args;
    type Output;
    const OPERATION: Operation;

    fn hook(interceptor: &Interceptor) -> Option<&ActionHook<Self::Args, Self::Output>>;
}

/// Declares a marker type for one operation, plus the matching
/// `Interceptor` constructor.
macro_rules! dispatch_point {
    ($trait:ident, $hook:ident, $marker:ident, $variant:ident, $ctor:ident, $args:ty, $out:ty, $game:ty) => {
        pub struct $marker;

        impl $trait for $marker {
            type Args = $args;
            type Output = $out;
            const OPERATION: Operation = Operation::$variant;

            fn hook(interceptor: &Interceptor) -> Option<&$hook<$args, $out>> {
                match interceptor {
                    Interceptor::$variant(hook) => Some(hook),
                    _ => None,
                }
            }
        }

        impl Interceptor {
            pub fn $ctor(
                f: impl Fn($game, CardId, &$args, &dyn Fn($game, &$args) -> $out) -> $out + 'static,
            ) -> Self {
                Interceptor::$variant(Rc::new(f))
            }
        }
    };
}

dispatch_point!(QueryPoint, QueryHook, PowerQuery, Power, power, CardId, i32, &GameState);
dispatch_point!(QueryPoint, QueryHook, ToughnessQuery, Toughness, toughness, CardId, i32, &GameState);
dispatch_point!(QueryPoint, QueryHook, TypesQuery, Types, types, CardId, TypeList, &GameState);
dispatch_point!(QueryPoint, QueryHook, AbilitiesQuery, Abilities, abilities, CardId, Vec<Ability>, &GameState);
dispatch_point!(QueryPoint, QueryHook, CanBeTargetedQuery, CanBeTargeted, can_be_targeted, TargetCheck, bool, &GameState);
dispatch_point!(QueryPoint, QueryHook, CanAttackQuery, CanAttack, can_attack, CardId, bool, &GameState);
dispatch_point!(QueryPoint, QueryHook, CanBlockQuery, CanBlock, can_block, BlockCheck, bool, &GameState);
dispatch_point!(ActionPoint, ActionHook, DestroyAction, Destroy, destroy, CardId, Result<bool>, &mut GameState);
dispatch_point!(ActionPoint, ActionHook, CombatDamageAction, CombatDamage, combat_damage, DamageEvent, Result<()>, &mut GameState);
dispatch_point!(ActionPoint, ActionHook, ResolveCardAction, ResolveCard, resolve_card, PendingCast, Result<()>, &mut GameState);
dispatch_point!(ActionPoint, ActionHook, StepEntryAction, StepEntry, step_entry, Step, Result<()>, &mut GameState);

impl GameState {
    /// Run a read-only operation through every matching interceptor
    pub fn dispatch_query<'a, Q: QueryPoint>(
        &'a self,
        args: &Q::Args,
        base: impl Fn(&GameState, &Q::Args) -> Q::Output + 'a,
    ) -> Q::Output
    where
        Q::Args: 'a,
        Q::Output: 'a,
    {
        let hooks = self.collect_hooks(|i| Q::hook(i).cloned());
        if hooks.is_empty() {
            return base(self, args);
        }

        let mut composed: Box<dyn Fn(&GameState, &Q::Args) -> Q::Output + 'a> = Box::new(base);
        for (source, hook) in hooks {
            let inner = composed;
            composed = Box::new(move |game: &GameState, a: &Q::Args| hook(game, source, a, &*inner));
        }
        composed(self, args)
    }

    /// Run a game-mutating operation through every matching interceptor
    ///
    /// The set of interceptors is fixed when dispatch starts; permanents that
    /// enter or leave while the composition runs do not change it.
    pub fn dispatch_action<'a, A: ActionPoint>(
        &mut self,
        args: &A::Args,
        base: impl Fn(&mut GameState, &A::Args) -> A::Output + 'a,
    ) -> A::Output
    where
        A::Args: 'a,
        A::Output: 'a,
    {
        let hooks = self.collect_hooks(|i| A::hook(i).cloned());
        if hooks.is_empty() {
            return base(self, args);
        }

        let mut composed: Box<dyn Fn(&mut GameState, &A::Args) -> A::Output + 'a> = Box::new(base);
        for (source, hook) in hooks {
            let inner = composed;
            composed =
                Box::new(move |game: &mut GameState, a: &A::Args| hook(game, source, a, &*inner));
        }
        composed(self, args)
    }

    /// Every permanent, in dispatch order
    pub fn battlefield_order(&self) -> Vec<CardId> {
        self.player_zones
            .iter()
            .flat_map(|(_, zones)| zones.battlefield.cards.iter().copied())
            .collect()
    }

    fn collect_hooks<H>(&self, extract: impl Fn(&Interceptor) -> Option<H>) -> Vec<(CardId, H)> {
        let mut hooks = Vec::new();
        for id in self.battlefield_order() {
            for ability in self.raw_abilities(id) {
                if let Ability::Interceptor(interceptor) = &ability {
                    if let Some(hook) = extract(interceptor) {
                        hooks.push((id, hook));
                    }
                }
            }
        }
        hooks
    }

    /// Temporary, eternal and base abilities with computed ones expanded
    ///
    /// This is the list before the `Abilities` operation is applied.
    pub fn raw_abilities(&self, id: CardId) -> Vec<Ability> {
        let Some(permanent) = self.permanents.get(&id) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for ability in permanent
            .temporary_abilities
            .iter()
            .chain(&permanent.eternal_abilities)
            .chain(&permanent.base_abilities)
        {
            self.expand_ability(id, ability, &mut out);
        }
        out
    }

    fn expand_ability(&self, id: CardId, ability: &Ability, out: &mut Vec<Ability>) {
        match ability {
            Ability::Computed(compute) => {
                let key = (id, Rc::as_ptr(compute) as *const () as usize);
                let seen = self.expansions.borrow().get(&key).cloned();
                match seen {
                    // Re-entered while expanding itself
                    Some(None) => return,
                    Some(Some(produced)) => {
                        out.extend(produced);
                        return;
                    }
                    None => {}
                }

                let depth = self.expansion_depth.get();
                if depth >= self.config.computed_depth_limit {
                    return;
                }
                self.expansions.borrow_mut().insert(key, None);
                self.expansion_depth.set(depth + 1);
                let mut expanded = Vec::new();
                for inner in &compute(self, id) {
                    self.expand_ability(id, inner, &mut expanded);
                }
                self.expansion_depth.set(depth);

                if depth == 0 {
                    self.expansions.borrow_mut().clear();
                } else {
                    self.expansions
                        .borrow_mut()
                        .insert(key, Some(expanded.clone()));
                }
                out.extend(expanded);
            }
            other => out.push(other.clone()),
        }
    }
}
