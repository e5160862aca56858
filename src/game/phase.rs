//! Turn phases, steps and per-turn bookkeeping

use crate::core::{CardId, Effect, PlayerId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Major phases of a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Beginning,
    PreCombatMain,
    Combat,
    PostCombatMain,
    Ending,
}

/// Specific steps within phases, in turn order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Step {
    // Beginning Phase
    Untap,
    Upkeep,
    Draw,

    // Pre-Combat Main Phase
    Main1,

    // Combat Phase
    DeclareAttackers,
    DeclareBlockers,
    CombatDamage,

    // Post-Combat Main Phase
    Main2,

    // Ending Phase
    End,
    Cleanup,
}

impl Step {
    pub const ALL: [Step; 10] = [
        Step::Untap,
        Step::Upkeep,
        Step::Draw,
        Step::Main1,
        Step::DeclareAttackers,
        Step::DeclareBlockers,
        Step::CombatDamage,
        Step::Main2,
        Step::End,
        Step::Cleanup,
    ];

    /// Get the phase this step belongs to
    pub fn phase(&self) -> Phase {
        match self {
            Step::Untap | Step::Upkeep | Step::Draw => Phase::Beginning,
            Step::Main1 => Phase::PreCombatMain,
            Step::DeclareAttackers | Step::DeclareBlockers | Step::CombatDamage => Phase::Combat,
            Step::Main2 => Phase::PostCombatMain,
            Step::End | Step::Cleanup => Phase::Ending,
        }
    }

    /// Position in the turn, 0 for untap
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Get the next step in turn order; `None` after cleanup
    pub fn next(&self) -> Option<Step> {
        Step::ALL.get(self.index() + 1).copied()
    }

    /// Steps that need no player input and advance on their own
    pub fn advances_automatically(&self) -> bool {
        matches!(
            self,
            Step::Untap | Step::Draw | Step::CombatDamage | Step::Cleanup
        )
    }

    /// Can a player cast a sorcery-speed spell in this step?
    pub fn is_sorcery_speed(&self) -> bool {
        matches!(self, Step::Main1 | Step::Main2)
    }
}

/// Per-player readiness for the current step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerFlags {
    /// Reset on every step change
    pub passed_priority: bool,
    /// Reset on every phase change
    pub ended_phase: bool,
    /// Reset when the turn changes
    pub ended_turn: bool,
}

impl PlayerFlags {
    pub fn is_done(&self) -> bool {
        self.passed_priority || self.ended_phase || self.ended_turn
    }
}

/// An effect waiting for a step to begin
#[derive(Debug, Clone)]
pub struct DelayedTrigger {
    pub step: Step,
    pub effect: Effect,
    pub source: CardId,
    pub controller: PlayerId,
}

/// Where the game is in the turn cycle
#[derive(Debug, Clone)]
pub struct TurnState {
    /// Current turn number (starts at 1)
    pub turn_number: u32,
    pub step: Step,
    pub active_player: PlayerId,
    /// Chosen during declare blockers; the only opponent in two-player games
    pub defending_player: Option<PlayerId>,
    pub delayed_triggers: Vec<DelayedTrigger>,
    pub flags: BTreeMap<PlayerId, PlayerFlags>,
}

impl TurnState {
    pub fn new(starting_player: PlayerId, players: impl IntoIterator<Item = PlayerId>) -> Self {
        TurnState {
            turn_number: 1,
            step: Step::Untap,
            active_player: starting_player,
            defending_player: None,
            delayed_triggers: Vec::new(),
            flags: players
                .into_iter()
                .map(|p| (p, PlayerFlags::default()))
                .collect(),
        }
    }

    pub fn current_phase(&self) -> Phase {
        self.step.phase()
    }

    pub fn flags(&self, player: PlayerId) -> PlayerFlags {
        self.flags.get(&player).copied().unwrap_or_default()
    }

    pub fn flags_mut(&mut self, player: PlayerId) -> &mut PlayerFlags {
        self.flags.entry(player).or_default()
    }

    pub fn clear_passed_priority(&mut self) {
        for flags in self.flags.values_mut() {
            flags.passed_priority = false;
        }
    }

    /// Move to `step`, resetting the flags that the change invalidates
    pub(crate) fn enter_step(&mut self, step: Step) {
        let phase_changed = step.phase() != self.step.phase();
        self.step = step;
        for flags in self.flags.values_mut() {
            flags.passed_priority = false;
            if phase_changed {
                flags.ended_phase = false;
            }
        }
    }

    /// Start a new turn for `next_player`
    pub(crate) fn next_turn(&mut self, next_player: PlayerId) {
        self.turn_number += 1;
        self.active_player = next_player;
        self.defending_player = None;
        for flags in self.flags.values_mut() {
            *flags = PlayerFlags::default();
        }
        self.step = Step::Untap;
    }

    /// Remove and return triggers waiting for `step`, in registration order
    pub(crate) fn take_delayed(&mut self, step: Step) -> Vec<DelayedTrigger> {
        let (due, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.delayed_triggers)
            .into_iter()
            .partition(|t| t.step == step);
        self.delayed_triggers = waiting;
        due
    }
}
