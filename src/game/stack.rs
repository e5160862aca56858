//! The resolution stack
//!
//! Entries resolve last-in, first-out and strictly one at a time. Automatic
//! resolution only happens through [`GameState::resolve_if_ready`], which
//! stops as soon as a player still wants priority or a selection is open.

use crate::core::{CardId, Effect, PlayerId, Targets};
use crate::game::GameState;
use crate::Result;

/// A spell waiting to resolve
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCast {
    pub card: CardId,
    pub controller: PlayerId,
    pub targets: Targets,
}

/// An ability or delayed trigger waiting to resolve
#[derive(Debug, Clone)]
pub struct PendingEffect {
    pub effect: Effect,
    /// Permanent the effect comes from and applies to
    pub source: CardId,
    pub controller: PlayerId,
    pub targets: Targets,
    pub description: String,
}

#[derive(Debug, Clone)]
pub enum StackEntry {
    Cast(PendingCast),
    Effect(PendingEffect),
}

impl StackEntry {
    pub fn controller(&self) -> PlayerId {
        match self {
            StackEntry::Cast(cast) => cast.controller,
            StackEntry::Effect(effect) => effect.controller,
        }
    }

    pub fn targets(&self) -> &Targets {
        match self {
            StackEntry::Cast(cast) => &cast.targets,
            StackEntry::Effect(effect) => &effect.targets,
        }
    }
}

/// LIFO queue of pending spells and abilities
#[derive(Debug, Clone, Default)]
pub struct Stack {
    entries: Vec<StackEntry>,
}

impl Stack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: StackEntry) {
        self.entries.push(entry);
    }

    pub fn pop(&mut self) -> Option<StackEntry> {
        self.entries.pop()
    }

    /// Most recent entry (the next to resolve)
    pub fn top(&self) -> Option<&StackEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bottom to top
    pub fn iter(&self) -> std::slice::Iter<'_, StackEntry> {
        self.entries.iter()
    }

    /// Is this card on the stack as a spell?
    pub fn contains_card(&self, card: CardId) -> bool {
        self.entries
            .iter()
            .any(|e| matches!(e, StackEntry::Cast(cast) if cast.card == card))
    }
}

impl GameState {
    /// Every player still in the game has passed, ended their phase or
    /// ended their turn
    pub fn all_players_done(&self) -> bool {
        self.players
            .iter()
            .filter(|p| p.is_alive())
            .all(|p| self.turn.flags(p.id).is_done())
    }

    /// The stack may resolve its top entry
    pub fn stack_ready(&self) -> bool {
        !self.stack.is_empty() && !self.has_pending_selection() && self.all_players_done()
    }

    /// Put an entry on the stack
    pub fn push_stack(&mut self, entry: StackEntry) {
        let description = self.describe_entry(&entry);
        self.logger.event(
            crate::game::VerbosityLevel::Verbose,
            "stack",
            &format!("push {description}"),
        );
        self.stack.push(entry);
    }

    /// Resolve the top entry, then run the state-based check
    ///
    /// Returns `Ok(false)` when the stack is empty.
    pub fn resolve_next(&mut self) -> Result<bool> {
        let Some(entry) = self.stack.pop() else {
            return Ok(false);
        };
        let description = self.describe_entry(&entry);
        self.logger.event(
            crate::game::VerbosityLevel::Normal,
            "stack",
            &format!("resolve {description}"),
        );
        self.resolve_entry(entry)?;
        self.check_state_based_actions()?;
        Ok(true)
    }

    /// Resolve entries while the stack is ready
    ///
    /// At most `config.max_auto_resolve` entries resolve per call; anything
    /// left waits for the next call. Returns how many resolved.
    pub fn resolve_if_ready(&mut self) -> Result<usize> {
        let mut resolved = 0;
        while resolved < self.config.max_auto_resolve && self.stack_ready() {
            if !self.resolve_next()? {
                break;
            }
            resolved += 1;
        }
        Ok(resolved)
    }

    pub fn describe_entry(&self, entry: &StackEntry) -> String {
        match entry {
            StackEntry::Cast(cast) => self.card_name(cast.card),
            StackEntry::Effect(effect) => {
                format!("{} ({})", effect.description, self.card_name(effect.source))
            }
        }
    }
}
