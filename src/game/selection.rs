//! Request/continuation protocol for player choices
//!
//! When the engine needs a decision it records a [`PendingSelection`] for the
//! deciding player and returns. Nothing else happens to the game until
//! [`GameState::answer_selection`] is called with a valid answer, at which
//! point the stored continuation runs. While any selection is outstanding
//! the stack does not resolve and the turn does not advance.
//!
//! Each player has at most one outstanding request. Asking again is a
//! content bug and is reported as `MtgError::SelectionPending`.

use crate::core::{CardId, PlayerId, TargetRef, TargetSpec, Targets};
use crate::game::mana_payment::{ManaAnswer, PendingManaChoice};
use crate::game::GameState;
use crate::{MtgError, Result};
use std::fmt;
use std::rc::Rc;

/// Validator for a single candidate target
pub type TargetValidator = Rc<dyn Fn(&GameState, TargetRef) -> bool>;

/// What happens once a selection has been answered
pub type Continuation = Box<dyn FnOnce(&mut GameState, SelectionAnswer) -> Result<()>>;

/// A request to choose targets
#[derive(Clone)]
pub struct TargetRequest {
    pub prompt: String,
    /// Spell or ability doing the choosing
    pub source: Option<CardId>,
    /// Legal candidates when the request was made, in a stable order
    pub candidates: Vec<TargetRef>,
    /// Number of distinct targets to pick
    pub count: usize,
    validate: TargetValidator,
}

impl TargetRequest {
    /// Build a request from a validator, listing every candidate it accepts
    ///
    /// Candidates are players in seat order, then permanents in dispatch
    /// order. With `limit_to_one` exactly one target is picked.
    pub fn new(
        game: &GameState,
        prompt: impl Into<String>,
        source: Option<CardId>,
        count: usize,
        limit_to_one: bool,
        validate: impl Fn(&GameState, TargetRef) -> bool + 'static,
    ) -> Self {
        let validate: TargetValidator = Rc::new(validate);
        let candidates = game
            .all_target_refs()
            .into_iter()
            .filter(|&t| validate(game, t))
            .collect();
        TargetRequest {
            prompt: prompt.into(),
            source,
            candidates,
            count: if limit_to_one { 1 } else { count },
            validate,
        }
    }

    /// Request for a spell or ability's target requirement
    pub fn for_spec(
        game: &GameState,
        spec: &TargetSpec,
        controller: PlayerId,
        source: Option<CardId>,
    ) -> Self {
        let spec = spec.clone();
        let prompt = spec.prompt.clone();
        let count = spec.count;
        TargetRequest::new(game, prompt, source, count, false, move |game, candidate| {
            game.is_legal_target(&spec, controller, source, candidate)
        })
    }

    /// Enough legal candidates exist
    pub fn is_feasible(&self) -> bool {
        self.candidates.len() >= self.count
    }

    pub fn accepts(&self, game: &GameState, answer: &[TargetRef]) -> bool {
        if answer.len() != self.count {
            return false;
        }
        let distinct = answer
            .iter()
            .enumerate()
            .all(|(i, t)| !answer[..i].contains(t));
        distinct && answer.iter().all(|&t| (self.validate)(game, t))
    }
}

impl fmt::Debug for TargetRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetRequest")
            .field("prompt", &self.prompt)
            .field("source", &self.source)
            .field("candidates", &self.candidates)
            .field("count", &self.count)
            .finish()
    }
}

/// The kinds of question the engine can ask
#[derive(Debug, Clone)]
pub enum SelectionKind {
    Targets(TargetRequest),
    /// Pick `how_many` distinct options; the answer order is meaningful
    Options {
        descriptions: Vec<String>,
        how_many: usize,
    },
    /// Finish an ambiguous mana payment
    GenericMana {
        pending: PendingManaChoice,
        card: Option<CardId>,
    },
}

/// A player's answer to a [`SelectionKind`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionAnswer {
    Targets(Targets),
    Options(Vec<usize>),
    Mana(ManaAnswer),
}

/// An outstanding request
pub struct PendingSelection {
    pub player: PlayerId,
    pub prompt: String,
    pub kind: SelectionKind,
    continuation: Continuation,
}

impl PendingSelection {
    /// The answer a player who does not care would give
    pub fn default_answer(&self) -> SelectionAnswer {
        match &self.kind {
            SelectionKind::Targets(request) => {
                SelectionAnswer::Targets(request.candidates.iter().take(request.count).copied().collect())
            }
            SelectionKind::Options { how_many, .. } => SelectionAnswer::Options((0..*how_many).collect()),
            SelectionKind::GenericMana { pending, .. } => SelectionAnswer::Mana(ManaAnswer::auto(
                pending
                    .ambiguous
                    .iter()
                    .map(|g| g.options.first().copied().unwrap_or(0)),
            )),
        }
    }
}

impl fmt::Debug for PendingSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingSelection")
            .field("player", &self.player)
            .field("prompt", &self.prompt)
            .field("kind", &self.kind)
            .finish()
    }
}

fn mismatch() -> MtgError {
    MtgError::InvalidAction("selection answered with the wrong kind of answer".to_string())
}

impl GameState {
    /// Ask `player` to choose targets
    ///
    /// Returns `Ok(false)` when not enough legal candidates exist; nothing
    /// is recorded in that case.
    pub fn request_targets(
        &mut self,
        player: PlayerId,
        request: TargetRequest,
        then: impl FnOnce(&mut GameState, Targets) -> Result<()> + 'static,
    ) -> Result<bool> {
        if !request.is_feasible() {
            return Ok(false);
        }
        let prompt = request.prompt.clone();
        self.register_selection(
            player,
            prompt,
            SelectionKind::Targets(request),
            Box::new(move |game, answer| match answer {
                SelectionAnswer::Targets(targets) => then(game, targets),
                _ => Err(mismatch()),
            }),
        )?;
        Ok(true)
    }

    /// Ask `player` to pick `how_many` distinct options
    pub fn request_options(
        &mut self,
        player: PlayerId,
        prompt: impl Into<String>,
        descriptions: Vec<String>,
        how_many: usize,
        then: impl FnOnce(&mut GameState, Vec<usize>) -> Result<()> + 'static,
    ) -> Result<bool> {
        if how_many > descriptions.len() {
            return Ok(false);
        }
        self.register_selection(
            player,
            prompt.into(),
            SelectionKind::Options {
                descriptions,
                how_many,
            },
            Box::new(move |game, answer| match answer {
                SelectionAnswer::Options(chosen) => then(game, chosen),
                _ => Err(mismatch()),
            }),
        )?;
        Ok(true)
    }

    /// Ask `player` how to finish an ambiguous mana payment
    ///
    /// The payment itself is applied when the answer is accepted; `on_paid`
    /// runs afterwards.
    pub fn request_mana_choice(
        &mut self,
        player: PlayerId,
        pending: PendingManaChoice,
        card: Option<CardId>,
        on_paid: impl FnOnce(&mut GameState) -> Result<()> + 'static,
    ) -> Result<bool> {
        let prompt = format!("Choose how to pay {}", pending.cost);
        self.register_selection(
            player,
            prompt,
            SelectionKind::GenericMana { pending, card },
            Box::new(move |game, answer| match answer {
                SelectionAnswer::Mana(_) => on_paid(game),
                _ => Err(mismatch()),
            }),
        )?;
        Ok(true)
    }

    fn register_selection(
        &mut self,
        player: PlayerId,
        prompt: String,
        kind: SelectionKind,
        continuation: Continuation,
    ) -> Result<()> {
        if self.selections.contains_key(&player) {
            return Err(MtgError::SelectionPending(player.as_u32()));
        }
        self.logger.event(
            crate::game::VerbosityLevel::Verbose,
            "selection",
            &format!("{player}: {prompt}"),
        );
        self.selections.insert(
            player,
            PendingSelection {
                player,
                prompt,
                kind,
                continuation,
            },
        );
        Ok(())
    }

    /// Answer `player`'s outstanding selection
    ///
    /// An answer that fails validation returns `Ok(false)` and leaves the
    /// request outstanding. A valid answer removes the request, then runs
    /// its continuation.
    pub fn answer_selection(&mut self, player: PlayerId, answer: SelectionAnswer) -> Result<bool> {
        let pending = self
            .selections
            .remove(&player)
            .ok_or(MtgError::NoPendingSelection(player.as_u32()))?;

        let accepted = match (&pending.kind, &answer) {
            (SelectionKind::Targets(request), SelectionAnswer::Targets(targets)) => {
                request.accepts(self, targets)
            }
            (
                SelectionKind::Options {
                    descriptions,
                    how_many,
                },
                SelectionAnswer::Options(chosen),
            ) => {
                chosen.len() == *how_many
                    && chosen.iter().all(|&i| i < descriptions.len())
                    && chosen
                        .iter()
                        .enumerate()
                        .all(|(i, c)| !chosen[..i].contains(c))
            }
            (kind @ SelectionKind::GenericMana { .. }, SelectionAnswer::Mana(mana)) => {
                self.apply_mana_answer(player, kind, mana)?
            }
            _ => false,
        };

        if !accepted {
            self.selections.insert(player, pending);
            return Ok(false);
        }
        (pending.continuation)(self, answer)?;
        Ok(true)
    }

    pub fn pending_selection(&self, player: PlayerId) -> Option<&PendingSelection> {
        self.selections.get(&player)
    }

    pub fn has_pending_selection(&self) -> bool {
        !self.selections.is_empty()
    }

    /// Players with an outstanding request, in id order
    pub fn players_with_selection(&self) -> Vec<PlayerId> {
        self.selections.keys().copied().collect()
    }

    /// Every player still in the game and every permanent, as targets
    pub fn all_target_refs(&self) -> Vec<TargetRef> {
        self.players
            .iter()
            .filter(|p| p.is_alive())
            .map(|p| TargetRef::Player(p.id))
            .chain(self.battlefield_order().into_iter().map(TargetRef::Permanent))
            .collect()
    }
}
