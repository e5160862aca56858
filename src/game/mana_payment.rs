//! Mana payment solver
//!
//! Pays a [`ManaCost`] out of a [`ManaPool`]. The fixed colored part is paid
//! greedily; the choice groups are solved by enumerating every combination of
//! alternatives and keeping the ones the pool can fully cover (the *valid
//! paths*). Groups on which all valid paths agree are settled automatically.
//! The rest, and any generic payment that could reasonably go more than one
//! way, are handed back to the caller as a [`PendingManaChoice`]. On commit
//! the fixed part and the settled groups are taken from the pool before the
//! choice is handed back.
//!
//! # Example
//!
//! ```ignore
//! let mut pool = ManaPool::new();
//! pool.add(Mana::of(Color::Red, 1) + Mana::of(Color::White, 1));
//! let cost = ManaCost::parse("{R/W}")?;
//!
//! match pool.pay(&cost, None, true) {
//!     PaymentOutcome::NeedsChoice(pending) => assert_eq!(pending.valid_paths.len(), 2),
//!     other => panic!("expected a choice, got {other:?}"),
//! }
//! ```

use crate::core::{Card, CardId, Color, Mana, ManaCost, ManaPool, PlayerId};
use crate::game::selection::SelectionKind;
use crate::game::GameState;
use crate::{MtgError, Result};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// One alternative index per choice group
pub type PaymentPath = SmallVec<[usize; 4]>;

/// Outcome of a payment attempt
///
/// `NeedsChoice` means the cost is affordable but the payer has to pick how;
/// it counts as success for affordability checks. The ambiguous groups and
/// the generic remainder stay in the pool until that choice has been made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOutcome {
    Paid,
    Failed,
    NeedsChoice(PendingManaChoice),
}

impl PaymentOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, PaymentOutcome::Failed)
    }
}

/// A choice group with more than one viable alternative
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmbiguousGroup {
    /// Index into `ManaCost::choices`
    pub group: usize,
    /// Alternative indices that appear in at least one valid path
    pub options: SmallVec<[usize; 2]>,
}

/// Everything needed to finish a payment once the payer has decided
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingManaChoice {
    pub cost: ManaCost,
    pub ambiguous: Vec<AmbiguousGroup>,
    /// Generic mana owed by the fixed part and the settled groups
    pub generic: u32,
    pub valid_paths: Vec<PaymentPath>,
    /// The fixed part and settled groups are already out of the pool
    pub committed: bool,
}

/// The payer's decision for a [`PendingManaChoice`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManaAnswer {
    /// Chosen alternative for each ambiguous group, in order
    pub alternatives: Vec<usize>,
    /// Exact mana to spend on generic; `None` lets the engine spend it
    /// colorless first, then white, blue, black, red, green
    pub generic: Option<Mana>,
}

impl ManaAnswer {
    pub fn auto(alternatives: impl IntoIterator<Item = usize>) -> Self {
        ManaAnswer {
            alternatives: alternatives.into_iter().collect(),
            generic: None,
        }
    }
}

/// Run the solver; see the module documentation
pub fn pay(pool: &mut ManaPool, cost: &ManaCost, card: Option<&Card>, commit: bool) -> PaymentOutcome {
    let mut work = pool.clone();

    if !work.take_exact(&cost.fixed.specific(), card) {
        return PaymentOutcome::Failed;
    }

    let paths = valid_paths(&work, cost, card);
    if paths.is_empty() {
        return PaymentOutcome::Failed;
    }

    let mut generic = cost.fixed.generic as u32;
    let mut ambiguous = Vec::new();
    for (group_index, group) in cost.choices.iter().enumerate() {
        let options = distinct_options(&paths, group_index);
        if let [only] = options.as_slice() {
            let alt = group.alternatives[*only];
            if !work.take_exact(&alt.specific(), card) {
                return PaymentOutcome::Failed;
            }
            generic += alt.generic as u32;
        } else {
            ambiguous.push(AmbiguousGroup {
                group: group_index,
                options,
            });
        }
    }

    let mut escalate = |work: ManaPool| {
        if commit {
            *pool = work;
        }
        PaymentOutcome::NeedsChoice(PendingManaChoice {
            cost: cost.clone(),
            ambiguous: ambiguous.clone(),
            generic,
            valid_paths: paths.clone(),
            committed: commit,
        })
    };

    if !ambiguous.is_empty() {
        return escalate(work);
    }
    let settled = work.clone();
    if !auto_generic(&mut work, generic, card) {
        return escalate(settled);
    }

    if commit {
        *pool = work;
    }
    PaymentOutcome::Paid
}

/// Every combination of alternatives the pool (after the fixed part) covers
///
/// Group 0 varies fastest. A cost without choice groups has exactly one,
/// empty, path; a group with no alternatives makes the cost unpayable.
pub fn valid_paths(pool: &ManaPool, cost: &ManaCost, card: Option<&Card>) -> Vec<PaymentPath> {
    let groups = &cost.choices;
    if groups.iter().any(|g| g.alternatives.is_empty()) {
        return Vec::new();
    }

    let mut paths = Vec::new();
    let mut indices: PaymentPath = SmallVec::from_elem(0, groups.len());
    loop {
        if path_is_payable(pool, cost, &indices, card) {
            paths.push(indices.clone());
        }

        // Odometer increment, least significant group first
        let mut position = 0;
        loop {
            if position == groups.len() {
                return paths;
            }
            indices[position] += 1;
            if indices[position] < groups[position].alternatives.len() {
                break;
            }
            indices[position] = 0;
            position += 1;
        }
    }
}

fn path_is_payable(pool: &ManaPool, cost: &ManaCost, path: &[usize], card: Option<&Card>) -> bool {
    let mut scratch = pool.clone();
    let mut generic = 0u32;
    for (group, &choice) in cost.choices.iter().zip(path) {
        let alt = group.alternatives[choice];
        if !scratch.take_exact(&alt.specific(), card) {
            return false;
        }
        generic += alt.generic as u32;
    }
    generic += cost.fixed.generic as u32;
    scratch.available(card).total() >= generic
}

fn distinct_options(paths: &[PaymentPath], group: usize) -> SmallVec<[usize; 2]> {
    let mut options: SmallVec<[usize; 2]> = SmallVec::new();
    for path in paths {
        if !options.contains(&path[group]) {
            options.push(path[group]);
        }
    }
    options.sort_unstable();
    options
}

/// Pay `amount` generic mana when there is only one sensible way to do it
///
/// That is the case when nothing is owed, when the eligible mana is exactly
/// the amount, when colorless alone covers it, or when only one kind of
/// mana is left.
fn auto_generic(pool: &mut ManaPool, amount: u32, card: Option<&Card>) -> bool {
    if amount == 0 {
        return true;
    }
    let available = pool.available(card);
    if available.total() < amount {
        return false;
    }
    if available.total() == amount {
        return pool.take_exact(&available, card);
    }
    if available.colorless >= amount {
        return pool.take(Color::Colorless, amount, card);
    }
    let kinds = available.kinds();
    if let [only] = kinds.as_slice() {
        return pool.take(*only, amount, card);
    }
    false
}

/// Spend generic mana in canonical order: colorless, then WUBRG
fn spend_canonical(pool: &mut ManaPool, amount: u32, card: Option<&Card>) -> bool {
    let available = pool.available(card);
    if available.total() < amount {
        return false;
    }
    let mut remaining = amount;
    for color in [
        Color::Colorless,
        Color::White,
        Color::Blue,
        Color::Black,
        Color::Red,
        Color::Green,
    ] {
        let used = remaining.min(available.get(color));
        if used > 0 && !pool.take(color, used, card) {
            return false;
        }
        remaining -= used;
    }
    remaining == 0
}

/// Finish a payment with the payer's answer
///
/// Returns false, leaving the pool untouched, when the answer does not name
/// a valid path or its generic mana is wrong or unaffordable.
pub fn complete_payment(
    pool: &mut ManaPool,
    pending: &PendingManaChoice,
    card: Option<&Card>,
    answer: &ManaAnswer,
) -> bool {
    let Some(first) = pending.valid_paths.first() else {
        return false;
    };
    if answer.alternatives.len() != pending.ambiguous.len() {
        return false;
    }

    let mut path = first.clone();
    for (group, &choice) in pending.ambiguous.iter().zip(&answer.alternatives) {
        path[group.group] = choice;
    }
    if !pending.valid_paths.contains(&path) {
        return false;
    }

    let cost = &pending.cost;
    let mut work = pool.clone();
    let mut generic = if pending.committed {
        pending.generic
    } else {
        if !work.take_exact(&cost.fixed.specific(), card) {
            return false;
        }
        cost.fixed.generic as u32
    };
    for (index, (group, &choice)) in cost.choices.iter().zip(&path).enumerate() {
        let settled = !pending.ambiguous.iter().any(|a| a.group == index);
        if pending.committed && settled {
            continue;
        }
        let alt = group.alternatives[choice];
        if !work.take_exact(&alt.specific(), card) {
            return false;
        }
        generic += alt.generic as u32;
    }

    let paid = match &answer.generic {
        Some(mana) => mana.total() == generic && work.take_exact(mana, card),
        None => auto_generic(&mut work, generic, card) || spend_canonical(&mut work, generic, card),
    };
    if paid {
        *pool = work;
    }
    paid
}

impl GameState {
    /// Pay `cost` from `player`'s pool, then run `on_paid`
    ///
    /// Returns `Ok(false)` when the cost cannot be paid. When the payment is
    /// ambiguous a generic-mana selection is registered and `on_paid` runs
    /// once the player answers it.
    pub fn pay_mana(
        &mut self,
        player: PlayerId,
        cost: &ManaCost,
        card: Option<CardId>,
        on_paid: impl FnOnce(&mut GameState) -> Result<()> + 'static,
    ) -> Result<bool> {
        let card_data = match card {
            Some(id) => Some(self.cards.get(id)?.clone()),
            None => None,
        };
        let outcome = {
            let pool = &mut self.get_player_mut(player)?.mana_pool;
            pool.pay(cost, card_data.as_ref(), true)
        };

        match outcome {
            PaymentOutcome::Failed => Ok(false),
            PaymentOutcome::Paid => {
                self.logger.verbose(&format!("{player} paid {cost}"));
                on_paid(self)?;
                Ok(true)
            }
            PaymentOutcome::NeedsChoice(pending) => {
                self.request_mana_choice(player, pending, card, on_paid)?;
                Ok(true)
            }
        }
    }

    /// Validate and apply a mana answer against `player`'s pool
    pub(crate) fn apply_mana_answer(
        &mut self,
        player: PlayerId,
        kind: &SelectionKind,
        answer: &ManaAnswer,
    ) -> Result<bool> {
        let SelectionKind::GenericMana { pending, card } = kind else {
            return Err(MtgError::InvalidAction(
                "mana answer for a non-mana selection".to_string(),
            ));
        };
        let card_data = match card {
            Some(id) => Some(self.cards.get(*id)?.clone()),
            None => None,
        };
        let pool = &mut self.get_player_mut(player)?.mana_pool;
        Ok(complete_payment(pool, pending, card_data.as_ref(), answer))
    }
}
