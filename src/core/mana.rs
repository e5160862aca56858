//! Mana: colors, cost specifications and the player's mana pool

use crate::core::Card;
use crate::game::mana_payment::{self, PaymentOutcome};
use crate::Result;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::ops::{Add, AddAssign};
use std::rc::Rc;
use std::str::FromStr;

/// Mana colors (plus colorless, which behaves like a sixth kind of mana)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Color {
    White,
    Blue,
    Black,
    Red,
    Green,
    Colorless,
}

impl Color {
    /// WUBRG order followed by colorless
    pub const ALL: [Color; 6] = [
        Color::White,
        Color::Blue,
        Color::Black,
        Color::Red,
        Color::Green,
        Color::Colorless,
    ];

    pub fn symbol(self) -> char {
        match self {
            Color::White => 'W',
            Color::Blue => 'U',
            Color::Black => 'B',
            Color::Red => 'R',
            Color::Green => 'G',
            Color::Colorless => 'C',
        }
    }

    pub fn from_symbol(c: char) -> Option<Color> {
        match c.to_ascii_uppercase() {
            'W' => Some(Color::White),
            'U' => Some(Color::Blue),
            'B' => Some(Color::Black),
            'R' => Some(Color::Red),
            'G' => Some(Color::Green),
            'C' => Some(Color::Colorless),
            _ => None,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// An amount of actual mana, per color
///
/// Copy-eligible: six u32 counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Mana {
    pub white: u32,
    pub blue: u32,
    pub black: u32,
    pub red: u32,
    pub green: u32,
    pub colorless: u32,
}

impl Mana {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn of(color: Color, amount: u32) -> Self {
        let mut mana = Mana::new();
        *mana.get_mut(color) = amount;
        mana
    }

    pub fn get(&self, color: Color) -> u32 {
        match color {
            Color::White => self.white,
            Color::Blue => self.blue,
            Color::Black => self.black,
            Color::Red => self.red,
            Color::Green => self.green,
            Color::Colorless => self.colorless,
        }
    }

    pub fn get_mut(&mut self, color: Color) -> &mut u32 {
        match color {
            Color::White => &mut self.white,
            Color::Blue => &mut self.blue,
            Color::Black => &mut self.black,
            Color::Red => &mut self.red,
            Color::Green => &mut self.green,
            Color::Colorless => &mut self.colorless,
        }
    }

    pub fn add_color(&mut self, color: Color, amount: u32) {
        let slot = self.get_mut(color);
        *slot = slot.saturating_add(amount);
    }

    pub fn total(&self) -> u32 {
        Color::ALL.iter().map(|&c| self.get(c)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// True if every color in `other` is covered by this amount
    pub fn contains(&self, other: &Mana) -> bool {
        Color::ALL.iter().all(|&c| self.get(c) >= other.get(c))
    }

    /// Colors present in a nonzero amount, in WUBRG-then-colorless order
    pub fn kinds(&self) -> SmallVec<[Color; 6]> {
        Color::ALL
            .iter()
            .copied()
            .filter(|&c| self.get(c) > 0)
            .collect()
    }
}

impl Add for Mana {
    type Output = Mana;

    fn add(mut self, rhs: Mana) -> Mana {
        self += rhs;
        self
    }
}

impl AddAssign for Mana {
    fn add_assign(&mut self, rhs: Mana) {
        for color in Color::ALL {
            self.add_color(color, rhs.get(color));
        }
    }
}

impl fmt::Display for Mana {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "(none)");
        }
        for color in Color::ALL {
            for _ in 0..self.get(color) {
                write!(f, "{}", color.symbol())?;
            }
        }
        Ok(())
    }
}

/// A requirement: some generic mana plus specific amounts of each color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ManaSymbols {
    pub generic: u8,
    pub white: u8,
    pub blue: u8,
    pub black: u8,
    pub red: u8,
    pub green: u8,
    pub colorless: u8,
}

impl ManaSymbols {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generic(amount: u8) -> Self {
        ManaSymbols {
            generic: amount,
            ..Self::default()
        }
    }

    pub fn of(color: Color, amount: u8) -> Self {
        let mut symbols = ManaSymbols::new();
        *symbols.color_mut(color) = amount;
        symbols
    }

    fn color(&self, color: Color) -> u8 {
        match color {
            Color::White => self.white,
            Color::Blue => self.blue,
            Color::Black => self.black,
            Color::Red => self.red,
            Color::Green => self.green,
            Color::Colorless => self.colorless,
        }
    }

    fn color_mut(&mut self, color: Color) -> &mut u8 {
        match color {
            Color::White => &mut self.white,
            Color::Blue => &mut self.blue,
            Color::Black => &mut self.black,
            Color::Red => &mut self.red,
            Color::Green => &mut self.green,
            Color::Colorless => &mut self.colorless,
        }
    }

    /// The non-generic part (what must be paid with exactly these colors)
    pub fn specific(&self) -> Mana {
        Mana {
            white: self.white.into(),
            blue: self.blue.into(),
            black: self.black.into(),
            red: self.red.into(),
            green: self.green.into(),
            colorless: self.colorless.into(),
        }
    }

    pub fn total(&self) -> u32 {
        self.generic as u32 + self.specific().total()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Compact form used inside hybrid braces, e.g. `2` or `R` or `1G`
    fn write_compact(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let specific = self.specific();
        if self.generic > 0 || specific.is_empty() {
            write!(f, "{}", self.generic)?;
        }
        if !specific.is_empty() {
            write!(f, "{specific}")?;
        }
        Ok(())
    }
}

impl Add for ManaSymbols {
    type Output = ManaSymbols;

    fn add(mut self, rhs: ManaSymbols) -> ManaSymbols {
        self += rhs;
        self
    }
}

impl AddAssign for ManaSymbols {
    fn add_assign(&mut self, rhs: ManaSymbols) {
        self.generic = self.generic.saturating_add(rhs.generic);
        for color in Color::ALL {
            let slot = self.color_mut(color);
            *slot = slot.saturating_add(rhs.color(color));
        }
    }
}

impl fmt::Display for ManaSymbols {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.generic > 0 {
            write!(f, "{{{}}}", self.generic)?;
        }
        for color in Color::ALL {
            for _ in 0..self.specific().get(color) {
                write!(f, "{{{}}}", color.symbol())?;
            }
        }
        Ok(())
    }
}

/// A set of alternative requirements; exactly one of them is paid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceGroup {
    pub alternatives: SmallVec<[ManaSymbols; 2]>,
}

impl ChoiceGroup {
    pub fn new(alternatives: impl IntoIterator<Item = ManaSymbols>) -> Self {
        ChoiceGroup {
            alternatives: alternatives.into_iter().collect(),
        }
    }

    /// Largest alternative, used for mana value
    pub fn max_value(&self) -> u32 {
        self.alternatives.iter().map(|a| a.total()).max().unwrap_or(0)
    }
}

impl fmt::Display for ChoiceGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, alt) in self.alternatives.iter().enumerate() {
            if i > 0 {
                write!(f, "/")?;
            }
            alt.write_compact(f)?;
        }
        write!(f, "}}")
    }
}

/// A mana cost: a fixed requirement plus zero or more choice groups
///
/// `{2}{R/W}{G}` is a fixed `{2}{G}` with one group `[{R}, {W}]`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ManaCost {
    pub fixed: ManaSymbols,
    pub choices: SmallVec<[ChoiceGroup; 2]>,
}

impl ManaCost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_symbols(fixed: ManaSymbols) -> Self {
        ManaCost {
            fixed,
            choices: SmallVec::new(),
        }
    }

    /// Parse brace notation (`{2}{R/W}{G}`) or the bare shorthand (`2RG`)
    pub fn parse(s: &str) -> Result<Self> {
        crate::core::cost_parser::parse_mana_cost(s)
    }

    /// Add a choice group to this cost
    pub fn with_choice(mut self, alternatives: impl IntoIterator<Item = ManaSymbols>) -> Self {
        self.choices.push(ChoiceGroup::new(alternatives));
        self
    }

    /// Mana value: the fixed total plus the largest alternative of each group
    pub fn value(&self) -> u32 {
        self.fixed.total() + self.choices.iter().map(|g| g.max_value()).sum::<u32>()
    }

    pub fn is_free(&self) -> bool {
        self.fixed.is_empty() && self.choices.is_empty()
    }
}

impl FromStr for ManaCost {
    type Err = crate::MtgError;

    fn from_str(s: &str) -> Result<Self> {
        ManaCost::parse(s)
    }
}

impl fmt::Display for ManaCost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_free() {
            return write!(f, "{{0}}");
        }
        if self.fixed.generic > 0 {
            write!(f, "{{{}}}", self.fixed.generic)?;
        }
        for group in &self.choices {
            write!(f, "{group}")?;
        }
        write!(
            f,
            "{}",
            ManaSymbols {
                generic: 0,
                ..self.fixed
            }
        )
    }
}

/// Predicate limiting which cards a batch of mana may be spent on
#[derive(Clone)]
pub struct SpendRestriction {
    description: String,
    allows: Rc<dyn Fn(&Card) -> bool>,
}

impl SpendRestriction {
    pub fn new(description: impl Into<String>, allows: impl Fn(&Card) -> bool + 'static) -> Self {
        SpendRestriction {
            description: description.into(),
            allows: Rc::new(allows),
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Restricted mana is never spendable on a payment with no card attached
    pub fn allows(&self, card: Option<&Card>) -> bool {
        card.is_some_and(|c| (self.allows)(c))
    }
}

impl fmt::Debug for SpendRestriction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SpendRestriction").field(&self.description).finish()
    }
}

/// One addition of mana to a pool, with its spend rules
#[derive(Debug, Clone)]
pub struct ManaBatch {
    pub mana: Mana,
    pub restriction: Option<SpendRestriction>,
    /// Survives the drain at phase changes
    pub persistent: bool,
}

impl ManaBatch {
    pub fn new(mana: Mana) -> Self {
        ManaBatch {
            mana,
            restriction: None,
            persistent: false,
        }
    }

    pub fn restricted(mana: Mana, restriction: SpendRestriction) -> Self {
        ManaBatch {
            mana,
            restriction: Some(restriction),
            persistent: false,
        }
    }

    pub fn persistent(mut self) -> Self {
        self.persistent = true;
        self
    }

    pub fn usable_for(&self, card: Option<&Card>) -> bool {
        match &self.restriction {
            None => true,
            Some(restriction) => restriction.allows(card),
        }
    }
}

/// Mana pool for a player: an ordered list of batches
#[derive(Debug, Clone, Default)]
pub struct ManaPool {
    batches: Vec<ManaBatch>,
}

impl ManaPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add unrestricted, non-persistent mana
    pub fn add(&mut self, mana: Mana) {
        if mana.is_empty() {
            return;
        }
        if let Some(batch) = self
            .batches
            .iter_mut()
            .find(|b| b.restriction.is_none() && !b.persistent)
        {
            batch.mana += mana;
        } else {
            self.batches.push(ManaBatch::new(mana));
        }
    }

    pub fn add_color(&mut self, color: Color) {
        self.add(Mana::of(color, 1));
    }

    pub fn add_batch(&mut self, batch: ManaBatch) {
        if !batch.mana.is_empty() {
            self.batches.push(batch);
        }
    }

    pub fn batches(&self) -> &[ManaBatch] {
        &self.batches
    }

    /// All mana in the pool regardless of restrictions
    pub fn contents(&self) -> Mana {
        self.batches
            .iter()
            .fold(Mana::new(), |acc, b| acc + b.mana)
    }

    pub fn total(&self) -> u32 {
        self.contents().total()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Mana that may be spent on `card`
    pub fn available(&self, card: Option<&Card>) -> Mana {
        self.batches
            .iter()
            .filter(|b| b.usable_for(card))
            .fold(Mana::new(), |acc, b| acc + b.mana)
    }

    /// Remove `amount` of `color` from batches usable for `card`
    ///
    /// Restricted batches are spent before unrestricted ones. Returns false
    /// (leaving the pool untouched) if not enough is available.
    pub(crate) fn take(&mut self, color: Color, amount: u32, card: Option<&Card>) -> bool {
        if self.available(card).get(color) < amount {
            return false;
        }
        let mut remaining = amount;
        let mut order: Vec<usize> = (0..self.batches.len()).collect();
        order.sort_by_key(|&i| self.batches[i].restriction.is_none());
        for i in order {
            if remaining == 0 {
                break;
            }
            let batch = &mut self.batches[i];
            if !batch.usable_for(card) {
                continue;
            }
            let slot = batch.mana.get_mut(color);
            let used = remaining.min(*slot);
            *slot -= used;
            remaining -= used;
        }
        self.batches.retain(|b| !b.mana.is_empty());
        true
    }

    /// Remove exactly `mana` (per color) from batches usable for `card`
    pub(crate) fn take_exact(&mut self, mana: &Mana, card: Option<&Card>) -> bool {
        if !self.available(card).contains(mana) {
            return false;
        }
        for color in Color::ALL {
            let amount = mana.get(color);
            if amount > 0 && !self.take(color, amount, card) {
                return false;
            }
        }
        true
    }

    /// Empty all non-persistent mana (phase change / end of turn)
    pub fn drain(&mut self) {
        self.batches.retain(|b| b.persistent && !b.mana.is_empty());
    }

    pub fn clear(&mut self) {
        self.batches.clear();
    }

    /// Run the payment solver against this pool
    ///
    /// With `commit == false` the pool is left exactly as it was.
    pub fn pay(&mut self, cost: &ManaCost, card: Option<&Card>, commit: bool) -> PaymentOutcome {
        mana_payment::pay(self, cost, card, commit)
    }

    /// Whether `cost` is affordable (possibly after a choice) for `card`
    pub fn can_pay(&self, cost: &ManaCost, card: Option<&Card>) -> bool {
        let mut scratch = self.clone();
        scratch.pay(cost, card, false).is_success()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mana_value_counts_largest_alternative() {
        let cost = ManaCost::from_symbols(ManaSymbols::generic(2)).with_choice([
            ManaSymbols::of(Color::Red, 1),
            ManaSymbols::generic(2),
        ]);
        assert_eq!(cost.value(), 4);
        assert_eq!(ManaCost::new().value(), 0);
    }

    #[test]
    fn test_cost_display() {
        let cost = ManaCost::from_symbols(ManaSymbols::generic(2) + ManaSymbols::of(Color::Green, 1))
            .with_choice([ManaSymbols::of(Color::Red, 1), ManaSymbols::of(Color::White, 1)]);
        assert_eq!(cost.to_string(), "{2}{R/W}{G}");
        assert_eq!(ManaCost::new().to_string(), "{0}");
    }

    #[test]
    fn test_mana_arithmetic() {
        let mut mana = Mana::of(Color::Red, 2);
        mana += Mana::of(Color::Blue, 1);
        assert_eq!(mana.total(), 3);
        assert!(mana.contains(&Mana::of(Color::Red, 2)));
        assert!(!mana.contains(&Mana::of(Color::Red, 3)));
        assert_eq!(mana.kinds().as_slice(), &[Color::Blue, Color::Red]);
        assert_eq!(mana.to_string(), "URR");
    }

    #[test]
    fn test_large_amounts_are_not_capped() {
        let mut pool = ManaPool::new();
        pool.add(Mana::of(Color::Red, 200));
        pool.add(Mana::of(Color::Red, 200));
        assert_eq!(pool.contents().red, 400);

        assert_eq!(pool.pay(&ManaCost::parse("{R}").unwrap(), None, true), PaymentOutcome::Paid);
        assert_eq!(pool.total(), 399);
    }

    #[test]
    fn test_pool_add_merges_plain_mana() {
        let mut pool = ManaPool::new();
        pool.add_color(Color::Red);
        pool.add_color(Color::Red);
        pool.add_color(Color::Green);
        assert_eq!(pool.batches().len(), 1);
        assert_eq!(pool.contents().red, 2);
        assert_eq!(pool.total(), 3);
    }

    #[test]
    fn test_drain_keeps_persistent_batches() {
        let mut pool = ManaPool::new();
        pool.add(Mana::of(Color::Red, 2));
        pool.add_batch(ManaBatch::new(Mana::of(Color::Green, 1)).persistent());
        pool.drain();
        assert_eq!(pool.contents(), Mana::of(Color::Green, 1));
    }

    #[test]
    fn test_restricted_mana_is_invisible_without_card() {
        let mut pool = ManaPool::new();
        pool.add_batch(ManaBatch::restricted(
            Mana::of(Color::Colorless, 2),
            SpendRestriction::new("artifact spells only", |c: &Card| {
                c.types.contains(&crate::core::CardType::Artifact)
            }),
        ));
        assert_eq!(pool.available(None).total(), 0);
        assert_eq!(pool.total(), 2);
        assert!(!pool.take(Color::Colorless, 1, None));
        assert_eq!(pool.total(), 2);
    }

    #[test]
    fn test_take_exact_leaves_pool_on_failure() {
        let mut pool = ManaPool::new();
        pool.add(Mana::of(Color::Red, 1) + Mana::of(Color::Blue, 1));
        assert!(!pool.take_exact(&Mana::of(Color::Red, 2), None));
        assert_eq!(pool.total(), 2);
        assert!(pool.take_exact(&Mana::of(Color::Red, 1), None));
        assert_eq!(pool.contents(), Mana::of(Color::Blue, 1));
    }
}
