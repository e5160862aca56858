//! Cost system for activated abilities
//!
//! Represents what a player pays to activate an ability: tapping, mana,
//! sacrificing the source, life, or loyalty.

use crate::core::ManaCost;
use std::fmt;

/// A cost that must be paid to activate an ability
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cost {
    /// Tap the source permanent ({T})
    Tap,

    /// Pay mana
    Mana(ManaCost),

    /// Sacrifice the source permanent
    Sacrifice,

    /// Pay life
    PayLife(i32),

    /// Add (positive) or remove (negative) loyalty counters on the source
    Loyalty(i32),

    /// Several costs paid together
    Composite(Vec<Cost>),
}

impl Cost {
    /// Tap plus a mana payment, e.g. `{2}, {T}`
    pub fn tap_and_mana(mana: ManaCost) -> Self {
        Cost::Composite(vec![Cost::Tap, Cost::Mana(mana)])
    }

    fn parts(&self) -> Vec<&Cost> {
        match self {
            Cost::Composite(costs) => costs.iter().flat_map(|c| c.parts()).collect(),
            other => vec![other],
        }
    }

    pub fn includes_tap(&self) -> bool {
        self.parts().iter().any(|c| matches!(c, Cost::Tap))
    }

    pub fn includes_sacrifice(&self) -> bool {
        self.parts().iter().any(|c| matches!(c, Cost::Sacrifice))
    }

    /// The mana component, if any
    pub fn mana_cost(&self) -> Option<&ManaCost> {
        self.parts().into_iter().find_map(|c| match c {
            Cost::Mana(m) => Some(m),
            _ => None,
        })
    }

    /// Total life paid
    pub fn life(&self) -> i32 {
        self.parts()
            .iter()
            .map(|c| match c {
                Cost::PayLife(n) => *n,
                _ => 0,
            })
            .sum()
    }

    /// Net loyalty change, if this is a loyalty ability
    pub fn loyalty_change(&self) -> Option<i32> {
        let changes: Vec<i32> = self
            .parts()
            .iter()
            .filter_map(|c| match c {
                Cost::Loyalty(n) => Some(*n),
                _ => None,
            })
            .collect();
        if changes.is_empty() {
            None
        } else {
            Some(changes.iter().sum())
        }
    }
}

impl fmt::Display for Cost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cost::Tap => write!(f, "{{T}}"),
            Cost::Mana(m) => write!(f, "{m}"),
            Cost::Sacrifice => write!(f, "Sacrifice this"),
            Cost::PayLife(n) => write!(f, "Pay {n} life"),
            Cost::Loyalty(n) if *n >= 0 => write!(f, "+{n}"),
            Cost::Loyalty(n) => write!(f, "{n}"),
            Cost::Composite(costs) => {
                for (i, cost) in costs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{cost}")?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_composite_cost_queries() {
        let cost = Cost::Composite(vec![
            Cost::tap_and_mana(ManaCost::parse("{2}").unwrap()),
            Cost::PayLife(2),
        ]);
        assert!(cost.includes_tap());
        assert!(!cost.includes_sacrifice());
        assert_eq!(cost.mana_cost().map(|m| m.value()), Some(2));
        assert_eq!(cost.life(), 2);
        assert_eq!(cost.loyalty_change(), None);
        assert_eq!(cost.to_string(), "{T}, {2}, Pay 2 life");
    }

    #[test]
    fn test_loyalty_cost() {
        assert_eq!(Cost::Loyalty(-3).loyalty_change(), Some(-3));
        assert_eq!(Cost::Loyalty(1).to_string(), "+1");
        assert!(Cost::Tap.mana_cost().is_none());
    }
}
