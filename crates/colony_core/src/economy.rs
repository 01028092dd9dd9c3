//! Resource stockpiles and costs.
//!
//! Each faction holds a [`PlayerEconomy`] with two resources. Spending only
//! happens through [`ResourceCost::purchase`], which checks both components
//! before touching either, so totals never go negative and a failed purchase
//! leaves the economy untouched.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The two harvestable resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    /// Sugar, spent on units and research.
    Sucrose,
    /// Timber, spent on buildings.
    Wood,
}

impl ResourceKind {
    /// Display name used in notifications.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sucrose => "Sucrose",
            Self::Wood => "Wood",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-faction resource stockpile.
///
/// # Example
///
/// ```
/// use colony_core::economy::{PlayerEconomy, ResourceKind};
///
/// let mut economy = PlayerEconomy::new(100, 0);
/// economy.deposit(ResourceKind::Wood, 5);
/// assert_eq!(economy.amount(ResourceKind::Wood), 5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PlayerEconomy {
    /// Sucrose on hand.
    pub sucrose: u32,
    /// Wood on hand.
    pub wood: u32,
}

impl PlayerEconomy {
    /// Create an economy with the given stockpile.
    #[must_use]
    pub const fn new(sucrose: u32, wood: u32) -> Self {
        Self { sucrose, wood }
    }

    /// Amount of one resource on hand.
    #[must_use]
    pub const fn amount(&self, kind: ResourceKind) -> u32 {
        match kind {
            ResourceKind::Sucrose => self.sucrose,
            ResourceKind::Wood => self.wood,
        }
    }

    /// Add harvested resources to the stockpile.
    pub fn deposit(&mut self, kind: ResourceKind, amount: u32) {
        match kind {
            ResourceKind::Sucrose => self.sucrose = self.sucrose.saturating_add(amount),
            ResourceKind::Wood => self.wood = self.wood.saturating_add(amount),
        }
    }
}

/// Price of a unit, building or tech.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceCost {
    /// Sucrose required.
    pub sucrose: u32,
    /// Wood required.
    pub wood: u32,
}

impl ResourceCost {
    /// Free.
    pub const FREE: Self = Self { sucrose: 0, wood: 0 };

    /// Create a new cost.
    #[must_use]
    pub const fn new(sucrose: u32, wood: u32) -> Self {
        Self { sucrose, wood }
    }

    /// Whether the economy holds enough of both resources.
    #[must_use]
    pub const fn can_afford(&self, economy: &PlayerEconomy) -> bool {
        economy.sucrose >= self.sucrose && economy.wood >= self.wood
    }

    /// Deduct the cost if affordable.
    ///
    /// Returns `false` and leaves the economy unchanged otherwise.
    pub fn purchase(&self, economy: &mut PlayerEconomy) -> bool {
        if !self.can_afford(economy) {
            return false;
        }
        economy.sucrose -= self.sucrose;
        economy.wood -= self.wood;
        true
    }

    /// First resource the economy is short of, with required and available amounts.
    ///
    /// Sucrose is reported before wood.
    #[must_use]
    pub fn shortfall(&self, economy: &PlayerEconomy) -> Option<(ResourceKind, u32, u32)> {
        if economy.sucrose < self.sucrose {
            Some((ResourceKind::Sucrose, self.sucrose, economy.sucrose))
        } else if economy.wood < self.wood {
            Some((ResourceKind::Wood, self.wood, economy.wood))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_purchase_deducts_both() {
        let mut economy = PlayerEconomy::new(100, 100);
        assert!(ResourceCost::new(100, 100).purchase(&mut economy));
        assert_eq!(economy, PlayerEconomy::new(0, 0));
    }

    #[test]
    fn test_purchase_refuses_partial() {
        let mut economy = PlayerEconomy::new(100, 40);
        assert!(!ResourceCost::new(50, 50).purchase(&mut economy));
        assert_eq!(economy, PlayerEconomy::new(100, 40));
    }

    #[test]
    fn test_shortfall_reports_sucrose_first() {
        let economy = PlayerEconomy::new(10, 10);
        assert_eq!(
            ResourceCost::new(20, 20).shortfall(&economy),
            Some((ResourceKind::Sucrose, 20, 10))
        );
        assert_eq!(
            ResourceCost::new(0, 20).shortfall(&economy),
            Some((ResourceKind::Wood, 20, 10))
        );
        assert_eq!(ResourceCost::new(10, 10).shortfall(&economy), None);
    }

    #[test]
    fn test_deposit_saturates() {
        let mut economy = PlayerEconomy::new(u32::MAX - 1, 0);
        economy.deposit(ResourceKind::Sucrose, 5);
        assert_eq!(economy.sucrose, u32::MAX);
    }

    proptest! {
        #[test]
        fn prop_purchase_is_all_or_nothing(
            sucrose in 0u32..500,
            wood in 0u32..500,
            cost_sucrose in 0u32..500,
            cost_wood in 0u32..500,
        ) {
            let before = PlayerEconomy::new(sucrose, wood);
            let mut economy = before;
            let cost = ResourceCost::new(cost_sucrose, cost_wood);
            if cost.purchase(&mut economy) {
                prop_assert_eq!(economy.sucrose, sucrose - cost_sucrose);
                prop_assert_eq!(economy.wood, wood - cost_wood);
            } else {
                prop_assert_eq!(economy, before);
                prop_assert!(cost_sucrose > sucrose || cost_wood > wood);
            }
        }
    }
}
