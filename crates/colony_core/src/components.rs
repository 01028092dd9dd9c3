//! Shared identity types used across simulation modules.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier for a unit or building.
///
/// Units and buildings draw from one counter, so an id never names both.
pub type EntityId = u64;

/// Owner tag of a unit or building.
///
/// Faction 0 is the player; every other faction is an AI opponent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Faction(pub u32);

impl Faction {
    /// The player-controlled faction.
    pub const PLAYER: Self = Self(0);

    /// Whether this is the player-controlled faction.
    #[must_use]
    pub const fn is_player(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Faction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "faction {}", self.0)
    }
}
