//! Tech catalog entries.

use serde::{Deserialize, Serialize};

use crate::economy::ResourceCost;
use crate::tech::TechId;

/// Static definition of one researchable tech.
///
/// # Example RON
///
/// ```ron
/// Tech(
///     id: "faster_gathering",
///     name: "Faster Gathering",
///     description: "Workers collect resources 20% faster",
///     cost: (sucrose: 250),
///     research_seconds: 60,
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tech {
    /// Unique identifier.
    pub id: TechId,

    /// Display name.
    pub name: String,

    /// Shown when the tech is unlocked, or when unlocking it fails.
    pub description: String,

    /// Charged when research completes.
    #[serde(default)]
    pub cost: ResourceCost,

    /// Research time in seconds of simulation.
    #[serde(default)]
    pub research_seconds: u32,

    /// Techs that must be unlocked first.
    #[serde(default)]
    pub dependencies: Vec<TechId>,
}
