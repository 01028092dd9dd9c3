//! Tech tree: research unlocks gated by prerequisites and cost.

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::data::Tech;
use crate::economy::PlayerEconomy;
use crate::error::ResearchError;

/// String identifier of a tech.
///
/// Well-known techs are available as associated constants; catalogs may
/// define any others.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TechId(Cow<'static, str>);

impl TechId {
    /// Workers harvest 20% faster.
    pub const FASTER_GATHERING: Self = Self(Cow::Borrowed("faster_gathering"));
    /// Fighters may be produced. Granted when a barracks is completed.
    pub const BUILD_FIGHTER: Self = Self(Cow::Borrowed("build_fighter"));

    /// Create a tech id.
    #[must_use]
    pub fn new(id: impl Into<Cow<'static, str>>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TechId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Known techs plus the set already unlocked by one faction.
///
/// Unlocking is one-way and idempotent: a second attempt fails without
/// touching the economy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TechTree {
    available: BTreeMap<TechId, Tech>,
    unlocked: BTreeSet<TechId>,
}

impl TechTree {
    /// Create a tree from catalog entries with nothing unlocked.
    #[must_use]
    pub fn new(techs: impl IntoIterator<Item = Tech>) -> Self {
        Self {
            available: techs.into_iter().map(|t| (t.id.clone(), t)).collect(),
            unlocked: BTreeSet::new(),
        }
    }

    /// Look up a tech definition.
    #[must_use]
    pub fn get(&self, id: &TechId) -> Option<&Tech> {
        self.available.get(id)
    }

    /// Description of a tech, if known.
    #[must_use]
    pub fn description(&self, id: &TechId) -> Option<&str> {
        self.available.get(id).map(|t| t.description.as_str())
    }

    /// Whether a tech has been unlocked.
    #[must_use]
    pub fn is_unlocked(&self, id: &TechId) -> bool {
        self.unlocked.contains(id)
    }

    /// Unlocked techs in id order.
    pub fn unlocked(&self) -> impl Iterator<Item = &TechId> {
        self.unlocked.iter()
    }

    /// Known, still locked, and every prerequisite unlocked.
    #[must_use]
    pub fn can_research(&self, id: &TechId) -> bool {
        self.check_research(id).is_ok()
    }

    /// Like [`can_research`](Self::can_research) but says why not.
    pub fn check_research(&self, id: &TechId) -> Result<&Tech, ResearchError> {
        let tech = self
            .available
            .get(id)
            .ok_or_else(|| ResearchError::UnknownTech(id.clone()))?;
        if self.unlocked.contains(id) {
            return Err(ResearchError::AlreadyUnlocked(id.clone()));
        }
        if let Some(dep) = tech.dependencies.iter().find(|d| !self.unlocked.contains(*d)) {
            return Err(ResearchError::MissingDependency {
                tech: id.clone(),
                dependency: dep.clone(),
            });
        }
        Ok(tech)
    }

    /// Unlock a tech, paying its cost from `economy`.
    ///
    /// # Errors
    ///
    /// Fails without charging anything when the tech cannot be researched or
    /// the economy cannot afford it.
    pub fn unlock(&mut self, id: &TechId, economy: &mut PlayerEconomy) -> Result<(), ResearchError> {
        let tech = self.check_research(id)?;
        if !tech.cost.purchase(economy) {
            return Err(ResearchError::InsufficientResources(id.clone()));
        }
        self.unlocked.insert(id.clone());
        Ok(())
    }
}
