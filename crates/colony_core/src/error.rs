//! Error types for the colony simulation.

use thiserror::Error;

use crate::components::EntityId;
use crate::economy::ResourceKind;
use crate::kinds::{BuildingKind, UnitKind};
use crate::tech::TechId;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all simulation errors.
#[derive(Debug, Error)]
pub enum GameError {
    /// No unit with this id is active.
    #[error("Unit not found: {0}")]
    UnitNotFound(EntityId),

    /// No building with this id is active.
    #[error("Building not found: {0}")]
    BuildingNotFound(EntityId),

    /// Neither a unit nor a building has this id.
    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    /// Catalog or config text failed to parse.
    #[error("Failed to parse {what}: {source}")]
    DataParseError {
        /// What was being parsed.
        what: &'static str,
        /// Underlying RON error.
        #[source]
        source: ron::error::SpannedError,
    },

    /// Catalog references something it does not define.
    #[error("Invalid catalog: {}", .0.join("; "))]
    InvalidCatalog(Vec<String>),

    /// The catalog has no entry for a unit kind.
    #[error("No catalog entry for unit {0:?}")]
    MissingUnitData(UnitKind),

    /// The catalog has no entry for a building kind.
    #[error("No catalog entry for building {0:?}")]
    MissingBuildingData(BuildingKind),

    /// Insufficient resources.
    #[error("Insufficient resources: need {required} {resource}, have {available}")]
    InsufficientResources {
        /// Resource type.
        resource: ResourceKind,
        /// Amount required.
        required: u32,
        /// Amount available.
        available: u32,
    },

    /// Unit type is gated behind a tech that is not unlocked.
    #[error("Unit {unit:?} requires tech '{tech}'")]
    UnitNotUnlocked {
        /// Unit requested.
        unit: UnitKind,
        /// Tech that gates it.
        tech: TechId,
    },

    /// Research request rejected.
    #[error(transparent)]
    Research(#[from] ResearchError),

    /// Production request rejected.
    #[error(transparent)]
    Production(#[from] ProductionError),

    /// Command is not valid for the entity or target.
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    /// Invalid simulation state.
    #[error("Invalid simulation state: {0}")]
    InvalidState(String),
}

/// Reasons a tech cannot be researched or unlocked.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResearchError {
    /// The tech is not in the catalog.
    #[error("Unknown tech '{0}'")]
    UnknownTech(TechId),

    /// The tech was unlocked before.
    #[error("Tech '{0}' is already unlocked")]
    AlreadyUnlocked(TechId),

    /// A prerequisite tech is still locked.
    #[error("Tech '{tech}' requires '{dependency}'")]
    MissingDependency {
        /// Requested tech.
        tech: TechId,
        /// First locked prerequisite.
        dependency: TechId,
    },

    /// The economy cannot pay the tech's cost.
    #[error("Cannot afford tech '{0}'")]
    InsufficientResources(TechId),
}

/// Errors that can occur when queueing production.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ProductionError {
    /// The production queue is full.
    #[error("Production queue is full")]
    QueueFull,
    /// The building cannot produce this item.
    #[error("Building cannot produce this item")]
    CannotProduce,
    /// The building has no production queue.
    #[error("Building has no production queue")]
    NotAProducer,
}
