//! # Colony Core
//!
//! Deterministic simulation core for a two-faction colony RTS.
//!
//! This crate contains **only** simulation logic:
//! - No rendering
//! - No IO
//! - No system randomness
//!
//! The host drives it one fixed tick at a time and reads state back through
//! the query methods on [`simulation::Sim`].
//!
//! ## Crate Structure
//!
//! - [`simulation`] - Core simulation loop, commands and queries
//! - [`unit`] - Unit stats, behaviour state machine and steering
//! - [`building`] - Buildings, production queues and construction sites
//! - [`economy`] / [`tech`] - Resource stockpiles, costs and research
//! - [`fog`] - Player fog of war
//! - [`events`] - Synchronous notification bus
//! - [`tilemap`] - Tile grid and collision footprints
//! - [`data`] - Stat catalog and tunables, loadable from RON
//! - [`math`] - 2D vectors, rectangles and angles

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod building;
pub mod components;
pub mod data;
pub mod economy;
pub mod error;
pub mod events;
pub mod fog;
pub mod kinds;
pub mod math;
pub mod simulation;
pub mod tech;
pub mod tilemap;
pub mod unit;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::building::{Building, BuildingVariant, ProductionQueue, QueuedItem, QueuedPayload};
    pub use crate::components::{EntityId, Faction};
    pub use crate::data::{Catalog, SimConfig};
    pub use crate::economy::{PlayerEconomy, ResourceCost, ResourceKind};
    pub use crate::error::{GameError, ProductionError, ResearchError, Result};
    pub use crate::events::{Event, EventBus};
    pub use crate::fog::{FogOfWar, FogState};
    pub use crate::kinds::{BuildingKind, TileKind, UnitKind};
    pub use crate::math::{Rect, Vec2};
    pub use crate::simulation::{DestinationType, EntityRef, Sim, TickEvents};
    pub use crate::tech::{TechId, TechTree};
    pub use crate::tilemap::TileMap;
    pub use crate::unit::{Unit, UnitMessage, UnitState};
}
