//! Data structures for stat catalogs and simulation configuration.
//!
//! Everything here is a plain serde struct that can be read from RON.
//!
//! **Note:** This module performs no IO. Callers hand in the text.

mod building_data;
mod catalog;
mod sim_config;
mod tech_data;
mod unit_data;

pub use building_data::BuildingData;
pub use catalog::Catalog;
pub use sim_config::SimConfig;
pub use tech_data::Tech;
pub use unit_data::UnitData;
