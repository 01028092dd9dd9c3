//! Core simulation loop.
//!
//! [`Sim`] owns every unit, building, faction economy and tech tree, the
//! tile map, the fog grid and the event bus. The host calls
//! [`tick()`](Sim::tick) once per fixed step and issues orders through the
//! command methods between ticks.
//!
//! # Determinism
//!
//! - Units and buildings are stored in id-ordered maps and updated in that order
//! - No system randomness (head-on deflection picks its side from id order)
//! - Same commands on the same starting state always produce the same state hash
//!
//! # Example
//!
//! ```
//! use colony_core::prelude::*;
//!
//! let map = TileMap::new(16, 16, 128.0);
//! let mut sim = Sim::from_map(map).unwrap();
//!
//! let ant = sim
//!     .spawn_unit(UnitKind::Worker, Faction::PLAYER, Vec2::new(192.0, 192.0))
//!     .unwrap();
//! sim.issue_move(ant, Vec2::new(900.0, 192.0)).unwrap();
//!
//! sim.tick();
//! assert_eq!(sim.get_tick(), 1);
//! ```

use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, BTreeSet};
use std::hash::{Hash, Hasher};

use crate::building::{Building, BuildingOutcome, QueuedItem, QueuedPayload};
use crate::components::{EntityId, Faction};
use crate::data::{Catalog, SimConfig};
use crate::economy::{PlayerEconomy, ResourceCost, ResourceKind};
use crate::error::{GameError, ProductionError, Result};
use crate::events::{Event, EventBus};
use crate::fog::{FogOfWar, VisionSource};
use crate::kinds::{BuildingKind, UnitKind};
use crate::math::{Rect, Vec2};
use crate::tech::{TechId, TechTree};
use crate::tilemap::TileMap;
use crate::unit::{Unit, UnitMessage, UnitState};

/// One hit landed during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageEvent {
    /// The unit dealing damage.
    pub attacker: EntityId,
    /// The unit receiving damage.
    pub target: EntityId,
    /// Amount of damage dealt.
    pub damage: u32,
}

/// A production queue item that finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductionComplete {
    /// Building whose queue produced it.
    pub building: EntityId,
    /// What was produced.
    pub payload: QueuedPayload,
    /// The new unit, for unit payloads that could be spawned.
    pub spawned: Option<EntityId>,
}

/// A construction site that turned into its building.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstructionFinished {
    /// Id of the removed site.
    pub site: EntityId,
    /// Id of the new building.
    pub building: EntityId,
    /// Kind of the new building.
    pub kind: BuildingKind,
}

/// Events generated during a simulation tick.
///
/// `spawned` also lists entities created by commands since the previous tick.
#[derive(Debug, Clone, Default)]
pub struct TickEvents {
    /// Damage events from combat.
    pub damage_events: Vec<DamageEvent>,
    /// Units that died this tick.
    pub deaths: Vec<EntityId>,
    /// Production completions.
    pub production_complete: Vec<ProductionComplete>,
    /// Construction sites that finished.
    pub constructions_finished: Vec<ConstructionFinished>,
    /// Entities spawned this tick.
    pub spawned: Vec<EntityId>,
}

/// Economy and research state of one faction.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerState {
    /// Resource stockpile.
    pub economy: PlayerEconomy,
    /// Known and unlocked techs.
    pub tech: TechTree,
}

/// What a move order's target point is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestinationType {
    /// Plain ground.
    Location,
    /// A harvestable tile.
    Resource,
    /// Inside an enemy unit's box.
    Enemy,
}

/// Borrowed unit or building, as returned by [`Sim::entity`].
#[derive(Debug, Clone, Copy)]
pub enum EntityRef<'a> {
    /// A unit.
    Unit(&'a Unit),
    /// A building.
    Building(&'a Building),
}

impl EntityRef<'_> {
    /// Id of the entity.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        match self {
            Self::Unit(unit) => unit.id,
            Self::Building(building) => building.id,
        }
    }

    /// Owner of the entity.
    #[must_use]
    pub const fn faction(&self) -> Faction {
        match self {
            Self::Unit(unit) => unit.faction,
            Self::Building(building) => building.faction,
        }
    }

    /// Center of the entity's box.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        match self {
            Self::Unit(unit) => unit.center(),
            Self::Building(building) => building.center(),
        }
    }
}

/// The colony simulation.
///
/// # System Execution Order
///
/// Each tick runs, in this order:
/// 1. **Units** - every living unit runs its state update, in id order
/// 2. **Deaths** - units at zero health are removed
/// 3. **Buildings** - construction sites and production queues advance
/// 4. **Fog** - player vision is recomputed
#[derive(Debug)]
pub struct Sim {
    /// Current simulation tick.
    tick: u64,
    /// Next id handed to a unit or building.
    next_id: EntityId,
    pub(crate) units: BTreeMap<EntityId, Unit>,
    pub(crate) buildings: BTreeMap<EntityId, Building>,
    players: BTreeMap<Faction, PlayerState>,
    pub(crate) tilemap: TileMap,
    fog: FogOfWar,
    bus: EventBus,
    catalog: Catalog,
    pub(crate) config: SimConfig,
    /// Events collected since the last tick returned.
    pending: TickEvents,
}

impl Sim {
    /// Create an empty simulation over `tilemap`.
    ///
    /// The player faction starts with the configured economy.
    ///
    /// # Errors
    ///
    /// [`GameError::InvalidCatalog`] if the catalog has dangling references,
    /// [`GameError::InvalidState`] if the map and config disagree on tile size.
    pub fn new(catalog: Catalog, config: SimConfig, tilemap: TileMap) -> Result<Self> {
        let errors = catalog.validate();
        if !errors.is_empty() {
            return Err(GameError::InvalidCatalog(errors));
        }
        if (tilemap.tile_size() - config.tile_size).abs() > f64::EPSILON {
            return Err(GameError::InvalidState(format!(
                "map tile size {} does not match config tile size {}",
                tilemap.tile_size(),
                config.tile_size
            )));
        }

        let mut sim = Self {
            tick: 0,
            next_id: 1,
            units: BTreeMap::new(),
            buildings: BTreeMap::new(),
            players: BTreeMap::new(),
            fog: FogOfWar::new(tilemap.width(), tilemap.height()),
            tilemap,
            bus: EventBus::with_max_depth(config.max_event_depth),
            catalog,
            config,
            pending: TickEvents::default(),
        };
        sim.player_mut(sim.config.player_faction);
        tracing::debug!(
            width = sim.tilemap.width(),
            height = sim.tilemap.height(),
            "simulation created"
        );
        Ok(sim)
    }

    /// Simulation with the shipped catalog and default config, sized to `tilemap`.
    ///
    /// # Errors
    ///
    /// Same as [`Sim::new`].
    pub fn from_map(tilemap: TileMap) -> Result<Self> {
        let config = SimConfig {
            tile_size: tilemap.tile_size(),
            ..SimConfig::default()
        };
        Self::new(Catalog::default(), config, tilemap)
    }

    // ------------------------------------------------------------------
    // Tick
    // ------------------------------------------------------------------

    /// Advance the simulation by one tick.
    ///
    /// Returns what happened during the tick for the presentation layer.
    pub fn tick(&mut self) -> TickEvents {
        self.run_unit_phase();
        self.run_death_sweep();
        self.run_building_phase();
        if self.config.fog_enabled {
            self.update_fog();
        }

        self.tick += 1;

        #[cfg(debug_assertions)]
        {
            let hash = self.state_hash();
            tracing::debug!(tick = self.tick, state_hash = hash, "Simulation state hash");
        }

        #[cfg(feature = "debug-validation")]
        {
            for violation in self.check_invariants() {
                tracing::error!(tick = self.tick, %violation, "simulation invariant violated");
            }
        }

        std::mem::take(&mut self.pending)
    }

    /// Run every living unit's state update in id order.
    ///
    /// The unit is taken out of the map while it updates so it can read the
    /// rest of the world, and never sees itself in neighbour queries.
    fn run_unit_phase(&mut self) {
        let ids: Vec<EntityId> = self.units.keys().copied().collect();
        for id in ids {
            let Some(mut unit) = self.units.remove(&id) else {
                continue;
            };
            if unit.is_alive() {
                unit.update(self);
            }
            self.units.insert(id, unit);
        }
    }

    fn run_death_sweep(&mut self) {
        let dead: Vec<EntityId> = self
            .units
            .values()
            .filter(|unit| !unit.is_alive())
            .map(|unit| unit.id)
            .collect();
        for id in dead {
            if let Some(unit) = self.units.remove(&id) {
                tracing::debug!(tick = self.tick, unit = id, kind = %unit.kind, "unit died");
            }
            self.pending.deaths.push(id);
        }
    }

    fn run_building_phase(&mut self) {
        let ids: Vec<EntityId> = self.buildings.keys().copied().collect();
        for id in ids {
            let Some(outcome) = self.buildings.get_mut(&id).and_then(Building::update) else {
                continue;
            };
            match outcome {
                BuildingOutcome::Produced(item) => self.finish_production(id, item),
                BuildingOutcome::ConstructionFinished { target } => self.finish_construction(id, target),
            }
        }
    }

    fn update_fog(&mut self) {
        let player = self.config.player_faction;
        let tile_size = self.config.tile_size;
        let unit_sources = self
            .units
            .values()
            .filter(|unit| unit.faction == player)
            .map(|unit| {
                let (x, y) = unit.tile_coords(tile_size);
                VisionSource {
                    x,
                    y,
                    radius: unit.stats.vision_range,
                }
            });
        let building_sources = self
            .buildings
            .values()
            .filter(|building| building.faction == player)
            .filter_map(|building| {
                let (x, y) = self.tilemap.world_to_tile(building.position)?;
                Some(VisionSource {
                    x,
                    y,
                    radius: building.stats.vision_range,
                })
            });
        let sources: Vec<VisionSource> = unit_sources.chain(building_sources).collect();
        self.fog.recompute(sources);
    }

    fn finish_production(&mut self, building_id: EntityId, item: QueuedItem) {
        let Some((faction, rally_point)) = self
            .buildings
            .get(&building_id)
            .map(|b| (b.faction, b.rally_point))
        else {
            return;
        };

        if let QueuedPayload::Unit(kind) = item.payload {
            let size = self.catalog.unit(kind).map(|data| data.size_px);
            if let Ok(size) = size {
                if self.spawn_point(building_id, size).is_none() {
                    tracing::debug!(building = building_id, %kind, "no room to spawn, holding unit");
                    if let Some(queue) = self.buildings.get_mut(&building_id).and_then(Building::queue_mut) {
                        queue.hold(item);
                    }
                    return;
                }
            }
        }

        let spawned = match &item.payload {
            QueuedPayload::Unit(kind) => self.spawn_produced_unit(building_id, *kind, faction, rally_point),
            QueuedPayload::Tech(tech) => {
                self.complete_research(faction, tech);
                None
            }
        };
        tracing::debug!(tick = self.tick, building = building_id, payload = ?item.payload, "production complete");
        self.pending.production_complete.push(ProductionComplete {
            building: building_id,
            payload: item.payload,
            spawned,
        });
    }

    fn spawn_produced_unit(
        &mut self,
        building_id: EntityId,
        kind: UnitKind,
        faction: Faction,
        rally_point: Option<Vec2>,
    ) -> Option<EntityId> {
        let size = self.catalog.unit(kind).ok()?.size_px;
        let center = self.spawn_point(building_id, size)?;
        let id = match self.spawn_unit(kind, faction, center) {
            Ok(id) => id,
            Err(err) => {
                tracing::warn!(building = building_id, %err, "could not spawn produced unit");
                return None;
            }
        };
        if let Some(point) = rally_point {
            if let Err(err) = self.issue_move(id, point) {
                tracing::debug!(unit = id, %err, "rally point unreachable");
            }
        }
        Some(id)
    }

    /// Center of the first walkable tile beside a building not covered by a unit.
    ///
    /// Falls back to just below the building when every adjacent tile is taken
    /// by units, as long as that spot is on the map and walkable. `None` when
    /// the building is walled in.
    fn spawn_point(&self, building_id: EntityId, size: f64) -> Option<Vec2> {
        let building = self.buildings.get(&building_id)?;
        let half = Vec2::new(size / 2.0, size / 2.0);
        let free = building
            .adjacent_tiles(self.config.tile_size)
            .into_iter()
            .filter(|&(x, y)| self.tilemap.is_walkable(x, y))
            .map(|(x, y)| self.tilemap.tile_center(x, y))
            .find(|&center| {
                let footprint = Rect::from_origin_size(center - half, size, size);
                !self.units.values().any(|unit| unit.rect.overlaps(&footprint))
            });
        if free.is_some() {
            return free;
        }
        let below = Vec2::new(building.center().x, building.rect.max.y + size / 2.0);
        let (x, y) = self.tilemap.world_to_tile(below)?;
        self.tilemap.is_walkable(x, y).then_some(below)
    }

    fn complete_research(&mut self, faction: Faction, tech: &TechId) {
        let player = self.player_mut(faction);
        match player.tech.unlock(tech, &mut player.economy) {
            Ok(()) => tracing::info!(%faction, %tech, "research complete"),
            Err(err) => {
                tracing::debug!(%faction, %err, "research could not be unlocked");
                let message = player
                    .tech
                    .description(tech)
                    .map_or_else(|| tech.to_string(), str::to_string);
                self.publish(Event::notification(message));
            }
        }
    }

    fn finish_construction(&mut self, site_id: EntityId, target: BuildingKind) {
        let Some(site) = self.buildings.remove(&site_id) else {
            return;
        };
        if site.collision {
            self.tilemap.remove_collision_rect(&site.rect);
        }

        let building = match self.place_building(target, site.faction, site.position) {
            Ok(id) => id,
            Err(err) => {
                tracing::warn!(site = site_id, %err, "construction could not be completed");
                return;
            }
        };
        tracing::info!(tick = self.tick, site = site_id, building, kind = %target, "construction complete");

        if target == BuildingKind::Barracks {
            let player = self.player_mut(site.faction);
            if player
                .tech
                .unlock(&TechId::BUILD_FIGHTER, &mut player.economy)
                .is_ok()
            {
                self.publish(Event::notification("Fighter units unlocked!"));
            }
        }

        self.pending.constructions_finished.push(ConstructionFinished {
            site: site_id,
            building,
            kind: target,
        });
    }

    // ------------------------------------------------------------------
    // Spawning
    // ------------------------------------------------------------------

    fn allocate_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Add an idle unit centered on `center`.
    ///
    /// # Errors
    ///
    /// [`GameError::MissingUnitData`] if the catalog has no entry for `kind`.
    pub fn spawn_unit(&mut self, kind: UnitKind, faction: Faction, center: Vec2) -> Result<EntityId> {
        let data = self.catalog.unit(kind)?;
        let half = data.size_px / 2.0;
        let id = self.next_id;
        let unit = Unit::new(id, kind, faction, data, center - Vec2::new(half, half));
        self.allocate_id();
        self.player_mut(faction);
        self.units.insert(id, unit);
        self.pending.spawned.push(id);
        tracing::debug!(unit = id, %kind, %faction, x = center.x, y = center.y, "unit spawned");
        Ok(id)
    }

    /// Add a finished building with its top-left corner on tile `(x, y)`.
    ///
    /// # Errors
    ///
    /// [`GameError::InvalidCommand`] for construction sites (use
    /// [`construct_building`](Self::construct_building)) or
    /// [`GameError::MissingBuildingData`].
    pub fn spawn_building(&mut self, kind: BuildingKind, faction: Faction, tile: (u32, u32)) -> Result<EntityId> {
        if kind == BuildingKind::InConstruction {
            return Err(GameError::InvalidCommand(
                "construction sites are created by construct_building".to_string(),
            ));
        }
        let tile_size = self.config.tile_size;
        let origin = Vec2::new(f64::from(tile.0) * tile_size, f64::from(tile.1) * tile_size);
        self.place_building(kind, faction, origin)
    }

    fn place_building(&mut self, kind: BuildingKind, faction: Faction, origin: Vec2) -> Result<EntityId> {
        let data = self.catalog.building(kind)?;
        let id = self.next_id;
        let building = Building::new(id, kind, faction, data, origin);
        self.allocate_id();
        if building.collision {
            self.tilemap.add_collision_rect(building.rect);
        }
        self.player_mut(faction);
        self.buildings.insert(id, building);
        self.pending.spawned.push(id);
        tracing::debug!(building = id, %kind, %faction, "building placed");
        Ok(id)
    }

    /// Remove a unit or building immediately.
    ///
    /// # Errors
    ///
    /// [`GameError::EntityNotFound`] if nothing has this id.
    pub fn despawn(&mut self, id: EntityId) -> Result<()> {
        if self.units.remove(&id).is_some() {
            tracing::debug!(unit = id, "unit despawned");
            return Ok(());
        }
        let building = self.buildings.remove(&id).ok_or(GameError::EntityNotFound(id))?;
        if building.collision {
            self.tilemap.remove_collision_rect(&building.rect);
        }
        tracing::debug!(building = id, "building despawned");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Unit commands
    // ------------------------------------------------------------------

    /// Send a unit toward `point`, picking the behaviour from what is there.
    ///
    /// An enemy under the point starts an attack-move, a resource tile starts
    /// a harvest trip, anything else is a plain move. The waypoint is the
    /// clicked tile's center, or the nearest walkable tile beside it.
    ///
    /// # Errors
    ///
    /// [`GameError::UnitNotFound`] (also published as a notification), or
    /// [`GameError::InvalidCommand`] when the point is off the map or walled in.
    pub fn issue_move(&mut self, unit_id: EntityId, point: Vec2) -> Result<()> {
        let (faction, from) = self.command_target(unit_id)?;
        let destination = self.classify_destination(point, faction);
        let (waypoint, tile_center) = self.waypoint_for(from, point)?;

        let unit = self.units.get_mut(&unit_id).ok_or(GameError::UnitNotFound(unit_id))?;
        unit.destinations.clear();
        unit.destinations.push_back(waypoint);
        match destination {
            DestinationType::Enemy => unit.change_state(UnitState::AttackMove),
            DestinationType::Resource => {
                unit.last_resource_pos = Some(tile_center);
                unit.change_state(UnitState::moving_then(UnitState::Harvesting { timer: 0 }));
            }
            DestinationType::Location => unit.change_state(UnitState::moving()),
        }
        tracing::debug!(unit = unit_id, ?destination, x = waypoint.x, y = waypoint.y, "move issued");
        Ok(())
    }

    /// Move order that engages enemies met on the way.
    ///
    /// # Errors
    ///
    /// Same as [`issue_move`](Self::issue_move).
    pub fn issue_attack_move(&mut self, unit_id: EntityId, point: Vec2) -> Result<()> {
        let (_, from) = self.command_target(unit_id)?;
        let (waypoint, _) = self.waypoint_for(from, point)?;
        let unit = self.units.get_mut(&unit_id).ok_or(GameError::UnitNotFound(unit_id))?;
        unit.destinations.clear();
        unit.destinations.push_back(waypoint);
        unit.change_state(UnitState::AttackMove);
        tracing::debug!(unit = unit_id, x = waypoint.x, y = waypoint.y, "attack-move issued");
        Ok(())
    }

    /// Order a unit to attack a specific enemy unit.
    ///
    /// Attacks at once when in range, otherwise walks up first.
    ///
    /// # Errors
    ///
    /// [`GameError::UnitNotFound`] for either id, or
    /// [`GameError::InvalidCommand`] when both share a faction.
    pub fn issue_attack(&mut self, unit_id: EntityId, target_id: EntityId) -> Result<()> {
        let (faction, _) = self.command_target(unit_id)?;
        let (target_faction, target_center) = self
            .units
            .get(&target_id)
            .filter(|target| target.is_alive())
            .map(|target| (target.faction, target.center()))
            .ok_or(GameError::UnitNotFound(target_id))?;
        if target_faction == faction {
            return Err(GameError::InvalidCommand(format!(
                "unit {unit_id} cannot attack friendly unit {target_id}"
            )));
        }

        let unit = self.units.get_mut(&unit_id).ok_or(GameError::UnitNotFound(unit_id))?;
        unit.nearest_enemy = Some(target_id);
        unit.destinations.clear();
        if unit.target_in_attack_range(target_center) {
            unit.change_state(UnitState::Attacking);
        } else {
            unit.destinations.push_back(target_center);
            unit.change_state(UnitState::moving_then(UnitState::Attacking));
        }
        tracing::debug!(unit = unit_id, target = target_id, "attack issued");
        Ok(())
    }

    /// Move several units to `point`, keeping their relative formation.
    ///
    /// Each unit keeps its offset from the group centroid. When the farthest
    /// unit is more than the configured spread away, every offset is scaled
    /// down so the group closes up. Unknown ids are skipped. Returns how many
    /// orders were accepted.
    pub fn issue_group_move(&mut self, unit_ids: &[EntityId], point: Vec2) -> usize {
        let members: Vec<(EntityId, Vec2)> = unit_ids
            .iter()
            .filter_map(|id| self.units.get(id).map(|unit| (*id, unit.center())))
            .collect();
        if members.is_empty() {
            return 0;
        }

        #[allow(clippy::cast_precision_loss)]
        let count = members.len() as f64;
        let sum = members.iter().fold(Vec2::ZERO, |acc, (_, center)| acc + *center);
        let centroid = sum.scale(1.0 / count);
        let max_dist = members
            .iter()
            .map(|(_, center)| center.distance(centroid))
            .fold(0.0, f64::max);
        let spread = self.config.group_max_spread;
        let scale = if max_dist > spread { spread / max_dist } else { 1.0 };

        let mut issued = 0;
        for (id, center) in members {
            let target = point + (center - centroid).scale(scale);
            match self.issue_move(id, target) {
                Ok(()) => issued += 1,
                Err(err) => tracing::debug!(unit = id, %err, "group member order rejected"),
            }
        }
        issued
    }

    /// Deliver a message to a unit.
    ///
    /// # Errors
    ///
    /// [`GameError::UnitNotFound`] if the unit does not exist.
    pub fn send_unit_message(&mut self, unit_id: EntityId, message: UnitMessage) -> Result<()> {
        let unit = self.units.get_mut(&unit_id).ok_or(GameError::UnitNotFound(unit_id))?;
        match message {
            UnitMessage::ArrivedIdle => {
                unit.stop();
                let (center, faction) = (unit.center(), unit.faction);
                self.spread_arrived_idle(unit_id, center, faction);
            }
        }
        Ok(())
    }

    /// Faction and tile of a unit about to receive an order.
    ///
    /// Unknown ids are reported on the event bus.
    fn command_target(&mut self, unit_id: EntityId) -> Result<(Faction, (i64, i64))> {
        let tile_size = self.config.tile_size;
        if let Some(unit) = self.units.get(&unit_id) {
            return Ok((unit.faction, unit.tile_coords(tile_size)));
        }
        tracing::warn!(unit = unit_id, "order for unknown unit");
        self.publish(Event::notification(format!("Unit {unit_id} not found")));
        Err(GameError::UnitNotFound(unit_id))
    }

    /// Waypoint for an order on `point`, plus the clicked tile's center.
    fn waypoint_for(&self, from: (i64, i64), point: Vec2) -> Result<(Vec2, Vec2)> {
        let (x, y) = self.tilemap.world_to_tile(point).ok_or_else(|| {
            GameError::InvalidCommand(format!("target ({:.0}, {:.0}) is off the map", point.x, point.y))
        })?;
        let clicked = self.tilemap.tile_center(x, y);
        if self.tilemap.is_walkable(x, y) {
            return Ok((clicked, clicked));
        }
        let (ax, ay) = self.nearest_walkable_adjacent(from, (x, y)).ok_or_else(|| {
            GameError::InvalidCommand(format!("no walkable tile near ({x}, {y})"))
        })?;
        Ok((self.tilemap.tile_center(ax, ay), clicked))
    }

    /// What lies under `point` from `faction`'s point of view.
    #[must_use]
    pub fn classify_destination(&self, point: Vec2, faction: Faction) -> DestinationType {
        let on_enemy = self
            .units
            .values()
            .any(|unit| unit.faction != faction && unit.is_alive() && unit.rect.contains(point));
        if on_enemy {
            return DestinationType::Enemy;
        }
        match self.tilemap.tile_at(point).and_then(|tile| tile.resource()) {
            Some(_) => DestinationType::Resource,
            None => DestinationType::Location,
        }
    }

    /// Walkable tile next to a blocked one, closest to `from`.
    ///
    /// When the blocked tile lies under a building, candidates are the tiles
    /// bordering that building; otherwise its four direct neighbours.
    #[must_use]
    pub fn nearest_walkable_adjacent(&self, from: (i64, i64), blocked: (i64, i64)) -> Option<(i64, i64)> {
        let tile_size = self.config.tile_size;
        let probe = self.tilemap.tile_center(blocked.0, blocked.1);
        let candidates: Vec<(i64, i64)> = match self.buildings.values().find(|b| b.rect.contains(probe)) {
            Some(building) => building.adjacent_tiles(tile_size),
            None => [(0, -1), (0, 1), (-1, 0), (1, 0)]
                .iter()
                .map(|(dx, dy)| (blocked.0 + dx, blocked.1 + dy))
                .collect(),
        };

        let mut best: Option<((i64, i64), i64)> = None;
        for (x, y) in candidates {
            if !self.tilemap.is_walkable(x, y) {
                continue;
            }
            let (dx, dy) = (x - from.0, y - from.1);
            let dist = dx * dx + dy * dy;
            if best.map_or(true, |(_, d)| dist < d) {
                best = Some(((x, y), dist));
            }
        }
        best.map(|(tile, _)| tile)
    }

    // ------------------------------------------------------------------
    // Building commands
    // ------------------------------------------------------------------

    /// Place a construction site for `kind` on `target`, paid by the builder's faction.
    ///
    /// Nothing changes when the order is rejected. A shortfall publishes one
    /// [`Event::NotEnoughResources`]; other rejections publish a notification.
    ///
    /// # Errors
    ///
    /// [`GameError::InvalidCommand`] for kinds that cannot be constructed or a
    /// builder too far away, [`GameError::UnitNotFound`], or
    /// [`GameError::InsufficientResources`].
    pub fn construct_building(&mut self, target: Rect, builder_id: EntityId, kind: BuildingKind) -> Result<EntityId> {
        if !kind.is_constructible() {
            self.publish(Event::notification(format!("{kind} cannot be constructed")));
            return Err(GameError::InvalidCommand(format!("{kind} cannot be constructed")));
        }
        let Some((faction, builder_center)) = self.units.get(&builder_id).map(|u| (u.faction, u.center())) else {
            self.publish(Event::notification(format!("Unit {builder_id} not found")));
            return Err(GameError::UnitNotFound(builder_id));
        };

        let cost = self.catalog.building(kind)?.cost;
        self.ensure_affordable(faction, cost, kind.name())?;

        let distance = builder_center.distance(target.center());
        if distance > self.config.builder_max_distance {
            self.publish(Event::notification("Builder is too far away"));
            return Err(GameError::InvalidCommand(format!(
                "builder {builder_id} is {distance:.0} px from the site"
            )));
        }

        let site_data = self.catalog.building(BuildingKind::InConstruction)?;
        let target_data = self.catalog.building(kind)?;
        let id = self.next_id;
        let site = Building::construction_site(id, faction, site_data, kind, target_data, target);

        self.pay(faction, cost)?;
        self.allocate_id();
        if site.collision {
            self.tilemap.add_collision_rect(site.rect);
        }
        self.buildings.insert(id, site);
        self.pending.spawned.push(id);
        tracing::info!(site = id, builder = builder_id, %kind, "construction started");
        Ok(id)
    }

    /// Queue a unit at a production building, paying for it now.
    ///
    /// # Errors
    ///
    /// [`GameError::BuildingNotFound`], [`GameError::Production`] when the
    /// building cannot produce `kind` or its queue is full,
    /// [`GameError::UnitNotUnlocked`] or [`GameError::InsufficientResources`].
    pub fn construct_unit(&mut self, building_id: EntityId, kind: UnitKind) -> Result<()> {
        let (faction, building_kind, queue_full) = self.producer(building_id)?;

        let building_data = self.catalog.building(building_kind)?;
        if !building_data.can_produce(kind) {
            self.publish(Event::notification(format!("{building_kind} cannot produce {kind}")));
            return Err(ProductionError::CannotProduce.into());
        }

        let unit_data = self.catalog.unit(kind)?;
        let (cost, construction_time, tech_required) =
            (unit_data.cost, unit_data.construction_time, unit_data.tech_required.clone());
        if let Some(tech) = tech_required {
            if !self.faction_has_tech(faction, &tech) {
                self.publish(Event::UnitNotUnlocked {
                    unit_name: kind.name().to_string(),
                });
                return Err(GameError::UnitNotUnlocked { unit: kind, tech });
            }
        }

        if queue_full {
            self.publish(Event::notification("Production queue is full"));
            return Err(ProductionError::QueueFull.into());
        }

        self.ensure_affordable(faction, cost, kind.name())?;
        self.pay(faction, cost)?;

        let building = self
            .buildings
            .get_mut(&building_id)
            .ok_or(GameError::BuildingNotFound(building_id))?;
        building.enqueue(QueuedItem::unit(kind, construction_time))?;
        tracing::debug!(building = building_id, %kind, "unit queued");
        Ok(())
    }

    /// Queue research of `tech` at a building that offers it.
    ///
    /// The tech's cost is charged when the research finishes.
    ///
    /// # Errors
    ///
    /// [`GameError::BuildingNotFound`], [`GameError::InvalidCommand`] if the
    /// building does not offer the tech, [`GameError::Research`] if the tech
    /// is unknown, already unlocked or missing a prerequisite, or
    /// [`GameError::Production`] if the queue is full.
    pub fn request_research(&mut self, building_id: EntityId, tech: &TechId) -> Result<()> {
        let (faction, building_kind, queue_full) = self.producer(building_id)?;

        if !self.catalog.building(building_kind)?.can_research(tech) {
            self.publish(Event::notification(format!("{building_kind} cannot research {tech}")));
            return Err(GameError::InvalidCommand(format!("{building_kind} cannot research '{tech}'")));
        }

        let checked = self
            .player_mut(faction)
            .tech
            .check_research(tech)
            .map(|entry| entry.research_seconds);
        let research_seconds = match checked {
            Ok(seconds) => seconds,
            Err(err) => {
                self.publish(Event::notification(err.to_string()));
                return Err(err.into());
            }
        };
        if queue_full {
            self.publish(Event::notification("Production queue is full"));
            return Err(ProductionError::QueueFull.into());
        }

        let ticks = research_seconds.saturating_mul(self.config.ticks_per_second);
        let building = self
            .buildings
            .get_mut(&building_id)
            .ok_or(GameError::BuildingNotFound(building_id))?;
        building.enqueue(QueuedItem::tech(tech.clone(), ticks))?;
        tracing::debug!(building = building_id, %tech, ticks, "research queued");
        Ok(())
    }

    /// Set where units produced by a building walk to.
    ///
    /// # Errors
    ///
    /// [`GameError::BuildingNotFound`], or [`GameError::Production`] for
    /// buildings that produce nothing.
    pub fn set_rally_point(&mut self, building_id: EntityId, point: Vec2) -> Result<()> {
        let building = self
            .buildings
            .get_mut(&building_id)
            .ok_or(GameError::BuildingNotFound(building_id))?;
        if building.queue().is_none() {
            return Err(ProductionError::NotAProducer.into());
        }
        building.set_rally_point(point);
        Ok(())
    }

    /// Unlock a tech for a faction immediately, paying its cost.
    ///
    /// # Errors
    ///
    /// [`GameError::Research`] with the reason the unlock failed.
    pub fn unlock_tech(&mut self, faction: Faction, tech: &TechId) -> Result<()> {
        let player = self.player_mut(faction);
        player.tech.unlock(tech, &mut player.economy)?;
        tracing::info!(%faction, %tech, "tech unlocked");
        Ok(())
    }

    /// Announce the end of a scripted scene between two royals.
    ///
    /// # Errors
    ///
    /// [`GameError::UnitNotFound`] if either unit is gone.
    pub fn complete_scene(&mut self, royal_ant_id: EntityId, royal_roach_id: EntityId) -> Result<()> {
        for id in [royal_ant_id, royal_roach_id] {
            if !self.units.contains_key(&id) {
                return Err(GameError::UnitNotFound(id));
            }
        }
        self.publish(Event::SceneCompletion {
            royal_ant_id,
            royal_roach_id,
        });
        Ok(())
    }

    /// Publish a shortfall and fail if `faction` cannot pay `cost`.
    fn ensure_affordable(&mut self, faction: Faction, cost: ResourceCost, item: &str) -> Result<()> {
        let economy = self.player_mut(faction).economy;
        let Some((resource, required, available)) = cost.shortfall(&economy) else {
            return Ok(());
        };
        tracing::debug!(%faction, item, %resource, required, available, "purchase refused");
        self.publish(Event::NotEnoughResources {
            resource_name: resource.name().to_string(),
            unit_being_built: item.to_string(),
        });
        Err(GameError::InsufficientResources {
            resource,
            required,
            available,
        })
    }

    fn pay(&mut self, faction: Faction, cost: ResourceCost) -> Result<()> {
        if cost.purchase(&mut self.player_mut(faction).economy) {
            Ok(())
        } else {
            Err(GameError::InvalidState(format!("{faction} could not pay {cost:?}")))
        }
    }

    /// Faction, kind and queue-full flag of a production building.
    fn producer(&mut self, building_id: EntityId) -> Result<(Faction, BuildingKind, bool)> {
        let Some(building) = self.buildings.get(&building_id) else {
            self.publish(Event::notification(format!("Building {building_id} not found")));
            return Err(GameError::BuildingNotFound(building_id));
        };
        let queue = building.queue().ok_or(ProductionError::NotAProducer)?;
        Ok((building.faction, building.kind, queue.is_full()))
    }

    // ------------------------------------------------------------------
    // Helpers used by unit behaviour
    // ------------------------------------------------------------------

    /// Closest living unit of another faction, by center distance.
    ///
    /// Ties go to the lower id.
    pub(crate) fn nearest_enemy(&self, unit: &Unit) -> Option<(EntityId, Vec2)> {
        let origin = unit.center();
        let mut best: Option<(EntityId, Vec2, f64)> = None;
        for other in self.units.values() {
            if other.id == unit.id || other.faction == unit.faction || !other.is_alive() {
                continue;
            }
            let center = other.center();
            let dist = origin.distance(center);
            if best.map_or(true, |(_, _, d)| dist < d) {
                best = Some((other.id, center, dist));
            }
        }
        best.map(|(id, center, _)| (id, center))
    }

    /// Closest same-faction hive.
    pub(crate) fn nearest_home(&self, unit: &Unit) -> Option<(EntityId, Vec2)> {
        let mut best: Option<(EntityId, Vec2, f64)> = None;
        for building in self.buildings.values() {
            if building.faction != unit.faction || !building.kind.is_home() {
                continue;
            }
            let center = building.center();
            let dist = unit.distance_to(center);
            if best.map_or(true, |(_, _, d)| dist < d) {
                best = Some((building.id, center, dist));
            }
        }
        best.map(|(id, center, _)| (id, center))
    }

    /// Center of the walkable tile a unit should head for to reach `target`.
    pub(crate) fn approach_point(&self, unit: &Unit, target: Vec2) -> Option<Vec2> {
        let (x, y) = self.tilemap.world_to_tile(target)?;
        if self.tilemap.is_walkable(x, y) {
            return Some(self.tilemap.tile_center(x, y));
        }
        let from = unit.tile_coords(self.config.tile_size);
        let (ax, ay) = self.nearest_walkable_adjacent(from, (x, y))?;
        Some(self.tilemap.tile_center(ax, ay))
    }

    pub(crate) fn apply_damage(&mut self, attacker: EntityId, target: EntityId, damage: u32) {
        let Some(victim) = self.units.get_mut(&target) else {
            return;
        };
        victim.take_damage(damage);
        self.pending.damage_events.push(DamageEvent {
            attacker,
            target,
            damage,
        });
        if !victim.is_alive() {
            tracing::debug!(tick = self.tick, attacker, target, "unit killed");
        }
    }

    pub(crate) fn faction_has_tech(&self, faction: Faction, tech: &TechId) -> bool {
        self.players
            .get(&faction)
            .is_some_and(|player| player.tech.is_unlocked(tech))
    }

    pub(crate) fn deposit(&mut self, faction: Faction, kind: ResourceKind, amount: u32) {
        self.player_mut(faction).economy.deposit(kind, amount);
        tracing::trace!(%faction, %kind, amount, "resources delivered");
    }

    /// Stop nearby busy friends of a unit that just arrived.
    pub(crate) fn broadcast_arrived_idle(&mut self, origin: &Unit) {
        self.spread_arrived_idle(origin.id, origin.center(), origin.faction);
    }

    /// Pass an arrival on: every same-faction unit within the friend radius
    /// that is on an interruptible order stops, and passes it on in turn.
    fn spread_arrived_idle(&mut self, origin: EntityId, center: Vec2, faction: Faction) {
        let radius = self.config.nearby_friend_radius;
        let mut reached = BTreeSet::from([origin]);
        let mut frontier = vec![center];

        while let Some(from) = frontier.pop() {
            let recipients: Vec<EntityId> = self
                .units
                .values()
                .filter(|u| u.faction == faction && !reached.contains(&u.id))
                .filter(|u| u.state.is_interruptible() && u.distance_to(from) <= radius)
                .map(|u| u.id)
                .collect();
            for id in recipients {
                reached.insert(id);
                if let Some(unit) = self.units.get_mut(&id) {
                    unit.stop();
                    frontier.push(unit.center());
                    tracing::trace!(unit = id, origin, "stopped by arriving friend");
                }
            }
        }
    }

    fn player_mut(&mut self, faction: Faction) -> &mut PlayerState {
        let catalog = &self.catalog;
        let economy = self.config.starting_economy;
        self.players.entry(faction).or_insert_with(|| PlayerState {
            economy,
            tech: TechTree::new(catalog.technologies.iter().cloned()),
        })
    }

    fn publish(&mut self, event: Event) {
        if let Err(err) = self.bus.publish(&event) {
            tracing::warn!(%err, "event dropped");
        }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Get the current tick number.
    #[must_use]
    pub const fn get_tick(&self) -> u64 {
        self.tick
    }

    /// All active units in id order.
    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }

    /// All active buildings in id order.
    pub fn buildings(&self) -> impl Iterator<Item = &Building> {
        self.buildings.values()
    }

    /// Look up a unit.
    #[must_use]
    pub fn unit(&self, id: EntityId) -> Option<&Unit> {
        self.units.get(&id)
    }

    /// Look up a building.
    #[must_use]
    pub fn building(&self, id: EntityId) -> Option<&Building> {
        self.buildings.get(&id)
    }

    /// Resolve an id to a unit or a building.
    ///
    /// # Errors
    ///
    /// [`GameError::EntityNotFound`] if neither exists.
    pub fn entity(&self, id: EntityId) -> Result<EntityRef<'_>> {
        if let Some(unit) = self.units.get(&id) {
            return Ok(EntityRef::Unit(unit));
        }
        self.buildings
            .get(&id)
            .map(EntityRef::Building)
            .ok_or(GameError::EntityNotFound(id))
    }

    /// Production or construction progress of a building, `0.0..=1.0`.
    ///
    /// # Errors
    ///
    /// [`GameError::BuildingNotFound`].
    pub fn building_progress(&self, id: EntityId) -> Result<f64> {
        self.buildings
            .get(&id)
            .map(Building::progress)
            .ok_or(GameError::BuildingNotFound(id))
    }

    /// Resource totals of a faction, if it has ever owned anything.
    #[must_use]
    pub fn economy(&self, faction: Faction) -> Option<&PlayerEconomy> {
        self.players.get(&faction).map(|player| &player.economy)
    }

    /// Mutable resource totals, creating the faction if needed.
    pub fn economy_mut(&mut self, faction: Faction) -> &mut PlayerEconomy {
        &mut self.player_mut(faction).economy
    }

    /// Tech tree of a faction, if it has ever owned anything.
    #[must_use]
    pub fn tech_tree(&self, faction: Faction) -> Option<&TechTree> {
        self.players.get(&faction).map(|player| &player.tech)
    }

    /// Player fog grid.
    #[must_use]
    pub const fn fog(&self) -> &FogOfWar {
        &self.fog
    }

    /// The tile map, including registered building footprints.
    #[must_use]
    pub const fn tilemap(&self) -> &TileMap {
        &self.tilemap
    }

    /// Event bus, for subscribing.
    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.bus
    }

    /// Event bus.
    #[must_use]
    pub const fn events(&self) -> &EventBus {
        &self.bus
    }

    /// Tunables in use.
    #[must_use]
    pub const fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Stat catalog in use.
    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Compute a hash of the current simulation state.
    ///
    /// Two simulations fed the same commands produce the same hash.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.tick.hash(&mut hasher);

        self.units.len().hash(&mut hasher);
        for unit in self.units.values() {
            unit.id.hash(&mut hasher);
            unit.kind.hash(&mut hasher);
            unit.faction.hash(&mut hasher);
            unit.position.to_bits().hash(&mut hasher);
            unit.moving_angle.to_bits().hash(&mut hasher);
            unit.stats.hp_cur.hash(&mut hasher);
            unit.stats.attack_frames_cur.hash(&mut hasher);
            unit.stats.resources_carried.hash(&mut hasher);
            unit.state.name().hash(&mut hasher);
            if let UnitState::Harvesting { timer } = unit.state {
                timer.hash(&mut hasher);
            }
            unit.destinations.len().hash(&mut hasher);
            for waypoint in &unit.destinations {
                waypoint.to_bits().hash(&mut hasher);
            }
            unit.nearest_enemy.hash(&mut hasher);
        }

        self.buildings.len().hash(&mut hasher);
        for building in self.buildings.values() {
            building.id.hash(&mut hasher);
            building.kind.hash(&mut hasher);
            building.faction.hash(&mut hasher);
            building.position.to_bits().hash(&mut hasher);
            building.stats.hp_cur.hash(&mut hasher);
            building.stats.progress_current.hash(&mut hasher);
            building.queue().map_or(0, |q| q.len()).hash(&mut hasher);
        }

        for (faction, player) in &self.players {
            faction.hash(&mut hasher);
            player.economy.hash(&mut hasher);
            for tech in player.tech.unlocked() {
                tech.hash(&mut hasher);
            }
        }

        self.fog.tiles().hash(&mut hasher);

        hasher.finish()
    }

    /// Check structural invariants, returning a description of each violation.
    #[must_use]
    pub fn check_invariants(&self) -> Vec<String> {
        let mut violations = Vec::new();

        for unit in self.units.values() {
            if !unit.is_alive() {
                violations.push(format!("dead unit {} still active", unit.id));
            }
            if unit.stats.hp_cur > unit.stats.hp_max {
                violations.push(format!("unit {} health above maximum", unit.id));
            }
            if unit.rect.min != unit.position {
                violations.push(format!("unit {} box out of sync with position", unit.id));
            }
            if self.buildings.contains_key(&unit.id) {
                violations.push(format!("id {} names both a unit and a building", unit.id));
            }
        }

        for building in self.buildings.values() {
            let registered = self.tilemap.collision_rects().contains(&building.rect);
            if building.collision && !registered {
                violations.push(format!("building {} footprint not registered", building.id));
            }
            if building.construction_target().is_some()
                && building.stats.progress_current > building.stats.progress_max
            {
                violations.push(format!("site {} progress past completion", building.id));
            }
        }

        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn sim() -> Sim {
        Sim::from_map(TileMap::new(16, 16, 128.0)).unwrap()
    }

    #[test]
    fn test_simulation_new() {
        let sim = sim();
        assert_eq!(sim.get_tick(), 0);
        assert_eq!(sim.units().count(), 0);
        assert_eq!(sim.economy(Faction::PLAYER), Some(&PlayerEconomy::new(9999, 0)));
    }

    #[test]
    fn test_new_rejects_tile_size_mismatch() {
        let result = Sim::new(Catalog::default(), SimConfig::default(), TileMap::new(4, 4, 64.0));
        assert!(matches!(result, Err(GameError::InvalidState(_))));
    }

    #[test]
    fn test_new_rejects_invalid_catalog() {
        let mut catalog = Catalog::default();
        catalog.buildings.remove(&BuildingKind::InConstruction);
        let result = Sim::new(catalog, SimConfig::default(), TileMap::new(4, 4, 128.0));
        assert!(matches!(result, Err(GameError::InvalidCatalog(_))));
    }

    #[test]
    fn test_spawn_unit_centers_box() {
        let mut sim = sim();
        let id = sim
            .spawn_unit(UnitKind::Worker, Faction::PLAYER, Vec2::new(192.0, 64.0))
            .unwrap();
        let unit = sim.unit(id).unwrap();
        assert_eq!(unit.center(), Vec2::new(192.0, 64.0));
        assert_eq!(unit.state, UnitState::Idle);
        assert_eq!(sim.tick().spawned, vec![id]);
    }

    #[test]
    fn test_ids_are_shared_between_units_and_buildings() {
        let mut sim = sim();
        let hive = sim
            .spawn_building(BuildingKind::AntHive, Faction::PLAYER, (0, 0))
            .unwrap();
        let ant = sim
            .spawn_unit(UnitKind::Worker, Faction::PLAYER, Vec2::new(448.0, 64.0))
            .unwrap();
        assert_ne!(hive, ant);
        assert!(matches!(sim.entity(hive), Ok(EntityRef::Building(_))));
        assert!(matches!(sim.entity(ant), Ok(EntityRef::Unit(_))));
        assert!(matches!(sim.entity(999), Err(GameError::EntityNotFound(999))));
    }

    #[test]
    fn test_spawn_building_registers_footprint() {
        let mut sim = sim();
        let hive = sim
            .spawn_building(BuildingKind::AntHive, Faction::PLAYER, (1, 1))
            .unwrap();
        assert!(!sim.tilemap().is_walkable(1, 1));
        assert!(!sim.tilemap().is_walkable(2, 2));
        assert!(sim.tilemap().is_walkable(3, 1));

        sim.despawn(hive).unwrap();
        assert!(sim.tilemap().is_walkable(1, 1));
        assert!(sim.despawn(hive).is_err());
    }

    #[test]
    fn test_bridge_has_no_footprint() {
        let mut sim = sim();
        sim.spawn_building(BuildingKind::Bridge, Faction::PLAYER, (2, 2))
            .unwrap();
        assert!(sim.tilemap().is_walkable(2, 2));
    }

    #[test]
    fn test_spawn_building_rejects_construction_site() {
        let mut sim = sim();
        let result = sim.spawn_building(BuildingKind::InConstruction, Faction::PLAYER, (0, 0));
        assert!(matches!(result, Err(GameError::InvalidCommand(_))));
    }

    #[test]
    fn test_tick_increments() {
        let mut sim = sim();
        for expected in 1..=5 {
            sim.tick();
            assert_eq!(sim.get_tick(), expected);
        }
    }

    #[test]
    fn test_move_to_plain_ground() {
        let mut sim = sim();
        let ant = sim
            .spawn_unit(UnitKind::Worker, Faction::PLAYER, Vec2::new(64.0, 64.0))
            .unwrap();
        sim.issue_move(ant, Vec2::new(700.0, 80.0)).unwrap();

        let unit = sim.unit(ant).unwrap();
        assert_eq!(unit.state, UnitState::moving());
        assert_eq!(unit.destinations.front(), Some(&Vec2::new(704.0, 64.0)));
    }

    #[test]
    fn test_move_onto_resource_starts_harvest_trip() {
        let mut map = TileMap::new(8, 8, 128.0);
        map.set_tile(4, 0, crate::kinds::TileKind::Sucrose);
        let mut sim = Sim::from_map(map).unwrap();
        let ant = sim
            .spawn_unit(UnitKind::Worker, Faction::PLAYER, Vec2::new(64.0, 64.0))
            .unwrap();
        sim.issue_move(ant, Vec2::new(600.0, 10.0)).unwrap();

        let unit = sim.unit(ant).unwrap();
        assert_eq!(
            unit.state,
            UnitState::moving_then(UnitState::Harvesting { timer: 0 })
        );
        assert_eq!(unit.last_resource_pos, Some(Vec2::new(576.0, 64.0)));
    }

    #[test]
    fn test_move_onto_enemy_is_attack_move() {
        let mut sim = sim();
        let ant = sim
            .spawn_unit(UnitKind::Worker, Faction::PLAYER, Vec2::new(64.0, 64.0))
            .unwrap();
        sim.spawn_unit(UnitKind::Roach, Faction(1), Vec2::new(1000.0, 1000.0))
            .unwrap();
        sim.issue_move(ant, Vec2::new(1010.0, 990.0)).unwrap();
        assert_eq!(sim.unit(ant).unwrap().state, UnitState::AttackMove);
    }

    #[test]
    fn test_move_into_building_targets_adjacent_tile() {
        let mut sim = sim();
        sim.spawn_building(BuildingKind::AntHive, Faction::PLAYER, (2, 2))
            .unwrap();
        let ant = sim
            .spawn_unit(UnitKind::Worker, Faction::PLAYER, Vec2::new(64.0, 64.0))
            .unwrap();
        sim.issue_move(ant, Vec2::new(400.0, 400.0)).unwrap();

        // Closest bordering tile to (0, 0) is on the top edge.
        let waypoint = *sim.unit(ant).unwrap().destinations.front().unwrap();
        assert_eq!(waypoint, sim.tilemap().tile_center(2, 1));
    }

    #[test]
    fn test_unknown_unit_order_is_reported() {
        let mut sim = sim();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        sim.events_mut().subscribe(Event::NOTIFICATION, move |event, _| {
            sink.borrow_mut().push(event.clone());
        });

        let result = sim.issue_move(42, Vec2::new(10.0, 10.0));
        assert!(matches!(result, Err(GameError::UnitNotFound(42))));
        assert_eq!(*seen.borrow(), vec![Event::notification("Unit 42 not found")]);
    }

    #[test]
    fn test_off_map_move_is_rejected() {
        let mut sim = sim();
        let ant = sim
            .spawn_unit(UnitKind::Worker, Faction::PLAYER, Vec2::new(64.0, 64.0))
            .unwrap();
        let result = sim.issue_move(ant, Vec2::new(-10.0, 64.0));
        assert!(matches!(result, Err(GameError::InvalidCommand(_))));
        assert_eq!(sim.unit(ant).unwrap().state, UnitState::Idle);
    }

    #[test]
    fn test_issue_attack_rejects_friendly_target() {
        let mut sim = sim();
        let a = sim
            .spawn_unit(UnitKind::Worker, Faction::PLAYER, Vec2::new(64.0, 64.0))
            .unwrap();
        let b = sim
            .spawn_unit(UnitKind::Worker, Faction::PLAYER, Vec2::new(128.0, 64.0))
            .unwrap();
        assert!(matches!(sim.issue_attack(a, b), Err(GameError::InvalidCommand(_))));
    }

    #[test]
    fn test_group_move_contracts_wide_groups() {
        let mut sim = sim();
        let a = sim
            .spawn_unit(UnitKind::Worker, Faction::PLAYER, Vec2::new(192.0, 192.0))
            .unwrap();
        let b = sim
            .spawn_unit(UnitKind::Worker, Faction::PLAYER, Vec2::new(960.0, 192.0))
            .unwrap();

        let issued = sim.issue_group_move(&[a, b, 999], Vec2::new(576.0, 1216.0));
        assert_eq!(issued, 2);

        // Offsets of +-384 px shrink to +-120 px: targets at x = 456 and 696.
        let da = *sim.unit(a).unwrap().destinations.front().unwrap();
        let db = *sim.unit(b).unwrap().destinations.front().unwrap();
        assert_eq!(da, sim.tilemap().tile_center(3, 9));
        assert_eq!(db, sim.tilemap().tile_center(5, 9));
    }

    #[test]
    fn test_arrived_idle_message_stops_nearby_movers() {
        let mut sim = sim();
        let a = sim
            .spawn_unit(UnitKind::Worker, Faction::PLAYER, Vec2::new(192.0, 192.0))
            .unwrap();
        let b = sim
            .spawn_unit(UnitKind::Worker, Faction::PLAYER, Vec2::new(320.0, 192.0))
            .unwrap();
        let c = sim
            .spawn_unit(UnitKind::Worker, Faction::PLAYER, Vec2::new(448.0, 192.0))
            .unwrap();
        let far = sim
            .spawn_unit(UnitKind::Worker, Faction::PLAYER, Vec2::new(1600.0, 1600.0))
            .unwrap();
        for id in [b, c, far] {
            sim.issue_move(id, Vec2::new(1900.0, 1900.0)).unwrap();
        }

        sim.send_unit_message(a, UnitMessage::ArrivedIdle).unwrap();

        // b is within reach of a, c within reach of b.
        assert_eq!(sim.unit(b).unwrap().state, UnitState::Idle);
        assert_eq!(sim.unit(c).unwrap().state, UnitState::Idle);
        assert!(sim.unit(c).unwrap().destinations.is_empty());
        assert_eq!(sim.unit(far).unwrap().state, UnitState::moving());
    }

    #[test]
    fn test_rally_point_requires_producer() {
        let mut sim = sim();
        let bridge = sim
            .spawn_building(BuildingKind::Bridge, Faction::PLAYER, (2, 2))
            .unwrap();
        let hive = sim
            .spawn_building(BuildingKind::AntHive, Faction::PLAYER, (5, 5))
            .unwrap();
        assert!(sim.set_rally_point(bridge, Vec2::new(0.0, 0.0)).is_err());
        sim.set_rally_point(hive, Vec2::new(100.0, 100.0)).unwrap();
        assert_eq!(sim.building(hive).unwrap().rally_point, Some(Vec2::new(100.0, 100.0)));
    }

    #[test]
    fn test_deterministic_hash() {
        let build = || {
            let mut sim = sim();
            sim.spawn_unit(UnitKind::Worker, Faction::PLAYER, Vec2::new(64.0, 64.0))
                .unwrap();
            sim.spawn_unit(UnitKind::Roach, Faction(1), Vec2::new(900.0, 900.0))
                .unwrap();
            sim.issue_attack_move(1, Vec2::new(900.0, 900.0)).unwrap();
            sim
        };
        let mut a = build();
        let mut b = build();
        for _ in 0..50 {
            a.tick();
            b.tick();
            assert_eq!(a.state_hash(), b.state_hash());
        }
    }

    #[test]
    fn test_hash_changes_with_state() {
        let mut sim = sim();
        let before = sim.state_hash();
        sim.spawn_unit(UnitKind::Worker, Faction::PLAYER, Vec2::new(64.0, 64.0))
            .unwrap();
        assert_ne!(before, sim.state_hash());
    }

    #[test]
    fn test_invariants_hold_on_fresh_sim() {
        let mut sim = sim();
        sim.spawn_building(BuildingKind::AntHive, Faction::PLAYER, (0, 0))
            .unwrap();
        sim.spawn_unit(UnitKind::Worker, Faction::PLAYER, Vec2::new(448.0, 64.0))
            .unwrap();
        sim.tick();
        assert!(sim.check_invariants().is_empty(), "{:?}", sim.check_invariants());
    }
}
