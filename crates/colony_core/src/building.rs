//! Buildings, production queues and the construction-site lifecycle.
//!
//! A [`Building`] carries the fields every structure shares plus a
//! [`BuildingVariant`] for the type-specific parts. Producers (hives and
//! barracks) own a FIFO [`ProductionQueue`]; a construction site counts up
//! to its target's build time and then asks the simulation to replace it.
//!
//! [`Building::update`] never touches the world. It reports what happened
//! as a [`BuildingOutcome`] and the simulation applies it.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::components::{EntityId, Faction};
use crate::data::BuildingData;
use crate::economy::ResourceCost;
use crate::error::ProductionError;
use crate::kinds::{BuildingKind, UnitKind};
use crate::math::{Rect, Vec2};
use crate::tech::TechId;

/// What a queue entry produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueuedPayload {
    /// Spawn a unit next to the building.
    Unit(UnitKind),
    /// Unlock a tech for the owning faction.
    Tech(TechId),
}

/// One entry in a production queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedItem {
    /// What completes.
    pub payload: QueuedPayload,
    /// Total time in ticks.
    pub construction_time: u32,
    /// Ticks spent so far.
    elapsed: u32,
}

impl QueuedItem {
    /// Queue entry for a unit.
    #[must_use]
    pub const fn unit(kind: UnitKind, construction_time: u32) -> Self {
        Self {
            payload: QueuedPayload::Unit(kind),
            construction_time,
            elapsed: 0,
        }
    }

    /// Queue entry for a tech.
    #[must_use]
    pub const fn tech(id: TechId, construction_time: u32) -> Self {
        Self {
            payload: QueuedPayload::Tech(id),
            construction_time,
            elapsed: 0,
        }
    }

    /// Ticks spent so far.
    #[must_use]
    pub const fn elapsed(&self) -> u32 {
        self.elapsed
    }

    /// Ticks still to go.
    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.construction_time.saturating_sub(self.elapsed)
    }

    /// Whether the item is done.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.elapsed >= self.construction_time
    }
}

/// FIFO production queue. Only the front item makes progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionQueue {
    queue: VecDeque<QueuedItem>,
    max_queue_size: usize,
}

impl Default for ProductionQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl ProductionQueue {
    /// Default maximum queue size.
    pub const DEFAULT_MAX_QUEUE_SIZE: usize = 5;

    /// Create a new empty production queue.
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_size(Self::DEFAULT_MAX_QUEUE_SIZE)
    }

    /// Create a production queue with a specific max size.
    #[must_use]
    pub fn with_max_size(max_queue_size: usize) -> Self {
        Self {
            queue: VecDeque::new(),
            max_queue_size,
        }
    }

    /// Check if the queue is full.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.queue.len() >= self.max_queue_size
    }

    /// Check if the queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Get the number of items in the queue.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Append an item.
    ///
    /// # Errors
    ///
    /// Returns [`ProductionError::QueueFull`] if the queue is full.
    pub fn add(&mut self, item: QueuedItem) -> Result<(), ProductionError> {
        if self.is_full() {
            return Err(ProductionError::QueueFull);
        }
        self.queue.push_back(item);
        Ok(())
    }

    /// Get the currently producing item.
    #[must_use]
    pub fn current(&self) -> Option<&QueuedItem> {
        self.queue.front()
    }

    /// Items in production order.
    pub fn iter(&self) -> impl Iterator<Item = &QueuedItem> {
        self.queue.iter()
    }

    /// Put a finished item back at the front so it completes again on the
    /// next [`advance`](Self::advance).
    ///
    /// Used when a produced unit has nowhere to spawn. The item was just
    /// taken off this queue, so the size cap is not checked.
    pub fn hold(&mut self, item: QueuedItem) {
        self.queue.push_front(item);
    }

    /// Advance the front item by one tick.
    ///
    /// Returns the item once it completes; it is removed from the queue.
    pub fn advance(&mut self) -> Option<QueuedItem> {
        let front = self.queue.front_mut()?;
        front.elapsed = front.elapsed.saturating_add(1);
        if front.is_complete() {
            self.queue.pop_front()
        } else {
            None
        }
    }
}

/// Live stats of one building.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingStats {
    /// Display name.
    pub name: String,
    /// Maximum health.
    pub hp_max: u32,
    /// Current health.
    pub hp_cur: u32,
    /// Price paid to place it.
    pub cost: ResourceCost,
    /// Build time of the kind in ticks.
    pub construction_time: u32,
    /// Vision radius in tiles.
    pub vision_range: u32,
    /// Footprint side in pixels.
    pub size_px: f64,
    /// Ticks needed by the current job.
    pub progress_max: u32,
    /// Ticks spent on the current job.
    pub progress_current: u32,
}

impl BuildingStats {
    /// Instance stats from a catalog entry.
    #[must_use]
    pub fn from_data(data: &BuildingData) -> Self {
        Self {
            name: data.name.clone(),
            hp_max: data.hp_max,
            hp_cur: data.hp_max,
            cost: data.cost,
            construction_time: data.construction_time,
            vision_range: data.vision_range,
            size_px: data.size_px,
            progress_max: 0,
            progress_current: 0,
        }
    }
}

/// Type-specific building state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildingVariant {
    /// Ant or roach hive.
    Hive {
        /// Units and research in progress.
        queue: ProductionQueue,
    },
    /// Fighter production.
    Barracks {
        /// Units in progress.
        queue: ProductionQueue,
    },
    /// Walkable span.
    Bridge,
    /// Placeholder that becomes `target` when finished.
    InConstruction {
        /// Building that replaces the site.
        target: BuildingKind,
    },
}

/// Result of one building update that the world has to apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildingOutcome {
    /// A queue item finished.
    Produced(QueuedItem),
    /// A construction site finished and should be replaced.
    ConstructionFinished {
        /// Building to put in its place.
        target: BuildingKind,
    },
}

/// A structure on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Building {
    /// Unique id.
    pub id: EntityId,
    /// Building type.
    pub kind: BuildingKind,
    /// Owner.
    pub faction: Faction,
    /// Live stats.
    pub stats: BuildingStats,
    /// Top-left corner in pixels.
    pub position: Vec2,
    /// Footprint.
    pub rect: Rect,
    /// Where produced units walk to.
    pub rally_point: Option<Vec2>,
    /// Whether units collide with the footprint.
    pub collision: bool,
    /// Type-specific state.
    pub variant: BuildingVariant,
}

impl Building {
    /// Instance a building of `kind` with its top-left corner at `origin`.
    #[must_use]
    pub fn new(id: EntityId, kind: BuildingKind, faction: Faction, data: &BuildingData, origin: Vec2) -> Self {
        let variant = match kind {
            BuildingKind::AntHive | BuildingKind::RoachHive => BuildingVariant::Hive {
                queue: ProductionQueue::new(),
            },
            BuildingKind::Barracks => BuildingVariant::Barracks {
                queue: ProductionQueue::new(),
            },
            BuildingKind::Bridge => BuildingVariant::Bridge,
            BuildingKind::InConstruction => BuildingVariant::InConstruction {
                target: BuildingKind::Bridge,
            },
        };
        Self {
            id,
            kind,
            faction,
            stats: BuildingStats::from_data(data),
            position: origin,
            rect: Rect::from_origin_size(origin, data.size_px, data.size_px),
            rally_point: None,
            collision: data.collision,
            variant,
        }
    }

    /// A construction site covering `footprint` that turns into `target`.
    ///
    /// Progress runs to the target's construction time.
    #[must_use]
    pub fn construction_site(
        id: EntityId,
        faction: Faction,
        site: &BuildingData,
        target: BuildingKind,
        target_data: &BuildingData,
        footprint: Rect,
    ) -> Self {
        let mut stats = BuildingStats::from_data(site);
        stats.size_px = footprint.width();
        stats.progress_max = target_data.construction_time;
        Self {
            id,
            kind: BuildingKind::InConstruction,
            faction,
            stats,
            position: footprint.min,
            rect: footprint,
            rally_point: None,
            collision: site.collision,
            variant: BuildingVariant::InConstruction { target },
        }
    }

    /// Center of the footprint.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        self.rect.center()
    }

    /// Distance from the footprint's nearest edge to `point`.
    #[must_use]
    pub fn edge_distance_to(&self, point: Vec2) -> f64 {
        self.rect.edge_distance_to(point)
    }

    /// Fraction of the current job done, in `0.0..=1.0`.
    ///
    /// Zero when nothing is being built.
    #[must_use]
    pub fn progress(&self) -> f64 {
        if self.stats.progress_max == 0 {
            return 0.0;
        }
        (f64::from(self.stats.progress_current) / f64::from(self.stats.progress_max)).min(1.0)
    }

    /// Production queue, for hives and barracks.
    #[must_use]
    pub fn queue(&self) -> Option<&ProductionQueue> {
        match &self.variant {
            BuildingVariant::Hive { queue } | BuildingVariant::Barracks { queue } => Some(queue),
            BuildingVariant::Bridge | BuildingVariant::InConstruction { .. } => None,
        }
    }

    /// Mutable production queue, for hives and barracks.
    pub fn queue_mut(&mut self) -> Option<&mut ProductionQueue> {
        match &mut self.variant {
            BuildingVariant::Hive { queue } | BuildingVariant::Barracks { queue } => Some(queue),
            BuildingVariant::Bridge | BuildingVariant::InConstruction { .. } => None,
        }
    }

    /// Append an item to the production queue.
    ///
    /// # Errors
    ///
    /// [`ProductionError::NotAProducer`] if the building has no queue, or
    /// [`ProductionError::QueueFull`].
    pub fn enqueue(&mut self, item: QueuedItem) -> Result<(), ProductionError> {
        self.queue_mut()
            .ok_or(ProductionError::NotAProducer)?
            .add(item)
    }

    /// Target of a construction site.
    #[must_use]
    pub const fn construction_target(&self) -> Option<BuildingKind> {
        match self.variant {
            BuildingVariant::InConstruction { target } => Some(target),
            _ => None,
        }
    }

    /// Set where produced units walk to.
    pub fn set_rally_point(&mut self, point: Vec2) {
        self.rally_point = Some(point);
    }

    /// Whether the building still stands.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.stats.hp_cur > 0
    }

    /// Tiles bordering the footprint: top edge, bottom edge, left edge,
    /// then right edge. May include coordinates off the map.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn adjacent_tiles(&self, tile_size: f64) -> Vec<(i64, i64)> {
        let min_x = (self.rect.min.x / tile_size).floor() as i64;
        let min_y = (self.rect.min.y / tile_size).floor() as i64;
        let max_x = ((self.rect.max.x - 1.0) / tile_size).floor() as i64;
        let max_y = ((self.rect.max.y - 1.0) / tile_size).floor() as i64;

        let mut tiles = Vec::new();
        tiles.extend((min_x..=max_x).map(|x| (x, min_y - 1)));
        tiles.extend((min_x..=max_x).map(|x| (x, max_y + 1)));
        tiles.extend((min_y..=max_y).map(|y| (min_x - 1, y)));
        tiles.extend((min_y..=max_y).map(|y| (max_x + 1, y)));
        tiles
    }

    /// Advance the building by one tick.
    pub fn update(&mut self) -> Option<BuildingOutcome> {
        match &mut self.variant {
            BuildingVariant::InConstruction { target } => {
                let target = *target;
                self.stats.progress_current += 1;
                if self.stats.progress_current <= self.stats.progress_max {
                    return None;
                }
                self.stats.progress_current = 0;
                Some(BuildingOutcome::ConstructionFinished { target })
            }
            BuildingVariant::Hive { queue } | BuildingVariant::Barracks { queue } => {
                let total = queue.current()?.construction_time;
                self.stats.progress_max = total;
                match queue.advance() {
                    Some(item) => {
                        self.stats.progress_current = 0;
                        Some(BuildingOutcome::Produced(item))
                    }
                    None => {
                        self.stats.progress_current = queue.current().map_or(0, QueuedItem::elapsed);
                        None
                    }
                }
            }
            BuildingVariant::Bridge => None,
        }
    }
}
