//! Test fixtures and helpers.
//!
//! Pre-built maps, simulations and scenarios for consistent testing. Every
//! fixture uses the shipped catalog and a 128 px tile.

use std::cell::RefCell;
use std::rc::Rc;

use colony_core::prelude::*;

/// Tile size used by every fixture.
pub const TILE: f64 = 128.0;

/// Config with the shipped tunables and an empty stockpile.
#[must_use]
pub fn config() -> SimConfig {
    SimConfig {
        tile_size: TILE,
        starting_economy: PlayerEconomy::new(0, 0),
        ..SimConfig::default()
    }
}

/// An all-plain map.
#[must_use]
pub fn open_map(width: u32, height: u32) -> TileMap {
    TileMap::new(width, height, TILE)
}

/// A simulation over `map` with an empty player stockpile.
///
/// # Panics
///
/// Panics if the shipped catalog fails validation.
#[must_use]
pub fn sim_on(map: TileMap) -> Sim {
    Sim::new(Catalog::default(), config(), map).expect("fixture sim")
}

/// An empty 16x16 simulation with an empty player stockpile.
#[must_use]
pub fn empty_sim() -> Sim {
    sim_on(open_map(16, 16))
}

/// Pixel center of tile `(x, y)`.
#[must_use]
pub fn tile_center(x: u32, y: u32) -> Vec2 {
    Vec2::new(
        f64::from(x) * TILE + TILE / 2.0,
        f64::from(y) * TILE + TILE / 2.0,
    )
}

/// Collect every event of one type published on the sim's bus.
pub fn record_events(sim: &mut Sim, event_type: &str) -> Rc<RefCell<Vec<Event>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    sim.events_mut().subscribe(event_type, move |event, _| {
        sink.borrow_mut().push(event.clone());
    });
    log
}

/// A hive, one sucrose tile and one idle worker.
///
/// ```text
/// HH.s....
/// HH.A....
/// ........
/// ```
#[derive(Debug)]
pub struct HarvestScenario {
    /// The simulation.
    pub sim: Sim,
    /// The player's hive at tile (0, 0).
    pub hive: EntityId,
    /// The worker, centered on tile (3, 1).
    pub worker: EntityId,
    /// Center of the sucrose tile (3, 0).
    pub resource: Vec2,
}

impl HarvestScenario {
    /// Build the scenario.
    ///
    /// # Panics
    ///
    /// Panics if the fixture map or entities cannot be created.
    #[must_use]
    pub fn new() -> Self {
        let map = TileMap::from_rows(
            &[
                "...s....", //
                "........",
                "........",
                "........",
                "........",
                "........",
            ],
            TILE,
        )
        .expect("harvest map");
        let mut sim = sim_on(map);
        let hive = sim
            .spawn_building(BuildingKind::AntHive, Faction::PLAYER, (0, 0))
            .expect("hive");
        let worker = sim
            .spawn_unit(UnitKind::Worker, Faction::PLAYER, tile_center(3, 1))
            .expect("worker");
        Self {
            sim,
            hive,
            worker,
            resource: tile_center(3, 0),
        }
    }

    /// Current state of the worker.
    ///
    /// # Panics
    ///
    /// Panics if the worker is gone.
    #[must_use]
    pub fn worker(&self) -> &Unit {
        self.sim.unit(self.worker).expect("worker alive")
    }
}

impl Default for HarvestScenario {
    fn default() -> Self {
        Self::new()
    }
}

/// Two colonies facing each other across a 24x16 map.
///
/// Each side has a hive, `workers` workers harvesting a nearby sucrose
/// field, and `fighters` combat units attack-moving toward the other hive.
/// Deterministic for a given pair of counts.
///
/// # Panics
///
/// Panics if the fixture cannot be built.
#[must_use]
pub fn skirmish(workers: u32, fighters: u32) -> Sim {
    let mut rows = vec!["........................"; 16];
    rows[2] = "....sss...........www...";
    rows[13] = "...www...........sss....";
    rows[7] = "..........##............";
    let map = TileMap::from_rows(&rows, TILE).expect("skirmish map");
    let mut sim = sim_on(map);

    let sides = [
        (Faction::PLAYER, BuildingKind::AntHive, UnitKind::Worker, (1, 1), 4, 2, 21),
        (Faction(1), BuildingKind::RoachHive, UnitKind::Roach, (20, 12), 17, 13, 2),
    ];
    for (faction, hive_kind, worker_kind, hive_tile, field_x, field_y, enemy_x) in sides {
        sim.spawn_building(hive_kind, faction, hive_tile)
            .expect("hive");
        for i in 0..workers {
            let x = field_x + i % 3;
            let y = if field_y < 8 { field_y + 1 + i / 3 } else { field_y - 1 - i / 3 };
            let id = sim
                .spawn_unit(worker_kind, faction, tile_center(x, y))
                .expect("worker");
            sim.issue_move(id, tile_center(field_x + i % 3, field_y))
                .expect("harvest order");
        }
        for i in 0..fighters {
            let x = if enemy_x > 10 { 5 + i % 4 } else { 18 - i % 4 };
            let y = 6 + i / 4;
            let id = sim
                .spawn_unit(UnitKind::Fighter, faction, tile_center(x, y))
                .expect("fighter");
            sim.issue_attack_move(id, tile_center(enemy_x, 8))
                .expect("attack-move order");
        }
    }
    sim
}
