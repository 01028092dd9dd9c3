//! Player fog of war driven by the simulation.

use colony_core::prelude::*;
use colony_test_utils::fixtures::{config, empty_sim, open_map, tile_center};

#[test]
fn test_fresh_map_is_unexplored() {
    let sim = empty_sim();
    assert_eq!(sim.fog().count(FogState::Unexplored), 256);
}

#[test]
fn test_unit_reveals_vision_circle() {
    let mut sim = empty_sim();
    sim.spawn_unit(UnitKind::Worker, Faction::PLAYER, tile_center(5, 5))
        .unwrap();
    sim.tick();

    let fog = sim.fog();
    assert_eq!(fog.state(5, 5), Some(FogState::Visible));
    assert_eq!(fog.state(9, 5), Some(FogState::Visible));
    assert_eq!(fog.state(5, 1), Some(FogState::Visible));
    assert_eq!(fog.state(10, 5), Some(FogState::Unexplored));
    assert_eq!(fog.state(9, 9), Some(FogState::Unexplored));
}

#[test]
fn test_enemy_units_reveal_nothing() {
    let mut sim = empty_sim();
    sim.spawn_unit(UnitKind::Roach, Faction(1), tile_center(5, 5))
        .unwrap();
    sim.tick();
    assert_eq!(sim.fog().count(FogState::Visible), 0);
}

#[test]
fn test_hive_sees_from_its_corner() {
    let mut sim = empty_sim();
    sim.spawn_building(BuildingKind::AntHive, Faction::PLAYER, (0, 0))
        .unwrap();
    sim.tick();

    let fog = sim.fog();
    assert_eq!(fog.state(9, 0), Some(FogState::Visible));
    assert_eq!(fog.state(10, 0), Some(FogState::Unexplored));
    assert_eq!(fog.state(6, 6), Some(FogState::Visible));
    assert_eq!(fog.state(7, 7), Some(FogState::Unexplored));
}

#[test]
fn test_lost_sight_becomes_memory() {
    let mut sim = empty_sim();
    let scout = sim
        .spawn_unit(UnitKind::Worker, Faction::PLAYER, tile_center(5, 5))
        .unwrap();
    sim.tick();
    let visible = sim.fog().count(FogState::Visible);

    sim.despawn(scout).unwrap();
    sim.tick();

    assert_eq!(sim.fog().count(FogState::Visible), 0);
    assert_eq!(sim.fog().count(FogState::Memory), visible);
    assert_eq!(sim.fog().state(5, 5), Some(FogState::Memory));
}

#[test]
fn test_moving_scout_leaves_memory_behind() {
    let mut sim = empty_sim();
    let scout = sim
        .spawn_unit(UnitKind::Worker, Faction::PLAYER, tile_center(1, 8))
        .unwrap();
    sim.issue_move(scout, tile_center(14, 8)).unwrap();

    for _ in 0..200 {
        sim.tick();
        if sim.unit(scout).unwrap().state == UnitState::Idle {
            break;
        }
    }
    let fog = sim.fog();
    assert_eq!(fog.state(0, 8), Some(FogState::Memory));
    assert_eq!(fog.state(14, 8), Some(FogState::Visible));
    let total = fog.count(FogState::Unexplored) + fog.count(FogState::Memory) + fog.count(FogState::Visible);
    assert_eq!(total, 256);
}

#[test]
fn test_disabled_fog_stays_unexplored() {
    let mut config = config();
    config.fog_enabled = false;
    let mut sim = Sim::new(Catalog::default(), config, open_map(16, 16)).unwrap();
    sim.spawn_unit(UnitKind::Worker, Faction::PLAYER, tile_center(5, 5))
        .unwrap();
    sim.tick();
    assert_eq!(sim.fog().count(FogState::Unexplored), 256);
}
