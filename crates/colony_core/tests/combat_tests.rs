//! Combat: attack cadence, deaths, aggro and attack-move.

use colony_core::prelude::*;
use colony_test_utils::fixtures::{config, empty_sim, open_map, tile_center};
use colony_test_utils::logging;

// =============================================================================
// Helpers
// =============================================================================

/// A worker and an enemy roach whose boxes touch side by side.
fn duel() -> (Sim, EntityId, EntityId) {
    let mut sim = empty_sim();
    let ant = sim
        .spawn_unit(UnitKind::Worker, Faction::PLAYER, Vec2::new(192.0, 192.0))
        .unwrap();
    let roach = sim
        .spawn_unit(UnitKind::Roach, Faction(1), Vec2::new(256.0, 192.0))
        .unwrap();
    (sim, ant, roach)
}

// =============================================================================
// Cadence and death
// =============================================================================

#[test]
fn test_combat_to_death() {
    logging::init();
    let (mut sim, ant, roach) = duel();
    sim.issue_attack(ant, roach).unwrap();
    sim.issue_attack(roach, ant).unwrap();
    assert_eq!(sim.unit(ant).unwrap().state, UnitState::Attacking);

    let data = sim.catalog().unit(UnitKind::Worker).unwrap().clone();
    let expected = data.hp_max.div_ceil(data.damage) * data.attack_frames;
    assert_eq!(expected, 300);

    for _ in 1..expected {
        let events = sim.tick();
        assert!(events.deaths.is_empty());
    }
    assert_eq!(sim.unit(roach).unwrap().stats.hp_cur, data.damage);

    let events = sim.tick();
    assert_eq!(events.deaths, vec![roach]);
    assert!(sim.unit(roach).is_none());
    assert!(sim.units().all(|u| u.id != roach));

    // The lower id struck first and survives with one hit left.
    assert_eq!(sim.unit(ant).unwrap().stats.hp_cur, data.damage);

    sim.tick();
    let unit = sim.unit(ant).unwrap();
    assert_eq!(unit.state, UnitState::Idle);
    assert_eq!(unit.nearest_enemy, None);
}

#[test]
fn test_attack_cadence() {
    let (mut sim, ant, roach) = duel();
    sim.issue_attack(ant, roach).unwrap();

    let mut hit_ticks = Vec::new();
    for tick in 1..=130u64 {
        let events = sim.tick();
        let hits: Vec<_> = events
            .damage_events
            .iter()
            .filter(|e| e.attacker == ant)
            .collect();
        assert!(hits.len() <= 1);
        if let Some(hit) = hits.first() {
            assert_eq!(hit.target, roach);
            assert_eq!(hit.damage, 10);
            hit_ticks.push(tick);
        }
    }
    assert_eq!(hit_ticks, vec![30, 60, 90, 120]);
}

#[test]
fn test_idle_unit_retaliates_in_range() {
    let (mut sim, ant, roach) = duel();
    sim.tick();
    // Both noticed each other while idle.
    assert_eq!(sim.unit(ant).unwrap().state, UnitState::Attacking);
    assert_eq!(sim.unit(ant).unwrap().nearest_enemy, Some(roach));
    assert_eq!(sim.unit(roach).unwrap().state, UnitState::Attacking);
}

#[test]
fn test_idle_unit_walks_to_enemy_in_aggro_range() {
    let mut sim = empty_sim();
    let ant = sim
        .spawn_unit(UnitKind::Worker, Faction::PLAYER, tile_center(2, 2))
        .unwrap();
    let roach = sim
        .spawn_unit(UnitKind::Roach, Faction(1), tile_center(5, 2))
        .unwrap();

    sim.tick();
    let unit = sim.unit(ant).unwrap();
    assert_eq!(unit.state, UnitState::moving_then(UnitState::Attacking));
    assert_eq!(unit.nearest_enemy, Some(roach));
}

#[test]
fn test_aggro_chase_does_not_stop_attack_moving_friends() {
    let mut catalog = Catalog::default();
    catalog
        .units
        .get_mut(&UnitKind::Fighter)
        .unwrap()
        .move_speed = 0.0;
    let mut sim = Sim::new(catalog, config(), open_map(16, 16)).unwrap();
    let ant = sim
        .spawn_unit(UnitKind::Worker, Faction::PLAYER, Vec2::new(320.0, 320.0))
        .unwrap();
    let roach = sim
        .spawn_unit(UnitKind::Roach, Faction(1), Vec2::new(576.0, 320.0))
        .unwrap();
    // Parked beside the spot the ant chases to.
    let guard = sim
        .spawn_unit(UnitKind::Fighter, Faction::PLAYER, Vec2::new(500.0, 410.0))
        .unwrap();
    sim.issue_attack_move(guard, tile_center(15, 3)).unwrap();

    sim.tick();
    assert_eq!(
        sim.unit(ant).unwrap().state,
        UnitState::moving_then(UnitState::Attacking)
    );
    sim.despawn(roach).unwrap();

    for _ in 0..60 {
        sim.tick();
    }
    let ant = sim.unit(ant).unwrap();
    assert_eq!(ant.state, UnitState::Idle);
    assert!(ant.center().x > 450.0, "chase never reached the roach's spot");
    let guard = sim.unit(guard).unwrap();
    assert_eq!(guard.state, UnitState::AttackMove);
    assert!(!guard.destinations.is_empty());
}

#[test]
fn test_idle_unit_ignores_distant_enemy() {
    let mut sim = empty_sim();
    let ant = sim
        .spawn_unit(UnitKind::Worker, Faction::PLAYER, tile_center(1, 1))
        .unwrap();
    sim.spawn_unit(UnitKind::Roach, Faction(1), tile_center(12, 12))
        .unwrap();

    for _ in 0..10 {
        sim.tick();
    }
    assert_eq!(sim.unit(ant).unwrap().state, UnitState::Idle);
}

#[test]
fn test_attacker_gives_up_on_vanished_target() {
    let (mut sim, ant, roach) = duel();
    sim.issue_attack(ant, roach).unwrap();
    sim.tick();
    sim.despawn(roach).unwrap();
    sim.tick();

    let unit = sim.unit(ant).unwrap();
    assert_eq!(unit.state, UnitState::Idle);
    assert_eq!(unit.nearest_enemy, None);
    assert_eq!(unit.stats.attack_frames_cur, 0);
}

#[test]
fn test_attack_out_of_range_closes_in_first() {
    let mut sim = empty_sim();
    let fighter = sim
        .spawn_unit(UnitKind::Fighter, Faction::PLAYER, tile_center(1, 1))
        .unwrap();
    let roach = sim
        .spawn_unit(UnitKind::Roach, Faction(1), tile_center(4, 1))
        .unwrap();
    sim.issue_attack(fighter, roach).unwrap();
    assert_eq!(
        sim.unit(fighter).unwrap().state,
        UnitState::moving_then(UnitState::Attacking)
    );

    let mut landed = false;
    for _ in 0..200 {
        let events = sim.tick();
        if events.damage_events.iter().any(|e| e.attacker == fighter) {
            landed = true;
            break;
        }
    }
    assert!(landed, "fighter never reached its target");
}

// =============================================================================
// Attack-move
// =============================================================================

#[test]
fn test_attack_move_engages_enemy_on_the_way() {
    let mut sim = empty_sim();
    let fighter = sim
        .spawn_unit(UnitKind::Fighter, Faction::PLAYER, tile_center(1, 8))
        .unwrap();
    let roach = sim
        .spawn_unit(UnitKind::Roach, Faction(1), tile_center(7, 8))
        .unwrap();
    sim.issue_attack_move(fighter, tile_center(14, 8)).unwrap();

    let mut engaged = false;
    for _ in 0..150 {
        sim.tick();
        let unit = sim.unit(fighter).unwrap();
        if unit.state == UnitState::Attacking {
            assert_eq!(unit.nearest_enemy, Some(roach));
            engaged = true;
            break;
        }
    }
    assert!(engaged, "attack-move never engaged");
    // The original waypoint is still queued behind the fight.
    assert_eq!(
        sim.unit(fighter).unwrap().destinations.back(),
        Some(&tile_center(14, 8))
    );
}

#[test]
fn test_attack_move_without_enemies_arrives_idle() {
    let mut sim = empty_sim();
    let fighter = sim
        .spawn_unit(UnitKind::Fighter, Faction::PLAYER, tile_center(1, 1))
        .unwrap();
    sim.issue_attack_move(fighter, tile_center(6, 1)).unwrap();

    for _ in 0..100 {
        sim.tick();
        let unit = sim.unit(fighter).unwrap();
        assert!(unit.destinations.len() <= 1);
        if unit.state == UnitState::Idle {
            return;
        }
    }
    panic!("attack-move never finished");
}

#[test]
fn test_move_order_onto_enemy_becomes_attack_move() {
    let (mut sim, ant, roach) = duel();
    let target = sim.unit(roach).unwrap().center();
    sim.issue_move(ant, target).unwrap();
    assert_eq!(sim.unit(ant).unwrap().state, UnitState::AttackMove);
    assert_eq!(
        sim.classify_destination(target, Faction::PLAYER),
        DestinationType::Enemy
    );
    assert_eq!(
        sim.classify_destination(target, Faction(1)),
        DestinationType::Location
    );
}
