//! Harvesting round trips between a resource tile and a hive.

use colony_core::prelude::*;
use colony_test_utils::fixtures::HarvestScenario;
use colony_test_utils::logging;

/// Tick until `done` holds, failing after `limit` ticks.
fn tick_until(sim: &mut Sim, limit: u32, mut done: impl FnMut(&Sim) -> bool) -> u32 {
    for n in 1..=limit {
        sim.tick();
        if done(sim) {
            return n;
        }
    }
    panic!("condition not reached within {limit} ticks");
}

fn is_harvesting(unit: &Unit) -> bool {
    matches!(unit.state, UnitState::Harvesting { .. })
}

fn harvest_round_trip(scenario: &mut HarvestScenario, expected_harvest_ticks: u32) {
    let (worker, resource) = (scenario.worker, scenario.resource);
    let sim = &mut scenario.sim;
    let start = sim.economy(Faction::PLAYER).copied().unwrap();

    sim.issue_move(worker, resource).unwrap();
    assert_eq!(
        sim.unit(worker).unwrap().state,
        UnitState::moving_then(UnitState::Harvesting { timer: 0 })
    );

    tick_until(sim, 100, |sim| is_harvesting(sim.unit(worker).unwrap()));

    for _ in 1..expected_harvest_ticks {
        sim.tick();
        let unit = sim.unit(worker).unwrap();
        assert!(is_harvesting(unit), "left harvesting early: {:?}", unit.state);
        assert_eq!(unit.stats.resources_carried, 0);
    }
    sim.tick();
    let unit = sim.unit(worker).unwrap();
    assert_eq!(unit.state, UnitState::Delivering);
    assert_eq!(unit.stats.resources_carried, 5);
    assert_eq!(unit.stats.resource_type_carried, Some(ResourceKind::Sucrose));
    assert_eq!(unit.nearest_home, Some(scenario.hive));

    let before = sim.economy(Faction::PLAYER).copied().unwrap();
    assert_eq!(before, start);
    tick_until(sim, 200, |sim| {
        sim.economy(Faction::PLAYER).unwrap().sucrose != start.sucrose
    });

    let after = sim.economy(Faction::PLAYER).copied().unwrap();
    assert_eq!(after.sucrose, start.sucrose + 5);
    assert_eq!(after.wood, start.wood);
    let unit = sim.unit(worker).unwrap();
    assert!(is_harvesting(unit), "expected harvesting, got {:?}", unit.state);
    assert_eq!(unit.stats.resources_carried, 0);
    assert_eq!(unit.stats.resource_type_carried, None);
}

#[test]
fn test_harvest_round_trip() {
    logging::init();
    let mut scenario = HarvestScenario::new();
    harvest_round_trip(&mut scenario, 30);
}

#[test]
fn test_faster_gathering_shortens_harvest() {
    logging::init();
    let mut scenario = HarvestScenario::new();
    scenario.sim.economy_mut(Faction::PLAYER).deposit(ResourceKind::Sucrose, 250);
    scenario
        .sim
        .unlock_tech(Faction::PLAYER, &TechId::FASTER_GATHERING)
        .unwrap();
    assert_eq!(scenario.sim.economy(Faction::PLAYER).unwrap().sucrose, 0);

    harvest_round_trip(&mut scenario, 24);
}

#[test]
fn test_worker_keeps_cycling() {
    let mut scenario = HarvestScenario::new();
    let (worker, resource) = (scenario.worker, scenario.resource);
    scenario.sim.issue_move(worker, resource).unwrap();

    tick_until(&mut scenario.sim, 600, |sim| {
        sim.economy(Faction::PLAYER).unwrap().sucrose >= 15
    });
    assert_eq!(scenario.sim.economy(Faction::PLAYER).unwrap().sucrose % 5, 0);
}

#[test]
fn test_harvest_without_hive_goes_idle() {
    let mut scenario = HarvestScenario::new();
    let (worker, resource, hive) = (scenario.worker, scenario.resource, scenario.hive);
    scenario.sim.despawn(hive).unwrap();
    scenario.sim.issue_move(worker, resource).unwrap();

    tick_until(&mut scenario.sim, 100, |sim| is_harvesting(sim.unit(worker).unwrap()));
    tick_until(&mut scenario.sim, 40, |sim| {
        sim.unit(worker).unwrap().state == UnitState::Idle
    });
    assert_eq!(scenario.sim.economy(Faction::PLAYER).unwrap().sucrose, 0);
}

#[test]
fn test_plain_move_arrives_and_idles() {
    let mut scenario = HarvestScenario::new();
    let worker = scenario.worker;
    let target = Vec2::new(832.0, 576.0);
    scenario.sim.issue_move(worker, target).unwrap();

    tick_until(&mut scenario.sim, 200, |sim| {
        sim.unit(worker).unwrap().state == UnitState::Idle
    });
    let unit = scenario.worker();
    assert!(unit.destinations.is_empty());
    assert!(unit.edge_distance_to(target) <= scenario.sim.config().arrival_threshold);
}
