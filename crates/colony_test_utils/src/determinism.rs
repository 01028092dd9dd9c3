//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the simulation
//! produces identical results given identical inputs.
//!
//! # Testing Strategy
//!
//! The simulation steps with `f64` math, so determinism rests on doing the
//! same operations in the same order every run:
//!
//! - **Iteration order**: units and buildings live in id-ordered maps, and
//!   every neighbour query walks them in that order.
//!
//! - **System randomness**: none. Tie-breaks (nearest enemy, head-on
//!   deflection side) are decided by entity id.
//!
//! - **Float summation order**: repulsion and centroids are summed in id
//!   order, so rounding is reproducible.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: Individual behaviours (steering, combat, production)
//! 2. **Property tests**: Random command streams must still replay identically
//! 3. **Integration tests**: Full scenarios are reproducible

use colony_core::simulation::Sim;

/// Where one replay ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayRun {
    /// Tick the run stopped at.
    pub tick: u64,
    /// [`Sim::state_hash`] after the last tick.
    pub state_hash: u64,
    /// Units still alive.
    pub units: usize,
    /// Buildings standing.
    pub buildings: usize,
}

impl ReplayRun {
    /// Snapshot the parts of `sim` a replay is compared on.
    #[must_use]
    pub fn capture(sim: &Sim) -> Self {
        Self {
            tick: sim.get_tick(),
            state_hash: sim.state_hash(),
            units: sim.units().count(),
            buildings: sim.buildings().count(),
        }
    }
}

/// Outcome of replaying one setup several times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayReport {
    /// One entry per run, in run order.
    pub runs: Vec<ReplayRun>,
}

impl ReplayReport {
    /// Every run ended in the same state.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.runs.windows(2).all(|w| w[0] == w[1])
    }

    /// Indices of runs that disagree with the first one.
    #[must_use]
    pub fn mismatched_runs(&self) -> Vec<usize> {
        let Some(first) = self.runs.first() else {
            return Vec::new();
        };
        (1..self.runs.len())
            .filter(|&i| self.runs[i] != *first)
            .collect()
    }

    /// Panic with every run listed if the replays disagree.
    ///
    /// # Panics
    ///
    /// Panics if any run differs from the first.
    pub fn assert_deterministic(&self) {
        let mismatched = self.mismatched_runs();
        assert!(
            mismatched.is_empty(),
            "replays diverged in runs {mismatched:?}\n{:#?}",
            self.runs
        );
    }
}

/// Build a simulation `runs` times, tick each `ticks` times and compare.
///
/// # Example
///
/// ```
/// use colony_test_utils::determinism::replay;
/// use colony_test_utils::fixtures::skirmish;
///
/// replay(3, 50, || skirmish(2, 2)).assert_deterministic();
/// ```
pub fn replay<F>(runs: usize, ticks: u64, setup: F) -> ReplayReport
where
    F: Fn() -> Sim,
{
    let runs = (0..runs)
        .map(|run| {
            let mut sim = setup();
            for _ in 0..ticks {
                sim.tick();
            }
            let outcome = ReplayRun::capture(&sim);
            tracing::debug!(run, tick = outcome.tick, hash = outcome.state_hash, "replay finished");
            outcome
        })
        .collect();
    ReplayReport { runs }
}

/// Two replays of `setup` end with the same state hash.
pub fn verify_simulation_determinism<F>(setup_fn: F, num_ticks: u64) -> bool
where
    F: Fn() -> Sim,
{
    replay(2, num_ticks, setup_fn).is_deterministic()
}

/// Step two copies of `setup` side by side and report the first tick at
/// which their state hashes differ.
///
/// Tick 0 means the setups already disagree. `None` means no divergence
/// within `num_ticks`.
pub fn find_first_divergence<F>(setup_fn: F, num_ticks: u64) -> Option<u64>
where
    F: Fn() -> Sim,
{
    let mut left = setup_fn();
    let mut right = setup_fn();

    for tick in 0..=num_ticks {
        if tick > 0 {
            left.tick();
            right.tick();
        }
        let (a, b) = (ReplayRun::capture(&left), ReplayRun::capture(&right));
        if a.state_hash != b.state_hash {
            tracing::warn!(
                tick,
                left_hash = a.state_hash,
                right_hash = b.state_hash,
                left_units = a.units,
                right_units = b.units,
                "simulations diverged"
            );
            return Some(tick);
        }
    }

    None
}

/// Proptest strategies for simulation testing.
///
/// These strategies generate random but reproducible inputs for
/// property-based tests.
pub mod strategies {
    use colony_core::prelude::*;
    use proptest::prelude::*;

    /// An order a test can replay against a simulation.
    #[derive(Debug, Clone, PartialEq)]
    pub enum Order {
        /// `issue_move` for the n-th unit.
        Move(usize, Vec2),
        /// `issue_attack_move` for the n-th unit.
        AttackMove(usize, Vec2),
        /// `issue_group_move` for the first n units.
        GroupMove(usize, Vec2),
        /// Let the simulation run this many ticks.
        Wait(u32),
    }

    impl Order {
        /// Apply the order to `sim`, picking units from `ids` by index.
        ///
        /// Rejected orders are ignored; they are part of what is tested.
        pub fn apply(&self, sim: &mut Sim, ids: &[EntityId]) {
            let pick = |n: usize| ids.get(n % ids.len().max(1)).copied();
            match *self {
                Self::Move(n, point) => {
                    if let Some(id) = pick(n) {
                        let _ = sim.issue_move(id, point);
                    }
                }
                Self::AttackMove(n, point) => {
                    if let Some(id) = pick(n) {
                        let _ = sim.issue_attack_move(id, point);
                    }
                }
                Self::GroupMove(n, point) => {
                    let count = n.min(ids.len());
                    sim.issue_group_move(&ids[..count], point);
                }
                Self::Wait(ticks) => {
                    for _ in 0..ticks {
                        sim.tick();
                    }
                }
            }
        }
    }

    /// Generate a pixel position on a `width` x `height` tile map.
    pub fn arb_map_point(width: u32, height: u32) -> impl Strategy<Value = Vec2> {
        let max_x = f64::from(width) * 128.0;
        let max_y = f64::from(height) * 128.0;
        (0.0..max_x, 0.0..max_y).prop_map(|(x, y)| Vec2::new(x, y))
    }

    /// Generate a resource cost.
    pub fn arb_cost() -> impl Strategy<Value = ResourceCost> {
        (0u32..500, 0u32..500).prop_map(|(s, w)| ResourceCost::new(s, w))
    }

    /// Generate an economy.
    pub fn arb_economy() -> impl Strategy<Value = PlayerEconomy> {
        (0u32..500, 0u32..500).prop_map(|(s, w)| PlayerEconomy::new(s, w))
    }

    /// Generate a unit kind.
    pub fn arb_unit_kind() -> impl Strategy<Value = UnitKind> {
        prop::sample::select(UnitKind::ALL.to_vec())
    }

    /// Generate an order against up to `units` units on a `width` x `height` map.
    pub fn arb_order(units: usize, width: u32, height: u32) -> impl Strategy<Value = Order> {
        prop_oneof![
            (0..units.max(1), arb_map_point(width, height)).prop_map(|(n, p)| Order::Move(n, p)),
            (0..units.max(1), arb_map_point(width, height)).prop_map(|(n, p)| Order::AttackMove(n, p)),
            (1..=units.max(1), arb_map_point(width, height)).prop_map(|(n, p)| Order::GroupMove(n, p)),
            (1u32..40).prop_map(Order::Wait),
        ]
    }

    /// Generate a sequence of orders.
    pub fn arb_orders(
        units: usize,
        width: u32,
        height: u32,
        max_len: usize,
    ) -> impl Strategy<Value = Vec<Order>> {
        prop::collection::vec(arb_order(units, width, height), 1..=max_len)
    }
}
