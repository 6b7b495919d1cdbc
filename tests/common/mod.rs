//! Shared test fixtures for integration tests.

use gridcharge::fleet::{Fleet, Vehicle};
use gridcharge::grid::Grid;
use gridcharge::mdp::reward::RewardModel;

/// Vehicle with the given level count and node (full-rate, empty arrival).
pub fn vehicle(charge_steps: usize, node: usize) -> Vehicle {
    Vehicle {
        charge_steps,
        battery_max: charge_steps - 1,
        charge_rate: 1.0,
        node,
        initial_level: 0,
        deadline: 23,
    }
}

/// Three-node triangle grid with equal reactances and 200.2 capacity on
/// every line, matching `grids/grid_1.txt`.
pub fn triangle_grid() -> Grid {
    Grid::new(
        3,
        &[(0, 1), (0, 2), (1, 2)],
        &[0.2, 0.2, 0.2],
        &[200.2, 200.2, 200.2],
    )
    .expect("triangle grid should build")
}

/// Baseline fleet: a 3-level vehicle on node 2 and a 4-level vehicle on
/// node 1 (12 states, 4 actions).
pub fn baseline_fleet() -> Fleet {
    Fleet::new(vec![vehicle(3, 2), vehicle(4, 1)], 3).expect("baseline fleet should build")
}

/// Same fleet as baseline but with both vehicles on node 2.
pub fn congested_fleet() -> Fleet {
    Fleet::new(vec![vehicle(3, 2), vehicle(4, 2)], 3).expect("congested fleet should build")
}

/// Default reward model: prices 70/30/90 over the day, five price levels.
pub fn default_reward() -> RewardModel {
    RewardModel::default()
}
