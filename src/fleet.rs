//! Vehicle records and the ordered fleet consumed by the scheduler.

use thiserror::Error;

/// A single schedulable vehicle.
///
/// `charge_steps` counts the discrete charge levels inclusive of empty, so a
/// vehicle with 3 steps occupies levels {0, 1, 2}. `battery_max` is the
/// highest reachable level and is stored independently because level capping
/// and state encoding consult different fields; [`Fleet::new`] rejects
/// records where the two disagree.
#[derive(Debug, Clone, PartialEq)]
pub struct Vehicle {
    /// Number of discrete charge levels, inclusive of level 0.
    pub charge_steps: usize,
    /// Highest reachable charge level; must equal `charge_steps - 1`.
    pub battery_max: usize,
    /// Charge-rate multiplier applied to the unit power draw.
    pub charge_rate: f64,
    /// Grid node the vehicle charges at.
    pub node: usize,
    /// Charge level the vehicle arrives with; used for report rendering.
    pub initial_level: usize,
    /// Departure deadline in timesteps. Carried on the record; current
    /// scheduling logic does not consume it.
    pub deadline: usize,
}

/// Ordered, validated vehicle collection with precomputed space sizes.
///
/// Vehicle order is significant: it fixes the digit order of the state
/// codec and the bit order of the action codec.
#[derive(Debug, Clone)]
pub struct Fleet {
    vehicles: Vec<Vehicle>,
    n_states: usize,
    n_actions: usize,
}

/// Fleet construction failure.
#[derive(Debug, Error)]
pub enum FleetError {
    #[error("fleet has no vehicles")]
    Empty,
    #[error("vehicle {index}: charge_steps must be at least 1")]
    NoChargeLevels { index: usize },
    #[error(
        "vehicle {index}: battery_max {battery_max} does not equal charge_steps - 1 ({expected})"
    )]
    LevelCapMismatch {
        index: usize,
        battery_max: usize,
        expected: usize,
    },
    #[error("vehicle {index}: charge_rate must be positive, got {value}")]
    NonPositiveRate { index: usize, value: f64 },
    #[error("vehicle {index}: node {node} out of range for {n_nodes} nodes")]
    NodeOutOfRange {
        index: usize,
        node: usize,
        n_nodes: usize,
    },
    #[error("vehicle {index}: initial_level {level} exceeds battery_max {battery_max}")]
    InitialLevelOutOfRange {
        index: usize,
        level: usize,
        battery_max: usize,
    },
    #[error("state space size overflows usize")]
    StateSpaceOverflow,
    #[error("action space size overflows usize ({n_vehicles} vehicles)")]
    ActionSpaceOverflow { n_vehicles: usize },
}

impl Fleet {
    /// Validates the vehicle records against a grid of `n_nodes` nodes and
    /// fixes the state/action space sizes.
    ///
    /// # Errors
    ///
    /// Returns a [`FleetError`] if the collection is empty, any record has
    /// zero charge levels, a `battery_max` disagreeing with its
    /// `charge_steps`, a non-positive charge rate, an attachment node or
    /// initial level out of range, or if the combined state or action space
    /// does not fit in `usize`.
    pub fn new(vehicles: Vec<Vehicle>, n_nodes: usize) -> Result<Self, FleetError> {
        if vehicles.is_empty() {
            return Err(FleetError::Empty);
        }

        let mut n_states: usize = 1;
        for (index, v) in vehicles.iter().enumerate() {
            if v.charge_steps == 0 {
                return Err(FleetError::NoChargeLevels { index });
            }
            if v.battery_max != v.charge_steps - 1 {
                return Err(FleetError::LevelCapMismatch {
                    index,
                    battery_max: v.battery_max,
                    expected: v.charge_steps - 1,
                });
            }
            if !v.charge_rate.is_finite() || v.charge_rate <= 0.0 {
                return Err(FleetError::NonPositiveRate {
                    index,
                    value: v.charge_rate,
                });
            }
            if v.node >= n_nodes {
                return Err(FleetError::NodeOutOfRange {
                    index,
                    node: v.node,
                    n_nodes,
                });
            }
            if v.initial_level > v.battery_max {
                return Err(FleetError::InitialLevelOutOfRange {
                    index,
                    level: v.initial_level,
                    battery_max: v.battery_max,
                });
            }
            n_states = n_states
                .checked_mul(v.charge_steps)
                .ok_or(FleetError::StateSpaceOverflow)?;
        }

        let n_vehicles = vehicles.len();
        let n_actions = 1usize
            .checked_shl(u32::try_from(n_vehicles).unwrap_or(u32::MAX))
            .ok_or(FleetError::ActionSpaceOverflow { n_vehicles })?;

        Ok(Self {
            vehicles,
            n_states,
            n_actions,
        })
    }

    /// Vehicle records in fleet order.
    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    /// Number of vehicles.
    pub fn n_vehicles(&self) -> usize {
        self.vehicles.len()
    }

    /// Size of the charge-state space (product of per-vehicle step counts).
    pub fn n_states(&self) -> usize {
        self.n_states
    }

    /// Size of the action space (2^vehicle count).
    pub fn n_actions(&self) -> usize {
        self.n_actions
    }

    /// Per-vehicle arrival charge levels, in fleet order.
    pub fn initial_levels(&self) -> Vec<usize> {
        self.vehicles.iter().map(|v| v.initial_level).collect()
    }
}
