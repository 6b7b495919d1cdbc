//! Aggregation of charge decisions into a nodal net-injection vector.

use crate::fleet::Fleet;
use crate::grid::REFERENCE_NODE;
use crate::mdp::codec::{self, ActionIndex};

/// Power drawn by one charging vehicle at unit charge rate.
pub const UNIT_POWER: f64 = 200.0;

/// Builds the nodal load vector for an action.
///
/// Each charging vehicle adds `charge_rate × UNIT_POWER` at its attachment
/// node; the reference node is then set to the negative sum of every other
/// entry, so total injection is zero regardless of where vehicles attach.
///
/// # Panics
///
/// Panics if `action` is outside the fleet's action space or a vehicle's
/// node is outside `0..n_nodes`.
pub fn nodal_load(fleet: &Fleet, action: ActionIndex, n_nodes: usize) -> Vec<f64> {
    let decisions = codec::decode_action(fleet, action);
    let mut load = vec![0.0; n_nodes];
    for (vehicle, &decision) in fleet.vehicles().iter().zip(&decisions) {
        if decision > 0 {
            load[vehicle.node] += vehicle.charge_rate * UNIT_POWER;
        }
    }
    let others: f64 = load[1..].iter().sum();
    load[REFERENCE_NODE] = -others;
    load
}
