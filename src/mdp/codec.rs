//! Bidirectional mapping between scalar indices and per-vehicle vectors.
//!
//! Charge states use mixed-radix encoding with vehicle 0 as the
//! most-significant digit and each vehicle's `charge_steps` as its radix.
//! Actions use a bitmask where vehicle `v` owns bit `n_vehicles - 1 - v`.
//! Both decoders return canonical vehicle-indexed vectors (entry `v` belongs
//! to vehicle `v`), so decoded states and actions compose elementwise.

use crate::fleet::Fleet;

/// Scalar index into the charge-state space.
pub type StateIndex = usize;
/// Scalar index into the action space.
pub type ActionIndex = usize;

/// Decodes a state index into per-vehicle charge levels.
///
/// # Arguments
///
/// * `fleet` - Fleet fixing the digit order and radices
/// * `state` - Index in `0..fleet.n_states()`
///
/// # Returns
///
/// One charge level per vehicle, vehicle 0 first.
///
/// # Panics
///
/// Panics if `state` is outside the state space.
pub fn decode_state(fleet: &Fleet, state: StateIndex) -> Vec<usize> {
    assert!(
        state < fleet.n_states(),
        "state index {state} outside state space of size {}",
        fleet.n_states()
    );

    let mut place = fleet.n_states();
    let mut rest = state;
    let mut levels = Vec::with_capacity(fleet.n_vehicles());
    for v in fleet.vehicles() {
        place /= v.charge_steps;
        levels.push(rest / place);
        rest %= place;
    }
    levels
}

/// Encodes per-vehicle charge levels into a state index.
///
/// Returns `None` if the vector length does not match the vehicle count.
pub fn encode_state(fleet: &Fleet, levels: &[usize]) -> Option<StateIndex> {
    if levels.len() != fleet.n_vehicles() {
        return None;
    }

    let mut state = 0;
    let mut place = 1;
    for (v, &level) in fleet.vehicles().iter().zip(levels).rev() {
        state += level * place;
        place *= v.charge_steps;
    }
    Some(state)
}

/// Decodes an action index into per-vehicle charge decisions (0 or 1).
///
/// # Panics
///
/// Panics if `action` is outside the action space.
pub fn decode_action(fleet: &Fleet, action: ActionIndex) -> Vec<usize> {
    assert!(
        action < fleet.n_actions(),
        "action index {action} outside action space of size {}",
        fleet.n_actions()
    );

    let n = fleet.n_vehicles();
    (0..n).map(|v| (action >> (n - 1 - v)) & 1).collect()
}

/// Encodes per-vehicle charge decisions into an action index.
///
/// Any positive decision sets the vehicle's bit. Returns `None` if the
/// vector length does not match the vehicle count.
pub fn encode_action(fleet: &Fleet, decisions: &[usize]) -> Option<ActionIndex> {
    if decisions.len() != fleet.n_vehicles() {
        return None;
    }

    let n = fleet.n_vehicles();
    let mut action = 0;
    for (v, &decision) in decisions.iter().enumerate() {
        if decision > 0 {
            action |= 1 << (n - 1 - v);
        }
    }
    Some(action)
}

/// Applies charge decisions to charge levels, capping each vehicle at its
/// `battery_max`.
///
/// Returns `None` if either vector length does not match the vehicle count.
pub fn apply_action(fleet: &Fleet, levels: &[usize], decisions: &[usize]) -> Option<Vec<usize>> {
    if levels.len() != fleet.n_vehicles() || decisions.len() != fleet.n_vehicles() {
        return None;
    }

    Some(
        fleet
            .vehicles()
            .iter()
            .zip(levels.iter().zip(decisions))
            .map(|(v, (&level, &decision))| (level + decision).min(v.battery_max))
            .collect(),
    )
}

/// Deterministic transition: the state reached by taking `action` in `state`.
///
/// Composition of [`decode_state`], [`decode_action`], [`apply_action`], and
/// [`encode_state`]. Capping keeps every successor inside the state space,
/// so the result is always a valid state index.
///
/// # Panics
///
/// Panics if `state` or `action` is outside its space.
pub fn transition(fleet: &Fleet, state: StateIndex, action: ActionIndex) -> StateIndex {
    let levels = decode_state(fleet, state);
    let decisions = decode_action(fleet, action);
    apply_action(fleet, &levels, &decisions)
        .and_then(|next| encode_state(fleet, &next))
        .expect("vectors decoded from fleet indices always match the fleet size")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fleet::Vehicle;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn vehicle(charge_steps: usize, node: usize) -> Vehicle {
        Vehicle {
            charge_steps,
            battery_max: charge_steps - 1,
            charge_rate: 1.0,
            node,
            initial_level: 0,
            deadline: 23,
        }
    }

    /// Two vehicles with step counts 3 and 4: 12 states, 4 actions.
    fn fleet() -> Fleet {
        Fleet::new(vec![vehicle(3, 2), vehicle(4, 1)], 3).expect("fleet should build")
    }

    #[test]
    fn state_round_trip_covers_whole_space() {
        let fleet = fleet();
        for s in 0..fleet.n_states() {
            let levels = decode_state(&fleet, s);
            assert_eq!(encode_state(&fleet, &levels), Some(s));
        }
    }

    #[test]
    fn action_round_trip_covers_whole_space() {
        let fleet = fleet();
        for a in 0..fleet.n_actions() {
            let decisions = decode_action(&fleet, a);
            assert_eq!(encode_action(&fleet, &decisions), Some(a));
        }
    }

    #[test]
    fn state_digits_stay_within_radix() {
        let fleet = fleet();
        for s in 0..fleet.n_states() {
            let levels = decode_state(&fleet, s);
            for (v, &level) in fleet.vehicles().iter().zip(&levels) {
                assert!(level < v.charge_steps);
            }
        }
    }

    #[test]
    fn state_digit_order_is_vehicle_zero_most_significant() {
        let fleet = fleet();
        assert_eq!(decode_state(&fleet, 0), vec![0, 0]);
        assert_eq!(decode_state(&fleet, 1), vec![0, 1]);
        assert_eq!(decode_state(&fleet, 4), vec![1, 0]);
        assert_eq!(decode_state(&fleet, 11), vec![2, 3]);
    }

    #[test]
    fn action_bit_order_is_vehicle_zero_highest() {
        let fleet = fleet();
        assert_eq!(decode_action(&fleet, 0), vec![0, 0]);
        assert_eq!(decode_action(&fleet, 1), vec![0, 1]);
        assert_eq!(decode_action(&fleet, 2), vec![1, 0]);
        assert_eq!(decode_action(&fleet, 3), vec![1, 1]);
    }

    #[test]
    fn idle_action_is_a_fixpoint() {
        let fleet = fleet();
        for s in 0..fleet.n_states() {
            assert_eq!(transition(&fleet, s, 0), s);
        }
    }

    #[test]
    fn charging_caps_at_battery_max() {
        let fleet = fleet();
        let full = encode_state(&fleet, &[2, 3]).expect("full state encodes");
        assert_eq!(transition(&fleet, full, 3), full);

        let nearly = encode_state(&fleet, &[2, 2]).expect("state encodes");
        assert_eq!(transition(&fleet, nearly, 1), full);
        assert_eq!(transition(&fleet, nearly, 2), nearly);
    }

    #[test]
    fn encode_rejects_wrong_length() {
        let fleet = fleet();
        assert_eq!(encode_state(&fleet, &[1]), None);
        assert_eq!(encode_state(&fleet, &[1, 2, 0]), None);
        assert_eq!(encode_action(&fleet, &[1]), None);
    }

    #[test]
    fn apply_action_rejects_wrong_length() {
        let fleet = fleet();
        assert_eq!(apply_action(&fleet, &[1], &[0, 1]), None);
        assert_eq!(apply_action(&fleet, &[1, 2], &[0]), None);
    }

    #[test]
    #[should_panic]
    fn decode_state_rejects_out_of_range_index() {
        let fleet = fleet();
        let _ = decode_state(&fleet, fleet.n_states());
    }

    #[test]
    fn random_fleets_round_trip() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let vehicles: Vec<Vehicle> = (0..5)
                .map(|v| vehicle(rng.random_range(1..=6), v % 3))
                .collect();
            let fleet = Fleet::new(vehicles, 3).expect("random fleet should build");
            for _ in 0..50 {
                let s = rng.random_range(0..fleet.n_states());
                let levels = decode_state(&fleet, s);
                assert_eq!(encode_state(&fleet, &levels), Some(s));
            }
        }
    }
}
