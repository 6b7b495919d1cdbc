//! Stage reward driven by a piecewise-constant price curve.

use std::collections::HashMap;

use crate::fleet::Fleet;
use crate::mdp::codec::{self, ActionIndex, StateIndex};

/// Price ceiling the stage reward is measured against.
pub const PRICE_CAP: f64 = 100.0;

/// One constant-price band: applies to timesteps strictly below `until`.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceBand {
    /// First timestep the band no longer covers.
    pub until: usize,
    /// Price during the band.
    pub price: f64,
}

/// Piecewise-constant price over the horizon.
///
/// Bands must be ordered by increasing `until`; timesteps past the last band
/// take the `tail` price. The default is a three-phase daily curve: 70
/// before timestep 3, 30 before 7, 90 afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSchedule {
    /// Ordered price bands.
    pub bands: Vec<PriceBand>,
    /// Price for timesteps past the last band.
    pub tail: f64,
}

impl Default for PriceSchedule {
    fn default() -> Self {
        Self {
            bands: vec![
                PriceBand {
                    until: 3,
                    price: 70.0,
                },
                PriceBand {
                    until: 7,
                    price: 30.0,
                },
            ],
            tail: 90.0,
        }
    }
}

impl PriceSchedule {
    /// Price at the given timestep.
    pub fn price(&self, timestep: usize) -> f64 {
        for band in &self.bands {
            if timestep < band.until {
                return band.price;
            }
        }
        self.tail
    }
}

/// Stage reward model.
///
/// The reward is `(PRICE_CAP - price(t)) × charging vehicle count`; the
/// state argument is carried for interface parity but does not enter the
/// formula.
#[derive(Debug, Clone)]
pub struct RewardModel {
    prices: PriceSchedule,
    n_price_levels: usize,
    // TODO: reward() never consults this table; confirm whether the
    // special-case bonuses should fold into the stage reward or be dropped.
    bonus: HashMap<(StateIndex, ActionIndex), f64>,
}

impl Default for RewardModel {
    fn default() -> Self {
        Self::new(PriceSchedule::default(), 5)
    }
}

impl RewardModel {
    /// Creates a reward model over the given price schedule with
    /// `n_price_levels` discrete price categories for the transition
    /// placeholder.
    pub fn new(prices: PriceSchedule, n_price_levels: usize) -> Self {
        Self {
            prices,
            n_price_levels,
            bonus: HashMap::new(),
        }
    }

    /// The underlying price schedule.
    pub fn schedule(&self) -> &PriceSchedule {
        &self.prices
    }

    /// Price at the given timestep.
    pub fn price(&self, timestep: usize) -> f64 {
        self.prices.price(timestep)
    }

    /// Stage reward for taking `action` in `_state` at `timestep`.
    ///
    /// # Panics
    ///
    /// Panics if `action` is outside the fleet's action space.
    pub fn reward(
        &self,
        fleet: &Fleet,
        _state: StateIndex,
        action: ActionIndex,
        timestep: usize,
    ) -> f64 {
        let charging = codec::decode_action(fleet, action)
            .iter()
            .filter(|&&decision| decision > 0)
            .count();
        (PRICE_CAP - self.prices.price(timestep)) * charging as f64
    }

    /// Records a special-case bonus for a (state, action) pair.
    pub fn set_bonus(&mut self, state: StateIndex, action: ActionIndex, value: f64) {
        self.bonus.insert((state, action), value);
    }

    /// Looks up a recorded bonus, if any.
    pub fn bonus(&self, state: StateIndex, action: ActionIndex) -> Option<f64> {
        self.bonus.get(&(state, action)).copied()
    }

    /// Probability of moving between two price levels in one step.
    ///
    /// Placeholder returning a uniform distribution until a calibrated
    /// level-transition table is available; the solver does not consume it.
    pub fn price_transition(&self, _from_level: usize, _to_level: usize) -> f64 {
        1.0 / self.n_price_levels as f64
    }
}
