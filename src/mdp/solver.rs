//! Feasibility-gated backward-induction scheduling.

use std::cell::OnceCell;

use tracing::{debug, info};

use crate::fleet::Fleet;
use crate::grid::Grid;
use crate::mdp::codec::{self, ActionIndex, StateIndex};
use crate::mdp::load;
use crate::mdp::reward::RewardModel;

/// Per-state tied-optimal action sets for one decision epoch.
pub type StagePolicy = Vec<Vec<ActionIndex>>;

/// Solve output.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    /// `policies[t][s]`: feasible actions tied for the maximum expected
    /// return when in state `s` at timestep `t`, in ascending action order.
    pub policies: Vec<StagePolicy>,
    /// `expected_value[s]`: optimal expected return reported for state `s`
    /// after the final induction step.
    pub expected_value: Vec<f64>,
}

/// Solver context for one grid/fleet configuration.
///
/// Borrows the grid, fleet, and reward model for its lifetime and owns the
/// per-state feasible-action cache, so cached enumerations can never leak
/// across configurations. The context is immutable once built; the cache
/// fills lazily behind single-assignment cells.
pub struct Scheduler<'a> {
    grid: &'a Grid,
    fleet: &'a Fleet,
    reward: &'a RewardModel,
    horizon: usize,
    feasible: Vec<OnceCell<Vec<ActionIndex>>>,
}

impl<'a> Scheduler<'a> {
    /// Creates a solver context.
    ///
    /// # Panics
    ///
    /// Panics if the fleet references a node outside the grid.
    pub fn new(grid: &'a Grid, fleet: &'a Fleet, reward: &'a RewardModel, horizon: usize) -> Self {
        assert!(
            fleet.vehicles().iter().all(|v| v.node < grid.n_nodes()),
            "fleet references a node outside the grid"
        );
        let feasible = (0..fleet.n_states()).map(|_| OnceCell::new()).collect();
        Self {
            grid,
            fleet,
            reward,
            horizon,
            feasible,
        }
    }

    /// Actions available in `state`: no vehicle already at `battery_max` may
    /// charge, and the aggregate load must respect every line bound.
    ///
    /// Computed once per state and cached for the life of the context.
    ///
    /// # Panics
    ///
    /// Panics if `state` is outside the state space.
    pub fn feasible_actions(&self, state: StateIndex) -> &[ActionIndex] {
        self.feasible[state].get_or_init(|| self.enumerate_feasible(state))
    }

    fn enumerate_feasible(&self, state: StateIndex) -> Vec<ActionIndex> {
        let levels = codec::decode_state(self.fleet, state);
        let at_max: Vec<bool> = self
            .fleet
            .vehicles()
            .iter()
            .zip(&levels)
            .map(|(v, &level)| level >= v.battery_max)
            .collect();

        let mut actions = Vec::new();
        for action in 0..self.fleet.n_actions() {
            let decisions = codec::decode_action(self.fleet, action);
            let redundant = decisions
                .iter()
                .zip(&at_max)
                .any(|(&decision, &full)| decision > 0 && full);
            if redundant {
                continue;
            }
            let loads = load::nodal_load(self.fleet, action, self.grid.n_nodes());
            if self.grid.feasible(&loads) {
                actions.push(action);
            }
        }
        actions
    }

    /// Runs backward induction over the horizon.
    ///
    /// Each timestep starts from a fresh zero Q-table and writes only
    /// feasible (state, action) entries; infeasible columns stay zero and
    /// still participate in the next stage's lookahead. Policy extraction
    /// maximizes over feasible actions only; the reported value vector takes
    /// one more full-range lookahead through the final table.
    pub fn solve(&self) -> Solution {
        let n_states = self.fleet.n_states();
        let n_actions = self.fleet.n_actions();
        info!(
            n_states,
            n_actions,
            horizon = self.horizon,
            "starting backward induction"
        );

        let mut q_next = vec![vec![0.0; n_actions]; n_states];
        let mut policies: Vec<StagePolicy> = Vec::with_capacity(self.horizon);

        for timestep in (0..self.horizon).rev() {
            let mut q = vec![vec![0.0; n_actions]; n_states];
            for s in 0..n_states {
                for &a in self.feasible_actions(s) {
                    q[s][a] = self.reward.reward(self.fleet, s, a, timestep)
                        + self.lookahead(&q_next, s, a);
                }
            }
            q_next = q;
            let stage: StagePolicy = (0..n_states)
                .map(|s| self.greedy_actions(&q_next[s], s))
                .collect();
            policies.push(stage);
        }
        policies.reverse();

        let expected_value: Vec<f64> = (0..n_states)
            .map(|s| {
                (0..n_actions)
                    .map(|a| self.lookahead(&q_next, s, a))
                    .fold(f64::NEG_INFINITY, f64::max)
            })
            .collect();

        debug!("backward induction complete");
        Solution {
            policies,
            expected_value,
        }
    }

    /// One-step lookahead: best next-stage value at the deterministic
    /// successor of (s, a), maximized over the full action range.
    fn lookahead(&self, q_next: &[Vec<f64>], s: StateIndex, a: ActionIndex) -> f64 {
        let sp = codec::transition(self.fleet, s, a);
        q_next[sp].iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Feasible actions tied for the row maximum, in ascending order.
    ///
    /// The running maximum starts from the idle action's entry; idle is
    /// always feasible (it charges nobody and loads nothing), so every state
    /// yields a non-empty set.
    fn greedy_actions(&self, q_row: &[f64], s: StateIndex) -> Vec<ActionIndex> {
        let mut max_val = q_row[0];
        let mut result = Vec::new();
        for &action in self.feasible_actions(s) {
            let q_value = q_row[action];
            if q_value == max_val {
                result.push(action);
            } else if q_value > max_val {
                result = vec![action];
                max_val = q_value;
            }
        }
        result
    }
}
