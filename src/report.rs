use std::fmt;

use crate::fleet::Fleet;
use crate::mdp::codec;
use crate::mdp::reward::RewardModel;
use crate::mdp::solver::Solution;

/// Console rendering of a solved schedule.
pub struct SolutionReport<'a> {
    solution: &'a Solution,
    fleet: &'a Fleet,
    reward: &'a RewardModel,
}

impl<'a> SolutionReport<'a> {
    pub fn new(solution: &'a Solution, fleet: &'a Fleet, reward: &'a RewardModel) -> Self {
        Self {
            solution,
            fleet,
            reward,
        }
    }
}

impl fmt::Display for SolutionReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Charging Policy ---")?;
        for (t, stage) in self.solution.policies.iter().enumerate() {
            write!(f, "t={t:>2} price={:>5.1} |", self.reward.price(t))?;
            for (s, actions) in stage.iter().enumerate() {
                let joined = actions
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(",");
                write!(f, " {s}:{{{joined}}}")?;
            }
            writeln!(f)?;
        }
        writeln!(f)?;
        writeln!(f, "--- Expected Value ---")?;
        for (s, v) in self.solution.expected_value.iter().enumerate() {
            writeln!(f, "state {s:>3}: {v:.3}")?;
        }
        let initial = codec::encode_state(self.fleet, &self.fleet.initial_levels())
            .expect("fleet initial levels are validated on construction");
        write!(
            f,
            "fleet start (state {initial}): {:.3}",
            self.solution.expected_value[initial]
        )
    }
}

pub fn print_solution_report(solution: &Solution, fleet: &Fleet, reward: &RewardModel) {
    println!("\n{}", SolutionReport::new(solution, fleet, reward));
}
