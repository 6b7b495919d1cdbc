//! Markov decision process formulation of the charging problem:
//! state/action codecs, nodal load assembly, the reward model, and the
//! backward-induction solver.

pub mod codec;
pub mod load;
pub mod reward;
pub mod solver;

// Re-export the main types for convenience
pub use codec::{ActionIndex, StateIndex};
pub use load::UNIT_POWER;
pub use reward::{PRICE_CAP, PriceBand, PriceSchedule, RewardModel};
pub use solver::{Scheduler, Solution, StagePolicy};
