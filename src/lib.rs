//! Grid-aware EV fleet charging scheduler.

pub mod config;
pub mod fleet;
/// DC power-flow sensitivity and feasibility modules.
pub mod grid;
pub mod io;
pub mod mdp;
pub mod report;
