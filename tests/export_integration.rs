//! Integration tests for CSV export of solved schedules.

mod common;

use gridcharge::io::export::{write_policy_csv, write_value_csv};
use gridcharge::mdp::solver::{Scheduler, Solution};

fn solve_baseline() -> Solution {
    let grid = common::triangle_grid();
    let fleet = common::baseline_fleet();
    let reward = common::default_reward();
    Scheduler::new(&grid, &fleet, &reward, 12).solve()
}

#[test]
fn policy_export_covers_horizon_and_states() {
    let solution = solve_baseline();
    let mut buf = Vec::new();
    write_policy_csv(&solution, &mut buf).expect("policy export should succeed");

    let output = String::from_utf8(buf).expect("CSV should be valid UTF-8");
    let lines: Vec<&str> = output.lines().collect();
    // 1 header + 12 timesteps x 12 states
    assert_eq!(lines.len(), 145);
    assert_eq!(lines[0], "timestep,state,actions");
}

#[test]
fn value_export_reports_the_optimal_start() {
    let solution = solve_baseline();
    let mut buf = Vec::new();
    write_value_csv(&solution, &mut buf).expect("value export should succeed");

    let output = String::from_utf8(buf).expect("CSV should be valid UTF-8");
    let lines: Vec<&str> = output.lines().collect();
    // 1 header + 12 states
    assert_eq!(lines.len(), 13);
    assert_eq!(lines[1], "0,350.000000");
    assert_eq!(lines[12], "11,0.000000");
}

#[test]
fn exports_are_deterministic_across_solves() {
    let mut first = Vec::new();
    write_policy_csv(&solve_baseline(), &mut first).expect("policy export should succeed");

    let mut second = Vec::new();
    write_policy_csv(&solve_baseline(), &mut second).expect("policy export should succeed");

    assert_eq!(first, second);
}
