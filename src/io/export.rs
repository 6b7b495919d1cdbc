//! CSV export for solved policies and value vectors.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::mdp::solver::Solution;

/// Column header for CSV policy export. The `actions` column carries the
/// tied action set, space-separated, in ascending order.
const POLICY_HEADER: &str = "timestep,state,actions";

/// Column header for CSV value export.
const VALUE_HEADER: &str = "state,expected_value";

/// Exports the per-timestep policy tables to a CSV file at the given path.
///
/// Writes a header row followed by one data row per (timestep, state) pair.
/// Produces deterministic output for identical inputs.
///
/// # Arguments
///
/// * `solution` - Solved policies and values
/// * `path` - Output file path
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_policy_csv(solution: &Solution, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_policy_csv(solution, buf)
}

/// Writes the policy tables as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_policy_csv(solution: &Solution, writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    // Header
    wtr.write_record(POLICY_HEADER.split(','))?;

    // One row per (timestep, state)
    for (timestep, stage) in solution.policies.iter().enumerate() {
        for (state, actions) in stage.iter().enumerate() {
            let joined = actions
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" ");
            wtr.write_record(&[timestep.to_string(), state.to_string(), joined])?;
        }
    }

    wtr.flush()?;
    Ok(())
}

/// Exports the expected-value vector to a CSV file at the given path.
///
/// # Arguments
///
/// * `solution` - Solved policies and values
/// * `path` - Output file path
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_value_csv(solution: &Solution, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_value_csv(solution, buf)
}

/// Writes the expected-value vector as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_value_csv(solution: &Solution, writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    // Header
    wtr.write_record(VALUE_HEADER.split(','))?;

    // One row per state
    for (state, value) in solution.expected_value.iter().enumerate() {
        wtr.write_record(&[state.to_string(), format!("{value:.6}")])?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_solution() -> Solution {
        Solution {
            policies: vec![vec![vec![0, 1], vec![0]], vec![vec![1], vec![0]]],
            expected_value: vec![30.0, 0.0],
        }
    }

    #[test]
    fn policy_header_matches_schema() {
        let mut buf = Vec::new();
        write_policy_csv(&sample_solution(), &mut buf).ok();
        let output = String::from_utf8(buf).ok();
        let first_line = output.as_deref().unwrap_or("").lines().next().unwrap_or("");
        assert_eq!(first_line, "timestep,state,actions");
    }

    #[test]
    fn policy_row_count_covers_every_stage_and_state() {
        let mut buf = Vec::new();
        write_policy_csv(&sample_solution(), &mut buf).ok();
        let output = String::from_utf8(buf).ok();
        let lines: Vec<&str> = output.as_deref().unwrap_or("").lines().collect();
        // 1 header + 2 timesteps x 2 states
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn tied_actions_are_space_separated() {
        let mut buf = Vec::new();
        write_policy_csv(&sample_solution(), &mut buf).ok();
        let output = String::from_utf8(buf).unwrap_or_default();
        let second_line = output.lines().nth(1).unwrap_or("");
        assert_eq!(second_line, "0,0,0 1");
    }

    #[test]
    fn value_rows_use_six_decimals() {
        let mut buf = Vec::new();
        write_value_csv(&sample_solution(), &mut buf).ok();
        let output = String::from_utf8(buf).unwrap_or_default();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.first().copied(), Some("state,expected_value"));
        assert_eq!(lines.get(1).copied(), Some("0,30.000000"));
        assert_eq!(lines.get(2).copied(), Some("1,0.000000"));
    }

    #[test]
    fn deterministic_output() {
        let solution = sample_solution();
        let mut buf1 = Vec::new();
        let mut buf2 = Vec::new();
        write_policy_csv(&solution, &mut buf1).ok();
        write_policy_csv(&solution, &mut buf2).ok();
        assert_eq!(buf1, buf2);
    }

    #[test]
    fn round_trip_parseable() {
        let mut buf = Vec::new();
        write_policy_csv(&sample_solution(), &mut buf).ok();

        let mut rdr = csv::ReaderBuilder::new().from_reader(buf.as_slice());
        let headers = rdr.headers().cloned().ok();
        assert_eq!(headers.as_ref().map(csv::StringRecord::len), Some(3));

        let mut row_count = 0;
        for record in rdr.records() {
            let rec = record.ok();
            assert!(rec.is_some(), "every row should parse");
            let rec = rec.as_ref();
            // Index columns parse as usize
            for i in 0..2 {
                let val: Result<usize, _> = rec.unwrap()[i].parse();
                assert!(val.is_ok(), "column {i} should parse as usize");
            }
            // The action set is non-empty and each token parses as usize
            let actions = &rec.unwrap()[2];
            assert!(!actions.is_empty(), "action set should be non-empty");
            for token in actions.split(' ') {
                let val: Result<usize, _> = token.parse();
                assert!(val.is_ok(), "action token should parse as usize");
            }
            row_count += 1;
        }
        assert_eq!(row_count, 4);
    }
}
