//! Grid topology text format parsing.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Raw network description parsed from a topology file.
///
/// Carries the parallel per-line lists exactly as declared; building the
/// sensitivity model from them is [`Grid::new`](crate::grid::Grid::new)'s job.
#[derive(Debug, Clone, PartialEq)]
pub struct Topology {
    /// Number of nodes (buses), zero-indexed elsewhere.
    pub n_nodes: usize,
    /// Declared lines as (from, to) node pairs, in file order.
    pub lines: Vec<(usize, usize)>,
    /// Per-line reactance, parallel to `lines`.
    pub reactances: Vec<f64>,
    /// Per-line capacity bound, parallel to `lines`.
    pub bounds: Vec<f64>,
}

/// Topology file parse failure.
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("cannot read topology \"{path}\": {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("line {line_no}: expected header `{expected}=<count>`")]
    Header {
        line_no: usize,
        expected: &'static str,
    },
    #[error("line {line_no}: expected a `#` comment line")]
    Comment { line_no: usize },
    #[error("line {line_no}: expected 5 fields, found {found}")]
    RowArity { line_no: usize, found: usize },
    #[error("line {line_no}: invalid {field} value \"{value}\"")]
    Number {
        line_no: usize,
        field: &'static str,
        value: String,
    },
    #[error("header declares {declared} lines but only {found} data rows present")]
    RowCount { declared: usize, found: usize },
    #[error("line {line_no}: node {node} out of range for {n_nodes} nodes")]
    NodeIndex {
        line_no: usize,
        node: usize,
        n_nodes: usize,
    },
    #[error("line {line_no}: {field} must be positive, got {value}")]
    NonPositive {
        line_no: usize,
        field: &'static str,
        value: f64,
    },
    #[error("line {line_no}: line ({from}, {to}) declared twice")]
    DuplicateLine {
        line_no: usize,
        from: usize,
        to: usize,
    },
    #[error("line {line_no}: line ({node}, {node}) is a self-loop")]
    SelfLoop { line_no: usize, node: usize },
}

impl Topology {
    /// Reads and parses a topology file.
    ///
    /// # Errors
    ///
    /// Returns a [`TopologyError`] if the file cannot be read or its content
    /// is malformed.
    pub fn from_file(path: &Path) -> Result<Self, TopologyError> {
        let content = fs::read_to_string(path).map_err(|source| TopologyError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Parses the topology text format.
    ///
    /// Format: line 1 `numBus=<count>`, line 2 `numLines=<count>`, line 3 a
    /// `#` comment, then one row per declared line with whitespace-separated
    /// fields `<from> <to> <circuit> <reactance> <bound>` (the circuit field
    /// is carried by the format but unused). Rows beyond the declared line
    /// count are ignored.
    ///
    /// # Errors
    ///
    /// Returns a [`TopologyError`] describing the first offending line on
    /// malformed input, mismatched counts, out-of-range node indices,
    /// non-positive reactances or bounds, self-loops, or duplicate lines.
    pub fn parse(input: &str) -> Result<Self, TopologyError> {
        let raw: Vec<&str> = input.lines().collect();

        let n_nodes = parse_header(raw.first().copied(), 1, "numBus")?;
        let n_lines = parse_header(raw.get(1).copied(), 2, "numLines")?;
        match raw.get(2) {
            Some(line) if line.trim_start().starts_with('#') => {}
            _ => return Err(TopologyError::Comment { line_no: 3 }),
        }

        let mut lines = Vec::with_capacity(n_lines);
        let mut reactances = Vec::with_capacity(n_lines);
        let mut bounds = Vec::with_capacity(n_lines);
        let mut seen: HashSet<(usize, usize)> = HashSet::new();

        for (row, raw_row) in raw.iter().skip(3).take(n_lines).enumerate() {
            let line_no = 4 + row;
            let fields: Vec<&str> = raw_row.split_whitespace().collect();
            if fields.len() < 5 {
                return Err(TopologyError::RowArity {
                    line_no,
                    found: fields.len(),
                });
            }

            let from: usize = parse_field(fields[0], line_no, "from node")?;
            let to: usize = parse_field(fields[1], line_no, "to node")?;
            let reactance: f64 = parse_field(fields[3], line_no, "reactance")?;
            let bound: f64 = parse_field(fields[4], line_no, "line bound")?;

            for node in [from, to] {
                if node >= n_nodes {
                    return Err(TopologyError::NodeIndex {
                        line_no,
                        node,
                        n_nodes,
                    });
                }
            }
            if from == to {
                return Err(TopologyError::SelfLoop {
                    line_no,
                    node: from,
                });
            }
            if !reactance.is_finite() || reactance <= 0.0 {
                return Err(TopologyError::NonPositive {
                    line_no,
                    field: "reactance",
                    value: reactance,
                });
            }
            if !bound.is_finite() || bound <= 0.0 {
                return Err(TopologyError::NonPositive {
                    line_no,
                    field: "line bound",
                    value: bound,
                });
            }
            if !seen.insert((from.min(to), from.max(to))) {
                return Err(TopologyError::DuplicateLine { line_no, from, to });
            }

            lines.push((from, to));
            reactances.push(reactance);
            bounds.push(bound);
        }

        if lines.len() != n_lines {
            return Err(TopologyError::RowCount {
                declared: n_lines,
                found: lines.len(),
            });
        }

        Ok(Self {
            n_nodes,
            lines,
            reactances,
            bounds,
        })
    }
}

fn parse_header(
    line: Option<&str>,
    line_no: usize,
    expected: &'static str,
) -> Result<usize, TopologyError> {
    let err = || TopologyError::Header { line_no, expected };
    let line = line.ok_or_else(err)?;
    let (name, value) = line.split_once('=').ok_or_else(err)?;
    if name.trim() != expected {
        return Err(err());
    }
    value.trim().parse().map_err(|_| err())
}

fn parse_field<T: std::str::FromStr>(
    raw: &str,
    line_no: usize,
    field: &'static str,
) -> Result<T, TopologyError> {
    raw.parse().map_err(|_| TopologyError::Number {
        line_no,
        field,
        value: raw.to_string(),
    })
}
