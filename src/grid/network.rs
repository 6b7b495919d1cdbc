//! DC power-flow sensitivity model and line-limit feasibility checks.

use nalgebra::DMatrix;
use thiserror::Error;
use tracing::debug;

use crate::grid::topology::Topology;

/// Index of the reference (slack) node. Its injection is never chosen
/// independently; the load aggregator balances total injection there.
pub const REFERENCE_NODE: usize = 0;

/// Linearized network model with precomputed line-flow sensitivities.
///
/// Construction assembles the nodal susceptance matrix, inverts its reduced
/// form (reference node row/column dropped) once, and derives the PTDF
/// tensor from the inverse. After that, [`Grid::flow`] and [`Grid::feasible`]
/// are pure lookups plus an O(lines × nodes) accumulation; no further linear
/// solves happen for the life of the grid.
#[derive(Debug, Clone)]
pub struct Grid {
    n_nodes: usize,
    lines: Vec<(usize, usize)>,
    reactance: DMatrix<f64>,
    bound: DMatrix<f64>,
    /// PTDF tensor S[k,l,i], flattened row-major over (k, l, i).
    ptdf: Vec<f64>,
}

/// Grid construction failure.
#[derive(Debug, Error)]
pub enum GridError {
    #[error("need at least 2 nodes, got {0}")]
    TooFewNodes(usize),
    #[error("topology declares no lines")]
    NoLines,
    #[error(
        "parallel list length mismatch: {lines} lines, {reactances} reactances, {bounds} bounds"
    )]
    LengthMismatch {
        lines: usize,
        reactances: usize,
        bounds: usize,
    },
    #[error("line ({from}, {to}) references a node outside 0..{n_nodes}")]
    NodeOutOfRange {
        from: usize,
        to: usize,
        n_nodes: usize,
    },
    #[error("line ({from}, {to}) has non-positive reactance {value}")]
    NonPositiveReactance { from: usize, to: usize, value: f64 },
    #[error("reduced susceptance matrix is singular; network may be disconnected")]
    Singular,
}

impl Grid {
    /// Builds the sensitivity model from parallel per-line lists.
    ///
    /// # Arguments
    ///
    /// * `n_nodes` - Node count; node indices in `lines` are zero-based
    /// * `lines` - Declared lines as (from, to) pairs, no duplicates
    /// * `reactances` - Per-line reactance, parallel to `lines`
    /// * `bounds` - Per-line capacity bound, parallel to `lines`
    ///
    /// # Errors
    ///
    /// Returns a [`GridError`] if the lists disagree in length, a line
    /// references a missing node, a reactance is not positive, or the
    /// reduced susceptance matrix cannot be inverted.
    pub fn new(
        n_nodes: usize,
        lines: &[(usize, usize)],
        reactances: &[f64],
        bounds: &[f64],
    ) -> Result<Self, GridError> {
        if n_nodes < 2 {
            return Err(GridError::TooFewNodes(n_nodes));
        }
        if lines.is_empty() {
            return Err(GridError::NoLines);
        }
        if lines.len() != reactances.len() || lines.len() != bounds.len() {
            return Err(GridError::LengthMismatch {
                lines: lines.len(),
                reactances: reactances.len(),
                bounds: bounds.len(),
            });
        }

        let mut reactance = DMatrix::zeros(n_nodes, n_nodes);
        let mut bound = DMatrix::zeros(n_nodes, n_nodes);
        for (idx, &(from, to)) in lines.iter().enumerate() {
            if from >= n_nodes || to >= n_nodes {
                return Err(GridError::NodeOutOfRange { from, to, n_nodes });
            }
            let x = reactances[idx];
            if !x.is_finite() || x <= 0.0 {
                return Err(GridError::NonPositiveReactance { from, to, value: x });
            }
            reactance[(from, to)] = x;
            reactance[(to, from)] = x;
            bound[(from, to)] = bounds[idx];
            bound[(to, from)] = bounds[idx];
        }

        let susceptance = susceptance_matrix(n_nodes, lines, &reactance);
        let impedance = reduced_impedance(&susceptance)?;
        let ptdf = ptdf_tensor(n_nodes, &impedance);
        debug!(n_nodes, n_lines = lines.len(), "grid sensitivity model built");

        Ok(Self {
            n_nodes,
            lines: lines.to_vec(),
            reactance,
            bound,
            ptdf,
        })
    }

    /// Builds the sensitivity model from a parsed topology.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Grid::new`].
    pub fn from_topology(topology: &Topology) -> Result<Self, GridError> {
        Self::new(
            topology.n_nodes,
            &topology.lines,
            &topology.reactances,
            &topology.bounds,
        )
    }

    /// Number of nodes in the network.
    pub fn n_nodes(&self) -> usize {
        self.n_nodes
    }

    /// Declared lines as (from, to) pairs, in declaration order.
    pub fn lines(&self) -> &[(usize, usize)] {
        &self.lines
    }

    /// Sensitivity of the flow on line (k, l) to a unit injection at node i.
    ///
    /// # Panics
    ///
    /// Panics if any index is outside `0..n_nodes`.
    pub fn ptdf(&self, k: usize, l: usize, i: usize) -> f64 {
        self.ptdf[(k * self.n_nodes + l) * self.n_nodes + i]
    }

    /// Computes per-line flows for a nodal load vector.
    ///
    /// Returns a dense node × node matrix populated only at declared line
    /// positions (in their declared orientation). The accumulation runs over
    /// injection nodes `0..n_nodes-1`; the last node is never summed, which
    /// is consistent with the reference-node handling baked into the PTDF
    /// tensor.
    ///
    /// # Panics
    ///
    /// Panics if `loads.len() != n_nodes`.
    pub fn flow(&self, loads: &[f64]) -> DMatrix<f64> {
        assert!(
            loads.len() == self.n_nodes,
            "load vector has {} entries for {} nodes",
            loads.len(),
            self.n_nodes
        );

        let mut flow = DMatrix::zeros(self.n_nodes, self.n_nodes);
        for &(k, l) in &self.lines {
            let susceptance = 1.0 / self.reactance[(k, l)];
            let mut total = 0.0;
            for (i, &load) in loads.iter().enumerate().take(self.n_nodes - 1) {
                total += load * susceptance * self.ptdf(k, l, i);
            }
            flow[(k, l)] = total;
        }
        flow
    }

    /// Reports whether a nodal load vector respects every line bound.
    ///
    /// A load vector is feasible when no line's absolute flow strictly
    /// exceeds its capacity bound. Pure function of the grid and the loads.
    ///
    /// # Panics
    ///
    /// Panics if `loads.len() != n_nodes`.
    pub fn feasible(&self, loads: &[f64]) -> bool {
        let flow = self.flow(loads);
        self.lines
            .iter()
            .all(|&(i, j)| flow[(i, j)].abs() <= self.bound[(i, j)])
    }
}

/// Assembles the nodal susceptance matrix: -1/x off-diagonal for each line,
/// diagonal accumulating the incident line susceptances.
fn susceptance_matrix(
    n_nodes: usize,
    lines: &[(usize, usize)],
    reactance: &DMatrix<f64>,
) -> DMatrix<f64> {
    let mut m = DMatrix::zeros(n_nodes, n_nodes);
    for &(i, j) in lines {
        let b = 1.0 / reactance[(i, j)];
        m[(i, j)] = -b;
        m[(j, i)] = -b;
        m[(i, i)] += b;
        m[(j, j)] += b;
    }
    m
}

/// Inverts the susceptance matrix with the reference node row/column dropped.
fn reduced_impedance(susceptance: &DMatrix<f64>) -> Result<DMatrix<f64>, GridError> {
    let n = susceptance.nrows();
    let reduced = susceptance.view_range(1..n, 1..n).into_owned();
    reduced.try_inverse().ok_or(GridError::Singular)
}

/// Derives the full ordered-pair PTDF tensor from the reduced impedance
/// matrix. Entries with k == l stay zero.
fn ptdf_tensor(n_nodes: usize, impedance: &DMatrix<f64>) -> Vec<f64> {
    let mut s = vec![0.0; n_nodes * n_nodes * n_nodes];
    for k in 0..n_nodes {
        for l in 0..n_nodes {
            if k == l {
                continue;
            }
            for i in 0..n_nodes {
                let col = reduced_column(i, n_nodes);
                let value = if k == REFERENCE_NODE {
                    -impedance[(l - 1, col)]
                } else if l == REFERENCE_NODE {
                    impedance[(k - 1, col)]
                } else {
                    impedance[(k - 1, col)] - impedance[(l - 1, col)]
                };
                s[(k * n_nodes + l) * n_nodes + i] = value;
            }
        }
    }
    s
}

/// Reduced-matrix column for injection node `i`. The reference node does not
/// drop out; it wraps to the last reduced column.
fn reduced_column(i: usize, n_nodes: usize) -> usize {
    if i == REFERENCE_NODE { n_nodes - 2 } else { i - 1 }
}
