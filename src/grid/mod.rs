//! Network model: topology parsing and the DC sensitivity engine.

/// PTDF-based flow and feasibility queries.
pub mod network;
/// Topology text format parsing.
pub mod topology;

// Re-export the main types for convenience
pub use network::Grid;
pub use network::GridError;
pub use network::REFERENCE_NODE;
pub use topology::Topology;
pub use topology::TopologyError;
