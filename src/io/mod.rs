//! Output serialization for solved schedules.

/// CSV writers for policy and value tables.
pub mod export;

// Re-export the main types for convenience
pub use export::{export_policy_csv, export_value_csv, write_policy_csv, write_value_csv};
