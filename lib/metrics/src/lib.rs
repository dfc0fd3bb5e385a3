//! Call counters for the cost oracle.
//!
//! Every request the advisor sends to the what-if optimizer is counted and
//! timed per [`OracleCall`] kind in an [`OracleStats`] registry, which can be
//! snapshotted into a [`StatsReport`] for logging or JSON export.

pub mod manager;
pub mod metric;

pub use manager::{OracleStats, StatsReport};
pub use metric::{CallStats, OracleCall};
