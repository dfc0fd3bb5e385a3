//! # What-If Cost Oracle
//!
//! The protocol the advisor uses to ask an optimizer "what would this
//! workload cost if these indexes existed?", without building any of them.
//!
//! - [`WhatIfOptimizer`] is the session contract: execute statements,
//!   create and drop hypothetical indexes, explain queries.
//! - [`evaluate_cost`] prices a whole workload under a candidate index set,
//!   returning an [`IndexConfCost`] whose comparison tolerates estimate noise.
//! - [`HypoIndexGuard`] scopes hypothetical indexes to one evaluation and
//!   drops them on every exit path.
//! - [`InstrumentedOptimizer`] counts and times the calls made to any oracle.
//! - [`sim::SimulatedOptimizer`] is an in-process oracle with a small,
//!   deterministic cost model.
//!
//! A session holds mutable state (its hypothetical indexes, its current
//! schema), so every method takes `&mut self`: one evaluation owns the
//! session for its whole duration.

pub mod cost;
pub mod error;
pub mod guard;
pub mod instrumented;
pub mod optimizer;
pub mod plan;
pub mod sim;

pub use cost::{evaluate_cost, IndexConfCost};
pub use error::OracleError;
pub use guard::HypoIndexGuard;
pub use instrumented::InstrumentedOptimizer;
pub use optimizer::WhatIfOptimizer;
pub use plan::{Plan, PlanRow};
