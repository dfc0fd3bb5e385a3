use crate::{OracleError, Plan};
use catalog::Index;
use metrics::StatsReport;

/// A session against an optimizer that can price queries under hypothetical indexes.
///
/// Hypothetical indexes are session state: they stay registered until
/// dropped and affect every later `explain` on the same session.
pub trait WhatIfOptimizer {
    /// Runs a statement for its side effects (`USE db`, DDL, settings).
    fn execute(&mut self, statement: &str) -> Result<(), OracleError>;

    fn create_hypo_index(&mut self, index: &Index) -> Result<(), OracleError>;

    fn drop_hypo_index(&mut self, index: &Index) -> Result<(), OracleError>;

    /// The plan the optimizer would choose, with its estimated cost.
    fn explain(&mut self, query: &str) -> Result<Plan, OracleError>;

    /// Runs the query and reports the chosen plan with its actual execution time.
    fn explain_analyze(&mut self, query: &str) -> Result<Plan, OracleError>;

    fn reset_stats(&mut self) {}

    fn stats(&self) -> StatsReport {
        StatsReport::default()
    }
}

impl<O: WhatIfOptimizer + ?Sized> WhatIfOptimizer for Box<O> {
    fn execute(&mut self, statement: &str) -> Result<(), OracleError> {
        (**self).execute(statement)
    }

    fn create_hypo_index(&mut self, index: &Index) -> Result<(), OracleError> {
        (**self).create_hypo_index(index)
    }

    fn drop_hypo_index(&mut self, index: &Index) -> Result<(), OracleError> {
        (**self).drop_hypo_index(index)
    }

    fn explain(&mut self, query: &str) -> Result<Plan, OracleError> {
        (**self).explain(query)
    }

    fn explain_analyze(&mut self, query: &str) -> Result<Plan, OracleError> {
        (**self).explain_analyze(query)
    }

    fn reset_stats(&mut self) {
        (**self).reset_stats()
    }

    fn stats(&self) -> StatsReport {
        (**self).stats()
    }
}
