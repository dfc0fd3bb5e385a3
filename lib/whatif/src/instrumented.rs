use crate::{OracleError, Plan, WhatIfOptimizer};
use catalog::Index;
use core::fmt;
use metrics::{OracleCall, OracleStats, StatsReport};
use std::time::Instant;

/// Wraps an oracle, counting and timing every call it answers.
pub struct InstrumentedOptimizer<O> {
    inner: O,
    stats: OracleStats,
}

impl<O> fmt::Debug for InstrumentedOptimizer<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstrumentedOptimizer")
            .field("stats", &self.stats)
            .finish()
    }
}

impl<O: WhatIfOptimizer> InstrumentedOptimizer<O> {
    pub fn new(inner: O) -> Self {
        Self::with_stats(inner, OracleStats::new())
    }

    /// Records into `stats`, which may be shared with other sessions.
    pub fn with_stats(inner: O, stats: OracleStats) -> Self {
        Self { inner, stats }
    }

    pub fn inner(&self) -> &O {
        &self.inner
    }

    pub fn into_inner(self) -> O {
        self.inner
    }

    fn timed<T>(
        &mut self,
        call: OracleCall,
        f: impl FnOnce(&mut O) -> Result<T, OracleError>,
    ) -> Result<T, OracleError> {
        let start = Instant::now();
        let result = f(&mut self.inner);
        self.stats.record(call, start.elapsed());
        result
    }
}

impl<O: WhatIfOptimizer> WhatIfOptimizer for InstrumentedOptimizer<O> {
    fn execute(&mut self, statement: &str) -> Result<(), OracleError> {
        self.timed(OracleCall::Execute, |inner| inner.execute(statement))
    }

    fn create_hypo_index(&mut self, index: &Index) -> Result<(), OracleError> {
        self.timed(OracleCall::CreateHypoIndex, |inner| {
            inner.create_hypo_index(index)
        })
    }

    fn drop_hypo_index(&mut self, index: &Index) -> Result<(), OracleError> {
        self.timed(OracleCall::DropHypoIndex, |inner| inner.drop_hypo_index(index))
    }

    fn explain(&mut self, query: &str) -> Result<Plan, OracleError> {
        self.timed(OracleCall::Explain, |inner| inner.explain(query))
    }

    fn explain_analyze(&mut self, query: &str) -> Result<Plan, OracleError> {
        self.timed(OracleCall::ExplainAnalyze, |inner| inner.explain_analyze(query))
    }

    fn reset_stats(&mut self) {
        self.stats.reset();
    }

    fn stats(&self) -> StatsReport {
        self.stats.report()
    }
}
