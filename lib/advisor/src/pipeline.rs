use crate::{selector_for, AdvisorError, IndexSelector, Parameter};
use catalog::Index;
use common::util::time::format_duration;
use common::{AdvisorConfig, Set};
use core::fmt;
use getset::Getters;
use metrics::StatsReport;
use std::time::Instant;
use tracing::{info, instrument};
use typed_builder::TypedBuilder;
use whatif::{evaluate_cost, IndexConfCost, WhatIfOptimizer};
use workload::{compressor_for, Compressor, Extractor, SqlExtractor, WorkloadInfo};

/// The recommended indexes, with the workload cost before and after.
#[derive(Debug, Clone, PartialEq, Getters)]
#[getset(get = "pub")]
pub struct Recommendation {
    indexes: Set<Index>,
    baseline_cost: IndexConfCost,
    recommended_cost: IndexConfCost,
    /// Oracle calls made on the session, as far as it counts them.
    oracle_stats: StatsReport,
}

impl Recommendation {
    /// One `CREATE INDEX` statement per recommended index, in key order.
    pub fn ddl(&self) -> Vec<String> {
        self.indexes.iter().map(Index::ddl).collect()
    }

    /// Share of the baseline cost the recommended indexes save.
    pub fn improvement(&self) -> f64 {
        let baseline = self.baseline_cost.total_workload_cost();
        if baseline <= 0.0 {
            return 0.0;
        }
        1.0 - self.recommended_cost.total_workload_cost() / baseline
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for statement in self.ddl() {
            writeln!(f, "{};", statement)?;
        }
        Ok(())
    }
}

/// Runs a workload through compression, column extraction and index
/// selection against one oracle session.
///
/// The strategies are chosen once, when the advisor is built.
#[derive(TypedBuilder)]
pub struct Advisor {
    compressor: Box<dyn Compressor>,
    extractor: Box<dyn Extractor>,
    selector: Box<dyn IndexSelector>,
    parameter: Parameter,
}

impl fmt::Debug for Advisor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Advisor")
            .field("compressor", &self.compressor.name())
            .field("selector", &self.selector.name())
            .field("parameter", &self.parameter)
            .finish()
    }
}

impl Advisor {
    pub fn from_config(config: &AdvisorConfig) -> Self {
        Advisor::builder()
            .compressor(compressor_for(config.compression()))
            .extractor(Box::new(SqlExtractor::from_config(config)))
            .selector(selector_for(config.selection(), config))
            .parameter(Parameter::from_config(config))
            .build()
    }

    pub fn parameter(&self) -> Parameter {
        self.parameter
    }

    /// Recommends indexes for `workload`. Any failure aborts the whole run.
    #[instrument(skip_all, fields(queries = workload.queries().len()))]
    pub fn advise(
        &self,
        optimizer: &mut dyn WhatIfOptimizer,
        workload: &WorkloadInfo,
    ) -> Result<Recommendation, AdvisorError> {
        let start = Instant::now();

        let compressed = self.compressor.compress(workload);
        let extracted = self.extractor.extract(&compressed)?;
        info!(
            queries = extracted.queries().len(),
            indexable_columns = extracted.indexable_columns().len(),
            "Prepared workload"
        );

        let empty = Set::new();
        let baseline_cost = evaluate_cost(&mut *optimizer, &extracted, &empty)?;
        let indexes = self
            .selector
            .select(&mut *optimizer, &extracted, &self.parameter)?;
        let recommended_cost = evaluate_cost(&mut *optimizer, &extracted, &indexes)?;

        info!(
            indexes = %indexes,
            baseline = %baseline_cost,
            recommended = %recommended_cost,
            elapsed = %format_duration(start.elapsed()),
            "Recommendation ready"
        );

        Ok(Recommendation {
            indexes,
            baseline_cost,
            recommended_cost,
            oracle_stats: optimizer.stats(),
        })
    }
}
