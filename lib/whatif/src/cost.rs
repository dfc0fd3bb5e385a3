use crate::{HypoIndexGuard, OracleError, WhatIfOptimizer};
use catalog::Index;
use common::Set;
use getset::{CopyGetters, Getters};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, instrument, trace};
use workload::WorkloadInfo;

/// Cost differences at or below this are estimate noise.
pub const COST_ABSOLUTE_THRESHOLD: f64 = 10.0;

/// Cost differences at or below this share of the larger cost are estimate noise.
pub const COST_RELATIVE_THRESHOLD: f64 = 0.001;

/// Estimated cost of a workload under one index configuration.
///
/// The default value (zero cost) stands for "not evaluated yet" and loses
/// every comparison against an evaluated cost.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Getters, CopyGetters)]
pub struct IndexConfCost {
    #[getset(get_copy = "pub")]
    total_workload_cost: f64,
    #[getset(get_copy = "pub")]
    total_number_of_index_columns: usize,
    /// Keys of the configuration's indexes, sorted and comma-separated.
    #[getset(get = "pub")]
    index_keys: String,
}

impl IndexConfCost {
    pub fn new(total_workload_cost: f64, indexes: &Set<Index>) -> Self {
        Self {
            total_workload_cost,
            total_number_of_index_columns: indexes.iter().map(Index::width).sum(),
            index_keys: indexes.key_string(),
        }
    }

    pub fn is_evaluated(&self) -> bool {
        self.total_workload_cost != 0.0
    }

    /// Whether this configuration is strictly preferable to `other`.
    ///
    /// Costs are compared only when they differ by more than both noise
    /// thresholds. Otherwise the configuration with fewer indexed columns
    /// wins, then the one with the smaller key string.
    pub fn less(&self, other: &IndexConfCost) -> bool {
        if !self.is_evaluated() {
            return false;
        }
        if !other.is_evaluated() {
            return true;
        }

        let diff = (self.total_workload_cost - other.total_workload_cost).abs();
        let larger = self.total_workload_cost.max(other.total_workload_cost);
        if diff > COST_ABSOLUTE_THRESHOLD && diff / larger > COST_RELATIVE_THRESHOLD {
            return self.total_workload_cost < other.total_workload_cost;
        }

        if self.total_number_of_index_columns != other.total_number_of_index_columns {
            return self.total_number_of_index_columns < other.total_number_of_index_columns;
        }

        self.index_keys < other.index_keys
    }
}

impl fmt::Display for IndexConfCost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.2} ({} columns) {{{}}}",
            self.total_workload_cost, self.total_number_of_index_columns, self.index_keys
        )
    }
}

/// Prices every select of `workload` with `indexes` in place as hypothetical
/// indexes, weighting each query's plan cost by its frequency.
///
/// The indexes are dropped again before returning, whether or not pricing
/// succeeded. The session is switched with `USE <schema>` whenever the next
/// query belongs to another schema than the previous one.
#[instrument(skip_all, fields(indexes = %indexes))]
pub fn evaluate_cost<O: WhatIfOptimizer + ?Sized>(
    optimizer: &mut O,
    workload: &WorkloadInfo,
    indexes: &Set<Index>,
) -> Result<IndexConfCost, OracleError> {
    let mut guard = HypoIndexGuard::create(optimizer, indexes)?;
    let total = price_selects(guard.optimizer(), workload);
    let released = guard.release();

    let total = total?;
    released?;

    let cost = IndexConfCost::new(total, indexes);
    debug!(cost = %cost, "Evaluated configuration");
    Ok(cost)
}

fn price_selects<O: WhatIfOptimizer + ?Sized>(
    optimizer: &mut O,
    workload: &WorkloadInfo,
) -> Result<f64, OracleError> {
    let mut current_schema: Option<&str> = None;
    let mut total = 0.0;

    for query in workload.select_queries() {
        if current_schema != Some(query.schema_name().as_str()) {
            optimizer.execute(&format!("USE {}", query.schema_name()))?;
            current_schema = Some(query.schema_name().as_str());
        }

        let plan = optimizer.explain(query.text())?;
        trace!(query = %query.text(), cost = plan.cost(), "Explained query");
        total += plan.cost() * query.frequency() as f64;
    }

    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::Column;
    use pretty_assertions_sorted::assert_eq;

    fn conf(cost: f64, indexes: &[(&str, &[&str])]) -> IndexConfCost {
        let set: Set<Index> = indexes
            .iter()
            .map(|(table, columns)| {
                Index::new(
                    "test",
                    table,
                    columns
                        .iter()
                        .map(|c| Column::new("test", table, c))
                        .collect(),
                )
            })
            .collect();
        IndexConfCost::new(cost, &set)
    }

    #[test]
    fn test_uninitialized_cost_never_wins() {
        let unset = IndexConfCost::default();
        let evaluated = conf(1_000_000.0, &[("t", &["a", "b", "c"])]);

        assert!(!unset.less(&evaluated));
        assert!(evaluated.less(&unset));
        assert!(!unset.less(&unset));
    }

    #[test]
    fn test_significant_difference_compares_cost() {
        let cheap = conf(1000.0, &[("t", &["a", "b"])]);
        let dear = conf(2000.0, &[("t", &["a"])]);

        assert!(cheap.less(&dear));
        assert!(!dear.less(&cheap));
    }

    #[test]
    fn test_noise_falls_back_to_column_count() {
        // Below the absolute threshold.
        let wide = conf(100.0, &[("t", &["a", "b"])]);
        let narrow = conf(105.0, &[("t", &["a"])]);
        assert!(narrow.less(&wide));
        assert!(!wide.less(&narrow));

        // Above the absolute threshold but below the relative one.
        let wide = conf(1_000_000.0, &[("t", &["a", "b"])]);
        let narrow = conf(1_000_500.0, &[("t", &["a"])]);
        assert!(narrow.less(&wide));
    }

    #[test]
    fn test_full_tie_breaks_on_keys() {
        let a = conf(100.0, &[("t", &["a"])]);
        let b = conf(100.0, &[("t", &["b"])]);

        assert!(a.less(&b));
        assert!(!b.less(&a));
        assert!(!a.less(&a.clone()));
    }

    #[test]
    fn test_columns_and_keys() {
        let cost = conf(10.0, &[("t", &["b", "a"]), ("s", &["x"])]);
        assert_eq!(cost.total_number_of_index_columns(), 3);
        assert_eq!(cost.index_keys(), "test.s(x),test.t(b,a)");
    }
}
