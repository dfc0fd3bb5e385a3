//! # Auto-Admin Index Selection
//!
//! A what-if search in the style of the AutoAdmin index tuner. Every decision
//! is driven by costs from the oracle; no index is ever physically built.
//!
//! The search runs in four phases:
//!
//! 1. **Width escalation.** For each width from 1 up to the maximum, seed
//!    candidates (single columns at width 1, the previous width's winners
//!    widened by one column afterwards), narrow them query by query, then
//!    search for the best combination over the whole workload.
//! 2. **Index merge.** For queries with `OR` predicates on several columns,
//!    try adding single-column indexes that let the optimizer merge index
//!    scans instead of scanning the table.
//! 3. **Filtering.** Drop indexes that are a prefix of another recommended
//!    index, that an existing index already covers, or whose removal does not
//!    make the workload measurably more expensive.
//! 4. **Top-up.** While below the index budget, grow the set greedily from
//!    the candidates seen so far, then filter again.
//!
//! Sets are values: every step builds a new set instead of adding and
//! undoing in place, so no configuration is shared between two evaluations.

use crate::{AdvisorError, IndexSelector, Parameter};
use catalog::Index;
use common::{
    AdvisorConfig, Set, SetKey, DEFAULT_BEST_PER_QUERY, DEFAULT_NAIVE_PAIR_THRESHOLD,
    DEFAULT_TOP_UP_ATTEMPTS,
};
use getset::CopyGetters;
use tracing::{debug, info, instrument, trace};
use typed_builder::TypedBuilder;
use whatif::{evaluate_cost, IndexConfCost, OracleError, WhatIfOptimizer};
use workload::WorkloadInfo;

/// Tuning knobs of the search. The index budget itself comes from [`Parameter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, TypedBuilder, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct AutoAdmin {
    /// Distinct winners kept per query while narrowing candidates.
    #[builder(default = DEFAULT_BEST_PER_QUERY)]
    best_per_query: usize,
    /// Above this many candidates the naive enumeration stops trying pairs.
    #[builder(default = DEFAULT_NAIVE_PAIR_THRESHOLD)]
    naive_pair_threshold: usize,
    #[builder(default = DEFAULT_TOP_UP_ATTEMPTS)]
    top_up_attempts: usize,
}

impl Default for AutoAdmin {
    fn default() -> Self {
        AutoAdmin::builder().build()
    }
}

impl AutoAdmin {
    pub fn from_config(config: &AdvisorConfig) -> Self {
        AutoAdmin::builder()
            .best_per_query(config.best_per_query())
            .naive_pair_threshold(config.naive_pair_threshold())
            .top_up_attempts(config.top_up_attempts())
            .build()
    }
}

impl IndexSelector for AutoAdmin {
    fn name(&self) -> &'static str {
        "auto_admin"
    }

    #[instrument(
        skip_all,
        fields(
            max_num_index = parameter.max_num_index(),
            max_index_width = parameter.max_index_width()
        )
    )]
    fn select(
        &self,
        optimizer: &mut dyn WhatIfOptimizer,
        workload: &WorkloadInfo,
        parameter: &Parameter,
    ) -> Result<Set<Index>, AdvisorError> {
        let mut search = Search {
            optimizer,
            settings: *self,
            parameter: *parameter,
        };
        let indexes = search.run(workload)?;
        info!(indexes = %indexes, "Selected indexes");
        Ok(indexes)
    }
}

/// One run of the search over one oracle session.
struct Search<'a> {
    optimizer: &'a mut dyn WhatIfOptimizer,
    settings: AutoAdmin,
    parameter: Parameter,
}

impl Search<'_> {
    fn cost(
        &mut self,
        workload: &WorkloadInfo,
        indexes: &Set<Index>,
    ) -> Result<IndexConfCost, OracleError> {
        evaluate_cost(&mut *self.optimizer, workload, indexes)
    }

    fn run(&mut self, workload: &WorkloadInfo) -> Result<Set<Index>, OracleError> {
        let mut potential = Set::new();
        let mut best = Set::new();

        for width in 1..=self.parameter.max_index_width() {
            let candidates = if width == 1 {
                single_column_candidates(workload)
            } else {
                widened_candidates(workload, &best)
            };
            if candidates.is_empty() {
                break;
            }

            best = self.search_width(workload, width, &candidates, &mut potential)?;
        }

        let best = self.merge_dnf(workload, best)?;
        let best = self.filter(workload, &best)?;
        self.top_up(workload, best, &potential)
    }

    /// Best configuration at one width. The narrowed candidates are kept in
    /// `potential` for the top-up phase.
    #[instrument(skip_all, fields(width = width, candidates = candidates.len()))]
    fn search_width(
        &mut self,
        workload: &WorkloadInfo,
        width: usize,
        candidates: &Set<Index>,
        potential: &mut Set<Index>,
    ) -> Result<Set<Index>, OracleError> {
        let narrowed = self.select_index_candidates(workload, candidates)?;
        let best = self.enumerate_combinations(workload, &narrowed)?;
        debug!(narrowed = %narrowed, best = %best, "Searched width");
        potential.add_all(&narrowed);
        Ok(best)
    }

    /// Keeps, for every query, the candidates that win when the query is
    /// tuned on its own. A candidate is considered for a query only if the
    /// query references its leading column.
    fn select_index_candidates(
        &mut self,
        workload: &WorkloadInfo,
        candidates: &Set<Index>,
    ) -> Result<Set<Index>, OracleError> {
        let mut selected = Set::new();

        for query in workload.select_queries() {
            let single = workload.with_queries(vec![query.clone()].into());
            let mut remaining: Set<Index> = candidates
                .iter()
                .filter(|index| {
                    index
                        .leading_column()
                        .map_or(false, |column| query.indexable_columns().contains(column))
                })
                .cloned()
                .collect();

            for _ in 0..self.settings.best_per_query {
                if remaining.is_empty() {
                    break;
                }
                let winners = self.enumerate_combinations(&single, &remaining)?;
                if winners.is_empty() {
                    break;
                }
                trace!(query = %query.text(), winners = %winners, "Query winners");
                remaining.remove_all(&winners);
                selected.add_all(&winners);
            }
        }

        Ok(selected)
    }

    /// Best combination of `candidates` within the index budget: a bounded
    /// exhaustive search, then greedy growth from its result.
    fn enumerate_combinations(
        &mut self,
        workload: &WorkloadInfo,
        candidates: &Set<Index>,
    ) -> Result<Set<Index>, OracleError> {
        let (start, start_cost) = self.enumerate_naive(workload, candidates)?;
        self.enumerate_greedy(workload, start, start_cost, candidates)
    }

    /// Tries every combination of one or two candidates (only one once the
    /// pool is large). Starts from the empty configuration, so a candidate
    /// that helps nothing is never picked.
    fn enumerate_naive(
        &mut self,
        workload: &WorkloadInfo,
        candidates: &Set<Index>,
    ) -> Result<(Set<Index>, IndexConfCost), OracleError> {
        let pair_limit = if candidates.len() > self.settings.naive_pair_threshold {
            1
        } else {
            2
        };
        let max_size = pair_limit
            .min(self.parameter.max_num_index())
            .min(candidates.len());

        let mut best = Set::new();
        let mut best_cost = self.cost(workload, &best)?;
        for size in 1..=max_size {
            for combination in candidates.combinations(size) {
                let cost = self.cost(workload, &combination)?;
                if cost.less(&best_cost) {
                    best = combination;
                    best_cost = cost;
                }
            }
        }

        Ok((best, best_cost))
    }

    /// Adds one candidate at a time, always the one giving the cheapest
    /// configuration, while that beats the current configuration and the
    /// budget allows.
    fn enumerate_greedy(
        &mut self,
        workload: &WorkloadInfo,
        mut current: Set<Index>,
        mut current_cost: IndexConfCost,
        candidates: &Set<Index>,
    ) -> Result<Set<Index>, OracleError> {
        while current.len() < self.parameter.max_num_index() {
            let mut step: Option<(Set<Index>, IndexConfCost)> = None;
            for candidate in &candidates.difference(&current) {
                let trial = current.with(candidate.clone());
                let cost = self.cost(workload, &trial)?;
                if step.as_ref().map_or(true, |(_, best)| cost.less(best)) {
                    step = Some((trial, cost));
                }
            }

            match step {
                Some((trial, cost)) if cost.less(&current_cost) => {
                    current = trial;
                    current_cost = cost;
                }
                _ => break,
            }
        }

        Ok(current)
    }

    /// Adds single-column indexes on the `OR`ed columns of each query when
    /// that lowers the workload cost.
    #[instrument(skip_all)]
    fn merge_dnf(
        &mut self,
        workload: &WorkloadInfo,
        mut best: Set<Index>,
    ) -> Result<Set<Index>, OracleError> {
        let mut best_cost = self.cost(workload, &best)?;

        for query in workload.select_queries() {
            let uncovered: Set<Index> = query
                .dnf_columns()
                .iter()
                .map(Index::on_column)
                .filter(|single| !best.iter().any(|index| index.prefix_contain(single)))
                .collect();
            if uncovered.is_empty() {
                continue;
            }

            let merged = best.union(&uncovered);
            if merged.len() > self.parameter.max_num_index() {
                debug!(query = %query.text(), "Index merge would exceed the budget");
                continue;
            }

            let cost = self.cost(workload, &merged)?;
            if cost.less(&best_cost) {
                best = self.filter(workload, &merged)?;
                best_cost = self.cost(workload, &best)?;
                debug!(query = %query.text(), best = %best, "Accepted index merge");
            }
        }

        Ok(best)
    }

    /// Removes, one index at a time, every index that is redundant or useless.
    #[instrument(skip_all, fields(indexes = indexes.len()))]
    fn filter(
        &mut self,
        workload: &WorkloadInfo,
        indexes: &Set<Index>,
    ) -> Result<Set<Index>, OracleError> {
        let mut kept = indexes.clone();

        for index in indexes {
            let dominated = kept
                .iter()
                .any(|other| other.key() != index.key() && other.prefix_contain(index));
            if dominated {
                trace!(index = %index, "Dropped prefix of another index");
                kept.remove(index);
            }
        }

        for index in indexes {
            let covered = workload
                .table(index.schema_name(), index.table_name())
                .map_or(false, |table| table.has_covering_index(index));
            if covered && kept.remove(index).is_some() {
                trace!(index = %index, "Dropped index covered by an existing one");
            }
        }

        // Cost of `kept`, carried from one check to the next.
        let mut kept_cost: Option<IndexConfCost> = None;
        for index in indexes {
            if !kept.contains(index) {
                continue;
            }
            let cost_with = match kept_cost.take() {
                Some(cost) => cost,
                None => self.cost(workload, &kept)?,
            };
            let without = kept.without(index);
            let cost_without = self.cost(workload, &without)?;
            if cost_with.less(&cost_without) {
                kept_cost = Some(cost_with);
            } else {
                trace!(index = %index, "Dropped index without benefit");
                kept = without;
                kept_cost = Some(cost_without);
            }
        }

        Ok(kept)
    }

    #[instrument(skip_all)]
    fn top_up(
        &mut self,
        workload: &WorkloadInfo,
        mut best: Set<Index>,
        potential: &Set<Index>,
    ) -> Result<Set<Index>, OracleError> {
        for attempt in 1..=self.settings.top_up_attempts {
            if best.len() >= self.parameter.max_num_index() {
                break;
            }
            let remaining = potential.difference(&best);
            if remaining.is_empty() {
                break;
            }

            let baseline = self.cost(workload, &best)?;
            let grown = self.enumerate_greedy(workload, best.clone(), baseline, &remaining)?;
            if grown.len() == best.len() {
                break;
            }

            best = self.filter(workload, &grown)?;
            debug!(attempt, best = %best, "Topped up");
        }

        Ok(best)
    }
}

/// One single-column index per indexable column of the workload.
fn single_column_candidates(workload: &WorkloadInfo) -> Set<Index> {
    workload
        .indexable_columns()
        .iter()
        .map(Index::on_column)
        .collect()
}

/// `best`, plus each of its indexes extended by one more indexable column
/// of the same table.
fn widened_candidates(workload: &WorkloadInfo, best: &Set<Index>) -> Set<Index> {
    let mut candidates = best.clone();
    for index in best {
        let table_key = index.table_key();
        candidates.extend(
            workload
                .indexable_columns()
                .iter()
                .filter(|column| column.table_key() == table_key && !index.contains_column(column))
                .map(|column| index.widen(column)),
        );
    }
    candidates
}
