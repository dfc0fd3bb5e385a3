use crate::{AdvisorError, AutoAdmin, Parameter};
use catalog::Index;
use common::{AdvisorConfig, SelectionAlgorithm, Set};
use whatif::WhatIfOptimizer;
use workload::WorkloadInfo;

/// A search that picks the indexes to recommend for an extracted workload.
///
/// Every cost the search needs comes from `optimizer`. An oracle failure
/// aborts the search: there is no best-effort result.
pub trait IndexSelector {
    fn name(&self) -> &'static str;

    fn select(
        &self,
        optimizer: &mut dyn WhatIfOptimizer,
        workload: &WorkloadInfo,
        parameter: &Parameter,
    ) -> Result<Set<Index>, AdvisorError>;
}

pub fn selector_for(algorithm: SelectionAlgorithm, config: &AdvisorConfig) -> Box<dyn IndexSelector> {
    match algorithm {
        SelectionAlgorithm::AutoAdmin => Box::new(AutoAdmin::from_config(config)),
    }
}
