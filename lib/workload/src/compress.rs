use crate::{Query, WorkloadInfo};
use common::{CompressionAlgorithm, Set};
use compile::{signature, Signature};
use std::collections::BTreeMap;
use tracing::{info, instrument};

/// Shrinks a workload before the search. Never fails.
pub trait Compressor {
    fn name(&self) -> &'static str;

    fn compress(&self, workload: &WorkloadInfo) -> WorkloadInfo;
}

pub fn compressor_for(algorithm: CompressionAlgorithm) -> Box<dyn Compressor> {
    match algorithm {
        CompressionAlgorithm::None => Box::new(NoneCompressor),
        CompressionAlgorithm::Digest => Box::new(DigestCompressor),
    }
}

/// Keeps the workload as it is.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoneCompressor;

impl Compressor for NoneCompressor {
    fn name(&self) -> &'static str {
        "none"
    }

    fn compress(&self, workload: &WorkloadInfo) -> WorkloadInfo {
        workload.clone()
    }
}

/// Collapses queries of one schema sharing a [`Signature`] into the first of
/// them (in key order), carrying the summed frequency. The same shape in two
/// schemas reads different tables and stays two queries.
#[derive(Debug, Default, Clone, Copy)]
pub struct DigestCompressor;

impl Compressor for DigestCompressor {
    fn name(&self) -> &'static str {
        "digest"
    }

    #[instrument(skip_all, fields(queries = workload.queries().len()))]
    fn compress(&self, workload: &WorkloadInfo) -> WorkloadInfo {
        let mut groups: BTreeMap<(String, Signature), Query> = BTreeMap::new();
        for query in workload.queries() {
            groups
                .entry((query.schema_name().clone(), signature(query.text())))
                .and_modify(|representative| {
                    *representative =
                        representative.with_frequency(representative.frequency() + query.frequency())
                })
                .or_insert_with(|| query.clone());
        }

        let queries: Set<Query> = groups.into_values().collect();
        info!(
            before = workload.queries().len(),
            after = queries.len(),
            "Compressed workload"
        );
        workload.with_queries(queries)
    }
}
