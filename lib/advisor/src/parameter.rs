use common::AdvisorConfig;
use getset::CopyGetters;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Largest number of indexes a single recommendation may hold.
pub const MAX_NUM_INDEX_LIMIT: usize = 20;

/// Largest number of columns a recommended index may have.
pub const MAX_INDEX_WIDTH_LIMIT: usize = 5;

/// Bounds of one recommendation. Out-of-range values are clamped, never rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct Parameter {
    max_num_index: usize,
    max_index_width: usize,
}

impl Parameter {
    pub fn new(max_num_index: usize, max_index_width: usize) -> Self {
        Self {
            max_num_index: clamp("max_num_index", max_num_index, MAX_NUM_INDEX_LIMIT),
            max_index_width: clamp("max_index_width", max_index_width, MAX_INDEX_WIDTH_LIMIT),
        }
    }

    pub fn from_config(config: &AdvisorConfig) -> Self {
        Self::new(config.max_num_index(), config.max_index_width())
    }
}

impl Default for Parameter {
    fn default() -> Self {
        Self::from_config(&AdvisorConfig::default())
    }
}

fn clamp(name: &str, value: usize, limit: usize) -> usize {
    let clamped = value.clamp(1, limit);
    if clamped != value {
        warn!(parameter = name, value, clamped, "Parameter out of range [1, {limit}], clamping");
    }
    clamped
}
