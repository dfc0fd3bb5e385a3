use crate::metric::{CallStats, OracleCall};
use common::util::time::format_duration;
use core::fmt;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Shared call counters. Clones share the same counters.
#[derive(Clone, Default)]
pub struct OracleStats {
    calls: Arc<DashMap<OracleCall, CallStats>>,
}

impl fmt::Debug for OracleStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OracleStats")
            .field("calls", &self.calls)
            .finish()
    }
}

impl OracleStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, call: OracleCall, elapsed: Duration) {
        self.calls.entry(call).or_default().record(elapsed);
    }

    pub fn reset(&self) {
        self.calls.clear();
    }

    pub fn report(&self) -> StatsReport {
        StatsReport {
            calls: self
                .calls
                .iter()
                .map(|entry| (*entry.key(), *entry.value()))
                .collect(),
        }
    }
}

/// A point-in-time copy of the counters, ordered by call kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsReport {
    calls: BTreeMap<OracleCall, CallStats>,
}

impl StatsReport {
    pub fn get(&self, call: OracleCall) -> CallStats {
        self.calls.get(&call).copied().unwrap_or_default()
    }

    pub fn total_calls(&self) -> u64 {
        self.calls.values().map(|stats| stats.count()).sum()
    }

    pub fn total_time(&self) -> Duration {
        self.calls.values().map(|stats| stats.total()).sum()
    }

    pub fn to_json(&self) -> String {
        let mut all_calls = serde_json::Map::new();

        for (call, stats) in &self.calls {
            all_calls.insert(
                call.to_string(),
                json!({
                    "count": stats.count(),
                    "total_ms": stats.total().as_secs_f64() * 1000.0,
                }),
            );
        }

        json!(all_calls).to_string()
    }

    /// One line per call kind, e.g. `explain: 12 calls, 3.500ms total, 291μs avg`.
    pub fn summary(&self) -> String {
        OracleCall::ALL
            .iter()
            .filter_map(|call| self.calls.get(call).map(|stats| (call, stats)))
            .map(|(call, stats)| {
                format!(
                    "{}: {} calls, {} total, {} avg",
                    call,
                    stats.count(),
                    format_duration(stats.total()),
                    format_duration(stats.average())
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn log_report(&self) {
        for (call, stats) in &self.calls {
            info!(
                call = %call,
                count = stats.count(),
                total = %format_duration(stats.total()),
                "Oracle calls"
            );
        }
    }
}
