use getset::CopyGetters;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// The kinds of request a what-if optimizer answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OracleCall {
    Execute,
    CreateHypoIndex,
    DropHypoIndex,
    Explain,
    ExplainAnalyze,
}

impl OracleCall {
    pub const ALL: [OracleCall; 5] = [
        OracleCall::Execute,
        OracleCall::CreateHypoIndex,
        OracleCall::DropHypoIndex,
        OracleCall::Explain,
        OracleCall::ExplainAnalyze,
    ];
}

impl fmt::Display for OracleCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OracleCall::Execute => "execute",
            OracleCall::CreateHypoIndex => "create_hypo_index",
            OracleCall::DropHypoIndex => "drop_hypo_index",
            OracleCall::Explain => "explain",
            OracleCall::ExplainAnalyze => "explain_analyze",
        };
        write!(f, "{}", name)
    }
}

/// Number of calls of one kind and the time spent in them.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct CallStats {
    count: u64,
    total: Duration,
}

impl CallStats {
    pub fn record(&mut self, elapsed: Duration) {
        self.count += 1;
        self.total += elapsed;
    }

    pub fn average(&self) -> Duration {
        match u32::try_from(self.count) {
            Ok(0) => Duration::ZERO,
            Ok(count) => self.total / count,
            Err(_) => self.total.div_f64(self.count as f64),
        }
    }
}
