use thiserror::Error;
use whatif::OracleError;
use workload::ExtractError;

/// Why no recommendation could be produced. There is no partial result.
#[derive(Error, Debug)]
pub enum AdvisorError {
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error(transparent)]
    Oracle(#[from] OracleError),
}
