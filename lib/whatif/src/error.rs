use thiserror::Error;

/// A failed oracle request. Any of these invalidates the evaluation in progress.
#[derive(Error, Debug)]
pub enum OracleError {
    #[error("Failed to execute `{statement}`: {reason}")]
    Execute { statement: String, reason: String },
    #[error("Failed to create hypothetical index {index}: {reason}")]
    CreateHypoIndex { index: String, reason: String },
    #[error("Failed to drop hypothetical index {index}: {reason}")]
    DropHypoIndex { index: String, reason: String },
    #[error("Failed to explain `{query}`: {reason}")]
    Explain { query: String, reason: String },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
