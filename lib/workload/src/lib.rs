//! The workload under study and the two passes that prepare it for index
//! selection: compression by query signature, and indexable-column extraction.

pub mod compress;
pub mod extract;
pub mod info;
pub mod query;

pub use compress::{compressor_for, Compressor, DigestCompressor, NoneCompressor};
pub use extract::{ExtractError, Extractor, SqlExtractor};
pub use info::WorkloadInfo;
pub use query::{Query, QueryKind};
