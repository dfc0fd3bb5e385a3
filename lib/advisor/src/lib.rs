//! # Index Advisor
//!
//! Recommends secondary indexes for a SQL workload without building any.
//! Candidate configurations are priced by a what-if optimizer
//! ([`whatif::WhatIfOptimizer`]) through hypothetical indexes, and the
//! [`AutoAdmin`] search keeps the configuration that lowers the estimated
//! workload cost most within the bounds of a [`Parameter`].
//!
//! ```ignore
//! let config = AdvisorConfig::load_from_file_and_env("advisor.toml")?;
//! let advisor = Advisor::from_config(&config);
//! let recommendation = advisor.advise(&mut optimizer, &workload)?;
//! for statement in recommendation.ddl() {
//!     println!("{statement};");
//! }
//! ```

pub mod auto_admin;
pub mod error;
pub mod parameter;
pub mod pipeline;
pub mod selector;

pub use auto_admin::AutoAdmin;
pub use error::AdvisorError;
pub use parameter::Parameter;
pub use pipeline::{Advisor, Recommendation};
pub use selector::{selector_for, IndexSelector};
