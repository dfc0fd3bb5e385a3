//! Schema objects the advisor reasons about: columns, indexes (existing or
//! recommended), table definitions and table statistics.
//!
//! Every object is a plain value with a deterministic key (see
//! [`common::SetKey`]), so they can be collected into [`common::Set`]s.

pub mod column;
pub mod index;
pub mod stats;
pub mod table;

pub use column::*;
pub use index::*;
pub use stats::*;
pub use table::*;
