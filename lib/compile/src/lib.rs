//! SQL front end of the advisor.
//!
//! Everything that touches the parser lives here. The rest of the workspace
//! sees plain column/table references, predicate shapes, normalized query
//! signatures and table definitions, never parser node types.

pub mod ddl;
pub mod diagnostics;
pub mod lexer;
pub mod parser;
pub mod visit;

pub use diagnostics::CompileError;
pub use lexer::{signature, statement_kind, Signature, StatementKind};
