use thiserror::Error;

/// Failure to turn SQL text into something the advisor can reason about.
#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum CompileError {
    #[error("SyntaxError: {message} (in {sql:?})")]
    SyntaxError { sql: String, message: String },
    #[error("empty statement")]
    EmptyStatement,
    #[error("expected a single statement, found {count} in {sql:?}")]
    MultipleStatements { sql: String, count: usize },
    #[error("expected {expected} statement, found {sql:?}")]
    UnexpectedStatement { expected: &'static str, sql: String },
}
