use crate::diagnostics::CompileError;
use sqlparser::ast::Statement;
use sqlparser::dialect::MySqlDialect;
use sqlparser::parser::Parser;
use tracing::trace;

/// Parse the SQL string and return a list of SQL statements.
pub(crate) fn parse_sql(sql: &str) -> Result<Vec<Statement>, CompileError> {
    let dialect = MySqlDialect {};
    let statements = Parser::parse_sql(&dialect, sql).map_err(|e| CompileError::SyntaxError {
        sql: sql.to_string(),
        message: e.to_string(),
    })?;

    trace!(count = statements.len(), "Parsed SQL");
    Ok(statements)
}

/// Parse a SQL string that must hold exactly one statement.
pub(crate) fn parse_one(sql: &str) -> Result<Statement, CompileError> {
    let mut statements = parse_sql(sql)?;
    match statements.len() {
        0 => Err(CompileError::EmptyStatement),
        1 => Ok(statements.remove(0)),
        count => Err(CompileError::MultipleStatements {
            sql: sql.to_string(),
            count,
        }),
    }
}
