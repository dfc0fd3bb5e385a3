use crate::diagnostics::CompileError;
use crate::parser::parse_one;
use serde::{Deserialize, Serialize};
use sqlparser::ast::{ColumnOption, Ident, Statement, TableConstraint};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    pub name: String,
    /// The declared type as the parser prints it, e.g. `VARCHAR(64)`.
    pub data_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDefinition {
    pub name: Option<String>,
    pub columns: Vec<String>,
    pub primary: bool,
    pub unique: bool,
}

/// The parts of a `CREATE TABLE` statement index selection needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDefinition {
    pub schema: Option<String>,
    pub name: String,
    pub columns: Vec<ColumnDefinition>,
    pub indexes: Vec<IndexDefinition>,
}

fn lower(ident: &Ident) -> String {
    ident.value.to_ascii_lowercase()
}

/// Parses a single `CREATE TABLE` statement.
///
/// Existing indexes are collected from `PRIMARY KEY`, `UNIQUE` and
/// `KEY`/`INDEX` table constraints, and from inline `PRIMARY KEY`/`UNIQUE`
/// column options. Names are lower-cased.
pub fn parse_create_table(sql: &str) -> Result<TableDefinition, CompileError> {
    let Statement::CreateTable {
        name,
        columns,
        constraints,
        ..
    } = parse_one(sql)?
    else {
        return Err(CompileError::UnexpectedStatement {
            expected: "CREATE TABLE",
            sql: sql.to_string(),
        });
    };

    let idents = &name.0;
    let table = idents.last().map(lower).unwrap_or_default();
    let schema = idents
        .len()
        .checked_sub(2)
        .and_then(|i| idents.get(i))
        .map(lower);

    let mut indexes = Vec::new();
    let columns = columns
        .iter()
        .map(|column| {
            for option in &column.options {
                if let ColumnOption::Unique { is_primary, .. } = &option.option {
                    indexes.push(IndexDefinition {
                        name: None,
                        columns: vec![lower(&column.name)],
                        primary: *is_primary,
                        unique: true,
                    });
                }
            }
            ColumnDefinition {
                name: lower(&column.name),
                data_type: column.data_type.to_string(),
            }
        })
        .collect::<Vec<_>>();

    for constraint in &constraints {
        match constraint {
            TableConstraint::Unique {
                name,
                columns,
                is_primary,
                ..
            } => indexes.push(IndexDefinition {
                name: name.as_ref().map(lower),
                columns: columns.iter().map(lower).collect(),
                primary: *is_primary,
                unique: true,
            }),
            TableConstraint::Index { name, columns, .. } => indexes.push(IndexDefinition {
                name: name.as_ref().map(lower),
                columns: columns.iter().map(lower).collect(),
                primary: false,
                unique: false,
            }),
            _ => {}
        }
    }

    debug!(
        table,
        columns = columns.len(),
        indexes = indexes.len(),
        "Parsed table definition"
    );

    Ok(TableDefinition {
        schema,
        name: table,
        columns,
        indexes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions_sorted::assert_eq;

    #[test]
    fn test_columns_and_types() {
        let table =
            parse_create_table("CREATE TABLE T1 (A INT(11), B VARCHAR(64), C TEXT)").unwrap();

        assert_eq!(table.schema, None);
        assert_eq!(table.name, "t1");
        assert_eq!(
            table.columns,
            vec![
                ColumnDefinition {
                    name: "a".to_string(),
                    data_type: "INT(11)".to_string()
                },
                ColumnDefinition {
                    name: "b".to_string(),
                    data_type: "VARCHAR(64)".to_string()
                },
                ColumnDefinition {
                    name: "c".to_string(),
                    data_type: "TEXT".to_string()
                },
            ]
        );
        assert!(table.indexes.is_empty());
    }

    #[test]
    fn test_existing_indexes() {
        let table = parse_create_table(
            "create table shop.orders (id int primary key, a int, b int, primary key (a), key idx_b_a (b, a))",
        )
        .unwrap();

        assert_eq!(table.schema.as_deref(), Some("shop"));
        assert_eq!(
            table.indexes,
            vec![
                IndexDefinition {
                    name: None,
                    columns: vec!["id".to_string()],
                    primary: true,
                    unique: true,
                },
                IndexDefinition {
                    name: None,
                    columns: vec!["a".to_string()],
                    primary: true,
                    unique: true,
                },
                IndexDefinition {
                    name: Some("idx_b_a".to_string()),
                    columns: vec!["b".to_string(), "a".to_string()],
                    primary: false,
                    unique: false,
                },
            ]
        );
    }

    #[test]
    fn test_not_a_create_table() {
        assert!(matches!(
            parse_create_table("select 1"),
            Err(CompileError::UnexpectedStatement { .. })
        ));
        assert!(matches!(
            parse_create_table("create tabel t (a int)"),
            Err(CompileError::SyntaxError { .. })
        ));
    }
}
