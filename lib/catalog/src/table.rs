use crate::{Column, Index};
use common::SetKey;
use compile::ddl::parse_create_table;
use compile::CompileError;
use getset::Getters;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};
use ty::ColumnType;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Invalid table definition: {0}")]
    InvalidDefinition(#[from] CompileError),
    #[error("Index {index} on {table} references unknown column {column}")]
    UnknownIndexColumn {
        table: String,
        index: String,
        column: String,
    },
}

/// The definition of a table: its columns in declaration order, the
/// indexes it already has, and the `CREATE TABLE` text it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
#[getset(get = "pub")]
pub struct TableSchema {
    schema_name: String,
    table_name: String,
    columns: Vec<Column>,
    indexes: Vec<Index>,
    create_statement: String,
}

impl TableSchema {
    pub fn new(
        schema_name: &str,
        table_name: &str,
        columns: Vec<Column>,
        indexes: Vec<Index>,
        create_statement: &str,
    ) -> Self {
        Self {
            schema_name: schema_name.to_ascii_lowercase(),
            table_name: table_name.to_ascii_lowercase(),
            columns,
            indexes,
            create_statement: create_statement.to_string(),
        }
    }

    /// Builds a schema from a `CREATE TABLE` statement. `default_schema` is
    /// used when the table name is not schema-qualified.
    ///
    /// Unnamed existing indexes are named after their columns, except the
    /// primary key which is named `primary`.
    pub fn from_create_statement(default_schema: &str, sql: &str) -> Result<Self, CatalogError> {
        let definition = parse_create_table(sql)?;
        let schema_name = definition
            .schema
            .unwrap_or_else(|| default_schema.to_ascii_lowercase());
        let table_name = definition.name;

        let columns: Vec<Column> = definition
            .columns
            .iter()
            .map(|column| {
                Column::new(&schema_name, &table_name, &column.name)
                    .with_type(ColumnType::parse(&column.data_type))
            })
            .collect();

        let mut indexes = Vec::with_capacity(definition.indexes.len());
        for existing in &definition.indexes {
            let mut index_columns = Vec::with_capacity(existing.columns.len());
            for name in &existing.columns {
                let Some(column) = columns.iter().find(|c| c.column_name() == name) else {
                    warn!(table = %table_name, column = %name, "Index references an unknown column");
                    return Err(CatalogError::UnknownIndexColumn {
                        table: format!("{}.{}", schema_name, table_name),
                        index: existing.name.clone().unwrap_or_default(),
                        column: name.clone(),
                    });
                };
                index_columns.push(column.clone());
            }

            let index = match (&existing.name, existing.primary) {
                (_, true) => Index::named(&schema_name, &table_name, "primary", index_columns),
                (Some(name), false) => Index::named(&schema_name, &table_name, name, index_columns),
                (None, false) => Index::new(&schema_name, &table_name, index_columns),
            };
            indexes.push(index);
        }

        debug!(
            schema = %schema_name,
            table = %table_name,
            columns = columns.len(),
            indexes = indexes.len(),
            "Loaded table schema"
        );

        Ok(Self::new(&schema_name, &table_name, columns, indexes, sql))
    }

    pub fn column(&self, column_name: &str) -> Option<&Column> {
        let column_name = column_name.to_ascii_lowercase();
        self.columns
            .iter()
            .find(|column| column.column_name() == &column_name)
    }

    /// Whether an index already on this table makes `index` redundant.
    pub fn has_covering_index(&self, index: &Index) -> bool {
        self.indexes
            .iter()
            .any(|existing| existing.prefix_contain(index))
    }
}

impl SetKey for TableSchema {
    fn key(&self) -> String {
        format!("{}.{}", self.schema_name, self.table_name)
    }
}

impl fmt::Display for TableSchema {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let columns = self
            .columns
            .iter()
            .map(|column| column.column_name().as_str())
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "{}({})", self.key(), columns)
    }
}
