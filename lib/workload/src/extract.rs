//! # Indexable-Column Extraction
//!
//! For every query, collects the columns that appear where an index could
//! help: comparisons, `BETWEEN`, `IN`, `ORDER BY` and `GROUP BY`. A column is
//! kept only if it resolves to a known table and its declared type is
//! indexable.
//!
//! Resolution is deliberately naive. A qualified column (`t.a`) resolves
//! through the table or alias it names. An unqualified one resolves to every
//! candidate table that has a column of that name, where the candidates are
//! the tables the statement references plus the tables of the query's schema
//! whose name appears as a word in the query text. Columns that resolve
//! nowhere are dropped.
//!
//! Separately, the columns compared for equality against a constant directly
//! under a top-level `OR` are recorded as DNF columns. They resolve the same
//! way, so joins contribute too. Equalities nested in a conjunction inside
//! the `OR` do not count.

use crate::{Query, WorkloadInfo};
use catalog::{Column, TableSchema};
use common::{AdvisorConfig, Set, SetKey};
use compile::visit::{
    select_shape, walk_sql, ColumnPosition, ColumnRef, Predicate, SqlVisitor, TableRef,
};
use compile::CompileError;
use thiserror::Error;
use tracing::{debug, instrument, trace};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("Failed to parse query `{query}`: {source}")]
    Parse {
        query: String,
        #[source]
        source: CompileError,
    },
}

/// Annotates a workload with indexable columns. Fails as a whole if any query fails.
pub trait Extractor {
    fn extract(&self, workload: &WorkloadInfo) -> Result<WorkloadInfo, ExtractError>;
}

/// Extracts indexable columns by walking each query's parse tree.
#[derive(Debug, Clone, Copy)]
pub struct SqlExtractor {
    max_varchar_length: u64,
}

impl SqlExtractor {
    pub fn new(max_varchar_length: u64) -> Self {
        Self { max_varchar_length }
    }

    pub fn from_config(config: &AdvisorConfig) -> Self {
        Self::new(config.max_varchar_length())
    }

    /// Indexable and DNF columns of one query.
    pub fn columns_of(
        &self,
        query: &Query,
        workload: &WorkloadInfo,
    ) -> Result<(Set<Column>, Set<Column>), CompileError> {
        let mut collector = Collector::default();
        walk_sql(query.text(), &mut collector)?;

        let candidates = candidate_tables(query, &collector.tables, workload);
        let mut indexable = Set::new();
        for column in &collector.columns {
            for table in resolve(column, &collector.tables, &candidates, query, workload) {
                if let Some(resolved) = self.indexable(table, &column.name) {
                    indexable.add(resolved);
                }
            }
        }

        let dnf = self.dnf_columns(query, workload, &collector.tables, &candidates)?;
        Ok((indexable, dnf))
    }

    fn indexable(&self, table: &TableSchema, column_name: &str) -> Option<Column> {
        let column = table.column(column_name)?;
        if column.is_indexable(self.max_varchar_length) {
            Some(column.clone())
        } else {
            trace!(column = %column, "Column type is not indexable");
            None
        }
    }

    /// Columns compared for equality directly under a top-level `OR` chain.
    /// Branches that are conjunctions, or any other kind of test, contribute nothing.
    fn dnf_columns(
        &self,
        query: &Query,
        workload: &WorkloadInfo,
        referenced: &[TableRef],
        candidates: &[&TableSchema],
    ) -> Result<Set<Column>, CompileError> {
        let mut columns = Set::new();
        let Some(shape) = select_shape(query.text())? else {
            return Ok(columns);
        };

        let operands = shape
            .conjuncts
            .iter()
            .filter_map(|conjunct| match conjunct {
                Predicate::Or(branches) => Some(branches),
                _ => None,
            })
            .flatten()
            .filter(|branch| branch.is_equality())
            .filter_map(Predicate::column);

        for column in operands {
            for table in resolve(column, referenced, candidates, query, workload) {
                if let Some(resolved) = self.indexable(table, &column.name) {
                    columns.add(resolved);
                }
            }
        }

        Ok(columns)
    }
}

impl Default for SqlExtractor {
    fn default() -> Self {
        Self::new(common::DEFAULT_MAX_VARCHAR_LENGTH)
    }
}

impl Extractor for SqlExtractor {
    #[instrument(skip_all, fields(queries = workload.queries().len()))]
    fn extract(&self, workload: &WorkloadInfo) -> Result<WorkloadInfo, ExtractError> {
        let mut queries = Set::new();
        let mut union = Set::new();

        for query in workload.queries() {
            let (indexable, dnf) = self.columns_of(query, workload).map_err(|source| {
                ExtractError::Parse {
                    query: query.text().clone(),
                    source,
                }
            })?;

            debug!(
                query = %query.text(),
                indexable = %indexable,
                dnf = %dnf,
                "Extracted indexable columns"
            );
            union.add_all(&indexable);
            union.add_all(&dnf);
            queries.add(query.with_columns(indexable, dnf));
        }

        Ok(workload.with_indexable_columns(queries, union))
    }
}

#[derive(Default)]
struct Collector {
    columns: Vec<ColumnRef>,
    tables: Vec<TableRef>,
}

impl SqlVisitor for Collector {
    fn visit_column(&mut self, column: &ColumnRef, _position: ColumnPosition) {
        self.columns.push(column.clone());
    }

    fn visit_table(&mut self, table: &TableRef) {
        self.tables.push(table.clone());
    }
}

/// Tables an unqualified column may belong to, in key order.
fn candidate_tables<'w>(
    query: &Query,
    referenced: &[TableRef],
    workload: &'w WorkloadInfo,
) -> Vec<&'w TableSchema> {
    let text = query.text().to_ascii_lowercase();
    let words: Vec<&str> = text
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '$'))
        .filter(|word| !word.is_empty())
        .collect();

    let mut candidates: Vec<&'w TableSchema> = workload
        .table_schemas()
        .iter()
        .filter(|table| table.schema_name() == query.schema_name())
        .filter(|table| words.contains(&table.table_name().as_str()))
        .collect();

    for table_ref in referenced {
        let schema = table_ref.schema.as_deref().unwrap_or(query.schema_name().as_str());
        if let Some(table) = workload.table(schema, &table_ref.name) {
            candidates.push(table);
        }
    }

    candidates.sort_by_key(|table| table.key());
    candidates.dedup_by_key(|table| table.key());
    candidates
}

fn resolve<'w>(
    column: &ColumnRef,
    referenced: &[TableRef],
    candidates: &[&'w TableSchema],
    query: &Query,
    workload: &'w WorkloadInfo,
) -> Vec<&'w TableSchema> {
    let Some(qualifier) = &column.qualifier else {
        return candidates
            .iter()
            .copied()
            .filter(|table| table.column(&column.name).is_some())
            .collect();
    };

    let by_alias = referenced
        .iter()
        .find(|table_ref| table_ref.answers_to(qualifier))
        .and_then(|table_ref| {
            let schema = table_ref.schema.as_deref().unwrap_or(query.schema_name().as_str());
            workload.table(schema, &table_ref.name)
        });

    by_alias
        .or_else(|| workload.table(query.schema_name(), qualifier))
        .into_iter()
        .collect()
}
