use crate::Query;
use catalog::{Column, TableSchema, TableStats};
use common::{Set, SetKey};
use getset::Getters;
use serde::{Deserialize, Serialize};

/// Everything the advisor knows about a workload. Each pipeline stage reads
/// one of these and returns a new one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Getters)]
#[getset(get = "pub")]
pub struct WorkloadInfo {
    queries: Set<Query>,
    table_schemas: Set<TableSchema>,
    table_stats: Set<TableStats>,
    /// Union of the indexable columns of every query.
    indexable_columns: Set<Column>,
}

impl WorkloadInfo {
    /// Builds a workload from `queries`. Queries with identical text are one
    /// query whose frequency is the sum of theirs.
    pub fn new(queries: Vec<Query>, table_schemas: Vec<TableSchema>) -> Self {
        let mut merged: Set<Query> = Set::new();
        for query in queries {
            let query = match merged.get(&query.key()) {
                Some(existing) => existing.with_frequency(existing.frequency() + query.frequency()),
                None => query,
            };
            merged.add(query);
        }

        Self {
            queries: merged,
            table_schemas: table_schemas.into(),
            table_stats: Set::new(),
            indexable_columns: Set::new(),
        }
    }

    pub fn with_stats(mut self, table_stats: Vec<TableStats>) -> Self {
        self.table_stats = table_stats.into();
        self
    }

    pub fn with_queries(&self, queries: Set<Query>) -> Self {
        Self {
            queries,
            ..self.clone()
        }
    }

    pub fn with_indexable_columns(&self, queries: Set<Query>, indexable_columns: Set<Column>) -> Self {
        Self {
            queries,
            indexable_columns,
            ..self.clone()
        }
    }

    /// Queries that contribute to workload cost.
    pub fn select_queries(&self) -> impl Iterator<Item = &Query> {
        self.queries.iter().filter(|query| query.is_select())
    }

    /// Looks up a table by `schema.table` key.
    pub fn table(&self, schema_name: &str, table_name: &str) -> Option<&TableSchema> {
        self.table_schemas.get(&format!(
            "{}.{}",
            schema_name.to_ascii_lowercase(),
            table_name.to_ascii_lowercase()
        ))
    }

    pub fn stats(&self, table_key: &str) -> Option<&TableStats> {
        self.table_stats.get(table_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions_sorted::assert_eq;

    #[test]
    fn test_identical_texts_merge() {
        let workload = WorkloadInfo::new(
            vec![
                Query::new("test", "select * from t1 where a = 1", 2),
                Query::new("test", "select * from t1 where a = 1", 3),
                Query::new("test", "update t1 set a = 2", 1),
            ],
            vec![],
        );

        assert_eq!(workload.queries().len(), 2);
        assert_eq!(
            workload
                .queries()
                .get("select * from t1 where a = 1")
                .map(Query::frequency),
            Some(5)
        );
        assert_eq!(workload.select_queries().count(), 1);
    }

    #[test]
    fn test_table_lookup() {
        let table = TableSchema::from_create_statement("test", "create table t1 (a int)").unwrap();
        let workload = WorkloadInfo::new(vec![], vec![table])
            .with_stats(vec![TableStats::new("test", "t1", 100)]);

        assert!(workload.table("TEST", "T1").is_some());
        assert!(workload.table("test", "t2").is_none());
        assert_eq!(workload.stats("test.t1").map(|s| s.row_count()), Some(100));
    }
}
