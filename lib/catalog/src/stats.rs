use common::SetKey;
use getset::{CopyGetters, Getters};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Row count and per-column distinct-value counts of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, CopyGetters)]
pub struct TableStats {
    #[getset(get = "pub")]
    schema_name: String,
    #[getset(get = "pub")]
    table_name: String,
    #[getset(get_copy = "pub")]
    row_count: u64,
    #[getset(get = "pub")]
    distinct_values: BTreeMap<String, u64>,
}

impl TableStats {
    pub fn new(schema_name: &str, table_name: &str, row_count: u64) -> Self {
        Self {
            schema_name: schema_name.to_ascii_lowercase(),
            table_name: table_name.to_ascii_lowercase(),
            row_count,
            distinct_values: BTreeMap::new(),
        }
    }

    pub fn with_distinct(mut self, column_name: &str, distinct: u64) -> Self {
        self.distinct_values
            .insert(column_name.to_ascii_lowercase(), distinct);
        self
    }

    /// Number of distinct values of `column_name`, if known. Never exceeds the row count.
    pub fn distinct(&self, column_name: &str) -> Option<u64> {
        self.distinct_values
            .get(&column_name.to_ascii_lowercase())
            .map(|&ndv| ndv.min(self.row_count).max(1))
    }
}

impl SetKey for TableStats {
    fn key(&self) -> String {
        format!("{}.{}", self.schema_name, self.table_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions_sorted::assert_eq;

    #[test]
    fn test_distinct_values() {
        let stats = TableStats::new("test", "T1", 1000)
            .with_distinct("A", 10)
            .with_distinct("b", 5000);

        assert_eq!(stats.key(), "test.t1");
        assert_eq!(stats.row_count(), 1000);
        assert_eq!(stats.distinct("a"), Some(10));
        assert_eq!(stats.distinct("b"), Some(1000));
        assert_eq!(stats.distinct("c"), None);
    }
}
