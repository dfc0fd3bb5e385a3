use catalog::Column;
use common::{Set, SetKey};
use getset::{CopyGetters, Getters};
use serde::{Deserialize, Serialize};

pub use compile::StatementKind as QueryKind;

/// One statement of the workload with its execution count.
///
/// `indexable_columns` and `dnf_columns` are empty until the workload has
/// been through an [`crate::Extractor`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, CopyGetters)]
pub struct Query {
    #[getset(get = "pub")]
    schema_name: String,
    #[getset(get = "pub")]
    text: String,
    #[getset(get_copy = "pub")]
    frequency: u64,
    #[getset(get = "pub")]
    indexable_columns: Set<Column>,
    /// Columns tested by the branches of a top-level `OR`.
    #[getset(get = "pub")]
    dnf_columns: Set<Column>,
}

impl Query {
    pub fn new(schema_name: &str, text: &str, frequency: u64) -> Self {
        Self {
            schema_name: schema_name.to_ascii_lowercase(),
            text: text.trim().to_string(),
            frequency,
            indexable_columns: Set::new(),
            dnf_columns: Set::new(),
        }
    }

    pub fn kind(&self) -> QueryKind {
        compile::statement_kind(&self.text)
    }

    pub fn is_select(&self) -> bool {
        self.kind() == QueryKind::Select
    }

    pub fn with_frequency(&self, frequency: u64) -> Self {
        Self {
            frequency,
            ..self.clone()
        }
    }

    pub fn with_columns(&self, indexable_columns: Set<Column>, dnf_columns: Set<Column>) -> Self {
        Self {
            indexable_columns,
            dnf_columns,
            ..self.clone()
        }
    }
}

impl SetKey for Query {
    fn key(&self) -> String {
        self.text.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions_sorted::assert_eq;

    #[test]
    fn test_query_kind() {
        assert_eq!(Query::new("test", "select * from t1", 1).kind(), QueryKind::Select);
        assert_eq!(
            Query::new("test", "UPDATE t1 SET a = 1", 1).kind(),
            QueryKind::Update
        );
        assert!(!Query::new("test", "insert into t1 values (1)", 1).is_select());
    }

    #[test]
    fn test_copies_keep_key() {
        let query = Query::new("TEST", "  select * from t1 where a = 1 ", 1);
        let heavier = query.with_frequency(5);

        assert_eq!(query.schema_name(), "test");
        assert_eq!(query.key(), "select * from t1 where a = 1");
        assert_eq!(heavier.key(), query.key());
        assert_eq!(heavier.frequency(), 5);
        assert_eq!(query.frequency(), 1);
    }
}
