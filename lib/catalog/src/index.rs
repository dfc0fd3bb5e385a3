//! # Index Representation
//!
//! An [`Index`] is an ordered list of columns of one table. Column order
//! matters: an index can only be entered through its leading columns, so
//! `t(a,b)` serves every lookup `t(a)` serves, but not the other way round.

use crate::Column;
use common::SetKey;
use getset::Getters;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Getters)]
#[getset(get = "pub")]
pub struct Index {
    schema_name: String,
    table_name: String,
    index_name: String,
    columns: Vec<Column>,
}

impl Index {
    /// A new index on `columns`, named `idx_<col1>_<col2>...`.
    pub fn new(schema_name: &str, table_name: &str, columns: Vec<Column>) -> Self {
        let index_name = Self::name_for(&columns);
        Self::named(schema_name, table_name, &index_name, columns)
    }

    pub fn named(schema_name: &str, table_name: &str, index_name: &str, columns: Vec<Column>) -> Self {
        Self {
            schema_name: schema_name.to_ascii_lowercase(),
            table_name: table_name.to_ascii_lowercase(),
            index_name: index_name.to_ascii_lowercase(),
            columns,
        }
    }

    /// A one-column index on `column`'s table.
    pub fn on_column(column: &Column) -> Self {
        Self::new(
            column.schema_name(),
            column.table_name(),
            vec![column.clone()],
        )
    }

    fn name_for(columns: &[Column]) -> String {
        let mut name = String::from("idx");
        for column in columns {
            name.push('_');
            name.push_str(column.column_name());
        }
        name
    }

    /// `schema.table`, the key of the indexed table.
    pub fn table_key(&self) -> String {
        format!("{}.{}", self.schema_name, self.table_name)
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn leading_column(&self) -> Option<&Column> {
        self.columns.first()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.column_name().as_str()).collect()
    }

    pub fn contains_column(&self, column: &Column) -> bool {
        let key = column.key();
        self.columns.iter().any(|c| c.key() == key)
    }

    /// Whether `other`'s columns are, in order, a prefix of this index's
    /// columns on the same table. An index contains itself.
    pub fn prefix_contain(&self, other: &Index) -> bool {
        self.schema_name == other.schema_name
            && self.table_name == other.table_name
            && other.columns.len() <= self.columns.len()
            && self
                .columns
                .iter()
                .zip(&other.columns)
                .all(|(mine, theirs)| mine.column_name() == theirs.column_name())
    }

    /// This index with `column` appended as its new last column.
    pub fn widen(&self, column: &Column) -> Self {
        let mut columns = self.columns.clone();
        columns.push(column.clone());
        Self::new(&self.schema_name, &self.table_name, columns)
    }

    /// `CREATE INDEX idx_a_b ON schema.table (a, b)`
    pub fn ddl(&self) -> String {
        format!(
            "CREATE INDEX {} ON {}.{} ({})",
            self.index_name,
            self.schema_name,
            self.table_name,
            self.column_names().join(", ")
        )
    }
}

impl SetKey for Index {
    fn key(&self) -> String {
        format!(
            "{}.{}({})",
            self.schema_name,
            self.table_name,
            self.column_names().join(",")
        )
    }
}

impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions_sorted::assert_eq;

    fn index(table: &str, columns: &[&str]) -> Index {
        Index::new(
            "test",
            table,
            columns
                .iter()
                .map(|name| Column::new("test", table, name))
                .collect(),
        )
    }

    #[test]
    fn test_key_and_name() {
        let index = index("t2", &["b", "a"]);
        assert_eq!(index.key(), "test.t2(b,a)");
        assert_eq!(index.index_name(), "idx_b_a");
        assert_eq!(index.width(), 2);
        assert_eq!(index.leading_column().map(|c| c.key()), Some("test.t2.b".to_string()));
    }

    #[test]
    fn test_prefix_contain() {
        let ab = index("t", &["a", "b"]);
        let a = index("t", &["a"]);
        let b = index("t", &["b"]);
        let ba = index("t", &["b", "a"]);
        let other_table = index("s", &["a"]);

        assert!(ab.prefix_contain(&a));
        assert!(ab.prefix_contain(&ab));
        assert!(!ab.prefix_contain(&b));
        assert!(!ab.prefix_contain(&ba));
        assert!(!a.prefix_contain(&ab));
        assert!(!ab.prefix_contain(&other_table));
    }

    #[test]
    fn test_widen_and_contains() {
        let a = index("t", &["a"]);
        let ab = a.widen(&Column::new("test", "t", "b"));

        assert_eq!(ab.key(), "test.t(a,b)");
        assert_eq!(ab.index_name(), "idx_a_b");
        assert!(ab.contains_column(&Column::new("test", "t", "b")));
        assert!(!a.contains_column(&Column::new("test", "t", "b")));
        // The source index is untouched.
        assert_eq!(a.width(), 1);
    }

    #[test]
    fn test_ddl() {
        assert_eq!(
            index("t2", &["a", "b"]).ddl(),
            "CREATE INDEX idx_a_b ON test.t2 (a, b)"
        );
    }
}
