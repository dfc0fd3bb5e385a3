//! # Column Representation
//!
//! A [`Column`] identifies one column of one table: schema, table and column
//! name, all lower-cased, plus the declared type when it is known.
//!
//! ```
//! use catalog::Column;
//! use common::SetKey;
//! use ty::ColumnType;
//!
//! let column = Column::new("Shop", "Orders", "Price").with_type(ColumnType::parse("DECIMAL(8,2)"));
//! assert_eq!(column.key(), "shop.orders.price");
//! assert!(column.is_indexable(512));
//! ```

use common::SetKey;
use getset::Getters;
use serde::{Deserialize, Serialize};
use std::fmt;
use ty::ColumnType;
use typed_builder::TypedBuilder;

/// A column of a table.
///
/// Two columns with the same schema, table and name are the same element of a
/// [`common::Set`], whatever their declared type.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TypedBuilder, Getters,
)]
#[getset(get = "pub")]
pub struct Column {
    #[builder(setter(transform = |name: &str| name.to_ascii_lowercase()))]
    schema_name: String,
    #[builder(setter(transform = |name: &str| name.to_ascii_lowercase()))]
    table_name: String,
    #[builder(setter(transform = |name: &str| name.to_ascii_lowercase()))]
    column_name: String,
    #[builder(default, setter(strip_option))]
    column_type: Option<ColumnType>,
}

impl Column {
    pub fn new(schema_name: &str, table_name: &str, column_name: &str) -> Self {
        Column::builder()
            .schema_name(schema_name)
            .table_name(table_name)
            .column_name(column_name)
            .build()
    }

    pub fn with_type(mut self, column_type: ColumnType) -> Self {
        self.column_type = Some(column_type);
        self
    }

    /// `schema.table`, the key of the table this column belongs to.
    pub fn table_key(&self) -> String {
        format!("{}.{}", self.schema_name, self.table_name)
    }

    /// Whether the declared type allows indexing. Columns of unknown type never do.
    pub fn is_indexable(&self, max_char_length: u64) -> bool {
        self.column_type
            .as_ref()
            .map_or(false, |ty| ty.is_indexable(max_char_length))
    }
}

impl SetKey for Column {
    fn key(&self) -> String {
        format!(
            "{}.{}.{}",
            self.schema_name, self.table_name, self.column_name
        )
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}
