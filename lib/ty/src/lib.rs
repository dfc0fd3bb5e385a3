//! # Column Types
//!
//! Describes the declared type of a table column as far as index selection
//! cares: its family and its declared length.
//!
//! Types are classified from the text of a column definition (`INT(11)`,
//! `VARCHAR(255)`, `DECIMAL(10,2)`, `DATETIME(6)`, ...), so any SQL front end
//! that can print a type can feed this crate.
//!
//! ```
//! use ty::{ColumnType, DataTypeKind};
//!
//! let ty = ColumnType::parse("VARCHAR(64)");
//! assert_eq!(ty.kind(), &DataTypeKind::VarChar);
//! assert_eq!(ty.length(), &Some(64));
//! assert!(ty.is_indexable(512));
//!
//! assert!(!ColumnType::parse("TEXT").is_indexable(512));
//! ```
//!
//! ## Indexability
//!
//! Integer, floating-point, fixed-point and temporal types are always
//! indexable. Character types are indexable only up to a maximum declared
//! length. Everything else (text, blobs, JSON, enums, unknown types) is not.

use core::fmt;
use getset::Getters;
use serde::{Deserialize, Serialize};
use tracing::trace;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DataTypeKind {
    #[default]
    Unknown,
    Boolean,
    TinyInt,
    SmallInt,
    MediumInt,
    Integer,
    BigInt,
    Year,
    Float,
    Double,
    Decimal,
    Date,
    Time,
    DateTime,
    Timestamp,
    Char,
    VarChar,
    Text,
    Blob,
    Json,
    Enum,
    Set,
    Bit,
}

impl DataTypeKind {
    /// Classifies a type name such as `BIGINT` or `CHARACTER VARYING`.
    pub fn from_name(name: &str) -> Self {
        let name = name.trim().to_ascii_uppercase();
        match name.as_str() {
            "BOOL" | "BOOLEAN" => DataTypeKind::Boolean,
            "TINYINT" => DataTypeKind::TinyInt,
            "SMALLINT" | "INT2" => DataTypeKind::SmallInt,
            "MEDIUMINT" => DataTypeKind::MediumInt,
            "INT" | "INTEGER" | "INT4" => DataTypeKind::Integer,
            "BIGINT" | "INT8" => DataTypeKind::BigInt,
            "YEAR" => DataTypeKind::Year,
            "FLOAT" | "FLOAT4" | "REAL" => DataTypeKind::Float,
            "DOUBLE" | "DOUBLE PRECISION" | "FLOAT8" => DataTypeKind::Double,
            "DECIMAL" | "DEC" | "NUMERIC" => DataTypeKind::Decimal,
            "DATE" => DataTypeKind::Date,
            "DATETIME" => DataTypeKind::DateTime,
            "CHAR" | "CHARACTER" | "NCHAR" | "BINARY" => DataTypeKind::Char,
            "VARCHAR" | "CHARACTER VARYING" | "CHAR VARYING" | "NVARCHAR" | "VARBINARY" => {
                DataTypeKind::VarChar
            }
            "TEXT" | "TINYTEXT" | "MEDIUMTEXT" | "LONGTEXT" => DataTypeKind::Text,
            "BLOB" | "TINYBLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BYTEA" => DataTypeKind::Blob,
            "JSON" | "JSONB" => DataTypeKind::Json,
            "ENUM" => DataTypeKind::Enum,
            "SET" => DataTypeKind::Set,
            "BIT" => DataTypeKind::Bit,
            // `TIME WITH TIME ZONE`, `TIMESTAMP WITHOUT TIME ZONE`, ...
            other => match other.split_whitespace().next() {
                Some("TIME") => DataTypeKind::Time,
                Some("TIMESTAMP") => DataTypeKind::Timestamp,
                _ => DataTypeKind::Unknown,
            },
        }
    }

    /// Integer family, including booleans (stored as tiny integers).
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            DataTypeKind::Boolean
                | DataTypeKind::TinyInt
                | DataTypeKind::SmallInt
                | DataTypeKind::MediumInt
                | DataTypeKind::Integer
                | DataTypeKind::BigInt
        )
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integer()
            || matches!(
                self,
                DataTypeKind::Float | DataTypeKind::Double | DataTypeKind::Decimal
            )
    }

    pub fn is_temporal(&self) -> bool {
        matches!(
            self,
            DataTypeKind::Year
                | DataTypeKind::Date
                | DataTypeKind::Time
                | DataTypeKind::DateTime
                | DataTypeKind::Timestamp
        )
    }

    pub fn is_character(&self) -> bool {
        matches!(self, DataTypeKind::Char | DataTypeKind::VarChar)
    }
}

impl fmt::Display for DataTypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataTypeKind::Unknown => "unknown",
            DataTypeKind::Boolean => "boolean",
            DataTypeKind::TinyInt => "tinyint",
            DataTypeKind::SmallInt => "smallint",
            DataTypeKind::MediumInt => "mediumint",
            DataTypeKind::Integer => "int",
            DataTypeKind::BigInt => "bigint",
            DataTypeKind::Year => "year",
            DataTypeKind::Float => "float",
            DataTypeKind::Double => "double",
            DataTypeKind::Decimal => "decimal",
            DataTypeKind::Date => "date",
            DataTypeKind::Time => "time",
            DataTypeKind::DateTime => "datetime",
            DataTypeKind::Timestamp => "timestamp",
            DataTypeKind::Char => "char",
            DataTypeKind::VarChar => "varchar",
            DataTypeKind::Text => "text",
            DataTypeKind::Blob => "blob",
            DataTypeKind::Json => "json",
            DataTypeKind::Enum => "enum",
            DataTypeKind::Set => "set",
            DataTypeKind::Bit => "bit",
        };
        write!(f, "{}", name)
    }
}

/// The declared type of a column.
///
/// `length` is the first parenthesised argument of the declaration, when it
/// is a number: the maximum length of a character type, the display width of
/// an integer, the precision of a decimal.
#[derive(Debug, Default, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Getters)]
#[getset(get = "pub")]
pub struct ColumnType {
    kind: DataTypeKind,
    length: Option<u64>,
}

impl ColumnType {
    pub fn new(kind: DataTypeKind, length: Option<u64>) -> Self {
        Self { kind, length }
    }

    /// Parses a declared type such as `INT(11) UNSIGNED` or `VARCHAR(255)`.
    /// Unrecognised types parse as [`DataTypeKind::Unknown`].
    pub fn parse(declared: &str) -> Self {
        let declared = declared.trim();
        let (name, args) = match declared.find('(') {
            Some(open) => {
                let close = declared[open..]
                    .find(')')
                    .map(|close| open + close)
                    .unwrap_or(declared.len());
                (&declared[..open], &declared[open + 1..close])
            }
            None => (declared, ""),
        };

        let name = name
            .split_whitespace()
            .filter(|word| {
                !matches!(
                    word.to_ascii_uppercase().as_str(),
                    "UNSIGNED" | "SIGNED" | "ZEROFILL"
                )
            })
            .collect::<Vec<_>>()
            .join(" ");

        let length = args
            .split(',')
            .next()
            .and_then(|arg| arg.trim().parse::<u64>().ok());

        let ty = Self::new(DataTypeKind::from_name(&name), length);
        trace!(declared, ty = %ty, "Classified column type");
        ty
    }

    /// Whether a column of this type is eligible for a recommended index.
    /// Character types qualify only when their declared length does not
    /// exceed `max_char_length`; a character type without a declared length
    /// qualifies.
    pub fn is_indexable(&self, max_char_length: u64) -> bool {
        if self.kind.is_numeric() || self.kind.is_temporal() {
            return true;
        }

        if self.kind.is_character() {
            return self.length.map_or(true, |len| len <= max_char_length);
        }

        false
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.length {
            Some(len) => write!(f, "{}({})", self.kind, len),
            None => write!(f, "{}", self.kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions_sorted::assert_eq;

    #[test]
    fn test_parse_integer_family() {
        assert_eq!(
            ColumnType::parse("INT(11) UNSIGNED"),
            ColumnType::new(DataTypeKind::Integer, Some(11))
        );
        assert_eq!(
            ColumnType::parse("bigint"),
            ColumnType::new(DataTypeKind::BigInt, None)
        );
        assert_eq!(ColumnType::parse("TINYINT(1)").kind(), &DataTypeKind::TinyInt);
        assert_eq!(ColumnType::parse("BOOLEAN").kind(), &DataTypeKind::Boolean);
    }

    #[test]
    fn test_parse_decimal_and_temporal() {
        assert_eq!(
            ColumnType::parse("DECIMAL(10,2)"),
            ColumnType::new(DataTypeKind::Decimal, Some(10))
        );
        assert_eq!(ColumnType::parse("DATETIME(6)").kind(), &DataTypeKind::DateTime);
        assert_eq!(
            ColumnType::parse("TIMESTAMP(3) WITH TIME ZONE").kind(),
            &DataTypeKind::Timestamp
        );
        assert_eq!(
            ColumnType::parse("TIME WITH TIME ZONE").kind(),
            &DataTypeKind::Time
        );
    }

    #[test]
    fn test_parse_character_family() {
        assert_eq!(
            ColumnType::parse("CHARACTER VARYING(20)"),
            ColumnType::new(DataTypeKind::VarChar, Some(20))
        );
        assert_eq!(
            ColumnType::parse("CHAR(8)"),
            ColumnType::new(DataTypeKind::Char, Some(8))
        );
        assert_eq!(ColumnType::parse("VARCHAR(MAX)").length(), &None);
    }

    #[test]
    fn test_unknown_type() {
        assert_eq!(ColumnType::parse("GEOMETRY").kind(), &DataTypeKind::Unknown);
        assert!(!ColumnType::parse("GEOMETRY").is_indexable(512));
    }

    #[test]
    fn test_indexable_allow_list() {
        for declared in [
            "INT", "BIGINT", "SMALLINT", "FLOAT", "DOUBLE", "DECIMAL(8,2)", "DATE", "TIME",
            "DATETIME", "TIMESTAMP", "YEAR",
        ] {
            assert!(ColumnType::parse(declared).is_indexable(512), "{}", declared);
        }

        for declared in ["TEXT", "BLOB", "JSON", "ENUM('a', 'b')", "BIT(1)"] {
            assert!(!ColumnType::parse(declared).is_indexable(512), "{}", declared);
        }
    }

    #[test]
    fn test_char_length_threshold() {
        assert!(ColumnType::parse("VARCHAR(512)").is_indexable(512));
        assert!(!ColumnType::parse("VARCHAR(513)").is_indexable(512));
        assert!(ColumnType::parse("CHAR").is_indexable(512));
    }

    #[test]
    fn test_display() {
        assert_eq!(ColumnType::parse("VARCHAR(32)").to_string(), "varchar(32)");
        assert_eq!(ColumnType::parse("INT").to_string(), "int");
    }
}
