//! Classification of column type tags.
//!
//! Table metadata carries the raw database type of every column
//! (e.g. `"int"`, `"varchar(25)"`, `"int(11) unsigned"`). Value rendering only
//! needs to know which family the type belongs to, which `ColumnKind`
//! captures.

use once_cell::sync::Lazy;
use regex::Regex;

/// Leading word of a type tag: `varchar(25)` -> `varchar`
static BASE_TYPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*([A-Za-z_]+)").expect("base type pattern is valid"));

/// Value rendering family of a column type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    /// Rendered bare: `col = 11`
    Numeric,
    /// Rendered quoted: `col = "2016-08-29"`
    Date,
    /// Rendered quoted: `col = "text"`
    String,
}

impl ColumnKind {
    /// Classify a column type tag
    ///
    /// Type Mapping:
    /// - `int` / `integer` / `float` / `longint` / `smallint` / `tinyint`
    ///   / `mediumint` / `bigint` / `double` / `real` / `decimal` / `numeric` → `Numeric`
    /// - `date` / `datetime` / `timestamp` / `time` → `Date`
    /// - anything else (`varchar`, `text`, `char`, `enum`, ...) → `String`
    pub fn classify(type_tag: &str) -> Self {
        let base = base_type(type_tag);
        match base.as_str() {
            "int" | "integer" | "float" | "longint" | "smallint" | "tinyint" | "mediumint"
            | "bigint" | "double" | "real" | "decimal" | "numeric" => ColumnKind::Numeric,
            "date" | "datetime" | "timestamp" | "time" => ColumnKind::Date,
            _ => ColumnKind::String,
        }
    }

    pub fn is_numeric(self) -> bool {
        self == ColumnKind::Numeric
    }
}

/// Lower-cased leading type name of a type tag
pub(crate) fn base_type(type_tag: &str) -> String {
    BASE_TYPE
        .captures(type_tag)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_lowercase())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_types() {
        for tag in ["int", "float", "longint", "smallint", "tinyint", "INT(11) unsigned"] {
            assert_eq!(ColumnKind::classify(tag), ColumnKind::Numeric, "{tag}");
        }
    }

    #[test]
    fn test_date_types() {
        for tag in ["date", "datetime", "timestamp", "DATETIME(6)"] {
            assert_eq!(ColumnKind::classify(tag), ColumnKind::Date, "{tag}");
        }
    }

    #[test]
    fn test_everything_else_is_string() {
        for tag in ["varchar(25)", "text", "char(2)", "enum('a','b')", ""] {
            assert_eq!(ColumnKind::classify(tag), ColumnKind::String, "{tag}");
        }
    }

    #[test]
    fn test_base_type() {
        assert_eq!(base_type("varchar(25)"), "varchar");
        assert_eq!(base_type("  BigInt unsigned"), "bigint");
        assert_eq!(base_type("(none)"), "");
    }
}
