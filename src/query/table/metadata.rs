//! Table metadata: the schema snapshot of one entity.
//!
//! `TableMetadata` is the authority for column name, alias and type
//! resolution. It is built once per entity through [`TableMetadataBuilder`],
//! validated, and then shared read-only (usually as `Arc<TableMetadata>`)
//! by every query, builder and hydration call.
//!
//! # Example
//!
//! ```rust
//! use rowfold::TableMetadata;
//!
//! let metadata = TableMetadata::builder("users")
//!     .class_name("User")
//!     .primary_field("id")
//!     .column("id", "int")
//!     .column("user_name", "varchar(64)")
//!     .alias("Name", "user_name")
//!     .build()?;
//!
//! assert_eq!(metadata.get_table_column_name("name")?, "user_name");
//! assert_eq!(metadata.get_table_column_type("Name")?, "varchar(64)");
//! # Ok::<(), rowfold::OrmError>(())
//! ```

use crate::error::{OrmError, Result};
use crate::query::column::ColumnKind;
use crate::value::Value;
use std::collections::HashMap;

/// Resolved facts about one column, bundled for value rendering
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnSpec<'a> {
    /// Owning table name
    pub table: &'a str,
    /// Canonical column name
    pub name: &'a str,
    /// Raw database type tag
    pub type_tag: &'a str,
    pub kind: ColumnKind,
    pub nullable: bool,
    /// Registered default value, if any
    pub default: Option<&'a Value>,
}

/// Immutable schema description of one table
#[derive(Debug, Clone, PartialEq)]
pub struct TableMetadata {
    table_name: String,
    class_name: String,
    primary_field: String,
    columns: Vec<String>,
    column_types: HashMap<String, String>,
    column_aliases: HashMap<String, String>,
    lower_column_aliases: HashMap<String, String>,
    column_defaults: HashMap<String, Value>,
    column_nullable: HashMap<String, bool>,
    unique_columns: Vec<String>,
    index_columns: Vec<String>,
}

impl TableMetadata {
    /// Start building metadata for `table_name`
    pub fn builder(table_name: impl Into<String>) -> TableMetadataBuilder {
        TableMetadataBuilder::new(table_name)
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Entity type tag, used as the key of joined collections
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Canonical column names in schema order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_aliases(&self) -> &HashMap<String, String> {
        &self.column_aliases
    }

    pub fn unique_columns(&self) -> &[String] {
        &self.unique_columns
    }

    pub fn index_columns(&self) -> &[String] {
        &self.index_columns
    }

    pub fn get_table_primary_field(&self) -> &str {
        &self.primary_field
    }

    /// True if `name_or_alias` resolves to a column of this table
    pub fn has_column(&self, name_or_alias: &str) -> bool {
        self.get_table_column_name(name_or_alias).is_ok()
    }

    /// Get table column name by column name or alias.
    ///
    /// Aliases are matched case-insensitively first, then real column names
    /// case-sensitively, then aliases exactly.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::ColumnNotFound`] if nothing matches.
    pub fn get_table_column_name(&self, name_or_alias: &str) -> Result<&str> {
        if let Some(column) = self.lower_column_aliases.get(&name_or_alias.to_lowercase()) {
            return Ok(column);
        }

        if let Some(column) = self.columns.iter().find(|c| c.as_str() == name_or_alias) {
            return Ok(column);
        }

        self.column_aliases
            .get(name_or_alias)
            .map(String::as_str)
            .ok_or_else(|| OrmError::column_not_found(name_or_alias, &self.table_name))
    }

    /// Get table column type tag by column name or alias.
    ///
    /// # Errors
    ///
    /// Fails if the column is unknown or has no registered type.
    pub fn get_table_column_type(&self, name_or_alias: &str) -> Result<&str> {
        let column = self.get_table_column_name(name_or_alias)?;
        self.column_types
            .get(column)
            .map(String::as_str)
            .ok_or_else(|| OrmError::ColumnTypeUndefined {
                column: name_or_alias.to_string(),
                table: self.table_name.clone(),
            })
    }

    /// Rendering family of a column
    pub fn column_kind(&self, name_or_alias: &str) -> Result<ColumnKind> {
        self.get_table_column_type(name_or_alias)
            .map(ColumnKind::classify)
    }

    /// Position of a column within [`columns`](Self::columns)
    pub fn get_table_column_index(&self, name_or_alias: &str) -> Result<usize> {
        let column = self.get_table_column_name(name_or_alias)?;
        self.columns
            .iter()
            .position(|c| c == column)
            .ok_or_else(|| OrmError::column_not_found(name_or_alias, &self.table_name))
    }

    /// Whether the column accepts `NULL`. Columns without an entry are not nullable.
    pub fn is_column_nullable(&self, name_or_alias: &str) -> Result<bool> {
        let column = self.get_table_column_name(name_or_alias)?;
        Ok(self.column_nullable.get(column).copied().unwrap_or(false))
    }

    pub fn get_column_default_value(&self, name_or_alias: &str) -> Result<Option<&Value>> {
        let column = self.get_table_column_name(name_or_alias)?;
        Ok(self.column_defaults.get(column))
    }

    /// Everything value rendering needs to know about a column
    pub fn column_spec(&self, name_or_alias: &str) -> Result<ColumnSpec<'_>> {
        let name = self.get_table_column_name(name_or_alias)?;
        let type_tag = self.get_table_column_type(name)?;
        Ok(ColumnSpec {
            table: &self.table_name,
            name,
            type_tag,
            kind: ColumnKind::classify(type_tag),
            nullable: self.column_nullable.get(name).copied().unwrap_or(false),
            default: self.column_defaults.get(name),
        })
    }
}

/// Builder for [`TableMetadata`]
#[derive(Debug, Clone, Default)]
pub struct TableMetadataBuilder {
    table_name: String,
    class_name: Option<String>,
    primary_field: Option<String>,
    columns: Vec<String>,
    column_types: HashMap<String, String>,
    column_aliases: HashMap<String, String>,
    column_defaults: HashMap<String, Value>,
    column_nullable: HashMap<String, bool>,
    unique_columns: Vec<String>,
    index_columns: Vec<String>,
}

impl TableMetadataBuilder {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            ..Default::default()
        }
    }

    /// Entity type tag; defaults to the table name
    pub fn class_name(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    pub fn primary_field(mut self, column: impl Into<String>) -> Self {
        self.primary_field = Some(column.into());
        self
    }

    /// Append a column with its database type tag
    pub fn column(mut self, name: impl Into<String>, type_tag: impl Into<String>) -> Self {
        let name = name.into();
        self.column_types.insert(name.clone(), type_tag.into());
        self.columns.push(name);
        self
    }

    /// Append a column without a registered type
    ///
    /// Such a column can be selected and hydrated but not used in conditions
    /// or writes.
    pub fn untyped_column(mut self, name: impl Into<String>) -> Self {
        self.columns.push(name.into());
        self
    }

    pub fn alias(mut self, alias: impl Into<String>, column: impl Into<String>) -> Self {
        self.column_aliases.insert(alias.into(), column.into());
        self
    }

    pub fn nullable(mut self, column: impl Into<String>, nullable: bool) -> Self {
        self.column_nullable.insert(column.into(), nullable);
        self
    }

    pub fn default_value(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.column_defaults.insert(column.into(), value.into());
        self
    }

    pub fn unique(mut self, column: impl Into<String>) -> Self {
        self.unique_columns.push(column.into());
        self
    }

    pub fn index(mut self, column: impl Into<String>) -> Self {
        self.index_columns.push(column.into());
        self
    }

    /// Validate and freeze the metadata.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::InvalidMetadata`] when the table has no name or
    /// columns, a column is declared twice, the primary field is missing or
    /// unknown, a type/default/nullable/alias entry names an unknown column,
    /// or an alias would shadow a different real column.
    pub fn build(self) -> Result<TableMetadata> {
        let table = self.table_name.clone();
        if table.is_empty() {
            return Err(OrmError::InvalidMetadata("table name is empty".to_string()));
        }
        if self.columns.is_empty() {
            return Err(OrmError::InvalidMetadata(format!("table {table} has no columns")));
        }
        for (i, column) in self.columns.iter().enumerate() {
            if self.columns[..i].contains(column) {
                return Err(OrmError::InvalidMetadata(format!(
                    "column {column} declared twice in table {table}"
                )));
            }
        }

        let has = |column: &str| self.columns.iter().any(|c| c == column);
        let unknown = |what: &str, column: &str| {
            OrmError::InvalidMetadata(format!(
                "{what} references unknown column {column} in table {table}"
            ))
        };

        let primary_field = self.primary_field.clone().ok_or_else(|| {
            OrmError::InvalidMetadata(format!("table {table} has no primary field"))
        })?;
        if !has(primary_field.as_str()) {
            return Err(unknown("primary field", &primary_field));
        }
        if let Some(column) = self.column_types.keys().find(|c| !has(c.as_str())) {
            return Err(unknown("column type", column));
        }
        if let Some(column) = self.column_defaults.keys().find(|c| !has(c.as_str())) {
            return Err(unknown("column default", column));
        }
        if let Some(column) = self.column_nullable.keys().find(|c| !has(c.as_str())) {
            return Err(unknown("column nullable flag", column));
        }
        if let Some(column) = self
            .unique_columns
            .iter()
            .chain(self.index_columns.iter())
            .find(|c| !has(c.as_str()))
        {
            return Err(unknown("index", column));
        }

        let mut lower_column_aliases = HashMap::with_capacity(self.column_aliases.len());
        for (alias, column) in &self.column_aliases {
            if !has(column.as_str()) {
                return Err(unknown(&format!("alias {alias}"), column));
            }
            let lower = alias.to_lowercase();
            // A real column resolved through the alias table first must
            // still resolve to itself.
            if let Some(shadowed) = self
                .columns
                .iter()
                .find(|c| c.to_lowercase() == lower && *c != column)
            {
                return Err(OrmError::InvalidMetadata(format!(
                    "alias {alias} for {column} shadows column {shadowed} in table {table}"
                )));
            }
            if let Some(previous) = lower_column_aliases.insert(lower, column.clone()) {
                if previous != *column {
                    return Err(OrmError::InvalidMetadata(format!(
                        "alias {alias} is ambiguous between {previous} and {column} in table {table}"
                    )));
                }
            }
        }

        Ok(TableMetadata {
            class_name: self.class_name.unwrap_or_else(|| table.clone()),
            table_name: table,
            primary_field,
            columns: self.columns,
            column_types: self.column_types,
            column_aliases: self.column_aliases,
            lower_column_aliases,
            column_defaults: self.column_defaults,
            column_nullable: self.column_nullable,
            unique_columns: self.unique_columns,
            index_columns: self.index_columns,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> TableMetadata {
        TableMetadata::builder("testTable")
            .class_name("TestEntity")
            .primary_field("primary")
            .column("primary", "int")
            .column("testColumn", "int")
            .column("testColumn2", "varchar(25)")
            .untyped_column("testColumn3")
            .alias("TestField", "testColumn2")
            .nullable("testColumn2", true)
            .default_value("testColumn", 0)
            .build()
            .unwrap()
    }

    #[test]
    fn test_alias_lookup_is_case_insensitive() {
        let metadata = metadata();
        assert_eq!(metadata.get_table_column_name("TestField").unwrap(), "testColumn2");
        assert_eq!(metadata.get_table_column_name("testfield").unwrap(), "testColumn2");
        assert_eq!(metadata.get_table_column_name("TESTFIELD").unwrap(), "testColumn2");
    }

    #[test]
    fn test_real_column_names_are_case_sensitive() {
        let metadata = metadata();
        assert_eq!(metadata.get_table_column_name("testColumn").unwrap(), "testColumn");
        let err = metadata.get_table_column_name("TESTCOLUMN").unwrap_err();
        assert_eq!(err, OrmError::column_not_found("TESTCOLUMN", "testTable"));
    }

    #[test]
    fn test_lookup_is_idempotent() {
        let metadata = metadata();
        for name in ["TestField", "testfield", "testColumn", "primary", "testColumn3"] {
            let once = metadata.get_table_column_name(name).unwrap();
            let twice = metadata.get_table_column_name(once).unwrap();
            assert_eq!(once, twice, "{name}");
        }
    }

    #[test]
    fn test_column_type_and_index() {
        let metadata = metadata();
        assert_eq!(metadata.get_table_column_type("testfield").unwrap(), "varchar(25)");
        assert_eq!(metadata.get_table_column_index("testColumn2").unwrap(), 2);
        assert!(matches!(
            metadata.get_table_column_type("testColumn3"),
            Err(OrmError::ColumnTypeUndefined { .. })
        ));
        assert_eq!(metadata.column_kind("testColumn").unwrap(), ColumnKind::Numeric);
    }

    #[test]
    fn test_nullable_and_default_lookups() {
        let metadata = metadata();
        assert!(metadata.is_column_nullable("TestField").unwrap());
        assert!(!metadata.is_column_nullable("testColumn").unwrap());
        assert_eq!(
            metadata.get_column_default_value("testColumn").unwrap(),
            Some(&Value::Int(0))
        );
        assert_eq!(metadata.get_column_default_value("testColumn2").unwrap(), None);
        assert!(metadata.is_column_nullable("missing").is_err());
    }

    #[test]
    fn test_column_spec() {
        let metadata = metadata();
        let spec = metadata.column_spec("testfield").unwrap();
        assert_eq!(spec.name, "testColumn2");
        assert_eq!(spec.table, "testTable");
        assert_eq!(spec.kind, ColumnKind::String);
        assert!(spec.nullable);
        assert_eq!(spec.default, None);
    }

    #[test]
    fn test_class_name_defaults_to_table_name() {
        let metadata = TableMetadata::builder("t")
            .primary_field("id")
            .column("id", "int")
            .build()
            .unwrap();
        assert_eq!(metadata.class_name(), "t");
    }

    #[test]
    fn test_build_rejects_unknown_references() {
        let err = TableMetadata::builder("t")
            .primary_field("id")
            .column("id", "int")
            .nullable("ghost", true)
            .build()
            .unwrap_err();
        assert!(matches!(err, OrmError::InvalidMetadata(ref m) if m.contains("ghost")));

        let err = TableMetadata::builder("t")
            .primary_field("missing")
            .column("id", "int")
            .build()
            .unwrap_err();
        assert!(matches!(err, OrmError::InvalidMetadata(_)));

        let err = TableMetadata::builder("t")
            .column("id", "int")
            .build()
            .unwrap_err();
        assert!(matches!(err, OrmError::InvalidMetadata(ref m) if m.contains("primary")));
    }

    #[test]
    fn test_build_rejects_alias_shadowing_a_column() {
        let err = TableMetadata::builder("t")
            .primary_field("id")
            .column("id", "int")
            .column("name", "varchar(10)")
            .alias("NAME", "id")
            .build()
            .unwrap_err();
        assert!(matches!(err, OrmError::InvalidMetadata(ref m) if m.contains("shadows")));
    }

    #[test]
    fn test_build_rejects_duplicate_columns() {
        let err = TableMetadata::builder("t")
            .primary_field("id")
            .column("id", "int")
            .column("id", "int")
            .build()
            .unwrap_err();
        assert!(matches!(err, OrmError::InvalidMetadata(ref m) if m.contains("twice")));
    }
}
