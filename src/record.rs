//! Entity instances.
//!
//! A [`Record`] is one row of one entity: its metadata, the column values
//! keyed by canonical column name, and the child records materialized from
//! joins, keyed by child class name and then by child primary key.

use crate::database::Database;
use crate::error::{OrmError, Result};
use crate::executor::DatabaseInterface;
use crate::query::argument::Relation;
use crate::query::condition::Condition;
use crate::query::table::TableMetadata;
use crate::value::{Row, TryGetable, Value, ValueExtractionError};
use indexmap::IndexMap;
use std::sync::Arc;

static NULL: Value = Value::Null;

/// Children of one joined entity, keyed by primary key text
pub type JoinedRecords = IndexMap<String, Record>;

/// Value of `column` of `table` in a result row
///
/// Drivers that prefix joined columns report `table.column`; others report the
/// bare column name.
pub(crate) fn row_value<'r>(row: &'r Row, table: &str, column: &str) -> Option<&'r Value> {
    row.get(&format!("{table}.{column}"))
        .or_else(|| row.get(column))
}

/// One hydrated or to-be-stored row of an entity
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    metadata: Arc<TableMetadata>,
    values: Row,
    /// Computed select fields by alias
    computed: Row,
    joined: IndexMap<String, JoinedRecords>,
    attached: bool,
}

impl Record {
    /// New detached record with no values set
    pub fn new(metadata: Arc<TableMetadata>) -> Self {
        Self {
            metadata,
            values: Row::new(),
            computed: Row::new(),
            joined: IndexMap::new(),
            attached: false,
        }
    }

    /// Record loaded from a result row
    ///
    /// Every column of the entity found in the row is copied over.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::MissingPrimaryField`] if the row lacks the
    /// primary field.
    pub fn from_row(metadata: Arc<TableMetadata>, row: &Row) -> Result<Self> {
        let table = metadata.table_name();
        let primary = metadata.get_table_primary_field();
        if row_value(row, table, primary).is_none() {
            return Err(OrmError::MissingPrimaryField {
                entity: metadata.class_name().to_string(),
                field: primary.to_string(),
            });
        }

        let values = metadata
            .columns()
            .iter()
            .filter_map(|column| {
                row_value(row, table, column).map(|v| (column.clone(), v.clone()))
            })
            .collect();

        Ok(Self {
            metadata,
            values,
            computed: Row::new(),
            joined: IndexMap::new(),
            attached: true,
        })
    }

    pub fn metadata(&self) -> &Arc<TableMetadata> {
        &self.metadata
    }

    /// Value of a field by column name, alias or computed field alias.
    /// Unset columns read as null.
    pub fn get_field(&self, alias: &str) -> Result<&Value> {
        match self.metadata.get_table_column_name(alias) {
            Ok(column) => Ok(self.values.get(column).unwrap_or(&NULL)),
            Err(err) => self.computed.get(alias).ok_or(err),
        }
    }

    /// Values of computed select fields, by alias
    pub fn computed(&self) -> &Row {
        &self.computed
    }

    pub(crate) fn take_computed(&mut self, row: &Row, aliases: &[String]) {
        for alias in aliases {
            if let Some(value) = row.get(alias) {
                self.computed.insert(alias.clone(), value.clone());
            }
        }
    }

    pub fn set_field(&mut self, alias: &str, value: impl Into<Value>) -> Result<()> {
        let column = self.metadata.get_table_column_name(alias)?.to_string();
        self.values.insert(column, value.into());
        Ok(())
    }

    /// Typed field value
    ///
    /// ```rust
    /// use std::sync::Arc;
    /// use rowfold::{Record, TableMetadata};
    ///
    /// let metadata = Arc::new(
    ///     TableMetadata::builder("users")
    ///         .primary_field("id")
    ///         .column("id", "int")
    ///         .alias("Id", "id")
    ///         .build()?,
    /// );
    /// let mut user = Record::new(metadata);
    /// user.set_field("Id", "12")?;
    /// assert_eq!(user.get::<i32>("id")?, 12);
    /// # Ok::<(), rowfold::OrmError>(())
    /// ```
    pub fn get<T: TryGetable>(&self, alias: &str) -> Result<T> {
        let value = self.get_field(alias)?;
        T::try_get(value).map_err(|e| self.extraction_error::<T>(alias, value, e))
    }

    /// Typed field value, null as `None`
    pub fn get_opt<T: TryGetable>(&self, alias: &str) -> Result<Option<T>> {
        let value = self.get_field(alias)?;
        T::try_get_opt(value).map_err(|e| self.extraction_error::<T>(alias, value, e))
    }

    fn extraction_error<T: TryGetable>(
        &self,
        alias: &str,
        value: &Value,
        err: ValueExtractionError,
    ) -> OrmError {
        let expected = match err {
            ValueExtractionError::NullValue => format!("non-null {}", T::type_name()),
            ValueExtractionError::TypeMismatch { expected, .. } => expected,
        };
        OrmError::InvalidValue {
            column: alias.to_string(),
            value: value.key_text(),
            expected,
        }
    }

    pub fn primary_value(&self) -> &Value {
        self.values
            .get(self.metadata.get_table_primary_field())
            .unwrap_or(&NULL)
    }

    /// Canonical key text of the primary value
    pub fn primary_key(&self) -> String {
        self.primary_value().key_text()
    }

    /// Children materialized for the joined entity `class_name`
    pub fn joined(&self, class_name: &str) -> Option<&JoinedRecords> {
        self.joined.get(class_name)
    }

    pub fn joined_mut(&mut self, class_name: &str) -> &mut JoinedRecords {
        self.joined.entry(class_name.to_string()).or_default()
    }

    /// True once loaded from or stored to the database
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Set values keyed by canonical column name
    pub fn values(&self) -> &Row {
        &self.values
    }

    /// JSON object of the values, with joined children as arrays under
    /// their class names
    pub fn to_json(&self) -> serde_json::Value {
        let mut object: serde_json::Map<String, serde_json::Value> = self
            .values
            .iter()
            .chain(&self.computed)
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect();
        for (class, children) in &self.joined {
            let items = children.values().map(Record::to_json).collect();
            object.insert(class.clone(), serde_json::Value::Array(items));
        }
        serde_json::Value::Object(object)
    }

    fn primary_condition(&self) -> Condition {
        let mut condition = Condition::all();
        condition.add(
            self.metadata.get_table_primary_field(),
            self.primary_value().clone(),
            Relation::Equal,
        );
        condition
    }

    /// Store the record
    ///
    /// An attached record is updated by primary key. A detached one is
    /// inserted, takes the generated key (when the driver reports one) and
    /// becomes attached.
    pub fn save<D: DatabaseInterface>(&mut self, db: &Database<D>) -> Result<()> {
        if self.attached {
            let condition = self.primary_condition();
            db.update(&self.metadata, &self.values, Some(&condition))?;
            return Ok(());
        }

        let id = db.insert(&self.metadata, &self.values)?;
        if !id.is_null() {
            let primary = self.metadata.get_table_primary_field().to_string();
            self.values.insert(primary, id);
        }
        self.attached = true;
        Ok(())
    }

    /// Insert a copy of this record as a new row and return the copy
    ///
    /// Every set value except the primary field is copied; the database
    /// generates the new key. Computed fields and joined children stay behind.
    pub fn copy<D: DatabaseInterface>(&self, db: &Database<D>) -> Result<Record> {
        let primary = self.metadata.get_table_primary_field();
        let mut copy = Record::new(Arc::clone(&self.metadata));
        copy.values = self
            .values
            .iter()
            .filter(|(column, _)| column.as_str() != primary)
            .map(|(column, value)| (column.clone(), value.clone()))
            .collect();
        copy.save(db)?;
        Ok(copy)
    }

    /// Delete the stored row by primary key and detach the record
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::InvalidArgument`] for a record that was never stored.
    pub fn delete<D: DatabaseInterface>(&mut self, db: &Database<D>) -> Result<u64> {
        if !self.attached || self.primary_value().is_null() {
            return Err(OrmError::InvalidArgument(format!(
                "{} record is not stored",
                self.metadata.class_name()
            )));
        }
        let affected = db.delete(&self.metadata, &self.primary_condition())?;
        self.attached = false;
        Ok(affected)
    }
}

/// Conversion from a hydrated record into a typed model
///
/// ```rust
/// use rowfold::{FromRecord, Record, Result};
///
/// struct User {
///     id: i64,
///     name: Option<String>,
/// }
///
/// impl FromRecord for User {
///     fn from_record(record: &Record) -> Result<Self> {
///         Ok(User {
///             id: record.get("id")?,
///             name: record.get_opt("name")?,
///         })
///     }
/// }
/// ```
pub trait FromRecord: Sized {
    fn from_record(record: &Record) -> Result<Self>;
}

impl FromRecord for Record {
    fn from_record(record: &Record) -> Result<Self> {
        Ok(record.clone())
    }
}
