//! Error types for rowfold.
//!
//! `OrmError` covers every failure the mapping layer can raise: schema
//! resolution against [`TableMetadata`](crate::TableMetadata), caller misuse
//! of the query builder, value/constraint problems detected before SQL is
//! sent, hydration failures and errors surfaced by the driver collaborator.

/// Result alias used throughout the crate
pub type Result<T, E = OrmError> = std::result::Result<T, E>;

/// Error type for query building, execution and hydration
#[derive(Debug, Clone, PartialEq)]
pub enum OrmError {
    /// Column name or alias is not known to the table metadata
    ColumnNotFound { column: String, table: String },
    /// Column exists but no type tag was registered for it
    ColumnTypeUndefined { column: String, table: String },
    /// Entity (class name) is not registered
    UnknownEntity(String),
    /// Table metadata failed validation while being built
    InvalidMetadata(String),
    /// A query builder method was called before `entity()`
    EntityNotBound,
    /// Caller passed an argument the operation cannot accept
    InvalidArgument(String),
    /// Value cannot be rendered for the column type
    InvalidValue {
        column: String,
        value: String,
        expected: String,
    },
    /// Null given for a non-nullable column without a usable default
    NullConstraint { column: String, table: String },
    /// Result row lacks the primary field of the entity being hydrated
    MissingPrimaryField { entity: String, field: String },
    /// Result row lacks the primary field of a joined entity
    MissingJoinField { entity: String, field: String },
    /// Error reported by the database driver
    Driver(String),
    /// Configuration could not be loaded
    Config(String),
}

impl std::fmt::Display for OrmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrmError::ColumnNotFound { column, table } => {
                write!(f, "Column {column} not found in table {table}")
            }
            OrmError::ColumnTypeUndefined { column, table } => {
                write!(f, "Column {column} type is not defined in table {table}")
            }
            OrmError::UnknownEntity(name) => write!(f, "Unknown entity: {name}"),
            OrmError::InvalidMetadata(msg) => write!(f, "Invalid table metadata: {msg}"),
            OrmError::EntityNotBound => {
                write!(f, "Query has no entity bound; call entity() first")
            }
            OrmError::InvalidArgument(msg) => write!(f, "Invalid argument: {msg}"),
            OrmError::InvalidValue {
                column,
                value,
                expected,
            } => write!(
                f,
                "Invalid value {value} for column {column}: expected {expected}"
            ),
            OrmError::NullConstraint { column, table } => write!(
                f,
                "Column {column} in table {table} is not nullable and has no default value"
            ),
            OrmError::MissingPrimaryField { entity, field } => write!(
                f,
                "Result row for entity {entity} is missing primary field {field}"
            ),
            OrmError::MissingJoinField { entity, field } => write!(
                f,
                "Result row is missing field {field} of joined entity {entity}"
            ),
            OrmError::Driver(msg) => write!(f, "Database driver error: {msg}"),
            OrmError::Config(msg) => write!(f, "Configuration error: {msg}"),
        }
    }
}

impl std::error::Error for OrmError {}

impl From<config::ConfigError> for OrmError {
    fn from(err: config::ConfigError) -> Self {
        OrmError::Config(err.to_string())
    }
}

impl OrmError {
    /// Shorthand for [`OrmError::ColumnNotFound`]
    pub(crate) fn column_not_found(column: &str, table: &str) -> Self {
        OrmError::ColumnNotFound {
            column: column.to_string(),
            table: table.to_string(),
        }
    }

    /// True for errors caused by a query/metadata mismatch
    pub fn is_schema_error(&self) -> bool {
        matches!(
            self,
            OrmError::ColumnNotFound { .. }
                | OrmError::ColumnTypeUndefined { .. }
                | OrmError::UnknownEntity(_)
        )
    }
}
