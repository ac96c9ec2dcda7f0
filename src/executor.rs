//! The driver seam.
//!
//! `DatabaseInterface` is everything the mapping layer needs from a
//! database driver: run a statement, run a query, report the last generated
//! key and escape a string. Connection handling stays on the driver side.

use crate::error::Result;
use crate::value::{Row, Value};

/// Trait for executing SQL text against a database
///
/// Implementations convert their native errors into
/// [`OrmError::Driver`](crate::OrmError::Driver).
///
/// # Examples
///
/// ```rust
/// use rowfold::{DatabaseInterface, Result, Row, Value};
///
/// struct Nothing;
///
/// impl DatabaseInterface for Nothing {
///     fn execute_statement(&self, _sql: &str) -> Result<u64> {
///         Ok(0)
///     }
///     fn query_rows(&self, _sql: &str) -> Result<Vec<Row>> {
///         Ok(Vec::new())
///     }
///     fn last_insert_identifier(&self) -> Result<Value> {
///         Ok(Value::Null)
///     }
/// }
///
/// assert_eq!(Nothing.quote("a\"b"), "\"a\\\"b\"");
/// ```
pub trait DatabaseInterface {
    /// Execute a statement that returns no rows, returning the affected row count
    fn execute_statement(&self, sql: &str) -> Result<u64>;

    /// Execute a query and return its rows, column order preserved
    fn query_rows(&self, sql: &str) -> Result<Vec<Row>>;

    /// Key generated by the most recent `INSERT`
    fn last_insert_identifier(&self) -> Result<Value>;

    /// Escape and quote a string literal
    ///
    /// The default follows MySQL: backslashes and double quotes are escaped
    /// and the value is wrapped in double quotes.
    fn quote(&self, value: &str) -> String {
        crate::sql::Dialect::MySql.quote_string(value)
    }
}

impl<T: DatabaseInterface + ?Sized> DatabaseInterface for &T {
    fn execute_statement(&self, sql: &str) -> Result<u64> {
        (**self).execute_statement(sql)
    }

    fn query_rows(&self, sql: &str) -> Result<Vec<Row>> {
        (**self).query_rows(sql)
    }

    fn last_insert_identifier(&self) -> Result<Value> {
        (**self).last_insert_identifier()
    }

    fn quote(&self, value: &str) -> String {
        (**self).quote(value)
    }
}

impl<T: DatabaseInterface + ?Sized> DatabaseInterface for Box<T> {
    fn execute_statement(&self, sql: &str) -> Result<u64> {
        (**self).execute_statement(sql)
    }

    fn query_rows(&self, sql: &str) -> Result<Vec<Row>> {
        (**self).query_rows(sql)
    }

    fn last_insert_identifier(&self) -> Result<Value> {
        (**self).last_insert_identifier()
    }

    fn quote(&self, value: &str) -> String {
        (**self).quote(value)
    }
}
