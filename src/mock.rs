//! In-memory driver for tests.
//!
//! `MockDriver` plays back queued results in order and records every
//! statement it was handed:
//!
//! ```rust
//! use rowfold::{row, Database, MockDriver};
//!
//! let driver = MockDriver::new()
//!     .append_query_results(vec![vec![row! { "COUNT(*)" => 3 }]]);
//! let db = Database::new(driver);
//!
//! assert_eq!(db.count("SELECT * FROM t")?, 3);
//! assert_eq!(
//!     db.driver().statements(),
//!     vec!["SELECT COUNT(*) FROM (SELECT * FROM t) AS t".to_string()]
//! );
//! # Ok::<(), rowfold::OrmError>(())
//! ```

use crate::error::{OrmError, Result};
use crate::executor::DatabaseInterface;
use crate::value::{Row, Value};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Scripted [`DatabaseInterface`]
///
/// Queries with nothing queued return no rows; statements with nothing queued
/// report zero affected rows. A queued error is returned by the next call of
/// either kind.
#[derive(Debug, Default)]
pub struct MockDriver {
    query_results: Mutex<VecDeque<Vec<Row>>>,
    exec_results: Mutex<VecDeque<u64>>,
    errors: Mutex<VecDeque<OrmError>>,
    statements: Mutex<Vec<String>>,
    last_insert_id: Mutex<Value>,
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one row set per upcoming query
    pub fn append_query_results(self, results: Vec<Vec<Row>>) -> Self {
        lock(&self.query_results).extend(results);
        self
    }

    /// Queue affected row counts for upcoming statements
    pub fn append_exec_results(self, results: Vec<u64>) -> Self {
        lock(&self.exec_results).extend(results);
        self
    }

    /// Queue errors for upcoming calls
    pub fn append_errors(self, errors: Vec<OrmError>) -> Self {
        lock(&self.errors).extend(errors);
        self
    }

    pub fn with_last_insert_id(self, id: impl Into<Value>) -> Self {
        *lock(&self.last_insert_id) = id.into();
        self
    }

    /// Set the key reported after the next `INSERT`
    pub fn set_last_insert_id(&self, id: impl Into<Value>) {
        *lock(&self.last_insert_id) = id.into();
    }

    /// Every statement received so far, in order
    pub fn statements(&self) -> Vec<String> {
        lock(&self.statements).clone()
    }

    pub fn last_statement(&self) -> Option<String> {
        lock(&self.statements).last().cloned()
    }

    fn record(&self, sql: &str) -> Result<()> {
        lock(&self.statements).push(sql.to_string());
        match lock(&self.errors).pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl DatabaseInterface for MockDriver {
    fn execute_statement(&self, sql: &str) -> Result<u64> {
        self.record(sql)?;
        Ok(lock(&self.exec_results).pop_front().unwrap_or(0))
    }

    fn query_rows(&self, sql: &str) -> Result<Vec<Row>> {
        self.record(sql)?;
        Ok(lock(&self.query_results).pop_front().unwrap_or_default())
    }

    fn last_insert_identifier(&self) -> Result<Value> {
        Ok(lock(&self.last_insert_id).clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row;

    #[test]
    fn test_results_play_back_in_order() {
        let driver = MockDriver::new()
            .append_query_results(vec![vec![row! { "a" => 1 }], vec![]])
            .append_exec_results(vec![4]);

        assert_eq!(driver.query_rows("q1").unwrap().len(), 1);
        assert!(driver.query_rows("q2").unwrap().is_empty());
        assert!(driver.query_rows("q3").unwrap().is_empty());
        assert_eq!(driver.execute_statement("s1").unwrap(), 4);
        assert_eq!(driver.execute_statement("s2").unwrap(), 0);
        assert_eq!(driver.statements(), vec!["q1", "q2", "q3", "s1", "s2"]);
    }

    #[test]
    fn test_queued_error_is_returned_once() {
        let driver = MockDriver::new().append_errors(vec![OrmError::Driver("gone".to_string())]);
        assert_eq!(
            driver.query_rows("q").unwrap_err(),
            OrmError::Driver("gone".to_string())
        );
        assert!(driver.query_rows("q").is_ok());
    }

    #[test]
    fn test_last_insert_id() {
        let driver = MockDriver::new().with_last_insert_id(7);
        assert_eq!(driver.last_insert_identifier().unwrap(), Value::Int(7));
        driver.set_last_insert_id(8);
        assert_eq!(driver.last_insert_identifier().unwrap(), Value::Int(8));
        assert_eq!(driver.last_statement(), None);
    }
}
