//! Statement execution and row hydration.
//!
//! `Database` wraps a [`DatabaseInterface`] driver. Every statement goes
//! through one instrumented path that counts it, times it and logs it; the
//! fetch helpers then fold raw rows into [`Record`]s.
//!
//! # Join materialization
//!
//! A joined query returns the parent columns repeated once per matching child
//! row. [`Database::fetch_objects_with_join`] groups rows by the parent
//! primary key, builds one parent per group and collects the distinct children
//! of each joined entity under `parent.joined(child_class)`, keyed by child
//! primary key. A row whose child primary key is `NULL` (an unmatched
//! `LEFT JOIN`) contributes no child.
//!
//! Cells are looked up as `table.column` first, the alias [`Query`] gives
//! every column of a joined select, then as the bare column name.

use crate::config::OrmConfig;
use crate::error::{OrmError, Result};
use crate::executor::DatabaseInterface;
use crate::metrics::QueryStats;
#[cfg(feature = "tracing")]
use crate::metrics::tracing_helpers;
use crate::query::condition::Condition;
use crate::query::select::Query;
use crate::query::table::TableMetadata;
use crate::record::{row_value, Record};
use crate::registry::EntityRegistry;
use crate::sql::SqlBuilder;
use crate::value::{Row, Value, ValueType};
use indexmap::IndexMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Records keyed by primary key text, in first-seen order
pub type RecordMap = IndexMap<String, Record>;

/// Database handle: driver, SQL builder, entity registry and statistics
#[derive(Debug)]
pub struct Database<D> {
    driver: D,
    builder: SqlBuilder,
    registry: EntityRegistry,
    config: OrmConfig,
    stats: QueryStats,
}

impl<D: DatabaseInterface> Database<D> {
    pub fn new(driver: D) -> Self {
        Self::with_config(driver, OrmConfig::default())
    }

    pub fn with_config(driver: D, config: OrmConfig) -> Self {
        Self {
            driver,
            builder: SqlBuilder::with_dialect(config.dialect),
            registry: EntityRegistry::new(),
            config,
            stats: QueryStats::new(),
        }
    }

    pub fn with_registry(mut self, registry: EntityRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn builder(&self) -> &SqlBuilder {
        &self.builder
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut EntityRegistry {
        &mut self.registry
    }

    pub fn config(&self) -> &OrmConfig {
        &self.config
    }

    pub fn stats(&self) -> &QueryStats {
        &self.stats
    }

    /// Start an unbound query against this database
    pub fn query(&self) -> Query<'_, D> {
        Query::new(self)
    }

    fn run<T>(&self, sql: &str, op: impl FnOnce(&D, &str) -> Result<T>) -> Result<T> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::execute_query_span(sql).entered();

        if self.config.log_queries {
            log::debug!("{sql}");
        }

        let start = Instant::now();
        let result = op(&self.driver, sql);
        let elapsed = start.elapsed();
        self.stats.record_query(elapsed, result.is_ok());

        if elapsed >= Duration::from_millis(self.config.slow_query_threshold_ms) {
            log::warn!("slow query ({} ms): {sql}", elapsed.as_millis());
        }
        if let Err(err) = &result {
            log::debug!("query failed: {err}: {sql}");
        }
        result
    }

    /// Execute a statement, returning the affected row count
    pub fn execute(&self, sql: &str) -> Result<u64> {
        self.run(sql, |driver, sql| driver.execute_statement(sql))
    }

    /// Execute a query and return its raw rows
    pub fn fetch_array(&self, sql: &str) -> Result<Vec<Row>> {
        self.run(sql, |driver, sql| driver.query_rows(sql))
    }

    /// The `index`-th column of every row
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::InvalidArgument`] if a row has no column at `index`.
    pub fn fetch_column(&self, sql: &str, index: usize) -> Result<Vec<Value>> {
        self.fetch_array(sql)?
            .into_iter()
            .map(|row| {
                let width = row.len();
                row.into_iter()
                    .nth(index)
                    .map(|(_, value)| value)
                    .ok_or_else(|| {
                        OrmError::InvalidArgument(format!(
                            "column index {index} out of range for a row of {width} columns"
                        ))
                    })
            })
            .collect()
    }

    /// Number of rows `sql` returns. No rows or a null count is `0`.
    pub fn count(&self, sql: &str) -> Result<u64> {
        let rows = self.fetch_array(&self.builder.build_count_query(sql))?;
        let Some(value) = rows.into_iter().next().and_then(|row| row.into_values().next()) else {
            return Ok(0);
        };
        if value.is_null() {
            return Ok(0);
        }
        u64::from_value(&value).ok_or_else(|| OrmError::InvalidValue {
            column: "COUNT(*)".to_string(),
            value: value.key_text(),
            expected: "u64".to_string(),
        })
    }

    /// Execute `sql` and hydrate one record per distinct primary key
    ///
    /// Rows repeating a primary key replace the earlier record.
    pub fn fetch_objects(&self, sql: &str, metadata: &Arc<TableMetadata>) -> Result<RecordMap> {
        let rows = self.fetch_array(sql)?;
        self.hydrate(&rows, metadata)
    }

    /// Fold rows into one record per primary key. See [`fetch_objects`](Self::fetch_objects).
    pub fn hydrate(&self, rows: &[Row], metadata: &Arc<TableMetadata>) -> Result<RecordMap> {
        self.hydrate_rows(rows, metadata, &[])
    }

    /// [`hydrate`](Self::hydrate), also copying the `computed` aliases of
    /// each row onto its record
    pub(crate) fn hydrate_rows(
        &self,
        rows: &[Row],
        metadata: &Arc<TableMetadata>,
        computed: &[String],
    ) -> Result<RecordMap> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::hydrate_span(metadata.class_name(), rows.len()).entered();

        let mut records = RecordMap::with_capacity(rows.len());
        for row in rows {
            let mut record = Record::from_row(Arc::clone(metadata), row)?;
            record.take_computed(row, computed);
            self.registry.after_hydrate(&mut record);
            records.insert(record.primary_key(), record);
        }
        Ok(records)
    }

    /// Execute a joined query and materialize children under their parents
    pub fn fetch_objects_with_join(
        &self,
        sql: &str,
        metadata: &Arc<TableMetadata>,
        joined: &[Arc<TableMetadata>],
    ) -> Result<RecordMap> {
        let rows = self.fetch_array(sql)?;
        self.hydrate_with_join(&rows, metadata, joined)
    }

    /// Group rows by parent primary key and attach distinct children.
    /// See [`fetch_objects_with_join`](Self::fetch_objects_with_join).
    ///
    /// # Errors
    ///
    /// [`OrmError::MissingPrimaryField`] if a row lacks the parent primary
    /// field; [`OrmError::MissingJoinField`] if it lacks a joined entity's
    /// primary field.
    pub fn hydrate_with_join(
        &self,
        rows: &[Row],
        metadata: &Arc<TableMetadata>,
        joined: &[Arc<TableMetadata>],
    ) -> Result<RecordMap> {
        self.hydrate_joined_rows(rows, metadata, joined, &[])
    }

    /// [`hydrate_with_join`](Self::hydrate_with_join), also copying the
    /// `computed` aliases of each group's first row onto its parent
    pub(crate) fn hydrate_joined_rows(
        &self,
        rows: &[Row],
        metadata: &Arc<TableMetadata>,
        joined: &[Arc<TableMetadata>],
        computed: &[String],
    ) -> Result<RecordMap> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::hydrate_span(metadata.class_name(), rows.len()).entered();

        let table = metadata.table_name();
        let primary = metadata.get_table_primary_field();

        let mut groups: IndexMap<String, Vec<&Row>> = IndexMap::new();
        for row in rows {
            let key = row_value(row, table, primary)
                .ok_or_else(|| OrmError::MissingPrimaryField {
                    entity: metadata.class_name().to_string(),
                    field: primary.to_string(),
                })?
                .key_text();
            groups.entry(key).or_default().push(row);
        }

        let mut records = RecordMap::with_capacity(groups.len());
        for (key, group) in groups {
            let mut parent = Record::from_row(Arc::clone(metadata), group[0])?;
            parent.take_computed(group[0], computed);

            for child_metadata in joined {
                let children = self.collect_children(&group, child_metadata)?;
                *parent.joined_mut(child_metadata.class_name()) = children;
            }

            self.registry.after_hydrate(&mut parent);
            records.insert(key, parent);
        }
        Ok(records)
    }

    fn collect_children(&self, group: &[&Row], metadata: &Arc<TableMetadata>) -> Result<RecordMap> {
        let table = metadata.table_name();
        let primary = metadata.get_table_primary_field();

        let mut children = RecordMap::new();
        for row in group {
            let value = row_value(row, table, primary).ok_or_else(|| OrmError::MissingJoinField {
                entity: metadata.class_name().to_string(),
                field: primary.to_string(),
            })?;
            if value.is_null() {
                continue;
            }
            let key = value.key_text();
            if children.contains_key(&key) {
                continue;
            }
            let mut child = Record::from_row(Arc::clone(metadata), row)?;
            self.registry.after_hydrate(&mut child);
            children.insert(key, child);
        }
        Ok(children)
    }

    /// Insert `values` and return the generated key
    pub fn insert(&self, metadata: &TableMetadata, values: &Row) -> Result<Value> {
        let sql = self.builder.build_insert_statement(metadata, values)?;
        self.execute(&sql)?;
        self.driver.last_insert_identifier()
    }

    pub fn update(
        &self,
        metadata: &TableMetadata,
        values: &Row,
        condition: Option<&Condition>,
    ) -> Result<u64> {
        let sql = self.builder.build_update_statement(metadata, values, condition)?;
        self.execute(&sql)
    }

    pub fn delete(&self, metadata: &TableMetadata, condition: &Condition) -> Result<u64> {
        let sql = self.builder.build_delete_statement(metadata, condition)?;
        self.execute(&sql)
    }

    /// Escape and quote a string with the driver's rules
    pub fn quote(&self, value: &str) -> String {
        self.driver.quote(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockDriver;
    use crate::row;

    fn parent() -> Arc<TableMetadata> {
        Arc::new(
            TableMetadata::builder("parents")
                .class_name("Parent")
                .primary_field("primary")
                .column("primary", "int")
                .column("f", "varchar(10)")
                .build()
                .unwrap(),
        )
    }

    fn child() -> Arc<TableMetadata> {
        Arc::new(
            TableMetadata::builder("children")
                .class_name("Child")
                .primary_field("j_primary")
                .column("j_primary", "int")
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn test_count_of_empty_result_is_zero() {
        let db = Database::new(MockDriver::new());
        assert_eq!(db.count("SELECT * FROM t").unwrap(), 0);

        let db = Database::new(
            MockDriver::new().append_query_results(vec![vec![row! { "c" => Value::Null }]]),
        );
        assert_eq!(db.count("SELECT * FROM t").unwrap(), 0);

        let db = Database::new(
            MockDriver::new().append_query_results(vec![vec![row! { "c" => "12" }]]),
        );
        assert_eq!(db.count("SELECT * FROM t").unwrap(), 12);
    }

    #[test]
    fn test_count_accepts_decimal_and_float() {
        let db = Database::new(MockDriver::new().append_query_results(vec![
            vec![row! { "COUNT(*)" => u64::MAX }],
            vec![row! { "COUNT(*)" => 8.0 }],
        ]));
        assert_eq!(db.count("SELECT * FROM t").unwrap(), u64::MAX);
        assert_eq!(db.count("SELECT * FROM t").unwrap(), 8);
    }

    #[test]
    fn test_fetch_column() {
        let db = Database::new(MockDriver::new().append_query_results(vec![
            vec![row! { "a" => 1, "b" => "x" }, row! { "a" => 2, "b" => "y" }],
            vec![row! { "a" => 1 }],
        ]));
        assert_eq!(
            db.fetch_column("q", 1).unwrap(),
            vec![Value::from("x"), Value::from("y")]
        );
        assert!(matches!(
            db.fetch_column("q", 1),
            Err(OrmError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_fetch_objects_last_row_wins() {
        let db = Database::new(MockDriver::new().append_query_results(vec![vec![
            row! { "primary" => 1, "f" => "a" },
            row! { "primary" => 2, "f" => "b" },
            row! { "primary" => 1, "f" => "c" },
        ]]));
        let records = db.fetch_objects("q", &parent()).unwrap();
        let keys: Vec<_> = records.keys().cloned().collect();
        assert_eq!(keys, vec!["1", "2"]);
        assert_eq!(records["1"].get_field("f").unwrap(), &Value::from("c"));
    }

    #[test]
    fn test_join_groups_children_under_parent() {
        let db = Database::new(MockDriver::new().append_query_results(vec![vec![
            row! { "primary" => 1, "f" => "a", "j_primary" => 10 },
            row! { "primary" => 1, "f" => "a", "j_primary" => 11 },
        ]]));
        let records = db
            .fetch_objects_with_join("q", &parent(), &[child()])
            .unwrap();

        assert_eq!(records.len(), 1);
        let parent = &records["1"];
        assert_eq!(parent.primary_value(), &Value::Int(1));
        let children = parent.joined("Child").unwrap();
        let keys: Vec<_> = children.keys().cloned().collect();
        assert_eq!(keys, vec!["10", "11"]);
    }

    #[test]
    fn test_join_deduplicates_and_skips_null_children() {
        let db = Database::new(MockDriver::new());
        let rows = vec![
            row! { "primary" => 1, "f" => "a", "j_primary" => 10 },
            row! { "primary" => 1, "f" => "a", "j_primary" => 10 },
            row! { "primary" => 2, "f" => "b", "j_primary" => Value::Null },
        ];
        let records = db.hydrate_with_join(&rows, &parent(), &[child()]).unwrap();
        assert_eq!(records["1"].joined("Child").unwrap().len(), 1);
        assert!(records["2"].joined("Child").unwrap().is_empty());
    }

    #[test]
    fn test_join_missing_child_primary() {
        let db = Database::new(MockDriver::new());
        let rows = vec![row! { "primary" => 1, "f" => "a" }];
        let err = db.hydrate_with_join(&rows, &parent(), &[child()]).unwrap_err();
        assert_eq!(
            err,
            OrmError::MissingJoinField {
                entity: "Child".to_string(),
                field: "j_primary".to_string(),
            }
        );
    }

    #[test]
    fn test_join_missing_parent_primary() {
        let db = Database::new(MockDriver::new());
        let rows = vec![row! { "f" => "a", "j_primary" => 1 }];
        assert!(matches!(
            db.hydrate_with_join(&rows, &parent(), &[child()]),
            Err(OrmError::MissingPrimaryField { .. })
        ));
    }

    #[test]
    fn test_stats_and_driver_errors() {
        let db = Database::new(
            MockDriver::new().append_errors(vec![OrmError::Driver("lost connection".to_string())]),
        );
        assert_eq!(
            db.execute("DELETE FROM t").unwrap_err(),
            OrmError::Driver("lost connection".to_string())
        );
        db.execute("DELETE FROM t").unwrap();
        let snapshot = db.stats().snapshot();
        assert_eq!(snapshot.queries, 2);
        assert_eq!(snapshot.failures, 1);
    }

    #[test]
    fn test_hooks_run_for_parents_and_children() {
        let mut registry = EntityRegistry::new();
        registry.register_with_hook(parent(), |r| r.set_field("f", "hooked").unwrap());
        registry.register_with_hook(child(), |r| r.set_field("j_primary", 99).unwrap());
        let db = Database::new(MockDriver::new()).with_registry(registry);

        let rows = vec![row! { "primary" => 1, "f" => "a", "j_primary" => 10 }];
        let records = db.hydrate_with_join(&rows, &parent(), &[child()]).unwrap();
        let parent = &records["1"];
        assert_eq!(parent.get_field("f").unwrap(), &Value::from("hooked"));
        let child = &parent.joined("Child").unwrap()["10"];
        assert_eq!(child.get_field("j_primary").unwrap(), &Value::Int(99));
    }

    #[test]
    fn test_insert_returns_generated_key() {
        let db = Database::new(MockDriver::new().with_last_insert_id(5));
        let id = db.insert(&parent(), &row! { "f" => "x" }).unwrap();
        assert_eq!(id, Value::Int(5));
        assert_eq!(db.quote("a\"b"), "\"a\\\"b\"");
    }
}
