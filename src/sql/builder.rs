//! SQL text generation.
//!
//! `SqlBuilder` turns table/column maps, condition trees and value maps into
//! SQL fragments and statements. It performs no I/O; every schema lookup goes
//! through the [`TableMetadata`] passed in.
//!
//! # Example
//!
//! ```rust
//! use rowfold::{SqlBuilder, TableColumns};
//!
//! let builder = SqlBuilder::new();
//! let mut columns = TableColumns::new();
//! columns.insert("t".to_string(), vec!["a".to_string(), "b".to_string()]);
//!
//! assert_eq!(builder.build_select_statement(&columns), "SELECT `t`.`a`, `t`.`b`");
//! assert_eq!(builder.build_limit_statement(5, 2), "LIMIT 2, 5");
//! ```

use crate::error::{OrmError, Result};
use crate::query::argument::{Argument, Relation};
use crate::query::condition::{Condition, ConditionNode};
use crate::query::table::{ColumnSpec, TableMetadata};
use crate::sql::dialect::Dialect;
use crate::sql::value::{render_scalar, render_value, NullPolicy};
use crate::value::{Row, Value};
use indexmap::IndexMap;
use std::fmt;
use std::str::FromStr;

/// Table name to ordered column names
pub type TableColumns = IndexMap<String, Vec<String>>;

/// Sort direction of an `ORDER BY` entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        })
    }
}

impl FromStr for SortOrder {
    type Err = OrmError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "ASC" => Ok(SortOrder::Asc),
            "DESC" => Ok(SortOrder::Desc),
            other => Err(OrmError::InvalidArgument(format!("unknown sort order: {other}"))),
        }
    }
}

/// Join flavor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum JoinKind {
    #[default]
    Left,
    Inner,
}

impl JoinKind {
    pub fn as_sql(self) -> &'static str {
        match self {
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Inner => "INNER JOIN",
        }
    }
}

/// One `JOIN ... ON parent.col = child.col` clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinClause {
    pub kind: JoinKind,
    pub table: String,
    pub parent_table: String,
    pub parent_column: String,
    pub child_column: String,
}

/// Pre-resolved pieces of a `SELECT` statement
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectParts {
    pub select: TableColumns,
    /// Alias every selected column as `table.column`
    pub aliased: bool,
    pub distinct: bool,
    /// `(expression, alias)` pairs appended to the select list verbatim
    pub computed: Vec<(String, String)>,
    pub from: Vec<String>,
    pub joins: Vec<JoinClause>,
    /// Rendered condition body, empty for no `WHERE`
    pub condition: String,
    pub group: TableColumns,
    /// `(table, column, order)` in the order they were requested
    pub order: Vec<(String, String, SortOrder)>,
    /// Append the dialect's random ordering after `order`
    pub random: bool,
    /// `(rows, offset)`
    pub limit: Option<(u64, u64)>,
}

/// Entities a condition's fields may name
#[derive(Clone, Copy)]
struct Scope<'a> {
    base: &'a TableMetadata,
    joined: &'a [&'a TableMetadata],
    qualify: bool,
}

impl<'a> Scope<'a> {
    fn single(base: &'a TableMetadata, qualify: bool) -> Self {
        Self {
            base,
            joined: &[],
            qualify,
        }
    }

    /// Entity and canonical column for `column`, `Entity.column` or
    /// `table.column`
    fn resolve(&self, field: &str) -> Result<(&'a TableMetadata, &'a str)> {
        if let Some((prefix, column)) = field.split_once('.') {
            let target = std::iter::once(self.base)
                .chain(self.joined.iter().copied())
                .find(|m| m.table_name() == prefix || m.class_name() == prefix);
            if let Some(target) = target {
                return Ok((target, target.get_table_column_name(column)?));
            }
        }
        Ok((self.base, self.base.get_table_column_name(field)?))
    }
}

/// Dialect-aware SQL generator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SqlBuilder {
    dialect: Dialect,
}

impl SqlBuilder {
    /// MySQL builder
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dialect(dialect: Dialect) -> Self {
        Self { dialect }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn ident(&self, name: &str) -> String {
        self.dialect.quote_identifier(name)
    }

    fn qualified(&self, table: &str, column: &str) -> String {
        if column == "*" {
            format!("{}.*", self.ident(table))
        } else {
            format!("{}.{}", self.ident(table), self.ident(column))
        }
    }

    fn qualified_list(&self, columns: &TableColumns) -> Vec<String> {
        columns
            .iter()
            .flat_map(|(table, cols)| cols.iter().map(move |c| self.qualified(table, c)))
            .collect()
    }

    /// `SELECT` clause. An empty map selects `*`.
    pub fn build_select_statement(&self, columns: &TableColumns) -> String {
        select_clause("SELECT", self.qualified_list(columns))
    }

    /// `SELECT` clause with every column aliased `table.column`, so rows
    /// keep one key per table even when column names repeat across tables
    pub fn build_aliased_select_statement(&self, columns: &TableColumns) -> String {
        select_clause("SELECT", self.aliased_list(columns))
    }

    fn aliased_list(&self, columns: &TableColumns) -> Vec<String> {
        columns
            .iter()
            .flat_map(|(table, cols)| {
                cols.iter().map(move |c| {
                    if c == "*" {
                        self.qualified(table, c)
                    } else {
                        format!(
                            "{} AS {}",
                            self.qualified(table, c),
                            self.ident(&format!("{table}.{c}"))
                        )
                    }
                })
            })
            .collect()
    }

    pub fn build_from_statement<S: AsRef<str>>(&self, tables: &[S]) -> String {
        let list: Vec<String> = tables.iter().map(|t| self.ident(t.as_ref())).collect();
        format!("FROM {}", list.join(", "))
    }

    /// `GROUP BY` clause, empty when there is nothing to group by
    pub fn build_group_statement(&self, columns: &TableColumns) -> String {
        let list = self.qualified_list(columns);
        if list.is_empty() {
            return String::new();
        }
        format!("GROUP BY {}", list.join(", "))
    }

    /// `ORDER BY` clause
    ///
    /// `orders` is matched positionally against the flattened columns; columns
    /// past the end of `orders` sort ascending.
    pub fn build_order_statement(&self, columns: &TableColumns, orders: &[SortOrder]) -> String {
        let entries: Vec<(String, String, SortOrder)> = columns
            .iter()
            .flat_map(|(table, cols)| cols.iter().map(move |c| (table.clone(), c.clone())))
            .enumerate()
            .map(|(i, (table, column))| {
                (table, column, orders.get(i).copied().unwrap_or_default())
            })
            .collect();
        self.order_clause(&entries, false)
    }

    fn order_clause(&self, entries: &[(String, String, SortOrder)], random: bool) -> String {
        let mut list: Vec<String> = entries
            .iter()
            .map(|(table, column, order)| format!("{} {}", self.qualified(table, column), order))
            .collect();
        if random {
            list.push(self.dialect.random_function().to_string());
        }
        if list.is_empty() {
            return String::new();
        }
        format!("ORDER BY {}", list.join(", "))
    }

    pub fn build_limit_statement(&self, rows: u64, offset: u64) -> String {
        self.dialect.limit_clause(rows, offset)
    }

    /// Render a condition tree without the `WHERE` keyword
    ///
    /// Every non-empty child is parenthesized and joined with the group's
    /// operator. Empty groups vanish; an empty tree renders `""`.
    pub fn build_where_statement(
        &self,
        metadata: &TableMetadata,
        condition: &Condition,
    ) -> Result<String> {
        self.render_condition(Scope::single(metadata, false), condition)
    }

    /// Like [`build_where_statement`](Self::build_where_statement) with
    /// columns rendered as `` `table`.`column` ``
    pub fn build_qualified_where_statement(
        &self,
        metadata: &TableMetadata,
        condition: &Condition,
    ) -> Result<String> {
        self.render_condition(Scope::single(metadata, true), condition)
    }

    /// Qualified condition whose fields may also name joined entities as
    /// `Entity.column` or `table.column`
    pub fn build_joined_where_statement(
        &self,
        metadata: &TableMetadata,
        joined: &[&TableMetadata],
        condition: &Condition,
    ) -> Result<String> {
        let scope = Scope {
            base: metadata,
            joined,
            qualify: true,
        };
        self.render_condition(scope, condition)
    }

    fn render_condition(&self, scope: Scope<'_>, condition: &Condition) -> Result<String> {
        let mut parts = Vec::with_capacity(condition.len());
        for child in condition.children() {
            let rendered = match child {
                ConditionNode::Argument(argument) => self.render_argument(argument, scope)?,
                ConditionNode::Condition(nested) => self.render_condition(scope, nested)?,
            };
            if !rendered.is_empty() {
                parts.push(format!("({rendered})"));
            }
        }
        let separator = format!(" {} ", condition.relation().as_sql());
        Ok(parts.join(&separator))
    }

    /// Render one argument as `column <op> value`
    pub fn build_argument_condition(
        &self,
        argument: &Argument,
        metadata: &TableMetadata,
    ) -> Result<String> {
        self.render_argument(argument, Scope::single(metadata, false))
    }

    fn render_argument(&self, argument: &Argument, scope: Scope<'_>) -> Result<String> {
        let relation = argument.relation();
        if relation == Relation::Own {
            return Ok(argument.field().to_string());
        }

        let (target, column) = scope.resolve(argument.field())?;
        let column_ref = if scope.qualify || target.table_name() != scope.base.table_name() {
            self.qualified(target.table_name(), column)
        } else {
            column.to_string()
        };

        if matches!(relation, Relation::IsNull | Relation::NotNull) {
            return Ok(format!("{column_ref} {}", relation.as_sql()));
        }

        let spec = target.column_spec(column)?;
        if let Value::List(items) = argument.value() {
            return self.render_list(&column_ref, items, &spec, relation);
        }

        let value = self.build_argument_value(argument.value(), &spec, relation)?;
        Ok(format!("{column_ref} {} {value}", relation.as_sql()))
    }

    fn render_list(
        &self,
        column_ref: &str,
        items: &[Value],
        spec: &ColumnSpec<'_>,
        relation: Relation,
    ) -> Result<String> {
        let keyword = match relation {
            Relation::Equal => "IN",
            Relation::NotEqual => "NOT IN",
            other => {
                return Err(OrmError::InvalidArgument(format!(
                    "relation {other} does not accept a list value for column {}",
                    spec.name
                )))
            }
        };

        if items.is_empty() {
            // Nothing is IN an empty set; everything is NOT IN it.
            return Ok(if relation == Relation::Equal { "1 = 0" } else { "1 = 1" }.to_string());
        }

        let values = items
            .iter()
            .map(|item| render_scalar(self.dialect, item, spec, Relation::Equal))
            .collect::<Result<Vec<_>>>()?;
        Ok(format!("{column_ref} {keyword} ({})", values.join(",")))
    }

    /// Render a value for `column`, applying the default-value fallback for nulls
    pub fn build_argument_value(
        &self,
        value: &Value,
        column: &ColumnSpec<'_>,
        relation: Relation,
    ) -> Result<String> {
        render_value(self.dialect, value, column, relation, NullPolicy::Fallback)
    }

    /// Resolve aliases and drop the primary field, last write wins
    fn writable_columns<'m>(
        &self,
        metadata: &'m TableMetadata,
        values: &'m Row,
    ) -> Result<IndexMap<&'m str, &'m Value>> {
        let primary = metadata.get_table_primary_field();
        let mut out = IndexMap::with_capacity(values.len());
        for (name, value) in values {
            let column = metadata.get_table_column_name(name)?;
            if column != primary {
                out.insert(column, value);
            }
        }
        Ok(out)
    }

    /// `INSERT INTO t (a, b) VALUES (...)`
    ///
    /// The primary field is left to the database. A null for a non-nullable
    /// column falls back to the column default.
    pub fn build_insert_statement(&self, metadata: &TableMetadata, values: &Row) -> Result<String> {
        let table = self.ident(metadata.table_name());
        let columns = self.writable_columns(metadata, values)?;

        if columns.is_empty() {
            return Ok(match self.dialect {
                Dialect::MySql => format!("INSERT INTO {table} () VALUES ()"),
                Dialect::Postgres | Dialect::Sqlite => {
                    format!("INSERT INTO {table} DEFAULT VALUES")
                }
            });
        }

        let mut names = Vec::with_capacity(columns.len());
        let mut rendered = Vec::with_capacity(columns.len());
        for (column, value) in columns {
            let spec = metadata.column_spec(column)?;
            names.push(self.ident(column));
            rendered.push(render_value(
                self.dialect,
                value,
                &spec,
                Relation::Equal,
                NullPolicy::Fallback,
            )?);
        }

        Ok(format!(
            "INSERT INTO {table} ({}) VALUES ({})",
            names.join(", "),
            rendered.join(", ")
        ))
    }

    /// `UPDATE t SET a = 1 WHERE (...)`
    ///
    /// Nulls for non-nullable columns are rejected rather than replaced.
    pub fn build_update_statement(
        &self,
        metadata: &TableMetadata,
        values: &Row,
        condition: Option<&Condition>,
    ) -> Result<String> {
        let columns = self.writable_columns(metadata, values)?;
        if columns.is_empty() {
            return Err(OrmError::InvalidArgument(format!(
                "no columns to update in table {}",
                metadata.table_name()
            )));
        }

        let mut assignments = Vec::with_capacity(columns.len());
        for (column, value) in columns {
            let spec = metadata.column_spec(column)?;
            let rendered =
                render_value(self.dialect, value, &spec, Relation::Equal, NullPolicy::Reject)?;
            assignments.push(format!("{} = {rendered}", self.ident(column)));
        }

        let mut sql = format!(
            "UPDATE {} SET {}",
            self.ident(metadata.table_name()),
            assignments.join(", ")
        );
        if let Some(condition) = condition {
            let body = self.build_where_statement(metadata, condition)?;
            if !body.is_empty() {
                sql.push_str(" WHERE ");
                sql.push_str(&body);
            }
        }
        Ok(sql)
    }

    /// `DELETE FROM t WHERE (...)`. A condition that renders empty is refused.
    pub fn build_delete_statement(
        &self,
        metadata: &TableMetadata,
        condition: &Condition,
    ) -> Result<String> {
        let body = self.build_where_statement(metadata, condition)?;
        if body.is_empty() {
            return Err(OrmError::InvalidArgument(format!(
                "refusing to delete from {} without a condition",
                metadata.table_name()
            )));
        }
        Ok(format!(
            "DELETE FROM {} WHERE {body}",
            self.ident(metadata.table_name())
        ))
    }

    /// Assemble a full `SELECT` statement
    pub fn build_select_query(&self, parts: &SelectParts) -> String {
        let mut select = if parts.aliased {
            self.aliased_list(&parts.select)
        } else {
            self.qualified_list(&parts.select)
        };
        select.extend(
            parts
                .computed
                .iter()
                .map(|(expression, alias)| format!("{expression} AS {}", self.ident(alias))),
        );
        let keyword = if parts.distinct { "SELECT DISTINCT" } else { "SELECT" };
        let select = select_clause(keyword, select);

        let mut clauses = vec![select, self.build_from_statement(parts.from.as_slice())];

        for join in &parts.joins {
            clauses.push(format!(
                "{} {} ON {} = {}",
                join.kind.as_sql(),
                self.ident(&join.table),
                self.qualified(&join.parent_table, &join.parent_column),
                self.qualified(&join.table, &join.child_column),
            ));
        }
        if !parts.condition.is_empty() {
            clauses.push(format!("WHERE {}", parts.condition));
        }
        clauses.push(self.build_group_statement(&parts.group));
        clauses.push(self.order_clause(&parts.order, parts.random));
        if let Some((rows, offset)) = parts.limit {
            clauses.push(self.build_limit_statement(rows, offset));
        }

        clauses.retain(|c| !c.is_empty());
        clauses.join(" ")
    }

    /// Wrap a statement so it returns its row count
    pub fn build_count_query(&self, sql: &str) -> String {
        format!("SELECT COUNT(*) FROM ({sql}) AS t")
    }
}

fn select_clause(keyword: &str, list: Vec<String>) -> String {
    if list.is_empty() {
        return format!("{keyword} *");
    }
    format!("{keyword} {}", list.join(", "))
}
