//! Fluent query builder.
//!
//! A [`Query`] starts unbound. [`Query::entity`] binds it to one entity;
//! every other builder method needs a bound entity and resolves the columns it
//! is given right away, so a misspelt column fails at the call that names it.
//! Execution methods live in the execution module and reset the accumulated
//! selection, joins, grouping, ordering, limit and condition afterwards while
//! keeping the bound entity.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use rowfold::{Database, MockDriver, SortOrder, TableMetadata};
//!
//! let users = Arc::new(
//!     TableMetadata::builder("users")
//!         .class_name("User")
//!         .primary_field("id")
//!         .column("id", "int")
//!         .column("name", "varchar(64)")
//!         .build()?,
//! );
//! let db = Database::new(MockDriver::new());
//!
//! let mut query = db.query();
//! query
//!     .entity(users)
//!     .filter_eq("name", "ann")?
//!     .order_by("id", SortOrder::Desc)?
//!     .limit(10, 0)?;
//!
//! assert_eq!(
//!     query.sql()?,
//!     "SELECT `users`.`id`, `users`.`name` FROM `users` WHERE (name = \"ann\") \
//!      ORDER BY `users`.`id` DESC LIMIT 0, 10"
//! );
//! # Ok::<(), rowfold::OrmError>(())
//! ```

use crate::database::Database;
use crate::error::{OrmError, Result};
use crate::executor::DatabaseInterface;
use crate::query::argument::{Argument, Relation};
use crate::query::condition::{Condition, ConditionNode};
use crate::query::table::TableMetadata;
use crate::sql::{JoinClause, JoinKind, SelectParts, SortOrder, TableColumns};
use crate::value::Value;
use indexmap::IndexMap;
use std::sync::Arc;

/// A joined entity and its `ON` columns
#[derive(Debug, Clone)]
pub struct JoinDefinition {
    pub metadata: Arc<TableMetadata>,
    /// Column of the bound entity
    pub parent_column: String,
    /// Column of the joined entity
    pub child_column: String,
    pub kind: JoinKind,
}

/// Accumulated clauses; cleared after every execution
#[derive(Debug, Clone, Default)]
pub(crate) struct QueryState {
    pub(crate) select: Vec<String>,
    pub(crate) joins: IndexMap<String, JoinDefinition>,
    pub(crate) group: Vec<(String, String)>,
    pub(crate) order: Vec<(String, String, SortOrder)>,
    pub(crate) random: bool,
    pub(crate) limit: Option<(u64, u64)>,
    pub(crate) condition: Condition,
    /// Computed select expressions by alias
    pub(crate) computed: IndexMap<String, String>,
}

/// What a rendered `SELECT` is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Projection {
    /// Rows to hydrate, with ordering and limit
    Rows,
    /// Inner statement of a `COUNT(*)`; one row per parent entity
    Count,
}

/// Query builder bound to a [`Database`]
pub struct Query<'db, D> {
    pub(crate) db: &'db Database<D>,
    pub(crate) metadata: Option<Arc<TableMetadata>>,
    pub(crate) state: QueryState,
}

impl<'db, D: DatabaseInterface> Query<'db, D> {
    pub fn new(db: &'db Database<D>) -> Self {
        Self {
            db,
            metadata: None,
            state: QueryState::default(),
        }
    }

    /// Bind the query to an entity, discarding anything accumulated so far
    pub fn entity(&mut self, metadata: Arc<TableMetadata>) -> &mut Self {
        self.metadata = Some(metadata);
        self.state = QueryState::default();
        self
    }

    /// Bind by registered class name
    pub fn entity_by_name(&mut self, class_name: &str) -> Result<&mut Self> {
        let metadata = self.db.registry().resolve(class_name)?;
        Ok(self.entity(metadata))
    }

    pub fn metadata(&self) -> Option<&Arc<TableMetadata>> {
        self.metadata.as_ref()
    }

    pub fn is_bound(&self) -> bool {
        self.metadata.is_some()
    }

    /// The current condition tree
    pub fn condition(&self) -> &Condition {
        &self.state.condition
    }

    pub fn joins(&self) -> impl Iterator<Item = &JoinDefinition> {
        self.state.joins.values()
    }

    pub(crate) fn bound(&self) -> Result<Arc<TableMetadata>> {
        self.metadata.clone().ok_or(OrmError::EntityNotBound)
    }

    /// Entity and canonical column for `column` or `Entity.column`, looked
    /// up on the bound entity and the entities joined so far
    fn resolve_target(&self, name: &str) -> Result<(Arc<TableMetadata>, String)> {
        let metadata = self.bound()?;
        if let Some((prefix, column)) = name.split_once('.') {
            let target = if prefix == metadata.class_name() || prefix == metadata.table_name() {
                Some(Arc::clone(&metadata))
            } else {
                self.state
                    .joins
                    .values()
                    .map(|j| &j.metadata)
                    .find(|m| prefix == m.class_name() || prefix == m.table_name())
                    .cloned()
            };
            if let Some(target) = target {
                let column = target.get_table_column_name(column)?.to_string();
                return Ok((target, column));
            }
        }
        let column = metadata.get_table_column_name(name)?.to_string();
        Ok((metadata, column))
    }

    fn resolve_qualified(&self, name: &str) -> Result<(String, String)> {
        let (target, column) = self.resolve_target(name)?;
        Ok((target.table_name().to_string(), column))
    }

    /// Field as stored in the condition tree: the bare column on the bound
    /// entity, `table.column` on a joined one
    fn condition_field(&self, name: &str) -> Result<(Arc<TableMetadata>, String, String)> {
        let metadata = self.bound()?;
        let (target, column) = self.resolve_target(name)?;
        let field = if target.table_name() == metadata.table_name() {
            column.clone()
        } else {
            format!("{}.{column}", target.table_name())
        };
        Ok((target, column, field))
    }

    /// Validate one argument, returning it with its field resolved
    fn checked_argument(&self, argument: &Argument) -> Result<Argument> {
        let relation = argument.relation();
        if relation == Relation::Own {
            return Err(OrmError::InvalidArgument(
                "raw conditions must go through filter_raw".to_string(),
            ));
        }
        let (target, column, field) = self.condition_field(argument.field())?;
        if matches!(relation, Relation::IsNull | Relation::NotNull) {
            return Ok(Argument::new(field, Value::Null, relation));
        }

        if argument.value().is_null() {
            return Err(OrmError::InvalidArgument(format!(
                "null value for {column}; use is_null() or not_null()"
            )));
        }
        if let Value::List(items) = argument.value() {
            if !matches!(relation, Relation::Equal | Relation::NotEqual) {
                return Err(OrmError::InvalidArgument(format!(
                    "relation {relation} does not accept a list value for column {column}"
                )));
            }
            if items.iter().any(Value::is_null) {
                return Err(OrmError::InvalidArgument(format!(
                    "null inside list value for {column}"
                )));
            }
        }
        target.column_spec(&column)?;
        Ok(Argument::new(field, argument.value().clone(), relation))
    }

    fn checked_condition(&self, condition: &Condition) -> Result<Condition> {
        let mut checked = Condition::new(condition.relation());
        for child in condition.children() {
            match child {
                ConditionNode::Argument(argument) => {
                    checked.add_argument(self.checked_argument(argument)?);
                }
                ConditionNode::Condition(nested) => {
                    checked.add_condition(self.checked_condition(nested)?);
                }
            }
        }
        Ok(checked)
    }

    /// Add a column of the bound entity to the selection
    ///
    /// Without any `select` call every column is selected. The primary field
    /// is always selected.
    pub fn select(&mut self, column: &str) -> Result<&mut Self> {
        let metadata = self.bound()?;
        let column = metadata.get_table_column_name(column)?.to_string();
        if !self.state.select.contains(&column) {
            self.state.select.push(column);
        }
        Ok(self)
    }

    /// Add `field <relation> value` to the top-level AND group
    ///
    /// `field` may name a joined entity's column as `Entity.column` once that
    /// entity is joined.
    ///
    /// # Errors
    ///
    /// A null value or a `IsNull`/`NotNull`/`Own` relation is an
    /// [`OrmError::InvalidArgument`]; use [`is_null`](Self::is_null),
    /// [`not_null`](Self::not_null) or [`filter_raw`](Self::filter_raw).
    pub fn filter(
        &mut self,
        field: &str,
        value: impl Into<Value>,
        relation: Relation,
    ) -> Result<&mut Self> {
        self.bound()?;
        if relation.is_unary() {
            return Err(OrmError::InvalidArgument(format!(
                "relation {relation:?} is not accepted by filter(); use is_null(), not_null() or filter_raw()"
            )));
        }
        let argument = self.checked_argument(&Argument::new(field, value, relation))?;
        self.state.condition.add_argument(argument);
        Ok(self)
    }

    pub fn filter_eq(&mut self, field: &str, value: impl Into<Value>) -> Result<&mut Self> {
        self.filter(field, value, Relation::Equal)
    }

    /// Add a nested condition tree, validating every argument in it
    pub fn filter_condition(&mut self, condition: Condition) -> Result<&mut Self> {
        self.bound()?;
        let checked = self.checked_condition(&condition)?;
        self.state.condition.add_condition(checked);
        Ok(self)
    }

    /// Add a raw SQL fragment, emitted verbatim
    pub fn filter_raw(&mut self, fragment: &str) -> Result<&mut Self> {
        self.bound()?;
        if fragment.trim().is_empty() {
            return Err(OrmError::InvalidArgument("empty raw condition".to_string()));
        }
        self.state.condition.add_argument(Argument::raw(fragment));
        Ok(self)
    }

    /// Filter by primary key; a list value selects several keys
    pub fn primary(&mut self, value: impl Into<Value>) -> Result<&mut Self> {
        let metadata = self.bound()?;
        self.filter(metadata.get_table_primary_field(), value, Relation::Equal)
    }

    pub fn is_null(&mut self, field: &str) -> Result<&mut Self> {
        self.unary(field, Relation::IsNull)
    }

    pub fn not_null(&mut self, field: &str) -> Result<&mut Self> {
        self.unary(field, Relation::NotNull)
    }

    fn unary(&mut self, field: &str, relation: Relation) -> Result<&mut Self> {
        let (_, _, field) = self.condition_field(field)?;
        self.state.condition.add(field, Value::Null, relation);
        Ok(self)
    }

    pub fn like(&mut self, field: &str, pattern: &str) -> Result<&mut Self> {
        self.filter(field, pattern, Relation::Like)
    }

    /// `LEFT JOIN` another entity on `bound.parent_column = joined.child_column`
    pub fn join(
        &mut self,
        metadata: Arc<TableMetadata>,
        parent_column: &str,
        child_column: &str,
    ) -> Result<&mut Self> {
        self.add_join(metadata, parent_column, child_column, JoinKind::Left)
    }

    pub fn left_join(
        &mut self,
        metadata: Arc<TableMetadata>,
        parent_column: &str,
        child_column: &str,
    ) -> Result<&mut Self> {
        self.add_join(metadata, parent_column, child_column, JoinKind::Left)
    }

    pub fn inner_join(
        &mut self,
        metadata: Arc<TableMetadata>,
        parent_column: &str,
        child_column: &str,
    ) -> Result<&mut Self> {
        self.add_join(metadata, parent_column, child_column, JoinKind::Inner)
    }

    fn add_join(
        &mut self,
        joined: Arc<TableMetadata>,
        parent_column: &str,
        child_column: &str,
        kind: JoinKind,
    ) -> Result<&mut Self> {
        let metadata = self.bound()?;
        let parent_column = metadata.get_table_column_name(parent_column)?.to_string();
        let child_column = joined.get_table_column_name(child_column)?.to_string();
        if joined.table_name() == metadata.table_name() {
            return Err(OrmError::InvalidArgument(format!(
                "cannot join table {} to itself",
                joined.table_name()
            )));
        }
        self.state.joins.insert(
            joined.class_name().to_string(),
            JoinDefinition {
                metadata: joined,
                parent_column,
                child_column,
                kind,
            },
        );
        Ok(self)
    }

    /// Group by a column, `column` or `Entity.column`
    pub fn group_by(&mut self, column: &str) -> Result<&mut Self> {
        let resolved = self.resolve_qualified(column)?;
        if !self.state.group.contains(&resolved) {
            self.state.group.push(resolved);
        }
        Ok(self)
    }

    /// Order by a column, `column` or `Entity.column`
    pub fn order_by(&mut self, column: &str, order: SortOrder) -> Result<&mut Self> {
        let (table, column) = self.resolve_qualified(column)?;
        self.state.order.push((table, column, order));
        Ok(self)
    }

    /// Order rows randomly, after any `order_by` columns
    pub fn random(&mut self) -> Result<&mut Self> {
        self.bound()?;
        self.state.random = true;
        Ok(self)
    }

    /// Select a computed expression as `alias`
    ///
    /// The expression is emitted verbatim. Hydrated records expose its value
    /// through [`Record::get_field`](crate::Record::get_field) under `alias`.
    pub fn add_field(&mut self, expression: &str, alias: &str) -> Result<&mut Self> {
        let metadata = self.bound()?;
        if expression.trim().is_empty() || alias.trim().is_empty() {
            return Err(OrmError::InvalidArgument(
                "computed field needs an expression and an alias".to_string(),
            ));
        }
        if metadata.has_column(alias) {
            return Err(OrmError::InvalidArgument(format!(
                "computed field alias {alias} shadows a column of {}",
                metadata.class_name()
            )));
        }
        self.state
            .computed
            .insert(alias.to_string(), expression.to_string());
        Ok(self)
    }

    /// Return `rows` rows starting at `offset`
    pub fn limit(&mut self, rows: u64, offset: u64) -> Result<&mut Self> {
        self.bound()?;
        self.state.limit = Some((rows, offset));
        Ok(self)
    }

    /// SQL the next [`find`](Self::find) would run
    pub fn sql(&self) -> Result<String> {
        let metadata = self.bound()?;
        self.render(&metadata, &self.state, Projection::Rows)
    }

    /// Render `state` into a `SELECT`
    ///
    /// With joins, [`Projection::Rows`] aliases every column `table.column`
    /// and [`Projection::Count`] selects only the distinct parent keys.
    /// Counting drops ordering and limit.
    pub(crate) fn render(
        &self,
        metadata: &TableMetadata,
        state: &QueryState,
        projection: Projection,
    ) -> Result<String> {
        let builder = self.db.builder();
        let table = metadata.table_name().to_string();
        let joined = !state.joins.is_empty();
        let rows = projection == Projection::Rows;

        let mut select = TableColumns::new();
        let own = if joined && !rows {
            vec![metadata.get_table_primary_field().to_string()]
        } else if state.select.is_empty() {
            metadata.columns().to_vec()
        } else {
            let primary = metadata.get_table_primary_field().to_string();
            let mut columns = vec![primary.clone()];
            columns.extend(state.select.iter().filter(|c| **c != primary).cloned());
            columns
        };
        select.insert(table.clone(), own);
        if rows {
            for join in state.joins.values() {
                select.insert(
                    join.metadata.table_name().to_string(),
                    join.metadata.columns().to_vec(),
                );
            }
        }

        let computed = if joined && !rows {
            Vec::new()
        } else {
            state
                .computed
                .iter()
                .map(|(alias, expression)| (expression.clone(), alias.clone()))
                .collect()
        };

        let condition = if joined {
            let tables: Vec<&TableMetadata> =
                state.joins.values().map(|j| j.metadata.as_ref()).collect();
            builder.build_joined_where_statement(metadata, &tables, &state.condition)?
        } else {
            builder.build_where_statement(metadata, &state.condition)?
        };

        let mut group = TableColumns::new();
        for (t, c) in &state.group {
            group.entry(t.clone()).or_default().push(c.clone());
        }

        let joins = state
            .joins
            .values()
            .map(|j| JoinClause {
                kind: j.kind,
                table: j.metadata.table_name().to_string(),
                parent_table: table.clone(),
                parent_column: j.parent_column.clone(),
                child_column: j.child_column.clone(),
            })
            .collect();

        let parts = SelectParts {
            select,
            aliased: joined && rows,
            distinct: joined && !rows,
            computed,
            from: vec![table.clone()],
            joins,
            condition,
            group,
            order: if rows { state.order.clone() } else { Vec::new() },
            random: rows && state.random,
            limit: if rows { state.limit } else { None },
        };
        Ok(builder.build_select_query(&parts))
    }
}
