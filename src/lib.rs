//! # rowfold
//!
//! Condition-tree SQL builder and join-aware entity hydration over a
//! pluggable relational driver.
//!
//! A [`Query`] is bound to an entity's [`TableMetadata`], accumulates
//! filters, joins, grouping, ordering and limits, and compiles them into SQL
//! through the [`SqlBuilder`]. The [`Database`] sends the SQL to a
//! [`DatabaseInterface`] driver and folds the rows back into [`Record`]s,
//! collecting joined children under their parent by primary key.
//!
//! ```rust
//! use std::sync::Arc;
//! use rowfold::{row, Database, MockDriver, TableMetadata};
//!
//! let posts = Arc::new(
//!     TableMetadata::builder("posts")
//!         .class_name("Post")
//!         .primary_field("id")
//!         .column("id", "int")
//!         .column("title", "varchar(128)")
//!         .build()?,
//! );
//! let comments = Arc::new(
//!     TableMetadata::builder("comments")
//!         .class_name("Comment")
//!         .primary_field("comment_id")
//!         .column("comment_id", "int")
//!         .column("post_id", "int")
//!         .build()?,
//! );
//!
//! let driver = MockDriver::new().append_query_results(vec![vec![
//!     row! { "id" => 1, "title" => "hello", "comment_id" => 10, "post_id" => 1 },
//!     row! { "id" => 1, "title" => "hello", "comment_id" => 11, "post_id" => 1 },
//! ]]);
//! let db = Database::new(driver);
//!
//! let mut query = db.query();
//! query.entity(posts).join(comments, "id", "post_id")?;
//! let found = query.find()?;
//!
//! assert_eq!(found.len(), 1);
//! assert_eq!(found[0].joined("Comment").map(|c| c.len()), Some(2));
//! # Ok::<(), rowfold::OrmError>(())
//! ```

pub mod config;
pub mod database;
pub mod error;
pub mod executor;
mod macros;
pub mod metrics;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod query;
pub mod record;
pub mod registry;
pub mod sql;
pub mod value;

pub use config::OrmConfig;
pub use database::{Database, RecordMap};
pub use error::{OrmError, Result};
pub use executor::DatabaseInterface;
pub use metrics::{QueryStats, QueryStatsSnapshot};
#[cfg(any(test, feature = "mock"))]
pub use mock::MockDriver;
pub use query::{
    Argument, ColumnKind, ColumnSpec, Condition, ConditionNode, JoinDefinition, LogicalOperator,
    Query, Relation, TableMetadata, TableMetadataBuilder,
};
pub use record::{FromRecord, JoinedRecords, Record};
pub use registry::{EntityRegistry, HydrationHook};
pub use sql::{Dialect, JoinClause, JoinKind, SelectParts, SortOrder, SqlBuilder, TableColumns};
pub use value::{Row, TryGetable, Value, ValueExtractionError, ValueType};
