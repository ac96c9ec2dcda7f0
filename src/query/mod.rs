//! Query building and execution.
//!
//! - **Column**: column type classification (`ColumnKind`)
//! - **Table**: per-entity schema metadata (`TableMetadata`)
//! - **Argument / Condition**: the filter tree
//! - **Select**: the fluent `Query` builder
//! - **Execution**: `find`, `first`, `count` and `fields` on `Query`

pub mod argument;
pub mod column;
pub mod condition;
pub mod execution;
pub mod select;
pub mod table;

pub use argument::{Argument, Relation};
pub use column::ColumnKind;
pub use condition::{Condition, ConditionNode, LogicalOperator};
pub use select::{JoinDefinition, Query};
pub use table::{ColumnSpec, TableMetadata, TableMetadataBuilder};
