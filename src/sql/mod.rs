//! SQL generation: dialects, literal rendering and the statement builder.

pub mod builder;
pub mod dialect;
mod value;

pub use builder::{JoinClause, JoinKind, SelectParts, SortOrder, SqlBuilder, TableColumns};
pub use dialect::Dialect;
