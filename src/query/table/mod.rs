//! Table-level schema metadata.

pub mod metadata;

pub use metadata::{ColumnSpec, TableMetadata, TableMetadataBuilder};
