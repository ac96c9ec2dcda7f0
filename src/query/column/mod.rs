//! Column type handling for query building.
//!
//! - `type_mapping`: classification of database type tags into rendering families

mod type_mapping;

pub use type_mapping::ColumnKind;
