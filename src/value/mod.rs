//! Value type system for rowfold
//!
//! - **`Value`** / **`Row`** - cell values and result rows exchanged with the driver
//! - **`ValueType`** - reads Rust types back out of a `Value`
//! - **`TryGetable`** - the same with errors that tell null and mismatch apart

pub mod types;
pub mod try_getable;

pub use types::{Row, Value, ValueType, DATE_FORMAT, DATETIME_FORMAT};
pub use try_getable::{TryGetable, ValueExtractionError};
