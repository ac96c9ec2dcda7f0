//! Helper macros.

/// Build a [`Row`](crate::Row) from `column => value` pairs
///
/// ```rust
/// use rowfold::{row, Value};
///
/// let row = row! { "id" => 1, "name" => "a", "deleted" => Value::Null };
/// assert_eq!(row.len(), 3);
/// assert_eq!(row["id"], Value::Int(1));
/// ```
#[macro_export]
macro_rules! row {
    () => {
        $crate::Row::new()
    };
    ($($column:expr => $value:expr),+ $(,)?) => {{
        let mut row = $crate::Row::new();
        $(
            row.insert(::std::string::String::from($column), $crate::Value::from($value));
        )+
        row
    }};
}
