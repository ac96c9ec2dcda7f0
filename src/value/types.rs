//! `Value` and `Row`: the data exchanged with the driver collaborator.
//!
//! A `Value` is what a condition argument carries and what a result row cell
//! holds: a scalar, a list of scalars (for `IN` conditions) or null.
//!
//! ```rust
//! use rowfold::Value;
//!
//! assert_eq!(Value::from(11), Value::Int(11));
//! assert_eq!(Value::from("x"), Value::String("x".to_string()));
//! assert_eq!(Value::from(None::<i32>), Value::Null);
//! assert_eq!(Value::from(vec![1, 2]), Value::List(vec![Value::Int(1), Value::Int(2)]));
//! ```

use chrono::{NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use rust_decimal::Decimal;

/// Format used for `DATE` literals
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// Format used for `DATETIME` / `TIMESTAMP` literals
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One result row: column name to value, in the order the driver returned them
pub type Row = IndexMap<String, Value>;

/// A database value
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// SQL `NULL`
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Decimal(Decimal),
    String(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    /// A sequence of scalars, rendered as `IN (...)` in conditions
    List(Vec<Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Value::List(_))
    }

    /// Variant name, used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Bool(_) => "Bool",
            Value::Int(_) => "Int",
            Value::Float(_) => "Float",
            Value::Decimal(_) => "Decimal",
            Value::String(_) => "String",
            Value::Date(_) => "Date",
            Value::DateTime(_) => "DateTime",
            Value::List(_) => "List",
        }
    }

    /// Unquoted text of a scalar value. `None` for null and lists.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Value::Null | Value::List(_) => None,
            Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
            Value::Int(i) => Some(i.to_string()),
            Value::Float(f) => Some(f.to_string()),
            Value::Decimal(d) => Some(d.to_string()),
            Value::String(s) => Some(s.clone()),
            Value::Date(d) => Some(d.format(DATE_FORMAT).to_string()),
            Value::DateTime(dt) => Some(dt.format(DATETIME_FORMAT).to_string()),
        }
    }

    /// Text of this value when used as a bare numeric literal.
    ///
    /// Strings are accepted only when they parse as an integer or decimal, and
    /// the normalized number is returned rather than the input text, so the
    /// result never carries anything but a number.
    pub fn numeric_text(&self) -> Option<String> {
        match self {
            Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
            Value::Int(i) => Some(i.to_string()),
            Value::Float(f) if f.is_finite() => Some(f.to_string()),
            Value::Decimal(d) => Some(d.to_string()),
            Value::String(s) => {
                let trimmed = s.trim();
                if let Ok(i) = trimmed.parse::<i64>() {
                    Some(i.to_string())
                } else {
                    trimmed.parse::<Decimal>().ok().map(|d| d.to_string())
                }
            }
            _ => None,
        }
    }

    /// Canonical key text for primary-key keyed maps
    ///
    /// Rows from a driver may carry `1` as `Int(1)` or `String("1")`; both map
    /// to the key `"1"`.
    pub fn key_text(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::List(items) => items
                .iter()
                .map(Value::key_text)
                .collect::<Vec<_>>()
                .join("|"),
            other => other.as_text().unwrap_or_default(),
        }
    }

    /// Convert to a JSON value
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::List(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            other => other
                .as_text()
                .map(serde_json::Value::String)
                .unwrap_or(serde_json::Value::Null),
        }
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::Int(i64::from(v))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        match i64::try_from(v) {
            Ok(i) => Value::Int(i),
            Err(_) => Value::Decimal(Decimal::from(v)),
        }
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::String(v.clone())
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Value::Decimal(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::DateTime(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Value::from(u)
                } else {
                    n.as_f64().map(Value::Float).unwrap_or(Value::Null)
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            other => Value::String(other.to_string()),
        }
    }
}

/// Trait for reading Rust types back out of a [`Value`].
///
/// Drivers frequently hand numbers and dates back as strings, so the
/// numeric and date implementations also accept parseable `String` values.
pub trait ValueType: Sized {
    /// Convert a value into this type, if possible. Null yields `None`.
    fn from_value(value: &Value) -> Option<Self>;

    /// Name of the target type, used in error messages
    fn type_name() -> &'static str;
}

impl ValueType for i64 {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(v) => Some(*v),
            Value::Bool(b) => Some(i64::from(*b)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn type_name() -> &'static str {
        "i64"
    }
}

macro_rules! impl_value_type_narrow_int {
    ($($t:ty),*) => {
        $(
            impl ValueType for $t {
                fn from_value(value: &Value) -> Option<Self> {
                    i64::from_value(value).and_then(|v| <$t>::try_from(v).ok())
                }

                fn type_name() -> &'static str {
                    stringify!($t)
                }
            }
        )*
    };
}

impl_value_type_narrow_int!(i8, i16, i32, u8, u16, u32);

impl ValueType for u64 {
    fn from_value(value: &Value) -> Option<Self> {
        use rust_decimal::prelude::ToPrimitive;
        match value {
            Value::Int(v) => u64::try_from(*v).ok(),
            Value::Bool(b) => Some(u64::from(*b)),
            Value::Decimal(d) if d.fract().is_zero() => d.to_u64(),
            Value::Float(f) if f.is_finite() && f.fract() == 0.0 && *f >= 0.0 => Some(*f as u64),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn type_name() -> &'static str {
        "u64"
    }
}

impl ValueType for f64 {
    fn from_value(value: &Value) -> Option<Self> {
        use rust_decimal::prelude::ToPrimitive;
        match value {
            Value::Float(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            Value::Decimal(d) => d.to_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn type_name() -> &'static str {
        "f64"
    }
}

impl ValueType for bool {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(*b),
            Value::Int(0) => Some(false),
            Value::Int(1) => Some(true),
            Value::String(s) => match s.trim() {
                "0" | "false" => Some(false),
                "1" | "true" => Some(true),
                _ => None,
            },
            _ => None,
        }
    }

    fn type_name() -> &'static str {
        "bool"
    }
}

impl ValueType for String {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_text()
    }

    fn type_name() -> &'static str {
        "String"
    }
}

impl ValueType for Decimal {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Decimal(d) => Some(*d),
            Value::Int(i) => Some(Decimal::from(*i)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn type_name() -> &'static str {
        "Decimal"
    }
}

impl ValueType for NaiveDate {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Date(d) => Some(*d),
            Value::DateTime(dt) => Some(dt.date()),
            Value::String(s) => NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).ok(),
            _ => None,
        }
    }

    fn type_name() -> &'static str {
        "NaiveDate"
    }
}

impl ValueType for NaiveDateTime {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::DateTime(dt) => Some(*dt),
            Value::Date(d) => d.and_hms_opt(0, 0, 0),
            Value::String(s) => NaiveDateTime::parse_from_str(s.trim(), DATETIME_FORMAT).ok(),
            _ => None,
        }
    }

    fn type_name() -> &'static str {
        "NaiveDateTime"
    }
}
