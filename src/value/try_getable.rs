//! `TryGetable` for safe, error-aware value extraction.
//!
//! Builds on [`ValueType`] and distinguishes a null value from a type
//! mismatch, which `Option` alone cannot express.

use crate::value::{Value, ValueType};

/// Error type for value extraction failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueExtractionError {
    /// The value is null
    NullValue,
    /// The value cannot be read as the requested type
    TypeMismatch { expected: String, actual: String },
}

impl std::fmt::Display for ValueExtractionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueExtractionError::NullValue => write!(f, "Value is null"),
            ValueExtractionError::TypeMismatch { expected, actual } => {
                write!(f, "Type mismatch: expected {}, got {}", expected, actual)
            }
        }
    }
}

impl std::error::Error for ValueExtractionError {}

/// Trait for safe value extraction with error handling
///
/// ```rust
/// use rowfold::{TryGetable, Value, ValueExtractionError};
///
/// assert_eq!(i32::try_get(&Value::Int(42)), Ok(42));
/// assert_eq!(i32::try_get(&Value::Null), Err(ValueExtractionError::NullValue));
/// assert_eq!(i32::try_get_opt(&Value::Null), Ok(None));
/// ```
pub trait TryGetable: ValueType {
    /// Extract a non-null value of this type
    fn try_get(value: &Value) -> Result<Self, ValueExtractionError> {
        if value.is_null() {
            return Err(ValueExtractionError::NullValue);
        }
        Self::from_value(value).ok_or_else(|| ValueExtractionError::TypeMismatch {
            expected: Self::type_name().to_string(),
            actual: value.type_name().to_string(),
        })
    }

    /// Extract a value, mapping null to `None`
    fn try_get_opt(value: &Value) -> Result<Option<Self>, ValueExtractionError> {
        match Self::try_get(value) {
            Ok(v) => Ok(Some(v)),
            Err(ValueExtractionError::NullValue) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

impl<T: ValueType> TryGetable for T {}
