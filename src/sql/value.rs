//! Type-aware literal rendering.
//!
//! The column type decides the literal form: numeric columns render bare,
//! everything else renders as a quoted string. Bare output is only ever
//! produced from a value that reads as a number.

use crate::error::{OrmError, Result};
use crate::query::argument::Relation;
use crate::query::column::ColumnKind;
use crate::query::table::ColumnSpec;
use crate::sql::dialect::Dialect;
use crate::value::Value;

/// What to do with a `NULL` for a non-nullable column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NullPolicy {
    /// Render the column default, failing if there is none
    Fallback,
    /// Always fail
    Reject,
}

/// Render a scalar or null value for `column`
pub(crate) fn render_value(
    dialect: Dialect,
    value: &Value,
    column: &ColumnSpec<'_>,
    relation: Relation,
    policy: NullPolicy,
) -> Result<String> {
    if value.is_null() {
        return render_null(dialect, column, policy);
    }
    render_scalar(dialect, value, column, relation)
}

/// Render a non-null scalar value for `column`
pub(crate) fn render_scalar(
    dialect: Dialect,
    value: &Value,
    column: &ColumnSpec<'_>,
    relation: Relation,
) -> Result<String> {
    if value.is_list() {
        return Err(OrmError::InvalidArgument(format!(
            "list value given where a single value is expected for column {}",
            column.name
        )));
    }

    match column.kind {
        // LIKE patterns are text even against numeric columns
        ColumnKind::Numeric if relation != Relation::Like => {
            value.numeric_text().ok_or_else(|| OrmError::InvalidValue {
                column: column.name.to_string(),
                value: value.key_text(),
                expected: column.type_tag.to_string(),
            })
        }
        _ => value
            .as_text()
            .map(|text| dialect.quote_string(&text))
            .ok_or_else(|| OrmError::InvalidValue {
                column: column.name.to_string(),
                value: value.key_text(),
                expected: column.type_tag.to_string(),
            }),
    }
}

fn render_null(dialect: Dialect, column: &ColumnSpec<'_>, policy: NullPolicy) -> Result<String> {
    if column.nullable {
        return Ok("NULL".to_string());
    }

    let constraint = || OrmError::NullConstraint {
        column: column.name.to_string(),
        table: column.table.to_string(),
    };

    match (policy, column.default) {
        (NullPolicy::Fallback, Some(default)) if !default.is_null() => {
            render_scalar(dialect, default, column, Relation::Equal)
        }
        _ => Err(constraint()),
    }
}
