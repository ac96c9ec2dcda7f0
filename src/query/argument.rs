//! Leaf filter predicates.

use crate::value::Value;
use std::fmt;

/// Comparison operator of an [`Argument`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Relation {
    #[default]
    Equal,
    NotEqual,
    Greater,
    Lower,
    GreaterEq,
    LowerEq,
    Like,
    IsNull,
    NotNull,
    /// The field is a raw SQL fragment emitted verbatim
    Own,
}

impl Relation {
    /// SQL operator text. Empty for [`Relation::Own`].
    pub fn as_sql(self) -> &'static str {
        match self {
            Relation::Equal => "=",
            Relation::NotEqual => "!=",
            Relation::Greater => ">",
            Relation::Lower => "<",
            Relation::GreaterEq => ">=",
            Relation::LowerEq => "<=",
            Relation::Like => "LIKE",
            Relation::IsNull => "IS NULL",
            Relation::NotNull => "IS NOT NULL",
            Relation::Own => "",
        }
    }

    /// Relations whose rendering ignores the argument value
    pub fn is_unary(self) -> bool {
        matches!(self, Relation::IsNull | Relation::NotNull | Relation::Own)
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// A single predicate: field, value and relation
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    field: String,
    value: Value,
    relation: Relation,
}

impl Argument {
    pub fn new(field: impl Into<String>, value: impl Into<Value>, relation: Relation) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            relation,
        }
    }

    /// Raw SQL fragment predicate
    pub fn raw(fragment: impl Into<String>) -> Self {
        Self {
            field: fragment.into(),
            value: Value::Null,
            relation: Relation::Own,
        }
    }

    /// Field name or alias, or the raw fragment for [`Relation::Own`]
    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn relation(&self) -> Relation {
        self.relation
    }
}
