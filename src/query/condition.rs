//! Boolean condition trees.
//!
//! A [`Condition`] joins its children with one logical operator. Children are
//! either leaf [`Argument`]s or nested conditions, so arbitrary AND/OR nesting
//! can be expressed:
//!
//! ```rust
//! use rowfold::{Condition, Relation};
//!
//! let mut either = Condition::any();
//! either
//!     .add("col2", vec!["x", "y"], Relation::Equal)
//!     .add("col3", "z", Relation::NotEqual);
//!
//! let mut root = Condition::all();
//! root.add("col", 11, Relation::Equal).add_condition(either);
//!
//! assert_eq!(root.len(), 2);
//! assert_eq!(root.argument_count(), 3);
//! ```
//!
//! No schema validation happens here; field names are resolved when the tree
//! is rendered or handed to a query.

use crate::query::argument::{Argument, Relation};
use crate::value::Value;

/// Operator joining the children of a [`Condition`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LogicalOperator {
    #[default]
    And,
    Or,
}

impl LogicalOperator {
    pub fn as_sql(self) -> &'static str {
        match self {
            LogicalOperator::And => "AND",
            LogicalOperator::Or => "OR",
        }
    }
}

/// Child of a condition
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionNode {
    Argument(Argument),
    Condition(Condition),
}

/// AND/OR group of arguments and nested conditions
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Condition {
    relation: LogicalOperator,
    children: Vec<ConditionNode>,
}

impl Condition {
    pub fn new(relation: LogicalOperator) -> Self {
        Self {
            relation,
            children: Vec::new(),
        }
    }

    /// Empty AND group
    pub fn all() -> Self {
        Self::new(LogicalOperator::And)
    }

    /// Empty OR group
    pub fn any() -> Self {
        Self::new(LogicalOperator::Or)
    }

    pub fn relation(&self) -> LogicalOperator {
        self.relation
    }

    /// Append an argument built from its parts
    pub fn add(
        &mut self,
        field: impl Into<String>,
        value: impl Into<Value>,
        relation: Relation,
    ) -> &mut Self {
        self.add_argument(Argument::new(field, value, relation))
    }

    pub fn add_argument(&mut self, argument: Argument) -> &mut Self {
        self.children.push(ConditionNode::Argument(argument));
        self
    }

    pub fn add_condition(&mut self, condition: Condition) -> &mut Self {
        self.children.push(ConditionNode::Condition(condition));
        self
    }

    /// Direct children, in insertion order
    pub fn children(&self) -> impl Iterator<Item = &ConditionNode> {
        self.children.iter()
    }

    /// Number of direct children
    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of leaf arguments in the whole tree
    pub fn argument_count(&self) -> usize {
        self.children
            .iter()
            .map(|child| match child {
                ConditionNode::Argument(_) => 1,
                ConditionNode::Condition(c) => c.argument_count(),
            })
            .sum()
    }

    /// Depth-first walk over every leaf argument
    pub fn arguments(&self) -> Vec<&Argument> {
        let mut out = Vec::new();
        self.collect_arguments(&mut out);
        out
    }

    fn collect_arguments<'a>(&'a self, out: &mut Vec<&'a Argument>) {
        for child in &self.children {
            match child {
                ConditionNode::Argument(a) => out.push(a),
                ConditionNode::Condition(c) => c.collect_arguments(out),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_empty_and() {
        let condition = Condition::default();
        assert!(condition.is_empty());
        assert_eq!(condition.relation(), LogicalOperator::And);
        assert_eq!(condition.argument_count(), 0);
    }

    #[test]
    fn test_nested_counts() {
        let mut inner = Condition::any();
        inner.add("b", 1, Relation::Equal).add("c", 2, Relation::Equal);
        let mut outer = Condition::all();
        outer
            .add("a", 0, Relation::Greater)
            .add_condition(inner)
            .add_condition(Condition::any());

        assert_eq!(outer.len(), 3);
        assert_eq!(outer.argument_count(), 3);
        let fields: Vec<_> = outer.arguments().iter().map(|a| a.field()).collect();
        assert_eq!(fields, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_children_preserve_order() {
        let mut condition = Condition::all();
        condition.add("x", 1, Relation::Equal).add_argument(Argument::raw("1 = 1"));
        let kinds: Vec<_> = condition
            .children()
            .map(|c| matches!(c, ConditionNode::Argument(_)))
            .collect();
        assert_eq!(kinds, vec![true, true]);
        assert_eq!(LogicalOperator::Or.as_sql(), "OR");
    }
}
