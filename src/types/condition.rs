use std::fmt;

use super::assertion::Assertion;

/// How a condition element relates to the accumulated result so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    And,
    Or,
}

impl Relation {
    /// The script keyword for this relation.
    #[must_use]
    pub fn keyword(self) -> &'static str {
        match self {
            Relation::And => "and",
            Relation::Or => "or",
        }
    }
}

/// A leaf assertion or a parenthesized sub-tree.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionNode {
    Assertion(Assertion),
    Group(ConditionTree),
}

impl From<Assertion> for ConditionNode {
    fn from(a: Assertion) -> Self {
        ConditionNode::Assertion(a)
    }
}

impl From<ConditionTree> for ConditionNode {
    fn from(t: ConditionTree) -> Self {
        ConditionNode::Group(t)
    }
}

/// One operand of a condition, tagged with the relation that joins it to
/// everything evaluated before it.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionElement {
    relation: Relation,
    node: ConditionNode,
}

impl ConditionElement {
    #[must_use]
    pub fn relation(&self) -> Relation {
        self.relation
    }

    #[must_use]
    pub fn node(&self) -> &ConditionNode {
        &self.node
    }
}

/// An ordered sequence of assertions and nested groups.
///
/// There is no operator precedence: elements combine strictly left to right,
/// each under its own [`Relation`]. Grouping is the only way to override
/// evaluation order. The first element's relation fixes the accumulator's
/// starting value (true under `and`, false under `or`), so a single-element
/// tree evaluates to that element alone.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConditionTree {
    elements: Vec<ConditionElement>,
}

impl ConditionTree {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an operand joined with `and`.
    #[must_use]
    pub fn and(self, node: impl Into<ConditionNode>) -> Self {
        self.push(Relation::And, node.into())
    }

    /// Append an operand joined with `or`.
    #[must_use]
    pub fn or(self, node: impl Into<ConditionNode>) -> Self {
        self.push(Relation::Or, node.into())
    }

    /// The opening operand always records `or`, so a tree's rendering and
    /// its reparse agree regardless of which method opened it.
    fn push(mut self, relation: Relation, node: ConditionNode) -> Self {
        let relation = if self.elements.is_empty() {
            Relation::Or
        } else {
            relation
        };
        self.elements.push(ConditionElement { relation, node });
        self
    }

    #[must_use]
    pub fn elements(&self) -> &[ConditionElement] {
        &self.elements
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Evaluate the tree left to right, resolving each assertion through the
    /// given closure. An empty tree is vacuously true.
    ///
    /// Operands whose outcome cannot change the accumulator are skipped
    /// without resolution: once the accumulator is false, `and` operands are
    /// skipped; once it is true, `or` operands are.
    pub fn try_check<E>(
        &self,
        resolve: &mut dyn FnMut(&Assertion) -> Result<bool, E>,
    ) -> Result<bool, E> {
        let Some(first) = self.elements.first() else {
            return Ok(true);
        };
        let mut acc = match first.relation {
            Relation::And => true,
            Relation::Or => false,
        };
        for element in &self.elements {
            let skip = match element.relation {
                Relation::And => !acc,
                Relation::Or => acc,
            };
            if skip {
                continue;
            }
            let outcome = match &element.node {
                ConditionNode::Assertion(a) => resolve(a)?,
                ConditionNode::Group(tree) => tree.try_check(resolve)?,
            };
            acc = match element.relation {
                Relation::And => acc && outcome,
                Relation::Or => acc || outcome,
            };
        }
        Ok(acc)
    }
}

impl fmt::Display for ConditionTree {
    /// Script-syntax rendering. The joining keyword printed between two
    /// operands is the second operand's relation.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, element) in self.elements.iter().enumerate() {
            if i > 0 {
                write!(f, " {} ", element.relation.keyword())?;
            }
            match &element.node {
                ConditionNode::Assertion(a) => write!(f, "{a}")?,
                ConditionNode::Group(tree) => write!(f, "({tree})")?,
            }
        }
        Ok(())
    }
}
