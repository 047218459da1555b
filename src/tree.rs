use core::fmt;

use crate::ast::BinaryOperator;

/// A node of a randomly sampled expression tree.
///
/// Unlike [`Expr`](crate::parsing::Expr), a `Node` remembers whether it should be written with
/// parentheses, since that choice is part of what gets sampled. Rendering is done through
/// [`Display`](fmt::Display) and writes no whitespace.
///
/// # Examples
///
/// ```
/// # use randexpr::{Node, parsing::BinaryOperator};
/// let sum = Node::binary(Node::Leaf(2), BinaryOperator::Addition, Node::Leaf(3), true);
/// let tree = Node::binary(sum, BinaryOperator::Multiplication, Node::Leaf(4), false);
///
/// assert_eq!(tree.render(), "(2+3)*4");
/// assert_eq!(tree.depth(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// An integer literal.
    Leaf(i64),
    /// Two sub-expressions combined by an operator.
    Binary {
        left: Box<Node>,
        op: BinaryOperator,
        right: Box<Node>,
        parenthesized: bool,
    },
}

impl Node {
    /// Builds a binary node.
    pub fn binary(left: Node, op: BinaryOperator, right: Node, parenthesized: bool) -> Node {
        Node::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
            parenthesized,
        }
    }

    /// Renders the tree as source text, with `**` for powers.
    pub fn render(&self) -> String {
        self.to_string()
    }

    /// Returns the number of binary nodes on the longest path from this node to a leaf.
    pub fn depth(&self) -> usize {
        match self {
            Node::Leaf(_) => 0,
            Node::Binary { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }

    /// Returns all leaf values, left to right.
    pub fn leaves(&self) -> Vec<i64> {
        let mut values = Vec::new();
        self.collect_leaves(&mut values);
        values
    }

    fn collect_leaves(&self, values: &mut Vec<i64>) {
        match self {
            Node::Leaf(value) => values.push(*value),
            Node::Binary { left, right, .. } => {
                left.collect_leaves(values);
                right.collect_leaves(values);
            }
        }
    }

    /// Counts the occurrences of `op` in the tree.
    pub fn count_operator(&self, op: BinaryOperator) -> usize {
        match self {
            Node::Leaf(_) => 0,
            Node::Binary {
                left,
                op: own,
                right,
                ..
            } => usize::from(*own == op) + left.count_operator(op) + right.count_operator(op),
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Leaf(value) => write!(f, "{}", value),
            Node::Binary {
                left,
                op,
                right,
                parenthesized,
            } => {
                if *parenthesized {
                    write!(f, "({}{}{})", left, op, right)
                } else {
                    write!(f, "{}{}{}", left, op, right)
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use BinaryOperator::*;

    #[test]
    fn test_render_leaves() {
        assert_eq!(Node::Leaf(0).render(), "0");
        assert_eq!(Node::Leaf(-99).render(), "-99");
        assert_eq!(Node::Leaf(7).render(), "7");
    }

    #[test]
    fn test_render_operators() {
        let cases = [
            (Addition, "3+-4"),
            (Subtraction, "3--4"),
            (Multiplication, "3*-4"),
            (Division, "3/-4"),
            (Power, "3**-4"),
        ];

        for (op, expected) in cases {
            let node = Node::binary(Node::Leaf(3), op, Node::Leaf(-4), false);
            assert_eq!(node.render(), expected);
        }
    }

    #[test]
    fn test_render_nested_parentheses() {
        let inner = Node::binary(Node::Leaf(-1), Power, Node::Leaf(2), true);
        let tree = Node::binary(Node::Leaf(5), Subtraction, inner, true);

        assert_eq!(tree.render(), "(5-(-1**2))");
        assert_eq!(tree.render(), tree.render());
        assert_eq!(tree.depth(), 2);
        assert_eq!(tree.leaves(), vec![5, -1, 2]);
        assert_eq!(tree.count_operator(Power), 1);
        assert_eq!(tree.count_operator(Division), 0);
    }
}
