use core::fmt;

/// A binary operator in an arithmetic expression.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    /// The addition operator `+`.
    Addition,
    /// The subtraction operator `-`.
    Subtraction,
    /// The multiplication operator `*`.
    Multiplication,
    /// The real division operator `/`.
    Division,
    /// The exponentiation operator `**`.
    Power,
}

impl BinaryOperator {
    /// All operators, in the order the sampler draws them from.
    pub const ALL: [BinaryOperator; 5] = [
        BinaryOperator::Addition,
        BinaryOperator::Subtraction,
        BinaryOperator::Multiplication,
        BinaryOperator::Division,
        BinaryOperator::Power,
    ];

    /// Returns the precedence of the operator.
    ///
    /// Unary negation sits at [`NEGATION_PRECEDENCE`], between the multiplicative operators and
    /// [`Power`](BinaryOperator::Power).
    pub fn precedence(&self) -> u16 {
        match self {
            BinaryOperator::Power => 110,
            BinaryOperator::Multiplication | BinaryOperator::Division => 90,
            BinaryOperator::Addition | BinaryOperator::Subtraction => 70,
        }
    }

    /// Returns `true` if the operator groups to the right, i.e., `a op b op c` is `a op (b op c)`.
    pub fn is_right_associative(&self) -> bool {
        matches!(self, BinaryOperator::Power)
    }

    /// Returns the source representation of the operator.
    pub fn to_str(&self) -> &'static str {
        match self {
            BinaryOperator::Addition => "+",
            BinaryOperator::Subtraction => "-",
            BinaryOperator::Multiplication => "*",
            BinaryOperator::Division => "/",
            BinaryOperator::Power => "**",
        }
    }

    /// Returns the representation used in emitted fixtures, where power is written as `^`.
    pub fn to_display_str(&self) -> &'static str {
        match self {
            BinaryOperator::Power => "^",
            other => other.to_str(),
        }
    }

    /// Returns a description of the operator.
    pub fn desc(&self) -> &'static str {
        match self {
            BinaryOperator::Addition => "Addition",
            BinaryOperator::Subtraction => "Subtraction",
            BinaryOperator::Multiplication => "Multiplication",
            BinaryOperator::Division => "Division",
            BinaryOperator::Power => "Power",
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

/// The precedence of unary negation. `-2**2` is `-(2**2)`, while `-2*3` is `(-2)*3`.
pub const NEGATION_PRECEDENCE: u16 = 100;

/// A parsed arithmetic expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// An integer literal. Literals are always non-negative; a leading `-` is a [`Neg`](Expr::Neg).
    Int(i128),
    /// Unary negation.
    Neg(Box<Expr>),
    /// A binary operation.
    BinaryOp {
        /// The left operand of the binary operation.
        left: Box<Expr>,
        /// The binary operator.
        op: BinaryOperator,
        /// The right operand of the binary operation.
        right: Box<Expr>,
    },
}

impl Expr {
    /// Builds a binary operation node.
    pub fn binary(left: Expr, op: BinaryOperator, right: Expr) -> Expr {
        Expr::BinaryOp {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    /// Formats this expression in a single line, with every operation parenthesized.
    ///
    /// # Examples
    ///
    /// ```
    /// # use randexpr::parse;
    /// let expr = parse("-2**2*3").unwrap();
    /// assert_eq!(expr.format_inline(), "((-(2 ** 2)) * 3)");
    /// ```
    pub fn format_inline(&self) -> String {
        let mut formatter = InlineFormatter;
        formatter.visit_expr(self)
    }
}

/// A visitor for traversing expression ASTs and returning a value.
pub trait ExprVisitor {
    type Output;

    /// Visits an integer literal.
    fn visit_int(&mut self, value: i128) -> Self::Output;
    /// Visits a negation.
    fn visit_neg(&mut self, operand: &Expr) -> Self::Output;
    /// Visits a binary operation.
    fn visit_binary_op(&mut self, left: &Expr, op: &BinaryOperator, right: &Expr) -> Self::Output;

    /// Visits an expression.
    fn visit_expr(&mut self, expr: &Expr) -> Self::Output {
        match expr {
            Expr::Int(value) => self.visit_int(*value),
            Expr::Neg(operand) => self.visit_neg(operand),
            Expr::BinaryOp { left, op, right } => self.visit_binary_op(left, op, right),
        }
    }
}

/// A formatter that formats expressions in a single line.
pub struct InlineFormatter;

impl ExprVisitor for InlineFormatter {
    type Output = String;

    fn visit_int(&mut self, value: i128) -> Self::Output {
        value.to_string()
    }

    fn visit_neg(&mut self, operand: &Expr) -> Self::Output {
        format!("(-{})", self.visit_expr(operand))
    }

    fn visit_binary_op(&mut self, left: &Expr, op: &BinaryOperator, right: &Expr) -> Self::Output {
        let left_str = self.visit_expr(left);
        let right_str = self.visit_expr(right);
        format!("({} {} {})", left_str, op, right_str)
    }
}
