use randexpr::parsing::{BinaryOperator, Expr, ExprVisitor};
use yansi::Paint;

/// Visitor that explains the structure of an expression
struct ExplainVisitor {
    depth: usize,
}

impl ExplainVisitor {
    fn new() -> Self {
        Self { depth: 2 }
    }

    fn indent(&self) -> String {
        "  ".repeat(self.depth)
    }

    fn with_depth<F>(&mut self, f: F) -> String
    where
        F: FnOnce(&mut Self) -> String,
    {
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }
}

impl ExprVisitor for ExplainVisitor {
    type Output = String;

    fn visit_int(&mut self, value: i128) -> Self::Output {
        format!(
            "{}Literal: {} ({})",
            self.indent(),
            value.to_string().magenta(),
            "Integer".blue()
        )
    }

    fn visit_neg(&mut self, operand: &Expr) -> Self::Output {
        let header = format!("{}Negation: {}", self.indent(), "-".magenta());
        let operand_str = self.with_depth(|v| v.visit_expr(operand));
        format!("{}\n{}", header, operand_str)
    }

    fn visit_binary_op(&mut self, left: &Expr, op: &BinaryOperator, right: &Expr) -> Self::Output {
        let header = format!(
            "{}Binary Operation: {} ({}, written {} in fixtures)",
            self.indent(),
            op.to_str().magenta(),
            op.desc().blue(),
            op.to_display_str().magenta()
        );
        let left_str = self.with_depth(|v| v.visit_expr(left));
        let right_str = self.with_depth(|v| v.visit_expr(right));

        format!("{}\n{}\n{}", header, left_str, right_str)
    }
}

/// Print explanation of the expression structure
pub fn explain_expr(expr: &Expr) {
    let mut visitor = ExplainVisitor::new();
    let explanation = visitor.visit_expr(expr);
    println!("{}", explanation);
}
