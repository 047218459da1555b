use super::ast::{BinaryOperator, Expr, NEGATION_PRECEDENCE};

use chumsky::{
    pratt::{Associativity, infix, left, prefix, right},
    prelude::*,
};

type ParserInput<'a> = &'a str;
type ParserError<'a> = extra::Err<Rich<'a, char>>;

/// Parse an arithmetic expression from a string input.
///
/// # Examples
///
/// ```
/// # use randexpr::{parse, parsing::*};
/// assert_eq!(parse("(2+3)*4"), Ok(Expr::binary(
///     Expr::binary(Expr::Int(2), BinaryOperator::Addition, Expr::Int(3)),
///     BinaryOperator::Multiplication,
///     Expr::Int(4),
/// )));
///
/// assert!(parse("3--5").is_ok());
/// assert!(parse("2**-1").is_ok());
/// assert!(parse("1+").is_err());
/// assert!(parse("2^3").is_err());
/// ```
pub fn parse(input: &str) -> Result<Expr, Vec<Rich<'_, char>>> {
    parser().parse(input).into_result()
}

/// Main parser for arithmetic expressions.
pub fn parser<'a>() -> impl Parser<'a, ParserInput<'a>, Expr, ParserError<'a>> + Clone {
    expression_parser()
}

/// Creates a parser for unsigned integer literals with overflow handling.
fn integer_parser<'a>() -> impl Parser<'a, ParserInput<'a>, i128, ParserError<'a>> + Clone {
    text::int(10)
        .validate(|num: &str, extra, emitter| match num.parse::<i128>() {
            Ok(val) => val,
            Err(e) => {
                emitter.emit(Rich::custom(
                    extra.span(),
                    format!("illegal integer literal: {}", e),
                ));
                0
            }
        })
        .padded()
        .labelled("integer")
}

/// Creates a parser for arithmetic expressions.
///
/// From loosest to tightest: `+ -`, `* /`, unary `-`, then `**`, which groups to the right and
/// accepts a negated right operand (`2**-1`).
fn expression_parser<'a>() -> impl Parser<'a, ParserInput<'a>, Expr, ParserError<'a>> + Clone {
    recursive(|expr| {
        let integer = integer_parser();

        // Atom: integer or parenthesized expression
        let atom = choice((
            integer.map(Expr::Int),
            expr.delimited_by(just('(').padded(), just(')').padded()),
        ))
        .padded();

        let binary_op_to_pratt = |op: BinaryOperator| {
            let accos: fn(u16) -> Associativity = if op.is_right_associative() {
                right
            } else {
                left
            };
            infix(
                accos(op.precedence()),
                just(op.to_str()).padded(),
                move |left: Expr, _, right: Expr, _| Expr::binary(left, op, right),
            )
        };

        // `**` comes first so that `*` never claims half of it.
        atom.pratt((
            binary_op_to_pratt(BinaryOperator::Power),
            prefix(
                NEGATION_PRECEDENCE,
                just('-').padded(),
                |_, operand: Expr, _| Expr::Neg(Box::new(operand)),
            ),
            binary_op_to_pratt(BinaryOperator::Multiplication),
            binary_op_to_pratt(BinaryOperator::Division),
            binary_op_to_pratt(BinaryOperator::Addition),
            binary_op_to_pratt(BinaryOperator::Subtraction),
        ))
        .padded()
    })
    .then_ignore(end())
}

#[cfg(test)]
mod test {
    use super::*;

    fn int(n: i128) -> Expr {
        Expr::Int(n)
    }

    fn neg(e: Expr) -> Expr {
        Expr::Neg(Box::new(e))
    }

    #[test]
    fn test_integer_parsing() {
        let cases = vec![
            ("42", Ok(42)),
            ("0", Ok(0)),
            (
                "170141183460469231731687303715884105727",
                Ok(i128::MAX),
            ),
            ("170141183460469231731687303715884105728", Err(())), // Overflow
        ];

        for (input, expected) in cases {
            let result = integer_parser().parse(input).into_result();
            match (&result, expected) {
                (Ok(val), Ok(exp)) => assert_eq!(*val, exp, "Input: {}", input),
                (Err(_), Err(())) => {} // Expected error
                _ => panic!("Unexpected result for input {}: {:?}", input, result),
            }
        }
    }

    #[test]
    fn test_negation_binds_looser_than_power() {
        use BinaryOperator::*;

        assert_eq!(parse("-2**2"), Ok(neg(Expr::binary(int(2), Power, int(2)))));
        assert_eq!(
            parse("-2*3"),
            Ok(Expr::binary(neg(int(2)), Multiplication, int(3)))
        );
        assert_eq!(parse("2**-1"), Ok(Expr::binary(int(2), Power, neg(int(1)))));
        assert_eq!(
            parse("2**-1*4"),
            Ok(Expr::binary(
                Expr::binary(int(2), Power, neg(int(1))),
                Multiplication,
                int(4)
            ))
        );
    }

    #[test]
    fn test_associativity() {
        use BinaryOperator::*;

        assert_eq!(
            parse("2**3**2"),
            Ok(Expr::binary(int(2), Power, Expr::binary(int(3), Power, int(2))))
        );
        assert_eq!(
            parse("8/4/2"),
            Ok(Expr::binary(Expr::binary(int(8), Division, int(4)), Division, int(2)))
        );
        assert_eq!(
            parse("1-2+3"),
            Ok(Expr::binary(Expr::binary(int(1), Subtraction, int(2)), Addition, int(3)))
        );
    }

    #[test]
    fn test_grouping_follows_operator_associativity() {
        for op in BinaryOperator::ALL {
            let text = format!("1{0}2{0}3", op.to_str());
            let expected = if op.is_right_associative() {
                Expr::binary(int(1), op, Expr::binary(int(2), op, int(3)))
            } else {
                Expr::binary(Expr::binary(int(1), op, int(2)), op, int(3))
            };

            assert_eq!(parse(&text), Ok(expected), "operator: {}", op);
        }
    }

    #[test]
    fn test_double_minus() {
        use BinaryOperator::*;

        assert_eq!(parse("3--5"), Ok(Expr::binary(int(3), Subtraction, neg(int(5)))));
        assert_eq!(parse("-3*-5"), Ok(Expr::binary(neg(int(3)), Multiplication, neg(int(5)))));
    }

    #[test]
    fn test_rejects_malformed_input() {
        for input in ["", "1+", "(1", "1)", "2^3", "1 2", "*3"] {
            assert!(parse(input).is_err(), "Input: {:?}", input);
        }
    }
}
