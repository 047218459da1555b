use std::fmt;

use log::trace;
use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Signed, ToPrimitive, Zero};
use thiserror::Error;

use crate::{
    ast::{BinaryOperator, Expr, ExprVisitor},
    parser::parse,
};

/// The largest integer, in bits, that evaluation keeps exact. Larger results are
/// [`EvalError::Overflow`].
pub const MAX_INT_BITS: u64 = 1 << 20;

/// Bits in the significand of an `f64`, counting the implicit leading one.
const F64_SIGNIFICAND_BITS: i64 = 53;

/// The result of evaluating an [arithmetic expression](Expr).
///
/// Integer arithmetic is exact and unbounded (up to [`MAX_INT_BITS`]) as long as only `+`, `-`,
/// `*` and `**` with a non-negative exponent are involved. Division, negative exponents, and
/// anything combined with a float produce a [`Float`](Number::Float).
///
/// # Examples
///
/// ```
/// # use randexpr::{eval, parse, Number};
/// assert_eq!(eval(&parse("2**10 - 24").unwrap()), Ok(Number::int(1000)));
/// assert_eq!(eval(&parse("6/3").unwrap()), Ok(Number::Float(2.0)));
/// assert_eq!(eval(&parse("2**-2").unwrap()), Ok(Number::Float(0.25)));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Number {
    /// An exact integer.
    Int(BigInt),
    /// A real number. Float `+ - * /` may leave it infinite or NaN.
    Float(f64),
}

impl Number {
    /// Creates an exact integer.
    pub fn int(value: impl Into<BigInt>) -> Self {
        Number::Int(value.into())
    }

    /// Converts the value into the nearest float. Integers beyond the float range become
    /// infinite.
    pub fn to_f64(&self) -> f64 {
        match self {
            Number::Int(i) => int_to_f64(i).unwrap_or(if i.is_negative() {
                f64::NEG_INFINITY
            } else {
                f64::INFINITY
            }),
            Number::Float(f) => *f,
        }
    }

    /// Converts the value into a float operand, failing for integers beyond the float range.
    fn as_float(&self) -> Result<f64, EvalError> {
        match self {
            Number::Int(i) => int_to_f64(i),
            Number::Float(f) => Ok(*f),
        }
    }
}

impl fmt::Display for Number {
    /// Formats the value for display. Floats always carry a fractional part, so `2.0` and `2`
    /// stay distinguishable.
    ///
    /// # Examples
    ///
    /// ```
    /// # use randexpr::Number;
    /// assert_eq!(Number::int(5).to_string(), "5");
    /// assert_eq!(Number::Float(2.0).to_string(), "2.0");
    /// assert_eq!(Number::Float(3.5).to_string(), "3.5");
    /// ```
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(i) => write!(f, "{}", i),
            Number::Float(x) => write!(f, "{:?}", x),
        }
    }
}

/// Errors that can occur during evaluation. All of them make a sample unusable, none of them
/// indicate a defect.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalError {
    /// Division by zero, or zero raised to a negative power.
    #[error("division by zero")]
    DivisionByZero,
    /// An integer grew beyond [`MAX_INT_BITS`], or a value left the float range where a float
    /// was required: converting a large integer, dividing two integers, or raising to a power.
    #[error("numeric overflow")]
    Overflow,
    /// A negative base was raised to a fractional power.
    ///
    /// The true result is a complex number. A real-valued evaluator cannot represent it, so
    /// the sample is a domain rejection, not an evaluator defect.
    #[error("negative number raised to a fractional power has no real value")]
    NonReal,
}

/// Multiplies `value` by `2^exp`, in steps small enough that each factor is a normal float.
fn scale_by_power_of_two(mut value: f64, mut exp: i64) -> f64 {
    const STEP: i64 = 1000;

    while exp != 0 && value != 0.0 && value.is_finite() {
        let step = exp.clamp(-STEP, STEP);
        value *= f64::from_bits(((1023 + step) as u64) << 52);
        exp -= step;
    }
    value
}

/// Divides two integers, rounding the exact quotient to the nearest float (ties to even).
///
/// # Examples
///
/// ```
/// # use randexpr::{eval, parse, Number};
/// // Converting both operands first would give 48.99999999999999.
/// assert_eq!(eval(&parse("7**30/7**28").unwrap()), Ok(Number::Float(49.0)));
/// ```
fn true_divide(numerator: &BigInt, denominator: &BigInt) -> Result<f64, EvalError> {
    if denominator.is_zero() {
        return Err(EvalError::DivisionByZero);
    }

    let negative = numerator.is_negative() != denominator.is_negative();
    let (n, d) = (numerator.magnitude(), denominator.magnitude());
    if n.is_zero() {
        return Ok(if negative { -0.0 } else { 0.0 });
    }

    // Scale so the integer quotient has 55 or 56 bits, leaving a sticky bit below the rounding
    // bit.
    let shift = F64_SIGNIFICAND_BITS + 2 - (n.bits() as i64 - d.bits() as i64);
    let (n, d) = if shift >= 0 {
        (n << shift as usize, d.clone())
    } else {
        (n.clone(), d << shift.unsigned_abs() as usize)
    };

    let (quotient, remainder) = n.div_rem(&d);
    let mut quotient = quotient.to_u64().ok_or(EvalError::Overflow)?;
    if !remainder.is_zero() {
        quotient |= 1;
    }

    // `u64 -> f64` rounds to nearest even, the sticky bit breaks false ties.
    let value = scale_by_power_of_two(quotient as f64, -shift);
    if value.is_finite() {
        Ok(if negative { -value } else { value })
    } else {
        Err(EvalError::Overflow)
    }
}

/// Converts an integer into the nearest float.
fn int_to_f64(value: &BigInt) -> Result<f64, EvalError> {
    true_divide(value, &BigInt::one())
}

/// Checks that an integer result is still within [`MAX_INT_BITS`].
fn exact(value: BigInt) -> Result<Number, EvalError> {
    if value.bits() > MAX_INT_BITS {
        Err(EvalError::Overflow)
    } else {
        Ok(Number::Int(value))
    }
}

/// Evaluates `+`, `-` and `*`, exactly for integers and in floating point otherwise.
fn eval_arith_op(
    left: &Number,
    right: &Number,
    int_op: fn(&BigInt, &BigInt) -> BigInt,
    float_op: fn(f64, f64) -> f64,
) -> Result<Number, EvalError> {
    match (left, right) {
        (Number::Int(l), Number::Int(r)) => exact(int_op(l, r)),
        (l, r) => Ok(Number::Float(float_op(l.as_float()?, r.as_float()?))),
    }
}

fn eval_division(left: &Number, right: &Number) -> Result<Number, EvalError> {
    match (left, right) {
        (Number::Int(l), Number::Int(r)) => true_divide(l, r).map(Number::Float),
        (l, r) => {
            let (l, r) = (l.as_float()?, r.as_float()?);
            if r == 0.0 {
                Err(EvalError::DivisionByZero)
            } else {
                Ok(Number::Float(l / r))
            }
        }
    }
}

fn int_power(base: &BigInt, exponent: &BigInt) -> Result<Number, EvalError> {
    if exponent.is_zero() || base.is_one() {
        return Ok(Number::int(1));
    }
    if base.is_zero() {
        return Ok(Number::int(0));
    }
    if base.magnitude().is_one() {
        return Ok(Number::int(if exponent.is_even() { 1 } else { -1 }));
    }

    // |base| >= 2^(bits - 1), so the result has at least this many bits.
    let min_bits = exponent
        .to_u64()
        .and_then(|e| e.checked_mul(base.bits() - 1));
    match (min_bits, exponent.to_u32()) {
        (Some(bits), Some(e)) if bits <= MAX_INT_BITS => exact(base.pow(e)),
        _ => Err(EvalError::Overflow),
    }
}

fn float_power(base: f64, exponent: f64) -> Result<Number, EvalError> {
    // Infinite and NaN operands take the IEEE special cases and never fail.
    if !base.is_finite() || !exponent.is_finite() {
        return Ok(Number::Float(base.powf(exponent)));
    }

    if base == 0.0 && exponent < 0.0 {
        Err(EvalError::DivisionByZero)
    } else if base < 0.0 && exponent.fract() != 0.0 {
        Err(EvalError::NonReal)
    } else {
        let result = base.powf(exponent);
        if result.is_finite() {
            Ok(Number::Float(result))
        } else {
            Err(EvalError::Overflow)
        }
    }
}

fn eval_power(base: &Number, exponent: &Number) -> Result<Number, EvalError> {
    match (base, exponent) {
        (Number::Int(b), Number::Int(e)) if !e.is_negative() => int_power(b, e),
        (b, e) => float_power(b.as_float()?, e.as_float()?),
    }
}

/// The evaluator visitor that traverses the AST and computes the result.
struct EvalVisitor;

impl ExprVisitor for EvalVisitor {
    type Output = Result<Number, EvalError>;

    fn visit_int(&mut self, value: i128) -> Self::Output {
        Ok(Number::int(value))
    }

    fn visit_neg(&mut self, operand: &Expr) -> Self::Output {
        match self.visit_expr(operand)? {
            Number::Int(i) => Ok(Number::Int(-i)),
            Number::Float(f) => Ok(Number::Float(-f)),
        }
    }

    fn visit_binary_op(&mut self, left: &Expr, op: &BinaryOperator, right: &Expr) -> Self::Output {
        let left = self.visit_expr(left)?;
        let right = self.visit_expr(right)?;

        let result = match op {
            BinaryOperator::Addition => eval_arith_op(&left, &right, |l, r| l + r, |l, r| l + r),
            BinaryOperator::Subtraction => {
                eval_arith_op(&left, &right, |l, r| l - r, |l, r| l - r)
            }
            BinaryOperator::Multiplication => {
                eval_arith_op(&left, &right, |l, r| l * r, |l, r| l * r)
            }
            BinaryOperator::Division => eval_division(&left, &right),
            BinaryOperator::Power => eval_power(&left, &right),
        };

        trace!("{} {} {} => {:?}", left, op, right, result);
        result
    }
}

/// Evaluates an arithmetic expression and returns the result.
pub fn eval(expr: &Expr) -> Result<Number, EvalError> {
    EvalVisitor.visit_expr(expr)
}

/// Errors returned by an [`Evaluator`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvaluateError {
    /// The text is not a well-formed expression.
    #[error("syntax error in `{text}`: {message}")]
    Syntax { text: String, message: String },
    /// The expression is well-formed but has no usable value.
    #[error(transparent)]
    Eval(#[from] EvalError),
}

/// Evaluates expression text. This is the ground truth fixtures are checked against.
pub trait Evaluator {
    /// Evaluates `text` as an arithmetic expression over `+ - * / **` and parentheses.
    fn evaluate(&self, text: &str) -> Result<Number, EvaluateError>;
}

/// The default [`Evaluator`]: parses with [`parse`] and evaluates with [`eval`].
///
/// # Examples
///
/// ```
/// # use randexpr::{ArithmeticEvaluator, EvalError, EvaluateError, Evaluator, Number};
/// let evaluator = ArithmeticEvaluator;
/// assert_eq!(evaluator.evaluate("(2+3)*4"), Ok(Number::int(20)));
/// assert_eq!(
///     evaluator.evaluate("5/0"),
///     Err(EvaluateError::Eval(EvalError::DivisionByZero))
/// );
/// assert!(matches!(evaluator.evaluate("5/"), Err(EvaluateError::Syntax { .. })));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ArithmeticEvaluator;

impl Evaluator for ArithmeticEvaluator {
    fn evaluate(&self, text: &str) -> Result<Number, EvaluateError> {
        let expr = parse(text).map_err(|errors| EvaluateError::Syntax {
            text: text.to_string(),
            message: errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; "),
        })?;

        Ok(eval(&expr)?)
    }
}
#[cfg(test)]
mod test {
    use super::*;

    fn eval_str(input: &str) -> Result<Number, EvalError> {
        eval(&parse(input).unwrap())
    }

    #[test]
    fn test_integer_arithmetic_is_exact() {
        assert_eq!(eval_str("(2+3)*4"), Ok(Number::int(20)));
        assert_eq!(eval_str("3--5"), Ok(Number::int(8)));
        assert_eq!(eval_str("-2**2"), Ok(Number::int(-4)));
        assert_eq!(eval_str("(-2)**2"), Ok(Number::int(4)));
        assert_eq!(eval_str("2**3**2"), Ok(Number::int(512)));
        assert_eq!(eval_str("-99**0"), Ok(Number::int(-1)));
        assert_eq!(eval_str("(-1)**12345678901"), Ok(Number::int(-1)));
        assert_eq!(eval_str("0**12345678901"), Ok(Number::int(0)));
    }

    #[test]
    fn test_large_integers_stay_exact() {
        assert_eq!(eval_str("99**99"), Ok(Number::Int(BigInt::from(99).pow(99))));
        assert_eq!(eval_str("99**99-99**99+1"), Ok(Number::int(1)));
        assert_eq!(
            eval_str("170141183460469231731687303715884105727+1"),
            Ok(Number::Int(BigInt::one() << 127))
        );
    }

    #[test]
    fn test_division_is_real() {
        assert_eq!(eval_str("7/2"), Ok(Number::Float(3.5)));
        assert_eq!(eval_str("-9/3"), Ok(Number::Float(-3.0)));
        assert_eq!(eval_str("1/2*4"), Ok(Number::Float(2.0)));
        assert_eq!(eval_str("1/3"), Ok(Number::Float(1.0 / 3.0)));
        assert_eq!(eval_str("2**-1"), Ok(Number::Float(0.5)));
        assert_eq!(eval_str("(-2)**-1"), Ok(Number::Float(-0.5)));
    }

    #[test]
    fn test_division_of_large_integers_is_correctly_rounded() {
        assert_eq!(eval_str("3**99/3**98"), Ok(Number::Float(3.0)));
        assert_eq!(eval_str("7**30/7**28"), Ok(Number::Float(49.0)));
        assert_eq!(eval_str("-7**30/7**28"), Ok(Number::Float(-49.0)));
        // A tiny quotient vanishes next to an integer instead of failing the whole sample.
        assert_eq!(eval_str("(-3/-77**88+13)"), Ok(Number::Float(13.0)));
        assert_eq!(eval_str("(97/(-74**94)+27)"), Ok(Number::Float(27.0)));
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(eval_str("5/0"), Err(EvalError::DivisionByZero));
        assert_eq!(eval_str("5/(3-3)"), Err(EvalError::DivisionByZero));
        assert_eq!(eval_str("1/(1/2-1/2)"), Err(EvalError::DivisionByZero));
        assert_eq!(eval_str("0**-1"), Err(EvalError::DivisionByZero));
        assert_eq!(eval_str("(0/5)**-2"), Err(EvalError::DivisionByZero));
    }

    #[test]
    fn test_overflow() {
        assert_eq!(eval_str("2**5000000000"), Err(EvalError::Overflow));
        assert_eq!(eval_str("(99**99)**(99**99)"), Err(EvalError::Overflow));
        assert_eq!(eval_str("(1/2)**-5000"), Err(EvalError::Overflow));
        assert_eq!(eval_str("2**5000/1"), Err(EvalError::Overflow));
        assert_eq!(eval_str("2**2000+1/2"), Err(EvalError::Overflow));
        assert_eq!(eval_str("2**40"), Ok(Number::int(1_099_511_627_776_i64)));
    }

    #[test]
    fn test_float_overflow_is_not_an_error() {
        let huge = "(2**1000/1)";
        assert_eq!(
            eval_str(&format!("{huge}*{huge}")),
            Ok(Number::Float(f64::INFINITY))
        );
        assert_eq!(
            eval_str(&format!("1/({huge}*{huge})+13")),
            Ok(Number::Float(13.0))
        );
    }

    #[test]
    fn test_non_real_power() {
        assert_eq!(eval_str("(-8)**(1/3)"), Err(EvalError::NonReal));
        assert_eq!(eval_str("(-8)**(6/3)"), Ok(Number::Float(64.0)));
        assert_eq!(eval_str("4**(1/2)"), Ok(Number::Float(2.0)));
    }

    #[test]
    fn test_errors_short_circuit() {
        // The left operand fails first, so its error wins.
        assert_eq!(
            eval_str("(1/0)*(2**5000000000)"),
            Err(EvalError::DivisionByZero)
        );
        assert_eq!(
            eval_str("(2**5000000000)*(1/0)"),
            Err(EvalError::Overflow)
        );
    }

    #[test]
    fn test_to_f64() {
        assert_eq!(Number::int(-7).to_f64(), -7.0);
        assert_eq!(Number::Int(BigInt::one() << 2000).to_f64(), f64::INFINITY);
        assert_eq!(Number::Int(-(BigInt::one() << 2000u32)).to_f64(), f64::NEG_INFINITY);
    }
}
