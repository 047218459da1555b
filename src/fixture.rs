use std::{fmt, io};

use log::debug;
use num_traits::ToPrimitive;

use crate::{
    config::DEFAULT_MAGNITUDE_LIMIT,
    eval::{EvalError, EvaluateError, Evaluator, Number},
    generator::GenerateError,
};

/// An accepted sample: the text to put in a test, and the integer it must evaluate to.
///
/// Its [`Display`](fmt::Display) form is the emitted test declaration.
///
/// # Examples
///
/// ```
/// # use randexpr::Fixture;
/// let fixture = Fixture::new("(2+3)*4", 20);
/// assert_eq!(
///     fixture.to_string(),
///     r#"TEST_SOURCE_TO_INTERP("(2+3)*4", create_ast_integer(20));"#
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fixture {
    /// Expression text with `**` written as `^`.
    pub display_text: String,
    /// The value of the expression.
    pub value: i64,
}

impl Fixture {
    /// Creates a fixture from already-converted display text.
    pub fn new(display_text: impl Into<String>, value: i64) -> Self {
        Self {
            display_text: display_text.into(),
            value,
        }
    }
}

impl fmt::Display for Fixture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TEST_SOURCE_TO_INTERP(\"{}\", create_ast_integer({}));",
            escape(&self.display_text),
            self.value
        )
    }
}

/// Backslash-escapes `"` and `\` for the string literal of a test declaration.
fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '"' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Converts source text to fixture syntax, where power is `^`.
///
/// # Examples
///
/// ```
/// # use randexpr::to_display_text;
/// assert_eq!(to_display_text("2**3**-1*4"), "2^3^-1*4");
/// ```
pub fn to_display_text(text: &str) -> String {
    text.replace("**", "^")
}

/// Why a sample was not turned into a fixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Rejection {
    /// Evaluation divided by zero.
    DivisionByZero,
    /// Evaluation overflowed.
    Overflow,
    /// Evaluation raised a negative number to a fractional power.
    NonReal,
    /// The result is at least as large as the magnitude limit.
    OutOfRange,
    /// The result has a fractional part.
    Fractional,
    /// The result truncates to zero, so the whole-number check cannot be applied.
    ZeroTruncation,
}

impl Rejection {
    /// All rejection reasons.
    pub const ALL: [Rejection; 6] = [
        Rejection::DivisionByZero,
        Rejection::Overflow,
        Rejection::NonReal,
        Rejection::OutOfRange,
        Rejection::Fractional,
        Rejection::ZeroTruncation,
    ];

    /// Returns a short description of the reason.
    pub fn desc(&self) -> &'static str {
        match self {
            Rejection::DivisionByZero => "division by zero",
            Rejection::Overflow => "overflow",
            Rejection::NonReal => "non-real power",
            Rejection::OutOfRange => "out of range",
            Rejection::Fractional => "fractional result",
            Rejection::ZeroTruncation => "truncates to zero",
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.desc())
    }
}

impl From<EvalError> for Rejection {
    fn from(error: EvalError) -> Self {
        match error {
            EvalError::DivisionByZero => Rejection::DivisionByZero,
            EvalError::Overflow => Rejection::Overflow,
            EvalError::NonReal => Rejection::NonReal,
        }
    }
}

/// The verdict on one sample.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The sample became a fixture.
    Accepted(Fixture),
    /// The sample was discarded.
    Rejected {
        reason: Rejection,
        /// The value, when evaluation got that far.
        value: Option<Number>,
    },
}

impl Outcome {
    /// Returns the fixture, if the sample was accepted.
    pub fn accepted(self) -> Option<Fixture> {
        match self {
            Outcome::Accepted(fixture) => Some(fixture),
            Outcome::Rejected { .. } => None,
        }
    }

    /// Returns the rejection reason, if the sample was rejected.
    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            Outcome::Accepted(_) => None,
            Outcome::Rejected { reason, .. } => Some(*reason),
        }
    }
}

/// `2^63`, the first float above the `i64` range.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

/// Returns `true` if the integer magnitude is below `limit`, compared without rounding.
fn below_limit(magnitude: u64, limit: f64) -> bool {
    let bound = limit.ceil();
    bound > u64::MAX as f64 || magnitude < bound as u64
}

/// Decides whether a value is a clean integer below `limit` in magnitude, returning it
/// truncated.
///
/// A value is whole when it is divisible by its own truncation. Values that truncate to zero
/// have nothing to divide by and are rejected, which excludes `0` itself. Whole values that do
/// not fit an `i64` are out of range whatever the limit.
///
/// # Examples
///
/// ```
/// # use randexpr::{accept_value, Number, Rejection};
/// assert_eq!(accept_value(&Number::int(20), 1e9), Ok(20));
/// assert_eq!(accept_value(&Number::Float(-6.0), 1e9), Ok(-6));
/// assert_eq!(accept_value(&Number::Float(3.5), 1e9), Err(Rejection::Fractional));
/// assert_eq!(accept_value(&Number::int(0), 1e9), Err(Rejection::ZeroTruncation));
/// assert_eq!(accept_value(&Number::int(1_000_000_000), 1e9), Err(Rejection::OutOfRange));
/// assert_eq!(accept_value(&Number::Float(1e20), 1e30), Err(Rejection::OutOfRange));
/// ```
pub fn accept_value(value: &Number, limit: f64) -> Result<i64, Rejection> {
    match value {
        Number::Int(i) => {
            let n = i.to_i64().ok_or(Rejection::OutOfRange)?;
            if !below_limit(n.unsigned_abs(), limit) {
                Err(Rejection::OutOfRange)
            } else if n == 0 {
                Err(Rejection::ZeroTruncation)
            } else {
                Ok(n)
            }
        }
        Number::Float(r) => {
            if !(r.abs() < limit) {
                return Err(Rejection::OutOfRange);
            }

            let truncated = r.trunc();
            if truncated == 0.0 {
                Err(Rejection::ZeroTruncation)
            } else if r % truncated != 0.0 {
                Err(Rejection::Fractional)
            } else if !(-I64_BOUND..I64_BOUND).contains(&truncated) {
                Err(Rejection::OutOfRange)
            } else {
                Ok(truncated as i64)
            }
        }
    }
}

/// Evaluates `text` and turns it into a fixture if the result is a clean integer whose
/// magnitude is below `limit`.
///
/// Numeric failures are rejections. A syntax error means the text did not come from the
/// sampler's grammar and is returned as an error.
pub fn evaluate_and_filter_with<E: Evaluator + ?Sized>(
    evaluator: &E,
    text: &str,
    limit: f64,
) -> Result<Outcome, GenerateError> {
    let value = match evaluator.evaluate(text) {
        Ok(value) => value,
        Err(EvaluateError::Eval(error)) => {
            debug!("rejected `{}`: {}", text, error);
            return Ok(Outcome::Rejected {
                reason: error.into(),
                value: None,
            });
        }
        Err(EvaluateError::Syntax { text, message }) => {
            return Err(GenerateError::Syntax { text, message });
        }
    };

    match accept_value(&value, limit) {
        Ok(n) => Ok(Outcome::Accepted(Fixture::new(to_display_text(text), n))),
        Err(reason) => {
            debug!("rejected `{}` = {}: {}", text, value, reason);
            Ok(Outcome::Rejected {
                reason,
                value: Some(value),
            })
        }
    }
}

/// [`evaluate_and_filter_with`] using the default magnitude limit of `1e9`.
///
/// # Examples
///
/// ```
/// # use randexpr::{evaluate_and_filter, ArithmeticEvaluator, Rejection};
/// let outcome = evaluate_and_filter(&ArithmeticEvaluator, "2**3*5").unwrap();
/// assert_eq!(outcome.accepted().unwrap().display_text, "2^3*5");
///
/// let outcome = evaluate_and_filter(&ArithmeticEvaluator, "7/2").unwrap();
/// assert_eq!(outcome.rejection(), Some(Rejection::Fractional));
/// ```
pub fn evaluate_and_filter<E: Evaluator + ?Sized>(
    evaluator: &E,
    text: &str,
) -> Result<Outcome, GenerateError> {
    evaluate_and_filter_with(evaluator, text, DEFAULT_MAGNITUDE_LIMIT)
}

/// Writes `fixture` as one line of output.
pub fn emit<W: io::Write + ?Sized>(out: &mut W, fixture: &Fixture) -> io::Result<()> {
    writeln!(out, "{}", fixture)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::eval::ArithmeticEvaluator;

    fn outcome(text: &str) -> Outcome {
        evaluate_and_filter(&ArithmeticEvaluator, text).unwrap()
    }

    fn emitted(text: &str) -> String {
        let mut out = Vec::new();
        if let Some(fixture) = outcome(text).accepted() {
            emit(&mut out, &fixture).unwrap();
        }
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_emits_exact_line() {
        assert_eq!(
            emitted("(2+3)*4"),
            "TEST_SOURCE_TO_INTERP(\"(2+3)*4\", create_ast_integer(20));\n"
        );
        assert_eq!(
            emitted("-3**2"),
            "TEST_SOURCE_TO_INTERP(\"-3^2\", create_ast_integer(-9));\n"
        );
        assert_eq!(
            emitted("10/5--1"),
            "TEST_SOURCE_TO_INTERP(\"10/5--1\", create_ast_integer(3));\n"
        );
    }

    #[test]
    fn test_discards_without_error() {
        let cases = [
            ("5/0", Rejection::DivisionByZero),
            ("7/2", Rejection::Fractional),
            ("2**40", Rejection::OutOfRange),
            ("99**99", Rejection::OutOfRange),
            ("2**5000000000", Rejection::Overflow),
            ("2**5000/1", Rejection::Overflow),
            ("(-8)**(1/3)", Rejection::NonReal),
            ("3-3", Rejection::ZeroTruncation),
            ("1/2", Rejection::ZeroTruncation),
            ("-1/3", Rejection::ZeroTruncation),
        ];

        for (text, reason) in cases {
            assert_eq!(outcome(text).rejection(), Some(reason), "text: {}", text);
            assert_eq!(emitted(text), "", "text: {}", text);
        }
    }

    #[test]
    fn test_magnitude_boundary() {
        assert_eq!(outcome("999999999").accepted().map(|f| f.value), Some(999_999_999));
        assert_eq!(outcome("-999999999").accepted().map(|f| f.value), Some(-999_999_999));
        assert_eq!(outcome("10**9").rejection(), Some(Rejection::OutOfRange));
        assert_eq!(outcome("-10**9").rejection(), Some(Rejection::OutOfRange));
        assert_eq!(outcome("10**10/10").rejection(), Some(Rejection::OutOfRange));
        assert_eq!(
            outcome("1999999998/2").accepted().map(|f| f.value),
            Some(999_999_999)
        );
    }

    #[test]
    fn test_float_rounding_near_integers() {
        // 1/3*3 rounds to exactly 1.0.
        assert_eq!(outcome("1/3*3").accepted().map(|f| f.value), Some(1));
        // 1/10 is not exactly a tenth, so the product lands just above 3.
        assert_eq!(outcome("1/10*3*10").rejection(), Some(Rejection::Fractional));
        assert_eq!(outcome("49/7").accepted().map(|f| f.value), Some(7));
        assert_eq!(outcome("-9/-3").accepted().map(|f| f.value), Some(3));
        assert_eq!(outcome("4**(1/2)").accepted().map(|f| f.value), Some(2));
        // 10**-1 is the float nearest a tenth, and ten of it round back to exactly 1.0.
        assert_eq!(outcome("10**-1*10").accepted().map(|f| f.value), Some(1));
    }

    #[test]
    fn test_large_intermediates_are_kept() {
        assert_eq!(outcome("(-3/-77**88+13)").accepted().map(|f| f.value), Some(13));
        assert_eq!(outcome("(97/(-74**94)+27)").accepted().map(|f| f.value), Some(27));
        assert_eq!(outcome("3**99/3**98").accepted().map(|f| f.value), Some(3));
        assert_eq!(outcome("7**30/7**28").accepted().map(|f| f.value), Some(49));
        assert_eq!(outcome("99**99-99**99+5").accepted().map(|f| f.value), Some(5));
    }

    #[test]
    fn test_custom_limit() {
        let accepted = evaluate_and_filter_with(&ArithmeticEvaluator, "50*2", 101.0).unwrap();
        assert_eq!(accepted.accepted().map(|f| f.value), Some(100));

        let rejected = evaluate_and_filter_with(&ArithmeticEvaluator, "50*2", 100.0).unwrap();
        assert_eq!(rejected.rejection(), Some(Rejection::OutOfRange));
    }

    #[test]
    fn test_values_beyond_i64_are_out_of_range() {
        for text in ["2**70/1", "2**70", "-2**63-1", "-(2**63/1)*2"] {
            let outcome = evaluate_and_filter_with(&ArithmeticEvaluator, text, 1e30).unwrap();
            assert_eq!(outcome.rejection(), Some(Rejection::OutOfRange), "text: {}", text);
        }

        let lowest = evaluate_and_filter_with(&ArithmeticEvaluator, "-2**63", 1e30).unwrap();
        assert_eq!(lowest.accepted().map(|f| f.value), Some(i64::MIN));
        let lowest = evaluate_and_filter_with(&ArithmeticEvaluator, "-(2**63/1)", 1e30).unwrap();
        assert_eq!(lowest.accepted().map(|f| f.value), Some(i64::MIN));
    }

    #[test]
    fn test_syntax_error_is_fatal() {
        let result = evaluate_and_filter(&ArithmeticEvaluator, "2^3");
        assert!(matches!(result, Err(GenerateError::Syntax { .. })));
    }

    #[test]
    fn test_display_text_replaces_every_power() {
        let text = "(2**2)**(1**3)-2**1";
        let display = to_display_text(text);

        assert_eq!(display, "(2^2)^(1^3)-2^1");
        assert!(!display.contains("**"));
        assert_eq!(
            display.matches('^').count(),
            text.matches("**").count()
        );
    }

    #[test]
    fn test_escapes_quotes() {
        let fixture = Fixture::new("a\"b\\c", 1);
        assert_eq!(
            fixture.to_string(),
            r#"TEST_SOURCE_TO_INTERP("a\"b\\c", create_ast_integer(1));"#
        );
    }
}
