use std::io;

use randexpr::{
    DEFAULT_MAGNITUDE_LIMIT, Fixture, Number, Rejection, accept_value, eval, parse,
    to_display_text,
};
use yansi::Paint;

use crate::{
    explain::explain_expr,
    report::{report_eval_error, report_parse_errors},
};

/// What became of a checked expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// The input is not an expression.
    Invalid,
    /// The input was evaluated, or failed to evaluate, and was judged.
    Judged(Result<Fixture, Rejection>),
}

/// Judges a value the way a generation run would.
fn judge(input: &str, value: &Number) -> Result<Fixture, Rejection> {
    accept_value(value, DEFAULT_MAGNITUDE_LIMIT).map(|n| Fixture::new(to_display_text(input), n))
}

fn format_verdict(verdict: &Result<Fixture, Rejection>) -> String {
    match verdict {
        Ok(fixture) => format!("{} {}", "accepted:".green(), fixture.magenta()),
        Err(reason) => format!("{} {}", "rejected:".red(), reason.blue()),
    }
}

/// Evaluates one expression, printing its value and whether it would become a fixture.
pub fn check_expr(seq: usize, input: &str, with_explain: bool) -> io::Result<Verdict> {
    let parsed_expr = match parse(input) {
        Ok(parsed_expr) => parsed_expr,
        Err(errors) => {
            report_parse_errors(seq, input, errors)?;
            return Ok(Verdict::Invalid);
        }
    };

    let verdict = match eval(&parsed_expr) {
        Ok(value) => {
            println!("[{}] {}", seq.to_string().green(), value.yellow());
            judge(input, &value)
        }
        Err(e) => {
            report_eval_error(seq, input, e)?;
            Err(Rejection::from(e))
        }
    };
    println!("    {}", format_verdict(&verdict));

    if with_explain {
        println!("Explanation:");
        println!("  Parsed: {}", parsed_expr.format_inline().magenta());
        println!("  Expression Structure:");
        explain_expr(&parsed_expr);
    }

    Ok(Verdict::Judged(verdict))
}
