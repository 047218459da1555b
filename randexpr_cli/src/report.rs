use std::io;

use ariadne::{Color, Label, Report, ReportKind, Source};
use chumsky::error::Rich;
use randexpr::EvalError;

const SOURCE_ID: &str = "<expr>";

/// Report parse errors using ariadne
pub fn report_parse_errors(seq: usize, input: &str, errors: Vec<Rich<'_, char>>) -> io::Result<()> {
    for error in errors {
        let span = error.span();
        let msg = error.to_string();

        Report::build(ReportKind::Error, (SOURCE_ID, span.into_range()))
            .with_message("Parse Error")
            .with_label(
                Label::new((SOURCE_ID, span.start..span.end))
                    .with_message(msg)
                    .with_color(Color::Red),
            )
            .finish()
            .eprint((
                SOURCE_ID,
                Source::from(input).with_display_line_offset(seq.saturating_sub(1)),
            ))?;
    }

    Ok(())
}

/// Report evaluation errors using ariadne. These discard a sample, so they are warnings.
pub fn report_eval_error(seq: usize, input: &str, error: EvalError) -> io::Result<()> {
    let msg = error.to_string();

    Report::build(ReportKind::Warning, (SOURCE_ID, 0..input.len()))
        .with_message("Evaluation Error")
        .with_label(
            Label::new((SOURCE_ID, 0..input.len()))
                .with_message(msg)
                .with_color(Color::Yellow),
        )
        .finish()
        .eprint((
            SOURCE_ID,
            Source::from(input).with_display_line_offset(seq.saturating_sub(1)),
        ))
}
