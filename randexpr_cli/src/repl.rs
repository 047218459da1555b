use anyhow::{Context, Result};
use rand::{SeedableRng, rngs::StdRng};
use randexpr::{CounterScope, Sampler, SamplerConfig};
use rustyline::{DefaultEditor, error::ReadlineError};
use yansi::Paint;

use crate::check::check_expr;

// Color schema
// Red - Errors, rejections
// Green - commands, sequence numbers, acceptances
// Blue - Auxiliary info
// Cyan - headings
// Magenta - expressions, fixtures
// Yellow - values

fn print_welcome() {
    println!("{}", "randexpr REPL - Interactive Fixture Checker".cyan());
    println!("{}", "===========================================".cyan());
    println!("Type {} for help\n", ":help".green());
}

/// Print help message
fn print_help() {
    println!(
        "\n{}\n  Enter {} to evaluate them and see whether they would become fixtures",
        "Usage:".yellow(),
        "arithmetic expressions".magenta()
    );
    println!("\n{}:", "Commands".yellow());
    println!(
        "  {} or {}                   - Show this help message",
        ":h[elp]".green(),
        ":?".green()
    );
    println!(
        "  {} {} or {} {}  - Explain the structure of an expression",
        ":ex[plain]".green(),
        "<expr>".magenta(),
        ":!".green(),
        "<expr>".magenta()
    );
    println!(
        "  {} or {}                   - Sample a random expression and check it",
        ":s[ample]".green(),
        ":~".green()
    );
    println!(
        "  {} or {}                - Exit the REPL",
        ":exit".green(),
        ":q[uit]".green()
    );
    println!("\n{}:", "Examples".yellow());
    println!(
        "  {}               - Accepted, evaluates to 20",
        "(2+3)*4".magenta()
    );
    println!(
        "  {}                 - Power binds tighter than negation: -9",
        "-3**2".magenta()
    );
    println!(
        "  {}                   - Rejected, fractional result",
        "7/2".magenta()
    );
    println!(
        "  {}                 - Rejected, out of range",
        "2**40".magenta()
    );
    println!();
}

fn print_err(err: &str) {
    println!("{}: {}", "Error".red(), err);
}

/// Process a command, return true to exit REPL.
fn process_command(
    seq: usize,
    command: &str,
    args: &str,
    sampler: &mut Sampler<StdRng>,
) -> Result<bool> {
    match command {
        "help" | "h" | "?" => {
            print_help();
        }
        "exit" | "quit" | "q" => {
            println!("{}", "Goodbye!".yellow());
            return Ok(true);
        }
        "explain" | "ex" | "!" => {
            if args.is_empty() {
                print_err("No expression provided to explain");
            } else {
                check_expr(seq, args, true)?;
            }
        }
        "sample" | "s" | "~" => {
            let text = sampler.sample().render();
            println!("Sampled: {}", text.magenta());
            check_expr(seq, &text, false)?;
        }
        _ => {
            let cmd_with_colon = format!(":{}", command);
            print_err(&format!("Unknown command: {}", cmd_with_colon.red()));
            println!("Type {} for help", ":help".green());
        }
    }

    Ok(false)
}

/// Process a single input line, return true to exit REPL.
fn process_line(seq: usize, line: &str, sampler: &mut Sampler<StdRng>) -> Result<bool> {
    // Handle commands
    if let Some(command_line) = line.strip_prefix(':') {
        let first_space = command_line
            .find(char::is_whitespace)
            .unwrap_or(command_line.len());
        let command = &command_line[..first_space];
        let args = command_line[first_space..].trim();

        return process_command(seq, command, args, sampler);
    }

    check_expr(seq, line, false)?;
    Ok(false)
}

fn prompt(seq: usize) -> String {
    format!("{}:[{}]> ", "randexpr".cyan(), seq.to_string().green())
}

/// Runs the interactive loop until end of input or `:quit`.
pub fn run() -> Result<()> {
    print_welcome();

    // Samples in the REPL are independent of each other
    let config = SamplerConfig {
        counter_scope: CounterScope::Tree,
        ..SamplerConfig::default()
    };
    let mut sampler = Sampler::new(config, StdRng::from_rng(&mut rand::rng()))?;

    // Create a rustyline editor with history support
    let mut rl = DefaultEditor::new().context("failed to create readline editor")?;
    // Sequence number for prompts
    let mut seq = 1usize;

    loop {
        // Read input with rustyline, to support history and inline editing
        let line = match rl.readline(&prompt(seq)) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                // Handle Ctrl+C
                println!("{}", "^C".red());
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                print_err(&format!("Error reading input: {:?}", err));
                break;
            }
        };

        let line = line.trim();

        if line.is_empty() {
            continue;
        } else {
            let _ = rl.add_history_entry(line);
        }

        if process_line(seq, line, &mut sampler)? {
            break;
        }

        seq += 1;
    }

    println!("{} {} lines processed.", "Goodbye!".yellow(), seq);
    Ok(())
}
