use std::io;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum, builder::RangedU64ValueParser};
use log::info;
use rand::{Rng, SeedableRng, rngs::StdRng};
use randexpr::{
    CounterScope, DEFAULT_ITERATIONS, DEFAULT_RECURSION_THRESHOLD, Generator, GeneratorConfig,
    MAX_RECURSION_THRESHOLD, SamplerConfig,
};

mod check;
mod explain;
mod repl;
mod report;

use check::{Verdict, check_expr};

/// Log level for the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_log_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// randexpr - Generate arithmetic interpreter test fixtures from random expressions
#[derive(Parser, Debug)]
#[command(name = "randexpr")]
#[command(version)]
pub struct CliArgs {
    /// Log level (default: warn)
    #[arg(short, long, value_enum, default_value = "warn", global = true)]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Sample random expressions and print the accepted ones as test declarations (default)
    Generate(GenerateArgs),
    /// Evaluate one expression and show whether it would become a fixture
    Check {
        /// Expression using + - * / ** and parentheses
        #[arg(allow_hyphen_values = true)]
        expr: String,
        /// Also print the parsed structure
        #[arg(short, long)]
        explain: bool,
    },
    /// Check expressions interactively
    Repl,
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct GenerateArgs {
    /// Number of samples to draw
    #[arg(short = 'n', long, default_value_t = DEFAULT_ITERATIONS)]
    pub count: usize,

    /// Number of binary nodes that may still get binary children (at most 256)
    #[arg(
        short,
        long,
        default_value_t = DEFAULT_RECURSION_THRESHOLD,
        value_parser = RangedU64ValueParser::<usize>::new().range(..=MAX_RECURSION_THRESHOLD as u64)
    )]
    pub threshold: usize,

    /// Seed for the random source; drawn at random when absent
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Reset the recursion counter for every tree instead of once per run
    #[arg(long)]
    pub fresh_counter: bool,
}

impl Default for GenerateArgs {
    fn default() -> Self {
        Self {
            count: DEFAULT_ITERATIONS,
            threshold: DEFAULT_RECURSION_THRESHOLD,
            seed: None,
            fresh_counter: false,
        }
    }
}

impl GenerateArgs {
    /// Maps the flags onto a generator configuration.
    pub fn to_config(&self) -> GeneratorConfig {
        GeneratorConfig {
            iterations: self.count,
            sampler: SamplerConfig {
                recursion_threshold: self.threshold,
                counter_scope: if self.fresh_counter {
                    CounterScope::Tree
                } else {
                    CounterScope::Run
                },
                ..SamplerConfig::default()
            },
            ..GeneratorConfig::default()
        }
    }
}

/// Initialize logging based on the provided log level
fn init_logging(log_level: LogLevel) {
    env_logger::Builder::from_default_env()
        .filter_level(log_level.to_log_level_filter())
        .init();
}

fn generate(args: &GenerateArgs) -> Result<()> {
    let seed = args.seed.unwrap_or_else(|| rand::rng().random());
    info!("seed: {}", seed);

    let mut generator = Generator::new(args.to_config(), StdRng::seed_from_u64(seed))
        .context("invalid generator configuration")?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    generator.run(&mut out).context("fixture generation failed")?;

    Ok(())
}

fn check(expr: &str, explain: bool) -> Result<()> {
    match check_expr(1, expr, explain).context("failed to write report")? {
        Verdict::Invalid => bail!("`{}` is not a valid expression", expr),
        Verdict::Judged(_) => Ok(()),
    }
}

/// Run the main application logic
fn run() -> Result<()> {
    let args = CliArgs::parse();

    init_logging(args.log_level);

    match args.command.unwrap_or_else(|| Command::Generate(GenerateArgs::default())) {
        Command::Generate(generate_args) => generate(&generate_args),
        Command::Check { expr, explain } => check(&expr, explain),
        Command::Repl => repl::run(),
    }
}

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {:#}", err);
        #[allow(clippy::exit)]
        std::process::exit(1);
    }
}
