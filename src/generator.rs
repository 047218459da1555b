use std::{collections::BTreeMap, io};

use log::{debug, info, warn};
use rand::Rng;
use thiserror::Error;

use crate::{
    config::{ConfigError, GeneratorConfig},
    eval::{ArithmeticEvaluator, Evaluator},
    fixture::{Fixture, Outcome, Rejection, emit, evaluate_and_filter_with},
    sampler::Sampler,
};

/// Errors that abort a generation run.
#[derive(Error, Debug)]
pub enum GenerateError {
    /// The configuration cannot be used.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    /// The evaluator could not parse a rendered expression.
    #[error("evaluator rejected rendered expression `{text}`: {message}")]
    Syntax { text: String, message: String },
    /// Writing a fixture failed.
    #[error("failed to write fixture: {0}")]
    Io(#[from] io::Error),
}

/// Statistics of a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Number of samples drawn.
    pub iterations: usize,
    /// Number of fixtures emitted.
    pub accepted: usize,
    /// Number of discarded samples per reason.
    pub rejected: BTreeMap<Rejection, usize>,
}

impl RunSummary {
    /// Returns the total number of discarded samples.
    pub fn rejected_total(&self) -> usize {
        self.rejected.values().sum()
    }

    /// Returns the number of samples discarded for `reason`.
    pub fn rejected_count(&self, reason: Rejection) -> usize {
        self.rejected.get(&reason).copied().unwrap_or(0)
    }

    fn record(&mut self, outcome: &Outcome) {
        self.iterations += 1;
        match outcome.rejection() {
            None => self.accepted += 1,
            Some(reason) => *self.rejected.entry(reason).or_default() += 1,
        }
    }
}

/// Runs the sample, evaluate, filter, emit loop.
///
/// # Examples
///
/// ```
/// # use randexpr::{Generator, GeneratorConfig};
/// # use rand::{SeedableRng, rngs::StdRng};
/// let mut generator = Generator::new(GeneratorConfig::default(), StdRng::seed_from_u64(1)).unwrap();
/// let mut out = Vec::new();
/// let summary = generator.run(&mut out).unwrap();
///
/// assert_eq!(summary.iterations, 100);
/// assert_eq!(summary.accepted + summary.rejected_total(), 100);
/// assert_eq!(String::from_utf8(out).unwrap().lines().count(), summary.accepted);
/// ```
pub struct Generator<R, E = ArithmeticEvaluator> {
    sampler: Sampler<R>,
    evaluator: E,
    iterations: usize,
    magnitude_limit: f64,
}

impl<R: Rng> Generator<R> {
    /// Creates a generator using the built-in [`ArithmeticEvaluator`].
    pub fn new(config: GeneratorConfig, rng: R) -> Result<Self, GenerateError> {
        Self::with_evaluator(config, rng, ArithmeticEvaluator)
    }
}

impl<R: Rng, E: Evaluator> Generator<R, E> {
    /// Creates a generator that checks samples against `evaluator`.
    pub fn with_evaluator(
        config: GeneratorConfig,
        rng: R,
        evaluator: E,
    ) -> Result<Self, GenerateError> {
        config.validate()?;
        Ok(Self {
            sampler: Sampler::new(config.sampler, rng)?,
            evaluator,
            iterations: config.iterations,
            magnitude_limit: config.magnitude_limit,
        })
    }

    /// Draws one sample and returns its rendered text along with the verdict.
    pub fn step(&mut self) -> Result<(String, Outcome), GenerateError> {
        let text = self.sampler.sample().render();
        debug!("sampled `{}`", text);
        let outcome = evaluate_and_filter_with(&self.evaluator, &text, self.magnitude_limit)?;
        Ok((text, outcome))
    }

    /// Draws every sample of the run and returns the accepted fixtures.
    pub fn collect(&mut self) -> Result<Vec<Fixture>, GenerateError> {
        let mut fixtures = Vec::new();
        for _ in 0..self.iterations {
            if let Some(fixture) = self.step()?.1.accepted() {
                fixtures.push(fixture);
            }
        }
        Ok(fixtures)
    }

    /// Draws every sample of the run, writing one line per accepted fixture to `out`.
    pub fn run<W: io::Write + ?Sized>(&mut self, out: &mut W) -> Result<RunSummary, GenerateError> {
        let config = self.sampler.config();
        info!(
            "generating {} samples (recursion threshold {}, counter scope {}, magnitude limit {})",
            self.iterations, config.recursion_threshold, config.counter_scope, self.magnitude_limit
        );

        let mut summary = RunSummary::default();
        for _ in 0..self.iterations {
            let (_, outcome) = self.step()?;
            summary.record(&outcome);
            if let Outcome::Accepted(fixture) = &outcome {
                emit(out, fixture)?;
            }
        }
        out.flush()?;

        info!(
            "accepted {} of {} samples",
            summary.accepted, summary.iterations
        );
        for reason in Rejection::ALL {
            info!("  rejected ({}): {}", reason, summary.rejected_count(reason));
        }
        if summary.accepted == 0 && summary.iterations > 0 {
            warn!("no sample was accepted");
        }

        Ok(summary)
    }
}
