use std::{fmt, ops::RangeInclusive};

use thiserror::Error;

/// Number of samples drawn by one generation run.
pub const DEFAULT_ITERATIONS: usize = 100;
/// Number of binary nodes that may still spawn binary children.
pub const DEFAULT_RECURSION_THRESHOLD: usize = 10;
/// Largest accepted recursion threshold. Trees are at most one level deeper than the threshold,
/// and evaluating them recurses once per level.
pub const MAX_RECURSION_THRESHOLD: usize = 256;
/// Results must be strictly smaller than this in magnitude.
pub const DEFAULT_MAGNITUDE_LIMIT: f64 = 1e9;
/// Inclusive bounds of leaf values.
pub const DEFAULT_LEAF_RANGE: RangeInclusive<i64> = -99..=99;

/// How long the recursion counter lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CounterScope {
    /// One counter for the whole run. Once the threshold is reached, every later tree is a
    /// single binary node over two leaves.
    #[default]
    Run,
    /// A fresh counter for every tree.
    Tree,
}

impl fmt::Display for CounterScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CounterScope::Run => write!(f, "run"),
            CounterScope::Tree => write!(f, "tree"),
        }
    }
}

/// Configuration of the expression tree [`Sampler`](crate::Sampler).
#[derive(Debug, Clone, PartialEq)]
pub struct SamplerConfig {
    /// Binary nodes built after this many others only get leaf children.
    pub recursion_threshold: usize,
    /// Inclusive range leaf values are drawn from.
    pub leaf_range: RangeInclusive<i64>,
    /// Whether the recursion counter is reset for every tree.
    pub counter_scope: CounterScope,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            recursion_threshold: DEFAULT_RECURSION_THRESHOLD,
            leaf_range: DEFAULT_LEAF_RANGE,
            counter_scope: CounterScope::default(),
        }
    }
}

impl SamplerConfig {
    /// Checks that leaf values can be drawn at all and that trees stay shallow enough to
    /// evaluate.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.recursion_threshold > MAX_RECURSION_THRESHOLD {
            return Err(ConfigError::ThresholdTooLarge(self.recursion_threshold));
        }
        if self.leaf_range.is_empty() {
            return Err(ConfigError::EmptyLeafRange {
                start: *self.leaf_range.start(),
                end: *self.leaf_range.end(),
            });
        }
        Ok(())
    }
}

/// Configuration of a generation run.
///
/// # Examples
///
/// ```
/// # use randexpr::{CounterScope, GeneratorConfig};
/// let config = GeneratorConfig::default();
/// assert_eq!(config.iterations, 100);
/// assert_eq!(config.sampler.recursion_threshold, 10);
/// assert_eq!(config.sampler.leaf_range, -99..=99);
/// assert_eq!(config.sampler.counter_scope, CounterScope::Run);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    /// Number of samples drawn, accepted or not.
    pub iterations: usize,
    /// Exclusive upper bound on the magnitude of accepted results.
    pub magnitude_limit: f64,
    /// Tree sampling parameters.
    pub sampler: SamplerConfig,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            magnitude_limit: DEFAULT_MAGNITUDE_LIMIT,
            sampler: SamplerConfig::default(),
        }
    }
}

impl GeneratorConfig {
    /// Checks the configuration before a run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.magnitude_limit.is_finite() && self.magnitude_limit > 0.0) {
            return Err(ConfigError::InvalidMagnitudeLimit(self.magnitude_limit));
        }
        self.sampler.validate()
    }
}

/// Errors in a [`GeneratorConfig`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("leaf range {start}..={end} is empty")]
    EmptyLeafRange { start: i64, end: i64 },
    #[error("magnitude limit must be a positive finite number, got {0}")]
    InvalidMagnitudeLimit(f64),
    #[error("recursion threshold {0} exceeds the maximum of {MAX_RECURSION_THRESHOLD}")]
    ThresholdTooLarge(usize),
}
