mod ast;
mod config;
mod eval;
mod fixture;
mod generator;
mod parser;
mod sampler;
mod tree;

pub mod parsing {
    pub use crate::{ast::*, parser::*};
}

pub use config::{
    ConfigError, CounterScope, DEFAULT_ITERATIONS, DEFAULT_LEAF_RANGE, DEFAULT_MAGNITUDE_LIMIT,
    DEFAULT_RECURSION_THRESHOLD, GeneratorConfig, MAX_RECURSION_THRESHOLD, SamplerConfig,
};
pub use eval::{
    ArithmeticEvaluator, EvalError, EvaluateError, Evaluator, MAX_INT_BITS, Number, eval,
};
pub use fixture::{
    Fixture, Outcome, Rejection, accept_value, emit, evaluate_and_filter, evaluate_and_filter_with,
    to_display_text,
};
pub use generator::{GenerateError, Generator, RunSummary};
pub use parser::parse;
pub use sampler::Sampler;
pub use tree::Node;
