use rand::Rng;

use crate::{
    ast::BinaryOperator,
    config::{ConfigError, CounterScope, SamplerConfig},
    tree::Node,
};

/// Builds random expression trees.
///
/// Every binary node increments a recursion counter. Nodes built while the counter is below
/// the threshold pick each child uniformly between a leaf and another binary node; later nodes
/// only get leaves, so construction always terminates. With [`CounterScope::Run`] the counter
/// is never reset, which biases later trees of a run toward a single operation.
///
/// # Examples
///
/// ```
/// # use randexpr::{Node, Sampler, SamplerConfig};
/// # use rand::{SeedableRng, rngs::StdRng};
/// let mut sampler = Sampler::new(SamplerConfig::default(), StdRng::seed_from_u64(7)).unwrap();
/// let tree = sampler.sample();
///
/// assert!(matches!(tree, Node::Binary { .. }));
/// assert!(tree.depth() <= 11);
/// ```
#[derive(Debug)]
pub struct Sampler<R> {
    rng: R,
    config: SamplerConfig,
    counter: usize,
}

impl<R: Rng> Sampler<R> {
    /// Creates a sampler drawing from `rng`.
    pub fn new(config: SamplerConfig, rng: R) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            rng,
            config,
            counter: 0,
        })
    }

    /// Returns the number of binary nodes built since the counter was last reset.
    pub fn counter(&self) -> usize {
        self.counter
    }

    /// Returns the sampler configuration.
    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Samples a whole tree. The root is always a binary node.
    pub fn sample(&mut self) -> Node {
        if self.config.counter_scope == CounterScope::Tree {
            self.counter = 0;
        }
        self.build_binary()
    }

    /// Builds a leaf with a uniformly drawn value.
    pub fn build_leaf(&mut self) -> Node {
        Node::Leaf(self.rng.random_range(self.config.leaf_range.clone()))
    }

    /// Builds a binary node, left subtree first, then its operator and parenthesization.
    pub fn build_binary(&mut self) -> Node {
        let allow_binary = self.counter < self.config.recursion_threshold;
        self.counter = self.counter.saturating_add(1);

        let left = self.build_child(allow_binary);
        let right = self.build_child(allow_binary);
        let op = BinaryOperator::ALL[self.rng.random_range(0..BinaryOperator::ALL.len())];
        let parenthesized = self.rng.random_bool(0.5);

        Node::binary(left, op, right, parenthesized)
    }

    fn build_child(&mut self, allow_binary: bool) -> Node {
        if allow_binary && self.rng.random_bool(0.5) {
            self.build_binary()
        } else {
            self.build_leaf()
        }
    }
}
