//! Evolver configuration.
//!
//! [`EvolverConfig`] holds all parameters that control a run.

use super::types::Direction;
use crate::error::ConfigError;
use crate::selection::{SelectionConfig, Speciation};

/// Configuration for the [`Evolver`](super::Evolver).
///
/// Controls generation size, the iteration budget, objective directions,
/// the breeding policy, and selection tree parameters.
///
/// # Defaults
///
/// ```
/// use u_evolver::evolve::{Direction, EvolverConfig};
///
/// let config = EvolverConfig::new(vec![Direction::Minimize]);
/// assert_eq!(config.generation_size, 1000);
/// assert_eq!(config.max_iterations, 100_000);
/// assert!(config.validate().is_ok());
/// ```
///
/// # Builder Pattern
///
/// ```
/// use u_evolver::evolve::{Direction, EvolverConfig};
///
/// let config = EvolverConfig::new(vec![Direction::Maximize, Direction::Minimize])
///     .with_generation_size(200)
///     .with_max_iterations(50)
///     .with_new_blood_ratio(0.05)
///     .with_seed(42);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EvolverConfig {
    /// Number of new candidates produced per generation.
    ///
    /// Survivors carried over from the selection tree come on top of this.
    /// The threshold filter needs at least 3 to behave.
    pub generation_size: usize,

    /// Maximum number of steps before the run stops.
    ///
    /// The seeding step counts as one iteration.
    pub max_iterations: usize,

    /// Objective directions, most significant first.
    ///
    /// The length defines how many scores every genome must receive.
    pub objectives: Vec<Direction>,

    /// Fraction of each generation made of freshly generated candidates.
    ///
    /// At least one fresh candidate is produced every generation.
    pub new_blood_ratio: f64,

    /// Probability of asexual reproduction (mutate a single parent).
    pub one_parent_weight: f64,

    /// Probability of two-parent crossover.
    ///
    /// The remaining probability mass goes to crossover with
    /// `3..=max_parents` parents.
    pub two_parent_weight: f64,

    /// Upper bound on parents in one crossover.
    pub max_parents: usize,

    /// Shape of the `3..=max_parents` draw; above 1 favours fewer parents.
    pub parent_count_exponent: f64,

    /// Shape of the slice-count draw; above 1 favours fewer cut points.
    pub slice_count_exponent: f64,

    /// Probability that all children of one crossover are mutated.
    pub child_mutation_rate: f64,

    /// Threshold filter and winner tolerance.
    pub selection: SelectionConfig,

    /// Species grouping inside the selection tree.
    pub speciation: Speciation,

    /// Random seed for reproducibility.
    ///
    /// `None` uses a random seed.
    pub seed: Option<u64>,
}

impl Default for EvolverConfig {
    fn default() -> Self {
        Self {
            generation_size: 1000,
            max_iterations: 100_000,
            objectives: Vec::new(),
            new_blood_ratio: 0.01,
            one_parent_weight: 0.25,
            two_parent_weight: 0.25,
            max_parents: 7,
            parent_count_exponent: 1.5,
            slice_count_exponent: 2.0,
            child_mutation_rate: 0.5,
            selection: SelectionConfig::default(),
            speciation: Speciation::Single,
            seed: None,
        }
    }
}

impl EvolverConfig {
    /// Default configuration over the given objectives.
    pub fn new(objectives: Vec<Direction>) -> Self {
        Self {
            objectives,
            ..Self::default()
        }
    }

    /// Builds the objective list from ascending flags (`true` = larger is better).
    pub fn from_ascending(flags: &[bool]) -> Self {
        Self::new(flags.iter().map(|&a| Direction::from_ascending(a)).collect())
    }

    pub fn with_generation_size(mut self, n: usize) -> Self {
        self.generation_size = n;
        self
    }

    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    pub fn with_objectives(mut self, objectives: Vec<Direction>) -> Self {
        self.objectives = objectives;
        self
    }

    pub fn with_new_blood_ratio(mut self, ratio: f64) -> Self {
        self.new_blood_ratio = ratio.clamp(0.0, 1.0);
        self
    }

    /// Sets the one- and two-parent probabilities.
    pub fn with_parent_weights(mut self, one: f64, two: f64) -> Self {
        self.one_parent_weight = one.clamp(0.0, 1.0);
        self.two_parent_weight = two.clamp(0.0, 1.0);
        self
    }

    pub fn with_max_parents(mut self, n: usize) -> Self {
        self.max_parents = n;
        self
    }

    pub fn with_child_mutation_rate(mut self, rate: f64) -> Self {
        self.child_mutation_rate = rate.clamp(0.0, 1.0);
        self
    }

    pub fn with_selection(mut self, selection: SelectionConfig) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_speciation(mut self, speciation: Speciation) -> Self {
        self.speciation = speciation;
        self
    }

    /// Sets the random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Fresh candidates injected per generation, never less than one.
    pub fn new_blood_count(&self) -> usize {
        ((self.generation_size as f64 * self.new_blood_ratio) as usize).max(1)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.generation_size < 3 {
            return Err(ConfigError::GenerationTooSmall(self.generation_size));
        }
        if self.max_iterations == 0 {
            return Err(ConfigError::NoIterations);
        }
        if self.objectives.is_empty() {
            return Err(ConfigError::NoObjectives);
        }
        for (name, value) in [
            ("new_blood_ratio", self.new_blood_ratio),
            ("one_parent_weight", self.one_parent_weight),
            ("two_parent_weight", self.two_parent_weight),
            ("child_mutation_rate", self.child_mutation_rate),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::OutOfUnitRange { name, value });
            }
        }
        let weights = self.one_parent_weight + self.two_parent_weight;
        if weights > 1.0 {
            return Err(ConfigError::ParentWeightsTooLarge(weights));
        }
        if self.max_parents < 3 {
            return Err(ConfigError::MaxParentsTooSmall(self.max_parents));
        }
        for (name, value) in [
            ("parent_count_exponent", self.parent_count_exponent),
            ("slice_count_exponent", self.slice_count_exponent),
        ] {
            if value.is_nan() || value <= 0.0 {
                return Err(ConfigError::NonPositive { name, value });
            }
        }
        if let Speciation::KMeans { species: 0, .. } = self.speciation {
            return Err(ConfigError::NoSpecies);
        }
        self.selection.validate()
    }
}
