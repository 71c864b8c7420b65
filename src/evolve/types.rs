//! Core types of the optimizer.
//!
//! [`EvolveProblem`] is the contract between the generic engine and the
//! caller's domain; [`Candidate`] is a scored genome; [`Direction`] says
//! which way each objective improves.

use super::runner::RunResult;
use rand::Rng;
use std::cmp::Ordering;
use std::sync::Arc;

/// Which way an objective improves.
///
/// `Maximize` corresponds to an *ascending* objective (larger is better),
/// `Minimize` to a descending one (smaller is better).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    /// Larger scores are better.
    Maximize,
    /// Smaller scores are better.
    Minimize,
}

impl Direction {
    /// Maps the ascending flag (`true` = larger is better) to a direction.
    pub fn from_ascending(ascending: bool) -> Self {
        if ascending {
            Direction::Maximize
        } else {
            Direction::Minimize
        }
    }

    pub fn is_ascending(self) -> bool {
        self == Direction::Maximize
    }

    /// Ordering that places the better value first.
    ///
    /// Incomparable values (NaN) compare as equal.
    pub fn best_first(self, a: f64, b: f64) -> Ordering {
        let ord = match self {
            Direction::Maximize => b.partial_cmp(&a),
            Direction::Minimize => a.partial_cmp(&b),
        };
        ord.unwrap_or(Ordering::Equal)
    }

    /// Whether `value` is at least as good as `bound`.
    pub fn at_least_as_good(self, value: f64, bound: f64) -> bool {
        match self {
            Direction::Maximize => value >= bound,
            Direction::Minimize => value <= bound,
        }
    }

    /// Whether `value` is strictly better than `other`.
    pub fn is_better(self, value: f64, other: f64) -> bool {
        match self {
            Direction::Maximize => value > other,
            Direction::Minimize => value < other,
        }
    }
}

/// A scored candidate solution.
///
/// Candidates only exist once scored: an unscored genome is a plain
/// `Vec<G>`. Neither genome nor score changes after construction, so
/// candidates are shared by `Arc` between the population, the selection
/// tree and the best-ever slot.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Candidate<G> {
    genome: Vec<G>,
    score: Vec<f64>,
    position: Option<Vec<f64>>,
}

impl<G> Candidate<G> {
    pub fn new(genome: Vec<G>, score: Vec<f64>) -> Self {
        Self {
            genome,
            score,
            position: None,
        }
    }

    /// Attaches a species position used by k-means speciation.
    pub fn with_position(mut self, position: Vec<f64>) -> Self {
        self.position = Some(position);
        self
    }

    pub fn genome(&self) -> &[G] {
        &self.genome
    }

    /// Score vector, most significant objective first.
    pub fn score(&self) -> &[f64] {
        &self.score
    }

    /// Score on a single objective. Missing entries read as NaN.
    pub fn objective(&self, index: usize) -> f64 {
        self.score.get(index).copied().unwrap_or(f64::NAN)
    }

    pub fn position(&self) -> Option<&[f64]> {
        self.position.as_deref()
    }

    /// Whether this candidate dominates `other`: at least as good on every
    /// objective and strictly better on at least one.
    ///
    /// This is the best-ever acceptance rule. A tie on a more significant
    /// objective combined with a gain on a lesser one counts as an
    /// improvement; a gain bought with a loss anywhere does not.
    pub fn dominates(&self, other: &Candidate<G>, directions: &[Direction]) -> bool {
        let mut strictly = false;
        for (i, dir) in directions.iter().enumerate() {
            let (mine, theirs) = (self.objective(i), other.objective(i));
            if !dir.at_least_as_good(mine, theirs) {
                return false;
            }
            strictly |= dir.is_better(mine, theirs);
        }
        strictly
    }
}

/// Defines an optimization problem for the [`Evolver`](super::Evolver).
///
/// The caller supplies how to create, score and mutate genomes. Genomes
/// are fixed-length sequences of an opaque gene type; crossover is done
/// by the engine itself and never inspects gene values.
///
/// # Examples
///
/// ```
/// use rand::Rng;
/// use u_evolver::evolve::EvolveProblem;
///
/// struct OneMax { bits: usize }
///
/// impl EvolveProblem for OneMax {
///     type Gene = bool;
///
///     fn generate<R: Rng>(&self, rng: &mut R) -> Vec<bool> {
///         (0..self.bits).map(|_| rng.random_bool(0.5)).collect()
///     }
///
///     fn score(&self, genome: &[bool]) -> Vec<f64> {
///         vec![genome.iter().filter(|&&b| b).count() as f64]
///     }
///
///     fn mutate<R: Rng>(&self, genome: &[bool], rng: &mut R) -> Vec<bool> {
///         let mut out = genome.to_vec();
///         let i = rng.random_range(0..out.len());
///         out[i] = !out[i];
///         out
///     }
/// }
/// ```
///
/// # Thread Safety
///
/// Problems must be `Send` so a run can be handed to a scheduler thread.
/// The engine never calls into a problem from two threads at once.
pub trait EvolveProblem: Send {
    /// Element type of a genome.
    type Gene: Clone + Send + Sync + 'static;

    /// Creates a random genome.
    fn generate<R: Rng>(&self, rng: &mut R) -> Vec<Self::Gene>;

    /// Scores a genome, one value per configured objective,
    /// most significant first.
    fn score(&self, genome: &[Self::Gene]) -> Vec<f64>;

    /// Returns a mutated copy of `genome`. The input is never changed.
    fn mutate<R: Rng>(&self, genome: &[Self::Gene], rng: &mut R) -> Vec<Self::Gene>;

    /// Position of a genome in species space.
    ///
    /// Only consulted when k-means speciation is configured.
    fn species_position(&self, _genome: &[Self::Gene]) -> Option<Vec<f64>> {
        None
    }

    /// Called whenever a generation winner beats the best-ever candidate.
    fn on_new_best(&self, _result: &RunResult<Self::Gene>) {}

    /// Called once when the run stops on cancellation or iteration budget.
    fn on_final(&self, _result: &RunResult<Self::Gene>) {}

    /// Called at the end of each bred generation with the new population.
    fn on_generation(&self, _generation: usize, _population: &[Arc<Candidate<Self::Gene>>]) {}
}
