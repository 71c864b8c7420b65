//! Error types shared by every module of the optimizer.
//!
//! Cancellation and an exhausted iteration budget are *not* errors: they
//! are normal terminal outcomes reported through
//! [`ReportReason`](crate::evolve::ReportReason). Everything in [`EvolveError`]
//! is fatal for the run that produced it.

/// Invalid [`EvolverConfig`](crate::evolve::EvolverConfig) parameters.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("generation_size must be at least 3, got {0}")]
    GenerationTooSmall(usize),
    #[error("max_iterations must be at least 1")]
    NoIterations,
    #[error("at least one objective direction is required")]
    NoObjectives,
    #[error("{name} must lie in [0, 1], got {value}")]
    OutOfUnitRange { name: &'static str, value: f64 },
    #[error("one_parent_weight + two_parent_weight must not exceed 1, got {0}")]
    ParentWeightsTooLarge(f64),
    #[error("max_parents must be at least 3, got {0}")]
    MaxParentsTooSmall(usize),
    #[error("{name} must be positive, got {value}")]
    NonPositive { name: &'static str, value: f64 },
    #[error("selection.min_kept must be at least 1")]
    NothingKept,
    #[error("k-means speciation needs at least one species")]
    NoSpecies,
}

/// Fatal errors raised while building trees, breeding, or stepping a run.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvolveError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// A selection or crossover step was handed nothing to work with.
    #[error("parent pool is empty")]
    EmptyPool,

    #[error("parent genomes differ in length: expected {expected}, found {found}")]
    GenomeLengthMismatch { expected: usize, found: usize },

    /// No valid non-repeating donor could be drawn. Unreachable for
    /// well-formed input; surfaced instead of retried.
    #[error("no non-repeating donor found for range {range}, child {child}")]
    DonorExhausted { range: usize, child: usize },

    #[error("step() called after the run already finished")]
    RunFinished,

    #[error("step() called after the run was aborted by an earlier error")]
    RunAborted,

    #[error("score vector has {found} entries but {expected} objectives are configured")]
    ScoreArity { expected: usize, found: usize },

    #[error("k-means speciation requires EvolveProblem::species_position to return a position")]
    MissingSpeciesPosition,
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, EvolveError>;
