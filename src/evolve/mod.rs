//! Multi-objective evolutionary optimizer.
//!
//! A generic, lexicographically ranked evolutionary engine. Users define
//! their problem by implementing [`EvolveProblem`] (create, score and
//! mutate genomes); the engine handles selection, N-parent crossover,
//! diversity injection and best-ever tracking.
//!
//! # Core Traits
//!
//! - [`EvolveProblem`]: Problem definition and result callbacks
//!
//! # Key Types
//!
//! - [`Candidate`]: A scored genome
//! - [`Direction`]: Whether an objective is maximised or minimised
//! - [`EvolverConfig`]: Run parameters (generation size, budget, breeding policy)
//! - [`Evolver`]: The generation-stepping state machine
//! - [`RunResult`]: Best genome, score and per-generation history
//!
//! # Generation Layout
//!
//! Each bred generation consists of ~1% fresh random candidates, children
//! bred from random nodes of the [`SelectionTree`](crate::selection::SelectionTree)
//! up to `generation_size`, and the tree's leaf members carried over as is.
//!
//! # References
//!
//! - Fonseca & Fleming (1998), "Multiobjective optimization and multiple
//!   constraint handling with evolutionary algorithms"
//! - Eiben, Raué & Ruttkay (1994), "Genetic algorithms with multi-parent
//!   recombination"

mod breed;
mod config;
mod runner;
mod types;

pub use config::EvolverConfig;
pub use runner::{Evolver, ReportReason, RunResult};
pub use types::{Candidate, Direction, EvolveProblem};
