//! Generic multi-objective evolutionary optimizer.
//!
//! Evolves populations of genomes against a lexicographically ranked list
//! of objectives, without knowing anything about the problem beyond three
//! callbacks: create, score and mutate a genome.
//!
//! - **Crossover**: N-parent slice crossover where every offspring takes
//!   each range from a different parent and no gene is lost.
//! - **Selection**: A per-objective tree of better-than-average groups,
//!   optionally split into species, used both as breeding pools and to
//!   name each generation's winner.
//! - **Evolve**: A resumable generation stepper with best-ever tracking,
//!   cancellation and an iteration budget.
//! - **Scheduler**: A cooperative stepping interface so many runs can be
//!   interleaved on one thread or spread over a thread pool.
//!
//! # Quick Start
//!
//! ```ignore
//! use u_evolver::evolve::{Direction, Evolver, EvolverConfig};
//!
//! let config = EvolverConfig::new(vec![Direction::Maximize])
//!     .with_generation_size(200)
//!     .with_max_iterations(100)
//!     .with_seed(42);
//! let result = Evolver::new(OneMax { len: 64 }, config)?.run()?;
//! ```

pub mod crossover;
pub mod error;
pub mod evolve;
pub mod scheduler;
pub mod selection;

pub use error::{ConfigError, EvolveError, Result};
