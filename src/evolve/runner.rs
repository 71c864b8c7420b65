//! Generation stepping.
//!
//! [`Evolver`] is a cooperative state machine: each call to
//! [`step`](Evolver::step) performs exactly one unit of work and returns
//! whether more steps are wanted.
//!
//! ```text
//! Fresh ──step──▶ Running ──step──▶ … ──▶ Finished (cancelled | budget)
//!                    │
//!                    └──── any error ────▶ Aborted
//! ```
//!
//! The first iteration seeds the population; every later one builds a
//! selection tree, breeds the next population, and records the
//! generation winner.

use super::breed::Breeder;
use super::config::EvolverConfig;
use super::types::{Candidate, EvolveProblem};
use crate::error::{EvolveError, Result};
use crate::scheduler::{Scheduler, Worker, WorkerId};
use crate::selection::SelectionTree;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Why a [`RunResult`] was reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ReportReason {
    /// Stopped on reaching an error threshold.
    ///
    /// Part of the result taxonomy; no stop-on-threshold policy exists, so
    /// the engine never reports it.
    FinalErrorThreshold,
    /// A generation winner beat the best-ever candidate.
    IntermediateNewBest,
    /// The cancellation flag was observed.
    PrematureCancelled,
    /// The iteration budget was used up.
    PrematureMaxIterations,
}

impl ReportReason {
    /// Whether this report ends the run.
    pub fn is_final(self) -> bool {
        !matches!(self, ReportReason::IntermediateNewBest)
    }
}

/// Payload of [`EvolveProblem::on_new_best`] and [`EvolveProblem::on_final`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RunResult<G> {
    /// Best genome, absent if no generation produced one.
    pub genome: Option<Vec<G>>,

    /// Score of [`genome`](Self::genome).
    pub score: Option<Vec<f64>>,

    pub reason: ReportReason,

    /// Winner score of every completed generation, oldest first.
    pub history: Vec<Vec<f64>>,

    /// Iterations performed when the report was made.
    pub iterations: usize,
}

impl<G: Clone> RunResult<G> {
    fn new(
        best: Option<&Candidate<G>>,
        reason: ReportReason,
        history: &[Vec<f64>],
        iterations: usize,
    ) -> Self {
        Self {
            genome: best.map(|c| c.genome().to_vec()),
            score: best.map(|c| c.score().to_vec()),
            reason,
            history: history.to_vec(),
            iterations,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Fresh,
    Running,
    Finished,
    Aborted,
}

type Shared<P> = Arc<Candidate<<P as EvolveProblem>::Gene>>;

/// Drives one evolutionary run.
///
/// All run state is owned here. Stepping must be sequential; when a
/// scheduler moves the evolver between threads it has to provide the
/// happens-before edge between consecutive steps.
///
/// # Usage
///
/// ```ignore
/// let config = EvolverConfig::new(vec![Direction::Minimize]).with_seed(42);
/// let result = Evolver::new(MyProblem::new(), config)?.run()?;
/// println!("best: {:?}", result.score);
/// ```
pub struct Evolver<P: EvolveProblem> {
    id: WorkerId,
    problem: P,
    config: EvolverConfig,
    seeds: Vec<Vec<P::Gene>>,
    cancel: Arc<AtomicBool>,

    phase: Phase,
    rng: Option<StdRng>,
    scored_seeds: Vec<Shared<P>>,
    population: Option<Vec<Shared<P>>>,
    best: Option<Shared<P>>,
    history: Vec<Vec<f64>>,
    iteration: usize,
    outcome: Option<RunResult<P::Gene>>,
}

impl<P: EvolveProblem> Evolver<P> {
    /// Creates a run for `problem`.
    ///
    /// # Errors
    ///
    /// [`EvolveError::Config`] if `config` does not validate.
    pub fn new(problem: P, config: EvolverConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            id: WorkerId::next(),
            problem,
            config,
            seeds: Vec::new(),
            cancel: Arc::new(AtomicBool::new(false)),
            phase: Phase::Fresh,
            rng: None,
            scored_seeds: Vec::new(),
            population: None,
            best: None,
            history: Vec::new(),
            iteration: 0,
            outcome: None,
        })
    }

    /// Predefined genomes placed first in the initial population.
    ///
    /// Each is scored exactly once, on the first step.
    pub fn with_seeds(mut self, seeds: Vec<Vec<P::Gene>>) -> Self {
        self.seeds = seeds;
        self
    }

    /// Uses an externally owned cancellation flag.
    pub fn with_cancel(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    /// Handle that cancels the run at the start of its next step.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn id(&self) -> WorkerId {
        self.id
    }

    pub fn problem(&self) -> &P {
        &self.problem
    }

    pub fn config(&self) -> &EvolverConfig {
        &self.config
    }

    /// Current population, absent until the seeding step ran.
    pub fn population(&self) -> Option<&[Shared<P>]> {
        self.population.as_deref()
    }

    pub fn best(&self) -> Option<&Shared<P>> {
        self.best.as_ref()
    }

    /// Winner score of every completed generation.
    pub fn history(&self) -> &[Vec<f64>] {
        &self.history
    }

    /// Iterations performed so far, including the seeding step.
    pub fn iterations(&self) -> usize {
        self.iteration
    }

    /// Whether `step` may still be called.
    pub fn is_terminal(&self) -> bool {
        matches!(self.phase, Phase::Finished | Phase::Aborted)
    }

    /// The final report, once the run has finished normally.
    pub fn outcome(&self) -> Option<&RunResult<P::Gene>> {
        self.outcome.as_ref()
    }

    /// Performs one unit of work. Returns `Ok(false)` once the run has
    /// finished and reported its final result.
    ///
    /// # Errors
    ///
    /// - [`EvolveError::RunFinished`] if a previous call returned `Ok(false)`
    /// - [`EvolveError::RunAborted`] if a previous call returned an error
    /// - any error raised while scoring, building the tree or breeding;
    ///   the run is aborted afterwards
    pub fn step(&mut self) -> Result<bool> {
        match self.phase {
            Phase::Finished => return Err(EvolveError::RunFinished),
            Phase::Aborted => return Err(EvolveError::RunAborted),
            Phase::Fresh | Phase::Running => {}
        }

        match self.advance() {
            Ok(true) => Ok(true),
            Ok(false) => {
                self.phase = Phase::Finished;
                Ok(false)
            }
            Err(e) => {
                self.phase = Phase::Aborted;
                Err(e)
            }
        }
    }

    /// Steps on the calling thread until the run finishes.
    pub fn run(mut self) -> Result<RunResult<P::Gene>> {
        while self.step()? {}
        self.outcome.take().ok_or(EvolveError::RunFinished)
    }

    /// Runs to completion on the calling thread when `scheduler` is `None`;
    /// otherwise hands the run to the scheduler and returns at once.
    pub fn start(self, scheduler: Option<&dyn Scheduler>) -> Result<Option<RunResult<P::Gene>>>
    where
        P: 'static,
    {
        match scheduler {
            None => self.run().map(Some),
            Some(scheduler) => {
                debug!("run {} handed to scheduler", self.id);
                scheduler.submit(Box::new(self));
                Ok(None)
            }
        }
    }

    fn advance(&mut self) -> Result<bool> {
        if self.phase == Phase::Fresh {
            self.initialize()?;
            self.phase = Phase::Running;
        }

        if self.cancel.load(Ordering::Relaxed) {
            self.finish(ReportReason::PrematureCancelled);
            return Ok(false);
        }
        if self.iteration >= self.config.max_iterations {
            self.finish(ReportReason::PrematureMaxIterations);
            return Ok(false);
        }

        self.iteration += 1;
        if self.population.is_none() {
            self.seed_population()?;
        } else {
            self.next_generation()?;
        }
        Ok(true)
    }

    fn initialize(&mut self) -> Result<()> {
        let seed = self.config.seed.unwrap_or_else(rand::random);
        self.rng = Some(StdRng::seed_from_u64(seed));
        self.history.clear();

        let breeder = Breeder::new(&self.problem, &self.config);
        self.scored_seeds = std::mem::take(&mut self.seeds)
            .into_iter()
            .map(|genome| breeder.evaluate(genome))
            .collect::<Result<_>>()?;

        debug!(
            "run {} initialised with rng seed {seed} and {} predefined genomes",
            self.id,
            self.scored_seeds.len()
        );
        Ok(())
    }

    fn seed_population(&mut self) -> Result<()> {
        let rng = self.rng.as_mut().ok_or(EvolveError::RunAborted)?;
        let breeder = Breeder::new(&self.problem, &self.config);
        let size = self.config.generation_size;

        let mut population: Vec<Shared<P>> = Vec::with_capacity(size);
        population.extend(self.scored_seeds.iter().take(size).cloned());
        while population.len() < size {
            population.push(breeder.fresh(rng)?);
        }

        debug!(
            "run {} seeded {} candidates ({} predefined)",
            self.id,
            population.len(),
            self.scored_seeds.len().min(size)
        );
        self.population = Some(population);
        Ok(())
    }

    fn next_generation(&mut self) -> Result<()> {
        let rng = self.rng.as_mut().ok_or(EvolveError::RunAborted)?;
        let population = self.population.as_deref().ok_or(EvolveError::EmptyPool)?;

        let tree = SelectionTree::build(
            population,
            &self.config.objectives,
            &self.config.selection,
            &self.config.speciation,
        )?;
        let next = Breeder::new(&self.problem, &self.config).breed(&tree, rng)?;
        let winner = tree
            .winner(self.config.selection.winner_closeness)
            .ok_or(EvolveError::EmptyPool)?;

        self.history.push(winner.score().to_vec());
        debug!(
            "run {} generation {}: population {}, winner {:?}",
            self.id,
            self.iteration,
            next.len(),
            winner.score()
        );

        let improved = match &self.best {
            None => true,
            Some(best) => winner.dominates(best, &self.config.objectives),
        };
        if improved {
            info!(
                "run {} new best at generation {}: {:?}",
                self.id,
                self.iteration,
                winner.score()
            );
            let report = RunResult::new(
                Some(&winner),
                ReportReason::IntermediateNewBest,
                &self.history,
                self.iteration,
            );
            self.best = Some(winner);
            self.problem.on_new_best(&report);
        }

        self.problem.on_generation(self.iteration, &next);
        self.population = Some(next);
        Ok(())
    }

    /// Reports the final result: the best-ever candidate, or nothing if no
    /// bred generation has completed yet.
    fn finish(&mut self, reason: ReportReason) {
        let best = self.best.clone();

        let result = RunResult::new(best.as_deref(), reason, &self.history, self.iteration);
        info!(
            "run {} finished after {} iterations ({:?}), best {:?}",
            self.id, self.iteration, reason, result.score
        );
        self.problem.on_final(&result);
        self.outcome = Some(result);
    }
}

impl<P: EvolveProblem + 'static> Worker for Evolver<P> {
    fn id(&self) -> WorkerId {
        self.id
    }

    fn step(&mut self) -> Result<bool> {
        Evolver::step(self)
    }
}

// ============================================================================
// Tests
// ============================================================================
