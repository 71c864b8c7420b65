//! End-to-end runs through the public API.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use u_evolver::crossover::slice_crossover;
use u_evolver::evolve::{
    Direction, EvolveProblem, Evolver, EvolverConfig, ReportReason, RunResult,
};
use u_evolver::EvolveError;

/// Hands out 0, 1, 2, ... as length-1 genomes; the score is the gene.
#[derive(Default)]
struct Counter {
    next: AtomicU32,
}

impl EvolveProblem for Counter {
    type Gene = u32;

    fn generate<R: Rng>(&self, _rng: &mut R) -> Vec<u32> {
        vec![self.next.fetch_add(1, Ordering::SeqCst)]
    }

    fn score(&self, genome: &[u32]) -> Vec<f64> {
        vec![genome[0] as f64]
    }

    fn mutate<R: Rng>(&self, genome: &[u32], rng: &mut R) -> Vec<u32> {
        vec![genome[0] + rng.random_range(0..3)]
    }
}

/// Sum of squares distance to a target, plus a record of every report.
struct Target {
    target: Vec<i32>,
    scored: AtomicUsize,
    reports: Arc<Mutex<Vec<RunResult<i32>>>>,
}

impl Target {
    fn new(target: Vec<i32>) -> Self {
        Self {
            target,
            scored: AtomicUsize::new(0),
            reports: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl EvolveProblem for Target {
    type Gene = i32;

    fn generate<R: Rng>(&self, rng: &mut R) -> Vec<i32> {
        self.target.iter().map(|_| rng.random_range(-50..50)).collect()
    }

    fn score(&self, genome: &[i32]) -> Vec<f64> {
        self.scored.fetch_add(1, Ordering::SeqCst);
        let err: i64 = genome
            .iter()
            .zip(&self.target)
            .map(|(g, t)| i64::from(g - t).pow(2))
            .sum();
        vec![err as f64]
    }

    fn mutate<R: Rng>(&self, genome: &[i32], rng: &mut R) -> Vec<i32> {
        let mut out = genome.to_vec();
        let i = rng.random_range(0..out.len());
        out[i] += rng.random_range(-3..=3);
        out
    }

    fn on_new_best(&self, result: &RunResult<i32>) {
        self.reports.lock().unwrap().push(result.clone());
    }

    fn on_final(&self, result: &RunResult<i32>) {
        self.reports.lock().unwrap().push(result.clone());
    }
}

fn minimize() -> EvolverConfig {
    EvolverConfig::new(vec![Direction::Minimize])
}

#[test]
fn test_seeding_step_scores_generated_genomes() {
    let config = minimize().with_generation_size(10).with_max_iterations(1);
    let mut evolver = Evolver::new(Counter::default(), config).unwrap();

    assert!(evolver.step().unwrap());

    let population = evolver.population().unwrap();
    let mut scores: Vec<f64> = population.iter().map(|c| c.score()[0]).collect();
    scores.sort_by(f64::total_cmp);
    assert_eq!(scores, (0..10).map(f64::from).collect::<Vec<_>>());
    assert!(evolver.history().is_empty());
    assert!(evolver.best().is_none());
}

#[test]
fn test_budget_spent_on_seeding_reports_nothing() {
    let config = minimize().with_generation_size(10).with_max_iterations(1);
    let mut evolver = Evolver::new(Counter::default(), config).unwrap();

    assert!(evolver.step().unwrap());
    assert!(!evolver.step().unwrap());

    let outcome = evolver.outcome().unwrap();
    assert_eq!(outcome.reason, ReportReason::PrematureMaxIterations);
    assert!(outcome.history.is_empty());
    assert!(outcome.genome.is_none());
    assert!(outcome.score.is_none());
    assert!(evolver.best().is_none());
}

#[test]
fn test_two_parent_crossover_always_mixes() {
    let mut rng = StdRng::seed_from_u64(3);
    let a = ['A'; 4];
    let b = ['B'; 4];
    for _ in 0..100 {
        let children = slice_crossover(&[&a[..], &b[..]], 1, &mut rng).unwrap();
        assert_eq!(children.len(), 2);
        for child in &children {
            assert_eq!(child.len(), 4);
            assert!(child.contains(&'A') && child.contains(&'B'));
        }
    }
}

#[test]
fn test_seeded_optimum_is_never_lost() {
    let target = vec![7, -3, 12, 0, 25];
    let problem = Target::new(target.clone());
    let reports = Arc::clone(&problem.reports);
    let config = minimize()
        .with_generation_size(30)
        .with_max_iterations(25)
        .with_seed(11);

    let result = Evolver::new(problem, config)
        .unwrap()
        .with_seeds(vec![target.clone()])
        .run()
        .unwrap();

    assert_eq!(result.score, Some(vec![0.0]));
    assert_eq!(result.genome, Some(target));
    assert_eq!(result.reason, ReportReason::PrematureMaxIterations);
    assert_eq!(result.history.len(), 24);

    let reports = reports.lock().unwrap();
    assert!(reports.last().unwrap().reason.is_final());
    assert!(reports[..reports.len() - 1]
        .iter()
        .all(|r| r.reason == ReportReason::IntermediateNewBest));
}

#[test]
fn test_cancel_before_first_step() {
    let mut evolver = Evolver::new(Target::new(vec![1, 2, 3]), minimize()).unwrap();
    evolver.cancel_handle().store(true, Ordering::SeqCst);

    assert!(!evolver.step().unwrap());
    let outcome = evolver.outcome().unwrap();
    assert_eq!(outcome.reason, ReportReason::PrematureCancelled);
    assert!(outcome.genome.is_none());
    assert!(outcome.score.is_none());
    assert_eq!(evolver.step().unwrap_err(), EvolveError::RunFinished);
}

#[test]
fn test_cancel_mid_run_reports_best_so_far() {
    let problem = Target::new(vec![4, 4, 4, 4]);
    let config = minimize()
        .with_generation_size(20)
        .with_max_iterations(1000)
        .with_seed(5);
    let mut evolver = Evolver::new(problem, config).unwrap();
    let cancel = evolver.cancel_handle();

    for _ in 0..6 {
        assert!(evolver.step().unwrap());
    }
    cancel.store(true, Ordering::SeqCst);
    assert!(!evolver.step().unwrap());

    let outcome = evolver.outcome().unwrap();
    assert_eq!(outcome.reason, ReportReason::PrematureCancelled);
    assert_eq!(outcome.iterations, 6);
    assert_eq!(outcome.history.len(), 5);
    assert_eq!(
        outcome.score.as_deref(),
        evolver.best().map(|b| b.score())
    );
}

#[test]
fn test_best_score_never_regresses() {
    let problem = Target::new(vec![10, 20, 30, 40, 50, 60]);
    let reports = Arc::clone(&problem.reports);
    let config = minimize()
        .with_generation_size(40)
        .with_max_iterations(40)
        .with_seed(99);

    let result = Evolver::new(problem, config).unwrap().run().unwrap();

    let reports = reports.lock().unwrap();
    let bests: Vec<f64> = reports
        .iter()
        .filter(|r| r.reason == ReportReason::IntermediateNewBest)
        .map(|r| r.score.as_ref().unwrap()[0])
        .collect();
    assert!(!bests.is_empty());
    assert!(bests.windows(2).all(|w| w[1] < w[0]));
    assert_eq!(result.score.unwrap()[0], *bests.last().unwrap());
}

#[test]
fn test_predefined_genomes_scored_once() {
    let problem = Target::new(vec![0, 0]);
    let config = minimize()
        .with_generation_size(5)
        .with_max_iterations(1)
        .with_seed(1);
    let mut evolver = Evolver::new(problem, config)
        .unwrap()
        .with_seeds(vec![vec![1, 1], vec![2, 2]]);

    assert!(evolver.step().unwrap());
    assert!(!evolver.step().unwrap());
    // two seeds plus three generated
    assert_eq!(evolver.problem().scored.load(Ordering::SeqCst), 5);
}
