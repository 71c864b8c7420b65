//! Breeding a new population from a selection tree.
//!
//! A new generation is made of:
//!
//! 1. *New blood*: a small share of freshly generated candidates
//! 2. Children bred from randomly picked tree nodes until the generation
//!    size is reached
//! 3. Every leaf member of the tree, carried over unmodified
//!
//! Each child comes from asexual mutation of one parent or from slice
//! crossover over 2 or more distinct parents of the same pool.

use super::config::EvolverConfig;
use super::types::{Candidate, EvolveProblem};
use crate::crossover::{powered_range, slice_crossover};
use crate::error::{EvolveError, Result};
use crate::selection::SelectionTree;
use rand::seq::index;
use rand::Rng;
use std::sync::Arc;

type Shared<P> = Arc<Candidate<<P as EvolveProblem>::Gene>>;

/// Scores genomes and breeds generations for one problem/config pair.
pub(crate) struct Breeder<'a, P: EvolveProblem> {
    problem: &'a P,
    config: &'a EvolverConfig,
}

impl<'a, P: EvolveProblem> Breeder<'a, P> {
    pub(crate) fn new(problem: &'a P, config: &'a EvolverConfig) -> Self {
        Self { problem, config }
    }

    /// Scores a genome, checking the score arity and attaching a species
    /// position when speciation needs one.
    pub(crate) fn evaluate(&self, genome: Vec<P::Gene>) -> Result<Shared<P>> {
        let score = self.problem.score(&genome);
        let expected = self.config.objectives.len();
        if score.len() != expected {
            return Err(EvolveError::ScoreArity {
                expected,
                found: score.len(),
            });
        }

        let mut candidate = Candidate::new(genome, score);
        if self.config.speciation.needs_positions() {
            let position = self
                .problem
                .species_position(candidate.genome())
                .ok_or(EvolveError::MissingSpeciesPosition)?;
            candidate = candidate.with_position(position);
        }
        Ok(Arc::new(candidate))
    }

    /// Generates and scores a brand-new candidate.
    pub(crate) fn fresh<R: Rng>(&self, rng: &mut R) -> Result<Shared<P>> {
        let genome = self.problem.generate(rng);
        self.evaluate(genome)
    }

    /// Breeds the next population from `tree`.
    ///
    /// The result holds `generation_size` new candidates followed by the
    /// tree's leaf members.
    pub(crate) fn breed<R: Rng>(
        &self,
        tree: &SelectionTree<P::Gene>,
        rng: &mut R,
    ) -> Result<Vec<Shared<P>>> {
        let target = self.config.generation_size;
        let survivors = tree.leaf_members();
        let mut next = Vec::with_capacity(target + survivors.len());

        for _ in 0..self.config.new_blood_count().min(target) {
            next.push(self.fresh(rng)?);
        }

        let pools = tree.nodes();
        if pools.is_empty() {
            return Err(EvolveError::EmptyPool);
        }

        while next.len() < target {
            let pool = pools[rng.random_range(0..pools.len())].items();
            for genome in self.offspring(pool, rng)? {
                if next.len() >= target {
                    break;
                }
                next.push(self.evaluate(genome)?);
            }
        }

        next.extend(survivors);
        Ok(next)
    }

    /// Produces unscored child genomes from one breeding pool.
    pub(crate) fn offspring<R: Rng>(
        &self,
        pool: &[Shared<P>],
        rng: &mut R,
    ) -> Result<Vec<Vec<P::Gene>>> {
        if pool.is_empty() {
            return Err(EvolveError::EmptyPool);
        }

        let count = parent_count(pool.len(), self.config, rng);
        if count == 1 {
            let parent = &pool[rng.random_range(0..pool.len())];
            return Ok(vec![self.problem.mutate(parent.genome(), rng)]);
        }

        let parents: Vec<&[P::Gene]> = index::sample(rng, pool.len(), count)
            .into_iter()
            .map(|i| pool[i].genome())
            .collect();
        let len = parents[0].len();
        let slices = powered_range(
            1,
            len.saturating_sub(1).max(1),
            self.config.slice_count_exponent,
            rng,
        );
        let children = slice_crossover(&parents, slices, rng)?;

        if rng.random_bool(self.config.child_mutation_rate) {
            Ok(children
                .iter()
                .map(|child| self.problem.mutate(child, rng))
                .collect())
        } else {
            Ok(children)
        }
    }
}

/// Decides how many parents to draw from a pool of `pool_size`.
///
/// - 1 item: asexual
/// - 2 items: 1 parent with probability `ONE / (ONE + TWO)`, else 2
/// - 3+ items: 1 with probability `ONE`, 2 with probability `TWO`,
///   otherwise a power-shaped draw in `3..=min(pool_size, max_parents)`
pub(crate) fn parent_count<R: Rng>(pool_size: usize, config: &EvolverConfig, rng: &mut R) -> usize {
    let one = config.one_parent_weight;
    let two = config.two_parent_weight;
    match pool_size {
        0 | 1 => 1,
        2 => {
            let total = one + two;
            if total > 0.0 && rng.random::<f64>() < one / total {
                1
            } else {
                2
            }
        }
        n => {
            let r: f64 = rng.random();
            if r < one {
                1
            } else if r < one + two {
                2
            } else {
                powered_range(
                    3,
                    n.min(config.max_parents),
                    config.parent_count_exponent,
                    rng,
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evolve::Direction;
    use crate::selection::{SelectionConfig, Speciation};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Genomes of `len` identical digits; scoring sums them.
    struct Digits {
        len: usize,
        mutations: AtomicUsize,
        score_len: usize,
    }

    impl Digits {
        fn new(len: usize) -> Self {
            Self {
                len,
                mutations: AtomicUsize::new(0),
                score_len: 1,
            }
        }
    }

    impl EvolveProblem for Digits {
        type Gene = u8;

        fn generate<R: Rng>(&self, rng: &mut R) -> Vec<u8> {
            vec![rng.random_range(0..10); self.len]
        }

        fn score(&self, genome: &[u8]) -> Vec<f64> {
            vec![genome.iter().map(|&g| f64::from(g)).sum(); self.score_len]
        }

        fn mutate<R: Rng>(&self, genome: &[u8], _rng: &mut R) -> Vec<u8> {
            self.mutations.fetch_add(1, Ordering::Relaxed);
            genome.iter().map(|g| (g + 1) % 10).collect()
        }
    }

    fn config() -> EvolverConfig {
        EvolverConfig::new(vec![Direction::Maximize]).with_generation_size(20)
    }

    fn pool(problem: &Digits, digits: &[u8]) -> Vec<Arc<Candidate<u8>>> {
        let config = config();
        let breeder = Breeder::new(problem, &config);
        digits
            .iter()
            .map(|&d| breeder.evaluate(vec![d; problem.len]).unwrap())
            .collect()
    }

    #[test]
    fn test_parent_count_single_item_is_asexual() {
        let mut rng = StdRng::seed_from_u64(1);
        let config = config();
        for _ in 0..100 {
            assert_eq!(parent_count(1, &config, &mut rng), 1);
        }
    }

    #[test]
    fn test_parent_count_pair_split() {
        let mut rng = StdRng::seed_from_u64(2);
        let config = config();
        let mut ones = 0;
        for _ in 0..10_000 {
            let n = parent_count(2, &config, &mut rng);
            assert!(n == 1 || n == 2);
            if n == 1 {
                ones += 1;
            }
        }
        // ONE = TWO: about half
        assert!((4000..6000).contains(&ones), "ones = {ones}");
    }

    #[test]
    fn test_parent_count_pair_with_zero_weights() {
        let mut rng = StdRng::seed_from_u64(2);
        let config = config().with_parent_weights(0.0, 0.0);
        assert_eq!(parent_count(2, &config, &mut rng), 2);
    }

    #[test]
    fn test_parent_count_large_pool_distribution() {
        let mut rng = StdRng::seed_from_u64(3);
        let config = config();
        let mut counts = [0u32; 8];
        for _ in 0..20_000 {
            let n = parent_count(50, &config, &mut rng);
            assert!((1..=7).contains(&n));
            counts[n] += 1;
        }
        // 1 and 2 each take a quarter; 3..=7 share the rest, skewed low.
        assert!(counts[1] > 4000 && counts[1] < 6000, "{counts:?}");
        assert!(counts[2] > 4000 && counts[2] < 6000, "{counts:?}");
        assert!(counts[3] > counts[7], "{counts:?}");
    }

    #[test]
    fn test_parent_count_capped_by_pool() {
        let mut rng = StdRng::seed_from_u64(4);
        let config = config().with_parent_weights(0.0, 0.0);
        for _ in 0..500 {
            assert_eq!(parent_count(3, &config, &mut rng), 3);
            assert!(parent_count(4, &config, &mut rng) <= 4);
        }
    }

    #[test]
    fn test_evaluate_checks_arity() {
        let problem = Digits {
            score_len: 2,
            ..Digits::new(3)
        };
        let config = config();
        let breeder = Breeder::new(&problem, &config);
        assert_eq!(
            breeder.evaluate(vec![1, 1, 1]).unwrap_err(),
            EvolveError::ScoreArity {
                expected: 1,
                found: 2
            }
        );
    }

    #[test]
    fn test_evaluate_needs_position_under_kmeans() {
        let problem = Digits::new(3);
        let config = config().with_speciation(Speciation::KMeans {
            species: 2,
            max_rounds: 4,
        });
        let breeder = Breeder::new(&problem, &config);
        assert_eq!(
            breeder.evaluate(vec![1, 1, 1]).unwrap_err(),
            EvolveError::MissingSpeciesPosition
        );
    }

    #[test]
    fn test_offspring_from_single_member_mutates() {
        let problem = Digits::new(4);
        let config = config();
        let breeder = Breeder::new(&problem, &config);
        let pool = pool(&problem, &[3]);
        let mut rng = StdRng::seed_from_u64(5);

        let children = breeder.offspring(&pool, &mut rng).unwrap();
        assert_eq!(children, vec![vec![4, 4, 4, 4]]);
        assert_eq!(problem.mutations.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_offspring_crossover_mixes_parents() {
        let problem = Digits::new(6);
        let config = config()
            .with_parent_weights(0.0, 1.0)
            .with_child_mutation_rate(0.0);
        let breeder = Breeder::new(&problem, &config);
        let pool = pool(&problem, &[1, 2, 3, 4]);
        let mut rng = StdRng::seed_from_u64(6);

        for _ in 0..50 {
            let children = breeder.offspring(&pool, &mut rng).unwrap();
            assert_eq!(children.len(), 2);
            for child in &children {
                assert_eq!(child.len(), 6);
                let first = child[0];
                assert!(child.iter().any(|&g| g != first), "child not mixed: {child:?}");
            }
        }
        assert_eq!(problem.mutations.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_offspring_empty_pool() {
        let problem = Digits::new(2);
        let config = config();
        let breeder = Breeder::new(&problem, &config);
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(
            breeder.offspring(&[], &mut rng).unwrap_err(),
            EvolveError::EmptyPool
        );
    }

    #[test]
    fn test_breed_sizes_population() {
        let problem = Digits::new(5);
        let config = config();
        let breeder = Breeder::new(&problem, &config);
        let population = pool(&problem, &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
        let tree = SelectionTree::build(
            &population,
            &config.objectives,
            &SelectionConfig::default(),
            &Speciation::Single,
        )
        .unwrap();
        let survivors = tree.leaf_members();
        let mut rng = StdRng::seed_from_u64(8);

        let next = breeder.breed(&tree, &mut rng).unwrap();
        assert_eq!(next.len(), config.generation_size + survivors.len());
        // Survivors are the very same candidates, not re-scored copies.
        for (carried, original) in next[config.generation_size..].iter().zip(&survivors) {
            assert!(Arc::ptr_eq(carried, original));
        }
        assert!(next.iter().all(|c| c.genome().len() == 5 && c.score().len() == 1));
    }
}
