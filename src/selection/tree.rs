//! Selection tree construction and traversal.
//!
//! # Algorithm
//!
//! Starting at objective 0, for the current set of items:
//!
//! 1. Sort by the objective, best first
//! 2. Keep the *best performers*: at least `min_kept` items, then every
//!    further item that is at least as good as `mean ± σ·multiplier`,
//!    stopping at the first one that is not
//! 3. Split the kept items into species
//! 4. For each species, recurse on the next objective
//!
//! The tree is rebuilt from scratch every generation. It holds `Arc`
//! handles to population members and no back references, so dropping it
//! is all the cleanup there is.

use super::config::SelectionConfig;
use super::species::Speciation;
use crate::error::{EvolveError, Result};
use crate::evolve::{Candidate, Direction};
use std::sync::Arc;

/// One group of candidates at one objective level.
///
/// `children` is present iff this is not the last objective. Each child's
/// items are a subset of this node's items.
#[derive(Debug, Clone)]
pub struct SelectionNode<G> {
    objective: usize,
    direction: Direction,
    items: Vec<Arc<Candidate<G>>>,
    children: Option<Vec<SelectionNode<G>>>,
}

impl<G> SelectionNode<G> {
    /// Index of the objective this node was sorted and filtered on.
    pub fn objective(&self) -> usize {
        self.objective
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Items sorted best first on [`objective`](Self::objective).
    pub fn items(&self) -> &[Arc<Candidate<G>>] {
        &self.items
    }

    pub fn children(&self) -> Option<&[SelectionNode<G>]> {
        self.children.as_deref()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }
}

/// The per-generation selection structure: one node tree per root species.
#[derive(Debug, Clone)]
pub struct SelectionTree<G> {
    roots: Vec<SelectionNode<G>>,
}

impl<G> SelectionTree<G> {
    /// Builds the tree for `population` over `objectives`.
    ///
    /// # Errors
    ///
    /// - [`EvolveError::EmptyPool`] if `population` or `objectives` is empty
    /// - [`EvolveError::MissingSpeciesPosition`] from k-means speciation
    pub fn build(
        population: &[Arc<Candidate<G>>],
        objectives: &[Direction],
        config: &SelectionConfig,
        speciation: &Speciation,
    ) -> Result<Self> {
        if population.is_empty() || objectives.is_empty() {
            return Err(EvolveError::EmptyPool);
        }
        let roots = build_level(population.to_vec(), 0, objectives, config, speciation)?;
        Ok(Self { roots })
    }

    pub fn roots(&self) -> &[SelectionNode<G>] {
        &self.roots
    }

    /// Every node of the tree, roots and descendants, in pre-order.
    pub fn nodes(&self) -> Vec<&SelectionNode<G>> {
        let mut out = Vec::new();
        let mut stack: Vec<&SelectionNode<G>> = self.roots.iter().rev().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            if let Some(children) = &node.children {
                stack.extend(children.iter().rev());
            }
        }
        out
    }

    /// Members of every leaf node, the survivors carried into the next
    /// generation.
    pub fn leaf_members(&self) -> Vec<Arc<Candidate<G>>> {
        self.nodes()
            .into_iter()
            .filter(|n| n.is_leaf())
            .flat_map(|n| n.items.iter().cloned())
            .collect()
    }

    /// The chain from the first root down through the first child at every
    /// level: the most preferred path under lexicographic ranking.
    pub fn winner_path(&self) -> Vec<&SelectionNode<G>> {
        let mut path = Vec::new();
        let mut level = self.roots.first();
        while let Some(node) = level {
            path.push(node);
            level = node.children.as_deref().and_then(|c| c.first());
        }
        path
    }

    /// Picks the generation winner from the deepest node of the
    /// [`winner_path`](Self::winner_path).
    ///
    /// For every objective except the last, the allowed bound lies
    /// `closeness` of the way from the best to the worst value found in
    /// that node. The first item within bounds on all of them wins; if
    /// none is, the node's first item is returned as a compromise.
    pub fn winner(&self, closeness: f64) -> Option<Arc<Candidate<G>>> {
        let path = self.winner_path();
        let deepest = path.last()?;
        let first = deepest.items.first()?;

        let directions: Vec<Direction> = path.iter().map(|n| n.direction).collect();
        let bounded = directions.len().saturating_sub(1);
        let bounds: Vec<f64> = (0..bounded)
            .map(|obj| {
                let (min, max) = deepest.items.iter().map(|c| c.objective(obj)).fold(
                    (f64::INFINITY, f64::NEG_INFINITY),
                    |(lo, hi), v| (lo.min(v), hi.max(v)),
                );
                let slack = (max - min) * closeness;
                match directions[obj] {
                    Direction::Maximize => max - slack,
                    Direction::Minimize => min + slack,
                }
            })
            .collect();

        let winner = deepest
            .items
            .iter()
            .find(|c| {
                bounds
                    .iter()
                    .zip(&directions)
                    .enumerate()
                    .all(|(obj, (&bound, dir))| dir.at_least_as_good(c.objective(obj), bound))
            })
            .unwrap_or(first);
        Some(Arc::clone(winner))
    }

    /// Number of levels along the winner path.
    pub fn depth(&self) -> usize {
        self.winner_path().len()
    }
}

fn build_level<G>(
    items: Vec<Arc<Candidate<G>>>,
    objective: usize,
    objectives: &[Direction],
    config: &SelectionConfig,
    speciation: &Speciation,
) -> Result<Vec<SelectionNode<G>>> {
    let direction = objectives[objective];
    let mut items = items;
    sort_by_objective(&mut items, objective, direction);
    let kept = best_performers(items, objective, direction, config);

    speciation
        .group(kept)?
        .into_iter()
        .map(|group| {
            let children = if objective + 1 < objectives.len() {
                Some(build_level(
                    group.clone(),
                    objective + 1,
                    objectives,
                    config,
                    speciation,
                )?)
            } else {
                None
            };
            Ok(SelectionNode {
                objective,
                direction,
                items: group,
                children,
            })
        })
        .collect()
}

/// Sorts best first on one objective. The sort is stable.
pub fn sort_by_objective<G>(items: &mut [Arc<Candidate<G>>], objective: usize, direction: Direction) {
    items.sort_by(|a, b| direction.best_first(a.objective(objective), b.objective(objective)));
}

/// Keeps the prefix of `sorted` that performs at least as well as the
/// threshold `mean ± σ·multiplier` (plus the guaranteed `min_kept`).
///
/// Mean and population standard deviation are taken over all of `sorted`.
/// The threshold moves toward the better side as the multiplier grows.
pub fn best_performers<G>(
    mut sorted: Vec<Arc<Candidate<G>>>,
    objective: usize,
    direction: Direction,
    config: &SelectionConfig,
) -> Vec<Arc<Candidate<G>>> {
    if sorted.len() <= config.min_kept {
        return sorted;
    }

    let values: Vec<f64> = sorted.iter().map(|c| c.objective(objective)).collect();
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let stddev = (values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n).sqrt();
    let threshold = match direction {
        Direction::Maximize => mean + stddev * config.stddev_multiplier,
        Direction::Minimize => mean - stddev * config.stddev_multiplier,
    };

    let keep = values
        .iter()
        .enumerate()
        .take_while(|&(i, &v)| i < config.min_kept || direction.at_least_as_good(v, threshold))
        .count();
    sorted.truncate(keep);
    sorted
}
