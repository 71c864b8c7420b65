//! Species grouping strategies.
//!
//! After the threshold filter, a level's kept items are split into one or
//! more species. Each species becomes its own [`SelectionNode`] and is
//! filtered independently on the next objective, so breeding can stay
//! inside a niche instead of collapsing onto a single region.
//!
//! [`SelectionNode`]: super::SelectionNode

use crate::error::{EvolveError, Result};
use crate::evolve::Candidate;
use std::sync::Arc;

/// How kept items are grouped into species.
///
/// The strategy is picked by configuration only; a problem that reports
/// species positions still gets a single group under
/// [`Speciation::Single`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Speciation {
    /// All kept items form one group.
    #[default]
    Single,

    /// Lloyd's k-means over candidate species positions.
    ///
    /// Centroids are seeded with the positions of the `species` best kept
    /// items. Empty clusters are dropped, so fewer groups may come back.
    /// Groups are ordered by the rank of their best member and keep the
    /// incoming order internally.
    ///
    /// Reference: Lloyd (1982), "Least squares quantization in PCM"
    KMeans {
        /// Upper bound on the number of groups.
        species: usize,
        /// Assignment/update rounds before giving up on convergence.
        max_rounds: usize,
    },
}

impl Speciation {
    /// Whether candidates must carry a species position.
    pub fn needs_positions(&self) -> bool {
        matches!(self, Speciation::KMeans { .. })
    }

    /// Splits sorted `items` into species. Never returns an empty group.
    ///
    /// # Errors
    ///
    /// [`EvolveError::MissingSpeciesPosition`] if k-means is configured and
    /// an item has no position.
    pub fn group<G>(&self, items: Vec<Arc<Candidate<G>>>) -> Result<Vec<Vec<Arc<Candidate<G>>>>> {
        if items.is_empty() {
            return Ok(Vec::new());
        }
        match *self {
            Speciation::Single => Ok(vec![items]),
            Speciation::KMeans {
                species,
                max_rounds,
            } => kmeans(items, species, max_rounds),
        }
    }
}

fn kmeans<G>(
    items: Vec<Arc<Candidate<G>>>,
    species: usize,
    max_rounds: usize,
) -> Result<Vec<Vec<Arc<Candidate<G>>>>> {
    let positions: Vec<&[f64]> = items
        .iter()
        .map(|c| c.position().ok_or(EvolveError::MissingSpeciesPosition))
        .collect::<Result<_>>()?;

    let k = species.clamp(1, items.len());
    let dim = positions[0].len();
    let mut centroids: Vec<Vec<f64>> = positions[..k].iter().map(|p| p.to_vec()).collect();
    let mut assignment = vec![0usize; items.len()];

    for round in 0..max_rounds.max(1) {
        let mut changed = round == 0;
        for (slot, position) in assignment.iter_mut().zip(&positions) {
            let nearest = nearest_centroid(&centroids, position);
            if nearest != *slot {
                *slot = nearest;
                changed = true;
            }
        }
        if !changed {
            break;
        }

        let mut sums = vec![vec![0.0; dim]; k];
        let mut counts = vec![0usize; k];
        for (&cluster, position) in assignment.iter().zip(&positions) {
            counts[cluster] += 1;
            for (acc, &x) in sums[cluster].iter_mut().zip(position.iter()) {
                *acc += x;
            }
        }
        for ((centroid, sum), &count) in centroids.iter_mut().zip(sums).zip(&counts) {
            if count > 0 {
                *centroid = sum.into_iter().map(|s| s / count as f64).collect();
            }
        }
    }

    // Order clusters by their first (best-ranked) member.
    let mut order = Vec::with_capacity(k);
    let mut groups: Vec<Vec<Arc<Candidate<G>>>> = (0..k).map(|_| Vec::new()).collect();
    for (item, &cluster) in items.into_iter().zip(&assignment) {
        if groups[cluster].is_empty() {
            order.push(cluster);
        }
        groups[cluster].push(item);
    }
    Ok(order
        .into_iter()
        .map(|cluster| std::mem::take(&mut groups[cluster]))
        .collect())
}

fn nearest_centroid(centroids: &[Vec<f64>], position: &[f64]) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (i, centroid) in centroids.iter().enumerate() {
        let dist: f64 = centroid
            .iter()
            .zip(position)
            .map(|(a, b)| (a - b) * (a - b))
            .sum();
        if dist < best_dist {
            best = i;
            best_dist = dist;
        }
    }
    best
}
