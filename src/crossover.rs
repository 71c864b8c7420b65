//! N-parent slice crossover.
//!
//! Recombines `K` equal-length parent genomes into `K` children. The genome
//! is cut into contiguous ranges and every range is copied verbatim from one
//! parent, chosen per child through a *donor map*.
//!
//! # Algorithm
//!
//! 1. Draw `num_slices` distinct cut points (clamped to `[1, L - 1]`),
//!    producing `num_slices + 1` contiguous ranges.
//! 2. The donor map of range 0 is a uniform random permutation of `0..K`.
//! 3. Every later donor map is a permutation in which no child keeps the
//!    donor it had for the previous range.
//! 4. Each child is assembled range by range from its designated donors.
//!
//! Because every donor map is a permutation, each parent contributes every
//! range exactly once across the brood, so no parent material is duplicated
//! or lost.
//!
//! The module also carries the power-shaped integer draw used by breeding
//! to favour small parent and slice counts.

use crate::error::{EvolveError, Result};
use rand::seq::{index, SliceRandom};
use rand::Rng;
use std::ops::Range;

/// Attempts per donor slot before the draw is declared exhausted.
pub const MAX_DONOR_TRIALS: usize = 1000;

// ============================================================================
// Crossover
// ============================================================================

/// Slice crossover over `parents.len()` parents.
///
/// Returns one child per parent. With a single parent the parent is
/// returned unchanged; callers normally mutate instead in that case.
///
/// # Errors
///
/// - [`EvolveError::EmptyPool`] if `parents` is empty
/// - [`EvolveError::GenomeLengthMismatch`] if the parents differ in length
/// - [`EvolveError::DonorExhausted`] if no valid donor map could be drawn
///
/// # Example
///
/// ```
/// use rand::{rngs::StdRng, SeedableRng};
/// use u_evolver::crossover::slice_crossover;
///
/// let mut rng = StdRng::seed_from_u64(7);
/// let a = ['a'; 4];
/// let b = ['b'; 4];
/// let children = slice_crossover(&[&a[..], &b[..]], 1, &mut rng).unwrap();
///
/// assert_eq!(children.len(), 2);
/// assert!(children.iter().all(|c| c.contains(&'a') && c.contains(&'b')));
/// ```
pub fn slice_crossover<G: Clone, R: Rng>(
    parents: &[&[G]],
    num_slices: usize,
    rng: &mut R,
) -> Result<Vec<Vec<G>>> {
    let (first, rest) = parents.split_first().ok_or(EvolveError::EmptyPool)?;
    let len = first.len();
    if let Some(odd) = rest.iter().find(|p| p.len() != len) {
        return Err(EvolveError::GenomeLengthMismatch {
            expected: len,
            found: odd.len(),
        });
    }

    if rest.is_empty() {
        return Ok(vec![first.to_vec()]);
    }

    if len < 2 {
        log::warn!("crossover on genomes of length {len}: nothing to slice, parents are only shuffled");
    }

    let ranges = slice_ranges(len, num_slices, rng);
    let maps = donor_maps(parents.len(), ranges.len(), rng)?;

    let mut children: Vec<Vec<G>> = (0..parents.len()).map(|_| Vec::with_capacity(len)).collect();
    for (range, map) in ranges.iter().zip(&maps) {
        for (child, &donor) in children.iter_mut().zip(map) {
            child.extend_from_slice(&parents[donor][range.clone()]);
        }
    }

    Ok(children)
}

/// Partitions `0..len` into `num_slices + 1` contiguous ranges at random
/// cut points. `num_slices` is clamped to `[1, len - 1]`.
///
/// Genomes shorter than 2 cannot be cut and yield a single range.
pub fn slice_ranges<R: Rng>(len: usize, num_slices: usize, rng: &mut R) -> Vec<Range<usize>> {
    if len < 2 {
        return vec![0..len];
    }

    let cuts = num_slices.clamp(1, len - 1);
    let mut points: Vec<usize> = index::sample(rng, len - 1, cuts)
        .into_iter()
        .map(|i| i + 1)
        .collect();
    points.sort_unstable();

    let mut ranges = Vec::with_capacity(cuts + 1);
    let mut start = 0;
    for point in points {
        ranges.push(start..point);
        start = point;
    }
    ranges.push(start..len);
    ranges
}

/// Builds one donor map per range for `parent_count` parents.
///
/// `maps[r][c]` is the parent that child `c` copies range `r` from.
pub fn donor_maps<R: Rng>(
    parent_count: usize,
    range_count: usize,
    rng: &mut R,
) -> Result<Vec<Vec<usize>>> {
    let mut maps: Vec<Vec<usize>> = Vec::with_capacity(range_count);
    if range_count == 0 {
        return Ok(maps);
    }

    let mut first: Vec<usize> = (0..parent_count).collect();
    first.shuffle(rng);
    maps.push(first);

    for range in 1..range_count {
        let next = next_donor_map(&maps[range - 1], range, rng)?;
        maps.push(next);
    }
    Ok(maps)
}

/// Draws a permutation that differs from `prev` at every position.
fn next_donor_map<R: Rng>(prev: &[usize], range: usize, rng: &mut R) -> Result<Vec<usize>> {
    let mut remaining: Vec<usize> = (0..prev.len()).collect();
    let mut map = Vec::with_capacity(prev.len());

    for child in 0..prev.len() {
        let pos = pick_donor(&remaining, prev, child, rng)
            .ok_or(EvolveError::DonorExhausted { range, child })?;
        map.push(remaining.swap_remove(pos));
    }
    Ok(map)
}

/// Picks a position in `remaining` whose donor differs from `prev[child]`.
///
/// When exactly two donors are left, the pick must also leave a donor the
/// last child may take; if the naive pick would strand the last child on
/// its previous donor, the two are swapped.
fn pick_donor<R: Rng>(
    remaining: &[usize],
    prev: &[usize],
    child: usize,
    rng: &mut R,
) -> Option<usize> {
    let last_pair = remaining.len() == 2;

    for _ in 0..MAX_DONOR_TRIALS {
        let pos = rng.random_range(0..remaining.len());
        let donor = remaining[pos];
        if donor == prev[child] {
            continue;
        }

        if last_pair {
            let other = remaining[1 - pos];
            if other == prev[child + 1] {
                if other != prev[child] && donor != prev[child + 1] {
                    return Some(1 - pos);
                }
                continue;
            }
        }
        return Some(pos);
    }
    None
}

// ============================================================================
// Shaped random draws
// ============================================================================

/// Draws an integer in `lo..=hi` as `lo + floor(u^exponent * (hi - lo + 1))`
/// with `u` uniform in `[0, 1)`.
///
/// Exponents above 1 bias the draw toward `lo`.
pub fn powered_range<R: Rng>(lo: usize, hi: usize, exponent: f64, rng: &mut R) -> usize {
    if hi <= lo {
        return lo;
    }
    let span = (hi - lo + 1) as f64;
    let u: f64 = rng.random();
    let offset = (u.powf(exponent) * span) as usize;
    (lo + offset).min(hi)
}

// ============================================================================
// Tests
// ============================================================================
