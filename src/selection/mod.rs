//! Hierarchical multi-objective selection.
//!
//! Each generation the population is folded into a [`SelectionTree`]: one
//! nesting level per ranked objective, each level sorting its items on
//! that objective and keeping only the better-than-average prefix. The
//! tree serves two purposes:
//!
//! - every node is a breeding pool for the next generation
//! - the first path from the root downward names the generation winner
//!
//! Items at each level can be split into several species by a
//! [`Speciation`] strategy before the next objective is applied.
//!
//! # Key Types
//!
//! - [`SelectionConfig`]: Threshold and winner tolerance parameters
//! - [`SelectionNode`]: One filtered group at one objective level
//! - [`SelectionTree`]: The root groups plus traversal helpers
//! - [`Speciation`]: Grouping strategy (single group or k-means)

mod config;
mod species;
mod tree;

pub use config::SelectionConfig;
pub use species::Speciation;
pub use tree::{best_performers, sort_by_objective, SelectionNode, SelectionTree};
