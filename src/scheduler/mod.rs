//! Cooperative stepping of many runs.
//!
//! A run exposes itself as a [`Worker`]: an identity plus a `step` that
//! does one bounded unit of work and says whether it wants another turn.
//! A [`Scheduler`] accepts workers and keeps stepping them, interleaving
//! as many as it holds.
//!
//! # Provided Schedulers
//!
//! - [`RoundRobin`]: Interleaves workers on the thread that drives it
//! - [`PooledScheduler`]: Spreads turns over a rayon thread pool
//!   (`parallel` feature)

#[cfg(feature = "parallel")]
mod pooled;
mod round_robin;
mod types;

#[cfg(feature = "parallel")]
pub use pooled::PooledScheduler;
pub use round_robin::RoundRobin;
pub use types::{Scheduler, Worker, WorkerId};
