//! Worker and scheduler contracts.

use crate::error::Result;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-unique identity of a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkerId(u64);

impl WorkerId {
    /// Allocates a fresh id.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A unit of cooperative work.
///
/// `step` must run to completion without blocking. `Ok(true)` asks for
/// another turn, `Ok(false)` retires the worker, and an error retires it
/// as failed.
pub trait Worker: Send {
    fn id(&self) -> WorkerId;

    fn step(&mut self) -> Result<bool>;
}

/// Accepts workers and steps them until they retire.
///
/// Implementations must never step one worker from two threads at once
/// and must order consecutive steps of the same worker.
pub trait Scheduler {
    /// Takes ownership of `worker` and returns without stepping it.
    fn submit(&self, worker: Box<dyn Worker>);
}
