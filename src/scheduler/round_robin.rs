//! Single-thread round-robin scheduler.

use super::types::{Scheduler, Worker, WorkerId};
use crate::error::EvolveError;
use log::{debug, error};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Interleaves workers on whichever thread calls [`turn`](Self::turn).
///
/// Each turn pops the front worker, steps it once and, if it wants more,
/// pushes it to the back. The queue is not locked while a worker steps,
/// so a worker may submit further workers to the same scheduler.
///
/// # Examples
///
/// ```ignore
/// let scheduler = RoundRobin::new();
/// Evolver::new(problem_a, config.clone())?.start(Some(&scheduler))?;
/// Evolver::new(problem_b, config)?.start(Some(&scheduler))?;
/// scheduler.run_until_idle();
/// ```
#[derive(Default)]
pub struct RoundRobin {
    queue: Mutex<VecDeque<Box<dyn Worker>>>,
    failures: Mutex<Vec<(WorkerId, EvolveError)>>,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Workers waiting for a turn.
    pub fn pending(&self) -> usize {
        lock(&self.queue).len()
    }

    /// Steps the front worker once. Returns `false` if the queue was empty.
    pub fn turn(&self) -> bool {
        let Some(mut worker) = lock(&self.queue).pop_front() else {
            return false;
        };

        match worker.step() {
            Ok(true) => lock(&self.queue).push_back(worker),
            Ok(false) => debug!("worker {} retired", worker.id()),
            Err(e) => {
                error!("worker {} failed: {e}", worker.id());
                lock(&self.failures).push((worker.id(), e));
            }
        }
        true
    }

    /// Takes turns until no worker is left. Returns the number of turns.
    pub fn run_until_idle(&self) -> usize {
        let mut turns = 0;
        while self.turn() {
            turns += 1;
        }
        turns
    }

    /// Drains the errors of workers that retired as failed.
    pub fn take_failures(&self) -> Vec<(WorkerId, EvolveError)> {
        std::mem::take(&mut *lock(&self.failures))
    }
}

impl Scheduler for RoundRobin {
    fn submit(&self, worker: Box<dyn Worker>) {
        debug!("worker {} queued", worker.id());
        lock(&self.queue).push_back(worker);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
