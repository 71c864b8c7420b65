//! Thread-pool scheduler.

use super::types::{Scheduler, Worker, WorkerId};
use crate::error::EvolveError;
use log::{debug, error};
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

/// Steps workers on a rayon thread pool.
///
/// Every turn is a FIFO spawn; a worker that wants another turn is
/// re-spawned at the back, so workers alternate the way they do under
/// [`RoundRobin`](super::RoundRobin). A worker is only ever owned by the
/// one task that steps it, and moving it into the next task orders its
/// consecutive steps.
pub struct PooledScheduler {
    pool: Arc<ThreadPool>,
    state: Arc<PoolState>,
}

#[derive(Default)]
struct PoolState {
    active: Mutex<usize>,
    idle: Condvar,
    failures: Mutex<Vec<(WorkerId, EvolveError)>>,
}

impl PoolState {
    fn enlist(&self) {
        *lock(&self.active) += 1;
    }

    fn retire(&self) {
        let mut active = lock(&self.active);
        *active = active.saturating_sub(1);
        if *active == 0 {
            self.idle.notify_all();
        }
    }
}

impl PooledScheduler {
    /// Creates a scheduler with `threads` worker threads (0 = rayon default).
    pub fn new(threads: usize) -> Result<Self, ThreadPoolBuildError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("u-evolver-{i}"))
            .build()?;
        Ok(Self {
            pool: Arc::new(pool),
            state: Arc::new(PoolState::default()),
        })
    }

    /// Workers submitted and not yet retired.
    pub fn active(&self) -> usize {
        *lock(&self.state.active)
    }

    /// Blocks until every submitted worker has retired.
    pub fn wait_idle(&self) {
        let mut active = lock(&self.state.active);
        while *active > 0 {
            active = self
                .state
                .idle
                .wait(active)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Drains the errors of workers that retired as failed.
    pub fn take_failures(&self) -> Vec<(WorkerId, EvolveError)> {
        std::mem::take(&mut *lock(&self.state.failures))
    }
}

impl Scheduler for PooledScheduler {
    fn submit(&self, worker: Box<dyn Worker>) {
        debug!("worker {} submitted to pool", worker.id());
        self.state.enlist();
        let pool = Arc::clone(&self.pool);
        let state = Arc::clone(&self.state);
        self.pool.spawn_fifo(move || turn(pool, state, worker));
    }
}

fn turn(pool: Arc<ThreadPool>, state: Arc<PoolState>, mut worker: Box<dyn Worker>) {
    match worker.step() {
        Ok(true) => {
            let next = Arc::clone(&pool);
            pool.spawn_fifo(move || turn(next, state, worker));
            return;
        }
        Ok(false) => debug!("worker {} retired", worker.id()),
        Err(e) => {
            error!("worker {} failed: {e}", worker.id());
            lock(&state.failures).push((worker.id(), e));
        }
    }
    state.retire();
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
