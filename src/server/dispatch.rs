//! Hands accepted connections to workers.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::config::DispatchMode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// Every worker slot is taken.
    Exhausted,
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::Exhausted => f.write_str("all workers are busy"),
        }
    }
}

impl std::error::Error for DispatchError {}

/// Runs each unit of work on its own tokio task.
///
/// `Bounded` holds one semaphore permit per running task for the task's
/// whole lifetime, so at most `workers` tasks exist at once. Submission never
/// waits: with no permit free the work is refused.
#[derive(Debug, Clone)]
pub enum Dispatcher {
    Bounded { permits: Arc<Semaphore>, workers: usize },
    Unbounded,
}

impl Dispatcher {
    pub fn new(mode: DispatchMode, workers: usize) -> Self {
        match mode {
            DispatchMode::Bounded => Self::bounded(workers),
            DispatchMode::Unbounded => Dispatcher::Unbounded,
        }
    }

    /// Capped at `Semaphore::MAX_PERMITS`.
    pub fn bounded(workers: usize) -> Self {
        let workers = workers.min(Semaphore::MAX_PERMITS);
        Dispatcher::Bounded {
            permits: Arc::new(Semaphore::new(workers)),
            workers,
        }
    }

    /// Spawns `work`, or returns `Exhausted` without running it.
    pub fn dispatch<F>(&self, work: F) -> Result<(), DispatchError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        match self {
            Dispatcher::Bounded { permits, .. } => {
                let permit = permits
                    .clone()
                    .try_acquire_owned()
                    .map_err(|_| DispatchError::Exhausted)?;

                tokio::spawn(async move {
                    work.await;
                    drop(permit);
                });
            }
            Dispatcher::Unbounded => {
                tokio::spawn(work);
            }
        }

        Ok(())
    }

    /// Free worker slots; `None` when unbounded.
    pub fn available(&self) -> Option<usize> {
        match self {
            Dispatcher::Bounded { permits, .. } => Some(permits.available_permits()),
            Dispatcher::Unbounded => None,
        }
    }

    /// Configured worker count; `None` when unbounded.
    pub fn capacity(&self) -> Option<usize> {
        match self {
            Dispatcher::Bounded { workers, .. } => Some(*workers),
            Dispatcher::Unbounded => None,
        }
    }
}
