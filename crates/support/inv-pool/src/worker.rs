//! Bounded worker pool.

use futures::FutureExt;
use futures::future::{BoxFuture, join_all};
use inv_error::{InventoryError, Result};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, error, trace, warn};

type Task = BoxFuture<'static, Result<()>>;

/// Fixed-size pool of async workers fronted by a FIFO queue of `capacity` slots.
///
/// [`submit`](Self::submit) waits while every slot is taken, so an unbounded
/// producer is held to O(capacity + workers) tasks in memory. A task that
/// returns an error or panics is logged and counted; sibling tasks keep running.
pub struct WorkerPool {
    name: Arc<str>,
    sender: mpsc::Sender<Task>,
    workers: Vec<JoinHandle<()>>,
    counters: Arc<Counters>,
}

#[derive(Debug, Default)]
struct Counters {
    submitted: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
    panicked: AtomicU64,
}

/// Task outcomes after a pool has drained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub submitted: u64,
    pub completed: u64,
    pub failed: u64,
    pub panicked: u64,
}

impl PoolStats {
    /// Tasks that did not complete successfully.
    pub fn unsuccessful(&self) -> u64 {
        self.failed + self.panicked
    }
}

impl WorkerPool {
    /// Start `workers` workers draining a queue of `capacity` slots.
    ///
    /// Both values are raised to at least 1. Must be called inside a tokio runtime.
    pub fn new(name: impl Into<String>, workers: usize, capacity: usize) -> Self {
        let name: Arc<str> = Arc::from(name.into());
        let workers = workers.max(1);
        let capacity = capacity.max(1);

        let (sender, receiver) = mpsc::channel::<Task>(capacity);
        let receiver = Arc::new(Mutex::new(receiver));
        let counters = Arc::new(Counters::default());

        let handles = (0..workers)
            .map(|worker_id| {
                let receiver = receiver.clone();
                let counters = counters.clone();
                let name = name.clone();
                tokio::spawn(async move {
                    worker_loop(name, worker_id, receiver, counters).await;
                })
            })
            .collect();

        debug!(pool = %name, workers, capacity, "Started worker pool");

        Self {
            name,
            sender,
            workers: handles,
            counters,
        }
    }

    /// Queue a task, waiting while the queue is full.
    pub async fn submit<F>(&self, task: F) -> Result<()>
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        self.sender
            .send(task.boxed())
            .await
            .map_err(|_| InventoryError::PoolClosed(self.name.to_string()))?;
        self.counters.submitted.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Close the queue and wait until every submitted task has finished.
    pub async fn shutdown(self) -> PoolStats {
        let Self {
            name,
            sender,
            workers,
            counters,
        } = self;

        drop(sender);

        for (i, result) in join_all(workers).await.into_iter().enumerate() {
            if let Err(e) = result {
                error!(pool = %name, worker = i, error = %e, "Worker task ended abnormally");
            }
        }

        let stats = snapshot(&counters);
        debug!(
            pool = %name,
            completed = stats.completed,
            failed = stats.failed,
            panicked = stats.panicked,
            "Worker pool drained"
        );
        stats
    }

    /// Current counters without waiting for the queue to drain.
    pub fn stats(&self) -> PoolStats {
        snapshot(&self.counters)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn num_workers(&self) -> usize {
        self.workers.len()
    }
}

fn snapshot(counters: &Counters) -> PoolStats {
    PoolStats {
        submitted: counters.submitted.load(Ordering::Relaxed),
        completed: counters.completed.load(Ordering::Relaxed),
        failed: counters.failed.load(Ordering::Relaxed),
        panicked: counters.panicked.load(Ordering::Relaxed),
    }
}

async fn worker_loop(
    pool: Arc<str>,
    worker_id: usize,
    receiver: Arc<Mutex<mpsc::Receiver<Task>>>,
    counters: Arc<Counters>,
) {
    loop {
        // Only one worker waits on the queue at a time; the lock is released
        // before the task runs.
        let task = {
            let mut rx = receiver.lock().await;
            rx.recv().await
        };

        let Some(task) = task else {
            trace!(pool = %pool, worker = worker_id, "Queue closed, worker exiting");
            break;
        };

        match AssertUnwindSafe(task).catch_unwind().await {
            Ok(Ok(())) => {
                counters.completed.fetch_add(1, Ordering::Relaxed);
            }
            Ok(Err(e)) => {
                counters.failed.fetch_add(1, Ordering::Relaxed);
                warn!(pool = %pool, worker = worker_id, error = %e, "Task failed");
            }
            Err(panic) => {
                counters.panicked.fetch_add(1, Ordering::Relaxed);
                let message = panic_message(panic.as_ref());
                error!(
                    pool = %pool,
                    worker = worker_id,
                    error = %InventoryError::TaskPanicked(message),
                    "Task panicked"
                );
            }
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
