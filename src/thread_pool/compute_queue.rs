//! Completion queue for background jobs
//!
//! `submit` runs work off-thread and parks its continuation in a shared
//! queue once the work finishes. `drain` runs the parked continuations on
//! the calling thread, in completion order, against a caller-owned context.
//! Every submitted continuation runs exactly once: panics and errors inside
//! the work are captured and delivered as `ComputeError`.

use super::error::{panic_message, ComputeError};
use crate::constants::compute::{IDLE_POLL_INTERVAL_MS, THREAD_NAME_PREFIX};
use crate::error::{TerrainError, TerrainResult};
use parking_lot::Mutex;
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// How background jobs get a thread
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpawnStrategy {
    /// One new named thread per job
    #[default]
    Dedicated,
    /// Shared rayon pool. `threads = 0` sizes it from the CPU count.
    Pooled { threads: usize },
}

type Completion<C> = Box<dyn FnOnce(&mut C) + Send + 'static>;

/// Lock-free job counters
#[derive(Debug, Default)]
pub struct QueueCounters {
    pub tasks_submitted: AtomicU64,
    pub tasks_completed: AtomicU64,
    pub tasks_delivered: AtomicU64,
    pub tasks_failed: AtomicU64,
    pub total_execution_time_ns: AtomicU64,
}

impl QueueCounters {
    fn record_execution(&self, elapsed: Duration, failed: bool) {
        self.tasks_completed.fetch_add(1, Ordering::Relaxed);
        self.total_execution_time_ns
            .fetch_add(elapsed.as_nanos() as u64, Ordering::Relaxed);
        if failed {
            self.tasks_failed.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Snapshot of `QueueCounters`
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ComputeQueueStats {
    pub tasks_submitted: u64,
    pub tasks_completed: u64,
    pub tasks_delivered: u64,
    pub tasks_failed: u64,
    /// Submitted but not yet delivered
    pub in_flight: u64,
    pub average_task_time_ms: f64,
}

enum Executor {
    Dedicated,
    Pooled(ThreadPool),
}

impl Executor {
    fn spawn<F>(&self, label: &str, job: F) -> Result<(), String>
    where
        F: FnOnce() + Send + 'static,
    {
        match self {
            Executor::Dedicated => thread::Builder::new()
                .name(format!("{}-{}", THREAD_NAME_PREFIX, label))
                .spawn(job)
                .map(|_| ())
                .map_err(|e| e.to_string()),
            Executor::Pooled(pool) => {
                pool.spawn(job);
                Ok(())
            }
        }
    }
}

/// Background job runner whose continuations run against a context `C`
pub struct ComputeQueue<C> {
    completed: Arc<Mutex<VecDeque<Completion<C>>>>,
    counters: Arc<QueueCounters>,
    executor: Executor,
}

impl<C: 'static> ComputeQueue<C> {
    pub fn new(strategy: SpawnStrategy) -> TerrainResult<Self> {
        let executor = match strategy {
            SpawnStrategy::Dedicated => Executor::Dedicated,
            SpawnStrategy::Pooled { threads } => {
                let threads = if threads == 0 {
                    num_cpus::get().saturating_sub(1).max(1)
                } else {
                    threads
                };
                let pool = ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .thread_name(|idx| format!("{}-worker-{}", THREAD_NAME_PREFIX, idx))
                    .build()
                    .map_err(|e| TerrainError::SystemError {
                        component: "ComputeQueue".to_string(),
                        error: format!("Failed to create worker pool: {}", e),
                    })?;
                log::info!("[ComputeQueue] Created worker pool with {} threads", threads);
                Executor::Pooled(pool)
            }
        };

        Ok(Self {
            completed: Arc::new(Mutex::new(VecDeque::new())),
            counters: Arc::new(QueueCounters::default()),
            executor,
        })
    }

    /// One thread per job; never fails to construct
    pub fn dedicated() -> Self {
        Self {
            completed: Arc::new(Mutex::new(VecDeque::new())),
            counters: Arc::new(QueueCounters::default()),
            executor: Executor::Dedicated,
        }
    }

    /// Run `work` in the background. `continuation` receives its result on
    /// the thread that calls `drain`.
    pub fn submit<T, W, K>(&self, label: impl Into<String>, work: W, continuation: K)
    where
        T: Send + 'static,
        W: FnOnce() -> TerrainResult<T> + Send + 'static,
        K: FnOnce(&mut C, Result<T, ComputeError>) + Send + 'static,
    {
        let label = label.into();
        self.counters.tasks_submitted.fetch_add(1, Ordering::Relaxed);
        log::debug!("[ComputeQueue] Submitted '{}'", label);

        // Shared so a failed spawn can still deliver to the continuation
        let slot = Arc::new(Mutex::new(Some(continuation)));

        let job = {
            let slot = Arc::clone(&slot);
            let completed = Arc::clone(&self.completed);
            let counters = Arc::clone(&self.counters);
            let label = label.clone();
            move || {
                let start = Instant::now();
                let outcome = run_guarded(&label, work);
                if let Err(e) = &outcome {
                    log::warn!("[ComputeQueue] {}", e);
                }
                counters.record_execution(start.elapsed(), outcome.is_err());
                park(&completed, &slot, outcome);
            }
        };

        if let Err(message) = self.executor.spawn(&label, job) {
            log::error!("[ComputeQueue] Failed to start '{}': {}", label, message);
            self.counters.tasks_failed.fetch_add(1, Ordering::Relaxed);
            park(
                &self.completed,
                &slot,
                Err::<T, _>(ComputeError::SpawnFailed { label, message }),
            );
        }
    }

    /// Run every continuation that became ready since the last drain.
    /// Returns how many ran.
    pub fn drain(&self, ctx: &mut C) -> usize {
        let batch = std::mem::take(&mut *self.completed.lock());
        let count = batch.len();
        for completion in batch {
            completion(ctx);
            self.counters.tasks_delivered.fetch_add(1, Ordering::Relaxed);
        }
        if count > 0 {
            log::debug!("[ComputeQueue] Delivered {} results", count);
        }
        count
    }

    /// Drain repeatedly until nothing is in flight or the timeout passes.
    /// Blocks the caller; meant for tools and tests, never for a frame loop.
    pub fn drain_until_idle(&self, ctx: &mut C, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            self.drain(ctx);
            if self.in_flight() == 0 {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(Duration::from_millis(IDLE_POLL_INTERVAL_MS));
        }
    }

    pub fn in_flight(&self) -> u64 {
        let submitted = self.counters.tasks_submitted.load(Ordering::Acquire);
        let delivered = self.counters.tasks_delivered.load(Ordering::Acquire);
        submitted.saturating_sub(delivered)
    }

    /// Results waiting for the next drain
    pub fn ready_count(&self) -> usize {
        self.completed.lock().len()
    }

    pub fn stats(&self) -> ComputeQueueStats {
        let counters = &self.counters;
        let completed = counters.tasks_completed.load(Ordering::Relaxed);
        let total_ns = counters.total_execution_time_ns.load(Ordering::Relaxed);
        ComputeQueueStats {
            tasks_submitted: counters.tasks_submitted.load(Ordering::Relaxed),
            tasks_completed: completed,
            tasks_delivered: counters.tasks_delivered.load(Ordering::Relaxed),
            tasks_failed: counters.tasks_failed.load(Ordering::Relaxed),
            in_flight: self.in_flight(),
            average_task_time_ms: if completed > 0 {
                total_ns as f64 / completed as f64 / 1_000_000.0
            } else {
                0.0
            },
        }
    }
}

fn run_guarded<T>(label: &str, work: impl FnOnce() -> TerrainResult<T>) -> Result<T, ComputeError> {
    match panic::catch_unwind(AssertUnwindSafe(work)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(error)) => Err(ComputeError::TaskFailed {
            label: label.to_string(),
            message: error.to_string(),
        }),
        Err(payload) => Err(ComputeError::TaskPanicked {
            label: label.to_string(),
            message: panic_message(payload.as_ref()),
        }),
    }
}

fn park<C, T, K>(
    completed: &Mutex<VecDeque<Completion<C>>>,
    slot: &Mutex<Option<K>>,
    outcome: Result<T, ComputeError>,
) where
    C: 'static,
    T: Send + 'static,
    K: FnOnce(&mut C, Result<T, ComputeError>) + Send + 'static,
{
    if let Some(continuation) = slot.lock().take() {
        completed
            .lock()
            .push_back(Box::new(move |ctx: &mut C| continuation(ctx, outcome)));
    }
}
