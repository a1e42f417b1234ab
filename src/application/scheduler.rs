//! Background scheduling of whitelist recomputation.
//!
//! Enforces at-most-one in-flight compute job per repository id. A
//! trigger arriving while a job runs sets a rerun flag instead of
//! starting a second job; the finishing job clears the flag and runs
//! exactly once more. Bursts of triggers therefore coalesce into a
//! single recomputation, which is sound because jobs are idempotent on
//! current configuration state, not on trigger history.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Notify, Semaphore};
use tracing::{debug, warn};

use crate::domain::{DomainError, RepositoryId};

/// Executes one compute job for one repository id.
///
/// The production runner is `ComputeWhitelistUseCase`; tests substitute
/// runners that park or count.
#[async_trait]
pub trait ComputeRunner: Send + Sync {
    async fn run(&self, id: &RepositoryId) -> Result<(), DomainError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JobState {
    Running,
    RunningRerunPending,
}

/// Per-id job bookkeeping shared with the spawned worker tasks.
struct SchedulerShared {
    jobs: Mutex<HashMap<RepositoryId, JobState>>,
    runner: Arc<dyn ComputeRunner>,
    limiter: Semaphore,
    in_flight: AtomicUsize,
    drained: Notify,
    shutting_down: AtomicBool,
}

/// Decides when compute jobs run and bounds their concurrency.
pub struct UpdateScheduler {
    shared: Arc<SchedulerShared>,
}

impl UpdateScheduler {
    pub fn new(runner: Arc<dyn ComputeRunner>, max_concurrent_jobs: usize) -> Self {
        Self {
            shared: Arc::new(SchedulerShared {
                jobs: Mutex::new(HashMap::new()),
                runner,
                limiter: Semaphore::new(max_concurrent_jobs.max(1)),
                in_flight: AtomicUsize::new(0),
                drained: Notify::new(),
                shutting_down: AtomicBool::new(false),
            }),
        }
    }

    /// Requests a recomputation for `id`. Returns immediately; the job
    /// runs on the worker pool. Triggers received during shutdown are
    /// dropped.
    pub fn enqueue(&self, id: RepositoryId) {
        let shared = Arc::clone(&self.shared);

        if shared.shutting_down.load(Ordering::SeqCst) {
            debug!(repository = %id, "Dropping trigger, scheduler shutting down");
            return;
        }

        {
            let mut jobs = shared.jobs.lock().expect("scheduler lock poisoned");
            if let Some(state) = jobs.get_mut(&id) {
                // Coalesce: one follow-up run regardless of how many
                // triggers land while the job is in flight.
                *state = JobState::RunningRerunPending;
                debug!(repository = %id, "Coalesced trigger into pending rerun");
                return;
            }
            jobs.insert(id.clone(), JobState::Running);
        }

        shared.in_flight.fetch_add(1, Ordering::SeqCst);
        tokio::spawn(async move {
            run_job_loop(&shared, &id).await;
            if shared.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
                shared.drained.notify_waiters();
            }
        });
    }

    pub fn enqueue_all(&self, ids: impl IntoIterator<Item = RepositoryId>) {
        for id in ids {
            self.enqueue(id);
        }
    }

    /// Number of repository ids with an active job.
    pub fn active_jobs(&self) -> usize {
        self.shared.jobs.lock().expect("scheduler lock poisoned").len()
    }

    /// Stops accepting triggers and waits up to `grace` for in-flight
    /// jobs to finish. Stragglers keep running detached; their results
    /// are written through the same store path and cannot corrupt it.
    pub async fn shutdown(&self, grace: Duration) {
        self.shared.shutting_down.store(true, Ordering::SeqCst);

        let shared = Arc::clone(&self.shared);
        let drain = async move {
            loop {
                let notified = shared.drained.notified();
                tokio::pin!(notified);
                // Register before re-checking so a concurrent completion
                // cannot slip between the check and the await.
                notified.as_mut().enable();
                if shared.in_flight.load(Ordering::SeqCst) == 0 {
                    break;
                }
                notified.await;
            }
        };

        if tokio::time::timeout(grace, drain).await.is_err() {
            warn!(
                remaining = self.shared.in_flight.load(Ordering::SeqCst),
                "Shutdown grace elapsed, abandoning in-flight compute jobs"
            );
        }
    }
}

/// Runs the job for `id`, then reruns while the coalesced flag is set.
async fn run_job_loop(shared: &Arc<SchedulerShared>, id: &RepositoryId) {
    loop {
        // Bound pool-wide parallelism; the semaphore is never closed.
        let _permit = shared
            .limiter
            .acquire()
            .await
            .expect("scheduler semaphore closed");

        if let Err(e) = shared.runner.run(id).await {
            // Failures are local to this id. No immediate retry: the next
            // periodic or configuration trigger picks it up.
            warn!(repository = %id, error = %e, "Whitelist compute job failed");
        }

        let rerun = {
            let mut jobs = shared.jobs.lock().expect("scheduler lock poisoned");
            if matches!(jobs.get(id), Some(JobState::RunningRerunPending)) {
                jobs.insert(id.clone(), JobState::Running);
                true
            } else {
                jobs.remove(id);
                false
            }
        };

        if !rerun {
            break;
        }
        debug!(repository = %id, "Running coalesced follow-up compute job");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Runner that parks every job until released and counts entries.
    struct ParkedRunner {
        started: AtomicUsize,
        completed: AtomicUsize,
        release: Notify,
    }

    impl ParkedRunner {
        fn new() -> Self {
            Self {
                started: AtomicUsize::new(0),
                completed: AtomicUsize::new(0),
                release: Notify::new(),
            }
        }
    }

    #[async_trait]
    impl ComputeRunner for ParkedRunner {
        async fn run(&self, _id: &RepositoryId) -> Result<(), DomainError> {
            let notified = self.release.notified();
            tokio::pin!(notified);
            // Register with the Notify before announcing the start, so a
            // release fired right after `started` ticks is never missed.
            notified.as_mut().enable();
            self.started.fetch_add(1, Ordering::SeqCst);
            notified.await;
            self.completed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    /// Runner that completes immediately.
    struct CountingRunner {
        runs: AtomicUsize,
    }

    #[async_trait]
    impl ComputeRunner for CountingRunner {
        async fn run(&self, _id: &RepositoryId) -> Result<(), DomainError> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    async fn wait_until(mut condition: impl FnMut() -> bool) {
        for _ in 0..200 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not reached in time");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_burst_of_triggers_coalesces_to_two_runs() {
        let runner = Arc::new(ParkedRunner::new());
        let scheduler = UpdateScheduler::new(runner.clone(), 4);
        let id = RepositoryId::from("central");

        scheduler.enqueue(id.clone());
        wait_until(|| runner.started.load(Ordering::SeqCst) == 1).await;

        // All of these land while the first job is parked.
        for _ in 0..10 {
            scheduler.enqueue(id.clone());
        }
        assert_eq!(scheduler.active_jobs(), 1);

        runner.release.notify_waiters();
        wait_until(|| runner.started.load(Ordering::SeqCst) == 2).await;

        runner.release.notify_waiters();
        wait_until(|| runner.completed.load(Ordering::SeqCst) == 2).await;
        wait_until(|| scheduler.active_jobs() == 0).await;

        // 11 triggers, exactly 2 runs: the in-flight one plus one rerun.
        assert_eq!(runner.started.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_distinct_ids_run_in_parallel() {
        let runner = Arc::new(ParkedRunner::new());
        let scheduler = UpdateScheduler::new(runner.clone(), 4);

        scheduler.enqueue(RepositoryId::from("a"));
        scheduler.enqueue(RepositoryId::from("b"));
        scheduler.enqueue(RepositoryId::from("c"));

        wait_until(|| runner.started.load(Ordering::SeqCst) == 3).await;
        assert_eq!(scheduler.active_jobs(), 3);

        runner.release.notify_waiters();
        wait_until(|| scheduler.active_jobs() == 0).await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_enqueue_after_shutdown_is_dropped() {
        let runner = Arc::new(CountingRunner {
            runs: AtomicUsize::new(0),
        });
        let scheduler = UpdateScheduler::new(runner.clone(), 4);

        scheduler.shutdown(Duration::from_millis(100)).await;
        scheduler.enqueue(RepositoryId::from("central"));

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(runner.runs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_shutdown_drains_in_flight_jobs() {
        let runner = Arc::new(ParkedRunner::new());
        let scheduler = UpdateScheduler::new(runner.clone(), 4);

        scheduler.enqueue(RepositoryId::from("central"));
        wait_until(|| runner.started.load(Ordering::SeqCst) == 1).await;

        let release = {
            let runner = runner.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                runner.release.notify_waiters();
            })
        };

        scheduler.shutdown(Duration::from_secs(2)).await;
        release.await.expect("release task failed");

        assert_eq!(runner.completed.load(Ordering::SeqCst), 1);
    }
}
