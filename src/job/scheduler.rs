//! Fixed-interval scheduling of sweep jobs.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::RwLock;
use tokio_cron_scheduler::{Job, JobScheduler};

use super::sweep::{JobRun, SweepJob};

/// Default timeout for graceful shutdown (5 seconds).
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Minimum allowed interval (1 second).
pub const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Errors from the scheduler.
#[derive(Debug, Error)]
pub enum JobError {
    /// Scheduler error.
    #[error("scheduler error: {0}")]
    Scheduler(String),
}

/// Clamp an interval to [`MIN_INTERVAL`].
pub fn clamp_interval(interval: Duration) -> Duration {
    if interval < MIN_INTERVAL {
        tracing::warn!(min_interval = ?MIN_INTERVAL,
            "Interval duration is less than minimum allowed. Using minimum duration."
        );
        MIN_INTERVAL
    } else {
        interval
    }
}

/// Metadata about a registered job.
#[derive(Debug, Clone)]
pub struct JobInfo {
    /// Job UUID.
    pub id: uuid::Uuid,
    /// Job name.
    pub name: String,
    /// Time between runs.
    pub interval: Duration,
}

/// Runs sweep jobs on a fixed interval.
///
/// Uses `tokio-cron-scheduler`. Overlapping firings of the same job are
/// skipped by [`SweepJob::run`] itself.
pub struct SweepScheduler {
    scheduler: JobScheduler,
    jobs: Arc<RwLock<HashMap<uuid::Uuid, JobInfo>>>,
}

impl SweepScheduler {
    /// Create a new scheduler.
    pub async fn new() -> Result<Self, JobError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| JobError::Scheduler(e.to_string()))?;

        Ok(Self {
            scheduler,
            jobs: Arc::new(RwLock::new(HashMap::new())),
        })
    }
}

impl std::fmt::Debug for SweepScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SweepScheduler")
            .field(
                "job_count",
                &self.jobs.try_read().map(|j| j.len()).unwrap_or(0),
            )
            .finish_non_exhaustive()
    }
}

impl SweepScheduler {
    /// Register a job to run every `interval`.
    pub async fn spawn(&self, job: Arc<SweepJob>, interval: Duration) -> Result<uuid::Uuid, JobError> {
        let interval = clamp_interval(interval);
        let name = job.name().to_string();

        let scheduled = create_job(job, interval)?;
        let job_id = self
            .scheduler
            .add(scheduled)
            .await
            .map_err(|e| JobError::Scheduler(e.to_string()))?;

        self.jobs.write().await.insert(
            job_id,
            JobInfo {
                id: job_id,
                name: name.clone(),
                interval,
            },
        );

        tracing::info!(job = %name, job_id = %job_id, interval = ?interval, "Job registered");
        Ok(job_id)
    }

    /// Start the scheduler.
    pub async fn start(&self) -> Result<(), JobError> {
        self.scheduler
            .start()
            .await
            .map_err(|e| JobError::Scheduler(e.to_string()))?;
        tracing::info!("Sweep scheduler started");
        Ok(())
    }

    /// List all registered jobs.
    pub async fn list_jobs(&self) -> Vec<JobInfo> {
        self.jobs.read().await.values().cloned().collect()
    }

    /// Get the number of registered jobs.
    pub async fn job_count(&self) -> usize {
        self.jobs.read().await.len()
    }

    /// Gracefully shutdown the scheduler with default timeout.
    pub async fn shutdown(self) -> Result<(), JobError> {
        self.shutdown_with_timeout(DEFAULT_SHUTDOWN_TIMEOUT).await
    }

    /// Shutdown with custom timeout.
    pub async fn shutdown_with_timeout(mut self, timeout: Duration) -> Result<(), JobError> {
        let shutdown_result = tokio::time::timeout(timeout, async {
            self.scheduler
                .shutdown()
                .await
                .map_err(|e| JobError::Scheduler(e.to_string()))
        })
        .await;

        match shutdown_result {
            Ok(Ok(())) => {
                tracing::info!("Sweep scheduler shutdown complete");
                Ok(())
            }
            Ok(Err(e)) => Err(e),
            Err(_) => {
                tracing::warn!("Sweep scheduler shutdown timed out");
                Ok(())
            }
        }
    }
}

fn create_job(job: Arc<SweepJob>, interval: Duration) -> Result<Job, JobError> {
    Job::new_repeated_async(interval, move |_: uuid::Uuid, _: JobScheduler| {
        let job = Arc::clone(&job);
        Box::pin(async move { run_job(&job).await })
            as std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send>>
    })
    .map_err(|e| JobError::Scheduler(e.to_string()))
}

/// Execute a single firing and log its result.
async fn run_job(job: &SweepJob) {
    let start = std::time::Instant::now();
    tracing::debug!(job = %job.name(), "Running job");

    let run = job.run().await;
    let duration_ms = start.elapsed().as_millis() as u64;

    match run {
        JobRun::Completed(report) => {
            tracing::info!(
                job = %job.name(),
                duration_ms,
                collected = report.sweep.collected(),
                failed = report.sweep.failed(),
                published = report.publish.is_ok(),
                "Job completed"
            );
        }
        JobRun::Skipped => {
            tracing::debug!(job = %job.name(), "Job firing skipped");
        }
        JobRun::WorkingCopyMissing => {
            tracing::error!(job = %job.name(), duration_ms, "Job failed: working copy missing");
        }
    }
}
