//! The unit of scheduled work: collect the fleet, then publish.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Mutex;

use crate::collector::{DeviceCollector, FleetDispatcher, SweepReport};
use crate::config::{AppConfig, DeviceEntry};
use crate::device::{Credentials, DriverRegistry};
use crate::repo::{PublishError, PublishOutcome, Publisher};

/// Parameters resolved at startup (flags, prompts) rather than read from
/// the configuration file.
#[derive(Debug, Clone)]
pub struct SweepParams {
    /// Local working copy.
    pub path: PathBuf,
    pub credentials: Credentials,
    /// Overrides `repository.ssh_key` when set.
    pub ssh_key: Option<PathBuf>,
}

/// Result of a completed job run.
#[derive(Debug)]
pub struct JobReport {
    pub sweep: SweepReport,
    pub publish: Result<PublishOutcome, PublishError>,
}

/// What happened when the job fired.
#[derive(Debug)]
pub enum JobRun {
    /// Sweep and publish both ran.
    Completed(JobReport),
    /// A previous run still held the job slot.
    Skipped,
    /// The working copy directory is gone; nothing was collected.
    WorkingCopyMissing,
}

/// Fleet sweep followed by a publish, never running twice at once.
#[derive(Debug)]
pub struct SweepJob {
    name: String,
    inventory: Vec<DeviceEntry>,
    dispatcher: FleetDispatcher,
    publisher: Publisher,
    slot: Mutex<()>,
    runs: AtomicU64,
}

impl SweepJob {
    pub fn new(
        name: impl Into<String>,
        inventory: Vec<DeviceEntry>,
        dispatcher: FleetDispatcher,
        publisher: Publisher,
    ) -> Self {
        Self {
            name: name.into(),
            inventory,
            dispatcher,
            publisher,
            slot: Mutex::new(()),
            runs: AtomicU64::new(0),
        }
    }

    /// Assemble the job from the configuration file and startup parameters.
    pub fn from_config(
        config: &AppConfig,
        params: SweepParams,
        registry: Arc<DriverRegistry>,
    ) -> Self {
        let collector = DeviceCollector::new(
            registry,
            params.credentials,
            config.getters.clone(),
            params.path.clone(),
        )
        .with_transport(config.driver.transport)
        .with_timeout(config.driver.timeout);

        let dispatcher = FleetDispatcher::new(Arc::new(collector))
            .with_max_concurrency(config.schedule.max_concurrency);

        let ssh_key = params.ssh_key.or_else(|| config.repository.ssh_key.clone());
        let publisher =
            Publisher::from_config(params.path, &config.repository).with_ssh_key(ssh_key);

        Self::new("snapshot-sweep", config.inventory.clone(), dispatcher, publisher)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of runs that got past the job slot.
    pub fn run_count(&self) -> u64 {
        self.runs.load(Ordering::Relaxed)
    }

    /// Run one sweep and publish its result.
    ///
    /// If a previous run is still in progress this run is skipped. Errors
    /// are logged and reported, never propagated.
    pub async fn run(&self) -> JobRun {
        let Ok(_guard) = self.slot.try_lock() else {
            tracing::warn!(job = %self.name, "Previous sweep still running, skipping this run");
            return JobRun::Skipped;
        };
        let run = self.runs.fetch_add(1, Ordering::Relaxed) + 1;

        let root = self.dispatcher.collector().output_root();
        if !root.is_dir() {
            tracing::error!(job = %self.name, path = %root.display(), "Working copy not found, run `netsnap init` first");
            return JobRun::WorkingCopyMissing;
        }

        tracing::info!(job = %self.name, run, devices = self.inventory.len(), "Job started");
        let sweep = self.dispatcher.dispatch(&self.inventory).await;

        let publish = self.publisher.publish().await;
        match &publish {
            Ok(PublishOutcome::Committed { commit, .. }) => {
                tracing::info!(job = %self.name, run, commit = %commit, "Sweep published");
            }
            Ok(PublishOutcome::PushedPending { commit, .. }) => {
                tracing::info!(job = %self.name, run, commit = %commit, "Earlier sweep published");
            }
            Ok(PublishOutcome::NothingToCommit) => {
                tracing::info!(job = %self.name, run, "Sweep produced no changes");
            }
            Err(e) => {
                tracing::error!(job = %self.name, run, error = %e, "Publish failed, will retry next run");
            }
        }

        JobRun::Completed(JobReport { sweep, publish })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GetterSpec;
    use crate::device::Capability;
    use crate::device::mock::MockDriver;
    use crate::repo::init_repo;
    use git2::Repository;
    use serde_json::json;
    use std::path::Path;
    use std::time::Duration;

    fn working_copy() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let remote = dir.path().join("remote.git");
        Repository::init_bare(&remote).unwrap();
        let local = dir.path().join("local");
        init_repo(remote.to_str().unwrap(), &local, None).unwrap();
        (dir, local)
    }

    fn job(driver: MockDriver, path: &Path, inventory: Vec<DeviceEntry>) -> SweepJob {
        let mut config = AppConfig::default();
        config.inventory = inventory;
        config.getters = vec![GetterSpec::new("Facts", Capability::GetFacts)];
        config.driver.timeout = Duration::from_secs(5);

        let registry = DriverRegistry::new().with_driver("ios", Arc::new(driver));
        SweepJob::from_config(
            &config,
            SweepParams {
                path: path.to_path_buf(),
                credentials: Credentials::new("admin", "admin"),
                ssh_key: None,
            },
            Arc::new(registry),
        )
    }

    #[tokio::test]
    async fn test_run_collects_then_publishes() {
        let (_dir, local) = working_copy();
        let driver = MockDriver::new().respond(Capability::GetFacts, json!({ "vendor": "Cisco" }));
        let job = job(driver, &local, vec![DeviceEntry::new("r1", "ios")]);

        let report = match job.run().await {
            JobRun::Completed(report) => report,
            other => panic!("unexpected run: {:?}", other),
        };
        assert_eq!(report.sweep.collected(), 1);
        assert!(matches!(report.publish, Ok(PublishOutcome::Committed { .. })));

        // Same responses again: nothing new to commit, and no crash.
        match job.run().await {
            JobRun::Completed(report) => {
                assert!(matches!(report.publish, Ok(PublishOutcome::NothingToCommit)));
            }
            other => panic!("unexpected run: {:?}", other),
        }
        assert_eq!(job.run_count(), 2);
    }

    #[tokio::test]
    async fn test_overlapping_runs_are_skipped() {
        let (_dir, local) = working_copy();
        let driver = MockDriver::new()
            .respond(Capability::GetFacts, json!({}))
            .with_delay(Duration::from_millis(200));
        let job = job(driver, &local, vec![DeviceEntry::new("r1", "ios")]);

        let (first, second) = tokio::join!(job.run(), async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            job.run().await
        });

        assert!(matches!(first, JobRun::Completed(_)));
        assert!(matches!(second, JobRun::Skipped));
        assert_eq!(job.run_count(), 1);

        // Once the slot is free the job runs again.
        assert!(matches!(job.run().await, JobRun::Completed(_)));
    }

    #[tokio::test]
    async fn test_publish_failure_does_not_fail_run() {
        let (_dir, local) = working_copy();
        Repository::open(&local)
            .unwrap()
            .remote_set_url("origin", "/nonexistent/netsnap-remote.git")
            .unwrap();
        let driver = MockDriver::new().respond(Capability::GetFacts, json!({ "vendor": "Cisco" }));
        let job = job(driver, &local, vec![DeviceEntry::new("r1", "ios")]);

        match job.run().await {
            JobRun::Completed(report) => {
                assert_eq!(report.sweep.collected(), 1);
                assert!(report.publish.is_err());
            }
            other => panic!("unexpected run: {:?}", other),
        }
        assert!(matches!(job.run().await, JobRun::Completed(_)));
    }

    #[tokio::test]
    async fn test_missing_working_copy() {
        let dir = tempfile::tempdir().unwrap();
        let job = job(MockDriver::new(), &dir.path().join("absent"), vec![]);
        assert!(matches!(job.run().await, JobRun::WorkingCopyMissing));
    }
}
