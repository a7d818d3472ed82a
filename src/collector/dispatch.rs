//! Fleet-wide fan-out of device collection.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;

use crate::config::{DEFAULT_MAX_CONCURRENCY, DeviceEntry};

use super::device::{DeviceCollector, DeviceReport, DeviceStatus};

/// Summary of one sweep over the inventory.
#[derive(Debug, Clone)]
pub struct SweepReport {
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
    /// One report per inventory entry, in inventory order.
    pub devices: Vec<DeviceReport>,
}

impl SweepReport {
    /// Devices whose snapshot was written.
    pub fn collected(&self) -> usize {
        self.devices.iter().filter(|d| d.is_collected()).count()
    }

    /// Devices that could not be collected.
    pub fn failed(&self) -> usize {
        self.devices.len() - self.collected()
    }
}

/// Runs a [`DeviceCollector`] over the inventory with a bounded worker pool.
#[derive(Debug, Clone)]
pub struct FleetDispatcher {
    collector: Arc<DeviceCollector>,
    max_concurrency: usize,
}

impl FleetDispatcher {
    pub fn new(collector: Arc<DeviceCollector>) -> Self {
        Self {
            collector,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }

    /// Set the worker pool bound (minimum 1).
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    pub fn collector(&self) -> &DeviceCollector {
        &self.collector
    }

    /// Collect every inventory entry and wait for all of them.
    ///
    /// At most `max_concurrency` devices are in flight; the rest wait for a
    /// free worker. Entries are collected independently, duplicates included,
    /// but entries sharing an address run one after another since they
    /// write the same snapshot directory.
    pub async fn dispatch(&self, inventory: &[DeviceEntry]) -> SweepReport {
        let started_at = Utc::now();
        let start = Instant::now();
        tracing::info!(
            devices = inventory.len(),
            max_concurrency = self.max_concurrency,
            "Sweep started"
        );

        let permits = Arc::new(Semaphore::new(self.max_concurrency));
        let mut address_locks: HashMap<&str, Arc<Mutex<()>>> = HashMap::new();
        let mut tasks = JoinSet::new();

        for (index, device) in inventory.iter().cloned().enumerate() {
            let (collector, permits) = (Arc::clone(&self.collector), Arc::clone(&permits));
            let address_lock = Arc::clone(
                address_locks
                    .entry(inventory[index].address.as_str())
                    .or_default(),
            );
            tasks.spawn(async move {
                // Taken before the permit so a waiting duplicate holds no worker.
                let _address = address_lock.lock_owned().await;
                let report = match permits.acquire_owned().await {
                    Ok(_permit) => collector.collect(&device).await,
                    Err(_) => DeviceReport {
                        address: device.address.clone(),
                        status: DeviceStatus::ConnectionFailed("worker pool closed".into()),
                        duration_ms: 0,
                    },
                };
                (index, report)
            });
        }

        let mut slots: Vec<Option<DeviceReport>> = vec![None; inventory.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, report)) => slots[index] = Some(report),
                Err(e) => tracing::error!(error = %e, "Device collection task failed"),
            }
        }

        let devices = slots
            .into_iter()
            .zip(inventory)
            .map(|(slot, device)| {
                slot.unwrap_or_else(|| DeviceReport {
                    address: device.address.clone(),
                    status: DeviceStatus::WriteFailed("collection task aborted".into()),
                    duration_ms: 0,
                })
            })
            .collect();

        let report = SweepReport {
            started_at,
            duration: start.elapsed(),
            devices,
        };
        tracing::info!(
            started_at = %report.started_at,
            collected = report.collected(),
            failed = report.failed(),
            duration_ms = report.duration.as_millis() as u64,
            "Sweep finished"
        );
        report
    }
}
