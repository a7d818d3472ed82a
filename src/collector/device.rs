//! Per-device collection.
//!
//! Opens one session, runs every configured getter, and writes the device's
//! snapshot files. Failures never leave [`DeviceCollector::collect`]: a
//! connection failure (at open or from any getter) skips the device and
//! leaves its previous snapshot alone, a getter failure is recorded in the
//! report in place of the result.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::{Map, Value};
use tokio::time::timeout;

use crate::config::{DEFAULT_DRIVER_TIMEOUT, DeviceEntry, GetterSpec};
use crate::device::{Credentials, DeviceError, DriverRegistry, Session, Transport};

use super::snapshot::{DeviceDir, config_variants};

/// How a device's collection ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceStatus {
    /// Session opened and the getters report was written.
    Collected {
        /// Getters that returned a result.
        succeeded: usize,
        /// Getters recorded as errors.
        failed: usize,
    },
    /// The session could not be opened or was lost mid-way; nothing was written.
    ConnectionFailed(String),
    /// The session opened but the snapshot could not be written.
    WriteFailed(String),
}

/// Outcome of one device's collection, for logging and sweep summaries.
#[derive(Debug, Clone)]
pub struct DeviceReport {
    pub address: String,
    pub status: DeviceStatus,
    pub duration_ms: u64,
}

impl DeviceReport {
    /// Whether the device's snapshot files were written this sweep.
    pub fn is_collected(&self) -> bool {
        matches!(self.status, DeviceStatus::Collected { .. })
    }
}

/// Collects a fixed getter list from one device at a time.
pub struct DeviceCollector {
    registry: Arc<DriverRegistry>,
    credentials: Credentials,
    getters: Vec<GetterSpec>,
    output_root: PathBuf,
    transport: Transport,
    timeout: Duration,
}

impl DeviceCollector {
    /// Create a collector writing under `output_root`.
    pub fn new(
        registry: Arc<DriverRegistry>,
        credentials: Credentials,
        getters: Vec<GetterSpec>,
        output_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            registry,
            credentials,
            getters,
            output_root: output_root.into(),
            transport: Transport::default(),
            timeout: DEFAULT_DRIVER_TIMEOUT,
        }
    }

    /// Set the session transport.
    pub fn with_transport(mut self, transport: Transport) -> Self {
        self.transport = transport;
        self
    }

    /// Set the bound applied to open, each getter, and close.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Collect one device and write its snapshot.
    ///
    /// Never fails; the returned report says what happened.
    pub async fn collect(&self, device: &DeviceEntry) -> DeviceReport {
        let start = Instant::now();
        let status = self.collect_inner(device).await;
        let duration_ms = start.elapsed().as_millis().min(u64::MAX as u128) as u64;

        match &status {
            DeviceStatus::Collected { succeeded, failed } => {
                tracing::info!(device = %device.address, succeeded, failed, duration_ms, "Device collected");
            }
            DeviceStatus::ConnectionFailed(message) | DeviceStatus::WriteFailed(message) => {
                tracing::error!("error with {}: {}", device.address, message);
            }
        }

        DeviceReport {
            address: device.address.clone(),
            status,
            duration_ms,
        }
    }

    async fn collect_inner(&self, device: &DeviceEntry) -> DeviceStatus {
        let mut session = match self.open(device).await {
            Ok(session) => session,
            Err(e) => return DeviceStatus::ConnectionFailed(e.to_string()),
        };

        // Nothing is written until every getter has answered, so a session
        // that dies half way leaves the previous snapshot untouched.
        let status = match self.run_getters(device, session.as_mut()).await {
            Ok(results) => self.write_snapshot(device, results).await,
            Err(e) => DeviceStatus::ConnectionFailed(e.to_string()),
        };

        // The snapshot is already on disk; a failed teardown only gets logged.
        match timeout(self.timeout, session.close()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!(device = %device.address, error = %e, "Session close failed");
            }
            Err(_) => {
                tracing::warn!(device = %device.address, "Session close timed out");
            }
        }

        status
    }

    async fn open(&self, device: &DeviceEntry) -> Result<Box<dyn Session>, DeviceError> {
        let opening = self.registry.open(
            &device.address,
            &device.vendor,
            &self.credentials,
            self.transport,
        );
        match timeout(self.timeout, opening).await {
            Ok(result) => result,
            Err(_) => Err(DeviceError::Connection(format!(
                "timed out after {:?} opening session",
                self.timeout
            ))),
        }
    }

    /// Run every getter, keeping results in memory.
    ///
    /// A connection-class error from any getter aborts the device.
    async fn run_getters(
        &self,
        device: &DeviceEntry,
        session: &mut dyn Session,
    ) -> Result<GetterResults, DeviceError> {
        let mut results = GetterResults::default();

        for getter in &self.getters {
            let result = match timeout(self.timeout, session.invoke(getter.capability)).await {
                Ok(result) => result,
                Err(_) => Err(DeviceError::Timeout),
            };

            let outcome = match result {
                Err(e) if e.is_connection() => return Err(e),
                Err(e) => Err(e.to_string()),
                Ok(value) if getter.capability.is_configuration() => {
                    config_variants(&value).map(|variants| {
                        results.configs.push((getter.name.clone(), variants));
                    })
                }
                Ok(value) => {
                    results.report.insert(getter.name.clone(), value);
                    Ok(())
                }
            };

            match outcome {
                Ok(()) => results.succeeded += 1,
                Err(message) => {
                    tracing::warn!(device = %device.address, getter = %getter.name, error = %message, "Getter failed");
                    results.report.insert(getter.name.clone(), Value::String(message));
                    results.failed += 1;
                }
            }
        }

        Ok(results)
    }

    /// Write config variants and the getters report.
    async fn write_snapshot(&self, device: &DeviceEntry, mut results: GetterResults) -> DeviceStatus {
        let dir = match DeviceDir::ensure(&self.output_root, &device.address).await {
            Ok(dir) => dir,
            Err(e) => {
                return DeviceStatus::WriteFailed(format!("cannot create snapshot directory: {}", e));
            }
        };

        for (name, variants) in std::mem::take(&mut results.configs) {
            if let Err(message) = write_configs(device, &dir, variants).await {
                tracing::warn!(device = %device.address, getter = %name, error = %message, "Getter failed");
                results.report.insert(name, Value::String(message));
                results.succeeded -= 1;
                results.failed += 1;
            }
        }

        match dir.write_getters(&Value::Object(results.report)).await {
            Ok(_) => DeviceStatus::Collected {
                succeeded: results.succeeded,
                failed: results.failed,
            },
            Err(e) => DeviceStatus::WriteFailed(format!("cannot write getters report: {}", e)),
        }
    }
}

/// Getter outcomes held in memory until the device's snapshot is written.
#[derive(Debug, Default)]
struct GetterResults {
    report: Map<String, Value>,
    /// Config variants per configuration getter, by getter name.
    configs: Vec<(String, Vec<(String, String)>)>,
    succeeded: usize,
    failed: usize,
}

async fn write_configs(
    device: &DeviceEntry,
    dir: &DeviceDir,
    variants: Vec<(String, String)>,
) -> Result<(), String> {
    for (variant, text) in variants {
        let file = dir
            .write_config_variant(&variant, &text)
            .await
            .map_err(|e| format!("cannot write {} config: {}", variant, e))?;
        tracing::debug!(device = %device.address, file = %file.display(), "Config written");
    }
    Ok(())
}

impl std::fmt::Debug for DeviceCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceCollector")
            .field("output_root", &self.output_root)
            .field("getters", &self.getters.len())
            .field("transport", &self.transport)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
