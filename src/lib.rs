//! Netsnap - Network Device State Snapshots
//!
//! This crate polls a fleet of network devices for their operational state
//! and configuration, writes one directory of plain-text files per device
//! into a git working copy, and commits and pushes the result on a fixed
//! interval. The remote history becomes a time series of device state.
//!
//! # Architecture
//!
//! - **Device**: Vendor-neutral driver/session seam and the getter catalogue
//! - **Collector**: Per-device collection and bounded fleet dispatch
//! - **Render**: Indented text rendering of getter results
//! - **Repo**: Working copy clone, commit and push (libgit2)
//! - **Job**: Non-reentrant sweep unit and interval scheduler
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use netsnap::config::AppConfig;
//! use netsnap::device::{Credentials, DriverRegistry};
//! use netsnap::job::{SweepJob, SweepParams, SweepScheduler};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::load("netsnap.yaml")?;
//! let registry = Arc::new(DriverRegistry::napalm(&config.driver));
//! let job = SweepJob::from_config(
//!     &config,
//!     SweepParams {
//!         path: "/srv/snapshots".into(),
//!         credentials: Credentials::new("admin", "secret"),
//!         ssh_key: None,
//!     },
//!     registry,
//! );
//!
//! let scheduler = SweepScheduler::new().await?;
//! scheduler.spawn(Arc::new(job), std::time::Duration::from_secs(3600)).await?;
//! scheduler.start().await?;
//! # Ok(())
//! # }
//! ```

pub mod collector;
pub mod config;
pub mod device;
pub mod job;
pub mod prompt;
pub mod render;
pub mod repo;

pub use collector::{DeviceCollector, FleetDispatcher, SweepReport};
pub use config::{AppConfig, DeviceEntry, GetterSpec};
pub use device::{Capability, Credentials, DeviceError, Driver, DriverRegistry, Session};
pub use job::{SweepJob, SweepScheduler};
pub use repo::{Publisher, init_repo};
