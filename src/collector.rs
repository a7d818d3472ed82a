//! Collector Layer
//!
//! Polls devices and writes their state into the working copy.
//!
//! # Architecture
//!
//! - [`DeviceCollector`]: One device, every getter, one snapshot directory
//! - [`FleetDispatcher`]: Every device, bounded worker pool, join barrier
//! - [`snapshot`]: File layout (`getters`, `<variant>_config`)
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use netsnap::collector::{DeviceCollector, FleetDispatcher};
//! use netsnap::config::{DeviceEntry, DriverConfig, default_getters};
//! use netsnap::device::{Credentials, DriverRegistry};
//!
//! # async fn run() {
//! let registry = Arc::new(DriverRegistry::napalm(&DriverConfig::default()));
//! let collector = DeviceCollector::new(
//!     registry,
//!     Credentials::new("admin", "secret"),
//!     default_getters(),
//!     "/srv/netsnap",
//! );
//! let report = FleetDispatcher::new(Arc::new(collector))
//!     .with_max_concurrency(20)
//!     .dispatch(&[DeviceEntry::new("10.0.0.1", "ios")])
//!     .await;
//! println!("{} devices collected", report.collected());
//! # }
//! ```

mod device;
mod dispatch;
pub mod snapshot;

pub use device::{DeviceCollector, DeviceReport, DeviceStatus};
pub use dispatch::{FleetDispatcher, SweepReport};
