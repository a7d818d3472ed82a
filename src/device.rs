//! Device Session Layer
//!
//! Vendor-neutral access to network devices. A [`Driver`] opens a
//! [`Session`] for an address; the session answers [`Capability`] queries
//! with structured JSON values.
//!
//! # Components
//!
//! - [`Capability`]: The getter catalogue
//! - [`Driver`] / [`Session`]: Seams implemented by concrete drivers
//! - [`DriverRegistry`]: Vendor tag to driver lookup
//! - [`NapalmCliDriver`]: Bridge to the external `napalm` command

mod capability;
#[cfg(test)]
pub(crate) mod mock;
mod napalm;
mod registry;
mod traits;

pub use capability::Capability;
pub use napalm::{NapalmCliDriver, NapalmCliSession};
pub use registry::DriverRegistry;
pub use traits::{Credentials, DeviceError, Driver, OpenParams, Session, Transport};
