//! Vendor tag to driver lookup.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::DriverConfig;

use super::napalm::NapalmCliDriver;
use super::{Credentials, DeviceError, Driver, OpenParams, Session, Transport};

/// Maps vendor tags to the driver that speaks them.
#[derive(Clone, Default)]
pub struct DriverRegistry {
    drivers: HashMap<String, Arc<dyn Driver>>,
}

impl DriverRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the NAPALM CLI bridge registered for every configured vendor.
    pub fn napalm(config: &DriverConfig) -> Self {
        let driver: Arc<dyn Driver> = Arc::new(NapalmCliDriver::new(config));
        let mut registry = Self::new();
        for vendor in &config.vendors {
            registry.register(vendor.clone(), Arc::clone(&driver));
        }
        registry
    }

    /// Register a driver for a vendor tag, replacing any previous one.
    pub fn register(&mut self, vendor: impl Into<String>, driver: Arc<dyn Driver>) {
        self.drivers.insert(vendor.into(), driver);
    }

    /// Builder-style [`register`](Self::register).
    pub fn with_driver(mut self, vendor: impl Into<String>, driver: Arc<dyn Driver>) -> Self {
        self.register(vendor, driver);
        self
    }

    /// Vendor tags with a registered driver, sorted.
    pub fn vendors(&self) -> Vec<&str> {
        let mut vendors: Vec<&str> = self.drivers.keys().map(String::as_str).collect();
        vendors.sort_unstable();
        vendors
    }

    /// Open a session with the driver registered for `vendor`.
    ///
    /// # Errors
    /// Returns `DeviceError::UnsupportedVendor` for unknown tags, or whatever
    /// connection error the driver raises.
    pub async fn open(
        &self,
        address: &str,
        vendor: &str,
        credentials: &Credentials,
        transport: Transport,
    ) -> Result<Box<dyn Session>, DeviceError> {
        let driver = self
            .drivers
            .get(vendor)
            .ok_or_else(|| DeviceError::UnsupportedVendor(vendor.to_string()))?;

        driver
            .open(OpenParams {
                address,
                vendor,
                credentials,
                transport,
            })
            .await
    }
}

impl std::fmt::Debug for DriverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriverRegistry")
            .field("vendors", &self.vendors())
            .finish()
    }
}
