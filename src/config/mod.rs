//! Configuration module for netsnap.
//!
//! Provides YAML-based configuration loading and validation for:
//! - Repository settings (working copy, remote, SSH key, commit identity)
//! - Schedule settings (interval, worker pool bound)
//! - Driver settings (command, transport, timeout, vendors)
//! - Device inventory and getter list

mod app;
mod inventory;
mod validation;

pub use app::{AppConfig, DriverConfig, RepositoryConfig, ScheduleConfig};
pub use inventory::{
    DeviceEntry, GetterSpec, default_getters, validate_getters, validate_inventory,
};
pub use validation::{
    ConfigError, expand_env_vars, expand_home, parse_duration, validate_device_address,
};

// Re-export constants
pub use app::{
    DEFAULT_COMMIT_MESSAGE, DEFAULT_DRIVER_COMMAND, DEFAULT_DRIVER_TIMEOUT,
    DEFAULT_MAX_CONCURRENCY, DEFAULT_REMOTE,
};
