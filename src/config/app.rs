//! Application configuration structures.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::device::Transport;

use super::inventory::{
    DeviceEntry, GetterSpec, default_getters, validate_getters, validate_inventory,
};
use super::validation::{ConfigError, expand_env_vars, expand_home};

// =============================================================================
// Constants
// =============================================================================

/// Default upper bound on devices collected at the same time.
pub const DEFAULT_MAX_CONCURRENCY: usize = 100;

/// Default device driver timeout (60 seconds).
pub const DEFAULT_DRIVER_TIMEOUT: Duration = Duration::from_secs(60);

/// Default git remote pushed to after each sweep.
pub const DEFAULT_REMOTE: &str = "origin";

/// Commit message used for every snapshot commit.
pub const DEFAULT_COMMIT_MESSAGE: &str = "commit all";

/// Default driver executable.
pub const DEFAULT_DRIVER_COMMAND: &str = "napalm";

fn default_max_concurrency() -> usize {
    DEFAULT_MAX_CONCURRENCY
}

fn default_driver_timeout() -> Duration {
    DEFAULT_DRIVER_TIMEOUT
}

fn default_remote() -> String {
    DEFAULT_REMOTE.to_string()
}

fn default_commit_message() -> String {
    DEFAULT_COMMIT_MESSAGE.to_string()
}

fn default_author_name() -> String {
    "netsnap".to_string()
}

fn default_author_email() -> String {
    "netsnap@localhost".to_string()
}

fn default_driver_command() -> String {
    DEFAULT_DRIVER_COMMAND.to_string()
}

fn default_vendors() -> Vec<String> {
    ["ios", "iosxr", "junos", "eos", "nxos", "nxos_ssh"]
        .into_iter()
        .map(String::from)
        .collect()
}

// =============================================================================
// Repository Configuration
// =============================================================================

/// Local working copy and publishing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryConfig {
    /// Local working copy; prompted for when absent.
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Remote to push to (default: "origin").
    #[serde(default = "default_remote")]
    pub remote: String,

    /// SSH private key used for pushes only.
    #[serde(default)]
    pub ssh_key: Option<PathBuf>,

    /// Commit message (default: "commit all").
    #[serde(default = "default_commit_message")]
    pub commit_message: String,

    /// Author name when git has no configured identity.
    #[serde(default = "default_author_name")]
    pub author_name: String,

    /// Author email when git has no configured identity.
    #[serde(default = "default_author_email")]
    pub author_email: String,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            path: None,
            remote: default_remote(),
            ssh_key: None,
            commit_message: default_commit_message(),
            author_name: default_author_name(),
            author_email: default_author_email(),
        }
    }
}

// =============================================================================
// Schedule Configuration
// =============================================================================

/// Sweep scheduling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Interval between sweeps; prompted for when absent.
    #[serde(default, with = "humantime_serde")]
    pub interval: Option<Duration>,

    /// Worker pool bound for device collection (default: 100).
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval: None,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }
}

// =============================================================================
// Driver Configuration
// =============================================================================

/// Device driver settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Driver executable (default: "napalm").
    #[serde(default = "default_driver_command")]
    pub command: String,

    /// Arguments placed before the driver's own (e.g. a wrapper script).
    #[serde(default)]
    pub args: Vec<String>,

    /// Session transport (default: telnet).
    #[serde(default)]
    pub transport: Transport,

    /// Pass the device password in this environment variable instead of
    /// `--password`, for a wrapper command that reads it from there.
    /// Arguments are visible to other local users; the environment is not.
    #[serde(default)]
    pub password_env: Option<String>,

    /// Port override; defaults to the transport's well-known port.
    #[serde(default)]
    pub port: Option<u16>,

    /// Bound on open, each getter call, and close (default: 60s).
    #[serde(default = "default_driver_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    /// Vendor tags the driver accepts.
    #[serde(default = "default_vendors")]
    pub vendors: Vec<String>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            command: default_driver_command(),
            args: Vec::new(),
            transport: Transport::default(),
            password_env: None,
            port: None,
            timeout: DEFAULT_DRIVER_TIMEOUT,
            vendors: default_vendors(),
        }
    }
}

impl DriverConfig {
    /// Port used to reach devices.
    pub fn effective_port(&self) -> u16 {
        self.port.unwrap_or_else(|| self.transport.default_port())
    }
}

// =============================================================================
// Application Configuration
// =============================================================================

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub repository: RepositoryConfig,

    #[serde(default)]
    pub schedule: ScheduleConfig,

    #[serde(default)]
    pub driver: DriverConfig,

    /// Devices polled on every sweep.
    #[serde(default)]
    pub inventory: Vec<DeviceEntry>,

    /// Getters run against every device.
    #[serde(default = "default_getters")]
    pub getters: Vec<GetterSpec>,
}

impl AppConfig {
    /// Load configuration from a YAML file.
    ///
    /// `${VAR}` references and a leading `~` in path-like fields are
    /// expanded after parsing.
    ///
    /// # Errors
    /// Returns `ConfigError` if the file cannot be read, parsed, or validated.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse and validate configuration from YAML text.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yaml::from_str(content)?;
        config.expand_env();
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    /// Returns `ConfigError::ValidationError` if any field is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.schedule.max_concurrency == 0 {
            return Err(ConfigError::ValidationError(
                "schedule max_concurrency must be positive".to_string(),
            ));
        }

        if self.driver.timeout.is_zero() {
            return Err(ConfigError::ValidationError(
                "driver timeout must be non-zero".to_string(),
            ));
        }

        if self.driver.command.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "driver command cannot be empty".to_string(),
            ));
        }

        if self.repository.remote.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "repository remote cannot be empty".to_string(),
            ));
        }

        validate_inventory(&self.inventory)?;
        validate_getters(&self.getters)?;

        Ok(())
    }

    fn expand_env(&mut self) {
        let expand_path =
            |p: &PathBuf| expand_home(Path::new(&expand_env_vars(&p.to_string_lossy())));

        self.repository.path = self.repository.path.as_ref().map(expand_path);
        self.repository.ssh_key = self.repository.ssh_key.as_ref().map(expand_path);
        self.driver.command = expand_env_vars(&self.driver.command);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::Capability;

    #[test]
    fn test_repository_config_default() {
        let config = RepositoryConfig::default();
        assert_eq!(config.remote, "origin");
        assert_eq!(config.commit_message, "commit all");
        assert!(config.path.is_none());
        assert!(config.ssh_key.is_none());
    }

    #[test]
    fn test_driver_config_default() {
        let config = DriverConfig::default();
        assert_eq!(config.command, "napalm");
        assert_eq!(config.transport, Transport::Telnet);
        assert_eq!(config.effective_port(), 23);
        assert_eq!(config.timeout, DEFAULT_DRIVER_TIMEOUT);
        assert!(config.vendors.iter().any(|v| v == "junos"));
    }

    #[test]
    fn test_minimal_yaml_uses_defaults() {
        let config = AppConfig::from_yaml(
            "inventory:\n  - address: 10.0.0.1\n    vendor: ios\n",
        )
        .unwrap();

        assert_eq!(config.inventory, vec![DeviceEntry::new("10.0.0.1", "ios")]);
        assert_eq!(config.getters, default_getters());
        assert_eq!(config.schedule.max_concurrency, DEFAULT_MAX_CONCURRENCY);
        assert!(config.schedule.interval.is_none());
    }

    #[test]
    fn test_full_yaml() {
        let yaml = r#"
repository:
  path: /srv/netsnap
  remote: upstream
  ssh_key: ${NETSNAP_TEST_MISSING_HOME:-/home/ops}/.ssh/id_rsa
schedule:
  interval: 15m
  max_concurrency: 8
driver:
  transport: ssh
  timeout: 30s
inventory:
  - address: BNET-A1
    vendor: ios
  - address: BNET-G1
    vendor: iosxr
getters:
  - name: ARP table
    capability: get_arp_table
  - name: Configuration
    capability: get_config
"#;
        let config = AppConfig::from_yaml(yaml).unwrap();

        assert_eq!(config.repository.path, Some(PathBuf::from("/srv/netsnap")));
        assert_eq!(config.repository.remote, "upstream");
        assert_eq!(
            config.repository.ssh_key,
            Some(PathBuf::from("/home/ops/.ssh/id_rsa"))
        );
        assert_eq!(config.schedule.interval, Some(Duration::from_secs(900)));
        assert_eq!(config.schedule.max_concurrency, 8);
        assert_eq!(config.driver.transport, Transport::Ssh);
        assert_eq!(config.driver.effective_port(), 22);
        assert_eq!(config.inventory.len(), 2);
        assert_eq!(config.getters[1].capability, Capability::GetConfig);
    }

    #[test]
    fn test_tilde_paths_expand_to_home() {
        let config = AppConfig::from_yaml(
            "repository:\n  path: ~/snapshots\n  ssh_key: ~/.ssh/id_rsa\n",
        )
        .unwrap();

        match std::env::var_os("HOME") {
            Some(home) => {
                let home = PathBuf::from(home);
                assert_eq!(config.repository.path, Some(home.join("snapshots")));
                assert_eq!(config.repository.ssh_key, Some(home.join(".ssh/id_rsa")));
            }
            None => assert_eq!(
                config.repository.ssh_key,
                Some(PathBuf::from("~/.ssh/id_rsa"))
            ),
        }
    }

    #[test]
    fn test_config_validation_zero_concurrency() {
        let mut config = AppConfig::default();
        config.schedule.max_concurrency = 0;

        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("max_concurrency"));
    }

    #[test]
    fn test_config_validation_zero_timeout() {
        let mut config = AppConfig::default();
        config.driver.timeout = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_bad_inventory() {
        let result = AppConfig::from_yaml("inventory:\n  - address: ../etc\n    vendor: ios\n");
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_config_parse_error() {
        let result = AppConfig::from_yaml("inventory: [unclosed");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_sample_config_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("configs/netsnap.yaml");
        let config = AppConfig::load(path).unwrap();
        assert_eq!(config.inventory.len(), 3);
        assert_eq!(config.schedule.interval, Some(Duration::from_secs(3600)));
        assert!(
            config
                .getters
                .iter()
                .any(|g| g.capability == Capability::GetConfig)
        );
    }
}
