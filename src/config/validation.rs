//! Configuration validation utilities.

use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

/// Configuration error types.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse YAML configuration.
    #[error("failed to parse YAML config: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// Configuration validation failed.
    #[error("config validation error: {0}")]
    ValidationError(String),
}

/// Parse duration string using humantime.
///
/// Supports various formats: `30s`, `1m`, `5m30s`, `1h`, `2h30m`, `1d`, `100ms`, etc.
/// A bare integer is read as a number of seconds, which is how the interactive
/// `schedule` prompt asks for the sweep interval.
///
/// # Examples
///
/// ```
/// use netsnap::config::parse_duration;
///
/// assert_eq!(parse_duration("30s").unwrap().as_secs(), 30);
/// assert_eq!(parse_duration("3600").unwrap().as_secs(), 3600);
/// assert_eq!(parse_duration("1h30m").unwrap().as_secs(), 5400);
/// ```
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("duration string is empty".to_string());
    }
    if let Ok(secs) = s.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }
    humantime::parse_duration(s).map_err(|e| e.to_string())
}

/// Expand environment variables in a string.
/// Supports ${VAR} and ${VAR:-default} syntax.
pub fn expand_env_vars(input: &str) -> String {
    static ENV_VAR_REGEX: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();

    let regex = ENV_VAR_REGEX.get_or_init(|| {
        regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
            .expect("failed to compile env var regex")
    });

    regex
        .replace_all(input, |caps: &regex::Captures| {
            let var_name = &caps[1];
            let default_value = caps.get(2).map(|m| m.as_str()).unwrap_or("");
            std::env::var(var_name).unwrap_or_else(|_| default_value.to_string())
        })
        .into_owned()
}

/// Expand a leading `~` to the user's home directory (`$HOME`).
///
/// Paths typed at a prompt or set in the config file never pass through a
/// shell, so `~/.ssh/id_rsa` would otherwise name a directory called `~`.
/// `~user` forms and paths without a leading `~` are returned unchanged.
pub fn expand_home(path: &Path) -> PathBuf {
    expand_home_in(path, std::env::var_os("HOME").map(PathBuf::from).as_deref())
}

fn expand_home_in(path: &Path, home: Option<&Path>) -> PathBuf {
    let mut components = path.components();
    match (components.next(), home) {
        (Some(Component::Normal(first)), Some(home)) if first == "~" => {
            home.join(components.as_path())
        }
        _ => path.to_path_buf(),
    }
}

/// Check that a device address can be used verbatim as one directory name
/// under the working copy.
pub fn validate_device_address(address: &str) -> Result<(), ConfigError> {
    if address.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "device address cannot be empty".to_string(),
        ));
    }
    if address == "." || address == ".." || address == ".git" {
        return Err(ConfigError::ValidationError(format!(
            "device address '{}' is reserved",
            address
        )));
    }
    if address.contains(['/', '\\', '\0']) {
        return Err(ConfigError::ValidationError(format!(
            "device address '{}' cannot contain path separators",
            address
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_valid() {
        assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("1m").unwrap(), Duration::from_secs(60));
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
        assert_eq!(parse_duration("2h 30m").unwrap(), Duration::from_secs(9000));
    }

    #[test]
    fn test_parse_duration_bare_seconds() {
        assert_eq!(parse_duration("600").unwrap(), Duration::from_secs(600));
        assert_eq!(parse_duration(" 45 ").unwrap(), Duration::from_secs(45));
    }

    #[test]
    fn test_parse_duration_invalid() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("abc").is_err());
        assert!(parse_duration("30x").is_err());
        assert!(parse_duration("-5").is_err());
    }

    #[test]
    fn test_expand_env_vars_no_vars() {
        assert_eq!(expand_env_vars("/srv/snapshots"), "/srv/snapshots");
    }

    #[test]
    fn test_expand_env_vars_with_default() {
        let result = expand_env_vars("${NETSNAP_NONEXISTENT_12345:-/root}/.ssh/id_rsa");
        assert_eq!(result, "/root/.ssh/id_rsa");
    }

    #[test]
    fn test_expand_env_vars_from_env() {
        // SAFETY: This test runs in isolation and only modifies a test-specific variable.
        unsafe {
            std::env::set_var("NETSNAP_TEST_EXPAND", "/home/ops");
        }
        let result = expand_env_vars("${NETSNAP_TEST_EXPAND}/.ssh/id_ed25519");
        assert_eq!(result, "/home/ops/.ssh/id_ed25519");
        // SAFETY: Cleanup test variable.
        unsafe {
            std::env::remove_var("NETSNAP_TEST_EXPAND");
        }
    }

    #[test]
    fn test_expand_home() {
        let home = Some(Path::new("/home/ops"));
        assert_eq!(
            expand_home_in(Path::new("~/.ssh/id_rsa"), home),
            PathBuf::from("/home/ops/.ssh/id_rsa")
        );
        assert_eq!(expand_home_in(Path::new("~"), home), PathBuf::from("/home/ops"));
        assert_eq!(
            expand_home_in(Path::new("/srv/~/key"), home),
            PathBuf::from("/srv/~/key")
        );
        assert_eq!(
            expand_home_in(Path::new("~backup/key"), home),
            PathBuf::from("~backup/key")
        );
        assert_eq!(
            expand_home_in(Path::new("~/.ssh/id_rsa"), None),
            PathBuf::from("~/.ssh/id_rsa")
        );
    }

    #[test]
    fn test_validate_device_address() {
        assert!(validate_device_address("10.0.0.1").is_ok());
        assert!(validate_device_address("BNET-A1").is_ok());
        assert!(validate_device_address("2001:db8::1").is_ok());

        assert!(validate_device_address("").is_err());
        assert!(validate_device_address("  ").is_err());
        assert!(validate_device_address("..").is_err());
        assert!(validate_device_address(".git").is_err());
        assert!(validate_device_address("core/r1").is_err());
        assert!(validate_device_address("core\\r1").is_err());
    }
}
