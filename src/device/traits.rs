//! Core device session traits and types.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{AsRefStr, Display};
use thiserror::Error;

use super::Capability;

/// Errors raised by device drivers and sessions.
///
/// [`is_connection`](DeviceError::is_connection) separates failures that
/// take out the whole device from those that only affect one getter.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// Transport could not be established.
    #[error("connection failed: {0}")]
    Connection(String),

    /// No driver is registered for the vendor tag.
    #[error("unsupported vendor '{0}'")]
    UnsupportedVendor(String),

    /// The driver does not implement this capability.
    #[error("capability '{0}' is not supported by this driver")]
    Unsupported(Capability),

    /// A getter call failed on the device or in the driver.
    #[error("{0}")]
    Getter(String),

    /// Timeout elapsed.
    #[error("timeout elapsed")]
    Timeout,

    /// Local I/O error (spawning the driver, reading its output).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DeviceError {
    /// Whether this error means the device could not be reached at all.
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::UnsupportedVendor(_))
    }
}

/// Session transport.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, AsRefStr, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Transport {
    #[default]
    Telnet,
    Ssh,
}

impl Transport {
    /// Well-known port for the transport.
    pub fn default_port(self) -> u16 {
        match self {
            Self::Telnet => 23,
            Self::Ssh => 22,
        }
    }
}

/// Login shared by every device for the life of the process.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Everything a driver needs to open a session.
#[derive(Debug, Clone, Copy)]
pub struct OpenParams<'a> {
    pub address: &'a str,
    pub vendor: &'a str,
    pub credentials: &'a Credentials,
    pub transport: Transport,
}

/// Opens sessions for one or more vendor dialects.
#[async_trait::async_trait]
pub trait Driver: Send + Sync + 'static {
    /// Open a session.
    ///
    /// # Errors
    /// Returns a connection-class [`DeviceError`] when the device cannot be reached.
    async fn open(&self, params: OpenParams<'_>) -> Result<Box<dyn Session>, DeviceError>;
}

/// An open device session.
///
/// A failed [`invoke`](Session::invoke) leaves the session usable for the
/// next capability.
#[async_trait::async_trait]
pub trait Session: Send {
    /// Run one getter and return its structured result.
    async fn invoke(&mut self, capability: Capability) -> Result<Value, DeviceError>;

    /// Tear down the session.
    async fn close(&mut self) -> Result<(), DeviceError>;
}
