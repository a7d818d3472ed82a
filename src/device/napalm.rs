//! NAPALM command-line bridge.
//!
//! Each getter call runs the external `napalm` tool:
//!
//! ```text
//! napalm --user U --password P --vendor ios --optional_args transport=telnet HOST call get_facts
//! ```
//!
//! and parses its JSON output. Opening a session checks that the device's
//! management port accepts TCP connections, then logs in once with
//! `call is_alive` so bad credentials fail the whole device.
//!
//! The plain `napalm` CLI only takes the password as an argument, where
//! other local users can read it (`ps`, `/proc/*/cmdline`). Set
//! `driver.password_env` and point `driver.command` at a wrapper to hand
//! it over in the environment instead.

use std::process::Stdio;
use std::time::Duration;

use serde_json::Value;
use tokio::net::TcpStream;
use tokio::process::Command;
use tokio::time::timeout;

use crate::config::DriverConfig;

use super::{Capability, Credentials, DeviceError, Driver, OpenParams, Session, Transport};

/// NAPALM exception names that mean the device session itself failed.
const CONNECTION_EXCEPTIONS: &[&str] = &[
    "ConnectionException",
    "ConnectAuthError",
    "ConnectTimeoutError",
    "ConnectionClosedException",
];

/// Driver backed by the `napalm` CLI.
#[derive(Debug, Clone)]
pub struct NapalmCliDriver {
    command: String,
    args: Vec<String>,
    password_env: Option<String>,
    port: u16,
    connect_timeout: Duration,
}

impl NapalmCliDriver {
    pub fn new(config: &DriverConfig) -> Self {
        Self {
            command: config.command.clone(),
            args: config.args.clone(),
            password_env: config.password_env.clone(),
            port: config.effective_port(),
            connect_timeout: config.timeout,
        }
    }

    async fn check_port(&self, address: &str) -> Result<(), DeviceError> {
        match timeout(self.connect_timeout, TcpStream::connect((address, self.port))).await {
            Ok(Ok(_stream)) => {
                tracing::debug!(device = %address, port = self.port, "Management port reachable");
                Ok(())
            }
            Ok(Err(e)) => Err(DeviceError::Connection(format!(
                "{}:{}: {}",
                address, self.port, e
            ))),
            Err(_) => Err(DeviceError::Connection(format!(
                "{}:{}: timed out after {:?}",
                address, self.port, self.connect_timeout
            ))),
        }
    }
}

#[async_trait::async_trait]
impl Driver for NapalmCliDriver {
    async fn open(&self, params: OpenParams<'_>) -> Result<Box<dyn Session>, DeviceError> {
        self.check_port(params.address).await?;

        let session = NapalmCliSession {
            command: self.command.clone(),
            args: self.args.clone(),
            password_env: self.password_env.clone(),
            address: params.address.to_string(),
            vendor: params.vendor.to_string(),
            credentials: params.credentials.clone(),
            transport: params.transport,
        };

        // Any failure here is a login failure, whatever napalm called it.
        let alive = session.call("is_alive").await.map_err(|e| match e {
            DeviceError::Getter(message) => DeviceError::Connection(message),
            other => other,
        })?;
        if alive.get("is_alive").and_then(Value::as_bool) == Some(false) {
            return Err(DeviceError::Connection(format!(
                "{}: session not alive after login",
                params.address
            )));
        }
        tracing::debug!(device = %params.address, "Logged in");

        Ok(Box::new(session))
    }
}

/// One device as seen through the `napalm` CLI.
pub struct NapalmCliSession {
    command: String,
    args: Vec<String>,
    password_env: Option<String>,
    address: String,
    vendor: String,
    credentials: Credentials,
    transport: Transport,
}

impl NapalmCliSession {
    fn build_command(&self, method: &str) -> Command {
        let mut cmd = Command::new(&self.command);
        cmd.args(&self.args)
            .arg("--user")
            .arg(&self.credentials.username);
        match &self.password_env {
            Some(var) => {
                cmd.env(var, &self.credentials.password);
            }
            None => {
                cmd.arg("--password").arg(&self.credentials.password);
            }
        }
        cmd.arg("--vendor")
            .arg(&self.vendor)
            .arg("--optional_args")
            .arg(format!("transport={}", self.transport))
            .arg(&self.address)
            .arg("call")
            .arg(method)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    /// Run one `napalm ... call <method>` and parse its output.
    async fn call(&self, method: &str) -> Result<Value, DeviceError> {
        let output = self.build_command(method).output().await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = last_line(&stderr)
                .map(str::to_string)
                .unwrap_or_else(|| format!("napalm exited with {}", output.status));
            return Err(classify_failure(message));
        }

        parse_output(&String::from_utf8_lossy(&output.stdout))
    }
}

impl std::fmt::Debug for NapalmCliSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NapalmCliSession")
            .field("address", &self.address)
            .field("vendor", &self.vendor)
            .field("transport", &self.transport)
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl Session for NapalmCliSession {
    async fn invoke(&mut self, capability: Capability) -> Result<Value, DeviceError> {
        tracing::debug!(device = %self.address, getter = %capability, "Calling napalm");
        self.call(capability.as_ref()).await
    }

    async fn close(&mut self) -> Result<(), DeviceError> {
        Ok(())
    }
}

/// Map a failed call's last stderr line to a connection or getter error.
fn classify_failure(message: String) -> DeviceError {
    if CONNECTION_EXCEPTIONS.iter().any(|name| message.contains(name)) {
        DeviceError::Connection(message)
    } else {
        DeviceError::Getter(message)
    }
}

fn last_line(text: &str) -> Option<&str> {
    text.lines().map(str::trim).rfind(|line| !line.is_empty())
}

/// Parse the CLI's stdout. Log lines printed before the JSON document are skipped.
fn parse_output(stdout: &str) -> Result<Value, DeviceError> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Ok(Value::Null);
    }
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Ok(value);
    }

    let start = trimmed
        .find(['{', '['])
        .ok_or_else(|| DeviceError::Getter(format!("unexpected napalm output: {}", trimmed)))?;
    serde_json::from_str(&trimmed[start..])
        .map_err(|e| DeviceError::Getter(format!("invalid JSON from napalm: {}", e)))
}
