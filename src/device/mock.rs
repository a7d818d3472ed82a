//! Scripted in-memory driver for unit tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde_json::Value;

use super::{Capability, DeviceError, Driver, OpenParams, Session};

/// Counters shared by a driver and all sessions it opened.
#[derive(Debug, Default)]
pub struct MockStats {
    pub opened: AtomicUsize,
    pub closed: AtomicUsize,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

#[derive(Clone, Default)]
pub struct MockDriver {
    responses: Arc<HashMap<Capability, Result<Value, String>>>,
    disconnects: Arc<HashMap<Capability, String>>,
    refuse: bool,
    fail_close: bool,
    delay: Duration,
    pub stats: Arc<MockStats>,
}

impl MockDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, capability: Capability, value: Value) -> Self {
        Arc::make_mut(&mut self.responses).insert(capability, Ok(value));
        self
    }

    pub fn fail(mut self, capability: Capability, message: &str) -> Self {
        Arc::make_mut(&mut self.responses).insert(capability, Err(message.to_string()));
        self
    }

    /// The session drops with a connection error when `capability` is called.
    pub fn disconnect_on(mut self, capability: Capability, message: &str) -> Self {
        Arc::make_mut(&mut self.disconnects).insert(capability, message.to_string());
        self
    }

    pub fn refusing(mut self) -> Self {
        self.refuse = true;
        self
    }

    pub fn failing_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait::async_trait]
impl Driver for MockDriver {
    async fn open(&self, params: OpenParams<'_>) -> Result<Box<dyn Session>, DeviceError> {
        if self.refuse {
            return Err(DeviceError::Connection(format!(
                "{}: connection refused",
                params.address
            )));
        }
        self.stats.opened.fetch_add(1, Ordering::SeqCst);
        let now = self.stats.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.stats.max_in_flight.fetch_max(now, Ordering::SeqCst);

        Ok(Box::new(MockSession {
            responses: Arc::clone(&self.responses),
            disconnects: Arc::clone(&self.disconnects),
            fail_close: self.fail_close,
            delay: self.delay,
            stats: Arc::clone(&self.stats),
            open: true,
        }))
    }
}

struct MockSession {
    responses: Arc<HashMap<Capability, Result<Value, String>>>,
    disconnects: Arc<HashMap<Capability, String>>,
    fail_close: bool,
    delay: Duration,
    stats: Arc<MockStats>,
    open: bool,
}

impl MockSession {
    fn release(&mut self) {
        if std::mem::take(&mut self.open) {
            self.stats.in_flight.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

impl Drop for MockSession {
    fn drop(&mut self) {
        self.release();
    }
}

#[async_trait::async_trait]
impl Session for MockSession {
    async fn invoke(&mut self, capability: Capability) -> Result<Value, DeviceError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if let Some(message) = self.disconnects.get(&capability) {
            return Err(DeviceError::Connection(message.clone()));
        }
        match self.responses.get(&capability) {
            Some(Ok(value)) => Ok(value.clone()),
            Some(Err(message)) => Err(DeviceError::Getter(message.clone())),
            None => Err(DeviceError::Unsupported(capability)),
        }
    }

    async fn close(&mut self) -> Result<(), DeviceError> {
        self.release();
        self.stats.closed.fetch_add(1, Ordering::SeqCst);
        if self.fail_close {
            return Err(DeviceError::Connection("socket closed by peer".into()));
        }
        Ok(())
    }
}
