//! Job Layer
//!
//! Composes fleet collection and publishing into one non-reentrant unit of
//! work and runs it on a fixed interval.
//!
//! - [`SweepJob`]: Dispatch, then publish; overlapping runs are skipped
//! - [`SweepScheduler`]: Fixed-interval firing and graceful shutdown

mod scheduler;
mod sweep;

pub use scheduler::{
    DEFAULT_SHUTDOWN_TIMEOUT, JobError, JobInfo, MIN_INTERVAL, SweepScheduler, clamp_interval,
};
pub use sweep::{JobReport, JobRun, SweepJob, SweepParams};
