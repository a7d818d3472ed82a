//! Working Copy Layer
//!
//! The snapshot tree lives in a git working copy. After every sweep its
//! whole state is committed and pushed, so the remote history becomes a
//! time series of device state.
//!
//! - [`init_repo`]: Clone the remote into a fresh local path
//! - [`Publisher`]: Stage everything, commit, push

mod auth;
mod error;
mod init;
mod publish;

pub use error::{InitError, PublishError};
pub use init::init_repo;
pub use publish::{PublishOutcome, Publisher};
