//! One-shot creation of the local working copy.

use std::path::{Path, PathBuf};

use git2::FetchOptions;
use git2::build::RepoBuilder;

use super::auth::remote_callbacks;
use super::error::InitError;

/// Clone `remote_url` into `path`, which must not exist yet.
///
/// `ssh_key` is used for this clone only.
pub fn init_repo(remote_url: &str, path: &Path, ssh_key: Option<PathBuf>) -> Result<(), InitError> {
    if path.exists() {
        return Err(InitError::PathExists(path.to_path_buf()));
    }

    let git_config = git2::Config::open_default().ok();
    let mut fetch = FetchOptions::new();
    fetch.remote_callbacks(remote_callbacks(ssh_key, git_config));

    RepoBuilder::new().fetch_options(fetch).clone(remote_url, path)?;
    tracing::info!(remote = %remote_url, path = %path.display(), "Working copy initialized");
    Ok(())
}
