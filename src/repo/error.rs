//! Working copy error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while committing and pushing a sweep.
#[derive(Debug, Error)]
pub enum PublishError {
    /// libgit2 operation failed (open, stage, commit, push, auth).
    #[error("git error: {0}")]
    Git(#[from] git2::Error),

    /// HEAD does not point at a branch.
    #[error("HEAD is detached; snapshots must be committed on a branch")]
    DetachedHead,

    /// The remote refused the ref update.
    #[error("push of {refname} rejected: {message}")]
    Rejected { refname: String, message: String },

    /// Internal error (e.g., task join failure).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Errors raised by the one-shot clone of the working copy.
#[derive(Debug, Error)]
pub enum InitError {
    /// The target path is already present.
    #[error("'{}' already exists", .0.display())]
    PathExists(PathBuf),

    /// Clone failed.
    #[error("clone failed: {0}")]
    Git(#[from] git2::Error),
}
