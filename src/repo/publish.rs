//! Commit and push a sweep's working tree.

use std::path::{Path, PathBuf};

use git2::{ErrorCode, IndexAddOption, Oid, PushOptions, Repository, Signature};

use crate::config::{DEFAULT_COMMIT_MESSAGE, DEFAULT_REMOTE, RepositoryConfig};

use super::auth::remote_callbacks;
use super::error::PublishError;

/// What a publish did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// A new commit was created and pushed.
    Committed { commit: Oid, branch: String },
    /// The tree was unchanged, but an earlier commit had not reached the remote yet.
    PushedPending { commit: Oid, branch: String },
    /// Nothing changed since the last published commit.
    NothingToCommit,
}

/// Publishes the working copy to its remote.
#[derive(Debug, Clone)]
pub struct Publisher {
    path: PathBuf,
    remote: String,
    ssh_key: Option<PathBuf>,
    message: String,
    author_name: String,
    author_email: String,
}

impl Publisher {
    /// Publisher for the working copy at `path`, pushing to `origin`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let defaults = RepositoryConfig::default();
        Self {
            path: path.into(),
            remote: DEFAULT_REMOTE.to_string(),
            ssh_key: None,
            message: DEFAULT_COMMIT_MESSAGE.to_string(),
            author_name: defaults.author_name,
            author_email: defaults.author_email,
        }
    }

    /// Publisher configured from the `repository` section.
    pub fn from_config(path: impl Into<PathBuf>, config: &RepositoryConfig) -> Self {
        Self {
            path: path.into(),
            remote: config.remote.clone(),
            ssh_key: config.ssh_key.clone(),
            message: config.commit_message.clone(),
            author_name: config.author_name.clone(),
            author_email: config.author_email.clone(),
        }
    }

    /// Use this private key for pushes.
    pub fn with_ssh_key(mut self, key: Option<PathBuf>) -> Self {
        self.ssh_key = key;
        self
    }

    pub fn with_remote(mut self, remote: impl Into<String>) -> Self {
        self.remote = remote.into();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stage, commit and push on a blocking thread.
    pub async fn publish(&self) -> Result<PublishOutcome, PublishError> {
        let this = self.clone();
        tokio::task::spawn_blocking(move || this.publish_blocking())
            .await
            .map_err(|e| PublishError::Internal(e.to_string()))?
    }

    /// Stage the exact working tree state, commit it, and push.
    ///
    /// New, modified and deleted files are all staged. An unchanged tree
    /// produces no commit.
    pub fn publish_blocking(&self) -> Result<PublishOutcome, PublishError> {
        let repo = Repository::open(&self.path)?;

        let mut index = repo.index()?;
        index.add_all(["*"], IndexAddOption::DEFAULT, None)?;
        index.update_all(["*"], None)?;
        index.write()?;
        let tree_id = index.write_tree()?;

        let branch = repo
            .find_reference("HEAD")?
            .symbolic_target()
            .map(str::to_owned)
            .ok_or(PublishError::DetachedHead)?;

        let parent = match repo.refname_to_id(&branch) {
            Ok(oid) => Some(repo.find_commit(oid)?),
            Err(e) if e.code() == ErrorCode::NotFound => None,
            Err(e) => return Err(e.into()),
        };

        let unchanged = match &parent {
            Some(parent) => parent.tree_id() == tree_id,
            None => repo.find_tree(tree_id)?.is_empty(),
        };

        if unchanged {
            let Some(parent) = parent else {
                tracing::info!(path = %self.path.display(), "Working copy empty, nothing to commit");
                return Ok(PublishOutcome::NothingToCommit);
            };
            if self.is_pushed(&repo, &branch, parent.id())? {
                tracing::info!(path = %self.path.display(), "No changes since last sweep, nothing to commit");
                return Ok(PublishOutcome::NothingToCommit);
            }
            tracing::info!(commit = %parent.id(), "Pushing commit left over from an earlier sweep");
            self.push(&repo, &branch)?;
            return Ok(PublishOutcome::PushedPending {
                commit: parent.id(),
                branch,
            });
        }

        let tree = repo.find_tree(tree_id)?;
        let signature = match repo.signature() {
            Ok(sig) => sig,
            Err(_) => Signature::now(&self.author_name, &self.author_email)?,
        };
        let parents: Vec<_> = parent.iter().collect();
        let commit = repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            &self.message,
            &tree,
            &parents,
        )?;
        tracing::info!(commit = %commit, branch = %branch, "Snapshot committed");

        self.push(&repo, &branch)?;
        Ok(PublishOutcome::Committed { commit, branch })
    }

    fn tracking_ref(&self, branch: &str) -> String {
        let short = branch.strip_prefix("refs/heads/").unwrap_or(branch);
        format!("refs/remotes/{}/{}", self.remote, short)
    }

    /// Whether the remote-tracking ref already points at `commit`.
    fn is_pushed(&self, repo: &Repository, branch: &str, commit: Oid) -> Result<bool, PublishError> {
        match repo.refname_to_id(&self.tracking_ref(branch)) {
            Ok(oid) => Ok(oid == commit),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn push(&self, repo: &Repository, branch: &str) -> Result<(), PublishError> {
        let mut remote = repo.find_remote(&self.remote)?;
        let refspec = format!("{0}:{0}", branch);
        let mut rejected: Option<(String, String)> = None;

        {
            let mut callbacks = remote_callbacks(self.ssh_key.clone(), repo.config().ok());
            callbacks.push_update_reference(|refname, status| {
                if let Some(message) = status {
                    rejected = Some((refname.to_string(), message.to_string()));
                }
                Ok(())
            });
            let mut options = PushOptions::new();
            options.remote_callbacks(callbacks);
            remote.push(&[refspec.as_str()], Some(&mut options))?;
        }

        if let Some((refname, message)) = rejected {
            return Err(PublishError::Rejected { refname, message });
        }

        let pushed = repo.refname_to_id(branch)?;
        repo.reference(&self.tracking_ref(branch), pushed, true, "netsnap: push")?;
        tracing::info!(remote = %self.remote, branch = %branch, "Snapshot pushed");
        Ok(())
    }
}
