//! Credentials for git network operations.

use std::path::PathBuf;

use git2::{Cred, CredentialType, RemoteCallbacks};

/// Credential attempts before giving up; libgit2 keeps asking otherwise.
const MAX_AUTH_ATTEMPTS: usize = 3;

/// Build callbacks for one clone or push.
///
/// With `ssh_key` set, SSH authentication uses that key only. Without it,
/// ssh-agent, the git credential helper, and libgit2 defaults are tried.
/// The key never outlives the returned callbacks.
pub(crate) fn remote_callbacks<'a>(
    ssh_key: Option<PathBuf>,
    git_config: Option<git2::Config>,
) -> RemoteCallbacks<'a> {
    let mut attempts = 0;
    let mut callbacks = RemoteCallbacks::new();

    callbacks.credentials(move |url, username, allowed| {
        attempts += 1;
        if attempts > MAX_AUTH_ATTEMPTS {
            return Err(git2::Error::from_str("authentication failed"));
        }
        let user = username.unwrap_or("git");

        if allowed.contains(CredentialType::SSH_KEY) {
            return match &ssh_key {
                Some(key) => Cred::ssh_key(user, None, key, None),
                None => Cred::ssh_key_from_agent(user),
            };
        }
        if allowed.contains(CredentialType::USER_PASS_PLAINTEXT) {
            if let Some(config) = &git_config {
                return Cred::credential_helper(config, url, username);
            }
        }
        if allowed.contains(CredentialType::USERNAME) {
            return Cred::username(user);
        }
        Cred::default()
    });

    callbacks
}
