// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Publishing of the dev environment git repository.
//!
//! Publishing is the last step of a bootstrap. By default the committed
//! working directory simply stays where it is, and its location is reported.
//! Given a push URL, the current branch is pushed to that remote as `origin`.

use auth_git2::GitAuthenticator;
use git2::{Config, PushOptions, RemoteCallbacks, Repository};
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

/// Name of the remote the dev environment is pushed to.
const REMOTE_NAME: &str = "origin";

/// Layer of indirection for publishing the dev environment.
pub trait EnvironmentPublisher {
    /// Create dev environment git repository out of working directory `dir`.
    fn create_dev_env_git_repository(&self, dir: &Path) -> Result<()>;
}

/// Publish dev environment through libgit2.
#[derive(Debug, Default, Clone)]
pub struct Git2Publisher {
    push_url: Option<String>,
}

impl Git2Publisher {
    /// Construct new publisher that optionally pushes to `push_url`.
    pub fn new(push_url: Option<String>) -> Self {
        Self {
            push_url: push_url.filter(|url| !url.is_empty()),
        }
    }

    fn push(&self, dir: &Path, url: &str) -> Result<()> {
        let push_err = |err: git2::Error| PublishError::Push {
            source: err,
            url: url.into(),
            dir: dir.into(),
        };

        let repository = Repository::open(dir).map_err(push_err)?;
        let head = repository.head().map_err(push_err)?;
        let branch = head
            .is_branch()
            .then(|| head.shorthand())
            .flatten()
            .ok_or_else(|| PublishError::DetachedHead { dir: dir.into() })?
            .to_owned();

        // INVARIANT: Point origin at the push URL, replacing the clone source.
        let origin = match repository.find_remote(REMOTE_NAME) {
            Ok(_) => repository.remote_set_url(REMOTE_NAME, url),
            Err(_) => repository.remote(REMOTE_NAME, url).map(|_| ()),
        };
        origin.map_err(push_err)?;

        let authenticator = GitAuthenticator::default();
        let config = Config::open_default().map_err(push_err)?;
        let mut rc = RemoteCallbacks::new();
        rc.credentials(authenticator.credentials(&config));
        let mut po = PushOptions::new();
        po.remote_callbacks(rc);

        info!("pushing {branch} to {url}");
        let refspec = format!("refs/heads/{branch}:refs/heads/{branch}");
        let mut remote = repository.find_remote(REMOTE_NAME).map_err(push_err)?;
        remote.push(&[refspec.as_str()], Some(&mut po)).map_err(push_err)?;

        Ok(())
    }
}

impl EnvironmentPublisher for Git2Publisher {
    #[instrument(skip(self), level = "debug")]
    fn create_dev_env_git_repository(&self, dir: &Path) -> Result<()> {
        match self.push_url.as_deref() {
            Some(url) => self.push(dir, url)?,
            None => info!(
                "dev environment git repository ready at {}, push it to a remote to boot",
                dir.display()
            ),
        }

        Ok(())
    }
}

/// Publishing error types.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// Dev environment cannot be pushed.
    #[error("failed to push {:?} to {url}", dir.display())]
    Push {
        #[source]
        source: git2::Error,
        url: String,
        dir: PathBuf,
    },

    /// HEAD does not point at a named branch.
    #[error("repository at {:?} has no current branch to push", dir.display())]
    DetachedHead { dir: PathBuf },
}

/// Friendly result alias :3
pub type Result<T, E = PublishError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs::write;
    use tempfile::TempDir;

    fn committed_repository(dir: &Path) -> anyhow::Result<Repository> {
        let repository = Repository::init(dir)?;
        let mut config = repository.config()?;
        config.set_str("user.name", "John Doe")?;
        config.set_str("user.email", "john@doe.com")?;
        write(dir.join("jx-requirements.yml"), "cluster: {}\n")?;

        let mut index = repository.index()?;
        index.add_path(Path::new("jx-requirements.yml"))?;
        index.write()?;
        let tree_oid = index.write_tree()?;
        {
            let tree = repository.find_tree(tree_oid)?;
            let signature = repository.signature()?;
            repository.commit(Some("HEAD"), &signature, &signature, "fix: initial code", &tree, &[])?;
        }

        Ok(repository)
    }

    #[test]
    fn without_push_url_only_reports() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        Git2Publisher::new(None).create_dev_env_git_repository(dir.path())?;
        Git2Publisher::new(Some(String::new())).create_dev_env_git_repository(dir.path())?;

        Ok(())
    }

    #[test]
    fn refuse_to_push_detached_head() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let repository = committed_repository(dir.path())?;
        let head_oid = repository.head()?.peel_to_commit()?.id();
        repository.set_head_detached(head_oid)?;

        let remote = TempDir::new()?;
        Repository::init_bare(remote.path())?;
        let url = remote.path().to_string_lossy().into_owned();

        let result = Git2Publisher::new(Some(url)).create_dev_env_git_repository(dir.path());
        assert!(matches!(result, Err(PublishError::DetachedHead { .. })));

        Ok(())
    }

    #[test]
    fn push_current_branch_to_remote() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let repository = committed_repository(dir.path())?;
        let branch = repository.head()?.shorthand().unwrap_or_default().to_owned();
        let head_oid = repository.head()?.target();

        let remote = TempDir::new()?;
        let bare = Repository::init_bare(remote.path())?;
        let url = remote.path().to_string_lossy().into_owned();

        Git2Publisher::new(Some(url.clone())).create_dev_env_git_repository(dir.path())?;

        let pushed = bare.find_reference(&format!("refs/heads/{branch}"))?.target();
        assert_eq!(pushed, head_oid);
        assert_eq!(repository.find_remote(REMOTE_NAME)?.url(), Some(url.as_str()));

        Ok(())
    }
}
