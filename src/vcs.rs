// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Version control of the working directory.
//!
//! The bootstrap pipeline only needs four things from git: clone a source
//! into a directory, tell whether a directory already is a repository, stage
//! files, and commit them when something actually changed. These are modelled
//! by [`VersionControl`], with [`Git2Vcs`] implementing them through libgit2.
//!
//! # Commit If Changed
//!
//! A commit is only created when the tree staged in the index differs from the
//! tree of the current HEAD commit. On an unborn branch, a commit is created
//! only when the index is not empty. Thus, committing twice in a row over an
//! unchanged working directory creates exactly one commit, and never an empty
//! one.

use crate::config::CommitSettings;

use auth_git2::{GitAuthenticator, Prompter};
use git2::{
    build::RepoBuilder, Commit, Config, ErrorCode, FetchOptions, IndexAddOption, RemoteCallbacks,
    Repository, Signature,
};
use indicatif::{ProgressBar, ProgressStyle};
use inquire::{Password, Text};
use std::{
    path::{Path, PathBuf},
    time,
};
use tracing::{debug, info, instrument};

/// Layer of indirection for version control.
pub trait VersionControl {
    /// Clone repository at `url` into `dir`.
    fn clone_repo(&self, url: &str, dir: &Path) -> Result<()>;

    /// Check if `dir` is the top-level of an existing repository.
    fn is_repository(&self, dir: &Path) -> bool;

    /// Stage every file matching `pattern` in repository at `dir`.
    fn add(&self, dir: &Path, pattern: &str) -> Result<()>;

    /// Commit staged files of repository at `dir`, unless nothing changed.
    ///
    /// Returns `true` if a commit was created.
    fn commit_if_changed(&self, dir: &Path, message: &str) -> Result<bool>;
}

/// Version control through libgit2.
#[derive(Debug, Default, Clone)]
pub struct Git2Vcs {
    author_name: Option<String>,
    author_email: Option<String>,
}

impl Git2Vcs {
    /// Construct new libgit2 version control.
    ///
    /// The configured author is only used when git itself has no identity.
    pub fn new(settings: &CommitSettings) -> Self {
        Self {
            author_name: settings.author_name.clone(),
            author_email: settings.author_email.clone(),
        }
    }

    fn open(&self, dir: &Path) -> Result<Repository> {
        Repository::open(dir).map_err(|err| VcsError::Open {
            source: err,
            dir: dir.into(),
        })
    }

    fn signature(&self, repository: &Repository) -> Result<Signature<'static>, git2::Error> {
        repository.signature().or_else(|_| {
            let name = self.author_name.as_deref().unwrap_or("helmboot");
            let email = self.author_email.as_deref().unwrap_or("helmboot@localhost");
            debug!("git has no identity, commit as {name} <{email}>");
            Signature::now(name, email)
        })
    }
}

impl VersionControl for Git2Vcs {
    /// Clone repository at `url` into `dir`.
    ///
    /// The progress of the clone is displayed through a progress bar. If any
    /// credentials are required for the clone to continue, then the user will
    /// be prompted for that information accordingly. The progress bar will be
    /// blocked for user input.
    ///
    /// # Errors
    ///
    /// - Return [`VcsError::ProgressTemplate`] if the progress bar cannot be
    ///   styled.
    /// - Return [`VcsError::Clone`] if libgit2 fails to clone.
    #[instrument(skip(self), level = "debug")]
    fn clone_repo(&self, url: &str, dir: &Path) -> Result<()> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{elapsed_precise:.green}  {msg:<50}  [{wide_bar:.yellow/blue}]",
        )?
        .progress_chars("-Cco.");
        bar.set_style(style);
        bar.set_message(url.to_string());
        bar.enable_steady_tick(time::Duration::from_millis(100));

        let clone_err = |err: git2::Error| VcsError::Clone {
            source: err,
            url: url.into(),
            dir: dir.into(),
        };

        let prompter = IndicatifPrompter::new(bar);
        let authenticator = GitAuthenticator::default().set_prompter(prompter.clone());
        let config = Config::open_default().map_err(clone_err)?;

        let mut throttle = time::Instant::now();
        let mut rc = RemoteCallbacks::new();
        rc.credentials(authenticator.credentials(&config));
        rc.transfer_progress(|progress| {
            let bar_size = progress.total_objects() as u64;
            let bar_pos = progress.received_objects() as u64;
            if throttle.elapsed() > time::Duration::from_millis(10) {
                throttle = time::Instant::now();
                prompter.bar.set_length(bar_size);
                prompter.bar.set_position(bar_pos);
            }
            true
        });

        let mut fo = FetchOptions::new();
        fo.remote_callbacks(rc);
        let result = RepoBuilder::new().fetch_options(fo).clone(url, dir);
        prompter.bar.finish_and_clear();
        result.map_err(clone_err)?;

        Ok(())
    }

    fn is_repository(&self, dir: &Path) -> bool {
        Repository::open(dir).is_ok_and(|repository| !repository.is_bare())
    }

    #[instrument(skip(self), level = "debug")]
    fn add(&self, dir: &Path, pattern: &str) -> Result<()> {
        let stage_err = |err: git2::Error| VcsError::Stage {
            source: err,
            pattern: pattern.into(),
            dir: dir.into(),
        };

        let repository = self.open(dir)?;
        let mut index = repository.index().map_err(stage_err)?;
        index
            .add_all([pattern], IndexAddOption::DEFAULT, None)
            .map_err(stage_err)?;
        index.write().map_err(stage_err)?;

        Ok(())
    }

    #[instrument(skip(self), level = "debug")]
    fn commit_if_changed(&self, dir: &Path, message: &str) -> Result<bool> {
        let commit_err = |err: git2::Error| VcsError::Commit {
            source: err,
            dir: dir.into(),
        };

        let repository = self.open(dir)?;
        let mut index = repository.index().map_err(commit_err)?;
        let tree_oid = index.write_tree().map_err(commit_err)?;

        // INVARIANT: Always determine latest parent commit to compare against.
        let parent = match repository.head() {
            Ok(head) => Some(head.peel_to_commit().map_err(commit_err)?),
            Err(err) if matches!(err.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => None,
            Err(err) => return Err(commit_err(err)),
        };

        let unchanged = match &parent {
            Some(parent) => parent.tree_id() == tree_oid,
            None => index.is_empty(),
        };
        if unchanged {
            info!("nothing to commit in {}", dir.display());
            return Ok(false);
        }

        let tree = repository.find_tree(tree_oid).map_err(commit_err)?;
        let signature = self.signature(&repository).map_err(commit_err)?;
        let parents: Vec<&Commit<'_>> = parent.iter().collect();
        let oid = repository
            .commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)
            .map_err(commit_err)?;
        info!("committed {oid} in {}", dir.display());

        Ok(true)
    }
}

/// Git2 authentication prompter for progress bar.
#[derive(Debug, Clone)]
pub struct IndicatifPrompter {
    pub(crate) bar: ProgressBar,
}

impl IndicatifPrompter {
    /// Construct new progress bar authenticator.
    pub fn new(bar: ProgressBar) -> Self {
        Self { bar }
    }
}

impl Prompter for IndicatifPrompter {
    #[instrument(skip(self, url, _config), level = "debug")]
    fn prompt_username_password(
        &mut self,
        url: &str,
        _config: &git2::Config,
    ) -> Option<(String, String)> {
        info!("authentication required at {url}");
        self.bar.suspend(|| -> Option<(String, String)> {
            let username = Text::new("username").prompt().ok()?;
            let password = Password::new("password")
                .without_confirmation()
                .prompt()
                .ok()?;
            Some((username, password))
        })
    }

    #[instrument(skip(self, username, url, _config), level = "debug")]
    fn prompt_password(
        &mut self,
        username: &str,
        url: &str,
        _config: &git2::Config,
    ) -> Option<String> {
        info!("authentication required at {url} for user {username}");
        self.bar.suspend(|| -> Option<String> {
            Password::new("password")
                .without_confirmation()
                .prompt()
                .ok()
        })
    }

    #[instrument(skip(self, ssh_key_path, _config), level = "debug")]
    fn prompt_ssh_key_passphrase(
        &mut self,
        ssh_key_path: &Path,
        _config: &git2::Config,
    ) -> Option<String> {
        info!(
            "authentication required with ssh key at {}",
            ssh_key_path.display()
        );
        self.bar.suspend(|| -> Option<String> {
            Password::new("password")
                .without_confirmation()
                .prompt()
                .ok()
        })
    }
}

/// Version control error types.
#[derive(Debug, thiserror::Error)]
pub enum VcsError {
    /// Repository cannot be cloned.
    #[error("failed to clone repository {url} to directory {:?}", dir.display())]
    Clone {
        #[source]
        source: git2::Error,
        url: String,
        dir: PathBuf,
    },

    /// Directory cannot be opened as a repository.
    #[error("failed to open repository at {:?}", dir.display())]
    Open {
        #[source]
        source: git2::Error,
        dir: PathBuf,
    },

    /// Files cannot be staged.
    #[error("failed to add {pattern:?} to git in {:?}", dir.display())]
    Stage {
        #[source]
        source: git2::Error,
        pattern: String,
        dir: PathBuf,
    },

    /// Staged files cannot be committed.
    #[error("failed to git commit changes in {:?}", dir.display())]
    Commit {
        #[source]
        source: git2::Error,
        dir: PathBuf,
    },

    /// Style template cannot be set for progress bars.
    #[error(transparent)]
    ProgressTemplate(#[from] indicatif::style::TemplateError),
}

/// Friendly result alias :3
pub type Result<T, E = VcsError> = std::result::Result<T, E>;
