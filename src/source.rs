// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Git source resolution.
//!
//! Decide which git URL the initial configuration files come from, and which
//! local directory becomes the working directory.
//!
//! # URL Priority
//!
//! 1. The URL given explicitly through `--initial-git-url`.
//! 2. The Jenkins operator source if `--jenkins` was given.
//! 3. The default source.
//!
//! Both default sources come from [`SourceSettings`].
//!
//! # Working Directory
//!
//! Without a caller supplied directory, a fresh temporary directory is
//! allocated and the source is cloned into it. The temporary directory is
//! never removed by Helmboot, since it holds the result of the run.
//!
//! With a caller supplied directory, an existing git clone is used as-is. A
//! missing or empty directory gets the source cloned into it. Anything else is
//! rejected.

use crate::{
    config::SourceSettings,
    vcs::{VcsError, VersionControl},
};

use std::{
    fs::read_dir,
    io::ErrorKind,
    path::{Path, PathBuf},
};
use tracing::{info, instrument, warn};

/// Prefix of freshly allocated working directories.
const TEMP_DIR_PREFIX: &str = "helmboot-";

/// Where the initial configuration files should come from.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct SourceRequest {
    /// Explicit git URL to clone.
    pub initial_git_url: Option<String>,

    /// Use the Jenkins operator source when no explicit URL is given.
    pub jenkins: bool,

    /// Caller supplied working directory.
    pub dir: Option<PathBuf>,
}

/// Resolve git source and working directory.
#[derive(Debug)]
pub struct GitSourceResolver<'a, V>
where
    V: VersionControl,
{
    vcs: &'a V,
    settings: &'a SourceSettings,
}

impl<'a, V> GitSourceResolver<'a, V>
where
    V: VersionControl,
{
    /// Construct new git source resolver.
    pub fn new(vcs: &'a V, settings: &'a SourceSettings) -> Self {
        Self { vcs, settings }
    }

    /// Pick git URL to clone by priority.
    pub fn resolve_url(&self, request: &SourceRequest) -> String {
        match request.initial_git_url.as_deref() {
            Some(url) if !url.is_empty() => url.into(),
            _ if request.jenkins => self.settings.jenkins_url.clone(),
            _ => self.settings.default_url.clone(),
        }
    }

    /// Materialize working directory.
    ///
    /// # Errors
    ///
    /// - Return [`SourceError::DirectoryAllocation`] if a temporary directory
    ///   cannot be created.
    /// - Return [`SourceError::InspectDir`] if the caller supplied directory
    ///   cannot be read.
    /// - Return [`SourceError::NotAGitClone`] if the caller supplied directory
    ///   is populated, but not a git clone.
    /// - Return [`SourceError::Clone`] if cloning fails.
    #[instrument(skip(self), level = "debug")]
    pub fn resolve(&self, request: &SourceRequest) -> Result<PathBuf> {
        let dir = match request.dir.as_deref() {
            Some(dir) if self.vcs.is_repository(dir) => {
                if request.initial_git_url.as_deref().is_some_and(|url| !url.is_empty()) {
                    warn!("{} is already a git clone, not cloning initial git url", dir.display());
                }
                info!("using git clone at {}", dir.display());
                return Ok(dir.into());
            }
            Some(dir) => {
                if !is_vacant(dir)? {
                    return Err(SourceError::NotAGitClone { dir: dir.into() });
                }
                dir.to_path_buf()
            }
            None => allocate_temp_dir()?,
        };

        let url = self.resolve_url(request);
        info!("cloning {url} to directory {}", dir.display());
        self.vcs.clone_repo(&url, &dir)?;

        Ok(dir)
    }
}

fn allocate_temp_dir() -> Result<PathBuf> {
    let dir = tempfile::Builder::new()
        .prefix(TEMP_DIR_PREFIX)
        .tempdir()
        .map_err(SourceError::DirectoryAllocation)?;

    // INVARIANT: Working directory outlives this run, so never auto-delete it.
    Ok(dir.keep())
}

fn is_vacant(dir: &Path) -> Result<bool> {
    match read_dir(dir) {
        Ok(mut entries) => Ok(entries.next().is_none()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(true),
        Err(err) => Err(SourceError::InspectDir {
            source: err,
            dir: dir.into(),
        }),
    }
}

/// Git source resolution error types.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Temporary working directory cannot be created.
    #[error("failed to create temporary directory")]
    DirectoryAllocation(#[source] std::io::Error),

    /// Caller supplied directory cannot be inspected.
    #[error("failed to read directory {:?}", dir.display())]
    InspectDir {
        #[source]
        source: std::io::Error,
        dir: PathBuf,
    },

    /// Caller supplied directory holds files, but is not a git clone.
    #[error("directory {:?} is not empty and is not a git clone", dir.display())]
    NotAGitClone { dir: PathBuf },

    /// Source cannot be cloned.
    #[error(transparent)]
    Clone(#[from] VcsError),
}

/// Friendly result alias :3
pub type Result<T, E = SourceError> = std::result::Result<T, E>;
