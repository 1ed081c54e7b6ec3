// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Pre-install verification of a working directory.
//!
//! Verification runs after the requirements file has been saved, and before
//! anything gets committed. A failed verification halts the bootstrap.

use crate::{
    requirements::defaults::{apply_defaults, InvalidOptionError},
    store::{RequirementsStore, StoreError},
};

use git2::Repository;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

/// Layer of indirection for pre-install verification.
pub trait PreInstallVerifier {
    /// Verify working directory at `dir` is ready to be installed from.
    fn verify(&self, dir: &Path) -> Result<()>;
}

/// Structural verification of a working directory.
///
/// Checks that the working directory is a git clone, and that it holds a
/// requirements file that parses and passes validation.
#[derive(Debug, Default, Clone)]
pub struct RequirementsVerifier;

impl RequirementsVerifier {
    /// Construct new structural verifier.
    pub fn new() -> Self {
        Self
    }
}

impl PreInstallVerifier for RequirementsVerifier {
    #[instrument(skip(self), level = "debug")]
    fn verify(&self, dir: &Path) -> Result<()> {
        Repository::open(dir).map_err(|err| VerifyError::NotARepository {
            source: err,
            dir: dir.into(),
        })?;

        let store = RequirementsStore::new(dir);
        let (mut document, path) = store.load()?;
        if path.is_none() {
            return Err(VerifyError::MissingRequirements {
                path: store.canonical_path(),
            });
        }
        apply_defaults(&mut document)?;

        info!("verified requirements in {}", dir.display());
        Ok(())
    }
}

/// Verification error types.
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    /// Working directory is not a git repository.
    #[error("directory {:?} is not a git repository", dir.display())]
    NotARepository {
        #[source]
        source: git2::Error,
        dir: PathBuf,
    },

    /// Working directory holds no requirements file.
    #[error("no requirements file at {:?}", path.display())]
    MissingRequirements { path: PathBuf },

    /// Requirements file cannot be loaded.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Requirements file holds invalid values.
    #[error(transparent)]
    InvalidOption(#[from] InvalidOptionError),
}

/// Friendly result alias :3
pub type Result<T, E = VerifyError> = std::result::Result<T, E>;
