// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Requirements file storage.
//!
//! The requirements document of a working directory is persisted to a single
//! YAML file named `jx-requirements.yml`.
//!
//! # Requirements File Layout
//!
//! Helmboot looks for the requirements file at the top-level of the working
//! directory first, then inside the conventional `env` directory. The first
//! match wins. When no file exists yet, a new one is always created at the
//! top-level of the working directory. Thus, running Helmboot twice against
//! the same working directory always loads the file the first run saved.

use crate::requirements::{RequirementsDocument, RequirementsError};

use std::{
    fs::{read_to_string, write},
    path::{Path, PathBuf},
};
use tracing::{debug, info, instrument};

/// Fixed name of the requirements file.
pub const REQUIREMENTS_FILE_NAME: &str = "jx-requirements.yml";

/// Directories searched for the requirements file, relative to the working
/// directory, in order.
const SEARCH_DIRS: [&str; 2] = ["", "env"];

/// Load and save the requirements document of a working directory.
#[derive(Debug, Clone)]
pub struct RequirementsStore {
    dir: PathBuf,
}

impl RequirementsStore {
    /// Construct new requirements store rooted at working directory `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path a requirements file gets when none exists yet.
    pub fn canonical_path(&self) -> PathBuf {
        self.dir.join(REQUIREMENTS_FILE_NAME)
    }

    /// Find existing requirements file.
    pub fn find(&self) -> Option<PathBuf> {
        SEARCH_DIRS
            .iter()
            .map(|sub_dir| self.dir.join(sub_dir).join(REQUIREMENTS_FILE_NAME))
            .find(|path| path.is_file())
    }

    /// Load requirements document.
    ///
    /// Returns the document along with the path it was loaded from. An absent
    /// file is not an error: a default document and no path are returned.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::Read`] if the requirements file cannot be read.
    /// - Return [`StoreError::Parse`] if the requirements file is not valid.
    #[instrument(skip(self), level = "debug")]
    pub fn load(&self) -> Result<(RequirementsDocument, Option<PathBuf>)> {
        let Some(path) = self.find() else {
            debug!("no requirements file in {:?}", self.dir.display());
            return Ok((RequirementsDocument::default(), None));
        };

        debug!("load requirements from {:?}", path.display());
        let data = read_to_string(&path).map_err(|err| StoreError::Read {
            source: err,
            path: path.clone(),
        })?;
        let document = data.parse().map_err(|err| StoreError::Parse {
            source: err,
            path: path.clone(),
        })?;

        Ok((document, Some(path)))
    }

    /// Save requirements document.
    ///
    /// Writes to `path` when the document was loaded from an existing file,
    /// or to [`canonical_path`](Self::canonical_path) otherwise. Parent
    /// directories are created as needed. Returns the path written to.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::Render`] if the document cannot be serialized.
    /// - Return [`StoreError::CreateDir`] if parent directories cannot be
    ///   created.
    /// - Return [`StoreError::Write`] if the requirements file cannot be
    ///   written.
    #[instrument(skip(self, document), level = "debug")]
    pub fn save(&self, document: &RequirementsDocument, path: Option<&Path>) -> Result<PathBuf> {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.canonical_path());

        let data = serde_yaml::to_string(document)
            .map_err(|err| StoreError::Render(RequirementsError::Serialize(err)))?;

        if let Some(parent) = path.parent() {
            mkdirp::mkdirp(parent).map_err(|err| StoreError::CreateDir {
                source: err,
                path: parent.into(),
            })?;
        }

        write(&path, data.as_bytes()).map_err(|err| StoreError::Write {
            source: err,
            path: path.clone(),
        })?;
        info!("saved file: {}", path.display());

        Ok(path)
    }
}

/// Requirements storage error types.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Requirements file cannot be read from.
    #[error("failed to read requirements at {:?}", path.display())]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Requirements file is not a valid document.
    #[error("failed to parse requirements at {:?}", path.display())]
    Parse {
        #[source]
        source: RequirementsError,
        path: PathBuf,
    },

    /// Requirements document cannot be serialized.
    #[error("failed to render requirements")]
    Render(#[source] RequirementsError),

    /// Parent directory of requirements file cannot be created.
    #[error("failed to create directory {:?}", path.display())]
    CreateDir {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Requirements file cannot be written to.
    #[error("failed to save {:?}", path.display())]
    Write {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
}

/// Friendly result alias :3
pub type Result<T, E = StoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use std::fs::create_dir_all;
    use tempfile::TempDir;

    #[test]
    fn load_without_file_is_default() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let store = RequirementsStore::new(dir.path());

        let (document, path) = store.load()?;
        assert_eq!(document, RequirementsDocument::default());
        assert_eq!(path, None);

        Ok(())
    }

    #[test]
    fn save_then_load_round_trip() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let store = RequirementsStore::new(dir.path());

        let mut document = RequirementsDocument::default();
        document.cluster.cluster_name = "mycluster".into();
        document.cluster.git_kind = "github".into();
        document.ingress.domain = "example.com".into();
        document.ingress.tls.email = "admin@example.com".into();
        document.ingress.tls.enabled = true;
        document.storage.logs.url = "gs://x-logs".into();
        document.storage.logs.enabled = true;
        document.vault.keyring = "ring".into();
        document.velero.namespace = "velero".into();
        document.version_stream.git_ref = "master".into();
        document.auto_update.schedule = "0 0 * * *".into();
        document.auto_update.enabled = true;

        let saved = store.save(&document, None)?;
        assert_eq!(saved, dir.path().join(REQUIREMENTS_FILE_NAME));

        let (reloaded, path) = store.load()?;
        assert_eq!(reloaded, document);
        assert_eq!(path, Some(saved));

        Ok(())
    }

    #[test]
    fn load_from_env_directory() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        create_dir_all(dir.path().join("env"))?;
        let path = dir.path().join("env").join(REQUIREMENTS_FILE_NAME);
        write(&path, "cluster:\n  clusterName: nested\n")?;

        let store = RequirementsStore::new(dir.path());
        let (document, found) = store.load()?;
        assert_eq!(document.cluster.cluster_name, "nested");
        assert_eq!(found, Some(path));

        Ok(())
    }

    #[test]
    fn top_level_file_wins_over_env_directory() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        create_dir_all(dir.path().join("env"))?;
        write(
            dir.path().join("env").join(REQUIREMENTS_FILE_NAME),
            "cluster:\n  clusterName: nested\n",
        )?;
        write(
            dir.path().join(REQUIREMENTS_FILE_NAME),
            "cluster:\n  clusterName: top\n",
        )?;

        let store = RequirementsStore::new(dir.path());
        let (document, found) = store.load()?;
        assert_eq!(document.cluster.cluster_name, "top");
        assert_eq!(found, Some(store.canonical_path()));

        Ok(())
    }

    #[test]
    fn save_creates_parent_directories() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let store = RequirementsStore::new(dir.path());
        let path = dir.path().join("nested").join("deeper").join(REQUIREMENTS_FILE_NAME);

        let saved = store.save(&RequirementsDocument::default(), Some(&path))?;
        assert_eq!(saved, path);
        assert!(path.is_file());

        Ok(())
    }

    #[test]
    fn malformed_file_reports_path() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join(REQUIREMENTS_FILE_NAME);
        write(
            &path,
            indoc! {r#"
                cluster:
                  clusterName: [unterminated
            "#},
        )?;

        let store = RequirementsStore::new(dir.path());
        let result = store.load();
        assert!(matches!(result, Err(StoreError::Parse { path: p, .. }) if p == path));

        Ok(())
    }
}
