// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration layout.
//!
//! Specify the layout of the settings file that Helmboot reads on startup.
//! Every setting has a built-in default, so the file itself is optional and
//! may list only the keys the user wants to change.
//!
//! # General Layout
//!
//! ```toml
//! [source]
//! default_url = "https://github.com/jenkins-x-labs/boot-helmfile-config.git"
//! jenkins_url = "https://github.com/jenkins-x-labs/boot-jenkins-config.git"
//!
//! [commit]
//! message = "fix: initial code"
//! pattern = "*"
//! author_name = "Jane Doe"
//! author_email = "jane@doe.com"
//! ```

use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Error as FmtError, Formatter, Result as FmtResult},
    fs::read_to_string,
    io::ErrorKind,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::debug;

/// Primary source of the initial configuration files.
pub const DEFAULT_BOOT_HELMFILE_URL: &str =
    "https://github.com/jenkins-x-labs/boot-helmfile-config.git";

/// Source of the initial configuration files when the Jenkins operator is used.
pub const DEFAULT_JENKINS_BOOT_HELMFILE_URL: &str =
    "https://github.com/jenkins-x-labs/boot-jenkins-config.git";

/// Helmboot settings layout.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Where initial configuration files are cloned from.
    pub source: SourceSettings,

    /// How the working directory gets committed.
    pub commit: CommitSettings,
}

impl Settings {
    /// Load settings from file at `path`.
    ///
    /// A missing file yields the built-in defaults.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::Read`] if the file exists but cannot be read.
    /// - Return [`ConfigError::Deserialize`] if the file is not valid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match read_to_string(path) {
            Ok(data) => data.parse(),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("no settings at {:?}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(err) => Err(ConfigError::Read {
                source: err,
                path: path.into(),
            }),
        }
    }
}

impl FromStr for Settings {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        toml::de::from_str(data).map_err(ConfigError::Deserialize)
    }
}

impl Display for Settings {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(
            toml::ser::to_string_pretty(self)
                .map_err(ConfigError::Serialize)?
                .as_str(),
        )
    }
}

/// Default git sources.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SourceSettings {
    /// URL cloned when no explicit URL is given.
    pub default_url: String,

    /// URL cloned when the Jenkins operator is requested.
    pub jenkins_url: String,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            default_url: DEFAULT_BOOT_HELMFILE_URL.into(),
            jenkins_url: DEFAULT_JENKINS_BOOT_HELMFILE_URL.into(),
        }
    }
}

/// Commit settings.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CommitSettings {
    /// Commit message of the bootstrap commit.
    pub message: String,

    /// Pathspec of files to stage.
    pub pattern: String,

    /// Author name used when git has no identity configured.
    pub author_name: Option<String>,

    /// Author email used when git has no identity configured.
    pub author_email: Option<String>,
}

impl Default for CommitSettings {
    fn default() -> Self {
        Self {
            message: "fix: initial code".into(),
            pattern: "*".into(),
            author_name: None,
            author_email: None,
        }
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read settings file.
    #[error("failed to read settings at {:?}", path.display())]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Failed to deserialize settings.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    /// Failed to serialize settings.
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),
}

impl From<ConfigError> for FmtError {
    fn from(_: ConfigError) -> Self {
        FmtError
    }
}

/// Friendly result alias :3
type Result<T, E = ConfigError> = std::result::Result<T, E>;
