// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Requirements document layout.
//!
//! The __requirements document__ describes the desired state of a cluster
//! installation: cluster identity, git hosting, ingress, storage buckets,
//! secret vault, backups, the version stream, and the auto-update schedule.
//! It lives in the configuration repository as `jx-requirements.yml` and is
//! committed along with everything else, so the rendered form must be stable
//! between runs.
//!
//! # Set and Unset
//!
//! Every scalar field is either _set_ (non-empty) or _unset_ (empty string,
//! or `false`). Unset is the sentinel for "nothing requested" throughout
//! override merging and defaulting. The `enabled` flags on storage entries,
//! TLS, and auto-update are derived from their governing values by the
//! [`defaults`] rules.
//!
//! # Unknown Keys
//!
//! Only the fields needed by the bootstrap pipeline are modelled. Any other
//! key found in a section is kept in that section's `extra` map, and written
//! back out untouched.
//!
//! File I/O is left to [`store`](crate::store).

pub mod defaults;
pub mod overrides;

use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fmt::{Display, Error as FmtError, Formatter, Result as FmtResult},
    str::FromStr,
};

/// Keys of a section that are not part of the modelled schema.
pub type ExtraFields = BTreeMap<String, serde_yaml::Value>;

/// Requirements document of a cluster installation.
#[derive(Default, Debug, PartialEq, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RequirementsDocument {
    /// Scheduled upgrades of the installation.
    #[serde(skip_serializing_if = "AutoUpdate::is_unset")]
    pub auto_update: AutoUpdate,

    /// Git URL of the boot configuration.
    #[serde(rename = "bootConfigURL", skip_serializing_if = "String::is_empty")]
    pub boot_config_url: String,

    /// Cluster identity, provider, and git hosting.
    #[serde(skip_serializing_if = "ClusterRequirements::is_unset")]
    pub cluster: ClusterRequirements,

    /// Ingress domain and TLS.
    #[serde(skip_serializing_if = "IngressRequirements::is_unset")]
    pub ingress: IngressRequirements,

    /// Storage buckets.
    pub storage: StorageRequirements,

    /// Secret vault.
    #[serde(skip_serializing_if = "VaultRequirements::is_unset")]
    pub vault: VaultRequirements,

    /// Backup tooling.
    #[serde(skip_serializing_if = "VeleroRequirements::is_unset")]
    pub velero: VeleroRequirements,

    /// Version stream reference.
    #[serde(skip_serializing_if = "VersionStreamRequirements::is_unset")]
    pub version_stream: VersionStreamRequirements,

    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl FromStr for RequirementsDocument {
    type Err = RequirementsError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        // INVARIANT: An empty file is an empty document, not a parse error.
        if data.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(data).map_err(RequirementsError::Deserialize)
    }
}

impl Display for RequirementsDocument {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(
            serde_yaml::to_string(self)
                .map_err(RequirementsError::Serialize)?
                .as_str(),
        )
    }
}

/// Auto-update settings.
#[derive(Default, Debug, PartialEq, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AutoUpdate {
    #[serde(skip_serializing_if = "is_false")]
    pub enabled: bool,

    /// Cron schedule used for upgrades.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub schedule: String,

    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl AutoUpdate {
    fn is_unset(&self) -> bool {
        !self.enabled && self.schedule.is_empty() && self.extra.is_empty()
    }
}

/// Cluster identity, provider, and git hosting settings.
#[derive(Default, Debug, PartialEq, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClusterRequirements {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub cluster_name: String,

    /// Owner (organisation or user) of the environment repositories.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub environment_git_owner: String,

    #[serde(rename = "externalDNSSAName", skip_serializing_if = "String::is_empty")]
    pub external_dns_sa_name: String,

    /// Kind of git hosting, see [`GitKind`].
    #[serde(skip_serializing_if = "String::is_empty")]
    pub git_kind: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub git_name: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub git_server: String,

    #[serde(rename = "kanikoSAName", skip_serializing_if = "String::is_empty")]
    pub kaniko_sa_name: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub namespace: String,

    /// Google project ID.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub project: String,

    /// Kubernetes provider.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub provider: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub region: String,

    /// Host name of the container registry.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub registry: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub zone: String,

    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl ClusterRequirements {
    fn is_unset(&self) -> bool {
        self == &Self::default()
    }
}

/// Ingress settings.
#[derive(Default, Debug, PartialEq, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IngressRequirements {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub domain: String,

    #[serde(skip_serializing_if = "TlsRequirements::is_unset")]
    pub tls: TlsRequirements,

    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl IngressRequirements {
    fn is_unset(&self) -> bool {
        self == &Self::default()
    }
}

/// TLS settings of the ingress.
#[derive(Default, Debug, PartialEq, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TlsRequirements {
    /// Contact address used when requesting certificates.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub email: String,

    #[serde(skip_serializing_if = "is_false")]
    pub enabled: bool,

    #[serde(skip_serializing_if = "is_false")]
    pub production: bool,

    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl TlsRequirements {
    fn is_unset(&self) -> bool {
        self == &Self::default()
    }
}

/// Storage buckets of the installation.
#[derive(Default, Debug, PartialEq, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StorageRequirements {
    pub backup: StorageEntry,
    pub logs: StorageEntry,
    pub reports: StorageEntry,
    pub repository: StorageEntry,

    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl StorageRequirements {
    /// Mutable access to every bucket entry, in rendering order.
    pub fn entries_mut(&mut self) -> [&mut StorageEntry; 4] {
        [
            &mut self.backup,
            &mut self.logs,
            &mut self.reports,
            &mut self.repository,
        ]
    }
}

/// A single storage bucket.
///
/// Both keys are always written so that a disabled bucket is still visible in
/// the committed file.
#[derive(Default, Debug, PartialEq, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StorageEntry {
    pub enabled: bool,
    pub url: String,

    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// Secret vault settings.
#[derive(Default, Debug, PartialEq, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VaultRequirements {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub bucket: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub keyring: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub key: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub service_account: String,

    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl VaultRequirements {
    fn is_unset(&self) -> bool {
        self == &Self::default()
    }
}

/// Velero backup settings.
#[derive(Default, Debug, PartialEq, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VeleroRequirements {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub service_account: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub namespace: String,

    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl VeleroRequirements {
    fn is_unset(&self) -> bool {
        self == &Self::default()
    }
}

/// Version stream reference.
#[derive(Default, Debug, PartialEq, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VersionStreamRequirements {
    /// Git URL of the version stream.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub url: String,

    /// Branch, tag, or sha of the version stream.
    #[serde(rename = "ref", skip_serializing_if = "String::is_empty")]
    pub git_ref: String,

    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl VersionStreamRequirements {
    fn is_unset(&self) -> bool {
        self == &Self::default()
    }
}

/// Supported kinds of git hosting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GitKind {
    BitbucketCloud,
    BitbucketServer,
    Gitea,
    GitHub,
    GitLab,

    /// Synthetic kind used by tests. Accepted, but never advertised.
    Fake,
}

impl GitKind {
    /// Kinds listed to the user, in sorted order.
    pub const SUPPORTED: [GitKind; 5] = [
        GitKind::BitbucketCloud,
        GitKind::BitbucketServer,
        GitKind::Gitea,
        GitKind::GitHub,
        GitKind::GitLab,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BitbucketCloud => "bitbucketcloud",
            Self::BitbucketServer => "bitbucketserver",
            Self::Gitea => "gitea",
            Self::GitHub => "github",
            Self::GitLab => "gitlab",
            Self::Fake => "fake",
        }
    }

    /// Names of the advertised kinds.
    pub fn supported_names() -> Vec<String> {
        Self::SUPPORTED.iter().map(|kind| kind.as_str().to_owned()).collect()
    }
}

impl FromStr for GitKind {
    type Err = UnknownGitKind;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        Self::SUPPORTED
            .into_iter()
            .chain([Self::Fake])
            .find(|kind| kind.as_str() == data)
            .ok_or_else(|| UnknownGitKind(data.to_owned()))
    }
}

impl Display for GitKind {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(self.as_str())
    }
}

/// Value is not a known kind of git hosting.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown git kind {0:?}")]
pub struct UnknownGitKind(pub String);

/// Requirements document error types.
#[derive(Debug, thiserror::Error)]
pub enum RequirementsError {
    /// Failed to deserialize requirements.
    #[error(transparent)]
    Deserialize(serde_yaml::Error),

    /// Failed to serialize requirements.
    #[error(transparent)]
    Serialize(serde_yaml::Error),
}

impl From<RequirementsError> for FmtError {
    fn from(_: RequirementsError) -> Self {
        FmtError
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}
