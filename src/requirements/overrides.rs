// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Command-line overrides of the requirements document.
//!
//! Each requirements flag maps onto exactly one field of a
//! [`RequirementsDocument`]. Flags are collected into a
//! [`RequirementOverrides`] value first, and only laid over the document once
//! the persisted copy has been loaded. That ordering is what gives explicit
//! flags priority over the file.
//!
//! # Unset Flags
//!
//! A flag that was not given, or was given an empty value, is _unset_ and
//! never touches the document. Thus, a flag can overwrite a persisted value,
//! but it can never erase one.

use crate::requirements::RequirementsDocument;

use clap::Args;

/// Requirements flags of a single invocation.
#[derive(Args, Default, Debug, Clone, PartialEq, Eq)]
pub struct RequirementOverrides {
    /// Git URL of the boot configuration.
    #[arg(long, value_name = "url")]
    pub boot_config_url: Option<String>,

    /// Cron schedule for auto upgrading the cluster.
    #[arg(long, value_name = "cron")]
    pub autoupdate_schedule: Option<String>,

    /// Cluster name.
    #[arg(short = 'c', long = "cluster", value_name = "name")]
    pub cluster_name: Option<String>,

    /// Namespace to install into.
    #[arg(short = 'n', long, value_name = "namespace")]
    pub namespace: Option<String>,

    /// Kubernetes provider.
    #[arg(short = 'p', long, value_name = "provider")]
    pub provider: Option<String>,

    /// Google project ID.
    #[arg(long, value_name = "id")]
    pub project: Option<String>,

    /// Host name of the container registry.
    #[arg(long, value_name = "host")]
    pub registry: Option<String>,

    /// Cloud region.
    #[arg(short = 'r', long, value_name = "region")]
    pub region: Option<String>,

    /// Cloud zone.
    #[arg(short = 'z', long, value_name = "zone")]
    pub zone: Option<String>,

    /// External DNS service account name.
    #[arg(long = "extdns-sa", value_name = "name")]
    pub external_dns_sa: Option<String>,

    /// Kaniko service account name.
    #[arg(long = "kaniko-sa", value_name = "name")]
    pub kaniko_sa: Option<String>,

    /// Kind of git hosting: bitbucketcloud, bitbucketserver, gitea, github, or gitlab.
    #[arg(long, value_name = "kind")]
    pub git_kind: Option<String>,

    /// Name of the git repository.
    #[arg(long, value_name = "name")]
    pub git_name: Option<String>,

    /// Git server host such as https://github.com.
    #[arg(long, value_name = "url")]
    pub git_server: Option<String>,

    /// Git owner (organisation or user) of the environment repositories.
    #[arg(long, value_name = "owner")]
    pub env_git_owner: Option<String>,

    /// Ingress domain name.
    #[arg(short = 'd', long, value_name = "domain")]
    pub domain: Option<String>,

    /// Email address used to enable TLS on the domain.
    #[arg(long, value_name = "email")]
    pub tls_email: Option<String>,

    /// Bucket URL to store logs.
    #[arg(long, value_name = "url")]
    pub bucket_logs: Option<String>,

    /// Bucket URL to store backups.
    #[arg(long, value_name = "url")]
    pub bucket_backups: Option<String>,

    /// Bucket URL to store repository artifacts.
    #[arg(long = "bucket-repo", value_name = "url")]
    pub bucket_repository: Option<String>,

    /// Bucket URL to store reports. Defaults to the logs bucket.
    #[arg(long, value_name = "url")]
    pub bucket_reports: Option<String>,

    /// Vault name.
    #[arg(long, value_name = "name")]
    pub vault_name: Option<String>,

    /// Vault bucket.
    #[arg(long, value_name = "bucket")]
    pub vault_bucket: Option<String>,

    /// Vault key ring.
    #[arg(long, value_name = "keyring")]
    pub vault_keyring: Option<String>,

    /// Vault key.
    #[arg(long, value_name = "key")]
    pub vault_key: Option<String>,

    /// Vault service account name.
    #[arg(long = "vault-sa", value_name = "name")]
    pub vault_service_account: Option<String>,

    /// Velero service account name.
    #[arg(long = "velero-sa", value_name = "name")]
    pub velero_service_account: Option<String>,

    /// Velero namespace.
    #[arg(long = "velero-ns", value_name = "namespace")]
    pub velero_namespace: Option<String>,

    /// Version stream git URL.
    #[arg(long, value_name = "url")]
    pub version_stream_url: Option<String>,

    /// Version stream git reference (branch, tag, or sha).
    #[arg(long, value_name = "ref")]
    pub version_stream_ref: Option<String>,
}

impl RequirementOverrides {
    /// Lay every set flag over the matching field of `document`.
    pub fn apply(&self, document: &mut RequirementsDocument) {
        let RequirementsDocument {
            auto_update,
            boot_config_url,
            cluster,
            ingress,
            storage,
            vault,
            velero,
            version_stream,
            ..
        } = document;

        overlay(boot_config_url, &self.boot_config_url);
        overlay(&mut auto_update.schedule, &self.autoupdate_schedule);

        overlay(&mut cluster.cluster_name, &self.cluster_name);
        overlay(&mut cluster.namespace, &self.namespace);
        overlay(&mut cluster.provider, &self.provider);
        overlay(&mut cluster.project, &self.project);
        overlay(&mut cluster.registry, &self.registry);
        overlay(&mut cluster.region, &self.region);
        overlay(&mut cluster.zone, &self.zone);
        overlay(&mut cluster.external_dns_sa_name, &self.external_dns_sa);
        overlay(&mut cluster.kaniko_sa_name, &self.kaniko_sa);
        overlay(&mut cluster.git_kind, &self.git_kind);
        overlay(&mut cluster.git_name, &self.git_name);
        overlay(&mut cluster.git_server, &self.git_server);
        overlay(&mut cluster.environment_git_owner, &self.env_git_owner);

        overlay(&mut ingress.domain, &self.domain);
        overlay(&mut ingress.tls.email, &self.tls_email);

        overlay(&mut storage.logs.url, &self.bucket_logs);
        overlay(&mut storage.backup.url, &self.bucket_backups);
        overlay(&mut storage.repository.url, &self.bucket_repository);
        overlay(&mut storage.reports.url, &self.bucket_reports);

        overlay(&mut vault.name, &self.vault_name);
        overlay(&mut vault.bucket, &self.vault_bucket);
        overlay(&mut vault.keyring, &self.vault_keyring);
        overlay(&mut vault.key, &self.vault_key);
        overlay(&mut vault.service_account, &self.vault_service_account);

        overlay(&mut velero.service_account, &self.velero_service_account);
        overlay(&mut velero.namespace, &self.velero_namespace);

        overlay(&mut version_stream.url, &self.version_stream_url);
        overlay(&mut version_stream.git_ref, &self.version_stream_ref);
    }
}

/// Merge command-line overrides over a loaded document.
pub fn merge(mut base: RequirementsDocument, overrides: &RequirementOverrides) -> RequirementsDocument {
    overrides.apply(&mut base);
    base
}

fn overlay(field: &mut String, value: &Option<String>) {
    if let Some(value) = value.as_deref().filter(|value| !value.is_empty()) {
        value.clone_into(field);
    }
}
