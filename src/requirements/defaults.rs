// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Defaulting rules of the requirements document.
//!
//! Once overrides have been merged, a fixed sequence of rules derives the
//! implicit fields of the document from the explicit ones:
//!
//! 1. The git kind, when set, must be a known [`GitKind`].
//! 2. A non-empty auto-update schedule enables auto-update.
//! 3. A non-empty TLS email enables TLS.
//! 4. An empty reports bucket inherits the logs bucket.
//! 5. Every storage bucket with a URL is enabled.
//!
//! Rules 2 through 5 only ever switch flags on. A flag that is already enabled
//! stays enabled even when its governing value is empty. Running the rules
//! twice yields the same document as running them once.

use crate::requirements::{GitKind, RequirementsDocument, StorageEntry};

use tracing::debug;

/// Run every defaulting rule over `document` in order.
///
/// # Errors
///
/// - Return [`InvalidOptionError`] if the git kind is set to an unknown kind.
///   The document is left unmodified in that case.
pub fn apply_defaults(document: &mut RequirementsDocument) -> Result<()> {
    validate_git_kind(document)?;

    if !document.auto_update.schedule.is_empty() {
        document.auto_update.enabled = true;
    }

    if !document.ingress.tls.email.is_empty() {
        document.ingress.tls.enabled = true;
    }

    // INVARIANT: Reports must inherit logs before bucket enablement runs.
    let storage = &mut document.storage;
    if !storage.logs.url.is_empty() && storage.reports.url.is_empty() {
        debug!("reports bucket defaults to logs bucket {}", storage.logs.url);
        storage.reports.url = storage.logs.url.clone();
    }

    for entry in storage.entries_mut() {
        enable_storage(entry);
    }

    Ok(())
}

fn validate_git_kind(document: &RequirementsDocument) -> Result<()> {
    let git_kind = document.cluster.git_kind.as_str();
    if git_kind.is_empty() {
        return Ok(());
    }

    git_kind
        .parse::<GitKind>()
        .map(|_| ())
        .map_err(|_| InvalidOptionError {
            option: "git-kind".into(),
            value: git_kind.into(),
            allowed: GitKind::supported_names(),
        })
}

fn enable_storage(entry: &mut StorageEntry) {
    if !entry.url.is_empty() {
        entry.enabled = true;
    }
}

/// Option was given a value outside of its allowed set.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error(
    "invalid option: --{option} {value:?}, possible values: {}",
    .allowed.join(", ")
)]
pub struct InvalidOptionError {
    pub option: String,
    pub value: String,
    pub allowed: Vec<String>,
}

/// Friendly result alias :3
type Result<T, E = InvalidOptionError> = std::result::Result<T, E>;
