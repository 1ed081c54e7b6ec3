// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Bootstrap the git repository of a cluster installation.
//!
//! Helmboot locates or clones a configuration repository, merges
//! command-line overrides into its requirements document, applies the
//! defaulting rules, and commits the result only when something changed.
//!
//! # See Also
//!
//! 1. [`BootstrapPipeline`](crate::pipeline::BootstrapPipeline)
//! 2. [`RequirementsDocument`](crate::requirements::RequirementsDocument)

pub mod config;
pub mod path;
pub mod pipeline;
pub mod publish;
pub mod requirements;
pub mod source;
pub mod store;
pub mod vcs;
pub mod verify;

pub use pipeline::{BootstrapPipeline, BootstrapReport, BootstrapRequest, PipelineError};
pub use requirements::{overrides::RequirementOverrides, RequirementsDocument};
