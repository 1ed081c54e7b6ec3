// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Bootstrap pipeline.
//!
//! A bootstrap walks through a fixed sequence of stages:
//!
//! ```text
//! ResolvingSource -> LoadingAndMerging -> Defaulting -> Saving
//!     -> Verifying -> Committing -> Publishing
//! ```
//!
//! The first stage to fail ends the run. Nothing is retried, and nothing is
//! rolled back: a completed clone or a saved requirements file stays on disk.
//! Running the pipeline again over the same working directory reloads the
//! saved requirements, so a re-run is the way to recover.
//!
//! The requirements document is owned by the run, and handed from stage to
//! stage by value.

use crate::{
    config::Settings,
    publish::{EnvironmentPublisher, Git2Publisher, PublishError},
    requirements::{
        defaults::{apply_defaults, InvalidOptionError},
        overrides::{merge, RequirementOverrides},
        RequirementsDocument,
    },
    source::{GitSourceResolver, SourceError, SourceRequest},
    store::{RequirementsStore, StoreError},
    vcs::{Git2Vcs, VcsError, VersionControl},
    verify::{PreInstallVerifier, RequirementsVerifier, VerifyError},
};

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
};
use tracing::{debug, info, instrument};

/// Stages of a bootstrap, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ResolvingSource,
    LoadingAndMerging,
    Defaulting,
    Saving,
    Verifying,
    Committing,
    Publishing,
}

impl Display for Stage {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            Self::ResolvingSource => "resolving source",
            Self::LoadingAndMerging => "loading and merging requirements",
            Self::Defaulting => "defaulting requirements",
            Self::Saving => "saving requirements",
            Self::Verifying => "verifying",
            Self::Committing => "committing",
            Self::Publishing => "publishing",
        };
        fmt.write_str(name)
    }
}

/// Everything a single bootstrap run was asked to do.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct BootstrapRequest {
    pub source: SourceRequest,
    pub overrides: RequirementOverrides,
}

/// Outcome of a successful bootstrap.
#[derive(Debug, Clone, PartialEq)]
pub struct BootstrapReport {
    /// Working directory holding the configuration repository.
    pub dir: PathBuf,

    /// Requirements file that was saved.
    pub requirements_path: PathBuf,

    /// Final requirements document.
    pub requirements: RequirementsDocument,

    /// Whether the committing stage created a commit.
    pub committed: bool,
}

/// Bootstrap pipeline over its external collaborators.
#[derive(Debug)]
pub struct BootstrapPipeline<V = Git2Vcs, P = RequirementsVerifier, E = Git2Publisher>
where
    V: VersionControl,
    P: PreInstallVerifier,
    E: EnvironmentPublisher,
{
    vcs: V,
    verifier: P,
    publisher: E,
    settings: Settings,
}

impl<V, P, E> BootstrapPipeline<V, P, E>
where
    V: VersionControl,
    P: PreInstallVerifier,
    E: EnvironmentPublisher,
{
    /// Construct new bootstrap pipeline.
    pub fn new(vcs: V, verifier: P, publisher: E, settings: Settings) -> Self {
        Self {
            vcs,
            verifier,
            publisher,
            settings,
        }
    }

    /// Run every stage in order, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// - Return [`PipelineError::Source`] if the working directory cannot be
    ///   resolved.
    /// - Return [`PipelineError::Load`] if existing requirements cannot be
    ///   loaded.
    /// - Return [`PipelineError::InvalidOption`] if defaulting rejects the
    ///   merged requirements. Nothing is saved in that case.
    /// - Return [`PipelineError::Save`] if requirements cannot be saved.
    /// - Return [`PipelineError::Verify`] if pre-install verification fails.
    /// - Return [`PipelineError::Stage`] or [`PipelineError::Commit`] if the
    ///   working directory cannot be committed.
    /// - Return [`PipelineError::Publish`] if publishing fails.
    #[instrument(skip(self, request), level = "debug")]
    pub fn run(&self, request: &BootstrapRequest) -> Result<BootstrapReport> {
        enter(Stage::ResolvingSource);
        let dir = GitSourceResolver::new(&self.vcs, &self.settings.source).resolve(&request.source)?;

        enter(Stage::LoadingAndMerging);
        let store = RequirementsStore::new(&dir);
        let (document, path) = store.load().map_err(|err| PipelineError::Load {
            source: err,
            dir: dir.clone(),
        })?;
        let mut document = merge(document, &request.overrides);

        enter(Stage::Defaulting);
        apply_defaults(&mut document)?;

        enter(Stage::Saving);
        let requirements_path = store.save(&document, path.as_deref()).map_err(PipelineError::Save)?;

        enter(Stage::Verifying);
        self.verifier
            .verify(&dir)
            .map_err(|err| PipelineError::Verify {
                source: err,
                dir: dir.clone(),
            })?;
        info!("created git source at {}", dir.display());

        enter(Stage::Committing);
        let committed = self.commit(&dir)?;

        enter(Stage::Publishing);
        self.publisher.create_dev_env_git_repository(&dir)?;

        Ok(BootstrapReport {
            dir,
            requirements_path,
            requirements: document,
            committed,
        })
    }

    /// Stage every file in `dir`, and commit only if the tree changed.
    ///
    /// # Errors
    ///
    /// - Return [`PipelineError::Stage`] if files cannot be staged.
    /// - Return [`PipelineError::Commit`] if staged files cannot be committed.
    pub fn commit(&self, dir: &Path) -> Result<bool> {
        let commit = &self.settings.commit;
        self.vcs
            .add(dir, &commit.pattern)
            .map_err(PipelineError::Stage)?;
        self.vcs
            .commit_if_changed(dir, &commit.message)
            .map_err(PipelineError::Commit)
    }
}

impl Default for BootstrapPipeline {
    fn default() -> Self {
        Self::with_settings(Settings::default(), None)
    }
}

impl BootstrapPipeline {
    /// Construct pipeline over libgit2 with the given settings.
    pub fn with_settings(settings: Settings, push_url: Option<String>) -> Self {
        Self::new(
            Git2Vcs::new(&settings.commit),
            RequirementsVerifier::new(),
            Git2Publisher::new(push_url),
            settings,
        )
    }
}

fn enter(stage: Stage) {
    debug!("enter stage: {stage}");
}

/// Bootstrap error types.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Working directory cannot be resolved.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// Existing requirements cannot be loaded.
    #[error("failed to override requirements in dir {:?}", dir.display())]
    Load {
        #[source]
        source: StoreError,
        dir: PathBuf,
    },

    /// Merged requirements hold an invalid value.
    #[error(transparent)]
    InvalidOption(#[from] InvalidOptionError),

    /// Requirements cannot be saved.
    #[error(transparent)]
    Save(StoreError),

    /// Pre-install verification failed.
    #[error("failed to verify requirements in dir {:?}", dir.display())]
    Verify {
        #[source]
        source: VerifyError,
        dir: PathBuf,
    },

    /// Files cannot be staged.
    #[error(transparent)]
    Stage(VcsError),

    /// Staged files cannot be committed.
    #[error(transparent)]
    Commit(VcsError),

    /// Dev environment cannot be published.
    #[error(transparent)]
    Publish(#[from] PublishError),
}

/// Friendly result alias :3
pub type Result<T, E = PipelineError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::REQUIREMENTS_FILE_NAME;
    use pretty_assertions::assert_eq;
    use std::{cell::RefCell, fs::write};
    use tempfile::TempDir;

    /// Records every collaborator call so stage order can be checked.
    #[derive(Debug, Default)]
    struct Journal(RefCell<Vec<String>>);

    impl Journal {
        fn push(&self, entry: impl Into<String>) {
            self.0.borrow_mut().push(entry.into());
        }

        fn entries(&self) -> Vec<String> {
            self.0.borrow().clone()
        }
    }

    #[derive(Debug)]
    struct FakeVcs<'a> {
        journal: &'a Journal,
        fail_commit: bool,
    }

    impl VersionControl for FakeVcs<'_> {
        fn clone_repo(&self, url: &str, dir: &Path) -> crate::vcs::Result<()> {
            self.journal.push(format!("clone {url}"));
            std::fs::create_dir_all(dir).map_err(|_| VcsError::Clone {
                source: git2::Error::from_str("cannot create dir"),
                url: url.into(),
                dir: dir.into(),
            })
        }

        fn is_repository(&self, _dir: &Path) -> bool {
            true
        }

        fn add(&self, _dir: &Path, pattern: &str) -> crate::vcs::Result<()> {
            self.journal.push(format!("add {pattern}"));
            Ok(())
        }

        fn commit_if_changed(&self, dir: &Path, message: &str) -> crate::vcs::Result<bool> {
            self.journal.push(format!("commit {message}"));
            if self.fail_commit {
                return Err(VcsError::Commit {
                    source: git2::Error::from_str("index locked"),
                    dir: dir.into(),
                });
            }
            Ok(true)
        }
    }

    #[derive(Debug)]
    struct FakeVerifier<'a> {
        journal: &'a Journal,
        pass: bool,
    }

    impl PreInstallVerifier for FakeVerifier<'_> {
        fn verify(&self, dir: &Path) -> crate::verify::Result<()> {
            self.journal.push("verify");
            if self.pass {
                Ok(())
            } else {
                Err(VerifyError::MissingRequirements {
                    path: dir.join(REQUIREMENTS_FILE_NAME),
                })
            }
        }
    }

    #[derive(Debug)]
    struct FakePublisher<'a> {
        journal: &'a Journal,
    }

    impl EnvironmentPublisher for FakePublisher<'_> {
        fn create_dev_env_git_repository(&self, _dir: &Path) -> crate::publish::Result<()> {
            self.journal.push("publish");
            Ok(())
        }
    }

    type FakePipeline<'a> = BootstrapPipeline<FakeVcs<'a>, FakeVerifier<'a>, FakePublisher<'a>>;

    fn pipeline(journal: &Journal, pass: bool, fail_commit: bool) -> FakePipeline<'_> {
        BootstrapPipeline::new(
            FakeVcs { journal, fail_commit },
            FakeVerifier { journal, pass },
            FakePublisher { journal },
            Settings::default(),
        )
    }

    fn request(dir: &Path, overrides: RequirementOverrides) -> BootstrapRequest {
        BootstrapRequest {
            source: SourceRequest {
                dir: Some(dir.into()),
                ..Default::default()
            },
            overrides,
        }
    }

    #[test]
    fn stages_run_in_order() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let journal = Journal::default();

        let report = pipeline(&journal, true, false).run(&request(dir.path(), Default::default()))?;

        assert_eq!(
            journal.entries(),
            vec!["verify", "add *", "commit fix: initial code", "publish"]
        );
        assert_eq!(report.dir, dir.path());
        assert_eq!(report.requirements_path, dir.path().join(REQUIREMENTS_FILE_NAME));
        assert!(report.committed);

        Ok(())
    }

    #[test]
    fn flags_beat_persisted_requirements() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        write(
            dir.path().join(REQUIREMENTS_FILE_NAME),
            "cluster:\n  clusterName: persisted\n  provider: gke\ningress:\n  domain: old.example.com\n",
        )?;
        let journal = Journal::default();
        let overrides = RequirementOverrides {
            domain: Some("example.com".into()),
            ..Default::default()
        };

        let report = pipeline(&journal, true, false).run(&request(dir.path(), overrides))?;

        let (saved, _) = RequirementsStore::new(dir.path()).load()?;
        assert_eq!(saved, report.requirements);
        assert_eq!(saved.ingress.domain, "example.com");
        assert_eq!(saved.cluster.cluster_name, "persisted");
        assert_eq!(saved.cluster.provider, "gke");

        Ok(())
    }

    #[test]
    fn invalid_git_kind_saves_nothing() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let journal = Journal::default();
        let overrides = RequirementOverrides {
            git_kind: Some("not-a-real-kind".into()),
            ..Default::default()
        };

        let result = pipeline(&journal, true, false).run(&request(dir.path(), overrides));

        assert!(matches!(result, Err(PipelineError::InvalidOption(_))));
        assert!(!dir.path().join(REQUIREMENTS_FILE_NAME).exists());
        assert!(journal.entries().is_empty());

        Ok(())
    }

    #[test]
    fn failed_verification_halts_before_commit() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let journal = Journal::default();

        let result = pipeline(&journal, false, false).run(&request(dir.path(), Default::default()));

        assert!(matches!(result, Err(PipelineError::Verify { .. })));
        assert_eq!(journal.entries(), vec!["verify"]);
        // INVARIANT: Saved requirements are not rolled back.
        assert!(dir.path().join(REQUIREMENTS_FILE_NAME).is_file());

        Ok(())
    }

    #[test]
    fn failed_commit_halts_before_publish() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let journal = Journal::default();

        let result = pipeline(&journal, true, true).run(&request(dir.path(), Default::default()));

        assert!(matches!(result, Err(PipelineError::Commit(_))));
        assert_eq!(
            journal.entries(),
            vec!["verify", "add *", "commit fix: initial code"]
        );

        Ok(())
    }

    #[test]
    fn temp_dir_gets_default_source_cloned() -> anyhow::Result<()> {
        let journal = Journal::default();

        let report = pipeline(&journal, true, false).run(&BootstrapRequest::default())?;

        assert_eq!(
            journal.entries().first().map(String::as_str),
            Some("clone https://github.com/jenkins-x-labs/boot-helmfile-config.git")
        );
        assert!(report.requirements_path.starts_with(&report.dir));
        std::fs::remove_dir_all(&report.dir)?;

        Ok(())
    }
}
