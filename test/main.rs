// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT


use anyhow::Result;
use git2::{IndexEntry, IndexTime, Repository, RepositoryInitOptions};
use std::path::Path;

/// Source repository that bootstrap runs clone from.
pub(crate) struct SourceFixture {
    repo: Repository,
}

impl SourceFixture {
    pub(crate) fn new(path: impl AsRef<Path>) -> Result<Self> {
        let mut opts = RepositoryInitOptions::new();
        opts.initial_head("main");
        let repo = Repository::init_opts(path.as_ref(), &opts)?;

        // INVARIANT: Always provide valid name and email.
        //   - Git will complain if this is not set in CI/CD environments.
        let mut config = repo.config()?;
        config.set_str("user.name", "John Doe")?;
        config.set_str("user.email", "john@doe.com")?;

        Ok(Self { repo })
    }

    pub(crate) fn url(&self) -> String {
        self.repo
            .workdir()
            .unwrap_or_else(|| self.repo.path())
            .to_string_lossy()
            .into_owned()
    }

    pub(crate) fn stage_and_commit(
        &self,
        filename: impl AsRef<Path>,
        contents: impl AsRef<str>,
    ) -> Result<()> {
        let entry = IndexEntry {
            ctime: IndexTime::new(0, 0),
            mtime: IndexTime::new(0, 0),
            dev: 0,
            ino: 0,
            mode: 0o100644,
            uid: 0,
            gid: 0,
            file_size: contents.as_ref().len() as u32,
            id: self.repo.blob(contents.as_ref().as_bytes())?,
            flags: 0,
            flags_extended: 0,
            path: filename.as_ref().to_string_lossy().as_bytes().to_vec(),
        };

        // INVARIANT: Always use new tree produced by index after staging new entry.
        let mut index = self.repo.index()?;
        index.add_frombuffer(&entry, contents.as_ref().as_bytes())?;
        index.write()?;
        let tree_oid = index.write_tree()?;
        let tree = self.repo.find_tree(tree_oid)?;

        let signature = self.repo.signature()?;
        let mut parents = Vec::new();
        if let Some(parent) = self.repo.head().ok().and_then(|head| head.target()) {
            parents.push(self.repo.find_commit(parent)?);
        }
        let parents = parents.iter().collect::<Vec<_>>();

        self.repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            format!("chore: add {:?}", filename.as_ref()).as_ref(),
            &tree,
            &parents,
        )?;

        Ok(())
    }
}

/// Count commits reachable from HEAD of repository at `path`.
pub(crate) fn commit_count(path: impl AsRef<Path>) -> Result<usize> {
    let repo = Repository::open(path.as_ref())?;
    let mut walk = repo.revwalk()?;
    walk.push_head()?;
    Ok(walk.count())
}

/// Message of the commit HEAD points at in repository at `path`.
pub(crate) fn head_message(path: impl AsRef<Path>) -> Result<String> {
    let repo = Repository::open(path.as_ref())?;
    let commit = repo.head()?.peel_to_commit()?;
    Ok(commit.message().unwrap_or_default().to_owned())
}
