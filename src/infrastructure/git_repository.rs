// Git repository access for the watcher
use crate::application::commit_source::CommitSource;
use crate::domain::commit::WatchedCommit;
use anyhow::Context;
use chrono::{DateTime, Utc};
use git2::build::RepoBuilder;
use git2::{BranchType, Oid, Repository, Sort};
use std::path::PathBuf;

/// A local clone of the watched repository.
#[derive(Debug, Clone)]
pub struct GitRepository {
    path: PathBuf,
}

impl GitRepository {
    pub fn open(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        Repository::open(&path).with_context(|| format!("Failed to open repository at {}", path.display()))?;
        Ok(Self { path })
    }

    /// Clone `url` into `path`, or reuse the clone already there.
    pub fn clone_or_open(url: &str, path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        if path.exists() {
            tracing::info!(path = %path.display(), "Reusing existing checkout");
            let repository = Self::open(path)?;
            repository.fetch_origin()?;
            return Ok(repository);
        }

        tracing::info!(url, path = %path.display(), "Cloning repository");
        RepoBuilder::new()
            .clone(url, &path)
            .with_context(|| format!("Failed to clone {}", url))?;
        Ok(Self { path })
    }

    #[cfg(test)]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Update the remote-tracking branches with the configured refspecs.
    fn fetch_origin(&self) -> anyhow::Result<()> {
        let repo = Repository::open(&self.path)?;
        let mut remote = repo
            .find_remote("origin")
            .with_context(|| format!("No origin remote in {}", self.path.display()))?;
        remote
            .fetch(&[] as &[&str], None, None)
            .with_context(|| format!("Failed to fetch origin into {}", self.path.display()))?;
        tracing::debug!(path = %self.path.display(), "Fetched origin");
        Ok(())
    }

    /// The remote-tracking branch wins over a local one, which goes stale
    /// between fetches.
    fn branch_tip(repo: &Repository, branch: &str) -> anyhow::Result<Oid> {
        let reference = repo
            .find_branch(&format!("origin/{}", branch), BranchType::Remote)
            .or_else(|_| repo.find_branch(branch, BranchType::Local))
            .with_context(|| format!("Branch {} not found", branch))?;
        reference
            .get()
            .target()
            .with_context(|| format!("Branch {} has no target", branch))
    }

    /// Number of commits reachable from `oid`, itself included.
    fn ordinal(repo: &Repository, oid: Oid) -> anyhow::Result<u64> {
        let mut walk = repo.revwalk()?;
        walk.push(oid)?;
        let mut count = 0;
        for commit in walk {
            commit?;
            count += 1;
        }
        Ok(count)
    }
}

impl CommitSource for GitRepository {
    fn recent_commits(&self, branch: &str, max_count: usize) -> anyhow::Result<Vec<WatchedCommit>> {
        let repo = Repository::open(&self.path)?;
        let tip = Self::branch_tip(&repo, branch)?;

        let mut walk = repo.revwalk()?;
        walk.set_sorting(Sort::TIME)?;
        walk.push(tip)?;

        let mut commits = Vec::new();
        for oid in walk.take(max_count) {
            let oid = oid?;
            let commit = repo.find_commit(oid)?;
            let author = commit.author();

            commits.push(WatchedCommit {
                hash: oid.to_string(),
                author_name: author.name().unwrap_or_default().to_string(),
                author_email: author.email().unwrap_or_default().to_string(),
                message: commit.message().unwrap_or_default().to_string(),
                authored_at: DateTime::<Utc>::from_timestamp(author.when().seconds(), 0).unwrap_or_default(),
                ordinal: Self::ordinal(&repo, oid)?,
            });
        }

        tracing::debug!(branch, count = commits.len(), "Collected recent commits");
        Ok(commits)
    }
}
