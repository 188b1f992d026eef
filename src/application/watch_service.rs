// Repository watcher - Benchmarks and publishes recent commits of a repository
use crate::application::artifact_store::ArtifactStore;
use crate::application::command_runner::{CommandRunner, CommandSpec};
use crate::application::commit_source::CommitSource;
use crate::application::dashboard_api::DashboardApi;
use crate::application::publish_service::PublishService;
use crate::domain::commit::WatchedCommit;
use crate::domain::series::AnalysisPolicy;
use anyhow::Context;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const DEFAULT_BRANCH: &str = "main";
pub const DEFAULT_NUM_COMMITS: usize = 10;
pub const DEFAULT_BASE_CONFIG: &str = "_base_";
pub const DEFAULT_RUNNER: &str = "optimum-benchmark";

#[derive(Debug, Clone)]
pub struct WatchOptions {
    pub project_id: String,
    pub repo_url: String,
    pub checkout_dir: PathBuf,
    pub branch: String,
    pub num_commits: usize,
    pub benchmarks_dir: PathBuf,
    pub experiments_dir: PathBuf,
    /// Config stem that only serves as a base for the others and is never run.
    pub base_config: String,
    pub install: CommandSpec,
    pub runner: String,
    pub policy: AnalysisPolicy,
}

impl WatchOptions {
    pub fn new(project_id: impl Into<String>, repo_url: impl Into<String>, checkout_dir: impl Into<PathBuf>) -> Self {
        let checkout_dir = checkout_dir.into();
        let install = CommandSpec::new("pip")
            .args(["install", "-e"])
            .arg(checkout_dir.to_string_lossy());
        Self {
            project_id: project_id.into(),
            repo_url: repo_url.into(),
            checkout_dir,
            branch: DEFAULT_BRANCH.to_string(),
            num_commits: DEFAULT_NUM_COMMITS,
            benchmarks_dir: PathBuf::from("benchmarks"),
            experiments_dir: PathBuf::from("experiments"),
            base_config: DEFAULT_BASE_CONFIG.to_string(),
            install,
            runner: DEFAULT_RUNNER.to_string(),
            policy: AnalysisPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatchReport {
    pub processed: usize,
    pub skipped: usize,
}

/// Benchmark output of one commit.
///
/// The directory is only removed through [`ExperimentsDir::finalize`]; if the
/// guard is dropped first the output stays on disk for inspection.
pub struct ExperimentsDir {
    path: PathBuf,
    finalized: bool,
}

impl ExperimentsDir {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            finalized: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn finalize(mut self) -> anyhow::Result<()> {
        self.finalized = true;
        tokio::fs::remove_dir_all(&self.path)
            .await
            .with_context(|| format!("Failed to remove {}", self.path.display()))
    }
}

impl Drop for ExperimentsDir {
    fn drop(&mut self) {
        if !self.finalized {
            tracing::warn!(path = %self.path.display(), "Keeping benchmark output after failure");
        }
    }
}

pub struct RepositoryWatcher {
    api: Arc<dyn DashboardApi>,
    store: Arc<dyn ArtifactStore>,
    commits: Arc<dyn CommitSource>,
    runner: Arc<dyn CommandRunner>,
    publisher: PublishService,
}

impl RepositoryWatcher {
    pub fn new(
        api: Arc<dyn DashboardApi>,
        store: Arc<dyn ArtifactStore>,
        commits: Arc<dyn CommitSource>,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        let publisher = PublishService::new(api.clone());
        Self {
            api,
            store,
            commits,
            runner,
            publisher,
        }
    }

    pub async fn run(&self, options: &WatchOptions) -> anyhow::Result<WatchReport> {
        let commits = self.commits.recent_commits(&options.branch, options.num_commits)?;
        tracing::info!(branch = %options.branch, count = commits.len(), "Watching commits");

        let mut report = WatchReport::default();
        for commit in &commits {
            let build_id = commit.build_id();
            if self.build_published(&options.project_id, commit).await? {
                tracing::info!(build_id, hash = %commit.abbrev_hash(), "Build already exists, skipping");
                report.skipped += 1;
                continue;
            }

            self.process_commit(commit, options)
                .await
                .with_context(|| format!("Failed to process commit {} (build {})", commit.hash, build_id))?;
            report.processed += 1;
        }

        Ok(report)
    }

    async fn build_published(&self, project_id: &str, commit: &WatchedCommit) -> anyhow::Result<bool> {
        if !self.api.project_exists(project_id).await? {
            return Ok(false);
        }
        self.api.build_exists(project_id, commit.build_id()).await
    }

    async fn process_commit(&self, commit: &WatchedCommit, options: &WatchOptions) -> anyhow::Result<()> {
        let build_id = commit.build_id();
        tracing::info!(
            build_id,
            hash = %commit.abbrev_hash(),
            authored_at = %commit.authored_at.to_rfc3339(),
            "Benchmarking commit"
        );
        ensure_no_leftover_output(&options.experiments_dir)?;

        let checkout = CommandSpec::new("git")
            .args(["checkout", commit.hash.as_str()])
            .current_dir(&options.checkout_dir);
        self.runner.run(&checkout).await?;
        self.runner.run(&options.install).await?;

        for config_name in benchmark_configs(&options.benchmarks_dir, &options.base_config)? {
            tracing::info!(config = %config_name, "Running benchmarks");
            let command = CommandSpec::new(&options.runner)
                .arg("--config-dir")
                .arg(options.benchmarks_dir.to_string_lossy())
                .arg("--config-name")
                .arg(config_name)
                .arg("--multirun");
            self.runner.run(&command).await?;
        }

        let experiments = ExperimentsDir::new(&options.experiments_dir);
        let info = commit.build_info(&options.repo_url);

        self.store
            .upload(experiments.path(), &options.project_id, build_id, &info)
            .await?;
        self.publisher
            .publish(experiments.path(), &options.project_id, build_id, &info, &options.policy)
            .await?;

        experiments.finalize().await
    }
}

/// Output kept from a failed run must not be published under another build.
fn ensure_no_leftover_output(dir: &Path) -> anyhow::Result<()> {
    if !dir.exists() {
        return Ok(());
    }
    let mut entries = std::fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))?;
    if entries.next().is_some() {
        anyhow::bail!(
            "{} still holds benchmark output from an earlier run; inspect and remove it before watching again",
            dir.display()
        );
    }
    Ok(())
}

/// Config stems in `dir`, sorted, without the base config.
fn benchmark_configs(dir: &Path, base_config: &str) -> anyhow::Result<Vec<String>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to list benchmark configs in {}", dir.display()))?;

    let mut names = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            if stem != base_config {
                names.push(stem.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}
