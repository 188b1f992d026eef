// Command line definition
use crate::application::watch_service::{DEFAULT_BRANCH, DEFAULT_NUM_COMMITS};
use crate::domain::build::{BuildId, BuildInfo};
use crate::domain::series::{DEFAULT_RANGE, DEFAULT_REQUIRED};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "dana-client", version, about = "Publish benchmark results to a DANA dashboard")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Settings file (any format the `config` crate reads).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set.
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Upload a build folder to the artifact dataset.
    UploadBuild(UploadBuildArgs),

    /// Publish a build folder to the dashboard.
    PublishBuild(PublishBuildArgs),

    /// Re-publish every build kept in the artifact dataset.
    PublishBackup(PublishBackupArgs),

    /// Exit with 0 when the build exists on the dashboard, 1 otherwise.
    BuildExists(BuildExistsArgs),

    /// Benchmark and publish the recent commits of a repository.
    UpdateProject(UpdateProjectArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct BuildInfoArgs {
    #[arg(long, default_value = "")]
    pub build_url: String,
    #[arg(long, default_value = "")]
    pub build_hash: String,
    #[arg(long, default_value = "")]
    pub build_subject: String,
    #[arg(long, default_value = "")]
    pub build_abbrev_hash: String,
    #[arg(long, default_value = "")]
    pub build_author_name: String,
    #[arg(long, default_value = "")]
    pub build_author_email: String,
}

impl From<BuildInfoArgs> for BuildInfo {
    fn from(args: BuildInfoArgs) -> Self {
        Self {
            url: args.build_url,
            hash: args.build_hash,
            subject: args.build_subject,
            abbrev_hash: args.build_abbrev_hash,
            author_name: args.build_author_name,
            author_email: args.build_author_email,
        }
    }
}

#[derive(Args, Debug)]
pub struct UploadBuildArgs {
    #[arg(long)]
    pub folder: PathBuf,
    #[arg(long)]
    pub dataset_id: Option<String>,
    #[arg(long)]
    pub project_id: String,
    #[arg(long)]
    pub build_id: BuildId,
    #[command(flatten)]
    pub info: BuildInfoArgs,
}

#[derive(Args, Debug)]
pub struct PublishBuildArgs {
    #[arg(long)]
    pub folder: PathBuf,
    #[arg(long)]
    pub url: Option<String>,
    #[arg(long)]
    pub project_id: String,
    #[arg(long)]
    pub build_id: BuildId,
    #[command(flatten)]
    pub info: BuildInfoArgs,
    /// Tolerance range of the series, e.g. "5%".
    #[arg(long, default_value = DEFAULT_RANGE)]
    pub average_range: String,
    /// Samples required before the dashboard analyses a series.
    #[arg(long, default_value_t = DEFAULT_REQUIRED)]
    pub average_min_count: u32,
}

#[derive(Args, Debug)]
pub struct PublishBackupArgs {
    #[arg(long)]
    pub url: Option<String>,
    #[arg(long)]
    pub dataset_id: Option<String>,
}

#[derive(Args, Debug)]
pub struct BuildExistsArgs {
    #[arg(long)]
    pub url: Option<String>,
    #[arg(long)]
    pub project_id: String,
    #[arg(long)]
    pub build_id: BuildId,
}

#[derive(Args, Debug)]
pub struct UpdateProjectArgs {
    #[arg(long)]
    pub url: Option<String>,
    #[arg(long)]
    pub dataset_id: Option<String>,
    #[arg(long)]
    pub project_id: String,
    /// URL of the repository to watch; also used to build commit links.
    #[arg(long)]
    pub watch_repo: String,
    #[arg(long, default_value_t = DEFAULT_NUM_COMMITS)]
    pub num_commits: usize,
    #[arg(long, default_value = DEFAULT_BRANCH)]
    pub branch: String,
    #[arg(long, default_value = "watch_repo")]
    pub checkout_dir: PathBuf,
    #[arg(long, default_value = "benchmarks")]
    pub benchmarks_dir: PathBuf,
    #[arg(long, default_value = "experiments")]
    pub experiments_dir: PathBuf,
    /// Command installing the checked out revision; defaults to `pip install -e <checkout-dir>`.
    #[arg(long)]
    pub install_command: Option<String>,
}
