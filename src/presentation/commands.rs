// CLI command handlers - Wire settings, adapters and services together
use crate::application::artifact_store::ArtifactStore;
use crate::application::command_runner::CommandSpec;
use crate::application::dashboard_api::DashboardApi;
use crate::application::publish_service::PublishService;
use crate::application::watch_service::{RepositoryWatcher, WatchOptions};
use crate::domain::build::BuildInfo;
use crate::domain::series::AnalysisPolicy;
use crate::infrastructure::config::Settings;
use crate::infrastructure::dana_client::DanaClient;
use crate::infrastructure::git_repository::GitRepository;
use crate::infrastructure::hub_store::HubDatasetStore;
use crate::infrastructure::process::ProcessRunner;
use crate::infrastructure::transport::login;
use crate::presentation::cli::{
    BuildExistsArgs, PublishBackupArgs, PublishBuildArgs, UpdateProjectArgs, UploadBuildArgs,
};
use anyhow::Context;
use std::sync::Arc;

fn dashboard_url(arg: Option<String>, settings: &Settings) -> anyhow::Result<String> {
    arg.or_else(|| settings.dana.url.clone())
        .context("No dashboard URL: pass --url or set dana.url in the settings file")
}

async fn connect(url: &str, settings: &Settings) -> anyhow::Result<DanaClient> {
    let session = login(
        url,
        settings.dana.api_token()?,
        &settings.dana.username,
        &settings.dana.password,
    )
    .await?;
    Ok(DanaClient::new(session))
}

fn hub_store(dataset_id: Option<String>, settings: &Settings) -> anyhow::Result<HubDatasetStore> {
    let dataset_id = dataset_id
        .or_else(|| settings.hub.dataset_id.clone())
        .context("No dataset: pass --dataset-id or set hub.dataset_id in the settings file")?;
    Ok(HubDatasetStore::new(
        &settings.hub.endpoint,
        &dataset_id,
        &settings.hub.revision,
        settings.hub.token()?,
    ))
}

pub async fn upload_build(args: UploadBuildArgs, settings: &Settings) -> anyhow::Result<()> {
    let store = hub_store(args.dataset_id, settings)?;
    let info = BuildInfo::from(args.info);
    store
        .upload(&args.folder, &args.project_id, args.build_id, &info)
        .await
}

pub async fn publish_build(args: PublishBuildArgs, settings: &Settings) -> anyhow::Result<()> {
    let url = dashboard_url(args.url, settings)?;
    let client = connect(&url, settings).await?;
    let policy = AnalysisPolicy {
        range: args.average_range,
        required: args.average_min_count,
        ..AnalysisPolicy::default()
    };

    PublishService::new(Arc::new(client))
        .publish(&args.folder, &args.project_id, args.build_id, &BuildInfo::from(args.info), &policy)
        .await?;
    Ok(())
}

pub async fn publish_backup(args: PublishBackupArgs, settings: &Settings) -> anyhow::Result<()> {
    let url = dashboard_url(args.url, settings)?;
    let store = hub_store(args.dataset_id, settings)?;
    let client = connect(&url, settings).await?;

    let published = PublishService::new(Arc::new(client))
        .publish_backup(&store, &settings.policy.to_policy())
        .await?;
    tracing::info!(published, "Backup published");
    Ok(())
}

pub async fn build_exists(args: BuildExistsArgs, settings: &Settings) -> anyhow::Result<bool> {
    let url = dashboard_url(args.url, settings)?;
    let client = connect(&url, settings).await?;

    let exists = client.project_exists(&args.project_id).await?
        && client.build_exists(&args.project_id, args.build_id).await?;
    tracing::info!(project_id = %args.project_id, build_id = args.build_id, exists, "Checked build");
    Ok(exists)
}

pub async fn update_project(args: UpdateProjectArgs, settings: &Settings) -> anyhow::Result<()> {
    let url = dashboard_url(args.url, settings)?;
    let store = hub_store(args.dataset_id, settings)?;
    let client = connect(&url, settings).await?;
    let repository = GitRepository::clone_or_open(&args.watch_repo, &args.checkout_dir)?;

    let mut options = WatchOptions::new(&args.project_id, &args.watch_repo, &args.checkout_dir);
    options.branch = args.branch;
    options.num_commits = args.num_commits;
    options.benchmarks_dir = args.benchmarks_dir;
    options.experiments_dir = args.experiments_dir;
    options.policy = settings.policy.to_policy();
    if let Some(line) = args.install_command.as_deref() {
        options.install = CommandSpec::parse(line).context("--install-command is empty or has unbalanced quotes")?;
    }

    let watcher = RepositoryWatcher::new(
        Arc::new(client),
        Arc::new(store),
        Arc::new(repository),
        Arc::new(ProcessRunner),
    );
    let report = watcher.run(&options).await?;
    tracing::info!(processed = report.processed, skipped = report.skipped, "Repository watch finished");
    Ok(())
}
