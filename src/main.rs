// Main entry point - Dependency injection and command dispatch
mod application;
mod domain;
mod infrastructure;
mod presentation;
#[cfg(test)]
mod testing;

use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use crate::infrastructure::config::load_settings;
use crate::presentation::cli::{Cli, Commands};
use crate::presentation::commands;

async fn dispatch(cli: Cli) -> anyhow::Result<ExitCode> {
    // Load configuration
    let settings = load_settings(cli.config.as_deref(), |key| std::env::var(key).ok())?;

    match cli.command {
        Commands::UploadBuild(args) => commands::upload_build(args, &settings).await?,
        Commands::PublishBuild(args) => commands::publish_build(args, &settings).await?,
        Commands::PublishBackup(args) => commands::publish_backup(args, &settings).await?,
        Commands::BuildExists(args) => {
            if !commands::build_exists(args, &settings).await? {
                return Ok(ExitCode::from(1));
            }
        }
        Commands::UpdateProject(args) => commands::update_project(args, &settings).await?,
    }
    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match dispatch(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {:?}", e);
            ExitCode::FAILURE
        }
    }
}
