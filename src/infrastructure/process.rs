// External process runner
use crate::application::command_runner::{CommandError, CommandRunner, CommandSpec};
use async_trait::async_trait;
use tokio::process::Command;

/// Runs commands as child processes, inheriting stdout/stderr.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, spec: &CommandSpec) -> anyhow::Result<()> {
        tracing::info!(command = %spec, "Running");

        let mut command = Command::new(&spec.program);
        command.args(&spec.args);
        if let Some(dir) = &spec.cwd {
            command.current_dir(dir);
        }

        let status = command.status().await.map_err(|source| CommandError::Spawn {
            command: spec.to_string(),
            source,
        })?;

        if !status.success() {
            return Err(CommandError::NonZeroExit {
                command: spec.to_string(),
                status: status.to_string(),
            }
            .into());
        }
        Ok(())
    }
}
