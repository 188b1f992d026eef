// External process trait used by the repository watcher
use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    /// Split a command line with shell quoting rules into program and
    /// arguments. `None` when it is empty or its quotes are unbalanced.
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = shlex::split(line)?.into_iter();
        let program = parts.next()?;
        Some(Self::new(program).args(parts))
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{command}` exited with {status}")]
    NonZeroExit { command: String, status: String },
}

/// Runs a command to completion; any non-zero exit is an error.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, command: &CommandSpec) -> anyhow::Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command_line() {
        let spec = CommandSpec::parse("pip install -e watch_repo").unwrap();
        assert_eq!(spec.program, "pip");
        assert_eq!(spec.args, vec!["install", "-e", "watch_repo"]);
        assert_eq!(spec.to_string(), "pip install -e watch_repo");

        assert!(CommandSpec::parse("   ").is_none());
    }

    #[test]
    fn test_parse_quoted_arguments() {
        let spec = CommandSpec::parse(r#"pip install -e "my repo" --config-settings 'editable_mode=strict'"#).unwrap();
        assert_eq!(
            spec.args,
            vec!["install", "-e", "my repo", "--config-settings", "editable_mode=strict"]
        );

        assert!(CommandSpec::parse(r#"pip install "unterminated"#).is_none());
    }
}
