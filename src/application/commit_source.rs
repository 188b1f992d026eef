// Commit history trait for the repository watcher
use crate::domain::commit::WatchedCommit;

pub trait CommitSource: Send + Sync {
    /// The `max_count` most recent commits of `branch`, newest first.
    fn recent_commits(&self, branch: &str, max_count: usize) -> anyhow::Result<Vec<WatchedCommit>>;
}
