// Watched commit domain model
use chrono::{DateTime, Utc};

use super::build::{BuildId, BuildInfo};

const ABBREV_LEN: usize = 7;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchedCommit {
    pub hash: String,
    pub author_name: String,
    pub author_email: String,
    pub message: String,
    pub authored_at: DateTime<Utc>,
    /// Number of commits reachable from this one, itself included.
    pub ordinal: u64,
}

impl WatchedCommit {
    pub fn abbrev_hash(&self) -> &str {
        let end = self.hash.len().min(ABBREV_LEN);
        &self.hash[..end]
    }

    pub fn build_id(&self) -> BuildId {
        self.ordinal
    }

    pub fn build_info(&self, repo_url: &str) -> BuildInfo {
        BuildInfo {
            url: format!("{}/commit/{}", repo_url.trim_end_matches('/'), self.hash),
            hash: self.hash.clone(),
            subject: self.message.clone(),
            abbrev_hash: self.abbrev_hash().to_string(),
            author_name: self.author_name.clone(),
            author_email: self.author_email.clone(),
        }
    }
}
