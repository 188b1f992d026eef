// Project and build domain models
use serde::{Deserialize, Serialize};

/// Project-scoped build identifier (the commit ordinal for watched repositories).
pub type BuildId = u64;

/// Probe id used to check a project without referring to a real build.
pub const PROJECT_PROBE_BUILD_ID: BuildId = 0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub id: String,
    pub users: String,
    pub description: String,
}

impl Project {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            users: String::new(),
            description: String::new(),
        }
    }
}

/// Source metadata attached to a build.
///
/// The serde names are the keys of the `build_info.json` manifest stored next
/// to uploaded artifacts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildInfo {
    #[serde(rename = "build_url", default)]
    pub url: String,
    #[serde(rename = "build_hash", default)]
    pub hash: String,
    #[serde(rename = "build_subject", default)]
    pub subject: String,
    #[serde(rename = "build_abbrev_hash", default)]
    pub abbrev_hash: String,
    #[serde(rename = "build_author_name", default)]
    pub author_name: String,
    #[serde(rename = "build_author_email", default)]
    pub author_email: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Build {
    pub project_id: String,
    pub id: BuildId,
    pub info: BuildInfo,
}

impl Build {
    pub fn new(project_id: impl Into<String>, id: BuildId, info: BuildInfo) -> Self {
        Self {
            project_id: project_id.into(),
            id,
            info,
        }
    }
}
