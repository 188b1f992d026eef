// Artifact store trait for raw benchmark outputs
use crate::domain::build::{BuildId, BuildInfo};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A local copy of the whole dataset, laid out as `{project_id}/{build_id}/...`.
///
/// When the snapshot owns a temporary directory it is removed on drop.
#[derive(Debug)]
pub struct DatasetSnapshot {
    root: PathBuf,
    _dir: Option<TempDir>,
}

impl DatasetSnapshot {
    pub fn temporary(dir: TempDir) -> Self {
        Self {
            root: dir.path().to_path_buf(),
            _dir: Some(dir),
        }
    }

    #[cfg(test)]
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            _dir: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Write the build manifest into `folder` and replace everything stored
    /// under `{project_id}/{build_id}` with the folder's contents.
    async fn upload(
        &self,
        folder: &Path,
        project_id: &str,
        build_id: BuildId,
        info: &BuildInfo,
    ) -> anyhow::Result<()>;

    async fn download(&self) -> anyhow::Result<DatasetSnapshot>;
}
