// Hugging Face Hub dataset store for raw benchmark artifacts
use crate::application::artifact_store::{ArtifactStore, DatasetSnapshot};
use crate::domain::build::{BuildId, BuildInfo};
use crate::infrastructure::benchmark_folder;
use anyhow::Context;
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::{CONTENT_TYPE, HeaderMap, LINK};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};
use tempfile::TempDir;
use walkdir::WalkDir;

pub const DEFAULT_ENDPOINT: &str = "https://huggingface.co";
pub const DEFAULT_REVISION: &str = "main";

#[derive(Debug, thiserror::Error)]
pub enum HubError {
    #[error("Hub request to {url} failed with code {status}: {body}")]
    Status { url: String, status: u16, body: String },
    #[error("Refusing to write dataset file outside the snapshot: {path}")]
    UnsafePath { path: String },
}

#[derive(Debug, Deserialize)]
struct TreeEntry {
    #[serde(rename = "type")]
    kind: String,
    path: String,
}

/// A dataset repository on the Hub, laid out as `{project_id}/{build_id}/...`.
#[derive(Debug, Clone)]
pub struct HubDatasetStore {
    client: Client,
    endpoint: String,
    dataset_id: String,
    revision: String,
    token: String,
}

impl HubDatasetStore {
    pub fn new(endpoint: &str, dataset_id: &str, revision: &str, token: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            dataset_id: dataset_id.to_string(),
            revision: revision.to_string(),
            token: token.to_string(),
        }
    }

    fn tree_url(&self, prefix: Option<&str>) -> String {
        let mut url = format!(
            "{}/api/datasets/{}/tree/{}",
            self.endpoint,
            self.dataset_id,
            urlencoding::encode(&self.revision)
        );
        if let Some(prefix) = prefix {
            url.push('/');
            url.push_str(&encode_path(prefix));
        }
        url.push_str("?recursive=true");
        url
    }

    fn commit_url(&self) -> String {
        format!(
            "{}/api/datasets/{}/commit/{}",
            self.endpoint,
            self.dataset_id,
            urlencoding::encode(&self.revision)
        )
    }

    fn resolve_url(&self, path: &str) -> String {
        format!(
            "{}/datasets/{}/resolve/{}/{}",
            self.endpoint,
            self.dataset_id,
            urlencoding::encode(&self.revision),
            encode_path(path)
        )
    }

    /// Paths of every file under `prefix` (the whole dataset when `None`).
    async fn list_files(&self, prefix: Option<&str>) -> anyhow::Result<Vec<String>> {
        let mut files = Vec::new();
        let mut next = Some(self.tree_url(prefix));

        while let Some(url) = next.take() {
            let response = self
                .client
                .get(&url)
                .bearer_auth(&self.token)
                .send()
                .await
                .with_context(|| format!("Failed to list {}", url))?;

            if response.status() == StatusCode::NOT_FOUND && prefix.is_some() {
                return Ok(files);
            }
            let response = check_status(&url, response).await?;
            next = next_link(response.headers());

            let entries = response
                .json::<Vec<TreeEntry>>()
                .await
                .context("Failed to parse Hub tree listing")?;
            files.extend(entries.into_iter().filter(|e| e.kind == "file").map(|e| e.path));
        }

        Ok(files)
    }
}

#[async_trait]
impl ArtifactStore for HubDatasetStore {
    async fn upload(&self, folder: &Path, project_id: &str, build_id: BuildId, info: &BuildInfo) -> anyhow::Result<()> {
        benchmark_folder::write_build_info(folder, info)?;

        let prefix = format!("{}/{}", project_id, build_id);
        let mut lines = vec![json!({
            "key": "header",
            "value": {"summary": format!("Upload build {} of {}", build_id, project_id), "description": ""},
        })];

        let mut uploaded = BTreeSet::new();
        let mut additions = Vec::new();
        for entry in WalkDir::new(folder).sort_by_file_name() {
            let entry = entry.with_context(|| format!("Failed to walk {}", folder.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry.path().strip_prefix(folder)?;
            let path_in_repo = format!("{}/{}", prefix, to_repo_path(relative));
            let content = tokio::fs::read(entry.path())
                .await
                .with_context(|| format!("Failed to read {}", entry.path().display()))?;

            additions.push(json!({
                "key": "file",
                "value": {"path": path_in_repo, "content": STANDARD.encode(content), "encoding": "base64"},
            }));
            uploaded.insert(path_in_repo);
        }

        // Everything already stored under the prefix goes, unless re-uploaded.
        let stale: Vec<String> = self
            .list_files(Some(&prefix))
            .await?
            .into_iter()
            .filter(|path| !uploaded.contains(path))
            .collect();
        for path in &stale {
            lines.push(json!({"key": "deletedFile", "value": {"path": path}}));
        }
        lines.extend(additions);

        let body = lines
            .iter()
            .map(serde_json::Value::to_string)
            .collect::<Vec<_>>()
            .join("\n");

        let url = self.commit_url();
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .header(CONTENT_TYPE, "application/x-ndjson")
            .body(body)
            .send()
            .await
            .with_context(|| format!("Failed to send commit to {}", url))?;
        check_status(&url, response).await?;

        tracing::info!(
            dataset_id = %self.dataset_id,
            prefix = %prefix,
            files = uploaded.len(),
            deleted = stale.len(),
            "Uploaded build artifacts"
        );
        Ok(())
    }

    async fn download(&self) -> anyhow::Result<DatasetSnapshot> {
        let dir = TempDir::new().context("Failed to create snapshot directory")?;
        let files = self.list_files(None).await?;

        for path in &files {
            let target = dir.path().join(safe_relative(path)?);
            if let Some(parent) = target.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }

            let url = self.resolve_url(path);
            let response = self
                .client
                .get(&url)
                .bearer_auth(&self.token)
                .send()
                .await
                .with_context(|| format!("Failed to download {}", url))?;
            let bytes = check_status(&url, response).await?.bytes().await?;
            tokio::fs::write(&target, &bytes)
                .await
                .with_context(|| format!("Failed to write {}", target.display()))?;
        }

        tracing::info!(dataset_id = %self.dataset_id, files = files.len(), "Downloaded dataset snapshot");
        Ok(DatasetSnapshot::temporary(dir))
    }
}

async fn check_status(url: &str, response: reqwest::Response) -> anyhow::Result<reqwest::Response> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(HubError::Status {
            url: url.to_string(),
            status: status.as_u16(),
            body,
        }
        .into());
    }
    Ok(response)
}

fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn to_repo_path(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn safe_relative(path: &str) -> anyhow::Result<PathBuf> {
    let relative = PathBuf::from(path);
    if relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return Err(HubError::UnsafePath { path: path.to_string() }.into());
    }
    Ok(relative)
}

/// The `rel="next"` target of a paginated listing, if any.
fn next_link(headers: &HeaderMap) -> Option<String> {
    let link = headers.get(LINK)?.to_str().ok()?;
    link.split(',').find_map(|part| {
        let (target, params) = part.split_once(';')?;
        if !params.contains("rel=\"next\"") {
            return None;
        }
        let target = target.trim();
        Some(target.strip_prefix('<')?.strip_suffix('>')?.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{self, FakeHub};
    use reqwest::header::HeaderValue;
    use std::fs;

    fn store(hub: &FakeHub, token: &str) -> HubDatasetStore {
        HubDatasetStore::new(&hub.url, testing::DATASET_ID, DEFAULT_REVISION, token)
    }

    #[tokio::test]
    async fn test_upload_replaces_build_prefix() {
        let hub = FakeHub::start().await;
        hub.seed("proj/1/stale/inference_results.csv", b"old");
        hub.seed("proj/10/keep.txt", b"other build");
        hub.seed("other/1/keep.txt", b"other project");

        let folder = TempDir::new().unwrap();
        testing::write_case(folder.path(), "gpt2", "forward.latency(s)\n0.1\n");
        let info = BuildInfo {
            hash: "abc".to_string(),
            ..BuildInfo::default()
        };

        store(&hub, testing::HUB_TOKEN)
            .upload(folder.path(), "proj", 1, &info)
            .await
            .unwrap();

        let files = hub.files();
        assert!(!files.contains_key("proj/1/stale/inference_results.csv"));
        assert!(files.contains_key("proj/10/keep.txt"));
        assert!(files.contains_key("other/1/keep.txt"));
        assert_eq!(files["proj/1/gpt2/inference_results.csv"], b"forward.latency(s)\n0.1\n");
        let manifest: serde_json::Value = serde_json::from_slice(&files["proj/1/build_info.json"]).unwrap();
        assert_eq!(manifest["build_hash"], "abc");

        // The manifest is also left in the local folder.
        assert!(folder.path().join(benchmark_folder::BUILD_INFO_FILE).is_file());
        assert_eq!(hub.commits().len(), 1);
        assert_eq!(hub.commits()[0][0]["key"], "header");
    }

    #[tokio::test]
    async fn test_download_snapshot() {
        let hub = FakeHub::start().await;
        hub.seed("proj/1/build_info.json", b"{}");
        hub.seed("proj/1/gpt2/hydra_config.yaml", b"model: gpt2\n");

        let snapshot = store(&hub, testing::HUB_TOKEN).download().await.unwrap();
        let config = fs::read_to_string(snapshot.path().join("proj/1/gpt2/hydra_config.yaml")).unwrap();
        assert_eq!(config, "model: gpt2\n");

        let root = snapshot.path().to_path_buf();
        drop(snapshot);
        assert!(!root.exists());
    }

    #[tokio::test]
    async fn test_wrong_token_is_rejected() {
        let hub = FakeHub::start().await;
        let err = store(&hub, "bad").download().await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<HubError>(),
            Some(HubError::Status { status: 401, .. })
        ));
    }

    #[test]
    fn test_next_link() {
        let mut headers = HeaderMap::new();
        assert_eq!(next_link(&headers), None);

        headers.insert(
            LINK,
            HeaderValue::from_static("<https://hub/api/datasets/a/b/tree/main?cursor=xyz>; rel=\"next\""),
        );
        assert_eq!(
            next_link(&headers).as_deref(),
            Some("https://hub/api/datasets/a/b/tree/main?cursor=xyz")
        );
    }

    #[test]
    fn test_paths() {
        assert_eq!(encode_path("proj/1/gpt2 large/x.csv"), "proj/1/gpt2%20large/x.csv");
        assert!(safe_relative("proj/../../etc/passwd").is_err());
        assert!(safe_relative("/etc/passwd").is_err());
        assert_eq!(safe_relative("proj/1/a.json").unwrap(), PathBuf::from("proj/1/a.json"));
    }
}
