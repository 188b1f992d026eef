// Benchmark folder reader - Cases, results rows and build manifests on disk
use crate::domain::benchmark::BenchmarkCase;
use crate::domain::build::BuildInfo;
use crate::domain::series::MetricKind;
use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const RESULTS_FILE: &str = "inference_results.csv";
pub const CONFIG_FILE: &str = "hydra_config.yaml";
pub const BUILD_INFO_FILE: &str = "build_info.json";

/// Line break marker the dashboard renders inside series descriptions.
const DESCRIPTION_LINE_BREAK: &str = "<br>";

#[derive(Debug, thiserror::Error)]
pub enum BenchmarkFolderError {
    #[error("{path} has no data row")]
    EmptyResults { path: PathBuf },
    #[error("{path} has no `{column}` column")]
    MissingColumn { path: PathBuf, column: &'static str },
    #[error("{path}: `{column}` value {value:?} is not a number")]
    InvalidValue {
        path: PathBuf,
        column: &'static str,
        value: String,
    },
}

/// Immediate sub-directories of `folder`, sorted by name.
pub fn case_dirs(folder: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let entries = fs::read_dir(folder).with_context(|| format!("Failed to read {}", folder.display()))?;

    let mut dirs = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// Read one benchmark case.
///
/// Returns `None` when the directory does not hold exactly one results file and
/// exactly one config file beneath it.
pub fn read_case(dir: &Path) -> anyhow::Result<Option<BenchmarkCase>> {
    let name = dir
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("Unreadable case directory name {}", dir.display()))?
        .to_string();

    let results = find_files(dir, RESULTS_FILE)?;
    let configs = find_files(dir, CONFIG_FILE)?;
    if results.len() != 1 || configs.len() != 1 {
        tracing::warn!(
            case = %name,
            results = results.len(),
            configs = configs.len(),
            "Skipping benchmark case without exactly one results and one config file"
        );
        return Ok(None);
    }

    let description = render_description(&configs[0])?;
    let metrics = read_metrics(&results[0])?;

    Ok(Some(BenchmarkCase {
        name,
        description,
        metrics,
    }))
}

fn find_files(dir: &Path, file_name: &str) -> anyhow::Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to walk {}", dir.display()))?;
        if entry.file_type().is_file() && entry.file_name() == file_name {
            found.push(entry.into_path());
        }
    }
    Ok(found)
}

/// The config re-rendered as YAML, with line breaks the dashboard can display.
pub fn render_description(path: &Path) -> anyhow::Result<String> {
    let text = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let config: serde_yaml::Value =
        serde_yaml::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))?;
    let rendered = serde_yaml::to_string(&config)?;
    Ok(rendered.replace('\n', DESCRIPTION_LINE_BREAK))
}

/// Metric values from the first data row of a results file.
pub fn read_metrics(path: &Path) -> anyhow::Result<Vec<(MetricKind, f64)>> {
    let mut reader = csv::Reader::from_path(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let headers = reader.headers()?.clone();
    let record = match reader.records().next() {
        Some(record) => record?,
        None => {
            return Err(BenchmarkFolderError::EmptyResults {
                path: path.to_path_buf(),
            }
            .into());
        }
    };

    let mut metrics = Vec::new();
    for kind in MetricKind::ALL {
        let column = kind.column();
        let Some(index) = headers.iter().position(|h| h.trim() == column) else {
            if kind.is_required() {
                return Err(BenchmarkFolderError::MissingColumn {
                    path: path.to_path_buf(),
                    column,
                }
                .into());
            }
            continue;
        };

        let raw = record.get(index).unwrap_or("").trim();
        let value = raw.parse::<f64>().map_err(|_| BenchmarkFolderError::InvalidValue {
            path: path.to_path_buf(),
            column,
            value: raw.to_string(),
        })?;
        metrics.push((kind, value));
    }

    Ok(metrics)
}

pub fn write_build_info(folder: &Path, info: &BuildInfo) -> anyhow::Result<()> {
    let path = folder.join(BUILD_INFO_FILE);
    let json = serde_json::to_string(info)?;
    fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))
}

pub fn read_build_info(folder: &Path) -> anyhow::Result<BuildInfo> {
    let path = folder.join(BUILD_INFO_FILE);
    let text = fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))
}
