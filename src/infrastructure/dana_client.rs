// DANA dashboard client implementation
use crate::application::dashboard_api::DashboardApi;
use crate::domain::build::{Build, BuildId, PROJECT_PROBE_BUILD_ID, Project};
use crate::domain::series::{Sample, Series, Trend};
use crate::infrastructure::transport::{DanaSession, TransportError};
use anyhow::Context;
use async_trait::async_trait;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectPayload<'a> {
    project_id: &'a str,
    users: &'a str,
    description: &'a str,
    #[serde(rename = "override")]
    override_existing: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BuildPayload<'a> {
    project_id: &'a str,
    build: BuildBody<'a>,
    #[serde(rename = "override")]
    override_existing: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BuildBody<'a> {
    build_id: BuildId,
    infos: BuildInfos<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BuildInfos<'a> {
    url: &'a str,
    hash: &'a str,
    subject: &'a str,
    abbrev_hash: &'a str,
    author_name: &'a str,
    author_email: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SeriesPayload<'a> {
    project_id: &'a str,
    serie_id: &'a str,
    serie_unit: &'a str,
    analyse: Analyse<'a>,
    description: &'a str,
    #[serde(rename = "override")]
    override_existing: bool,
}

#[derive(Debug, Serialize)]
struct Analyse<'a> {
    benchmark: BenchmarkAnalysis<'a>,
}

#[derive(Debug, Serialize)]
struct BenchmarkAnalysis<'a> {
    range: &'a str,
    required: u32,
    trend: Trend,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SamplePayload<'a> {
    project_id: &'a str,
    serie_id: &'a str,
    sample_unit: &'a str,
    sample: SampleBody,
    #[serde(rename = "override")]
    override_existing: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SampleBody {
    build_id: BuildId,
    value: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BuildQuery<'a> {
    project_id: &'a str,
    build_id: BuildId,
}

impl<'a> ProjectPayload<'a> {
    fn new(project: &'a Project, override_existing: bool) -> Self {
        Self {
            project_id: &project.id,
            users: &project.users,
            description: &project.description,
            override_existing,
        }
    }
}

impl<'a> BuildPayload<'a> {
    fn new(build: &'a Build, override_existing: bool) -> Self {
        let info = &build.info;
        Self {
            project_id: &build.project_id,
            build: BuildBody {
                build_id: build.id,
                infos: BuildInfos {
                    url: &info.url,
                    hash: &info.hash,
                    subject: &info.subject,
                    abbrev_hash: &info.abbrev_hash,
                    author_name: &info.author_name,
                    author_email: &info.author_email,
                },
            },
            override_existing,
        }
    }
}

impl<'a> SeriesPayload<'a> {
    fn new(series: &'a Series, override_existing: bool) -> Self {
        Self {
            project_id: &series.project_id,
            serie_id: &series.id,
            serie_unit: &series.unit,
            analyse: Analyse {
                benchmark: BenchmarkAnalysis {
                    range: &series.policy.range,
                    required: series.policy.required,
                    trend: series.policy.trend,
                },
            },
            description: &series.description,
            override_existing,
        }
    }
}

impl<'a> SamplePayload<'a> {
    fn new(sample: &'a Sample, override_existing: bool) -> Self {
        Self {
            project_id: &sample.project_id,
            serie_id: &sample.series_id,
            sample_unit: &sample.unit,
            sample: SampleBody {
                build_id: sample.build_id,
                value: sample.value,
            },
            override_existing,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DanaClient {
    session: DanaSession,
}

impl DanaClient {
    pub fn new(session: DanaSession) -> Self {
        Self { session }
    }
}

#[async_trait]
impl DashboardApi for DanaClient {
    async fn add_project(&self, project: &Project, override_existing: bool) -> anyhow::Result<()> {
        let url = self.session.endpoint("/admin/addProject");
        self.session
            .post(&url, &ProjectPayload::new(project, override_existing))
            .await?;
        tracing::info!(project_id = %project.id, "Project added");
        Ok(())
    }

    async fn add_build(&self, build: &Build, override_existing: bool) -> anyhow::Result<()> {
        let url = self.session.endpoint("/apis/addBuild");
        self.session
            .post(&url, &BuildPayload::new(build, override_existing))
            .await?;
        tracing::info!(project_id = %build.project_id, build_id = build.id, "Build added");
        Ok(())
    }

    async fn add_series(&self, series: &Series, override_existing: bool) -> anyhow::Result<()> {
        let url = self.session.endpoint("/apis/addSerie");
        self.session
            .post(&url, &SeriesPayload::new(series, override_existing))
            .await?;
        tracing::debug!(series_id = %series.id, "Series added");
        Ok(())
    }

    async fn add_sample(&self, sample: &Sample, override_existing: bool) -> anyhow::Result<()> {
        let url = self.session.endpoint("/apis/addSample");
        self.session
            .post(&url, &SamplePayload::new(sample, override_existing))
            .await?;
        tracing::debug!(series_id = %sample.series_id, build_id = sample.build_id, "Sample added");
        Ok(())
    }

    async fn project_exists(&self, project_id: &str) -> anyhow::Result<bool> {
        let url = self.session.endpoint("/apis/getBuild");
        let query = BuildQuery {
            project_id,
            build_id: PROJECT_PROBE_BUILD_ID,
        };

        match self.session.get(&url, &query).await {
            Ok(_) => Ok(true),
            Err(TransportError::HttpStatus { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn build_exists(&self, project_id: &str, build_id: BuildId) -> anyhow::Result<bool> {
        let url = self.session.endpoint("/apis/getBuild");
        let response = self
            .session
            .get(&url, &BuildQuery { project_id, build_id })
            .await?;

        let body = response
            .json::<serde_json::Value>()
            .await
            .context("Failed to parse getBuild response")?;
        Ok(is_non_empty(&body))
    }
}

fn is_non_empty(value: &serde_json::Value) -> bool {
    use serde_json::Value;
    match value {
        Value::Null => false,
        Value::Object(map) => !map.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::String(s) => !s.is_empty(),
        Value::Bool(_) | Value::Number(_) => true,
    }
}
