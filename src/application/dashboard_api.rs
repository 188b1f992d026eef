// Dashboard trait for project/build/series/sample resources
use crate::domain::build::{Build, BuildId, Project};
use crate::domain::series::{Sample, Series};
use async_trait::async_trait;

/// Create-or-replace operations over the DANA REST surface.
///
/// `override_existing` maps to the dashboard's `override` flag: when true an
/// existing resource is replaced, when false a duplicate add is rejected by the
/// server.
#[async_trait]
pub trait DashboardApi: Send + Sync {
    async fn add_project(&self, project: &Project, override_existing: bool) -> anyhow::Result<()>;

    async fn add_build(&self, build: &Build, override_existing: bool) -> anyhow::Result<()>;

    async fn add_series(&self, series: &Series, override_existing: bool) -> anyhow::Result<()>;

    async fn add_sample(&self, sample: &Sample, override_existing: bool) -> anyhow::Result<()>;

    /// True when the dashboard answers a build probe for the project with 200.
    async fn project_exists(&self, project_id: &str) -> anyhow::Result<bool>;

    /// True when the dashboard returns a non-empty body for the build.
    async fn build_exists(&self, project_id: &str, build_id: BuildId) -> anyhow::Result<bool>;
}
