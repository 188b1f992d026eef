// Publish service - Turns a folder of benchmark outputs into dashboard records
use crate::application::artifact_store::ArtifactStore;
use crate::application::dashboard_api::DashboardApi;
use crate::domain::benchmark::BenchmarkCase;
use crate::domain::build::{Build, BuildId, BuildInfo, Project};
use crate::domain::series::{AnalysisPolicy, Sample, Series};
use crate::infrastructure::benchmark_folder;
use anyhow::Context;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    pub cases: usize,
    pub skipped: usize,
    pub samples: usize,
}

#[derive(Clone)]
pub struct PublishService {
    api: Arc<dyn DashboardApi>,
}

impl PublishService {
    pub fn new(api: Arc<dyn DashboardApi>) -> Self {
        Self { api }
    }

    /// Publish every benchmark case found under `folder` as build `build_id`.
    ///
    /// Steps run in order and are not rolled back: a failure part way leaves the
    /// records written so far in place.
    pub async fn publish(
        &self,
        folder: &Path,
        project_id: &str,
        build_id: BuildId,
        info: &BuildInfo,
        policy: &AnalysisPolicy,
    ) -> anyhow::Result<PublishReport> {
        if !self.api.project_exists(project_id).await? {
            tracing::info!(project_id, "Project not found, creating it");
            self.api.add_project(&Project::new(project_id), true).await?;
        }

        tracing::info!(project_id, build_id, "Adding build");
        let build = Build::new(project_id, build_id, info.clone());
        self.api.add_build(&build, true).await?;

        let mut report = PublishReport::default();
        for case_dir in benchmark_folder::case_dirs(folder)? {
            match benchmark_folder::read_case(&case_dir)? {
                Some(case) => {
                    report.samples += self.publish_case(&case, project_id, build_id, policy).await?;
                    report.cases += 1;
                }
                None => report.skipped += 1,
            }
        }

        tracing::info!(
            project_id,
            build_id,
            cases = report.cases,
            skipped = report.skipped,
            samples = report.samples,
            "Build published"
        );
        Ok(report)
    }

    async fn publish_case(
        &self,
        case: &BenchmarkCase,
        project_id: &str,
        build_id: BuildId,
        policy: &AnalysisPolicy,
    ) -> anyhow::Result<usize> {
        let measurements = case.measurements();
        for measurement in &measurements {
            let unit = measurement.kind.unit();
            tracing::debug!(series_id = %measurement.series_id, value = measurement.value, "Publishing sample");

            let mut series = Series::new(project_id, &measurement.series_id);
            series.unit = unit.to_string();
            series.description = case.description.clone();
            series.policy = policy.with_trend(measurement.kind.trend());
            self.api.add_series(&series, true).await?;

            let mut sample = Sample::new(project_id, &measurement.series_id, build_id, measurement.value);
            sample.unit = unit.to_string();
            self.api.add_sample(&sample, true).await?;
        }
        Ok(measurements.len())
    }

    /// Re-publish every build kept in the artifact store.
    pub async fn publish_backup(
        &self,
        store: &dyn ArtifactStore,
        policy: &AnalysisPolicy,
    ) -> anyhow::Result<usize> {
        let snapshot = store.download().await?;
        let mut published = 0;

        for project_dir in benchmark_folder::case_dirs(snapshot.path())? {
            let project_id = dir_name(&project_dir)?;
            for build_dir in benchmark_folder::case_dirs(&project_dir)? {
                let build_name = dir_name(&build_dir)?;
                let build_id: BuildId = build_name
                    .parse()
                    .with_context(|| format!("Invalid build id {:?} under project {}", build_name, project_id))?;
                let info = benchmark_folder::read_build_info(&build_dir)?;

                tracing::info!(project_id = %project_id, build_id, "Publishing backed up build");
                self.publish(&build_dir, &project_id, build_id, &info, policy).await?;
                published += 1;
            }
        }

        Ok(published)
    }
}

fn dir_name(path: &Path) -> anyhow::Result<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .with_context(|| format!("Unreadable directory name {}", path.display()))
}
