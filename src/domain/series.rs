// Series and sample domain models
use serde::{Deserialize, Serialize};

use super::build::BuildId;

pub const DEFAULT_UNIT: &str = "ms";
pub const DEFAULT_RANGE: &str = "5%";
pub const DEFAULT_REQUIRED: u32 = 3;

/// Which direction counts as an improvement for a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Smaller,
    Higher,
}

/// Regression-detection settings the dashboard applies to a series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisPolicy {
    /// Tolerance range, e.g. "5%".
    pub range: String,
    /// Samples needed before trend analysis kicks in.
    pub required: u32,
    pub trend: Trend,
}

impl Default for AnalysisPolicy {
    fn default() -> Self {
        Self {
            range: DEFAULT_RANGE.to_string(),
            required: DEFAULT_REQUIRED,
            trend: Trend::Smaller,
        }
    }
}

impl AnalysisPolicy {
    pub fn with_trend(&self, trend: Trend) -> Self {
        Self {
            trend,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub project_id: String,
    pub id: String,
    pub unit: String,
    pub description: String,
    pub policy: AnalysisPolicy,
}

impl Series {
    pub fn new(project_id: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            id: id.into(),
            unit: DEFAULT_UNIT.to_string(),
            description: String::new(),
            policy: AnalysisPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub project_id: String,
    pub series_id: String,
    pub build_id: BuildId,
    pub value: f64,
    pub unit: String,
}

impl Sample {
    pub fn new(
        project_id: impl Into<String>,
        series_id: impl Into<String>,
        build_id: BuildId,
        value: f64,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            series_id: series_id.into(),
            build_id,
            value,
            unit: DEFAULT_UNIT.to_string(),
        }
    }
}

/// The metrics a benchmark case can report, with their fixed publishing rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Latency,
    Memory,
    Throughput,
}

impl MetricKind {
    pub const ALL: [MetricKind; 3] = [MetricKind::Latency, MetricKind::Memory, MetricKind::Throughput];

    /// Column name in `inference_results.csv`.
    pub fn column(self) -> &'static str {
        match self {
            MetricKind::Latency => "forward.latency(s)",
            MetricKind::Memory => "forward.peak_memory(MB)",
            MetricKind::Throughput => "generate.throughput(tokens/s)",
        }
    }

    pub fn is_required(self) -> bool {
        matches!(self, MetricKind::Latency)
    }

    pub fn unit(self) -> &'static str {
        match self {
            MetricKind::Latency => "ms",
            MetricKind::Memory => "mbytes",
            MetricKind::Throughput => "tokens",
        }
    }

    pub fn trend(self) -> Trend {
        match self {
            MetricKind::Latency | MetricKind::Memory => Trend::Smaller,
            MetricKind::Throughput => Trend::Higher,
        }
    }

    /// Convert a raw CSV value into the series unit.
    pub fn convert(self, raw: f64) -> f64 {
        match self {
            MetricKind::Latency => raw * 1000.0,
            MetricKind::Memory | MetricKind::Throughput => raw,
        }
    }

    pub fn series_id(self, case_name: &str) -> String {
        let suffix = match self {
            MetricKind::Latency => "latency(ms)",
            MetricKind::Memory => "memory(mbytes)",
            MetricKind::Throughput => "throughput(tokens)",
        };
        format!("{}_{}", case_name, suffix)
    }
}
