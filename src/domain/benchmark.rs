// Benchmark case domain model
use super::series::MetricKind;

/// One named benchmark case read from a build folder.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkCase {
    pub name: String,
    /// Rendered config, used as the description of every series of the case.
    pub description: String,
    /// Raw values as found in the results file, in `MetricKind::ALL` order.
    pub metrics: Vec<(MetricKind, f64)>,
}

/// A value ready to be published as a sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub kind: MetricKind,
    pub series_id: String,
    pub value: f64,
}

impl BenchmarkCase {
    pub fn measurements(&self) -> Vec<Measurement> {
        self.metrics
            .iter()
            .map(|(kind, raw)| Measurement {
                kind: *kind,
                series_id: kind.series_id(&self.name),
                value: kind.convert(*raw),
            })
            .collect()
    }
}
