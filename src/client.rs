//! The outbound boundary: a trait for fetching aggregated series, plus
//! a replay implementation that serves recorded responses from disk.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::builder::ResolvedQuery;
use crate::error::{BoxError, ReportError, Result};

/// One aggregated sample. The upstream API tags every datapoint with
/// its own unit, so the unit lives here rather than on the series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Datapoint {
    pub timestamp: i64,
    pub value: f64,
    pub unit: String,
}

/// Response to one statistics query. Datapoint order is unspecified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Series {
    pub label: String,
    pub datapoints: Vec<Datapoint>,
}

impl Series {
    /// The unit shared by every datapoint in the series.
    ///
    /// Fails with `EmptySeries` when there is no datapoint to take the
    /// unit from, and with `InconsistentUnits` when the datapoints
    /// disagree.
    pub fn unit(&self) -> Result<&str> {
        let mut datapoints = self.datapoints.iter();
        let first = datapoints.next().ok_or_else(|| ReportError::EmptySeries {
            label: self.label.clone(),
        })?;
        for datapoint in datapoints {
            if datapoint.unit != first.unit {
                return Err(ReportError::InconsistentUnits {
                    label: self.label.clone(),
                    expected: first.unit.clone(),
                    found: datapoint.unit.clone(),
                });
            }
        }
        Ok(&first.unit)
    }
}

/// Capability for issuing one "get metric statistics" call.
///
/// This is the only boundary to the outside world. Implementations own
/// transport and auth; callers issue one call per resolved query and do
/// not retry.
pub trait MetricsClient {
    fn fetch_statistics(&self, query: &ResolvedQuery) -> std::result::Result<Series, BoxError>;
}

/// Client serving recorded series from a JSON file.
///
/// The file maps `"Namespace::MetricName"` keys to series objects.
/// Dimensions, window, and statistic of the incoming query are ignored;
/// whatever was recorded for the metric is returned as-is.
#[derive(Debug, Clone, Default)]
pub struct ReplayClient {
    series: HashMap<String, Series>,
}

impl ReplayClient {
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let series: HashMap<String, Series> = serde_json::from_str(&contents)?;
        Ok(ReplayClient { series })
    }

    pub fn insert(&mut self, metric: impl Into<String>, series: Series) {
        self.series.insert(metric.into(), series);
    }
}

impl MetricsClient for ReplayClient {
    fn fetch_statistics(&self, query: &ResolvedQuery) -> std::result::Result<Series, BoxError> {
        self.series
            .get(&query.metric.to_string())
            .cloned()
            .ok_or_else(|| format!("no recorded series for {}", query.metric).into())
    }
}
