//! Fluent assembly of "get metric statistics" queries.
//!
//! A `ReportBuilder` holds global defaults plus an ordered list of
//! metric queries. `begin()` points subsequent calls at the most
//! recently added metric, `end()` points them back at the globals, and
//! `resolve()` merges the two layers into one `ResolvedQuery` per
//! metric.

use serde::Serialize;

use crate::client::MetricsClient;
use crate::error::Result;
use crate::metric::{DimensionSet, MetricId, Statistic};
use crate::report::{self, ReportTable};

/// Aggregation bucket width used when no period is configured.
pub const DEFAULT_PERIOD: i64 = 3600;

/// Per-metric overrides recorded while building. Unset fields fall back
/// to the builder's globals at resolve time.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricQuery {
    pub(crate) metric: MetricId,
    pub(crate) dimensions: DimensionSet,
    pub(crate) statistic: Statistic,
    pub(crate) start_time: Option<i64>,
    pub(crate) end_time: Option<i64>,
    pub(crate) period: Option<i64>,
}

impl MetricQuery {
    fn new(metric: MetricId) -> Self {
        MetricQuery {
            metric,
            dimensions: DimensionSet::default(),
            statistic: Statistic::default(),
            start_time: None,
            end_time: None,
            period: None,
        }
    }
}

/// One fully merged query, ready to hand to a `MetricsClient`.
///
/// Serializes to the parameter shape of the upstream API, so `--json`
/// output can be compared against real request dumps.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedQuery {
    #[serde(flatten)]
    pub metric: MetricId,
    #[serde(rename = "Dimensions")]
    pub dimensions: DimensionSet,
    #[serde(rename = "StartTime", skip_serializing_if = "Option::is_none")]
    pub start_time: Option<i64>,
    #[serde(rename = "EndTime", skip_serializing_if = "Option::is_none")]
    pub end_time: Option<i64>,
    #[serde(rename = "Period")]
    pub period: i64,
    #[serde(rename = "Statistics")]
    pub statistics: Vec<Statistic>,
}

/// Builder for a multi-metric statistics report.
///
/// Configuration calls target either the globals or, between `begin()`
/// and `end()`, the most recently added metric. The scope is a plain
/// index into the query list; queries are only ever appended, so a
/// recorded index stays valid.
#[derive(Debug, Clone)]
pub struct ReportBuilder {
    dimensions: DimensionSet,
    pub(crate) start_time: Option<i64>,
    pub(crate) end_time: Option<i64>,
    pub(crate) period: i64,
    queries: Vec<MetricQuery>,
    scope: Option<usize>,
}

impl ReportBuilder {
    pub fn new() -> Self {
        ReportBuilder {
            dimensions: DimensionSet::default(),
            start_time: None,
            end_time: None,
            period: DEFAULT_PERIOD,
            queries: Vec::new(),
            scope: None,
        }
    }

    /// Add a dimension to the active scope. Re-adding a key overwrites
    /// its value without moving it.
    pub fn add_dimension(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let target = match self.scope {
            Some(index) => &mut self.queries[index].dimensions,
            None => &mut self.dimensions,
        };
        target.insert(name, value);
        self
    }

    /// Set the window start (epoch seconds) on the active scope.
    pub fn start_time(mut self, timestamp: i64) -> Self {
        match self.scope {
            Some(index) => self.queries[index].start_time = Some(timestamp),
            None => self.start_time = Some(timestamp),
        }
        self
    }

    /// Set the window end (epoch seconds, exclusive) on the active scope.
    pub fn end_time(mut self, timestamp: i64) -> Self {
        match self.scope {
            Some(index) => self.queries[index].end_time = Some(timestamp),
            None => self.end_time = Some(timestamp),
        }
        self
    }

    /// Set the aggregation period in seconds on the active scope.
    pub fn period(mut self, seconds: i64) -> Self {
        match self.scope {
            Some(index) => self.queries[index].period = Some(seconds),
            None => self.period = seconds,
        }
        self
    }

    /// Append a metric given as `"Namespace::MetricName"`. The new query
    /// starts with the default statistic and no overrides. Does not
    /// change the active scope.
    pub fn add_metric(mut self, identifier: &str) -> Result<Self> {
        let metric = MetricId::parse(identifier)?;
        self.queries.push(MetricQuery::new(metric));
        Ok(self)
    }

    /// Point subsequent configuration calls at the most recently added
    /// metric. Does nothing while no metric has been added.
    pub fn begin(mut self) -> Self {
        if !self.queries.is_empty() {
            self.scope = Some(self.queries.len() - 1);
        }
        self
    }

    /// Point subsequent configuration calls back at the globals.
    pub fn end(mut self) -> Self {
        self.scope = None;
        self
    }

    /// Set the statistic on the scoped metric. Ignored while unscoped;
    /// there is no global statistic, each metric carries its own.
    pub fn statistic(mut self, statistic: Statistic) -> Self {
        if let Some(index) = self.scope {
            self.queries[index].statistic = statistic;
        }
        self
    }

    /// Merge globals and per-metric overrides into one query per metric,
    /// in the order the metrics were added.
    ///
    /// Dimensions merge with the global keys first in their insertion
    /// order, then the metric's own keys; a key present in both takes
    /// the metric's value at the global position. Times and period each
    /// fall back to the global value where the metric left them unset.
    pub fn resolve(&self) -> Vec<ResolvedQuery> {
        self.queries
            .iter()
            .map(|query| ResolvedQuery {
                metric: query.metric.clone(),
                dimensions: self.dimensions.overlaid(&query.dimensions),
                start_time: query.start_time.or(self.start_time),
                end_time: query.end_time.or(self.end_time),
                period: query.period.unwrap_or(self.period),
                statistics: vec![query.statistic],
            })
            .collect()
    }

    /// Fetch every resolved query through `client` and assemble the
    /// time-aligned table. See [`report::run`].
    pub fn run(&self, client: &impl MetricsClient) -> Result<ReportTable> {
        report::run(self, client)
    }

    /// Like [`ReportBuilder::run`], with the fetches fanned out onto
    /// threads. Column order matches `run`.
    pub fn run_parallel(&self, client: &(impl MetricsClient + Sync)) -> Result<ReportTable> {
        report::run_parallel(self, client)
    }
}

impl Default for ReportBuilder {
    fn default() -> Self {
        ReportBuilder::new()
    }
}
