//! Report assembly: one timestamp axis, one fetched series per query,
//! datapoints bucketed into time-aligned columns.

use std::collections::HashMap;
use std::thread;

use chrono::DateTime;
use log::debug;

use crate::builder::{ReportBuilder, ResolvedQuery};
use crate::client::{MetricsClient, Series};
use crate::error::{BoxError, ReportError, Result};

/// Name of the leading timestamp column.
pub const DATE_TIME_COLUMN: &str = "Date Time";

/// Axis stamps render at minute granularity with the seconds forced
/// to zero.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:00Z";

/// Datapoint keys keep their true seconds. A datapoint lands in a
/// bucket only when its key equals an axis stamp verbatim, so a
/// sub-minute timestamp matches nothing and is dropped.
const DATAPOINT_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// UTC rendering of an epoch timestamp, `None` outside the
/// representable range.
pub fn format_timestamp(timestamp: i64) -> Option<String> {
    let datetime = DateTime::from_timestamp(timestamp, 0)?;
    Some(datetime.format(TIMESTAMP_FORMAT).to_string())
}

/// The ordered bucket timestamps `start, start + period, ...` strictly
/// below `end`. The window is half-open: `end` itself is never on the
/// axis.
pub fn timestamp_axis(start: i64, end: i64, period: i64) -> Result<Vec<String>> {
    if period <= 0 || end <= start {
        return Err(ReportError::InvalidWindow {
            start: Some(start),
            end: Some(end),
            period,
        });
    }
    let mut timestamps = Vec::new();
    let mut cursor = start;
    while cursor < end {
        match format_timestamp(cursor) {
            Some(stamp) => timestamps.push(stamp),
            None => {
                return Err(ReportError::InvalidWindow {
                    start: Some(start),
                    end: Some(end),
                    period,
                })
            }
        }
        cursor = match cursor.checked_add(period) {
            Some(next) => next,
            None => break,
        };
    }
    Ok(timestamps)
}

/// One metric's values, keyed by bucket timestamp. Every axis timestamp
/// has an entry; `None` marks a bucket the series had no datapoint for.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportColumn {
    pub name: String,
    cells: HashMap<String, Option<f64>>,
}

impl ReportColumn {
    /// Value in the given bucket; `None` for an empty cell or a
    /// timestamp that is not on the axis.
    pub fn value(&self, timestamp: &str) -> Option<f64> {
        self.cells.get(timestamp).copied().flatten()
    }

    pub fn bucket_count(&self) -> usize {
        self.cells.len()
    }
}

/// The assembled report: the shared timestamp axis plus one column per
/// query, in query order.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportTable {
    pub timestamps: Vec<String>,
    pub columns: Vec<ReportColumn>,
}

/// Fetch every resolved query sequentially and assemble the table.
///
/// The axis comes from the builder's global window and period only.
/// Per-metric windows still go out in the API calls, but every column
/// is bucketed against the one shared axis; a report has a single
/// conceptual window. The first failing fetch aborts the run, later
/// queries are not issued.
pub fn run(builder: &ReportBuilder, client: &impl MetricsClient) -> Result<ReportTable> {
    let queries = builder.resolve();
    let mut table = ReportTable {
        timestamps: global_axis(builder)?,
        columns: Vec::with_capacity(queries.len()),
    };
    for query in &queries {
        let series = fetch_one(client, query)?;
        table.columns.push(build_column(&table.timestamps, &series)?);
    }
    Ok(table)
}

/// Like [`run`], with the fetches fanned out onto scoped threads.
///
/// Columns land in query order, so the output is identical to `run`'s.
/// All fetches are issued before errors are inspected; the failure
/// reported is the first in query order, not the first in time.
pub fn run_parallel(
    builder: &ReportBuilder,
    client: &(impl MetricsClient + Sync),
) -> Result<ReportTable> {
    let queries = builder.resolve();
    let mut table = ReportTable {
        timestamps: global_axis(builder)?,
        columns: Vec::with_capacity(queries.len()),
    };

    let results: Vec<std::result::Result<Series, BoxError>> = thread::scope(|scope| {
        let handles: Vec<_> = queries
            .iter()
            .map(|query| {
                scope.spawn(move || {
                    debug!("fetching {}", query.metric);
                    client.fetch_statistics(query)
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| {
                handle
                    .join()
                    .unwrap_or_else(|_| Err("statistics fetch thread panicked".into()))
            })
            .collect()
    });

    for (query, result) in queries.iter().zip(results) {
        let series = result.map_err(|source| ReportError::FailedFetch {
            query: Box::new(query.clone()),
            source,
        })?;
        table.columns.push(build_column(&table.timestamps, &series)?);
    }
    Ok(table)
}

fn global_axis(builder: &ReportBuilder) -> Result<Vec<String>> {
    match (builder.start_time, builder.end_time) {
        (Some(start), Some(end)) => timestamp_axis(start, end, builder.period),
        (start, end) => Err(ReportError::InvalidWindow {
            start,
            end,
            period: builder.period,
        }),
    }
}

fn fetch_one(client: &impl MetricsClient, query: &ResolvedQuery) -> Result<Series> {
    debug!("fetching {}", query.metric);
    client
        .fetch_statistics(query)
        .map_err(|source| ReportError::FailedFetch {
            query: Box::new(query.clone()),
            source,
        })
}

fn datapoint_key(timestamp: i64) -> Option<String> {
    let datetime = DateTime::from_timestamp(timestamp, 0)?;
    Some(datetime.format(DATAPOINT_FORMAT).to_string())
}

fn build_column(axis: &[String], series: &Series) -> Result<ReportColumn> {
    let unit = series.unit()?;
    let name = format!("{} ({unit})", series.label);

    let mut cells: HashMap<String, Option<f64>> =
        axis.iter().map(|stamp| (stamp.clone(), None)).collect();
    let mut dropped = 0usize;
    // Datapoint order is unspecified upstream; on duplicate buckets the
    // last datapoint in response order wins.
    for datapoint in &series.datapoints {
        let bucket = datapoint_key(datapoint.timestamp).and_then(|key| cells.get_mut(&key));
        match bucket {
            Some(cell) => *cell = Some(datapoint.value),
            None => dropped += 1,
        }
    }
    if dropped > 0 {
        debug!(
            "dropped {dropped} datapoint(s) with no bucket on the axis from {:?}",
            series.label
        );
    }
    Ok(ReportColumn { name, cells })
}
