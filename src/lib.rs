pub mod builder;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod metric;
pub mod render;
pub mod report;

pub use builder::{ReportBuilder, ResolvedQuery, DEFAULT_PERIOD};
pub use client::{Datapoint, MetricsClient, ReplayClient, Series};
pub use error::{BoxError, ReportError, Result};
pub use metric::{Dimension, DimensionSet, MetricId, Statistic};
pub use report::{timestamp_axis, ReportColumn, ReportTable, DATE_TIME_COLUMN};
