use thiserror::Error;

use crate::builder::ResolvedQuery;

/// Error type returned by external metrics clients.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T> = std::result::Result<T, ReportError>;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("malformed metric identifier {input:?}: expected \"Namespace::MetricName\"")]
    MalformedMetricIdentifier { input: String },

    #[error("invalid report window: start={start:?} end={end:?} period={period}")]
    InvalidWindow {
        start: Option<i64>,
        end: Option<i64>,
        period: i64,
    },

    #[error("fetching statistics for {} failed", .query.metric)]
    FailedFetch {
        query: Box<ResolvedQuery>,
        #[source]
        source: BoxError,
    },

    #[error("series {label:?} has no datapoints")]
    EmptySeries { label: String },

    #[error("series {label:?} mixes units {expected:?} and {found:?}")]
    InconsistentUnits {
        label: String,
        expected: String,
        found: String,
    },
}

impl ReportError {
    /// The resolved query a fetch failure belongs to, if any.
    pub fn failed_query(&self) -> Option<&ResolvedQuery> {
        match self {
            ReportError::FailedFetch { query, .. } => Some(query),
            _ => None,
        }
    }
}
