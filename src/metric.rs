use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ReportError, Result};

/// Statistic applied by the monitoring service to the raw samples inside
/// each period bucket.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
pub enum Statistic {
    Average,
    Sum,
    Minimum,
    Maximum,
    SampleCount,
}

impl Default for Statistic {
    fn default() -> Self {
        Statistic::Average
    }
}

/// Fully qualified metric identifier, written `Namespace::MetricName`.
///
/// The namespace itself may contain slashes (`System/Linux`), so the
/// separator is the double colon and nothing else.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MetricId {
    #[serde(rename = "Namespace")]
    pub namespace: String,
    #[serde(rename = "MetricName")]
    pub name: String,
}

impl MetricId {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        MetricId {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Parse `"Namespace::MetricName"`. Exactly one `::` with non-empty
    /// sides; anything else is malformed.
    pub fn parse(input: &str) -> Result<Self> {
        let mut parts = input.split("::");
        match (parts.next(), parts.next(), parts.next()) {
            (Some(namespace), Some(name), None) if !namespace.is_empty() && !name.is_empty() => {
                Ok(MetricId::new(namespace, name))
            }
            _ => Err(ReportError::MalformedMetricIdentifier {
                input: input.to_string(),
            }),
        }
    }
}

impl FromStr for MetricId {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self> {
        MetricId::parse(s)
    }
}

impl fmt::Display for MetricId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.namespace, self.name)
    }
}

/// One key/value tag narrowing a metric query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Dimension {
    pub name: String,
    pub value: String,
}

/// Insertion-ordered dimension map.
///
/// The upstream API takes dimensions as an ordered list, so this keeps
/// insertion order rather than key order. Re-inserting an existing key
/// replaces the value in place without moving the entry. Backed by a
/// plain vec; dimension sets are small.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DimensionSet {
    inner: Vec<Dimension>,
}

impl DimensionSet {
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.inner.iter_mut().find(|d| d.name == name) {
            Some(existing) => existing.value = value,
            None => self.inner.push(Dimension { name, value }),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner
            .iter()
            .find(|d| d.name == name)
            .map(|d| d.value.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Dimension> {
        self.inner.iter()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Merge for query resolution: `self` first in its insertion order,
    /// then `other`'s keys not already present in theirs. A key present
    /// in both takes `other`'s value at `self`'s position.
    pub fn overlaid(&self, other: &DimensionSet) -> DimensionSet {
        let mut merged = self.clone();
        for dimension in &other.inner {
            merged.insert(&dimension.name, dimension.value.clone());
        }
        merged
    }
}

impl<'a> IntoIterator for &'a DimensionSet {
    type Item = &'a Dimension;
    type IntoIter = std::slice::Iter<'a, Dimension>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}

impl FromIterator<(String, String)> for DimensionSet {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut set = DimensionSet::default();
        for (name, value) in iter {
            set.insert(name, value);
        }
        set
    }
}
