//! TOML report definitions.
//!
//! A definition file carries the global window and dimensions plus one
//! `[[metrics]]` entry per column, in report order:
//!
//! ```toml
//! start_time = 0
//! end_time = 7200
//! period = 3600
//!
//! [[dimensions]]
//! name = "InstanceId"
//! value = "i-1234"
//!
//! [[metrics]]
//! metric = "AWS/EC2::CPUUtilization"
//! statistic = "Maximum"
//!
//! [[metrics]]
//! metric = "AWS/EC2::NetworkIn"
//! period = 60
//! ```

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::builder::ReportBuilder;
use crate::metric::Statistic;

#[derive(Debug, Clone, Deserialize)]
pub struct ReportDefinition {
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
    pub period: Option<i64>,
    #[serde(default)]
    pub dimensions: Vec<DimensionEntry>,
    #[serde(default)]
    pub metrics: Vec<MetricEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DimensionEntry {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricEntry {
    pub metric: String,
    pub statistic: Option<Statistic>,
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
    pub period: Option<i64>,
    #[serde(default)]
    pub dimensions: Vec<DimensionEntry>,
}

pub fn load_definition(path: &Path) -> anyhow::Result<ReportDefinition> {
    let contents = fs::read_to_string(path)?;
    let definition: ReportDefinition = toml::from_str(&contents)?;
    Ok(definition)
}

impl ReportDefinition {
    /// Replay the definition through a builder, globals first, then one
    /// scoped block per metric entry.
    pub fn into_builder(self) -> crate::error::Result<ReportBuilder> {
        let mut builder = ReportBuilder::new();
        for dimension in &self.dimensions {
            builder = builder.add_dimension(&dimension.name, &dimension.value);
        }
        if let Some(start) = self.start_time {
            builder = builder.start_time(start);
        }
        if let Some(end) = self.end_time {
            builder = builder.end_time(end);
        }
        if let Some(period) = self.period {
            builder = builder.period(period);
        }

        for entry in &self.metrics {
            builder = builder.add_metric(&entry.metric)?.begin();
            if let Some(statistic) = entry.statistic {
                builder = builder.statistic(statistic);
            }
            if let Some(start) = entry.start_time {
                builder = builder.start_time(start);
            }
            if let Some(end) = entry.end_time {
                builder = builder.end_time(end);
            }
            if let Some(period) = entry.period {
                builder = builder.period(period);
            }
            for dimension in &entry.dimensions {
                builder = builder.add_dimension(&dimension.name, &dimension.value);
            }
            builder = builder.end();
        }
        Ok(builder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReportError;

    const DEFINITION: &str = r#"
start_time = 0
end_time = 7200

[[dimensions]]
name = "InstanceId"
value = "i-1234"

[[dimensions]]
name = "ImageId"
value = "ami-111"

[[metrics]]
metric = "AWS/EC2::CPUUtilization"
statistic = "Maximum"
period = 60

[[metrics]]
metric = "AWS/EC2::NetworkIn"

[[metrics.dimensions]]
name = "ImageId"
value = "ami-999"
"#;

    #[test]
    fn definition_replays_through_the_builder() {
        let definition: ReportDefinition = toml::from_str(DEFINITION).unwrap();
        let queries = definition.into_builder().unwrap().resolve();
        assert_eq!(queries.len(), 2);

        let cpu = &queries[0];
        assert_eq!(cpu.metric.to_string(), "AWS/EC2::CPUUtilization");
        assert_eq!(cpu.statistics, vec![Statistic::Maximum]);
        assert_eq!(cpu.period, 60);
        assert_eq!(cpu.start_time, Some(0));
        assert_eq!(cpu.end_time, Some(7200));

        let network = &queries[1];
        assert_eq!(network.statistics, vec![Statistic::Average]);
        assert_eq!(network.period, 3600);
        // File order carries through, with the entry's own dimension
        // overriding the global one in place.
        let pairs: Vec<(&str, &str)> = network
            .dimensions
            .iter()
            .map(|d| (d.name.as_str(), d.value.as_str()))
            .collect();
        assert_eq!(
            pairs,
            [("InstanceId", "i-1234"), ("ImageId", "ami-999")]
        );
    }

    #[test]
    fn omitted_sections_default_to_empty() {
        let definition: ReportDefinition = toml::from_str("").unwrap();
        assert!(definition.dimensions.is_empty());
        assert!(definition.metrics.is_empty());
        assert_eq!(definition.period, None);
        let queries = definition.into_builder().unwrap().resolve();
        assert!(queries.is_empty());
    }

    #[test]
    fn malformed_metric_identifiers_surface_from_into_builder() {
        let definition: ReportDefinition = toml::from_str(
            "[[metrics]]\nmetric = \"CPUUtilization\"\n",
        )
        .unwrap();
        assert!(matches!(
            definition.into_builder(),
            Err(ReportError::MalformedMetricIdentifier { .. })
        ));
    }

    #[test]
    fn unknown_statistic_names_fail_to_parse() {
        let result: Result<ReportDefinition, _> =
            toml::from_str("[[metrics]]\nmetric = \"A::B\"\nstatistic = \"Max\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn load_definition_reads_from_disk() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("report.toml");
        fs::write(&path, DEFINITION).unwrap();
        let definition = load_definition(&path).unwrap();
        assert_eq!(definition.metrics.len(), 2);
        assert!(load_definition(&tmp.path().join("missing.toml")).is_err());
    }
}
