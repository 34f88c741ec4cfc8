//! Presentation of an assembled report: themed terminal table or CSV.

use std::borrow::Cow;
use std::io::{self, BufWriter, Write};

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use crate::builder::ResolvedQuery;
use crate::report::{ReportTable, DATE_TIME_COLUMN};

/// Render the report as a terminal table, one row per bucket.
pub fn render_table(report: &ReportTable) -> Table {
    let mut table = themed_table();
    let mut header = vec![DATE_TIME_COLUMN];
    header.extend(report.columns.iter().map(|column| column.name.as_str()));
    table.set_header(header_cells(&header));
    for timestamp in &report.timestamps {
        let mut row = vec![label_cell(timestamp)];
        for column in &report.columns {
            row.push(value_cell(format_number(column.value(timestamp))));
        }
        table.add_row(row);
    }
    table
}

/// Render resolved queries as a terminal table, one row per query.
pub fn render_queries(queries: &[ResolvedQuery]) -> Table {
    let mut table = themed_table();
    table.set_header(header_cells(&[
        "Metric",
        "Statistics",
        "Period",
        "Start Time",
        "End Time",
        "Dimensions",
    ]));
    for query in queries {
        let statistics: Vec<String> = query.statistics.iter().map(|s| s.to_string()).collect();
        let dimensions: Vec<String> = query
            .dimensions
            .iter()
            .map(|d| format!("{}={}", d.name, d.value))
            .collect();
        table.add_row(vec![
            label_cell(&query.metric.to_string()),
            Cell::new(statistics.join(", ")),
            value_cell(query.period),
            epoch_cell(query.start_time),
            epoch_cell(query.end_time),
            if dimensions.is_empty() {
                Cell::new("--")
            } else {
                Cell::new(dimensions.join(", "))
            },
        ]);
    }
    table
}

/// Write the report as CSV, one record per bucket. Empty buckets become
/// empty fields; values are written at full precision.
pub fn write_csv(report: &ReportTable, writer: impl Write) -> io::Result<()> {
    let mut out = BufWriter::new(writer);

    let mut header: Vec<Cow<'_, str>> = vec![Cow::Borrowed(DATE_TIME_COLUMN)];
    header.extend(report.columns.iter().map(|column| csv_field(&column.name)));
    write_record(&mut out, &header)?;

    for timestamp in &report.timestamps {
        let mut record: Vec<Cow<'_, str>> = vec![csv_field(timestamp)];
        for column in &report.columns {
            record.push(match column.value(timestamp) {
                Some(value) => Cow::Owned(value.to_string()),
                None => Cow::Borrowed(""),
            });
        }
        write_record(&mut out, &record)?;
    }
    out.flush()
}

fn write_record(out: &mut impl Write, fields: &[Cow<'_, str>]) -> io::Result<()> {
    for (index, field) in fields.iter().enumerate() {
        if index > 0 {
            out.write_all(b",")?;
        }
        out.write_all(field.as_bytes())?;
    }
    out.write_all(b"\n")
}

fn csv_field(value: &str) -> Cow<'_, str> {
    if value.contains(['"', ',', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

fn format_number(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.2}"),
        None => "--".to_string(),
    }
}

fn themed_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn header_cells(labels: &[&str]) -> Vec<Cell> {
    labels
        .iter()
        .map(|label| {
            Cell::new(*label)
                .add_attribute(Attribute::Bold)
                .fg(Color::Cyan)
        })
        .collect()
}

fn epoch_cell(value: Option<i64>) -> Cell {
    match value {
        Some(timestamp) => value_cell(timestamp),
        None => value_cell("--"),
    }
}

fn label_cell(text: &str) -> Cell {
    Cell::new(text).add_attribute(Attribute::Bold)
}

fn value_cell<T: std::fmt::Display>(value: T) -> Cell {
    Cell::new(value.to_string()).set_alignment(CellAlignment::Right)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ReportBuilder;
    use crate::client::{Datapoint, ReplayClient, Series};

    fn sample_table(label: &str) -> ReportTable {
        let mut client = ReplayClient::default();
        client.insert(
            "AWS/EC2::CPUUtilization",
            Series {
                label: label.to_string(),
                datapoints: vec![Datapoint {
                    timestamp: 0,
                    value: 1.5,
                    unit: "Percent".to_string(),
                }],
            },
        );
        ReportBuilder::new()
            .start_time(0)
            .end_time(7200)
            .add_metric("AWS/EC2::CPUUtilization")
            .unwrap()
            .run(&client)
            .unwrap()
    }

    #[test]
    fn csv_is_rectangular_with_empty_cells_for_missing_buckets() {
        let report = sample_table("CPUUtilization");
        let mut buffer = Vec::new();
        write_csv(&report, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(
            text,
            "Date Time,CPUUtilization (Percent)\n\
             1970-01-01T00:00:00Z,1.5\n\
             1970-01-01T01:00:00Z,\n"
        );
    }

    #[test]
    fn csv_quotes_fields_containing_separators() {
        let report = sample_table("CPU, total");
        let mut buffer = Vec::new();
        write_csv(&report, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let header = text.lines().next().unwrap();
        assert_eq!(header, "Date Time,\"CPU, total (Percent)\"");
    }

    #[test]
    fn csv_field_escapes_embedded_quotes() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a\"b"), "\"a\"\"b\"");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
    }

    #[test]
    fn table_lists_every_bucket_with_placeholders() {
        let report = sample_table("CPUUtilization");
        let rendered = render_table(&report).to_string();
        assert!(rendered.contains("Date Time"));
        assert!(rendered.contains("CPUUtilization (Percent)"));
        assert!(rendered.contains("1970-01-01T00:00:00Z"));
        assert!(rendered.contains("1.50"));
        assert!(rendered.contains("--"));
    }

    #[test]
    fn query_table_shows_parameters_and_placeholders() {
        use crate::metric::Statistic;

        let queries = ReportBuilder::new()
            .add_dimension("InstanceId", "i-1234")
            .start_time(100)
            .add_metric("AWS/EC2::CPUUtilization")
            .unwrap()
            .begin()
            .statistic(Statistic::Maximum)
            .end()
            .resolve();
        let rendered = render_queries(&queries).to_string();
        assert!(rendered.contains("AWS/EC2::CPUUtilization"));
        assert!(rendered.contains("Maximum"));
        assert!(rendered.contains("InstanceId=i-1234"));
        // End time was never set.
        assert!(rendered.contains("--"));
    }
}
