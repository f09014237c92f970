//! Report formatting for anomaly scans.
//!
//! Formatters turn an [`AnomalyReport`] into JSON for machines, colourised
//! text for terminals, or Markdown for documentation.
//!
//! # Examples
//!
//! ```rust
//! use anomaly_guard::core::AnomalyPipeline;
//! use anomaly_guard::formatters::{HumanFormatter, FormatterConfig, ReportFormatter};
//! use anomaly_guard::sources::load_csv_str;
//!
//! let dataset = load_csv_str("id,email\n1,a@b.com\n2,\n").unwrap();
//! let report = AnomalyPipeline::default().run(&dataset);
//!
//! let formatter = HumanFormatter::with_config(FormatterConfig::default().with_colors(false));
//! let output = formatter.format(&report).unwrap();
//! assert!(output.contains("Missing Values"));
//! ```

use std::fmt::Write;

use crate::core::AnomalyReport;
use crate::dataset::escape_cell;
use crate::detectors::{AnomalyKind, AnomalyRecord};
use crate::error::Result;
use crate::logging::truncate_field;

/// Configuration options for formatting reports.
#[derive(Debug, Clone)]
pub struct FormatterConfig {
    /// Include sample values and row indices
    pub include_samples: bool,
    /// Include the kind-specific details payload
    pub include_details: bool,
    /// Maximum number of records to display (`None` for all)
    pub max_records: Option<usize>,
    /// Whether to use colorized output (for human formatter)
    pub use_colors: bool,
    /// Maximum rendered length of a single sample value
    pub max_value_length: usize,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            include_samples: true,
            include_details: true,
            max_records: None,
            use_colors: true,
            max_value_length: 64,
        }
    }
}

impl FormatterConfig {
    /// Only kinds, columns and descriptions.
    pub fn minimal() -> Self {
        Self {
            include_samples: false,
            include_details: false,
            max_records: None,
            use_colors: false,
            max_value_length: 32,
        }
    }

    /// Everything, with long values kept intact.
    pub fn detailed() -> Self {
        Self {
            max_value_length: 1024,
            ..Self::default()
        }
    }

    /// No colours and a bounded record count.
    pub fn ci() -> Self {
        Self {
            include_samples: true,
            include_details: false,
            max_records: Some(50),
            use_colors: false,
            max_value_length: 64,
        }
    }

    /// Sets whether to include samples.
    pub fn with_samples(mut self, include: bool) -> Self {
        self.include_samples = include;
        self
    }

    /// Sets whether to include details.
    pub fn with_details(mut self, include: bool) -> Self {
        self.include_details = include;
        self
    }

    /// Sets the maximum number of records to display.
    pub fn with_max_records(mut self, max: usize) -> Self {
        self.max_records = Some(max);
        self
    }

    /// Sets whether to use colorized output.
    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    fn visible<'a>(&self, report: &'a AnomalyReport) -> &'a [AnomalyRecord] {
        let records = report.records();
        match self.max_records {
            Some(max) => &records[..max.min(records.len())],
            None => records,
        }
    }

    fn render_samples(&self, record: &AnomalyRecord) -> String {
        record
            .sample_values()
            .iter()
            .map(|value| truncate_field(&value.to_string(), self.max_value_length))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Trait for rendering an [`AnomalyReport`].
///
/// # Examples
///
/// ```rust
/// use anomaly_guard::core::AnomalyReport;
/// use anomaly_guard::formatters::ReportFormatter;
///
/// struct CountFormatter;
///
/// impl ReportFormatter for CountFormatter {
///     fn format(&self, report: &AnomalyReport) -> anomaly_guard::error::Result<String> {
///         Ok(format!("{} anomalies", report.len()))
///     }
/// }
/// ```
pub trait ReportFormatter {
    /// Formats a report.
    fn format(&self, report: &AnomalyReport) -> Result<String>;

    /// Formats a report with custom configuration.
    fn format_with_config(
        &self,
        report: &AnomalyReport,
        _config: &FormatterConfig,
    ) -> Result<String> {
        self.format(report)
    }
}

/// Formats reports as a JSON array of records.
#[derive(Debug, Clone)]
pub struct JsonFormatter {
    config: FormatterConfig,
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a pretty-printing JSON formatter that includes everything.
    pub fn new() -> Self {
        Self {
            config: FormatterConfig::default(),
            pretty: true,
        }
    }

    pub fn with_config(config: FormatterConfig) -> Self {
        Self {
            config,
            pretty: true,
        }
    }

    /// Sets whether to use pretty-printed JSON.
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    fn serialize<T: serde::Serialize>(&self, value: &T) -> Result<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        Ok(json)
    }
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportFormatter for JsonFormatter {
    fn format(&self, report: &AnomalyReport) -> Result<String> {
        self.format_with_config(report, &self.config)
    }

    fn format_with_config(
        &self,
        report: &AnomalyReport,
        config: &FormatterConfig,
    ) -> Result<String> {
        let unfiltered =
            config.include_samples && config.include_details && config.max_records.is_none();
        if unfiltered {
            return self.serialize(report);
        }

        let mut records = Vec::new();
        for record in config.visible(report) {
            let mut value = serde_json::to_value(record)?;
            if let Some(object) = value.as_object_mut() {
                if !config.include_samples {
                    object.remove("sample_values");
                    object.remove("sample_row_indices");
                }
                if !config.include_details {
                    object.remove("details");
                }
            }
            records.push(value);
        }
        self.serialize(&records)
    }
}

/// Formats reports for terminals.
#[derive(Debug, Clone)]
pub struct HumanFormatter {
    config: FormatterConfig,
}

impl HumanFormatter {
    pub fn new() -> Self {
        Self {
            config: FormatterConfig::default(),
        }
    }

    pub fn with_config(config: FormatterConfig) -> Self {
        Self { config }
    }
}

impl Default for HumanFormatter {
    fn default() -> Self {
        Self::new()
    }
}

fn kind_color(kind: &AnomalyKind) -> &'static str {
    match kind {
        AnomalyKind::MissingValues => "\x1b[33m",
        AnomalyKind::StatisticalOutlier => "\x1b[35m",
        AnomalyKind::FormatViolation => "\x1b[31m",
        AnomalyKind::Custom(_) => "\x1b[36m",
    }
}

impl ReportFormatter for HumanFormatter {
    fn format(&self, report: &AnomalyReport) -> Result<String> {
        self.format_with_config(report, &self.config)
    }

    fn format_with_config(
        &self,
        report: &AnomalyReport,
        config: &FormatterConfig,
    ) -> Result<String> {
        let mut output = String::new();

        writeln!(output).unwrap();
        if report.is_empty() {
            if config.use_colors {
                writeln!(output, "✅ \x1b[32mNo anomalies found\x1b[0m").unwrap();
            } else {
                writeln!(output, "✅ No anomalies found").unwrap();
            }
            writeln!(output).unwrap();
            return Ok(output);
        }

        let noun = if report.len() == 1 { "anomaly" } else { "anomalies" };
        if config.use_colors {
            writeln!(output, "🔍 \x1b[1m{} {noun} found\x1b[0m", report.len()).unwrap();
        } else {
            writeln!(output, "🔍 {} {noun} found", report.len()).unwrap();
        }

        let visible = config.visible(report);
        for (i, record) in visible.iter().enumerate() {
            writeln!(output).unwrap();
            if config.use_colors {
                writeln!(
                    output,
                    "   #{} {}{}\x1b[0m in '{}'",
                    i + 1,
                    kind_color(record.kind()),
                    record.kind(),
                    record.column()
                )
                .unwrap();
            } else {
                writeln!(
                    output,
                    "   #{} {} in '{}'",
                    i + 1,
                    record.kind(),
                    record.column()
                )
                .unwrap();
            }
            writeln!(output, "      {}", record.description()).unwrap();

            if config.include_samples {
                if !record.sample_values().is_empty() {
                    writeln!(output, "      Samples: {}", config.render_samples(record)).unwrap();
                }
                if !record.sample_row_indices().is_empty() {
                    writeln!(output, "      Rows: {:?}", record.sample_row_indices()).unwrap();
                }
            }
        }

        if report.len() > visible.len() {
            writeln!(output).unwrap();
            writeln!(
                output,
                "   ... and {} more anomalies",
                report.len() - visible.len()
            )
            .unwrap();
        }

        writeln!(output).unwrap();
        Ok(output)
    }
}

/// Formats reports as Markdown.
#[derive(Debug, Clone)]
pub struct MarkdownFormatter {
    config: FormatterConfig,
    heading_level: u8,
}

impl MarkdownFormatter {
    pub fn new() -> Self {
        Self {
            config: FormatterConfig::default(),
            heading_level: 2,
        }
    }

    pub fn with_config(config: FormatterConfig) -> Self {
        Self {
            config,
            heading_level: 2,
        }
    }

    /// Sets the base heading level for the output.
    pub fn with_heading_level(mut self, level: u8) -> Self {
        self.heading_level = level.clamp(1, 5);
        self
    }
}

impl Default for MarkdownFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportFormatter for MarkdownFormatter {
    fn format(&self, report: &AnomalyReport) -> Result<String> {
        self.format_with_config(report, &self.config)
    }

    fn format_with_config(
        &self,
        report: &AnomalyReport,
        config: &FormatterConfig,
    ) -> Result<String> {
        let mut output = String::new();
        let h = "#".repeat(self.heading_level as usize);

        writeln!(output, "{h} Anomaly Report").unwrap();
        writeln!(output).unwrap();

        if report.is_empty() {
            writeln!(output, "No anomalies found.").unwrap();
            return Ok(output);
        }

        writeln!(output, "**Anomalies:** {}", report.len()).unwrap();
        writeln!(output).unwrap();

        let visible = config.visible(report);
        if config.include_samples {
            writeln!(output, "| # | Kind | Column | Description | Samples | Rows |").unwrap();
            writeln!(output, "|---|------|--------|-------------|---------|------|").unwrap();
        } else {
            writeln!(output, "| # | Kind | Column | Description |").unwrap();
            writeln!(output, "|---|------|--------|-------------|").unwrap();
        }

        for (i, record) in visible.iter().enumerate() {
            write!(
                output,
                "| {} | {} | `{}` | {} |",
                i + 1,
                record.kind(),
                escape_cell(record.column()),
                escape_cell(record.description())
            )
            .unwrap();
            if config.include_samples {
                let rows = record
                    .sample_row_indices()
                    .iter()
                    .map(|row| row.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(
                    output,
                    " {} | {} |",
                    escape_cell(&config.render_samples(record)),
                    rows
                )
                .unwrap();
            }
            writeln!(output).unwrap();
        }

        if report.len() > visible.len() {
            writeln!(output).unwrap();
            writeln!(
                output,
                "_{} more anomalies not shown._",
                report.len() - visible.len()
            )
            .unwrap();
        }

        if config.include_details {
            let with_details: Vec<_> = visible
                .iter()
                .enumerate()
                .filter_map(|(i, record)| record.details().map(|d| (i, record, d)))
                .collect();
            if !with_details.is_empty() {
                writeln!(output).unwrap();
                writeln!(output, "{h}# Details").unwrap();
                for (i, record, details) in with_details {
                    writeln!(output).unwrap();
                    writeln!(output, "{h}## {}. {} in `{}`", i + 1, record.kind(), record.column())
                        .unwrap();
                    writeln!(output).unwrap();
                    writeln!(output, "```json").unwrap();
                    writeln!(output, "{}", serde_json::to_string_pretty(details)?).unwrap();
                    writeln!(output, "```").unwrap();
                }
            }
        }

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::CellValue;
    use crate::detectors::AnomalyDetails;

    fn sample_report() -> AnomalyReport {
        AnomalyReport::from_records(vec![
            AnomalyRecord::new(
                AnomalyKind::MissingValues,
                "age",
                "3 (30.00%) missing values found.",
            )
            .with_sample_rows(vec![1, 4, 7])
            .with_details(AnomalyDetails::Missing {
                missing_count: 3,
                row_count: 10,
                missing_percentage: 30.0,
            }),
            AnomalyRecord::new(
                AnomalyKind::FormatViolation,
                "email",
                "1 rows with invalid email format found.",
            )
            .with_sample_values(vec![CellValue::from("not|an-email")])
            .with_sample_rows(vec![1]),
        ])
    }

    #[test]
    fn test_json_formatter_full() {
        let output = JsonFormatter::new().format(&sample_report()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 2);
        assert_eq!(parsed[0]["details"]["missing_count"], 3);
        assert_eq!(parsed[1]["sample_values"][0], "not|an-email");
    }

    #[test]
    fn test_json_formatter_minimal() {
        let formatter = JsonFormatter::with_config(FormatterConfig::minimal().with_max_records(1))
            .with_pretty(false);
        let output = formatter.format(&sample_report()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 1);
        assert!(parsed[0].get("details").is_none());
        assert!(parsed[0].get("sample_values").is_none());
        assert!(!output.contains('\n'));
    }

    #[test]
    fn test_human_formatter() {
        let formatter = HumanFormatter::with_config(FormatterConfig::default().with_colors(false));
        let output = formatter.format(&sample_report()).unwrap();
        assert!(output.contains("2 anomalies found"));
        assert!(output.contains("#1 Missing Values in 'age'"));
        assert!(output.contains("Rows: [1, 4, 7]"));
        assert!(output.contains("Samples: not|an-email"));
        assert!(!output.contains("\x1b["));
    }

    #[test]
    fn test_human_formatter_empty_and_truncated() {
        let formatter = HumanFormatter::with_config(FormatterConfig::minimal());
        let output = formatter.format(&AnomalyReport::default()).unwrap();
        assert!(output.contains("No anomalies found"));

        let formatter = HumanFormatter::with_config(FormatterConfig::minimal().with_max_records(1));
        let output = formatter.format(&sample_report()).unwrap();
        assert!(output.contains("... and 1 more anomalies"));
    }

    #[test]
    fn test_markdown_formatter() {
        let output = MarkdownFormatter::new().format(&sample_report()).unwrap();
        assert!(output.starts_with("## Anomaly Report"));
        assert!(output.contains("| 2 | Format Violation | `email` |"));
        assert!(output.contains("not\\|an-email"));
        assert!(output.contains("### Details"));
        assert!(output.contains("\"missing_count\": 3"));
    }

    #[test]
    fn test_markdown_heading_level() {
        let output = MarkdownFormatter::new()
            .with_heading_level(9)
            .format(&AnomalyReport::default())
            .unwrap();
        assert!(output.starts_with("##### Anomaly Report"));
        assert!(output.contains("No anomalies found."));
    }
}
