//! Prelude for commonly used types and traits in anomaly-guard.

pub use crate::analyzers::{ColumnKind, ColumnStatistics};
pub use crate::config::ScanConfig;
pub use crate::core::{AnomalyPipeline, AnomalyReport, RunDiagnostics};
pub use crate::dataset::{CellValue, Column, Dataset};
pub use crate::detectors::{
    AnomalyKind, AnomalyRecord, Detector, DetectorOutcome, FormatRule, FormatValidator,
    MissingValueDetector, OutlierConfig, OutlierDetector, SkipReason,
};
pub use crate::error::{DetectorError, GuardError, LoadError, Result};
pub use crate::formatters::{FormatterConfig, ReportFormatter};
pub use crate::sources::{load_csv, load_csv_str, CsvOptions, CsvSource};
