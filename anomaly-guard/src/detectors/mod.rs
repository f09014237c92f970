//! Detectors and the anomaly records they emit.
//!
//! Every detector implements [`Detector`]. The pipeline asks a detector to
//! [`inspect`](Detector::inspect) one column at a time and receives an explicit
//! [`DetectorOutcome`]:
//!
//! - [`DetectorOutcome::Found`]: the column has a problem, described by an [`AnomalyRecord`]
//! - [`DetectorOutcome::Clean`]: the check ran and found nothing
//! - [`DetectorOutcome::Skipped`]: the check does not apply (expected, silent)
//! - [`DetectorOutcome::Failed`]: the check broke on this column (logged, non-fatal)
//!
//! ## Built-in detectors
//!
//! - [`MissingValueDetector`]: absent cells in any column
//! - [`OutlierDetector`]: isolation-forest outliers in numeric columns
//! - [`FormatValidator`]: pattern conformance for designated columns
//!
//! ## Custom detectors
//!
//! ```rust
//! use anomaly_guard::dataset::Column;
//! use anomaly_guard::detectors::{AnomalyKind, AnomalyRecord, Detector, DetectorOutcome};
//!
//! #[derive(Debug)]
//! struct BlankNameDetector;
//!
//! impl Detector for BlankNameDetector {
//!     fn name(&self) -> &str {
//!         "BlankName"
//!     }
//!
//!     fn inspect(&self, column: &Column) -> DetectorOutcome {
//!         if column.name().trim().is_empty() {
//!             DetectorOutcome::Found(AnomalyRecord::new(
//!                 AnomalyKind::Custom("BlankName".to_string()),
//!                 column.name(),
//!                 "column has a blank header",
//!             ))
//!         } else {
//!             DetectorOutcome::Clean
//!         }
//!     }
//! }
//! ```

use std::collections::BTreeMap;
use std::fmt::{self, Debug};

use serde::{Deserialize, Serialize};

use crate::analyzers::ColumnKind;
use crate::dataset::{CellValue, Column, Dataset};
use crate::error::DetectorError;

pub mod format;
pub mod isolation_forest;
pub mod missing;
pub mod outlier;

pub use format::{ColumnMatcher, FormatRule, FormatType, FormatValidator};
pub use isolation_forest::{percentile, ForestParams, IsolationForest};
pub use missing::MissingValueDetector;
pub use outlier::{OutlierConfig, OutlierDetector};

/// Upper bound on sample values and sample row indices per record.
pub const MAX_SAMPLES: usize = 3;

/// Category of a finding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnomalyKind {
    /// Absent cells.
    MissingValues,
    /// Values scored as outliers by a statistical model.
    StatisticalOutlier,
    /// Values not matching the expected pattern.
    FormatViolation,
    /// Finding from a user-supplied detector.
    Custom(String),
}

impl AnomalyKind {
    /// Human-readable label.
    pub fn label(&self) -> &str {
        match self {
            Self::MissingValues => "Missing Values",
            Self::StatisticalOutlier => "Statistical Outlier",
            Self::FormatViolation => "Format Violation",
            Self::Custom(name) => name,
        }
    }
}

impl fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Kind-specific payload attached to a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnomalyDetails {
    Missing {
        missing_count: usize,
        row_count: usize,
        missing_percentage: f64,
    },
    Outlier {
        method: String,
        percentile: f64,
        threshold: f64,
        flagged_count: usize,
        sample_count: usize,
    },
    Format {
        format: String,
        violation_count: usize,
        checked_count: usize,
    },
    Custom(BTreeMap<String, serde_json::Value>),
}

/// One normalized finding produced by a detector.
///
/// Records are built once by a detector and are read-only afterwards. Sample
/// lists are truncated to [`MAX_SAMPLES`] entries at construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalyRecord {
    kind: AnomalyKind,
    column: String,
    description: String,
    sample_values: Vec<CellValue>,
    sample_row_indices: Vec<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<AnomalyDetails>,
}

impl AnomalyRecord {
    /// Creates a record without samples or details.
    pub fn new(
        kind: AnomalyKind,
        column: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            column: column.into(),
            description: description.into(),
            sample_values: Vec::new(),
            sample_row_indices: Vec::new(),
            details: None,
        }
    }

    /// Attaches the first [`MAX_SAMPLES`] illustrative values.
    pub fn with_sample_values(mut self, values: impl IntoIterator<Item = CellValue>) -> Self {
        self.sample_values = values.into_iter().take(MAX_SAMPLES).collect();
        self
    }

    /// Attaches the first [`MAX_SAMPLES`] row indices.
    pub fn with_sample_rows(mut self, rows: impl IntoIterator<Item = usize>) -> Self {
        self.sample_row_indices = rows.into_iter().take(MAX_SAMPLES).collect();
        self
    }

    /// Attaches a kind-specific payload.
    pub fn with_details(mut self, details: AnomalyDetails) -> Self {
        self.details = Some(details);
        self
    }

    pub fn kind(&self) -> &AnomalyKind {
        &self.kind
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn sample_values(&self) -> &[CellValue] {
        &self.sample_values
    }

    pub fn sample_row_indices(&self) -> &[usize] {
        &self.sample_row_indices
    }

    pub fn details(&self) -> Option<&AnomalyDetails> {
        self.details.as_ref()
    }
}

/// Why a detector did not examine a column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// The column kind is not handled by this detector.
    UnsupportedKind { kind: ColumnKind },
    /// No rule targets this column.
    NotApplicable,
    /// Too few non-null values to fit a model.
    InsufficientSamples { required: usize, actual: usize },
    /// At most one distinct value.
    ZeroVariance,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedKind { kind } => write!(f, "unsupported column kind '{kind}'"),
            Self::NotApplicable => f.write_str("no rule applies"),
            Self::InsufficientSamples { required, actual } => {
                write!(f, "need at least {required} samples, got {actual}")
            }
            Self::ZeroVariance => f.write_str("at most one distinct value"),
        }
    }
}

/// Result of running one detector on one column.
#[derive(Debug, Clone, PartialEq)]
pub enum DetectorOutcome {
    Found(AnomalyRecord),
    Clean,
    Skipped(SkipReason),
    Failed(DetectorError),
}

impl DetectorOutcome {
    /// Returns the record for [`DetectorOutcome::Found`].
    pub fn record(&self) -> Option<&AnomalyRecord> {
        match self {
            Self::Found(record) => Some(record),
            _ => None,
        }
    }

    /// Short status label used in logs and diagnostics.
    pub fn status(&self) -> &'static str {
        match self {
            Self::Found(_) => "found",
            Self::Clean => "clean",
            Self::Skipped(_) => "skipped",
            Self::Failed(_) => "failed",
        }
    }
}

/// A data-quality check applied column by column.
///
/// Implementations must be pure: they read the column and build output,
/// nothing else. Whatever a detector returns for one column has no effect
/// on any other column.
pub trait Detector: Send + Sync + Debug {
    /// Returns the name of this detector.
    fn name(&self) -> &str;

    /// Returns a description of what this detector checks.
    fn description(&self) -> &str {
        ""
    }

    /// Examines one column.
    fn inspect(&self, column: &Column) -> DetectorOutcome;

    /// Runs the detector over every column and keeps the findings, in column order.
    fn run(&self, dataset: &Dataset) -> Vec<AnomalyRecord> {
        dataset
            .columns()
            .iter()
            .filter_map(|column| match self.inspect(column) {
                DetectorOutcome::Found(record) => Some(record),
                _ => None,
            })
            .collect()
    }
}
