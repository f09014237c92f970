//! Per-column statistics handed to the explanation collaborator.
//!
//! Statistics are computed on demand from the live dataset and are never
//! cached on an [`AnomalyRecord`](crate::detectors::AnomalyRecord).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::analyzers::ColumnKind;
use crate::dataset::{Column, Dataset};
use crate::error::{GuardError, Result};

/// Number of most frequent values reported for categorical columns.
pub const TOP_VALUES_LIMIT: usize = 5;

/// A value and how often it occurs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
}

/// Statistics bundle for one column, shaped by its [`ColumnKind`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnStatistics {
    /// Summary of a numeric column. Moments are `None` when undefined.
    Numeric {
        min: Option<f64>,
        max: Option<f64>,
        mean: Option<f64>,
        /// Sample standard deviation (n - 1 denominator).
        std_dev: Option<f64>,
        distinct_count: usize,
    },
    /// Summary of a categorical or text column.
    Categorical {
        distinct_count: usize,
        /// Up to five most frequent values, most frequent first.
        top_values: Vec<ValueCount>,
    },
    /// No statistics are available for unclassified columns.
    Unknown,
}

impl ColumnStatistics {
    /// Computes statistics for `column_name` in `dataset`.
    #[instrument(skip(dataset))]
    pub fn compute(dataset: &Dataset, column_name: &str) -> Result<Self> {
        let column = dataset
            .column(column_name)
            .ok_or_else(|| GuardError::column_not_found(column_name))?;
        Self::for_column(column)
    }

    /// Computes statistics for a single column.
    pub fn for_column(column: &Column) -> Result<Self> {
        let stats = match column.kind() {
            ColumnKind::Numeric => {
                let values: Vec<f64> = column
                    .numeric_values()?
                    .into_iter()
                    .map(|(_, v)| v)
                    .collect();
                numeric_summary(&values, column.distinct_count())
            }
            ColumnKind::Categorical => categorical_summary(column),
            ColumnKind::Unknown => Self::Unknown,
        };
        debug!(column = column.name(), kind = %column.kind(), "Computed column statistics");
        Ok(stats)
    }

    /// Distinct non-null value count, when defined.
    pub fn distinct_count(&self) -> Option<usize> {
        match self {
            Self::Numeric { distinct_count, .. } | Self::Categorical { distinct_count, .. } => {
                Some(*distinct_count)
            }
            Self::Unknown => None,
        }
    }
}

fn numeric_summary(values: &[f64], distinct_count: usize) -> ColumnStatistics {
    if values.is_empty() {
        return ColumnStatistics::Numeric {
            min: None,
            max: None,
            mean: None,
            std_dev: None,
            distinct_count,
        };
    }

    let n = values.len() as f64;
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mean = values.iter().sum::<f64>() / n;
    let std_dev = if values.len() > 1 {
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
        Some(variance.sqrt())
    } else {
        None
    };

    ColumnStatistics::Numeric {
        min: Some(min),
        max: Some(max),
        mean: Some(mean),
        std_dev,
        distinct_count,
    }
}

fn categorical_summary(column: &Column) -> ColumnStatistics {
    // Count while remembering first appearance so ties are broken by row order.
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    for row in 0..column.len() {
        if let Some(text) = column.text(row) {
            counts.entry(text).or_insert((0, row)).0 += 1;
        }
    }

    let distinct_count = counts.len();
    let mut ranked: Vec<(String, usize, usize)> = counts
        .into_iter()
        .map(|(value, (count, first_row))| (value, count, first_row))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

    let top_values = ranked
        .into_iter()
        .take(TOP_VALUES_LIMIT)
        .map(|(value, count, _)| ValueCount { value, count })
        .collect();

    ColumnStatistics::Categorical {
        distinct_count,
        top_values,
    }
}
