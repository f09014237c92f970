//! Statistical outlier detection for numeric columns.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::isolation_forest::{percentile, ForestParams, IsolationForest};
use super::{AnomalyDetails, AnomalyKind, AnomalyRecord, Detector, DetectorOutcome, SkipReason};
use crate::dataset::Column;
use crate::error::DetectorError;

const METHOD: &str = "Isolation Forest";

/// Settings for [`OutlierDetector`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutlierConfig {
    /// Values whose decision score falls strictly below this percentile of
    /// all scores are flagged. Default: 5.0.
    pub percentile: f64,
    /// Seed for the forest. Default: 42.
    pub seed: u64,
    /// Number of trees. Default: 100.
    pub n_estimators: usize,
    /// Subsample size per tree. `None` means `min(256, n)`.
    pub max_samples: Option<usize>,
    /// Minimum non-null values required to fit. Default: 2.
    pub min_samples: usize,
}

impl Default for OutlierConfig {
    fn default() -> Self {
        Self {
            percentile: 5.0,
            seed: 42,
            n_estimators: 100,
            max_samples: None,
            min_samples: 2,
        }
    }
}

impl OutlierConfig {
    /// Sets the flagging percentile.
    pub fn with_percentile(mut self, percentile: f64) -> Self {
        self.percentile = percentile;
        self
    }

    /// Sets the forest seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the number of trees.
    pub fn with_n_estimators(mut self, n: usize) -> Self {
        self.n_estimators = n;
        self
    }

    /// Checks every parameter range.
    pub fn validate(&self) -> Result<(), DetectorError> {
        if !(self.percentile > 0.0 && self.percentile <= 100.0) {
            return Err(DetectorError::invalid_parameter(
                "percentile",
                format!("must be in (0, 100], got {}", self.percentile),
            ));
        }
        if self.n_estimators == 0 {
            return Err(DetectorError::invalid_parameter(
                "n_estimators",
                "must be at least 1",
            ));
        }
        if self.max_samples == Some(0) {
            return Err(DetectorError::invalid_parameter(
                "max_samples",
                "must be at least 1",
            ));
        }
        if self.min_samples < 2 {
            return Err(DetectorError::invalid_parameter(
                "min_samples",
                format!("must be at least 2, got {}", self.min_samples),
            ));
        }
        Ok(())
    }

    fn forest_params(&self) -> ForestParams {
        ForestParams {
            n_estimators: self.n_estimators,
            max_samples: self.max_samples,
            seed: self.seed,
        }
    }
}

/// Flags numeric values an isolation forest finds easy to isolate.
///
/// Each numeric column is scored independently on its non-null values. A
/// value is flagged when its decision score is strictly below the configured
/// percentile of the column's scores, so ties at the threshold stay unflagged.
#[derive(Debug, Clone, Default)]
pub struct OutlierDetector {
    config: OutlierConfig,
}

impl OutlierDetector {
    /// Creates a detector with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a detector with the given settings.
    pub fn with_config(config: OutlierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OutlierConfig {
        &self.config
    }

    fn score(&self, column: &Column, samples: &[(usize, f64)]) -> Result<DetectorOutcome, DetectorError> {
        self.config.validate()?;

        let values: Vec<f64> = samples.iter().map(|(_, v)| *v).collect();
        let forest = IsolationForest::fit(&values, &self.config.forest_params())?;
        let scores = forest.decision_function(&values);
        let threshold = percentile(&scores, self.config.percentile).ok_or_else(|| {
            DetectorError::degenerate("cannot compute a percentile of zero scores")
        })?;

        let flagged: Vec<usize> = samples
            .iter()
            .zip(&scores)
            .filter(|(_, score)| **score < threshold)
            .map(|((row, _), _)| *row)
            .collect();

        debug!(
            column = %column.name(),
            samples = values.len(),
            flagged = flagged.len(),
            threshold,
            "Scored column"
        );

        if flagged.is_empty() {
            return Ok(DetectorOutcome::Clean);
        }

        let description = format!(
            "Potential outliers detected using {METHOD}: {} of {} values score below the {} percentile of anomaly scores (threshold {threshold:.4}).",
            flagged.len(),
            values.len(),
            ordinal(self.config.percentile),
        );

        let record = AnomalyRecord::new(AnomalyKind::StatisticalOutlier, column.name(), description)
            .with_sample_values(flagged.iter().filter_map(|&row| column.value(row)))
            .with_sample_rows(flagged.iter().copied())
            .with_details(AnomalyDetails::Outlier {
                method: METHOD.to_string(),
                percentile: self.config.percentile,
                threshold,
                flagged_count: flagged.len(),
                sample_count: values.len(),
            });

        Ok(DetectorOutcome::Found(record))
    }
}

impl Detector for OutlierDetector {
    fn name(&self) -> &str {
        "IsolationForest"
    }

    fn description(&self) -> &str {
        "Detects numeric outliers with an isolation forest"
    }

    #[instrument(skip(self, column), fields(column = %column.name()))]
    fn inspect(&self, column: &Column) -> DetectorOutcome {
        if !column.kind().is_numeric() {
            return DetectorOutcome::Skipped(SkipReason::UnsupportedKind {
                kind: column.kind(),
            });
        }

        let samples = match column.numeric_values() {
            Ok(samples) => samples,
            Err(e) => return DetectorOutcome::Failed(e),
        };

        if column.distinct_count() <= 1 {
            return DetectorOutcome::Skipped(SkipReason::ZeroVariance);
        }
        if samples.len() < self.config.min_samples {
            return DetectorOutcome::Skipped(SkipReason::InsufficientSamples {
                required: self.config.min_samples,
                actual: samples.len(),
            });
        }

        self.score(column, &samples)
            .unwrap_or_else(DetectorOutcome::Failed)
    }
}

/// Renders a percentile as an ordinal ("5th", "1st", "12.5th").
fn ordinal(value: f64) -> String {
    if value.fract() != 0.0 {
        return format!("{value}th");
    }
    let n = value as u64;
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::ColumnKind;
    use crate::dataset::CellValue;
    use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
    use std::sync::Arc;

    fn int_column(name: &str, values: Vec<Option<i64>>) -> Column {
        Column::new(name, Arc::new(Int64Array::from(values)) as ArrayRef)
    }

    #[test]
    fn test_flags_single_extreme_value() {
        let column = int_column(
            "amount",
            [1, 2, 2, 3, 2, 1, 2, 3, 2, 100].into_iter().map(Some).collect(),
        );
        let outcome = OutlierDetector::new().inspect(&column);

        let record = outcome.record().expect("expected outliers");
        assert_eq!(record.kind(), &AnomalyKind::StatisticalOutlier);
        assert_eq!(record.sample_row_indices(), &[9]);
        assert_eq!(record.sample_values(), &[CellValue::Integer(100)]);
        assert!(record.description().contains("Isolation Forest"));
        assert!(record.description().contains("5th percentile"));
    }

    #[test]
    fn test_row_indices_refer_to_original_rows() {
        let column = int_column(
            "amount",
            vec![
                None,
                Some(1),
                Some(2),
                None,
                Some(2),
                Some(3),
                Some(2),
                Some(1),
                Some(2),
                Some(3),
                Some(2),
                Some(100),
            ],
        );
        let outcome = OutlierDetector::new().inspect(&column);
        let record = outcome.record().unwrap();
        assert_eq!(record.sample_row_indices(), &[11]);
    }

    #[test]
    fn test_constant_column_is_skipped() {
        let column = int_column("flag", vec![Some(7); 20]);
        assert_eq!(
            OutlierDetector::new().inspect(&column),
            DetectorOutcome::Skipped(SkipReason::ZeroVariance)
        );
    }

    #[test]
    fn test_single_value_is_skipped() {
        let column = int_column("x", vec![Some(1), None, None]);
        assert_eq!(
            OutlierDetector::new().inspect(&column),
            DetectorOutcome::Skipped(SkipReason::ZeroVariance)
        );
    }

    #[test]
    fn test_categorical_column_is_skipped() {
        let column = Column::new(
            "city",
            Arc::new(StringArray::from(vec!["a", "b", "c"])) as ArrayRef,
        );
        assert_eq!(
            OutlierDetector::new().inspect(&column),
            DetectorOutcome::Skipped(SkipReason::UnsupportedKind {
                kind: ColumnKind::Categorical
            })
        );
    }

    #[test]
    fn test_two_distinct_values_is_clean() {
        let column = int_column("pair", vec![Some(1), Some(2)]);
        // Both values score the same, so nothing is strictly below the threshold.
        assert_eq!(OutlierDetector::new().inspect(&column), DetectorOutcome::Clean);
    }

    #[test]
    fn test_non_finite_values_fail() {
        let column = Column::new(
            "ratio",
            Arc::new(Float64Array::from(vec![1.0, 2.0, f64::INFINITY, 3.0])) as ArrayRef,
        );
        assert!(matches!(
            OutlierDetector::new().inspect(&column),
            DetectorOutcome::Failed(DetectorError::DegenerateInput(_))
        ));
    }

    #[test]
    fn test_overflowing_range_fails_without_panicking() {
        let column = Column::new(
            "x",
            Arc::new(Float64Array::from(vec![-1e308, 1e308, 0.0, 1.0])) as ArrayRef,
        );
        assert!(matches!(
            OutlierDetector::new().inspect(&column),
            DetectorOutcome::Failed(DetectorError::DegenerateInput(_))
        ));
    }

    #[test]
    fn test_invalid_config_fails() {
        let detector = OutlierDetector::with_config(OutlierConfig::default().with_percentile(0.0));
        let column = int_column("x", vec![Some(1), Some(2), Some(3)]);
        assert!(matches!(
            detector.inspect(&column),
            DetectorOutcome::Failed(DetectorError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_deterministic_across_runs() {
        let values: Vec<Option<i64>> = (0..200).map(|i| Some((i * 37) % 101)).collect();
        let column = int_column("v", values);
        let a = OutlierDetector::new().inspect(&column);
        let b = OutlierDetector::new().inspect(&column);
        assert_eq!(a, b);
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: OutlierConfig = serde_json::from_str(r#"{"percentile": 1.0}"#).unwrap();
        assert_eq!(config.percentile, 1.0);
        assert_eq!(config.seed, 42);
        assert!(serde_json::from_str::<OutlierConfig>(r#"{"percentil": 1.0}"#).is_err());
    }

    #[test]
    fn test_ordinal() {
        assert_eq!(ordinal(5.0), "5th");
        assert_eq!(ordinal(1.0), "1st");
        assert_eq!(ordinal(2.0), "2nd");
        assert_eq!(ordinal(23.0), "23rd");
        assert_eq!(ordinal(11.0), "11th");
        assert_eq!(ordinal(2.5), "2.5th");
    }
}
