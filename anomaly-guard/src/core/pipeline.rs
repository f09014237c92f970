//! The detector orchestrator.

use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, info, instrument, warn};

use super::report::{AnomalyReport, RunDiagnostics};
use crate::config::ScanConfig;
use crate::dataset::{Column, Dataset};
use crate::detectors::{
    Detector, DetectorOutcome, FormatValidator, MissingValueDetector, OutlierDetector,
};
use crate::error::{DetectorError, GuardError, Result};
use crate::sources::CsvSource;

/// Runs registered detectors over every column of a dataset.
///
/// Detectors run in registration order; within a detector, columns run in
/// dataset order. A detector that fails or panics on one column loses only
/// that column's contribution.
///
/// # Examples
///
/// ```rust
/// use anomaly_guard::core::AnomalyPipeline;
/// use anomaly_guard::detectors::MissingValueDetector;
/// use anomaly_guard::sources::load_csv_str;
///
/// let dataset = load_csv_str("id,name\n1,a\n2,\n").unwrap();
/// let pipeline = AnomalyPipeline::builder()
///     .detector(MissingValueDetector::new())
///     .build();
///
/// let report = pipeline.run(&dataset);
/// assert_eq!(report.len(), 1);
/// assert_eq!(report.records()[0].column(), "name");
/// ```
#[derive(Debug)]
pub struct AnomalyPipeline {
    detectors: Vec<Box<dyn Detector>>,
}

impl AnomalyPipeline {
    /// Creates a new builder with no detectors registered.
    pub fn builder() -> AnomalyPipelineBuilder {
        AnomalyPipelineBuilder::default()
    }

    /// Builds the detector set described by `config`: missing values,
    /// outliers, then formats, each only when enabled.
    pub fn from_config(config: &ScanConfig) -> Result<Self> {
        config.validate()?;

        let mut builder = Self::builder();
        if config.detect_missing {
            builder = builder.detector(MissingValueDetector::new());
        }
        if config.detect_outliers {
            builder = builder.detector(OutlierDetector::with_config(config.outlier.clone()));
        }
        if config.detect_formats {
            builder = builder.detector(FormatValidator::new(config.format_rules.clone())?);
        }
        Ok(builder.build())
    }

    /// Registered detectors in execution order.
    pub fn detectors(&self) -> &[Box<dyn Detector>] {
        &self.detectors
    }

    /// Loads `source` and runs every detector over it.
    ///
    /// A load failure is the only error; detector failures never surface here.
    pub fn scan(&self, source: &CsvSource) -> Result<AnomalyReport> {
        let dataset = source.load()?;
        Ok(self.run(&dataset))
    }

    /// Runs every detector and returns the findings.
    pub fn run(&self, dataset: &Dataset) -> AnomalyReport {
        self.run_with_diagnostics(dataset).0
    }

    /// Runs every detector and returns the findings plus every per-pair outcome.
    #[instrument(skip(self, dataset), fields(rows = dataset.row_count(), columns = dataset.column_count()))]
    pub fn run_with_diagnostics(&self, dataset: &Dataset) -> (AnomalyReport, RunDiagnostics) {
        let mut records = Vec::new();
        let mut diagnostics = RunDiagnostics::default();

        for detector in &self.detectors {
            for column in dataset.columns() {
                let outcome = inspect_isolated(detector.as_ref(), column, dataset);

                match &outcome {
                    DetectorOutcome::Found(record) => {
                        debug!(
                            detector = detector.name(),
                            column = column.name(),
                            kind = %record.kind(),
                            "Anomaly found"
                        );
                        records.push(record.clone());
                    }
                    DetectorOutcome::Clean => {}
                    DetectorOutcome::Skipped(reason) => {
                        debug!(
                            detector = detector.name(),
                            column = column.name(),
                            reason = %reason,
                            "Detector skipped column"
                        );
                    }
                    DetectorOutcome::Failed(error) => {
                        warn!(
                            detector = detector.name(),
                            column = column.name(),
                            error = %error,
                            "Detector failed on column"
                        );
                    }
                }

                diagnostics.push(detector.name(), column.name(), outcome);
            }
        }

        info!(
            detectors = self.detectors.len(),
            anomalies = records.len(),
            failures = diagnostics.failed_count(),
            "Anomaly scan completed"
        );

        (AnomalyReport::from_records(records), diagnostics)
    }
}

impl Default for AnomalyPipeline {
    /// Missing values, isolation-forest outliers and email format checks.
    fn default() -> Self {
        Self::builder()
            .detector(MissingValueDetector::new())
            .detector(OutlierDetector::new())
            .detector(FormatValidator::default())
            .build()
    }
}

/// Runs one detector on one column, converting a panic into a failure and
/// rejecting records that name a column outside the dataset.
fn inspect_isolated(detector: &dyn Detector, column: &Column, dataset: &Dataset) -> DetectorOutcome {
    let outcome = match panic::catch_unwind(AssertUnwindSafe(|| detector.inspect(column))) {
        Ok(outcome) => outcome,
        Err(payload) => {
            let message = if let Some(s) = payload.downcast_ref::<&str>() {
                (*s).to_string()
            } else if let Some(s) = payload.downcast_ref::<String>() {
                s.clone()
            } else {
                "unknown panic".to_string()
            };
            return DetectorOutcome::Failed(DetectorError::Panicked(message));
        }
    };

    match outcome {
        DetectorOutcome::Found(record) if !dataset.contains_column(record.column()) => {
            DetectorOutcome::Failed(DetectorError::UnknownColumn(record.column().to_string()))
        }
        other => other,
    }
}

/// Builder for [`AnomalyPipeline`].
#[derive(Debug, Default)]
pub struct AnomalyPipelineBuilder {
    detectors: Vec<Box<dyn Detector>>,
}

impl AnomalyPipelineBuilder {
    /// Registers a detector after those already added.
    pub fn detector(mut self, detector: impl Detector + 'static) -> Self {
        self.detectors.push(Box::new(detector));
        self
    }

    /// Registers an already boxed detector.
    pub fn boxed_detector(mut self, detector: Box<dyn Detector>) -> Self {
        self.detectors.push(detector);
        self
    }

    pub fn build(self) -> AnomalyPipeline {
        AnomalyPipeline {
            detectors: self.detectors,
        }
    }
}

impl TryFrom<&ScanConfig> for AnomalyPipeline {
    type Error = GuardError;

    fn try_from(config: &ScanConfig) -> Result<Self> {
        Self::from_config(config)
    }
}
