//! Error types for the anomaly-guard library.
//!
//! Errors are split by how far they propagate:
//!
//! - [`LoadError`] is fatal to a run. A dataset that fails to load produces no
//!   report at all.
//! - [`DetectorError`] is scoped to one (detector, column) pair. The pipeline
//!   logs it and keeps going; it never reaches the caller as an `Err`.
//! - [`GuardError`] is the crate-level error returned by the public API
//!   (loading, configuration, formatting, statistics lookups).

use thiserror::Error;

/// Errors raised while turning a raw tabular source into a [`Dataset`](crate::dataset::Dataset).
#[derive(Error, Debug)]
pub enum LoadError {
    /// The source path does not exist.
    #[error("Source not found: {path}")]
    NotFound { path: String },

    /// The source contained no header row.
    #[error("Source is empty: {source_name}")]
    Empty { source_name: String },

    /// The source could not be parsed as delimited text.
    #[error("Failed to parse {source_name}: {message}")]
    Malformed {
        /// Human-readable name of the source (path or "<memory>")
        source_name: String,
        /// Detailed error message
        message: String,
        /// Optional underlying parser error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Reading the source failed.
    #[error("IO error reading {source_name}: {error}")]
    Io {
        source_name: String,
        #[source]
        error: std::io::Error,
    },
}

impl LoadError {
    /// Creates a malformed-input error without an underlying cause.
    pub fn malformed(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Malformed {
            source_name: source_name.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Creates a malformed-input error wrapping the parser error.
    pub fn malformed_with_source(
        source_name: impl Into<String>,
        message: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::Malformed {
            source_name: source_name.into(),
            message: message.into(),
            source: Some(source),
        }
    }
}

/// A failure of one detector on one column.
///
/// These never abort a run; the pipeline records them as
/// [`DetectorOutcome::Failed`](crate::detectors::DetectorOutcome::Failed).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DetectorError {
    /// The model rejected the input (non-finite values, empty subsample, ...).
    #[error("Degenerate input: {0}")]
    DegenerateInput(String),

    /// A detector parameter is outside its valid range.
    #[error("Invalid parameter '{name}': {message}")]
    InvalidParameter { name: String, message: String },

    /// Arrow failed while extracting column values.
    #[error("Arrow computation failed: {0}")]
    Arrow(String),

    /// The detector panicked; the payload message is preserved when available.
    #[error("Detector panicked: {0}")]
    Panicked(String),

    /// The detector emitted a record for a column the dataset does not have.
    #[error("Record names unknown column '{0}'")]
    UnknownColumn(String),
}

impl DetectorError {
    /// Creates a degenerate-input error with the given message.
    pub fn degenerate(msg: impl Into<String>) -> Self {
        Self::DegenerateInput(msg.into())
    }

    /// Creates an invalid-parameter error.
    pub fn invalid_parameter(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            message: message.into(),
        }
    }
}

impl From<arrow::error::ArrowError> for DetectorError {
    fn from(err: arrow::error::ArrowError) -> Self {
        Self::Arrow(err.to_string())
    }
}

/// The main error type for the anomaly-guard library.
#[derive(Error, Debug)]
pub enum GuardError {
    /// The dataset could not be loaded.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// Error from Arrow operations outside of a single detector.
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Error from I/O operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error related to configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Error from serialization/deserialization operations.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Column values could not be extracted.
    #[error("Detector error: {0}")]
    Detector(#[from] DetectorError),

    /// A requested column does not exist in the dataset.
    #[error("Column '{column}' not found in dataset")]
    ColumnNotFound { column: String },

    /// The external explanation collaborator failed.
    #[error("Explanation failed: {0}")]
    Explanation(String),
}

impl From<serde_json::Error> for GuardError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl GuardError {
    /// Creates a configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Creates a column-not-found error.
    pub fn column_not_found(column: impl Into<String>) -> Self {
        Self::ColumnNotFound {
            column: column.into(),
        }
    }

    /// Returns `true` if this error came from loading the dataset.
    pub fn is_load_error(&self) -> bool {
        matches!(self, Self::Load(_))
    }
}

/// A type alias for `Result<T, GuardError>`.
pub type Result<T> = std::result::Result<T, GuardError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_not_found_message() {
        let err = LoadError::NotFound {
            path: "data/missing.csv".to_string(),
        };
        assert_eq!(err.to_string(), "Source not found: data/missing.csv");
    }

    #[test]
    fn test_malformed_preserves_source() {
        let source = std::io::Error::new(std::io::ErrorKind::InvalidData, "bad row");
        let err = LoadError::malformed_with_source("users.csv", "row 3", Box::new(source));
        assert!(err.source().is_some());
        assert_eq!(err.to_string(), "Failed to parse users.csv: row 3");
    }

    #[test]
    fn test_load_error_is_transparent() {
        let err: GuardError = LoadError::Empty {
            source_name: "<memory>".to_string(),
        }
        .into();
        assert!(err.is_load_error());
        assert_eq!(err.to_string(), "Source is empty: <memory>");
    }

    #[test]
    fn test_column_not_found() {
        let err = GuardError::column_not_found("user_id");
        assert_eq!(err.to_string(), "Column 'user_id' not found in dataset");
    }

    #[test]
    fn test_detector_error_display() {
        let err = DetectorError::invalid_parameter("percentile", "must be in (0, 100)");
        assert_eq!(
            err.to_string(),
            "Invalid parameter 'percentile': must be in (0, 100)"
        );
    }
}
