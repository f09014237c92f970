//! Scan configuration loaded from JSON.
//!
//! Every field has a default, so an empty object is a valid configuration:
//!
//! ```json
//! {
//!   "loader": { "delimiter": ";" },
//!   "outlier": { "percentile": 2.5, "seed": 7 },
//!   "format_rules": [
//!     { "matcher": { "match": "exact", "value": "email" }, "format": { "type": "email" } },
//!     { "matcher": { "match": "pattern", "value": "_uuid$" }, "format": { "type": "uuid" } }
//!   ],
//!   "detect_outliers": true
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::detectors::{FormatRule, FormatValidator, OutlierConfig};
use crate::error::{GuardError, Result};
use crate::sources::{CsvOptions, DEFAULT_NULL_VALUES};

/// Settings that shape how the CSV source is parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoaderConfig {
    /// Field delimiter. Must be a single ASCII character.
    pub delimiter: char,
    /// Whether the first row is a header.
    pub has_header: bool,
    /// Spellings treated as absent cells. `None` keeps the defaults.
    pub null_values: Option<Vec<String>>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            delimiter: ',',
            has_header: true,
            null_values: None,
        }
    }
}

impl LoaderConfig {
    /// Converts to parser options.
    pub fn csv_options(&self) -> Result<CsvOptions> {
        let delimiter = u8::try_from(self.delimiter)
            .ok()
            .filter(u8::is_ascii)
            .ok_or_else(|| {
                GuardError::configuration(format!(
                    "delimiter must be a single ASCII character, got '{}'",
                    self.delimiter
                ))
            })?;

        Ok(CsvOptions {
            delimiter,
            has_header: self.has_header,
            null_values: self.null_values.clone().unwrap_or_else(|| {
                DEFAULT_NULL_VALUES.iter().map(|s| s.to_string()).collect()
            }),
            ..Default::default()
        })
    }
}

/// Full configuration for one scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanConfig {
    pub loader: LoaderConfig,
    pub outlier: OutlierConfig,
    /// Format rules in evaluation order. Defaults to the email rule.
    pub format_rules: Vec<FormatRule>,
    pub detect_missing: bool,
    pub detect_outliers: bool,
    pub detect_formats: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            loader: LoaderConfig::default(),
            outlier: OutlierConfig::default(),
            format_rules: vec![FormatRule::email()],
            detect_missing: true,
            detect_outliers: true,
            detect_formats: true,
        }
    }
}

impl ScanConfig {
    /// Parses a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| GuardError::configuration(format!("invalid scan config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| {
            GuardError::configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json_str(&json)
    }

    /// Serializes to pretty JSON.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Checks parameter ranges and compiles every format pattern once.
    pub fn validate(&self) -> Result<()> {
        self.loader.csv_options()?;
        self.outlier
            .validate()
            .map_err(|e| GuardError::configuration(e.to_string()))?;
        FormatValidator::new(self.format_rules.clone())?;
        Ok(())
    }

    /// Sets the outlier percentile.
    pub fn with_percentile(mut self, percentile: f64) -> Self {
        self.outlier.percentile = percentile;
        self
    }

    /// Sets the outlier seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.outlier.seed = seed;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::{ColumnMatcher, FormatType};
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_object_is_default() {
        let config = ScanConfig::from_json_str("{}").unwrap();
        assert_eq!(config, ScanConfig::default());
        assert_eq!(config.format_rules, vec![FormatRule::email()]);
    }

    #[test]
    fn test_parses_rules_and_outlier_settings() {
        let config = ScanConfig::from_json_str(
            r#"{
                "outlier": {"percentile": 2.5, "seed": 7},
                "format_rules": [
                    {"matcher": {"match": "case_insensitive", "value": "Contact"}, "format": {"type": "email"}},
                    {"matcher": {"match": "pattern", "value": "_uuid$"}, "format": {"type": "uuid"}}
                ],
                "detect_missing": false
            }"#,
        )
        .unwrap();
        assert_eq!(config.outlier.percentile, 2.5);
        assert_eq!(config.outlier.seed, 7);
        assert_eq!(config.outlier.n_estimators, 100);
        assert!(!config.detect_missing);
        assert_eq!(
            config.format_rules[1],
            FormatRule::new(ColumnMatcher::Pattern("_uuid$".to_string()), FormatType::Uuid)
        );
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            ScanConfig::from_json_str(r#"{"outlier": {"percentile": 150}}"#),
            Err(GuardError::Configuration(_))
        ));
        assert!(matches!(
            ScanConfig::from_json_str(r#"{"unknown": 1}"#),
            Err(GuardError::Configuration(_))
        ));
        assert!(matches!(
            ScanConfig::from_json_str(
                r#"{"format_rules": [{"matcher": {"match": "exact", "value": "x"}, "format": {"type": "regex", "pattern": "["}}]}"#
            ),
            Err(GuardError::Configuration(_))
        ));
        assert!(matches!(
            ScanConfig::from_json_str(r#"{"loader": {"delimiter": "é"}}"#),
            Err(GuardError::Configuration(_))
        ));
    }

    #[test]
    fn test_loader_options() {
        let config = ScanConfig::from_json_str(
            r#"{"loader": {"delimiter": ";", "null_values": ["", "-"]}}"#,
        )
        .unwrap();
        let options = config.loader.csv_options().unwrap();
        assert_eq!(options.delimiter, b';');
        assert_eq!(options.null_values, vec!["".to_string(), "-".to_string()]);
    }

    #[test]
    fn test_from_json_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"outlier": {{"seed": 99}}}}"#).unwrap();
        let config = ScanConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.outlier.seed, 99);

        assert!(ScanConfig::from_json_file("/definitely/not/here.json").is_err());
    }

    #[test]
    fn test_round_trips_through_json() {
        let config = ScanConfig::default().with_percentile(1.0).with_seed(3);
        let json = config.to_json_string().unwrap();
        assert_eq!(ScanConfig::from_json_str(&json).unwrap(), config);
    }
}
