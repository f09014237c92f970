//! Format validation for designated columns.
//!
//! A [`FormatValidator`] holds an ordered list of [`FormatRule`]s. Each rule
//! pairs a [`ColumnMatcher`] (which columns it applies to) with a
//! [`FormatType`] (what the values must look like). The first rule whose
//! matcher accepts a column name decides how that column is checked; columns
//! no rule matches are skipped.
//!
//! The default validator checks a column named exactly `email`.
//!
//! # Examples
//!
//! ```rust
//! use anomaly_guard::detectors::{ColumnMatcher, FormatRule, FormatType, FormatValidator};
//!
//! let validator = FormatValidator::new(vec![
//!     FormatRule::email(),
//!     FormatRule::new(ColumnMatcher::Pattern(r"(?i)_id$".to_string()), FormatType::Uuid),
//!     FormatRule::new(
//!         ColumnMatcher::Exact("sku".to_string()),
//!         FormatType::Regex(r"^[A-Z]{2}\d{4}$".to_string()),
//!     ),
//! ])
//! .unwrap();
//! assert_eq!(validator.rules().len(), 3);
//! ```
//!
//! Null cells are never counted as violations; the missing-value detector
//! already reports them.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{AnomalyDetails, AnomalyKind, AnomalyRecord, Detector, DetectorOutcome, SkipReason};
use crate::dataset::Column;
use crate::error::{GuardError, Result};

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid email pattern")
});

static URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https?://[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}(?::\d+)?(?:/[^\s]*)?$")
        .expect("valid url pattern")
});

static UUID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .expect("valid uuid pattern")
});

static IPV4: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:(?:25[0-5]|2[0-4][0-9]|1[0-9][0-9]|[1-9]?[0-9])\.){3}(?:25[0-5]|2[0-4][0-9]|1[0-9][0-9]|[1-9]?[0-9])$",
    )
    .expect("valid ipv4 pattern")
});

/// The shape values of a matched column must have.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "pattern", rename_all = "snake_case")]
pub enum FormatType {
    /// `local@domain.tld`
    Email,
    /// `http://` or `https://` URLs
    Url,
    /// Hyphenated hex UUIDs
    Uuid,
    /// Dotted-quad IPv4 addresses
    Ipv4,
    /// Custom regular expression
    Regex(String),
}

impl FormatType {
    /// Short name used in descriptions.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Url => "URL",
            Self::Uuid => "UUID",
            Self::Ipv4 => "IPv4",
            Self::Regex(_) => "pattern",
        }
    }

    fn compile(&self) -> Result<Regex> {
        let regex = match self {
            Self::Email => EMAIL.clone(),
            Self::Url => URL.clone(),
            Self::Uuid => UUID.clone(),
            Self::Ipv4 => IPV4.clone(),
            Self::Regex(pattern) => Regex::new(pattern).map_err(|e| {
                GuardError::configuration(format!("invalid format pattern '{pattern}': {e}"))
            })?,
        };
        Ok(regex)
    }
}

/// Selects the columns a rule applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "match", content = "value", rename_all = "snake_case")]
pub enum ColumnMatcher {
    /// Exact, case-sensitive column name.
    Exact(String),
    /// Column name compared without regard to case.
    CaseInsensitive(String),
    /// Regular expression searched in the column name.
    Pattern(String),
}

impl ColumnMatcher {
    fn compile(&self) -> Result<CompiledMatcher> {
        Ok(match self {
            Self::Exact(name) => CompiledMatcher::Exact(name.clone()),
            Self::CaseInsensitive(name) => CompiledMatcher::CaseInsensitive(name.to_lowercase()),
            Self::Pattern(pattern) => CompiledMatcher::Pattern(Regex::new(pattern).map_err(|e| {
                GuardError::configuration(format!("invalid column pattern '{pattern}': {e}"))
            })?),
        })
    }
}

#[derive(Debug, Clone)]
enum CompiledMatcher {
    Exact(String),
    CaseInsensitive(String),
    Pattern(Regex),
}

impl CompiledMatcher {
    fn matches(&self, column: &str) -> bool {
        match self {
            Self::Exact(name) => name == column,
            Self::CaseInsensitive(lower) => *lower == column.to_lowercase(),
            Self::Pattern(regex) => regex.is_match(column),
        }
    }
}

/// A column selector paired with the format its values must follow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatRule {
    pub matcher: ColumnMatcher,
    pub format: FormatType,
}

impl FormatRule {
    pub fn new(matcher: ColumnMatcher, format: FormatType) -> Self {
        Self { matcher, format }
    }

    /// Email check on the column named `email`.
    pub fn email() -> Self {
        Self::new(ColumnMatcher::Exact("email".to_string()), FormatType::Email)
    }
}

impl Default for FormatRule {
    fn default() -> Self {
        Self::email()
    }
}

#[derive(Debug, Clone)]
struct CompiledRule {
    rule: FormatRule,
    matcher: CompiledMatcher,
    pattern: Regex,
}

/// Checks designated columns against expected value formats.
#[derive(Debug, Clone)]
pub struct FormatValidator {
    rules: Vec<CompiledRule>,
}

impl FormatValidator {
    /// Compiles the given rules. Fails if any custom pattern is not a valid regex.
    pub fn new(rules: Vec<FormatRule>) -> Result<Self> {
        let rules = rules
            .into_iter()
            .map(|rule| {
                Ok(CompiledRule {
                    matcher: rule.matcher.compile()?,
                    pattern: rule.format.compile()?,
                    rule,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    /// Rules in evaluation order.
    pub fn rules(&self) -> Vec<&FormatRule> {
        self.rules.iter().map(|compiled| &compiled.rule).collect()
    }

    fn rule_for(&self, column: &str) -> Option<&CompiledRule> {
        self.rules
            .iter()
            .find(|compiled| compiled.matcher.matches(column))
    }
}

impl Default for FormatValidator {
    fn default() -> Self {
        Self {
            rules: vec![CompiledRule {
                rule: FormatRule::email(),
                matcher: CompiledMatcher::Exact("email".to_string()),
                pattern: EMAIL.clone(),
            }],
        }
    }
}

impl Detector for FormatValidator {
    fn name(&self) -> &str {
        "FormatValidator"
    }

    fn description(&self) -> &str {
        "Validates values of designated columns against expected formats"
    }

    fn inspect(&self, column: &Column) -> DetectorOutcome {
        let Some(compiled) = self.rule_for(column.name()) else {
            return DetectorOutcome::Skipped(SkipReason::NotApplicable);
        };

        let mut checked = 0;
        let mut violations = Vec::new();
        for row in 0..column.len() {
            let Some(text) = column.text(row) else {
                continue;
            };
            checked += 1;
            if !compiled.pattern.is_match(&text) {
                violations.push(row);
            }
        }

        if violations.is_empty() {
            return DetectorOutcome::Clean;
        }

        let format = compiled.rule.format.name();
        let record = AnomalyRecord::new(
            AnomalyKind::FormatViolation,
            column.name(),
            format!("{} rows with invalid {format} format found.", violations.len()),
        )
        .with_sample_values(violations.iter().filter_map(|&row| column.value(row)))
        .with_sample_rows(violations.iter().copied())
        .with_details(AnomalyDetails::Format {
            format: format.to_string(),
            violation_count: violations.len(),
            checked_count: checked,
        });

        DetectorOutcome::Found(record)
    }
}
