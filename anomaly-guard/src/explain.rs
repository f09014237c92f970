//! Inputs and outputs for the explanation collaborator.
//!
//! The crate does not talk to any language-model service itself. It builds an
//! [`ExplanationRequest`] for a selected record (the record, freshly computed
//! [`ColumnStatistics`] and an optional Markdown preview of the data), renders
//! the analyst prompt, and parses a structured answer back into an
//! [`Explanation`]. Callers plug a service in through the [`Explainer`] trait.
//!
//! Configuration is always passed in explicitly; nothing here reads the
//! process environment.
//!
//! # Examples
//!
//! ```rust
//! use anomaly_guard::core::AnomalyPipeline;
//! use anomaly_guard::explain::{Explanation, ExplanationRequest};
//! use anomaly_guard::sources::load_csv_str;
//!
//! let dataset = load_csv_str("id,email\n1,a@b.com\n2,oops\n").unwrap();
//! let report = AnomalyPipeline::default().run(&dataset);
//!
//! let request = ExplanationRequest::for_record(&dataset, &report.records()[0], 5).unwrap();
//! let prompt = request.render_prompt();
//! assert!(prompt.contains("Column: email"));
//!
//! let parsed = Explanation::parse("Title: Bad emails\nExplanation: One address lacks a domain.");
//! assert_eq!(parsed.title.as_deref(), Some("Bad emails"));
//! ```

use std::fmt::Write;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, warn};
use zeroize::ZeroizeOnDrop;

use crate::analyzers::ColumnStatistics;
use crate::dataset::Dataset;
use crate::detectors::AnomalyRecord;
use crate::error::{GuardError, Result};

static SECTION_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^[\s#*]*(title|explanation|possible root causes|root causes|remediation steps|remediation)\s*\**\s*:\s*\**\s*(.*)$",
    )
    .expect("valid section header pattern")
});

/// An API credential that is wiped from memory on drop and never printed.
#[derive(Clone, ZeroizeOnDrop)]
pub struct ApiKey(String);

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ApiKey(***)")
    }
}

impl ApiKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the raw key. Avoid storing the result.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ApiKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Settings for an explanation service.
#[derive(Debug, Clone)]
pub struct ExplainerConfig {
    /// Model identifier understood by the service
    pub model: String,
    /// Credential, if the service needs one
    pub api_key: Option<ApiKey>,
    /// Per-attempt timeout
    pub timeout: Duration,
    /// Retries after the first failed attempt
    pub max_retries: u32,
}

impl Default for ExplainerConfig {
    fn default() -> Self {
        Self {
            model: "gemini-pro".to_string(),
            api_key: None,
            timeout: Duration::from_secs(30),
            max_retries: 2,
        }
    }
}

impl ExplainerConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(ApiKey::new(key));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Validate the explainer configuration.
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(GuardError::configuration("Explainer model cannot be empty"));
        }
        if self.timeout.is_zero() {
            return Err(GuardError::configuration(
                "Explainer timeout must be greater than zero",
            ));
        }
        Ok(())
    }
}

/// Everything the collaborator needs to explain one record.
#[derive(Debug, Clone, Serialize)]
pub struct ExplanationRequest {
    pub record: AnomalyRecord,
    pub statistics: ColumnStatistics,
    /// Markdown table of the first rows, when requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
}

impl ExplanationRequest {
    /// Bundles `record` with statistics for its column and a preview of
    /// `preview_rows` rows (`0` for none).
    ///
    /// Fails with [`GuardError::ColumnNotFound`] if the record's column is
    /// not in `dataset`.
    pub fn for_record(dataset: &Dataset, record: &AnomalyRecord, preview_rows: usize) -> Result<Self> {
        let statistics = ColumnStatistics::compute(dataset, record.column())?;
        let preview = (preview_rows > 0).then(|| dataset.preview_markdown(preview_rows));
        Ok(Self {
            record: record.clone(),
            statistics,
            preview,
        })
    }

    /// Renders the analyst prompt.
    pub fn render_prompt(&self) -> String {
        let record = &self.record;
        let mut prompt = String::new();

        writeln!(
            prompt,
            "You are an expert Data Quality Analyst and Data Engineer. Your task is to explain data quality issues and suggest concrete remediation steps."
        )
        .unwrap();
        writeln!(prompt).unwrap();
        writeln!(prompt, "Here is a detected data quality anomaly:").unwrap();
        writeln!(prompt, "- Anomaly Type: {}", record.kind()).unwrap();
        writeln!(prompt, "- Column: {}", record.column()).unwrap();
        writeln!(prompt, "- Description: {}", record.description()).unwrap();
        writeln!(
            prompt,
            "- Sample Problematic Values: {}",
            serde_json::to_string(record.sample_values()).unwrap_or_default()
        )
        .unwrap();
        writeln!(prompt, "- Row Indices: {:?}", record.sample_row_indices()).unwrap();

        writeln!(prompt).unwrap();
        writeln!(prompt, "Additional Context:").unwrap();
        match &self.statistics {
            ColumnStatistics::Unknown => {
                writeln!(prompt, "- Column Statistics: not available").unwrap();
            }
            statistics => {
                writeln!(
                    prompt,
                    "- Column Statistics: {}",
                    serde_json::to_string(statistics).unwrap_or_default()
                )
                .unwrap();
            }
        }
        if let Some(preview) = &self.preview {
            writeln!(prompt, "- First rows of the dataset:").unwrap();
            writeln!(prompt).unwrap();
            write!(prompt, "{preview}").unwrap();
        }

        writeln!(prompt).unwrap();
        writeln!(prompt, "Based on this information, provide:").unwrap();
        writeln!(prompt, "1. A clear, concise explanation of the data quality issue.").unwrap();
        writeln!(prompt, "2. Possible root causes for this issue.").unwrap();
        writeln!(
            prompt,
            "3. Concrete, actionable remediation steps for a data engineer, with code or SQL where applicable."
        )
        .unwrap();
        writeln!(prompt, "4. A short, specific title for this anomaly.").unwrap();
        writeln!(prompt).unwrap();
        writeln!(prompt, "Structure your response as follows:").unwrap();
        writeln!(prompt, "---").unwrap();
        writeln!(prompt, "Title: [Your Title Here]").unwrap();
        writeln!(prompt, "Explanation: [Your detailed explanation]").unwrap();
        writeln!(prompt, "Possible Root Causes: [List of possible causes]").unwrap();
        writeln!(prompt, "Remediation Steps:").unwrap();
        writeln!(prompt, "[Numbered list of steps with code examples]").unwrap();
        writeln!(prompt, "---").unwrap();

        prompt
    }
}

/// A parsed answer from the collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Explanation {
    pub title: Option<String>,
    pub explanation: String,
    pub root_causes: Option<String>,
    pub remediation: Option<String>,
}

#[derive(Clone, Copy)]
enum Section {
    Title,
    Explanation,
    RootCauses,
    Remediation,
}

impl Explanation {
    /// Splits a structured response into its sections.
    ///
    /// When no section headers are present, the whole trimmed text becomes the
    /// explanation.
    pub fn parse(text: &str) -> Self {
        let mut sections: [Vec<&str>; 4] = Default::default();
        let mut current: Option<Section> = None;
        let mut saw_header = false;

        for line in text.lines() {
            if line.trim() == "---" {
                continue;
            }
            if let Some(caps) = SECTION_HEADER.captures(line) {
                let section = match caps[1].to_lowercase().as_str() {
                    "title" => Section::Title,
                    "explanation" => Section::Explanation,
                    "possible root causes" | "root causes" => Section::RootCauses,
                    _ => Section::Remediation,
                };
                saw_header = true;
                current = Some(section);
                if let Some(rest) = caps.get(2) {
                    sections[section as usize].push(rest.as_str());
                }
                continue;
            }
            if let Some(section) = current {
                sections[section as usize].push(line);
            }
        }

        if !saw_header {
            return Self {
                explanation: text.trim().to_string(),
                ..Self::default()
            };
        }

        let joined = |lines: &[&str]| {
            let text = lines.join("\n").trim().to_string();
            (!text.is_empty()).then_some(text)
        };

        Self {
            title: joined(&sections[Section::Title as usize]),
            explanation: joined(&sections[Section::Explanation as usize]).unwrap_or_default(),
            root_causes: joined(&sections[Section::RootCauses as usize]),
            remediation: joined(&sections[Section::Remediation as usize]),
        }
    }
}

/// An external service that explains anomaly records.
pub trait Explainer {
    /// Returns the raw text answer for a rendered prompt.
    fn complete(&self, prompt: &str, config: &ExplainerConfig) -> Result<String>;

    /// Explains one request.
    fn explain(&self, request: &ExplanationRequest, config: &ExplainerConfig) -> Result<Explanation> {
        let text = self.complete(&request.render_prompt(), config)?;
        Ok(Explanation::parse(&text))
    }
}

/// Calls `explainer`, retrying up to `config.max_retries` times.
///
/// Returns the last error when every attempt fails.
pub fn explain_with_retries(
    explainer: &dyn Explainer,
    request: &ExplanationRequest,
    config: &ExplainerConfig,
) -> Result<Explanation> {
    config.validate()?;

    let attempts = config.max_retries + 1;
    let mut last_error = None;
    for attempt in 1..=attempts {
        match explainer.explain(request, config) {
            Ok(explanation) => {
                debug!(attempt, column = request.record.column(), "Explanation received");
                return Ok(explanation);
            }
            Err(e) => {
                warn!(attempt, attempts, error = %e, "Explanation attempt failed");
                last_error = Some(e);
            }
        }
    }
    Err(last_error
        .unwrap_or_else(|| GuardError::Explanation("no explanation attempts were made".to_string())))
}
