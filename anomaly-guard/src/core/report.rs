//! Run output: the anomaly report and per-pair diagnostics.

use serde::Serialize;

use crate::detectors::{AnomalyKind, AnomalyRecord, DetectorOutcome, SkipReason};
use crate::error::DetectorError;

/// Ordered findings of one pipeline run.
///
/// Records appear in detector execution order, then column order. The report
/// serializes as a plain JSON array of records.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AnomalyReport {
    records: Vec<AnomalyRecord>,
}

impl AnomalyReport {
    /// Wraps records that are already in emission order.
    pub fn from_records(records: Vec<AnomalyRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[AnomalyRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record at `index`, as listed to the user.
    pub fn get(&self, index: usize) -> Option<&AnomalyRecord> {
        self.records.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AnomalyRecord> {
        self.records.iter()
    }

    /// Records of the given kind.
    pub fn by_kind<'a>(&'a self, kind: &'a AnomalyKind) -> impl Iterator<Item = &'a AnomalyRecord> {
        self.records.iter().filter(move |record| record.kind() == kind)
    }

    /// Records about the given column.
    pub fn for_column<'a>(&'a self, column: &'a str) -> impl Iterator<Item = &'a AnomalyRecord> {
        self.records
            .iter()
            .filter(move |record| record.column() == column)
    }

    pub fn into_records(self) -> Vec<AnomalyRecord> {
        self.records
    }
}

impl<'a> IntoIterator for &'a AnomalyReport {
    type Item = &'a AnomalyRecord;
    type IntoIter = std::slice::Iter<'a, AnomalyRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl IntoIterator for AnomalyReport {
    type Item = AnomalyRecord;
    type IntoIter = std::vec::IntoIter<AnomalyRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

/// Outcome of one detector on one column.
#[derive(Debug, Clone, PartialEq)]
pub struct OutcomeEntry {
    pub detector: String,
    pub column: String,
    pub outcome: DetectorOutcome,
}

/// Every (detector, column) outcome of a run, in execution order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunDiagnostics {
    entries: Vec<OutcomeEntry>,
}

impl RunDiagnostics {
    pub(crate) fn push(&mut self, detector: &str, column: &str, outcome: DetectorOutcome) {
        self.entries.push(OutcomeEntry {
            detector: detector.to_string(),
            column: column.to_string(),
            outcome,
        });
    }

    pub fn entries(&self) -> &[OutcomeEntry] {
        &self.entries
    }

    /// Outcome for a specific pair, if that pair ran.
    pub fn outcome(&self, detector: &str, column: &str) -> Option<&DetectorOutcome> {
        self.entries
            .iter()
            .find(|entry| entry.detector == detector && entry.column == column)
            .map(|entry| &entry.outcome)
    }

    /// Pairs that were skipped, with the reason.
    pub fn skipped(&self) -> impl Iterator<Item = (&OutcomeEntry, &SkipReason)> {
        self.entries.iter().filter_map(|entry| match &entry.outcome {
            DetectorOutcome::Skipped(reason) => Some((entry, reason)),
            _ => None,
        })
    }

    /// Pairs that failed, with the error.
    pub fn failed(&self) -> impl Iterator<Item = (&OutcomeEntry, &DetectorError)> {
        self.entries.iter().filter_map(|entry| match &entry.outcome {
            DetectorOutcome::Failed(error) => Some((entry, error)),
            _ => None,
        })
    }

    pub fn found_count(&self) -> usize {
        self.count("found")
    }

    pub fn clean_count(&self) -> usize {
        self.count("clean")
    }

    pub fn skipped_count(&self) -> usize {
        self.count("skipped")
    }

    pub fn failed_count(&self) -> usize {
        self.count("failed")
    }

    fn count(&self, status: &str) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.outcome.status() == status)
            .count()
    }
}
