//! Missing-value detection.

use super::{AnomalyDetails, AnomalyKind, AnomalyRecord, Detector, DetectorOutcome};
use crate::dataset::Column;

/// Reports every column that contains at least one absent cell.
///
/// Applies to columns of any kind. The record carries the first row indices
/// of absent cells; there are no sample values to show for a missing cell.
#[derive(Debug, Clone, Copy, Default)]
pub struct MissingValueDetector;

impl MissingValueDetector {
    /// Creates a new missing-value detector.
    pub fn new() -> Self {
        Self
    }
}

impl Detector for MissingValueDetector {
    fn name(&self) -> &str {
        "MissingValues"
    }

    fn description(&self) -> &str {
        "Detects absent cells in any column"
    }

    fn inspect(&self, column: &Column) -> DetectorOutcome {
        let missing = column.null_count();
        if missing == 0 {
            return DetectorOutcome::Clean;
        }

        let rows = column.len();
        let percentage = missing as f64 / rows as f64 * 100.0;

        let record = AnomalyRecord::new(
            AnomalyKind::MissingValues,
            column.name(),
            format!("{missing} ({percentage:.2}%) missing values found."),
        )
        .with_sample_rows(column.null_rows())
        .with_details(AnomalyDetails::Missing {
            missing_count: missing,
            row_count: rows,
            missing_percentage: percentage,
        });

        DetectorOutcome::Found(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{ArrayRef, Int64Array, NullArray, StringArray};
    use std::sync::Arc;

    fn column(name: &str, values: ArrayRef) -> Column {
        Column::new(name, values)
    }

    #[test]
    fn test_reports_count_and_percentage() {
        let values: ArrayRef = Arc::new(StringArray::from(vec![
            Some("a@x.com"),
            None,
            Some("b@x.com"),
            None,
        ]));
        let outcome = MissingValueDetector.inspect(&column("email", values));

        let record = outcome.record().expect("expected a finding");
        assert_eq!(record.kind(), &AnomalyKind::MissingValues);
        assert_eq!(record.column(), "email");
        assert_eq!(record.description(), "2 (50.00%) missing values found.");
        assert_eq!(record.sample_row_indices(), &[1, 3]);
        assert!(record.sample_values().is_empty());
    }

    #[test]
    fn test_clean_column() {
        let values: ArrayRef = Arc::new(Int64Array::from(vec![1, 2, 3]));
        assert_eq!(
            MissingValueDetector.inspect(&column("id", values)),
            DetectorOutcome::Clean
        );
    }

    #[test]
    fn test_sample_rows_are_first_three() {
        let values: ArrayRef = Arc::new(Int64Array::from(vec![
            Some(1),
            None,
            None,
            Some(4),
            None,
            None,
        ]));
        let outcome = MissingValueDetector.inspect(&column("n", values));
        let record = outcome.record().unwrap();
        assert_eq!(record.sample_row_indices(), &[1, 2, 4]);
        assert_eq!(record.description(), "4 (66.67%) missing values found.");
    }

    #[test]
    fn test_all_absent_column() {
        let values: ArrayRef = Arc::new(NullArray::new(2));
        let outcome = MissingValueDetector.inspect(&column("blank", values));
        let record = outcome.record().unwrap();
        assert_eq!(record.description(), "2 (100.00%) missing values found.");
        match record.details() {
            Some(AnomalyDetails::Missing {
                missing_count,
                row_count,
                ..
            }) => {
                assert_eq!(*missing_count, 2);
                assert_eq!(*row_count, 2);
            }
            other => panic!("unexpected details: {other:?}"),
        }
    }
}
