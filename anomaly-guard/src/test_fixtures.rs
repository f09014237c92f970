//! Common datasets for anomaly detection tests.
//!
//! Each fixture is a small CSV document with a known set of problems, plus a
//! helper that loads it into a [`Dataset`].

use crate::dataset::Dataset;
use crate::error::Result;
use crate::sources::load_csv_str;

/// Ten customers: three missing ages, one extreme age, one malformed email.
pub const CUSTOMERS_CSV: &str = "\
id,name,age,email,city
1,Alice,30,alice@example.com,New York
2,Bob,,bob@example.com,London
3,Charlie,35,charlie@example.com,Paris
4,David,28,not-an-email,London
5,Eve,,eve@example.com,Berlin
6,Frank,41,frank@example.com,Paris
7,Grace,300,grace@example.com,New York
8,Henry,33,henry@example.com,London
9,Ivan,,ivan@example.com,Berlin
10,Jane,27,jane@example.com,Paris
";

/// A dataset with nothing to report: no gaps, no numeric spread, no email column.
pub const CLEAN_CSV: &str = "\
name,score
a,5
b,5
c,5
d,5
";

/// Header only.
pub const HEADER_ONLY_CSV: &str = "id,name,email\n";

/// Loads [`CUSTOMERS_CSV`].
pub fn customers() -> Result<Dataset> {
    Ok(load_csv_str(CUSTOMERS_CSV)?)
}

/// Loads [`CLEAN_CSV`].
pub fn clean() -> Result<Dataset> {
    Ok(load_csv_str(CLEAN_CSV)?)
}

/// Builds a single-column CSV document from raw cell texts (empty for absent).
///
/// Empty cells are written as `""` so the reader does not skip them as blank lines.
pub fn single_column_csv(name: &str, cells: &[&str]) -> String {
    let mut csv = format!("{name}\n");
    for cell in cells {
        if cell.is_empty() {
            csv.push_str("\"\"");
        } else {
            csv.push_str(cell);
        }
        csv.push('\n');
    }
    csv
}

/// Loads a single-column dataset from raw cell texts.
pub fn single_column(name: &str, cells: &[&str]) -> Result<Dataset> {
    Ok(load_csv_str(&single_column_csv(name, cells))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::ColumnKind;

    #[test]
    fn test_customers_shape() {
        let ds = customers().unwrap();
        assert_eq!(ds.row_count(), 10);
        assert_eq!(ds.column("age").unwrap().null_count(), 3);
        assert_eq!(ds.column("age").unwrap().kind(), ColumnKind::Numeric);
    }

    #[test]
    fn test_single_column() {
        let ds = single_column("v", &["1", "", "3"]).unwrap();
        assert_eq!(ds.row_count(), 3);
        assert_eq!(ds.column("v").unwrap().null_rows().collect::<Vec<_>>(), vec![1]);
    }
}
