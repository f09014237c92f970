//! Loading CSV files from disk with default and configured options.

use std::io::Write;

use anomaly_guard::analyzers::ColumnKind;
use anomaly_guard::config::{LoaderConfig, ScanConfig};
use anomaly_guard::prelude::*;
use tempfile::NamedTempFile;

fn write_temp(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_load_file_classifies_columns() {
    let file = write_temp("id,price,label\n1,2.5,a\n2,,b\n3,4.0,NA\n");
    let dataset = load_csv(file.path()).unwrap();

    assert_eq!(dataset.row_count(), 3);
    assert_eq!(dataset.column_names(), vec!["id", "price", "label"]);
    assert_eq!(dataset.column("id").unwrap().kind(), ColumnKind::Numeric);
    assert_eq!(dataset.column("price").unwrap().kind(), ColumnKind::Numeric);
    assert_eq!(dataset.column("label").unwrap().kind(), ColumnKind::Categorical);
    assert_eq!(dataset.column("price").unwrap().null_count(), 1);
    assert_eq!(dataset.column("label").unwrap().null_count(), 1);
}

#[test]
fn test_semicolon_delimiter_from_config() {
    let file = write_temp("a;b\nfirst;x@y.com\nsecond;broken\n");
    let config = ScanConfig {
        loader: LoaderConfig {
            delimiter: ';',
            ..LoaderConfig::default()
        },
        ..ScanConfig::default()
    };

    let source = CsvSource::with_options(file.path(), config.loader.csv_options().unwrap());
    let report = AnomalyPipeline::from_config(&config)
        .unwrap()
        .scan(&source)
        .unwrap();

    assert_eq!(report.len(), 1);
    assert_eq!(report.records()[0].column(), "b");
    assert_eq!(report.records()[0].kind(), &AnomalyKind::FormatViolation);
}

#[test]
fn test_strict_nulls_keep_na_text() {
    let file = write_temp("code\nNA\nUS\nFR\n");
    let dataset = CsvSource::with_options(file.path(), CsvOptions::strict_nulls())
        .load()
        .unwrap();
    assert_eq!(dataset.column("code").unwrap().null_count(), 0);

    let dataset = load_csv(file.path()).unwrap();
    assert_eq!(dataset.column("code").unwrap().null_count(), 1);
}

#[test]
fn test_missing_file_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_csv(dir.path().join("absent.csv")).unwrap_err();
    assert!(matches!(err, LoadError::NotFound { .. }));
}

#[test]
fn test_empty_file_is_rejected() {
    let file = write_temp("  \n");
    let err = load_csv(file.path()).unwrap_err();
    assert!(matches!(err, LoadError::Empty { .. }));
}

#[test]
fn test_reader_source_matches_text_source() {
    let text = "n\n1\n2\n\"\"\n";
    let from_reader = CsvSource::from_reader("stdin", text.as_bytes())
        .unwrap()
        .load()
        .unwrap();
    let from_text = load_csv_str(text).unwrap();

    assert_eq!(from_reader.row_count(), from_text.row_count());
    assert_eq!(
        from_reader.column("n").unwrap().null_count(),
        from_text.column("n").unwrap().null_count()
    );
}
