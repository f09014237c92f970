//! CSV source implementation backed by the Arrow CSV reader.

use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::compute::concat_batches;
use arrow::csv::reader::Format;
use arrow::csv::ReaderBuilder;
use arrow::record_batch::RecordBatch;
use regex::Regex;
use tracing::{debug, info, instrument};

use crate::dataset::Dataset;
use crate::error::LoadError;

const MEMORY_SOURCE_NAME: &str = "<memory>";

/// Cell texts treated as absent in addition to the empty field.
pub const DEFAULT_NULL_VALUES: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN", "<NA>",
    "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Options for configuring CSV reading.
#[derive(Debug, Clone)]
pub struct CsvOptions {
    /// Whether the first row holds column names (default: true)
    pub has_header: bool,
    /// Field delimiter (default: ',')
    pub delimiter: u8,
    /// Quote character (default: '"')
    pub quote: u8,
    /// Escape character (default: None)
    pub escape: Option<u8>,
    /// Comment prefix (lines starting with this are ignored)
    pub comment: Option<u8>,
    /// Maximum records to read for schema inference (default: all)
    pub schema_infer_max_records: Option<usize>,
    /// Cell texts read as absent; the empty field is always absent
    pub null_values: Vec<String>,
    /// Rows per Arrow batch while reading
    pub batch_size: usize,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            has_header: true,
            delimiter: b',',
            quote: b'"',
            escape: None,
            comment: None,
            schema_infer_max_records: None,
            null_values: DEFAULT_NULL_VALUES.iter().map(|s| s.to_string()).collect(),
            batch_size: 8192,
        }
    }
}

impl CsvOptions {
    /// Options that only treat the empty field as absent.
    pub fn strict_nulls() -> Self {
        Self {
            null_values: Vec::new(),
            ..Self::default()
        }
    }

    /// Builds the anchored regex matching every absent-cell spelling.
    fn null_regex(&self) -> Result<Regex, regex::Error> {
        let alternatives: Vec<String> = std::iter::once(String::new())
            .chain(self.null_values.iter().map(|v| regex::escape(v)))
            .collect();
        Regex::new(&format!("^(?:{})$", alternatives.join("|")))
    }
}

#[derive(Debug, Clone)]
enum Origin {
    Path(PathBuf),
    Memory { name: String, bytes: Vec<u8> },
}

/// A CSV data source read from a file or from memory.
///
/// # Examples
///
/// ```rust,no_run
/// use anomaly_guard::sources::{CsvOptions, CsvSource};
///
/// // Simple CSV file
/// let dataset = CsvSource::new("data/users.csv").load()?;
///
/// // Semicolon-separated file
/// let options = CsvOptions {
///     delimiter: b';',
///     ..Default::default()
/// };
/// let dataset = CsvSource::with_options("data/users.csv", options).load()?;
/// # Ok::<(), anomaly_guard::error::LoadError>(())
/// ```
#[derive(Debug, Clone)]
pub struct CsvSource {
    origin: Origin,
    options: CsvOptions,
}

impl CsvSource {
    /// Creates a CSV source for a file path.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self::with_options(path, CsvOptions::default())
    }

    /// Creates a CSV source for a file path with custom options.
    pub fn with_options(path: impl AsRef<Path>, options: CsvOptions) -> Self {
        Self {
            origin: Origin::Path(path.as_ref().to_path_buf()),
            options,
        }
    }

    /// Creates a CSV source over in-memory bytes.
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            origin: Origin::Memory {
                name: name.into(),
                bytes: bytes.into(),
            },
            options: CsvOptions::default(),
        }
    }

    /// Creates a CSV source over in-memory text.
    pub fn from_text(text: &str) -> Self {
        Self::from_bytes(MEMORY_SOURCE_NAME, text.as_bytes())
    }

    /// Drains a reader into an in-memory source.
    pub fn from_reader<R: Read>(name: impl Into<String>, mut reader: R) -> Result<Self, LoadError> {
        let name = name.into();
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|error| LoadError::Io {
                source_name: name.clone(),
                error,
            })?;
        Ok(Self::from_bytes(name, bytes))
    }

    /// Replaces the options of this source.
    pub fn with_custom_options(mut self, options: CsvOptions) -> Self {
        self.options = options;
        self
    }

    /// Returns the options of this source.
    pub fn options(&self) -> &CsvOptions {
        &self.options
    }

    /// Human-readable name: the file path or the in-memory label.
    pub fn name(&self) -> String {
        match &self.origin {
            Origin::Path(path) => path.display().to_string(),
            Origin::Memory { name, .. } => name.clone(),
        }
    }

    /// Reads and parses the whole source.
    #[instrument(skip(self), fields(source = %self.name()))]
    pub fn load(&self) -> Result<Dataset, LoadError> {
        let name = self.name();
        let dataset = match &self.origin {
            Origin::Path(path) => {
                let bytes = std::fs::read(path).map_err(|error| {
                    if error.kind() == std::io::ErrorKind::NotFound {
                        LoadError::NotFound { path: name.clone() }
                    } else {
                        LoadError::Io {
                            source_name: name.clone(),
                            error,
                        }
                    }
                })?;
                self.parse(&name, &bytes)?
            }
            Origin::Memory { bytes, .. } => self.parse(&name, bytes)?,
        };

        info!(
            rows = dataset.row_count(),
            columns = dataset.column_count(),
            "Loaded dataset"
        );
        Ok(dataset)
    }

    fn parse(&self, name: &str, bytes: &[u8]) -> Result<Dataset, LoadError> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(LoadError::Empty {
                source_name: name.to_string(),
            });
        }

        let null_regex = self.options.null_regex().map_err(|e| {
            LoadError::malformed_with_source(name, "invalid null value pattern", Box::new(e))
        })?;

        let mut format = Format::default()
            .with_header(self.options.has_header)
            .with_delimiter(self.options.delimiter)
            .with_quote(self.options.quote)
            .with_null_regex(null_regex.clone());
        if let Some(escape) = self.options.escape {
            format = format.with_escape(escape);
        }
        if let Some(comment) = self.options.comment {
            format = format.with_comment(comment);
        }

        let (schema, records_read) = format
            .infer_schema(Cursor::new(bytes), self.options.schema_infer_max_records)
            .map_err(|e| {
                LoadError::malformed_with_source(name, "schema inference failed", Box::new(e))
            })?;
        if schema.fields().is_empty() {
            return Err(LoadError::Empty {
                source_name: name.to_string(),
            });
        }
        debug!(
            fields = schema.fields().len(),
            records_read, "Inferred CSV schema"
        );

        let schema = Arc::new(schema);
        let mut builder = ReaderBuilder::new(schema.clone())
            .with_header(self.options.has_header)
            .with_delimiter(self.options.delimiter)
            .with_quote(self.options.quote)
            .with_null_regex(null_regex)
            .with_batch_size(self.options.batch_size);
        if let Some(escape) = self.options.escape {
            builder = builder.with_escape(escape);
        }
        if let Some(comment) = self.options.comment {
            builder = builder.with_comment(comment);
        }

        let reader = builder.build(Cursor::new(bytes)).map_err(|e| {
            LoadError::malformed_with_source(name, "failed to open CSV reader", Box::new(e))
        })?;
        let batches: Vec<RecordBatch> = reader
            .collect::<Result<_, _>>()
            .map_err(|e| LoadError::malformed_with_source(name, "failed to read rows", Box::new(e)))?;
        let batch = concat_batches(&schema, &batches).map_err(|e| {
            LoadError::malformed_with_source(name, "failed to combine batches", Box::new(e))
        })?;

        Dataset::from_record_batch_named(&batch, name)
    }
}

/// Loads a CSV file with default options.
pub fn load_csv(path: impl AsRef<Path>) -> Result<Dataset, LoadError> {
    CsvSource::new(path).load()
}

/// Loads CSV text with default options.
pub fn load_csv_str(text: &str) -> Result<Dataset, LoadError> {
    CsvSource::from_text(text).load()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::ColumnKind;
    use crate::dataset::CellValue;
    use std::io::Write;

    #[test]
    fn test_infers_kinds() {
        let ds = load_csv_str("id,name,score,active\n1,Alice,1.5,true\n2,Bob,2.5,false\n").unwrap();
        assert_eq!(ds.row_count(), 2);
        let kinds: Vec<ColumnKind> = ds.columns().iter().map(|c| c.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                ColumnKind::Numeric,
                ColumnKind::Categorical,
                ColumnKind::Numeric,
                ColumnKind::Categorical
            ]
        );
    }

    #[test]
    fn test_empty_fields_are_null() {
        let ds = load_csv_str("a,b\n1,x\n,y\n3,\n").unwrap();
        assert_eq!(ds.column("a").unwrap().null_count(), 1);
        assert_eq!(ds.column("b").unwrap().null_count(), 1);
        assert_eq!(ds.column("a").unwrap().kind(), ColumnKind::Numeric);
    }

    #[test]
    fn test_default_null_spellings() {
        let ds = load_csv_str("a\n1\nNA\nnull\n4\n").unwrap();
        let a = ds.column("a").unwrap();
        assert_eq!(a.kind(), ColumnKind::Numeric);
        assert_eq!(a.null_rows().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_strict_nulls_keep_text() {
        let ds = CsvSource::from_text("a\n1\nNA\n")
            .with_custom_options(CsvOptions::strict_nulls())
            .load()
            .unwrap();
        let a = ds.column("a").unwrap();
        assert_eq!(a.kind(), ColumnKind::Categorical);
        assert_eq!(a.value(1), Some(CellValue::Text("NA".to_string())));
    }

    #[test]
    fn test_header_only_is_zero_rows() {
        let ds = load_csv_str("a,b\n").unwrap();
        assert_eq!(ds.row_count(), 0);
        assert_eq!(ds.column_count(), 2);
        assert_eq!(ds.column("a").unwrap().kind(), ColumnKind::Unknown);
    }

    #[test]
    fn test_all_missing_column_is_unknown() {
        let ds = load_csv_str("a,b\n1,\n2,\n").unwrap();
        let b = ds.column("b").unwrap();
        assert_eq!(b.kind(), ColumnKind::Unknown);
        assert_eq!(b.null_count(), 2);
    }

    #[test]
    fn test_empty_source() {
        let err = load_csv_str("").unwrap_err();
        assert!(matches!(err, LoadError::Empty { .. }));
        let err = load_csv_str("  \n\n").unwrap_err();
        assert!(matches!(err, LoadError::Empty { .. }));
    }

    #[test]
    fn test_ragged_rows_are_malformed() {
        let err = load_csv_str("a,b\n1,2\n3,4,5\n").unwrap_err();
        assert!(matches!(err, LoadError::Malformed { .. }));
    }

    #[test]
    fn test_duplicate_header_is_malformed() {
        let err = load_csv_str("a,a\n1,2\n").unwrap_err();
        assert!(err.to_string().contains("duplicate column name 'a'"));
    }

    #[test]
    fn test_missing_file() {
        let err = load_csv("definitely/not/here.csv").unwrap_err();
        assert!(matches!(err, LoadError::NotFound { .. }));
    }

    #[test]
    fn test_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "email,age").unwrap();
        writeln!(file, "a@b.com,30").unwrap();
        writeln!(file, "bad,").unwrap();
        let ds = load_csv(file.path()).unwrap();
        assert_eq!(ds.row_count(), 2);
        assert_eq!(ds.column("age").unwrap().null_count(), 1);
    }

    #[test]
    fn test_from_reader() {
        let source = CsvSource::from_reader("upload.csv", "x\n1\n2\n".as_bytes()).unwrap();
        assert_eq!(source.name(), "upload.csv");
        assert_eq!(source.load().unwrap().row_count(), 2);
    }
}
