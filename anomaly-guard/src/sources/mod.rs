//! Data source connectors that produce a [`Dataset`](crate::dataset::Dataset).
//!
//! Loading is all-or-nothing: a source either yields a complete dataset or a
//! single [`LoadError`](crate::error::LoadError). Partial datasets are never
//! returned.
//!
//! # Examples
//!
//! ```rust
//! use anomaly_guard::sources::{CsvOptions, CsvSource};
//!
//! let source = CsvSource::from_text("id,email\n1,a@b.com\n2,\n");
//! let dataset = source.load().unwrap();
//! assert_eq!(dataset.row_count(), 2);
//!
//! let tsv = CsvSource::from_text("id\tscore\n1\t0.5\n").with_custom_options(CsvOptions {
//!     delimiter: b'\t',
//!     ..Default::default()
//! });
//! assert_eq!(tsv.load().unwrap().column_count(), 2);
//! ```

mod csv;

pub use csv::{load_csv, load_csv_str, CsvOptions, CsvSource, DEFAULT_NULL_VALUES};
