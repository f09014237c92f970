//! # anomaly-guard - Data-Quality Anomaly Detection for Rust
//!
//! anomaly-guard loads an arbitrary tabular dataset, classifies its columns,
//! runs a set of independent detectors over them and merges every finding
//! into one ordered [`AnomalyReport`](core::AnomalyReport).
//!
//! ## Quick Start
//!
//! ```rust
//! use anomaly_guard::prelude::*;
//!
//! let csv = "id,age,email\n\
//!            1,31,ann@example.com\n\
//!            2,,bob@example\n\
//!            3,29,cat@example.org\n";
//!
//! let dataset = load_csv_str(csv)?;
//! let report = AnomalyPipeline::default().run(&dataset);
//!
//! for record in &report {
//!     println!("{} in '{}': {}", record.kind(), record.column(), record.description());
//! }
//! assert!(report.by_kind(&AnomalyKind::MissingValues).any(|r| r.column() == "age"));
//! assert!(report.by_kind(&AnomalyKind::FormatViolation).any(|r| r.column() == "email"));
//! # Ok::<(), anomaly_guard::error::GuardError>(())
//! ```
//!
//! ## Pipeline
//!
//! ```text
//! CSV ──▶ sources ──▶ Dataset (columns classified once)
//!                        │
//!                        ▼
//!                  AnomalyPipeline ──▶ AnomalyReport ──▶ formatters
//!                        │                    │
//!              detectors (per column)         └──▶ explain (prompt + statistics)
//! ```
//!
//! ## Detectors
//!
//! - **Missing values**: every column with absent cells
//! - **Statistical outliers**: isolation forest on numeric columns, flagging
//!   values below a configurable percentile of decision scores
//! - **Format violations**: rule-driven pattern checks (email by default)
//!
//! Detectors are isolated: a failure or panic on one column is logged and
//! drops only that contribution. Loading, by contrast, is all-or-nothing.
//!
//! ## Determinism
//!
//! The outlier model is seeded, so two runs over the same data and
//! configuration produce byte-identical JSON reports.
//!
//! ## Logging
//!
//! The crate emits `tracing` events and never installs a subscriber. See
//! [`logging::setup::init_logging`] for binaries.

pub mod analyzers;
pub mod config;
pub mod core;
pub mod dataset;
pub mod detectors;
pub mod error;
pub mod explain;
pub mod formatters;
pub mod logging;
pub mod prelude;
pub mod sources;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_fixtures;
