//! Pipeline orchestration and run output.
//!
//! ```text
//! Dataset ──▶ AnomalyPipeline
//!                 ├── MissingValueDetector ─┐
//!                 ├── OutlierDetector ──────┼──▶ AnomalyReport
//!                 └── FormatValidator ──────┘      + RunDiagnostics
//! ```
//!
//! - **[`AnomalyPipeline`]**: runs every registered detector over every column
//! - **[`AnomalyReport`]**: the ordered findings of one run
//! - **[`RunDiagnostics`]**: every (detector, column) outcome, including skips
//!   and failures

pub mod pipeline;
pub mod report;

pub use pipeline::{AnomalyPipeline, AnomalyPipelineBuilder};
pub use report::{AnomalyReport, OutcomeEntry, RunDiagnostics};
