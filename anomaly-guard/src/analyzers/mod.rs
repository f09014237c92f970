//! Column-level analysis shared by detectors and collaborators.
//!
//! - [`classifier`]: assigns each column a [`ColumnKind`] from its storage type
//! - [`statistics`]: on-demand [`ColumnStatistics`] bundles for explanation requests

pub mod classifier;
pub mod statistics;

pub use classifier::ColumnKind;
pub use statistics::{ColumnStatistics, ValueCount, TOP_VALUES_LIMIT};
