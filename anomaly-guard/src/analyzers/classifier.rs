//! Column classification by storage type.
//!
//! Every column is assigned exactly one [`ColumnKind`] when the dataset is
//! built. Detectors match on the kind instead of probing Arrow types at each
//! use site.
//!
//! Classification looks at how values are stored, not at their cardinality:
//! an integer column with three distinct values is still [`ColumnKind::Numeric`].

use arrow::datatypes::DataType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Semantic kind of a column, gating which detectors apply to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Every non-null value is a real number.
    Numeric,
    /// Values are strings, booleans or temporal values.
    Categorical,
    /// No values were observed, or the storage type is not classifiable.
    Unknown,
}

impl ColumnKind {
    /// Classifies an Arrow storage type.
    pub fn from_data_type(data_type: &DataType) -> Self {
        match data_type {
            DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float16
            | DataType::Float32
            | DataType::Float64
            | DataType::Decimal128(_, _)
            | DataType::Decimal256(_, _) => Self::Numeric,
            DataType::Utf8
            | DataType::LargeUtf8
            | DataType::Utf8View
            | DataType::Boolean
            | DataType::Date32
            | DataType::Date64
            | DataType::Timestamp(_, _)
            | DataType::Time32(_)
            | DataType::Time64(_) => Self::Categorical,
            DataType::Dictionary(_, value_type) => match Self::from_data_type(value_type) {
                Self::Unknown => Self::Unknown,
                _ => Self::Categorical,
            },
            _ => Self::Unknown,
        }
    }

    /// Returns `true` for [`ColumnKind::Numeric`].
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Numeric)
    }

    /// Returns the kind name used in reports and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Numeric => "numeric",
            Self::Categorical => "categorical",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
