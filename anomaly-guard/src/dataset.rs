//! In-memory columnar dataset used by every detector.
//!
//! A [`Dataset`] is an ordered list of named [`Column`]s backed by Arrow
//! arrays. Row indices are the positions `0..row_count` and stay stable for
//! the lifetime of the dataset. Detectors only ever receive shared references.

use std::collections::HashSet;
use std::fmt::{self, Write};

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::buffer::NullBuffer;
use arrow::datatypes::{
    DataType, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type, Int8Type, UInt16Type,
    UInt32Type, UInt64Type, UInt8Type,
};
use arrow::record_batch::RecordBatch;
use arrow::util::display::array_value_to_string;
use serde::{Deserialize, Serialize};

use crate::analyzers::ColumnKind;
use crate::error::{DetectorError, LoadError};

const IN_MEMORY_SOURCE: &str = "<memory>";

/// A single cell value copied out of a column for reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    /// Boolean cell.
    Bool(bool),
    /// Integer cell.
    Integer(i64),
    /// Floating-point cell.
    Float(f64),
    /// Any other cell, rendered as text.
    Text(String),
}

impl CellValue {
    /// Returns the numeric value, if the cell is numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the text value, if the cell is text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

/// A named column with its classified kind.
#[derive(Debug, Clone)]
pub struct Column {
    name: String,
    kind: ColumnKind,
    values: ArrayRef,
    nulls: Option<NullBuffer>,
}

impl Column {
    /// Creates a column and classifies it from the array's storage type.
    pub fn new(name: impl Into<String>, values: ArrayRef) -> Self {
        let kind = ColumnKind::from_data_type(values.data_type());
        // Logical nulls so that `NullArray` reports every row as absent.
        let nulls = values.logical_nulls();
        Self {
            name: name.into(),
            kind,
            values,
            nulls,
        }
    }

    /// Column name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Classified kind.
    pub fn kind(&self) -> ColumnKind {
        self.kind
    }

    /// Underlying Arrow array.
    pub fn values(&self) -> &ArrayRef {
        &self.values
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the column has no rows.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns `true` if the cell at `row` is absent.
    pub fn is_null(&self, row: usize) -> bool {
        self.nulls.as_ref().is_some_and(|nulls| nulls.is_null(row))
    }

    /// Number of absent cells.
    pub fn null_count(&self) -> usize {
        self.nulls.as_ref().map_or(0, |nulls| nulls.null_count())
    }

    /// Row indices of absent cells in ascending order.
    pub fn null_rows(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len()).filter(move |&row| self.is_null(row))
    }

    /// Returns the cell at `row` as text, or `None` when absent.
    pub fn text(&self, row: usize) -> Option<String> {
        if self.is_null(row) {
            return None;
        }
        array_value_to_string(self.values.as_ref(), row).ok()
    }

    /// Returns the cell at `row` as a typed [`CellValue`], or `None` when absent.
    pub fn value(&self, row: usize) -> Option<CellValue> {
        if self.is_null(row) {
            return None;
        }
        let array = self.values.as_ref();
        let value = match array.data_type() {
            DataType::Boolean => CellValue::Bool(array.as_boolean().value(row)),
            DataType::Int8 => CellValue::Integer(array.as_primitive::<Int8Type>().value(row).into()),
            DataType::Int16 => {
                CellValue::Integer(array.as_primitive::<Int16Type>().value(row).into())
            }
            DataType::Int32 => {
                CellValue::Integer(array.as_primitive::<Int32Type>().value(row).into())
            }
            DataType::Int64 => CellValue::Integer(array.as_primitive::<Int64Type>().value(row)),
            DataType::UInt8 => {
                CellValue::Integer(array.as_primitive::<UInt8Type>().value(row).into())
            }
            DataType::UInt16 => {
                CellValue::Integer(array.as_primitive::<UInt16Type>().value(row).into())
            }
            DataType::UInt32 => {
                CellValue::Integer(array.as_primitive::<UInt32Type>().value(row).into())
            }
            DataType::UInt64 => {
                let v = array.as_primitive::<UInt64Type>().value(row);
                match i64::try_from(v) {
                    Ok(v) => CellValue::Integer(v),
                    Err(_) => CellValue::Float(v as f64),
                }
            }
            DataType::Float32 => {
                CellValue::Float(array.as_primitive::<Float32Type>().value(row).into())
            }
            DataType::Float64 => CellValue::Float(array.as_primitive::<Float64Type>().value(row)),
            _ => CellValue::Text(self.text(row)?),
        };
        Some(value)
    }

    /// Extracts the non-null values as `f64`, paired with their row indices.
    ///
    /// Fails if the storage type cannot be cast to `Float64`.
    pub fn numeric_values(&self) -> Result<Vec<(usize, f64)>, DetectorError> {
        let floats = arrow::compute::cast(self.values.as_ref(), &DataType::Float64)?;
        Ok(floats
            .as_primitive::<Float64Type>()
            .iter()
            .enumerate()
            .filter_map(|(row, value)| value.map(|v| (row, v)))
            .collect())
    }

    /// Number of distinct non-null values.
    ///
    /// Numeric columns compare by value (`1` and `1.0` are equal); other
    /// columns compare by their text rendering.
    pub fn distinct_count(&self) -> usize {
        if self.kind.is_numeric() {
            if let Ok(values) = self.numeric_values() {
                return values
                    .iter()
                    .map(|(_, v)| canonical_bits(*v))
                    .collect::<HashSet<_>>()
                    .len();
            }
        }
        (0..self.len())
            .filter_map(|row| self.text(row))
            .collect::<HashSet<_>>()
            .len()
    }
}

/// Bit pattern with `-0.0` folded into `0.0` and every NaN folded together.
fn canonical_bits(value: f64) -> u64 {
    if value == 0.0 {
        0.0f64.to_bits()
    } else if value.is_nan() {
        f64::NAN.to_bits()
    } else {
        value.to_bits()
    }
}

/// An ordered collection of equally long, uniquely named columns.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    columns: Vec<Column>,
    row_count: usize,
}

impl Dataset {
    /// Builds a dataset from named arrays.
    ///
    /// All arrays must have the same length and names must be unique.
    pub fn try_new<N: Into<String>>(columns: Vec<(N, ArrayRef)>) -> Result<Self, LoadError> {
        let columns: Vec<Column> = columns
            .into_iter()
            .map(|(name, values)| Column::new(name, values))
            .collect();
        Self::from_columns(columns, IN_MEMORY_SOURCE)
    }

    /// Builds a dataset from an Arrow record batch, keeping the schema order.
    pub fn from_record_batch(batch: &RecordBatch) -> Result<Self, LoadError> {
        Self::from_record_batch_named(batch, IN_MEMORY_SOURCE)
    }

    pub(crate) fn from_record_batch_named(
        batch: &RecordBatch,
        source_name: &str,
    ) -> Result<Self, LoadError> {
        let schema = batch.schema();
        let columns = schema
            .fields()
            .iter()
            .zip(batch.columns())
            .map(|(field, values)| Column::new(field.name().clone(), values.clone()))
            .collect();
        Self::from_columns(columns, source_name)
    }

    fn from_columns(columns: Vec<Column>, source_name: &str) -> Result<Self, LoadError> {
        let row_count = columns.first().map_or(0, Column::len);

        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name()) {
                return Err(LoadError::malformed(
                    source_name,
                    format!("duplicate column name '{}'", column.name()),
                ));
            }
            if column.len() != row_count {
                return Err(LoadError::malformed(
                    source_name,
                    format!(
                        "column '{}' has {} rows, expected {row_count}",
                        column.name(),
                        column.len()
                    ),
                ));
            }
        }

        Ok(Self { columns, row_count })
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Columns in declaration order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Looks up a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    /// Returns `true` if a column with this name exists.
    pub fn contains_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Column names in declaration order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    /// Renders the first `rows` rows as a Markdown table.
    ///
    /// Absent cells are rendered empty. Pipe characters inside cells are escaped.
    pub fn preview_markdown(&self, rows: usize) -> String {
        let mut output = String::new();
        if self.columns.is_empty() {
            return output;
        }

        let header: Vec<String> = self.columns.iter().map(|c| escape_cell(c.name())).collect();
        writeln!(output, "| {} |", header.join(" | ")).unwrap();
        let rule: Vec<&str> = self.columns.iter().map(|_| "---").collect();
        writeln!(output, "| {} |", rule.join(" | ")).unwrap();

        for row in 0..rows.min(self.row_count) {
            let cells: Vec<String> = self
                .columns
                .iter()
                .map(|c| c.text(row).map(|t| escape_cell(&t)).unwrap_or_default())
                .collect();
            writeln!(output, "| {} |", cells.join(" | ")).unwrap();
        }

        output
    }
}

/// Escapes a value for use inside a Markdown table cell.
pub(crate) fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}
