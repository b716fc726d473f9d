//! Tabular data model
//!
//! A [`RawTable`] is what a source hands over: the provider's headers and rows,
//! untouched. A [`Table`] is what a transformer produces and a loader writes.
//! Both keep every row aligned positionally with the column list.

use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// A single cell value
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Scalar {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&Value> for Scalar {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => n.as_f64().map(Self::Float).unwrap_or(Self::Null),
            },
            Value::String(s) => Self::Text(s.clone()),
            // Nested values are kept as their JSON text
            other => Self::Text(other.to_string()),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(x) => write!(f, "{}", x),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Shape problems found while assembling a table
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ShapeError {
    #[error("row {row} has {actual} values but there are {expected} columns")]
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("columns [{}] do not match [{}]", .actual.join(", "), .expected.join(", "))]
    ColumnsDiffer {
        expected: Vec<String>,
        actual: Vec<String>,
    },
}

fn check_rows(columns: &[String], rows: &[Vec<Scalar>]) -> Result<(), ShapeError> {
    match rows
        .iter()
        .enumerate()
        .find(|(_, row)| row.len() != columns.len())
    {
        Some((row, values)) => Err(ShapeError::RaggedRow {
            row,
            expected: columns.len(),
            actual: values.len(),
        }),
        None => Ok(()),
    }
}

/// Rows exactly as the provider returned them
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    columns: Vec<String>,
    rows: Vec<Vec<Scalar>>,
}

impl RawTable {
    /// Build a raw table, checking every row against the column count
    pub fn try_new(columns: Vec<String>, rows: Vec<Vec<Scalar>>) -> Result<Self, ShapeError> {
        check_rows(&columns, &rows)?;
        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Scalar>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append another table's rows after this table's rows.
    ///
    /// An empty table with no columns adopts the other table's columns;
    /// otherwise the column lists must be identical.
    pub fn append(&mut self, other: RawTable) -> Result<(), ShapeError> {
        if self.columns.is_empty() && self.rows.is_empty() {
            *self = other;
            return Ok(());
        }
        if self.columns != other.columns {
            return Err(ShapeError::ColumnsDiffer {
                expected: self.columns.clone(),
                actual: other.columns,
            });
        }
        self.rows.extend(other.rows);
        Ok(())
    }

    pub fn into_parts(self) -> (Vec<String>, Vec<Vec<Scalar>>) {
        (self.columns, self.rows)
    }
}

/// A normalized table, ready to be loaded
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Scalar>>,
}

impl Table {
    pub fn try_new(columns: Vec<String>, rows: Vec<Vec<Scalar>>) -> Result<Self, ShapeError> {
        check_rows(&columns, &rows)?;
        Ok(Self { columns, rows })
    }

    /// Caller guarantees every row matches the column count
    pub(crate) fn from_aligned(columns: Vec<String>, rows: Vec<Vec<Scalar>>) -> Self {
        debug_assert!(check_rows(&columns, &rows).is_ok());
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Scalar>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// All values of one column, top to bottom
    pub fn column(&self, name: &str) -> Option<Vec<&Scalar>> {
        let index = self.column_index(name)?;
        Some(self.rows.iter().map(|row| &row[index]).collect())
    }
}
