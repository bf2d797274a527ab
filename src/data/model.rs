use std::fmt;

use crate::error::{LogError, Result};

// ---------------------------------------------------------------------------
// Value – a single cell of a parsed table
// ---------------------------------------------------------------------------

/// One cell of a [`DataTable`].
///
/// Logger exports arrive as text; cells stay textual until a consumer
/// (transform, FFT) coerces them to numbers. Derived columns (elapsed time,
/// rotated axes) are stored as `Number` directly.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Number(f64),
    /// Padding for ragged rows; coerces to no number.
    Empty,
}

impl Value {
    /// Build a cell from one raw CSV field.
    pub fn from_field(field: &str) -> Self {
        let trimmed = field.trim();
        if trimmed.is_empty() {
            Value::Empty
        } else {
            Value::Text(trimmed.to_string())
        }
    }

    /// Try to interpret the cell as an `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(v) => Some(*v),
            Value::Text(s) => s.trim().parse::<f64>().ok(),
            Value::Empty => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => write!(f, "{s}"),
            Value::Number(v) => write!(f, "{v}"),
            Value::Empty => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Column / Series
// ---------------------------------------------------------------------------

/// A named column of cells.
#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub values: Vec<Value>,
}

/// A named, fully numeric column. Output type of the transform and FFT
/// layers.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub values: Vec<f64>,
}

// ---------------------------------------------------------------------------
// DataTable – the normalized tabular dataset
// ---------------------------------------------------------------------------

/// Rectangular table with pairwise-distinct column names, row-indexed in
/// file order.
#[derive(Debug, Clone, Default)]
pub struct DataTable {
    columns: Vec<Column>,
}

impl DataTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from header names and raw string rows.
    ///
    /// Rows with fewer fields than the header are padded with
    /// [`Value::Empty`]; rows with more fields are truncated. Header names
    /// are made unique via [`unique_names`].
    pub fn from_rows(header: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let mut columns: Vec<Column> = unique_names(&header)
            .into_iter()
            .map(|name| Column {
                name,
                values: Vec::with_capacity(rows.len()),
            })
            .collect();

        for row in &rows {
            for (i, col) in columns.iter_mut().enumerate() {
                match row.get(i) {
                    Some(field) => col.values.push(Value::from_field(field)),
                    None => col.values.push(Value::Empty),
                }
            }
        }

        DataTable { columns }
    }

    /// Build a header-less table with positional column names `col{i}`.
    /// Width is the widest row; shorter rows are padded.
    pub fn from_rows_positional(rows: Vec<Vec<String>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        let header = (0..width).map(|i| format!("col{i}")).collect();
        Self::from_rows(header, rows)
    }

    pub fn num_rows(&self) -> usize {
        self.columns.first().map_or(0, |c| c.values.len())
    }

    pub fn num_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.num_rows() == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Drop a column. No-op when absent.
    pub fn remove_column(&mut self, name: &str) {
        self.columns.retain(|c| c.name != name);
    }

    /// Append (or overwrite) a numeric column. The value count must equal
    /// the current row count unless the table is column-less.
    pub fn set_numeric_column(&mut self, name: &str, values: Vec<f64>) {
        let values: Vec<Value> = values.into_iter().map(Value::Number).collect();
        if let Some(col) = self.columns.iter_mut().find(|c| c.name == name) {
            col.values = values;
        } else {
            self.columns.push(Column {
                name: name.to_string(),
                values,
            });
        }
    }

    /// Coerce a column to `f64`, failing on the first non-numeric cell.
    pub fn numeric_column(&self, name: &str) -> Result<Vec<f64>> {
        let col = self
            .column(name)
            .ok_or_else(|| LogError::UnknownColumn(name.to_string()))?;
        col.values
            .iter()
            .enumerate()
            .map(|(row, v)| {
                v.as_f64().ok_or_else(|| LogError::NotNumeric {
                    column: name.to_string(),
                    row,
                    value: v.to_string(),
                })
            })
            .collect()
    }

    /// Coerce a column to `f64`, returning `None` when any cell fails.
    /// Used by the FFT layer to skip non-numeric columns silently.
    pub fn try_numeric_column(&self, name: &str) -> Option<Vec<f64>> {
        let col = self.column(name)?;
        col.values.iter().map(Value::as_f64).collect()
    }
}

// ---------------------------------------------------------------------------
// Header uniqueness
// ---------------------------------------------------------------------------

/// Make header names pairwise distinct.
///
/// Blank cells become the positional placeholder `replace{i}`; a later
/// duplicate of an earlier name gets a `_{i}` suffix.
pub fn unique_names(header: &[String]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::with_capacity(header.len());
    for (i, raw) in header.iter().enumerate() {
        let trimmed = raw.trim();
        let mut name = if trimmed.is_empty() {
            format!("replace{i}")
        } else {
            trimmed.to_string()
        };
        if seen.iter().any(|n| n == &name) {
            name = format!("{name}_{i}");
        }
        seen.push(name);
    }
    seen
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
