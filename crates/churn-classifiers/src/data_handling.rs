//! In-memory tabular data used by normalization, training and inference.
//!
//! A `Table` is an ordered list of named columns of equal length. Cells are
//! `Option<Scalar>`, with `None` standing for a missing value.
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ChurnError, Result};

/// A single feature value: either a number or a piece of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Number(f64),
    Text(String),
}

/// A possibly missing table cell.
pub type Cell = Option<Scalar>;

impl Scalar {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Number(v) => Some(*v),
            Scalar::Text(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Text(s) => Some(s.as_str()),
            Scalar::Number(_) => None,
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Scalar::Number(_))
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Number(v) => write!(f, "{}", v),
            Scalar::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Number(value)
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Scalar::Number(value as f64)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Text(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Cell>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Cell>) -> Self {
        Column {
            name: name.into(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// True when every cell holds a number (no text, no missing values).
    pub fn is_numeric(&self) -> bool {
        self.values
            .iter()
            .all(|cell| matches!(cell, Some(Scalar::Number(_))))
    }

    /// All values as numbers, or `None` if any cell is not a number.
    pub fn numbers(&self) -> Option<Vec<f64>> {
        self.values
            .iter()
            .map(|cell| cell.as_ref().and_then(Scalar::as_f64))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
    nrows: usize,
}

impl Table {
    /// An empty table with the given headers and no rows.
    pub fn with_headers<S: AsRef<str>>(headers: &[S]) -> Self {
        Table {
            columns: headers
                .iter()
                .map(|name| Column::new(name.as_ref(), Vec::new()))
                .collect(),
            nrows: 0,
        }
    }

    pub fn from_columns(columns: Vec<Column>) -> Result<Self> {
        let nrows = columns.first().map(Column::len).unwrap_or(0);
        if let Some(bad) = columns.iter().find(|c| c.len() != nrows) {
            return Err(ChurnError::InvalidTable(format!(
                "column '{}' has {} rows, expected {}",
                bad.name,
                bad.len(),
                nrows
            )));
        }
        Ok(Table { columns, nrows })
    }

    /// Build a one-row table holding `names` in order, taking each value
    /// verbatim from `values`. Names absent from `values` become missing cells.
    pub fn single_row(names: &[String], values: &BTreeMap<String, Scalar>) -> Self {
        let columns = names
            .iter()
            .map(|name| Column::new(name.as_str(), vec![values.get(name).cloned()]))
            .collect();
        Table { columns, nrows: 1 }
    }

    pub fn push_row(&mut self, row: Vec<Cell>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(ChurnError::InvalidTable(format!(
                "row {} has {} values, expected {}",
                self.nrows + 1,
                row.len(),
                self.columns.len()
            )));
        }
        for (column, cell) in self.columns.iter_mut().zip(row) {
            column.values.push(cell);
        }
        self.nrows += 1;
        Ok(())
    }

    pub fn push_column(&mut self, column: Column) -> Result<()> {
        if !self.columns.is_empty() && column.len() != self.nrows {
            return Err(ChurnError::InvalidTable(format!(
                "column '{}' has {} rows, expected {}",
                column.name,
                column.len(),
                self.nrows
            )));
        }
        self.nrows = column.len();
        self.columns.push(column);
        Ok(())
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn into_columns(self) -> Vec<Column> {
        self.columns
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn row(&self, idx: usize) -> Vec<Cell> {
        self.columns.iter().map(|c| c.values[idx].clone()).collect()
    }

    /// Project the table onto `names`, in that order.
    pub fn select(&self, names: &[String]) -> Result<Table> {
        let missing: Vec<String> = names
            .iter()
            .filter(|name| self.column(name).is_none())
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(ChurnError::SchemaMismatch {
                missing,
                available: self.column_names(),
            });
        }
        let columns = names
            .iter()
            .filter_map(|name| self.column(name).cloned())
            .collect();
        Ok(Table {
            columns,
            nrows: self.nrows,
        })
    }

    /// Split the table into single-row tables.
    pub fn rows(&self) -> Vec<Table> {
        (0..self.nrows)
            .map(|idx| Table {
                columns: self
                    .columns
                    .iter()
                    .map(|c| Column::new(c.name.as_str(), vec![c.values[idx].clone()]))
                    .collect(),
                nrows: 1,
            })
            .collect()
    }
}
