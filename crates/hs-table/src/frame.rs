//! In-memory columnar dataset.
//!
//! A [`Frame`] is an ordered set of named `f64` columns of equal length: one
//! region's logical view over its chained input trees. Frames support the
//! operations the region pipeline needs — defining derived columns from
//! expressions, filtering rows by a boolean expression, event windowing, and
//! appending another frame's rows (chaining).

use rayon::prelude::*;

use crate::error::{Result, TableError};
use crate::expr::{ColumnExpr, truthy};

/// Row-evaluation chunk size for parallel expression evaluation.
const EVAL_CHUNK: usize = 16 * 1024;

/// An ordered collection of equal-length named `f64` columns.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
    n_rows: usize,
}

impl Frame {
    /// Build a frame from `(name, data)` pairs.
    ///
    /// Fails with [`TableError::ColumnMismatch`] if column lengths differ or
    /// a name repeats.
    pub fn from_columns(columns: Vec<(String, Vec<f64>)>) -> Result<Self> {
        let mut frame = Frame::default();
        for (i, (name, data)) in columns.into_iter().enumerate() {
            if frame.names.contains(&name) {
                return Err(TableError::ColumnMismatch(format!("duplicate column '{name}'")));
            }
            if i == 0 {
                frame.n_rows = data.len();
            } else if data.len() != frame.n_rows {
                return Err(TableError::ColumnMismatch(format!(
                    "column '{name}' has {} rows, expected {}",
                    data.len(),
                    frame.n_rows
                )));
            }
            frame.names.push(name);
            frame.columns.push(data);
        }
        Ok(frame)
    }

    /// Number of rows.
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Number of columns.
    #[inline]
    pub fn n_columns(&self) -> usize {
        self.names.len()
    }

    /// Column names in frame order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Data of the named column, if present.
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        let i = self.names.iter().position(|n| n == name)?;
        Some(&self.columns[i])
    }

    /// Evaluate an expression over every row.
    ///
    /// Fails with [`TableError::Expression`] if the expression references a
    /// column the frame does not have.
    pub fn eval(&self, expr: &ColumnExpr) -> Result<Vec<f64>> {
        let inputs: Vec<&[f64]> = expr
            .columns
            .iter()
            .map(|name| {
                self.column(name).ok_or_else(|| {
                    TableError::Expression(format!(
                        "unknown column '{name}' in '{}'",
                        expr.source
                    ))
                })
            })
            .collect::<Result<_>>()?;

        if inputs.is_empty() {
            return Ok(vec![expr.eval_row(&[]); self.n_rows]);
        }

        let mut out = vec![0.0f64; self.n_rows];
        out.par_chunks_mut(EVAL_CHUNK).enumerate().for_each(|(chunk, dst)| {
            let base = chunk * EVAL_CHUNK;
            let mut row = vec![0.0f64; inputs.len()];
            for (k, slot) in dst.iter_mut().enumerate() {
                for (j, col) in inputs.iter().enumerate() {
                    row[j] = col[base + k];
                }
                *slot = expr.eval_row(&row);
            }
        });
        Ok(out)
    }

    /// Add a derived column computed from `expr`.
    ///
    /// Redefining an existing name replaces its data in place (the new
    /// definition shadows the old one for all subsequent stages); a new name
    /// is appended after the existing columns.
    pub fn define(&mut self, name: &str, expr: &ColumnExpr) -> Result<()> {
        let data = self.eval(expr)?;
        match self.names.iter().position(|n| n == name) {
            Some(i) => self.columns[i] = data,
            None => {
                self.names.push(name.to_string());
                self.columns.push(data);
            }
        }
        Ok(())
    }

    /// Keep only the rows where `selection` evaluates truthy (nonzero).
    pub fn filter(&self, selection: &ColumnExpr) -> Result<Frame> {
        let mask = self.eval(selection)?;
        let keep: Vec<usize> =
            (0..self.n_rows).filter(|&i| truthy(mask[i])).collect();
        let columns = self
            .columns
            .iter()
            .map(|col| keep.iter().map(|&i| col[i]).collect())
            .collect();
        Ok(Frame { names: self.names.clone(), columns, n_rows: keep.len() })
    }

    /// Restrict to a row window: skip `first` rows, keep at most `max`.
    pub fn window(&self, first: usize, max: Option<usize>) -> Frame {
        let start = first.min(self.n_rows);
        let end = match max {
            Some(m) => (start + m).min(self.n_rows),
            None => self.n_rows,
        };
        let columns = self.columns.iter().map(|col| col[start..end].to_vec()).collect();
        Frame { names: self.names.clone(), columns, n_rows: end - start }
    }

    /// Append the rows of `other`, matching columns by name.
    ///
    /// Every column of `self` must be present in `other`; extra columns of
    /// `other` are dropped so the chained column set stays that of the first
    /// file.
    pub fn append(&mut self, other: &Frame) -> Result<()> {
        let incoming: Vec<&[f64]> = self
            .names
            .iter()
            .map(|name| {
                other.column(name).ok_or_else(|| {
                    TableError::ColumnMismatch(format!("column '{name}' missing while chaining"))
                })
            })
            .collect::<Result<_>>()?;
        for (col, src) in self.columns.iter_mut().zip(incoming) {
            col.extend_from_slice(src);
        }
        self.n_rows += other.n_rows;
        Ok(())
    }
}
