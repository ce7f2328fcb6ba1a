// src/table.rs
//
// Flat per-point field storage.
//
// Rows are kept in the order they were read (input order, X slowest / Z
// fastest for grid files). Lookups past the end of a partial file read as
// zeros so reindexing never fails on short inputs.

use serde::Serialize;

/// Rows of `components` floats each, stored contiguously.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldTable {
    components: usize,
    rows: usize,
    values: Vec<f64>,
}

/// Min / max / mean of one component column (all 0 for an empty column).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

impl FieldTable {
    pub fn new(components: usize) -> Self {
        Self {
            components,
            rows: 0,
            values: Vec::new(),
        }
    }

    pub fn with_capacity(components: usize, rows: usize) -> Self {
        Self {
            components,
            rows: 0,
            values: Vec::with_capacity(components * rows),
        }
    }

    /// Append a row. Extra values are dropped, missing ones are zero-filled.
    pub fn push_row<I>(&mut self, row: I)
    where
        I: IntoIterator<Item = f64>,
    {
        let start = self.values.len();
        self.values.extend(row.into_iter().take(self.components));
        self.values.resize(start + self.components, 0.0);
        self.rows += 1;
    }

    pub fn components(&self) -> usize {
        self.components
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn row(&self, r: usize) -> Option<&[f64]> {
        if r >= self.rows {
            return None;
        }
        let start = r * self.components;
        Some(&self.values[start..start + self.components])
    }

    /// Value at (row, column), 0.0 when either is out of range.
    #[inline]
    pub fn value(&self, r: usize, c: usize) -> f64 {
        self.row(r).and_then(|row| row.get(c).copied()).unwrap_or(0.0)
    }

    /// Three consecutive components starting at `offset`.
    #[inline]
    pub fn vec3(&self, r: usize, offset: usize) -> [f64; 3] {
        [
            self.value(r, offset),
            self.value(r, offset + 1),
            self.value(r, offset + 2),
        ]
    }

    /// Four consecutive components starting at `offset`.
    #[inline]
    pub fn vec4(&self, r: usize, offset: usize) -> [f64; 4] {
        [
            self.value(r, offset),
            self.value(r, offset + 1),
            self.value(r, offset + 2),
            self.value(r, offset + 3),
        ]
    }

    pub fn column(&self, c: usize) -> impl Iterator<Item = f64> + '_ {
        (0..self.rows).map(move |r| self.value(r, c))
    }

    pub fn column_summary(&self, c: usize) -> ColumnSummary {
        if self.rows == 0 || c >= self.components {
            return ColumnSummary {
                min: 0.0,
                max: 0.0,
                mean: 0.0,
            };
        }
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        for v in self.column(c) {
            min = min.min(v);
            max = max.max(v);
            sum += v;
        }
        ColumnSummary {
            min,
            max,
            mean: sum / self.rows as f64,
        }
    }

    pub fn column_summaries(&self) -> Vec<ColumnSummary> {
        (0..self.components).map(|c| self.column_summary(c)).collect()
    }

    /// (min, max) length of the 3-vectors starting at `offset`, or None when empty.
    pub fn magnitude_range(&self, offset: usize) -> Option<(f64, f64)> {
        (0..self.rows)
            .map(|r| crate::vec3::norm(self.vec3(r, offset)))
            .fold(None, |acc, m| match acc {
                None => Some((m, m)),
                Some((lo, hi)) => Some((lo.min(m), hi.max(m))),
            })
    }
}
