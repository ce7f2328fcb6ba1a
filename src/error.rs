// src/error.rs

use thiserror::Error;

/// Errors surfaced by loading, reindexing and writing field grids.
#[derive(Debug, Error)]
pub enum GridError {
    /// Fewer than two non-empty lines in the input.
    #[error("input has fewer than two non-empty lines")]
    EmptyInput,

    /// The line carrying the grid extent could not be read as `nx ny nz`.
    #[error("malformed grid header '{line}': {reason}")]
    MalformedHeader { line: String, reason: String },

    /// A data line is too short to hold the leading coordinate columns.
    #[error("data lines have {found} columns, at least {needed} required")]
    TooFewColumns { found: usize, needed: usize },

    /// A classifier needs more field components than the table carries.
    #[error("{what} needs {needed} components starting at column {offset}, table has {found}")]
    MissingComponents {
        what: &'static str,
        needed: usize,
        offset: usize,
        found: usize,
    },

    /// A requested output column does not exist.
    #[error("column {column} out of range ({count} components)")]
    ColumnOutOfRange { column: usize, count: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl GridError {
    pub(crate) fn malformed<S: Into<String>>(line: &str, reason: S) -> Self {
        Self::MalformedHeader {
            line: line.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, GridError>;
