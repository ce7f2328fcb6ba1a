// src/loader.rs
//
// Readers for whitespace-delimited sample files.
//
// Two layouts exist and each has its own entry point:
//  - grid files (`load_grid`): `x y z v1 v2 ...` per line. The extent sits on a
//    header line or on the trailing line; lines too short to hold every
//    column are dropped.
//  - column tables (`load_column_table`): `v1 v2 ...` per line, no coordinates
//    and no extent. Short lines are zero-filled so rows stay aligned.
//
// Which line (if any) is a header is decided by an explicit `HeaderStrategy`.
// Unparseable value tokens read as 0.0; an unparseable extent is an error.

use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{GridError, Result};
use crate::grid::GridExtent;
use crate::table::FieldTable;

/// Leading coordinate columns on every grid-file line.
pub const COORDINATE_COLUMNS: usize = 3;

/// How to decide whether line 1 is a header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum HeaderStrategy {
    /// Lines 1 and 2 with different token counts: line 1 is a header.
    /// Equal counts: no header, the extent is on the last line.
    #[default]
    TokenCount,
    /// As `TokenCount`, except equal token counts with a first token of
    /// literal 0 (or a non-number) also mean "line 1 is a header".
    LeadingZero,
    /// Line 1 is always a header.
    FirstLine,
    /// There is never a header line.
    LastLine,
}

/// Resolved position of the extent line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HeaderLayout {
    /// Line 1 carries the extent; data starts on line 2.
    Leading,
    /// Every line is data; for grid files the last one also carries the extent.
    Trailing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HeaderDecision {
    pub layout: HeaderLayout,
    /// Set by the token-count strategies when lines 1 and 2 look alike but
    /// line 1 starts with 0, so both readings of the file are plausible.
    pub ambiguous: bool,
}

fn token_count(line: &str) -> usize {
    line.split_whitespace().count()
}

fn leads_with_zero(line: &str) -> bool {
    match line.split_whitespace().next().map(str::parse::<f64>) {
        Some(Ok(v)) => v == 0.0,
        _ => true,
    }
}

impl HeaderStrategy {
    pub fn resolve(self, first: &str, second: &str) -> HeaderDecision {
        let same_shape = token_count(first) == token_count(second);
        let ambiguous = matches!(self, Self::TokenCount | Self::LeadingZero)
            && same_shape
            && leads_with_zero(first);
        let layout = match self {
            Self::FirstLine => HeaderLayout::Leading,
            Self::LastLine => HeaderLayout::Trailing,
            Self::TokenCount if same_shape => HeaderLayout::Trailing,
            Self::LeadingZero if same_shape && !ambiguous => HeaderLayout::Trailing,
            Self::TokenCount | Self::LeadingZero => HeaderLayout::Leading,
        };
        HeaderDecision { layout, ambiguous }
    }
}

/// A loaded grid file.
#[derive(Debug, Clone, PartialEq)]
pub struct GridData {
    pub table: FieldTable,
    pub extent: GridExtent,
    pub header: HeaderDecision,
}

impl GridData {
    /// Field components per point (columns after the coordinates).
    pub fn components(&self) -> usize {
        self.table.components()
    }
}

/// A loaded column table.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnData {
    pub table: FieldTable,
    pub header: HeaderDecision,
}

#[inline]
fn parse_value(token: &str) -> f64 {
    token.parse::<f64>().unwrap_or(0.0)
}

fn parse_extent(line: &str) -> Result<GridExtent> {
    let tokens: Vec<&str> = line.split_whitespace().take(3).collect();
    if tokens.len() < 3 {
        return Err(GridError::malformed(line, "expected three point counts"));
    }
    let mut dims = [0usize; 3];
    for (d, tok) in dims.iter_mut().zip(&tokens) {
        *d = tok
            .parse::<usize>()
            .map_err(|_| GridError::malformed(line, format!("'{tok}' is not a point count")))?;
    }
    let extent = GridExtent::new(dims[0], dims[1], dims[2]);
    if extent.checked_points().is_none() {
        return Err(GridError::malformed(line, "point count overflows"));
    }
    Ok(extent)
}

fn non_empty_lines(text: &str) -> Result<Vec<&str>> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    if lines.len() < 2 {
        return Err(GridError::EmptyInput);
    }
    Ok(lines)
}

fn resolve_header(strategy: HeaderStrategy, lines: &[&str]) -> HeaderDecision {
    let header = strategy.resolve(lines[0], lines[1]);
    if header.ambiguous {
        warn!(
            ?strategy,
            layout = ?header.layout,
            first_line = lines[0],
            "line 1 could be a header or data; pick an explicit header strategy to silence this"
        );
    }
    header
}

/// Parse a grid file: three coordinate columns, then the field components.
///
/// At most `nx*ny*nz` data lines are read. Lines with fewer tokens than line 2
/// are skipped, so a damaged file yields a shorter table.
pub fn load_grid(text: &str, strategy: HeaderStrategy) -> Result<GridData> {
    let lines = non_empty_lines(text)?;
    let header = resolve_header(strategy, &lines);

    let (extent, data_lines) = match header.layout {
        HeaderLayout::Leading => (parse_extent(lines[0])?, &lines[1..]),
        HeaderLayout::Trailing => (parse_extent(lines[lines.len() - 1])?, &lines[..]),
    };

    let width = token_count(lines[1]);
    let components = width
        .checked_sub(COORDINATE_COLUMNS)
        .ok_or(GridError::TooFewColumns {
            found: width,
            needed: COORDINATE_COLUMNS,
        })?;

    let n_points = extent.n_points();
    // the extent is only a promise; size the table by what the file holds
    let mut table = FieldTable::with_capacity(components, n_points.min(data_lines.len()));
    let mut skipped = 0usize;
    for line in data_lines.iter().take(n_points) {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < width {
            skipped += 1;
            continue;
        }
        table.push_row(tokens[COORDINATE_COLUMNS..width].iter().map(|t| parse_value(t)));
    }

    if skipped > 0 {
        debug!(skipped, "dropped short data lines");
    }
    if table.rows() < n_points {
        warn!(
            rows = table.rows(),
            expected = n_points,
            "grid file is partial; missing points read as zero"
        );
    }
    debug!(
        nx = extent.nx,
        ny = extent.ny,
        nz = extent.nz,
        components,
        layout = ?header.layout,
        "loaded grid"
    );

    Ok(GridData {
        table,
        extent,
        header,
    })
}

pub fn load_grid_file(path: &Path, strategy: HeaderStrategy) -> Result<GridData> {
    let bytes = fs::read(path)?;
    load_grid(&String::from_utf8_lossy(&bytes), strategy)
}

/// Parse a coordinate-free column table.
///
/// The column count is the token count of line 2; every data line becomes a
/// row, zero-filled when short.
pub fn load_column_table(text: &str, strategy: HeaderStrategy) -> Result<ColumnData> {
    let lines = non_empty_lines(text)?;
    let header = resolve_header(strategy, &lines);

    let data_lines = match header.layout {
        HeaderLayout::Leading => &lines[1..],
        HeaderLayout::Trailing => &lines[..],
    };

    let mut table = FieldTable::with_capacity(token_count(lines[1]), data_lines.len());
    for line in data_lines {
        table.push_row(line.split_whitespace().map(parse_value));
    }
    debug!(
        rows = table.rows(),
        columns = table.components(),
        "loaded column table"
    );

    Ok(ColumnData { table, header })
}

pub fn load_column_table_file(path: &Path, strategy: HeaderStrategy) -> Result<ColumnData> {
    let bytes = fs::read(path)?;
    load_column_table(&String::from_utf8_lossy(&bytes), strategy)
}
