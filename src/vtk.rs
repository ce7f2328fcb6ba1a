// src/vtk.rs
//
// Legacy-VTK (ASCII, STRUCTURED_POINTS) writers.
//
// Three file kinds share one header:
//  - scalar : one component per point ("SCALARS scalar float")
//  - vector : magnitude, the vector itself and a direction colour
//  - domain : padded integer labels ("SCALARS domain int"), origin (-1,-1,-1)
//
// Points are written X fastest, then Y, then Z. Floats use the classic
// printf "%14.6e" layout (two-digit signed exponent, right-aligned to 14).

use std::fmt;
use std::fs::{File, create_dir_all};
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::{debug, info, warn};

use crate::color::direction_to_rgb;
use crate::domain_grid::PaddedLabels;
use crate::error::{GridError, Result};
use crate::grid::{GridExtent, PaddedLayout, SlabLayout};
use crate::table::FieldTable;
use crate::vec3::norm;

#[derive(Clone, Debug)]
pub struct VtkMeta {
    pub title: String,
}

impl Default for VtkMeta {
    fn default() -> Self {
        Self {
            title: "Structured Points".to_string(),
        }
    }
}

/// Point spacing along x, y, z. Every axis is finite and positive.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Spacing([f64; 3]);

impl Default for Spacing {
    fn default() -> Self {
        Self([1.0; 3])
    }
}

fn sanitize_axis(axis: char, v: f64) -> f64 {
    if v.is_finite() && v > 0.0 {
        v
    } else {
        warn!(axis = %axis, value = v, "invalid spacing, using 1.0");
        1.0
    }
}

impl Spacing {
    pub fn new(values: [f64; 3]) -> Self {
        Self([
            sanitize_axis('x', values[0]),
            sanitize_axis('y', values[1]),
            sanitize_axis('z', values[2]),
        ])
    }

    /// Spacing from user text; missing or unparseable entries become 1.0.
    pub fn parse<S: AsRef<str>>(parts: &[S]) -> Self {
        let mut out = [1.0; 3];
        for (a, (axis, slot)) in ['x', 'y', 'z'].into_iter().zip(out.iter_mut()).enumerate() {
            let parsed = parts.get(a).map(|s| s.as_ref().trim().parse::<f64>());
            *slot = match parsed {
                Some(Ok(v)) => sanitize_axis(axis, v),
                Some(Err(_)) => {
                    warn!(axis = %axis, text = parts[a].as_ref(), "unparseable spacing, using 1.0");
                    1.0
                }
                None => 1.0,
            };
        }
        Self(out)
    }

    pub fn values(&self) -> [f64; 3] {
        self.0
    }
}

impl fmt::Display for Spacing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.0[0], self.0[1], self.0[2])
    }
}

/// `%14.6e` float formatting.
#[derive(Clone, Copy, Debug)]
pub struct Sci(pub f64);

impl fmt::Display for Sci {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = self.0;
        let text = if v.is_nan() {
            "nan".to_string()
        } else if v.is_infinite() {
            if v > 0.0 { "inf".to_string() } else { "-inf".to_string() }
        } else {
            // Rust prints "1.500000e-3"; widen the exponent to "e-03"
            let raw = format!("{v:.6e}");
            match raw.split_once('e') {
                Some((mantissa, exp)) => {
                    let exp: i32 = exp.parse().map_err(|_| fmt::Error)?;
                    let sign = if exp < 0 { '-' } else { '+' };
                    format!("{mantissa}e{sign}{:02}", exp.abs())
                }
                None => raw,
            }
        };
        write!(f, "{text:>14}")
    }
}

fn ensure_parent_dir(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }
    Ok(())
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    ensure_parent_dir(path)?;
    Ok(BufWriter::new(File::create(path)?))
}

fn write_header<W: Write>(
    w: &mut W,
    meta: &VtkMeta,
    dims: [usize; 3],
    origin: [i64; 3],
    spacing: &Spacing,
) -> std::io::Result<()> {
    writeln!(w, "# vtk DataFile Version 3.0")?;
    writeln!(w, "{}", meta.title)?;
    writeln!(w, "ASCII")?;
    writeln!(w)?;
    writeln!(w, "DATASET STRUCTURED_POINTS")?;
    writeln!(w, "DIMENSIONS {} {} {}", dims[0], dims[1], dims[2])?;
    writeln!(w, "ORIGIN {} {} {}", origin[0], origin[1], origin[2])?;
    writeln!(w, "SPACING {spacing}")?;
    writeln!(w)?;
    writeln!(w, "POINT_DATA {}", dims[0] * dims[1] * dims[2])?;
    Ok(())
}

fn check_column(table: &FieldTable, column: usize) -> Result<()> {
    if column >= table.components() {
        return Err(GridError::ColumnOutOfRange {
            column,
            count: table.components(),
        });
    }
    Ok(())
}

fn note_partial(table: &FieldTable, extent: GridExtent) {
    if table.rows() < extent.n_points() {
        debug!(
            rows = table.rows(),
            expected = extent.n_points(),
            "partial table, missing points are written as zero"
        );
    }
}

/// Write component `column` as a scalar field.
pub fn write_scalar_grid(
    path: &Path,
    table: &FieldTable,
    column: usize,
    extent: GridExtent,
    spacing: &Spacing,
    meta: &VtkMeta,
) -> Result<()> {
    check_column(table, column)?;
    note_partial(table, extent);

    let layout = SlabLayout::new(extent);
    let mut w = create(path)?;
    write_header(&mut w, meta, layout.dims(), [0, 0, 0], spacing)?;
    writeln!(w, "SCALARS scalar float")?;
    writeln!(w, "LOOKUP_TABLE default")?;
    for row in layout.source_rows() {
        writeln!(w, "{}", Sci(table.value(row, column)))?;
    }
    w.flush()?;

    info!(path = %path.display(), column, points = layout.n_points(), "wrote scalar grid");
    Ok(())
}

/// Write components `columns` as a vector field with magnitude and colour.
pub fn write_vector_grid(
    path: &Path,
    table: &FieldTable,
    columns: [usize; 3],
    extent: GridExtent,
    spacing: &Spacing,
    meta: &VtkMeta,
) -> Result<()> {
    for c in columns {
        check_column(table, c)?;
    }
    note_partial(table, extent);

    let layout = SlabLayout::new(extent);
    let vectors: Vec<[f64; 3]> = layout
        .source_rows()
        .map(|r| columns.map(|c| table.value(r, c)))
        .collect();
    let magnitudes: Vec<f64> = vectors.iter().map(|v| norm(*v)).collect();
    let max_magnitude = magnitudes.iter().copied().reduce(f64::max).unwrap_or(1.0);
    let magnitude_range = (0.0, max_magnitude);
    let z_range = (-max_magnitude, max_magnitude);

    let mut w = create(path)?;
    write_header(&mut w, meta, layout.dims(), [0, 0, 0], spacing)?;

    writeln!(w, "SCALARS Magnitude float")?;
    writeln!(w, "LOOKUP_TABLE default")?;
    for m in &magnitudes {
        writeln!(w, "{}", Sci(*m))?;
    }

    writeln!(w)?;
    writeln!(w, "VECTORS vector float")?;
    for v in &vectors {
        writeln!(w, "{} {} {}", Sci(v[0]), Sci(v[1]), Sci(v[2]))?;
    }

    writeln!(w)?;
    writeln!(w, "VECTORS RGB unsigned_char")?;
    for v in &vectors {
        let [r, g, b] = direction_to_rgb(*v, magnitude_range, z_range);
        writeln!(w, "{r} {g} {b}")?;
    }
    w.flush()?;

    info!(
        path = %path.display(),
        columns = ?columns,
        max_magnitude,
        "wrote vector grid"
    );
    Ok(())
}

/// Write padded domain labels.
pub fn write_domain_grid(
    path: &Path,
    labels: &PaddedLabels,
    spacing: &Spacing,
    meta: &VtkMeta,
) -> Result<()> {
    let mut w = create(path)?;
    write_header(&mut w, meta, labels.dims(), PaddedLayout::ORIGIN, spacing)?;
    writeln!(w, "SCALARS domain int")?;
    writeln!(w, "LOOKUP_TABLE default")?;
    for l in labels.labels() {
        writeln!(w, "{l}")?;
    }
    w.flush()?;

    info!(path = %path.display(), dims = ?labels.dims(), "wrote domain grid");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sci_matches_printf_layout() {
        assert_eq!(Sci(1.0).to_string(), "  1.000000e+00");
        assert_eq!(Sci(-0.0015).to_string(), " -1.500000e-03");
        assert_eq!(Sci(0.0).to_string(), "  0.000000e+00");
        assert_eq!(Sci(6.02e23).to_string(), "  6.020000e+23");
        assert_eq!(Sci(1e-120).to_string(), " 1.000000e-120");
        assert_eq!(Sci(f64::NAN).to_string(), "           nan");
    }

    #[test]
    fn spacing_falls_back_to_one() {
        assert_eq!(Spacing::default().values(), [1.0; 3]);
        assert_eq!(Spacing::new([2.0, -1.0, f64::NAN]).values(), [2.0, 1.0, 1.0]);
        assert_eq!(Spacing::parse(&["0.5", "abc"]).values(), [0.5, 1.0, 1.0]);
        assert_eq!(Spacing::parse(&["0", " 3 ", "inf"]).values(), [1.0, 3.0, 1.0]);
        assert_eq!(Spacing::new([0.5, 1.0, 2.0]).to_string(), "0.5 1 2");
    }

    #[test]
    fn header_lines_in_order() {
        let mut buf = Vec::new();
        write_header(&mut buf, &VtkMeta::default(), [2, 3, 4], [-1, -1, -1], &Spacing::default())
            .unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "# vtk DataFile Version 3.0",
                "Structured Points",
                "ASCII",
                "",
                "DATASET STRUCTURED_POINTS",
                "DIMENSIONS 2 3 4",
                "ORIGIN -1 -1 -1",
                "SPACING 1 1 1",
                "",
                "POINT_DATA 24",
            ]
        );
    }

    #[test]
    fn out_of_range_column_is_rejected() {
        let t = FieldTable::new(3);
        let path = std::env::temp_dir().join("ferrodomain-never-written.vtk");
        let err = write_scalar_grid(
            &path,
            &t,
            3,
            GridExtent::new(1, 1, 1),
            &Spacing::default(),
            &VtkMeta::default(),
        )
        .unwrap_err();
        assert!(matches!(err, GridError::ColumnOutOfRange { column: 3, count: 3 }));
        assert!(!path.exists());
    }
}
