// src/grid.rs
//
// Grid extents and the storage orders used across the pipeline.
//
// Raw sample files list points with X slowest and Z fastest:
//     row   = (i * ny + j) * nz + k
// VTK structured points are stored with X fastest:
//     index = (k * dim_y + j) * dim_x + i
//
// Every conversion between the two goes through `InputOrder` / `OutputOrder`,
// or through `PaddedLayout` / `SlabLayout`, which compose them for the domain
// and scalar/vector writers respectively.

use serde::Serialize;

/// Number of grid points along each axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct GridExtent {
    pub nx: usize,
    pub ny: usize,
    pub nz: usize,
}

impl GridExtent {
    pub fn new(nx: usize, ny: usize, nz: usize) -> Self {
        Self { nx, ny, nz }
    }

    /// Total number of points (= rows in a complete input file).
    pub fn n_points(&self) -> usize {
        self.nx.saturating_mul(self.ny).saturating_mul(self.nz)
    }

    /// Total number of points, or `None` when it, or the halo-padded domain
    /// grid built on this extent, does not fit in `usize`.
    pub fn checked_points(&self) -> Option<usize> {
        let padded = |n: usize| n.checked_add(2);
        padded(self.nx)?
            .checked_mul(padded(self.ny)?)?
            .checked_mul(padded(self.nz)?)?;
        self.nx.checked_mul(self.ny)?.checked_mul(self.nz)
    }

    /// Largest index along each axis, `n - 1`.
    ///
    /// The legacy grid formulas are written in terms of these values.
    pub fn upper(&self) -> [usize; 3] {
        [
            self.nx.saturating_sub(1),
            self.ny.saturating_sub(1),
            self.nz.saturating_sub(1),
        ]
    }

    /// True when some axis holds a single layer (2D slice data).
    pub fn is_slice(&self) -> bool {
        self.nx == 1 || self.ny == 1 || self.nz == 1
    }

    /// Sampling stride that keeps an interactive extraction under ~1e6 points.
    ///
    /// Full volumes thin out along three axes, slices along two.
    pub fn suggested_stride(&self) -> usize {
        const POINT_BUDGET: f64 = 1.0e6;
        let total = self.n_points() as f64;
        if total <= POINT_BUDGET {
            return 1;
        }
        let ratio = total / POINT_BUDGET;
        let per_axis = if self.is_slice() { ratio.sqrt() } else { ratio.cbrt() };
        per_axis.ceil() as usize
    }
}

/// Storage order of raw sample files: X slowest, Z fastest.
#[derive(Debug, Clone, Copy)]
pub struct InputOrder {
    extent: GridExtent,
}

impl InputOrder {
    pub fn new(extent: GridExtent) -> Self {
        Self { extent }
    }

    /// Row of point (i, j, k) in the loaded table.
    #[inline]
    pub fn row(&self, i: usize, j: usize, k: usize) -> usize {
        (i * self.extent.ny + j) * self.extent.nz + k
    }
}

/// Storage order of VTK structured points: X fastest, Z slowest.
#[derive(Debug, Clone, Copy)]
pub struct OutputOrder {
    dims: [usize; 3],
}

impl OutputOrder {
    pub fn new(dims: [usize; 3]) -> Self {
        Self { dims }
    }

    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    pub fn n_points(&self) -> usize {
        self.dims[0] * self.dims[1] * self.dims[2]
    }

    /// Flat index of output point (i, j, k).
    #[inline]
    pub fn index(&self, i: usize, j: usize, k: usize) -> usize {
        (k * self.dims[1] + j) * self.dims[0] + i
    }
}

/// Domain grid layout: the loaded volume plus a one-point halo on every side.
///
/// Padded coordinates run over `0..n+2` per axis; interior points are
/// `1..=n` and map back to input point `(i-1, j-1, k-1)`. The padded grid
/// sits at origin (-1, -1, -1).
#[derive(Debug, Clone, Copy)]
pub struct PaddedLayout {
    extent: GridExtent,
    input: InputOrder,
    output: OutputOrder,
}

impl PaddedLayout {
    pub const ORIGIN: [i64; 3] = [-1, -1, -1];

    pub fn new(extent: GridExtent) -> Self {
        Self {
            extent,
            input: InputOrder::new(extent),
            output: OutputOrder::new([extent.nx + 2, extent.ny + 2, extent.nz + 2]),
        }
    }

    pub fn extent(&self) -> GridExtent {
        self.extent
    }

    pub fn dims(&self) -> [usize; 3] {
        self.output.dims()
    }

    pub fn len(&self) -> usize {
        self.output.n_points()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Points in one padded z-layer.
    pub fn layer_len(&self) -> usize {
        let d = self.output.dims();
        d[0] * d[1]
    }

    /// Flat index of padded point (i, j, k).
    #[inline]
    pub fn index(&self, i: usize, j: usize, k: usize) -> usize {
        self.output.index(i, j, k)
    }

    /// Input row feeding interior padded point (i, j, k); requires i, j, k >= 1.
    #[inline]
    pub fn source_row(&self, i: usize, j: usize, k: usize) -> usize {
        debug_assert!(i >= 1 && j >= 1 && k >= 1);
        self.input.row(i - 1, j - 1, k - 1)
    }
}

/// Which reindexing variant a scalar/vector export uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SliceKind {
    Volume,
    /// X holds a single layer; it is written twice.
    CollapseX,
    /// Y holds a single layer; it is written twice.
    CollapseY,
    /// Z holds a single layer; it is written twice.
    CollapseZ,
}

impl SliceKind {
    /// First unit-length axis in X, Y, Z order decides the variant.
    pub fn of(extent: GridExtent) -> Self {
        if extent.nx == 1 {
            Self::CollapseX
        } else if extent.ny == 1 {
            Self::CollapseY
        } else if extent.nz == 1 {
            Self::CollapseZ
        } else {
            Self::Volume
        }
    }
}

#[inline]
fn clamp_axis(v: usize, n: usize) -> usize {
    v.min(n.saturating_sub(1))
}

/// Scalar/vector export layout: one output point per input point, with unit
/// axes doubled so slices still render as a (thin) volume.
#[derive(Debug, Clone, Copy)]
pub struct SlabLayout {
    extent: GridExtent,
    kind: SliceKind,
    input: InputOrder,
    output: OutputOrder,
}

impl SlabLayout {
    pub fn new(extent: GridExtent) -> Self {
        let size = |n: usize| if n == 1 { 2 } else { n };
        Self {
            extent,
            kind: SliceKind::of(extent),
            input: InputOrder::new(extent),
            output: OutputOrder::new([size(extent.nx), size(extent.ny), size(extent.nz)]),
        }
    }

    pub fn kind(&self) -> SliceKind {
        self.kind
    }

    pub fn dims(&self) -> [usize; 3] {
        self.output.dims()
    }

    pub fn n_points(&self) -> usize {
        self.output.n_points()
    }

    /// Input row displayed at output point (i, j, k).
    ///
    /// In the collapse variants the other axes are bounded too, so line data
    /// (two unit axes) repeats its single layer instead of reading past the
    /// table.
    #[inline]
    pub fn source_row(&self, i: usize, j: usize, k: usize) -> usize {
        let e = self.extent;
        match self.kind {
            SliceKind::Volume => self.input.row(i, j, k),
            SliceKind::CollapseX => self.input.row(0, clamp_axis(j, e.ny), clamp_axis(k, e.nz)),
            SliceKind::CollapseY => self.input.row(clamp_axis(i, e.nx), 0, clamp_axis(k, e.nz)),
            SliceKind::CollapseZ => self.input.row(clamp_axis(i, e.nx), clamp_axis(j, e.ny), 0),
        }
    }

    /// Source rows in output traversal order (z outer, y middle, x inner).
    pub fn source_rows(&self) -> impl Iterator<Item = usize> + '_ {
        let [dx, dy, dz] = self.dims();
        (0..dz).flat_map(move |k| {
            (0..dy).flat_map(move |j| (0..dx).map(move |i| self.source_row(i, j, k)))
        })
    }
}
