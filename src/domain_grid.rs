// src/domain_grid.rs
//
// Classified, halo-padded domain grids.
//
// Ferroelectric films sit on a substrate with vacuum above, stacked along z.
//  1. Scan the polarization layer by layer (a layer is occupied when some
//     point has |px| + |py| + |pz| > 1e-6):
//       free_surface  = highest occupied layer, scanning down from the top
//       substrate_top = (lowest occupied layer >= 1) - 1, scanning up
//  2. Padded layers 1..=substrate_top           -> 0 (substrate), unclassified
//     Padded layers substrate_top+1..=free_surface+1 -> classified per point
//     Everything else (halo, vacuum)            -> -1
// Phase grids skip the scan and classify every interior point.
//
// Both scans finish before classification starts; classification itself
// runs one padded z-layer per rayon task.

use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

use crate::classify::{
    FerroCriteria, PhaseCriteria, SUBSTRATE, UNCLASSIFIED, classify_ferroelectric, classify_phase,
};
use crate::error::{GridError, Result};
use crate::grid::{GridExtent, InputOrder, PaddedLayout};
use crate::stats::{DomainFamily, DomainStatistics};
use crate::table::FieldTable;
use crate::vec3::l1;

/// Field magnitude (L1) below which a point counts as empty.
pub const OCCUPIED_EPS: f64 = 1.0e-6;

/// Components per phase point: u1..u4 then n1..n4.
pub const PHASE_COMPONENTS: usize = 8;

/// Labels on the padded output grid (X fastest, origin -1, -1, -1).
#[derive(Debug, Clone, PartialEq)]
pub struct PaddedLabels {
    extent: GridExtent,
    labels: Vec<i32>,
}

impl PaddedLabels {
    /// All points unclassified.
    pub fn new(extent: GridExtent) -> Self {
        Self {
            extent,
            labels: vec![UNCLASSIFIED; PaddedLayout::new(extent).len()],
        }
    }

    pub fn extent(&self) -> GridExtent {
        self.extent
    }

    pub fn layout(&self) -> PaddedLayout {
        PaddedLayout::new(self.extent)
    }

    pub fn dims(&self) -> [usize; 3] {
        self.layout().dims()
    }

    pub fn labels(&self) -> &[i32] {
        &self.labels
    }

    /// Label at padded coordinates (i, j, k).
    pub fn get(&self, i: usize, j: usize, k: usize) -> i32 {
        self.labels[self.layout().index(i, j, k)]
    }
}

/// Layers bounding the film, in input z indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FilmBounds {
    pub substrate_top: usize,
    pub free_surface: usize,
}

/// Result of classifying a whole grid.
#[derive(Debug, Clone)]
pub struct DomainGrid {
    pub labels: PaddedLabels,
    pub statistics: DomainStatistics,
    /// Only set for ferroelectric grids.
    pub bounds: Option<FilmBounds>,
}

/// First polarization column: files with six components carry
/// (displacement, polarization), everything else starts with polarization.
pub fn polarization_offset(components: usize) -> usize {
    if components == 6 { 3 } else { 0 }
}

fn layer_occupied(table: &FieldTable, extent: GridExtent, offset: usize, k: usize) -> bool {
    let input = InputOrder::new(extent);
    (0..extent.nx).any(|i| {
        (0..extent.ny).any(|j| l1(table.vec3(input.row(i, j, k), offset)) > OCCUPIED_EPS)
    })
}

/// Locate the substrate top and the free surface along z.
pub fn scan_film_bounds(table: &FieldTable, extent: GridExtent, offset: usize) -> FilmBounds {
    let free_surface = (0..extent.nz)
        .rev()
        .find(|&k| layer_occupied(table, extent, offset, k))
        .unwrap_or(0);
    let substrate_top = (1..extent.nz)
        .find(|&k| layer_occupied(table, extent, offset, k))
        .map(|k| k - 1)
        .unwrap_or(0);
    FilmBounds {
        substrate_top,
        free_surface,
    }
}

fn require_components(
    table: &FieldTable,
    what: &'static str,
    offset: usize,
    needed: usize,
) -> Result<()> {
    if table.components() < offset + needed {
        return Err(GridError::MissingComponents {
            what,
            needed,
            offset,
            found: table.components(),
        });
    }
    Ok(())
}

/// Fill the interior of every padded z-layer with `label_at(k, i, j)`, where
/// `label_at` returns None for layers that stay unclassified.
fn fill_layers<F>(extent: GridExtent, label_at: F) -> PaddedLabels
where
    F: Fn(usize, usize, usize) -> Option<i32> + Sync,
{
    let mut grid = PaddedLabels::new(extent);
    let layout = grid.layout();
    grid.labels
        .par_chunks_mut(layout.layer_len())
        .enumerate()
        .for_each(|(k, layer)| {
            if k == 0 || k > extent.nz {
                return;
            }
            for j in 1..=extent.ny {
                for i in 1..=extent.nx {
                    match label_at(k, i, j) {
                        Some(label) => layer[layout.index(i, j, 0)] = label,
                        None => return,
                    }
                }
            }
        });
    grid
}

/// Classify a ferroelectric film, reading polarization at the default offset.
pub fn build_domain_grid(
    table: &FieldTable,
    extent: GridExtent,
    criteria: &FerroCriteria,
) -> Result<DomainGrid> {
    build_domain_grid_at(table, extent, criteria, polarization_offset(table.components()))
}

/// Classify a ferroelectric film with polarization in columns `offset..offset+3`.
pub fn build_domain_grid_at(
    table: &FieldTable,
    extent: GridExtent,
    criteria: &FerroCriteria,
    offset: usize,
) -> Result<DomainGrid> {
    require_components(table, "ferroelectric classification", offset, 3)?;

    let bounds = scan_film_bounds(table, extent, offset);
    debug!(
        substrate_top = bounds.substrate_top,
        free_surface = bounds.free_surface,
        offset,
        "film bounds"
    );

    let layout = PaddedLayout::new(extent);
    let labels = fill_layers(extent, |k, i, j| {
        if k <= bounds.substrate_top {
            Some(SUBSTRATE)
        } else if k <= bounds.free_surface + 1 {
            let p = table.vec3(layout.source_row(i, j, k), offset);
            Some(classify_ferroelectric(p, criteria))
        } else {
            None
        }
    });

    let statistics = DomainStatistics::from_labels(labels.labels(), DomainFamily::Ferroelectric);
    debug!(film_points = statistics.film_points, "ferroelectric grid classified");
    Ok(DomainGrid {
        labels,
        statistics,
        bounds: Some(bounds),
    })
}

/// Classify every interior point with the 9-mode phase classifier.
pub fn build_phase_grid(
    table: &FieldTable,
    extent: GridExtent,
    criteria: &PhaseCriteria,
) -> Result<DomainGrid> {
    require_components(table, "phase classification", 0, PHASE_COMPONENTS)?;

    let layout = PaddedLayout::new(extent);
    let labels = fill_layers(extent, |k, i, j| {
        let row = layout.source_row(i, j, k);
        Some(classify_phase(table.vec4(row, 0), table.vec4(row, 4), criteria))
    });

    let statistics = DomainStatistics::from_labels(labels.labels(), DomainFamily::Phase);
    debug!(film_points = statistics.film_points, "phase grid classified");
    Ok(DomainGrid {
        labels,
        statistics,
        bounds: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 2 x 1 x nz column stack; `layers[k]` is the polarization of layer k.
    fn stack(layers: &[[f64; 3]]) -> (FieldTable, GridExtent) {
        let extent = GridExtent::new(2, 1, layers.len());
        let mut t = FieldTable::new(3);
        for _i in 0..extent.nx {
            for _j in 0..extent.ny {
                for p in layers {
                    t.push_row(*p);
                }
            }
        }
        (t, extent)
    }

    fn criteria() -> FerroCriteria {
        FerroCriteria::from_degrees(0.1, 10.0)
    }

    #[test]
    fn film_bounds_find_substrate_and_free_surface() {
        let zero = [0.0; 3];
        let up = [0.0, 0.0, 1.0];
        // layers: empty, empty, film, film, vacuum
        let (t, e) = stack(&[zero, zero, up, up, zero]);
        let b = scan_film_bounds(&t, e, 0);
        assert_eq!(b.substrate_top, 1);
        assert_eq!(b.free_surface, 3);
    }

    #[test]
    fn empty_field_collapses_to_bottom_layer() {
        let (t, e) = stack(&[[0.0; 3]; 4]);
        let b = scan_film_bounds(&t, e, 0);
        assert_eq!(b, FilmBounds { substrate_top: 0, free_surface: 0 });
    }

    #[test]
    fn layers_get_substrate_film_and_vacuum_labels() {
        let zero = [0.0; 3];
        let up = [0.0, 0.0, 1.0];
        let (t, e) = stack(&[zero, zero, up, up, zero]);
        let g = build_domain_grid(&t, e, &criteria()).unwrap();
        let l = &g.labels;

        assert_eq!(l.dims(), [4, 3, 7]);
        for i in 1..=2 {
            // padded k = input layer + 1; substrate_top = 1 covers padded k = 1,
            // the empty layer just below the film is classified as background
            assert_eq!(l.get(i, 1, 1), SUBSTRATE);
            assert_eq!(l.get(i, 1, 2), UNCLASSIFIED);
            assert_eq!(l.get(i, 1, 3), 25);
            assert_eq!(l.get(i, 1, 4), 25);
            assert_eq!(l.get(i, 1, 5), UNCLASSIFIED);
        }
        // halo untouched
        assert_eq!(l.get(0, 1, 3), UNCLASSIFIED);
        assert_eq!(l.get(3, 1, 3), UNCLASSIFIED);
        assert_eq!(l.get(1, 0, 3), UNCLASSIFIED);
        assert_eq!(l.get(1, 1, 0), UNCLASSIFIED);
        assert_eq!(l.get(1, 1, 6), UNCLASSIFIED);

        assert_eq!(g.statistics.film_points, 4);
        assert_eq!(g.statistics.counts[SUBSTRATE as usize], 2);
        assert_eq!(g.statistics.fraction(25), 1.0);
    }

    #[test]
    fn six_component_files_read_polarization_from_column_three() {
        assert_eq!(polarization_offset(6), 3);
        assert_eq!(polarization_offset(3), 0);

        let extent = GridExtent::new(1, 1, 1);
        let mut t = FieldTable::new(6);
        t.push_row([0.0, 0.0, 1.0, 1.0, 0.0, 0.0]);
        let g = build_domain_grid(&t, extent, &criteria()).unwrap();
        assert_eq!(g.labels.get(1, 1, 1), 21);
    }

    #[test]
    fn too_few_components_is_an_error() {
        let t = FieldTable::new(2);
        let err = build_domain_grid(&t, GridExtent::new(1, 1, 1), &criteria()).unwrap_err();
        assert!(matches!(err, GridError::MissingComponents { .. }), "{err}");

        let err = build_phase_grid(&FieldTable::new(4), GridExtent::new(1, 1, 1), &PhaseCriteria {
            m1_magnitude: 0.1,
            m2_magnitude: 0.1,
            m1_angle_rad: 0.2,
            m2_angle_rad: 0.2,
        })
        .unwrap_err();
        assert!(matches!(err, GridError::MissingComponents { .. }), "{err}");
    }

    #[test]
    fn phase_grid_classifies_every_interior_point() {
        let extent = GridExtent::new(2, 2, 1);
        let mut t = FieldTable::new(8);
        let m1 = [1.0, 0.0, 1.0, 0.0];
        let m2 = [0.0, 0.0, 0.0, 1.0];
        for r in 0..4 {
            let v = if r % 2 == 0 { m1 } else { m2 };
            t.push_row(v.iter().chain(v.iter()).copied());
        }
        let c = PhaseCriteria {
            m1_magnitude: 0.1,
            m2_magnitude: 0.1,
            m1_angle_rad: 10f64.to_radians(),
            m2_angle_rad: 10f64.to_radians(),
        };
        let g = build_phase_grid(&t, extent, &c).unwrap();
        assert!(g.bounds.is_none());
        assert_eq!(g.statistics.counts[1], 2);
        assert_eq!(g.statistics.counts[8], 2);
        assert_eq!(g.statistics.film_points, 4);
        // input row (i=1, j=0, k=0) = 2 -> m1
        assert_eq!(g.labels.get(2, 1, 1), 1);
        // input row (i=0, j=1, k=0) = 1 -> m2
        assert_eq!(g.labels.get(1, 2, 1), 8);
    }
}
