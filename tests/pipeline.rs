// tests/pipeline.rs
//
// End-to-end runs: sample file on disk -> load -> classify -> VTK + report.
// Run with: cargo test --test pipeline

use std::fs;
use std::path::Path;

use approx::assert_abs_diff_eq;

use ferrodomain::GridError;
use ferrodomain::config::ClassificationSettings;
use ferrodomain::grid::GridExtent;
use ferrodomain::loader::{HeaderStrategy, load_grid_file};
use ferrodomain::workflow::{
    BatchJob, BatchPlan, BatchSeries, ExportOptions, domain_path, export_all_scalars,
    export_domain, export_phase, run_batch, scalar_path,
};

/// Grid file with an `nx ny nz` header line, points listed X slowest / Z fastest.
fn grid_text<F>(e: GridExtent, value: F) -> String
where
    F: Fn(usize, usize, usize) -> Vec<f64>,
{
    let mut s = format!("{} {} {}\n", e.nx, e.ny, e.nz);
    for i in 0..e.nx {
        for j in 0..e.ny {
            for k in 0..e.nz {
                let vals: Vec<String> = value(i, j, k).iter().map(|v| v.to_string()).collect();
                s.push_str(&format!("{i} {j} {k} {}\n", vals.join(" ")));
            }
        }
    }
    s
}

/// 2 x 2 x 4 film: two empty layers, then two layers along +x with one
/// point along [111].
fn film(i: usize, j: usize, k: usize) -> Vec<f64> {
    match k {
        0 | 1 => vec![0.0, 0.0, 0.0],
        _ if (i, j, k) == (1, 1, 3) => vec![0.5, 0.5, 0.5],
        _ => vec![0.8, 0.0, 0.0],
    }
}

fn data_lines(path: &Path, marker: &str) -> Vec<String> {
    let text = fs::read_to_string(path).unwrap();
    text.lines()
        .skip_while(|l| !l.starts_with(marker))
        .skip(2)
        .take_while(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

#[test]
fn ferroelectric_film_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("Polar.00000100.dat");
    let extent = GridExtent::new(2, 2, 4);
    fs::write(&input, grid_text(extent, film)).unwrap();

    let data = load_grid_file(&input, HeaderStrategy::TokenCount).unwrap();
    assert_eq!(data.extent, extent);
    assert_eq!(data.components(), 3);

    let settings = ClassificationSettings::default();
    let base = dir.path().join("out").join("polar");
    let (path, grid) = export_domain(
        &data,
        &base,
        &settings.ferro_criteria(),
        None,
        &ExportOptions::default(),
    )
    .unwrap();
    assert_eq!(path, domain_path(&base));

    let bounds = grid.bounds.unwrap();
    assert_eq!((bounds.substrate_top, bounds.free_surface), (1, 3));

    let labels = data_lines(&path, "SCALARS domain int");
    assert_eq!(labels.len(), 4 * 4 * 6);
    let count = |l: &str| labels.iter().filter(|x| x.as_str() == l).count();
    assert_eq!(count("0"), 4, "one substrate layer of 2x2 points");
    assert_eq!(count("21"), 7);
    assert_eq!(count("1"), 1);
    assert_eq!(count("-1"), 96 - 12);

    let s = &grid.statistics;
    assert_eq!(s.film_points, 8);
    let groups = s.group_fractions();
    assert_abs_diff_eq!(groups[0].fraction, 1.0, epsilon = 1e-12);
    assert_abs_diff_eq!(groups[1].fraction, 0.125, epsilon = 1e-12);
    assert_abs_diff_eq!(groups[3].fraction, 0.875, epsilon = 1e-12);
    assert!(s.present[21] && s.present[1] && !s.present[9]);
}

#[test]
fn slice_scalars_are_written_twice() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("slice.dat");
    let extent = GridExtent::new(3, 2, 1);
    fs::write(
        &input,
        grid_text(extent, |i, j, _| vec![(10 * i + j) as f64, -1.0]),
    )
    .unwrap();

    let data = load_grid_file(&input, HeaderStrategy::TokenCount).unwrap();
    let base = dir.path().join("slice");
    let paths = export_all_scalars(&data, &base, &ExportOptions::default()).unwrap();
    assert_eq!(paths, vec![scalar_path(&base, 0), scalar_path(&base, 1)]);

    let text = fs::read_to_string(&paths[0]).unwrap();
    assert!(text.contains("DIMENSIONS 3 2 2\n"));
    let values: Vec<f64> = data_lines(&paths[0], "SCALARS scalar float")
        .iter()
        .map(|v| v.trim().parse().unwrap())
        .collect();
    let layer = vec![0.0, 10.0, 20.0, 1.0, 11.0, 21.0];
    assert_eq!(values[..6], layer[..]);
    assert_eq!(values[6..], layer[..]);
}

#[test]
fn phase_fractions_cover_the_film() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("vo2.dat");
    let extent = GridExtent::new(2, 2, 2);
    let m1 = [1.0, 0.0, 1.0, 0.0];
    let m2 = [0.0, 0.0, 0.4, 0.0];
    fs::write(
        &input,
        grid_text(extent, |i, _, k| {
            let v = match (i, k) {
                (0, _) => m1,
                (1, 0) => m2,
                _ => [0.0; 4],
            };
            v.iter().chain(v.iter()).copied().collect()
        }),
    )
    .unwrap();

    let data = load_grid_file(&input, HeaderStrategy::TokenCount).unwrap();
    let settings = ClassificationSettings::default();
    let (_, grid) = export_phase(
        &data,
        &dir.path().join("vo2"),
        &settings.phase_criteria(),
        &ExportOptions::default(),
    )
    .unwrap();

    let s = &grid.statistics;
    assert_eq!(s.counts[0], 2, "zero order parameters are the reference phase");
    assert_eq!(s.counts[1], 4);
    assert_eq!(s.counts[7], 2);
    let total: f64 = (1..=8).map(|l| s.fraction(l)).sum();
    assert!((total - 1.0).abs() < 1e-3, "fractions sum to {total}");
}

#[test]
fn phase_needs_eight_components() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("polar.dat");
    fs::write(&input, grid_text(GridExtent::new(1, 1, 2), film)).unwrap();
    let data = load_grid_file(&input, HeaderStrategy::TokenCount).unwrap();

    let err = export_phase(
        &data,
        &dir.path().join("polar"),
        &ClassificationSettings::default().phase_criteria(),
        &ExportOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, GridError::MissingComponents { needed: 8, found: 3, .. }), "{err}");
}

#[test]
fn loading_twice_gives_identical_data() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("twice.dat");
    fs::write(&input, grid_text(GridExtent::new(2, 3, 2), film)).unwrap();

    let a = load_grid_file(&input, HeaderStrategy::TokenCount).unwrap();
    let b = load_grid_file(&input, HeaderStrategy::TokenCount).unwrap();
    assert_eq!(a, b);
}

#[test]
fn batch_walks_every_step_and_series() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("data");
    fs::create_dir_all(&data_dir).unwrap();
    let extent = GridExtent::new(2, 2, 4);
    for step in [0u64, 500] {
        let path = data_dir.join(format!("Polar.{step:08}.dat"));
        fs::write(path, grid_text(extent, film)).unwrap();
    }

    let out = dir.path().join("results");
    let plan = BatchPlan {
        begin: 0,
        end: 900,
        interval: 500,
        out_dir: out.clone(),
        series: vec![
            BatchSeries {
                dir: data_dir.clone(),
                name: "Polar".to_string(),
                job: BatchJob::Scalar { column: 0 },
            },
            BatchSeries {
                dir: data_dir.clone(),
                name: "Polar".to_string(),
                job: BatchJob::Domain,
            },
        ],
    };

    let report = run_batch(
        &plan,
        HeaderStrategy::TokenCount,
        &ClassificationSettings::default(),
        &ExportOptions::default(),
    )
    .unwrap();

    assert_eq!(report.inputs.len(), 4);
    assert!(out.join("scalar").join("Polar.00000500.1.vtk").exists());
    assert!(out.join("domain").join("Polar.00000000.domain.vtk").exists());
    assert!(report.inputs[1].statistics.is_some());
    assert_eq!(report.inputs[2].step, Some(500));

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(plan.report_path()).unwrap()).unwrap();
    assert_eq!(json["inputs"].as_array().unwrap().len(), 4);
}

#[test]
fn batch_stops_on_missing_step() {
    let dir = tempfile::tempdir().unwrap();
    let plan = BatchPlan {
        begin: 0,
        end: 0,
        interval: 1,
        out_dir: dir.path().join("results"),
        series: vec![BatchSeries {
            dir: dir.path().to_path_buf(),
            name: "absent".to_string(),
            job: BatchJob::Domain,
        }],
    };
    let err = run_batch(
        &plan,
        HeaderStrategy::TokenCount,
        &ClassificationSettings::default(),
        &ExportOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, GridError::Io(_)));
}
