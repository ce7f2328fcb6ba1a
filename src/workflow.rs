// src/workflow.rs
//
// Load -> classify -> write drivers shared by the CLI and batch runs.
//
// Output naming (base path + suffix):
//   scalar column c         -> <base>.<c+1>.vtk
//   vector columns (a,b,c)  -> <base>.<a+1><b+1><c+1>.vtk
//   domain / phase labels   -> <base>.domain.vtk
//   run report              -> <base>.report.json
// Batch series read <dir>/<name>.<step:08>.dat and write under
// <out>/<kind>/<name>.<step:08>.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::classify::{FerroCriteria, PhaseCriteria};
use crate::config::{ClassificationSettings, InputReport, RunReport};
use crate::domain_grid::{
    DomainGrid, build_domain_grid, build_domain_grid_at, build_phase_grid,
};
use crate::error::Result;
use crate::loader::{ColumnData, GridData, HeaderDecision, HeaderStrategy, load_grid_file};
use crate::table::ColumnSummary;
use crate::vtk::{Spacing, VtkMeta, write_domain_grid, write_scalar_grid, write_vector_grid};

fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut s = OsString::from(base.as_os_str());
    s.push(suffix);
    PathBuf::from(s)
}

pub fn scalar_path(base: &Path, column: usize) -> PathBuf {
    with_suffix(base, &format!(".{}.vtk", column + 1))
}

pub fn vector_path(base: &Path, columns: [usize; 3]) -> PathBuf {
    let [a, b, c] = columns;
    with_suffix(base, &format!(".{}{}{}.vtk", a + 1, b + 1, c + 1))
}

pub fn domain_path(base: &Path) -> PathBuf {
    with_suffix(base, ".domain.vtk")
}

pub fn report_path(base: &Path) -> PathBuf {
    with_suffix(base, ".report.json")
}

/// Writer settings shared by every export of a run.
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    pub spacing: Spacing,
    pub meta: VtkMeta,
}

/// Report entry for a freshly loaded file, before any export.
pub fn describe(input: &Path, data: &GridData, step: Option<u64>) -> InputReport {
    InputReport {
        input: input.to_path_buf(),
        step,
        extent: data.extent,
        components: data.components(),
        rows: data.table.rows(),
        header: data.header,
        columns: data.table.column_summaries(),
        outputs: Vec::new(),
        bounds: None,
        statistics: None,
    }
}

/// Quick look at a file without writing any grid.
#[derive(Debug, Clone, Serialize)]
pub struct FileSummary {
    #[serde(flatten)]
    pub report: InputReport,
    /// (min, max) length of the vectors formed by the first three components.
    pub magnitude_range: Option<(f64, f64)>,
    pub suggested_stride: usize,
}

pub fn summarize(input: &Path, data: &GridData) -> FileSummary {
    FileSummary {
        report: describe(input, data, None),
        magnitude_range: (data.components() >= 3)
            .then(|| data.table.magnitude_range(0))
            .flatten(),
        suggested_stride: data.extent.suggested_stride(),
    }
}

/// Quick look at a coordinate-free column table.
#[derive(Debug, Clone, Serialize)]
pub struct ColumnTableSummary {
    pub input: PathBuf,
    pub rows: usize,
    pub components: usize,
    pub header: HeaderDecision,
    pub columns: Vec<ColumnSummary>,
}

pub fn summarize_columns(input: &Path, data: &ColumnData) -> ColumnTableSummary {
    ColumnTableSummary {
        input: input.to_path_buf(),
        rows: data.table.rows(),
        components: data.table.components(),
        header: data.header,
        columns: data.table.column_summaries(),
    }
}

pub fn export_scalar(
    data: &GridData,
    base: &Path,
    column: usize,
    opts: &ExportOptions,
) -> Result<PathBuf> {
    let path = scalar_path(base, column);
    write_scalar_grid(&path, &data.table, column, data.extent, &opts.spacing, &opts.meta)?;
    Ok(path)
}

/// One scalar file per component.
pub fn export_all_scalars(data: &GridData, base: &Path, opts: &ExportOptions) -> Result<Vec<PathBuf>> {
    (0..data.components())
        .map(|c| export_scalar(data, base, c, opts))
        .collect()
}

pub fn export_vector(
    data: &GridData,
    base: &Path,
    first_column: usize,
    opts: &ExportOptions,
) -> Result<PathBuf> {
    let columns = [first_column, first_column + 1, first_column + 2];
    let path = vector_path(base, columns);
    write_vector_grid(&path, &data.table, columns, data.extent, &opts.spacing, &opts.meta)?;
    Ok(path)
}

/// One vector file per consecutive component triple; a trailing remainder is skipped.
pub fn export_all_vectors(data: &GridData, base: &Path, opts: &ExportOptions) -> Result<Vec<PathBuf>> {
    (0..data.components() / 3)
        .map(|t| export_vector(data, base, 3 * t, opts))
        .collect()
}

/// Classify ferroelectric domains and write the padded label grid.
///
/// `offset` overrides the polarization column chosen from the component count.
pub fn export_domain(
    data: &GridData,
    base: &Path,
    criteria: &FerroCriteria,
    offset: Option<usize>,
    opts: &ExportOptions,
) -> Result<(PathBuf, DomainGrid)> {
    let grid = match offset {
        Some(o) => build_domain_grid_at(&data.table, data.extent, criteria, o)?,
        None => build_domain_grid(&data.table, data.extent, criteria)?,
    };
    let path = domain_path(base);
    write_domain_grid(&path, &grid.labels, &opts.spacing, &opts.meta)?;
    log_groups(&grid);
    Ok((path, grid))
}

/// Classify phase modes and write the padded label grid.
pub fn export_phase(
    data: &GridData,
    base: &Path,
    criteria: &PhaseCriteria,
    opts: &ExportOptions,
) -> Result<(PathBuf, DomainGrid)> {
    let grid = build_phase_grid(&data.table, data.extent, criteria)?;
    let path = domain_path(base);
    write_domain_grid(&path, &grid.labels, &opts.spacing, &opts.meta)?;
    log_groups(&grid);
    Ok((path, grid))
}

fn log_groups(grid: &DomainGrid) {
    for g in grid.statistics.group_fractions() {
        info!(group = g.name, percent = 100.0 * g.fraction, "domain fraction");
    }
}

/// Record a classification result on a report entry.
pub fn attach_domains(report: &mut InputReport, path: PathBuf, grid: &DomainGrid) {
    report.outputs.push(path);
    report.bounds = grid.bounds;
    report.statistics = Some(grid.statistics.summary());
}

/// What a batch series produces at each step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BatchJob {
    Scalar { column: usize },
    Vector { first_column: usize },
    Domain,
    Phase,
}

impl BatchJob {
    /// Subdirectory of the batch output directory.
    pub fn kind_dir(self) -> &'static str {
        match self {
            Self::Scalar { .. } => "scalar",
            Self::Vector { .. } => "vector",
            Self::Domain | Self::Phase => "domain",
        }
    }
}

/// A numbered file series `<dir>/<name>.<step:08>.dat`.
#[derive(Debug, Clone, Serialize)]
pub struct BatchSeries {
    pub dir: PathBuf,
    pub name: String,
    pub job: BatchJob,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchPlan {
    pub begin: u64,
    pub end: u64,
    pub interval: u64,
    pub out_dir: PathBuf,
    pub series: Vec<BatchSeries>,
}

fn step_name(name: &str, step: u64) -> String {
    format!("{name}.{step:08}")
}

impl BatchPlan {
    /// `begin..=end` by `interval` (an interval of 0 counts as 1).
    pub fn steps(&self) -> impl Iterator<Item = u64> {
        (self.begin..=self.end).step_by(self.interval.max(1) as usize)
    }

    pub fn input_path(series: &BatchSeries, step: u64) -> PathBuf {
        series.dir.join(format!("{}.dat", step_name(&series.name, step)))
    }

    pub fn output_base(&self, series: &BatchSeries, step: u64) -> PathBuf {
        self.out_dir
            .join(series.job.kind_dir())
            .join(step_name(&series.name, step))
    }

    pub fn report_path(&self) -> PathBuf {
        self.out_dir.join("batch.report.json")
    }
}

/// Run every series at every step. Stops at the first failing file.
pub fn run_batch(
    plan: &BatchPlan,
    strategy: HeaderStrategy,
    settings: &ClassificationSettings,
    opts: &ExportOptions,
) -> Result<RunReport> {
    let mut report = RunReport::new(*settings, opts.spacing.values());
    let ferro = settings.ferro_criteria();
    let phase = settings.phase_criteria();

    for step in plan.steps() {
        for series in &plan.series {
            let input = BatchPlan::input_path(series, step);
            let base = plan.output_base(series, step);
            info!(step, input = %input.display(), kind = series.job.kind_dir(), "batch step");

            let data = load_grid_file(&input, strategy)?;
            let mut entry = describe(&input, &data, Some(step));
            match series.job {
                BatchJob::Scalar { column } => {
                    entry.outputs.push(export_scalar(&data, &base, column, opts)?);
                }
                BatchJob::Vector { first_column } => {
                    entry.outputs.push(export_vector(&data, &base, first_column, opts)?);
                }
                BatchJob::Domain => {
                    let (path, grid) = export_domain(&data, &base, &ferro, None, opts)?;
                    attach_domains(&mut entry, path, &grid);
                }
                BatchJob::Phase => {
                    let (path, grid) = export_phase(&data, &base, &phase, opts)?;
                    attach_domains(&mut entry, path, &grid);
                }
            }
            report.inputs.push(entry);
        }
    }

    report.write(&plan.report_path())?;
    info!(
        steps = report.inputs.len(),
        report = %plan.report_path().display(),
        "batch finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_names_use_one_based_columns() {
        let base = Path::new("out/run");
        assert_eq!(scalar_path(base, 0), PathBuf::from("out/run.1.vtk"));
        assert_eq!(vector_path(base, [3, 4, 5]), PathBuf::from("out/run.456.vtk"));
        assert_eq!(domain_path(base), PathBuf::from("out/run.domain.vtk"));
        assert_eq!(report_path(base), PathBuf::from("out/run.report.json"));
    }

    #[test]
    fn batch_paths_are_zero_padded() {
        let plan = BatchPlan {
            begin: 0,
            end: 10,
            interval: 5,
            out_dir: PathBuf::from("results"),
            series: vec![],
        };
        let s = BatchSeries {
            dir: PathBuf::from("data"),
            name: "Polar".to_string(),
            job: BatchJob::Vector { first_column: 3 },
        };
        assert_eq!(plan.steps().collect::<Vec<_>>(), vec![0, 5, 10]);
        assert_eq!(
            BatchPlan::input_path(&s, 5),
            PathBuf::from("data/Polar.00000005.dat")
        );
        assert_eq!(
            plan.output_base(&s, 10),
            PathBuf::from("results/vector/Polar.00000010")
        );
    }

    #[test]
    fn zero_interval_still_advances() {
        let plan = BatchPlan {
            begin: 3,
            end: 5,
            interval: 0,
            out_dir: PathBuf::new(),
            series: vec![],
        };
        assert_eq!(plan.steps().collect::<Vec<_>>(), vec![3, 4, 5]);
    }
}
