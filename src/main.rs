// src/main.rs
//
// Command-line driver.
//
// Examples:
//
//   ferrodomain scalar data/Polar.00010000.dat
//       -> data/Polar.00010000.1.vtk, .2.vtk, ... (one file per component)
//
//   ferrodomain --spacing 0.4 0.4 0.4 vector data/Polar.00010000.dat --first 4
//       -> data/Polar.00010000.456.vtk
//
//   ferrodomain domain data/Polar.00010000.dat --angle 20 --out runs/polar
//       -> runs/polar.domain.vtk + runs/polar.report.json
//
//   ferrodomain batch --begin 0 --end 50000 --interval 10000 --out runs \
//         --domain-series data/Polar
//       -> runs/domain/Polar.000?0000.domain.vtk + runs/batch.report.json
//
// RUST_LOG controls verbosity (default: info, debug for this crate).

use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{error, info};

use ferrodomain::Result;
use ferrodomain::config::{ClassificationSettings, InputReport, RunReport};
use ferrodomain::loader::{HeaderStrategy, load_column_table_file, load_grid_file};
use ferrodomain::vtk::{Spacing, VtkMeta};
use ferrodomain::workflow::{
    BatchJob, BatchPlan, BatchSeries, ExportOptions, attach_domains, describe,
    export_all_scalars, export_all_vectors, export_domain, export_phase, export_scalar,
    export_vector, report_path, run_batch, summarize, summarize_columns,
};

#[derive(Parser, Debug)]
#[command(name = "ferrodomain")]
#[command(about = "Classify polarization domains and export legacy-VTK grids")]
struct Cli {
    /// How to find the header line (default: token-count for grid files,
    /// leading-zero for column tables)
    #[arg(long, value_enum, global = true)]
    header: Option<HeaderArg>,

    /// Grid spacing; invalid entries fall back to 1
    #[arg(long, num_args = 3, value_names = ["SX", "SY", "SZ"], global = true)]
    spacing: Vec<String>,

    /// Classification settings (JSON, angles in degrees)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Title line written into every VTK file
    #[arg(long, global = true)]
    title: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum HeaderArg {
    TokenCount,
    LeadingZero,
    FirstLine,
    LastLine,
}

impl From<HeaderArg> for HeaderStrategy {
    fn from(h: HeaderArg) -> Self {
        match h {
            HeaderArg::TokenCount => Self::TokenCount,
            HeaderArg::LeadingZero => Self::LeadingZero,
            HeaderArg::FirstLine => Self::FirstLine,
            HeaderArg::LastLine => Self::LastLine,
        }
    }
}

#[derive(Args, Debug)]
struct FileArgs {
    /// Input sample file
    input: PathBuf,

    /// Output base path (defaults to the input without its extension)
    #[arg(long)]
    out: Option<PathBuf>,
}

impl FileArgs {
    fn base(&self) -> PathBuf {
        self.out
            .clone()
            .unwrap_or_else(|| self.input.with_extension(""))
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write scalar grids
    Scalar {
        #[command(flatten)]
        file: FileArgs,

        /// 1-based component to write (default: all)
        #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
        component: Option<u16>,
    },

    /// Write vector grids with magnitude and direction colour
    Vector {
        #[command(flatten)]
        file: FileArgs,

        /// 1-based first component of the triple (default: every triple)
        #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
        first: Option<u16>,
    },

    /// Classify ferroelectric domains
    Domain {
        #[command(flatten)]
        file: FileArgs,

        /// Polarization magnitude threshold
        #[arg(long)]
        magnitude: Option<f64>,

        /// Angle tolerance in degrees
        #[arg(long)]
        angle: Option<f64>,

        /// 0-based first polarization column (default: 3 for six components, else 0)
        #[arg(long)]
        offset: Option<usize>,
    },

    /// Classify phase modes (8 components: u1..u4 n1..n4)
    Phase {
        #[command(flatten)]
        file: FileArgs,

        #[arg(long)]
        m1_magnitude: Option<f64>,

        #[arg(long)]
        m2_magnitude: Option<f64>,

        /// Degrees
        #[arg(long)]
        m1_angle: Option<f64>,

        /// Degrees
        #[arg(long)]
        m2_angle: Option<f64>,
    },

    /// Process a numbered time series `<dir>/<name>.<step:08>.dat`
    Batch {
        #[arg(long)]
        begin: u64,

        #[arg(long)]
        end: u64,

        #[arg(long, default_value = "1", value_parser = clap::value_parser!(u64).range(1..))]
        interval: u64,

        /// Output directory
        #[arg(long)]
        out: PathBuf,

        /// Series prefix `<dir>/<name>` exported as scalars
        #[arg(long)]
        scalar_series: Option<PathBuf>,

        /// 1-based component for the scalar series
        #[arg(long, default_value = "1", value_parser = clap::value_parser!(u16).range(1..))]
        scalar_component: u16,

        /// Series prefix exported as vectors
        #[arg(long)]
        vector_series: Option<PathBuf>,

        /// 1-based first component for the vector series
        #[arg(long, default_value = "1", value_parser = clap::value_parser!(u16).range(1..))]
        vector_first: u16,

        /// Series prefix classified as ferroelectric domains
        #[arg(long)]
        domain_series: Option<PathBuf>,

        /// Series prefix classified as phase modes
        #[arg(long)]
        phase_series: Option<PathBuf>,
    },

    /// Print extent, header decision and per-column statistics as JSON
    Summary {
        /// Input sample file
        input: PathBuf,

        /// Read a coordinate-free column table instead of a grid file
        #[arg(long)]
        columns: bool,
    },
}

fn series(prefix: &Path, job: BatchJob) -> BatchSeries {
    BatchSeries {
        dir: prefix.parent().map(Path::to_path_buf).unwrap_or_default(),
        name: prefix
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        job,
    }
}

fn run(cli: Cli) -> Result<()> {
    let strategy = cli.header.map(HeaderStrategy::from).unwrap_or_default();
    let mut settings = match &cli.settings {
        Some(path) => ClassificationSettings::load(path)?,
        None => ClassificationSettings::default(),
    };
    let opts = ExportOptions {
        spacing: Spacing::parse(cli.spacing.as_slice()),
        meta: cli.title.map(|title| VtkMeta { title }).unwrap_or_default(),
    };

    match cli.command {
        Commands::Scalar { file, component } => {
            let data = load_grid_file(&file.input, strategy)?;
            let base = file.base();
            let mut entry = describe(&file.input, &data, None);
            entry.outputs = match component {
                Some(c) => vec![export_scalar(&data, &base, usize::from(c) - 1, &opts)?],
                None => export_all_scalars(&data, &base, &opts)?,
            };
            finish(settings, &opts, entry, &base)
        }
        Commands::Vector { file, first } => {
            let data = load_grid_file(&file.input, strategy)?;
            let base = file.base();
            let mut entry = describe(&file.input, &data, None);
            entry.outputs = match first {
                Some(c) => vec![export_vector(&data, &base, usize::from(c) - 1, &opts)?],
                None => export_all_vectors(&data, &base, &opts)?,
            };
            finish(settings, &opts, entry, &base)
        }
        Commands::Domain {
            file,
            magnitude,
            angle,
            offset,
        } => {
            if let Some(m) = magnitude {
                settings.ferroelectric.magnitude_threshold = m;
            }
            if let Some(a) = angle {
                settings.ferroelectric.angle_threshold_deg = a;
            }
            let data = load_grid_file(&file.input, strategy)?;
            let base = file.base();
            let (path, grid) =
                export_domain(&data, &base, &settings.ferro_criteria(), offset, &opts)?;
            let mut entry = describe(&file.input, &data, None);
            attach_domains(&mut entry, path, &grid);
            finish(settings, &opts, entry, &base)
        }
        Commands::Phase {
            file,
            m1_magnitude,
            m2_magnitude,
            m1_angle,
            m2_angle,
        } => {
            let p = &mut settings.phase;
            p.m1_magnitude = m1_magnitude.unwrap_or(p.m1_magnitude);
            p.m2_magnitude = m2_magnitude.unwrap_or(p.m2_magnitude);
            p.m1_angle_deg = m1_angle.unwrap_or(p.m1_angle_deg);
            p.m2_angle_deg = m2_angle.unwrap_or(p.m2_angle_deg);

            let data = load_grid_file(&file.input, strategy)?;
            let base = file.base();
            let (path, grid) = export_phase(&data, &base, &settings.phase_criteria(), &opts)?;
            let mut entry = describe(&file.input, &data, None);
            attach_domains(&mut entry, path, &grid);
            finish(settings, &opts, entry, &base)
        }
        Commands::Batch {
            begin,
            end,
            interval,
            out,
            scalar_series,
            scalar_component,
            vector_series,
            vector_first,
            domain_series,
            phase_series,
        } => {
            let mut plan = BatchPlan {
                begin,
                end,
                interval,
                out_dir: out,
                series: Vec::new(),
            };
            if let Some(p) = scalar_series {
                let column = usize::from(scalar_component) - 1;
                plan.series.push(series(&p, BatchJob::Scalar { column }));
            }
            if let Some(p) = vector_series {
                let first_column = usize::from(vector_first) - 1;
                plan.series.push(series(&p, BatchJob::Vector { first_column }));
            }
            if let Some(p) = domain_series {
                plan.series.push(series(&p, BatchJob::Domain));
            }
            if let Some(p) = phase_series {
                plan.series.push(series(&p, BatchJob::Phase));
            }
            if plan.series.is_empty() {
                info!("no series selected, nothing to do");
                return Ok(());
            }
            run_batch(&plan, strategy, &settings, &opts)?;
            Ok(())
        }
        Commands::Summary { input, columns } => {
            let json = if columns {
                let strategy = cli.header.map_or(HeaderStrategy::LeadingZero, HeaderStrategy::from);
                let data = load_column_table_file(&input, strategy)?;
                serde_json::to_string_pretty(&summarize_columns(&input, &data))?
            } else {
                let data = load_grid_file(&input, strategy)?;
                serde_json::to_string_pretty(&summarize(&input, &data))?
            };
            println!("{json}");
            Ok(())
        }
    }
}

fn finish(
    settings: ClassificationSettings,
    opts: &ExportOptions,
    entry: InputReport,
    base: &Path,
) -> Result<()> {
    let mut report = RunReport::new(settings, opts.spacing.values());
    report.inputs.push(entry);
    let path = report_path(base);
    report.write(&path)?;
    info!(report = %path.display(), "done");
    Ok(())
}

fn main() {
    ferrodomain::init_logging();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        error!("{e}");
        process::exit(1);
    }
}
