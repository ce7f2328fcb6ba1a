// src/config.rs
//
// User-facing classification settings (JSON, angles in degrees) and the run
// report written next to every export.
//
// Settings are converted into `FerroCriteria` / `PhaseCriteria` (radians)
// before they reach the classifiers.

use std::fs::{self, File, create_dir_all};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::classify::{FerroCriteria, PhaseCriteria};
use crate::domain_grid::FilmBounds;
use crate::error::Result;
use crate::grid::GridExtent;
use crate::loader::HeaderDecision;
use crate::stats::StatisticsSummary;
use crate::table::ColumnSummary;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FerroSettings {
    pub magnitude_threshold: f64,
    pub angle_threshold_deg: f64,
}

impl Default for FerroSettings {
    fn default() -> Self {
        Self {
            magnitude_threshold: 0.3,
            angle_threshold_deg: 180.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseSettings {
    pub m1_magnitude: f64,
    pub m2_magnitude: f64,
    pub m1_angle_deg: f64,
    pub m2_angle_deg: f64,
}

impl Default for PhaseSettings {
    fn default() -> Self {
        Self {
            m1_magnitude: 0.1,
            m2_magnitude: 0.1,
            m1_angle_deg: 10.0,
            m2_angle_deg: 10.0,
        }
    }
}

/// Thresholds for both classifiers. Missing keys keep their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationSettings {
    pub ferroelectric: FerroSettings,
    pub phase: PhaseSettings,
}

impl ClassificationSettings {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn ferro_criteria(&self) -> FerroCriteria {
        FerroCriteria::from_degrees(
            self.ferroelectric.magnitude_threshold,
            self.ferroelectric.angle_threshold_deg,
        )
    }

    pub fn phase_criteria(&self) -> PhaseCriteria {
        PhaseCriteria {
            m1_magnitude: self.phase.m1_magnitude,
            m2_magnitude: self.phase.m2_magnitude,
            m1_angle_rad: self.phase.m1_angle_deg.to_radians(),
            m2_angle_rad: self.phase.m2_angle_deg.to_radians(),
        }
    }
}

/// What happened to one input file.
#[derive(Debug, Clone, Serialize)]
pub struct InputReport {
    pub input: PathBuf,
    /// Time step, for batch runs.
    pub step: Option<u64>,
    pub extent: GridExtent,
    pub components: usize,
    pub rows: usize,
    pub header: HeaderDecision,
    pub columns: Vec<ColumnSummary>,
    pub outputs: Vec<PathBuf>,
    pub bounds: Option<FilmBounds>,
    pub statistics: Option<StatisticsSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub tool: &'static str,
    pub version: &'static str,
    pub settings: ClassificationSettings,
    pub spacing: [f64; 3],
    pub inputs: Vec<InputReport>,
}

impl RunReport {
    pub fn new(settings: ClassificationSettings, spacing: [f64; 3]) -> Self {
        Self {
            tool: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            settings,
            spacing,
            inputs: Vec::new(),
        }
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            create_dir_all(parent)?;
        }
        let mut w = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut w, self)?;
        w.flush()?;
        Ok(())
    }
}
