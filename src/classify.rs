// src/classify.rs
//
// Point-wise domain classifiers.
//
// - Ferroelectric: nearest of the 26 reference directions within an angle
//   tolerance, for polarizations above a magnitude threshold.
// - Phase (VO2-like): a fixed, ordered decision list over two 4-component
//   order parameters. The first rule that accepts both vectors wins; several
//   rules can accept the same input, so the order is part of the contract.
//
// Both return plain integer labels and never fail for finite input.

use std::f64::consts::{FRAC_1_SQRT_2, PI};

use serde::Serialize;

use crate::orientation::ORIENTATIONS;
use crate::vec3::{dot, norm, norm4};

/// Label of points that match nothing (background / vacuum).
pub const UNCLASSIFIED: i32 = -1;
/// Substrate layers (ferroelectric) / undistorted reference phase (phase).
pub const SUBSTRATE: i32 = 0;

/// Thresholds for the 27-orientation classifier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FerroCriteria {
    pub magnitude_threshold: f64,
    pub angle_threshold_rad: f64,
}

impl FerroCriteria {
    pub fn from_degrees(magnitude_threshold: f64, angle_threshold_deg: f64) -> Self {
        Self {
            magnitude_threshold,
            angle_threshold_rad: angle_threshold_deg.to_radians(),
        }
    }
}

/// Thresholds for the 9-mode phase classifier.
///
/// `m1_*` gate the diagonal modes 1-4, `m2_*` the axis modes 5-8.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PhaseCriteria {
    pub m1_magnitude: f64,
    pub m2_magnitude: f64,
    pub m1_angle_rad: f64,
    pub m2_angle_rad: f64,
}

/// Label of the closest reference direction to `p`, or -1.
pub fn classify_ferroelectric(p: [f64; 3], criteria: &FerroCriteria) -> i32 {
    let length = norm(p);
    if length <= criteria.magnitude_threshold {
        return UNCLASSIFIED;
    }

    nearest_direction(p, length, &ORIENTATIONS, criteria.angle_threshold_rad)
}

/// Index of the direction closest to `p` within `max_angle`, skipping entry 0.
fn nearest_direction(p: [f64; 3], length: f64, directions: &[[f64; 3]], max_angle: f64) -> i32 {
    let mut best_angle = PI;
    let mut best = UNCLASSIFIED;
    for (i, o) in directions.iter().enumerate().skip(1) {
        let cos = (dot(p, *o) / length).clamp(-1.0, 1.0);
        let angle = cos.acos();
        // strict: on ties the earlier label stays
        if angle < max_angle && angle < best_angle {
            best_angle = angle;
            best = i as i32;
        }
    }
    best
}

/// Geometric test of one phase mode.
#[derive(Debug, Clone, Copy)]
enum ModeRule {
    /// |(v[a] + sign * v[b]) / sqrt(2)| / |v| > cos(m1 angle), |v| > m1.
    Diagonal { a: usize, b: usize, sign: f64 },
    /// |v[axis]| / |v| > cos(m2 angle), |v| > m2.
    Axis(usize),
}

/// Modes in evaluation order.
const PHASE_MODES: [(ModeRule, i32); 8] = [
    (ModeRule::Diagonal { a: 0, b: 2, sign: 1.0 }, 1),
    (ModeRule::Diagonal { a: 1, b: 3, sign: 1.0 }, 2),
    (ModeRule::Diagonal { a: 0, b: 2, sign: -1.0 }, 3),
    (ModeRule::Diagonal { a: 1, b: 3, sign: -1.0 }, 4),
    (ModeRule::Axis(0), 5),
    (ModeRule::Axis(1), 6),
    (ModeRule::Axis(2), 7),
    (ModeRule::Axis(3), 8),
];

pub const PHASE_LABEL_COUNT: usize = 9;

pub const PHASE_NAMES: [&str; PHASE_LABEL_COUNT] = [
    "R", "M1-1", "M1-2", "M1-3", "M1-4", "M2-1", "M2-2", "M2-3", "M2-4",
];

impl ModeRule {
    fn accepts(self, v: [f64; 4], length: f64, c: &PhaseCriteria) -> bool {
        match self {
            Self::Diagonal { a, b, sign } => {
                let proj = (v[a] + sign * v[b]) * FRAC_1_SQRT_2;
                length > c.m1_magnitude && proj.abs() / length > c.m1_angle_rad.cos()
            }
            Self::Axis(axis) => {
                length > c.m2_magnitude && v[axis].abs() / length > c.m2_angle_rad.cos()
            }
        }
    }
}

/// Phase label of a point with primary order parameter `u` and secondary `n`.
pub fn classify_phase(u: [f64; 4], n: [f64; 4], criteria: &PhaseCriteria) -> i32 {
    let u_len = norm4(u);
    let n_len = norm4(n);
    if u_len < criteria.m1_magnitude && n_len < criteria.m1_magnitude {
        return SUBSTRATE;
    }

    PHASE_MODES
        .iter()
        .find(|(rule, _)| rule.accepts(u, u_len, criteria) && rule.accepts(n, n_len, criteria))
        .map(|&(_, label)| label)
        .unwrap_or(UNCLASSIFIED)
}
