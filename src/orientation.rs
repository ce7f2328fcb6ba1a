// src/orientation.rs
//
// The 27 reference polarization directions of a perovskite ferroelectric.
//
//   0        no orientation (substrate / sentinel), zero vector
//   1 ..= 8  rhombohedral  <111>
//   9 ..= 20 orthorhombic  <110>
//  21 ..= 26 tetragonal    <100>
//
// Variants come in +/- pairs along the same axis.

use std::f64::consts::FRAC_1_SQRT_2;

const R: f64 = 0.577_350_269_189_625_8; // 1/sqrt(3)
const O: f64 = FRAC_1_SQRT_2;

pub const ORIENTATION_COUNT: usize = 27;

/// Labels 1..=8.
pub const RHOMBOHEDRAL: std::ops::RangeInclusive<i32> = 1..=8;
/// Labels 9..=20.
pub const ORTHORHOMBIC: std::ops::RangeInclusive<i32> = 9..=20;
/// Labels 21..=26.
pub const TETRAGONAL: std::ops::RangeInclusive<i32> = 21..=26;

pub const ORIENTATIONS: [[f64; 3]; ORIENTATION_COUNT] = [
    [0.0, 0.0, 0.0],
    // R1+ R1- R2+ R2- R3+ R3- R4+ R4-
    [R, R, R],
    [-R, -R, -R],
    [-R, R, R],
    [R, -R, -R],
    [-R, -R, R],
    [R, R, -R],
    [R, -R, R],
    [-R, R, -R],
    // O1+ .. O6-
    [O, O, 0.0],
    [-O, -O, 0.0],
    [O, -O, 0.0],
    [-O, O, 0.0],
    [O, 0.0, O],
    [-O, 0.0, -O],
    [O, 0.0, -O],
    [-O, 0.0, O],
    [0.0, O, O],
    [0.0, -O, -O],
    [0.0, O, -O],
    [0.0, -O, O],
    // T1+ .. T3-
    [1.0, 0.0, 0.0],
    [-1.0, 0.0, 0.0],
    [0.0, 1.0, 0.0],
    [0.0, -1.0, 0.0],
    [0.0, 0.0, 1.0],
    [0.0, 0.0, -1.0],
];

pub const ORIENTATION_NAMES: [&str; ORIENTATION_COUNT] = [
    "substrate", "R1+", "R1-", "R2+", "R2-", "R3+", "R3-", "R4+", "R4-", "O1+", "O1-", "O2+",
    "O2-", "O3+", "O3-", "O4+", "O4-", "O5+", "O5-", "O6+", "O6-", "T1+", "T1-", "T2+", "T2-",
    "T3+", "T3-",
];
