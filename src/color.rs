// src/color.rs
//
// Direction -> colour mapping for vector exports.
//
// hue        : azimuth of (px, py) in degrees, [0, 360)
// saturation : |p| rescaled into the magnitude range
// lightness  : (pz / |p| + 1) / 2
// Vectors along z carry no azimuth; they are drawn grey with lightness taken
// from pz rescaled into the z range.

use std::f64::consts::PI;

/// Below this, saturation / XY magnitude / range width count as zero.
const EPS: f64 = 1.0e-6;

/// Map `value` into [0, 1] over `[lo, hi]`; 0.5 when the range is degenerate.
pub fn rescale(value: f64, (lo, hi): (f64, f64)) -> f64 {
    if hi - lo < EPS {
        return 0.5;
    }
    if value <= lo {
        0.0
    } else if value >= hi {
        1.0
    } else {
        (value - lo) / (hi - lo)
    }
}

fn hue_to_channel(v1: f64, v2: f64, mut vh: f64) -> f64 {
    if vh < 0.0 {
        vh += 1.0;
    }
    if vh > 1.0 {
        vh -= 1.0;
    }
    if 6.0 * vh < 1.0 {
        v1 + (v2 - v1) * 6.0 * vh
    } else if 2.0 * vh < 1.0 {
        v2
    } else if 3.0 * vh < 2.0 {
        v1 + (v2 - v1) * (2.0 / 3.0 - vh) * 6.0
    } else {
        v1
    }
}

/// HSL (hue in degrees, saturation and lightness in [0, 1]) to 0..=255 RGB.
pub fn hsl_to_rgb(hue: f64, saturation: f64, lightness: f64) -> [f64; 3] {
    if saturation <= EPS {
        let g = lightness * 255.0;
        return [g, g, g];
    }
    let v2 = if lightness < 0.5 {
        lightness * (1.0 + saturation)
    } else {
        lightness + saturation - saturation * lightness
    };
    let v1 = 2.0 * lightness - v2;
    let h = hue / 360.0;
    [
        255.0 * hue_to_channel(v1, v2, h + 1.0 / 3.0),
        255.0 * hue_to_channel(v1, v2, h),
        255.0 * hue_to_channel(v1, v2, h - 1.0 / 3.0),
    ]
}

/// Colour of direction `p` given the magnitude and z ranges of the field.
pub fn direction_to_rgb(p: [f64; 3], magnitude_range: (f64, f64), z_range: (f64, f64)) -> [u8; 3] {
    let [px, py, pz] = p;
    let xy = (px * px + py * py).sqrt();

    let (hue, saturation, lightness) = if xy < EPS {
        (0.0, 0.0, rescale(pz, z_range))
    } else {
        let az = (px / xy).clamp(-1.0, 1.0).acos() * 180.0 / PI;
        let hue = if py >= 0.0 { az } else { 360.0 - az };
        let magnitude = (xy * xy + pz * pz).sqrt();
        (hue, rescale(magnitude, magnitude_range), (pz / magnitude + 1.0) / 2.0)
    };

    hsl_to_rgb(hue, saturation, lightness).map(|c| c.round().clamp(0.0, 255.0) as u8)
}
