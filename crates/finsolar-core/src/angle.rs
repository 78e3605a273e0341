use std::f64::consts::PI;

use crate::types::Degrees;

/// Degrees to radians.
pub fn to_radians(degrees: Degrees) -> f64 {
    PI / 180.0 * degrees
}

/// Radians to degrees.
pub fn to_degrees(radians: f64) -> Degrees {
    radians * 180.0 / PI
}
