//! Angle utilities.
//!
//! All angles are in radians, counter-clockwise positive.

use std::f32::consts::PI;

/// Two times PI (full circle in radians).
pub const TWO_PI: f32 = 2.0 * PI;

/// Normalize angle to [-π, π).
#[inline]
pub fn normalize_angle(angle: f32) -> f32 {
    let mut a = angle % TWO_PI;
    if a >= PI {
        a -= TWO_PI;
    } else if a < -PI {
        a += TWO_PI;
    }
    a
}

/// Normalize angle to [0, 2π).
#[inline]
pub fn normalize_angle_positive(angle: f32) -> f32 {
    let a = angle % TWO_PI;
    if a < 0.0 {
        a + TWO_PI
    } else {
        a
    }
}

/// Signed shortest angular difference from `from` to `to`, in [-π, π).
#[inline]
pub fn angle_diff(from: f32, to: f32) -> f32 {
    normalize_angle(to - from)
}

/// Unsigned shortest angular distance between two angles, in [0, π].
#[inline]
pub fn angle_distance(a: f32, b: f32) -> f32 {
    normalize_angle(a - b).abs()
}

/// Minimum angular distance between two headings, treating a heading and its
/// π-rotated opposite as equivalent.
///
/// A differential drive can reach the pose facing θ+π by driving the same
/// track in reverse, so distance estimates that feed the planner compare
/// heading classes rather than raw headings. Result is in [0, π/2].
#[inline]
pub fn min_angle_between(a: f32, b: f32) -> f32 {
    let d = angle_distance(a, b);
    d.min(PI - d)
}
