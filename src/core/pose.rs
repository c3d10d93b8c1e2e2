//! Continuous 2D pose.

use super::math::normalize_angle;
use super::point::Point2D;

/// A continuous pose: position in millimeters, heading in radians.
///
/// This is the un-discretized counterpart of a lattice state; conversions
/// between the two live on the environment, which owns the lattice
/// resolution and angle table.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Pose2D {
    /// X position in millimeters.
    pub x: f32,
    /// Y position in millimeters.
    pub y: f32,
    /// Heading angle in radians [-π, π), CCW positive from X-axis.
    pub theta: f32,
}

impl Pose2D {
    /// Create a new pose. The heading is normalized to [-π, π).
    #[inline]
    pub fn new(x: f32, y: f32, theta: f32) -> Self {
        Self {
            x,
            y,
            theta: normalize_angle(theta),
        }
    }

    /// Create a pose from a position and heading.
    #[inline]
    pub fn from_position_angle(position: Point2D, theta: f32) -> Self {
        Self::new(position.x, position.y, theta)
    }

    /// Get the position as a Point2D.
    #[inline]
    pub fn position(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }

    /// Euclidean distance to another pose (position only).
    #[inline]
    pub fn distance_to(&self, other: &Pose2D) -> f32 {
        self.position().distance(&other.position())
    }
}
