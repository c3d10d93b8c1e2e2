//! Robot kinematic parameters.

use serde::{Deserialize, Serialize};

use crate::core::{ConvexPolygon, Point2D};

fn default_wheel_base() -> f32 {
    46.0
}

fn default_forward_speed() -> f32 {
    100.0
}

fn default_reverse_speed() -> f32 {
    60.0
}

fn default_footprint() -> ConvexPolygon {
    // Drive center at the origin, body extending further forward than back.
    ConvexPolygon::rectangle(Point2D::new(-30.0, -35.0), Point2D::new(60.0, 35.0))
}

/// Robot physical parameters used for primitive costing and configuration
/// space expansion.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RobotParams {
    /// Distance between the drive wheels in millimeters (default: 46.0).
    #[serde(default = "default_wheel_base")]
    pub wheel_base_mm: f32,

    /// Forward driving speed in mm/s (default: 100.0).
    #[serde(default = "default_forward_speed")]
    pub forward_speed_mmps: f32,

    /// Reverse driving speed in mm/s, typically slower (default: 60.0).
    #[serde(default = "default_reverse_speed")]
    pub reverse_speed_mmps: f32,

    /// Convex footprint polygon in the robot frame, clockwise vertices,
    /// drive center at the origin. Grows obstacles during C-space expansion.
    #[serde(default = "default_footprint")]
    pub footprint: ConvexPolygon,
}

impl Default for RobotParams {
    fn default() -> Self {
        Self {
            wheel_base_mm: default_wheel_base(),
            forward_speed_mmps: default_forward_speed(),
            reverse_speed_mmps: default_reverse_speed(),
            footprint: default_footprint(),
        }
    }
}

impl RobotParams {
    /// Driving speed for the given motion direction.
    #[inline]
    pub fn speed_mmps(&self, reverse: bool) -> f32 {
        if reverse {
            self.reverse_speed_mmps
        } else {
            self.forward_speed_mmps
        }
    }
}
