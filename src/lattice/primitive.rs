//! Precomputed motion primitives.
//!
//! A primitive is one angle-indexed kinematic trajectory: from a starting
//! discretized heading, along a line / arc / point turn, to a discrete
//! end-state offset. Primitives carry their trajectory samples (for
//! narrow-phase collision checking), a cached bounding box (for broad-phase
//! rejection), their embedded continuous segments (for path
//! reconstruction), and a time-based cost.

use serde::{Deserialize, Serialize};

use crate::config::RobotParams;
use crate::core::math::{angle_diff, angle_distance, TWO_PI};
use crate::core::{Bounds, Point2D, Pose2D};
use crate::error::{PlannerError, Result};

use super::action::ActionType;
use super::segment::PathSegment;

/// Costs at or below this are rejected as a data-integrity error.
const MIN_PRIMITIVE_COST: f32 = 1e-6;

/// Lower clamp on the spacing used for inverse-distance sample weights.
///
/// The weight of a swept sample is `1 / spacing_to_previous_sample`, an
/// approximation of dwell time near that sample. The spacing the primitive
/// file was authored with is therefore part of its contract; this clamp
/// only guards against duplicated sample positions.
const MIN_SAMPLE_SPACING_MM: f32 = 0.5;

/// Discrete end-state offset of a primitive: cells and heading steps.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateOffset {
    pub x: i32,
    pub y: i32,
    pub theta: i32,
}

/// Authored trajectory geometry, retained verbatim for dump round-trips.
///
/// A primitive usually carries exactly one of the three shapes; when more
/// are present they execute in straight, arc, turn order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PrimitiveGeometry {
    /// Straight travel along the start heading; negative drives backwards.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub straight_length_mm: Option<f32>,

    /// Circular arc parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arc: Option<ArcGeometry>,

    /// Turn-in-place direction: positive turns counter-clockwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turn_in_place_direction: Option<f32>,
}

/// Arc parameters in the primitive-local frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArcGeometry {
    pub center_x_mm: f32,
    pub center_y_mm: f32,
    pub radius_mm: f32,
    pub start_rads: f32,
    pub sweep_rads: f32,
}

/// One precomputed trajectory sample in the primitive-local frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SweptSample {
    /// Position relative to the start cell origin.
    pub position: Point2D,
    /// Continuous heading at this sample, as authored.
    pub theta: f32,
    /// Nearest discretized heading index; heading-changing primitives check
    /// this sample against the obstacle list for this index.
    pub nearest_theta: u8,
    /// Inverse-distance-from-previous-sample weight used to scale soft
    /// obstacle penalties.
    pub weight: f32,
}

/// A precomputed, angle-indexed kinematic trajectory.
#[derive(Clone, Debug, PartialEq)]
pub struct MotionPrimitive {
    /// Action this primitive realizes; equal to its index in the per-angle
    /// primitive list.
    pub action_id: usize,
    /// Discretized heading this primitive starts from.
    pub start_theta: usize,
    /// Discrete end-state offset.
    pub end_offset: StateOffset,
    /// Traversal cost (seconds, scaled by the action's extra cost factor).
    pub cost: f32,
    /// Trajectory samples ordered start to end.
    pub samples: Vec<SweptSample>,
    /// Cached axis-aligned bounding box over the samples.
    pub bounds: Bounds,
    /// Continuous trajectory in the primitive-local frame.
    pub segments: Vec<PathSegment>,
    /// Authored geometry, kept for dump round-trips.
    pub geometry: PrimitiveGeometry,
}

impl MotionPrimitive {
    /// Build a primitive from an authored definition, computing its cost
    /// from the robot's kinematics.
    ///
    /// Cost is elapsed time: straight segments cost `distance / speed`; arc
    /// segments cost `|sweep| * (radius + wheel_base / 2) / speed` (the
    /// outer wheel travels the longer arc); point turns cost
    /// `|sweep| * (wheel_base / 2) / speed`. Reverse actions use the
    /// reverse speed. The action's extra cost factor is applied last.
    ///
    /// Fails with [`PlannerError::NonPositiveCost`] when the base or final
    /// cost is not strictly positive; that is a bug in the authored file,
    /// not a runtime condition.
    pub fn create(
        action: &ActionType,
        start_theta: usize,
        end_offset: StateOffset,
        intermediate_poses: &[Pose2D],
        geometry: PrimitiveGeometry,
        angles: &[f32],
        params: &RobotParams,
    ) -> Result<Self> {
        let segments = build_segments(&geometry, start_theta, end_offset.theta, angles);

        let speed = params.speed_mmps(action.reverse);
        let half_base = params.wheel_base_mm / 2.0;
        let mut base_cost = 0.0;
        for segment in &segments {
            base_cost += match segment {
                PathSegment::Line { .. } => segment.length() / speed,
                PathSegment::Arc { radius, sweep, .. } => {
                    sweep.abs() * (radius + half_base) / speed
                }
                PathSegment::PointTurn { sweep, .. } => sweep.abs() * half_base / speed,
            };
        }
        if base_cost <= MIN_PRIMITIVE_COST {
            return Err(PlannerError::NonPositiveCost {
                action: action.name.clone(),
                start_theta,
                cost: base_cost,
            });
        }

        let cost = base_cost * action.extra_cost_factor;
        if cost <= MIN_PRIMITIVE_COST {
            return Err(PlannerError::NonPositiveCost {
                action: action.name.clone(),
                start_theta,
                cost,
            });
        }

        Ok(Self::assemble(
            action.id,
            start_theta,
            end_offset,
            cost,
            intermediate_poses,
            geometry,
            segments,
            angles,
        ))
    }

    /// Rebuild a primitive from a dump, taking the cost verbatim instead of
    /// recomputing it from kinematics.
    pub fn import(
        action_id: usize,
        name: &str,
        start_theta: usize,
        end_offset: StateOffset,
        cost: f32,
        intermediate_poses: &[Pose2D],
        geometry: PrimitiveGeometry,
        angles: &[f32],
    ) -> Result<Self> {
        if cost <= MIN_PRIMITIVE_COST {
            return Err(PlannerError::NonPositiveCost {
                action: name.to_owned(),
                start_theta,
                cost,
            });
        }
        let segments = build_segments(&geometry, start_theta, end_offset.theta, angles);
        Ok(Self::assemble(
            action_id,
            start_theta,
            end_offset,
            cost,
            intermediate_poses,
            geometry,
            segments,
            angles,
        ))
    }

    fn assemble(
        action_id: usize,
        start_theta: usize,
        end_offset: StateOffset,
        cost: f32,
        intermediate_poses: &[Pose2D],
        geometry: PrimitiveGeometry,
        segments: Vec<PathSegment>,
        angles: &[f32],
    ) -> Self {
        let samples = build_samples(intermediate_poses, angles);
        let bounds = sample_bounds(&samples, &segments);
        Self {
            action_id,
            start_theta,
            end_offset,
            cost,
            samples,
            bounds,
            segments,
            geometry,
        }
    }

    /// Whether this primitive ends at a different heading than it starts.
    #[inline]
    pub fn changes_heading(&self) -> bool {
        self.end_offset.theta != 0
    }

    /// Continuous end-state offset in millimeters.
    #[inline]
    pub fn end_offset_mm(&self, resolution_mm: f32) -> Point2D {
        Point2D::new(
            self.end_offset.x as f32 * resolution_mm,
            self.end_offset.y as f32 * resolution_mm,
        )
    }

    /// Derive the reverse-table counterpart of this primitive.
    ///
    /// The reverse primitive starts at this primitive's end heading and
    /// carries the negated end offset; its samples and segments are
    /// translated by the negated continuous offset so the swept volume
    /// stays anchored at the state the search iterates from.
    pub fn reversed(&self, num_angles: usize, resolution_mm: f32) -> MotionPrimitive {
        let start_theta =
            (self.start_theta as i32 + self.end_offset.theta).rem_euclid(num_angles as i32);
        let shift = -self.end_offset_mm(resolution_mm);

        let samples = self
            .samples
            .iter()
            .map(|s| SweptSample {
                position: s.position + shift,
                ..*s
            })
            .collect();
        let segments = self.segments.iter().map(|s| s.translate(shift)).collect();

        MotionPrimitive {
            action_id: self.action_id,
            start_theta: start_theta as usize,
            end_offset: StateOffset {
                x: -self.end_offset.x,
                y: -self.end_offset.y,
                theta: -self.end_offset.theta,
            },
            cost: self.cost,
            samples,
            bounds: self.bounds.translate(shift),
            segments,
            geometry: self.geometry.clone(),
        }
    }
}

/// Index of the table angle nearest to `angle`.
pub fn nearest_angle_index(angles: &[f32], angle: f32) -> usize {
    debug_assert!(!angles.is_empty());
    let mut best = 0;
    let mut best_distance = f32::INFINITY;
    for (i, &table_angle) in angles.iter().enumerate() {
        let d = angle_distance(angle, table_angle);
        if d < best_distance {
            best_distance = d;
            best = i;
        }
    }
    best
}

fn build_segments(
    geometry: &PrimitiveGeometry,
    start_theta: usize,
    dtheta: i32,
    angles: &[f32],
) -> Vec<PathSegment> {
    let num_angles = angles.len() as i32;
    let start_heading = angles[start_theta];
    let end_heading = angles[(start_theta as i32 + dtheta).rem_euclid(num_angles) as usize];

    let mut segments = Vec::new();
    if let Some(length) = geometry.straight_length_mm {
        let direction = Point2D::new(start_heading.cos(), start_heading.sin());
        segments.push(PathSegment::Line {
            start: Point2D::ZERO,
            end: direction * length,
        });
    }
    if let Some(arc) = &geometry.arc {
        segments.push(PathSegment::Arc {
            center: Point2D::new(arc.center_x_mm, arc.center_y_mm),
            radius: arc.radius_mm,
            start_angle: arc.start_rads,
            sweep: arc.sweep_rads,
        });
    }
    if let Some(direction) = geometry.turn_in_place_direction {
        let mut sweep = angle_diff(start_heading, end_heading);
        if direction > 0.0 && sweep < 0.0 {
            sweep += TWO_PI;
        } else if direction < 0.0 && sweep > 0.0 {
            sweep -= TWO_PI;
        }
        segments.push(PathSegment::PointTurn {
            position: Point2D::ZERO,
            from_angle: start_heading,
            sweep,
        });
    }
    segments
}

fn build_samples(poses: &[Pose2D], angles: &[f32]) -> Vec<SweptSample> {
    let mut prev = Point2D::ZERO;
    poses
        .iter()
        .map(|pose| {
            let position = pose.position();
            let spacing = position.distance(&prev).max(MIN_SAMPLE_SPACING_MM);
            prev = position;
            SweptSample {
                position,
                theta: pose.theta,
                nearest_theta: nearest_angle_index(angles, pose.theta) as u8,
                weight: 1.0 / spacing,
            }
        })
        .collect()
}

fn sample_bounds(samples: &[SweptSample], segments: &[PathSegment]) -> Bounds {
    let mut bounds = Bounds::from_points(samples.iter().map(|s| s.position));
    if bounds.is_empty() {
        for segment in segments {
            bounds.expand_to_include(segment.start_pose().position());
            bounds.expand_to_include(segment.end_pose().position());
        }
    }
    if bounds.is_empty() {
        bounds = Bounds::from_point(Point2D::ZERO);
    }
    bounds
}
