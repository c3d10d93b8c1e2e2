//! Continuous path segments: lines, arcs, and point turns.
//!
//! Motion primitives embed their trajectory as a short list of segments in
//! the primitive-local frame; path reconstruction instantiates them at
//! world offsets and merges adjacent same-type segments so the executed
//! path has no redundant boundaries.

use std::f32::consts::{FRAC_PI_2, PI};

use crate::core::math::normalize_angle;
use crate::core::{Point2D, Pose2D};

/// Position sampling step used when walking a segment for collision
/// checking. Matches the granularity primitives are authored at.
pub const SAMPLE_STEP_MM: f32 = 0.25;

/// Angle sampling step for arcs and point turns.
pub const SAMPLE_STEP_RADS: f32 = PI / 32.0;

/// Position tolerance for segment merging.
const MERGE_POSITION_EPS: f32 = 0.1;

/// Angle tolerance for segment merging.
const MERGE_ANGLE_EPS: f32 = 1e-3;

/// One piece of a continuous drivable path.
#[derive(Clone, Debug, PartialEq)]
pub enum PathSegment {
    /// Straight line segment.
    Line { start: Point2D, end: Point2D },
    /// Circular arc. `sweep` is signed: positive sweeps counter-clockwise.
    Arc {
        center: Point2D,
        radius: f32,
        start_angle: f32,
        sweep: f32,
    },
    /// In-place rotation. `sweep` is signed like for arcs.
    PointTurn {
        position: Point2D,
        from_angle: f32,
        sweep: f32,
    },
}

impl PathSegment {
    /// Pose at the start of this segment.
    pub fn start_pose(&self) -> Pose2D {
        match self {
            PathSegment::Line { start, end } => {
                Pose2D::from_position_angle(*start, (*end - *start).angle())
            }
            PathSegment::Arc {
                center,
                radius,
                start_angle,
                sweep,
            } => arc_pose(*center, *radius, *start_angle, *sweep),
            PathSegment::PointTurn {
                position,
                from_angle,
                ..
            } => Pose2D::from_position_angle(*position, *from_angle),
        }
    }

    /// Pose at the end of this segment.
    pub fn end_pose(&self) -> Pose2D {
        match self {
            PathSegment::Line { start, end } => {
                Pose2D::from_position_angle(*end, (*end - *start).angle())
            }
            PathSegment::Arc {
                center,
                radius,
                start_angle,
                sweep,
            } => arc_pose(*center, *radius, *start_angle + *sweep, *sweep),
            PathSegment::PointTurn {
                position,
                from_angle,
                sweep,
            } => Pose2D::from_position_angle(*position, *from_angle + *sweep),
        }
    }

    /// Arc length in millimeters (zero for point turns).
    pub fn length(&self) -> f32 {
        match self {
            PathSegment::Line { start, end } => start.distance(end),
            PathSegment::Arc { radius, sweep, .. } => sweep.abs() * radius,
            PathSegment::PointTurn { .. } => 0.0,
        }
    }

    /// Translate the segment by a world offset.
    pub fn translate(&self, offset: Point2D) -> PathSegment {
        match self {
            PathSegment::Line { start, end } => PathSegment::Line {
                start: *start + offset,
                end: *end + offset,
            },
            PathSegment::Arc {
                center,
                radius,
                start_angle,
                sweep,
            } => PathSegment::Arc {
                center: *center + offset,
                radius: *radius,
                start_angle: *start_angle,
                sweep: *sweep,
            },
            PathSegment::PointTurn {
                position,
                from_angle,
                sweep,
            } => PathSegment::PointTurn {
                position: *position + offset,
                from_angle: *from_angle,
                sweep: *sweep,
            },
        }
    }

    /// Try to merge `next` onto the end of this segment.
    ///
    /// Merges collinear lines with the same travel direction, concentric
    /// arcs continuing with the same sweep sign, and point turns around the
    /// same position in the same direction. Returns the combined segment or
    /// `None` when the pair does not merge.
    pub fn try_merge(&self, next: &PathSegment) -> Option<PathSegment> {
        match (self, next) {
            (
                PathSegment::Line { start, end },
                PathSegment::Line {
                    start: next_start,
                    end: next_end,
                },
            ) => {
                if end.distance(next_start) > MERGE_POSITION_EPS {
                    return None;
                }
                let dir = *end - *start;
                let next_dir = *next_end - *next_start;
                let parallel = dir.cross(&next_dir).abs()
                    <= MERGE_ANGLE_EPS * dir.length() * next_dir.length();
                if parallel && dir.dot(&next_dir) > 0.0 {
                    Some(PathSegment::Line {
                        start: *start,
                        end: *next_end,
                    })
                } else {
                    None
                }
            }
            (
                PathSegment::Arc {
                    center,
                    radius,
                    start_angle,
                    sweep,
                },
                PathSegment::Arc {
                    center: next_center,
                    radius: next_radius,
                    start_angle: next_start,
                    sweep: next_sweep,
                },
            ) => {
                let concentric = center.distance(next_center) <= MERGE_POSITION_EPS
                    && (radius - next_radius).abs() <= MERGE_POSITION_EPS;
                let continuous =
                    normalize_angle(start_angle + sweep - next_start).abs() <= MERGE_ANGLE_EPS;
                if concentric && continuous && sweep.signum() == next_sweep.signum() {
                    Some(PathSegment::Arc {
                        center: *center,
                        radius: *radius,
                        start_angle: *start_angle,
                        sweep: sweep + next_sweep,
                    })
                } else {
                    None
                }
            }
            (
                PathSegment::PointTurn {
                    position,
                    from_angle,
                    sweep,
                },
                PathSegment::PointTurn {
                    position: next_position,
                    from_angle: next_from,
                    sweep: next_sweep,
                },
            ) => {
                let same_center = position.distance(next_position) <= MERGE_POSITION_EPS;
                let continuous =
                    normalize_angle(from_angle + sweep - next_from).abs() <= MERGE_ANGLE_EPS;
                if same_center && continuous && sweep.signum() == next_sweep.signum() {
                    Some(PathSegment::PointTurn {
                        position: *position,
                        from_angle: *from_angle,
                        sweep: sweep + next_sweep,
                    })
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Poses along the segment at the authoring granularity
    /// ([`SAMPLE_STEP_MM`] position, [`SAMPLE_STEP_RADS`] angle), start and
    /// end included.
    pub fn sample_poses(&self) -> Vec<Pose2D> {
        match self {
            PathSegment::Line { start, end } => {
                let length = start.distance(end);
                let steps = ((length / SAMPLE_STEP_MM).ceil() as usize).max(1);
                let heading = (*end - *start).angle();
                (0..=steps)
                    .map(|i| {
                        let t = i as f32 / steps as f32;
                        Pose2D::from_position_angle(
                            Point2D::new(
                                start.x + (end.x - start.x) * t,
                                start.y + (end.y - start.y) * t,
                            ),
                            heading,
                        )
                    })
                    .collect()
            }
            PathSegment::Arc {
                center,
                radius,
                start_angle,
                sweep,
            } => {
                let by_angle = (sweep.abs() / SAMPLE_STEP_RADS).ceil() as usize;
                let by_distance = ((sweep.abs() * radius) / SAMPLE_STEP_MM).ceil() as usize;
                let steps = by_angle.max(by_distance).max(1);
                (0..=steps)
                    .map(|i| {
                        let angle = start_angle + sweep * (i as f32 / steps as f32);
                        arc_pose(*center, *radius, angle, *sweep)
                    })
                    .collect()
            }
            PathSegment::PointTurn {
                position,
                from_angle,
                sweep,
            } => {
                let steps = ((sweep.abs() / SAMPLE_STEP_RADS).ceil() as usize).max(1);
                (0..=steps)
                    .map(|i| {
                        let heading = from_angle + sweep * (i as f32 / steps as f32);
                        Pose2D::from_position_angle(*position, heading)
                    })
                    .collect()
            }
        }
    }
}

/// Pose on a circle at the given angle, headed along the travel tangent.
#[inline]
fn arc_pose(center: Point2D, radius: f32, angle: f32, sweep: f32) -> Pose2D {
    let position = center + Point2D::new(angle.cos(), angle.sin()) * radius;
    let heading = if sweep >= 0.0 {
        angle + FRAC_PI_2
    } else {
        angle - FRAC_PI_2
    };
    Pose2D::from_position_angle(position, heading)
}

/// An ordered list of path segments with merging append.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ContinuousPath {
    segments: Vec<PathSegment>,
}

impl ContinuousPath {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn clear(&mut self) {
        self.segments.clear();
    }

    /// Append a segment, merging it into the last one when possible.
    pub fn push(&mut self, segment: PathSegment) {
        if let Some(last) = self.segments.last_mut() {
            if let Some(merged) = last.try_merge(&segment) {
                *last = merged;
                return;
            }
        }
        self.segments.push(segment);
    }

    /// Total driven length in millimeters.
    pub fn total_length(&self) -> f32 {
        self.segments.iter().map(|s| s.length()).sum()
    }
}
